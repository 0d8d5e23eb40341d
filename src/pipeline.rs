//! Terrain pipeline: owns the authoritative settings and publishes frames
//!
//! A frame is built completely (noise -> classify -> shade) before it replaces
//! the previous one. Any failure leaves the last published frame and the
//! current settings untouched.

use std::sync::Arc;
use std::time::Instant;

use image::RgbImage;

use crate::biomes::{BandLayout, BiomeTable, SEA_LEVEL_MAX, SEA_LEVEL_MIN};
use crate::config::TerrainSettings;
use crate::error::{Result, TerrainError};
use crate::heightmap::{self, NoiseConfig, MAX_OCTAVES};
use crate::lighting::LightConfig;
use crate::render::{self, RenderMode};
use crate::tilemap::HeightField;
use crate::viewport::{TexCoordRect, Viewport, ZoomDirection};

// =============================================================================
// PARAMETER CONTROLS
// =============================================================================

/// Parameters exposed to stepped +/- controls
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Parameter {
    SeaLevel,
    Scale,
    Persistence,
    Lacunarity,
    Octaves,
    LightAngle,
    LightIntensity,
    Ambient,
}

/// Step direction for a parameter control
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    Increase,
    Decrease,
}

/// Range and step of a stepped control
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ParamBounds {
    pub min: f64,
    pub max: f64,
    pub step: f64,
    /// Values wrap around instead of clamping
    pub wraps: bool,
}

impl Parameter {
    pub fn all() -> &'static [Self] {
        &[
            Self::SeaLevel,
            Self::Scale,
            Self::Persistence,
            Self::Lacunarity,
            Self::Octaves,
            Self::LightAngle,
            Self::LightIntensity,
            Self::Ambient,
        ]
    }

    pub fn label(&self) -> &'static str {
        match self {
            Parameter::SeaLevel => "Sea Level",
            Parameter::Scale => "Scale",
            Parameter::Persistence => "Persistence",
            Parameter::Lacunarity => "Lacunarity",
            Parameter::Octaves => "Octaves",
            Parameter::LightAngle => "Light Angle",
            Parameter::LightIntensity => "Light Intensity",
            Parameter::Ambient => "Ambient",
        }
    }

    pub fn bounds(&self) -> ParamBounds {
        let (min, max, step, wraps) = match self {
            Parameter::SeaLevel => (SEA_LEVEL_MIN, SEA_LEVEL_MAX, 0.01, false),
            Parameter::Scale => (0.005, 0.0125, 0.001, false),
            Parameter::Persistence => (0.1, 0.7, 0.05, false),
            Parameter::Lacunarity => (1.0, 3.0, 0.1, false),
            Parameter::Octaves => (1.0, MAX_OCTAVES as f64, 1.0, false),
            Parameter::LightAngle => (0.0, 360.0, 15.0, true),
            Parameter::LightIntensity => (0.0, 1.0, 0.05, false),
            Parameter::Ambient => (0.0, 1.0, 0.05, false),
        };
        ParamBounds { min, max, step, wraps }
    }

    /// Current value in `settings`
    pub fn value(&self, settings: &TerrainSettings) -> f64 {
        match self {
            Parameter::SeaLevel => settings.sea_level,
            Parameter::Scale => settings.noise.scale,
            Parameter::Persistence => settings.noise.persistence,
            Parameter::Lacunarity => settings.noise.lacunarity,
            Parameter::Octaves => settings.noise.octaves as f64,
            Parameter::LightAngle => settings.light.angle_degrees,
            Parameter::LightIntensity => settings.light.intensity,
            Parameter::Ambient => settings.light.ambient,
        }
    }

    fn store(&self, settings: &mut TerrainSettings, value: f64) {
        match self {
            Parameter::SeaLevel => settings.sea_level = value,
            Parameter::Scale => settings.noise.scale = value,
            Parameter::Persistence => settings.noise.persistence = value,
            Parameter::Lacunarity => settings.noise.lacunarity = value,
            Parameter::Octaves => settings.noise.octaves = value.round() as u32,
            Parameter::LightAngle => settings.light.angle_degrees = value,
            Parameter::LightIntensity => settings.light.intensity = value,
            Parameter::Ambient => settings.light.ambient = value,
        }
    }

    /// Next value one step in `direction`, snapped to the step grid.
    pub fn stepped(&self, current: f64, direction: Direction) -> f64 {
        let bounds = self.bounds();
        let delta = match direction {
            Direction::Increase => bounds.step,
            Direction::Decrease => -bounds.step,
        };
        let snapped = ((current + delta) / bounds.step).round() * bounds.step;
        if bounds.wraps {
            snapped.rem_euclid(bounds.max - bounds.min) + bounds.min
        } else {
            snapped.clamp(bounds.min, bounds.max)
        }
    }

    /// Format a value the way the control label shows it
    pub fn format_value(&self, value: f64) -> String {
        match self {
            Parameter::Scale => format!("{:.4}", value),
            Parameter::Octaves => format!("{}", value.round() as u32),
            Parameter::LightAngle => format!("{:.0}°", value),
            _ => format!("{:.2}", value),
        }
    }
}

// =============================================================================
// FRAMES
// =============================================================================

/// One published generation result
#[derive(Clone, Debug)]
pub struct TerrainFrame {
    /// Increases by one with every published frame
    pub generation: u64,
    /// Heights read by both classification and shading
    pub height_field: Arc<HeightField>,
    /// Interleaved RGB, row-major, `width * height * 3` bytes
    pub pixels: RgbImage,
    /// Noise parameters that produced `height_field`
    pub noise: NoiseConfig,
    pub mode: RenderMode,
}

impl TerrainFrame {
    pub fn width(&self) -> usize {
        self.height_field.width
    }

    pub fn height(&self) -> usize {
        self.height_field.height
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.pixels.as_raw()
    }
}

// =============================================================================
// PIPELINE
// =============================================================================

/// Orchestrates generation, classification, shading and the viewport
pub struct TerrainPipeline {
    settings: TerrainSettings,
    biomes: BiomeTable,
    viewport: Viewport,
    frame: Option<TerrainFrame>,
    generation: u64,
}

impl TerrainPipeline {
    /// Validate `settings` and set up the viewport. No frame is generated yet.
    pub fn new(settings: TerrainSettings) -> Result<Self> {
        settings.validate()?;
        let biomes = BiomeTable::for_layout(settings.band_layout, settings.sea_level)?;
        let viewport = Viewport::new(settings.window_width, settings.window_height, settings.texture_factor)?;
        Ok(Self {
            settings,
            biomes,
            viewport,
            frame: None,
            generation: 0,
        })
    }

    pub fn settings(&self) -> &TerrainSettings {
        &self.settings
    }

    pub fn biomes(&self) -> &BiomeTable {
        &self.biomes
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    /// Last published frame, if any
    pub fn frame(&self) -> Option<&TerrainFrame> {
        self.frame.as_ref()
    }

    /// Rebuild the frame from the current settings.
    pub fn regenerate(&mut self) -> Result<&TerrainFrame> {
        let frame = self.build_frame(&self.settings, &self.biomes, &self.viewport)?;
        Ok(self.publish(frame))
    }

    /// Replace all settings at once and regenerate.
    pub fn apply_settings(&mut self, settings: TerrainSettings) -> Result<&TerrainFrame> {
        settings.validate()?;
        let biomes = BiomeTable::for_layout(settings.band_layout, settings.sea_level)?;
        let mut viewport = self.viewport.clone();
        if settings.texture_factor != viewport.texture_factor {
            viewport = Viewport::new(settings.window_width, settings.window_height, settings.texture_factor)?;
        } else if (settings.window_width, settings.window_height) != (viewport.window_width, viewport.window_height) {
            viewport.resize(settings.window_width, settings.window_height)?;
        }
        viewport.update_view()?;

        let frame = self.build_frame(&settings, &biomes, &viewport)?;
        self.settings = settings;
        self.biomes = biomes;
        self.viewport = viewport;
        Ok(self.publish(frame))
    }

    pub fn set_noise_config(&mut self, noise: NoiseConfig) -> Result<&TerrainFrame> {
        let settings = TerrainSettings { noise, ..self.settings.clone() };
        self.apply_settings(settings)
    }

    pub fn set_light(&mut self, light: LightConfig) -> Result<&TerrainFrame> {
        let settings = TerrainSettings { light, ..self.settings.clone() };
        self.apply_settings(settings)
    }

    /// Move the sea level; all band thresholds are rebuilt together.
    pub fn set_sea_level(&mut self, sea_level: f64) -> Result<&TerrainFrame> {
        if self.settings.band_layout == BandLayout::Fixed {
            return Err(TerrainError::Configuration(
                "fixed band layout has no adjustable sea level".to_string(),
            ));
        }
        let settings = TerrainSettings { sea_level, ..self.settings.clone() };
        self.apply_settings(settings)
    }

    pub fn set_render_mode(&mut self, render_mode: RenderMode) -> Result<&TerrainFrame> {
        let settings = TerrainSettings { render_mode, ..self.settings.clone() };
        self.apply_settings(settings)
    }

    /// Step one parameter and regenerate. Values clamp (or wrap) at their bounds.
    pub fn adjust(&mut self, parameter: Parameter, direction: Direction) -> Result<&TerrainFrame> {
        if parameter == Parameter::SeaLevel && self.settings.band_layout == BandLayout::Fixed {
            return Err(TerrainError::Configuration(
                "fixed band layout has no adjustable sea level".to_string(),
            ));
        }
        let current = parameter.value(&self.settings);
        let next = parameter.stepped(current, direction);
        log::debug!("{}: {} -> {}", parameter.label(), parameter.format_value(current), parameter.format_value(next));

        let mut settings = self.settings.clone();
        parameter.store(&mut settings, next);
        self.apply_settings(settings)
    }

    /// Follow a window resize: texture size, frame and view bounds are rebuilt.
    pub fn resize(&mut self, window_width: usize, window_height: usize) -> Result<&TerrainFrame> {
        let settings = TerrainSettings {
            window_width,
            window_height,
            ..self.settings.clone()
        };
        self.apply_settings(settings)
    }

    /// Current visible rectangle
    pub fn view_rect(&mut self) -> Result<TexCoordRect> {
        self.viewport.update_view()
    }

    pub fn pan(&mut self, dx: f64, dy: f64) -> Result<TexCoordRect> {
        self.viewport.pan(dx, dy)
    }

    pub fn zoom(&mut self, direction: ZoomDirection) -> Result<TexCoordRect> {
        self.viewport.zoom(direction)
    }

    fn build_frame(&self, settings: &TerrainSettings, biomes: &BiomeTable, viewport: &Viewport) -> Result<TerrainFrame> {
        let width = viewport.texture_width;
        let height = viewport.texture_height;
        let start = Instant::now();

        // The field is a pure function of its size and noise parameters
        let reusable = self.frame.as_ref().filter(|f| {
            f.width() == width && f.height() == height && f.noise == settings.noise
        });
        let height_field = match reusable {
            Some(previous) => Arc::clone(&previous.height_field),
            None => Arc::new(heightmap::generate(width, height, &settings.noise)?),
        };
        let noise_ms = start.elapsed().as_secs_f64() * 1000.0;

        let pixels = render::render(
            &height_field,
            settings.render_mode,
            biomes,
            &settings.light,
            settings.normal_strength,
        )?;
        let total_ms = start.elapsed().as_secs_f64() * 1000.0;

        log::debug!(
            "Frame {}x{}: noise {:.1}ms{}, render {:.1}ms",
            width,
            height,
            noise_ms,
            if reusable.is_some() { " (reused)" } else { "" },
            total_ms - noise_ms
        );

        Ok(TerrainFrame {
            generation: 0,
            height_field,
            pixels,
            noise: settings.noise,
            mode: settings.render_mode,
        })
    }

    fn publish(&mut self, mut frame: TerrainFrame) -> &TerrainFrame {
        self.generation += 1;
        frame.generation = self.generation;

        if let Some((min_h, max_h)) = frame.height_field.min_max() {
            log::info!(
                "Generation {}: {}x{} {} terrain, heights {:.3} to {:.3}",
                frame.generation,
                frame.width(),
                frame.height(),
                frame.mode,
                min_h,
                max_h
            );
        }

        self.frame.insert(frame)
    }
}

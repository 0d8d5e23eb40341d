//! Generation settings: defaults, JSON settings files and validation

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::biomes::{BandLayout, DEFAULT_SEA_LEVEL, SEA_LEVEL_MAX, SEA_LEVEL_MIN};
use crate::error::{Result, TerrainError};
use crate::heightmap::NoiseConfig;
use crate::lighting::{LightConfig, DEFAULT_NORMAL_STRENGTH};
use crate::render::RenderMode;
use crate::viewport::MAX_ZOOM;

/// Everything needed to start a pipeline
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TerrainSettings {
    pub noise: NoiseConfig,
    pub light: LightConfig,
    pub sea_level: f64,
    pub band_layout: BandLayout,
    /// Generated texture size relative to the window
    pub texture_factor: f64,
    pub window_width: usize,
    pub window_height: usize,
    pub render_mode: RenderMode,
    pub normal_strength: f64,
}

impl Default for TerrainSettings {
    fn default() -> Self {
        Self {
            noise: NoiseConfig::default(),
            light: LightConfig::default(),
            sea_level: DEFAULT_SEA_LEVEL,
            band_layout: BandLayout::default(),
            texture_factor: 2.0,
            window_width: 800,
            window_height: 600,
            render_mode: RenderMode::default(),
            normal_strength: DEFAULT_NORMAL_STRENGTH,
        }
    }
}

impl TerrainSettings {
    /// Read settings from a JSON file. Missing fields take their defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| TerrainError::Io(format!("{}: {}", path.display(), e)))?;
        Self::from_json(&contents)
    }

    pub fn from_json(contents: &str) -> Result<Self> {
        let settings: TerrainSettings = serde_json::from_str(contents)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<()> {
        self.noise.validate()?;
        self.light.validate()?;
        if !self.sea_level.is_finite() || !(SEA_LEVEL_MIN..=SEA_LEVEL_MAX).contains(&self.sea_level) {
            return Err(TerrainError::Configuration(format!(
                "sea level {} outside [{}, {}]",
                self.sea_level, SEA_LEVEL_MIN, SEA_LEVEL_MAX
            )));
        }
        // Below 1 / MAX_ZOOM the minimum zoom would exceed the maximum
        if !self.texture_factor.is_finite() || self.texture_factor < 1.0 / MAX_ZOOM {
            return Err(TerrainError::Configuration(format!(
                "texture factor must be at least {}, got {}",
                1.0 / MAX_ZOOM,
                self.texture_factor
            )));
        }
        if !self.normal_strength.is_finite() || self.normal_strength < 0.0 {
            return Err(TerrainError::Configuration(format!(
                "normal strength must be >= 0, got {}",
                self.normal_strength
            )));
        }
        if self.window_width == 0 || self.window_height == 0 {
            return Err(TerrainError::Dimension {
                width: self.window_width,
                height: self.window_height,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let settings = TerrainSettings::default();
        assert!(settings.validate().is_ok());
        assert_eq!(settings.noise.octaves, 8);
        assert_eq!(settings.noise.seed, 42);
        assert_eq!(settings.sea_level, -0.15);
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let settings = TerrainSettings::from_json(
            r#"{ "noise": { "octaves": 3 }, "sea_level": 0.1, "render_mode": "flat" }"#,
        ).unwrap();
        assert_eq!(settings.noise.octaves, 3);
        assert_eq!(settings.noise.scale, 0.005);
        assert_eq!(settings.sea_level, 0.1);
        assert_eq!(settings.render_mode, RenderMode::Flat);
        assert_eq!(settings.light, LightConfig::default());
    }

    #[test]
    fn test_json_roundtrip_preserves_settings() {
        let mut settings = TerrainSettings::default();
        settings.light.angle_degrees = 120.0;
        settings.render_mode = RenderMode::Heightmap;
        let json = settings.to_json().unwrap();
        assert_eq!(TerrainSettings::from_json(&json).unwrap(), settings);
    }

    #[test]
    fn test_out_of_range_values_rejected() {
        assert!(matches!(
            TerrainSettings::from_json(r#"{ "sea_level": 0.9 }"#),
            Err(TerrainError::Configuration(_))
        ));
        assert!(matches!(
            TerrainSettings::from_json(r#"{ "noise": { "octaves": 12 } }"#),
            Err(TerrainError::Configuration(_))
        ));
        assert!(matches!(
            TerrainSettings::from_json(r#"{ "texture_factor": 0.05 }"#),
            Err(TerrainError::Configuration(_))
        ));
        assert!(TerrainSettings::from_json(r#"{ "texture_factor": 0.5 }"#).is_ok());
        assert!(matches!(
            TerrainSettings::from_json(r#"{ "window_width": 0 }"#),
            Err(TerrainError::Dimension { .. })
        ));
        assert!(matches!(
            TerrainSettings::from_json("[1, 2"),
            Err(TerrainError::Parse(_))
        ));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let result = TerrainSettings::load(Path::new("/nonexistent/terrain-settings.json"));
        assert!(matches!(result, Err(TerrainError::Io(_))));
    }
}

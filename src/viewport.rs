//! Zoom/pan mapping from the window onto the oversized terrain texture
//!
//! The generated texture is `texture_factor` times the window size. The viewport
//! picks a normalized sub-rectangle of it, keeping the rectangle inside [0, 1]
//! on both axes.

use crate::error::{Result, TerrainError};

/// Upper zoom limit
pub const MAX_ZOOM: f64 = 10.0;
/// Zoom multiplier per step in
pub const ZOOM_IN_STEP: f64 = 1.1;
/// Zoom multiplier per step out
pub const ZOOM_OUT_STEP: f64 = 0.9;

const RANGE_EPSILON: f64 = 1e-9;

/// Normalized texture-space rectangle
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TexCoordRect {
    pub u_min: f64,
    pub v_min: f64,
    pub u_max: f64,
    pub v_max: f64,
}

impl TexCoordRect {
    pub fn width(&self) -> f64 {
        self.u_max - self.u_min
    }

    pub fn height(&self) -> f64 {
        self.v_max - self.v_min
    }

    fn is_inside_unit(&self) -> bool {
        self.u_min >= -RANGE_EPSILON
            && self.v_min >= -RANGE_EPSILON
            && self.u_max <= 1.0 + RANGE_EPSILON
            && self.v_max <= 1.0 + RANGE_EPSILON
            && self.u_min <= self.u_max
            && self.v_min <= self.v_max
    }
}

/// Zoom step direction
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ZoomDirection {
    In,
    Out,
}

/// Texture size for a window, `floor(window * factor)` per axis.
///
/// The factor must leave a non-empty zoom range, so it cannot drop below
/// `1 / MAX_ZOOM`.
pub fn texture_dimensions(window_width: usize, window_height: usize, texture_factor: f64) -> Result<(usize, usize)> {
    if !texture_factor.is_finite() || texture_factor < 1.0 / MAX_ZOOM {
        return Err(TerrainError::Configuration(format!(
            "texture factor must be at least {}, got {}",
            1.0 / MAX_ZOOM,
            texture_factor
        )));
    }
    let width = (window_width as f64 * texture_factor).floor() as usize;
    let height = (window_height as f64 * texture_factor).floor() as usize;
    if width == 0 || height == 0 {
        return Err(TerrainError::Dimension { width, height });
    }
    Ok((width, height))
}

/// View state that survives regenerations
#[derive(Clone, Debug, PartialEq)]
pub struct Viewport {
    pub zoom: f64,
    /// Normalized view center
    pub offset_x: f64,
    pub offset_y: f64,
    pub texture_width: usize,
    pub texture_height: usize,
    pub window_width: usize,
    pub window_height: usize,
    pub texture_factor: f64,
}

impl Viewport {
    /// Centered viewport at zoom 1, or the nearest legal zoom.
    pub fn new(window_width: usize, window_height: usize, texture_factor: f64) -> Result<Self> {
        if window_width == 0 || window_height == 0 {
            return Err(TerrainError::Dimension { width: window_width, height: window_height });
        }
        let (texture_width, texture_height) = texture_dimensions(window_width, window_height, texture_factor)?;
        Ok(Self {
            zoom: 1.0_f64.clamp(1.0 / texture_factor, MAX_ZOOM),
            offset_x: 0.5,
            offset_y: 0.5,
            texture_width,
            texture_height,
            window_width,
            window_height,
            texture_factor,
        })
    }

    pub fn min_zoom(&self) -> f64 {
        1.0 / self.texture_factor
    }

    /// Visible fraction of the texture per axis, never more than all of it.
    pub fn ranges(&self) -> (f64, f64) {
        let default_x = self.window_width as f64 / self.texture_width as f64;
        let default_y = self.window_height as f64 / self.texture_height as f64;
        ((default_x / self.zoom).min(1.0), (default_y / self.zoom).min(1.0))
    }

    /// Clamp the offsets and compute the visible rectangle.
    pub fn update_view(&mut self) -> Result<TexCoordRect> {
        let (range_x, range_y) = self.ranges();

        self.offset_x = self.offset_x.clamp(range_x / 2.0, 1.0 - range_x / 2.0);
        self.offset_y = self.offset_y.clamp(range_y / 2.0, 1.0 - range_y / 2.0);

        let rect = TexCoordRect {
            u_min: self.offset_x - range_x / 2.0,
            v_min: self.offset_y - range_y / 2.0,
            u_max: self.offset_x + range_x / 2.0,
            v_max: self.offset_y + range_y / 2.0,
        };

        if !rect.is_inside_unit() {
            return Err(TerrainError::RangeViolation(rect));
        }

        log::debug!(
            "View: zoom {:.3}, center ({:.4}, {:.4}), u [{:.4}, {:.4}], v [{:.4}, {:.4}]",
            self.zoom, self.offset_x, self.offset_y, rect.u_min, rect.u_max, rect.v_min, rect.v_max
        );
        Ok(rect)
    }

    /// Move the view by a drag of `(dx, dy)` window pixels.
    pub fn pan(&mut self, dx: f64, dy: f64) -> Result<TexCoordRect> {
        if !dx.is_finite() || !dy.is_finite() {
            return Err(TerrainError::Configuration(format!("pan delta must be finite, got ({}, {})", dx, dy)));
        }
        let (range_x, range_y) = self.ranges();
        self.offset_x -= dx * (range_x / self.window_width as f64);
        self.offset_y -= dy * (range_y / self.window_height as f64);
        self.update_view()
    }

    /// Step the zoom factor in or out, clamped to `[1 / texture_factor, MAX_ZOOM]`.
    pub fn zoom(&mut self, direction: ZoomDirection) -> Result<TexCoordRect> {
        let step = match direction {
            ZoomDirection::In => ZOOM_IN_STEP,
            ZoomDirection::Out => ZOOM_OUT_STEP,
        };
        self.zoom = (self.zoom * step).clamp(self.min_zoom(), MAX_ZOOM);
        self.update_view()
    }

    /// Adopt a new window size; texture dimensions follow it.
    pub fn resize(&mut self, window_width: usize, window_height: usize) -> Result<TexCoordRect> {
        if window_width == 0 || window_height == 0 {
            return Err(TerrainError::Dimension { width: window_width, height: window_height });
        }
        let (texture_width, texture_height) = texture_dimensions(window_width, window_height, self.texture_factor)?;
        self.window_width = window_width;
        self.window_height = window_height;
        self.texture_width = texture_width;
        self.texture_height = texture_height;
        self.update_view()
    }
}

/// Clamp `viewport` and return its visible rectangle.
pub fn update_view(viewport: &mut Viewport) -> Result<TexCoordRect> {
    viewport.update_view()
}

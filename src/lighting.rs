//! Directional Lambert shading over a height field
//!
//! Normals come from central differences of neighbouring height samples, so the
//! whole field must be finished before any cell is shaded.

use serde::{Deserialize, Serialize};

use crate::biomes::{BiomeTable, Color};
use crate::error::{Result, TerrainError};
use crate::tilemap::HeightField;

/// Finite-difference multiplier used for normals
pub const DEFAULT_NORMAL_STRENGTH: f64 = 50.0;

/// Plain 3-vector
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Vec3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vec3 {
    pub const UP: Vec3 = Vec3 { x: 0.0, y: 0.0, z: 1.0 };

    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub fn dot(&self, other: &Vec3) -> f64 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }
}

/// Directional light parameters
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LightConfig {
    /// Azimuth of the light in degrees
    pub angle_degrees: f64,
    /// Diffuse strength (0.0-1.0)
    pub intensity: f64,
    /// Light floor applied to every lit cell (0.0-1.0)
    pub ambient: f64,
}

impl Default for LightConfig {
    fn default() -> Self {
        Self {
            angle_degrees: 45.0,
            intensity: 0.8,
            ambient: 0.6,
        }
    }
}

impl LightConfig {
    pub fn validate(&self) -> Result<()> {
        if !self.angle_degrees.is_finite() {
            return Err(TerrainError::Configuration(format!(
                "light angle must be finite, got {}",
                self.angle_degrees
            )));
        }
        if !(0.0..=1.0).contains(&self.intensity) {
            return Err(TerrainError::Configuration(format!(
                "light intensity must be in [0, 1], got {}",
                self.intensity
            )));
        }
        if !(0.0..=1.0).contains(&self.ambient) {
            return Err(TerrainError::Configuration(format!(
                "ambient light must be in [0, 1], got {}",
                self.ambient
            )));
        }
        Ok(())
    }
}

/// Light vector for an azimuth; elevation component is fixed at 0.5.
pub fn light_direction(angle_degrees: f64) -> Vec3 {
    let angle = angle_degrees.to_radians();
    Vec3::new(angle.cos(), angle.sin(), 0.5)
}

/// Surface normal at `(x, y)`, not renormalized.
///
/// Cells below `water_max` are flat. On the grid border the missing difference
/// is zero.
pub fn estimate_normal(field: &HeightField, x: usize, y: usize, water_max: f64, strength: f64) -> Vec3 {
    if *field.get(x, y) < water_max {
        return Vec3::UP;
    }

    let dx = if x == 0 || x + 1 >= field.width {
        0.0
    } else {
        (*field.get(x - 1, y) - *field.get(x + 1, y)) * strength
    };

    let dy = if y == 0 || y + 1 >= field.height {
        0.0
    } else {
        (*field.get(x, y - 1) - *field.get(x, y + 1)) * strength
    };

    Vec3::new(-dx, -dy, 1.0)
}

/// Apply ambient + diffuse light to a base color.
pub fn shade(base: Color, normal: Vec3, light: &LightConfig) -> Color {
    let light_dir = light_direction(light.angle_degrees);
    let diffuse = (normal.dot(&light_dir).max(0.0) * light.intensity).min(1.0);
    let total_light = light.ambient + (1.0 - light.ambient) * diffuse;

    let mut out = [0u8; 3];
    for i in 0..3 {
        out[i] = (base[i] as f64 * total_light).round().clamp(0.0, 255.0) as u8;
    }
    out
}

/// Shade one cell of `field`. Water cells keep their base color untouched.
pub fn shade_cell(
    field: &HeightField,
    x: usize,
    y: usize,
    base: Color,
    table: &BiomeTable,
    light: &LightConfig,
    strength: f64,
) -> Color {
    let water_max = table.water_max();
    if *field.get(x, y) < water_max {
        return base;
    }
    let normal = estimate_normal(field, x, y, water_max, strength);
    shade(base, normal, light)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tilemap::Tilemap;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_light_direction() {
        let d = light_direction(0.0);
        assert!(approx(d.x, 1.0) && approx(d.y, 0.0) && approx(d.z, 0.5));
        let d = light_direction(90.0);
        assert!(approx(d.x, 0.0) && approx(d.y, 1.0) && approx(d.z, 0.5));
    }

    #[test]
    fn test_flat_land_normal_points_up() {
        let field = Tilemap::new_with(3, 3, 0.4);
        assert_eq!(estimate_normal(&field, 1, 1, -0.15, DEFAULT_NORMAL_STRENGTH), Vec3::UP);
    }

    #[test]
    fn test_central_differences() {
        let mut field = Tilemap::new_with(3, 3, 0.0);
        field.set(0, 1, 0.2);
        field.set(1, 0, 0.1);
        field.set(1, 2, 0.3);
        let n = estimate_normal(&field, 1, 1, -0.5, 50.0);
        // dx = (0.2 - 0.0) * 50, dy = (0.1 - 0.3) * 50
        assert!(approx(n.x, -10.0));
        assert!(approx(n.y, 10.0));
        assert_eq!(n.z, 1.0);
    }

    #[test]
    fn test_edges_degenerate_to_zero() {
        let field = Tilemap::from_vec(3, 3, vec![
            0.0, 0.1, 0.2,
            0.3, 0.4, 0.5,
            0.6, 0.7, 0.8,
        ]).unwrap();
        // Corner: both differences are missing
        assert_eq!(estimate_normal(&field, 0, 0, -1.0, 50.0), Vec3::UP);
        // Left edge keeps the vertical difference only
        let n = estimate_normal(&field, 0, 1, -1.0, 50.0);
        assert_eq!(n.x, 0.0);
        assert!(approx(n.y, -((0.0 - 0.6) * 50.0)));
        // Bottom edge keeps the horizontal difference only
        let n = estimate_normal(&field, 1, 2, -1.0, 50.0);
        assert!(approx(n.x, -((0.6 - 0.8) * 50.0)));
        assert_eq!(n.y, 0.0);
    }

    #[test]
    fn test_water_normal_is_flat() {
        let mut field = Tilemap::new_with(3, 3, -0.5);
        field.set(0, 1, 0.9);
        assert_eq!(estimate_normal(&field, 1, 1, -0.15, 50.0), Vec3::UP);
    }

    #[test]
    fn test_shade_flat_default_light() {
        let light = LightConfig::default();
        // dot = 0.5, diffuse = 0.4, total = 0.6 + 0.4 * 0.4 = 0.76
        assert_eq!(shade([100, 200, 50], Vec3::UP, &light), [76, 152, 38]);
    }

    #[test]
    fn test_shade_full_ambient_is_identity() {
        let light = LightConfig { ambient: 1.0, ..LightConfig::default() };
        assert_eq!(shade([12, 34, 56], Vec3::new(-30.0, 4.0, 1.0), &light), [12, 34, 56]);
    }

    #[test]
    fn test_shade_channels_in_range() {
        let normals = [
            Vec3::UP,
            Vec3::new(500.0, 500.0, 1.0),
            Vec3::new(-500.0, -500.0, 1.0),
            Vec3::new(0.0, 0.0, -1.0),
        ];
        for normal in normals {
            for angle in [0.0, 45.0, 135.0, 270.0] {
                for intensity in [0.0, 0.5, 1.0] {
                    for ambient in [0.0, 0.3, 1.0] {
                        let light = LightConfig { angle_degrees: angle, intensity, ambient };
                        let c = shade([255, 128, 0], normal, &light);
                        assert_eq!(c[2], 0);
                        assert!(c[1] <= 128);
                        assert!(c[0] >= (255.0 * ambient).floor() as u8);
                    }
                }
            }
        }
    }

    #[test]
    fn test_water_bypasses_shading() {
        let table = BiomeTable::fixed();
        let mut field = Tilemap::new_with(3, 3, -0.6);
        field.set(2, 1, 0.8);
        let light = LightConfig { ambient: 0.1, intensity: 1.0, angle_degrees: 10.0 };
        let base = [30, 180, 200];
        assert_eq!(shade_cell(&field, 1, 1, base, &table, &light, 50.0), base);
    }

    #[test]
    fn test_land_cell_is_shaded() {
        let table = BiomeTable::fixed();
        let field = Tilemap::new_with(3, 3, 0.25);
        let light = LightConfig::default();
        assert_eq!(shade_cell(&field, 1, 1, [100, 100, 100], &table, &light, 50.0), [76, 76, 76]);
    }

    #[test]
    fn test_light_config_validation() {
        assert!(LightConfig::default().validate().is_ok());
        assert!(LightConfig { intensity: 1.2, ..LightConfig::default() }.validate().is_err());
        assert!(LightConfig { ambient: -0.1, ..LightConfig::default() }.validate().is_err());
        assert!(LightConfig { angle_degrees: f64::INFINITY, ..LightConfig::default() }.validate().is_err());
    }
}

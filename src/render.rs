//! Rasterize a height field into an RGB pixel buffer

use image::{ImageBuffer, Rgb, RgbImage};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::biomes::BiomeTable;
use crate::error::{Result, TerrainError};
use crate::heightmap::normalize_heightmap;
use crate::lighting::{shade_cell, LightConfig};
use crate::tilemap::HeightField;

/// What a frame shows
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RenderMode {
    /// Biome colors only
    Flat,
    /// Biome colors with directional lighting
    #[default]
    Shaded,
    /// Grayscale heights
    Heightmap,
}

impl RenderMode {
    pub fn all() -> &'static [Self] {
        &[Self::Flat, Self::Shaded, Self::Heightmap]
    }

    pub fn label(&self) -> &'static str {
        match self {
            RenderMode::Flat => "Terrain (Biomes)",
            RenderMode::Shaded => "Shaded Terrain",
            RenderMode::Heightmap => "Heightmap",
        }
    }
}

impl std::fmt::Display for RenderMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Flat => write!(f, "flat"),
            Self::Shaded => write!(f, "shaded"),
            Self::Heightmap => write!(f, "heightmap"),
        }
    }
}

impl std::str::FromStr for RenderMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "flat" | "biomes" => Ok(Self::Flat),
            "shaded" => Ok(Self::Shaded),
            "heightmap" | "height" => Ok(Self::Heightmap),
            other => Err(format!("unknown render mode '{}' (expected flat, shaded or heightmap)", other)),
        }
    }
}

/// Fill a `width * height * 3` buffer row by row in parallel.
fn render_rows<F>(field: &HeightField, pixel: F) -> Result<RgbImage>
where
    F: Fn(usize, usize) -> [u8; 3] + Sync,
{
    let width = field.width;
    let height = field.height;
    if width == 0 || height == 0 {
        return Err(TerrainError::Dimension { width, height });
    }
    let (Ok(w), Ok(h)) = (u32::try_from(width), u32::try_from(height)) else {
        return Err(TerrainError::Dimension { width, height });
    };

    let mut raw = vec![0u8; width * height * 3];
    raw.par_chunks_mut(width * 3)
        .enumerate()
        .for_each(|(y, row)| {
            for (x, out) in row.chunks_exact_mut(3).enumerate() {
                out.copy_from_slice(&pixel(x, y));
            }
        });

    ImageBuffer::from_raw(w, h, raw).ok_or(TerrainError::Dimension { width, height })
}

/// Biome colors without lighting
pub fn render_terrain_map(field: &HeightField, table: &BiomeTable) -> Result<RgbImage> {
    render_rows(field, |x, y| table.classify(*field.get(x, y)))
}

/// Biome colors shaded by the height-field normals. Water is left unshaded.
pub fn render_terrain_shaded(
    field: &HeightField,
    table: &BiomeTable,
    light: &LightConfig,
    normal_strength: f64,
) -> Result<RgbImage> {
    render_rows(field, |x, y| {
        let base = table.classify(*field.get(x, y));
        shade_cell(field, x, y, base, table, light, normal_strength)
    })
}

/// Min-max normalized grayscale
pub fn render_heightmap(field: &HeightField) -> Result<RgbImage> {
    let normalized = normalize_heightmap(field);
    render_rows(&normalized, |x, y| {
        let v = (*normalized.get(x, y) * 255.0).round().clamp(0.0, 255.0) as u8;
        [v, v, v]
    })
}

/// Render `field` in the requested mode.
pub fn render(
    field: &HeightField,
    mode: RenderMode,
    table: &BiomeTable,
    light: &LightConfig,
    normal_strength: f64,
) -> Result<RgbImage> {
    match mode {
        RenderMode::Flat => render_terrain_map(field, table),
        RenderMode::Shaded => render_terrain_shaded(field, table, light, normal_strength),
        RenderMode::Heightmap => render_heightmap(field),
    }
}

/// Pack an RGB pixel as `0x00RRGGBB`
pub fn pack_rgb(pixel: &Rgb<u8>) -> u32 {
    ((pixel[0] as u32) << 16) | ((pixel[1] as u32) << 8) | pixel[2] as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::biomes::BiomeKind;
    use crate::tilemap::Tilemap;

    fn ramp() -> HeightField {
        Tilemap::from_vec(4, 2, vec![
            -0.9, -0.5, -0.12, 0.0,
            0.25, 0.35, 0.6, 1.2,
        ]).unwrap()
    }

    #[test]
    fn test_buffer_layout() {
        let field = ramp();
        let img = render_terrain_map(&field, &BiomeTable::fixed()).unwrap();
        assert_eq!((img.width(), img.height()), (4, 2));
        assert_eq!(img.as_raw().len(), 4 * 2 * 3);
        // Row-major: pixel (3, 1) is the last triple
        assert_eq!(&img.as_raw()[21..24], &[255, 255, 255]);
    }

    #[test]
    fn test_flat_matches_classifier() {
        let field = ramp();
        let table = BiomeTable::fixed();
        let img = render_terrain_map(&field, &table).unwrap();
        for (x, y, &h) in field.iter() {
            assert_eq!(img.get_pixel(x as u32, y as u32).0, table.classify(h));
        }
    }

    #[test]
    fn test_shaded_leaves_water_untouched() {
        let field = ramp();
        let table = BiomeTable::fixed();
        let light = LightConfig { ambient: 0.2, ..LightConfig::default() };
        let img = render_terrain_shaded(&field, &table, &light, 50.0).unwrap();
        for (x, y, &h) in field.iter() {
            if table.band_for(h).kind == BiomeKind::Water {
                assert_eq!(img.get_pixel(x as u32, y as u32).0, table.classify(h));
            }
        }
        // Land gets darkened by the ambient floor
        let land = img.get_pixel(3, 1).0;
        assert!(land[0] < 255);
    }

    #[test]
    fn test_heightmap_grayscale_extremes() {
        let img = render_heightmap(&ramp()).unwrap();
        assert_eq!(img.get_pixel(0, 0).0, [0, 0, 0]);
        assert_eq!(img.get_pixel(3, 1).0, [255, 255, 255]);
    }

    #[test]
    fn test_empty_field_rejected() {
        let field: HeightField = Tilemap::new(0, 3);
        assert!(matches!(
            render(&field, RenderMode::Flat, &BiomeTable::fixed(), &LightConfig::default(), 50.0),
            Err(TerrainError::Dimension { .. })
        ));
    }

    #[test]
    fn test_mode_parsing() {
        assert_eq!("Shaded".parse::<RenderMode>(), Ok(RenderMode::Shaded));
        assert_eq!("height".parse::<RenderMode>(), Ok(RenderMode::Heightmap));
        assert!("wireframe".parse::<RenderMode>().is_err());
        for mode in RenderMode::all() {
            assert_eq!(mode.to_string().parse::<RenderMode>(), Ok(*mode));
        }
    }

    #[test]
    fn test_pack_rgb() {
        assert_eq!(pack_rgb(&Rgb([0x12, 0x34, 0x56])), 0x123456);
    }
}

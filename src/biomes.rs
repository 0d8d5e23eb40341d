//! Height-band biome classification
//!
//! A `BiomeTable` is an ordered, gapless run of height bands. Each band maps its
//! interval onto a two-stop color gradient.

use serde::{Deserialize, Serialize};

use crate::error::{Result, TerrainError};

/// RGB triple
pub type Color = [u8; 3];

/// Lowest sea level the parameterized table accepts
pub const SEA_LEVEL_MIN: f64 = -0.3;
/// Highest sea level the parameterized table accepts
pub const SEA_LEVEL_MAX: f64 = 0.3;
/// Sea level of the default terrain
pub const DEFAULT_SEA_LEVEL: f64 = -0.15;

// Band widths above sea level; snow takes whatever is left up to 1.0
const SAND_DELTA: f64 = 0.05;
const GRASS_DELTA: f64 = 0.25;
const FOREST_DELTA: f64 = 0.10;
const MOUNTAIN_DELTA: f64 = 0.15;

/// Terrain kinds, lowest first
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BiomeKind {
    Water,
    Sand,
    Grass,
    Forest,
    Mountain,
    Snow,
}

impl BiomeKind {
    pub fn all() -> &'static [Self] {
        &[Self::Water, Self::Sand, Self::Grass, Self::Forest, Self::Mountain, Self::Snow]
    }

    /// Gradient endpoints (low, high)
    pub fn colors(&self) -> (Color, Color) {
        match self {
            BiomeKind::Water => ([0, 0, 0], [40, 255, 255]),
            BiomeKind::Sand => ([215, 192, 100], [255, 246, 120]),
            BiomeKind::Grass => ([20, 150, 40], [100, 200, 50]),
            BiomeKind::Forest => ([34, 139, 34], [85, 160, 85]),
            BiomeKind::Mountain => ([120, 100, 60], [180, 160, 100]),
            BiomeKind::Snow => ([245, 245, 245], [255, 255, 255]),
        }
    }
}

impl std::fmt::Display for BiomeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Water => write!(f, "water"),
            Self::Sand => write!(f, "sand"),
            Self::Grass => write!(f, "grass"),
            Self::Forest => write!(f, "forest"),
            Self::Mountain => write!(f, "mountain"),
            Self::Snow => write!(f, "snow"),
        }
    }
}

/// Which of the two six-band tables to classify with
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BandLayout {
    /// Fixed thresholds
    Fixed,
    /// Thresholds derived from the sea level
    #[default]
    SeaLevel,
}

impl std::str::FromStr for BandLayout {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace('-', "_").as_str() {
            "fixed" => Ok(Self::Fixed),
            "sea_level" => Ok(Self::SeaLevel),
            other => Err(format!("unknown band layout '{}' (expected fixed or sea-level)", other)),
        }
    }
}

/// One height interval and its color gradient
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TerrainBand {
    pub kind: BiomeKind,
    pub min_height: f64,
    pub max_height: f64,
    pub min_color: Color,
    pub max_color: Color,
}

impl TerrainBand {
    /// Band using the kind's default gradient
    pub fn new(kind: BiomeKind, min_height: f64, max_height: f64) -> Self {
        let (min_color, max_color) = kind.colors();
        Self { kind, min_height, max_height, min_color, max_color }
    }

    /// Interpolated color for `height`. Heights outside the band return the
    /// nearest endpoint color unmodified.
    pub fn color_at(&self, height: f64) -> Color {
        if height < self.min_height {
            return self.min_color;
        }
        if height > self.max_height {
            return self.max_color;
        }
        let factor = ((height - self.min_height) / (self.max_height - self.min_height)).clamp(0.0, 1.0);
        lerp_color(self.min_color, self.max_color, factor)
    }
}

/// Per-channel linear interpolation, truncated toward zero
pub fn lerp_color(from: Color, to: Color, factor: f64) -> Color {
    let mut out = [0u8; 3];
    for i in 0..3 {
        let c = from[i] as f64 + (to[i] as f64 - from[i] as f64) * factor;
        out[i] = c.clamp(0.0, 255.0) as u8;
    }
    out
}

// =============================================================================
// BIOME TABLE
// =============================================================================

/// Ordered bands covering at least [-1, 1] with no gaps or overlaps
#[derive(Clone, Debug, PartialEq)]
pub struct BiomeTable {
    bands: Vec<TerrainBand>,
}

impl BiomeTable {
    /// Build a table, rejecting empty, inverted, gapped or overlapping bands.
    pub fn new(bands: Vec<TerrainBand>) -> Result<Self> {
        validate_bands(&bands)?;
        Ok(Self { bands })
    }

    /// Fixed six-band table
    pub fn fixed() -> Self {
        Self {
            bands: vec![
                TerrainBand::new(BiomeKind::Water, -1.0, -0.15),
                TerrainBand::new(BiomeKind::Sand, -0.15, -0.1),
                TerrainBand::new(BiomeKind::Grass, -0.1, 0.2),
                TerrainBand::new(BiomeKind::Forest, 0.2, 0.3),
                TerrainBand::new(BiomeKind::Mountain, 0.3, 0.45),
                TerrainBand::new(BiomeKind::Snow, 0.45, 1.0),
            ],
        }
    }

    /// Six-band table with every threshold derived from `sea_level`.
    pub fn with_sea_level(sea_level: f64) -> Result<Self> {
        if !sea_level.is_finite() || !(SEA_LEVEL_MIN..=SEA_LEVEL_MAX).contains(&sea_level) {
            return Err(TerrainError::Configuration(format!(
                "sea level {} outside [{}, {}]",
                sea_level, SEA_LEVEL_MIN, SEA_LEVEL_MAX
            )));
        }

        let sand_max = sea_level + SAND_DELTA;
        let grass_max = sand_max + GRASS_DELTA;
        let forest_max = grass_max + FOREST_DELTA;
        let mountain_max = forest_max + MOUNTAIN_DELTA;

        Self::new(vec![
            TerrainBand::new(BiomeKind::Water, -1.0, sea_level),
            TerrainBand::new(BiomeKind::Sand, sea_level, sand_max),
            TerrainBand::new(BiomeKind::Grass, sand_max, grass_max),
            TerrainBand::new(BiomeKind::Forest, grass_max, forest_max),
            TerrainBand::new(BiomeKind::Mountain, forest_max, mountain_max),
            TerrainBand::new(BiomeKind::Snow, mountain_max, 1.0),
        ])
    }

    /// Table for `layout`; `sea_level` only matters for `BandLayout::SeaLevel`.
    pub fn for_layout(layout: BandLayout, sea_level: f64) -> Result<Self> {
        match layout {
            BandLayout::Fixed => Ok(Self::fixed()),
            BandLayout::SeaLevel => Self::with_sea_level(sea_level),
        }
    }

    /// Rebuild every threshold for a new sea level. On error the table is left
    /// untouched.
    pub fn set_sea_level(&mut self, sea_level: f64) -> Result<()> {
        let rebuilt = Self::with_sea_level(sea_level)?;
        *self = rebuilt;
        Ok(())
    }

    pub fn bands(&self) -> &[TerrainBand] {
        &self.bands
    }

    /// Upper bound of the lowest (water) band
    pub fn water_max(&self) -> f64 {
        self.bands[0].max_height
    }

    /// First band whose upper bound exceeds `height`, or the last band.
    pub fn band_for(&self, height: f64) -> &TerrainBand {
        self.bands
            .iter()
            .find(|band| height < band.max_height)
            .unwrap_or(&self.bands[self.bands.len() - 1])
    }

    /// Base color for `height`
    pub fn classify(&self, height: f64) -> Color {
        self.band_for(height).color_at(height)
    }
}

impl Default for BiomeTable {
    fn default() -> Self {
        Self::fixed()
    }
}

/// Base color for `height` under `table`
pub fn classify(height: f64, table: &BiomeTable) -> Color {
    table.classify(height)
}

fn validate_bands(bands: &[TerrainBand]) -> Result<()> {
    let (Some(first), Some(last)) = (bands.first(), bands.last()) else {
        return Err(TerrainError::Configuration("biome table has no bands".to_string()));
    };

    for (i, band) in bands.iter().enumerate() {
        if !band.min_height.is_finite() || !band.max_height.is_finite() {
            return Err(TerrainError::Configuration(format!(
                "band {} ({}) has a non-finite bound",
                i, band.kind
            )));
        }
        if band.min_height >= band.max_height {
            return Err(TerrainError::Configuration(format!(
                "band {} ({}) is inverted: {} >= {}",
                i, band.kind, band.min_height, band.max_height
            )));
        }
    }

    for (i, pair) in bands.windows(2).enumerate() {
        if pair[0].max_height != pair[1].min_height {
            return Err(TerrainError::Configuration(format!(
                "bands {} and {} are not contiguous: {} vs {}",
                i,
                i + 1,
                pair[0].max_height,
                pair[1].min_height
            )));
        }
    }

    if first.min_height > -1.0 || last.max_height < 1.0 {
        return Err(TerrainError::Configuration(format!(
            "bands cover [{}, {}], need at least [-1, 1]",
            first.min_height, last.max_height
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_contiguous(table: &BiomeTable) {
        let bands = table.bands();
        for pair in bands.windows(2) {
            assert_eq!(pair[0].max_height, pair[1].min_height);
            assert!(pair[0].min_height < pair[0].max_height);
        }
        assert!(bands[0].min_height <= -1.0);
        assert!(bands[bands.len() - 1].max_height >= 1.0);
    }

    #[test]
    fn test_fixed_table_is_valid() {
        let table = BiomeTable::fixed();
        assert!(BiomeTable::new(table.bands().to_vec()).is_ok());
        assert_contiguous(&table);
        assert_eq!(table.bands().len(), 6);
    }

    #[test]
    fn test_sea_level_tables_contiguous_across_range() {
        let mut level = SEA_LEVEL_MIN;
        while level <= SEA_LEVEL_MAX {
            let table = BiomeTable::with_sea_level(level).unwrap();
            assert_contiguous(&table);
            assert_eq!(table.water_max(), level);
            level += 0.01;
        }
        assert_contiguous(&BiomeTable::with_sea_level(SEA_LEVEL_MAX).unwrap());
    }

    #[test]
    fn test_sea_level_thresholds() {
        let table = BiomeTable::with_sea_level(0.0).unwrap();
        let maxes: Vec<f64> = table.bands().iter().map(|b| b.max_height).collect();
        let expected = [0.0, 0.05, 0.30, 0.40, 0.55, 1.0];
        for (got, want) in maxes.iter().zip(expected) {
            assert!((got - want).abs() < 1e-12, "{} vs {}", got, want);
        }
    }

    #[test]
    fn test_set_sea_level_out_of_range_keeps_table() {
        let mut table = BiomeTable::with_sea_level(-0.1).unwrap();
        let before = table.clone();
        assert!(matches!(table.set_sea_level(0.31), Err(TerrainError::Configuration(_))));
        assert!(matches!(table.set_sea_level(f64::NAN), Err(TerrainError::Configuration(_))));
        assert_eq!(table, before);

        table.set_sea_level(0.2).unwrap();
        assert_eq!(table.water_max(), 0.2);
        assert_contiguous(&table);
    }

    #[test]
    fn test_for_layout() {
        assert_eq!(BiomeTable::for_layout(BandLayout::Fixed, 0.25).unwrap(), BiomeTable::fixed());
        let table = BiomeTable::for_layout(BandLayout::SeaLevel, 0.25).unwrap();
        assert_eq!(table.water_max(), 0.25);
    }

    #[test]
    fn test_band_layout_parsing() {
        assert_eq!("fixed".parse::<BandLayout>(), Ok(BandLayout::Fixed));
        assert_eq!("sea-level".parse::<BandLayout>(), Ok(BandLayout::SeaLevel));
        assert_eq!("SEA_LEVEL".parse::<BandLayout>(), Ok(BandLayout::SeaLevel));
        assert!("terraced".parse::<BandLayout>().is_err());
    }

    #[test]
    fn test_boundary_exactness() {
        for table in [BiomeTable::fixed(), BiomeTable::with_sea_level(0.07).unwrap()] {
            for band in table.bands() {
                assert_eq!(band.color_at(band.min_height), band.min_color);
                assert_eq!(band.color_at(band.max_height), band.max_color);
            }
        }
    }

    #[test]
    fn test_sea_level_boundary_classifies_as_sand() {
        let table = BiomeTable::fixed();
        let band = table.band_for(-0.15);
        assert_eq!(band.kind, BiomeKind::Sand);
        assert_eq!(classify(-0.15, &table), [215, 192, 100]);
    }

    #[test]
    fn test_out_of_range_heights() {
        let table = BiomeTable::fixed();
        assert_eq!(table.band_for(1.7).kind, BiomeKind::Snow);
        assert_eq!(table.classify(1.7), [255, 255, 255]);
        assert_eq!(table.band_for(-3.0).kind, BiomeKind::Water);
        assert_eq!(table.classify(-3.0), [0, 0, 0]);
    }

    #[test]
    fn test_interpolation_midpoint() {
        let band = TerrainBand::new(BiomeKind::Water, -1.0, 0.0);
        // 0 + 40 * 0.5 = 20, 0 + 255 * 0.5 = 127.5 -> 127
        assert_eq!(band.color_at(-0.5), [20, 127, 127]);
    }

    #[test]
    fn test_classify_channels_in_range() {
        let table = BiomeTable::with_sea_level(-0.2).unwrap();
        let mut h = -2.0;
        while h <= 2.0 {
            let c = table.classify(h);
            let band = table.band_for(h);
            for i in 0..3 {
                let lo = band.min_color[i].min(band.max_color[i]);
                let hi = band.min_color[i].max(band.max_color[i]);
                assert!(c[i] >= lo && c[i] <= hi);
            }
            h += 0.013;
        }
    }

    #[test]
    fn test_invalid_tables_rejected() {
        let gap = vec![
            TerrainBand::new(BiomeKind::Water, -1.0, 0.0),
            TerrainBand::new(BiomeKind::Snow, 0.1, 1.0),
        ];
        let overlap = vec![
            TerrainBand::new(BiomeKind::Water, -1.0, 0.2),
            TerrainBand::new(BiomeKind::Snow, 0.1, 1.0),
        ];
        let inverted = vec![
            TerrainBand::new(BiomeKind::Water, -1.0, 0.5),
            TerrainBand::new(BiomeKind::Sand, 0.5, 0.4),
            TerrainBand::new(BiomeKind::Snow, 0.4, 1.0),
        ];
        let short = vec![TerrainBand::new(BiomeKind::Water, -0.5, 1.0)];

        for bands in [gap, overlap, inverted, short, Vec::new()] {
            assert!(matches!(BiomeTable::new(bands), Err(TerrainError::Configuration(_))));
        }
    }
}

//! Height field synthesis from layered Perlin noise (fBm)
//!
//! Every cell is sampled independently at `(x * scale, y * scale)`, so rows are
//! generated in parallel. The noise seed is fixed per configuration, which makes
//! a pass a pure function of `(width, height, NoiseConfig)`.

use noise::{NoiseFn, Perlin};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::{Result, TerrainError};
use crate::tilemap::{HeightField, Tilemap};

// =============================================================================
// NOISE PARAMETERS
// =============================================================================

/// Base seed of the noise function
pub const DEFAULT_SEED: u32 = 42;

/// Upper bound on accumulated layers
pub const MAX_OCTAVES: u32 = 10;

/// Parameters for one noise sampling pass
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NoiseConfig {
    /// Sampling step per cell (lower = larger features)
    pub scale: f64,
    /// Number of noise octaves (1-10)
    pub octaves: u32,
    /// Amplitude decay per octave (0.0-1.0]
    pub persistence: f64,
    /// Frequency multiplier per octave (>= 1.0)
    pub lacunarity: f64,
    /// Noise base
    pub seed: u32,
}

impl Default for NoiseConfig {
    fn default() -> Self {
        Self {
            scale: 0.005,
            octaves: 8,
            persistence: 0.6,
            lacunarity: 2.0,
            seed: DEFAULT_SEED,
        }
    }
}

impl NoiseConfig {
    /// Reject parameters that would make the fBm sum meaningless.
    pub fn validate(&self) -> Result<()> {
        if !self.scale.is_finite() || self.scale <= 0.0 {
            return Err(TerrainError::Configuration(format!(
                "scale must be positive, got {}",
                self.scale
            )));
        }
        if self.octaves < 1 || self.octaves > MAX_OCTAVES {
            return Err(TerrainError::Configuration(format!(
                "octaves must be in [1, {}], got {}",
                MAX_OCTAVES, self.octaves
            )));
        }
        if !self.persistence.is_finite() || self.persistence <= 0.0 || self.persistence > 1.0 {
            return Err(TerrainError::Configuration(format!(
                "persistence must be in (0, 1], got {}",
                self.persistence
            )));
        }
        if !self.lacunarity.is_finite() || self.lacunarity < 1.0 {
            return Err(TerrainError::Configuration(format!(
                "lacunarity must be >= 1, got {}",
                self.lacunarity
            )));
        }
        Ok(())
    }
}

// =============================================================================
// HEIGHT FIELD GENERATION
// =============================================================================

/// Sample a `width` x `height` height field.
///
/// Values are roughly in [-1, 1] but are not clamped. Identical inputs always
/// give a bit-identical field.
pub fn generate(width: usize, height: usize, config: &NoiseConfig) -> Result<HeightField> {
    if width == 0 || height == 0 {
        return Err(TerrainError::Dimension { width, height });
    }
    config.validate()?;

    let noise = Perlin::new(config.seed);
    let mut data = vec![0.0f64; width * height];

    data.par_chunks_mut(width)
        .enumerate()
        .for_each(|(y, row)| {
            for (x, cell) in row.iter_mut().enumerate() {
                *cell = fbm(
                    &noise,
                    x as f64 * config.scale,
                    y as f64 * config.scale,
                    config.octaves,
                    config.persistence,
                    config.lacunarity,
                );
            }
        });

    Tilemap::from_vec(width, height, data)
        .ok_or(TerrainError::Dimension { width, height })
}

/// Fractal Brownian motion, normalized by the summed amplitude
pub fn fbm(
    noise: &Perlin,
    x: f64,
    y: f64,
    octaves: u32,
    persistence: f64,
    lacunarity: f64,
) -> f64 {
    let mut total = 0.0;
    let mut amplitude = 1.0;
    let mut frequency = 1.0;
    let mut max_value = 0.0;

    for _ in 0..octaves {
        total += amplitude * noise.get([x * frequency, y * frequency]);
        max_value += amplitude;
        amplitude *= persistence;
        frequency *= lacunarity;
    }

    total / max_value
}

/// Rescale a height field into [0, 1] for grayscale display.
pub fn normalize_heightmap(heightmap: &HeightField) -> HeightField {
    let Some((min_val, max_val)) = heightmap.min_max() else {
        return heightmap.clone();
    };

    let range = max_val - min_val;
    if range < 0.0001 {
        return Tilemap::new_with(heightmap.width, heightmap.height, 0.5);
    }

    let mut normalized = heightmap.clone();
    for (_, _, val) in normalized.iter_mut() {
        *val = (*val - min_val) / range;
    }
    normalized
}

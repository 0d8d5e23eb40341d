//! Procedural terrain generation library
//!
//! Noise height field -> biome classification -> directional shading ->
//! viewport mapping, orchestrated by [`pipeline::TerrainPipeline`].

pub mod biomes;
pub mod config;
pub mod error;
pub mod heightmap;
pub mod lighting;
pub mod pipeline;
pub mod render;
pub mod tilemap;
pub mod viewer;
pub mod viewport;

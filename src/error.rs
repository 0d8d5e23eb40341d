//! Error types shared by the generation pipeline

use crate::viewport::TexCoordRect;

/// Errors that can occur while configuring or running terrain generation
#[derive(Debug, Clone, PartialEq)]
pub enum TerrainError {
    /// Invalid parameter or band table (inverted, overlapping or gapped bands,
    /// sea level outside its range, noise parameter out of bounds)
    Configuration(String),
    /// Zero-sized generation request
    Dimension { width: usize, height: usize },
    /// A viewport rectangle left [0, 1] after clamping
    RangeViolation(TexCoordRect),
    /// Settings file could not be read
    Io(String),
    /// Settings file could not be parsed
    Parse(String),
}

impl std::fmt::Display for TerrainError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TerrainError::Configuration(e) => write!(f, "Configuration error: {}", e),
            TerrainError::Dimension { width, height } => {
                write!(f, "Invalid dimensions: {}x{}", width, height)
            }
            TerrainError::RangeViolation(rect) => write!(
                f,
                "Viewport rectangle out of range: u [{:.4}, {:.4}], v [{:.4}, {:.4}]",
                rect.u_min, rect.u_max, rect.v_min, rect.v_max
            ),
            TerrainError::Io(e) => write!(f, "IO error: {}", e),
            TerrainError::Parse(e) => write!(f, "Parse error: {}", e),
        }
    }
}

impl std::error::Error for TerrainError {}

impl From<std::io::Error> for TerrainError {
    fn from(e: std::io::Error) -> Self {
        TerrainError::Io(e.to_string())
    }
}

impl From<serde_json::Error> for TerrainError {
    fn from(e: serde_json::Error) -> Self {
        TerrainError::Parse(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, TerrainError>;

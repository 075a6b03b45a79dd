//! Error types for pattern conversion.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for pattern operations
pub type Result<T> = std::result::Result<T, PatternError>;

#[derive(Error, Debug)]
pub enum PatternError {
    /// Palette data is missing a required field or cannot be parsed.
    /// Fatal at startup; never retried.
    #[error("Malformed palette entry {index}: {reason}")]
    MalformedPalette { index: usize, reason: String },

    /// Invalid grid size, page size or missing required input.
    #[error("Invalid configuration: {0}")]
    Configuration(String),

    /// A grid cell covered no source pixels.
    #[error("Grid cell ({x}, {y}) contains no pixels")]
    EmptyCell { x: u32, y: u32 },

    #[error("Failed to decode image: {0}")]
    ImageDecode(#[from] image::ImageError),

    #[error("Failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl PatternError {
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    pub fn malformed(index: usize, reason: impl Into<String>) -> Self {
        Self::MalformedPalette {
            index,
            reason: reason.into(),
        }
    }

    /// True for errors that only reject the current conversion request.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::Configuration(_) | Self::ImageDecode(_))
    }
}

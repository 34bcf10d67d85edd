//! Error types shared across the crate.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised when a frame or detection is rejected at the boundary.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AgentError {
    /// Frame width or height is zero.
    #[error("invalid frame geometry: {width}x{height}")]
    InvalidGeometry { width: u32, height: u32 },

    /// A detection is missing a required field or carries unusable values.
    #[error("malformed detection: {0}")]
    MalformedDetection(String),

    /// Pixel buffer does not match the declared frame layout.
    #[error("invalid frame buffer: {0}")]
    InvalidFrame(String),
}

/// Errors raised while loading or validating settings.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config value `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },
}

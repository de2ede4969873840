//! Error handling for SceneSync
//!
//! Nothing in the scene core is fatal: these errors describe why a piece
//! of work (a toolpath build, a texture fetch, a config load) did not
//! update the scene, and are reported to callers or logged.
//!
//! All error types use `thiserror` for ergonomic error handling.

use thiserror::Error;

/// Toolpath geometry error type
///
/// Raised while converting a toolpath description into scene geometry.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ToolpathError {
    /// A vertex had a NaN or infinite component
    #[error("Non-finite coordinate in segment {segment} at point {point}")]
    NonFiniteCoordinate {
        /// Index of the offending segment.
        segment: usize,
        /// Index of the offending point within the segment.
        point: usize,
    },

    /// A segment carried fewer than two points
    #[error("Segment {segment} has {points} point(s); at least 2 are required")]
    DegenerateSegment {
        /// Index of the offending segment.
        segment: usize,
        /// Number of points found.
        points: usize,
    },

    /// The raw toolpath payload could not be decoded
    #[error("Malformed toolpath description: {reason}")]
    Malformed {
        /// Decoder message.
        reason: String,
    },
}

/// Asset loading error type
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AssetError {
    /// The texture could not be fetched or decoded
    #[error("Texture {url} unavailable: {reason}")]
    TextureUnavailable {
        /// Location the texture was requested from.
        url: String,
        /// Why it failed.
        reason: String,
    },
}

/// Main error type for SceneSync
#[derive(Error, Debug)]
pub enum Error {
    /// Toolpath error
    #[error(transparent)]
    Toolpath(#[from] ToolpathError),

    /// Asset error
    #[error(transparent)]
    Asset(#[from] AssetError),

    /// Invalid configuration value
    #[error("Invalid configuration: {reason}")]
    Config {
        /// What was wrong.
        reason: String,
    },

    /// Standard I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create an error from a string message
    pub fn other(msg: impl Into<String>) -> Self {
        Error::Other(msg.into())
    }

    /// Create a configuration error
    pub fn config(reason: impl Into<String>) -> Self {
        Error::Config {
            reason: reason.into(),
        }
    }

    /// Check if this is a toolpath error
    pub fn is_toolpath_error(&self) -> bool {
        matches!(self, Error::Toolpath(_))
    }

    /// Check if this is a configuration error
    pub fn is_config_error(&self) -> bool {
        matches!(self, Error::Config { .. })
    }
}

/// Result type using Error
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toolpath_error_converts() {
        let err: Error = ToolpathError::DegenerateSegment {
            segment: 3,
            points: 1,
        }
        .into();
        assert!(err.is_toolpath_error());
        assert_eq!(
            err.to_string(),
            "Segment 3 has 1 point(s); at least 2 are required"
        );
    }

    #[test]
    fn test_config_error() {
        let err = Error::config("fov must be positive");
        assert!(err.is_config_error());
        assert_eq!(err.to_string(), "Invalid configuration: fov must be positive");
    }
}

//! Failures while reading, writing, or locating settings files.

use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SettingsError {
    /// The file extension is neither `.json` nor `.toml`.
    #[error("Unsupported settings format: {0}")]
    UnsupportedFormat(String),

    /// No platform config directory, or it could not be created
    #[error("Settings directory unavailable: {0}")]
    ConfigDirectory(String),

    /// A stored value has a different type than the caller asked for.
    #[error("Setting '{key}' is not a {expected}")]
    TypeMismatch {
        /// Settings key.
        key: String,
        /// Requested type.
        expected: &'static str,
    },

    #[error("Settings file I/O failed: {0}")]
    Io(#[from] io::Error),

    #[error("Malformed JSON settings: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Malformed TOML settings: {0}")]
    TomlDe(#[from] toml::de::Error),

    #[error("Settings could not be encoded as TOML: {0}")]
    TomlSer(#[from] toml::ser::Error),
}

/// Result type for settings operations.
pub type Result<T> = std::result::Result<T, SettingsError>;

impl From<SettingsError> for scenesync_core::Error {
    fn from(err: SettingsError) -> Self {
        match err {
            SettingsError::Io(e) => scenesync_core::Error::Io(e),
            SettingsError::Json(e) => scenesync_core::Error::Json(e),
            other => scenesync_core::Error::config(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_mismatch_message() {
        let err = SettingsError::TypeMismatch {
            key: "widgets.visualizer.animation".to_string(),
            expected: "boolean",
        };
        assert_eq!(
            err.to_string(),
            "Setting 'widgets.visualizer.animation' is not a boolean"
        );
    }

    #[test]
    fn test_conversion_to_core_error() {
        let core: scenesync_core::Error =
            SettingsError::UnsupportedFormat("yaml".to_string()).into();
        assert!(core.is_config_error());
    }
}

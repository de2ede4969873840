//! Settings Persistence
//!
//! Loads and saves any serde type from/to `.json` or `.toml` files, chosen
//! by extension, and locates the per-user configuration directory.

use crate::error::{Result, SettingsError};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::{Path, PathBuf};

const APP_DIR: &str = "scenesync";
const SETTINGS_FILE: &str = "settings.json";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Format {
    Json,
    Toml,
}

fn format_of(path: &Path) -> Result<Format> {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some("json") => Ok(Format::Json),
        Some("toml") => Ok(Format::Toml),
        other => Err(SettingsError::UnsupportedFormat(
            other.unwrap_or("<none>").to_string(),
        )),
    }
}

/// Load a value from a `.json` or `.toml` file
pub fn load_from_file<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let format = format_of(path)?;
    let content = std::fs::read_to_string(path)?;
    let value = match format {
        Format::Json => serde_json::from_str(&content)?,
        Format::Toml => toml::from_str(&content)?,
    };
    tracing::debug!("Loaded settings from {}", path.display());
    Ok(value)
}

/// Save a value to a `.json` or `.toml` file, creating parent directories
pub fn save_to_file<T: Serialize>(value: &T, path: &Path) -> Result<()> {
    let format = format_of(path)?;
    let content = match format {
        Format::Json => serde_json::to_string_pretty(value)?,
        Format::Toml => toml::to_string_pretty(value)?,
    };
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, content)?;
    tracing::debug!("Saved settings to {}", path.display());
    Ok(())
}

/// Per-user configuration directory for SceneSync
pub fn config_dir() -> Result<PathBuf> {
    dirs::config_dir()
        .map(|dir| dir.join(APP_DIR))
        .ok_or_else(|| {
            SettingsError::ConfigDirectory("no configuration directory on this platform".into())
        })
}

/// Default location of the settings store file
pub fn default_settings_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(SETTINGS_FILE))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Sample {
        name: String,
        rate: f32,
    }

    #[test]
    fn test_json_and_toml_roundtrip() {
        let dir = tempfile::tempdir().expect("temp dir");
        let sample = Sample {
            name: "grid".to_string(),
            rate: 0.15,
        };

        for file in ["sample.json", "nested/sample.toml"] {
            let path = dir.path().join(file);
            save_to_file(&sample, &path).expect("save");
            let loaded: Sample = load_from_file(&path).expect("load");
            assert_eq!(loaded, sample);
        }
    }

    #[test]
    fn test_unknown_extension_rejected() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("sample.yaml");
        let err = save_to_file(&1u32, &path).unwrap_err();
        assert!(matches!(err, SettingsError::UnsupportedFormat(ext) if ext == "yaml"));
    }
}

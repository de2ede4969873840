//! SceneSync Settings Crate
//!
//! Application-wide key-value settings with change notification, and
//! JSON/TOML persistence shared by every configuration type.

pub mod error;
pub mod persistence;
pub mod store;

pub use error::{Result, SettingsError};
pub use persistence::{config_dir, default_settings_path, load_from_file, save_to_file};
pub use store::{ListenerId, SettingValue, SettingsStore, ANIMATION_KEY};

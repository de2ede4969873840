//! Settings store persistence against real files

use scenesync_settings::{SettingValue, SettingsStore, ANIMATION_KEY};

#[test]
fn test_store_survives_save_and_load() {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("settings.json");

    let store = SettingsStore::with_defaults();
    store.set(ANIMATION_KEY, false);
    store.set("widgets.visualizer.theme", "dark");
    store.save_to_file(&path).expect("save");

    let loaded = SettingsStore::load_from_file(&path).expect("load");
    assert!(!loaded.get_bool(ANIMATION_KEY, true).unwrap());
    assert_eq!(
        loaded.get("widgets.visualizer.theme"),
        Some(SettingValue::String("dark".to_string()))
    );
}

#[test]
fn test_missing_keys_fall_back_to_defaults() {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("settings.toml");
    std::fs::write(&path, "\"widgets.visualizer.gridOpacity\" = 0.25\n").expect("write");

    let loaded = SettingsStore::load_from_file(&path).expect("load");
    assert!(loaded.get_bool(ANIMATION_KEY, false).unwrap());
    assert_eq!(
        loaded.get("widgets.visualizer.gridOpacity"),
        Some(SettingValue::Float(0.25))
    );
}

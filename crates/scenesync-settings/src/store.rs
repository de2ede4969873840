//! Settings Store
//!
//! A thread-safe key-value store. Listeners are told about a key only
//! when its value actually changes.

use crate::error::{Result, SettingsError};
use crate::persistence;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::sync::Arc;
use uuid::Uuid;

/// Key holding the "animate tool head" toggle of the 3D visualizer
pub const ANIMATION_KEY: &str = "widgets.visualizer.animation";

/// A single setting value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SettingValue {
    Boolean(bool),
    Integer(i64),
    Float(f64),
    String(String),
}

impl SettingValue {
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            SettingValue::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// JSON form, as carried by settings events
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            SettingValue::Boolean(b) => serde_json::Value::Bool(*b),
            SettingValue::Integer(i) => serde_json::Value::from(*i),
            SettingValue::Float(f) => serde_json::Value::from(*f),
            SettingValue::String(s) => serde_json::Value::String(s.clone()),
        }
    }
}

impl From<bool> for SettingValue {
    fn from(value: bool) -> Self {
        SettingValue::Boolean(value)
    }
}

impl From<i64> for SettingValue {
    fn from(value: i64) -> Self {
        SettingValue::Integer(value)
    }
}

impl From<f64> for SettingValue {
    fn from(value: f64) -> Self {
        SettingValue::Float(value)
    }
}

impl From<&str> for SettingValue {
    fn from(value: &str) -> Self {
        SettingValue::String(value.to_string())
    }
}

/// Handle returned by [`SettingsStore::on_change`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(Uuid);

type ChangeListener = Arc<dyn Fn(&str, &SettingValue) + Send + Sync>;

/// Application-wide settings
pub struct SettingsStore {
    values: RwLock<BTreeMap<String, SettingValue>>,
    listeners: RwLock<HashMap<ListenerId, ChangeListener>>,
}

impl SettingsStore {
    /// Empty store
    pub fn new() -> Self {
        Self {
            values: RwLock::new(BTreeMap::new()),
            listeners: RwLock::new(HashMap::new()),
        }
    }

    /// Store pre-populated with the defaults the application relies on
    pub fn with_defaults() -> Self {
        let store = Self::new();
        store
            .values
            .write()
            .insert(ANIMATION_KEY.to_string(), SettingValue::Boolean(true));
        store
    }

    /// Load persisted values on top of the defaults
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let persisted: BTreeMap<String, SettingValue> = persistence::load_from_file(path)?;
        let store = Self::with_defaults();
        store.values.write().extend(persisted);
        Ok(store)
    }

    /// Persist all values
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        let values = self.values.read().clone();
        persistence::save_to_file(&values, path)
    }

    pub fn get(&self, key: &str) -> Option<SettingValue> {
        self.values.read().get(key).cloned()
    }

    /// Boolean value, `default` when the key is missing
    pub fn get_bool(&self, key: &str, default: bool) -> Result<bool> {
        match self.get(key) {
            None => Ok(default),
            Some(value) => value.as_bool().ok_or(SettingsError::TypeMismatch {
                key: key.to_string(),
                expected: "boolean",
            }),
        }
    }

    /// Set a value, notifying listeners if it changed.
    ///
    /// Returns true when the stored value changed.
    pub fn set(&self, key: &str, value: impl Into<SettingValue>) -> bool {
        let value = value.into();
        {
            let mut values = self.values.write();
            if values.get(key) == Some(&value) {
                return false;
            }
            values.insert(key.to_string(), value.clone());
        }

        tracing::debug!("Setting {} changed to {:?}", key, value);
        let listeners: Vec<ChangeListener> = self.listeners.read().values().cloned().collect();
        for listener in listeners {
            listener(key, &value);
        }
        true
    }

    /// Register a callback to be notified when a setting changes
    pub fn on_change<F>(&self, listener: F) -> ListenerId
    where
        F: Fn(&str, &SettingValue) + Send + Sync + 'static,
    {
        let id = ListenerId(Uuid::new_v4());
        let listener: ChangeListener = Arc::new(listener);
        self.listeners.write().insert(id, listener);
        id
    }

    /// Remove a listener; returns true if it was registered
    pub fn remove_listener(&self, id: ListenerId) -> bool {
        self.listeners.write().remove(&id).is_some()
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.read().len()
    }
}

impl Default for SettingsStore {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl std::fmt::Debug for SettingsStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SettingsStore")
            .field("values", &*self.values.read())
            .field("listeners", &self.listener_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_defaults() {
        let store = SettingsStore::with_defaults();
        assert!(store.get_bool(ANIMATION_KEY, false).unwrap());
        assert!(!store.get_bool("missing", false).unwrap());
    }

    #[test]
    fn test_listener_fires_only_on_change() {
        let store = SettingsStore::with_defaults();
        let calls = Arc::new(AtomicUsize::new(0));
        let c = calls.clone();
        store.on_change(move |key, value| {
            assert_eq!(key, ANIMATION_KEY);
            assert_eq!(value, &SettingValue::Boolean(false));
            c.fetch_add(1, Ordering::SeqCst);
        });

        assert!(!store.set(ANIMATION_KEY, true));
        assert!(store.set(ANIMATION_KEY, false));
        assert!(!store.set(ANIMATION_KEY, false));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_remove_listener() {
        let store = SettingsStore::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let c = calls.clone();
        let id = store.on_change(move |_, _| {
            c.fetch_add(1, Ordering::SeqCst);
        });

        assert!(store.remove_listener(id));
        assert!(!store.remove_listener(id));
        store.set("a", 1i64);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_type_mismatch() {
        let store = SettingsStore::new();
        store.set(ANIMATION_KEY, "yes");
        assert!(matches!(
            store.get_bool(ANIMATION_KEY, true),
            Err(SettingsError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn test_listener_may_read_store() {
        let store = Arc::new(SettingsStore::with_defaults());
        let seen = Arc::new(AtomicUsize::new(0));
        let inner = Arc::clone(&store);
        let s = seen.clone();
        store.on_change(move |key, _| {
            if matches!(inner.get_bool(key, true), Ok(false)) {
                s.fetch_add(1, Ordering::SeqCst);
            }
        });
        store.set(ANIMATION_KEY, false);
        assert_eq!(seen.load(Ordering::SeqCst), 1);
    }
}

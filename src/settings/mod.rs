use serde::Serialize;
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::sync::RwLock;
use tracing::warn;

/// A strongly typed key into the flat settings store.
#[derive(Debug, Clone)]
pub struct SettingsKey<V> {
    raw_key: &'static str,
    default: Option<V>,
}

impl<V> SettingsKey<V> {
    pub const fn new(raw_key: &'static str) -> Self {
        Self {
            raw_key,
            default: None,
        }
    }

    pub const fn with_default(raw_key: &'static str, default: V) -> Self {
        Self {
            raw_key,
            default: Some(default),
        }
    }

    pub fn raw_key(&self) -> &'static str {
        self.raw_key
    }
}

/// Well-known settings keys.
pub mod keys {
    use super::SettingsKey;

    /// The user's preferred search ordering.
    pub const SEARCH_ORDER: SettingsKey<String> = SettingsKey::new("search.order");
}

/// Typed get/set over a flat in-memory settings map.
///
/// Serialization problems are logged and degrade to the key's default;
/// setting `None` removes the underlying entry.
#[derive(Debug, Default)]
pub struct SettingsStore {
    values: RwLock<HashMap<String, serde_json::Value>>,
}

impl SettingsStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get<V>(&self, key: &SettingsKey<V>) -> Option<V>
    where
        V: DeserializeOwned + Clone,
    {
        let values = self.values.read().unwrap_or_else(|e| e.into_inner());
        match values.get(key.raw_key) {
            Some(raw) => match serde_json::from_value(raw.clone()) {
                Ok(value) => Some(value),
                Err(err) => {
                    warn!(key = key.raw_key, error = %err, "stored setting has wrong shape");
                    key.default.clone()
                }
            },
            None => key.default.clone(),
        }
    }

    pub fn set<V>(&self, value: Option<V>, key: &SettingsKey<V>)
    where
        V: Serialize,
    {
        let mut values = self.values.write().unwrap_or_else(|e| e.into_inner());
        match value {
            Some(value) => match serde_json::to_value(value) {
                Ok(raw) => {
                    values.insert(key.raw_key.to_string(), raw);
                }
                Err(err) => {
                    warn!(key = key.raw_key, error = %err, "setting not serializable, skipped");
                }
            },
            None => {
                values.remove(key.raw_key);
            }
        }
    }
}

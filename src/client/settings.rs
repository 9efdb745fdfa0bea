//! Persisted user preferences. Storage is injected through a small
//! key-value interface so the UI shell decides where values actually live;
//! nothing here reaches for ambient global state.

use std::collections::HashMap;

use crate::models::game::Speed;

const VOLUME_KEY: &str = "volume";
const SPEED_KEY: &str = "speed";

pub trait PrefStore {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: &str);
}

/// In-memory store, also the test double.
#[derive(Default)]
pub struct MemoryPrefStore {
    values: HashMap<String, String>,
}

impl MemoryPrefStore {
    pub fn new() -> MemoryPrefStore {
        MemoryPrefStore::default()
    }
}

impl PrefStore for MemoryPrefStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) {
        self.values.insert(key.to_string(), value.to_string());
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    /// Sound volume in [0, 1].
    pub volume: f64,
    /// Preferred pace for new games.
    pub speed: Speed,
}

impl Default for Settings {
    fn default() -> Settings {
        Settings {
            volume: 1.0,
            speed: Speed::Standard,
        }
    }
}

impl Settings {
    /// Load preferences, falling back to defaults for anything missing or
    /// unparseable.
    pub fn load(store: &dyn PrefStore) -> Settings {
        let mut settings = Settings::default();

        if let Some(volume) = store.get(VOLUME_KEY).and_then(|v| v.parse::<f64>().ok()) {
            if (0.0..=1.0).contains(&volume) {
                settings.volume = volume;
            }
        }
        match store.get(SPEED_KEY).as_deref() {
            Some("standard") => settings.speed = Speed::Standard,
            Some("lightning") => settings.speed = Speed::Lightning,
            _ => {}
        }

        settings
    }

    pub fn save(&self, store: &mut dyn PrefStore) {
        store.set(VOLUME_KEY, &self.volume.to_string());
        store.set(SPEED_KEY, self.speed.as_str());
    }
}

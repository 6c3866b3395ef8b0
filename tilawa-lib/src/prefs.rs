//! User preference persistence.
//!
//! The player only needs a narrow key-value seam; the JSON file store is
//! the production implementation and the in-memory store backs tests and
//! headless runs.

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use log::warn;

/// Preference key for the persisted playback rate.
pub const PLAYBACK_RATE_KEY: &str = "playback_rate";

/// Narrow key-value preference seam.
pub trait PreferenceStore: Send {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: &str);
}

/// In-memory preference store. Clones share the same map.
#[derive(Clone, Default)]
pub struct MemoryPreferences {
    values: Arc<Mutex<HashMap<String, String>>>,
}

impl PreferenceStore for MemoryPreferences {
    fn get(&self, key: &str) -> Option<String> {
        self.values.lock().unwrap().get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) {
        self.values
            .lock()
            .unwrap()
            .insert(key.to_string(), value.to_string());
    }
}

/// Preference store persisted as a flat JSON object on disk.
pub struct JsonFilePreferences {
    path: PathBuf,
    values: HashMap<String, String>,
}

impl JsonFilePreferences {
    /// Open (or lazily create) the preference file at `path`. A missing or
    /// unreadable file yields an empty store; it is rewritten on first set.
    pub fn open(path: PathBuf) -> Self {
        let values = match fs::read_to_string(&path) {
            Ok(raw) => match serde_json::from_str::<HashMap<String, String>>(&raw) {
                Ok(values) => values,
                Err(err) => {
                    warn!("ignoring malformed preference file {:?}: {}", path, err);
                    HashMap::new()
                }
            },
            Err(_) => HashMap::new(),
        };
        Self { path, values }
    }

    /// Default preference file location under the user's config directory.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("tilawa").join("preferences.json"))
    }

    fn save(&self) {
        if let Some(parent) = self.path.parent() {
            if let Err(err) = fs::create_dir_all(parent) {
                warn!("failed to create preference directory {:?}: {}", parent, err);
                return;
            }
        }
        match serde_json::to_string_pretty(&self.values) {
            Ok(serialized) => {
                if let Err(err) = fs::write(&self.path, serialized) {
                    warn!("failed to write preference file {:?}: {}", self.path, err);
                }
            }
            Err(err) => warn!("failed to serialize preferences: {}", err),
        }
    }
}

impl PreferenceStore for JsonFilePreferences {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) {
        self.values.insert(key.to_string(), value.to_string());
        self.save();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::{SystemTime, UNIX_EPOCH};

    fn scratch_path(label: &str) -> PathBuf {
        static COUNTER: AtomicU32 = AtomicU32::new(0);
        let stamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_nanos();
        std::env::temp_dir().join(format!(
            "tilawa-prefs-{}-{}-{}-{}.json",
            label,
            std::process::id(),
            COUNTER.fetch_add(1, Ordering::SeqCst),
            stamp
        ))
    }

    #[test]
    fn memory_store_round_trips_values() {
        let mut prefs = MemoryPreferences::default();
        assert_eq!(prefs.get(PLAYBACK_RATE_KEY), None);
        prefs.set(PLAYBACK_RATE_KEY, "1.25");
        assert_eq!(prefs.get(PLAYBACK_RATE_KEY).as_deref(), Some("1.25"));
    }

    #[test]
    fn json_store_persists_across_reopen() {
        let path = scratch_path("roundtrip");
        {
            let mut prefs = JsonFilePreferences::open(path.clone());
            prefs.set(PLAYBACK_RATE_KEY, "1.5");
            prefs.set("reciter", "alafasy");
        }
        let reopened = JsonFilePreferences::open(path.clone());
        assert_eq!(reopened.get(PLAYBACK_RATE_KEY).as_deref(), Some("1.5"));
        assert_eq!(reopened.get("reciter").as_deref(), Some("alafasy"));
        let _ = fs::remove_file(path);
    }

    #[test]
    fn malformed_file_yields_an_empty_store() {
        let path = scratch_path("malformed");
        fs::write(&path, "not json at all").unwrap();
        let prefs = JsonFilePreferences::open(path.clone());
        assert_eq!(prefs.get(PLAYBACK_RATE_KEY), None);
        let _ = fs::remove_file(path);
    }
}

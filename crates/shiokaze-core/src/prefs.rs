use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::warn;

/// Values restored at startup and written back on change.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Preferences {
    pub volume: f32,
    pub station_id: Option<String>,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            volume: 0.5,
            station_id: None,
        }
    }
}

/// Preference-store collaborator. The facade invokes it after a state
/// transition completes, never from inside the session state machine, so the
/// core has no I/O side effects of its own.
pub trait PrefStore {
    fn load_volume(&self) -> f32;
    fn load_station_id(&self) -> Option<String>;
    fn save_volume(&mut self, volume: f32);
    fn save_station_id(&mut self, station_id: &str);
}

/// JSON-file preference store. Loads leniently (missing or corrupt file
/// falls back to defaults); write failures are logged, never surfaced —
/// losing a preference must not break playback.
pub struct JsonPrefStore {
    path: PathBuf,
    prefs: Preferences,
}

impl JsonPrefStore {
    pub fn open(path: PathBuf) -> Self {
        let prefs = Self::load(&path);
        Self { path, prefs }
    }

    fn load(path: &PathBuf) -> Preferences {
        if let Ok(content) = std::fs::read_to_string(path) {
            if let Ok(prefs) = serde_json::from_str::<Preferences>(&content) {
                return prefs;
            }
            warn!("prefs: could not parse {:?}, using defaults", path);
        }
        Preferences::default()
    }

    fn persist(&self) {
        if let Err(e) = self.try_persist() {
            warn!("prefs: failed to write {:?}: {}", self.path, e);
        }
    }

    fn try_persist(&self) -> anyhow::Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(&self.prefs)?;
        std::fs::write(&self.path, json)?;
        Ok(())
    }
}

impl PrefStore for JsonPrefStore {
    fn load_volume(&self) -> f32 {
        self.prefs.volume
    }

    fn load_station_id(&self) -> Option<String> {
        self.prefs.station_id.clone()
    }

    fn save_volume(&mut self, volume: f32) {
        self.prefs.volume = volume;
        self.persist();
    }

    fn save_station_id(&mut self, station_id: &str) {
        self.prefs.station_id = Some(station_id.to_string());
        self.persist();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_when_file_missing() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonPrefStore::open(dir.path().join("prefs.json"));
        assert_eq!(store.load_volume(), 0.5);
        assert!(store.load_station_id().is_none());
    }

    #[test]
    fn test_round_trip_through_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prefs.json");

        let mut store = JsonPrefStore::open(path.clone());
        store.save_volume(0.8);
        store.save_station_id("kamakura");

        let reopened = JsonPrefStore::open(path);
        assert_eq!(reopened.load_volume(), 0.8);
        assert_eq!(reopened.load_station_id().as_deref(), Some("kamakura"));
    }

    #[test]
    fn test_corrupt_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prefs.json");
        std::fs::write(&path, "not json at all").unwrap();

        let store = JsonPrefStore::open(path);
        assert_eq!(store.load_volume(), 0.5);
        assert!(store.load_station_id().is_none());
    }
}

//! Scripted stream backend and in-memory preference store for tests.

use crate::stream::{EventSender, StreamBackend, StreamError, StreamHandle};
use shiokaze_core::prefs::PrefStore;
use shiokaze_core::telemetry::TelemetrySample;
use std::sync::{Arc, Mutex};

#[derive(Default)]
struct BackendLog {
    opened: Vec<(String, u64)>,
    stopped: u32,
    live: i32,
    fail_next_open: bool,
    sample: Option<TelemetrySample>,
    volumes: Vec<f32>,
}

/// Backend that records every open/stop/volume call and hands out handles
/// whose telemetry the test scripts.
#[derive(Clone, Default)]
pub struct MockBackend {
    log: Arc<Mutex<BackendLog>>,
}

impl MockBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_next_open(&self) {
        self.log.lock().unwrap().fail_next_open = true;
    }

    pub fn set_sample(&self, sample: TelemetrySample) {
        self.log.lock().unwrap().sample = Some(sample);
    }

    /// Handles opened and not yet stopped. Must never exceed 1.
    pub fn live_handles(&self) -> i32 {
        self.log.lock().unwrap().live
    }

    pub fn open_count(&self) -> usize {
        self.log.lock().unwrap().opened.len()
    }

    pub fn stop_count(&self) -> u32 {
        self.log.lock().unwrap().stopped
    }

    pub fn opened_urls(&self) -> Vec<String> {
        self.log
            .lock()
            .unwrap()
            .opened
            .iter()
            .map(|(url, _)| url.clone())
            .collect()
    }

    /// Generation the most recent handle was opened under.
    pub fn last_generation(&self) -> Option<u64> {
        self.log.lock().unwrap().opened.last().map(|(_, g)| *g)
    }

    pub fn volumes(&self) -> Vec<f32> {
        self.log.lock().unwrap().volumes.clone()
    }
}

impl StreamBackend for MockBackend {
    type Handle = MockHandle;

    fn open(
        &mut self,
        url: &str,
        generation: u64,
        _events: EventSender,
    ) -> Result<MockHandle, StreamError> {
        let mut log = self.log.lock().unwrap();
        if log.fail_next_open {
            log.fail_next_open = false;
            return Err(StreamError::Open("mock refused".into()));
        }
        log.opened.push((url.to_string(), generation));
        log.live += 1;
        Ok(MockHandle {
            log: self.log.clone(),
            stopped: false,
        })
    }
}

pub struct MockHandle {
    log: Arc<Mutex<BackendLog>>,
    stopped: bool,
}

impl StreamHandle for MockHandle {
    fn play(&mut self) {}

    fn stop(&mut self) {
        if !self.stopped {
            self.stopped = true;
            let mut log = self.log.lock().unwrap();
            log.live -= 1;
            log.stopped += 1;
        }
    }

    fn set_volume(&mut self, volume: f32) {
        self.log.lock().unwrap().volumes.push(volume);
    }

    fn latest_telemetry(&self) -> Option<TelemetrySample> {
        self.log.lock().unwrap().sample
    }
}

impl Drop for MockHandle {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Preference store that records every save.
#[derive(Default)]
pub struct MemoryPrefStore {
    volume: Option<f32>,
    station_id: Option<String>,
    pub saved_volumes: Vec<f32>,
    pub saved_station_ids: Vec<String>,
}

impl MemoryPrefStore {
    pub fn with(volume: f32, station_id: Option<&str>) -> Self {
        Self {
            volume: Some(volume),
            station_id: station_id.map(str::to_owned),
            ..Default::default()
        }
    }
}

impl PrefStore for MemoryPrefStore {
    fn load_volume(&self) -> f32 {
        self.volume.unwrap_or(0.5)
    }

    fn load_station_id(&self) -> Option<String> {
        self.station_id.clone()
    }

    fn save_volume(&mut self, volume: f32) {
        self.volume = Some(volume);
        self.saved_volumes.push(volume);
    }

    fn save_station_id(&mut self, station_id: &str) {
        self.station_id = Some(station_id.to_string());
        self.saved_station_ids.push(station_id.to_string());
    }
}

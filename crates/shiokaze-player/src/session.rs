use crate::event::{Event, StreamEvent};
use crate::stream::{EventSender, StreamBackend, StreamHandle};
use shiokaze_core::quality::{self, SignalQuality};
use shiokaze_core::station::Station;
use shiokaze_core::telemetry::TelemetrySample;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Period of the telemetry poll while a handle is live.
pub const TELEMETRY_INTERVAL: Duration = Duration::from_secs(2);

/// Playback session state machine: Idle → Loading → Playing → {Idle, Failed}.
///
/// Owns the current station, the stream handle, and the telemetry poll task.
/// All mutation happens on the owner context; handle callbacks and poll ticks
/// come back through the shared event channel and are applied via
/// `handle_stream_event` / `handle_telemetry_tick`. Every teardown bumps the
/// generation, so anything still in flight for the old handle is recognized
/// as stale and discarded.
pub struct PlaybackSession<B: StreamBackend> {
    backend: B,
    events: EventSender,
    current_station: Station,
    volume: f32,
    handle: Option<B::Handle>,
    poll_task: Option<JoinHandle<()>>,
    generation: u64,
    is_playing: bool,
    is_loading: bool,
    error_message: Option<String>,
    signal_quality: SignalQuality,
    telemetry: TelemetrySample,
}

impl<B: StreamBackend> PlaybackSession<B> {
    pub fn new(backend: B, station: Station, volume: f32, events: EventSender) -> Self {
        Self {
            backend,
            events,
            current_station: station,
            volume,
            handle: None,
            poll_task: None,
            generation: 0,
            is_playing: false,
            is_loading: false,
            error_message: None,
            signal_quality: SignalQuality::None,
            telemetry: TelemetrySample::default(),
        }
    }

    // ── observable state ──────────────────────────────────────────────────────

    pub fn is_playing(&self) -> bool {
        self.is_playing
    }

    pub fn is_loading(&self) -> bool {
        self.is_loading
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }

    pub fn signal_quality(&self) -> SignalQuality {
        self.signal_quality
    }

    pub fn current_station(&self) -> &Station {
        &self.current_station
    }

    pub fn volume(&self) -> f32 {
        self.volume
    }

    /// Generation of the live handle. Events tagged with anything else are
    /// stale and will be discarded.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    // ── commands ──────────────────────────────────────────────────────────────

    /// Starts playback of the current station on a fresh handle.
    ///
    /// Playback is requested optimistically: `is_playing` goes true before
    /// the readiness signal arrives, and `is_loading` stays true until it
    /// does (or a failure lands).
    pub fn play(&mut self) {
        self.error_message = None;
        self.is_loading = true;
        self.telemetry.stall_count = 0;
        self.teardown();

        info!("session: opening stream for '{}'", self.current_station.name);
        match self.backend.open(
            &self.current_station.url,
            self.generation,
            self.events.clone(),
        ) {
            Ok(mut handle) => {
                handle.set_volume(self.volume);
                handle.play();
                self.handle = Some(handle);
                self.start_telemetry_poll();
                self.is_playing = true;
            }
            Err(e) => {
                warn!(
                    "session: failed to open '{}': {}",
                    self.current_station.url, e
                );
                self.is_loading = false;
                self.is_playing = false;
                self.error_message = Some(e.to_string());
            }
        }
    }

    /// Stops playback but keeps the station selection (and any error).
    pub fn pause(&mut self) {
        self.teardown();
        self.is_playing = false;
        self.is_loading = false;
    }

    /// Switches the current station. When playing, restarts playback on the
    /// new station; when paused, switches silently.
    pub fn set_station(&mut self, station: Station) {
        let was_playing = self.is_playing;
        if was_playing {
            self.pause();
        }
        info!("session: station -> {}", station.name);
        self.current_station = station;
        if was_playing {
            self.play();
        }
    }

    pub fn set_volume(&mut self, volume: f32) {
        self.volume = volume;
        if let Some(handle) = self.handle.as_mut() {
            handle.set_volume(volume);
        }
    }

    // ── asynchronous entry points ─────────────────────────────────────────────

    pub fn handle_stream_event(&mut self, generation: u64, event: StreamEvent) {
        if generation != self.generation || self.handle.is_none() {
            debug!(
                "session: discarding stale stream event gen={} (current={})",
                generation, self.generation
            );
            return;
        }
        match event {
            StreamEvent::Ready => {
                self.is_loading = false;
                self.error_message = None;
            }
            StreamEvent::Failed(message) => {
                warn!("session: stream failed: {}", message);
                self.is_loading = false;
                self.is_playing = false;
                self.error_message = Some(message);
                self.teardown();
            }
            StreamEvent::Buffering {
                buffer_empty,
                likely_to_keep_up,
                buffer_full,
            } => {
                self.telemetry.buffer_empty = buffer_empty;
                self.telemetry.likely_to_keep_up = likely_to_keep_up;
                self.telemetry.buffer_full = buffer_full;
                self.update_signal_quality();
            }
        }
    }

    pub fn handle_telemetry_tick(&mut self, generation: u64) {
        if generation != self.generation {
            debug!(
                "session: discarding stale telemetry tick gen={} (current={})",
                generation, self.generation
            );
            return;
        }
        if let Some(handle) = self.handle.as_ref() {
            if let Some(sample) = handle.latest_telemetry() {
                self.telemetry = sample;
            }
        }
        self.update_signal_quality();
    }

    // ── internals ─────────────────────────────────────────────────────────────

    fn update_signal_quality(&mut self) {
        self.signal_quality = if self.handle.is_some() {
            quality::estimate(self.is_playing, &self.telemetry)
        } else {
            SignalQuality::None
        };
    }

    /// Stops the poll and releases the handle. Idempotent. Bumps the
    /// generation so in-flight callbacks and ticks for the old handle become
    /// stale; resets quality and transient telemetry.
    fn teardown(&mut self) {
        if let Some(task) = self.poll_task.take() {
            task.abort();
        }
        if let Some(mut handle) = self.handle.take() {
            handle.stop();
        }
        self.generation = self.generation.wrapping_add(1);
        self.signal_quality = SignalQuality::None;
        self.telemetry = TelemetrySample::default();
    }

    fn start_telemetry_poll(&mut self) {
        let events = self.events.clone();
        let generation = self.generation;
        self.poll_task = Some(tokio::spawn(async move {
            let mut interval = tokio::time::interval(TELEMETRY_INTERVAL);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            interval.tick().await; // first tick completes immediately
            loop {
                interval.tick().await;
                if events.send(Event::TelemetryTick { generation }).is_err() {
                    break; // receiver gone, session owner shut down
                }
            }
        }));
    }
}

impl<B: StreamBackend> Drop for PlaybackSession<B> {
    fn drop(&mut self) {
        self.teardown();
    }
}

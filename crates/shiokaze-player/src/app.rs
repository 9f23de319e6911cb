use crate::event::Event;
use crate::session::PlaybackSession;
use crate::sleep_timer::SleepTimer;
use crate::stream::StreamBackend;
use shiokaze_core::prefs::PrefStore;
use shiokaze_core::state::PlayerState;
use shiokaze_core::station::{Catalog, Station};
use tokio::sync::mpsc;
use tracing::{info, warn};

/// Composes the playback session and the sleep timer into the command/read
/// surface the presentation layer talks to.
///
/// All mutation happens on the context that owns the `App`. Asynchronous
/// callbacks arrive through the paired event receiver returned by `new`; the
/// owner loop drains it into `handle_event`, so no callback ever interleaves
/// with a command.
pub struct App<B: StreamBackend, P: PrefStore> {
    session: PlaybackSession<B>,
    sleep_timer: SleepTimer,
    catalog: Catalog,
    prefs: P,
}

impl<B: StreamBackend, P: PrefStore> App<B, P> {
    /// Builds the facade, restoring volume and last station from the
    /// preference store. An unknown or missing station id falls back to the
    /// catalog default.
    pub fn new(
        backend: B,
        catalog: Catalog,
        prefs: P,
    ) -> anyhow::Result<(Self, mpsc::UnboundedReceiver<Event>)> {
        let station = prefs
            .load_station_id()
            .and_then(|id| catalog.by_id(&id).cloned())
            .or_else(|| catalog.default_station().cloned())
            .ok_or_else(|| anyhow::anyhow!("station catalog is empty"))?;
        let volume = prefs.load_volume().clamp(0.0, 1.0);

        let (events, rx) = mpsc::unbounded_channel();
        let session = PlaybackSession::new(backend, station, volume, events.clone());
        let sleep_timer = SleepTimer::new(events);

        Ok((
            Self {
                session,
                sleep_timer,
                catalog,
                prefs,
            },
            rx,
        ))
    }

    // ── commands ──────────────────────────────────────────────────────────────

    pub fn play(&mut self) {
        self.session.play();
    }

    pub fn pause(&mut self) {
        self.session.pause();
    }

    pub fn toggle_playback(&mut self) {
        if self.session.is_playing() {
            self.session.pause();
        } else {
            self.session.play();
        }
    }

    pub fn next_station(&mut self) {
        let next = self
            .catalog
            .next_after(&self.session.current_station().id)
            .cloned();
        if let Some(station) = next {
            self.change_station(station);
        }
    }

    pub fn previous_station(&mut self) {
        let prev = self
            .catalog
            .previous_before(&self.session.current_station().id)
            .cloned();
        if let Some(station) = prev {
            self.change_station(station);
        }
    }

    pub fn set_station(&mut self, id: &str) -> anyhow::Result<()> {
        let station = self
            .catalog
            .by_id(id)
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("unknown station id '{}'", id))?;
        self.change_station(station);
        Ok(())
    }

    pub fn set_volume(&mut self, volume: f32) {
        if !volume.is_finite() {
            warn!("ignoring non-finite volume {}", volume);
            return;
        }
        let volume = volume.clamp(0.0, 1.0);
        self.session.set_volume(volume);
        self.prefs.save_volume(volume);
    }

    pub fn set_sleep_timer(&mut self, hour: u32, minute: u32) -> anyhow::Result<()> {
        let end = self.sleep_timer.set(hour, minute)?;
        info!("sleep timer armed for {}", end.format("%H:%M"));
        Ok(())
    }

    pub fn cancel_sleep_timer(&mut self) {
        self.sleep_timer.cancel();
    }

    // ── asynchronous entry points ─────────────────────────────────────────────

    /// Applies one event from the paired receiver. The owner loop calls this
    /// for every event, serially with the commands above.
    pub fn handle_event(&mut self, event: Event) {
        match event {
            Event::Stream { generation, event } => {
                self.session.handle_stream_event(generation, event);
            }
            Event::TelemetryTick { generation } => {
                self.session.handle_telemetry_tick(generation);
            }
            Event::SleepTimerFired { generation } => {
                if self.sleep_timer.acknowledge_fire(generation) {
                    info!("sleep timer fired, pausing playback");
                    self.session.pause();
                }
            }
        }
    }

    /// Wake-from-sleep notification from the host OS.
    pub fn on_system_wake(&mut self) {
        if self.sleep_timer.check_on_wake() {
            self.session.pause();
        }
    }

    // ── read surface ──────────────────────────────────────────────────────────

    pub fn state(&self) -> PlayerState {
        PlayerState {
            is_playing: self.session.is_playing(),
            is_loading: self.session.is_loading(),
            error_message: self.session.error_message().map(str::to_owned),
            signal_quality: self.session.signal_quality(),
            current_station: self.session.current_station().clone(),
            volume: self.session.volume(),
            sleep_timer_end: self.sleep_timer.end_date(),
        }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn current_station(&self) -> &Station {
        self.session.current_station()
    }

    fn change_station(&mut self, station: Station) {
        self.session.set_station(station);
        // Persisted after the transition so the state machine itself has no
        // I/O side effects.
        self.prefs.save_station_id(&self.session.current_station().id);
    }
}

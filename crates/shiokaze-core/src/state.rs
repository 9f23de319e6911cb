use crate::quality::SignalQuality;
use crate::station::Station;
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

/// Snapshot of everything the presentation layer can observe. Produced on
/// demand by the facade; the frontend polls or re-renders from this, it never
/// reaches into the session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerState {
    pub is_playing: bool,
    pub is_loading: bool,
    pub error_message: Option<String>,
    pub signal_quality: SignalQuality,
    pub current_station: Station,
    pub volume: f32,
    pub sleep_timer_end: Option<DateTime<Local>>,
}

use crate::telemetry::TelemetrySample;
use serde::{Deserialize, Serialize};

/// Signal quality as shown by the menu-bar indicator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SignalQuality {
    /// Not playing (or no handle) — the indicator is blank.
    #[default]
    None,
    Poor,
    Good,
    Excellent,
}

/// Maps buffering state + observed bitrate + stall count to the 3-level
/// quality signal. Stateless and hysteresis-free: the same inputs always
/// produce the same output. The weights and thresholds below are part of the
/// indicator's contract, not tunable defaults.
pub fn estimate(is_playing: bool, telemetry: &TelemetrySample) -> SignalQuality {
    if !is_playing {
        return SignalQuality::None;
    }

    // Buffer-based score
    let buffer_score: i32 = if telemetry.buffer_empty {
        0
    } else if telemetry.likely_to_keep_up {
        if telemetry.buffer_full {
            3
        } else {
            2
        }
    } else {
        1
    };

    // Bitrate-based score (typical radio streams run 64-320 kbps)
    let bitrate_score: i32 = if telemetry.observed_bitrate_bps <= 0.0 {
        1 // unknown, assume OK
    } else if telemetry.observed_bitrate_bps >= 128_000.0 {
        3
    } else if telemetry.observed_bitrate_bps >= 64_000.0 {
        2
    } else {
        1
    };

    let stall_penalty = telemetry.stall_count.min(2) as i32;

    let total = buffer_score + bitrate_score - stall_penalty;
    if total >= 5 {
        SignalQuality::Excellent
    } else if total >= 3 {
        SignalQuality::Good
    } else {
        SignalQuality::Poor
    }
}

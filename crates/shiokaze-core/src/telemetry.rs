use serde::{Deserialize, Serialize};

/// One sample of stream-health telemetry pulled from the active handle.
/// Sampled on the 2-second poll and on buffering callbacks; never persisted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TelemetrySample {
    /// Observed throughput in bits per second. 0 means not yet known.
    pub observed_bitrate_bps: f64,
    /// Cumulative stall count for the current handle.
    pub stall_count: u32,
    /// The playout buffer has drained.
    pub buffer_empty: bool,
    /// Data is arriving fast enough to sustain playback.
    pub likely_to_keep_up: bool,
    /// The playout buffer is at capacity.
    pub buffer_full: bool,
}

/// Asynchronous entry points into the serialized control context.
///
/// Commands mutate the facade directly; everything else — stream callbacks,
/// telemetry ticks, the sleep-timer fire — arrives as one of these over a
/// single mpsc channel and is applied by `App::handle_event` on the owner
/// context. Each variant carries the generation of the handle (or timer) that
/// produced it, so deliveries for a torn-down handle can be discarded instead
/// of mutating current state.
#[derive(Debug, Clone)]
pub enum Event {
    Stream { generation: u64, event: StreamEvent },
    TelemetryTick { generation: u64 },
    SleepTimerFired { generation: u64 },
}

/// Callbacks from the stream-handle collaborator.
#[derive(Debug, Clone)]
pub enum StreamEvent {
    /// The stream produced data and can play.
    Ready,
    /// The handle failed before or during playback.
    Failed(String),
    /// Buffering flags changed.
    Buffering {
        buffer_empty: bool,
        likely_to_keep_up: bool,
        buffer_full: bool,
    },
}

use crate::event::Event;
use shiokaze_core::telemetry::TelemetrySample;
use tokio::sync::mpsc;

/// Sender half the session hands to the backend when opening a handle.
/// Everything the handle sends later must be tagged with the generation it
/// was opened under.
pub type EventSender = mpsc::UnboundedSender<Event>;

#[derive(Debug, thiserror::Error)]
pub enum StreamError {
    #[error("invalid stream url: {0}")]
    InvalidUrl(String),
    #[error("failed to open stream: {0}")]
    Open(String),
}

/// Stream-handle collaborator: the underlying network/decode stack.
///
/// The session opens at most one handle at a time and tears the previous one
/// down before opening the next.
pub trait StreamBackend: Send + 'static {
    type Handle: StreamHandle;

    /// Opens a new handle for `url`. Asynchronous callbacks the handle
    /// produces later go out on `events`, tagged with `generation`.
    fn open(
        &mut self,
        url: &str,
        generation: u64,
        events: EventSender,
    ) -> Result<Self::Handle, StreamError>;
}

/// A live network audio connection.
///
/// `stop` must be safe to call more than once, and dropping the handle must
/// release the underlying resources even if `stop` was never called.
pub trait StreamHandle: Send + 'static {
    fn play(&mut self);
    fn stop(&mut self);
    fn set_volume(&mut self, volume: f32);
    /// Latest telemetry sample, if the handle has produced one yet.
    fn latest_telemetry(&self) -> Option<TelemetrySample>;
}

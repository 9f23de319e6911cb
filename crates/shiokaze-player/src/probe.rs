//! HTTP probe backend.
//!
//! A real `StreamBackend` that opens the station URL with reqwest and keeps
//! reading the response body. It does not decode audio — it exists so the
//! headless binary can drive the full session against live stations:
//! readiness, failure, and telemetry (observed bitrate over a rolling byte
//! window, stalls from read gaps) all come from actual network behavior.

use crate::event::{Event, StreamEvent};
use crate::stream::{EventSender, StreamBackend, StreamError, StreamHandle};
use futures_util::StreamExt;
use shiokaze_core::telemetry::TelemetrySample;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// A read gap longer than this counts as a stall: a real decoder's playout
/// buffer would be draining by now.
const STALL_GAP: Duration = Duration::from_secs(4);
/// Rolling window for the observed-bitrate estimate.
const BITRATE_WINDOW: Duration = Duration::from_secs(10);

pub struct HttpProbeBackend {
    client: reqwest::Client,
}

impl HttpProbeBackend {
    pub fn new() -> Self {
        let client = reqwest::Client::builder()
            // Follow redirects (common for HLS playlists and Icecast streams)
            .redirect(reqwest::redirect::Policy::limited(10))
            .connect_timeout(Duration::from_secs(10))
            // Many Icecast servers require this header
            .default_headers({
                let mut h = reqwest::header::HeaderMap::new();
                h.insert(
                    "Icy-MetaData",
                    reqwest::header::HeaderValue::from_static("1"),
                );
                h
            })
            .build()
            .expect("failed to build reqwest client for probe");
        Self { client }
    }
}

impl Default for HttpProbeBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl StreamBackend for HttpProbeBackend {
    type Handle = HttpProbeHandle;

    fn open(
        &mut self,
        url: &str,
        generation: u64,
        events: EventSender,
    ) -> Result<HttpProbeHandle, StreamError> {
        if !url.starts_with("http://") && !url.starts_with("https://") {
            return Err(StreamError::InvalidUrl(url.to_string()));
        }
        let telemetry = Arc::new(Mutex::new(None));
        let task = tokio::spawn(probe_task(
            self.client.clone(),
            url.to_string(),
            generation,
            events,
            telemetry.clone(),
        ));
        Ok(HttpProbeHandle {
            task: Some(task),
            telemetry,
        })
    }
}

pub struct HttpProbeHandle {
    task: Option<JoinHandle<()>>,
    telemetry: Arc<Mutex<Option<TelemetrySample>>>,
}

impl StreamHandle for HttpProbeHandle {
    fn play(&mut self) {
        // The probe starts reading as soon as it is opened.
    }

    fn stop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }

    fn set_volume(&mut self, _volume: f32) {
        // No audio output to scale.
    }

    fn latest_telemetry(&self) -> Option<TelemetrySample> {
        *self.telemetry.lock().ok()?
    }
}

impl Drop for HttpProbeHandle {
    fn drop(&mut self) {
        self.stop();
    }
}

async fn probe_task(
    client: reqwest::Client,
    url: String,
    generation: u64,
    events: EventSender,
    telemetry: Arc<Mutex<Option<TelemetrySample>>>,
) {
    let fail = |message: String| {
        let _ = events.send(Event::Stream {
            generation,
            event: StreamEvent::Failed(message),
        });
    };

    let response = match client.get(&url).send().await {
        Ok(r) => r,
        Err(e) => {
            warn!("probe: connect failed for {}: {}", url, e);
            fail(format!("connect failed: {e}"));
            return;
        }
    };
    let status = response.status();
    if !status.is_success() {
        warn!("probe: upstream returned {} for {}", status, url);
        fail(format!("upstream returned {status}"));
        return;
    }

    info!("probe: connected to {}", url);
    let _ = events.send(Event::Stream {
        generation,
        event: StreamEvent::Ready,
    });

    let mut stream = response.bytes_stream();
    let mut window: VecDeque<(Instant, usize)> = VecDeque::new();
    let mut stall_count: u32 = 0;
    let mut last_stall: Option<Instant> = None;
    let mut last_flags: Option<(bool, bool, bool)> = None;

    loop {
        match tokio::time::timeout(STALL_GAP, stream.next()).await {
            Err(_) => {
                stall_count += 1;
                last_stall = Some(Instant::now());
                debug!("probe: read gap on {} (stall #{})", url, stall_count);
                let sample = TelemetrySample {
                    observed_bitrate_bps: window_bitrate(&window, Instant::now()),
                    stall_count,
                    buffer_empty: true,
                    likely_to_keep_up: false,
                    buffer_full: false,
                };
                store_sample(&telemetry, sample);
                publish_flags(&events, generation, &mut last_flags, sample);
            }
            Ok(None) => {
                fail("stream ended".into());
                return;
            }
            Ok(Some(Err(e))) => {
                fail(format!("read error: {e}"));
                return;
            }
            Ok(Some(Ok(chunk))) => {
                let now = Instant::now();
                window.push_back((now, chunk.len()));
                while window
                    .front()
                    .is_some_and(|(t, _)| now.duration_since(*t) > BITRATE_WINDOW)
                {
                    window.pop_front();
                }

                let bitrate = window_bitrate(&window, now);
                let stall_free = last_stall
                    .map_or(true, |t| now.duration_since(t) > BITRATE_WINDOW);
                let steady = window
                    .front()
                    .is_some_and(|(t, _)| now.duration_since(*t) >= BITRATE_WINDOW / 2);
                let sample = TelemetrySample {
                    observed_bitrate_bps: bitrate,
                    stall_count,
                    buffer_empty: false,
                    likely_to_keep_up: stall_free,
                    buffer_full: stall_free && steady,
                };
                store_sample(&telemetry, sample);
                publish_flags(&events, generation, &mut last_flags, sample);
            }
        }
    }
}

/// Bits per second over the rolling window, 0 until the window spans enough
/// time to be meaningful.
fn window_bitrate(window: &VecDeque<(Instant, usize)>, now: Instant) -> f64 {
    let Some((oldest, _)) = window.front() else {
        return 0.0;
    };
    let span = now.duration_since(*oldest);
    if span < Duration::from_secs(1) {
        return 0.0;
    }
    let bytes: usize = window.iter().map(|(_, n)| *n).sum();
    bytes as f64 * 8.0 / span.as_secs_f64()
}

fn store_sample(telemetry: &Arc<Mutex<Option<TelemetrySample>>>, sample: TelemetrySample) {
    if let Ok(mut guard) = telemetry.lock() {
        *guard = Some(sample);
    }
}

/// Sends a buffering event when the flags change, mirroring how a decoder
/// surfaces buffering transitions between telemetry polls.
fn publish_flags(
    events: &EventSender,
    generation: u64,
    last: &mut Option<(bool, bool, bool)>,
    sample: TelemetrySample,
) {
    let flags = (
        sample.buffer_empty,
        sample.likely_to_keep_up,
        sample.buffer_full,
    );
    if *last == Some(flags) {
        return;
    }
    *last = Some(flags);
    let _ = events.send(Event::Stream {
        generation,
        event: StreamEvent::Buffering {
            buffer_empty: flags.0,
            likely_to_keep_up: flags.1,
            buffer_full: flags.2,
        },
    });
}

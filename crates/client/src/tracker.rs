// crates/client/src/tracker.rs
//! Best-effort interaction telemetry.
//!
//! Everything here is fire-and-forget through an [`EnvelopeSink`]: no
//! blocking, no retries, no queueing across a lost connection. Rapid inputs
//! (slider drags, keystrokes) funnel through a [`Coalescer`], a quiet-period
//! timer with keep-last collapse, so one event goes out per burst, carrying
//! the final value.

use std::sync::Arc;
use std::time::Duration;

use chrono::{SecondsFormat, Utc};
use tokio::sync::{mpsc, watch};

use haggle_core::SessionState;
use haggle_types::{ClientEnvelope, TrackEventPayload};

use crate::transport::EnvelopeSink;

/// Quiet period after the last slider movement before emitting.
pub const SLIDER_QUIET: Duration = Duration::from_millis(500);

/// Quiet period after the last keystroke before emitting.
pub const TYPING_QUIET: Duration = Duration::from_millis(1000);

/// Longest text fragment ever put into a typing event. The full draft never
/// leaves the client past this bound.
pub const TYPING_PREVIEW_MAX: usize = 80;

/// Collapses bursts of inputs into one delayed emission of the latest value.
///
/// Timers are last-write-wins: every new value cancels and replaces the
/// pending deadline. A value equal to the last emitted one is skipped
/// entirely. Dropping the coalescer discards any pending emission.
pub struct Coalescer<T> {
    tx: mpsc::UnboundedSender<T>,
}

impl<T> Coalescer<T>
where
    T: Clone + PartialEq + Send + 'static,
{
    pub fn new(quiet: Duration, mut emit: impl FnMut(T) + Send + 'static) -> Self {
        let (tx, mut rx) = mpsc::unbounded_channel::<T>();
        tokio::spawn(async move {
            let mut last_emitted: Option<T> = None;
            while let Some(mut latest) = rx.recv().await {
                loop {
                    match tokio::time::timeout(quiet, rx.recv()).await {
                        Ok(Some(value)) => latest = value,
                        Ok(None) => return, // handle dropped: discard pending
                        Err(_) => {
                            if last_emitted.as_ref() != Some(&latest) {
                                emit(latest.clone());
                                last_emitted = Some(latest);
                            }
                            break;
                        }
                    }
                }
            }
        });
        Self { tx }
    }

    /// Record a new value, restarting the quiet period.
    pub fn update(&self, value: T) {
        let _ = self.tx.send(value);
    }
}

/// Emits user-interaction telemetry for one session.
pub struct InteractionTracker {
    sink: Arc<dyn EnvelopeSink>,
    state: watch::Receiver<SessionState>,
    slider: Coalescer<u8>,
    typing: Coalescer<String>,
}

impl InteractionTracker {
    pub fn new(sink: Arc<dyn EnvelopeSink>, state: watch::Receiver<SessionState>) -> Self {
        let slider = {
            let sink = Arc::clone(&sink);
            let state = state.clone();
            Coalescer::new(SLIDER_QUIET, move |pct: u8| {
                emit(
                    &sink,
                    &state,
                    "slider_change",
                    serde_json::json!({ "pct": pct }),
                );
            })
        };
        let typing = {
            let sink = Arc::clone(&sink);
            let state = state.clone();
            Coalescer::new(TYPING_QUIET, move |text: String| {
                emit(
                    &sink,
                    &state,
                    "typing",
                    serde_json::json!({
                        "len": text.chars().count(),
                        "preview": bounded_preview(&text, TYPING_PREVIEW_MAX),
                    }),
                );
            })
        };
        Self {
            sink,
            state,
            slider,
            typing,
        }
    }

    /// Coalesced: one event per drag, carrying the final position.
    pub fn slider_changed(&self, pct: u8) {
        self.slider.update(pct);
    }

    /// Coalesced: one event per typing burst, carrying length and a bounded
    /// preview of the current text.
    pub fn text_changed(&self, text: impl Into<String>) {
        self.typing.update(text.into());
    }

    /// Immediate: a paste or drop was intercepted.
    pub fn paste_intercepted(&self, blocked: bool) {
        emit(
            &self.sink,
            &self.state,
            "paste_intercept",
            serde_json::json!({ "blocked": blocked }),
        );
    }

    /// Immediate: a discrete action (button press, decision) with optional
    /// structured metadata.
    pub fn action(&self, label: &str, data: serde_json::Value) {
        emit(&self.sink, &self.state, label, data);
    }
}

/// Build and send one telemetry envelope. The round is read from current
/// session state at emission time, which keeps it monotone across events.
fn emit(
    sink: &Arc<dyn EnvelopeSink>,
    state: &watch::Receiver<SessionState>,
    event: &str,
    data: serde_json::Value,
) {
    let payload = TrackEventPayload {
        event: event.to_string(),
        ts: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        round: state.borrow().round_number,
        data,
    };
    sink.send(ClientEnvelope::TrackEvent(payload));
}

fn bounded_preview(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    text.chars().take(max).collect()
}

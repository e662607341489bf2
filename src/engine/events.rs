//! Progress and status notifications.
//!
//! The engine never talks to a presentation layer directly. Callers pass an
//! [`EngineObserver`]; the engine reports coarse progress while extracting,
//! scanning, resolving and searching, and announces every status change.
//!
//! Three observers are provided:
//!
//! - [`NoopObserver`] ignores everything
//! - [`TracingObserver`] forwards events to the log
//! - [`ChannelObserver`] turns events into [`EngineEvent`] values on a tokio
//!   channel for callers that prefer to subscribe

use serde::Serialize;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};

/// Completion of a long-running step
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Progress {
    /// Fraction done, in `[0, 1]`
    Fraction(f64),
    /// Work is happening but its size is unknown
    Indeterminate,
}

impl Progress {
    /// Build a fraction from a done/total count; an empty total counts as done
    #[must_use]
    pub fn of(done: usize, total: usize) -> Self {
        if total == 0 {
            return Self::Fraction(1.0);
        }
        #[allow(clippy::cast_precision_loss)]
        let fraction = done as f64 / total as f64;
        Self::Fraction(fraction.clamp(0.0, 1.0))
    }
}

/// Lifecycle state of an engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EngineState {
    /// Opened, no index loaded or built yet
    Uninitialized,
    /// An index build is running; queries and rebuilds are rejected
    Busy,
    /// An index is available
    Ready,
    /// The last build failed
    Error,
}

impl std::fmt::Display for EngineState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Uninitialized => write!(f, "uninitialized"),
            Self::Busy => write!(f, "busy"),
            Self::Ready => write!(f, "ready"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// Receiver of engine notifications.
///
/// Implementations must be cheap: progress is reported once per scanned
/// block and once per resolved header.
pub trait EngineObserver: Send + Sync {
    fn on_progress(&self, _label: &str, _progress: Progress) {}

    fn on_status(&self, _state: EngineState, _message: &str) {}
}

/// Observer that drops every event
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl EngineObserver for NoopObserver {}

/// Observer that writes events to the `tracing` log
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl EngineObserver for TracingObserver {
    fn on_progress(&self, label: &str, progress: Progress) {
        match progress {
            Progress::Fraction(f) => tracing::trace!("{label} {:.1}%", f * 100.0),
            Progress::Indeterminate => tracing::trace!("{label}"),
        }
    }

    fn on_status(&self, state: EngineState, message: &str) {
        match state {
            EngineState::Error => tracing::error!("{message}"),
            _ => tracing::info!("[{state}] {message}"),
        }
    }
}

/// A notification delivered through [`ChannelObserver`]
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum EngineEvent {
    Progress { label: String, progress: Progress },
    Status { state: EngineState, message: String },
}

/// Observer that forwards events to an unbounded channel
#[derive(Debug, Clone)]
pub struct ChannelObserver {
    tx: UnboundedSender<EngineEvent>,
}

impl ChannelObserver {
    /// Create an observer and the receiver that yields its events
    #[must_use]
    pub fn channel() -> (Self, UnboundedReceiver<EngineEvent>) {
        let (tx, rx) = unbounded_channel();
        (Self { tx }, rx)
    }
}

impl EngineObserver for ChannelObserver {
    fn on_progress(&self, label: &str, progress: Progress) {
        // A dropped receiver just means nobody is listening any more
        let _ = self.tx.send(EngineEvent::Progress {
            label: label.to_string(),
            progress,
        });
    }

    fn on_status(&self, state: EngineState, message: &str) {
        let _ = self.tx.send(EngineEvent::Status {
            state,
            message: message.to_string(),
        });
    }
}

//! Per-session agent timing.
//!
//! A [`SessionClock`] is owned by whoever observes a session's events: the
//! live agent hooks or the cost scanner replaying a session log. It starts
//! when a prompt is sent and finishes when the reply lands, yielding a
//! [`TurnTiming`].

use chrono::{DateTime, Duration, Utc};

/// Timing of one agent turn.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TurnTiming {
    /// Time between the prompt and the reply.
    pub elapsed: Duration,
    /// Output tokens produced by the reply.
    pub output_tokens: u64,
}

impl TurnTiming {
    /// Elapsed time in seconds.
    #[allow(clippy::cast_precision_loss)]
    pub fn seconds(&self) -> f64 {
        self.elapsed.num_milliseconds() as f64 / 1000.0
    }

    /// Output tokens per second, `None` for a zero-length turn.
    #[allow(clippy::cast_precision_loss)]
    pub fn tokens_per_second(&self) -> Option<f64> {
        let secs = self.seconds();
        (secs > 0.0).then(|| self.output_tokens as f64 / secs)
    }
}

/// Start time of the in-flight agent turn, if any.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionClock {
    started_at: Option<DateTime<Utc>>,
}

impl SessionClock {
    /// Creates an idle clock.
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks the start of a turn. A second start restarts the clock.
    pub fn start(&mut self, at: DateTime<Utc>) {
        self.started_at = Some(at);
    }

    /// Ends the running turn.
    ///
    /// Returns `None` if no turn was running or the end precedes the start.
    pub fn finish(&mut self, at: DateTime<Utc>, output_tokens: u64) -> Option<TurnTiming> {
        let started_at = self.started_at.take()?;
        let elapsed = at - started_at;
        (elapsed >= Duration::zero()).then_some(TurnTiming {
            elapsed,
            output_tokens,
        })
    }

    /// True while a turn is running.
    pub fn is_running(&self) -> bool {
        self.started_at.is_some()
    }

    /// Start of the running turn.
    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    /// Drops the running turn without producing a timing.
    pub fn reset(&mut self) {
        self.started_at = None;
    }
}

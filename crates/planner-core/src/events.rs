use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::session::SessionResult;
use crate::timer::{IntervalKind, TimerState};

/// Every state change in a timer or session produces an Event.
/// Front ends render them; the core never calls back into a UI.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    TimerStarted {
        kind: IntervalKind,
        duration_secs: u64,
        at: DateTime<Utc>,
    },
    TimerPaused {
        remaining_secs: u64,
        at: DateTime<Utc>,
    },
    TimerResumed {
        remaining_secs: u64,
        at: DateTime<Utc>,
    },
    /// Remaining time reached zero, or the interval was skipped.
    TimerCompleted {
        kind: IntervalKind,
        elapsed_secs: u64,
        at: DateTime<Utc>,
    },
    /// Timer stopped without completing.
    TimerCancelled {
        kind: IntervalKind,
        elapsed_secs: u64,
        at: DateTime<Utc>,
    },
    /// The orchestrator handed the next planned interval to a timer.
    IntervalDispatched {
        index: usize,
        kind: IntervalKind,
        minutes: u32,
        state: TimerState,
        at: DateTime<Utc>,
    },
    /// A rest ran out and the session is waiting for the user.
    IdleStarted {
        at: DateTime<Utc>,
    },
    IdleEnded {
        idle_secs: u64,
        at: DateTime<Utc>,
    },
    SessionFinished {
        result: SessionResult,
        at: DateTime<Utc>,
    },
}

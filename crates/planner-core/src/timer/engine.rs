//! Countdown timer state machine.
//!
//! The engine is wall-clock based and has no thread of its own: the caller
//! polls `tick()` (roughly every half second) and reacts to the events it
//! returns. The same engine runs focus and rest intervals.
//!
//! ## State Transitions
//!
//! ```text
//! Paused <-> Running -> Finished
//! ```
//!
//! `Finished` is terminal. It is reached when the remaining time hits zero,
//! when the orchestrator forces it (`finish`), or on `cancel`.
//!
//! ## Usage
//!
//! ```ignore
//! let mut engine = TimerEngine::new(IntervalKind::Focus, clock);
//! engine.start(25 * 60);
//! // In a loop:
//! engine.tick(); // Returns Some(Event::TimerCompleted) exactly once
//! ```

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::plan::IntervalKind;
use super::stopwatch::Stopwatch;
use crate::clock::{format_clock, Clock};
use crate::events::Event;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimerState {
    Paused,
    Running,
    Finished,
}

/// Which session total a span of time belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Bucket {
    Focus,
    Rest,
    Idle,
}

impl From<IntervalKind> for Bucket {
    fn from(kind: IntervalKind) -> Self {
        match kind {
            IntervalKind::Focus => Bucket::Focus,
            IntervalKind::Rest => Bucket::Rest,
        }
    }
}

/// Seconds actually spent, tagged with the total they count towards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeEntry {
    pub bucket: Bucket,
    pub secs: u64,
}

/// Point-in-time view of a timer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerSnapshot {
    pub kind: IntervalKind,
    pub state: TimerState,
    pub total_seconds: u64,
    pub checkpoint_seconds: u64,
    pub remaining_seconds: u64,
    pub elapsed_run_seconds: u64,
}

/// Pausable countdown.
///
/// Internally everything is kept in milliseconds so that the sum of run
/// segments always equals `total - remaining` at a pause.
pub struct TimerEngine {
    kind: IntervalKind,
    clock: Arc<dyn Clock>,
    state: TimerState,
    total_ms: u64,
    /// Remaining time captured at the last pause.
    checkpoint_ms: u64,
    /// Remaining time as of the last tick or pause.
    remaining_ms: u64,
    segment: Stopwatch,
    /// Elapsed time of the most recently closed run segment.
    last_segment_ms: u64,
    /// Sum of every closed run segment.
    closed_ms: u64,
    ever_started: bool,
}

impl fmt::Debug for TimerEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TimerEngine")
            .field("kind", &self.kind)
            .field("state", &self.state)
            .field("total_ms", &self.total_ms)
            .field("checkpoint_ms", &self.checkpoint_ms)
            .field("remaining_ms", &self.remaining_ms)
            .field("closed_ms", &self.closed_ms)
            .finish()
    }
}

impl TimerEngine {
    /// A zero-length paused timer. Call `load` or `start` to arm it.
    pub fn new(kind: IntervalKind, clock: Arc<dyn Clock>) -> Self {
        Self {
            kind,
            clock,
            state: TimerState::Paused,
            total_ms: 0,
            checkpoint_ms: 0,
            remaining_ms: 0,
            segment: Stopwatch::default(),
            last_segment_ms: 0,
            closed_ms: 0,
            ever_started: false,
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn kind(&self) -> IntervalKind {
        self.kind
    }

    pub fn state(&self) -> TimerState {
        self.state
    }

    pub fn total_secs(&self) -> u64 {
        self.total_ms / 1000
    }

    pub fn checkpoint_secs(&self) -> u64 {
        self.checkpoint_ms / 1000
    }

    /// Remaining seconds as they would be displayed right now.
    pub fn remaining_secs(&self) -> u64 {
        self.live_remaining_ms() / 1000
    }

    /// Wall time of the current run segment, or of the last one if the
    /// timer is not running.
    pub fn elapsed_run_secs(&self) -> u64 {
        if self.segment.is_running() {
            self.segment.elapsed_ms(self.clock.now_ms()) / 1000
        } else {
            self.last_segment_ms / 1000
        }
    }

    /// Wall time across every run segment so far.
    pub fn elapsed_total_secs(&self) -> u64 {
        let live = self.segment.elapsed_ms(self.clock.now_ms());
        (self.closed_ms + live) / 1000
    }

    /// `MM:SS` of the remaining time.
    pub fn display(&self) -> String {
        format_clock(self.remaining_secs())
    }

    pub fn results(&self) -> TimeEntry {
        TimeEntry {
            bucket: self.kind.into(),
            secs: self.elapsed_total_secs(),
        }
    }

    pub fn snapshot(&self) -> TimerSnapshot {
        TimerSnapshot {
            kind: self.kind,
            state: self.state,
            total_seconds: self.total_secs(),
            checkpoint_seconds: self.checkpoint_secs(),
            remaining_seconds: self.remaining_secs(),
            elapsed_run_seconds: self.elapsed_run_secs(),
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Arm the timer with `total_secs` without starting it.
    pub fn load(&mut self, total_secs: u64) {
        let total_ms = total_secs.saturating_mul(1000);
        self.state = TimerState::Paused;
        self.total_ms = total_ms;
        self.checkpoint_ms = total_ms;
        self.remaining_ms = total_ms;
        self.segment = Stopwatch::default();
        self.last_segment_ms = 0;
        self.closed_ms = 0;
        self.ever_started = false;
    }

    /// Arm the timer with `total_secs` and start running immediately.
    pub fn start(&mut self, total_secs: u64) -> Option<Event> {
        self.load(total_secs);
        self.toggle()
    }

    /// Pause a running timer or resume a paused one. No-op once finished.
    pub fn toggle(&mut self) -> Option<Event> {
        if let Some(event) = self.complete_if_expired() {
            return Some(event);
        }
        let now_ms = self.clock.now_ms();
        match self.state {
            TimerState::Running => {
                self.remaining_ms = self.live_remaining_ms();
                self.close_segment(now_ms);
                self.checkpoint_ms = self.remaining_ms;
                self.state = TimerState::Paused;
                debug!(kind = ?self.kind, remaining_ms = self.remaining_ms, "timer paused");
                Some(Event::TimerPaused {
                    remaining_secs: self.remaining_ms / 1000,
                    at: self.clock.now(),
                })
            }
            TimerState::Paused => {
                self.segment.start(now_ms);
                self.state = TimerState::Running;
                if self.ever_started {
                    Some(Event::TimerResumed {
                        remaining_secs: self.checkpoint_ms / 1000,
                        at: self.clock.now(),
                    })
                } else {
                    self.ever_started = true;
                    Some(Event::TimerStarted {
                        kind: self.kind,
                        duration_secs: self.total_secs(),
                        at: self.clock.now(),
                    })
                }
            }
            TimerState::Finished => None,
        }
    }

    /// Call periodically. Returns `Some(Event::TimerCompleted)` once, on the
    /// tick where the remaining time reaches zero.
    pub fn tick(&mut self) -> Option<Event> {
        self.complete_if_expired()
    }

    /// Force the timer to `Finished` as if it had run out (manual skip).
    /// Elapsed time stays what was actually spent.
    pub fn finish(&mut self) -> Option<Event> {
        if self.state == TimerState::Finished {
            return None;
        }
        if let Some(event) = self.complete_if_expired() {
            return Some(event);
        }
        let now_ms = self.clock.now_ms();
        self.close_segment(now_ms);
        self.remaining_ms = 0;
        self.checkpoint_ms = 0;
        self.state = TimerState::Finished;
        Some(Event::TimerCompleted {
            kind: self.kind,
            elapsed_secs: self.closed_ms / 1000,
            at: self.clock.now(),
        })
    }

    /// Stop ticking and freeze the recorded elapsed time. Safe to call any
    /// number of times; only the first call on a live timer emits an event.
    pub fn cancel(&mut self) -> Option<Event> {
        if self.state == TimerState::Finished {
            return None;
        }
        if let Some(event) = self.complete_if_expired() {
            return Some(event);
        }
        let now_ms = self.clock.now_ms();
        self.remaining_ms = self.live_remaining_ms();
        self.close_segment(now_ms);
        self.checkpoint_ms = self.remaining_ms;
        self.state = TimerState::Finished;
        Some(Event::TimerCancelled {
            kind: self.kind,
            elapsed_secs: self.closed_ms / 1000,
            at: self.clock.now(),
        })
    }

    // ── Internal ─────────────────────────────────────────────────────

    /// Move a running timer whose remaining time already hit zero to
    /// `Finished`. Every command checks this first, since the countdown can
    /// run out between two polls. The segment is charged up to the
    /// checkpoint only; wall time past zero was never run time.
    fn complete_if_expired(&mut self) -> Option<Event> {
        if self.state != TimerState::Running || self.live_remaining_ms() > 0 {
            return None;
        }
        let ran = self.segment.stop(self.clock.now_ms()).min(self.checkpoint_ms);
        self.last_segment_ms = ran;
        self.closed_ms += ran;
        self.remaining_ms = 0;
        self.checkpoint_ms = 0;
        self.state = TimerState::Finished;
        debug!(kind = ?self.kind, elapsed_ms = self.closed_ms, "timer ran out");
        Some(Event::TimerCompleted {
            kind: self.kind,
            elapsed_secs: self.closed_ms / 1000,
            at: self.clock.now(),
        })
    }

    fn live_remaining_ms(&self) -> u64 {
        if self.state != TimerState::Running {
            return self.remaining_ms;
        }
        let ran = self.segment.raw_elapsed_ms(self.clock.now_ms());
        self.checkpoint_ms.saturating_sub(ran)
    }

    fn close_segment(&mut self, now_ms: i64) {
        if self.segment.is_running() {
            let elapsed = self.segment.stop(now_ms);
            self.last_segment_ms = elapsed;
            self.closed_ms += elapsed;
        }
    }
}

//! Session orchestration over an interval plan.
//!
//! The orchestrator walks an [`IntervalPlan`], arming one [`TimerEngine`]
//! per interval, and adds up the time actually spent into a
//! [`SessionResult`]. It is driven the same way as the engine: the caller
//! polls `tick()` and forwards user actions (`toggle`, `step`, `skip`,
//! `abandon`).
//!
//! ```text
//! step -> Focus(paused) -> Rest -> Idle -> step -> Focus -> ... -> Finished
//! ```
//!
//! Only the first focus interval waits for the user; later ones start
//! running as soon as they are dispatched. When a rest runs out the session
//! enters an idle phase that lasts until the next `step()`.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::clock::Clock;
use crate::events::Event;
use crate::timer::{
    Bucket, IdleTimer, IntervalKind, IntervalPlan, TimeEntry, TimerEngine, TimerSnapshot,
    TimerState,
};

/// What the session is being run for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionKind {
    Task,
    Minitask,
    /// A standalone session not attached to any job.
    Free,
}

/// Where a finished session's result should be delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Destination {
    /// The job store, for tasks.
    Schedule,
    /// A project board, for minitasks.
    Project,
    /// Nowhere; free sessions only report.
    Activity,
}

/// Back-references that route a result to the job that owns it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionTarget {
    pub rank: Option<usize>,
    pub kind: SessionKind,
    pub next_destination: Destination,
}

impl SessionTarget {
    pub fn task(rank: usize) -> Self {
        Self {
            rank: Some(rank),
            kind: SessionKind::Task,
            next_destination: Destination::Schedule,
        }
    }

    pub fn minitask(rank: usize) -> Self {
        Self {
            rank: Some(rank),
            kind: SessionKind::Minitask,
            next_destination: Destination::Project,
        }
    }

    pub fn free() -> Self {
        Self {
            rank: None,
            kind: SessionKind::Free,
            next_destination: Destination::Activity,
        }
    }
}

/// Accumulated outcome of one session. All totals are in seconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionResult {
    pub tot_focus: u64,
    pub tot_rest: u64,
    pub tot_idle: u64,
    /// True only when the whole plan ran; false when abandoned.
    pub done: bool,
    pub rank: Option<usize>,
    pub kind: SessionKind,
    pub next_destination: Destination,
}

impl SessionResult {
    pub fn new(target: SessionTarget) -> Self {
        Self {
            tot_focus: 0,
            tot_rest: 0,
            tot_idle: 0,
            done: false,
            rank: target.rank,
            kind: target.kind,
            next_destination: target.next_destination,
        }
    }

    /// Add an entry to its matching total.
    pub fn record(&mut self, entry: TimeEntry) {
        let bucket = match entry.bucket {
            Bucket::Focus => &mut self.tot_focus,
            Bucket::Rest => &mut self.tot_rest,
            Bucket::Idle => &mut self.tot_idle,
        };
        *bucket += entry.secs;
    }

    pub fn record_all(&mut self, entries: impl IntoIterator<Item = TimeEntry>) {
        for entry in entries {
            self.record(entry);
        }
    }
}

enum Phase {
    /// Nothing dispatched yet, or between phases.
    Pending,
    Interval(TimerEngine),
    Idle(IdleTimer),
    Finished,
}

impl Phase {
    fn name(&self) -> &'static str {
        match self {
            Phase::Pending => "pending",
            Phase::Interval(_) => "interval",
            Phase::Idle(_) => "idle",
            Phase::Finished => "finished",
        }
    }
}

pub struct SessionOrchestrator {
    plan: IntervalPlan,
    /// Next interval to dispatch.
    idx: usize,
    clock: Arc<dyn Clock>,
    phase: Phase,
    result: SessionResult,
}

impl fmt::Debug for SessionOrchestrator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionOrchestrator")
            .field("plan", &self.plan)
            .field("idx", &self.idx)
            .field("phase", &self.phase.name())
            .field("result", &self.result)
            .finish()
    }
}

impl SessionOrchestrator {
    pub fn new(plan: IntervalPlan, target: SessionTarget, clock: Arc<dyn Clock>) -> Self {
        Self {
            plan,
            idx: 0,
            clock,
            phase: Phase::Pending,
            result: SessionResult::new(target),
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn plan(&self) -> &IntervalPlan {
        &self.plan
    }

    /// Index of the next interval to dispatch.
    pub fn next_index(&self) -> usize {
        self.idx
    }

    pub fn result(&self) -> &SessionResult {
        &self.result
    }

    pub fn is_finished(&self) -> bool {
        matches!(self.phase, Phase::Finished)
    }

    pub fn is_idle(&self) -> bool {
        matches!(self.phase, Phase::Idle(_))
    }

    pub fn phase_name(&self) -> &'static str {
        self.phase.name()
    }

    pub fn active_timer(&self) -> Option<&TimerEngine> {
        match &self.phase {
            Phase::Interval(engine) => Some(engine),
            _ => None,
        }
    }

    pub fn idle_timer(&self) -> Option<&IdleTimer> {
        match &self.phase {
            Phase::Idle(idle) => Some(idle),
            _ => None,
        }
    }

    pub fn snapshot(&self) -> Option<TimerSnapshot> {
        self.active_timer().map(TimerEngine::snapshot)
    }

    /// `MM:SS` of whatever is on screen: the countdown, or the idle count-up.
    pub fn display(&self) -> Option<String> {
        match &self.phase {
            Phase::Interval(engine) => Some(engine.display()),
            Phase::Idle(idle) => Some(idle.display()),
            _ => None,
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Dispatch the next planned interval, or finish the session when the
    /// plan is exhausted. Whatever phase was active is closed first and its
    /// time recorded, so calling this during idle is the user's "continue".
    pub fn step(&mut self) -> Event {
        if self.is_finished() {
            return self.finished_event();
        }
        self.close_current();

        let Some(interval) = self.plan.get(self.idx).copied() else {
            self.result.done = true;
            self.phase = Phase::Finished;
            info!(
                tot_focus = self.result.tot_focus,
                tot_rest = self.result.tot_rest,
                tot_idle = self.result.tot_idle,
                "session completed"
            );
            return self.finished_event();
        };

        let index = self.idx;
        let mut engine = TimerEngine::new(interval.kind, self.clock.clone());
        if index == 0 {
            engine.load(interval.duration_secs());
        } else {
            engine.start(interval.duration_secs());
        }
        let state = engine.state();
        self.idx += 1;
        self.phase = Phase::Interval(engine);
        debug!(index, kind = ?interval.kind, minutes = interval.minutes, "interval dispatched");
        Event::IntervalDispatched {
            index,
            kind: interval.kind,
            minutes: interval.minutes,
            state,
            at: self.clock.now(),
        }
    }

    /// Poll the active timer. When an interval runs out the session moves on
    /// by itself: focus steps to the next interval, rest enters idle.
    pub fn tick(&mut self) -> Option<Event> {
        let Phase::Interval(engine) = &mut self.phase else {
            return None;
        };
        match engine.tick()? {
            Event::TimerCompleted { kind, .. } => Some(self.after_interval(kind)),
            other => Some(other),
        }
    }

    /// Pause or resume the active interval. If the interval ran out since
    /// the last poll, the session moves on exactly as `tick` would.
    pub fn toggle(&mut self) -> Option<Event> {
        let Phase::Interval(engine) = &mut self.phase else {
            return None;
        };
        match engine.toggle()? {
            Event::TimerCompleted { kind, .. } => Some(self.after_interval(kind)),
            other => Some(other),
        }
    }

    /// Cut the active interval short and carry on as if it had run out.
    /// During idle this is the same as `step()`.
    pub fn skip(&mut self) -> Event {
        if let Phase::Interval(engine) = &mut self.phase {
            let kind = engine.kind();
            engine.finish();
            return self.after_interval(kind);
        }
        self.step()
    }

    /// Quit mid-session. Stops the active timer, keeps the time already
    /// spent and returns the partial result with `done = false`. Calling it
    /// on a finished session just returns the final result.
    pub fn abandon(&mut self) -> SessionResult {
        if self.is_finished() {
            return self.result.clone();
        }
        self.close_current();
        self.result.done = false;
        self.phase = Phase::Finished;
        info!(
            tot_focus = self.result.tot_focus,
            tot_rest = self.result.tot_rest,
            tot_idle = self.result.tot_idle,
            "session abandoned"
        );
        self.result.clone()
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn after_interval(&mut self, kind: IntervalKind) -> Event {
        self.close_current();
        match kind {
            IntervalKind::Rest => {
                let mut idle = IdleTimer::new(self.clock.clone());
                let event = idle.start();
                self.phase = Phase::Idle(idle);
                event
            }
            IntervalKind::Focus => self.step(),
        }
    }

    /// Stop whatever is running and fold its time into the result.
    fn close_current(&mut self) {
        match std::mem::replace(&mut self.phase, Phase::Pending) {
            Phase::Interval(mut engine) => {
                if engine.state() != TimerState::Finished {
                    engine.cancel();
                }
                self.result.record(engine.results());
            }
            Phase::Idle(mut idle) => {
                idle.stop();
                self.result.record(idle.results());
            }
            Phase::Pending => {}
            Phase::Finished => self.phase = Phase::Finished,
        }
    }

    fn finished_event(&self) -> Event {
        Event::SessionFinished {
            result: self.result.clone(),
            at: self.clock.now(),
        }
    }
}

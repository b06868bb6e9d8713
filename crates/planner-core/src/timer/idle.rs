//! Open-ended idle timer.
//!
//! Counts up from the end of a rest span until the user acts again. There is
//! no duration and no pause; it only shares the elapsed-since-start
//! primitive with the countdown engine.

use std::fmt;
use std::sync::Arc;

use super::engine::{Bucket, TimeEntry};
use super::stopwatch::Stopwatch;
use crate::clock::{format_clock, Clock};
use crate::events::Event;

pub struct IdleTimer {
    clock: Arc<dyn Clock>,
    stopwatch: Stopwatch,
    accumulated_ms: u64,
}

impl fmt::Debug for IdleTimer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IdleTimer")
            .field("running", &self.stopwatch.is_running())
            .field("accumulated_ms", &self.accumulated_ms)
            .finish()
    }
}

impl IdleTimer {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            stopwatch: Stopwatch::default(),
            accumulated_ms: 0,
        }
    }

    pub fn start(&mut self) -> Event {
        self.stopwatch.start(self.clock.now_ms());
        Event::IdleStarted {
            at: self.clock.now(),
        }
    }

    pub fn is_running(&self) -> bool {
        self.stopwatch.is_running()
    }

    pub fn elapsed_secs(&self) -> u64 {
        (self.accumulated_ms + self.stopwatch.elapsed_ms(self.clock.now_ms())) / 1000
    }

    /// `MM:SS` counted up since the idle phase began.
    pub fn display(&self) -> String {
        format_clock(self.elapsed_secs())
    }

    /// Stop counting. Idempotent: a second stop adds nothing.
    pub fn stop(&mut self) -> Event {
        self.accumulated_ms += self.stopwatch.stop(self.clock.now_ms());
        Event::IdleEnded {
            idle_secs: self.accumulated_ms / 1000,
            at: self.clock.now(),
        }
    }

    pub fn results(&self) -> TimeEntry {
        TimeEntry {
            bucket: Bucket::Idle,
            secs: self.elapsed_secs(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;

    #[test]
    fn counts_up_until_stopped() {
        let clock = ManualClock::shared();
        let mut idle = IdleTimer::new(clock.clone());
        idle.start();
        clock.advance_secs(75);
        assert_eq!(idle.display(), "01:15");
        assert!(matches!(idle.stop(), Event::IdleEnded { idle_secs: 75, .. }));
        clock.advance_secs(30);
        idle.stop();
        assert_eq!(idle.results(), TimeEntry { bucket: Bucket::Idle, secs: 75 });
        assert!(!idle.is_running());
    }
}

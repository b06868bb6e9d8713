//! Elapsed-since-start primitive shared by countdown and idle timers.

use tracing::warn;

/// Longest believable run segment. Anything longer means the machine slept
/// or the wall clock jumped, and the segment is reported as zero.
pub const MAX_SEGMENT_MS: u64 = 24 * 60 * 60 * 1000;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Stopwatch {
    started_ms: Option<i64>,
}

impl Stopwatch {
    pub fn start(&mut self, now_ms: i64) {
        self.started_ms = Some(now_ms);
    }

    pub fn is_running(&self) -> bool {
        self.started_ms.is_some()
    }

    /// Wall time since start, unguarded. A clock that went backwards reads 0.
    pub fn raw_elapsed_ms(&self, now_ms: i64) -> u64 {
        match self.started_ms {
            Some(start) => u64::try_from(now_ms.saturating_sub(start)).unwrap_or(0),
            None => 0,
        }
    }

    /// Wall time since start, with the 24-hour anomaly clamp applied.
    pub fn elapsed_ms(&self, now_ms: i64) -> u64 {
        let raw = self.raw_elapsed_ms(now_ms);
        if raw > MAX_SEGMENT_MS {
            warn!(elapsed_ms = raw, "run segment longer than 24h, reporting zero");
            return 0;
        }
        raw
    }

    /// Stop and return the guarded elapsed time. Stopping twice returns 0.
    pub fn stop(&mut self, now_ms: i64) -> u64 {
        let elapsed = self.elapsed_ms(now_ms);
        self.started_ms = None;
        elapsed
    }
}

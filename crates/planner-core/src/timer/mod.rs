mod engine;
mod idle;
mod plan;
mod stopwatch;

pub use engine::{Bucket, TimeEntry, TimerEngine, TimerSnapshot, TimerState};
pub use idle::IdleTimer;
pub use plan::{build_plan, build_repeated_plan, Interval, IntervalKind, IntervalPlan};
pub use stopwatch::{Stopwatch, MAX_SEGMENT_MS};

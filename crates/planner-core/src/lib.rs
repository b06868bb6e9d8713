//! # Planner Core Library
//!
//! Core logic for a personal planner that ranks work items and runs timed
//! focus/rest sessions against them. Every operation is reachable from the
//! standalone `planner` CLI, which is a thin layer over this crate.
//!
//! ## Architecture
//!
//! - **Jobs**: tasks, projects and their minitasks, ranked by a pluggable
//!   scoring strategy
//! - **Timer**: wall-clock countdowns that require the caller to invoke
//!   `tick()` periodically, plus the focus/rest interval planner
//! - **Session**: walks an interval plan, one timer per interval, with an
//!   idle phase after each rest
//! - **Storage**: JSON cache documents and TOML configuration
//!
//! ## Key Components
//!
//! - [`JobStore`]: Ranked job collection
//! - [`TimerEngine`]: Pausable countdown state machine
//! - [`SessionOrchestrator`]: Interval plan runner
//! - [`CacheStore`]: Pending-jobs and timer hand-off documents
//! - [`Config`]: Application configuration management

pub mod clock;
pub mod error;
pub mod events;
pub mod jobs;
pub mod session;
pub mod settings;
pub mod storage;
pub mod timer;

pub use clock::{format_clock, Clock, ManualClock, SystemClock};
pub use error::{CacheError, ConfigError, CoreError, JobError, ValidationError};
pub use events::Event;
pub use jobs::{
    DeadlineStatus, DraftKind, Job, JobDraft, JobKind, JobStore, MiniJob, MiniTaskDraft,
    ProjectBoard, ProjectUpdate, RankingStrategy, StrategyKind,
};
pub use session::{Destination, SessionKind, SessionOrchestrator, SessionResult, SessionTarget};
pub use settings::Settings;
pub use storage::{CacheStore, Config, PendingDocument};
pub use timer::{
    build_plan, build_repeated_plan, IdleTimer, Interval, IntervalKind, IntervalPlan,
    TimerEngine, TimerSnapshot, TimerState,
};

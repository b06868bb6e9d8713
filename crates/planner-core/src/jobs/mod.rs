//! Job model: tasks, projects, minitasks and their finished records.
//!
//! A live job is mutated by ranking (rank, value) and by session results
//! (totals, done). Completing it replaces it with a finished record; the
//! finished record is never mutated except for its display rank.

mod draft;
mod project;
pub mod ranking;
mod store;

pub use draft::{DraftKind, JobDraft, MiniTaskDraft, RESERVED_NAME};
pub use project::{ProjectBoard, ProjectUpdate};
pub use ranking::{RankingStrategy, StrategyKind};
pub use store::JobStore;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::session::SessionResult;

/// Job variant tag, as stored in the `type` field of a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobKind {
    Task,
    Project,
    Minitask,
    FinishedTask,
    FinishedProject,
    FinishedMinitask,
}

impl JobKind {
    pub fn is_finished(self) -> bool {
        matches!(
            self,
            JobKind::FinishedTask | JobKind::FinishedProject | JobKind::FinishedMinitask
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            JobKind::Task => "task",
            JobKind::Project => "project",
            JobKind::Minitask => "minitask",
            JobKind::FinishedTask => "finished task",
            JobKind::FinishedProject => "finished project",
            JobKind::FinishedMinitask => "finished minitask",
        }
    }
}

impl fmt::Display for JobKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Cumulative time spent in sessions, in seconds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionTotals {
    #[serde(default)]
    pub tot_focus: u64,
    #[serde(default)]
    pub tot_rest: u64,
    #[serde(default)]
    pub tot_idle: u64,
}

impl SessionTotals {
    /// Add a session's totals. Repeated sessions accumulate.
    pub fn absorb(&mut self, result: &SessionResult) {
        self.tot_focus += result.tot_focus;
        self.tot_rest += result.tot_rest;
        self.tot_idle += result.tot_idle;
    }
}

/// Time left before a job's deadline, measured from its creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DeadlineStatus {
    Remaining { secs: u64 },
    Overdue,
}

impl DeadlineStatus {
    fn at(creation: DateTime<Utc>, deadline_secs: u64, now: DateTime<Utc>) -> Self {
        let elapsed = (now - creation).num_seconds().max(0) as u64;
        if elapsed >= deadline_secs {
            DeadlineStatus::Overdue
        } else {
            DeadlineStatus::Remaining {
                secs: deadline_secs - elapsed,
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub name: String,
    pub priority: i64,
    /// Seconds from creation.
    pub deadline: u64,
    /// Planned work in minutes.
    pub duration: u32,
    #[serde(default)]
    pub rank: usize,
    #[serde(skip)]
    pub value: f64,
    #[serde(with = "chrono::serde::ts_seconds")]
    pub creation: DateTime<Utc>,
    #[serde(default)]
    pub done: bool,
    #[serde(flatten)]
    pub totals: SessionTotals,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub name: String,
    pub priority: i64,
    /// Seconds from creation.
    pub deadline: u64,
    #[serde(default)]
    pub rank: usize,
    #[serde(skip)]
    pub value: f64,
    #[serde(with = "chrono::serde::ts_seconds")]
    pub creation: DateTime<Utc>,
    #[serde(default)]
    pub done: bool,
    #[serde(default)]
    pub current_minitasks: Vec<MiniJob>,
    #[serde(default)]
    pub completed_minitasks: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MiniTask {
    pub name: String,
    /// Planned work in minutes.
    pub duration: u32,
    #[serde(default)]
    pub rank: usize,
    #[serde(with = "chrono::serde::ts_seconds")]
    pub creation: DateTime<Utc>,
    #[serde(default)]
    pub done: bool,
    #[serde(flatten)]
    pub totals: SessionTotals,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinishedTask {
    pub name: String,
    /// Last priority the user gave the task. Inert once finished.
    pub priority: i64,
    /// Completion order: -2 for the first completion, -3 for the next...
    pub factual_priority: i64,
    pub deadline: u64,
    pub duration: u32,
    #[serde(default)]
    pub rank: usize,
    #[serde(with = "chrono::serde::ts_seconds")]
    pub creation: DateTime<Utc>,
    #[serde(flatten)]
    pub totals: SessionTotals,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinishedProject {
    pub name: String,
    pub priority: i64,
    pub factual_priority: i64,
    pub deadline: u64,
    #[serde(default)]
    pub rank: usize,
    #[serde(with = "chrono::serde::ts_seconds")]
    pub creation: DateTime<Utc>,
    #[serde(default)]
    pub current_minitasks: Vec<MiniJob>,
    #[serde(default)]
    pub completed_minitasks: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinishedMiniTask {
    pub name: String,
    pub duration: u32,
    #[serde(default)]
    pub rank: usize,
    #[serde(with = "chrono::serde::ts_seconds")]
    pub creation: DateTime<Utc>,
    #[serde(flatten)]
    pub totals: SessionTotals,
}

/// An item on a project board.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MiniJob {
    Minitask(MiniTask),
    FinishedMinitask(FinishedMiniTask),
}

impl MiniJob {
    pub fn name(&self) -> &str {
        match self {
            MiniJob::Minitask(m) => &m.name,
            MiniJob::FinishedMinitask(m) => &m.name,
        }
    }

    pub fn kind(&self) -> JobKind {
        match self {
            MiniJob::Minitask(_) => JobKind::Minitask,
            MiniJob::FinishedMinitask(_) => JobKind::FinishedMinitask,
        }
    }

    pub fn rank(&self) -> usize {
        match self {
            MiniJob::Minitask(m) => m.rank,
            MiniJob::FinishedMinitask(m) => m.rank,
        }
    }

    pub fn set_rank(&mut self, rank: usize) {
        match self {
            MiniJob::Minitask(m) => m.rank = rank,
            MiniJob::FinishedMinitask(m) => m.rank = rank,
        }
    }

    pub fn is_finished(&self) -> bool {
        matches!(self, MiniJob::FinishedMinitask(_))
    }

    pub fn duration(&self) -> u32 {
        match self {
            MiniJob::Minitask(m) => m.duration,
            MiniJob::FinishedMinitask(m) => m.duration,
        }
    }

    pub fn totals(&self) -> SessionTotals {
        match self {
            MiniJob::Minitask(m) => m.totals,
            MiniJob::FinishedMinitask(m) => m.totals,
        }
    }
}

impl MiniTask {
    pub fn into_finished(self) -> FinishedMiniTask {
        FinishedMiniTask {
            name: self.name,
            duration: self.duration,
            rank: self.rank,
            creation: self.creation,
            totals: self.totals,
        }
    }
}

/// Anything the job store ranks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Job {
    Task(Task),
    Project(Project),
    FinishedTask(FinishedTask),
    FinishedProject(FinishedProject),
}

impl Job {
    pub fn name(&self) -> &str {
        match self {
            Job::Task(j) => &j.name,
            Job::Project(j) => &j.name,
            Job::FinishedTask(j) => &j.name,
            Job::FinishedProject(j) => &j.name,
        }
    }

    pub fn kind(&self) -> JobKind {
        match self {
            Job::Task(_) => JobKind::Task,
            Job::Project(_) => JobKind::Project,
            Job::FinishedTask(_) => JobKind::FinishedTask,
            Job::FinishedProject(_) => JobKind::FinishedProject,
        }
    }

    pub fn is_finished(&self) -> bool {
        self.kind().is_finished()
    }

    pub fn rank(&self) -> usize {
        match self {
            Job::Task(j) => j.rank,
            Job::Project(j) => j.rank,
            Job::FinishedTask(j) => j.rank,
            Job::FinishedProject(j) => j.rank,
        }
    }

    pub fn set_rank(&mut self, rank: usize) {
        match self {
            Job::Task(j) => j.rank = rank,
            Job::Project(j) => j.rank = rank,
            Job::FinishedTask(j) => j.rank = rank,
            Job::FinishedProject(j) => j.rank = rank,
        }
    }

    /// Score from the last ranking pass. Finished jobs show their
    /// factual priority.
    pub fn value(&self) -> f64 {
        match self {
            Job::Task(j) => j.value,
            Job::Project(j) => j.value,
            Job::FinishedTask(j) => j.factual_priority as f64,
            Job::FinishedProject(j) => j.factual_priority as f64,
        }
    }

    pub(crate) fn set_value(&mut self, value: f64) {
        match self {
            Job::Task(j) => j.value = value,
            Job::Project(j) => j.value = value,
            Job::FinishedTask(_) | Job::FinishedProject(_) => {}
        }
    }

    /// User priority of a live job.
    pub fn priority(&self) -> Option<i64> {
        match self {
            Job::Task(j) => Some(j.priority),
            Job::Project(j) => Some(j.priority),
            Job::FinishedTask(_) | Job::FinishedProject(_) => None,
        }
    }

    /// Completion-order priority of a finished job.
    pub fn factual_priority(&self) -> Option<i64> {
        match self {
            Job::FinishedTask(j) => Some(j.factual_priority),
            Job::FinishedProject(j) => Some(j.factual_priority),
            Job::Task(_) | Job::Project(_) => None,
        }
    }

    pub fn deadline(&self) -> u64 {
        match self {
            Job::Task(j) => j.deadline,
            Job::Project(j) => j.deadline,
            Job::FinishedTask(j) => j.deadline,
            Job::FinishedProject(j) => j.deadline,
        }
    }

    /// Planned minutes; projects have none of their own.
    pub fn duration(&self) -> Option<u32> {
        match self {
            Job::Task(j) => Some(j.duration),
            Job::FinishedTask(j) => Some(j.duration),
            Job::Project(_) | Job::FinishedProject(_) => None,
        }
    }

    pub fn creation(&self) -> DateTime<Utc> {
        match self {
            Job::Task(j) => j.creation,
            Job::Project(j) => j.creation,
            Job::FinishedTask(j) => j.creation,
            Job::FinishedProject(j) => j.creation,
        }
    }

    pub fn is_done(&self) -> bool {
        match self {
            Job::Task(j) => j.done,
            Job::Project(j) => j.done,
            Job::FinishedTask(_) | Job::FinishedProject(_) => true,
        }
    }

    pub fn totals(&self) -> Option<SessionTotals> {
        match self {
            Job::Task(j) => Some(j.totals),
            Job::FinishedTask(j) => Some(j.totals),
            Job::Project(_) | Job::FinishedProject(_) => None,
        }
    }

    /// Countdown to the deadline for live jobs.
    pub fn deadline_status(&self, now: DateTime<Utc>) -> Option<DeadlineStatus> {
        match self {
            Job::Task(j) => Some(DeadlineStatus::at(j.creation, j.deadline, now)),
            Job::Project(j) => Some(DeadlineStatus::at(j.creation, j.deadline, now)),
            Job::FinishedTask(_) | Job::FinishedProject(_) => None,
        }
    }

    /// Turn a live task or project into its finished record. Scheduling
    /// fields (value, done) are dropped. Other kinds are handed back.
    pub fn into_finished(self, factual_priority: i64) -> Result<Job, Job> {
        match self {
            Job::Task(t) => Ok(Job::FinishedTask(FinishedTask {
                name: t.name,
                priority: t.priority,
                factual_priority,
                deadline: t.deadline,
                duration: t.duration,
                rank: t.rank,
                creation: t.creation,
                totals: t.totals,
            })),
            Job::Project(p) => Ok(Job::FinishedProject(FinishedProject {
                name: p.name,
                priority: p.priority,
                factual_priority,
                deadline: p.deadline,
                rank: p.rank,
                creation: p.creation,
                current_minitasks: p.current_minitasks,
                completed_minitasks: p.completed_minitasks,
            })),
            other => Err(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn creation() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap()
    }

    fn task() -> Task {
        Task {
            name: "write report".into(),
            priority: 4,
            deadline: 7200,
            duration: 45,
            rank: 0,
            value: 4.0,
            creation: creation(),
            done: false,
            totals: SessionTotals {
                tot_focus: 60,
                tot_rest: 0,
                tot_idle: 5,
            },
        }
    }

    #[test]
    fn task_record_is_flat_and_tagged() {
        let json = serde_json::to_value(Job::Task(task())).unwrap();
        assert_eq!(json["type"], "task");
        assert_eq!(json["tot_focus"], 60);
        assert_eq!(json["creation"], creation().timestamp());
        assert!(json.get("value").is_none());

        let back: Job = serde_json::from_value(json).unwrap();
        assert_eq!(back.name(), "write report");
        assert_eq!(back.totals().unwrap().tot_idle, 5);
        assert_eq!(back.value(), 0.0);
    }

    #[test]
    fn project_minitasks_keep_their_tags() {
        let project = Job::Project(Project {
            name: "move house".into(),
            priority: 2,
            deadline: 86_400,
            rank: 1,
            value: 0.0,
            creation: creation(),
            done: false,
            current_minitasks: vec![
                MiniJob::Minitask(MiniTask {
                    name: "boxes".into(),
                    duration: 20,
                    rank: 0,
                    creation: creation(),
                    done: false,
                    totals: SessionTotals::default(),
                }),
                MiniJob::FinishedMinitask(FinishedMiniTask {
                    name: "van".into(),
                    duration: 10,
                    rank: 1,
                    creation: creation(),
                    totals: SessionTotals::default(),
                }),
            ],
            completed_minitasks: 1,
        });
        let json = serde_json::to_value(&project).unwrap();
        assert_eq!(json["current_minitasks"][1]["type"], "finished_minitask");
        let back: Job = serde_json::from_value(json).unwrap();
        assert_eq!(back, project);
    }

    #[test]
    fn into_finished_keeps_record_fields() {
        let finished = Job::Task(task()).into_finished(-2).unwrap();
        assert_eq!(finished.kind(), JobKind::FinishedTask);
        assert_eq!(finished.factual_priority(), Some(-2));
        assert_eq!(finished.priority(), None);
        assert_eq!(finished.creation(), creation());
        assert_eq!(finished.totals().unwrap().tot_focus, 60);
        assert!(finished.is_done());

        let again = finished.into_finished(-3);
        assert!(again.is_err());
    }

    #[test]
    fn deadline_counts_down_from_creation() {
        let job = Job::Task(task());
        let now = creation() + chrono::Duration::minutes(30);
        assert_eq!(
            job.deadline_status(now),
            Some(DeadlineStatus::Remaining { secs: 5400 })
        );
        let late = creation() + chrono::Duration::hours(3);
        assert_eq!(job.deadline_status(late), Some(DeadlineStatus::Overdue));
    }

    #[test]
    fn kind_display_labels() {
        assert_eq!(JobKind::FinishedProject.to_string(), "finished project");
        assert!(JobKind::FinishedMinitask.is_finished());
        assert!(!JobKind::Minitask.is_finished());
    }
}

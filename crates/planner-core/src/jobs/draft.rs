//! Editable job drafts.
//!
//! A draft holds exactly what the user typed. `check()` parses it, blanks
//! every field that does not parse and records whether the draft may be
//! submitted. Nothing reaches a [`JobStore`](super::JobStore) without
//! passing through a draft.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Job, MiniJob, MiniTask, Project, SessionTotals, Task};
use crate::error::ValidationError;

/// Document key that holds the settings; no job may use it as a name.
pub const RESERVED_NAME: &str = "settings";

const DEFAULT_PRIORITY: &str = "1";
const DEFAULT_DURATION: &str = "30";
const DEFAULT_TASK_SWITCH_DURATION: &str = "10";
const DEFAULT_DEADLINE_HOURS: &str = "2";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DraftKind {
    #[default]
    Task,
    Project,
}

/// State carried over from a job that is being edited.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
struct Carried {
    creation: Option<DateTime<Utc>>,
    totals: SessionTotals,
    current_minitasks: Vec<MiniJob>,
    completed_minitasks: u32,
}

/// Parsed field values of a draft that passed `check()`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Parsed {
    priority: i64,
    duration: u32,
    deadline: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobDraft {
    pub name: String,
    kind: DraftKind,
    pub priority: String,
    pub duration: String,
    pub deadline_hours: String,
    pub deadline_minutes: String,
    #[serde(default)]
    validity: bool,
    #[serde(default)]
    carried: Carried,
}

impl JobDraft {
    /// A fresh draft with the usual defaults: priority 1, 30 minutes,
    /// due in two hours.
    pub fn new(name: impl Into<String>, kind: DraftKind) -> Self {
        let mut draft = Self {
            name: name.into(),
            kind: DraftKind::Task,
            priority: DEFAULT_PRIORITY.to_string(),
            duration: DEFAULT_DURATION.to_string(),
            deadline_hours: DEFAULT_DEADLINE_HOURS.to_string(),
            deadline_minutes: "0".to_string(),
            validity: false,
            carried: Carried::default(),
        };
        if kind == DraftKind::Project {
            draft.set_kind(kind);
        }
        draft
    }

    /// Draft that re-creates `job` when submitted, keeping its creation
    /// time, session totals and minitasks. Finished jobs have no draft.
    pub fn from_job(job: &Job) -> Option<Self> {
        let (kind, duration, carried) = match job {
            Job::Task(t) => (
                DraftKind::Task,
                t.duration.to_string(),
                Carried {
                    creation: Some(t.creation),
                    totals: t.totals,
                    ..Carried::default()
                },
            ),
            Job::Project(p) => (
                DraftKind::Project,
                String::new(),
                Carried {
                    creation: Some(p.creation),
                    totals: SessionTotals::default(),
                    current_minitasks: p.current_minitasks.clone(),
                    completed_minitasks: p.completed_minitasks,
                },
            ),
            Job::FinishedTask(_) | Job::FinishedProject(_) => return None,
        };
        let deadline = job.deadline();
        Some(Self {
            name: job.name().to_string(),
            kind,
            priority: job.priority().unwrap_or_default().to_string(),
            duration,
            deadline_hours: (deadline / 3600).to_string(),
            deadline_minutes: (deadline / 60 % 60).to_string(),
            validity: false,
            carried,
        })
    }

    pub fn kind(&self) -> DraftKind {
        self.kind
    }

    /// Switch between task and project. A project has no duration of its
    /// own; a task has no minitasks.
    pub fn set_kind(&mut self, kind: DraftKind) {
        if kind == self.kind {
            return;
        }
        self.kind = kind;
        self.validity = false;
        match kind {
            DraftKind::Task => {
                self.duration = DEFAULT_TASK_SWITCH_DURATION.to_string();
                self.carried.current_minitasks.clear();
                self.carried.completed_minitasks = 0;
            }
            DraftKind::Project => self.duration.clear(),
        }
    }

    /// Whether the last `check()` passed.
    pub fn is_valid(&self) -> bool {
        self.validity
    }

    pub fn set_deadline(&mut self, hours: u64, minutes: u64) {
        self.deadline_hours = hours.to_string();
        self.deadline_minutes = minutes.to_string();
    }

    /// Validate every field. Fields that do not parse are blanked so the
    /// caller can highlight them.
    pub fn check(&mut self) -> Result<(), ValidationError> {
        self.parse().map(|_| ())
    }

    fn parse(&mut self) -> Result<Parsed, ValidationError> {
        let mut invalid = Vec::new();

        let priority = self.priority.trim().parse::<i64>().ok();
        if priority.is_none() {
            self.priority.clear();
            invalid.push("priority");
        }

        let duration = match self.kind {
            DraftKind::Task => {
                let parsed = self.duration.trim().parse::<u32>().ok();
                if parsed.is_none() {
                    self.duration.clear();
                    invalid.push("duration");
                }
                parsed
            }
            DraftKind::Project => Some(0),
        };

        let hours = self.deadline_hours.trim().parse::<u64>().ok();
        let minutes = self.deadline_minutes.trim().parse::<u64>().ok();
        let deadline = hours.zip(minutes).and_then(|(h, m)| deadline_secs(h, m));
        if deadline.is_none() {
            self.deadline_hours.clear();
            self.deadline_minutes.clear();
            invalid.push("deadline");
        }

        let name = self.name.trim();
        let name_error = if name.is_empty() {
            Some(ValidationError::EmptyName)
        } else if name == RESERVED_NAME {
            Some(ValidationError::ReservedName {
                name: name.to_string(),
            })
        } else {
            None
        };

        self.validity = false;
        if let Some(err) = name_error {
            return Err(err);
        }
        match (priority, duration, deadline) {
            (Some(priority), Some(duration), Some(deadline)) => {
                self.validity = true;
                Ok(Parsed {
                    priority,
                    duration,
                    deadline,
                })
            }
            _ => Err(ValidationError::InvalidFields { fields: invalid }),
        }
    }

    /// Validate and build the live job. `now` becomes the creation time
    /// unless the draft came from an existing job.
    pub fn into_job(mut self, now: DateTime<Utc>) -> Result<Job, ValidationError> {
        let parsed = self.parse()?;
        let name = self.name.trim().to_string();
        let creation = self.carried.creation.unwrap_or(now);
        let job = match self.kind {
            DraftKind::Task => Job::Task(Task {
                name,
                priority: parsed.priority,
                deadline: parsed.deadline,
                duration: parsed.duration,
                rank: 0,
                value: 0.0,
                creation,
                done: false,
                totals: self.carried.totals,
            }),
            DraftKind::Project => Job::Project(Project {
                name,
                priority: parsed.priority,
                deadline: parsed.deadline,
                rank: 0,
                value: 0.0,
                creation,
                done: false,
                current_minitasks: self.carried.current_minitasks,
                completed_minitasks: self.carried.completed_minitasks,
            }),
        };
        Ok(job)
    }
}

/// Seconds for a deadline typed as hours plus minutes, or `None` when the
/// sum does not fit.
fn deadline_secs(hours: u64, minutes: u64) -> Option<u64> {
    hours
        .checked_mul(3600)
        .and_then(|h| minutes.checked_mul(60).and_then(|m| h.checked_add(m)))
}

/// Draft of a project's minitask.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MiniTaskDraft {
    pub name: String,
    pub duration: String,
    /// Board position to insert at; `None` appends.
    pub rank: Option<usize>,
    #[serde(default)]
    creation: Option<DateTime<Utc>>,
    #[serde(default)]
    totals: SessionTotals,
}

impl MiniTaskDraft {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            duration: DEFAULT_DURATION.to_string(),
            rank: None,
            creation: None,
            totals: SessionTotals::default(),
        }
    }

    pub(crate) fn from_minitask(minitask: &MiniTask) -> Self {
        Self {
            name: minitask.name.clone(),
            duration: minitask.duration.to_string(),
            rank: Some(minitask.rank),
            creation: Some(minitask.creation),
            totals: minitask.totals,
        }
    }

    pub fn check(&mut self) -> Result<u32, ValidationError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::EmptyName);
        }
        match self.duration.trim().parse::<u32>() {
            Ok(duration) => Ok(duration),
            Err(_) => {
                self.duration.clear();
                Err(ValidationError::InvalidFields {
                    fields: vec!["duration"],
                })
            }
        }
    }

    pub fn into_minitask(mut self, now: DateTime<Utc>) -> Result<MiniTask, ValidationError> {
        let duration = self.check()?;
        Ok(MiniTask {
            name: self.name.trim().to_string(),
            duration,
            rank: self.rank.unwrap_or_default(),
            creation: self.creation.unwrap_or(now),
            done: false,
            totals: self.totals,
        })
    }
}

use chrono::Utc;
use clap::Subcommand;
use planner_core::{DraftKind, Job, JobDraft};
use serde_json::json;

use super::{print_json, CliResult, Workspace};

#[derive(Subcommand)]
pub enum JobAction {
    /// Add a task (or a project with --project)
    Add {
        name: String,
        /// Create a project instead of a task
        #[arg(long)]
        project: bool,
        /// Integer priority; higher ranks first
        #[arg(long)]
        priority: Option<String>,
        /// Planned minutes (tasks only)
        #[arg(long)]
        duration: Option<String>,
        /// Deadline hours from now
        #[arg(long)]
        hours: Option<String>,
        /// Deadline minutes from now, added to --hours
        #[arg(long)]
        minutes: Option<String>,
    },
    /// List jobs in rank order
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show one job
    Show { rank: usize },
    /// Change a live job; unspecified fields keep their value
    Edit {
        rank: usize,
        #[arg(long)]
        name: Option<String>,
        /// Turn the job into a project
        #[arg(long, conflicts_with = "task")]
        project: bool,
        /// Turn the job into a task
        #[arg(long)]
        task: bool,
        #[arg(long)]
        priority: Option<String>,
        #[arg(long)]
        duration: Option<String>,
        #[arg(long)]
        hours: Option<String>,
        #[arg(long)]
        minutes: Option<String>,
    },
    /// Delete a job permanently
    Delete { rank: usize },
    /// Mark a task or project finished
    Complete { rank: usize },
}

struct Fields {
    priority: Option<String>,
    duration: Option<String>,
    hours: Option<String>,
    minutes: Option<String>,
}

impl Fields {
    fn apply(self, draft: &mut JobDraft) {
        if let Some(priority) = self.priority {
            draft.priority = priority;
        }
        if let Some(duration) = self.duration {
            draft.duration = duration;
        }
        if let Some(hours) = self.hours {
            draft.deadline_hours = hours;
        }
        if let Some(minutes) = self.minutes {
            draft.deadline_minutes = minutes;
        }
    }
}

fn job_view(job: &Job) -> serde_json::Value {
    let mut view = serde_json::to_value(job).unwrap_or_default();
    if let serde_json::Value::Object(fields) = &mut view {
        fields.insert("value".into(), json!(job.value()));
        if let Some(status) = job.deadline_status(Utc::now()) {
            fields.insert("deadline_status".into(), json!(status));
        }
    }
    view
}

fn submit(ws: &mut Workspace, draft: JobDraft) -> CliResult {
    let rank = ws.store.add_job(draft)?;
    ws.save()?;
    print_json(&job_view(&ws.store.jobs()[rank]))
}

pub fn run(action: JobAction) -> CliResult {
    let mut ws = Workspace::open()?;

    match action {
        JobAction::Add {
            name,
            project,
            priority,
            duration,
            hours,
            minutes,
        } => {
            let kind = if project {
                DraftKind::Project
            } else {
                DraftKind::Task
            };
            let mut draft = JobDraft::new(name, kind);
            Fields {
                priority,
                duration,
                hours,
                minutes,
            }
            .apply(&mut draft);
            submit(&mut ws, draft)?;
        }
        JobAction::List { json } => {
            if json {
                let views: Vec<_> = ws.store.jobs().iter().map(job_view).collect();
                print_json(&views)?;
            } else if ws.store.is_empty() {
                println!("no jobs");
            } else {
                for job in ws.store.jobs() {
                    println!(
                        "{:>3}  {:<17} {:>6.1}  {}",
                        job.rank(),
                        job.kind(),
                        job.value(),
                        job.name()
                    );
                }
            }
        }
        JobAction::Show { rank } => {
            let job = ws.store.get(rank).ok_or_else(|| {
                format!("no job at rank {rank} ({} jobs)", ws.store.len())
            })?;
            print_json(&job_view(job))?;
        }
        JobAction::Edit {
            rank,
            name,
            project,
            task,
            priority,
            duration,
            hours,
            minutes,
        } => {
            let mut draft = ws.store.edit_job(rank)?;
            if let Some(name) = name {
                draft.name = name;
            }
            if project {
                draft.set_kind(DraftKind::Project);
            } else if task {
                draft.set_kind(DraftKind::Task);
            }
            Fields {
                priority,
                duration,
                hours,
                minutes,
            }
            .apply(&mut draft);
            submit(&mut ws, draft)?;
        }
        JobAction::Delete { rank } => {
            let removed = ws.store.delete_job(rank)?;
            ws.save()?;
            print_json(&json!({ "deleted": removed.name() }))?;
        }
        JobAction::Complete { rank } => {
            let finished_at = ws.store.complete_job(rank)?;
            ws.save()?;
            print_json(&job_view(&ws.store.jobs()[finished_at]))?;
        }
    }
    Ok(())
}

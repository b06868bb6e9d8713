//! The ranked job collection.
//!
//! Live jobs come first, ordered by the ranking strategy's score; finished
//! jobs follow in completion order. Every structural change ends with
//! [`JobStore::recompute`], so `rank` always equals the position in
//! [`JobStore::jobs`].

use std::cmp::Reverse;
use std::sync::Arc;

use tracing::{debug, info, warn};

use super::ranking::{PriorityScore, RankingStrategy};
use super::{Job, JobDraft, Project, ProjectBoard, ProjectUpdate, RESERVED_NAME};
use crate::clock::Clock;
use crate::error::{JobError, Result};
use crate::session::{SessionResult, SessionTarget};
use crate::settings::Settings;
use crate::storage::CacheStore;
use crate::timer::{build_plan, IntervalPlan};

const COLLECTION: &str = "jobs";

#[derive(Debug)]
pub struct JobStore {
    jobs: Vec<Job>,
    completed_count: u32,
    settings: Settings,
    strategy: Box<dyn RankingStrategy>,
    clock: Arc<dyn Clock>,
}

impl JobStore {
    pub fn new(settings: Settings, strategy: Box<dyn RankingStrategy>, clock: Arc<dyn Clock>) -> Self {
        Self {
            jobs: Vec::new(),
            completed_count: 0,
            settings,
            strategy,
            clock,
        }
    }

    /// Store with default settings ranked by raw priority.
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self::new(Settings::default(), Box::new(PriorityScore), clock)
    }

    pub fn jobs(&self) -> &[Job] {
        &self.jobs
    }

    pub fn get(&self, rank: usize) -> Option<&Job> {
        self.jobs.get(rank)
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    pub fn live_jobs(&self) -> impl Iterator<Item = &Job> {
        self.jobs.iter().filter(|job| !job.is_finished())
    }

    pub fn finished_jobs(&self) -> impl Iterator<Item = &Job> {
        self.jobs.iter().filter(|job| job.is_finished())
    }

    pub fn completed_count(&self) -> u32 {
        self.completed_count
    }

    pub fn settings(&self) -> Settings {
        self.settings
    }

    pub fn set_settings(&mut self, settings: Settings) {
        self.settings = settings;
    }

    pub fn strategy_name(&self) -> &'static str {
        self.strategy.name()
    }

    pub fn clock(&self) -> Arc<dyn Clock> {
        Arc::clone(&self.clock)
    }

    fn check_rank(&self, rank: usize) -> Result<()> {
        if rank >= self.jobs.len() {
            return Err(JobError::out_of_bounds(COLLECTION, rank, self.jobs.len()).into());
        }
        Ok(())
    }

    /// Submit a draft. Returns the rank the new job landed at.
    pub fn add_job(&mut self, draft: JobDraft) -> Result<usize> {
        let job = draft.into_job(self.clock.now())?;
        if self.jobs.iter().any(|existing| existing.name() == job.name()) {
            warn!(name = %job.name(), "duplicate job name; the saved document keeps only the last one");
        }
        info!(name = %job.name(), kind = %job.kind(), "job added");
        self.jobs.push(job);
        let added = self.jobs.len() - 1;
        Ok(self.recompute_tracking(added))
    }

    /// Take the live job at `rank` out of the store and return it as a
    /// draft. The job is gone until the draft is submitted again.
    pub fn edit_job(&mut self, rank: usize) -> Result<JobDraft> {
        self.check_rank(rank)?;
        let Some(draft) = JobDraft::from_job(&self.jobs[rank]) else {
            return Err(JobError::KindMismatch {
                expected: "task or project",
                found: self.jobs[rank].kind(),
            }
            .into());
        };
        let job = self.jobs.remove(rank);
        info!(name = %job.name(), "job taken out for editing");
        self.recompute();
        Ok(draft)
    }

    pub fn delete_job(&mut self, rank: usize) -> Result<Job> {
        self.check_rank(rank)?;
        let job = self.jobs.remove(rank);
        info!(name = %job.name(), kind = %job.kind(), "job deleted");
        self.recompute();
        Ok(job)
    }

    /// Replace the live task or project at `rank` by its finished record.
    /// Returns the finished job's new rank.
    pub fn complete_job(&mut self, rank: usize) -> Result<usize> {
        self.check_rank(rank)?;
        let completed = self.completed_count + 1;
        let factual_priority = -(1 + i64::from(completed));
        let job = self.jobs.remove(rank);
        match job.into_finished(factual_priority) {
            Ok(finished) => {
                self.completed_count = completed;
                info!(name = %finished.name(), factual_priority, "job completed");
                self.jobs.push(finished);
                let finished_at = self.jobs.len() - 1;
                Ok(self.recompute_tracking(finished_at))
            }
            Err(job) => {
                let found = job.kind();
                self.jobs.insert(rank, job);
                Err(JobError::KindMismatch {
                    expected: "task or project",
                    found,
                }
                .into())
            }
        }
    }

    /// Merge a finished focus session into the task at `rank`. Totals add
    /// up across sessions; a session that ran its whole plan completes the
    /// task. Results for an already finished task are dropped.
    pub fn apply_focus_result(&mut self, rank: usize, result: &SessionResult) -> Result<()> {
        self.check_rank(rank)?;
        match &mut self.jobs[rank] {
            Job::Task(task) => {
                task.totals.absorb(result);
                task.done = result.done;
                info!(
                    name = %task.name,
                    tot_focus = task.totals.tot_focus,
                    done = result.done,
                    "focus result applied"
                );
            }
            Job::FinishedTask(task) => {
                debug!(name = %task.name, "focus result for a finished task ignored");
                return Ok(());
            }
            other => {
                return Err(JobError::KindMismatch {
                    expected: "task",
                    found: other.kind(),
                }
                .into())
            }
        }
        if result.done {
            self.complete_job(rank)?;
        } else {
            self.recompute();
        }
        Ok(())
    }

    /// Merge a project board back into its project. A finished project
    /// whose board is no longer done becomes live again; a live project
    /// whose board is done gets completed.
    pub fn apply_project_update(&mut self, update: ProjectUpdate) -> Result<()> {
        self.check_rank(update.rank)?;
        let rank = update.rank;
        match &mut self.jobs[rank] {
            Job::FinishedProject(_) if update.done => {
                debug!(rank, "update for a finished project ignored");
                return Ok(());
            }
            Job::FinishedProject(finished) => {
                info!(name = %finished.name, "project reopened");
                let reopened = Project {
                    name: std::mem::take(&mut finished.name),
                    priority: finished.priority,
                    deadline: finished.deadline,
                    rank,
                    value: 0.0,
                    creation: finished.creation,
                    done: false,
                    current_minitasks: update.current_minitasks,
                    completed_minitasks: update.completed_minitasks,
                };
                self.jobs[rank] = Job::Project(reopened);
            }
            Job::Project(project) => {
                project.current_minitasks = update.current_minitasks;
                project.completed_minitasks = update.completed_minitasks;
                project.done = update.done;
                if update.done {
                    self.complete_job(rank)?;
                    return Ok(());
                }
            }
            other => {
                return Err(JobError::KindMismatch {
                    expected: "project",
                    found: other.kind(),
                }
                .into())
            }
        }
        self.recompute();
        Ok(())
    }

    /// Score live jobs, sort them (descending, stable), append finished jobs
    /// in completion order and renumber everything.
    pub fn recompute(&mut self) {
        self.sort_jobs();
        self.renumber();
    }

    /// Recompute and report where the job at `index` ended up.
    fn recompute_tracking(&mut self, index: usize) -> usize {
        // No real job holds this rank, so it marks the job across the sort.
        const MARKER: usize = usize::MAX;
        self.jobs[index].set_rank(MARKER);
        self.sort_jobs();
        let position = self
            .jobs
            .iter()
            .position(|job| job.rank() == MARKER)
            .unwrap_or(index);
        self.renumber();
        position
    }

    fn sort_jobs(&mut self) {
        let (mut live, mut finished): (Vec<Job>, Vec<Job>) =
            self.jobs.drain(..).partition(|job| !job.is_finished());

        let scores = {
            let refs: Vec<&Job> = live.iter().collect();
            self.strategy.score(&refs)
        };
        for (job, score) in live.iter_mut().zip(scores) {
            job.set_value(score);
        }
        live.sort_by(|a, b| b.value().total_cmp(&a.value()));
        finished.sort_by_key(|job| Reverse(job.factual_priority()));

        self.jobs = live;
        self.jobs.append(&mut finished);
    }

    fn renumber(&mut self) {
        for (rank, job) in self.jobs.iter_mut().enumerate() {
            job.set_rank(rank);
        }
        debug!(
            strategy = self.strategy.name(),
            jobs = self.jobs.len(),
            "ranking recomputed"
        );
    }

    /// The interval plan and session target for working on the task at
    /// `rank`.
    pub fn plan_for(&self, rank: usize) -> Result<(IntervalPlan, SessionTarget)> {
        self.check_rank(rank)?;
        match &self.jobs[rank] {
            Job::Task(task) => Ok((
                build_plan(task.duration, &self.settings),
                SessionTarget::task(rank),
            )),
            other => Err(JobError::KindMismatch {
                expected: "task",
                found: other.kind(),
            }
            .into()),
        }
    }

    pub fn project_board(&self, rank: usize) -> Result<ProjectBoard> {
        self.check_rank(rank)?;
        ProjectBoard::open(rank, &self.jobs[rank], self.clock())
    }

    /// Replace the store's content with the cached pending document.
    /// Returns `false`, leaving the store untouched, when nothing is cached.
    /// Records `add_job` would refuse are skipped, and the completion count
    /// starts over since finished jobs are never cached.
    pub fn load_pending(&mut self, cache: &CacheStore) -> Result<bool> {
        let Some(document) = cache.load_pending()? else {
            info!("no pending jobs cached");
            return Ok(false);
        };
        self.settings = document.settings;
        let mut records = document.jobs;
        records.sort_by_key(Job::rank);

        self.jobs.clear();
        self.completed_count = 0;
        for mut job in records {
            if job.is_finished() {
                warn!(name = %job.name(), "finished job in pending document skipped");
                continue;
            }
            let name = job.name().trim();
            if name.is_empty() || name == RESERVED_NAME {
                warn!(name = %job.name(), "job with a reserved or empty name skipped");
                continue;
            }
            job.set_value(0.0);
            self.jobs.push(job);
        }
        self.recompute();
        info!(
            jobs = self.jobs.len(),
            focused_time = self.settings.focused_time,
            rest_time = self.settings.rest_time,
            "pending jobs loaded"
        );
        Ok(true)
    }

    /// Write live jobs and settings to the cache. Finished jobs are not
    /// kept across runs.
    pub fn save_pending(&self, cache: &CacheStore) -> Result<()> {
        let live: Vec<&Job> = self.live_jobs().collect();
        cache.save_pending(&live, &self.settings)?;
        info!(jobs = live.len(), "pending jobs saved");
        Ok(())
    }
}

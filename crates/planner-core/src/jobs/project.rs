//! Minitask management inside a single project.
//!
//! A board is a working copy of one project's minitask list. Changes are
//! handed back to the job store as a [`ProjectUpdate`].

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::info;

use super::{Job, MiniJob, MiniTaskDraft};
use crate::clock::Clock;
use crate::error::{JobError, Result};
use crate::session::{SessionResult, SessionTarget};
use crate::settings::Settings;
use crate::timer::{build_plan, IntervalPlan};

const COLLECTION: &str = "project minitasks";

/// Board state to merge back into the owning project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectUpdate {
    pub rank: usize,
    pub current_minitasks: Vec<MiniJob>,
    pub completed_minitasks: u32,
    pub done: bool,
}

#[derive(Debug)]
pub struct ProjectBoard {
    name: String,
    project_rank: usize,
    minitasks: Vec<MiniJob>,
    completed_minitasks: u32,
    done: bool,
    clock: Arc<dyn Clock>,
}

impl ProjectBoard {
    /// Open the board of the project at `rank`, live or finished.
    pub fn open(rank: usize, job: &Job, clock: Arc<dyn Clock>) -> Result<Self> {
        let (name, minitasks, completed) = match job {
            Job::Project(p) => (&p.name, &p.current_minitasks, p.completed_minitasks),
            Job::FinishedProject(p) => (&p.name, &p.current_minitasks, p.completed_minitasks),
            other => {
                return Err(JobError::KindMismatch {
                    expected: "project",
                    found: other.kind(),
                }
                .into())
            }
        };
        let mut board = Self {
            name: name.clone(),
            project_rank: rank,
            minitasks: minitasks.clone(),
            completed_minitasks: completed,
            done: false,
            clock,
        };
        board.refresh();
        Ok(board)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn project_rank(&self) -> usize {
        self.project_rank
    }

    pub fn minitasks(&self) -> &[MiniJob] {
        &self.minitasks
    }

    pub fn completed_minitasks(&self) -> u32 {
        self.completed_minitasks
    }

    pub fn is_done(&self) -> bool {
        self.done
    }

    fn check_rank(&self, rank: usize) -> Result<()> {
        if rank >= self.minitasks.len() {
            return Err(JobError::out_of_bounds(COLLECTION, rank, self.minitasks.len()).into());
        }
        Ok(())
    }

    /// Insert at the draft's rank, pushing later items down. Returns the
    /// position the minitask landed at.
    pub fn add_minitask(&mut self, draft: MiniTaskDraft) -> Result<usize> {
        let rank = draft
            .rank
            .unwrap_or(self.minitasks.len())
            .min(self.minitasks.len());
        let minitask = draft.into_minitask(self.clock.now())?;
        info!(project = %self.name, minitask = %minitask.name, rank, "minitask added");
        self.minitasks.insert(rank, MiniJob::Minitask(minitask));
        self.refresh();
        Ok(rank)
    }

    /// Take a live minitask off the board for re-submission.
    pub fn edit_minitask(&mut self, rank: usize) -> Result<MiniTaskDraft> {
        self.check_rank(rank)?;
        let MiniJob::Minitask(minitask) = &self.minitasks[rank] else {
            return Err(JobError::KindMismatch {
                expected: "minitask",
                found: self.minitasks[rank].kind(),
            }
            .into());
        };
        let draft = MiniTaskDraft::from_minitask(minitask);
        self.minitasks.remove(rank);
        self.refresh();
        Ok(draft)
    }

    pub fn delete_minitask(&mut self, rank: usize) -> Result<MiniJob> {
        self.check_rank(rank)?;
        let removed = self.minitasks.remove(rank);
        info!(project = %self.name, minitask = %removed.name(), "minitask deleted");
        self.refresh();
        Ok(removed)
    }

    /// Replace the minitask at `rank` by its finished record, in place.
    pub fn complete_minitask(&mut self, rank: usize) -> Result<()> {
        self.check_rank(rank)?;
        let slot = &mut self.minitasks[rank];
        let MiniJob::Minitask(minitask) = slot else {
            return Err(JobError::KindMismatch {
                expected: "minitask",
                found: slot.kind(),
            }
            .into());
        };
        let finished = minitask.clone().into_finished();
        info!(project = %self.name, minitask = %finished.name, "minitask completed");
        *slot = MiniJob::FinishedMinitask(finished);
        self.completed_minitasks += 1;
        self.refresh();
        Ok(())
    }

    /// Merge a focus session into the minitask at `rank`.
    pub fn apply_focus_result(&mut self, rank: usize, result: &SessionResult) -> Result<()> {
        self.check_rank(rank)?;
        let slot = &mut self.minitasks[rank];
        let MiniJob::Minitask(minitask) = slot else {
            return Err(JobError::KindMismatch {
                expected: "minitask",
                found: slot.kind(),
            }
            .into());
        };
        minitask.totals.absorb(result);
        minitask.done = result.done;
        if result.done {
            self.complete_minitask(rank)?;
        }
        Ok(())
    }

    pub fn plan_for(&self, rank: usize, settings: &Settings) -> Result<(IntervalPlan, SessionTarget)> {
        self.check_rank(rank)?;
        match &self.minitasks[rank] {
            MiniJob::Minitask(m) => Ok((build_plan(m.duration, settings), SessionTarget::minitask(rank))),
            other => Err(JobError::KindMismatch {
                expected: "minitask",
                found: other.kind(),
            }
            .into()),
        }
    }

    /// Reassign ranks and recompute `done`: a board is done when it has
    /// minitasks and all of them are finished.
    pub fn refresh(&mut self) {
        for (i, minitask) in self.minitasks.iter_mut().enumerate() {
            minitask.set_rank(i);
        }
        self.done = !self.minitasks.is_empty() && self.minitasks.iter().all(MiniJob::is_finished);
    }

    pub fn update(&self) -> ProjectUpdate {
        ProjectUpdate {
            rank: self.project_rank,
            current_minitasks: self.minitasks.clone(),
            completed_minitasks: self.completed_minitasks,
            done: self.done,
        }
    }

    pub fn into_update(self) -> ProjectUpdate {
        ProjectUpdate {
            rank: self.project_rank,
            current_minitasks: self.minitasks,
            completed_minitasks: self.completed_minitasks,
            done: self.done,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::error::CoreError;
    use crate::jobs::{DraftKind, JobDraft, JobKind};
    use crate::session::SessionKind;
    use crate::timer::IntervalKind;

    fn board() -> ProjectBoard {
        let clock = ManualClock::shared();
        let project = JobDraft::new("kitchen", DraftKind::Project)
            .into_job(clock.now())
            .unwrap();
        ProjectBoard::open(0, &project, clock).unwrap()
    }

    fn result(done: bool) -> SessionResult {
        let mut result = SessionResult::new(SessionTarget::minitask(0));
        result.tot_focus = 600;
        result.tot_rest = 60;
        result.done = done;
        result
    }

    #[test]
    fn insert_pushes_later_items_down() {
        let mut board = board();
        board.add_minitask(MiniTaskDraft::new("paint")).unwrap();
        board.add_minitask(MiniTaskDraft::new("sand")).unwrap();
        let mut first = MiniTaskDraft::new("clear");
        first.rank = Some(0);
        assert_eq!(board.add_minitask(first).unwrap(), 0);

        let names: Vec<&str> = board.minitasks().iter().map(MiniJob::name).collect();
        assert_eq!(names, ["clear", "paint", "sand"]);
        let ranks: Vec<usize> = board.minitasks().iter().map(MiniJob::rank).collect();
        assert_eq!(ranks, [0, 1, 2]);
    }

    #[test]
    fn empty_board_is_not_done() {
        let board = board();
        assert!(!board.is_done());
    }

    #[test]
    fn completing_every_minitask_finishes_the_board() {
        let mut board = board();
        board.add_minitask(MiniTaskDraft::new("paint")).unwrap();
        board.add_minitask(MiniTaskDraft::new("sand")).unwrap();
        board.complete_minitask(1).unwrap();
        assert!(!board.is_done());
        assert_eq!(board.minitasks()[1].kind(), JobKind::FinishedMinitask);

        board.complete_minitask(0).unwrap();
        assert!(board.is_done());
        assert_eq!(board.completed_minitasks(), 2);

        let update = board.into_update();
        assert!(update.done);
        assert_eq!(update.rank, 0);
    }

    #[test]
    fn focus_results_accumulate_then_complete() {
        let mut board = board();
        board.add_minitask(MiniTaskDraft::new("paint")).unwrap();
        board.apply_focus_result(0, &result(false)).unwrap();
        board.apply_focus_result(0, &result(true)).unwrap();

        let minitask = &board.minitasks()[0];
        assert!(minitask.is_finished());
        assert_eq!(minitask.totals().tot_focus, 1200);
        assert_eq!(minitask.totals().tot_rest, 120);
    }

    #[test]
    fn finished_minitasks_reject_focus_results() {
        let mut board = board();
        board.add_minitask(MiniTaskDraft::new("paint")).unwrap();
        board.complete_minitask(0).unwrap();
        let err = board.apply_focus_result(0, &result(false)).unwrap_err();
        assert!(matches!(
            err,
            CoreError::Job(JobError::KindMismatch { expected: "minitask", .. })
        ));
    }

    #[test]
    fn stale_rank_is_out_of_bounds() {
        let mut board = board();
        let err = board.delete_minitask(3).unwrap_err();
        assert!(matches!(
            err,
            CoreError::Job(JobError::OutOfBounds { index: 3, len: 0, .. })
        ));
    }

    #[test]
    fn edit_round_trips_position() {
        let mut board = board();
        board.add_minitask(MiniTaskDraft::new("paint")).unwrap();
        board.add_minitask(MiniTaskDraft::new("sand")).unwrap();
        let mut draft = board.edit_minitask(0).unwrap();
        assert_eq!(board.minitasks().len(), 1);
        draft.duration = "45".into();
        assert_eq!(board.add_minitask(draft).unwrap(), 0);
        assert_eq!(board.minitasks()[0].duration(), 45);
    }

    #[test]
    fn plan_targets_the_minitask() {
        let mut board = board();
        board.add_minitask(MiniTaskDraft::new("paint")).unwrap();
        let (plan, target) = board.plan_for(0, &Settings::default()).unwrap();
        assert_eq!(plan.minutes_of(IntervalKind::Focus), 30);
        assert_eq!(target.kind, SessionKind::Minitask);
        assert_eq!(target.rank, Some(0));
    }

    #[test]
    fn tasks_have_no_board() {
        let clock = ManualClock::shared();
        let task = JobDraft::new("solo", DraftKind::Task)
            .into_job(clock.now())
            .unwrap();
        assert!(ProjectBoard::open(0, &task, clock).is_err());
    }
}

//! Integration tests for the planner workflow.
//!
//! These tests drive the public API end to end: ranking jobs, planning and
//! running a session against a manual clock, folding the result back into
//! the store and round-tripping everything through the cache.

use std::sync::Arc;

use planner_core::jobs::ranking::{self, DeadlineWeighted};
use planner_core::storage::RankingConfig;
use planner_core::{
    build_plan, CacheStore, Clock, DraftKind, Event, IntervalKind, Job, JobDraft, JobKind,
    JobStore, ManualClock, MiniTaskDraft, SessionOrchestrator, SessionTarget, Settings,
    StrategyKind, TimerEngine, TimerState,
};

// ============================================================================
// Helpers
// ============================================================================

fn store(clock: &Arc<ManualClock>) -> JobStore {
    JobStore::with_clock(clock.clone())
}

fn task(name: &str, priority: i64, duration: u32) -> JobDraft {
    let mut draft = JobDraft::new(name, DraftKind::Task);
    draft.priority = priority.to_string();
    draft.duration = duration.to_string();
    draft
}

fn plan_shape(plan: &planner_core::IntervalPlan) -> Vec<(IntervalKind, u32)> {
    plan.iter().map(|i| (i.kind, i.minutes)).collect()
}

/// Run a session to its natural end, waiting `idle_secs` after each rest.
fn run_to_end(session: &mut SessionOrchestrator, clock: &ManualClock, idle_secs: i64) {
    session.step();
    session.toggle();
    for _ in 0..100 {
        if session.is_finished() {
            return;
        }
        if session.is_idle() {
            clock.advance_secs(idle_secs);
            session.step();
            continue;
        }
        let remaining = session.snapshot().map(|s| s.remaining_seconds).unwrap_or(0);
        clock.advance_secs(remaining as i64);
        session.tick();
    }
    panic!("session did not finish");
}

// ============================================================================
// Scenarios
// ============================================================================

#[test]
fn scenario_a_plan_for_a_45_minute_task() {
    let clock = ManualClock::shared();
    let mut store = store(&clock);
    store.set_settings(Settings::new(30, 5).unwrap());
    store.add_job(task("report", 5, 45)).unwrap();

    let (plan, target) = store.plan_for(0).unwrap();
    assert_eq!(
        plan_shape(&plan),
        [
            (IntervalKind::Focus, 30),
            (IntervalKind::Rest, 5),
            (IntervalKind::Focus, 15)
        ]
    );
    assert_eq!(target, SessionTarget::task(0));
}

#[test]
fn scenario_b_higher_priority_ranks_first() {
    let clock = ManualClock::shared();
    let mut store = store(&clock);
    store.add_job(task("minor", 1, 30)).unwrap();
    store.add_job(task("major", 9, 30)).unwrap();
    store.recompute();

    let major = store.jobs().iter().find(|j| j.name() == "major").unwrap();
    assert_eq!(major.rank(), 0);
}

#[test]
fn scenario_c_completing_the_only_task() {
    let clock = ManualClock::shared();
    let mut store = store(&clock);
    store.add_job(task("single", 3, 30)).unwrap();
    store.complete_job(0).unwrap();

    assert_eq!(store.live_jobs().count(), 0);
    let finished: Vec<&Job> = store.finished_jobs().collect();
    assert_eq!(finished.len(), 1);
    assert_eq!(finished[0].factual_priority(), Some(-2));
}

#[test]
fn scenario_d_empty_handoff_store() {
    let dir = tempfile::tempdir().unwrap();
    let cache = CacheStore::at(dir.path());
    assert_eq!(cache.load_timer_handoff().unwrap(), None);
    cache.delete_timer_handoff().unwrap();
}

#[test]
fn scenario_e_pause_resume_conserves_time() {
    let clock = ManualClock::shared();
    let mut timer = TimerEngine::new(IntervalKind::Focus, clock.clone());
    timer.start(120);
    clock.advance_secs(50);
    timer.toggle();
    clock.advance_secs(600);
    timer.toggle();
    clock.advance_secs(70);
    assert!(matches!(timer.tick(), Some(Event::TimerCompleted { .. })));
    assert_eq!(timer.state(), TimerState::Finished);
    assert_eq!(timer.elapsed_total_secs(), 120);
}

// ============================================================================
// Workflows
// ============================================================================

#[test]
fn session_result_flows_back_into_the_store() {
    let clock = ManualClock::shared();
    let mut store = store(&clock);
    store.add_job(task("essay", 5, 45)).unwrap();
    store.add_job(task("email", 2, 10)).unwrap();

    let (plan, target) = store.plan_for(0).unwrap();
    let mut session = SessionOrchestrator::new(plan, target, clock.clone());
    run_to_end(&mut session, &clock, 30);

    let result = session.result().clone();
    assert!(result.done);
    assert_eq!(result.tot_focus, 45 * 60);
    assert_eq!(result.tot_rest, 5 * 60);
    assert_eq!(result.tot_idle, 30);

    store
        .apply_focus_result(result.rank.unwrap(), &result)
        .unwrap();
    assert_eq!(store.jobs()[0].name(), "email");
    let essay = &store.jobs()[1];
    assert_eq!(essay.kind(), JobKind::FinishedTask);
    assert_eq!(essay.totals().unwrap().tot_focus, 45 * 60);
}

#[test]
fn abandoned_session_keeps_the_task_live() {
    let clock = ManualClock::shared();
    let mut store = store(&clock);
    store.add_job(task("essay", 5, 60)).unwrap();

    let (plan, target) = store.plan_for(0).unwrap();
    let mut session = SessionOrchestrator::new(plan, target, clock.clone());
    session.step();
    session.toggle();
    clock.advance_secs(17 * 60);
    let result = session.abandon();
    assert!(!result.done);
    assert_eq!(result.tot_focus, 17 * 60);

    store.apply_focus_result(0, &result).unwrap();
    let job = &store.jobs()[0];
    assert_eq!(job.kind(), JobKind::Task);
    assert_eq!(job.totals().unwrap().tot_focus, 17 * 60);
}

#[test]
fn minitask_session_completes_its_project() {
    let clock = ManualClock::shared();
    let mut store = store(&clock);
    store
        .add_job(JobDraft::new("attic", DraftKind::Project))
        .unwrap();

    let mut board = store.project_board(0).unwrap();
    let mut draft = MiniTaskDraft::new("sort boxes");
    draft.duration = "20".into();
    board.add_minitask(draft).unwrap();

    let (plan, target) = board.plan_for(0, &store.settings()).unwrap();
    let mut session = SessionOrchestrator::new(plan, target, clock.clone());
    run_to_end(&mut session, &clock, 0);
    board.apply_focus_result(0, session.result()).unwrap();
    assert!(board.is_done());

    store.apply_project_update(board.into_update()).unwrap();
    assert_eq!(store.jobs()[0].kind(), JobKind::FinishedProject);
}

// ============================================================================
// Properties
// ============================================================================

#[test]
fn recompute_is_deterministic_for_every_strategy() {
    for strategy in [
        StrategyKind::Priority,
        StrategyKind::RelativePriority,
        StrategyKind::DeadlineWeighted,
    ] {
        let clock = ManualClock::shared();
        let config = RankingConfig {
            strategy,
            ..RankingConfig::default()
        };
        let mut store = JobStore::new(
            Settings::default(),
            ranking::from_config(&config),
            clock.clone(),
        );
        for (i, (name, priority)) in [("a", 3), ("b", 7), ("c", 3), ("d", 1), ("e", 7)]
            .into_iter()
            .enumerate()
        {
            let mut draft = task(name, priority, 25);
            draft.set_deadline(0, 10 * (i as u64 % 3 + 1));
            store.add_job(draft).unwrap();
        }
        store.complete_job(4).unwrap();

        store.recompute();
        let first: Vec<String> = store.jobs().iter().map(|j| j.name().to_string()).collect();
        store.recompute();
        let second: Vec<String> = store.jobs().iter().map(|j| j.name().to_string()).collect();
        assert_eq!(first, second, "strategy {strategy}");
        for (rank, job) in store.jobs().iter().enumerate() {
            assert_eq!(job.rank(), rank);
        }
        assert!(store.jobs().last().unwrap().is_finished());
    }
}

#[test]
fn deadline_weighting_breaks_priority_ties() {
    let clock = ManualClock::shared();
    let mut store = JobStore::new(
        Settings::default(),
        Box::new(DeadlineWeighted::default()),
        clock.clone(),
    );
    let mut relaxed = task("relaxed", 4, 30);
    relaxed.set_deadline(48, 0);
    let mut urgent = task("urgent", 4, 30);
    urgent.set_deadline(0, 30);
    store.add_job(relaxed).unwrap();
    store.add_job(urgent).unwrap();
    assert_eq!(store.jobs()[0].name(), "urgent");
}

#[test]
fn plan_focus_minutes_match_the_duration() {
    let settings = Settings::new(25, 5).unwrap();
    for minutes in [0, 1, 24, 25, 26, 50, 51, 240] {
        let plan = build_plan(minutes, &settings);
        assert_eq!(plan.minutes_of(IntervalKind::Focus), minutes);
        assert_ne!(plan.iter().last().map(|i| i.kind), Some(IntervalKind::Rest));
    }
}

// ============================================================================
// Persistence
// ============================================================================

#[test]
fn pending_jobs_round_trip_through_the_cache() {
    let dir = tempfile::tempdir().unwrap();
    let cache = CacheStore::at(dir.path().join("cache"));
    let clock = ManualClock::shared();

    let mut store = store(&clock);
    store.set_settings(Settings::new(45, 10).unwrap());
    store.add_job(task("alpha", 2, 20)).unwrap();
    store.add_job(task("beta", 8, 90)).unwrap();
    store
        .add_job(JobDraft::new("gamma", DraftKind::Project))
        .unwrap();
    store.add_job(task("done already", 1, 5)).unwrap();
    let done_rank = store
        .jobs()
        .iter()
        .position(|j| j.name() == "done already")
        .unwrap();
    store.complete_job(done_rank).unwrap();
    store.save_pending(&cache).unwrap();

    let mut restored = JobStore::with_clock(clock.clone());
    assert!(restored.load_pending(&cache).unwrap());
    assert_eq!(restored.settings(), Settings::new(45, 10).unwrap());

    let summary = |s: &JobStore| -> Vec<(String, JobKind, Option<i64>, Option<u32>)> {
        s.live_jobs()
            .map(|j| (j.name().to_string(), j.kind(), j.priority(), j.duration()))
            .collect()
    };
    assert_eq!(summary(&restored), summary(&store));
    assert_eq!(restored.finished_jobs().count(), 0);
    assert_eq!(restored.jobs()[0].creation(), clock.now());
}

#[test]
fn loading_without_a_document_changes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let cache = CacheStore::at(dir.path());
    let clock = ManualClock::shared();
    let mut store = store(&clock);
    store.add_job(task("keep me", 1, 10)).unwrap();
    assert!(!store.load_pending(&cache).unwrap());
    assert_eq!(store.len(), 1);
}

#[test]
fn handoff_queue_is_single_consumer() {
    let dir = tempfile::tempdir().unwrap();
    let producer = CacheStore::at(dir.path());
    let consumer = CacheStore::at(dir.path());
    producer.save_timer_handoff(25).unwrap();
    assert_eq!(consumer.take_timer_handoff().unwrap(), Some(25));
    assert_eq!(consumer.take_timer_handoff().unwrap(), None);
    assert_eq!(producer.load_timer_handoff().unwrap(), None);
}

use std::sync::mpsc::RecvTimeoutError;
use std::time::Duration;

use clap::Subcommand;
use planner_core::{
    build_repeated_plan, IntervalPlan, SessionKind, SessionOrchestrator, SessionResult,
    SessionTarget, SystemClock,
};
use serde_json::json;
use tracing::info;

use super::{print_json, print_json_line, spawn_input, CliResult, Input, Workspace};

#[derive(Subcommand)]
pub enum SessionAction {
    /// Print the interval plan for a task or minitask
    Plan {
        rank: usize,
        /// Plan a minitask of the project at RANK
        #[arg(long)]
        minitask: Option<usize>,
    },
    /// Run a session and record its result.
    ///
    /// Reads commands from stdin: p (pause/resume), n (continue after a
    /// rest), s (skip the current interval), q (quit).
    Run {
        rank: usize,
        #[arg(long)]
        minitask: Option<usize>,
    },
    /// Run a session not attached to any job
    Free {
        /// Focus minutes per repetition
        #[arg(long, default_value = "25")]
        focus: u32,
        /// Rest minutes between repetitions
        #[arg(long, default_value = "5")]
        rest: u32,
        #[arg(long, default_value = "4")]
        repetitions: u32,
    },
}

fn plan_for(
    ws: &Workspace,
    rank: usize,
    minitask: Option<usize>,
) -> CliResult<(IntervalPlan, SessionTarget)> {
    Ok(match minitask {
        Some(minirank) => ws
            .store
            .project_board(rank)?
            .plan_for(minirank, &ws.store.settings())?,
        None => ws.store.plan_for(rank)?,
    })
}

/// Drive a session until the plan runs out or the user quits. Events are
/// printed as they happen, one JSON object per line.
fn drive(session: &mut SessionOrchestrator, tick: Duration) -> CliResult<SessionResult> {
    let input = spawn_input();
    print_json_line(&session.step())?;

    while !session.is_finished() {
        match input.recv_timeout(tick) {
            Ok(Input::Toggle) => {
                if let Some(event) = session.toggle() {
                    print_json_line(&event)?;
                }
            }
            Ok(Input::Next) if session.is_idle() => print_json_line(&session.step())?,
            Ok(Input::Next) => {}
            Ok(Input::Skip) => print_json_line(&session.skip())?,
            Ok(Input::Quit) | Err(RecvTimeoutError::Disconnected) => {
                session.abandon();
                break;
            }
            Err(RecvTimeoutError::Timeout) => {}
        }
        if let Some(event) = session.tick() {
            print_json_line(&event)?;
        }
    }
    Ok(session.result().clone())
}

pub fn run(action: SessionAction) -> CliResult {
    match action {
        SessionAction::Plan { rank, minitask } => {
            let ws = Workspace::open()?;
            let (plan, target) = plan_for(&ws, rank, minitask)?;
            print_json(&json!({ "target": target, "plan": plan }))
        }
        SessionAction::Run { rank, minitask } => {
            let mut ws = Workspace::open()?;
            let (plan, target) = plan_for(&ws, rank, minitask)?;
            let tick = Duration::from_millis(ws.config.session.tick_ms);
            let mut session = SessionOrchestrator::new(plan, target, SystemClock::shared());
            let result = drive(&mut session, tick)?;

            match (result.kind, minitask) {
                (SessionKind::Minitask, Some(minirank)) => {
                    let mut board = ws.store.project_board(rank)?;
                    board.apply_focus_result(minirank, &result)?;
                    ws.store.apply_project_update(board.into_update())?;
                }
                (SessionKind::Task, _) => ws.store.apply_focus_result(rank, &result)?,
                _ => {}
            }
            ws.save()?;
            info!(done = result.done, "session recorded");
            print_json(&result)
        }
        SessionAction::Free {
            focus,
            rest,
            repetitions,
        } => {
            let ws = Workspace::open()?;
            let plan = build_repeated_plan(focus, rest, repetitions);
            let tick = Duration::from_millis(ws.config.session.tick_ms);
            let mut session =
                SessionOrchestrator::new(plan, SessionTarget::free(), SystemClock::shared());
            let result = drive(&mut session, tick)?;
            print_json(&result)
        }
    }
}

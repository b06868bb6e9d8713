use std::sync::mpsc::RecvTimeoutError;
use std::time::Duration;

use chrono::Local;
use clap::Subcommand;
use planner_core::{
    CacheStore, Config, CoreError, Event, IntervalKind, SystemClock, TimerEngine, TimerState,
};
use serde_json::json;
use tracing::info;

use super::{print_json, print_json_line, spawn_input, CliResult, Input};

#[derive(Subcommand)]
pub enum TimerAction {
    /// Queue a countdown for `timer run`
    Queue {
        /// Countdown length in minutes
        minutes: u32,
    },
    /// Print the queued countdown without consuming it
    Peek,
    /// Drop the queued countdown, if any
    Clear,
    /// Run the queued countdown. Fails if nothing is queued.
    ///
    /// Reads commands from stdin: p (pause/resume), q (quit).
    Run,
    /// Print the wall clock until q or end of input
    Clock,
}

/// Print a timer event, remembering whether it was the completion.
fn report(event: Option<Event>, completed: &mut bool) -> CliResult {
    if let Some(event) = event {
        *completed = matches!(event, Event::TimerCompleted { .. });
        print_json_line(&event)?;
    }
    Ok(())
}

fn run_countdown(minutes: u32, tick: Duration) -> CliResult {
    let mut timer = TimerEngine::new(IntervalKind::Focus, SystemClock::shared());
    let input = spawn_input();
    let mut completed = false;
    report(timer.start(u64::from(minutes) * 60), &mut completed)?;

    while timer.state() != TimerState::Finished {
        match input.recv_timeout(tick) {
            Ok(Input::Toggle) => report(timer.toggle(), &mut completed)?,
            Ok(Input::Quit) | Err(RecvTimeoutError::Disconnected) => {
                report(timer.cancel(), &mut completed)?
            }
            Ok(Input::Next | Input::Skip) | Err(RecvTimeoutError::Timeout) => {}
        }
        report(timer.tick(), &mut completed)?;
    }

    info!(minutes, completed, "standalone timer stopped");
    print_json(&json!({
        "duration_minutes": minutes,
        "elapsed_secs": timer.elapsed_total_secs(),
        "completed": completed,
    }))
}

pub fn run(action: TimerAction) -> CliResult {
    let cache = CacheStore::open_default()?;

    match action {
        TimerAction::Queue { minutes } => {
            cache.save_timer_handoff(minutes)?;
            print_json(&json!({ "queued": minutes }))?;
        }
        TimerAction::Peek => {
            let queued = cache.load_timer_handoff()?;
            print_json(&json!({ "queued": queued }))?;
        }
        TimerAction::Clear => {
            cache.delete_timer_handoff()?;
            print_json(&json!({ "queued": null }))?;
        }
        TimerAction::Run => {
            let Some(minutes) = cache.take_timer_handoff()? else {
                return Err(CoreError::HandoffMissing {
                    path: cache.handoff_path(),
                }
                .into());
            };
            let config = Config::load()?;
            run_countdown(minutes, Duration::from_millis(config.session.tick_ms))?;
        }
        TimerAction::Clock => {
            let config = Config::load()?;
            let tick = Duration::from_millis(config.session.clock_tick_ms);
            let input = spawn_input();
            loop {
                println!("{}", Local::now().format("%H:%M:%S"));
                match input.recv_timeout(tick) {
                    Ok(Input::Quit) | Err(RecvTimeoutError::Disconnected) => break,
                    Ok(_) | Err(RecvTimeoutError::Timeout) => {}
                }
            }
        }
    }
    Ok(())
}

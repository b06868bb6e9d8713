pub mod config;
pub mod job;
pub mod project;
pub mod session;
pub mod settings;
pub mod timer;

use std::io::BufRead;
use std::sync::mpsc;
use std::thread;

use planner_core::jobs::ranking;
use planner_core::{CacheStore, Config, JobStore, Settings, SystemClock};
use serde::Serialize;

pub type CliResult<T = ()> = Result<T, Box<dyn std::error::Error>>;

/// The job store as loaded from the cache, plus what is needed to put it
/// back. Mutating commands call `save` only after the operation succeeded,
/// so a failed command leaves the cached document untouched.
pub struct Workspace {
    pub store: JobStore,
    pub cache: CacheStore,
    pub config: Config,
}

impl Workspace {
    pub fn open() -> CliResult<Self> {
        let config = Config::load()?;
        let cache = CacheStore::open_default()?;
        let mut store = JobStore::new(
            Settings::default(),
            ranking::from_config(&config.ranking),
            SystemClock::shared(),
        );
        store.load_pending(&cache)?;
        Ok(Self {
            store,
            cache,
            config,
        })
    }

    pub fn save(&self) -> CliResult {
        self.store.save_pending(&self.cache)?;
        Ok(())
    }
}

pub fn print_json<T: Serialize + ?Sized>(value: &T) -> CliResult {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// One JSON object per line, for event streams.
pub fn print_json_line<T: Serialize + ?Sized>(value: &T) -> CliResult {
    println!("{}", serde_json::to_string(value)?);
    Ok(())
}

/// Keys accepted while a timer is running.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Input {
    /// `p`: pause or resume
    Toggle,
    /// `n`: leave idle and continue
    Next,
    /// `s`: end the current interval now
    Skip,
    /// `q`, or end of input
    Quit,
}

/// Read commands from stdin on a background thread. The receiver sees
/// `Quit` once stdin closes.
pub fn spawn_input() -> mpsc::Receiver<Input> {
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else { break };
            let input = match line.trim() {
                "p" => Input::Toggle,
                "n" => Input::Next,
                "s" => Input::Skip,
                "q" => Input::Quit,
                "" => continue,
                other => {
                    tracing::warn!(input = other, "unknown command; use p, n, s or q");
                    continue;
                }
            };
            if tx.send(input).is_err() {
                return;
            }
        }
        let _ = tx.send(Input::Quit);
    });
    rx
}

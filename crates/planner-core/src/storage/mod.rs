mod cache;
mod config;

pub use cache::{CacheStore, PendingDocument, HANDOFF_FILE, PENDING_FILE};
pub use config::{Config, RankingConfig, SessionConfig};

use std::path::PathBuf;

use crate::error::Result;

/// Returns `~/.config/planner[-dev]/` based on PLANNER_ENV.
///
/// Set PLANNER_ENV=dev to use the development data directory. PLANNER_HOME,
/// when set, replaces the whole location.
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> Result<PathBuf> {
    let dir = match std::env::var_os("PLANNER_HOME") {
        Some(home) => PathBuf::from(home),
        None => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");
            let env = std::env::var("PLANNER_ENV").unwrap_or_else(|_| "production".to_string());
            if env == "dev" {
                base_dir.join("planner-dev")
            } else {
                base_dir.join("planner")
            }
        }
    };

    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}

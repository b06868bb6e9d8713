use clap::Subcommand;
use planner_core::Settings;

use super::{print_json, CliResult, Workspace};

#[derive(Subcommand)]
pub enum SettingsAction {
    /// Print focus and rest lengths
    Show,
    /// Change focus and/or rest length (minutes)
    Set {
        #[arg(long)]
        focus: Option<String>,
        #[arg(long)]
        rest: Option<String>,
    },
}

pub fn run(action: SettingsAction) -> CliResult {
    let mut ws = Workspace::open()?;

    match action {
        SettingsAction::Show => print_json(&ws.store.settings()),
        SettingsAction::Set { focus, rest } => {
            let current = ws.store.settings();
            let focus = focus.unwrap_or_else(|| current.focused_time.to_string());
            let rest = rest.unwrap_or_else(|| current.rest_time.to_string());
            let settings = Settings::parse(&focus, &rest)?;
            ws.store.set_settings(settings);
            ws.save()?;
            print_json(&settings)
        }
    }
}

use clap::Subcommand;
use planner_core::{MiniTaskDraft, ProjectBoard};
use serde_json::json;

use super::{print_json, CliResult, Workspace};

#[derive(Subcommand)]
pub enum ProjectAction {
    /// Show a project's minitasks
    Show { rank: usize },
    /// Add a minitask to the project at RANK
    Add {
        rank: usize,
        name: String,
        /// Planned minutes
        #[arg(long)]
        duration: Option<String>,
        /// Board position; defaults to the end
        #[arg(long)]
        at: Option<usize>,
    },
    /// Change a minitask; unspecified fields keep their value
    Edit {
        rank: usize,
        minitask: usize,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        duration: Option<String>,
        #[arg(long)]
        at: Option<usize>,
    },
    /// Delete a minitask
    Delete { rank: usize, minitask: usize },
    /// Mark a minitask finished
    Complete { rank: usize, minitask: usize },
}

fn board_view(board: &ProjectBoard) -> serde_json::Value {
    json!({
        "project": board.name(),
        "rank": board.project_rank(),
        "done": board.is_done(),
        "completed_minitasks": board.completed_minitasks(),
        "minitasks": board.minitasks(),
    })
}

pub fn run(action: ProjectAction) -> CliResult {
    let mut ws = Workspace::open()?;

    let rank = match &action {
        ProjectAction::Show { rank }
        | ProjectAction::Add { rank, .. }
        | ProjectAction::Edit { rank, .. }
        | ProjectAction::Delete { rank, .. }
        | ProjectAction::Complete { rank, .. } => *rank,
    };
    let mut board = ws.store.project_board(rank)?;

    match action {
        ProjectAction::Show { .. } => return print_json(&board_view(&board)),
        ProjectAction::Add {
            name, duration, at, ..
        } => {
            let mut draft = MiniTaskDraft::new(name);
            if let Some(duration) = duration {
                draft.duration = duration;
            }
            draft.rank = at;
            board.add_minitask(draft)?;
        }
        ProjectAction::Edit {
            minitask,
            name,
            duration,
            at,
            ..
        } => {
            let mut draft = board.edit_minitask(minitask)?;
            if let Some(name) = name {
                draft.name = name;
            }
            if let Some(duration) = duration {
                draft.duration = duration;
            }
            if at.is_some() {
                draft.rank = at;
            }
            board.add_minitask(draft)?;
        }
        ProjectAction::Delete { minitask, .. } => {
            board.delete_minitask(minitask)?;
        }
        ProjectAction::Complete { minitask, .. } => {
            board.complete_minitask(minitask)?;
        }
    }

    let view = board_view(&board);
    ws.store.apply_project_update(board.into_update())?;
    ws.save()?;
    print_json(&view)
}

use clap::{CommandFactory, Parser, Subcommand};
use planner_core::CoreError;
use tracing_subscriber::EnvFilter;

mod commands;

/// Exit status of a timer process that found nothing queued.
const ABORT_EXIT_CODE: i32 = 134;

#[derive(Parser)]
#[command(name = "planner", version, about = "Job ranking and focus sessions")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Task and project management
    Job {
        #[command(subcommand)]
        action: commands::job::JobAction,
    },
    /// Minitasks of a project
    Project {
        #[command(subcommand)]
        action: commands::project::ProjectAction,
    },
    /// Focus/rest sessions
    Session {
        #[command(subcommand)]
        action: commands::session::SessionAction,
    },
    /// Standalone timer process and clock
    Timer {
        #[command(subcommand)]
        action: commands::timer::TimerAction,
    },
    /// Focus and rest lengths
    Settings {
        #[command(subcommand)]
        action: commands::settings::SettingsAction,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
    /// Print shell completions
    Completions {
        shell: clap_complete::Shell,
    },
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() {
    init_tracing();
    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Job { action } => commands::job::run(action),
        Commands::Project { action } => commands::project::run(action),
        Commands::Session { action } => commands::session::run(action),
        Commands::Timer { action } => commands::timer::run(action),
        Commands::Settings { action } => commands::settings::run(action),
        Commands::Config { action } => commands::config::run(action),
        Commands::Completions { shell } => {
            clap_complete::generate(shell, &mut Cli::command(), "planner", &mut std::io::stdout());
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        let code = match e.downcast_ref::<CoreError>() {
            Some(CoreError::HandoffMissing { .. }) => ABORT_EXIT_CODE,
            _ => 1,
        };
        std::process::exit(code);
    }
}

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use vigil::commands::{check, init, status, watch};

#[derive(Parser)]
#[command(name = "vigil")]
#[command(about = "Workflow supervision CLI for agent sessions", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize .vigil/ directory
    Init,

    /// One-shot analysis of the event log
    Check {
        /// Event log to analyze (overrides config)
        #[arg(long)]
        log: Option<PathBuf>,
    },

    /// Show the last persisted workflow state
    Status,

    /// Supervise the event log until Ctrl-C
    Watch {
        /// Event log to watch (overrides config)
        #[arg(long)]
        log: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Init => init::execute(),
        Commands::Check { log } => check::execute(log),
        Commands::Status => status::execute(),
        Commands::Watch { log } => watch::execute(log),
    }
}

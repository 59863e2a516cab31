//! tplwatch: announce new nuclei templates to Telegram.
//!
//! # Usage
//!
//! ```text
//! tplwatch run [--config <path>] [--force-notify] [--dry-run] [--json]
//! tplwatch status [--config <path>] [--json]
//! ```
//!
//! Meant to be triggered externally (cron, systemd timer); each `run` is a
//! single pass over every configured repository.

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};

use commands::{run::RunArgs, status::StatusArgs};

// ---------------------------------------------------------------------------
// CLI entry point
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(
    name = "tplwatch",
    version,
    about = "Watch template repositories and announce new templates on Telegram",
    long_about = None,
)]
struct Cli {
    /// Emit logs as JSON lines on stderr.
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Check every repository once and notify about new templates.
    Run(RunArgs),

    /// Show recorded baselines and checkouts without touching anything.
    Status(StatusArgs),
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() -> Result<()> {
    let cli = Cli::parse();
    tplwatch_runner::init_tracing(cli.log_json);
    match cli.command {
        Commands::Run(args) => args.run(),
        Commands::Status(args) => args.run(),
    }
}

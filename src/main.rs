//! Golden transcript replay CLI
//!
//! Starts a server, replays a corpus of client invocations against it, and
//! fails on the first output that differs from the recorded transcript.

use std::path::PathBuf;

use clap::Parser;
use replay::commands::Commands;
use replay::common::{config::Config, logging};
use replay::{cli, Result};

#[derive(Parser)]
#[command(name = "replay", about = "Golden transcript replay harness")]
#[command(version, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file (default: platform config dir)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Also write logs, including server output, to this file
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let guard = match logging::init(cli.verbose, cli.log_file.as_deref()) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    };

    let code = match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e}");
            1
        }
    };

    // Flush buffered file logs before exiting
    drop(guard);
    std::process::exit(code);
}

async fn run(cli: Cli) -> Result<i32> {
    let config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    cli::dispatch(cli.command, config).await
}

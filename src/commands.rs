//! CLI command definitions
//!
//! Defines the clap commands for the replay CLI.

use clap::{Args, Subcommand};
use std::path::PathBuf;

#[derive(Subcommand)]
pub enum Commands {
    /// Start the server and replay a corpus against it
    Run {
        #[command(flatten)]
        corpus: CorpusArgs,

        /// Command line that starts the server (overrides config)
        #[arg(long)]
        server: Option<String>,

        /// Delay after starting the server before the first case, in milliseconds
        #[arg(long)]
        warmup_ms: Option<u64>,

        /// Disable the progress bar
        #[arg(long)]
        no_progress: bool,

        /// Disable colored output
        #[arg(long)]
        no_color: bool,

        /// Print a JSON run summary instead of per-case lines
        #[arg(long)]
        json: bool,
    },

    /// Parse a corpus and print its cases without running anything
    #[command(alias = "ls")]
    List {
        #[command(flatten)]
        corpus: CorpusArgs,

        /// Output cases as JSON
        #[arg(long)]
        json: bool,
    },
}

/// Corpus selection shared by all commands
#[derive(Args, Debug, Default)]
pub struct CorpusArgs {
    /// Corpus file to replay (default: the embedded sorted-set scenario)
    #[arg(long)]
    pub corpus: Option<PathBuf>,

    /// Marker that starts a command line in the corpus
    #[arg(long)]
    pub prompt: Option<String>,
}

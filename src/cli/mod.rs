//! CLI command handling
//!
//! Resolves configuration against command-line overrides and dispatches
//! to the harness.

use colored::Colorize;

use crate::commands::{Commands, CorpusArgs};
use crate::common::config::{Config, CorpusConfig};
use crate::common::Result;
use crate::corpus::Corpus;
use crate::harness::{self, CommandRunner, ConsoleReporter, JsonReporter, Reporter};

/// Dispatch a CLI command
///
/// Returns the process exit code; a failed run is not an `Err` because it
/// has already been reported.
pub async fn dispatch(command: Commands, mut config: Config) -> Result<i32> {
    match command {
        Commands::Run {
            corpus,
            server,
            warmup_ms,
            no_progress,
            no_color,
            json,
        } => {
            apply_corpus_args(&mut config.corpus, corpus);
            if let Some(server) = server {
                config.server.command = server;
            }
            if let Some(warmup_ms) = warmup_ms {
                config.server.warmup_ms = warmup_ms;
            }
            if no_progress {
                config.output.progress = false;
            }
            if no_color {
                config.output.color = false;
            }
            if !config.output.color {
                colored::control::set_override(false);
            }

            let corpus = load_corpus(&config.corpus)?;
            tracing::debug!(
                cases = corpus.len(),
                server = %config.server.command,
                "Corpus loaded"
            );

            let runner = CommandRunner::from_config(&config.client);
            let mut reporter: Box<dyn Reporter> = if json {
                Box::new(JsonReporter)
            } else {
                Box::new(ConsoleReporter::new(config.output.progress))
            };

            let summary =
                harness::replay(&corpus, &config.server, &runner, reporter.as_mut()).await?;
            Ok(summary.exit_code())
        }

        Commands::List { corpus, json } => {
            apply_corpus_args(&mut config.corpus, corpus);
            let corpus = load_corpus(&config.corpus)?;

            if json {
                println!("{}", serde_json::to_string_pretty(&corpus)?);
                return Ok(0);
            }

            for (i, case) in corpus.iter().enumerate() {
                println!("{:>3}. {}", i + 1, case.command.bold());
                if case.expected_output.is_empty() {
                    println!("     {}", "(no output)".dimmed());
                }
                for line in case.expected_output.lines() {
                    println!("     {}", line);
                }
            }
            println!("\n{} cases", corpus.len());
            Ok(0)
        }
    }
}

fn apply_corpus_args(config: &mut CorpusConfig, args: CorpusArgs) {
    if let Some(path) = args.corpus {
        config.path = Some(path);
    }
    if let Some(prompt) = args.prompt {
        config.prompt = prompt;
    }
}

/// Load the configured corpus file, or the embedded one
fn load_corpus(config: &CorpusConfig) -> Result<Corpus> {
    match &config.path {
        Some(path) => Corpus::load(path, &config.prompt),
        None => Corpus::parse_with_prompt(crate::corpus::EMBEDDED, &config.prompt),
    }
}

//! CLI argument parsing and command dispatch

use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use log::LevelFilter;

use crate::commands;

/// bulk-pr - Apply file edits across repositories and open pull requests
#[derive(Parser, Debug)]
#[command(name = "bulk-pr")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,

    /// Colorize output (always, never, auto)
    #[arg(long, global = true, value_name = "WHEN", default_value = "auto")]
    color: String,

    /// Set log level (error, warn, info, debug, trace)
    #[arg(long, global = true, value_name = "LEVEL", default_value = "info")]
    log_level: String,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Apply the rules to every configured repository and open pull requests
    Run(commands::run::RunArgs),

    /// Apply the rules to a local checkout
    Apply(commands::apply::ApplyArgs),

    /// Validate a bulk-pr.yaml configuration file
    Validate(commands::validate::ValidateArgs),

    /// Generate shell completion scripts
    Completions(commands::completions::CompletionsArgs),
}

/// Set up `env_logger` at `level`. `RUST_LOG` takes precedence when set.
fn init_logging(level: &str) -> Result<()> {
    let filter: LevelFilter = level
        .parse()
        .map_err(|_| anyhow!("Invalid log level '{}'", level))?;
    env_logger::Builder::new()
        .filter_level(filter)
        .format_timestamp(None)
        .format_target(false)
        .parse_env(env_logger::Env::default())
        .try_init()
        .ok();
    Ok(())
}

impl Cli {
    /// Execute the CLI command
    pub fn execute(self) -> Result<()> {
        let verbose = match &self.command {
            Commands::Run(args) => args.verbose,
            Commands::Apply(args) => args.verbose,
            _ => false,
        };
        init_logging(if verbose { "debug" } else { &self.log_level })?;

        match self.command {
            Commands::Run(args) => commands::run::execute(args, &self.color),
            Commands::Apply(args) => commands::apply::execute(args, &self.color),
            Commands::Validate(args) => commands::validate::execute(args, &self.color),
            Commands::Completions(args) => commands::completions::execute(args),
        }
    }
}

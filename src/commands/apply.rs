//! # Apply Command Implementation
//!
//! Applies the configured rules to a repository that is already checked
//! out locally. Nothing is committed or pushed; with `--dry-run` the files
//! are not written either and the command only reports what would change.

use anyhow::{bail, Result};
use clap::Args;
use std::path::PathBuf;

use bulk_pr::applier;
use bulk_pr::config::{self, DEFAULT_CONFIG_FILE};
use bulk_pr::filesystem::DiskTree;
use bulk_pr::orchestrator;
use bulk_pr::output::{emoji, OutputConfig};

/// Apply the rules to a local checkout
#[derive(Args, Debug)]
pub struct ApplyArgs {
    /// Path to config file
    #[arg(short, long, value_name = "PATH", env = "BULK_PR_CONFIG")]
    pub config: Option<PathBuf>,

    /// Repository root to apply the rules to
    #[arg(value_name = "DIR", default_value = ".")]
    pub path: PathBuf,

    /// Show what would change without writing any files
    #[arg(short = 'n', long)]
    pub dry_run: bool,

    /// Show detailed progress information
    #[arg(short, long)]
    pub verbose: bool,
}

/// Execute the apply command
pub fn execute(args: ApplyArgs, color_flag: &str) -> Result<()> {
    let out = OutputConfig::from_env_and_flag(color_flag);

    let config_path = args
        .config
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));
    if !config_path.exists() {
        bail!("Configuration file not found: {}", config_path.display());
    }
    if !args.path.is_dir() {
        bail!("Not a directory: {}", args.path.display());
    }

    let config = config::from_file(&config_path)?;
    let mut tree = DiskTree::new(&args.path);
    let result = applier::apply_all(&config.rules, &tree);
    orchestrator::log_apply_result(&result);

    if args.dry_run {
        println!(
            "{} DRY RUN MODE - No files will be written",
            emoji(&out, "🔎", "[DRY]")
        );
    }

    for file in &result.file_results {
        let marker = if file.changed {
            emoji(&out, "✏️", "[MOD]")
        } else {
            emoji(&out, "➖", "[---]")
        };
        println!("{} {}", marker, file.path);
        for outcome in &file.outcomes {
            match &outcome.message {
                Some(message) => println!("   {}: {} ({})", outcome.action, outcome.reason, message),
                None => println!("   {}: {}", outcome.action, outcome.reason),
            }
        }
    }
    for failure in &result.failures {
        println!(
            "{} {}: {}",
            emoji(&out, "❌", "[ERR]"),
            failure.path,
            failure.error
        );
    }

    if result.has_changes && !args.dry_run {
        result.persist(&mut tree)?;
    }

    let verb = if args.dry_run { "would be modified" } else { "modified" };
    println!(
        "\n{} {} file(s) {}",
        emoji(&out, "✅", "[OK]"),
        result.modified_files.len(),
        verb
    );

    if !result.failures.is_empty() {
        bail!("{} file(s) could not be processed", result.failures.len());
    }
    Ok(())
}

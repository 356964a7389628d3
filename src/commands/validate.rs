//! # Validate Command Implementation
//!
//! Loads a `bulk-pr.yaml` without touching any repository. Loading already
//! compiles every pattern, parses every key path and checks the rules for
//! conflicts, so a configuration that validates will not fail at load time
//! during `run`.

use anyhow::Result;
use clap::Args;
use std::path::PathBuf;

use bulk_pr::config::{self, DEFAULT_CONFIG_FILE};
use bulk_pr::output::{emoji, OutputConfig};
use bulk_pr::repos;

/// Validate a bulk-pr.yaml configuration file
#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Path to the configuration file to validate.
    #[arg(short, long, value_name = "FILE", env = "BULK_PR_CONFIG", default_value = DEFAULT_CONFIG_FILE)]
    pub config: PathBuf,
}

/// Execute the `validate` command.
pub fn execute(args: ValidateArgs, color_flag: &str) -> Result<()> {
    let out = OutputConfig::from_env_and_flag(color_flag);
    let config_path = &args.config;
    println!(
        "{} Validating configuration: {}",
        emoji(&out, "🔍", "[SCAN]"),
        config_path.display()
    );

    let config = match config::from_file(config_path) {
        Ok(config) => {
            println!(
                "{} Configuration file parsed successfully",
                emoji(&out, "✅", "[OK]")
            );
            config
        }
        Err(e) => {
            println!(
                "{} Configuration parsing failed: {}",
                emoji(&out, "❌", "[ERR]"),
                e
            );
            return Err(anyhow::anyhow!("Configuration parsing failed: {}", e));
        }
    };

    let repos = match repos::resolve(&config.repos, config.repos_file.as_deref()) {
        Ok(repos) => repos,
        Err(e) => {
            println!("{} {}", emoji(&out, "❌", "[ERR]"), e);
            return Err(anyhow::anyhow!("Configuration validation failed: {}", e));
        }
    };

    println!("\n{} Configuration Summary:", emoji(&out, "📊", "[INFO]"));
    println!("   Repositories: {}", repos.len());
    println!("   Branch: {}", config.pr.branch);
    if let Some(base) = &config.pr.base_branch {
        println!("   Base branch: {}", base);
    }
    println!("   Rules: {}", config.rules.len());
    for rule in &config.rules {
        println!(
            "     {} ({}): {} change(s)",
            rule.target_file,
            rule.document_type,
            rule.edits.len()
        );
    }

    let mut has_warnings = false;
    if repos.is_empty() {
        println!(
            "{} No repositories configured",
            emoji(&out, "⚠️", "[WARN]")
        );
        has_warnings = true;
    }
    if config.rules.is_empty() {
        println!("{} No rules configured", emoji(&out, "⚠️", "[WARN]"));
        has_warnings = true;
    }

    println!("\n{} Validation Result:", emoji(&out, "🎯", "[RESULT]"));
    if has_warnings {
        println!(
            "{} Configuration is valid but has warnings",
            emoji(&out, "⚠️", "[WARN]")
        );
    } else {
        println!("{} Configuration is valid", emoji(&out, "✅", "[OK]"));
    }
    Ok(())
}

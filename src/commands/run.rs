//! # Run Command Implementation
//!
//! The `run` command drives the whole pipeline for every configured
//! repository: clone, branch, apply the rules, commit, push and open (or
//! reuse) a pull request. See `bulk_pr::orchestrator` for the steps.
//!
//! Settings from the configuration file can be overridden on the command
//! line. The command fails when any repository failed, after every
//! repository has been attempted.

use anyhow::{anyhow, bail, Result};
use clap::Args;
use std::path::PathBuf;
use std::time::Instant;

use bulk_pr::config::{self, Config, DEFAULT_CONFIG_FILE};
use bulk_pr::hosting::GitHubHost;
use bulk_pr::orchestrator::{self, CloneRoot, RunOptions};
use bulk_pr::output::{emoji, format_summary, OutputConfig};
use bulk_pr::repos;

/// Apply the rules to every repository and open pull requests
#[derive(Args, Debug)]
pub struct RunArgs {
    /// Path to config file
    #[arg(short, long, value_name = "PATH", env = "BULK_PR_CONFIG")]
    pub config: Option<PathBuf>,

    /// File listing repositories, one per line
    #[arg(long, value_name = "PATH")]
    pub repos_file: Option<PathBuf>,

    /// Directory to clone repositories into (defaults to a temporary directory)
    #[arg(long, value_name = "PATH")]
    pub clone_dir: Option<PathBuf>,

    /// Keep cloned repositories after the run
    #[arg(long, conflicts_with = "no_debug")]
    pub debug: bool,

    /// Remove cloned repositories after the run even if the config enables debug
    #[arg(long)]
    pub no_debug: bool,

    /// Remove the clone directory after the run
    #[arg(long)]
    pub cleanup: bool,

    /// Commit message
    #[arg(long, value_name = "MESSAGE")]
    pub commit_message: Option<String>,

    /// Pull request title
    #[arg(long, value_name = "TITLE")]
    pub pr_title: Option<String>,

    /// Pull request body
    #[arg(long, value_name = "BODY")]
    pub pr_body: Option<String>,

    /// Branch to commit to
    #[arg(long, value_name = "NAME")]
    pub branch: Option<String>,

    /// Branch to open pull requests against (defaults to the repository's default branch)
    #[arg(long, value_name = "NAME")]
    pub base_branch: Option<String>,

    /// Compute changes without committing, pushing or opening pull requests
    #[arg(short = 'n', long)]
    pub dry_run: bool,

    /// Show detailed progress information
    #[arg(short, long)]
    pub verbose: bool,
}

/// Command-line settings take precedence over the configuration file.
fn apply_overrides(config: &mut Config, args: &RunArgs) {
    if let Some(path) = &args.repos_file {
        config.repos_file = Some(path.clone());
    }
    if let Some(dir) = &args.clone_dir {
        config.clone_dir = Some(dir.clone());
    }
    if args.debug {
        config.debug = true;
    } else if args.no_debug {
        config.debug = false;
    }
    if let Some(message) = &args.commit_message {
        config.pr.commit_message = message.clone();
    }
    if let Some(title) = &args.pr_title {
        config.pr.title = title.clone();
    }
    if let Some(body) = &args.pr_body {
        config.pr.body = body.clone();
    }
    if let Some(branch) = &args.branch {
        config.pr.branch = branch.clone();
    }
    if let Some(base) = &args.base_branch {
        config.pr.base_branch = Some(base.clone()).filter(|b| !b.is_empty());
    }
}

/// Execute the run command
pub fn execute(args: RunArgs, color_flag: &str) -> Result<()> {
    let out = OutputConfig::from_env_and_flag(color_flag);
    let start_time = Instant::now();

    let config_path = args
        .config
        .clone()
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));
    if !config_path.exists() {
        bail!("Configuration file not found: {}", config_path.display());
    }

    let mut config = config::from_file(&config_path).map_err(|e| {
        if e.is_configuration_error() {
            anyhow!("Invalid configuration, no repository was touched: {}", e)
        } else {
            anyhow!(e)
        }
    })?;
    apply_overrides(&mut config, &args);
    let repos = repos::resolve(&config.repos, config.repos_file.as_deref())?;

    println!("{} bulk-pr", emoji(&out, "🚀", "=="));
    if args.dry_run {
        println!(
            "{} DRY RUN MODE - No changes will be pushed",
            emoji(&out, "🔎", "[DRY]")
        );
    }
    println!(
        "   {} repositories, {} rules, branch {}",
        repos.len(),
        config.rules.len(),
        config.pr.branch
    );
    println!();

    if !orchestrator::check_runnable(&repos, &config) {
        return Ok(());
    }

    let clone_root = CloneRoot::new(config.clone_dir.clone())?;
    let options = RunOptions {
        clone_root: clone_root.path().to_path_buf(),
        dry_run: args.dry_run,
    };

    let summary = orchestrator::run(&mut GitHubHost, &repos, &config, &options);

    println!();
    print!("{}", format_summary(&out, &summary));
    println!(
        "{} Completed in {:.2}s",
        emoji(&out, "⏱️", "[TIME]"),
        start_time.elapsed().as_secs_f64()
    );

    clone_root.finish(config.debug, args.cleanup)?;

    if summary.has_failures() {
        bail!(
            "{} of {} repositories failed",
            summary.failed(),
            summary.reports.len()
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct TestCli {
        #[command(flatten)]
        args: RunArgs,
    }

    fn args(argv: &[&str]) -> RunArgs {
        let mut full = vec!["run"];
        full.extend_from_slice(argv);
        TestCli::parse_from(full).args
    }

    const CONFIG: &str = r#"
repos: [acme/api]
branch: from-file
base_branch: qa2
debug: true
rules:
  - file: Jenkinsfile
    changes:
      - action: replace
        pattern: a
        replacement: b
"#;

    #[test]
    fn test_overrides_take_precedence() {
        let mut config = config::parse(CONFIG).unwrap();
        apply_overrides(
            &mut config,
            &args(&[
                "--branch",
                "from-cli",
                "--pr-title",
                "Title",
                "--no-debug",
                "--clone-dir",
                "clones",
            ]),
        );
        assert_eq!(config.pr.branch, "from-cli");
        assert_eq!(config.pr.title, "Title");
        assert_eq!(config.pr.base_branch.as_deref(), Some("qa2"));
        assert!(!config.debug);
        assert_eq!(config.clone_dir, Some(PathBuf::from("clones")));
    }

    #[test]
    fn test_no_overrides_keeps_file_settings() {
        let mut config = config::parse(CONFIG).unwrap();
        apply_overrides(&mut config, &args(&[]));
        assert_eq!(config.pr.branch, "from-file");
        assert!(config.debug);
    }

    #[test]
    fn test_empty_base_branch_means_default() {
        let mut config = config::parse(CONFIG).unwrap();
        apply_overrides(&mut config, &args(&["--base-branch", ""]));
        assert_eq!(config.pr.base_branch, None);
    }
}

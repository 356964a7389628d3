//! # Orchestrator
//!
//! Drives one run across every configured repository:
//!
//! 1. **Clone** the repository (or reuse an earlier clone).
//! 2. **Branch**: bring the default branch up to date and switch to the
//!    work branch.
//! 3. **Apply** the rule set to the checkout.
//! 4. **Commit** and **push** the modified files.
//! 5. **Pull request**: reuse an open one for the branch or create it.
//!
//! Repositories are processed one at a time. A failure in any step marks
//! that repository as failed and the run moves on to the next one.
//!
//! External effects go through [`RepoHost`], so the whole pipeline can be
//! exercised against a fake host.

use std::fmt;
use std::path::{Path, PathBuf};

use log::{debug, error, info, warn};
use tempfile::TempDir;

use crate::applier::{self, RepositoryApplyResult};
use crate::config::{Config, PrSettings};
use crate::error::Result;
use crate::filesystem::DiskTree;

/// Cloning, branching, committing and pull request operations.
pub trait RepoHost {
    /// Clone `repo` somewhere under `clone_root` and return the checkout.
    fn clone_repo(&mut self, repo: &str, clone_root: &Path) -> Result<PathBuf>;

    fn prepare_branch(&mut self, repo_path: &Path, branch: &str) -> Result<()>;

    /// Stage and commit everything. `false` when there was nothing to commit.
    fn commit_all(&mut self, repo_path: &Path, message: &str) -> Result<bool>;

    fn push(&mut self, repo_path: &Path, branch: &str) -> Result<()>;

    fn find_open_pr(&mut self, repo: &str, branch: &str) -> Result<Option<String>>;

    fn create_pr(&mut self, repo: &str, pr: &PrSettings) -> Result<String>;
}

/// Per-run settings that do not come from the rule configuration.
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub clone_root: PathBuf,
    pub dry_run: bool,
}

/// What happened to one repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RepoStatus {
    /// Changes were pushed and a pull request is open
    Success {
        pr_url: String,
        /// The pull request already existed and was updated by the push
        existing: bool,
    },
    Skipped(String),
    Failed(String),
    /// Changes were computed but nothing was written
    DryRun,
}

impl fmt::Display for RepoStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RepoStatus::Success {
                pr_url,
                existing: true,
            } => write!(f, "updated existing PR {}", pr_url),
            RepoStatus::Success { pr_url, .. } => write!(f, "created PR {}", pr_url),
            RepoStatus::Skipped(reason) => write!(f, "skipped: {}", reason),
            RepoStatus::Failed(reason) => write!(f, "failed: {}", reason),
            RepoStatus::DryRun => write!(f, "dry run, changes not pushed"),
        }
    }
}

/// A file the rules could not be applied to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileFailureReport {
    pub path: String,
    pub message: String,
}

#[derive(Debug, Clone)]
pub struct RepoReport {
    pub repo: String,
    pub status: RepoStatus,
    pub modified_files: Vec<String>,
    pub file_failures: Vec<FileFailureReport>,
}

impl RepoReport {
    fn new(repo: &str) -> Self {
        Self {
            repo: repo.to_string(),
            status: RepoStatus::Skipped(String::new()),
            modified_files: Vec::new(),
            file_failures: Vec::new(),
        }
    }
}

/// Reports for a whole run, in processing order.
#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    pub reports: Vec<RepoReport>,
}

impl RunSummary {
    fn count(&self, pred: impl Fn(&RepoStatus) -> bool) -> usize {
        self.reports.iter().filter(|r| pred(&r.status)).count()
    }

    pub fn succeeded(&self) -> usize {
        self.count(|s| matches!(s, RepoStatus::Success { .. }))
    }

    pub fn skipped(&self) -> usize {
        self.count(|s| matches!(s, RepoStatus::Skipped(_)))
    }

    pub fn failed(&self) -> usize {
        self.count(|s| matches!(s, RepoStatus::Failed(_)))
    }

    pub fn dry_run(&self) -> usize {
        self.count(|s| matches!(s, RepoStatus::DryRun))
    }

    pub fn has_failures(&self) -> bool {
        self.failed() > 0
    }
}

/// Log what the rule set did to one checkout.
pub fn log_apply_result(result: &RepositoryApplyResult) {
    for file in &result.file_results {
        for outcome in file.skipped_outcomes() {
            debug!("{}: {} -> {}", file.path, outcome.action, outcome.reason);
        }
    }
    for path in &result.modified_files {
        info!("Modified: {}", path);
    }
    for failure in &result.failures {
        error!("Failed to apply changes to {}: {}", failure.path, failure.error);
    }
}

fn process_steps<H: RepoHost>(
    host: &mut H,
    repo: &str,
    config: &Config,
    options: &RunOptions,
    report: &mut RepoReport,
) -> Result<RepoStatus> {
    let repo_path = host.clone_repo(repo, &options.clone_root)?;

    if options.dry_run {
        debug!("Dry run, leaving {} on its current branch", repo);
    } else {
        host.prepare_branch(&repo_path, &config.pr.branch)?;
    }

    let mut tree = DiskTree::new(&repo_path);
    let result = applier::apply_all(&config.rules, &tree);
    log_apply_result(&result);

    report.modified_files = result.modified_files.clone();
    report.file_failures = result
        .failures
        .iter()
        .map(|f| FileFailureReport {
            path: f.path.clone(),
            message: f.error.to_string(),
        })
        .collect();

    if !result.has_changes {
        return Ok(RepoStatus::Skipped("No changes were made".to_string()));
    }
    if options.dry_run {
        return Ok(RepoStatus::DryRun);
    }

    result.persist(&mut tree)?;
    if !host.commit_all(&repo_path, &config.pr.commit_message)? {
        return Ok(RepoStatus::Skipped("No changes to commit".to_string()));
    }
    host.push(&repo_path, &config.pr.branch)?;

    if let Some(pr_url) = host.find_open_pr(repo, &config.pr.branch)? {
        info!("Pull request already exists: {}", pr_url);
        return Ok(RepoStatus::Success {
            pr_url,
            existing: true,
        });
    }
    let pr_url = host.create_pr(repo, &config.pr)?;
    info!("Created pull request: {}", pr_url);
    Ok(RepoStatus::Success {
        pr_url,
        existing: false,
    })
}

/// Run the whole pipeline for one repository. Never fails: errors end up
/// in the report's status.
pub fn process_repository<H: RepoHost>(
    host: &mut H,
    repo: &str,
    config: &Config,
    options: &RunOptions,
) -> RepoReport {
    info!("Processing {}", repo);
    let mut report = RepoReport::new(repo);
    let status = match process_steps(host, repo, config, options, &mut report) {
        Ok(status) => status,
        Err(err) => {
            error!("Error processing {}: {}", repo, err);
            RepoStatus::Failed(err.to_string())
        }
    };
    report.status = status;
    if let RepoStatus::Skipped(reason) = &report.status {
        info!("{}: {}", repo, reason);
    }
    report
}

/// Process every repository in order.
pub fn run<H: RepoHost>(
    host: &mut H,
    repos: &[String],
    config: &Config,
    options: &RunOptions,
) -> RunSummary {
    let mut summary = RunSummary::default();
    for (idx, repo) in repos.iter().enumerate() {
        debug!("Repository {}/{}", idx + 1, repos.len());
        summary
            .reports
            .push(process_repository(host, repo, config, options));
    }
    summary
}

/// Where clones live for the duration of a run.
#[derive(Debug)]
pub enum CloneRoot {
    /// Created for this run
    Temporary(TempDir),
    /// Given by the user; kept unless cleanup is requested
    Configured(PathBuf),
}

impl CloneRoot {
    /// Use `dir` when given, otherwise a fresh temporary directory.
    pub fn new(dir: Option<PathBuf>) -> Result<Self> {
        match dir {
            Some(dir) => {
                std::fs::create_dir_all(&dir)?;
                Ok(CloneRoot::Configured(dir))
            }
            None => Ok(CloneRoot::Temporary(
                tempfile::Builder::new().prefix("bulk_pr_").tempdir()?,
            )),
        }
    }

    pub fn path(&self) -> &Path {
        match self {
            CloneRoot::Temporary(dir) => dir.path(),
            CloneRoot::Configured(dir) => dir,
        }
    }

    /// Remove or keep the clones once the run is over.
    ///
    /// A temporary directory is removed unless `keep` is set; a configured
    /// one only when `cleanup` is set.
    pub fn finish(self, keep: bool, cleanup: bool) -> Result<()> {
        match self {
            CloneRoot::Temporary(dir) if keep && !cleanup => {
                let path = dir.keep();
                info!("Keeping clones in {}", path.display());
            }
            CloneRoot::Temporary(dir) => {
                debug!("Removing {}", dir.path().display());
                dir.close()?;
            }
            CloneRoot::Configured(dir) if cleanup => {
                info!("Cleaning up {}", dir.display());
                if dir.exists() {
                    std::fs::remove_dir_all(&dir)?;
                }
            }
            CloneRoot::Configured(dir) => {
                debug!("Leaving clones in {}", dir.display());
            }
        }
        Ok(())
    }
}

/// Warn about a configuration with nothing to do.
pub fn check_runnable(repos: &[String], config: &Config) -> bool {
    if repos.is_empty() {
        warn!("No repositories to process");
        return false;
    }
    if config.rules.is_empty() {
        warn!("No rules configured");
        return false;
    }
    true
}

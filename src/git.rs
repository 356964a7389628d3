//! Git operations on a cloned repository.
//!
//! These shell out to the system `git`, which picks up SSH keys, credential
//! helpers and anything else configured in `~/.gitconfig`.

use std::path::Path;
use std::process::{Command, Output};

use log::{debug, info};

use crate::error::{Error, Result};

const FALLBACK_DEFAULT_BRANCH: &str = "main";

fn describe(args: &[&str]) -> String {
    format!("git {}", args.join(" "))
}

/// Run git in `repo_path`, returning the raw output whatever the exit code.
fn run(repo_path: &Path, args: &[&str]) -> Result<Output> {
    debug!("Executing: {}", describe(args));
    Command::new("git")
        .args(args)
        .current_dir(repo_path)
        .output()
        .map_err(|e| Error::GitCommand {
            command: describe(args),
            repo: repo_path.display().to_string(),
            stderr: e.to_string(),
        })
}

/// Run git and fail on a non-zero exit code. Returns stdout.
fn run_checked(repo_path: &Path, args: &[&str]) -> Result<String> {
    let output = run(repo_path, args)?;
    if !output.status.success() {
        return Err(Error::GitCommand {
            command: describe(args),
            repo: repo_path.display().to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }
    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

/// Name of the remote's default branch.
///
/// Uses `origin/HEAD` when it is set, otherwise looks for `origin/main` and
/// then `origin/master`.
pub fn default_branch(repo_path: &Path) -> Result<String> {
    let head = run(repo_path, &["symbolic-ref", "refs/remotes/origin/HEAD"])?;
    if head.status.success() {
        let stdout = String::from_utf8_lossy(&head.stdout);
        if let Some(branch) = stdout.trim().strip_prefix("refs/remotes/origin/") {
            return Ok(branch.to_string());
        }
    }

    let remotes = run(repo_path, &["branch", "-r", "--format", "%(refname:short)"])?;
    let stdout = String::from_utf8_lossy(&remotes.stdout);
    let branches: Vec<&str> = stdout.lines().map(str::trim).collect();
    let branch = if branches.contains(&"origin/main") {
        "main"
    } else if branches.contains(&"origin/master") {
        "master"
    } else {
        FALLBACK_DEFAULT_BRANCH
    };
    Ok(branch.to_string())
}

/// Bring the default branch up to date and switch to `branch`.
///
/// An existing local branch is checked out, a remote-only branch is
/// tracked, otherwise a new branch is created from the default branch.
pub fn prepare_branch(repo_path: &Path, branch: &str) -> Result<()> {
    // Offline clones still work from what they have.
    run(repo_path, &["fetch", "origin"])?;

    let default = default_branch(repo_path)?;
    debug!("Checking out default branch: {}", default);
    run(repo_path, &["checkout", &default])?;
    run(repo_path, &["pull", "origin", &default])?;

    let local = run(repo_path, &["rev-parse", "--verify", "--quiet", branch])?;
    if local.status.success() {
        info!("Branch {} already exists locally, checking out", branch);
        run_checked(repo_path, &["checkout", branch])?;
        return Ok(());
    }

    let remote = run(repo_path, &["ls-remote", "--heads", "origin", branch])?;
    if remote.status.success() && !remote.stdout.trim_ascii().is_empty() {
        info!("Branch {} exists remotely, checking out and tracking", branch);
        let upstream = format!("origin/{}", branch);
        run_checked(repo_path, &["checkout", "-b", branch, &upstream])?;
    } else {
        info!("Creating new branch {}", branch);
        run_checked(repo_path, &["checkout", "-b", branch])?;
    }
    Ok(())
}

/// Whether the working tree has uncommitted changes.
pub fn has_changes(repo_path: &Path) -> Result<bool> {
    let status = run_checked(repo_path, &["status", "--porcelain"])?;
    Ok(!status.trim().is_empty())
}

/// Stage everything and commit. Returns `false` when there was nothing to
/// commit.
pub fn commit_all(repo_path: &Path, message: &str) -> Result<bool> {
    if !has_changes(repo_path)? {
        info!("No changes to commit");
        return Ok(false);
    }
    run_checked(repo_path, &["add", "-A"])?;
    info!("Committing changes: {}", message);
    run_checked(repo_path, &["commit", "-m", message])?;
    Ok(true)
}

/// Push `branch` to origin and set it as upstream.
pub fn push(repo_path: &Path, branch: &str) -> Result<()> {
    info!("Pushing branch {} to origin", branch);
    run_checked(repo_path, &["push", "-u", "origin", branch])?;
    Ok(())
}

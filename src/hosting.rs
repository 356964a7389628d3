//! GitHub operations through the `gh` CLI.
//!
//! `gh` handles authentication, so cloning and pull requests work with
//! whatever account `gh auth login` set up.

use std::path::{Path, PathBuf};
use std::process::Command;

use log::{debug, info, warn};
use serde::Deserialize;

use crate::config::PrSettings;
use crate::error::{Error, Result};
use crate::git;
use crate::orchestrator::RepoHost;

/// One entry of `gh pr list --json url`.
#[derive(Debug, Deserialize)]
struct PullRequestRef {
    url: String,
}

fn gh(repo: &str, args: &[&str]) -> Result<String> {
    debug!("Executing: gh {}", args.join(" "));
    let output = Command::new("gh")
        .args(args)
        .output()
        .map_err(|e| Error::Hosting {
            repo: repo.to_string(),
            message: format!("failed to run gh: {}", e),
        })?;
    if !output.status.success() {
        return Err(Error::Hosting {
            repo: repo.to_string(),
            message: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }
    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

/// Directory a repository is cloned into: `owner_repo` under `clone_root`.
pub fn clone_path(clone_root: &Path, repo: &str) -> PathBuf {
    clone_root.join(repo.replace('/', "_"))
}

/// Clone `repo` under `clone_root`, reusing an earlier clone when present.
pub fn clone_repo(repo: &str, clone_root: &Path) -> Result<PathBuf> {
    let target = clone_path(clone_root, repo);

    if target.join(".git").is_dir() {
        info!("Reusing existing clone of {} at {}", repo, target.display());
        return Ok(target);
    }
    if target.exists() {
        warn!(
            "{} exists but is not a git repository, removing it",
            target.display()
        );
        std::fs::remove_dir_all(&target)?;
    }
    std::fs::create_dir_all(clone_root)?;

    info!("Cloning {}", repo);
    let target_str = target.to_string_lossy();
    gh(repo, &["repo", "clone", repo, target_str.as_ref()])?;
    Ok(target)
}

/// Parse the output of `gh pr list --json url`.
fn first_pr_url(repo: &str, json: &str) -> Result<Option<String>> {
    let prs: Vec<PullRequestRef> = serde_json::from_str(json).map_err(|e| Error::Hosting {
        repo: repo.to_string(),
        message: format!("unexpected gh pr list output: {}", e),
    })?;
    Ok(prs.into_iter().next().map(|pr| pr.url))
}

/// URL of an open pull request from `branch`, if there is one.
pub fn find_open_pr(repo: &str, branch: &str) -> Result<Option<String>> {
    let stdout = gh(
        repo,
        &[
            "pr", "list", "--repo", repo, "--head", branch, "--state", "open", "--json", "url",
            "--limit", "1",
        ],
    )?;
    if stdout.trim().is_empty() {
        return Ok(None);
    }
    first_pr_url(repo, &stdout)
}

/// Arguments for `gh pr create`.
fn create_pr_args<'a>(repo: &'a str, pr: &'a PrSettings) -> Vec<&'a str> {
    let mut args = vec![
        "pr",
        "create",
        "--repo",
        repo,
        "--head",
        pr.branch.as_str(),
        "--title",
        pr.title.as_str(),
        "--body",
        pr.body.as_str(),
    ];
    if let Some(base) = &pr.base_branch {
        args.extend(["--base", base.as_str()]);
    }
    args
}

/// Open a pull request and return its URL.
pub fn create_pr(repo: &str, pr: &PrSettings) -> Result<String> {
    info!("Creating pull request for {}", repo);
    let stdout = gh(repo, &create_pr_args(repo, pr))?;
    // gh prints the URL as the last line
    stdout
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .last()
        .map(str::to_string)
        .ok_or_else(|| Error::Hosting {
            repo: repo.to_string(),
            message: "gh pr create printed no URL".to_string(),
        })
}

/// [`RepoHost`] backed by the system `git` and `gh` binaries.
#[derive(Debug, Default, Clone, Copy)]
pub struct GitHubHost;

impl RepoHost for GitHubHost {
    fn clone_repo(&mut self, repo: &str, clone_root: &Path) -> Result<PathBuf> {
        clone_repo(repo, clone_root)
    }

    fn prepare_branch(&mut self, repo_path: &Path, branch: &str) -> Result<()> {
        git::prepare_branch(repo_path, branch)
    }

    fn commit_all(&mut self, repo_path: &Path, message: &str) -> Result<bool> {
        git::commit_all(repo_path, message)
    }

    fn push(&mut self, repo_path: &Path, branch: &str) -> Result<()> {
        git::push(repo_path, branch)
    }

    fn find_open_pr(&mut self, repo: &str, branch: &str) -> Result<Option<String>> {
        find_open_pr(repo, branch)
    }

    fn create_pr(&mut self, repo: &str, pr: &PrSettings) -> Result<String> {
        create_pr(repo, pr)
    }
}

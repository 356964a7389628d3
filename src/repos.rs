//! Repository lists: parsing `owner/repo` names from config and repos files.

use std::path::Path;

use log::{debug, warn};

use crate::error::{Error, Result};

const GITHUB_HOST: &str = "github.com";

fn valid_part(part: &str) -> bool {
    !part.is_empty()
        && part
            .chars()
            .all(|c| c.is_alphanumeric() || matches!(c, '-' | '_' | '.'))
}

/// Normalize a repository reference to `owner/repo`.
///
/// Accepts `owner/repo`, `https://github.com/owner/repo(.git)` and
/// `git@github.com:owner/repo.git`. Returns `None` for anything else.
///
/// ```
/// use bulk_pr::repos::normalize_repo_name;
///
/// assert_eq!(
///     normalize_repo_name("git@github.com:acme/api.git").as_deref(),
///     Some("acme/api")
/// );
/// assert_eq!(normalize_repo_name("not a repo"), None);
/// ```
pub fn normalize_repo_name(repo: &str) -> Option<String> {
    let repo = repo.trim();

    if let Some(pos) = repo.find(GITHUB_HOST) {
        let rest = &repo[pos + GITHUB_HOST.len()..];
        let rest = rest.strip_prefix([':', '/'])?;
        let mut parts = rest.split('/');
        let owner = parts.next()?;
        let name = parts.next()?;
        let name = name.strip_suffix(".git").unwrap_or(name);
        return (valid_part(owner) && valid_part(name)).then(|| format!("{}/{}", owner, name));
    }

    match repo.split('/').collect::<Vec<_>>().as_slice() {
        [owner, name] if valid_part(owner) && valid_part(name) => Some(repo.to_string()),
        _ => None,
    }
}

/// Read repository references from a file, one per line.
///
/// Blank lines and `#` comments are ignored; unparseable lines are warned
/// about and skipped.
pub fn read_repos_file(path: &Path) -> Result<Vec<String>> {
    let content = std::fs::read_to_string(path).map_err(|e| Error::Filesystem {
        message: format!("Failed to read repos file {}: {}", path.display(), e),
    })?;

    let mut repos = Vec::new();
    for (line_num, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        match normalize_repo_name(line) {
            Some(repo) => repos.push(repo),
            None => warn!(
                "Invalid repository format on line {}: {} (expected owner/repo)",
                line_num + 1,
                line
            ),
        }
    }
    Ok(repos)
}

/// Combine configured repositories and a repos file, dropping duplicates.
pub fn resolve(configured: &[String], repos_file: Option<&Path>) -> Result<Vec<String>> {
    let mut candidates = Vec::new();
    for entry in configured {
        match normalize_repo_name(entry) {
            Some(repo) => candidates.push(repo),
            None => warn!("Invalid repository '{}' (expected owner/repo)", entry),
        }
    }
    if let Some(path) = repos_file {
        candidates.extend(read_repos_file(path)?);
    }

    let mut repos: Vec<String> = Vec::with_capacity(candidates.len());
    for repo in candidates {
        if repos.contains(&repo) {
            debug!("{} listed more than once", repo);
        } else {
            repos.push(repo);
        }
    }
    Ok(repos)
}

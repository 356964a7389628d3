//! # bulk-pr
//!
//! Apply the same declarative file edits to many repositories and open a
//! pull request in each one. The library holds the rule engine and the
//! automation pipeline; the `bulk-pr` binary is a thin CLI over it.
//!
//! ## Quick Example
//!
//! ```
//! use bulk_pr::applier;
//! use bulk_pr::config;
//! use bulk_pr::filesystem::MemoryFS;
//!
//! let config = config::parse(r#"
//! rules:
//!   - file: Jenkinsfile
//!     changes:
//!       - action: replace
//!         pattern: "@Library\\('gcp-jenkins-library@2\\.2\\.5'\\)"
//!         replacement: "@Library('gcp-jenkins-library@2.2.6')"
//!   - file: package.json
//!     type: json
//!     changes:
//!       - action: update_key
//!         path: version
//!         value: "2.0.0"
//! "#).unwrap();
//!
//! let mut fs = MemoryFS::new();
//! fs.add_file_string("Jenkinsfile", "@Library('gcp-jenkins-library@2.2.5') _\n");
//!
//! // package.json does not exist, so its rule is skipped
//! let result = applier::apply_all(&config.rules, &fs);
//! assert_eq!(result.modified_files, vec!["Jenkinsfile"]);
//!
//! result.persist(&mut fs).unwrap();
//! assert_eq!(
//!     fs.get_string("Jenkinsfile"),
//!     Some("@Library('gcp-jenkins-library@2.2.6') _\n")
//! );
//! ```
//!
//! ## Core Concepts
//!
//! - **Configuration (`config`)**: the `bulk-pr.yaml` schema, validated into
//!   a [`config::RuleSet`] with compiled patterns and parsed key paths.
//! - **Key paths (`path`)**: `a.b[0].c` addresses into structured documents.
//! - **Editors (`editor`)**: text, env, JSON and YAML documents that apply
//!   edits while leaving untouched content byte-identical.
//! - **Rule engine (`engine`, `applier`)**: runs rules against a
//!   [`filesystem::WorkingTree`] and reports per-edit outcomes.
//! - **Automation (`orchestrator`, `git`, `hosting`, `repos`)**: clones each
//!   repository, applies the rules, commits, pushes and opens the pull
//!   request.
//!
//! Configuration errors stop a run before any repository is touched. A file
//! that fails to parse only fails that file, and an edit that cannot be
//! applied only fails that edit.

pub mod applier;
pub mod config;
pub mod editor;
pub mod engine;
pub mod error;
pub mod filesystem;
pub mod git;
pub mod hosting;
pub mod orchestrator;
pub mod output;
pub mod path;
pub mod repos;

#[cfg(test)]
mod path_proptest;

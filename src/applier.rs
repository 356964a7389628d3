//! Repository change applier: runs the whole rule set against one working
//! tree and decides whether there is anything to commit.

use crate::config::{ChangeRule, RuleSet};
use crate::engine::{self, FileChangeResult, FileFailure, RuleApplication};
use crate::error::Result;
use crate::filesystem::WorkingTree;

/// Everything the rule set did to one repository.
#[derive(Debug, Default)]
pub struct RepositoryApplyResult {
    /// One entry per existing, parseable target file, in rule order
    pub file_results: Vec<FileChangeResult>,
    pub failures: Vec<FileFailure>,
    /// Paths whose content changed, in rule order
    pub modified_files: Vec<String>,
    pub has_changes: bool,
}

impl RepositoryApplyResult {
    pub fn result_for(&self, path: &str) -> Option<&FileChangeResult> {
        self.file_results.iter().find(|r| r.path == path)
    }

    /// Write the new content of every modified file.
    pub fn persist(&self, tree: &mut impl WorkingTree) -> Result<()> {
        for result in self.file_results.iter().filter(|r| r.changed) {
            tree.write_file(&result.path, &result.new_content)?;
        }
        Ok(())
    }
}

/// Rules grouped by target file, keeping the order in which files first
/// appear.
fn group_by_file(rules: &RuleSet) -> Vec<Vec<&ChangeRule>> {
    let mut groups: Vec<Vec<&ChangeRule>> = Vec::new();
    for rule in rules {
        match groups
            .iter_mut()
            .find(|group| group[0].target_file == rule.target_file)
        {
            Some(group) => group.push(rule),
            None => groups.push(vec![rule]),
        }
    }
    groups
}

/// Apply every rule to `tree` without writing anything.
pub fn apply_all(rules: &RuleSet, tree: &impl WorkingTree) -> RepositoryApplyResult {
    let mut result = RepositoryApplyResult::default();

    for group in group_by_file(rules) {
        let first = group[0];
        let content = match tree.read_file(&first.target_file) {
            Ok(content) => content,
            Err(error) => {
                result.failures.push(FileFailure {
                    path: first.target_file.clone(),
                    document_type: first.document_type,
                    error,
                });
                continue;
            }
        };

        match engine::apply_chain(&group, content.as_deref()) {
            RuleApplication::Skipped => {}
            RuleApplication::Failed(failure) => result.failures.push(failure),
            RuleApplication::Edited(file_result) => {
                if file_result.changed {
                    result.modified_files.push(file_result.path.clone());
                }
                result.file_results.push(file_result);
            }
        }
    }

    result.has_changes = !result.modified_files.is_empty();
    result
}

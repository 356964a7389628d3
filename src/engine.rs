//! Rule engine: applies the edits of one rule to one file's content.

use log::debug;

use crate::config::{ChangeRule, DocumentType, EditSpec};
use crate::editor::{self, Document, EditOutcome};
use crate::error::Error;

/// The result of running a rule against a file that exists and parsed.
#[derive(Debug, Clone)]
pub struct FileChangeResult {
    pub path: String,
    pub document_type: DocumentType,
    pub original_content: String,
    /// Equal to `original_content` when nothing changed
    pub new_content: String,
    pub changed: bool,
    pub outcomes: Vec<EditOutcome>,
}

impl FileChangeResult {
    /// Edits that did not change anything, for reporting.
    pub fn skipped_outcomes(&self) -> impl Iterator<Item = &EditOutcome> {
        self.outcomes.iter().filter(|o| !o.applied())
    }
}

/// A file that could not be read or parsed.
#[derive(Debug)]
pub struct FileFailure {
    pub path: String,
    pub document_type: DocumentType,
    pub error: Error,
}

#[derive(Debug)]
pub enum RuleApplication {
    /// The target file does not exist
    Skipped,
    Edited(FileChangeResult),
    Failed(FileFailure),
}

/// Apply one rule to the current content of its target file.
pub fn apply_rule(rule: &ChangeRule, content: Option<&str>) -> RuleApplication {
    apply_chain(&[rule], content)
}

/// Apply several rules for the same file, in order, as one document.
///
/// Every rule sees the content left by the previous one; the outcomes of
/// all of them are reported together. The first rule names the file and
/// its document type.
pub fn apply_chain(rules: &[&ChangeRule], content: Option<&str>) -> RuleApplication {
    let first = match rules.first() {
        Some(first) => first,
        None => return RuleApplication::Skipped,
    };
    let path = &first.target_file;
    let document_type = first.document_type;

    let content = match content {
        Some(content) => content,
        None => {
            debug!("{}: not present, skipping", path);
            return RuleApplication::Skipped;
        }
    };

    let mut document = match editor::open(document_type, content) {
        Ok(document) => document,
        Err(error) => {
            return RuleApplication::Failed(FileFailure {
                path: path.clone(),
                document_type,
                error,
            })
        }
    };

    let outcomes: Vec<EditOutcome> = rules
        .iter()
        .flat_map(|rule| rule.edits.iter())
        .map(|edit| apply_edit(document.as_mut(), edit))
        .collect();

    let changed = document.changed_from(content);
    let new_content = if changed {
        document.render().to_string()
    } else {
        content.to_string()
    };

    RuleApplication::Edited(FileChangeResult {
        path: path.clone(),
        document_type,
        original_content: content.to_string(),
        new_content,
        changed,
        outcomes,
    })
}

/// Run a single edit, turning edit-level errors into outcomes.
pub fn apply_edit(document: &mut dyn Document, edit: &EditSpec) -> EditOutcome {
    let action = edit.action();
    let result = match edit {
        EditSpec::Replace {
            pattern,
            replacement,
        } => document.replace(pattern, replacement),
        EditSpec::UpdateKey { path, value } => document.update_key(path, value),
        EditSpec::DeleteKey { path, expected } => document.delete_key(path, expected.as_ref()),
    };
    match result {
        Ok(reason) => EditOutcome::new(action, reason),
        Err(error) => {
            debug!("{} failed: {}", action, error);
            EditOutcome::from_error(action, &error)
        }
    }
}

//! Document editors.
//!
//! Each supported document type has an editor that owns the current text of
//! one file and applies edits to it in place:
//!
//! - [`text::TextDocument`]: regex substitution over the whole content
//! - [`env::EnvDocument`]: `KEY=VALUE` lines plus substitution
//! - [`json::JsonDocument`]: key-path edits on a JSON document
//! - [`yaml::YamlDocument`]: key-path edits on a YAML document
//!
//! Editors never fail on a no-op. Finding nothing to change is reported as
//! an [`OutcomeReason`], while broken paths and type clashes surface as
//! [`Error`]s so that the rule engine can record them against the edit and
//! keep going.

pub mod env;
pub mod json;
mod splice;
pub mod text;
pub(crate) mod tree;
pub mod yaml;

use std::fmt;

use regex::Regex;
use serde::Serialize;
use serde_json::Value;

use crate::config::{Action, DocumentType};
use crate::error::{Error, Result};
use crate::path::KeyPath;

/// Why an edit did or did not change the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeReason {
    Applied,
    KeyAbsent,
    PatternAbsent,
    ValueUnchanged,
    ValueMismatchSkippedDelete,
    PathInvalid,
    ArrayIndexOutOfRange,
    TypeMismatch,
}

impl OutcomeReason {
    pub fn as_str(self) -> &'static str {
        match self {
            OutcomeReason::Applied => "applied",
            OutcomeReason::KeyAbsent => "key_absent",
            OutcomeReason::PatternAbsent => "pattern_absent",
            OutcomeReason::ValueUnchanged => "value_unchanged",
            OutcomeReason::ValueMismatchSkippedDelete => "value_mismatch_skipped_delete",
            OutcomeReason::PathInvalid => "path_invalid",
            OutcomeReason::ArrayIndexOutOfRange => "array_index_out_of_range",
            OutcomeReason::TypeMismatch => "type_mismatch",
        }
    }
}

impl fmt::Display for OutcomeReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The result of one edit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditOutcome {
    pub action: Action,
    pub reason: OutcomeReason,
    /// Error text for edits that failed
    pub message: Option<String>,
}

impl EditOutcome {
    pub fn new(action: Action, reason: OutcomeReason) -> Self {
        Self {
            action,
            reason,
            message: None,
        }
    }

    /// Map an edit-level error onto an outcome.
    pub fn from_error(action: Action, error: &Error) -> Self {
        let reason = match error {
            Error::ArrayIndexOutOfRange { .. } => OutcomeReason::ArrayIndexOutOfRange,
            Error::TypeMismatch { .. } => OutcomeReason::TypeMismatch,
            _ => OutcomeReason::PathInvalid,
        };
        Self {
            action,
            reason,
            message: Some(error.to_string()),
        }
    }

    pub fn applied(&self) -> bool {
        self.reason == OutcomeReason::Applied
    }
}

/// An editable document of one [`DocumentType`].
///
/// Unsupported actions default to [`Error::UnsupportedAction`].
pub trait Document {
    fn document_type(&self) -> DocumentType;

    fn replace(&mut self, _pattern: &Regex, _replacement: &str) -> Result<OutcomeReason> {
        Err(unsupported(Action::Replace, self.document_type()))
    }

    fn update_key(&mut self, _path: &KeyPath, _value: &Value) -> Result<OutcomeReason> {
        Err(unsupported(Action::UpdateKey, self.document_type()))
    }

    fn delete_key(&mut self, _path: &KeyPath, _expected: Option<&Value>) -> Result<OutcomeReason> {
        Err(unsupported(Action::DeleteKey, self.document_type()))
    }

    /// The current text of the document.
    fn render(&self) -> &str;

    /// Whether the document differs from `original` in a way that matters.
    fn changed_from(&self, original: &str) -> bool;
}

/// Open `content` with the editor for `document_type`.
pub fn open(document_type: DocumentType, content: &str) -> Result<Box<dyn Document>> {
    Ok(match document_type {
        DocumentType::Text => Box::new(text::TextDocument::new(content)),
        DocumentType::Env => Box::new(env::EnvDocument::new(content)),
        DocumentType::Json => Box::new(json::JsonDocument::parse(content)?),
        DocumentType::Yaml => Box::new(yaml::YamlDocument::parse(content)?),
    })
}

fn unsupported(action: Action, document_type: DocumentType) -> Error {
    Error::UnsupportedAction {
        action: action.to_string(),
        document_type: document_type.to_string(),
    }
}

/// Substitute every match of `pattern` in `content`.
///
/// Returns the reason and, when something changed, the new content.
pub(crate) fn substitute(
    content: &str,
    pattern: &Regex,
    replacement: &str,
) -> (OutcomeReason, Option<String>) {
    if !pattern.is_match(content) {
        return (OutcomeReason::PatternAbsent, None);
    }
    let replaced = pattern.replace_all(content, replacement);
    if replaced == content {
        (OutcomeReason::ValueUnchanged, None)
    } else {
        (OutcomeReason::Applied, Some(replaced.into_owned()))
    }
}

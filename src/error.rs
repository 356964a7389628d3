//! # Error Handling
//!
//! This module defines the centralized error type for `bulk-pr`. It uses the
//! `thiserror` library to build a single `Error` enum that covers every
//! anticipated failure mode, from configuration loading to the external
//! `git`/`gh` commands.
//!
//! Errors fall into three recovery tiers:
//!
//! - **Configuration errors** (`ConfigParse`, `ConfigConflict`,
//!   `InvalidPathSyntax`, `Regex`) are fatal and surface before any
//!   repository is touched.
//! - **Document errors** (`DocumentParse`) fail a single file; the rest of the
//!   repository is still processed.
//! - **Edit errors** (`ArrayIndexOutOfRange`, `TypeMismatch`,
//!   `UnsupportedAction`) fail a single edit; later edits in the same file
//!   still run.
//!
//! Everything else (`GitCommand`, `Hosting`, `Io`, ...) belongs to the
//! automation layer and fails one repository at most.

use thiserror::Error;

/// Main error type for bulk-pr operations
#[derive(Error, Debug)]
pub enum Error {
    /// The configuration file could not be parsed or is structurally invalid.
    #[error("Configuration parsing error: {message}{}", hint.as_ref().map(|h| format!("\n  hint: {}", h)).unwrap_or_default())]
    ConfigParse {
        message: String,
        /// Optional hint for how to fix the configuration issue
        hint: Option<String>,
    },

    /// Two rules disagree about the same file or key.
    #[error("Conflicting rules for {file}: {message}")]
    ConfigConflict { file: String, message: String },

    /// A key path in the configuration is malformed.
    #[error("Invalid path syntax in '{path}': {message}")]
    InvalidPathSyntax { path: String, message: String },

    /// A target file does not parse as its declared document type.
    #[error("Failed to parse {document_type} document: {message}")]
    DocumentParse {
        document_type: String,
        message: String,
    },

    /// An index step points past the end of a sequence.
    #[error("Array index {index} out of range at '{path}' (length {len})")]
    ArrayIndexOutOfRange {
        path: String,
        index: usize,
        len: usize,
    },

    /// A step expected a mapping or sequence and found something else.
    #[error("Type mismatch at '{path}': expected {expected}, found {found}")]
    TypeMismatch {
        path: String,
        expected: &'static str,
        found: &'static str,
    },

    /// The action cannot be applied to the declared document type.
    #[error("Action '{action}' is not supported for {document_type} documents")]
    UnsupportedAction {
        action: String,
        document_type: String,
    },

    /// A working tree operation failed.
    #[error("Filesystem operation error: {message}")]
    Filesystem { message: String },

    /// An error occurred while executing a Git command.
    #[error("Git command failed in {repo}: {command} - {stderr}")]
    GitCommand {
        command: String,
        repo: String,
        stderr: String,
    },

    /// An error occurred while talking to the hosting service.
    #[error("Hosting operation failed for {repo}: {message}")]
    Hosting { repo: String, message: String },

    /// An I/O error, wrapped from `std::io::Error`.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A YAML error, wrapped from `serde_yaml::Error`.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// A JSON error, wrapped from `serde_json::Error`.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A regular expression error, wrapped from `regex::Error`.
    #[error("Regex error: {0}")]
    Regex(#[from] regex::Error),
}

impl Error {
    /// Returns true for errors that must stop the run before any repository
    /// is processed.
    pub fn is_configuration_error(&self) -> bool {
        matches!(
            self,
            Error::ConfigParse { .. }
                | Error::ConfigConflict { .. }
                | Error::InvalidPathSyntax { .. }
                | Error::Regex(_)
        )
    }
}

/// A convenient type alias for `Result<T, Error>`.
pub type Result<T> = std::result::Result<T, Error>;

//! # Configuration Schema and Parsing
//!
//! This module defines the data structures that represent the `bulk-pr.yaml`
//! configuration file and the logic for loading and validating it.
//!
//! ## Key Components
//!
//! - **`ConfigFile`**: The raw, deserialized shape of the file.
//! - **`Config`**: The validated configuration handed to the rest of the
//!   application. It is built once and only ever borrowed afterwards.
//! - **`RuleSet` / `ChangeRule` / `EditSpec`**: The declarative edits, with
//!   regular expressions already compiled and key paths already parsed.
//!
//! ## Validation
//!
//! Everything that can be checked without looking at a repository is checked
//! here, so that a bad configuration fails before the first clone:
//!
//! 1.  Every regex compiles and every key path parses.
//! 2.  Every action is legal for its document type (`replace` only on text and
//!     env files, key actions only on env, JSON and YAML files).
//! 3.  Env key paths are a single key.
//! 4.  Rules for the same file agree on the document type and do not set the
//!     same key to different values (or set it in one rule and delete it in
//!     another).

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::path::{Component, Path, PathBuf};

use crate::error::{Error, Result};
use crate::path::KeyPath;

/// Default commit message when none is configured.
pub const DEFAULT_COMMIT_MESSAGE: &str = "chore: apply automated changes";
/// Default pull request title when none is configured.
pub const DEFAULT_PR_TITLE: &str = "Automated changes";
/// Default pull request body when none is configured.
pub const DEFAULT_PR_BODY: &str = "Automated changes applied by bulk-pr.";
/// Default feature branch when none is configured.
pub const DEFAULT_BRANCH: &str = "bulk-pr/automated-changes";
/// Default configuration file name.
pub const DEFAULT_CONFIG_FILE: &str = "bulk-pr.yaml";

/// The shape of a target file, which selects the editor used on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentType {
    /// Free text, edited with regular expressions
    #[default]
    Text,
    /// Line-oriented `KEY=VALUE` files
    Env,
    /// JSON documents
    Json,
    /// YAML documents
    #[serde(alias = "yml")]
    Yaml,
}

impl DocumentType {
    /// Whether `action` can be applied to documents of this type.
    pub fn supports(self, action: Action) -> bool {
        match (self, action) {
            (DocumentType::Text, Action::Replace) => true,
            (DocumentType::Text, _) => false,
            (DocumentType::Env, _) => true,
            (DocumentType::Json | DocumentType::Yaml, Action::Replace) => false,
            (DocumentType::Json | DocumentType::Yaml, _) => true,
        }
    }

    /// The lowercase name used in configuration files.
    pub fn as_str(self) -> &'static str {
        match self {
            DocumentType::Text => "text",
            DocumentType::Env => "env",
            DocumentType::Json => "json",
            DocumentType::Yaml => "yaml",
        }
    }
}

impl fmt::Display for DocumentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The three edit actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    Replace,
    UpdateKey,
    DeleteKey,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Action::Replace => "replace",
            Action::UpdateKey => "update_key",
            Action::DeleteKey => "delete_key",
        })
    }
}

////// RAW FILE FORMAT //////

/// One change as written in the configuration file.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ChangeConfig {
    /// Regex replacement over the whole document.
    Replace {
        pattern: String,
        replacement: String,
    },
    /// Set the value at a key path.
    UpdateKey { path: String, value: Value },
    /// Remove the key at a key path, optionally only when it holds `value`.
    DeleteKey {
        path: String,
        #[serde(default)]
        value: Option<Value>,
    },
}

/// One rule as written in the configuration file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleConfig {
    /// Path of the target file, relative to the repository root.
    pub file: String,
    /// Document type; defaults to `text`.
    #[serde(rename = "type", default)]
    pub document_type: DocumentType,
    /// Ordered list of changes.
    #[serde(default)]
    pub changes: Vec<ChangeConfig>,
}

/// The raw configuration file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfigFile {
    /// Repositories as `owner/repo` or GitHub URLs.
    pub repos: Vec<String>,
    /// Optional file listing additional repositories, one per line.
    pub repos_file: Option<PathBuf>,
    pub commit_message: Option<String>,
    pub pr_title: Option<String>,
    pub pr_body: Option<String>,
    pub branch: Option<String>,
    /// Branch the pull request targets; the default branch when omitted.
    pub base_branch: Option<String>,
    /// Where to clone repositories; a temporary directory when omitted.
    pub clone_dir: Option<PathBuf>,
    /// Keep clones after the run.
    pub debug: bool,
    pub rules: Vec<RuleConfig>,
}

////// VALIDATED CONFIGURATION //////

/// A single validated edit.
#[derive(Debug, Clone)]
pub enum EditSpec {
    Replace {
        pattern: Regex,
        replacement: String,
    },
    UpdateKey {
        path: KeyPath,
        value: Value,
    },
    DeleteKey {
        path: KeyPath,
        expected: Option<Value>,
    },
}

impl EditSpec {
    /// Build a replace edit, compiling the pattern.
    pub fn replace(pattern: &str, replacement: &str) -> Result<Self> {
        if pattern.is_empty() {
            return Err(Error::ConfigParse {
                message: "replace pattern must not be empty".to_string(),
                hint: None,
            });
        }
        Ok(EditSpec::Replace {
            pattern: Regex::new(pattern)?,
            replacement: replacement.to_string(),
        })
    }

    /// Build an update_key edit, parsing the path.
    pub fn update_key(path: &str, value: Value) -> Result<Self> {
        Ok(EditSpec::UpdateKey {
            path: KeyPath::parse(path)?,
            value,
        })
    }

    /// Build a delete_key edit, parsing the path.
    pub fn delete_key(path: &str, expected: Option<Value>) -> Result<Self> {
        Ok(EditSpec::DeleteKey {
            path: KeyPath::parse(path)?,
            expected,
        })
    }

    pub fn action(&self) -> Action {
        match self {
            EditSpec::Replace { .. } => Action::Replace,
            EditSpec::UpdateKey { .. } => Action::UpdateKey,
            EditSpec::DeleteKey { .. } => Action::DeleteKey,
        }
    }

    /// The key path this edit targets, if any.
    pub fn path(&self) -> Option<&KeyPath> {
        match self {
            EditSpec::Replace { .. } => None,
            EditSpec::UpdateKey { path, .. } | EditSpec::DeleteKey { path, .. } => Some(path),
        }
    }

    fn from_config(change: &ChangeConfig) -> Result<Self> {
        match change {
            ChangeConfig::Replace {
                pattern,
                replacement,
            } => Self::replace(pattern, replacement),
            ChangeConfig::UpdateKey { path, value } => Self::update_key(path, value.clone()),
            ChangeConfig::DeleteKey { path, value } => Self::delete_key(path, value.clone()),
        }
    }
}

/// A validated rule: one target file, its type, and its ordered edits.
#[derive(Debug, Clone)]
pub struct ChangeRule {
    pub target_file: String,
    pub document_type: DocumentType,
    pub edits: Vec<EditSpec>,
}

impl ChangeRule {
    /// Create a rule, checking that every edit fits the document type.
    pub fn new(
        target_file: impl Into<String>,
        document_type: DocumentType,
        edits: Vec<EditSpec>,
    ) -> Result<Self> {
        let target_file = normalize_target_file(&target_file.into())?;

        for edit in &edits {
            let action = edit.action();
            if !document_type.supports(action) {
                return Err(Error::ConfigParse {
                    message: format!(
                        "{}: action '{}' is not supported for {} files",
                        target_file, action, document_type
                    ),
                    hint: Some(match document_type {
                        DocumentType::Text => {
                            "use type 'env', 'json' or 'yaml' for key-based changes".to_string()
                        }
                        _ => "use type 'text' for pattern replacements".to_string(),
                    }),
                });
            }
            if document_type == DocumentType::Env {
                if let Some(path) = edit.path() {
                    if path.as_single_key().is_none() {
                        return Err(Error::InvalidPathSyntax {
                            path: path.to_string(),
                            message: format!(
                                "{}: env files only support a single variable name",
                                target_file
                            ),
                        });
                    }
                }
            }
        }

        Ok(Self {
            target_file,
            document_type,
            edits,
        })
    }

    fn from_config(rule: &RuleConfig) -> Result<Self> {
        let edits = rule
            .changes
            .iter()
            .map(EditSpec::from_config)
            .collect::<Result<Vec<_>>>()?;
        Self::new(rule.file.clone(), rule.document_type, edits)
    }
}

/// The full, validated list of rules, in declaration order.
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    rules: Vec<ChangeRule>,
}

impl RuleSet {
    /// Create a rule set, rejecting contradictory rules for the same file.
    pub fn new(rules: Vec<ChangeRule>) -> Result<Self> {
        let mut types: HashMap<&str, DocumentType> = HashMap::new();
        // (file, path) -> (rule index, Some(value) for update / None for delete)
        let mut keys: HashMap<(&str, String), (usize, Option<&Value>)> = HashMap::new();

        for (rule_idx, rule) in rules.iter().enumerate() {
            let file = rule.target_file.as_str();
            if let Some(existing) = types.insert(file, rule.document_type) {
                if existing != rule.document_type {
                    return Err(Error::ConfigConflict {
                        file: file.to_string(),
                        message: format!(
                            "declared as both {} and {}",
                            existing, rule.document_type
                        ),
                    });
                }
            }

            for edit in &rule.edits {
                let (path, value) = match edit {
                    EditSpec::UpdateKey { path, value } => (path, Some(value)),
                    EditSpec::DeleteKey { path, .. } => (path, None),
                    EditSpec::Replace { .. } => continue,
                };
                let entry = (file, path.to_string());
                match keys.get(&entry).copied() {
                    Some((other_idx, other)) if other_idx != rule_idx => {
                        let contradicts = match (other, value) {
                            (Some(a), Some(b)) => a != b,
                            (None, None) => false,
                            _ => true,
                        };
                        if contradicts {
                            return Err(Error::ConfigConflict {
                                file: file.to_string(),
                                message: format!(
                                    "rules {} and {} disagree about '{}'",
                                    other_idx + 1,
                                    rule_idx + 1,
                                    path
                                ),
                            });
                        }
                    }
                    _ => {
                        keys.insert(entry, (rule_idx, value));
                    }
                }
            }
        }

        Ok(Self { rules })
    }

    pub fn rules(&self) -> &[ChangeRule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ChangeRule> {
        self.rules.iter()
    }
}

impl<'a> IntoIterator for &'a RuleSet {
    type Item = &'a ChangeRule;
    type IntoIter = std::slice::Iter<'a, ChangeRule>;

    fn into_iter(self) -> Self::IntoIter {
        self.rules.iter()
    }
}

/// Commit and pull request settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrSettings {
    pub commit_message: String,
    pub title: String,
    pub body: String,
    pub branch: String,
    pub base_branch: Option<String>,
}

/// The validated configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub repos: Vec<String>,
    pub repos_file: Option<PathBuf>,
    pub pr: PrSettings,
    pub clone_dir: Option<PathBuf>,
    pub debug: bool,
    pub rules: RuleSet,
}

impl Config {
    /// Validate a raw configuration file.
    pub fn from_raw(raw: ConfigFile) -> Result<Self> {
        let rules = raw
            .rules
            .iter()
            .enumerate()
            .map(|(idx, rule)| {
                ChangeRule::from_config(rule).map_err(|err| match err {
                    Error::ConfigParse { message, hint } => Error::ConfigParse {
                        message: format!("rule {}: {}", idx + 1, message),
                        hint,
                    },
                    other => other,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            repos: raw.repos,
            repos_file: raw.repos_file,
            pr: PrSettings {
                commit_message: raw
                    .commit_message
                    .unwrap_or_else(|| DEFAULT_COMMIT_MESSAGE.to_string()),
                title: raw.pr_title.unwrap_or_else(|| DEFAULT_PR_TITLE.to_string()),
                body: raw.pr_body.unwrap_or_else(|| DEFAULT_PR_BODY.to_string()),
                branch: raw.branch.unwrap_or_else(|| DEFAULT_BRANCH.to_string()),
                base_branch: raw.base_branch.filter(|b| !b.is_empty()),
            },
            clone_dir: raw.clone_dir,
            debug: raw.debug,
            rules: RuleSet::new(rules)?,
        })
    }
}

/// Parse and validate a YAML configuration string.
///
/// # Examples
///
/// ```
/// use bulk_pr::config;
///
/// let yaml = r#"
/// repos: [acme/api]
/// rules:
///   - file: package.json
///     type: json
///     changes:
///       - action: update_key
///         path: dependencies.react
///         value: "^18.0.0"
/// "#;
/// let config = config::parse(yaml).unwrap();
/// assert_eq!(config.rules.len(), 1);
/// ```
pub fn parse(yaml_content: &str) -> Result<Config> {
    let raw: ConfigFile = serde_yaml::from_str(yaml_content).map_err(|err| Error::ConfigParse {
        message: err.to_string(),
        hint: hint_for(&err.to_string()),
    })?;
    Config::from_raw(raw)
}

/// Load and validate a configuration file from disk.
pub fn from_file(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path).map_err(|err| Error::ConfigParse {
        message: format!("Failed to read {}: {}", path.display(), err),
        hint: None,
    })?;
    parse(&content)
}

fn hint_for(message: &str) -> Option<String> {
    if message.contains("unknown variant") && message.contains("update_key") {
        Some("valid actions are replace, update_key and delete_key".to_string())
    } else if message.contains("unknown variant") {
        Some("valid types are text, env, json and yaml".to_string())
    } else if message.contains("missing field `action`") {
        Some("every change needs an 'action:' key".to_string())
    } else if message.contains("missing field `replacement`") {
        Some("replace needs a 'replacement:' (use \"\" to remove matches)".to_string())
    } else {
        None
    }
}

/// Check that `target` stays inside the repository and return it in one
/// canonical spelling (`./a//b` becomes `a/b`).
fn normalize_target_file(target: &str) -> Result<String> {
    let mut parts = Vec::new();
    for component in Path::new(target).components() {
        match component {
            Component::Normal(part) => parts.push(part.to_string_lossy()),
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                parts.clear();
                break;
            }
        }
    }
    if parts.is_empty() {
        return Err(Error::ConfigParse {
            message: format!("invalid target file '{}'", target),
            hint: Some("target files must be relative paths inside the repository".to_string()),
        });
    }
    Ok(parts.join("/"))
}

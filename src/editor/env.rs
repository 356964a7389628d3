//! `.env` documents.
//!
//! Lines look like `KEY=VALUE`. Key edits address a single variable name and
//! only ever touch the first line that defines it. Everything else in the
//! file, comments and blank lines included, is left as it is.

use regex::Regex;
use serde_json::Value;

use super::splice::line_ending;
use super::{substitute, Document, OutcomeReason};
use crate::config::DocumentType;
use crate::error::{Error, Result};
use crate::path::KeyPath;

#[derive(Debug, Clone)]
pub struct EnvDocument {
    content: String,
}

/// Where a `KEY=` line sits in the content.
struct Assignment {
    line_start: usize,
    line_end: usize,
    /// Byte offset of the first value byte
    value_start: usize,
    /// Raw value text, without the line ending
    value: String,
}

impl EnvDocument {
    pub fn new(content: &str) -> Self {
        Self {
            content: content.to_string(),
        }
    }

    fn find(&self, key: &str) -> Option<Assignment> {
        let mut offset = 0;
        for line in self.content.split_inclusive('\n') {
            let line_start = offset;
            offset += line.len();

            let rest = match line.strip_prefix(key) {
                Some(rest) => rest,
                None => continue,
            };
            let after_ws = rest.trim_start_matches([' ', '\t']);
            let value = match after_ws.strip_prefix('=') {
                Some(value) => value.trim_start_matches([' ', '\t']),
                None => continue,
            };
            let body = value.trim_end_matches(['\n', '\r']);
            let value_start = line_start + (line.len() - value.len());
            return Some(Assignment {
                line_start,
                line_end: offset,
                value_start,
                value: body.to_string(),
            });
        }
        None
    }
}

fn single_key(path: &KeyPath) -> Result<&str> {
    path.as_single_key().ok_or_else(|| Error::InvalidPathSyntax {
        path: path.to_string(),
        message: "env files only support a single key".to_string(),
    })
}

/// Render a value the way it is written after `=`.
pub(crate) fn render_value(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::Array(_) | Value::Object(_) => value.to_string(),
    }
}

/// Strip surrounding whitespace and one layer of matching quotes.
fn unquote(raw: &str) -> &str {
    let trimmed = raw.trim();
    for quote in ['"', '\''] {
        if trimmed.len() >= 2 && trimmed.starts_with(quote) && trimmed.ends_with(quote) {
            return &trimmed[1..trimmed.len() - 1];
        }
    }
    trimmed
}

fn quote_of(raw: &str) -> Option<char> {
    let trimmed = raw.trim();
    ['"', '\'']
        .into_iter()
        .find(|&q| trimmed.len() >= 2 && trimmed.starts_with(q) && trimmed.ends_with(q))
}

impl Document for EnvDocument {
    fn document_type(&self) -> DocumentType {
        DocumentType::Env
    }

    fn replace(&mut self, pattern: &Regex, replacement: &str) -> Result<OutcomeReason> {
        let (reason, replaced) = substitute(&self.content, pattern, replacement);
        if let Some(replaced) = replaced {
            self.content = replaced;
        }
        Ok(reason)
    }

    fn update_key(&mut self, path: &KeyPath, value: &Value) -> Result<OutcomeReason> {
        let key = single_key(path)?;
        let rendered = render_value(value);

        match self.find(key) {
            Some(existing) => {
                if unquote(&existing.value) == rendered {
                    return Ok(OutcomeReason::ValueUnchanged);
                }
                let new_value = match quote_of(&existing.value) {
                    Some(q) => format!("{q}{rendered}{q}"),
                    None => rendered,
                };
                let value_end = existing.value_start + existing.value.len();
                self.content
                    .replace_range(existing.value_start..value_end, &new_value);
            }
            None => {
                let eol = line_ending(&self.content);
                if !self.content.is_empty() && !self.content.ends_with('\n') {
                    self.content.push_str(eol);
                }
                self.content.push_str(&format!("{key}={rendered}{eol}"));
            }
        }
        Ok(OutcomeReason::Applied)
    }

    fn delete_key(&mut self, path: &KeyPath, expected: Option<&Value>) -> Result<OutcomeReason> {
        let key = single_key(path)?;
        let existing = match self.find(key) {
            Some(existing) => existing,
            None => return Ok(OutcomeReason::KeyAbsent),
        };
        if let Some(expected) = expected {
            if unquote(&existing.value) != render_value(expected) {
                return Ok(OutcomeReason::ValueMismatchSkippedDelete);
            }
        }
        self.content
            .replace_range(existing.line_start..existing.line_end, "");
        Ok(OutcomeReason::Applied)
    }

    fn render(&self) -> &str {
        &self.content
    }

    fn changed_from(&self, original: &str) -> bool {
        self.content != original
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn key(k: &str) -> KeyPath {
        KeyPath::parse(k).unwrap()
    }

    #[test]
    fn test_update_existing_key() {
        let mut doc = EnvDocument::new("# settings\nAPI_URL=https://old\nAPI_KEY=abc\n");
        let reason = doc
            .update_key(&key("API_URL"), &json!("https://new"))
            .unwrap();
        assert_eq!(reason, OutcomeReason::Applied);
        assert_eq!(doc.render(), "# settings\nAPI_URL=https://new\nAPI_KEY=abc\n");
    }

    #[test]
    fn test_prefix_keys_do_not_match() {
        let mut doc = EnvDocument::new("API_KEY_VERSION=2\n");
        doc.update_key(&key("API_KEY"), &json!("x")).unwrap();
        assert_eq!(doc.render(), "API_KEY_VERSION=2\nAPI_KEY=x\n");
    }

    #[test]
    fn test_first_match_wins() {
        let mut doc = EnvDocument::new("A=1\nA=2\n");
        doc.update_key(&key("A"), &json!(3)).unwrap();
        assert_eq!(doc.render(), "A=3\nA=2\n");
    }

    #[test]
    fn test_append_adds_missing_newline() {
        let mut doc = EnvDocument::new("A=1");
        doc.update_key(&key("B"), &json!(true)).unwrap();
        assert_eq!(doc.render(), "A=1\nB=true\n");

        let mut empty = EnvDocument::new("");
        empty.update_key(&key("B"), &json!("x")).unwrap();
        assert_eq!(empty.render(), "B=x\n");
    }

    #[test]
    fn test_append_keeps_crlf_line_endings() {
        let mut doc = EnvDocument::new("A=1\r\nB=2\r\n");
        doc.update_key(&key("C"), &json!(3)).unwrap();
        assert_eq!(doc.render(), "A=1\r\nB=2\r\nC=3\r\n");

        let mut unterminated = EnvDocument::new("A=1\r\nB=2");
        unterminated.update_key(&key("C"), &json!(3)).unwrap();
        assert_eq!(unterminated.render(), "A=1\r\nB=2\r\nC=3\r\n");
    }

    #[test]
    fn test_quoted_value_is_unchanged_and_quote_kept() {
        let original = "NAME=\"service\"\nPORT = 8080\n";
        let mut doc = EnvDocument::new(original);
        assert_eq!(
            doc.update_key(&key("NAME"), &json!("service")).unwrap(),
            OutcomeReason::ValueUnchanged
        );
        assert_eq!(
            doc.update_key(&key("PORT"), &json!(8080)).unwrap(),
            OutcomeReason::ValueUnchanged
        );
        assert!(!doc.changed_from(original));

        doc.update_key(&key("NAME"), &json!("api")).unwrap();
        assert_eq!(doc.render(), "NAME=\"api\"\nPORT = 8080\n");
    }

    #[test]
    fn test_structured_value_renders_as_json() {
        let mut doc = EnvDocument::new("");
        doc.update_key(&key("HOSTS"), &json!(["a", "b"])).unwrap();
        assert_eq!(doc.render(), "HOSTS=[\"a\",\"b\"]\n");
    }

    #[test]
    fn test_delete_with_gate() {
        let mut doc = EnvDocument::new("A=1\nB=2\r\nC=3");
        assert_eq!(
            doc.delete_key(&key("B"), Some(&json!("3"))).unwrap(),
            OutcomeReason::ValueMismatchSkippedDelete
        );
        assert_eq!(
            doc.delete_key(&key("B"), Some(&json!(2))).unwrap(),
            OutcomeReason::Applied
        );
        assert_eq!(doc.render(), "A=1\nC=3");
        assert_eq!(
            doc.delete_key(&key("B"), None).unwrap(),
            OutcomeReason::KeyAbsent
        );
        doc.delete_key(&key("C"), None).unwrap();
        assert_eq!(doc.render(), "A=1\n");
    }

    #[test]
    fn test_idempotent_update() {
        let mut doc = EnvDocument::new("A=1\n");
        doc.update_key(&key("B"), &json!("2")).unwrap();
        let after_first = doc.render().to_string();
        assert_eq!(
            doc.update_key(&key("B"), &json!("2")).unwrap(),
            OutcomeReason::ValueUnchanged
        );
        assert_eq!(doc.render(), after_first);
    }

    #[test]
    fn test_nested_path_rejected() {
        let mut doc = EnvDocument::new("A=1\n");
        assert!(matches!(
            doc.update_key(&key("a.b"), &json!(1)),
            Err(Error::InvalidPathSyntax { .. })
        ));
    }

    #[test]
    fn test_replace_whole_document() {
        let mut doc = EnvDocument::new("IMAGE=app:1.0\nOTHER=app:1.0\n");
        let re = Regex::new(r"app:1\.0").unwrap();
        doc.replace(&re, "app:1.1").unwrap();
        assert_eq!(doc.render(), "IMAGE=app:1.1\nOTHER=app:1.1\n");
    }
}

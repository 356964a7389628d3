//! Plain text documents: regex substitution only.

use regex::Regex;

use super::{substitute, Document, OutcomeReason};
use crate::config::DocumentType;
use crate::error::Result;

#[derive(Debug, Clone)]
pub struct TextDocument {
    content: String,
}

impl TextDocument {
    pub fn new(content: &str) -> Self {
        Self {
            content: content.to_string(),
        }
    }
}

impl Document for TextDocument {
    fn document_type(&self) -> DocumentType {
        DocumentType::Text
    }

    fn replace(&mut self, pattern: &Regex, replacement: &str) -> Result<OutcomeReason> {
        let (reason, replaced) = substitute(&self.content, pattern, replacement);
        if let Some(replaced) = replaced {
            self.content = replaced;
        }
        Ok(reason)
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
    use crate::path::KeyPath;

    const JENKINSFILE: &str = "@Library('gcp-jenkins-library@2.2.5') _\n\npipeline {\n  agent any\n}\n";

    #[test]
    fn test_jenkins_library_bump() {
        let pattern = Regex::new(r"@Library\('gcp-jenkins-library@2\.2\.5'\)").unwrap();
        let mut doc = TextDocument::new(JENKINSFILE);

        let reason = doc
            .replace(&pattern, "@Library('gcp-jenkins-library@2.2.6')")
            .unwrap();
        assert_eq!(reason, OutcomeReason::Applied);
        assert!(doc
            .render()
            .starts_with("@Library('gcp-jenkins-library@2.2.6') _\n"));
        assert!(doc.render().ends_with("pipeline {\n  agent any\n}\n"));
        assert!(doc.changed_from(JENKINSFILE));

        let again = doc
            .replace(&pattern, "@Library('gcp-jenkins-library@2.2.6')")
            .unwrap();
        assert_eq!(again, OutcomeReason::PatternAbsent);
    }

    #[test]
    fn test_replace_all_matches_with_groups() {
        let pattern = Regex::new(r"node:(\d+)").unwrap();
        let mut doc = TextDocument::new("FROM node:16\nFROM node:16 AS build\n");
        doc.replace(&pattern, "node:${1}-alpine").unwrap();
        assert_eq!(
            doc.render(),
            "FROM node:16-alpine\nFROM node:16-alpine AS build\n"
        );
    }

    #[test]
    fn test_identity_replacement_is_unchanged() {
        let pattern = Regex::new("agent any").unwrap();
        let mut doc = TextDocument::new(JENKINSFILE);
        assert_eq!(
            doc.replace(&pattern, "agent any").unwrap(),
            OutcomeReason::ValueUnchanged
        );
        assert!(!doc.changed_from(JENKINSFILE));
    }

    #[test]
    fn test_key_actions_unsupported() {
        let mut doc = TextDocument::new("x");
        let path = KeyPath::parse("a").unwrap();
        assert!(doc.update_key(&path, &serde_json::json!(1)).is_err());
        assert!(doc.delete_key(&path, None).is_err());
    }
}

//! Key path parsing for structured documents
//!
//! A key path addresses a location inside a JSON, YAML or env document:
//!
//! - Dot notation: `image.tag`
//! - Array indices: `jobs.build.steps[0].uses`
//! - Nested indices: `matrix[1][0]`
//!
//! Paths are parsed once when the configuration is loaded, so a malformed
//! path never reaches a repository.

use std::fmt;

use crate::error::{Error, Result};

/// One step of a [`KeyPath`].
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Step {
    /// A named key for accessing mapping members
    Key(String),
    /// A numeric index for accessing sequence elements
    Index(usize),
}

/// A parsed, non-empty sequence of steps. The first step is always a key.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct KeyPath {
    steps: Vec<Step>,
}

impl KeyPath {
    /// Parse a dotted/bracketed path string.
    ///
    /// # Examples
    ///
    /// ```
    /// use bulk_pr::path::{KeyPath, Step};
    ///
    /// let path = KeyPath::parse("jobs.build.steps[0].uses").unwrap();
    /// assert_eq!(path.steps()[3], Step::Index(0));
    /// assert_eq!(path.to_string(), "jobs.build.steps[0].uses");
    /// ```
    pub fn parse(path: &str) -> Result<Self> {
        if path.is_empty() {
            return Err(invalid(path, "path is empty"));
        }

        let mut steps = Vec::new();
        for segment in path.split('.') {
            let (name, mut rest) = match segment.find('[') {
                Some(pos) => (&segment[..pos], &segment[pos..]),
                None => (segment, ""),
            };

            if name.is_empty() {
                return Err(invalid(path, "empty segment"));
            }
            if name.contains(']') {
                return Err(invalid(path, "unbalanced ']'"));
            }
            steps.push(Step::Key(name.to_string()));

            while !rest.is_empty() {
                // rest always starts with '[' here
                let close = rest
                    .find(']')
                    .ok_or_else(|| invalid(path, "unclosed '['"))?;
                let digits = &rest[1..close];
                if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
                    return Err(invalid(
                        path,
                        &format!("index '{}' is not a non-negative integer", digits),
                    ));
                }
                let index = digits
                    .parse::<usize>()
                    .map_err(|e| invalid(path, &format!("index '{}': {}", digits, e)))?;
                steps.push(Step::Index(index));

                rest = &rest[close + 1..];
                if !rest.is_empty() && !rest.starts_with('[') {
                    return Err(invalid(path, "unexpected text after ']'"));
                }
            }
        }

        Ok(Self { steps })
    }

    /// The parsed steps, in traversal order.
    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    /// Number of steps.
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// True for a path with no steps, which `parse` never returns.
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Returns the key if this path is exactly one key step.
    pub fn as_single_key(&self) -> Option<&str> {
        match self.steps.as_slice() {
            [Step::Key(key)] => Some(key),
            _ => None,
        }
    }

    /// Split into the parent steps and the final step.
    pub fn split_last(&self) -> (&[Step], &Step) {
        let (last, parent) = self
            .steps
            .split_last()
            .unwrap_or_else(|| unreachable!("KeyPath is never empty"));
        (parent, last)
    }
}

impl fmt::Display for KeyPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&render_steps(&self.steps))
    }
}

/// Render a step prefix back to path syntax, for error messages.
pub fn render_steps(steps: &[Step]) -> String {
    let mut out = String::new();
    for step in steps {
        match step {
            Step::Key(key) => {
                if !out.is_empty() {
                    out.push('.');
                }
                out.push_str(key);
            }
            Step::Index(idx) => {
                out.push('[');
                out.push_str(&idx.to_string());
                out.push(']');
            }
        }
    }
    out
}

fn invalid(path: &str, message: &str) -> Error {
    Error::InvalidPathSyntax {
        path: path.to_string(),
        message: message.to_string(),
    }
}

//! JSON documents.
//!
//! Edits are made on the parsed `serde_json::Value` first. The source text is
//! then patched by splicing only the bytes of the affected member, using the
//! indentation and separators already present in the file. Every splice is
//! re-parsed and compared with the edited value; if it does not match, the
//! whole document is re-serialized with the detected indent instead.

use log::debug;
use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use serde_json::Value;

use super::splice::{indent_continuation, line_indent, splice};
use super::tree::{self, DeleteEffect, SetEffect};
use super::{Document, OutcomeReason};
use crate::config::DocumentType;
use crate::error::{Error, Result};
use crate::path::{KeyPath, Step};

#[derive(Debug, Clone)]
pub struct JsonDocument {
    source: String,
    value: Value,
}

impl JsonDocument {
    pub fn parse(content: &str) -> Result<Self> {
        let value = serde_json::from_str(content).map_err(|e| Error::DocumentParse {
            document_type: DocumentType::Json.to_string(),
            message: e.to_string(),
        })?;
        Ok(Self {
            source: content.to_string(),
            value,
        })
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    pub fn get(&self, path: &KeyPath) -> Option<&Value> {
        tree::get(&self.value, path.steps())
    }

    fn commit(&mut self, candidate: Value, spliced: Option<String>) -> Result<()> {
        let text = match spliced {
            Some(text) if reparses_to(&text, &candidate) => text,
            _ => {
                debug!("JSON splice not possible, re-serializing the whole document");
                render_whole(&self.source, &candidate)?
            }
        };
        self.source = text;
        self.value = candidate;
        Ok(())
    }
}

impl Document for JsonDocument {
    fn document_type(&self) -> DocumentType {
        DocumentType::Json
    }

    fn update_key(&mut self, path: &KeyPath, value: &Value) -> Result<OutcomeReason> {
        let mut candidate = self.value.clone();
        if tree::set(&mut candidate, path, value.clone())? == SetEffect::Unchanged {
            return Ok(OutcomeReason::ValueUnchanged);
        }
        let spliced = splice_set(&self.source, &self.value, &candidate, path)?;
        self.commit(candidate, spliced)?;
        Ok(OutcomeReason::Applied)
    }

    fn delete_key(&mut self, path: &KeyPath, expected: Option<&Value>) -> Result<OutcomeReason> {
        let mut candidate = self.value.clone();
        match tree::delete(&mut candidate, path, expected) {
            DeleteEffect::Absent => Ok(OutcomeReason::KeyAbsent),
            DeleteEffect::Mismatch => Ok(OutcomeReason::ValueMismatchSkippedDelete),
            DeleteEffect::Deleted => {
                let spliced = scan(&self.source)
                    .and_then(|root| splice_delete(&self.source, &root, path));
                self.commit(candidate, spliced)?;
                Ok(OutcomeReason::Applied)
            }
        }
    }

    fn render(&self) -> &str {
        &self.source
    }

    fn changed_from(&self, original: &str) -> bool {
        serde_json::from_str::<Value>(original).map_or(true, |value| value != self.value)
    }
}

fn reparses_to(text: &str, expected: &Value) -> bool {
    serde_json::from_str::<Value>(text).is_ok_and(|v| &v == expected)
}

////// FORMATTING //////

/// Indentation unit of a multi-line document, `None` for compact ones.
fn detect_indent(src: &str) -> Option<String> {
    src.lines().skip(1).find_map(|line| {
        let trimmed = line.trim_start_matches([' ', '\t']);
        let width = line.len() - trimmed.len();
        (width > 0 && !trimmed.is_empty()).then(|| line[..width].to_string())
    })
}

fn pretty(value: &Value, unit: &str) -> Result<String> {
    let mut buf = Vec::new();
    let mut ser =
        serde_json::Serializer::with_formatter(&mut buf, PrettyFormatter::with_indent(unit.as_bytes()));
    value.serialize(&mut ser)?;
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

/// Render `value` for a position whose line is indented by `base`.
fn render_at(value: &Value, unit: Option<&str>, base: &str) -> Result<String> {
    let structured = match value {
        Value::Array(items) => !items.is_empty(),
        Value::Object(members) => !members.is_empty(),
        _ => false,
    };
    match unit {
        Some(unit) if structured => Ok(indent_continuation(&pretty(value, unit)?, base)),
        _ => Ok(serde_json::to_string(value)?),
    }
}

fn render_whole(source: &str, value: &Value) -> Result<String> {
    let mut out = match detect_indent(source) {
        Some(unit) => pretty(value, &unit)?,
        None => serde_json::to_string(value)?,
    };
    if source.ends_with('\n') {
        out.push('\n');
    }
    Ok(out)
}

////// SPANS //////

#[derive(Debug)]
struct Span {
    start: usize,
    end: usize,
    kind: SpanKind,
}

#[derive(Debug)]
enum SpanKind {
    Scalar,
    Object(Vec<Member>),
    Array(Vec<Span>),
}

#[derive(Debug)]
struct Member {
    key: String,
    start: usize,
    key_end: usize,
    value: Span,
}

impl Span {
    fn child(&self, step: &Step) -> Option<&Span> {
        match (&self.kind, step) {
            (SpanKind::Object(members), Step::Key(key)) => {
                members.iter().rev().find(|m| &m.key == key).map(|m| &m.value)
            }
            (SpanKind::Array(items), Step::Index(index)) => items.get(*index),
            _ => None,
        }
    }

    fn locate(&self, steps: &[Step]) -> Option<&Span> {
        steps.iter().try_fold(self, |span, step| span.child(step))
    }

    /// `(start, end)` of each member or item, in source order.
    fn entries(&self) -> Vec<(usize, usize)> {
        match &self.kind {
            SpanKind::Object(members) => members.iter().map(|m| (m.start, m.value.end)).collect(),
            SpanKind::Array(items) => items.iter().map(|i| (i.start, i.end)).collect(),
            SpanKind::Scalar => Vec::new(),
        }
    }

    fn position(&self, step: &Step) -> Option<usize> {
        match (&self.kind, step) {
            (SpanKind::Object(members), Step::Key(key)) => {
                members.iter().rposition(|m| &m.key == key)
            }
            (SpanKind::Array(items), Step::Index(index)) => (*index < items.len()).then_some(*index),
            _ => None,
        }
    }

    fn first_colon<'a>(&self, src: &'a str) -> Option<&'a str> {
        match &self.kind {
            SpanKind::Object(members) => members.iter().find_map(|m| {
                src.get(m.key_end..m.value.start)
                    .or_else(|| m.value.first_colon(src))
            }),
            SpanKind::Array(items) => items.iter().find_map(|i| i.first_colon(src)),
            SpanKind::Scalar => None,
        }
    }
}

/// Locates the byte span of every value in an already-validated document.
struct Scanner<'a> {
    src: &'a str,
    pos: usize,
}

fn scan(src: &str) -> Option<Span> {
    Scanner { src, pos: 0 }.value()
}

impl Scanner<'_> {
    fn peek(&self) -> Option<u8> {
        self.src.as_bytes().get(self.pos).copied()
    }

    fn skip_ws(&mut self) {
        while matches!(self.peek(), Some(b' ' | b'\t' | b'\n' | b'\r')) {
            self.pos += 1;
        }
    }

    fn expect(&mut self, byte: u8) -> Option<()> {
        if self.peek()? != byte {
            return None;
        }
        self.pos += 1;
        Some(())
    }

    fn string(&mut self) -> Option<()> {
        self.expect(b'"')?;
        loop {
            match self.peek()? {
                b'\\' => self.pos += 2,
                b'"' => {
                    self.pos += 1;
                    return Some(());
                }
                _ => self.pos += 1,
            }
        }
    }

    fn value(&mut self) -> Option<Span> {
        self.skip_ws();
        let start = self.pos;
        let kind = match self.peek()? {
            b'{' => SpanKind::Object(self.members()?),
            b'[' => SpanKind::Array(self.items()?),
            b'"' => {
                self.string()?;
                SpanKind::Scalar
            }
            _ => {
                while let Some(b) = self.peek() {
                    if matches!(b, b',' | b'}' | b']' | b' ' | b'\t' | b'\n' | b'\r') {
                        break;
                    }
                    self.pos += 1;
                }
                if self.pos == start {
                    return None;
                }
                SpanKind::Scalar
            }
        };
        Some(Span {
            start,
            end: self.pos,
            kind,
        })
    }

    fn members(&mut self) -> Option<Vec<Member>> {
        self.expect(b'{')?;
        let mut members = Vec::new();
        self.skip_ws();
        if self.peek()? == b'}' {
            self.pos += 1;
            return Some(members);
        }
        loop {
            self.skip_ws();
            let start = self.pos;
            self.string()?;
            let key_end = self.pos;
            let key: String = serde_json::from_str(self.src.get(start..key_end)?).ok()?;
            self.skip_ws();
            self.expect(b':')?;
            let value = self.value()?;
            members.push(Member {
                key,
                start,
                key_end,
                value,
            });
            self.skip_ws();
            match self.peek()? {
                b',' => self.pos += 1,
                b'}' => {
                    self.pos += 1;
                    return Some(members);
                }
                _ => return None,
            }
        }
    }

    fn items(&mut self) -> Option<Vec<Span>> {
        self.expect(b'[')?;
        let mut items = Vec::new();
        self.skip_ws();
        if self.peek()? == b']' {
            self.pos += 1;
            return Some(items);
        }
        loop {
            items.push(self.value()?);
            self.skip_ws();
            match self.peek()? {
                b',' => self.pos += 1,
                b']' => {
                    self.pos += 1;
                    return Some(items);
                }
                _ => return None,
            }
        }
    }
}

////// SPLICES //////

/// Patch `src` so that it parses to `updated`, which is `original` with one
/// key set at `path`.
fn splice_set(src: &str, original: &Value, updated: &Value, path: &KeyPath) -> Result<Option<String>> {
    let root = match scan(src) {
        Some(root) => root,
        None => return Ok(None),
    };
    let unit = detect_indent(src);
    let steps = path.steps();

    // Shortest prefix that does not exist yet; everything before it does.
    let missing = (0..steps.len()).find(|&k| tree::get(original, &steps[..=k]).is_none());

    let (anchor, new_key) = match missing {
        None => (steps, None),
        Some(k) => match (&steps[k], tree::get(original, &steps[..k])) {
            (Step::Key(key), Some(Value::Object(_))) => (&steps[..k], Some((key, &steps[..=k]))),
            _ => (&steps[..k], None),
        },
    };
    let span = match root.locate(anchor) {
        Some(span) => span,
        None => return Ok(None),
    };

    let Some((key, member_path)) = new_key else {
        // Overwrite an existing node (or a null promoted to a mapping).
        let new_value = match tree::get(updated, anchor) {
            Some(value) => value,
            None => return Ok(None),
        };
        let text = render_at(new_value, unit.as_deref(), line_indent(src, span.start))?;
        return Ok(splice(src, span.start, span.end, &text));
    };

    let new_value = match tree::get(updated, member_path) {
        Some(value) => value,
        None => return Ok(None),
    };
    let members = match &span.kind {
        SpanKind::Object(members) => members,
        _ => return Ok(None),
    };
    let key_text = serde_json::to_string(key)?;

    let (Some(first), Some(last)) = (members.first(), members.last()) else {
        let colon = root
            .first_colon(src)
            .map(str::to_string)
            .unwrap_or_else(|| if unit.is_some() { ": " } else { ":" }.to_string());
        let base = line_indent(src, span.start);
        let text = match unit.as_deref() {
            Some(unit) => {
                let inner = format!("{base}{unit}");
                let value = render_at(new_value, Some(unit), &inner)?;
                format!("{{\n{inner}{key_text}{colon}{value}\n{base}}}")
            }
            None => format!("{{{key_text}{colon}{}}}", render_at(new_value, None, base)?),
        };
        return Ok(splice(src, span.start, span.end, &text));
    };

    // Reuse the whitespace that already separates members.
    let gap = match members.get(1) {
        Some(second) => src
            .get(first.value.end..second.start)
            .and_then(|between| between.split_once(','))
            .map(|(_, after)| after),
        None => src.get(span.start + 1..first.start),
    };
    let (gap, colon) = match (gap, src.get(last.key_end..last.value.start)) {
        (Some(gap), Some(colon)) => (gap, colon),
        _ => return Ok(None),
    };
    let member_indent = match gap.rfind('\n') {
        Some(i) => &gap[i + 1..],
        None => line_indent(src, last.start),
    };
    let value = render_at(new_value, unit.as_deref(), member_indent)?;
    let text = format!(",{gap}{key_text}{colon}{value}");
    Ok(splice(src, last.value.end, last.value.end, &text))
}

fn splice_delete(src: &str, root: &Span, path: &KeyPath) -> Option<String> {
    let (parent_steps, last) = path.split_last();
    let parent = root.locate(parent_steps)?;
    let entries = parent.entries();
    let index = parent.position(last)?;

    if entries.len() == 1 {
        let empty = match parent.kind {
            SpanKind::Object(_) => "{}",
            _ => "[]",
        };
        return splice(src, parent.start, parent.end, empty);
    }
    match entries.get(index + 1) {
        Some(next) => splice(src, entries[index].0, next.0, ""),
        None => splice(src, entries.get(index.checked_sub(1)?)?.1, entries[index].1, ""),
    }
}

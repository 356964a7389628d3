//! YAML documents.
//!
//! Like the JSON editor, edits are computed on the parsed value and then
//! spliced into the source so that comments, blank lines, key order and the
//! quoting of untouched scalars survive. The splice locations come from a
//! line-based scan of block-style YAML ([`Layout`]). Flow collections,
//! anchors and other constructs the scan does not model make the splice
//! fail verification, and the document is re-serialized with `serde_yaml`.

use log::debug;
use serde_json::Value as JsonValue;
use serde_yaml::Value;

use super::splice::{indent_continuation, line_ending, splice};
use super::tree::{self, DeleteEffect, SetEffect};
use super::{Document, OutcomeReason};
use crate::config::DocumentType;
use crate::error::{Error, Result};
use crate::path::{KeyPath, Step};

const DEFAULT_INDENT: usize = 2;

#[derive(Debug, Clone)]
pub struct YamlDocument {
    source: String,
    value: Value,
}

impl YamlDocument {
    pub fn parse(content: &str) -> Result<Self> {
        let value = serde_yaml::from_str(content).map_err(|e| Error::DocumentParse {
            document_type: DocumentType::Yaml.to_string(),
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
                debug!("YAML splice not possible, re-serializing the whole document");
                serde_yaml::to_string(&candidate)?
            }
        };
        self.source = text;
        self.value = candidate;
        Ok(())
    }
}

impl Document for YamlDocument {
    fn document_type(&self) -> DocumentType {
        DocumentType::Yaml
    }

    fn update_key(&mut self, path: &KeyPath, value: &JsonValue) -> Result<OutcomeReason> {
        let value = serde_yaml::to_value(value)?;
        let mut candidate = self.value.clone();
        if tree::set(&mut candidate, path, value)? == SetEffect::Unchanged {
            return Ok(OutcomeReason::ValueUnchanged);
        }
        let spliced = Layout::scan(&self.source)
            .and_then(|layout| layout.splice_set(&self.value, &candidate, path));
        self.commit(candidate, spliced)?;
        Ok(OutcomeReason::Applied)
    }

    fn delete_key(&mut self, path: &KeyPath, expected: Option<&JsonValue>) -> Result<OutcomeReason> {
        let expected = expected.map(serde_yaml::to_value).transpose()?;
        let mut candidate = self.value.clone();
        match tree::delete(&mut candidate, path, expected.as_ref()) {
            DeleteEffect::Absent => Ok(OutcomeReason::KeyAbsent),
            DeleteEffect::Mismatch => Ok(OutcomeReason::ValueMismatchSkippedDelete),
            DeleteEffect::Deleted => {
                let spliced = Layout::scan(&self.source)
                    .and_then(|layout| layout.splice_delete(&candidate, path));
                self.commit(candidate, spliced)?;
                Ok(OutcomeReason::Applied)
            }
        }
    }

    fn render(&self) -> &str {
        &self.source
    }

    fn changed_from(&self, original: &str) -> bool {
        serde_yaml::from_str::<Value>(original).map_or(true, |value| value != self.value)
    }
}

fn reparses_to(text: &str, expected: &Value) -> bool {
    serde_yaml::from_str::<Value>(text).is_ok_and(|v| &v == expected)
}

////// RENDERING //////

fn is_structured(value: &Value) -> bool {
    match value {
        Value::Mapping(map) => !map.is_empty(),
        Value::Sequence(items) => !items.is_empty(),
        _ => false,
    }
}

/// Render a scalar (or empty collection) for an inline position, keeping
/// the quote style of the value it replaces.
fn scalar_repr(value: &Value, quote: Option<char>) -> Option<String> {
    if let Value::String(s) = value {
        if !s.contains('\n') {
            match quote {
                Some('"') => return serde_json::to_string(s).ok(),
                Some('\'') => return Some(format!("'{}'", s.replace('\'', "''"))),
                _ => {}
            }
        }
    }
    block_repr(value)
}

fn block_repr(value: &Value) -> Option<String> {
    let text = serde_yaml::to_string(value).ok()?;
    Some(text.trim_end_matches('\n').to_string())
}

fn spaces(n: usize) -> String {
    " ".repeat(n)
}

////// LAYOUT //////

#[derive(Debug, Clone, Copy)]
struct Line {
    start: usize,
    content_end: usize,
    end: usize,
}

/// Where a node's content begins. Lines whose first content follows a
/// `- ` on the same line get a slot at the content column.
#[derive(Debug, Clone, Copy)]
struct Slot {
    line: usize,
    col: usize,
    start: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BlockKind {
    Map,
    Seq,
}

#[derive(Debug)]
struct Block {
    kind: BlockKind,
    col: usize,
    entries: Vec<Entry>,
}

#[derive(Debug)]
struct Entry {
    /// Mapping key; `None` for sequence items
    key: Option<String>,
    slot: Slot,
    /// Offset just past the `:` or `-` indicator
    after: usize,
    last_line: usize,
    value: ValueLoc,
}

#[derive(Debug)]
enum ValueLoc {
    Inline {
        start: usize,
        end: usize,
        quote: Option<char>,
    },
    Nested(Block),
    Empty,
}

struct Layout<'a> {
    src: &'a str,
    lines: Vec<Line>,
    root: Option<Block>,
    unit: usize,
    eol: &'static str,
}

impl<'a> Layout<'a> {
    fn scan(src: &'a str) -> Option<Self> {
        let mut lines = Vec::new();
        let mut slots = Vec::new();
        let mut offset = 0;

        for raw in src.split_inclusive('\n') {
            let start = offset;
            offset += raw.len();
            let content = raw.trim_end_matches(['\n', '\r']);
            let line = lines.len();
            lines.push(Line {
                start,
                content_end: start + content.len(),
                end: offset,
            });

            let trimmed = content.trim_start_matches(' ');
            if trimmed.trim().is_empty() || trimmed.starts_with('#') {
                continue;
            }
            if content == "---" || content == "..." || content.starts_with('%') {
                continue;
            }
            if content.starts_with("--- ") || content.starts_with("... ") {
                return None;
            }
            let col = content.len() - trimmed.len();
            slots.push(Slot {
                line,
                col,
                start: start + col,
            });
        }

        let mut layout = Self {
            src,
            lines,
            root: None,
            unit: DEFAULT_INDENT,
            eol: line_ending(src),
        };
        if !slots.is_empty() {
            let root = layout.parse_block(&slots)?;
            layout.unit = root.indent_unit().unwrap_or(DEFAULT_INDENT);
            layout.root = Some(root);
        }
        Some(layout)
    }

    /// `text` with its line breaks in the source's line ending.
    fn native(&self, text: String) -> String {
        if self.eol == "\n" {
            text
        } else {
            text.replace('\n', self.eol)
        }
    }

    fn text(&self, slot: &Slot) -> &'a str {
        let end = self.lines[slot.line].content_end;
        self.src.get(slot.start..end).unwrap_or("")
    }

    fn is_synthetic(&self, slot: &Slot) -> bool {
        let line_start = self.lines[slot.line].start;
        self.src
            .get(line_start..slot.start)
            .map_or(true, |lead| !lead.trim().is_empty())
    }

    fn parse_block(&self, slots: &[Slot]) -> Option<Block> {
        let first = slots.first()?;
        let col = first.col;
        let kind = if is_dash(self.text(first)) {
            BlockKind::Seq
        } else {
            BlockKind::Map
        };

        let mut entries = Vec::new();
        let mut rest = slots;
        while let Some((slot, tail)) = rest.split_first() {
            if slot.col != col {
                return None;
            }
            let (entry, used) = match kind {
                BlockKind::Map => self.parse_map_entry(*slot, tail)?,
                BlockKind::Seq if is_dash(self.text(slot)) => self.parse_seq_item(*slot, tail)?,
                BlockKind::Seq => return None,
            };
            entries.push(entry);
            rest = &tail[used..];
        }
        Some(Block { kind, col, entries })
    }

    fn parse_map_entry(&self, slot: Slot, tail: &[Slot]) -> Option<(Entry, usize)> {
        let line = self.lines[slot.line];
        let (key, key_len) = split_key(self.text(&slot))?;
        let after = slot.start + key_len;
        let value_text = self.src.get(after..line.content_end)?;
        let trimmed = value_text.trim_start();
        let inline = !trimmed.is_empty() && !trimmed.starts_with('#');

        // Children are deeper lines, or same-column `- ` lines for an
        // indentless sequence.
        let used = tail
            .iter()
            .take_while(|s| {
                s.col > slot.col || (!inline && s.col == slot.col && is_dash(self.text(s)))
            })
            .count();
        let children = &tail[..used];
        let last_line = children.last().map_or(slot.line, |s| s.line);

        let value = if inline {
            let start = after + (value_text.len() - trimmed.len());
            self.inline(start, trimmed, children.is_empty(), last_line)
        } else if children.is_empty() {
            ValueLoc::Empty
        } else {
            ValueLoc::Nested(self.parse_block(children)?)
        };

        let entry = Entry {
            key: Some(key),
            slot,
            after,
            last_line,
            value,
        };
        Some((entry, used))
    }

    fn parse_seq_item(&self, slot: Slot, tail: &[Slot]) -> Option<(Entry, usize)> {
        let line = self.lines[slot.line];
        let after = slot.start + 1;
        let rest = self.src.get(after..line.content_end)?;
        let trimmed = rest.trim_start();

        let used = tail.iter().take_while(|s| s.col > slot.col).count();
        let children = &tail[..used];
        let last_line = children.last().map_or(slot.line, |s| s.line);

        let value = if trimmed.is_empty() || trimmed.starts_with('#') {
            if children.is_empty() {
                ValueLoc::Empty
            } else {
                ValueLoc::Nested(self.parse_block(children)?)
            }
        } else {
            let start = after + (rest.len() - trimmed.len());
            if is_dash(trimmed) || split_key(trimmed).is_some() {
                let mut slots = vec![Slot {
                    line: slot.line,
                    col: slot.col + (start - slot.start),
                    start,
                }];
                slots.extend_from_slice(children);
                ValueLoc::Nested(self.parse_block(&slots)?)
            } else {
                self.inline(start, trimmed, children.is_empty(), last_line)
            }
        };

        let entry = Entry {
            key: None,
            slot,
            after,
            last_line,
            value,
        };
        Some((entry, used))
    }

    /// An inline value starting at `start`. Values continued on deeper lines
    /// (block scalars, folded plain scalars) run to the end of `last_line`.
    fn inline(&self, start: usize, text: &str, single_line: bool, last_line: usize) -> ValueLoc {
        let end = if single_line {
            start + inline_len(text)
        } else {
            self.lines[last_line].content_end
        };
        ValueLoc::Inline {
            start,
            end,
            quote: text.chars().next().filter(|c| matches!(c, '"' | '\'')),
        }
    }

    fn entry(&self, steps: &[Step]) -> Option<&Entry> {
        let mut block = self.root.as_ref()?;
        let (last, parents) = steps.split_last()?;
        for step in parents {
            block = match &block.find(step)?.value {
                ValueLoc::Nested(child) => child,
                _ => return None,
            };
        }
        block.find(last)
    }

    fn block_at(&self, steps: &[Step]) -> Option<&Block> {
        if steps.is_empty() {
            return self.root.as_ref();
        }
        match &self.entry(steps)?.value {
            ValueLoc::Nested(block) => Some(block),
            _ => None,
        }
    }

    ////// SPLICES //////

    fn splice_set(&self, original: &Value, updated: &Value, path: &KeyPath) -> Option<String> {
        let steps = path.steps();
        let missing = (0..steps.len()).find(|&k| tree::get(original, &steps[..=k]).is_none());
        match missing {
            None => self.replace_value(steps, tree::get(updated, steps)?),
            Some(k) => {
                let prefix = &steps[..k];
                let parent_is_map = tree::get(original, prefix).is_some_and(Value::is_mapping);
                match &steps[k] {
                    Step::Key(key) if parent_is_map => self
                        .insert_member(prefix, key, tree::get(updated, &steps[..=k])?)
                        // `key: {}` has no block to append to
                        .or_else(|| self.replace_value(prefix, tree::get(updated, prefix)?)),
                    _ => self.replace_value(prefix, tree::get(updated, prefix)?),
                }
            }
        }
    }

    fn splice_delete(&self, updated: &Value, path: &KeyPath) -> Option<String> {
        let (parent_steps, last) = path.split_last();
        let block = self.block_at(parent_steps)?;
        let entry = block.find(last)?;

        if block.entries.len() == 1 {
            return self.replace_value(parent_steps, tree::get(updated, parent_steps)?);
        }
        if self.is_synthetic(&entry.slot) {
            // First member on a `- ` line: pull the next sibling up onto it.
            let next = block
                .entries
                .iter()
                .find(|e| e.slot.start > entry.slot.start)?;
            return splice(self.src, entry.slot.start, next.slot.start, "");
        }
        let start = self.lines[entry.slot.line].start;
        let end = self.lines[entry.last_line];
        if end.end == end.content_end && start > 0 {
            // Last line without a newline: take the preceding one instead.
            splice(self.src, start - 1, end.end, "")
        } else {
            splice(self.src, start, end.end, "")
        }
    }

    fn replace_value(&self, steps: &[Step], new: &Value) -> Option<String> {
        if steps.is_empty() {
            return self.replace_root(new);
        }
        let entry = self.entry(steps)?;
        let col = entry.slot.col;
        let line_end = self.lines[entry.last_line].content_end;

        if !is_structured(new) {
            let quote = match entry.value {
                ValueLoc::Inline { quote, .. } => quote,
                _ => None,
            };
            let repr = self.native(indent_continuation(&scalar_repr(new, quote)?, &spaces(col)));
            return match &entry.value {
                ValueLoc::Inline { start, end, .. } => splice(self.src, *start, *end, &repr),
                ValueLoc::Empty => splice(self.src, entry.after, entry.after, &format!(" {repr}")),
                ValueLoc::Nested(_) => splice(self.src, entry.after, line_end, &format!(" {repr}")),
            };
        }

        let block = block_repr(new)?;
        let text = if entry.key.is_none() {
            format!(" {}", indent_continuation(&block, &spaces(col + 2)))
        } else {
            // A comment after an inline value stays on the key line.
            let comment = match &entry.value {
                ValueLoc::Inline { end, .. } => self.src.get(*end..line_end)?,
                _ => "",
            };
            let comment = if comment.trim().is_empty() { "" } else { comment };
            let child = spaces(col + self.unit);
            format!("{comment}\n{child}{}", indent_continuation(&block, &child))
        };
        splice(self.src, entry.after, line_end, &self.native(text))
    }

    fn replace_root(&self, new: &Value) -> Option<String> {
        let rendered = block_repr(new)?;
        match &self.root {
            None => {
                let mut out = self.src.to_string();
                if !out.is_empty() && !out.ends_with('\n') {
                    out.push_str(self.eol);
                }
                out.push_str(&self.native(rendered));
                out.push_str(self.eol);
                Some(out)
            }
            Some(root) => {
                let first = root.entries.first()?;
                let last = root.entries.last()?;
                let start = self.lines[first.slot.line].start;
                let end = self.lines[last.last_line].content_end;
                splice(self.src, start, end, &self.native(rendered))
            }
        }
    }

    fn insert_member(&self, prefix: &[Step], key: &str, new: &Value) -> Option<String> {
        let block = self.block_at(prefix).filter(|b| b.kind == BlockKind::Map)?;
        let last = block.entries.last()?;
        let pos = self.lines[last.last_line].content_end;

        let indent = spaces(block.col);
        let key_repr = scalar_repr(&Value::String(key.to_string()), None)?;
        if key_repr.contains('\n') {
            return None;
        }
        let value_part = if is_structured(new) {
            let child = spaces(block.col + self.unit);
            format!(":\n{child}{}", indent_continuation(&block_repr(new)?, &child))
        } else {
            format!(": {}", indent_continuation(&scalar_repr(new, None)?, &indent))
        };
        let text = self.native(format!("\n{indent}{key_repr}{value_part}"));
        splice(self.src, pos, pos, &text)
    }
}

impl Block {
    fn find(&self, step: &Step) -> Option<&Entry> {
        match (self.kind, step) {
            (BlockKind::Map, Step::Key(key)) => self
                .entries
                .iter()
                .rev()
                .find(|e| e.key.as_deref() == Some(key.as_str())),
            (BlockKind::Seq, Step::Index(index)) => self.entries.get(*index),
            _ => None,
        }
    }

    /// Indentation step between a mapping key and its nested block.
    fn indent_unit(&self) -> Option<usize> {
        self.entries.iter().find_map(|e| match &e.value {
            ValueLoc::Nested(child) if self.kind == BlockKind::Map && child.col > e.slot.col => {
                Some(child.col - e.slot.col)
            }
            ValueLoc::Nested(child) => child.indent_unit(),
            _ => None,
        })
    }
}

fn is_dash(text: &str) -> bool {
    text == "-" || text.starts_with("- ") || text.starts_with("-\t")
}

/// Split a block mapping line into its key and the length through `:`.
fn split_key(text: &str) -> Option<(String, usize)> {
    let (key, key_end) = match text.chars().next()? {
        '"' => {
            let close = closing_double(text)?;
            (serde_yaml::from_str::<String>(&text[..=close]).ok()?, close + 1)
        }
        '\'' => {
            let close = closing_single(text)?;
            (text[1..close].replace("''", "'"), close + 1)
        }
        '[' | '{' | '?' | '&' | '*' | '!' | '|' | '>' | '%' | '@' | '`' | '#' | ':' => return None,
        _ => {
            let colon = plain_indicator(text)?;
            (text[..colon].trim_end().to_string(), colon)
        }
    };

    let after_key = &text[key_end..];
    let ws = after_key.len() - after_key.trim_start_matches([' ', '\t']).len();
    let after_colon = after_key[ws..].strip_prefix(':')?;
    if !(after_colon.is_empty() || after_colon.starts_with([' ', '\t'])) {
        return None;
    }
    Some((key, key_end + ws + 1))
}

/// Position of the `:` ending a plain key, stopping at a comment.
fn plain_indicator(text: &str) -> Option<usize> {
    let bytes = text.as_bytes();
    for (i, &b) in bytes.iter().enumerate() {
        let prev_ws = i > 0 && matches!(bytes[i - 1], b' ' | b'\t');
        if b == b'#' && prev_ws {
            return None;
        }
        if b == b':' && matches!(bytes.get(i + 1), None | Some(b' ' | b'\t')) {
            return Some(i);
        }
    }
    None
}

fn closing_double(text: &str) -> Option<usize> {
    let bytes = text.as_bytes();
    let mut i = 1;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 2,
            b'"' => return Some(i),
            _ => i += 1,
        }
    }
    None
}

fn closing_single(text: &str) -> Option<usize> {
    let bytes = text.as_bytes();
    let mut i = 1;
    while i < bytes.len() {
        if bytes[i] == b'\'' {
            if bytes.get(i + 1) == Some(&b'\'') {
                i += 2;
                continue;
            }
            return Some(i);
        }
        i += 1;
    }
    None
}

/// Byte length of a one-line value, without a trailing comment.
fn inline_len(text: &str) -> usize {
    let quoted = match text.chars().next() {
        Some('"') => closing_double(text),
        Some('\'') => closing_single(text),
        _ => None,
    };
    if let Some(close) = quoted {
        return close + 1;
    }
    let bytes = text.as_bytes();
    let end = (1..bytes.len())
        .find(|&i| bytes[i] == b'#' && matches!(bytes[i - 1], b' ' | b'\t'))
        .unwrap_or(text.len());
    text[..end].trim_end().len()
}

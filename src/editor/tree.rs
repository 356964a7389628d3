//! Path navigation shared by the JSON and YAML editors.
//!
//! Both editors work on a parsed value tree (`serde_json::Value`,
//! `serde_yaml::Value`). The [`Node`] trait captures the handful of mapping
//! and sequence operations the key-path algorithms need, so `get`, `set` and
//! `delete` are written once.

use serde_json::Value as JsonValue;
use serde_yaml::Value as YamlValue;

use crate::error::{Error, Result};
use crate::path::{render_steps, KeyPath, Step};

/// A mapping/sequence value tree that key paths can walk.
pub(crate) trait Node: Clone + PartialEq {
    /// Human-readable type name for error messages.
    fn kind(&self) -> &'static str;
    fn is_null(&self) -> bool;
    fn is_map(&self) -> bool;
    fn empty_map() -> Self;

    fn child(&self, step: &Step) -> Option<&Self>;
    fn child_mut(&mut self, step: &Step) -> Option<&mut Self>;

    /// Mapping member, inserting an empty mapping when the key is missing.
    /// `None` when `self` is not a mapping.
    fn map_entry(&mut self, key: &str) -> Option<&mut Self>;
    /// Insert or overwrite a mapping member, keeping the position of an
    /// existing key.
    fn map_insert(&mut self, key: &str, value: Self);
    /// Remove a mapping member, keeping the order of the others.
    fn map_remove(&mut self, key: &str) -> Option<Self>;

    fn seq_len(&self) -> Option<usize>;
    fn seq_remove(&mut self, index: usize) -> Option<Self>;
}

/// What a successful `set` did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SetEffect {
    /// The value was already there
    Unchanged,
    /// An existing value was overwritten
    Updated,
    /// A new key was created (possibly with intermediate mappings)
    Inserted,
}

/// What a `delete` did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum DeleteEffect {
    Deleted,
    Absent,
    Mismatch,
}

pub(crate) fn get<'a, N: Node>(root: &'a N, steps: &[Step]) -> Option<&'a N> {
    let mut current = root;
    for step in steps {
        current = current.child(step)?;
    }
    Some(current)
}

fn get_mut<'a, N: Node>(root: &'a mut N, steps: &[Step]) -> Option<&'a mut N> {
    let mut current = root;
    for step in steps {
        current = current.child_mut(step)?;
    }
    Some(current)
}

/// Set `value` at `path`.
///
/// Missing mapping keys are created, `null` nodes met by a key step become
/// mappings. Sequences are never extended. On error `root` is untouched.
pub(crate) fn set<N: Node>(root: &mut N, path: &KeyPath, value: N) -> Result<SetEffect> {
    if get(root, path.steps()) == Some(&value) {
        return Ok(SetEffect::Unchanged);
    }

    let mut candidate = root.clone();
    let effect = set_in(&mut candidate, path, value)?;
    *root = candidate;
    Ok(effect)
}

fn set_in<N: Node>(root: &mut N, path: &KeyPath, value: N) -> Result<SetEffect> {
    let steps = path.steps();
    let (parent_steps, last) = path.split_last();
    let mut current = root;

    for (depth, step) in parent_steps.iter().enumerate() {
        current = descend(current, step, &steps[..=depth], &steps[..depth])?;
    }

    match last {
        Step::Key(key) => {
            if current.is_null() {
                *current = N::empty_map();
            }
            if !current.is_map() {
                return Err(mismatch(parent_steps, "mapping", current));
            }
            let existed = current.child(last).is_some();
            current.map_insert(key, value);
            Ok(if existed {
                SetEffect::Updated
            } else {
                SetEffect::Inserted
            })
        }
        Step::Index(index) => {
            let len = current
                .seq_len()
                .ok_or_else(|| mismatch(parent_steps, "sequence", current))?;
            let slot = current
                .child_mut(last)
                .ok_or_else(|| Error::ArrayIndexOutOfRange {
                    path: path.to_string(),
                    index: *index,
                    len,
                })?;
            *slot = value;
            Ok(SetEffect::Updated)
        }
    }
}

fn descend<'a, N: Node>(
    current: &'a mut N,
    step: &Step,
    through: &[Step],
    at: &[Step],
) -> Result<&'a mut N> {
    match step {
        Step::Key(key) => {
            if current.is_null() {
                *current = N::empty_map();
            }
            let kind = current.kind();
            current.map_entry(key).ok_or_else(|| Error::TypeMismatch {
                path: render_steps(at),
                expected: "mapping",
                found: kind,
            })
        }
        Step::Index(index) => {
            let kind = current.kind();
            let len = current.seq_len().ok_or_else(|| Error::TypeMismatch {
                path: render_steps(at),
                expected: "sequence",
                found: kind,
            })?;
            current
                .child_mut(step)
                .ok_or_else(|| Error::ArrayIndexOutOfRange {
                    path: render_steps(through),
                    index: *index,
                    len,
                })
        }
    }
}

/// Delete the node at `path`, optionally only when it equals `expected`.
pub(crate) fn delete<N: Node>(root: &mut N, path: &KeyPath, expected: Option<&N>) -> DeleteEffect {
    let current = match get(root, path.steps()) {
        Some(current) => current,
        None => return DeleteEffect::Absent,
    };
    if let Some(expected) = expected {
        if current != expected {
            return DeleteEffect::Mismatch;
        }
    }

    let (parent_steps, last) = path.split_last();
    let removed = get_mut(root, parent_steps).and_then(|parent| match last {
        Step::Key(key) => parent.map_remove(key),
        Step::Index(index) => parent.seq_remove(*index),
    });
    match removed {
        Some(_) => DeleteEffect::Deleted,
        None => DeleteEffect::Absent,
    }
}

fn mismatch<N: Node>(at: &[Step], expected: &'static str, found: &N) -> Error {
    Error::TypeMismatch {
        path: render_steps(at),
        expected,
        found: found.kind(),
    }
}

impl Node for JsonValue {
    fn kind(&self) -> &'static str {
        match self {
            JsonValue::Null => "null",
            JsonValue::Bool(_) => "bool",
            JsonValue::Number(_) => "number",
            JsonValue::String(_) => "string",
            JsonValue::Array(_) => "sequence",
            JsonValue::Object(_) => "mapping",
        }
    }

    fn is_null(&self) -> bool {
        self.is_null()
    }

    fn is_map(&self) -> bool {
        self.is_object()
    }

    fn empty_map() -> Self {
        JsonValue::Object(serde_json::Map::new())
    }

    fn child(&self, step: &Step) -> Option<&Self> {
        match (self, step) {
            (JsonValue::Object(map), Step::Key(key)) => map.get(key),
            (JsonValue::Array(items), Step::Index(index)) => items.get(*index),
            _ => None,
        }
    }

    fn child_mut(&mut self, step: &Step) -> Option<&mut Self> {
        match (self, step) {
            (JsonValue::Object(map), Step::Key(key)) => map.get_mut(key),
            (JsonValue::Array(items), Step::Index(index)) => items.get_mut(*index),
            _ => None,
        }
    }

    fn map_entry(&mut self, key: &str) -> Option<&mut Self> {
        match self {
            JsonValue::Object(map) => Some(map.entry(key).or_insert_with(Self::empty_map)),
            _ => None,
        }
    }

    fn map_insert(&mut self, key: &str, value: Self) {
        if let JsonValue::Object(map) = self {
            map.insert(key.to_string(), value);
        }
    }

    fn map_remove(&mut self, key: &str) -> Option<Self> {
        match self {
            JsonValue::Object(map) => map.shift_remove(key),
            _ => None,
        }
    }

    fn seq_len(&self) -> Option<usize> {
        self.as_array().map(Vec::len)
    }

    fn seq_remove(&mut self, index: usize) -> Option<Self> {
        match self {
            JsonValue::Array(items) if index < items.len() => Some(items.remove(index)),
            _ => None,
        }
    }
}

/// YAML mapping keys are matched by their scalar text, so `1: x` is
/// reachable as `1`.
fn yaml_key_matches(candidate: &YamlValue, key: &str) -> bool {
    match candidate {
        YamlValue::String(s) => s == key,
        YamlValue::Number(n) => n.to_string() == key,
        YamlValue::Bool(b) => b.to_string() == key,
        _ => false,
    }
}

impl Node for YamlValue {
    fn kind(&self) -> &'static str {
        match self {
            YamlValue::Null => "null",
            YamlValue::Bool(_) => "bool",
            YamlValue::Number(_) => "number",
            YamlValue::String(_) => "string",
            YamlValue::Sequence(_) => "sequence",
            YamlValue::Mapping(_) => "mapping",
            YamlValue::Tagged(_) => "tagged value",
        }
    }

    fn is_null(&self) -> bool {
        self.is_null()
    }

    fn is_map(&self) -> bool {
        self.is_mapping()
    }

    fn empty_map() -> Self {
        YamlValue::Mapping(serde_yaml::Mapping::new())
    }

    fn child(&self, step: &Step) -> Option<&Self> {
        match (self, step) {
            (YamlValue::Mapping(map), Step::Key(key)) => map
                .iter()
                .find(|(k, _)| yaml_key_matches(k, key))
                .map(|(_, v)| v),
            (YamlValue::Sequence(items), Step::Index(index)) => items.get(*index),
            _ => None,
        }
    }

    fn child_mut(&mut self, step: &Step) -> Option<&mut Self> {
        match (self, step) {
            (YamlValue::Mapping(map), Step::Key(key)) => map
                .iter_mut()
                .find(|(k, _)| yaml_key_matches(k, key))
                .map(|(_, v)| v),
            (YamlValue::Sequence(items), Step::Index(index)) => items.get_mut(*index),
            _ => None,
        }
    }

    fn map_entry(&mut self, key: &str) -> Option<&mut Self> {
        if !self.is_mapping() {
            return None;
        }
        let step = Step::Key(key.to_string());
        if self.child(&step).is_none() {
            self.map_insert(key, Self::empty_map());
        }
        self.child_mut(&step)
    }

    fn map_insert(&mut self, key: &str, value: Self) {
        if let Some(existing) = self.child_mut(&Step::Key(key.to_string())) {
            *existing = value;
        } else if let YamlValue::Mapping(map) = self {
            map.insert(YamlValue::String(key.to_string()), value);
        }
    }

    fn map_remove(&mut self, key: &str) -> Option<Self> {
        let map = match self {
            YamlValue::Mapping(map) => map,
            _ => return None,
        };
        let mut removed = None;
        let kept: serde_yaml::Mapping = std::mem::take(map)
            .into_iter()
            .filter_map(|(k, v)| {
                if removed.is_none() && yaml_key_matches(&k, key) {
                    removed = Some(v);
                    None
                } else {
                    Some((k, v))
                }
            })
            .collect();
        *map = kept;
        removed
    }

    fn seq_len(&self) -> Option<usize> {
        self.as_sequence().map(Vec::len)
    }

    fn seq_remove(&mut self, index: usize) -> Option<Self> {
        match self {
            YamlValue::Sequence(items) if index < items.len() => Some(items.remove(index)),
            _ => None,
        }
    }
}

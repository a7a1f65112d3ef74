//! Dot/bracket path addressing over nested JSON records.
//!
//! Paths are written `personal.firstName` or `pensions[2].provider`; the
//! bracket form is sugar for the all-dot form (`pensions.2.provider`). A
//! segment made only of ASCII digits is an array index, anything else is an
//! object key.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Errors raised when parsing or writing through a path.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PathError {
    #[error("Invalid path '{path}': {reason}")]
    InvalidPath { path: String, reason: String },

    #[error("Path conflict writing '{path}': '{at}' holds a {found}")]
    PathConflict {
        path: String,
        at: String,
        found: &'static str,
    },
}

impl PathError {
    /// The target of `path` already holds `found`, which the write may not replace.
    pub(crate) fn occupied(path: &FieldPath, found: &Value) -> Self {
        conflict(path, path.segments().len(), found)
    }

    fn invalid(path: &str, reason: impl Into<String>) -> Self {
        PathError::InvalidPath {
            path: path.to_string(),
            reason: reason.into(),
        }
    }
}

/// One step of a path.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PathSegment {
    Key(String),
    Index(usize),
}

impl PathSegment {
    /// The segment as an object key. Indices become their decimal form.
    pub fn as_key(&self) -> String {
        match self {
            PathSegment::Key(k) => k.clone(),
            PathSegment::Index(i) => i.to_string(),
        }
    }

    pub fn is_index(&self) -> bool {
        matches!(self, PathSegment::Index(_))
    }
}

/// A parsed, normalized field path.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct FieldPath {
    segments: Vec<PathSegment>,
}

impl FieldPath {
    /// The empty path, addressing the root.
    pub fn root() -> Self {
        Self::default()
    }

    /// Parses `a.b[0].c` (or the equivalent `a.b.0.c`).
    pub fn parse(raw: &str) -> Result<Self, PathError> {
        let normalized = raw.replace('[', ".").replace(']', "");
        if normalized.trim().is_empty() {
            return Err(PathError::invalid(raw, "path is empty"));
        }

        let mut segments = Vec::new();
        for part in normalized.split('.') {
            if part.is_empty() {
                return Err(PathError::invalid(raw, "empty segment"));
            }
            if part.bytes().all(|b| b.is_ascii_digit()) {
                let index = part
                    .parse::<usize>()
                    .map_err(|_| PathError::invalid(raw, format!("index '{}' out of range", part)))?;
                segments.push(PathSegment::Index(index));
            } else {
                segments.push(PathSegment::Key(part.to_string()));
            }
        }
        Ok(Self { segments })
    }

    /// Returns a new path with a key appended.
    pub fn key(&self, key: impl Into<String>) -> Self {
        let mut next = self.clone();
        next.segments.push(PathSegment::Key(key.into()));
        next
    }

    /// Returns a new path with an array index appended.
    pub fn index(&self, index: usize) -> Self {
        let mut next = self.clone();
        next.segments.push(PathSegment::Index(index));
        next
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    /// Splits off the first segment.
    pub fn split_first(&self) -> Option<(&PathSegment, FieldPath)> {
        let (first, rest) = self.segments.split_first()?;
        Some((first, FieldPath { segments: rest.to_vec() }))
    }

    /// The path made of the first `len` segments.
    pub fn prefix(&self, len: usize) -> Self {
        Self {
            segments: self.segments[..len.min(self.segments.len())].to_vec(),
        }
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.segments.iter().enumerate() {
            match segment {
                PathSegment::Key(k) if i == 0 => write!(f, "{}", k)?,
                PathSegment::Key(k) => write!(f, ".{}", k)?,
                PathSegment::Index(idx) => write!(f, "[{}]", idx)?,
            }
        }
        Ok(())
    }
}

impl FromStr for FieldPath {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for FieldPath {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for FieldPath {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}

/// Resolves `path` inside `root`.
///
/// Returns `None` as soon as any segment is missing or addresses the wrong
/// kind of value; traversal never fails loudly.
pub fn resolve_path<'a>(root: &'a Value, path: &FieldPath) -> Option<&'a Value> {
    let mut current = root;
    for segment in path.segments() {
        current = match (current, segment) {
            (Value::Object(map), seg) => map.get(&seg.as_key())?,
            (Value::Array(items), PathSegment::Index(i)) => items.get(*i)?,
            _ => return None,
        };
    }
    Some(current)
}

/// Writes `value` at `path`, creating missing intermediates.
///
/// A missing (or `null`) intermediate becomes an array when the following
/// segment is an index and an object otherwise. Arrays are padded with
/// `null` up to the requested index.
///
/// Descending into a string, number or boolean, or addressing an array with
/// a non-index key, fails with [`PathError::PathConflict`]. So does
/// replacing a non-empty object or array with a value of another shape.
/// Creation only starts once the walk has left existing data, so a failed
/// write leaves `root` unchanged.
pub fn set_path(root: &mut Value, path: &FieldPath, value: Value) -> Result<(), PathError> {
    let segments = path.segments();
    let Some((last, parents)) = segments.split_last() else {
        return Err(PathError::invalid("", "cannot replace the root"));
    };

    let mut current = root;
    for (depth, segment) in parents.iter().enumerate() {
        let next = &segments[depth + 1];
        current = descend(current, segment, next, path, depth)?;
    }

    let depth = parents.len();
    if current.is_null() {
        *current = empty_container_for(last);
    }
    let existing = match (&*current, last) {
        (Value::Object(map), seg) => map.get(&seg.as_key()),
        (Value::Array(items), PathSegment::Index(i)) => items.get(*i),
        _ => None,
    };
    if let Some(existing) = existing.filter(|e| changes_container_shape(e, &value)) {
        return Err(PathError::occupied(path, existing));
    }
    match (current, last) {
        (Value::Object(map), seg) => {
            map.insert(seg.as_key(), value);
            Ok(())
        }
        (Value::Array(items), PathSegment::Index(i)) => {
            if items.len() <= *i {
                items.resize(*i + 1, Value::Null);
            }
            items[*i] = value;
            Ok(())
        }
        (other, _) => Err(conflict(path, depth, other)),
    }
}

fn descend<'a>(
    current: &'a mut Value,
    segment: &PathSegment,
    next: &PathSegment,
    path: &FieldPath,
    depth: usize,
) -> Result<&'a mut Value, PathError> {
    if current.is_null() {
        *current = empty_container_for(segment);
    }
    let child = match (current, segment) {
        (Value::Object(map), seg) => map.entry(seg.as_key()).or_insert(Value::Null),
        (Value::Array(items), PathSegment::Index(i)) => {
            if items.len() <= *i {
                items.resize(*i + 1, Value::Null);
            }
            &mut items[*i]
        }
        (other, _) => return Err(conflict(path, depth, other)),
    };
    if child.is_null() {
        *child = empty_container_for(next);
    }
    Ok(child)
}

fn changes_container_shape(existing: &Value, value: &Value) -> bool {
    match existing {
        Value::Object(map) if !map.is_empty() => !value.is_object(),
        Value::Array(items) if !items.is_empty() => !value.is_array(),
        _ => false,
    }
}

fn empty_container_for(segment: &PathSegment) -> Value {
    if segment.is_index() {
        Value::Array(Vec::new())
    } else {
        Value::Object(Map::new())
    }
}

fn conflict(path: &FieldPath, depth: usize, found: &Value) -> PathError {
    PathError::PathConflict {
        path: path.to_string(),
        at: path.prefix(depth).to_string(),
        found: kind_of(found),
    }
}

pub(crate) fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

//! The extraction tree: a confidence-annotated mirror of a client record.
//!
//! Shape is decided once, when the extractor's JSON is converted. After that
//! every consumer matches on the variant instead of probing for `value` and
//! `confidence` keys.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use thiserror::Error;

use super::confidence::{Confidence, ConfidenceValue};
use super::path::{kind_of, FieldPath, PathSegment};

/// Errors raised when converting extractor output into a tree.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TreeError {
    #[error("Extraction root must be an object, got {0}")]
    RootNotObject(&'static str),
}

/// Recursive confidence-annotated structure.
#[derive(Debug, Clone, PartialEq)]
pub enum ExtractionTree {
    /// A single extracted fact, or `None` when the extractor returned `null`.
    Leaf(Option<ConfidenceValue>),
    /// A nested group of named fields.
    Node(BTreeMap<String, ExtractionTree>),
    /// One sub-tree per detected array item (one per pension, and so on).
    List(Vec<ExtractionTree>),
}

/// A populated leaf together with its address.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractedLeaf<'a> {
    pub path: FieldPath,
    pub value: &'a ConfidenceValue,
}

impl ExtractionTree {
    /// An empty node.
    pub fn empty() -> Self {
        ExtractionTree::Node(BTreeMap::new())
    }

    /// Converts extractor JSON into a tree. The root must be an object.
    ///
    /// An object is a leaf when it carries a `value` key and a numeric (or
    /// null) `confidence`. Bare scalars are outside the contract; inside a
    /// node they are dropped, inside a list they become empty leaves so the
    /// positions of the remaining items hold.
    pub fn from_json(value: Value) -> Result<Self, TreeError> {
        match value {
            Value::Object(map) => Ok(Self::node_from(map, &FieldPath::root())),
            other => Err(TreeError::RootNotObject(kind_of(&other))),
        }
    }

    fn node_from(map: Map<String, Value>, path: &FieldPath) -> Self {
        let mut children = BTreeMap::new();
        for (key, child) in map {
            let child_path = path.key(key.as_str());
            match Self::build(child, &child_path) {
                Some(tree) => {
                    children.insert(key, tree);
                }
                None => {
                    tracing::warn!(path = %child_path, "Dropping unannotated extracted value");
                }
            }
        }
        ExtractionTree::Node(children)
    }

    fn build(value: Value, path: &FieldPath) -> Option<Self> {
        match value {
            Value::Null => Some(ExtractionTree::Leaf(None)),
            Value::Object(map) if is_leaf_object(&map) => Some(ExtractionTree::Leaf(Some(leaf_from(map)))),
            Value::Object(map) => Some(Self::node_from(map, path)),
            Value::Array(items) => Some(ExtractionTree::List(
                items
                    .into_iter()
                    .enumerate()
                    .map(|(i, item)| {
                        let item_path = path.index(i);
                        Self::build(item, &item_path).unwrap_or_else(|| {
                            tracing::warn!(path = %item_path, "Unannotated list item treated as unknown");
                            ExtractionTree::Leaf(None)
                        })
                    })
                    .collect(),
            )),
            _ => None,
        }
    }

    /// Every known leaf in the tree, including leaves inside lists.
    pub fn leaves(&self) -> Vec<ExtractedLeaf<'_>> {
        let mut out = Vec::new();
        self.collect_leaves(FieldPath::root(), true, &mut out);
        out
    }

    /// Known leaves reachable without passing through a list.
    pub fn scalar_leaves(&self) -> Vec<ExtractedLeaf<'_>> {
        let mut out = Vec::new();
        self.collect_leaves(FieldPath::root(), false, &mut out);
        out
    }

    fn collect_leaves<'a>(
        &'a self,
        path: FieldPath,
        into_lists: bool,
        out: &mut Vec<ExtractedLeaf<'a>>,
    ) {
        match self {
            ExtractionTree::Leaf(Some(cv)) if cv.is_known() => out.push(ExtractedLeaf { path, value: cv }),
            ExtractionTree::Leaf(_) => {}
            ExtractionTree::Node(children) => {
                for (key, child) in children {
                    child.collect_leaves(path.key(key.as_str()), into_lists, out);
                }
            }
            ExtractionTree::List(items) if into_lists => {
                for (i, item) in items.iter().enumerate() {
                    item.collect_leaves(path.index(i), into_lists, out);
                }
            }
            ExtractionTree::List(_) => {}
        }
    }

    /// Looks up the sub-tree at `path`.
    pub fn get(&self, path: &FieldPath) -> Option<&ExtractionTree> {
        let mut current = self;
        for segment in path.segments() {
            current = match (current, segment) {
                (ExtractionTree::Node(children), seg) => children.get(&seg.as_key())?,
                (ExtractionTree::List(items), PathSegment::Index(i)) => items.get(*i)?,
                _ => return None,
            };
        }
        Some(current)
    }

    /// The known leaf at `path`, if any.
    pub fn leaf_at(&self, path: &FieldPath) -> Option<&ConfidenceValue> {
        match self.get(path)? {
            ExtractionTree::Leaf(Some(cv)) if cv.is_known() => Some(cv),
            _ => None,
        }
    }

    /// Renders the tree back into extractor JSON.
    pub fn to_json(&self) -> Value {
        match self {
            ExtractionTree::Leaf(None) => Value::Null,
            ExtractionTree::Leaf(Some(cv)) => {
                let mut map = Map::new();
                map.insert("value".to_string(), cv.value.clone());
                map.insert("confidence".to_string(), Value::from(cv.confidence.value()));
                Value::Object(map)
            }
            ExtractionTree::Node(children) => Value::Object(
                children
                    .iter()
                    .map(|(k, v)| (k.clone(), v.to_json()))
                    .collect(),
            ),
            ExtractionTree::List(items) => Value::Array(items.iter().map(Self::to_json).collect()),
        }
    }
}

impl Default for ExtractionTree {
    fn default() -> Self {
        Self::empty()
    }
}

impl Serialize for ExtractionTree {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for ExtractionTree {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Self::from_json(value).map_err(serde::de::Error::custom)
    }
}

fn is_leaf_object(map: &Map<String, Value>) -> bool {
    map.contains_key("value")
        && map
            .get("confidence")
            .is_some_and(|c| c.is_number() || c.is_null())
}

fn leaf_from(mut map: Map<String, Value>) -> ConfidenceValue {
    let value = map.remove("value").unwrap_or(Value::Null);
    let confidence = map
        .get("confidence")
        .and_then(Value::as_f64)
        .map(Confidence::new)
        .unwrap_or(Confidence::NONE);
    ConfidenceValue { value, confidence }
}

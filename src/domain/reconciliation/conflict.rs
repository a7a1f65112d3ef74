//! Conflict detection between an extraction and the stored record.

use serde::Serialize;
use serde_json::Value;

use crate::domain::client::{is_blank, ClientRecord};
use crate::domain::extraction::{Confidence, ExtractionTree, FieldPath};

/// A field where the extraction disagrees with data already on file.
///
/// Advisory only: conflicts are shown to the reviewer and never block a
/// write on their own.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Conflict {
    pub field: FieldPath,
    pub existing_value: Value,
    pub extracted_value: Value,
    pub confidence: Confidence,
}

/// Lists every scalar field whose extracted value differs from a non-blank
/// stored value.
///
/// List-valued parts of the extraction are additive and are not compared
/// element by element.
pub fn find_conflicts(existing: &ClientRecord, extracted: &ExtractionTree) -> Vec<Conflict> {
    extracted
        .scalar_leaves()
        .into_iter()
        .filter_map(|leaf| {
            let current = existing.get(&leaf.path)?;
            if is_blank(current) || same_value(current, &leaf.value.value) {
                return None;
            }
            Some(Conflict {
                field: leaf.path,
                existing_value: current.clone(),
                extracted_value: leaf.value.value.clone(),
                confidence: leaf.value.confidence,
            })
        })
        .collect()
}

/// Value equality where `5000` and `5000.0` are the same number.
pub(crate) fn same_value(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => match (x.as_f64(), y.as_f64()) {
            (Some(x), Some(y)) => x == y,
            _ => x == y,
        },
        _ => a == b,
    }
}

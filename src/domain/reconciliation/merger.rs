//! Applying extracted fields onto client records.
//!
//! Both modes share [`apply_field`]. Interactive merges write exactly the
//! fields an adviser approved; batch merges write every leaf whose
//! confidence reaches the auto-merge threshold. Each merge works on a clone,
//! so a failed merge leaves the caller's record untouched.

use serde::Deserialize;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::domain::client::{is_blank, ClientRecord, DataSource, SubEntityKind};
use crate::domain::extraction::{ExtractionTree, FieldPath, PathError, PathSegment};
use crate::domain::foundation::Timestamp;

use super::coercion::coerce_form_value;

/// Confidence at or above which batch mode accepts a field.
pub const DEFAULT_AUTO_MERGE_THRESHOLD: f64 = 0.6;

/// Errors that abort a single merge.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum MergeError {
    #[error(transparent)]
    Path(#[from] PathError),
}

/// What batch mode does when a field already holds data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverwritePolicy {
    /// Confidence is the only gate; existing values are replaced.
    #[default]
    Always,
    /// Only blank fields are filled.
    PreserveExisting,
}

/// Gate for automatic merges.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AutoMergePolicy {
    pub threshold: f64,
    pub overwrite: OverwritePolicy,
}

impl AutoMergePolicy {
    pub fn new(threshold: f64, overwrite: OverwritePolicy) -> Self {
        Self { threshold, overwrite }
    }
}

impl Default for AutoMergePolicy {
    fn default() -> Self {
        Self::new(DEFAULT_AUTO_MERGE_THRESHOLD, OverwritePolicy::Always)
    }
}

/// A field an adviser accepted, optionally with replacement text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApprovedField {
    pub path: FieldPath,
    pub edit: Option<String>,
}

impl ApprovedField {
    /// Accept the extracted value as is.
    pub fn accepted(path: FieldPath) -> Self {
        Self { path, edit: None }
    }

    /// Accept the field with text typed by the adviser.
    pub fn edited(path: FieldPath, text: impl Into<String>) -> Self {
        Self {
            path,
            edit: Some(text.into()),
        }
    }
}

/// The merged record and what was written to it.
#[derive(Debug, Clone)]
pub struct MergeOutcome {
    pub record: ClientRecord,
    pub fields_written: usize,
    /// Paths considered but not written (below threshold, preserved,
    /// addressing a populated section or collection, or approved without an
    /// extracted value).
    pub skipped: Vec<FieldPath>,
}

/// Writes one field, growing sub-entity arrays first.
///
/// When the path indexes past the end of one of the seven sub-entity
/// collections, the gap is filled with default-shaped entities before the
/// write so no partially-populated item is ever stored. Other arrays are
/// padded with empty objects, or `null` when the index is the last segment.
///
/// A populated section or sub-entity collection is never replaced wholesale;
/// such writes fail with [`PathError::PathConflict`].
///
/// Mutates `record` in place; the merge functions clone before calling this.
pub fn apply_field(record: &mut ClientRecord, path: &FieldPath, value: Value) -> Result<(), PathError> {
    crate::domain::client::reject_system_field(path)?;
    guard_populated_container(record, path)?;
    record.edit_fields(|root| grow_collections(root, path));
    record.set_field(path, value)
}

/// Rejects a leaf write aimed at a non-empty object, or at a non-empty
/// sub-entity collection. Sub-entities only ever grow, one field at a time.
fn guard_populated_container(record: &ClientRecord, path: &FieldPath) -> Result<(), PathError> {
    let Some(existing) = record.get(path) else {
        return Ok(());
    };
    let is_collection = matches!(
        path.segments().last(),
        Some(PathSegment::Key(name)) if SubEntityKind::from_collection(name).is_some()
    );
    let protected = match existing {
        Value::Object(map) => !map.is_empty(),
        Value::Array(items) => is_collection && !items.is_empty(),
        _ => false,
    };
    if protected {
        return Err(PathError::occupied(path, existing));
    }
    Ok(())
}

/// Writes only the approved fields.
pub fn merge_interactive(
    record: &ClientRecord,
    extraction: &ExtractionTree,
    approved: &[ApprovedField],
) -> Result<MergeOutcome, MergeError> {
    let mut merged = record.clone();
    let mut written = 0;
    let mut edited = 0;
    let mut skipped = Vec::new();

    for field in approved {
        let value = match &field.edit {
            Some(text) => {
                edited += 1;
                coerce_form_value(text)
            }
            None => match extraction.leaf_at(&field.path) {
                Some(leaf) => leaf.value.clone(),
                None => {
                    tracing::warn!(path = %field.path, "Approved field has no extracted value");
                    skipped.push(field.path.clone());
                    continue;
                }
            },
        };
        apply_field(&mut merged, &field.path, value)?;
        written += 1;
    }

    merged.record_merge(DataSource::reviewed_transcript(Timestamp::now(), written, edited));
    tracing::debug!(
        client_id = %merged.id(),
        fields_written = written,
        edited,
        version = merged.version(),
        "Interactive merge applied"
    );

    Ok(MergeOutcome {
        record: merged,
        fields_written: written,
        skipped,
    })
}

/// Writes every leaf that clears the policy. Conflicts are not consulted.
pub fn merge_batch(
    record: &ClientRecord,
    extraction: &ExtractionTree,
    policy: &AutoMergePolicy,
) -> Result<MergeOutcome, MergeError> {
    let mut merged = record.clone();
    let mut written = 0;
    let mut skipped = Vec::new();

    for leaf in extraction.leaves() {
        if !leaf.value.accepted_at(policy.threshold) {
            skipped.push(leaf.path);
            continue;
        }
        if policy.overwrite == OverwritePolicy::PreserveExisting
            && merged.get(&leaf.path).is_some_and(|v| !is_blank(v))
        {
            skipped.push(leaf.path);
            continue;
        }
        if let Err(error) = guard_populated_container(&merged, &leaf.path) {
            tracing::warn!(path = %leaf.path, error = %error, "Leaf addresses populated data; skipped");
            skipped.push(leaf.path);
            continue;
        }
        apply_field(&mut merged, &leaf.path, leaf.value.value.clone())?;
        written += 1;
    }

    merged.record_merge(DataSource::batch_import(Timestamp::now(), written));
    tracing::debug!(
        client_id = %merged.id(),
        fields_written = written,
        skipped = skipped.len(),
        version = merged.version(),
        "Batch merge applied"
    );

    Ok(MergeOutcome {
        record: merged,
        fields_written: written,
        skipped,
    })
}

/// Extends every array along `path` far enough for the path to exist.
///
/// Containers are created for missing intermediates the same way
/// `set_path` would. A kind mismatch stops the walk; the following write
/// reports it as a conflict.
fn grow_collections(root: &mut Value, path: &FieldPath) {
    let segments = path.segments();
    let mut current = root;

    for (pos, segment) in segments.iter().enumerate() {
        if current.is_null() {
            *current = match segment {
                PathSegment::Index(_) => Value::Array(Vec::new()),
                PathSegment::Key(_) => Value::Object(Map::new()),
            };
        }

        current = match (current, segment) {
            (Value::Object(map), PathSegment::Key(key)) => map.entry(key.clone()).or_insert(Value::Null),
            (Value::Array(items), PathSegment::Index(index)) => {
                let kind = match pos.checked_sub(1).map(|p| &segments[p]) {
                    Some(PathSegment::Key(name)) => SubEntityKind::from_collection(name),
                    _ => None,
                };
                let is_last = pos + 1 == segments.len();
                while items.len() <= *index {
                    items.push(filler(kind, is_last));
                }
                if let (Some(kind), true) = (kind, items[*index].is_null()) {
                    items[*index] = kind.default_entity();
                }
                &mut items[*index]
            }
            _ => return,
        };
    }
}

fn filler(kind: Option<SubEntityKind>, is_last: bool) -> Value {
    match kind {
        Some(kind) => kind.default_entity(),
        None if is_last => Value::Null,
        None => Value::Object(Map::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::ClientId;
    use serde_json::json;

    fn record(fields: Value) -> ClientRecord {
        ClientRecord::with_fields(ClientId::new("c-1").unwrap(), fields.as_object().cloned().unwrap())
    }

    fn tree(json: Value) -> ExtractionTree {
        ExtractionTree::from_json(json).unwrap()
    }

    fn path(raw: &str) -> FieldPath {
        FieldPath::parse(raw).unwrap()
    }

    #[test]
    fn apply_field_fills_new_slots_with_default_entities() {
        let mut r = record(json!({}));
        apply_field(&mut r, &path("pensions[2].provider"), json!("Aviva")).unwrap();

        let pensions = r.fields()["pensions"].as_array().unwrap();
        assert_eq!(pensions.len(), 3);
        assert_eq!(pensions[0]["provider"], "");
        assert!(pensions[0]["id"].is_string());
        assert_eq!(pensions[2]["provider"], "Aviva");
        assert_eq!(pensions[2]["currentValue"], 0);
    }

    #[test]
    fn apply_field_pads_unknown_collections() {
        let mut r = record(json!({}));
        apply_field(&mut r, &path("goals.milestones[1].label"), json!("retire")).unwrap();
        apply_field(&mut r, &path("goals.shortTermGoals[1]"), json!("car")).unwrap();
        assert_eq!(r.fields()["goals"]["milestones"], json!([{}, {"label": "retire"}]));
        assert_eq!(r.fields()["goals"]["shortTermGoals"], json!([null, "car"]));
    }

    #[test]
    fn apply_field_rejects_writes_through_scalars() {
        let mut r = record(json!({"personal": "Amy"}));
        let err = apply_field(&mut r, &path("personal.firstName"), json!("Amy")).unwrap_err();
        assert!(matches!(err, PathError::PathConflict { .. }));
    }

    #[test]
    fn batch_threshold_is_inclusive_at_point_six() {
        let r = record(json!({}));
        let extraction = tree(json!({
            "personal": {
                "firstName": {"value": "X", "confidence": 0.6},
                "lastName": {"value": "X", "confidence": 0.59}
            }
        }));

        let outcome = merge_batch(&r, &extraction, &AutoMergePolicy::default()).unwrap();

        assert_eq!(outcome.record.get_str("personal.firstName"), Some(&json!("X")));
        assert_eq!(outcome.record.get_str("personal.lastName"), None);
        assert_eq!(outcome.fields_written, 1);
        assert_eq!(outcome.skipped, vec![path("personal.lastName")]);
    }

    #[test]
    fn batch_overwrites_existing_values_by_default() {
        let r = record(json!({"employment": {"employer": "Old Co"}}));
        let extraction = tree(json!({"employment": {"employer": {"value": "Acme", "confidence": 0.7}}}));
        let outcome = merge_batch(&r, &extraction, &AutoMergePolicy::default()).unwrap();
        assert_eq!(outcome.record.get_str("employment.employer"), Some(&json!("Acme")));
    }

    #[test]
    fn preserve_existing_policy_only_fills_blanks() {
        let r = record(json!({"employment": {"employer": "Old Co", "occupation": ""}}));
        let extraction = tree(json!({"employment": {
            "employer": {"value": "Acme", "confidence": 0.9},
            "occupation": {"value": "Engineer", "confidence": 0.9}
        }}));
        let policy = AutoMergePolicy::new(0.6, OverwritePolicy::PreserveExisting);

        let outcome = merge_batch(&r, &extraction, &policy).unwrap();

        assert_eq!(outcome.record.get_str("employment.employer"), Some(&json!("Old Co")));
        assert_eq!(outcome.record.get_str("employment.occupation"), Some(&json!("Engineer")));
    }

    #[test]
    fn batch_grows_pensions_and_keeps_untouched_fields() {
        let r = record(json!({"pensions": [
            {"id": "p-0", "provider": "Aviva", "policyNumber": "AV-1", "currentValue": 1000}
        ]}));
        let extraction = tree(json!({"pensions": [
            {"currentValue": {"value": 1500, "confidence": 0.9}},
            {"provider": {"value": "Royal London", "confidence": 0.8}},
            {"provider": {"value": "Nest", "confidence": 0.7}}
        ]}));

        let outcome = merge_batch(&r, &extraction, &AutoMergePolicy::default()).unwrap();
        let pensions = outcome.record.fields()["pensions"].as_array().unwrap().clone();

        assert_eq!(pensions.len(), 3);
        assert_eq!(pensions[0]["id"], "p-0");
        assert_eq!(pensions[0]["policyNumber"], "AV-1");
        assert_eq!(pensions[0]["provider"], "Aviva");
        assert_eq!(pensions[0]["currentValue"], 1500);
        assert_eq!(pensions[1]["provider"], "Royal London");
        assert_eq!(pensions[1]["policyNumber"], "");
        assert_eq!(pensions[2]["provider"], "Nest");
        assert_eq!(pensions[2]["monthlyContribution"], 0);
        assert_ne!(pensions[1]["id"], pensions[2]["id"]);
    }

    #[test]
    fn batch_never_truncates_longer_existing_arrays() {
        let r = record(json!({"pensions": [{"provider": "A"}, {"provider": "B"}, {"provider": "C"}]}));
        let extraction = tree(json!({"pensions": [{"provider": {"value": "A2", "confidence": 0.9}}]}));
        let outcome = merge_batch(&r, &extraction, &AutoMergePolicy::default()).unwrap();
        let pensions = outcome.record.fields()["pensions"].as_array().unwrap();
        assert_eq!(pensions.len(), 3);
        assert_eq!(pensions[0]["provider"], "A2");
        assert_eq!(pensions[2]["provider"], "C");
    }

    #[test]
    fn merges_bump_version_and_log_provenance() {
        let r = ClientRecord::for_client("Amy", "Brown");
        let extraction = tree(json!({"personal": {"email": {"value": "amy@example.com", "confidence": 0.9}}}));

        let outcome = merge_batch(&r, &extraction, &AutoMergePolicy::default()).unwrap();

        assert_eq!(outcome.record.version(), r.version() + 1);
        let source = outcome.record.data_sources().last().unwrap();
        assert_eq!(source.source_type, crate::domain::client::SourceType::BatchImport);
        assert_eq!(source.fields_updated, 1);
        assert!(!source.human_reviewed);
        assert!(outcome.record.data_completeness() > r.data_completeness());
    }

    #[test]
    fn interactive_merge_writes_only_approved_fields() {
        let r = record(json!({"personal": {"firstName": "Amy"}}));
        let extraction = tree(json!({"personal": {
            "firstName": {"value": "Amelia", "confidence": 0.9},
            "email": {"value": "amy@example.com", "confidence": 0.9},
            "phone": {"value": "0123", "confidence": 0.9}
        }}));
        let approved = vec![
            ApprovedField::accepted(path("personal.email")),
            ApprovedField::edited(path("personal.phone"), "0777"),
        ];

        let outcome = merge_interactive(&r, &extraction, &approved).unwrap();

        assert_eq!(outcome.record.get_str("personal.firstName"), Some(&json!("Amy")));
        assert_eq!(outcome.record.get_str("personal.email"), Some(&json!("amy@example.com")));
        assert_eq!(outcome.record.get_str("personal.phone"), Some(&json!(777)));
        let source = outcome.record.data_sources().last().unwrap();
        assert!(source.human_reviewed);
        assert_eq!(source.edited_fields, 1);
        assert_eq!(source.fields_updated, 2);
    }

    #[test]
    fn interactive_merge_coerces_edited_text() {
        let r = record(json!({}));
        let approved = vec![
            ApprovedField::edited(path("employment.monthlyGrossIncome"), " 5200 "),
            ApprovedField::edited(path("estatePlanning.hasWill"), "true"),
            ApprovedField::edited(path("employment.employer"), "Acme"),
        ];
        let outcome = merge_interactive(&r, &ExtractionTree::empty(), &approved).unwrap();
        assert_eq!(outcome.record.get_str("employment.monthlyGrossIncome"), Some(&json!(5200)));
        assert_eq!(outcome.record.get_str("estatePlanning.hasWill"), Some(&json!(true)));
        assert_eq!(outcome.record.get_str("employment.employer"), Some(&json!("Acme")));
    }

    #[test]
    fn interactive_merge_skips_approved_paths_without_values() {
        let r = record(json!({}));
        let approved = vec![ApprovedField::accepted(path("personal.email"))];
        let outcome = merge_interactive(&r, &ExtractionTree::empty(), &approved).unwrap();
        assert_eq!(outcome.fields_written, 0);
        assert_eq!(outcome.skipped, vec![path("personal.email")]);
    }

    #[test]
    fn batch_leaves_populated_collections_and_sections_intact() {
        let r = record(json!({
            "pensions": [{"provider": "A"}, {"provider": "B"}, {"provider": "C"}],
            "personal": {"firstName": "Amy", "lastName": "Brown"}
        }));
        let extraction = tree(json!({
            "pensions": {"value": [], "confidence": 0.9},
            "personal": {"value": "Amy Brown", "confidence": 0.8},
            "employment": {"employer": {"value": "Acme", "confidence": 0.9}}
        }));

        let outcome = merge_batch(&r, &extraction, &AutoMergePolicy::default()).unwrap();

        assert_eq!(outcome.record.fields()["pensions"].as_array().map(Vec::len), Some(3));
        assert_eq!(outcome.record.get_str("personal.firstName"), Some(&json!("Amy")));
        assert_eq!(outcome.record.get_str("employment.employer"), Some(&json!("Acme")));
        assert_eq!(outcome.fields_written, 1);
        assert!(outcome.skipped.contains(&path("pensions")));
        assert!(outcome.skipped.contains(&path("personal")));
    }

    #[test]
    fn apply_field_refuses_to_replace_populated_containers() {
        let mut r = record(json!({"pensions": [{"provider": "A"}], "personal": {"firstName": "Amy"}}));
        let err = apply_field(&mut r, &path("pensions"), json!([])).unwrap_err();
        assert!(matches!(err, PathError::PathConflict { found: "array", .. }));
        let err = apply_field(&mut r, &path("personal"), json!({"email": "a@b.c"})).unwrap_err();
        assert!(matches!(err, PathError::PathConflict { found: "object", .. }));
        assert_eq!(r.fields()["personal"]["firstName"], "Amy");
    }

    #[test]
    fn plain_list_fields_can_still_be_replaced() {
        let mut r = record(json!({"goals": {"shortTermGoals": ["car"]}}));
        apply_field(&mut r, &path("goals.shortTermGoals"), json!(["car", "house"])).unwrap();
        assert_eq!(r.fields()["goals"]["shortTermGoals"], json!(["car", "house"]));
    }

    #[test]
    fn failed_merge_leaves_original_untouched() {
        let r = record(json!({"personal": "corrupt"}));
        let extraction = tree(json!({"personal": {"firstName": {"value": "Amy", "confidence": 0.9}}}));
        let err = merge_batch(&r, &extraction, &AutoMergePolicy::default()).unwrap_err();
        assert!(matches!(err, MergeError::Path(PathError::PathConflict { .. })));
        assert_eq!(r.version(), 1);
        assert_eq!(r.fields()["personal"], "corrupt");
    }
}

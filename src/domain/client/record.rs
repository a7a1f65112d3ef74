//! The canonical client record.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::domain::extraction::{resolve_path, set_path, FieldPath, PathError};
use crate::domain::foundation::{ClientId, Percentage, Timestamp};

use super::completeness::score_completeness;

/// Top-level keys owned by the record itself; extracted data may not write them.
pub const SYSTEM_FIELDS: [&str; 6] = [
    "id",
    "version",
    "createdAt",
    "updatedAt",
    "dataCompleteness",
    "dataSources",
];

/// Where a merge's data came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SourceType {
    /// A transcript reviewed field by field by an adviser.
    Transcript,
    /// A transcript merged automatically during a batch import.
    BatchImport,
}

/// One provenance entry; appended on every merge, never rewritten.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataSource {
    #[serde(rename = "type")]
    pub source_type: SourceType,
    pub date: Timestamp,
    pub fields_updated: usize,
    /// Set when an adviser approved the fields.
    #[serde(default)]
    pub human_reviewed: bool,
    /// How many approved fields the adviser edited before saving.
    #[serde(default)]
    pub edited_fields: usize,
}

impl DataSource {
    pub fn batch_import(date: Timestamp, fields_updated: usize) -> Self {
        Self {
            source_type: SourceType::BatchImport,
            date,
            fields_updated,
            human_reviewed: false,
            edited_fields: 0,
        }
    }

    pub fn reviewed_transcript(date: Timestamp, fields_updated: usize, edited_fields: usize) -> Self {
        Self {
            source_type: SourceType::Transcript,
            date,
            fields_updated,
            human_reviewed: true,
            edited_fields,
        }
    }
}

/// A client's fact-find record.
///
/// Business data lives in an open nested map (`personal`, `employment`,
/// `pensions`, ...) serialized alongside the system fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientRecord {
    id: ClientId,
    version: u64,
    created_at: Timestamp,
    updated_at: Timestamp,
    data_completeness: Percentage,
    #[serde(default)]
    data_sources: Vec<DataSource>,
    #[serde(flatten)]
    fields: Map<String, Value>,
}

impl ClientRecord {
    /// Creates an empty record at version 1.
    pub fn new(id: ClientId) -> Self {
        let now = Timestamp::now();
        Self {
            id,
            version: 1,
            created_at: now,
            updated_at: now,
            data_completeness: Percentage::ZERO,
            data_sources: Vec::new(),
            fields: Map::new(),
        }
    }

    /// Creates an empty record for a newly identified client, seeded with
    /// their name.
    pub fn for_client(first_name: &str, last_name: &str) -> Self {
        let mut personal = Map::new();
        personal.insert("firstName".to_string(), Value::from(first_name.trim()));
        personal.insert("lastName".to_string(), Value::from(last_name.trim()));

        let mut record = Self::new(ClientId::from_name(first_name, last_name));
        record.fields.insert("personal".to_string(), Value::Object(personal));
        record.data_completeness = score_completeness(&record);
        record
    }

    /// Builds a record around existing business data, e.g. when importing
    /// from another system. System keys in `fields` are discarded.
    pub fn with_fields(id: ClientId, mut fields: Map<String, Value>) -> Self {
        for key in SYSTEM_FIELDS {
            fields.remove(key);
        }
        let mut record = Self::new(id);
        record.fields = fields;
        record.data_completeness = score_completeness(&record);
        record
    }

    pub fn id(&self) -> &ClientId {
        &self.id
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn created_at(&self) -> &Timestamp {
        &self.created_at
    }

    pub fn updated_at(&self) -> &Timestamp {
        &self.updated_at
    }

    pub fn data_completeness(&self) -> Percentage {
        self.data_completeness
    }

    pub fn data_sources(&self) -> &[DataSource] {
        &self.data_sources
    }

    /// The business data.
    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    /// Resolves a business field; `None` when any segment is missing.
    pub fn get(&self, path: &FieldPath) -> Option<&Value> {
        let (first, rest) = path.split_first()?;
        let top = self.fields.get(&first.as_key())?;
        resolve_path(top, &rest)
    }

    /// Convenience lookup by raw path string.
    pub fn get_str(&self, path: &str) -> Option<&Value> {
        FieldPath::parse(path).ok().and_then(|p| self.get(&p))
    }

    pub fn first_name(&self) -> Option<&str> {
        self.get_str("personal.firstName").and_then(Value::as_str)
    }

    pub fn last_name(&self) -> Option<&str> {
        self.get_str("personal.lastName").and_then(Value::as_str)
    }

    /// Display name, `First Last`.
    pub fn display_name(&self) -> String {
        format!(
            "{} {}",
            self.first_name().unwrap_or_default(),
            self.last_name().unwrap_or_default()
        )
        .trim()
        .to_string()
    }

    /// Runs `f` against the business data as a single JSON object.
    ///
    /// The root handed to `f` is always an object; writers must not replace it.
    pub(crate) fn edit_fields<T>(&mut self, f: impl FnOnce(&mut Value) -> T) -> T {
        let mut root = Value::Object(std::mem::take(&mut self.fields));
        let out = f(&mut root);
        if let Value::Object(map) = root {
            self.fields = map;
        }
        out
    }

    /// Writes a single business field.
    pub(crate) fn set_field(&mut self, path: &FieldPath, value: Value) -> Result<(), PathError> {
        reject_system_field(path)?;
        self.edit_fields(|root| set_path(root, path, value))
    }

    /// Post-merge bookkeeping: bump the version, stamp the time, append
    /// provenance and recompute completeness.
    pub(crate) fn record_merge(&mut self, source: DataSource) {
        self.version += 1;
        self.updated_at = Timestamp::now();
        self.data_sources.push(source);
        self.data_completeness = score_completeness(self);
    }
}

/// Fails when `path` would write one of the record's own system keys.
pub(crate) fn reject_system_field(path: &FieldPath) -> Result<(), PathError> {
    if let Some((first, _)) = path.split_first() {
        let key = first.as_key();
        if SYSTEM_FIELDS.contains(&key.as_str()) {
            return Err(PathError::InvalidPath {
                path: path.to_string(),
                reason: format!("'{}' is a system field", key),
            });
        }
    }
    Ok(())
}

/// True for values that carry no information: `null`, blank strings and
/// empty arrays or objects. Numbers and booleans are never blank.
pub fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
        Value::Bool(_) | Value::Number(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn new_record_starts_at_version_one() {
        let record = ClientRecord::new(ClientId::new("c-1").unwrap());
        assert_eq!(record.version(), 1);
        assert!(record.fields().is_empty());
        assert!(record.data_sources().is_empty());
    }

    #[test]
    fn for_client_seeds_the_name() {
        let record = ClientRecord::for_client(" Maria ", "Lopez");
        assert_eq!(record.first_name(), Some("Maria"));
        assert_eq!(record.last_name(), Some("Lopez"));
        assert_eq!(record.display_name(), "Maria Lopez");
        assert!(record.id().as_str().starts_with("maria-lopez-"));
    }

    #[test]
    fn serializes_business_fields_alongside_system_fields() {
        let record = ClientRecord::for_client("Amy", "Brown");
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["version"], 1);
        assert_eq!(json["personal"]["firstName"], "Amy");
        assert!(json["dataSources"].is_array());

        let back: ClientRecord = serde_json::from_value(json).unwrap();
        assert_eq!(back, record);
    }

    #[test]
    fn with_fields_drops_system_keys() {
        let fields = json!({"version": 99, "personal": {"firstName": "Amy"}});
        let record = ClientRecord::with_fields(
            ClientId::new("c-2").unwrap(),
            fields.as_object().unwrap().clone(),
        );
        assert_eq!(record.version(), 1);
        assert!(!record.fields().contains_key("version"));
    }

    #[test]
    fn set_field_refuses_system_keys() {
        let mut record = ClientRecord::new(ClientId::new("c-3").unwrap());
        let err = record
            .set_field(&FieldPath::parse("version").unwrap(), json!(7))
            .unwrap_err();
        assert!(matches!(err, PathError::InvalidPath { .. }));
        assert_eq!(record.version(), 1);
    }

    #[test]
    fn record_merge_bumps_version_and_appends_source() {
        let mut record = ClientRecord::for_client("Amy", "Brown");
        let before = *record.updated_at();
        record.record_merge(DataSource::batch_import(Timestamp::now(), 3));
        assert_eq!(record.version(), 2);
        assert_eq!(record.data_sources().len(), 1);
        assert!(!record.updated_at().is_before(&before));
    }

    #[test]
    fn blank_values() {
        assert!(is_blank(&json!(null)));
        assert!(is_blank(&json!("  ")));
        assert!(is_blank(&json!([])));
        assert!(is_blank(&json!({})));
        assert!(!is_blank(&json!(0)));
        assert!(!is_blank(&json!(false)));
        assert!(!is_blank(&json!("x")));
    }
}

//! Extraction model - confidence-annotated facts and path addressing.
//!
//! - `confidence` - `ConfidenceValue`, the unit of extracted data
//! - `tree` - `ExtractionTree`, the tagged-union mirror of a client record
//! - `path` - dot/bracket addressing over nested JSON
//! - `response_parser` - turns raw model replies into sanitized JSON

mod confidence;
mod path;
mod response_parser;
mod tree;

pub use confidence::{Confidence, ConfidenceValue};
pub use path::{resolve_path, set_path, FieldPath, PathError, PathSegment};
pub use response_parser::{ResponseParseError, ResponseParser, MAX_FIELD_LENGTH, MAX_RESPONSE_LENGTH};
pub use tree::{ExtractedLeaf, ExtractionTree, TreeError};

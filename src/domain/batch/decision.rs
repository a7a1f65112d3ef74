//! Duplicate-resolution decisions.

use crate::domain::foundation::BatchItemId;
use crate::domain::identity::{ExtractedName, MatchCandidate};

/// How to resolve an item whose client may already exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Merge into the candidate at this index of the request.
    UseExisting(usize),
    /// Create a fresh record for the client.
    CreateNew,
    /// Leave the document unprocessed.
    Skip,
}

/// Raised when the batch suspends on a possible duplicate.
#[derive(Debug, Clone, PartialEq)]
pub struct DecisionRequest {
    pub item_id: BatchItemId,
    pub document: String,
    pub name: ExtractedName,
    pub candidates: Vec<MatchCandidate>,
}

//! Transcript store port - append-only provenance for merged transcripts.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::foundation::{ClientId, DomainError, Timestamp};

/// A transcript kept alongside the record it was merged into.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranscriptRecord {
    pub client_id: ClientId,
    pub file_name: String,
    pub content: String,
    pub uploaded_at: Timestamp,
}

impl TranscriptRecord {
    pub fn new(client_id: ClientId, file_name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            client_id,
            file_name: file_name.into(),
            content: content.into(),
            uploaded_at: Timestamp::now(),
        }
    }
}

#[async_trait]
pub trait TranscriptStore: Send + Sync {
    /// Appends a transcript. Never overwrites an earlier one.
    async fn put(&self, transcript: &TranscriptRecord) -> Result<(), DomainError>;
}

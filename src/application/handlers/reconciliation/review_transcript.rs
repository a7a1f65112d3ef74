//! ReviewTranscriptHandler - extracts a transcript for adviser review.

use std::sync::Arc;

use crate::domain::client::ClientRecord;
use crate::domain::foundation::ClientId;
use crate::domain::reconciliation::{find_conflicts, Conflict};
use crate::ports::{ExtractorConfig, FullExtraction, RecordStore, TextExtractor};

use super::ReconciliationError;

/// Command to extract a transcript against an existing client.
#[derive(Debug, Clone)]
pub struct ReviewTranscriptCommand {
    pub client_id: ClientId,
    pub transcript: String,
}

/// Everything the adviser needs to approve fields.
#[derive(Debug, Clone)]
pub struct ReviewResult {
    pub record: ClientRecord,
    pub extraction: FullExtraction,
    pub conflicts: Vec<Conflict>,
}

/// Handler for transcript review. Writes nothing.
pub struct ReviewTranscriptHandler {
    records: Arc<dyn RecordStore>,
    extractor: Arc<dyn TextExtractor>,
    config: ExtractorConfig,
}

impl ReviewTranscriptHandler {
    pub fn new(records: Arc<dyn RecordStore>, extractor: Arc<dyn TextExtractor>, config: ExtractorConfig) -> Self {
        Self {
            records,
            extractor,
            config,
        }
    }

    pub async fn handle(&self, cmd: ReviewTranscriptCommand) -> Result<ReviewResult, ReconciliationError> {
        // 1. Load the client
        let record = self
            .records
            .get(&cmd.client_id)
            .await?
            .ok_or_else(|| ReconciliationError::ClientNotFound(cmd.client_id.clone()))?;

        // 2. Extract with the record as context
        let extraction = self
            .extractor
            .extract_full(&self.config, &cmd.transcript, Some(&record))
            .await?;

        // 3. Compare against what is on file
        let conflicts = find_conflicts(&record, &extraction.data);
        tracing::info!(
            client_id = %record.id(),
            fields = extraction.data.leaves().len(),
            conflicts = conflicts.len(),
            "Transcript ready for review"
        );

        Ok(ReviewResult {
            record,
            extraction,
            conflicts,
        })
    }
}

//! ApplyReviewHandler - merges adviser-approved fields into a record.

use std::sync::Arc;

use crate::domain::client::ClientRecord;
use crate::domain::extraction::{ExtractionTree, FieldPath};
use crate::domain::foundation::ClientId;
use crate::domain::reconciliation::{merge_interactive, ApprovedField};
use crate::ports::{RecordStore, TranscriptRecord, TranscriptStore};

use super::ReconciliationError;

/// Command to apply a reviewed extraction.
#[derive(Debug, Clone)]
pub struct ApplyReviewCommand {
    pub client_id: ClientId,
    pub extraction: ExtractionTree,
    pub approved: Vec<ApprovedField>,
    pub file_name: String,
    pub transcript: String,
}

/// Result of a successful review merge.
#[derive(Debug, Clone)]
pub struct ApplyReviewResult {
    pub record: ClientRecord,
    pub fields_written: usize,
    /// Approved paths that had nothing to write.
    pub skipped: Vec<FieldPath>,
}

/// Handler for applying a review.
pub struct ApplyReviewHandler {
    records: Arc<dyn RecordStore>,
    transcripts: Arc<dyn TranscriptStore>,
}

impl ApplyReviewHandler {
    pub fn new(records: Arc<dyn RecordStore>, transcripts: Arc<dyn TranscriptStore>) -> Self {
        Self { records, transcripts }
    }

    pub async fn handle(&self, cmd: ApplyReviewCommand) -> Result<ApplyReviewResult, ReconciliationError> {
        // 1. Load the current record (not the one shown at review time)
        let record = self
            .records
            .get(&cmd.client_id)
            .await?
            .ok_or_else(|| ReconciliationError::ClientNotFound(cmd.client_id.clone()))?;

        // 2. Merge; a path conflict aborts before anything is written
        let outcome = merge_interactive(&record, &cmd.extraction, &cmd.approved)?;

        // 3. Persist record, then provenance
        self.records.put(&outcome.record).await?;
        self.transcripts
            .put(&TranscriptRecord::new(
                outcome.record.id().clone(),
                cmd.file_name,
                cmd.transcript,
            ))
            .await?;

        tracing::info!(
            client_id = %outcome.record.id(),
            fields_written = outcome.fields_written,
            version = outcome.record.version(),
            "Review applied"
        );

        Ok(ApplyReviewResult {
            record: outcome.record,
            fields_written: outcome.fields_written,
            skipped: outcome.skipped,
        })
    }
}

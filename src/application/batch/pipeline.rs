//! BatchPipeline - sequential import of transcripts into client records.
//!
//! The pipeline owns its queue and processes one document per `step()`.
//! When a document may belong to a client already on file it suspends and
//! waits for `submit_decision`; nothing else advances until then.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::Notify;

use crate::domain::batch::{
    BatchError, BatchItem, BatchItemResult, BatchItemStatus, BatchReport, Decision, DecisionRequest,
    DocumentSource, ItemFailure, ItemOutcome, ItemSuccess, SkipReason,
};
use crate::domain::client::ClientRecord;
use crate::domain::foundation::{BatchItemId, DomainError};
use crate::domain::identity::{find_matches, guess_client_name, ExtractedName, MatchCandidate};
use crate::domain::reconciliation::{merge_batch, AutoMergePolicy};
use crate::ports::{ExtractorConfig, RecordStore, TextExtractor, TranscriptRecord, TranscriptStore};

/// What a single `step()` did.
#[derive(Debug, Clone, PartialEq)]
pub enum StepOutcome {
    /// One document ran to a terminal status.
    ItemFinished(BatchItemResult),
    /// The current document may match existing clients; the pipeline is now suspended.
    AwaitingDecision(DecisionRequest),
    /// Already suspended. No work was done.
    Suspended(DecisionRequest),
    /// Every document has a result.
    Completed,
    /// The batch was aborted; remaining documents were skipped.
    Aborted,
}

/// Cloneable abort switch for a running batch.
///
/// Aborting lets the in-flight document finish, then skips the rest.
#[derive(Debug, Clone, Default)]
pub struct AbortHandle {
    inner: Arc<AbortState>,
}

#[derive(Debug, Default)]
struct AbortState {
    requested: AtomicBool,
    notify: Notify,
}

impl AbortHandle {
    pub fn abort(&self) {
        self.inner.requested.store(true, Ordering::SeqCst);
        self.inner.notify.notify_waiters();
    }

    pub fn is_aborted(&self) -> bool {
        self.inner.requested.load(Ordering::SeqCst)
    }

    /// Resolves once `abort` has been called.
    pub async fn aborted(&self) {
        loop {
            let notified = self.inner.notify.notified();
            if self.is_aborted() {
                return;
            }
            notified.await;
        }
    }
}

/// The document the pipeline is suspended on.
#[derive(Debug)]
struct PendingDecision {
    index: usize,
    text: String,
    request: DecisionRequest,
}

/// Where processing a document got to.
enum Progress {
    Finished(ItemOutcome),
    NeedsDecision {
        text: String,
        name: ExtractedName,
        candidates: Vec<MatchCandidate>,
    },
}

/// Sequential batch import over a fixed queue of documents.
pub struct BatchPipeline {
    items: Vec<BatchItem>,
    cursor: usize,
    pending: Option<PendingDecision>,
    halted: Option<DomainError>,
    aborted: bool,
    abort: AbortHandle,
    extractor: Arc<dyn TextExtractor>,
    records: Arc<dyn RecordStore>,
    transcripts: Arc<dyn TranscriptStore>,
    extractor_config: ExtractorConfig,
    policy: AutoMergePolicy,
}

impl BatchPipeline {
    pub fn new(
        documents: impl IntoIterator<Item = DocumentSource>,
        extractor: Arc<dyn TextExtractor>,
        records: Arc<dyn RecordStore>,
        transcripts: Arc<dyn TranscriptStore>,
    ) -> Self {
        Self {
            items: documents.into_iter().map(BatchItem::new).collect(),
            cursor: 0,
            pending: None,
            halted: None,
            aborted: false,
            abort: AbortHandle::default(),
            extractor,
            records,
            transcripts,
            extractor_config: ExtractorConfig::default(),
            policy: AutoMergePolicy::default(),
        }
    }

    pub fn with_extractor_config(mut self, config: ExtractorConfig) -> Self {
        self.extractor_config = config;
        self
    }

    pub fn with_policy(mut self, policy: AutoMergePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn abort_handle(&self) -> AbortHandle {
        self.abort.clone()
    }

    pub fn items(&self) -> &[BatchItem] {
        &self.items
    }

    /// Results of the documents finished so far, in queue order.
    pub fn results(&self) -> Vec<&BatchItemResult> {
        self.items.iter().filter_map(BatchItem::result).collect()
    }

    pub fn report(&self) -> BatchReport {
        BatchReport {
            results: self.results().into_iter().cloned().collect(),
            aborted: self.aborted,
        }
    }

    /// The decision the pipeline is waiting for, if suspended.
    pub fn pending_decision(&self) -> Option<&DecisionRequest> {
        self.pending.as_ref().map(|p| &p.request)
    }

    /// Processes the next document.
    ///
    /// A store failure halts the pipeline: this call and every later one
    /// return `BatchError::StoreFailure`.
    pub async fn step(&mut self) -> Result<StepOutcome, BatchError> {
        if let Some(err) = &self.halted {
            return Err(BatchError::StoreFailure(err.clone()));
        }
        if self.aborted {
            return Ok(StepOutcome::Aborted);
        }
        if self.abort.is_aborted() {
            self.skip_remaining()?;
            return Ok(StepOutcome::Aborted);
        }
        if let Some(pending) = &self.pending {
            return Ok(StepOutcome::Suspended(pending.request.clone()));
        }
        if self.cursor >= self.items.len() {
            return Ok(StepOutcome::Completed);
        }

        let index = self.cursor;
        self.items[index].transition(BatchItemStatus::Processing)?;
        tracing::debug!(
            item_id = %self.items[index].id(),
            document = %self.items[index].document().name(),
            "Processing batch item"
        );

        let processed = self.process(index).await;
        let progress = processed.map_err(|e| self.halt(e))?;
        match progress {
            Progress::Finished(outcome) => self.finish(index, outcome).map(StepOutcome::ItemFinished),
            Progress::NeedsDecision {
                text,
                name,
                candidates,
            } => {
                let item = &mut self.items[index];
                item.transition(BatchItemStatus::AwaitingDecision)?;
                let request = DecisionRequest {
                    item_id: item.id(),
                    document: item.document().name(),
                    name,
                    candidates,
                };
                tracing::info!(
                    item_id = %request.item_id,
                    candidates = request.candidates.len(),
                    "Possible existing client; awaiting decision"
                );
                self.pending = Some(PendingDecision {
                    index,
                    text,
                    request: request.clone(),
                });
                Ok(StepOutcome::AwaitingDecision(request))
            }
        }
    }

    /// Resolves the suspended document.
    ///
    /// Rejected decisions (wrong item, candidate out of range, nothing
    /// pending) leave the pipeline exactly as it was.
    pub async fn submit_decision(
        &mut self,
        item_id: BatchItemId,
        decision: Decision,
    ) -> Result<BatchItemResult, BatchError> {
        if let Some(err) = &self.halted {
            return Err(BatchError::StoreFailure(err.clone()));
        }
        let pending = self.pending.as_ref().ok_or(BatchError::NotSuspended)?;
        if pending.request.item_id != item_id {
            return Err(BatchError::UnknownItem(item_id));
        }
        if let Decision::UseExisting(index) = decision {
            let available = pending.request.candidates.len();
            if index >= available {
                return Err(BatchError::InvalidCandidate { index, available });
            }
        }

        let Some(pending) = self.pending.take() else {
            return Err(BatchError::NotSuspended);
        };
        tracing::info!(item_id = %item_id, ?decision, "Decision received");

        if decision == Decision::Skip {
            return self.finish(pending.index, ItemOutcome::Skipped(SkipReason::Decided));
        }

        self.items[pending.index].transition(BatchItemStatus::Processing)?;
        let resolved = self.resolve(&pending, decision).await;
        let outcome = resolved.map_err(|e| self.halt(e))?;
        self.finish(pending.index, outcome)
    }

    async fn resolve(&self, pending: &PendingDecision, decision: Decision) -> Result<ItemOutcome, DomainError> {
        let document = self.items[pending.index].document().name();
        match decision {
            Decision::UseExisting(index) => {
                let id = pending.request.candidates[index].record.id();
                // Re-read: the candidate snapshot may be stale.
                match self.records.get(id).await? {
                    Some(record) => self.extract_and_merge(&document, &pending.text, record, false).await,
                    None => Ok(ItemOutcome::Error(ItemFailure::ClientNotFound(id.clone()))),
                }
            }
            Decision::CreateNew => {
                let record = self.create_record(&pending.request.name).await?;
                self.extract_and_merge(&document, &pending.text, record, true).await
            }
            Decision::Skip => Ok(ItemOutcome::Skipped(SkipReason::Decided)),
        }
    }

    async fn process(&self, index: usize) -> Result<Progress, DomainError> {
        let document = self.items[index].document();
        let text = match read_document(document).await {
            Ok(text) => text,
            Err(failure) => return Ok(Progress::Finished(ItemOutcome::Error(failure))),
        };

        let Some(name) = self.identify(&text).await else {
            tracing::warn!(document = %document.name(), "No client identified");
            return Ok(Progress::Finished(ItemOutcome::Error(ItemFailure::NoClientIdentified)));
        };

        let existing = self.records.get_all().await?;
        let candidates = find_matches(&name.first_name, &name.last_name, &existing);
        if !candidates.is_empty() {
            return Ok(Progress::NeedsDecision {
                text,
                name,
                candidates,
            });
        }

        let record = self.create_record(&name).await?;
        let outcome = self
            .extract_and_merge(&document.name(), &text, record, true)
            .await?;
        Ok(Progress::Finished(outcome))
    }

    /// Name from the extractor, falling back to text heuristics.
    async fn identify(&self, text: &str) -> Option<ExtractedName> {
        match self.extractor.extract_name(&self.extractor_config, text).await {
            Ok(Some(name)) if name.is_complete() => return Some(name),
            Ok(_) => {}
            Err(e) => tracing::warn!(error = %e, "Name extraction failed; trying heuristics"),
        }
        guess_client_name(text)
    }

    /// Persists a fresh record seeded with the client's name.
    ///
    /// First half of a two-step create: if extraction never follows, an
    /// empty record is left behind.
    async fn create_record(&self, name: &ExtractedName) -> Result<ClientRecord, DomainError> {
        let record = ClientRecord::for_client(&name.first_name, &name.last_name);
        self.records.put(&record).await?;
        tracing::info!(client_id = %record.id(), name = %record.display_name(), "Created client record");
        Ok(record)
    }

    async fn extract_and_merge(
        &self,
        document: &str,
        text: &str,
        record: ClientRecord,
        created_new: bool,
    ) -> Result<ItemOutcome, DomainError> {
        let extraction = match self
            .extractor
            .extract_full(&self.extractor_config, text, Some(&record))
            .await
        {
            Ok(extraction) => extraction,
            Err(e) => {
                tracing::warn!(client_id = %record.id(), error = %e, "Extraction failed");
                return Ok(ItemOutcome::Error(ItemFailure::ExtractionFailed(e.to_string())));
            }
        };

        let merged = match merge_batch(&record, &extraction.data, &self.policy) {
            Ok(merged) => merged,
            Err(e) => {
                tracing::warn!(client_id = %record.id(), error = %e, "Merge rejected");
                return Ok(ItemOutcome::Error(ItemFailure::MergeRejected(e.to_string())));
            }
        };

        self.records.put(&merged.record).await?;
        self.transcripts
            .put(&TranscriptRecord::new(merged.record.id().clone(), document, text))
            .await?;

        Ok(ItemOutcome::Success(ItemSuccess {
            client_id: merged.record.id().clone(),
            client_name: merged.record.display_name(),
            created_new,
            fields_written: merged.fields_written,
            completeness: merged.record.data_completeness(),
            missing_fields: extraction.missing_fields,
            summary: extraction.summary,
        }))
    }

    fn finish(&mut self, index: usize, outcome: ItemOutcome) -> Result<BatchItemResult, BatchError> {
        let item = &mut self.items[index];
        let result = BatchItemResult::new(item.id(), item.document().name(), outcome);
        item.finish(result.clone())?;
        self.cursor = self.cursor.max(index + 1);
        tracing::debug!(item_id = %result.item_id, status = %result.status(), "Batch item finished");
        Ok(result)
    }

    fn skip_remaining(&mut self) -> Result<(), BatchError> {
        self.pending = None;
        let mut skipped = 0;
        for index in self.cursor..self.items.len() {
            if !self.items[index].status().is_finished() {
                self.finish(index, ItemOutcome::Skipped(SkipReason::Aborted))?;
                skipped += 1;
            }
        }
        self.aborted = true;
        tracing::info!(skipped, "Batch aborted");
        Ok(())
    }

    fn halt(&mut self, err: DomainError) -> BatchError {
        tracing::error!(error = %err, "Store failure; halting batch");
        self.halted = Some(err.clone());
        BatchError::StoreFailure(err)
    }
}

async fn read_document(document: &DocumentSource) -> Result<String, ItemFailure> {
    match document {
        DocumentSource::Text { content, .. } => Ok(content.clone()),
        DocumentSource::File(path) => tokio::fs::read_to_string(path)
            .await
            .map_err(|e| ItemFailure::DocumentUnreadable(format!("{}: {}", path.display(), e))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::storage::{InMemoryRecordStore, InMemoryTranscriptStore};
    use crate::domain::extraction::ExtractionTree;
    use crate::ports::{ExtractorError, FullExtraction};
    use async_trait::async_trait;
    use serde_json::{json, Value};

    /// Never names the client (so heuristics run) and returns a fixed extraction.
    struct FixedExtractor {
        data: Value,
        fail_full: bool,
    }

    impl FixedExtractor {
        fn new(data: Value) -> Self {
            Self { data, fail_full: false }
        }

        fn failing() -> Self {
            Self {
                data: json!({}),
                fail_full: true,
            }
        }
    }

    #[async_trait]
    impl TextExtractor for FixedExtractor {
        async fn extract_full(
            &self,
            _config: &ExtractorConfig,
            _text: &str,
            _existing: Option<&ClientRecord>,
        ) -> Result<FullExtraction, ExtractorError> {
            if self.fail_full {
                return Err(ExtractorError::Invalid("model unavailable".into()));
            }
            Ok(FullExtraction {
                data: ExtractionTree::from_json(self.data.clone())?,
                summary: Some("Initial meeting".into()),
                missing_fields: vec!["personal.dateOfBirth".into()],
            })
        }

        async fn extract_name(
            &self,
            _config: &ExtractorConfig,
            _text: &str,
        ) -> Result<Option<ExtractedName>, ExtractorError> {
            Ok(None)
        }
    }

    fn income() -> Value {
        json!({"employment": {"monthlyGrossIncome": {"value": 5000, "confidence": 0.9}}})
    }

    fn pipeline(
        docs: Vec<DocumentSource>,
        extractor: FixedExtractor,
        records: &InMemoryRecordStore,
        transcripts: &InMemoryTranscriptStore,
    ) -> BatchPipeline {
        BatchPipeline::new(
            docs,
            Arc::new(extractor),
            Arc::new(records.clone()),
            Arc::new(transcripts.clone()),
        )
    }

    #[tokio::test]
    async fn new_client_is_created_and_merged() {
        let records = InMemoryRecordStore::new();
        let transcripts = InMemoryTranscriptStore::new();
        let mut p = pipeline(
            vec![DocumentSource::text("maria.txt", "Client: Maria Lopez\nWorks at Acme.")],
            FixedExtractor::new(income()),
            &records,
            &transcripts,
        );

        let StepOutcome::ItemFinished(result) = p.step().await.unwrap() else {
            panic!("expected a finished item");
        };
        let success = result.success().unwrap();
        assert!(success.created_new);
        assert_eq!(success.client_name, "Maria Lopez");
        assert_eq!(success.fields_written, 1);
        assert_eq!(success.missing_fields, vec!["personal.dateOfBirth".to_string()]);

        let stored = records.get(&success.client_id).await.unwrap().unwrap();
        assert_eq!(stored.version(), 2);
        assert_eq!(transcripts.for_client(&success.client_id).await.len(), 1);
        assert_eq!(p.step().await.unwrap(), StepOutcome::Completed);
    }

    #[tokio::test]
    async fn unnamed_document_is_an_item_error() {
        let records = InMemoryRecordStore::new();
        let transcripts = InMemoryTranscriptStore::new();
        let mut p = pipeline(
            vec![DocumentSource::text("blank.txt", "no names in here")],
            FixedExtractor::new(income()),
            &records,
            &transcripts,
        );

        let StepOutcome::ItemFinished(result) = p.step().await.unwrap() else {
            panic!("expected a finished item");
        };
        assert_eq!(result.failure(), Some(&ItemFailure::NoClientIdentified));
        assert!(records.is_empty().await);
    }

    #[tokio::test]
    async fn unreadable_file_is_an_item_error() {
        let records = InMemoryRecordStore::new();
        let transcripts = InMemoryTranscriptStore::new();
        let mut p = pipeline(
            vec![DocumentSource::File("/definitely/not/here.txt".into())],
            FixedExtractor::new(income()),
            &records,
            &transcripts,
        );

        let StepOutcome::ItemFinished(result) = p.step().await.unwrap() else {
            panic!("expected a finished item");
        };
        assert!(matches!(result.failure(), Some(ItemFailure::DocumentUnreadable(_))));
    }

    #[tokio::test]
    async fn extraction_failure_keeps_the_created_record() {
        let records = InMemoryRecordStore::new();
        let transcripts = InMemoryTranscriptStore::new();
        let mut p = pipeline(
            vec![DocumentSource::text("a.txt", "Client: Amy Brown")],
            FixedExtractor::failing(),
            &records,
            &transcripts,
        );

        let StepOutcome::ItemFinished(result) = p.step().await.unwrap() else {
            panic!("expected a finished item");
        };
        assert!(matches!(result.failure(), Some(ItemFailure::ExtractionFailed(_))));
        assert_eq!(records.len().await, 1);
        assert!(transcripts.all().await.is_empty());
    }

    #[tokio::test]
    async fn possible_duplicate_suspends_until_decided() {
        let existing = ClientRecord::for_client("Amy", "Brown");
        let records = InMemoryRecordStore::with_records([existing.clone()]);
        let transcripts = InMemoryTranscriptStore::new();
        let mut p = pipeline(
            vec![
                DocumentSource::text("a.txt", "Client: Amy Brown"),
                DocumentSource::text("b.txt", "Client: Bob Hall"),
            ],
            FixedExtractor::new(income()),
            &records,
            &transcripts,
        );

        let StepOutcome::AwaitingDecision(request) = p.step().await.unwrap() else {
            panic!("expected a decision request");
        };
        assert_eq!(request.candidates.len(), 1);
        assert_eq!(p.items()[0].status(), BatchItemStatus::AwaitingDecision);

        // Stepping again does nothing while suspended.
        assert_eq!(p.step().await.unwrap(), StepOutcome::Suspended(request.clone()));
        assert_eq!(p.items()[1].status(), BatchItemStatus::Pending);

        let result = p
            .submit_decision(request.item_id, Decision::UseExisting(0))
            .await
            .unwrap();
        let success = result.success().unwrap();
        assert!(!success.created_new);
        assert_eq!(&success.client_id, existing.id());
        assert_eq!(records.len().await, 1);

        assert!(matches!(p.step().await.unwrap(), StepOutcome::ItemFinished(_)));
        assert_eq!(p.step().await.unwrap(), StepOutcome::Completed);
    }

    #[tokio::test]
    async fn rejected_decisions_leave_the_pipeline_suspended() {
        let records = InMemoryRecordStore::with_records([ClientRecord::for_client("Amy", "Brown")]);
        let transcripts = InMemoryTranscriptStore::new();
        let mut p = pipeline(
            vec![DocumentSource::text("a.txt", "Client: Amy Brown")],
            FixedExtractor::new(income()),
            &records,
            &transcripts,
        );

        assert!(matches!(
            p.submit_decision(BatchItemId::new(), Decision::Skip).await,
            Err(BatchError::NotSuspended)
        ));

        let StepOutcome::AwaitingDecision(request) = p.step().await.unwrap() else {
            panic!("expected a decision request");
        };
        assert!(matches!(
            p.submit_decision(BatchItemId::new(), Decision::CreateNew).await,
            Err(BatchError::UnknownItem(_))
        ));
        assert!(matches!(
            p.submit_decision(request.item_id, Decision::UseExisting(3)).await,
            Err(BatchError::InvalidCandidate { index: 3, available: 1 })
        ));
        assert_eq!(p.pending_decision(), Some(&request));
    }

    #[tokio::test]
    async fn create_new_and_skip_decisions() {
        let records = InMemoryRecordStore::with_records([ClientRecord::for_client("Amy", "Brown")]);
        let transcripts = InMemoryTranscriptStore::new();
        let mut p = pipeline(
            vec![
                DocumentSource::text("a.txt", "Client: Amy Brown"),
                DocumentSource::text("b.txt", "Client: Amy Brown"),
            ],
            FixedExtractor::new(income()),
            &records,
            &transcripts,
        );

        let StepOutcome::AwaitingDecision(first) = p.step().await.unwrap() else {
            panic!("expected a decision request");
        };
        let created = p.submit_decision(first.item_id, Decision::CreateNew).await.unwrap();
        assert!(created.success().unwrap().created_new);
        assert_eq!(records.len().await, 2);

        // The record created above is now a candidate too.
        let StepOutcome::AwaitingDecision(second) = p.step().await.unwrap() else {
            panic!("expected a decision request");
        };
        assert_eq!(second.candidates.len(), 2);
        let skipped = p.submit_decision(second.item_id, Decision::Skip).await.unwrap();
        assert_eq!(skipped.outcome, ItemOutcome::Skipped(SkipReason::Decided));
    }

    #[tokio::test]
    async fn abort_skips_everything_not_yet_finished() {
        let records = InMemoryRecordStore::new();
        let transcripts = InMemoryTranscriptStore::new();
        let mut p = pipeline(
            vec![
                DocumentSource::text("a.txt", "Client: Amy Brown"),
                DocumentSource::text("b.txt", "Client: Bob Hall"),
                DocumentSource::text("c.txt", "Client: Cat Wood"),
            ],
            FixedExtractor::new(income()),
            &records,
            &transcripts,
        );

        assert!(matches!(p.step().await.unwrap(), StepOutcome::ItemFinished(_)));
        p.abort_handle().abort();
        assert_eq!(p.step().await.unwrap(), StepOutcome::Aborted);
        assert_eq!(p.step().await.unwrap(), StepOutcome::Aborted);

        let report = p.report();
        assert!(report.aborted);
        assert_eq!(report.succeeded(), 1);
        assert_eq!(report.skipped(), 2);
        assert_eq!(
            report.results[2].outcome,
            ItemOutcome::Skipped(SkipReason::Aborted)
        );
    }

    #[tokio::test]
    async fn store_failure_halts_the_pipeline() {
        let records = InMemoryRecordStore::new();
        let transcripts = InMemoryTranscriptStore::new();
        let mut p = pipeline(
            vec![
                DocumentSource::text("a.txt", "Client: Amy Brown"),
                DocumentSource::text("b.txt", "Client: Bob Hall"),
            ],
            FixedExtractor::new(income()),
            &records,
            &transcripts,
        );

        records.set_failing(true);
        assert!(matches!(p.step().await, Err(BatchError::StoreFailure(_))));

        records.set_failing(false);
        assert!(matches!(p.step().await, Err(BatchError::StoreFailure(_))));
        assert_eq!(p.items()[1].status(), BatchItemStatus::Pending);
    }

    #[tokio::test]
    async fn abort_handle_wakes_waiters() {
        let handle = AbortHandle::default();
        let waiter = {
            let handle = handle.clone();
            tokio::spawn(async move { handle.aborted().await })
        };
        handle.abort();
        waiter.await.unwrap();
        assert!(handle.is_aborted());
    }
}

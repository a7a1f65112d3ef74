//! In-memory record and transcript stores.
//!
//! Used by tests and embedding callers. Cloning a store shares
//! its contents.

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::client::ClientRecord;
use crate::domain::foundation::{ClientId, DomainError};
use crate::ports::{RecordStore, TranscriptRecord, TranscriptStore};

/// In-memory RecordStore keyed by client id.
#[derive(Debug, Clone, Default)]
pub struct InMemoryRecordStore {
    records: Arc<RwLock<BTreeMap<ClientId, ClientRecord>>>,
    /// When set, every call fails with a store error.
    failing: Arc<AtomicBool>,
}

impl InMemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store pre-populated with `records`.
    pub fn with_records(records: impl IntoIterator<Item = ClientRecord>) -> Self {
        let map = records.into_iter().map(|r| (r.id().clone(), r)).collect();
        Self {
            records: Arc::new(RwLock::new(map)),
            failing: Arc::default(),
        }
    }

    /// Makes every subsequent call fail, to exercise store-failure paths.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }

    fn check(&self) -> Result<(), DomainError> {
        if self.failing.load(Ordering::SeqCst) {
            Err(DomainError::store("record store unavailable"))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl RecordStore for InMemoryRecordStore {
    async fn get_all(&self) -> Result<Vec<ClientRecord>, DomainError> {
        self.check()?;
        Ok(self.records.read().await.values().cloned().collect())
    }

    async fn get(&self, id: &ClientId) -> Result<Option<ClientRecord>, DomainError> {
        self.check()?;
        Ok(self.records.read().await.get(id).cloned())
    }

    async fn put(&self, record: &ClientRecord) -> Result<(), DomainError> {
        self.check()?;
        self.records
            .write()
            .await
            .insert(record.id().clone(), record.clone());
        Ok(())
    }
}

/// In-memory TranscriptStore; keeps every transcript in arrival order.
#[derive(Debug, Clone, Default)]
pub struct InMemoryTranscriptStore {
    transcripts: Arc<RwLock<Vec<TranscriptRecord>>>,
}

impl InMemoryTranscriptStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// All stored transcripts.
    pub async fn all(&self) -> Vec<TranscriptRecord> {
        self.transcripts.read().await.clone()
    }

    /// Transcripts stored for one client.
    pub async fn for_client(&self, id: &ClientId) -> Vec<TranscriptRecord> {
        self.transcripts
            .read()
            .await
            .iter()
            .filter(|t| &t.client_id == id)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl TranscriptStore for InMemoryTranscriptStore {
    async fn put(&self, transcript: &TranscriptRecord) -> Result<(), DomainError> {
        self.transcripts.write().await.push(transcript.clone());
        Ok(())
    }
}

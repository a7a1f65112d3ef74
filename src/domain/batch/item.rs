//! Queued documents.

use std::path::PathBuf;

use crate::domain::foundation::{BatchItemId, StateMachine, ValidationError};

use super::result::BatchItemResult;
use super::status::BatchItemStatus;

/// Where a queued document's text comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentSource {
    /// Text already in memory, e.g. pasted or uploaded.
    Text { name: String, content: String },
    /// A transcript file read when the item is processed.
    File(PathBuf),
}

impl DocumentSource {
    pub fn text(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self::Text {
            name: name.into(),
            content: content.into(),
        }
    }

    /// File name used in results and transcript provenance.
    pub fn name(&self) -> String {
        match self {
            Self::Text { name, .. } => name.clone(),
            Self::File(path) => path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| path.display().to_string()),
        }
    }
}

/// One document in a batch.
#[derive(Debug, Clone)]
pub struct BatchItem {
    id: BatchItemId,
    document: DocumentSource,
    status: BatchItemStatus,
    result: Option<BatchItemResult>,
}

impl BatchItem {
    pub fn new(document: DocumentSource) -> Self {
        Self {
            id: BatchItemId::new(),
            document,
            status: BatchItemStatus::Pending,
            result: None,
        }
    }

    pub fn id(&self) -> BatchItemId {
        self.id
    }

    pub fn document(&self) -> &DocumentSource {
        &self.document
    }

    pub fn status(&self) -> BatchItemStatus {
        self.status
    }

    pub fn result(&self) -> Option<&BatchItemResult> {
        self.result.as_ref()
    }

    pub(crate) fn transition(&mut self, target: BatchItemStatus) -> Result<(), ValidationError> {
        self.status = self.status.transition_to(target)?;
        Ok(())
    }

    /// Moves to the result's terminal status and stores the result.
    pub(crate) fn finish(&mut self, result: BatchItemResult) -> Result<(), ValidationError> {
        self.transition(result.status())?;
        self.result = Some(result);
        Ok(())
    }
}

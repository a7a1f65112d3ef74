//! Batch error types.

use thiserror::Error;

use crate::domain::foundation::{BatchItemId, ClientId, DomainError, ValidationError};

/// Why a single document failed. Captured into its result; never stops the batch.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ItemFailure {
    #[error("no client could be identified in the document")]
    NoClientIdentified,

    #[error("extraction failed: {0}")]
    ExtractionFailed(String),

    #[error("merge rejected: {0}")]
    MergeRejected(String),

    #[error("document could not be read: {0}")]
    DocumentUnreadable(String),

    #[error("client {0} no longer exists")]
    ClientNotFound(ClientId),
}

/// Errors returned by the pipeline itself.
#[derive(Debug, Clone, Error)]
pub enum BatchError {
    /// The record or transcript store failed. The batch halts.
    #[error("store failure: {0}")]
    StoreFailure(#[from] DomainError),

    #[error("batch is not waiting for a decision")]
    NotSuspended,

    #[error("item {0} is not the item awaiting a decision")]
    UnknownItem(BatchItemId),

    #[error("candidate {index} out of range ({available} available)")]
    InvalidCandidate { index: usize, available: usize },

    #[error("invalid status transition: {0}")]
    InvalidTransition(#[from] ValidationError),
}

impl BatchError {
    /// True when the pipeline cannot continue.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::StoreFailure(_) | Self::InvalidTransition(_))
    }
}

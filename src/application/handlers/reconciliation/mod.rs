//! Interactive reconciliation handlers.
//!
//! An adviser reviews one transcript against one client: first the
//! extraction and its conflicts are shown, then the approved fields are
//! merged.

mod apply_review;
mod review_transcript;

pub use apply_review::{ApplyReviewCommand, ApplyReviewHandler, ApplyReviewResult};
pub use review_transcript::{ReviewResult, ReviewTranscriptCommand, ReviewTranscriptHandler};

use thiserror::Error;

use crate::domain::foundation::{ClientId, DomainError};
use crate::domain::reconciliation::MergeError;
use crate::ports::ExtractorError;

/// Errors from the interactive review handlers.
#[derive(Debug, Error)]
pub enum ReconciliationError {
    #[error("client {0} not found")]
    ClientNotFound(ClientId),

    #[error(transparent)]
    Extraction(#[from] ExtractorError),

    #[error(transparent)]
    Merge(#[from] MergeError),

    #[error(transparent)]
    Store(#[from] DomainError),
}

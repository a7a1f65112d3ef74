//! Per-item results and the final batch report.

use crate::domain::foundation::{BatchItemId, ClientId, Percentage};

use super::errors::ItemFailure;
use super::status::BatchItemStatus;

/// A successfully merged document.
#[derive(Debug, Clone, PartialEq)]
pub struct ItemSuccess {
    pub client_id: ClientId,
    pub client_name: String,
    pub created_new: bool,
    pub fields_written: usize,
    pub completeness: Percentage,
    pub missing_fields: Vec<String>,
    pub summary: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Someone chose to skip the item.
    Decided,
    /// The batch was aborted before the item ran.
    Aborted,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ItemOutcome {
    Success(ItemSuccess),
    Error(ItemFailure),
    Skipped(SkipReason),
}

/// The final result of one queued document.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchItemResult {
    pub item_id: BatchItemId,
    pub document: String,
    pub outcome: ItemOutcome,
}

impl BatchItemResult {
    pub fn new(item_id: BatchItemId, document: impl Into<String>, outcome: ItemOutcome) -> Self {
        Self {
            item_id,
            document: document.into(),
            outcome,
        }
    }

    /// The terminal status this outcome puts the item in.
    pub fn status(&self) -> BatchItemStatus {
        match self.outcome {
            ItemOutcome::Success(_) => BatchItemStatus::Success,
            ItemOutcome::Error(_) => BatchItemStatus::Error,
            ItemOutcome::Skipped(_) => BatchItemStatus::Skipped,
        }
    }

    pub fn success(&self) -> Option<&ItemSuccess> {
        match &self.outcome {
            ItemOutcome::Success(s) => Some(s),
            _ => None,
        }
    }

    pub fn failure(&self) -> Option<&ItemFailure> {
        match &self.outcome {
            ItemOutcome::Error(e) => Some(e),
            _ => None,
        }
    }
}

/// Every item's result, in queue order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchReport {
    pub results: Vec<BatchItemResult>,
    pub aborted: bool,
}

impl BatchReport {
    pub fn succeeded(&self) -> usize {
        self.count(BatchItemStatus::Success)
    }

    pub fn failed(&self) -> usize {
        self.count(BatchItemStatus::Error)
    }

    pub fn skipped(&self) -> usize {
        self.count(BatchItemStatus::Skipped)
    }

    fn count(&self, status: BatchItemStatus) -> usize {
        self.results.iter().filter(|r| r.status() == status).count()
    }
}

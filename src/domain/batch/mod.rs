//! Batch import model - queued documents, their lifecycle and results.
//!
//! The pipeline that drives these types lives in `application::batch`.

mod decision;
mod errors;
mod item;
mod result;
mod status;

pub use decision::{Decision, DecisionRequest};
pub use errors::{BatchError, ItemFailure};
pub use item::{BatchItem, DocumentSource};
pub use result::{BatchItemResult, BatchReport, ItemOutcome, ItemSuccess, SkipReason};
pub use status::BatchItemStatus;

//! Application handlers.
//!
//! Command handlers that orchestrate domain operations for interactive use.

pub mod reconciliation;

pub use reconciliation::{
    ApplyReviewCommand, ApplyReviewHandler, ApplyReviewResult, ReconciliationError, ReviewResult,
    ReviewTranscriptCommand, ReviewTranscriptHandler,
};

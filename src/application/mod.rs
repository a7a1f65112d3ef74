//! Application layer - batch orchestration and command handlers.
//!
//! This layer coordinates domain operations across ports. The batch
//! pipeline handles bulk imports; the handlers serve one-off reviews.

pub mod batch;
pub mod handlers;

pub use batch::{AbortHandle, BatchEvent, BatchHandle, BatchPipeline, BatchRunner, DecisionSender, StepOutcome};
pub use handlers::{
    ApplyReviewCommand, ApplyReviewHandler, ApplyReviewResult, ReconciliationError, ReviewResult,
    ReviewTranscriptCommand, ReviewTranscriptHandler,
};

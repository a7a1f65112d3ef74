//! Batch import - runs many transcripts through extraction and merge.

mod pipeline;
mod runner;

pub use pipeline::{AbortHandle, BatchPipeline, StepOutcome};
pub use runner::{BatchClosed, BatchEvent, BatchHandle, BatchRunner, DecisionSender};

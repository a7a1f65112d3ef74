//! Text extractor port - turns transcript text into extracted facts.
//!
//! The batch pipeline and the interactive review handlers depend only on
//! this trait. The LLM-backed adapter lives in `adapters::extraction`.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::client::ClientRecord;
use crate::domain::extraction::{ExtractionTree, ResponseParseError, TreeError};
use crate::domain::identity::ExtractedName;

use super::AIError;

/// Per-call extraction settings.
///
/// Passed explicitly on every call so callers can vary the model without
/// shared mutable state.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractorConfig {
    /// Model override; `None` uses the provider's default.
    pub model: Option<String>,
    pub temperature: f32,
    pub max_tokens: u32,
    /// Transcripts longer than this are truncated before prompting.
    pub max_transcript_chars: usize,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            model: None,
            temperature: 0.1,
            max_tokens: 4096,
            max_transcript_chars: 100_000,
        }
    }
}

/// Result of a full-schema extraction.
#[derive(Debug, Clone, PartialEq)]
pub struct FullExtraction {
    pub data: ExtractionTree,
    /// Short narrative of the meeting, when the extractor provides one.
    pub summary: Option<String>,
    /// Fact-find fields the extractor flagged as not covered by the transcript.
    pub missing_fields: Vec<String>,
}

/// Extraction failures. Always recoverable per document.
#[derive(Debug, Clone, Error)]
pub enum ExtractorError {
    #[error("provider error: {0}")]
    Provider(#[from] AIError),

    #[error("unparseable reply: {0}")]
    Parse(#[from] ResponseParseError),

    #[error("invalid extraction: {0}")]
    Invalid(String),
}

impl From<TreeError> for ExtractorError {
    fn from(err: TreeError) -> Self {
        Self::Invalid(err.to_string())
    }
}

#[async_trait]
pub trait TextExtractor: Send + Sync {
    /// Extracts every fact-find field from `text`.
    ///
    /// `existing` is the record the data will be merged into, given for
    /// context; `None` on first contact with a client.
    async fn extract_full(
        &self,
        config: &ExtractorConfig,
        text: &str,
        existing: Option<&ClientRecord>,
    ) -> Result<FullExtraction, ExtractorError>;

    /// Lightweight call returning only the client's name.
    ///
    /// `Ok(None)` when the transcript names no client.
    async fn extract_name(
        &self,
        config: &ExtractorConfig,
        text: &str,
    ) -> Result<Option<ExtractedName>, ExtractorError>;
}

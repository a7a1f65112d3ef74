//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the domain and the outside world. Adapters implement these ports.
//!
//! ## Extraction Ports
//!
//! - `TextExtractor` - Transcript text to confidence-annotated facts
//! - `AIProvider` - LLM completions used by the extractor adapter
//!
//! ## Storage Ports
//!
//! - `RecordStore` - Versioned client records
//! - `TranscriptStore` - Append-only transcript provenance

mod ai_provider;
mod record_store;
mod text_extractor;
mod transcript_store;

pub use ai_provider::{
    AIError, AIProvider, CompletionRequest, CompletionResponse, FinishReason, Message, MessageRole,
    ProviderInfo, RequestMetadata, TokenUsage,
};
pub use record_store::RecordStore;
pub use text_extractor::{ExtractorConfig, ExtractorError, FullExtraction, TextExtractor};
pub use transcript_store::{TranscriptRecord, TranscriptStore};

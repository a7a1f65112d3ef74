//! Adapters - Implementations of port interfaces.
//!
//! Adapters connect the domain to external systems:
//! - `ai` - LLM providers (Anthropic, OpenAI, mock)
//! - `extraction` - Prompt-driven transcript extraction over an `AIProvider`
//! - `storage` - Record and transcript stores (in-memory, YAML files)

pub mod ai;
pub mod extraction;
pub mod storage;

pub use ai::{AnthropicConfig, AnthropicProvider, MockAIProvider, MockResponse, OpenAIConfig, OpenAIProvider};
pub use extraction::LlmTextExtractor;
pub use storage::{FileRecordStore, FileTranscriptStore, InMemoryRecordStore, InMemoryTranscriptStore};

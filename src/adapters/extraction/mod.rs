//! Transcript extraction adapters.

mod llm_text_extractor;
mod prompts;

pub use llm_text_extractor::LlmTextExtractor;

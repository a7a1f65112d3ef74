//! Storage adapters for client records and transcripts.
//!
//! - `InMemoryRecordStore` / `InMemoryTranscriptStore` - tests and dry runs
//! - `FileRecordStore` / `FileTranscriptStore` - YAML files on disk

mod file_record_store;
mod in_memory_record_store;

pub use file_record_store::{FileRecordStore, FileTranscriptStore};
pub use in_memory_record_store::{InMemoryRecordStore, InMemoryTranscriptStore};

//! Domain layer containing the reconciliation engine's business logic.
//!
//! # Module Organization
//!
//! - `foundation` - Shared primitives (ids, timestamps, errors, state machines)
//! - `extraction` - Confidence-annotated extraction trees and path addressing
//! - `client` - The versioned client record and completeness scoring
//! - `reconciliation` - Conflict detection and the merge algorithm
//! - `identity` - Duplicate-client matching and name heuristics
//! - `batch` - Batch item lifecycle, decisions and results

pub mod batch;
pub mod client;
pub mod extraction;
pub mod foundation;
pub mod identity;
pub mod reconciliation;

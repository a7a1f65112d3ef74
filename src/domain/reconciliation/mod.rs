//! Reconciliation - conflict detection and merging extracted data into records.

mod coercion;
mod conflict;
mod merger;

pub use coercion::coerce_form_value;
pub use conflict::{find_conflicts, Conflict};
pub use merger::{
    apply_field, merge_batch, merge_interactive, ApprovedField, AutoMergePolicy, MergeError,
    MergeOutcome, OverwritePolicy, DEFAULT_AUTO_MERGE_THRESHOLD,
};

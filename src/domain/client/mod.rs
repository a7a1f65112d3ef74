//! Client records - the durable, versioned fact-find for one client.

mod completeness;
mod record;
mod sub_entity;

pub use completeness::score_completeness;
pub(crate) use record::reject_system_field;
pub use record::{is_blank, ClientRecord, DataSource, SourceType, SYSTEM_FIELDS};
pub use sub_entity::SubEntityKind;

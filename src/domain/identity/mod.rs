//! Client identity - matching transcripts to existing records.

mod matcher;
mod name_heuristics;

pub use matcher::{find_matches, MatchCandidate, MatchType, SIMILARITY_THRESHOLD};
pub use name_heuristics::{guess_client_name, ExtractedName};

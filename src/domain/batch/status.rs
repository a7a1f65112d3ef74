//! Batch item status state machine.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::domain::foundation::StateMachine;

/// Where one queued document is in the batch lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum BatchItemStatus {
    /// Queued, not yet started.
    #[default]
    Pending,

    /// Name resolution, extraction or merge in flight.
    Processing,

    /// Matched one or more existing clients; the batch is suspended until
    /// someone decides which record the document belongs to.
    AwaitingDecision,

    /// Merged and persisted.
    Success,

    /// Failed for this document only.
    Error,

    /// Skipped by decision or because the batch was aborted.
    Skipped,
}

impl BatchItemStatus {
    /// True once the item holds its final result.
    pub fn is_finished(&self) -> bool {
        matches!(self, Self::Success | Self::Error | Self::Skipped)
    }
}

impl StateMachine for BatchItemStatus {
    fn can_transition_to(&self, target: &Self) -> bool {
        use BatchItemStatus::*;
        matches!(
            (self, target),
            (Pending, Processing)
                | (Pending, Skipped)
                | (Processing, Success)
                | (Processing, Error)
                | (Processing, AwaitingDecision)
                | (Processing, Skipped)
                | (AwaitingDecision, Processing)
                | (AwaitingDecision, Skipped)
        )
    }

    fn valid_transitions(&self) -> Vec<Self> {
        use BatchItemStatus::*;
        match self {
            Pending => vec![Processing, Skipped],
            Processing => vec![Success, Error, AwaitingDecision, Skipped],
            AwaitingDecision => vec![Processing, Skipped],
            Success | Error | Skipped => vec![],
        }
    }
}

impl fmt::Display for BatchItemStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::AwaitingDecision => "awaiting-decision",
            Self::Success => "success",
            Self::Error => "error",
            Self::Skipped => "skipped",
        };
        write!(f, "{}", s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pending_moves_to_processing_or_skipped() {
        let status = BatchItemStatus::Pending;
        assert_eq!(status.transition_to(BatchItemStatus::Processing), Ok(BatchItemStatus::Processing));
        assert!(status.can_transition_to(&BatchItemStatus::Skipped));
        assert!(status.transition_to(BatchItemStatus::Success).is_err());
    }

    #[test]
    fn awaiting_decision_resumes_or_skips() {
        let status = BatchItemStatus::AwaitingDecision;
        assert!(status.can_transition_to(&BatchItemStatus::Processing));
        assert!(status.can_transition_to(&BatchItemStatus::Skipped));
        assert!(!status.can_transition_to(&BatchItemStatus::Success));
    }

    #[test]
    fn finished_states_are_terminal() {
        for status in [BatchItemStatus::Success, BatchItemStatus::Error, BatchItemStatus::Skipped] {
            assert!(status.is_terminal());
            assert!(status.is_finished());
        }
        assert!(!BatchItemStatus::AwaitingDecision.is_terminal());
    }

    #[test]
    fn serializes_kebab_case() {
        let json = serde_json::to_string(&BatchItemStatus::AwaitingDecision).unwrap();
        assert_eq!(json, "\"awaiting-decision\"");
        assert_eq!(BatchItemStatus::AwaitingDecision.to_string(), "awaiting-decision");
    }
}

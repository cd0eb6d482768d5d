use chrono::{DateTime, Utc};
use cohort_types::Identity;
use serde::{Deserialize, Serialize};

/// Governance round lifecycle phase
///
/// Monotonic: Idle → Application → Voting → Finalized. No phase is revisited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    /// Round deployed, nothing open yet
    Idle,
    /// Applications may be submitted and removed
    Application,
    /// Votes may be cast
    Voting,
    /// Winners computed and frozen
    Finalized,
}

impl Phase {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Finalized)
    }

    pub fn can_transition_to(&self, next: &Self) -> bool {
        use Phase::*;
        matches!(
            (self, next),
            (Idle, Application) | (Application, Voting) | (Voting, Finalized)
        )
    }
}

#[cfg(test)]
mod phase_transition_tests {
    use super::*;

    #[test]
    fn test_terminal_states() {
        assert!(Phase::Finalized.is_terminal());

        assert!(!Phase::Idle.is_terminal());
        assert!(!Phase::Application.is_terminal());
        assert!(!Phase::Voting.is_terminal());
    }

    #[test]
    fn test_valid_transitions() {
        assert!(Phase::Idle.can_transition_to(&Phase::Application));
        assert!(Phase::Application.can_transition_to(&Phase::Voting));
        assert!(Phase::Voting.can_transition_to(&Phase::Finalized));
    }

    #[test]
    fn test_invalid_transitions() {
        // Cannot skip states
        assert!(!Phase::Idle.can_transition_to(&Phase::Voting));
        assert!(!Phase::Idle.can_transition_to(&Phase::Finalized));
        assert!(!Phase::Application.can_transition_to(&Phase::Finalized));

        // Cannot go backwards
        assert!(!Phase::Voting.can_transition_to(&Phase::Application));
        assert!(!Phase::Application.can_transition_to(&Phase::Idle));

        // Cannot transition from terminal state
        assert!(!Phase::Finalized.can_transition_to(&Phase::Idle));
        assert!(!Phase::Finalized.can_transition_to(&Phase::Voting));

        // Cannot self-transition
        assert!(!Phase::Voting.can_transition_to(&Phase::Voting));
    }
}

/// A candidate application competing for a revenue share
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Application {
    pub applicant: Identity,
    /// Caller-chosen index, unique among active applications
    pub index: u64,
    pub uri: String,
    pub submitted_at: DateTime<Utc>,
}

/// One identity's full vote, immutable once cast
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VoteSubmission {
    pub voter: Identity,
    pub indices: Vec<u64>,
    /// Raw weights, unconstrained; only relative magnitude matters
    pub shares: Vec<u64>,
    pub cast_at: DateTime<Utc>,
}

/// A finalized winner with its normalized revenue share
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Winner {
    /// 0-based rank, descending raw score (ties: ascending index)
    pub rank: usize,
    pub index: u64,
    pub applicant: Identity,
    pub raw_score: u64,
    /// Basis points, 0–10000; all winners sum to exactly 10000
    pub share_bp: u64,
}

/// Notification emitted after each successful state mutation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum RoundEvent {
    ApplicationSubmitted {
        applicant: Identity,
        index: u64,
        uri: String,
    },
    ApplicationRemoved {
        applicant: Identity,
        index: u64,
        removed_by: Identity,
    },
    VoteCast {
        voter: Identity,
        indices: Vec<u64>,
        shares: Vec<u64>,
    },
    PhaseChanged {
        from: Phase,
        to: Phase,
    },
    ResultsFinalized {
        winners: Vec<Winner>,
    },
}

/// Read-only snapshot of round progress
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoundSummary {
    pub phase: Phase,
    pub application_count: usize,
    pub vote_count: usize,
    pub winner_count: usize,
}

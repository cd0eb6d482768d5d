use crate::types::Phase;
use thiserror::Error;

/// Governance operation result type
pub type Result<T> = std::result::Result<T, GovernanceError>;

/// Governance errors
#[derive(Debug, Error)]
pub enum GovernanceError {
    #[error("Wrong phase: required {required:?}, found {actual:?}")]
    WrongPhase { required: Phase, actual: Phase },

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Identity already has an active application: {0}")]
    AlreadyRegistered(String),

    #[error("Application URI must not be empty")]
    EmptyUri,

    #[error("Application index already occupied: {0}")]
    IndexOccupied(u64),

    #[error("Application cap reached: {0}")]
    ApplicationCapReached(usize),

    #[error("Application not found at index {0}")]
    ApplicationNotFound(u64),

    #[error("Vote must reference at least one application")]
    EmptyVote,

    #[error("Vote arrays differ in length: {indices} indices, {shares} shares")]
    LengthMismatch { indices: usize, shares: usize },

    #[error("Vote references unknown application index {0}")]
    UnknownApplication(u64),

    #[error("Duplicate vote from voter: {0}")]
    AlreadyVoted(String),

    #[error("Aggregated score overflow at index {0}")]
    ScoreOverflow(u64),

    #[error("No vote submission found for voter: {0}")]
    SubmissionNotFound(String),

    #[error("No winner at rank {rank}: only {count} winners")]
    WinnerNotFound { rank: usize, count: usize },

    #[error("Index space too sparse: visited {visited} slots, limit {limit}")]
    IndexSpaceTooSparse { visited: u64, limit: u64 },

    #[error("Results already finalized")]
    AlreadyFinalized,

    #[error("Voting period has not ended")]
    VotingNotEnded,

    #[error("Application period has not ended")]
    ApplicationPeriodNotEnded,

    #[error("Application window has closed")]
    ApplicationWindowClosed,

    #[error("Payout notifier failed after commit: {0}")]
    PayoutError(String),
}

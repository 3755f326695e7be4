//! Error types for the RangePlasma settlement core.
//!
//! All errors use the `PL_ERR_` prefix convention for easy grepping in logs.
//! Error codes are grouped by subsystem:
//! - 1xx: Range ledger errors
//! - 2xx: Commitment / codec errors
//! - 3xx: Block log errors
//! - 4xx: Exit game errors
//! - 9xx: General / internal errors

use thiserror::Error;

use crate::{BlockNumber, Coord, ExitId, ExitState, HostHeight};

/// Central error enum for all RangePlasma operations.
///
/// Every variant rejects the whole operation: nothing is mutated when one
/// is returned.
#[derive(Debug, Error)]
pub enum PlasmaError {
    // =================================================================
    // Range Ledger Errors (1xx)
    // =================================================================
    /// Overlapping, empty or out-of-bounds deposit or exit target.
    #[error("PL_ERR_100: Invalid range: {reason}")]
    InvalidRange { reason: String },

    /// No deposited-range entry begins at this coordinate.
    #[error("PL_ERR_101: No deposited range at {0}")]
    NoSuchRange(Coord),

    // =================================================================
    // Commitment / Codec Errors (2xx)
    // =================================================================
    /// The recomputed Merkle-sum root does not match the committed root.
    #[error("PL_ERR_200: Invalid proof: {reason}")]
    InvalidProof { reason: String },

    /// The transfer claims more range than its commitment position allows,
    /// or does not belong to the block it is checked against.
    #[error("PL_ERR_201: Invalid transfer: {reason}")]
    InvalidTransfer { reason: String },

    /// The raw transaction bytes do not follow the fixed encoding.
    #[error("PL_ERR_202: Malformed transaction: {reason}")]
    MalformedTransaction { reason: String },

    /// The proof bytes are not a sequence of `hash || sum` elements.
    #[error("PL_ERR_203: Malformed proof: {reason}")]
    MalformedProof { reason: String },

    // =================================================================
    // Block Log Errors (3xx)
    // =================================================================
    /// Not enough host blocks have passed since the previous submission.
    #[error("PL_ERR_300: Block submitted too soon: earliest {earliest}, now {now}")]
    TooSoon { earliest: HostHeight, now: HostHeight },

    /// No block has been committed under this number.
    #[error("PL_ERR_301: No such block: {0}")]
    NoSuchBlock(BlockNumber),

    // =================================================================
    // Exit Game Errors (4xx)
    // =================================================================
    /// The challenge period of this exit has not elapsed yet.
    #[error("PL_ERR_400: Exit {exit} finalized too early: ready at {ready_at}, now {now}")]
    TooEarly {
        exit: ExitId,
        ready_at: HostHeight,
        now: HostHeight,
    },

    /// The exit target is not owned by the caller.
    #[error("PL_ERR_401: Not owner: {reason}")]
    NotOwner { reason: String },

    /// No exit was opened under this id.
    #[error("PL_ERR_402: No such exit: {0}")]
    NoSuchExit(ExitId),

    /// The exit is not in a state that allows the requested transition.
    #[error("PL_ERR_403: Exit {exit} is {state}, cannot {action}")]
    InvalidExitState {
        exit: ExitId,
        state: ExitState,
        action: &'static str,
    },

    /// An overlapping exit with higher priority (lower id) is still open.
    #[error("PL_ERR_404: Exit {exit} blocked by higher-priority exit {blocking}")]
    PriorityConflict { exit: ExitId, blocking: ExitId },

    /// Challenges are only accepted while the challenge period runs.
    #[error("PL_ERR_405: Challenge window of exit {exit} closed at {closed_at}, now {now}")]
    ChallengeWindowClosed {
        exit: ExitId,
        closed_at: HostHeight,
        now: HostHeight,
    },

    /// The challenge evidence does not invalidate the exit.
    #[error("PL_ERR_406: Invalid challenge: {reason}")]
    InvalidChallenge { reason: String },

    // =================================================================
    // General / Internal (9xx)
    // =================================================================
    /// The host height went backwards between two operations.
    #[error("PL_ERR_900: Host clock regression: last {last}, now {now}")]
    ClockRegression { last: HostHeight, now: HostHeight },

    /// Serialization / deserialization error.
    #[error("PL_ERR_901: Serialization error: {0}")]
    Serialization(String),

    /// Configuration error (invalid config file, zero periods, etc.).
    #[error("PL_ERR_902: Configuration error: {0}")]
    Configuration(String),

    /// Partition or supply invariant violated. Critical.
    #[error("PL_ERR_903: Invariant violation: {reason}")]
    InvariantViolation { reason: String },
}

/// Crate-wide `Result` alias.
pub type Result<T> = std::result::Result<T, PlasmaError>;

impl From<serde_json::Error> for PlasmaError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

impl PlasmaError {
    /// Shorthand for [`PlasmaError::InvalidRange`].
    pub fn invalid_range(reason: impl Into<String>) -> Self {
        Self::InvalidRange {
            reason: reason.into(),
        }
    }

    /// Shorthand for [`PlasmaError::MalformedTransaction`].
    pub fn malformed_tx(reason: impl Into<String>) -> Self {
        Self::MalformedTransaction {
            reason: reason.into(),
        }
    }

    /// The `PL_ERR_nnn` code of this error.
    #[must_use]
    pub fn code(&self) -> u16 {
        match self {
            Self::InvalidRange { .. } => 100,
            Self::NoSuchRange(_) => 101,
            Self::InvalidProof { .. } => 200,
            Self::InvalidTransfer { .. } => 201,
            Self::MalformedTransaction { .. } => 202,
            Self::MalformedProof { .. } => 203,
            Self::TooSoon { .. } => 300,
            Self::NoSuchBlock(_) => 301,
            Self::TooEarly { .. } => 400,
            Self::NotOwner { .. } => 401,
            Self::NoSuchExit(_) => 402,
            Self::InvalidExitState { .. } => 403,
            Self::PriorityConflict { .. } => 404,
            Self::ChallengeWindowClosed { .. } => 405,
            Self::InvalidChallenge { .. } => 406,
            Self::ClockRegression { .. } => 900,
            Self::Serialization(_) => 901,
            Self::Configuration(_) => 902,
            Self::InvariantViolation { .. } => 903,
        }
    }
}

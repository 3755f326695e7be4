//! # Exit: a claim to withdraw a range back to the host ledger
//!
//! ## State Machine
//!
//! ```text
//!   ┌─────────┐  challenge period over   ┌───────────┐
//!   │ PENDING ├─────────────────────────▶│ FINALIZED │
//!   └────┬─┬──┘                          └───────────┘
//!        │ │ overlapping exit finalized first
//!        │ └──────────────────────────────────┐
//!        │ valid challenge                    ▼
//!   ┌────▼───────┐  finalize          ┌─────────────┐
//!   │ CHALLENGED ├───────────────────▶│ INVALIDATED │
//!   └────────────┘                    └─────────────┘
//! ```
//!
//! Transitions are monotonic. An exit cannot be withdrawn by its owner once
//! opened, and terminal exits are never reused. A pending exit is superseded
//! when a higher-priority exit over any of its coordinates finalizes.

use serde::{Deserialize, Serialize};

use crate::{Address, BlockNumber, Coord, ExitId, HostHeight, PlasmaError, Result};

/// The lifecycle state of an exit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ExitState {
    /// Open; waiting for the challenge period to end.
    Pending,
    /// A valid challenge was accepted; the exit will be invalidated.
    Challenged,
    /// The range was removed from the ledger and paid out. Terminal.
    Finalized,
    /// The exit was refuted or superseded; the ledger was not touched. Terminal.
    Invalidated,
}

impl ExitState {
    /// Can an exit in this state move to `target`?
    #[must_use]
    pub fn can_transition_to(&self, target: Self) -> bool {
        matches!(
            (self, target),
            (Self::Pending, Self::Finalized | Self::Challenged)
                | (Self::Pending | Self::Challenged, Self::Invalidated)
        )
    }

    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Finalized | Self::Invalidated)
    }

    /// Still holding a claim over its range.
    #[must_use]
    pub fn is_open(&self) -> bool {
        !self.is_terminal()
    }
}

impl std::fmt::Display for ExitState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "PENDING"),
            Self::Challenged => write!(f, "CHALLENGED"),
            Self::Finalized => write!(f, "FINALIZED"),
            Self::Invalidated => write!(f, "INVALIDATED"),
        }
    }
}

/// How the exiting owner came to hold the range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExitOrigin {
    /// Direct on-core deposit.
    Deposit,
    /// An off-core transfer proven against a committed block.
    Transfer { block_number: BlockNumber },
}

/// Proof that a transfer was included in a committed block.
///
/// Used both to open an exit over a transferred range and as challenge
/// evidence. `proof` is the sibling path only: `(hash || sum)` elements in
/// leaf-to-root order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferProof {
    pub block_number: BlockNumber,
    #[serde(with = "crate::hex_serde::bytes")]
    pub raw_tx: Vec<u8>,
    /// Which transfer of the transaction is being claimed.
    pub transfer_index: usize,
    /// The leaf's own sum.
    pub sum: Coord,
    /// Position of the leaf in the block's tree.
    pub leaf_index: u64,
    #[serde(with = "crate::hex_serde::bytes")]
    pub proof: Vec<u8>,
}

/// A withdrawal claim over `[start, end)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Exit {
    pub id: ExitId,
    pub owner: Address,
    pub token: u32,
    pub start: Coord,
    pub end: Coord,
    pub opened_at: HostHeight,
    pub origin: ExitOrigin,
    /// Spends of this range included in blocks at or after this number
    /// refute the exit.
    pub spendable_from: BlockNumber,
    pub state: ExitState,
}

impl Exit {
    /// Whether this exit's range shares a coordinate with `[start, end)`.
    #[must_use]
    pub fn overlaps(&self, start: Coord, end: Coord) -> bool {
        self.start < end && start < self.end
    }

    /// Host height from which the exit may be finalized.
    #[must_use]
    pub fn ready_at(&self, challenge_period: u64) -> HostHeight {
        self.opened_at.after(challenge_period)
    }

    /// Claimed length, paid out on finalization.
    #[must_use]
    pub fn len(&self) -> Coord {
        self.end - self.start
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }

    fn transition(&mut self, target: ExitState, action: &'static str) -> Result<()> {
        if !self.state.can_transition_to(target) {
            return Err(PlasmaError::InvalidExitState {
                exit: self.id,
                state: self.state,
                action,
            });
        }
        self.state = target;
        Ok(())
    }

    /// PENDING → FINALIZED.
    pub fn mark_finalized(&mut self) -> Result<()> {
        self.transition(ExitState::Finalized, "finalize")
    }

    /// PENDING → CHALLENGED.
    pub fn mark_challenged(&mut self) -> Result<()> {
        self.transition(ExitState::Challenged, "challenge")
    }

    /// CHALLENGED → INVALIDATED.
    pub fn mark_invalidated(&mut self) -> Result<()> {
        if self.state != ExitState::Challenged {
            return Err(PlasmaError::InvalidExitState {
                exit: self.id,
                state: self.state,
                action: "invalidate",
            });
        }
        self.transition(ExitState::Invalidated, "invalidate")
    }

    /// PENDING → INVALIDATED, after an overlapping exit took the range.
    pub fn mark_superseded(&mut self) -> Result<()> {
        if self.state != ExitState::Pending {
            return Err(PlasmaError::InvalidExitState {
                exit: self.id,
                state: self.state,
                action: "supersede",
            });
        }
        self.transition(ExitState::Invalidated, "supersede")
    }
}

/// What finalizing an exit did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExitOutcome {
    /// The range left the ledger; `amount` is owed to `owner` on the host.
    Finalized {
        id: ExitId,
        owner: Address,
        start: Coord,
        end: Coord,
        amount: Coord,
    },
    /// The exit had been challenged; nothing left the ledger.
    Invalidated { id: ExitId },
}

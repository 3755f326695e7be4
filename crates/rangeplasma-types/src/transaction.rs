//! Transfer-transaction model.
//!
//! A transaction moves one or more coordinate ranges between addresses and
//! names the plasma block it is meant for. Its binary form is fixed and lives
//! in `rangeplasma-commitment::codec`; this module only holds the fields.

use serde::{Deserialize, Serialize};

use crate::{Address, BlockNumber, Coord};

/// One range moving from `sender` to `recipient`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Transfer {
    pub sender: Address,
    pub recipient: Address,
    pub token: u32,
    /// Inclusive start of the moved range.
    pub start: Coord,
    /// Exclusive end of the moved range.
    pub end: Coord,
}

impl Transfer {
    /// Length of the moved range.
    #[must_use]
    pub fn len(&self) -> Coord {
        self.end.saturating_sub(self.start)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }

    /// Whether `[start, end)` lies wholly inside this transfer.
    #[must_use]
    pub fn covers(&self, start: Coord, end: Coord) -> bool {
        self.start <= start && end <= self.end
    }

    /// Whether this transfer shares at least one coordinate with `[start, end)`.
    #[must_use]
    pub fn overlaps(&self, start: Coord, end: Coord) -> bool {
        self.start < end && start < self.end
    }
}

/// An ECDSA-style signature. Carried verbatim, never verified by the core.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Signature {
    pub v: u8,
    pub r: [u8; 32],
    pub s: [u8; 32],
}

/// A signed transaction: one signature per transfer, in the same order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    /// The plasma block this transaction is meant to be included in.
    pub block_number: BlockNumber,
    pub transfers: Vec<Transfer>,
    pub signatures: Vec<Signature>,
}

impl Transaction {
    /// Single-transfer transaction with an empty signature.
    #[must_use]
    pub fn single(block_number: BlockNumber, transfer: Transfer) -> Self {
        Self {
            block_number,
            transfers: vec![transfer],
            signatures: vec![Signature::default()],
        }
    }

    /// The transfer at `index`, if any.
    #[must_use]
    pub fn transfer(&self, index: usize) -> Option<&Transfer> {
        self.transfers.get(index)
    }
}

/// Fixture generators for tests. **Never use in production.**
#[cfg(any(test, feature = "test-helpers"))]
impl Transaction {
    /// `n` transactions where transaction `i` sends `[i*20, i*20+10)` from the
    /// zero address to `recipient`.
    pub fn sequential(n: usize, recipient: Address, block_number: BlockNumber) -> Vec<Self> {
        (0..n)
            .map(|i| {
                let start = i as Coord * 20;
                Self::single(
                    block_number,
                    Transfer {
                        sender: Address::ZERO,
                        recipient,
                        token: 0,
                        start,
                        end: start + 10,
                    },
                )
            })
            .collect()
    }
}

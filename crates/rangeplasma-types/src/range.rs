//! Deposited-range entries of the ledger chain.

use serde::{Deserialize, Serialize};

use crate::Coord;

/// One link of the deposited-range chain, keyed by its start.
///
/// `[start, end)` is occupied; `[end, next_deposit_start)` is free. An entry
/// with `end == start` holds nothing but keeps its place in the chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DepositedRange {
    pub end: Coord,
    pub next_deposit_start: Coord,
}

/// A flat view of one chain entry, for snapshots and invariant checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RangeEntry {
    pub start: Coord,
    pub end: Coord,
    pub next_deposit_start: Coord,
}

impl RangeEntry {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.end == self.start
    }

    /// Occupied length.
    #[must_use]
    pub fn len(&self) -> Coord {
        self.end - self.start
    }
}

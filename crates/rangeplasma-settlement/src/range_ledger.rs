//! Range ledger: the authoritative partition of the coordinate space.
//!
//! Entries form a chain keyed by start. Each entry `S` owns the region
//! `[S, next)`: `[S, end)` is deposited and `[end, next)` is free. The chain
//! starts at the [`IMAGINARY_PRECEDING`] head, which never holds coins and
//! always points at the entry keyed `0`.
//!
//! ```text
//!  IP ──▶ 0 ──────────▶ 10 ────────────▶ 30 ──────────▶ MAX_END
//!         [0,0) free    [10,20) free     [30,40) free
//!         to 10         to 30            to MAX_END
//! ```
//!
//! Consecutive entries never touch (`a.end < b.start`), so every deposited
//! coordinate belongs to exactly one entry. Entries emptied by an exit keep
//! their key.

use std::collections::BTreeMap;

use rangeplasma_types::{
    Address, BlockNumber, Coord, DepositedRange, PlasmaError, RangeEntry, Result,
    constants::{IMAGINARY_PRECEDING, MAX_END},
};
use serde::{Deserialize, Serialize};

/// A deposited span attributed to one owner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OwnedSegment {
    pub start: Coord,
    pub end: Coord,
    pub owner: Address,
    /// First plasma block in which these coins could have been spent.
    pub since: BlockNumber,
}

/// What a deposit actually credited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credit {
    /// Key of the entry holding the new coins after merging.
    pub entry: Coord,
    pub start: Coord,
    pub end: Coord,
}

impl Credit {
    #[must_use]
    pub fn amount(&self) -> Coord {
        self.end - self.start
    }
}

/// Sorted, linked partition of `[0, MAX_END)` into deposited and free spans.
#[derive(Debug, Clone)]
pub struct RangeLedger {
    ranges: BTreeMap<Coord, DepositedRange>,
    /// Owner attribution of every deposited coordinate, keyed by start.
    owners: BTreeMap<Coord, OwnedSegment>,
    total_deposited: Coord,
    total_removed: Coord,
}

impl Default for RangeLedger {
    fn default() -> Self {
        Self::new()
    }
}

impl RangeLedger {
    /// An empty ledger holding only the chain head.
    #[must_use]
    pub fn new() -> Self {
        let mut ranges = BTreeMap::new();
        ranges.insert(
            IMAGINARY_PRECEDING,
            DepositedRange {
                end: 0,
                next_deposit_start: 0,
            },
        );
        ranges.insert(
            0,
            DepositedRange {
                end: 0,
                next_deposit_start: MAX_END,
            },
        );
        Self {
            ranges,
            owners: BTreeMap::new(),
            total_deposited: 0,
            total_removed: 0,
        }
    }

    // =========================================================================
    // Mutations
    // =========================================================================

    /// Credit `amount` coins to `depositor`.
    ///
    /// If an entry is keyed at `start`, the coins are appended at its end.
    /// Otherwise `start` must lie in a free gap: it extends the entry to its
    /// left when adjacent, or links a new entry. Reaching the following entry
    /// exactly merges it in.
    ///
    /// # Errors
    /// `InvalidRange` for a zero amount, a start outside the coordinate space,
    /// a start inside a deposited span, or a deposit overrunning the next entry.
    pub fn deposit(
        &mut self,
        depositor: Address,
        start: Coord,
        amount: Coord,
        since: BlockNumber,
    ) -> Result<Credit> {
        if amount == 0 {
            return Err(PlasmaError::invalid_range("deposit amount is zero"));
        }
        if start >= MAX_END {
            return Err(PlasmaError::invalid_range(format!(
                "deposit start {start} is outside the coordinate space"
            )));
        }

        let (anchor, range) = self.region_of(start);
        let (key, base, next) = if anchor == start {
            (anchor, range.end, range.next_deposit_start)
        } else if start < range.end {
            return Err(PlasmaError::invalid_range(format!(
                "{start} lies inside deposited range [{anchor}, {})",
                range.end
            )));
        } else if start == range.end {
            (anchor, start, range.next_deposit_start)
        } else {
            (start, start, range.next_deposit_start)
        };

        let new_end = base
            .checked_add(amount)
            .filter(|end| *end <= next)
            .ok_or_else(|| {
                PlasmaError::invalid_range(format!(
                    "deposit of {amount} at {base} overruns the next range at {next}"
                ))
            })?;

        // Validation done; mutate.
        if key != anchor {
            if let Some(prev) = self.ranges.get_mut(&anchor) {
                prev.next_deposit_start = key;
            }
            tracing::debug!(anchor = %anchor, key = %key, "Linked new range entry");
        }
        let mut entry = DepositedRange {
            end: new_end,
            next_deposit_start: next,
        };
        if new_end == next && next != MAX_END {
            if let Some(absorbed) = self.ranges.remove(&next) {
                tracing::debug!(key = %key, absorbed = %next, "Merged adjacent range entry");
                entry = absorbed;
            }
        }
        self.ranges.insert(key, entry);

        self.owners.insert(
            base,
            OwnedSegment {
                start: base,
                end: new_end,
                owner: depositor,
                since,
            },
        );
        self.total_deposited += amount;

        tracing::info!(
            depositor = %depositor,
            start = %base,
            end = %new_end,
            entry = %key,
            "Deposit credited"
        );

        Ok(Credit {
            entry: key,
            start: base,
            end: new_end,
        })
    }

    /// Clear `[start, end)` from the entry that follows `preceding`.
    ///
    /// The entry's end becomes `start`; anything between `end` and the old end
    /// is split into a new entry keyed at `end`.
    ///
    /// # Errors
    /// - `NoSuchRange` if `preceding` is not a chain key or is the last entry
    /// - `InvalidRange` if the span is empty or not inside that entry
    pub fn remove_range(&mut self, start: Coord, end: Coord, preceding: Coord) -> Result<()> {
        if start >= end {
            return Err(PlasmaError::invalid_range(format!(
                "cannot remove empty span [{start}, {end})"
            )));
        }
        let key = self
            .ranges
            .get(&preceding)
            .map(|r| r.next_deposit_start)
            .ok_or(PlasmaError::NoSuchRange(preceding))?;
        let range = *self.ranges.get(&key).ok_or(PlasmaError::NoSuchRange(key))?;
        if start < key || end > range.end {
            return Err(PlasmaError::invalid_range(format!(
                "[{start}, {end}) is not inside deposited range [{key}, {}) following hint {preceding}",
                range.end
            )));
        }

        let mut shrunk = DepositedRange {
            end: start,
            next_deposit_start: range.next_deposit_start,
        };
        if end < range.end {
            self.ranges.insert(end, range);
            shrunk.next_deposit_start = end;
            tracing::debug!(key = %key, split = %end, "Split range entry");
        }
        self.ranges.insert(key, shrunk);
        self.carve_owners(start, end);
        self.total_removed += end - start;

        tracing::info!(start = %start, end = %end, entry = %key, "Range removed");
        Ok(())
    }

    fn carve_owners(&mut self, start: Coord, end: Coord) {
        let touched: Vec<OwnedSegment> = self
            .owners
            .range(..end)
            .rev()
            .map(|(_, seg)| *seg)
            .take_while(|seg| seg.end > start)
            .collect();
        for seg in touched {
            self.owners.remove(&seg.start);
            if seg.start < start {
                self.owners.insert(seg.start, OwnedSegment { end: start, ..seg });
            }
            if end < seg.end {
                self.owners.insert(end, OwnedSegment { start: end, ..seg });
            }
        }
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// The entry whose region `[key, next)` contains `coord`.
    fn region_of(&self, coord: Coord) -> (Coord, DepositedRange) {
        self.ranges
            .range(..=coord.min(MAX_END))
            .next_back()
            .map_or((0, DepositedRange::default()), |(k, r)| (*k, *r))
    }

    /// `end` of the entry keyed at `start`, or 0 if there is none.
    #[must_use]
    pub fn end(&self, start: Coord) -> Coord {
        self.ranges.get(&start).map_or(0, |r| r.end)
    }

    /// `next_deposit_start` of the entry keyed at `start`, or 0 if there is none.
    #[must_use]
    pub fn next_deposit_start(&self, start: Coord) -> Coord {
        self.ranges.get(&start).map_or(0, |r| r.next_deposit_start)
    }

    /// The raw entry keyed at `start`.
    #[must_use]
    pub fn get(&self, start: Coord) -> Option<&DepositedRange> {
        self.ranges.get(&start)
    }

    /// Whether `[start, end)` is wholly deposited.
    #[must_use]
    pub fn is_deposited(&self, start: Coord, end: Coord) -> bool {
        if start >= end || start >= MAX_END {
            return false;
        }
        let (_, range) = self.region_of(start);
        start < range.end && end <= range.end
    }

    /// The hint [`Self::remove_range`] needs to clear a span starting at
    /// `coord`. `None` if `coord` is not deposited.
    #[must_use]
    pub fn preceding_boundary(&self, coord: Coord) -> Option<Coord> {
        if !self.is_deposited(coord, coord.saturating_add(1)) {
            return None;
        }
        let (key, _) = self.region_of(coord);
        Some(
            self.ranges
                .range(..key)
                .next_back()
                .map_or(IMAGINARY_PRECEDING, |(k, _)| *k),
        )
    }

    /// The owned segment containing `coord`, if it is deposited.
    #[must_use]
    pub fn owner_at(&self, coord: Coord) -> Option<&OwnedSegment> {
        self.owners
            .range(..=coord)
            .next_back()
            .map(|(_, seg)| seg)
            .filter(|seg| coord < seg.end)
    }

    /// Owner segments covering `[start, end)`, clipped to it. Empty unless the
    /// whole span is deposited.
    #[must_use]
    pub fn owners_within(&self, start: Coord, end: Coord) -> Vec<OwnedSegment> {
        if !self.is_deposited(start, end) {
            return Vec::new();
        }
        let first = self
            .owners
            .range(..=start)
            .next_back()
            .map_or(start, |(k, _)| *k);
        self.owners
            .range(first..end)
            .map(|(_, seg)| OwnedSegment {
                start: seg.start.max(start),
                end: seg.end.min(end),
                ..*seg
            })
            .filter(|seg| seg.start < seg.end)
            .collect()
    }

    /// Whether `owner` holds every coordinate of `[start, end)`.
    #[must_use]
    pub fn is_owned_by(&self, owner: Address, start: Coord, end: Coord) -> bool {
        let segments = self.owners_within(start, end);
        !segments.is_empty() && segments.iter().all(|seg| seg.owner == owner)
    }

    /// Non-empty deposited spans in order.
    #[must_use]
    pub fn occupied(&self) -> Vec<(Coord, Coord)> {
        self.entries()
            .into_iter()
            .filter(|e| !e.is_empty())
            .map(|e| (e.start, e.end))
            .collect()
    }

    /// Every chain entry except the head, in key order.
    #[must_use]
    pub fn entries(&self) -> Vec<RangeEntry> {
        self.ranges
            .range(..IMAGINARY_PRECEDING)
            .map(|(start, r)| RangeEntry {
                start: *start,
                end: r.end,
                next_deposit_start: r.next_deposit_start,
            })
            .collect()
    }

    /// Every owned segment in coordinate order.
    #[must_use]
    pub fn owner_segments(&self) -> Vec<OwnedSegment> {
        self.owners.values().copied().collect()
    }

    /// Sum of the lengths of all deposited spans.
    #[must_use]
    pub fn total_occupied(&self) -> Coord {
        self.entries().iter().map(RangeEntry::len).sum()
    }

    /// Cumulative amount ever deposited.
    #[must_use]
    pub fn total_deposited(&self) -> Coord {
        self.total_deposited
    }

    /// Cumulative amount removed by finalized exits.
    #[must_use]
    pub fn total_removed(&self) -> Coord {
        self.total_removed
    }

    /// The chain head entry.
    #[must_use]
    pub fn head(&self) -> DepositedRange {
        self.ranges
            .get(&IMAGINARY_PRECEDING)
            .copied()
            .unwrap_or_default()
    }
}

//! Ledger invariant checker.
//!
//! Checked after every reducer step:
//! ```text
//! chain:   IP → k₀ = 0 → k₁ → … → kₙ → MAX_END, keys strictly increasing
//! entries: kᵢ ≤ endᵢ,  endᵢ < kᵢ₊₁ (consecutive entries never touch)
//! owners:  owner segments tile exactly the deposited spans
//! supply:  Σ occupied == Σ deposited − Σ removed == Σ deposited − Σ finalized exits
//! exits:   every pending exit claims a non-empty, wholly deposited span
//! ```
//!
//! A violation means the ledger can no longer be trusted; the reducer
//! rejects the operation that produced it.

use rangeplasma_types::{
    Coord, ExitState, PlasmaError, Result,
    constants::MAX_END,
};

use crate::exit_game::ExitGame;
use crate::range_ledger::RangeLedger;

fn violation(reason: String) -> PlasmaError {
    PlasmaError::InvariantViolation { reason }
}

/// Stateless checks over the ledger and exit game.
pub struct InvariantChecker;

impl InvariantChecker {
    /// The chain is sorted, linked in key order, and non-touching.
    ///
    /// # Errors
    /// `InvariantViolation` naming the first broken link.
    pub fn verify_partition(ledger: &RangeLedger) -> Result<()> {
        let head = ledger.head();
        if head.end != 0 || head.next_deposit_start != 0 {
            return Err(violation(format!(
                "chain head must be {{end: 0, next: 0}}, found {{end: {}, next: {}}}",
                head.end, head.next_deposit_start
            )));
        }

        let entries = ledger.entries();
        if entries.first().map(|e| e.start) != Some(0) {
            return Err(violation("no entry keyed at 0".into()));
        }

        for (i, entry) in entries.iter().enumerate() {
            let expected_next = entries.get(i + 1).map_or(MAX_END, |n| n.start);
            if entry.next_deposit_start != expected_next {
                return Err(violation(format!(
                    "entry {} links to {} but the next key is {expected_next}",
                    entry.start, entry.next_deposit_start
                )));
            }
            if entry.end < entry.start || entry.end > entry.next_deposit_start {
                return Err(violation(format!(
                    "entry {} has end {} outside [{}, {}]",
                    entry.start, entry.end, entry.start, entry.next_deposit_start
                )));
            }
            if entry.next_deposit_start != MAX_END && entry.end == entry.next_deposit_start {
                return Err(violation(format!(
                    "entry {} touches the next entry at {}",
                    entry.start, entry.end
                )));
            }
        }

        Self::verify_owners(ledger)
    }

    /// Owner segments cover exactly the deposited coordinates.
    fn verify_owners(ledger: &RangeLedger) -> Result<()> {
        let mut covered: Coord = 0;
        let mut cursor: Coord = 0;
        for seg in ledger.owner_segments() {
            if seg.start < cursor || seg.start >= seg.end {
                return Err(violation(format!(
                    "owner segment [{}, {}) overlaps or is empty",
                    seg.start, seg.end
                )));
            }
            if !ledger.is_deposited(seg.start, seg.end) {
                return Err(violation(format!(
                    "owner segment [{}, {}) of {} is not deposited",
                    seg.start, seg.end, seg.owner
                )));
            }
            covered += seg.end - seg.start;
            cursor = seg.end;
        }
        let occupied = ledger.total_occupied();
        if covered != occupied {
            return Err(violation(format!(
                "owners cover {covered} coordinates but {occupied} are deposited"
            )));
        }
        Ok(())
    }

    /// Σ occupied == Σ deposited − Σ removed, and every removed coordinate
    /// was paid out by a finalized exit.
    ///
    /// # Errors
    /// `InvariantViolation` with both sides of the broken equation.
    pub fn verify_supply(ledger: &RangeLedger, exits: &ExitGame) -> Result<()> {
        let occupied = ledger.total_occupied();
        let deposited = ledger.total_deposited();
        let removed = ledger.total_removed();
        if deposited.checked_sub(removed) != Some(occupied) {
            return Err(violation(format!(
                "occupied {occupied} != deposited {deposited} - removed {removed}"
            )));
        }
        let paid = exits.finalized_total();
        if paid != removed {
            return Err(violation(format!(
                "finalized exits paid {paid} but the ledger removed {removed}"
            )));
        }
        Ok(())
    }

    /// Pending exits only claim coins that are still deposited.
    ///
    /// # Errors
    /// `InvariantViolation` naming the first stale exit.
    pub fn verify_exits(ledger: &RangeLedger, exits: &ExitGame) -> Result<()> {
        for exit in exits.iter().filter(|e| e.state == ExitState::Pending) {
            if exit.is_empty() || !ledger.is_deposited(exit.start, exit.end) {
                return Err(violation(format!(
                    "pending {} claims [{}, {}) which is not deposited",
                    exit.id, exit.start, exit.end
                )));
            }
        }
        Ok(())
    }

    /// Run every check.
    ///
    /// # Errors
    /// The first violation found.
    pub fn verify_all(ledger: &RangeLedger, exits: &ExitGame) -> Result<()> {
        Self::verify_partition(ledger)?;
        Self::verify_supply(ledger, exits)?;
        Self::verify_exits(ledger, exits)
    }
}

#[cfg(test)]
mod tests {
    use rangeplasma_types::{Address, BlockNumber, HostHeight, constants::IMAGINARY_PRECEDING};

    use super::*;
    use crate::block_log::BlockLog;
    use crate::exit_game::ExitClaim;

    const ALICE: Address = Address([0xA1; 20]);

    #[test]
    fn fresh_ledger_is_consistent() {
        let ledger = RangeLedger::new();
        InvariantChecker::verify_all(&ledger, &ExitGame::new(20)).unwrap();
    }

    #[test]
    fn deposits_and_removals_stay_consistent() {
        let mut ledger = RangeLedger::new();
        ledger.deposit(ALICE, 0, 50, BlockNumber(1)).unwrap();
        ledger.deposit(ALICE, 100, 50, BlockNumber(1)).unwrap();
        ledger.remove_range(20, 30, IMAGINARY_PRECEDING).unwrap();
        InvariantChecker::verify_partition(&ledger).unwrap();
    }

    #[test]
    fn pending_exit_over_removed_range_is_a_violation() {
        let mut ledger = RangeLedger::new();
        ledger.deposit(ALICE, 0, 50, BlockNumber(1)).unwrap();
        let mut exits = ExitGame::new(20);
        let claim = ExitClaim {
            owner: ALICE,
            token: 0,
            start: 10,
            end: 20,
            proof: None,
        };
        exits
            .begin_exit(&ledger, &BlockLog::new(10, HostHeight(0)), &claim, HostHeight(0))
            .unwrap();
        InvariantChecker::verify_exits(&ledger, &exits).unwrap();

        ledger.remove_range(0, 15, IMAGINARY_PRECEDING).unwrap();
        let err = InvariantChecker::verify_exits(&ledger, &exits).unwrap_err();
        assert!(matches!(err, PlasmaError::InvariantViolation { .. }));
    }

    #[test]
    fn removal_without_exit_breaks_supply() {
        let mut ledger = RangeLedger::new();
        ledger.deposit(ALICE, 0, 50, BlockNumber(1)).unwrap();
        ledger.remove_range(0, 10, IMAGINARY_PRECEDING).unwrap();
        let err = InvariantChecker::verify_supply(&ledger, &ExitGame::new(20)).unwrap_err();
        assert!(matches!(err, PlasmaError::InvariantViolation { .. }));
        assert_eq!(err.code(), 903);
    }
}

//! Exit game: claims that move ranges off the ledger.
//!
//! An exit is opened over a range the caller owns, either by direct deposit
//! or through a transfer proven against a committed block. It may be
//! finalized once `challenge_period` host blocks have passed. Until then a
//! [`ChallengeRule`] may refute it.
//!
//! Exit ids are handed out in arrival order and double as priority: an
//! exit cannot finalize while an overlapping, lower-id exit is still
//! pending. When an exit finalizes, every other pending exit touching its
//! range is superseded, so a pending exit always claims deposited coins.
//!
//! Only the owner may finalize an exit, except that the owner of a pending
//! exit blocked by it may push it through. Priority can therefore delay a
//! later claimant but never freeze their funds.

use std::collections::BTreeMap;

use rangeplasma_commitment::verifier;
use rangeplasma_types::{
    Address, BlockNumber, Coord, Exit, ExitId, ExitOrigin, ExitOutcome, ExitState, HostHeight,
    PlasmaError, Result, TransferProof, constants::NATIVE_TOKEN,
};
use serde::{Deserialize, Serialize};

use crate::block_log::BlockLog;
use crate::challenge::ChallengeRule;
use crate::range_ledger::RangeLedger;

/// A request to open an exit over `[start, end)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExitClaim {
    pub owner: Address,
    #[serde(default)]
    pub token: u32,
    pub start: Coord,
    pub end: Coord,
    /// Present when the range was received through an off-core transfer.
    #[serde(default)]
    pub proof: Option<TransferProof>,
}

/// All exits ever opened, in priority order.
#[derive(Debug, Clone)]
pub struct ExitGame {
    exits: BTreeMap<ExitId, Exit>,
    next_id: ExitId,
    challenge_period: u64,
}

impl ExitGame {
    /// Empty game whose exits wait `challenge_period` host blocks.
    #[must_use]
    pub fn new(challenge_period: u64) -> Self {
        Self {
            exits: BTreeMap::new(),
            next_id: ExitId(0),
            challenge_period,
        }
    }

    /// Open a pending exit.
    ///
    /// # Errors
    /// - `InvalidRange` if the span is empty, not deposited, outside the
    ///   proven transfer, or uses a non-native token without proof
    /// - `NotOwner` if the caller does not hold the span
    /// - `NoSuchBlock`/`InvalidProof`/`InvalidTransfer` from proof checking
    pub fn begin_exit(
        &mut self,
        ledger: &RangeLedger,
        blocks: &BlockLog,
        claim: &ExitClaim,
        now: HostHeight,
    ) -> Result<ExitId> {
        let ExitClaim {
            owner,
            token,
            start,
            end,
            ..
        } = *claim;
        if start >= end {
            return Err(PlasmaError::invalid_range(format!(
                "exit range [{start}, {end}) is empty"
            )));
        }

        let (origin, spendable_from) = match &claim.proof {
            None => (
                ExitOrigin::Deposit,
                Self::check_deposit_ownership(ledger, owner, token, start, end)?,
            ),
            Some(proof) => {
                Self::check_transfer_ownership(ledger, blocks, proof, owner, token, start, end)?;
                (
                    ExitOrigin::Transfer {
                        block_number: proof.block_number,
                    },
                    proof.block_number.next(),
                )
            }
        };

        let id = self.next_id;
        self.next_id = id.next();
        self.exits.insert(
            id,
            Exit {
                id,
                owner,
                token,
                start,
                end,
                opened_at: now,
                origin,
                spendable_from,
                state: ExitState::Pending,
            },
        );

        tracing::info!(
            exit = %id,
            owner = %owner,
            start = %start,
            end = %end,
            ready_at = now.after(self.challenge_period).0,
            "Exit opened"
        );
        Ok(id)
    }

    fn check_deposit_ownership(
        ledger: &RangeLedger,
        owner: Address,
        token: u32,
        start: Coord,
        end: Coord,
    ) -> Result<BlockNumber> {
        if token != NATIVE_TOKEN {
            return Err(PlasmaError::invalid_range(format!(
                "token {token} can only exit with a transfer proof"
            )));
        }
        let segments = ledger.owners_within(start, end);
        if segments.is_empty() {
            return Err(PlasmaError::invalid_range(format!(
                "[{start}, {end}) is not deposited"
            )));
        }
        if let Some(other) = segments.iter().find(|seg| seg.owner != owner) {
            return Err(PlasmaError::NotOwner {
                reason: format!(
                    "[{}, {}) belongs to {}, not {owner}",
                    other.start, other.end, other.owner
                ),
            });
        }
        Ok(segments
            .iter()
            .map(|seg| seg.since)
            .max()
            .unwrap_or_default())
    }

    fn check_transfer_ownership(
        ledger: &RangeLedger,
        blocks: &BlockLog,
        proof: &TransferProof,
        owner: Address,
        token: u32,
        start: Coord,
        end: Coord,
    ) -> Result<()> {
        let root = blocks.root(proof.block_number)?;
        let received = verifier::verify_transfer_proof(&root, proof)?;
        let transfer = received.transfer;

        if transfer.recipient != owner {
            return Err(PlasmaError::NotOwner {
                reason: format!(
                    "transfer in {} pays {}, not {owner}",
                    proof.block_number, transfer.recipient
                ),
            });
        }
        if transfer.token != token {
            return Err(PlasmaError::InvalidTransfer {
                reason: format!("transfer token {} differs from exit token {token}", transfer.token),
            });
        }
        if !transfer.covers(start, end) {
            return Err(PlasmaError::invalid_range(format!(
                "[{start}, {end}) is not inside received range [{}, {})",
                transfer.start, transfer.end
            )));
        }
        if !ledger.is_deposited(start, end) {
            return Err(PlasmaError::invalid_range(format!(
                "[{start}, {end}) is not deposited"
            )));
        }
        Ok(())
    }

    /// Finalize exit `id` once its challenge period is over.
    ///
    /// A challenged exit is invalidated without touching the ledger. A
    /// pending exit removes its range, using `preceding` as the ledger hint,
    /// and supersedes every other pending exit overlapping that range.
    ///
    /// `caller` must own the exit or own a pending exit it blocks.
    ///
    /// # Errors
    /// - `NoSuchExit`, `NotOwner`, `InvalidExitState`, `TooEarly`
    /// - `PriorityConflict` while an overlapping lower-id exit is pending
    /// - any error from [`RangeLedger::remove_range`]
    pub fn finalize_exit(
        &mut self,
        ledger: &mut RangeLedger,
        caller: Address,
        id: ExitId,
        preceding: Coord,
        now: HostHeight,
    ) -> Result<ExitOutcome> {
        let exit = self.exits.get(&id).ok_or(PlasmaError::NoSuchExit(id))?;
        if exit.owner != caller && !self.is_blocked_claimant(caller, exit) {
            return Err(PlasmaError::NotOwner {
                reason: format!("{id} belongs to {}, not {caller}", exit.owner),
            });
        }
        if exit.state.is_terminal() {
            return Err(PlasmaError::InvalidExitState {
                exit: id,
                state: exit.state,
                action: "finalize",
            });
        }
        let ready_at = exit.ready_at(self.challenge_period);
        if now < ready_at {
            return Err(PlasmaError::TooEarly {
                exit: id,
                ready_at,
                now,
            });
        }

        if exit.state == ExitState::Challenged {
            let exit = self.exit_mut(id)?;
            exit.mark_invalidated()?;
            tracing::info!(exit = %id, "Challenged exit invalidated");
            return Ok(ExitOutcome::Invalidated { id });
        }

        if let Some(blocking) = self.blocking_exit(exit) {
            return Err(PlasmaError::PriorityConflict { exit: id, blocking });
        }

        let (owner, start, end, amount) = (exit.owner, exit.start, exit.end, exit.len());
        ledger.remove_range(start, end, preceding)?;
        self.exit_mut(id)?.mark_finalized()?;
        let superseded = self.supersede_overlapping(id, start, end)?;

        tracing::info!(
            exit = %id,
            owner = %owner,
            start = %start,
            end = %end,
            superseded = superseded.len(),
            "Exit finalized"
        );
        Ok(ExitOutcome::Finalized {
            id,
            owner,
            start,
            end,
            amount,
        })
    }

    /// Lowest-id pending exit that overlaps `exit` and precedes it.
    fn blocking_exit(&self, exit: &Exit) -> Option<ExitId> {
        self.exits
            .range(..exit.id)
            .map(|(_, other)| other)
            .find(|other| other.state == ExitState::Pending && other.overlaps(exit.start, exit.end))
            .map(|other| other.id)
    }

    /// Whether `caller` owns a pending exit that `exit` blocks.
    fn is_blocked_claimant(&self, caller: Address, exit: &Exit) -> bool {
        exit.state == ExitState::Pending
            && self
                .exits
                .range(exit.id.next()..)
                .map(|(_, later)| later)
                .any(|later| {
                    later.owner == caller
                        && later.state == ExitState::Pending
                        && later.overlaps(exit.start, exit.end)
                })
    }

    /// Invalidate every pending exit, other than `winner`, that claims a
    /// coordinate of `[start, end)`.
    fn supersede_overlapping(
        &mut self,
        winner: ExitId,
        start: Coord,
        end: Coord,
    ) -> Result<Vec<ExitId>> {
        let losers: Vec<ExitId> = self
            .exits
            .values()
            .filter(|e| e.id != winner && e.state == ExitState::Pending && e.overlaps(start, end))
            .map(|e| e.id)
            .collect();
        for &loser in &losers {
            self.exit_mut(loser)?.mark_superseded()?;
            tracing::info!(exit = %loser, by = %winner, "Exit superseded");
        }
        Ok(losers)
    }

    /// Refute pending exit `id` with `evidence`, as judged by `rule`.
    ///
    /// # Errors
    /// - `NoSuchExit`, `InvalidExitState` for non-pending exits
    /// - `ChallengeWindowClosed` once the challenge period is over
    /// - whatever `rule` rejects the evidence with
    pub fn challenge_exit<R: ChallengeRule + ?Sized>(
        &mut self,
        blocks: &BlockLog,
        id: ExitId,
        evidence: &TransferProof,
        rule: &R,
        now: HostHeight,
    ) -> Result<()> {
        let exit = self.exits.get(&id).ok_or(PlasmaError::NoSuchExit(id))?;
        if exit.state != ExitState::Pending {
            return Err(PlasmaError::InvalidExitState {
                exit: id,
                state: exit.state,
                action: "challenge",
            });
        }
        let closed_at = exit.ready_at(self.challenge_period);
        if now >= closed_at {
            return Err(PlasmaError::ChallengeWindowClosed {
                exit: id,
                closed_at,
                now,
            });
        }

        if let Err(err) = rule.check(exit, evidence, blocks) {
            tracing::warn!(exit = %id, rule = rule.name(), error = %err, "Challenge rejected");
            return Err(err);
        }
        self.exit_mut(id)?.mark_challenged()?;

        tracing::info!(
            exit = %id,
            rule = rule.name(),
            evidence_block = evidence.block_number.0,
            "Exit challenged"
        );
        Ok(())
    }

    fn exit_mut(&mut self, id: ExitId) -> Result<&mut Exit> {
        self.exits.get_mut(&id).ok_or(PlasmaError::NoSuchExit(id))
    }

    /// Look up an exit by id.
    #[must_use]
    pub fn get(&self, id: ExitId) -> Option<&Exit> {
        self.exits.get(&id)
    }

    /// Every exit, in priority order.
    pub fn iter(&self) -> impl Iterator<Item = &Exit> {
        self.exits.values()
    }

    /// Exits that still hold a claim, in priority order.
    pub fn open_exits(&self) -> impl Iterator<Item = &Exit> {
        self.exits.values().filter(|e| e.state.is_open())
    }

    /// Id the next exit will receive.
    #[must_use]
    pub fn next_id(&self) -> ExitId {
        self.next_id
    }

    /// Host blocks an exit waits before it can finalize.
    #[must_use]
    pub fn challenge_period(&self) -> u64 {
        self.challenge_period
    }

    /// Total length removed by finalized exits.
    #[must_use]
    pub fn finalized_total(&self) -> Coord {
        self.exits
            .values()
            .filter(|e| e.state == ExitState::Finalized)
            .map(Exit::len)
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use rangeplasma_commitment::BlockBuilder;
    use rangeplasma_types::{Transaction, Transfer, constants::IMAGINARY_PRECEDING};

    use super::*;
    use crate::challenge::SpentRangeChallenge;

    const ALICE: Address = Address([0xA1; 20]);
    const BOB: Address = Address([0xB0; 20]);
    const PERIOD: u64 = 20;

    struct Fixture {
        ledger: RangeLedger,
        blocks: BlockLog,
        game: ExitGame,
    }

    impl Fixture {
        /// ALICE holds `[0, 50)`.
        fn new() -> Self {
            let mut ledger = RangeLedger::new();
            ledger.deposit(ALICE, 0, 50, BlockNumber(1)).unwrap();
            Self {
                ledger,
                blocks: BlockLog::new(10, HostHeight(0)),
                game: ExitGame::new(PERIOD),
            }
        }

        fn claim(owner: Address, start: Coord, end: Coord) -> ExitClaim {
            ExitClaim {
                owner,
                token: NATIVE_TOKEN,
                start,
                end,
                proof: None,
            }
        }

        fn open(&mut self, owner: Address, start: Coord, end: Coord, now: u64) -> Result<ExitId> {
            self.game.begin_exit(
                &self.ledger,
                &self.blocks,
                &Self::claim(owner, start, end),
                HostHeight(now),
            )
        }

        fn finalize(&mut self, id: ExitId, hint: Coord, now: u64) -> Result<ExitOutcome> {
            let owner = self.game.get(id).map_or(ALICE, |e| e.owner);
            self.game
                .finalize_exit(&mut self.ledger, owner, id, hint, HostHeight(now))
        }

        /// Commit a block where `sender` sends `[start, end)` to `recipient`
        /// and return the proof for it.
        fn commit_transfer(
            &mut self,
            sender: Address,
            recipient: Address,
            start: Coord,
            end: Coord,
            now: u64,
        ) -> TransferProof {
            let number = self.blocks.next_number();
            let tx = Transaction::single(
                number,
                Transfer {
                    sender,
                    recipient,
                    token: NATIVE_TOKEN,
                    start,
                    end,
                },
            );
            let block = BlockBuilder::build(number, vec![tx]).unwrap();
            self.blocks
                .submit_block(block.root(), HostHeight(now))
                .unwrap();
            block.transfer_proof(0, 0).unwrap()
        }
    }

    #[test]
    fn exits_finalize_in_order() {
        let mut f = Fixture::new();
        let a = f.open(ALICE, 0, 10, 0).unwrap();
        let b = f.open(ALICE, 20, 30, 0).unwrap();
        let c = f.open(ALICE, 40, 50, 0).unwrap();
        assert_eq!((a, b, c), (ExitId(0), ExitId(1), ExitId(2)));

        f.finalize(a, IMAGINARY_PRECEDING, PERIOD).unwrap();
        f.finalize(b, 0, PERIOD).unwrap();
        let outcome = f.finalize(c, 10, PERIOD).unwrap();
        assert!(matches!(outcome, ExitOutcome::Finalized { amount: 10, .. }));
        assert_eq!(f.ledger.occupied(), vec![(10, 20), (30, 40)]);
        assert_eq!(f.game.finalized_total(), 30);
        assert_eq!(f.game.open_exits().count(), 0);
    }

    #[test]
    fn finalize_before_period_is_too_early() {
        let mut f = Fixture::new();
        let id = f.open(ALICE, 0, 10, 5).unwrap();
        let err = f.finalize(id, IMAGINARY_PRECEDING, 24).unwrap_err();
        assert!(matches!(
            err,
            PlasmaError::TooEarly {
                ready_at: HostHeight(25),
                ..
            }
        ));
        assert_eq!(f.ledger.end(0), 50);
    }

    #[test]
    fn double_finalize_rejected() {
        let mut f = Fixture::new();
        let id = f.open(ALICE, 0, 10, 0).unwrap();
        f.finalize(id, IMAGINARY_PRECEDING, PERIOD).unwrap();
        let err = f.finalize(id, IMAGINARY_PRECEDING, PERIOD).unwrap_err();
        assert!(matches!(
            err,
            PlasmaError::InvalidExitState {
                state: ExitState::Finalized,
                ..
            }
        ));
    }

    #[test]
    fn only_owner_may_exit_or_finalize() {
        let mut f = Fixture::new();
        assert!(matches!(
            f.open(BOB, 0, 10, 0).unwrap_err(),
            PlasmaError::NotOwner { .. }
        ));
        let id = f.open(ALICE, 0, 10, 0).unwrap();
        let err = f
            .game
            .finalize_exit(&mut f.ledger, BOB, id, IMAGINARY_PRECEDING, HostHeight(PERIOD))
            .unwrap_err();
        assert!(matches!(err, PlasmaError::NotOwner { .. }));
    }

    #[test]
    fn undeposited_range_rejected() {
        let mut f = Fixture::new();
        assert!(matches!(
            f.open(ALICE, 40, 60, 0).unwrap_err(),
            PlasmaError::InvalidRange { .. }
        ));
        assert!(f.open(ALICE, 10, 10, 0).is_err());
        let mut claim = Fixture::claim(ALICE, 0, 10);
        claim.token = 3;
        assert!(
            f.game
                .begin_exit(&f.ledger, &f.blocks, &claim, HostHeight(0))
                .is_err()
        );
        assert_eq!(f.game.next_id(), ExitId(0));
    }

    #[test]
    fn lower_id_has_priority() {
        let mut f = Fixture::new();
        let first = f.open(ALICE, 0, 20, 0).unwrap();
        let second = f.open(ALICE, 10, 30, 0).unwrap();

        let err = f.finalize(second, IMAGINARY_PRECEDING, PERIOD).unwrap_err();
        assert!(matches!(
            err,
            PlasmaError::PriorityConflict { blocking, .. } if blocking == first
        ));

        f.finalize(first, IMAGINARY_PRECEDING, PERIOD).unwrap();
        // [10, 20) is gone, so the later claim is superseded.
        assert_eq!(f.game.get(second).unwrap().state, ExitState::Invalidated);
        let err = f.finalize(second, 0, PERIOD).unwrap_err();
        assert!(matches!(
            err,
            PlasmaError::InvalidExitState {
                state: ExitState::Invalidated,
                ..
            }
        ));
        assert_eq!(f.game.open_exits().count(), 0);
    }

    #[test]
    fn residual_of_superseded_exit_can_still_exit() {
        let mut f = Fixture::new();
        let first = f.open(ALICE, 0, 20, 0).unwrap();
        let second = f.open(ALICE, 10, 30, 0).unwrap();
        f.finalize(first, IMAGINARY_PRECEDING, PERIOD).unwrap();
        assert_eq!(f.game.get(second).unwrap().state, ExitState::Invalidated);

        // [20, 30) is still ALICE's and nothing pending claims it.
        let third = f.open(ALICE, 20, 30, PERIOD).unwrap();
        let hint = f.ledger.preceding_boundary(20).unwrap();
        let outcome = f.finalize(third, hint, 2 * PERIOD).unwrap();
        assert!(matches!(outcome, ExitOutcome::Finalized { amount: 10, .. }));
        assert_eq!(f.ledger.occupied(), vec![(30, 50)]);
        assert_eq!(f.game.finalized_total(), 30);
    }

    #[test]
    fn finalizing_supersedes_only_overlapping_pending_exits() {
        let mut f = Fixture::new();
        let wide = f.open(ALICE, 0, 20, 0).unwrap();
        let inner = f.open(ALICE, 5, 10, 0).unwrap();
        let apart = f.open(ALICE, 30, 40, 0).unwrap();
        let evidence = f.commit_transfer(ALICE, BOB, 30, 40, 10);
        f.game
            .challenge_exit(&f.blocks, apart, &evidence, &SpentRangeChallenge, HostHeight(11))
            .unwrap();

        f.finalize(wide, IMAGINARY_PRECEDING, PERIOD).unwrap();
        assert_eq!(f.game.get(inner).unwrap().state, ExitState::Invalidated);
        assert_eq!(f.game.get(apart).unwrap().state, ExitState::Challenged);
    }

    #[test]
    fn blocked_claimant_may_push_priority_exit() {
        const CAROL: Address = Address([0xC0; 20]);
        let mut f = Fixture::new();
        // ALICE pays BOB [10, 20) in block 1, then exits over it anyway.
        let received = f.commit_transfer(ALICE, BOB, 10, 20, 10);
        let alice = f.open(ALICE, 0, 20, 11).unwrap();
        let claim = ExitClaim {
            proof: Some(received),
            ..Fixture::claim(BOB, 10, 20)
        };
        let bob = f
            .game
            .begin_exit(&f.ledger, &f.blocks, &claim, HostHeight(11))
            .unwrap();

        let ready = HostHeight(11 + PERIOD);
        let err = f
            .game
            .finalize_exit(&mut f.ledger, BOB, bob, 0, ready)
            .unwrap_err();
        assert!(matches!(err, PlasmaError::PriorityConflict { blocking, .. } if blocking == alice));

        // A bystander cannot move ALICE's exit; the blocked claimant can.
        let err = f
            .game
            .finalize_exit(&mut f.ledger, CAROL, alice, IMAGINARY_PRECEDING, ready)
            .unwrap_err();
        assert!(matches!(err, PlasmaError::NotOwner { .. }));
        let outcome = f
            .game
            .finalize_exit(&mut f.ledger, BOB, alice, IMAGINARY_PRECEDING, ready)
            .unwrap();
        assert!(matches!(outcome, ExitOutcome::Finalized { owner, .. } if owner == ALICE));

        // BOB's claim lost to the earlier one and nothing is left frozen.
        assert_eq!(f.game.get(bob).unwrap().state, ExitState::Invalidated);
        assert_eq!(f.game.open_exits().count(), 0);
        assert_eq!(f.ledger.occupied(), vec![(20, 50)]);
    }

    #[test]
    fn exit_via_transfer_proof() {
        let mut f = Fixture::new();
        let proof = f.commit_transfer(ALICE, BOB, 10, 20, 10);

        let claim = ExitClaim {
            proof: Some(proof.clone()),
            ..Fixture::claim(BOB, 12, 18)
        };
        let id = f
            .game
            .begin_exit(&f.ledger, &f.blocks, &claim, HostHeight(11))
            .unwrap();
        let exit = f.game.get(id).unwrap();
        assert_eq!(exit.spendable_from, BlockNumber(2));
        assert_eq!(
            exit.origin,
            ExitOrigin::Transfer {
                block_number: BlockNumber(1)
            }
        );

        // ALICE is not the recipient.
        let stolen = ExitClaim {
            proof: Some(proof.clone()),
            ..Fixture::claim(ALICE, 12, 18)
        };
        assert!(matches!(
            f.game
                .begin_exit(&f.ledger, &f.blocks, &stolen, HostHeight(11))
                .unwrap_err(),
            PlasmaError::NotOwner { .. }
        ));
        // Wider than what was received.
        let greedy = ExitClaim {
            proof: Some(proof),
            ..Fixture::claim(BOB, 5, 18)
        };
        assert!(matches!(
            f.game
                .begin_exit(&f.ledger, &f.blocks, &greedy, HostHeight(11))
                .unwrap_err(),
            PlasmaError::InvalidRange { .. }
        ));
    }

    #[test]
    fn proof_against_missing_block_rejected() {
        let mut f = Fixture::new();
        let mut proof = f.commit_transfer(ALICE, BOB, 10, 20, 10);
        proof.block_number = BlockNumber(9);
        let claim = ExitClaim {
            proof: Some(proof),
            ..Fixture::claim(BOB, 10, 20)
        };
        assert!(matches!(
            f.game
                .begin_exit(&f.ledger, &f.blocks, &claim, HostHeight(11))
                .unwrap_err(),
            PlasmaError::NoSuchBlock(BlockNumber(9))
        ));
    }

    #[test]
    fn challenged_exit_is_invalidated() {
        let mut f = Fixture::new();
        let id = f.open(ALICE, 0, 20, 0).unwrap();
        // ALICE already spent [10, 20) in block 1.
        let evidence = f.commit_transfer(ALICE, BOB, 10, 20, 10);

        f.game
            .challenge_exit(&f.blocks, id, &evidence, &SpentRangeChallenge, HostHeight(12))
            .unwrap();
        assert_eq!(f.game.get(id).unwrap().state, ExitState::Challenged);

        let outcome = f.finalize(id, IMAGINARY_PRECEDING, PERIOD).unwrap();
        assert_eq!(outcome, ExitOutcome::Invalidated { id });
        assert_eq!(f.game.get(id).unwrap().state, ExitState::Invalidated);
        // Ledger untouched.
        assert_eq!(f.ledger.end(0), 50);
    }

    #[test]
    fn challenge_rules_enforced() {
        let mut f = Fixture::new();
        let id = f.open(ALICE, 0, 10, 0).unwrap();

        // Spend by someone else.
        let not_owner = f.commit_transfer(BOB, ALICE, 0, 10, 10);
        assert!(matches!(
            f.game
                .challenge_exit(&f.blocks, id, &not_owner, &SpentRangeChallenge, HostHeight(11))
                .unwrap_err(),
            PlasmaError::InvalidChallenge { .. }
        ));
        // Spend of a different range.
        let elsewhere = f.commit_transfer(ALICE, BOB, 30, 40, 20);
        assert!(
            f.game
                .challenge_exit(&f.blocks, id, &elsewhere, &SpentRangeChallenge, HostHeight(19))
                .is_err()
        );
        // Window closed.
        let spend = f.commit_transfer(ALICE, BOB, 0, 10, 30);
        assert!(matches!(
            f.game
                .challenge_exit(&f.blocks, id, &spend, &SpentRangeChallenge, HostHeight(PERIOD))
                .unwrap_err(),
            PlasmaError::ChallengeWindowClosed { .. }
        ));
        assert_eq!(f.game.get(id).unwrap().state, ExitState::Pending);
    }

    #[test]
    fn spend_before_ownership_is_not_a_challenge() {
        let mut f = Fixture::new();
        // Block 1: ALICE sends [10, 20) to BOB. Block 2: BOB sends it back.
        let old_spend = f.commit_transfer(ALICE, BOB, 10, 20, 10);
        let back = f.commit_transfer(BOB, ALICE, 10, 20, 20);

        let claim = ExitClaim {
            proof: Some(back),
            ..Fixture::claim(ALICE, 10, 20)
        };
        let id = f
            .game
            .begin_exit(&f.ledger, &f.blocks, &claim, HostHeight(21))
            .unwrap();
        assert_eq!(f.game.get(id).unwrap().spendable_from, BlockNumber(3));

        // The spend in block 1 predates the range coming back.
        let err = f
            .game
            .challenge_exit(&f.blocks, id, &old_spend, &SpentRangeChallenge, HostHeight(31))
            .unwrap_err();
        assert!(matches!(err, PlasmaError::InvalidChallenge { .. }));
    }
}

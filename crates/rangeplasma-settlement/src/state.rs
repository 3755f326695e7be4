//! Sequential state reducer.
//!
//! All mutable settlement state lives in one [`PlasmaState`], advanced only
//! through [`PlasmaState::apply`] in host-ledger order:
//! 1. Reject host heights that go backwards
//! 2. Dispatch the operation to the ledger, block log or exit game
//! 3. Verify ledger invariants
//! 4. Bump the state version
//!
//! Every component validates before it mutates, so a rejected operation
//! leaves the state exactly as it was. An invariant violation halts the
//! state: every later operation is refused.

use rangeplasma_commitment::{
    codec,
    verifier::{self, ImplicitBounds, VerifiedTransfer},
};
use rangeplasma_types::{
    Address, Block, BlockNumber, Bytes32, Coord, Exit, ExitId, ExitOutcome, HostHeight,
    PlasmaConfig, PlasmaError, RangeEntry, Result, TransferProof, hex_serde,
};
use serde::{Deserialize, Serialize};

use crate::block_log::BlockLog;
use crate::challenge::{ChallengeRule, SpentRangeChallenge};
use crate::exit_game::{ExitClaim, ExitGame};
use crate::invariants::InvariantChecker;
use crate::range_ledger::{Credit, OwnedSegment, RangeLedger};

/// One state-mutating call, as ordered by the host ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    SubmitBlock {
        #[serde(with = "hex_serde::bytes32")]
        root: Bytes32,
    },
    Deposit {
        depositor: Address,
        start: Coord,
        amount: Coord,
    },
    BeginExit(ExitClaim),
    FinalizeExit {
        caller: Address,
        id: ExitId,
        /// Ledger key preceding the range being removed.
        preceding: Coord,
    },
    ChallengeExit {
        id: ExitId,
        evidence: TransferProof,
    },
}

impl Operation {
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::SubmitBlock { .. } => "submit_block",
            Self::Deposit { .. } => "deposit",
            Self::BeginExit(_) => "begin_exit",
            Self::FinalizeExit { .. } => "finalize_exit",
            Self::ChallengeExit { .. } => "challenge_exit",
        }
    }
}

/// What an applied operation produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Receipt {
    BlockSubmitted { number: BlockNumber },
    Deposited(Credit),
    ExitOpened { id: ExitId },
    ExitResolved(ExitOutcome),
    ExitChallenged { id: ExitId },
}

/// Serializable view of the whole state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateSnapshot {
    pub version: u64,
    pub last_height: HostHeight,
    pub ranges: Vec<RangeEntry>,
    pub owners: Vec<OwnedSegment>,
    pub blocks: Vec<Block>,
    pub exits: Vec<Exit>,
    pub total_deposited: Coord,
    pub total_removed: Coord,
}

#[derive(Debug, Clone)]
pub struct PlasmaState {
    version: u64,
    config: PlasmaConfig,
    ledger: RangeLedger,
    blocks: BlockLog,
    exits: ExitGame,
    last_height: HostHeight,
    halted: Option<String>,
}

impl PlasmaState {
    /// Fresh state deployed at host height `genesis`.
    ///
    /// # Errors
    /// `Configuration` if `config` does not validate.
    pub fn new(config: PlasmaConfig, genesis: HostHeight) -> Result<Self> {
        config.validate()?;
        tracing::info!(
            block_time = config.block_time,
            challenge_period = config.challenge_period,
            genesis = genesis.0,
            "Plasma state initialized"
        );
        Ok(Self {
            version: 0,
            ledger: RangeLedger::new(),
            blocks: BlockLog::new(config.block_time, genesis),
            exits: ExitGame::new(config.challenge_period),
            last_height: genesis,
            halted: None,
            config,
        })
    }

    /// Apply `op` at host height `now`, judging challenges with
    /// [`SpentRangeChallenge`].
    ///
    /// # Errors
    /// `ClockRegression` if `now` is below the last applied height, or
    /// whatever the operation itself is rejected with.
    pub fn apply(&mut self, now: HostHeight, op: &Operation) -> Result<Receipt> {
        self.apply_with_rule(now, op, &SpentRangeChallenge)
    }

    /// [`Self::apply`] with a caller-supplied challenge rule.
    ///
    /// # Errors
    /// See [`Self::apply`].
    pub fn apply_with_rule(
        &mut self,
        now: HostHeight,
        op: &Operation,
        rule: &dyn ChallengeRule,
    ) -> Result<Receipt> {
        if let Some(reason) = &self.halted {
            return Err(PlasmaError::InvariantViolation {
                reason: format!("state halted: {reason}"),
            });
        }
        if now < self.last_height {
            return Err(PlasmaError::ClockRegression {
                last: self.last_height,
                now,
            });
        }

        let receipt = self.dispatch(now, op, rule)?;

        if let Err(err) = InvariantChecker::verify_all(&self.ledger, &self.exits) {
            tracing::error!(op = op.kind(), error = %err, "Invariant violated, halting");
            self.halted = Some(err.to_string());
            return Err(err);
        }

        self.last_height = now;
        self.version += 1;
        tracing::debug!(op = op.kind(), version = self.version, host = now.0, "Operation applied");
        Ok(receipt)
    }

    fn dispatch(
        &mut self,
        now: HostHeight,
        op: &Operation,
        rule: &dyn ChallengeRule,
    ) -> Result<Receipt> {
        match op {
            Operation::SubmitBlock { root } => self
                .blocks
                .submit_block(*root, now)
                .map(|number| Receipt::BlockSubmitted { number }),
            Operation::Deposit {
                depositor,
                start,
                amount,
            } => self
                .ledger
                .deposit(*depositor, *start, *amount, self.blocks.next_number())
                .map(Receipt::Deposited),
            Operation::BeginExit(claim) => self
                .exits
                .begin_exit(&self.ledger, &self.blocks, claim, now)
                .map(|id| Receipt::ExitOpened { id }),
            Operation::FinalizeExit {
                caller,
                id,
                preceding,
            } => self
                .exits
                .finalize_exit(&mut self.ledger, *caller, *id, *preceding, now)
                .map(Receipt::ExitResolved),
            Operation::ChallengeExit { id, evidence } => self
                .exits
                .challenge_exit(&self.blocks, *id, evidence, rule, now)
                .map(|()| Receipt::ExitChallenged { id: *id }),
        }
    }

    // =========================================================================
    // Contract read surface
    // =========================================================================

    #[must_use]
    pub fn deposited_ranges_end(&self, start: Coord) -> Coord {
        self.ledger.end(start)
    }

    #[must_use]
    pub fn deposited_ranges_next_deposit_start(&self, start: Coord) -> Coord {
        self.ledger.next_deposit_start(start)
    }

    #[must_use]
    pub fn get_leaf_hash(&self, raw_tx: &[u8]) -> Bytes32 {
        codec::leaf_hash(raw_tx)
    }

    /// # Errors
    /// `MalformedTransaction` if `raw_tx` is not a valid encoding.
    pub fn decode_block_number(&self, raw_tx: &[u8]) -> Result<BlockNumber> {
        codec::decode_block_number(raw_tx)
    }

    /// # Errors
    /// `MalformedTransaction` if `raw_tx` is invalid or has no transfer `i`.
    pub fn decode_ith_transfer_bounds(&self, i: usize, raw_tx: &[u8]) -> Result<(Coord, Coord)> {
        codec::decode_ith_transfer_bounds(i, raw_tx)
    }

    /// # Errors
    /// `MalformedTransaction` if `raw_tx` is invalid or has no transfer `i`.
    pub fn decode_ith_transfer_from(&self, i: usize, raw_tx: &[u8]) -> Result<Address> {
        codec::decode_ith_transfer_from(i, raw_tx)
    }

    /// # Errors
    /// `MalformedTransaction` if `raw_tx` is invalid or has no transfer `i`.
    pub fn decode_ith_transfer_to(&self, i: usize, raw_tx: &[u8]) -> Result<Address> {
        codec::decode_ith_transfer_to(i, raw_tx)
    }

    /// Prove a leaf against the root committed at `block_number`.
    ///
    /// # Errors
    /// `NoSuchBlock`, `MalformedProof` or `InvalidProof`.
    pub fn check_branch_and_get_bounds(
        &self,
        block_number: BlockNumber,
        leaf_hash: &Bytes32,
        sum: Coord,
        index: u64,
        proof: &[u8],
    ) -> Result<ImplicitBounds> {
        let root = self.blocks.root(block_number)?;
        verifier::check_branch_and_get_bounds(&root, leaf_hash, sum, index, proof)
    }

    /// Prove transfer `transfer_index` of `raw_tx` against block `block_number`.
    ///
    /// # Errors
    /// `NoSuchBlock`, `MalformedTransaction`, `InvalidProof` or `InvalidTransfer`.
    pub fn check_tx_validity_and_get_transfer(
        &self,
        block_number: BlockNumber,
        raw_tx: &[u8],
        transfer_index: usize,
        sum: Coord,
        index: u64,
        proof: &[u8],
    ) -> Result<VerifiedTransfer> {
        let root = self.blocks.root(block_number)?;
        verifier::check_tx_validity_and_get_transfer(
            &root,
            block_number,
            raw_tx,
            transfer_index,
            sum,
            index,
            proof,
        )
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    #[must_use]
    pub fn version(&self) -> u64 {
        self.version
    }

    #[must_use]
    pub fn config(&self) -> &PlasmaConfig {
        &self.config
    }

    #[must_use]
    pub fn ledger(&self) -> &RangeLedger {
        &self.ledger
    }

    #[must_use]
    pub fn blocks(&self) -> &BlockLog {
        &self.blocks
    }

    #[must_use]
    pub fn exits(&self) -> &ExitGame {
        &self.exits
    }

    #[must_use]
    pub fn last_height(&self) -> HostHeight {
        self.last_height
    }

    #[must_use]
    pub fn is_halted(&self) -> bool {
        self.halted.is_some()
    }

    #[must_use]
    pub fn snapshot(&self) -> StateSnapshot {
        StateSnapshot {
            version: self.version,
            last_height: self.last_height,
            ranges: self.ledger.entries(),
            owners: self.ledger.owner_segments(),
            blocks: self.blocks.iter().copied().collect(),
            exits: self.exits.iter().cloned().collect(),
            total_deposited: self.ledger.total_deposited(),
            total_removed: self.ledger.total_removed(),
        }
    }
}

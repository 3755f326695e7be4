//! Block log: append-only store of committed block roots.
//!
//! Submissions are spaced by at least `block_time` host blocks. The first
//! submission is measured from the host height the log was created at.

use std::collections::BTreeMap;

use rangeplasma_types::{Block, BlockNumber, Bytes32, HostHeight, PlasmaError, Result};

#[derive(Debug, Clone)]
pub struct BlockLog {
    blocks: BTreeMap<BlockNumber, Block>,
    block_time: u64,
    /// Host height of the last submission (or of creation).
    last_submitted_at: HostHeight,
    next_number: BlockNumber,
}

impl BlockLog {
    /// An empty log; the first block may be submitted at `created_at + block_time`.
    #[must_use]
    pub fn new(block_time: u64, created_at: HostHeight) -> Self {
        Self {
            blocks: BTreeMap::new(),
            block_time,
            last_submitted_at: created_at,
            next_number: BlockNumber(1),
        }
    }

    /// Host height from which the next submission is accepted.
    #[must_use]
    pub fn earliest_next_submission(&self) -> HostHeight {
        self.last_submitted_at.after(self.block_time)
    }

    /// Append `root` as the next block.
    ///
    /// # Errors
    /// `TooSoon` if fewer than `block_time` host blocks passed since the
    /// previous submission.
    pub fn submit_block(&mut self, root: Bytes32, now: HostHeight) -> Result<BlockNumber> {
        let earliest = self.earliest_next_submission();
        if now < earliest {
            return Err(PlasmaError::TooSoon { earliest, now });
        }

        let number = self.next_number;
        self.blocks.insert(
            number,
            Block {
                number,
                root,
                submitted_at: now,
            },
        );
        self.next_number = number.next();
        self.last_submitted_at = now;

        tracing::info!(
            block = number.0,
            root = hex::encode(root),
            host = now.0,
            "Block submitted"
        );
        Ok(number)
    }

    /// Root committed at `number`.
    ///
    /// # Errors
    /// `NoSuchBlock` if nothing was submitted under that number.
    pub fn root(&self, number: BlockNumber) -> Result<Bytes32> {
        self.block(number)
            .map(|b| b.root)
            .ok_or(PlasmaError::NoSuchBlock(number))
    }

    /// The submitted block numbered `number`.
    #[must_use]
    pub fn block(&self, number: BlockNumber) -> Option<&Block> {
        self.blocks.get(&number)
    }

    /// Whether `number` has been submitted.
    #[must_use]
    pub fn block_exists(&self, number: BlockNumber) -> bool {
        self.blocks.contains_key(&number)
    }

    /// The most recently submitted block.
    #[must_use]
    pub fn latest(&self) -> Option<&Block> {
        self.blocks.values().next_back()
    }

    /// Number the next submission will receive.
    #[must_use]
    pub fn next_number(&self) -> BlockNumber {
        self.next_number
    }

    /// Number of submitted blocks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    /// Whether nothing has been submitted yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Submitted blocks in number order.
    pub fn iter(&self) -> impl Iterator<Item = &Block> {
        self.blocks.values()
    }
}

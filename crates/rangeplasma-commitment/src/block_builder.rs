//! Block builder: produces the Merkle-sum commitment for one plasma block.
//!
//! Operator-side counterpart of the verifier. Takes the block's transactions,
//! orders them by the lowest coordinate any of their transfers touch, assigns
//! each leaf a sum so that the leaves tile the coordinate space from 0, and
//! builds the tree whose root is submitted to the block log.
//!
//! Every transfer of a transaction must fall inside its leaf's tile, so the
//! verifier accepts a proof for any transfer index, not only the first.

use rangeplasma_types::{
    BlockNumber, Bytes32, Coord, PlasmaError, Result, Transaction, Transfer, TransferProof,
};

use crate::codec;
use crate::merkle_sum::{MerkleSumTree, SumNode};

/// A built commitment: encoded transactions in leaf order plus their tree.
#[derive(Debug, Clone)]
pub struct CommittedBlock {
    pub block_number: BlockNumber,
    /// Encoded transactions, in leaf order.
    pub transactions: Vec<Vec<u8>>,
    pub tree: MerkleSumTree,
}

impl CommittedBlock {
    #[must_use]
    pub fn root(&self) -> Bytes32 {
        self.tree.root().hash
    }

    /// Total range length the block commits to.
    #[must_use]
    pub fn total_sum(&self) -> Coord {
        self.tree.root().sum
    }

    /// Ready-to-submit proof for transfer `transfer_index` of leaf `index`.
    ///
    /// `None` if either index is out of range.
    #[must_use]
    pub fn transfer_proof(&self, index: usize, transfer_index: usize) -> Option<TransferProof> {
        let raw = self.transactions.get(index)?;
        if transfer_index >= codec::TxView::parse(raw).ok()?.transfer_count() {
            return None;
        }
        let proof = self.tree.inclusion_proof(index)?;
        Some(TransferProof {
            block_number: self.block_number,
            raw_tx: raw.clone(),
            transfer_index,
            sum: proof.leaf.sum,
            leaf_index: proof.leaf_index,
            proof: proof.sibling_bytes(),
        })
    }

    /// Recompute the leaf hashes and check they match the tree.
    #[must_use]
    pub fn verify_leaves(&self) -> bool {
        self.transactions.len() == self.tree.leaf_count()
            && self
                .transactions
                .iter()
                .enumerate()
                .all(|(i, raw)| self.tree.leaf(i).is_some_and(|l| l.hash == codec::leaf_hash(raw)))
    }
}

/// Lowest start and highest end over a transaction's transfers.
///
/// Transfers inside one transaction may come in any order but must be
/// non-empty and disjoint.
fn span(tx: &Transaction) -> Result<(Coord, Coord)> {
    let mut transfers: Vec<&Transfer> = tx.transfers.iter().collect();
    if transfers.is_empty() {
        return Err(PlasmaError::malformed_tx("transaction has no transfers"));
    }
    if let Some(empty) = transfers.iter().find(|t| t.is_empty()) {
        return Err(PlasmaError::invalid_range(format!(
            "transfer [{}, {}) is empty",
            empty.start, empty.end
        )));
    }
    transfers.sort_by_key(|t| (t.start, t.end));
    for pair in transfers.windows(2) {
        if pair[0].overlaps(pair[1].start, pair[1].end) {
            return Err(PlasmaError::invalid_range(format!(
                "transfers [{}, {}) and [{}, {}) in one transaction overlap",
                pair[0].start, pair[0].end, pair[1].start, pair[1].end
            )));
        }
    }
    let lowest = transfers[0].start;
    let highest = transfers.iter().map(|t| t.end).max().unwrap_or(lowest);
    Ok((lowest, highest))
}

/// Builds block commitments.
pub struct BlockBuilder;

impl BlockBuilder {
    /// Commit `transactions` as block `block_number`.
    ///
    /// 1. Reject transactions meant for another block
    /// 2. Sort by the lowest start over each transaction's transfers
    /// 3. Assign tiling sums: leaf `i` owns `[b_i, b_{i+1})` with `b_0 = 0`,
    ///    `b_i = lowest_i`, and the last boundary at the highest end
    /// 4. Build the Merkle-sum tree
    ///
    /// # Errors
    /// - `InvalidTransfer` if a transaction names a different block
    /// - `InvalidRange` if any transfer is empty, overlaps another transfer,
    ///   or reaches past the start of the next leaf
    /// - `MalformedTransaction` if a transaction has no transfers or cannot
    ///   be encoded
    pub fn build(
        block_number: BlockNumber,
        transactions: Vec<Transaction>,
    ) -> Result<CommittedBlock> {
        if let Some(stray) = transactions
            .iter()
            .find(|tx| tx.block_number != block_number)
        {
            return Err(PlasmaError::InvalidTransfer {
                reason: format!(
                    "transaction for {} cannot be committed in {block_number}",
                    stray.block_number
                ),
            });
        }

        let mut keyed = Vec::with_capacity(transactions.len());
        for tx in transactions {
            keyed.push((span(&tx)?, tx));
        }
        keyed.sort_by_key(|(bounds, _)| *bounds);
        let (bounds, sorted): (Vec<(Coord, Coord)>, Vec<Transaction>) = keyed.into_iter().unzip();

        // Spans are disjoint iff every transfer stays inside its leaf's tile.
        for pair in bounds.windows(2) {
            if pair[1].0 < pair[0].1 {
                return Err(PlasmaError::invalid_range(format!(
                    "transactions spanning [{}, {}) and [{}, {}) overlap",
                    pair[0].0, pair[0].1, pair[1].0, pair[1].1
                )));
            }
        }
        let transferred: Coord = sorted
            .iter()
            .flat_map(|tx| tx.transfers.iter())
            .map(Transfer::len)
            .sum();

        let raws = sorted
            .iter()
            .map(codec::encode_transaction)
            .collect::<Result<Vec<_>>>()?;

        let mut leaves = Vec::with_capacity(raws.len());
        for (i, raw) in raws.iter().enumerate() {
            let lower = if i == 0 { 0 } else { bounds[i].0 };
            let upper = bounds.get(i + 1).map_or(bounds[i].1, |next| next.0);
            leaves.push(SumNode::new(codec::leaf_hash(raw), upper - lower));
        }

        let tree = MerkleSumTree::new(leaves)?;
        tracing::info!(
            block = block_number.0,
            leaves = raws.len(),
            total = %tree.root().sum,
            transferred = %transferred,
            root = hex::encode(tree.root().hash),
            "Block commitment built"
        );

        Ok(CommittedBlock {
            block_number,
            transactions: raws,
            tree,
        })
    }
}

//! Inclusion-proof verification with implicit bounds.
//!
//! Folding a leaf up to the root, the sums of all siblings that sit to the
//! *left* of the path add up to the leaf's implicit start; adding the leaf's
//! own sum gives its implicit end. A block author cannot lie about gaps,
//! because every sibling sum is hashed into the root.

use rangeplasma_types::{
    BlockNumber, Bytes32, Coord, PlasmaError, Result, Transfer, TransferProof,
};

use crate::codec;
use crate::merkle_sum::{SumNode, decode_proof_elements};

/// The sub-range a leaf is proven to own.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImplicitBounds {
    pub start: Coord,
    pub end: Coord,
}

impl ImplicitBounds {
    #[must_use]
    pub fn contains(&self, start: Coord, end: Coord) -> bool {
        self.start <= start && end <= self.end
    }
}

/// A transfer proven to be part of a committed block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VerifiedTransfer {
    pub transfer: Transfer,
    pub block_number: BlockNumber,
    pub bounds: ImplicitBounds,
}

fn overflow() -> PlasmaError {
    PlasmaError::InvalidProof {
        reason: "sum overflow while folding proof".into(),
    }
}

/// Recompute the root from `leaf_hash`/`sum` and the encoded sibling path,
/// compare it with `root`, and return the leaf's implicit bounds.
pub fn check_branch_and_get_bounds(
    root: &Bytes32,
    leaf_hash: &Bytes32,
    sum: Coord,
    index: u64,
    proof: &[u8],
) -> Result<ImplicitBounds> {
    let siblings = decode_proof_elements(proof)?;
    check_branch(root, SumNode::new(*leaf_hash, sum), index, &siblings)
}

/// [`check_branch_and_get_bounds`] over already-decoded siblings.
pub fn check_branch(
    root: &Bytes32,
    leaf: SumNode,
    index: u64,
    siblings: &[SumNode],
) -> Result<ImplicitBounds> {
    let depth = siblings.len();
    if u32::try_from(depth).is_ok_and(|d| index.checked_shr(d).is_some_and(|rest| rest != 0)) {
        return Err(PlasmaError::InvalidProof {
            reason: format!("leaf index {index} does not fit a tree of depth {depth}"),
        });
    }

    let mut node = leaf;
    let mut left_sum: Coord = 0;
    for (level, sibling) in siblings.iter().enumerate() {
        let path_is_right = u32::try_from(level)
            .ok()
            .and_then(|l| index.checked_shr(l))
            .is_some_and(|rest| rest & 1 == 1);
        node = if path_is_right {
            left_sum = left_sum.checked_add(sibling.sum).ok_or_else(overflow)?;
            SumNode::combine(sibling, &node)
        } else {
            SumNode::combine(&node, sibling)
        }
        .ok_or_else(overflow)?;
    }

    if node.hash != *root {
        return Err(PlasmaError::InvalidProof {
            reason: format!(
                "computed root {} does not match committed root {}",
                hex::encode(node.hash),
                hex::encode(root)
            ),
        });
    }

    let end = left_sum.checked_add(leaf.sum).ok_or_else(overflow)?;
    Ok(ImplicitBounds {
        start: left_sum,
        end,
    })
}

/// Decode `raw_tx`, prove it against `root`, and check that transfer
/// `transfer_index` stays inside the proven implicit bounds.
pub fn check_tx_validity_and_get_transfer(
    root: &Bytes32,
    block_number: BlockNumber,
    raw_tx: &[u8],
    transfer_index: usize,
    sum: Coord,
    index: u64,
    proof: &[u8],
) -> Result<VerifiedTransfer> {
    let tx = codec::decode_transaction(raw_tx)?;
    if tx.block_number != block_number {
        return Err(PlasmaError::InvalidTransfer {
            reason: format!(
                "transaction names {} but is checked against {block_number}",
                tx.block_number
            ),
        });
    }
    let transfer = *tx
        .transfer(transfer_index)
        .ok_or_else(|| PlasmaError::InvalidTransfer {
            reason: format!(
                "transfer index {transfer_index} out of range ({} transfers)",
                tx.transfers.len()
            ),
        })?;

    let bounds =
        check_branch_and_get_bounds(root, &codec::leaf_hash(raw_tx), sum, index, proof)?;
    if !bounds.contains(transfer.start, transfer.end) {
        return Err(PlasmaError::InvalidTransfer {
            reason: format!(
                "transfer [{}, {}) exceeds implicit bounds [{}, {})",
                transfer.start, transfer.end, bounds.start, bounds.end
            ),
        });
    }

    Ok(VerifiedTransfer {
        transfer,
        block_number,
        bounds,
    })
}

/// [`check_tx_validity_and_get_transfer`] over a bundled [`TransferProof`].
pub fn verify_transfer_proof(root: &Bytes32, proof: &TransferProof) -> Result<VerifiedTransfer> {
    check_tx_validity_and_get_transfer(
        root,
        proof.block_number,
        &proof.raw_tx,
        proof.transfer_index,
        proof.sum,
        proof.leaf_index,
        &proof.proof,
    )
}

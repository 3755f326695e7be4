//! Property tests for block commitments.
//!
//! For any set of disjoint transfers:
//! - every leaf's proof verifies against the block root
//! - implicit bounds tile `[0, root.sum)` without gaps or overlaps
//! - each transfer lies inside its own implicit bounds
//! - in multi-transfer transactions, every transfer index proves

use proptest::prelude::*;
use rangeplasma_commitment::{BlockBuilder, verifier};
use rangeplasma_types::{Address, BlockNumber, Coord, Transaction, Transfer};

// =============================================================================
// Test Helpers
// =============================================================================

/// Turn `(gap, len)` pairs into disjoint transfers laid out left to right.
fn disjoint_transactions(shape: &[(u32, u32)]) -> Vec<Transaction> {
    let mut cursor: Coord = 0;
    shape
        .iter()
        .enumerate()
        .map(|(i, (gap, len))| {
            let start = cursor + Coord::from(*gap);
            let end = start + Coord::from(*len);
            cursor = end;
            Transaction::single(
                BlockNumber(7),
                Transfer {
                    sender: Address([1; 20]),
                    recipient: Address([u8::try_from(i % 256).unwrap(); 20]),
                    token: 0,
                    start,
                    end,
                },
            )
        })
        .collect()
}

/// Lay out `shape[i]` as one transaction whose transfers are consecutive
/// `(gap, len)` pieces, listed in reverse so the lowest is not first.
fn multi_transfer_transactions(shape: &[Vec<(u32, u32)>]) -> Vec<Transaction> {
    let mut cursor: Coord = 0;
    shape
        .iter()
        .map(|pieces| {
            let mut transfers: Vec<Transfer> = pieces
                .iter()
                .map(|(gap, len)| {
                    let start = cursor + Coord::from(*gap);
                    let end = start + Coord::from(*len);
                    cursor = end;
                    Transfer {
                        sender: Address([1; 20]),
                        recipient: Address([2; 20]),
                        token: 0,
                        start,
                        end,
                    }
                })
                .collect();
            transfers.reverse();
            Transaction {
                block_number: BlockNumber(7),
                signatures: vec![Default::default(); transfers.len()],
                transfers,
            }
        })
        .collect()
}

// =============================================================================
// Properties
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_every_leaf_proves_and_bounds_tile(
        shape in prop::collection::vec((0u32..50, 1u32..50), 1..40),
    ) {
        let txs = disjoint_transactions(&shape);
        let block = BlockBuilder::build(BlockNumber(7), txs.clone()).unwrap();
        let root = block.root();

        let mut expected_start: Coord = 0;
        for (i, tx) in txs.iter().enumerate() {
            let proof = block.transfer_proof(i, 0).unwrap();
            let verified = verifier::verify_transfer_proof(&root, &proof);
            prop_assert!(verified.is_ok(), "leaf {} failed: {:?}", i, verified);
            let verified = verified.unwrap();

            prop_assert_eq!(verified.bounds.start, expected_start);
            prop_assert!(verified.bounds.contains(tx.transfers[0].start, tx.transfers[0].end));
            expected_start = verified.bounds.end;
        }
        prop_assert_eq!(expected_start, block.total_sum());
    }

    #[test]
    fn prop_proof_for_wrong_leaf_index_fails(
        shape in prop::collection::vec((0u32..50, 1u32..50), 2..20),
        pick in any::<prop::sample::Index>(),
    ) {
        let txs = disjoint_transactions(&shape);
        let block = BlockBuilder::build(BlockNumber(7), txs).unwrap();
        let i = pick.index(shape.len());
        let mut proof = block.transfer_proof(i, 0).unwrap();
        proof.leaf_index ^= 1;
        prop_assert!(verifier::verify_transfer_proof(&block.root(), &proof).is_err());
    }

    #[test]
    fn prop_every_transfer_index_proves(
        shape in prop::collection::vec(
            prop::collection::vec((0u32..20, 1u32..20), 1..5),
            1..12,
        ),
    ) {
        let txs = multi_transfer_transactions(&shape);
        let block = BlockBuilder::build(BlockNumber(7), txs.clone()).unwrap();
        let root = block.root();

        for (i, tx) in txs.iter().enumerate() {
            for (j, transfer) in tx.transfers.iter().enumerate() {
                let proof = block.transfer_proof(i, j).unwrap();
                let verified = verifier::verify_transfer_proof(&root, &proof);
                prop_assert!(verified.is_ok(), "leaf {} transfer {} failed: {:?}", i, j, verified);
                prop_assert_eq!(&verified.unwrap().transfer, transfer);
            }
            prop_assert!(block.transfer_proof(i, tx.transfers.len()).is_none());
        }
    }
}

//! # rangeplasma-commitment
//!
//! **Commitment Plane**: everything needed to commit a block of range
//! transfers and to prove a single transfer against that commitment.
//!
//! ## Components
//!
//! 1. **codec**: fixed binary transaction format and leaf hashing
//! 2. **merkle_sum**: Merkle-sum tree whose nodes carry `{hash, sum}`
//! 3. **block_builder**: turns a batch of transactions into a committed block
//! 4. **verifier**: folds an inclusion proof and recovers implicit bounds
//!
//! ## Flow
//!
//! ```text
//! Vec<Transaction> → BlockBuilder::build() → CommittedBlock { root }
//!     → BlockLog::submit_block(root)
//! CommittedBlock::transfer_proof(i, j) → verifier::verify_transfer_proof(root)
//!     → VerifiedTransfer { transfer, bounds }
//! ```
//!
//! The root's sum equals the length of coordinate space the block covers.

pub mod block_builder;
pub mod codec;
pub mod merkle_sum;
pub mod verifier;

pub use block_builder::{BlockBuilder, CommittedBlock};
pub use codec::{TxView, decode_transaction, encode_transaction, leaf_hash};
pub use merkle_sum::{InclusionProof, MerkleSumTree, SumNode};
pub use verifier::{ImplicitBounds, VerifiedTransfer};

//! Merkle-sum tree.
//!
//! Every node carries a hash and the sum of the leaf values below it:
//!
//! ```text
//! parent.hash = SHA-256(left.hash || left.sum || right.hash || right.sum)
//! parent.sum  = left.sum + right.sum
//! ```
//!
//! Sums are encoded as 16-byte big-endian integers. Because sibling sums are
//! hashed into the root, an inclusion proof also pins down *where* in the
//! coordinate space a leaf sits (see [`crate::verifier`]).

use rangeplasma_types::{
    Bytes32, Coord, PlasmaError, Result,
    constants::{PROOF_ELEMENT_LEN, SUM_LEN},
};
use sha2::{Digest, Sha256};

/// A `{hash, sum}` pair: a leaf, an internal node, or a proof element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SumNode {
    pub hash: Bytes32,
    pub sum: Coord,
}

impl SumNode {
    /// Padding leaf.
    pub const EMPTY: Self = Self {
        hash: [0u8; 32],
        sum: 0,
    };

    #[must_use]
    pub fn new(hash: Bytes32, sum: Coord) -> Self {
        Self { hash, sum }
    }

    /// Parent of `left` and `right`. `None` if the sums overflow.
    #[must_use]
    pub fn combine(left: &Self, right: &Self) -> Option<Self> {
        let sum = left.sum.checked_add(right.sum)?;
        let mut hasher = Sha256::new();
        hasher.update(left.hash);
        hasher.update(left.sum.to_be_bytes());
        hasher.update(right.hash);
        hasher.update(right.sum.to_be_bytes());
        Some(Self {
            hash: hasher.finalize().into(),
            sum,
        })
    }

    /// Wire form: `hash[32] || sum[16]`.
    #[must_use]
    pub fn to_bytes(&self) -> [u8; PROOF_ELEMENT_LEN] {
        let mut out = [0u8; PROOF_ELEMENT_LEN];
        out[..32].copy_from_slice(&self.hash);
        out[32..].copy_from_slice(&self.sum.to_be_bytes());
        out
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != PROOF_ELEMENT_LEN {
            return Err(PlasmaError::MalformedProof {
                reason: format!(
                    "proof element must be {PROOF_ELEMENT_LEN} bytes, got {}",
                    bytes.len()
                ),
            });
        }
        let mut hash = [0u8; 32];
        hash.copy_from_slice(&bytes[..32]);
        let mut sum = [0u8; SUM_LEN];
        sum.copy_from_slice(&bytes[32..]);
        Ok(Self {
            hash,
            sum: Coord::from_be_bytes(sum),
        })
    }
}

/// Split a concatenation of proof elements into nodes.
pub fn decode_proof_elements(bytes: &[u8]) -> Result<Vec<SumNode>> {
    if bytes.len() % PROOF_ELEMENT_LEN != 0 {
        return Err(PlasmaError::MalformedProof {
            reason: format!(
                "{} bytes is not a multiple of {PROOF_ELEMENT_LEN}",
                bytes.len()
            ),
        });
    }
    bytes
        .chunks_exact(PROOF_ELEMENT_LEN)
        .map(SumNode::from_bytes)
        .collect()
}

/// Complete binary Merkle-sum tree over a power-of-two padded leaf sequence.
#[derive(Debug, Clone)]
pub struct MerkleSumTree {
    /// All tree levels (padded leaves at index 0, root at last index).
    levels: Vec<Vec<SumNode>>,
    /// Number of real (unpadded) leaves.
    leaf_count: usize,
}

impl MerkleSumTree {
    /// Build the tree. An empty batch becomes a single padding leaf.
    ///
    /// # Errors
    /// [`PlasmaError::InvalidRange`] if the leaf sums overflow the coordinate type.
    pub fn new(leaves: Vec<SumNode>) -> Result<Self> {
        let leaf_count = leaves.len();
        let mut current = leaves;
        let target = current.len().max(1).next_power_of_two();
        current.resize(target, SumNode::EMPTY);

        let mut levels = vec![current.clone()];
        while current.len() > 1 {
            let next = current
                .chunks_exact(2)
                .map(|pair| SumNode::combine(&pair[0], &pair[1]))
                .collect::<Option<Vec<_>>>()
                .ok_or_else(|| PlasmaError::invalid_range("leaf sums overflow"))?;
            levels.push(next.clone());
            current = next;
        }

        Ok(Self { levels, leaf_count })
    }

    /// The top node. Its `sum` is the total range length committed.
    #[must_use]
    pub fn root(&self) -> SumNode {
        self.levels
            .last()
            .and_then(|level| level.first())
            .copied()
            .unwrap_or(SumNode::EMPTY)
    }

    #[must_use]
    pub fn leaf_count(&self) -> usize {
        self.leaf_count
    }

    /// Number of sibling levels between a leaf and the root.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.levels.len() - 1
    }

    #[must_use]
    pub fn leaf(&self, index: usize) -> Option<&SumNode> {
        self.levels[0][..self.leaf_count].get(index)
    }

    #[must_use]
    pub fn levels(&self) -> &[Vec<SumNode>] {
        &self.levels
    }

    /// Inclusion proof for the leaf at `index`; `None` when out of bounds.
    #[must_use]
    pub fn inclusion_proof(&self, index: usize) -> Option<InclusionProof> {
        let leaf = *self.leaf(index)?;
        let mut siblings = Vec::with_capacity(self.depth());
        let mut current = index;
        for level in &self.levels[..self.depth()] {
            siblings.push(level[current ^ 1]);
            current /= 2;
        }
        Some(InclusionProof {
            leaf_index: index as u64,
            leaf,
            siblings,
        })
    }
}

/// The leaf's own node followed by its siblings in leaf-to-root order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InclusionProof {
    pub leaf_index: u64,
    pub leaf: SumNode,
    pub siblings: Vec<SumNode>,
}

impl InclusionProof {
    /// Full wire form, leading with the leaf element.
    #[must_use]
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity((self.siblings.len() + 1) * PROOF_ELEMENT_LEN);
        out.extend_from_slice(&self.leaf.to_bytes());
        out.extend_from_slice(&self.sibling_bytes());
        out
    }

    /// Sibling path only, as consumed by the verifier.
    #[must_use]
    pub fn sibling_bytes(&self) -> Vec<u8> {
        self.siblings.iter().flat_map(SumNode::to_bytes).collect()
    }

    /// Parse the full wire form; the first element is taken as the leaf.
    pub fn from_bytes(leaf_index: u64, bytes: &[u8]) -> Result<Self> {
        let mut nodes = decode_proof_elements(bytes)?;
        if nodes.is_empty() {
            return Err(PlasmaError::MalformedProof {
                reason: "proof carries no leaf element".into(),
            });
        }
        let leaf = nodes.remove(0);
        Ok(Self {
            leaf_index,
            leaf,
            siblings: nodes,
        })
    }
}

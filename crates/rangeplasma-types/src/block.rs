//! Committed plasma blocks.

use serde::{Deserialize, Serialize};

use crate::{BlockNumber, Bytes32, HostHeight};

/// A published commitment: the root hash of one Merkle-sum tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    pub number: BlockNumber,
    #[serde(with = "crate::hex_serde::bytes32")]
    pub root: Bytes32,
    /// Host height at which the root was accepted.
    pub submitted_at: HostHeight,
}

impl Block {
    /// Hex form of the root for logs and snapshots.
    #[must_use]
    pub fn root_hex(&self) -> String {
        hex::encode(self.root)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn root_hex_is_64_chars() {
        let block = Block {
            number: BlockNumber(1),
            root: [0xFF; 32],
            submitted_at: HostHeight(10),
        };
        assert_eq!(block.root_hex().len(), 64);
        assert!(block.root_hex().chars().all(|c| c == 'f'));
    }
}

//! Identifiers and scalar newtypes used throughout RangePlasma.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{PlasmaError, Result};

/// A position in the one-dimensional coordinate space `[0, MAX_END)`.
pub type Coord = u128;

/// A 32-byte digest (leaf hash, node hash, block root).
pub type Bytes32 = [u8; 32];

// ---------------------------------------------------------------------------
// Address
// ---------------------------------------------------------------------------

/// A 20-byte account address on the host ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Default, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct Address(pub [u8; 20]);

impl Address {
    /// The all-zero address.
    pub const ZERO: Self = Self([0u8; 20]);

    #[must_use]
    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    /// Parse a hex address, with or without a `0x` prefix.
    pub fn from_hex(s: &str) -> Result<Self> {
        let raw = hex::decode(s.trim_start_matches("0x"))
            .map_err(|e| PlasmaError::Serialization(format!("address {s}: {e}")))?;
        let bytes: [u8; 20] = raw.try_into().map_err(|v: Vec<u8>| {
            PlasmaError::Serialization(format!("address {s}: expected 20 bytes, got {}", v.len()))
        })?;
        Ok(Self(bytes))
    }

    /// Short form for log lines.
    #[must_use]
    pub fn short(&self) -> String {
        hex::encode(&self.0[..4])
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl From<Address> for String {
    fn from(addr: Address) -> Self {
        addr.to_string()
    }
}

impl TryFrom<String> for Address {
    type Error = PlasmaError;

    fn try_from(s: String) -> Result<Self> {
        Self::from_hex(&s)
    }
}

// ---------------------------------------------------------------------------
// BlockNumber
// ---------------------------------------------------------------------------

/// Number of a committed plasma block. The first submitted block is 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Default, Serialize, Deserialize)]
pub struct BlockNumber(pub u64);

impl BlockNumber {
    #[must_use]
    pub fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl fmt::Display for BlockNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "block:{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// HostHeight
// ---------------------------------------------------------------------------

/// The host ledger's block count. Read by the core, advanced only externally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Default, Serialize, Deserialize)]
pub struct HostHeight(pub u64);

impl HostHeight {
    /// The height `blocks` host blocks after this one.
    #[must_use]
    pub fn after(self, blocks: u64) -> Self {
        Self(self.0.saturating_add(blocks))
    }
}

impl fmt::Display for HostHeight {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "host:{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// ExitId
// ---------------------------------------------------------------------------

/// Identifier of an exit. Ids are handed out in arrival order, and a lower id
/// has priority over a higher one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Default, Serialize, Deserialize)]
pub struct ExitId(pub u64);

impl ExitId {
    #[must_use]
    pub fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl fmt::Display for ExitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "exit:{}", self.0)
    }
}

/// Random address for tests. **Never use in production.**
#[cfg(any(test, feature = "test-helpers"))]
impl Address {
    pub fn random() -> Self {
        Self(rand::random::<[u8; 20]>())
    }
}

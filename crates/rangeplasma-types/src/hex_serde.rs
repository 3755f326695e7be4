//! Serde adapters that write byte strings as lowercase hex.
//!
//! ```ignore
//! #[serde(with = "crate::hex_serde::bytes")]
//! pub raw_tx: Vec<u8>,
//! ```

/// `Vec<u8>` as a hex string, `0x` prefix optional on input.
pub mod bytes {
    use serde::{Deserialize, Deserializer, Serializer, de::Error};

    pub fn serialize<S: Serializer>(value: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&hex::encode(value))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let s = String::deserialize(deserializer)?;
        hex::decode(s.trim_start_matches("0x")).map_err(D::Error::custom)
    }
}

/// `[u8; 32]` as a 64-character hex string.
pub mod bytes32 {
    use serde::{Deserialize, Deserializer, Serializer, de::Error};

    use crate::Bytes32;

    pub fn serialize<S: Serializer>(value: &Bytes32, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&hex::encode(value))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Bytes32, D::Error> {
        let s = String::deserialize(deserializer)?;
        let raw = hex::decode(s.trim_start_matches("0x")).map_err(D::Error::custom)?;
        raw.try_into()
            .map_err(|v: Vec<u8>| D::Error::custom(format!("expected 32 bytes, got {}", v.len())))
    }
}

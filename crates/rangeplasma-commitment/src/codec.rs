//! Fixed binary transaction format.
//!
//! ```text
//! block_number[32]
//! transfer_count[1]
//! transfer_count × ( sender[20] | recipient[20] | token[4] | start[12] | end[12] )
//! transfer_count × ( v[1] | r[32] | s[32] )
//! ```
//!
//! All integers are big-endian. The leaf hash of a transaction is the SHA-256
//! digest of its full encoding.

use rangeplasma_types::{
    Address, BlockNumber, Bytes32, Coord, PlasmaError, Result, Signature, Transaction, Transfer,
    constants::{ADDRESS_LEN, BLOCK_NUMBER_LEN, COORD_LEN, SIGNATURE_LEN, TOKEN_LEN, TRANSFER_LEN},
};
use sha2::{Digest, Sha256};

/// Largest encodable coordinate plus one (96-bit field).
const COORD_LIMIT: Coord = 1 << (8 * COORD_LEN);

/// Offset of the first transfer.
const TRANSFERS_OFFSET: usize = BLOCK_NUMBER_LEN + 1;

/// Total encoded length of a transaction carrying `count` transfers.
#[must_use]
pub fn encoded_len(count: usize) -> usize {
    TRANSFERS_OFFSET + count * (TRANSFER_LEN + SIGNATURE_LEN)
}

/// Encode a transaction into its fixed binary form.
pub fn encode_transaction(tx: &Transaction) -> Result<Vec<u8>> {
    let count = u8::try_from(tx.transfers.len())
        .map_err(|_| PlasmaError::malformed_tx("more than 255 transfers"))?;
    if count == 0 {
        return Err(PlasmaError::malformed_tx("transaction has no transfers"));
    }
    if tx.signatures.len() != tx.transfers.len() {
        return Err(PlasmaError::malformed_tx(format!(
            "{} transfers but {} signatures",
            tx.transfers.len(),
            tx.signatures.len()
        )));
    }

    let mut out = Vec::with_capacity(encoded_len(tx.transfers.len()));
    let mut block = [0u8; BLOCK_NUMBER_LEN];
    block[BLOCK_NUMBER_LEN - 8..].copy_from_slice(&tx.block_number.0.to_be_bytes());
    out.extend_from_slice(&block);
    out.push(count);

    for (i, t) in tx.transfers.iter().enumerate() {
        if t.is_empty() {
            return Err(PlasmaError::malformed_tx(format!(
                "transfer {i} is empty: [{}, {})",
                t.start, t.end
            )));
        }
        if t.end >= COORD_LIMIT {
            return Err(PlasmaError::malformed_tx(format!(
                "transfer {i} end {} exceeds 96 bits",
                t.end
            )));
        }
        out.extend_from_slice(t.sender.as_bytes());
        out.extend_from_slice(t.recipient.as_bytes());
        out.extend_from_slice(&t.token.to_be_bytes());
        out.extend_from_slice(&coord_bytes(t.start));
        out.extend_from_slice(&coord_bytes(t.end));
    }
    for sig in &tx.signatures {
        out.push(sig.v);
        out.extend_from_slice(&sig.r);
        out.extend_from_slice(&sig.s);
    }
    Ok(out)
}

/// Decode and validate a full transaction.
pub fn decode_transaction(raw: &[u8]) -> Result<Transaction> {
    TxView::parse(raw)?.decode()
}

/// Canonical leaf hash: SHA-256 over the raw encoding.
#[must_use]
pub fn leaf_hash(raw: &[u8]) -> Bytes32 {
    Sha256::digest(raw).into()
}

/// Block number the transaction was signed for.
pub fn decode_block_number(raw: &[u8]) -> Result<BlockNumber> {
    TxView::parse(raw)?.block_number()
}

/// `(start, end)` of transfer `i`, unchecked.
pub fn decode_ith_transfer_bounds(i: usize, raw: &[u8]) -> Result<(Coord, Coord)> {
    TxView::parse(raw)?.bounds(i)
}

pub fn decode_ith_transfer_from(i: usize, raw: &[u8]) -> Result<Address> {
    TxView::parse(raw)?.sender(i)
}

pub fn decode_ith_transfer_to(i: usize, raw: &[u8]) -> Result<Address> {
    TxView::parse(raw)?.recipient(i)
}

/// Borrowed, length-checked view over an encoded transaction.
///
/// Field accessors read straight from the buffer at fixed offsets, so the
/// `decode_ith_*` lookups never materialize the whole transaction.
#[derive(Debug, Clone, Copy)]
pub struct TxView<'a> {
    raw: &'a [u8],
    count: usize,
}

impl<'a> TxView<'a> {
    pub fn parse(raw: &'a [u8]) -> Result<Self> {
        if raw.len() < TRANSFERS_OFFSET {
            return Err(PlasmaError::malformed_tx(format!(
                "{} bytes is shorter than the {TRANSFERS_OFFSET}-byte header",
                raw.len()
            )));
        }
        let count = usize::from(raw[BLOCK_NUMBER_LEN]);
        if count == 0 {
            return Err(PlasmaError::malformed_tx("transaction has no transfers"));
        }
        let expected = encoded_len(count);
        if raw.len() != expected {
            return Err(PlasmaError::malformed_tx(format!(
                "expected {expected} bytes for {count} transfers, got {}",
                raw.len()
            )));
        }
        Ok(Self { raw, count })
    }

    #[must_use]
    pub fn transfer_count(&self) -> usize {
        self.count
    }

    pub fn block_number(&self) -> Result<BlockNumber> {
        let (high, low) = self.raw[..BLOCK_NUMBER_LEN].split_at(BLOCK_NUMBER_LEN - 8);
        if high.iter().any(|b| *b != 0) {
            return Err(PlasmaError::malformed_tx("block number exceeds 64 bits"));
        }
        let mut buf = [0u8; 8];
        buf.copy_from_slice(low);
        Ok(BlockNumber(u64::from_be_bytes(buf)))
    }

    fn transfer_bytes(&self, i: usize) -> Result<&'a [u8]> {
        if i >= self.count {
            return Err(PlasmaError::malformed_tx(format!(
                "transfer index {i} out of range ({} transfers)",
                self.count
            )));
        }
        let offset = TRANSFERS_OFFSET + i * TRANSFER_LEN;
        Ok(&self.raw[offset..offset + TRANSFER_LEN])
    }

    pub fn sender(&self, i: usize) -> Result<Address> {
        Ok(read_address(&self.transfer_bytes(i)?[..ADDRESS_LEN]))
    }

    pub fn recipient(&self, i: usize) -> Result<Address> {
        Ok(read_address(
            &self.transfer_bytes(i)?[ADDRESS_LEN..2 * ADDRESS_LEN],
        ))
    }

    pub fn token(&self, i: usize) -> Result<u32> {
        let bytes = &self.transfer_bytes(i)?[2 * ADDRESS_LEN..2 * ADDRESS_LEN + TOKEN_LEN];
        let mut buf = [0u8; TOKEN_LEN];
        buf.copy_from_slice(bytes);
        Ok(u32::from_be_bytes(buf))
    }

    /// Raw `(start, end)` of transfer `i`, without ordering checks.
    pub fn bounds(&self, i: usize) -> Result<(Coord, Coord)> {
        let bytes = self.transfer_bytes(i)?;
        let start_at = 2 * ADDRESS_LEN + TOKEN_LEN;
        Ok((
            read_coord(&bytes[start_at..start_at + COORD_LEN]),
            read_coord(&bytes[start_at + COORD_LEN..]),
        ))
    }

    pub fn signature(&self, i: usize) -> Result<Signature> {
        if i >= self.count {
            return Err(PlasmaError::malformed_tx(format!(
                "signature index {i} out of range ({} signatures)",
                self.count
            )));
        }
        let offset = TRANSFERS_OFFSET + self.count * TRANSFER_LEN + i * SIGNATURE_LEN;
        let bytes = &self.raw[offset..offset + SIGNATURE_LEN];
        let mut sig = Signature {
            v: bytes[0],
            ..Signature::default()
        };
        sig.r.copy_from_slice(&bytes[1..33]);
        sig.s.copy_from_slice(&bytes[33..]);
        Ok(sig)
    }

    /// Transfer `i` with its range checked to be non-empty.
    pub fn transfer(&self, i: usize) -> Result<Transfer> {
        let (start, end) = self.bounds(i)?;
        if start >= end {
            return Err(PlasmaError::malformed_tx(format!(
                "transfer {i} is empty: [{start}, {end})"
            )));
        }
        Ok(Transfer {
            sender: self.sender(i)?,
            recipient: self.recipient(i)?,
            token: self.token(i)?,
            start,
            end,
        })
    }

    pub fn decode(&self) -> Result<Transaction> {
        Ok(Transaction {
            block_number: self.block_number()?,
            transfers: (0..self.count)
                .map(|i| self.transfer(i))
                .collect::<Result<_>>()?,
            signatures: (0..self.count)
                .map(|i| self.signature(i))
                .collect::<Result<_>>()?,
        })
    }
}

fn coord_bytes(c: Coord) -> [u8; COORD_LEN] {
    let mut out = [0u8; COORD_LEN];
    out.copy_from_slice(&c.to_be_bytes()[16 - COORD_LEN..]);
    out
}

fn read_coord(bytes: &[u8]) -> Coord {
    let mut buf = [0u8; 16];
    buf[16 - COORD_LEN..].copy_from_slice(bytes);
    Coord::from_be_bytes(buf)
}

fn read_address(bytes: &[u8]) -> Address {
    let mut buf = [0u8; ADDRESS_LEN];
    buf.copy_from_slice(bytes);
    Address(buf)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_tx() -> Transaction {
        Transaction {
            block_number: BlockNumber(7),
            transfers: vec![
                Transfer {
                    sender: Address([1; 20]),
                    recipient: Address([2; 20]),
                    token: 3,
                    start: 100,
                    end: 250,
                },
                Transfer {
                    sender: Address([4; 20]),
                    recipient: Address([5; 20]),
                    token: 0,
                    start: 900,
                    end: (1 << 96) - 1,
                },
            ],
            signatures: vec![
                Signature {
                    v: 27,
                    r: [0xAA; 32],
                    s: [0xBB; 32],
                },
                Signature::default(),
            ],
        }
    }

    #[test]
    fn encoded_length_is_fixed() {
        let raw = encode_transaction(&sample_tx()).unwrap();
        assert_eq!(raw.len(), 33 + 2 * (68 + 65));
        assert_eq!(raw.len(), encoded_len(2));
    }

    #[test]
    fn decode_inverts_encode() {
        let tx = sample_tx();
        let raw = encode_transaction(&tx).unwrap();
        assert_eq!(decode_transaction(&raw).unwrap(), tx);
    }

    #[test]
    fn ith_accessors_return_constructed_fields() {
        let tx = sample_tx();
        let raw = encode_transaction(&tx).unwrap();
        assert_eq!(decode_block_number(&raw).unwrap(), BlockNumber(7));
        for (i, t) in tx.transfers.iter().enumerate() {
            assert_eq!(decode_ith_transfer_bounds(i, &raw).unwrap(), (t.start, t.end));
            assert_eq!(decode_ith_transfer_from(i, &raw).unwrap(), t.sender);
            assert_eq!(decode_ith_transfer_to(i, &raw).unwrap(), t.recipient);
        }
    }

    #[test]
    fn transfer_index_out_of_range() {
        let raw = encode_transaction(&sample_tx()).unwrap();
        let err = decode_ith_transfer_from(2, &raw).unwrap_err();
        assert!(matches!(err, PlasmaError::MalformedTransaction { .. }));
    }

    #[test]
    fn truncated_input_rejected() {
        let raw = encode_transaction(&sample_tx()).unwrap();
        assert!(decode_transaction(&raw[..raw.len() - 1]).is_err());
        assert!(decode_transaction(&raw[..10]).is_err());
        assert!(decode_transaction(&[]).is_err());
    }

    #[test]
    fn zero_transfer_count_rejected() {
        let mut raw = vec![0u8; 33];
        raw[32] = 0;
        let err = TxView::parse(&raw).unwrap_err();
        assert!(matches!(err, PlasmaError::MalformedTransaction { .. }));
    }

    #[test]
    fn oversized_block_number_rejected() {
        let mut raw = encode_transaction(&sample_tx()).unwrap();
        raw[0] = 1;
        let err = decode_block_number(&raw).unwrap_err();
        assert!(matches!(err, PlasmaError::MalformedTransaction { .. }));
    }

    #[test]
    fn empty_transfer_rejected_both_ways() {
        let mut tx = sample_tx();
        tx.transfers[0].end = tx.transfers[0].start;
        assert!(encode_transaction(&tx).is_err());

        // Corrupt a valid encoding so that end < start.
        let mut raw = encode_transaction(&sample_tx()).unwrap();
        let end_at = TRANSFERS_OFFSET + 2 * ADDRESS_LEN + TOKEN_LEN + COORD_LEN;
        raw[end_at..end_at + COORD_LEN].fill(0);
        assert!(decode_transaction(&raw).is_err());
        // The raw accessor still reports what is on the wire.
        assert_eq!(decode_ith_transfer_bounds(0, &raw).unwrap(), (100, 0));
    }

    #[test]
    fn wide_coordinates_rejected() {
        let mut tx = sample_tx();
        tx.transfers[1].end = 1 << 96;
        assert!(encode_transaction(&tx).is_err());
    }

    #[test]
    fn signature_count_must_match() {
        let mut tx = sample_tx();
        tx.signatures.pop();
        assert!(encode_transaction(&tx).is_err());
    }

    #[test]
    fn leaf_hash_tracks_every_byte() {
        let raw = encode_transaction(&sample_tx()).unwrap();
        let h1 = leaf_hash(&raw);
        assert_eq!(h1, leaf_hash(&raw));
        let mut tampered = raw.clone();
        let last = tampered.len() - 1;
        tampered[last] ^= 0x01;
        assert_ne!(h1, leaf_hash(&tampered));
    }
}

//! System-wide constants for the RangePlasma settlement core.

use crate::Coord;

/// Exclusive upper bound of the coordinate space, `2^127 - 1`.
pub const MAX_END: Coord = (1 << 127) - 1;

/// Reserved key for the head of the deposited-range chain. Its
/// `next_deposit_start` points at the first range; it never holds coins.
pub const IMAGINARY_PRECEDING: Coord = MAX_END + 1;

/// The token id of coins entering through on-core deposits.
pub const NATIVE_TOKEN: u32 = 0;

/// Default minimum number of host blocks between two block submissions.
pub const DEFAULT_BLOCK_TIME: u64 = 10;

/// Default number of host blocks an exit stays open before it can finalize.
pub const DEFAULT_CHALLENGE_PERIOD: u64 = 20;

/// Width of an encoded block number.
pub const BLOCK_NUMBER_LEN: usize = 32;

/// Width of an encoded address.
pub const ADDRESS_LEN: usize = 20;

/// Width of an encoded token id.
pub const TOKEN_LEN: usize = 4;

/// Width of an encoded transfer coordinate (96 bits).
pub const COORD_LEN: usize = 12;

/// Encoded transfer: sender, recipient, token, start, end.
pub const TRANSFER_LEN: usize = 2 * ADDRESS_LEN + TOKEN_LEN + 2 * COORD_LEN;

/// Encoded signature: v, r, s.
pub const SIGNATURE_LEN: usize = 1 + 32 + 32;

/// Width of a sum inside a Merkle-sum node or proof element.
pub const SUM_LEN: usize = 16;

/// One proof element on the wire: `hash || sum`.
pub const PROOF_ELEMENT_LEN: usize = 32 + SUM_LEN;

/// Version string.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn max_end_matches_reference_value() {
        assert_eq!(
            MAX_END.to_string(),
            "170141183460469231731687303715884105727"
        );
        assert_eq!(IMAGINARY_PRECEDING, MAX_END + 1);
    }

    #[test]
    fn wire_widths() {
        assert_eq!(TRANSFER_LEN, 68);
        assert_eq!(SIGNATURE_LEN, 65);
        assert_eq!(PROOF_ELEMENT_LEN, 48);
    }
}

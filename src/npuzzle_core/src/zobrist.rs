//! Incremental board fingerprinting.
//!
//! Every (piece, square) pair has a fixed 64-bit key, and a board's
//! fingerprint is the XOR of the keys of all pieces at their current
//! squares, the empty tile excluded. XOR is its own inverse, so a move
//! folds out the moved piece's old key and folds in its new one, and any
//! two move sequences reaching the same board agree on the fingerprint.

/// Key for one piece sitting on one square.
///
/// SplitMix64's output mix over the packed pair. Squares and pieces are
/// both below 2^16, so the packing is injective for every board size.
#[must_use]
pub(crate) fn piece_key(piece: u16, square: usize) -> u64 {
    let mut x = (u64::from(piece) << 16) | square as u64;
    x = x.wrapping_add(0x9e37_79b9_7f4a_7c15);
    x = (x ^ (x >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
    x = (x ^ (x >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
    x ^ (x >> 31)
}

/// Fingerprint delta for moving `piece` between `from` and `to`.
#[must_use]
pub(crate) fn move_key(piece: u16, from: usize, to: usize) -> u64 {
    piece_key(piece, from) ^ piece_key(piece, to)
}

/// Fingerprint of a whole board, folding every square but the hole.
#[must_use]
pub(crate) fn board_fingerprint(board: &[u16], hole_idx: usize) -> u64 {
    board
        .iter()
        .enumerate()
        .filter(|&(square, _)| square != hole_idx)
        .fold(0, |acc, (square, &piece)| acc ^ piece_key(piece, square))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn move_key_is_symmetric() {
        assert_eq!(move_key(3, 1, 2), move_key(3, 2, 1));
        assert_eq!(move_key(3, 1, 2) ^ move_key(3, 2, 1), 0);
    }

    #[test]
    fn keys_spread() {
        // Nearby pairs must not collide for the XOR fold to stay
        // discriminating.
        let mut keys: Vec<u64> = (0..64_u16)
            .flat_map(|piece| (0..64).map(move |square| piece_key(piece, square)))
            .collect();
        keys.sort_unstable();
        keys.dedup();
        assert_eq!(keys.len(), 64 * 64);
    }

    #[test]
    fn fingerprint_ignores_the_hole_square() {
        let board = [0_u16, 1, 2, 3];
        let by_hand = piece_key(1, 1) ^ piece_key(2, 2) ^ piece_key(3, 3);
        assert_eq!(board_fingerprint(&board, 0), by_hand);
    }
}

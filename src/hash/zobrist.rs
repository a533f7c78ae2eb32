//! Zobrist keys and the from-scratch hash recompute.
//!
//! Four key families: one per (colored piece, square), one per en passant
//! square, one per full 4-bit castling mask, and a single side key. Castle
//! permission changes always toggle the *old* 16-way key and then the new
//! one, so the full mask is the index, never individual right bits.
//!
//! Keys come from a fixed-seed xorshift-multiply generator rather than an
//! OS-seeded RNG, so hashes are stable across runs and test failures are
//! reproducible.

use crate::board::{Board, Color, Piece, BOTH, EMPTY};
use crate::bitboard::test_bit;
use crate::square::NO_SQ;
use once_cell::sync::Lazy;

pub struct ZobristKeys {
    /// Indexed by colored piece (`piece + color * 6`) and square.
    pub piece: [[u64; 64]; 12],
    pub ep: [u64; 64],
    /// Indexed by the full 4-bit castle permission mask.
    pub castle: [u64; 16],
    pub side: u64,
}

/// Colored-piece index for the key table.
#[inline(always)]
pub fn colored(piece: Piece, color: Color) -> usize {
    piece as usize + color as usize * 6
}

struct XorShift {
    state: u64,
}

impl XorShift {
    fn next(&mut self) -> u64 {
        self.state ^= self.state >> 12;
        self.state ^= self.state << 21;
        self.state ^= self.state >> 27;
        self.state.wrapping_mul(0x2545_F491_4F6C_DD1D)
    }
}

static KEYS: Lazy<ZobristKeys> = Lazy::new(|| {
    let mut rng = XorShift {
        state: 0xD916_3F3D_E9C7_1A8B,
    };
    let mut keys = ZobristKeys {
        piece: [[0; 64]; 12],
        ep: [0; 64],
        castle: [0; 16],
        side: 0,
    };
    for piece in keys.piece.iter_mut() {
        for key in piece.iter_mut() {
            *key = rng.next();
        }
    }
    for key in keys.ep.iter_mut() {
        *key = rng.next();
    }
    for key in keys.castle.iter_mut() {
        *key = rng.next();
    }
    keys.side = rng.next();
    keys
});

pub fn keys() -> &'static ZobristKeys {
    &KEYS
}

/// Full recompute from board state. Slow; the incremental hash must match
/// this after every make and undo.
pub fn compute(board: &Board) -> u64 {
    let keys = keys();
    let mut hash = 0u64;

    for sq in 0..64u8 {
        let piece = board.squares[sq as usize];
        if piece == EMPTY {
            continue;
        }
        debug_assert!(test_bit(board.colors[BOTH], sq));
        let color = if test_bit(board.colors[Color::White as usize], sq) {
            Color::White
        } else {
            Color::Black
        };
        hash ^= keys.piece[colored(Piece::from_index(piece), color)][sq as usize];
    }

    if board.ep_square != NO_SQ {
        hash ^= keys.ep[board.ep_square as usize];
    }

    hash ^= keys.castle[board.castle_perm as usize];

    if board.side == Color::Black {
        hash ^= keys.side;
    }

    hash
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_are_deterministic_and_distinct() {
        let keys = keys();
        assert_ne!(keys.piece[0][0], keys.piece[0][1]);
        assert_ne!(keys.side, 0);
        // castle mask 0 still gets a key; full recompute XORs it in always
        assert_ne!(keys.castle[0], keys.castle[15]);
    }
}

//! Transposition table: one entry per slot, replace-always, plain-modulo
//! indexing.
//!
//! Mate scores are stored relative to the node they were found at, not the
//! root: on store the ply is subtracted out, on probe it is added back, so
//! a mate line keeps its correct distance when reached from a different
//! root later in the game.

use super::{MATE_BOUND, MATE_SCORE};
use crate::moves::types::Move;
use tracing::debug;

pub const HASH_SIZE_MIN: usize = 1;
pub const HASH_SIZE_DEFAULT: usize = 128;
pub const HASH_SIZE_MAX: usize = 2048;

const BYTES_PER_MB: usize = 1_048_576;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Bound {
    None,
    Upper,
    Lower,
    Exact,
}

#[derive(Debug, Clone, Copy)]
pub struct TtEntry {
    pub key: u64,
    pub best_move: Move,
    pub depth: i16,
    pub score: i32,
    pub bound: Bound,
}

impl TtEntry {
    const fn empty() -> TtEntry {
        TtEntry {
            key: 0,
            best_move: Move::NONE,
            depth: 0,
            score: 0,
            bound: Bound::None,
        }
    }
}

/// Root-relative -> node-relative on the way in.
fn to_tt_score(score: i32, ply: i32) -> i32 {
    if score >= MATE_BOUND {
        score - ply
    } else if score <= -MATE_BOUND {
        score + ply
    } else {
        score
    }
}

/// Node-relative -> root-relative on the way out.
fn from_tt_score(score: i32, ply: i32) -> i32 {
    if score >= MATE_BOUND {
        score + ply
    } else if score <= -MATE_BOUND {
        score - ply
    } else {
        score
    }
}

pub struct TranspositionTable {
    entries: Vec<TtEntry>,
}

impl TranspositionTable {
    pub fn new(size_mb: usize) -> TranspositionTable {
        let mut table = TranspositionTable {
            entries: Vec::new(),
        };
        table.resize(size_mb);
        table
    }

    /// Releases the old allocation before building the new one.
    pub fn resize(&mut self, size_mb: usize) {
        let size_mb = size_mb.clamp(HASH_SIZE_MIN, HASH_SIZE_MAX);
        let count = size_mb * BYTES_PER_MB / std::mem::size_of::<TtEntry>();

        self.entries = Vec::new();
        self.entries = vec![TtEntry::empty(); count];
        debug!(size_mb, entries = count, "transposition table allocated");
    }

    pub fn clear(&mut self) {
        for entry in self.entries.iter_mut() {
            *entry = TtEntry::empty();
        }
    }

    pub fn entry_count(&self) -> usize {
        self.entries.len()
    }

    #[inline(always)]
    fn index(&self, hash: u64) -> usize {
        (hash % self.entries.len() as u64) as usize
    }

    /// Always-replace store. The stored best move survives when the incoming
    /// move is empty and the slot already holds this position, so a
    /// null-window revisit cannot erase the PV move.
    pub fn store(&mut self, hash: u64, ply: i32, best_move: Move, depth: i32, score: i32, bound: Bound) {
        let index = self.index(hash);
        let entry = &mut self.entries[index];

        if !best_move.is_none() || entry.key != hash {
            entry.best_move = best_move;
        }
        entry.key = hash;
        entry.depth = depth as i16;
        entry.score = to_tt_score(score, ply);
        entry.bound = bound;
    }

    /// Full probe; `None` when the slot holds a different position.
    pub fn probe(&self, hash: u64, ply: i32) -> Option<(Move, i32, i32, Bound)> {
        let entry = &self.entries[self.index(hash)];
        if entry.key != hash {
            return None;
        }
        Some((
            entry.best_move,
            entry.depth as i32,
            from_tt_score(entry.score, ply),
            entry.bound,
        ))
    }

    /// Best-move-only probe, for the iterative-deepening fallback.
    pub fn probe_move(&self, hash: u64) -> Move {
        let entry = &self.entries[self.index(hash)];
        if entry.key == hash {
            entry.best_move
        } else {
            Move::NONE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_then_probe_round_trips() {
        let mut tt = TranspositionTable::new(1);
        let mv = Move::new(12, 28, 0);
        tt.store(0xDEAD_BEEF, 0, mv, 7, 42, Bound::Exact);

        let (best, depth, score, bound) = tt.probe(0xDEAD_BEEF, 0).unwrap();
        assert_eq!(best, mv);
        assert_eq!(depth, 7);
        assert_eq!(score, 42);
        assert_eq!(bound, Bound::Exact);

        assert!(tt.probe(0xDEAD_BEEF ^ 1, 0).is_none());
    }

    #[test]
    fn mate_scores_shift_with_ply() {
        let mut tt = TranspositionTable::new(1);
        // Mate found five plies below a node at ply 4.
        let store_ply = 4;
        let score = MATE_SCORE - 9;
        tt.store(0x1234, store_ply, Move::NONE, 3, score, Bound::Exact);

        // Probing at a shallower ply must lengthen the reported distance.
        let (_, _, probed, _) = tt.probe(0x1234, 2).unwrap();
        assert_eq!(probed, score - store_ply + 2);

        // A store at ply s probed back at ply s restores the score exactly.
        let (_, _, same, _) = tt.probe(0x1234, store_ply).unwrap();
        assert_eq!(same, score);

        // Negative mates move the other way.
        tt.store(0x5678, 6, Move::NONE, 3, -(MATE_SCORE - 8), Bound::Exact);
        let (_, _, neg, _) = tt.probe(0x5678, 6).unwrap();
        assert_eq!(neg, -(MATE_SCORE - 8));
    }

    #[test]
    fn empty_move_preserves_existing_hash_move() {
        let mut tt = TranspositionTable::new(1);
        let mv = Move::new(6, 21, 0);
        tt.store(0x42, 0, mv, 5, 10, Bound::Exact);

        // A deeper null-window store without a best move keeps the old one.
        tt.store(0x42, 0, Move::NONE, 8, 77, Bound::Lower);
        let (best, depth, score, bound) = tt.probe(0x42, 0).unwrap();
        assert_eq!(best, mv);
        assert_eq!(depth, 8);
        assert_eq!(score, 77);
        assert_eq!(bound, Bound::Lower);

        // A different position in the same slot does not inherit the move.
        let other = 0x42 + tt.entry_count() as u64;
        tt.store(other, 0, Move::NONE, 1, 0, Bound::Upper);
        assert_eq!(tt.probe_move(other), Move::NONE);
    }

    #[test]
    fn clear_wipes_entries() {
        let mut tt = TranspositionTable::new(1);
        tt.store(0x99, 0, Move::new(1, 2, 0), 3, 5, Bound::Lower);
        tt.clear();
        assert!(tt.probe(0x99, 0).is_none());
    }

    #[test]
    fn resize_clamps_to_limits() {
        let tt = TranspositionTable::new(0);
        assert_eq!(
            tt.entry_count(),
            BYTES_PER_MB / std::mem::size_of::<TtEntry>()
        );
    }
}

pub mod context;
pub mod eval;
pub mod picker;
pub mod search;
pub mod timeman;
pub mod tt;

use crate::moves::types::Move;

pub const INFINITE: i32 = 100_000;
pub const MATE_SCORE: i32 = 99_000;
/// Scores beyond this bound encode a mate distance.
pub const MATE_BOUND: i32 = 98_900;

pub const MAX_DEPTH: i32 = 100;
/// Capacity of the PV and killer tables.
pub const MAX_PLY: usize = 128;

/// Principal variation, tracked Bruce Moreland style: each node splices its
/// best move in front of the child's line.
#[derive(Clone, Copy)]
pub struct Pv {
    pub moves: [Move; MAX_PLY],
    pub len: usize,
}

impl Pv {
    pub fn new() -> Pv {
        Pv {
            moves: [Move::NONE; MAX_PLY],
            len: 0,
        }
    }

    #[inline]
    pub fn clear(&mut self) {
        self.len = 0;
    }

    /// This node's line = `head` followed by the child's line.
    pub fn load(&mut self, head: Move, child: &Pv) {
        self.moves[0] = head;
        let tail = child.len.min(MAX_PLY - 1);
        self.moves[1..=tail].copy_from_slice(&child.moves[..tail]);
        self.len = tail + 1;
    }

    pub fn best_move(&self) -> Move {
        if self.len > 0 {
            self.moves[0]
        } else {
            Move::NONE
        }
    }
}

impl Default for Pv {
    fn default() -> Pv {
        Pv::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pv_splices_child_lines() {
        let e2e4 = Move::new(12, 28, 0);
        let e7e5 = Move::new(52, 36, 0);
        let g1f3 = Move::new(6, 21, 0);

        let mut leaf = Pv::new();
        leaf.load(g1f3, &Pv::new());
        let mut mid = Pv::new();
        mid.load(e7e5, &leaf);
        let mut root = Pv::new();
        root.load(e2e4, &mid);

        assert_eq!(root.len, 3);
        assert_eq!(root.moves[..3], [e2e4, e7e5, g1f3]);
        assert_eq!(root.best_move(), e2e4);
    }
}

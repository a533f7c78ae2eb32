//! Staged, lazy move picker.
//!
//! Order: hash move, then captures by MVV-LVA, then the two killers, then
//! quiets by history score. The stages are an explicit state machine: the
//! hash move is yielded before any generation happens, so a cutoff on it
//! costs no movegen at all. Selection applies one selection-sort pass per
//! call rather than sorting the whole list up front.
//!
//! The capture bonus sits strictly above both killer bonuses, so every
//! capture is yielded before any quiet. Quiescence relies on this to stop
//! at the first non-capture.

use super::context::SearchContext;
use crate::board::{Board, Piece};
use crate::moves::movegen::generate_pseudo_legal;
use crate::moves::types::{Move, MoveList};
use arrayvec::ArrayVec;

pub const KILLER_TWO_BONUS: i32 = 900_000;
pub const KILLER_ONE_BONUS: i32 = KILLER_TWO_BONUS + 1;
pub const CAPTURE_BONUS: i32 = KILLER_ONE_BONUS + 1;

/// MVV_LVA[victim][attacker]: prefer big victims, break ties toward the
/// cheapest attacker.
const MVV_LVA: [[i32; 6]; 6] = {
    let values = [10, 30, 31, 50, 90, 1000];
    let mut table = [[0; 6]; 6];
    let mut victim = 0;
    while victim < 6 {
        let mut attacker = 0;
        while attacker < 6 {
            table[victim][attacker] = values[victim] * 100 + (100 - values[attacker] / 10);
            attacker += 1;
        }
        victim += 1;
    }
    table
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    HashMove,
    Generate,
    Main,
    Done,
}

pub struct MovePicker {
    stage: Stage,
    moves: MoveList,
    scores: ArrayVec<i32, 256>,
    current: usize,
    hash_move: Move,
    killer_one: Move,
    killer_two: Move,
}

impl MovePicker {
    pub fn new(hash_move: Move, killer_one: Move, killer_two: Move) -> MovePicker {
        MovePicker {
            stage: if hash_move.is_none() {
                Stage::Generate
            } else {
                Stage::HashMove
            },
            moves: MoveList::new(),
            scores: ArrayVec::new(),
            current: 0,
            hash_move,
            killer_one,
            killer_two,
        }
    }

    fn score_move(&self, board: &Board, ctx: &SearchContext, mv: Move) -> i32 {
        if mv.is_capture() {
            // En passant's victim square is empty; the victim is a pawn.
            let victim = if mv.is_en_passant() {
                Piece::Pawn as usize
            } else {
                board.squares[mv.to_sq() as usize] as usize
            };
            let attacker = board.squares[mv.from_sq() as usize] as usize;
            return MVV_LVA[victim][attacker] + CAPTURE_BONUS;
        }

        if mv == self.killer_one {
            return KILLER_ONE_BONUS;
        }
        if mv == self.killer_two {
            return KILLER_TWO_BONUS;
        }

        ctx.history_score(board.side, board.squares[mv.from_sq() as usize], mv.to_sq())
    }

    /// Yields the next-best pseudo-legal move, `Move::NONE` when exhausted.
    pub fn next(&mut self, board: &Board, ctx: &SearchContext) -> Move {
        loop {
            match self.stage {
                Stage::HashMove => {
                    self.stage = Stage::Generate;
                    if !self.hash_move.is_none() {
                        return self.hash_move;
                    }
                }

                Stage::Generate => {
                    generate_pseudo_legal(&mut self.moves, board);
                    self.scores.clear();
                    for i in 0..self.moves.len() {
                        let score = self.score_move(board, ctx, self.moves[i]);
                        self.scores.push(score);
                    }
                    self.current = 0;
                    self.stage = Stage::Main;
                }

                Stage::Main => {
                    while self.current < self.moves.len() {
                        let mut best = self.current;
                        for i in self.current + 1..self.moves.len() {
                            if self.scores[i] > self.scores[best] {
                                best = i;
                            }
                        }
                        self.moves.swap(self.current, best);
                        self.scores.swap(self.current, best);

                        let mv = self.moves[self.current];
                        self.current += 1;

                        // The hash move already went out in its own stage.
                        if mv == self.hash_move {
                            continue;
                        }
                        return mv;
                    }
                    self.stage = Stage::Done;
                }

                Stage::Done => return Move::NONE,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::moves::execute::{make, undo};

    fn drain(board: &Board, picker: &mut MovePicker, ctx: &SearchContext) -> Vec<Move> {
        let mut out = Vec::new();
        loop {
            let mv = picker.next(board, ctx);
            if mv.is_none() {
                break;
            }
            out.push(mv);
        }
        out
    }

    #[test]
    fn hash_move_comes_first_and_only_once() {
        let board = Board::start();
        let ctx = SearchContext::new();
        let hash_move = Move::new(12, 28, 0); // e2e4

        let mut picker = MovePicker::new(hash_move, Move::NONE, Move::NONE);
        let yielded = drain(&board, &mut picker, &ctx);

        assert_eq!(yielded[0], hash_move);
        assert_eq!(yielded.iter().filter(|&&m| m == hash_move).count(), 1);
        assert_eq!(yielded.len(), 20);
    }

    #[test]
    fn no_move_yielded_twice() {
        let board = Board::from_fen(
            "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1",
        )
        .unwrap();
        let ctx = SearchContext::new();
        let mut picker = MovePicker::new(Move::NONE, Move::NONE, Move::NONE);
        let yielded = drain(&board, &mut picker, &ctx);

        for (i, a) in yielded.iter().enumerate() {
            for b in &yielded[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn captures_precede_all_quiets() {
        let board = Board::from_fen(
            "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1",
        )
        .unwrap();
        let ctx = SearchContext::new();
        let mut picker = MovePicker::new(Move::NONE, Move::NONE, Move::NONE);
        let yielded = drain(&board, &mut picker, &ctx);

        let first_quiet = yielded.iter().position(|m| !m.is_capture()).unwrap();
        assert!(
            yielded[first_quiet..].iter().all(|m| !m.is_capture()),
            "a capture was yielded after a quiet move"
        );
    }

    #[test]
    fn mvv_lva_prefers_big_victims_and_cheap_attackers() {
        assert!(MVV_LVA[4][0] > MVV_LVA[0][0]); // queen victim beats pawn victim
        assert!(MVV_LVA[4][0] > MVV_LVA[4][4]); // pawn takes queen beats queen takes queen
    }

    #[test]
    fn killers_sort_between_captures_and_quiets() {
        let mut board = Board::start();
        let ctx = SearchContext::new();
        let killer = Move::new(6, 21, 0); // g1f3

        let mut picker = MovePicker::new(Move::NONE, killer, Move::NONE);
        let yielded = drain(&board, &mut picker, &ctx);

        // No captures at the start position: the killer leads.
        assert_eq!(yielded[0], killer);

        // All yielded moves are pseudo-legal here; make/undo accepts them.
        for mv in yielded {
            let legal = make(&mut board, mv);
            undo(&mut board, mv);
            assert!(legal);
        }
    }
}

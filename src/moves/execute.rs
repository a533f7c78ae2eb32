//! Making and unmaking moves.
//!
//! `make` applies a pseudo-legal move, maintains the Zobrist hash key by
//! key, and reports whether the move was legal. On failure the board is
//! left in the made state; the caller must invoke `undo` either way. Undo
//! restores the hash from the history entry, so its piece motion goes
//! through the plain (hash-free) board mutators only.

use crate::board::{
    Board, Color, Piece, Undo, CASTLE_BK, CASTLE_BQ, CASTLE_WK, CASTLE_WQ, EMPTY,
};
use crate::hash::zobrist::{self, colored};
use crate::moves::types::Move;
use crate::square::{A1, A8, C1, C8, D1, D8, E1, E8, F1, F8, G1, G8, H1, H8, NO_SQ};

#[inline]
fn set_piece_hashed(board: &mut Board, color: Color, piece: u8, sq: u8) {
    board.set_piece(color, piece, sq);
    board.hash ^= zobrist::keys().piece[colored(Piece::from_index(piece), color)][sq as usize];
}

#[inline]
fn clear_piece_hashed(board: &mut Board, color: Color, sq: u8) -> u8 {
    let piece = board.clear_piece(color, sq);
    board.hash ^= zobrist::keys().piece[colored(Piece::from_index(piece), color)][sq as usize];
    piece
}

#[inline]
fn move_piece_hashed(board: &mut Board, from: u8, to: u8, color: Color) {
    let piece = board.move_piece(from, to, color);
    let key_row = &zobrist::keys().piece[colored(Piece::from_index(piece), color)];
    board.hash ^= key_row[from as usize] ^ key_row[to as usize];
}

/// Castle permission updates always re-key the full 4-bit mask.
#[inline]
fn remove_castle_rights(board: &mut Board, rights: u8) {
    let keys = zobrist::keys();
    board.hash ^= keys.castle[board.castle_perm as usize];
    board.castle_perm &= !rights;
    board.hash ^= keys.castle[board.castle_perm as usize];
}

#[inline]
fn clear_ep_square(board: &mut Board) {
    if board.ep_square != NO_SQ {
        board.hash ^= zobrist::keys().ep[board.ep_square as usize];
        board.ep_square = NO_SQ;
    }
}

/// Applies `mv`; returns false when the mover's king is left attacked.
/// State is not rolled back on failure.
pub fn make(board: &mut Board, mv: Move) -> bool {
    let from = mv.from_sq();
    let to = mv.to_sq();
    let side = board.side;
    let moved_piece = board.squares[from as usize];
    debug_assert!(moved_piece < 6);

    board.history.push(Undo {
        castle_perm: board.castle_perm,
        ep_square: board.ep_square,
        fifty_move: board.fifty_move,
        moved_piece,
        captured_piece: EMPTY,
        mv,
        hash: board.hash,
    });
    let undo_index = board.history.len() - 1;

    clear_ep_square(board);

    // Capturing a corner rook forfeits the matching enemy right.
    if mv.is_capture() && board.squares[to as usize] == Piece::Rook as u8 {
        match (side, to) {
            (Color::White, A8) => remove_castle_rights(board, CASTLE_BQ),
            (Color::White, H8) => remove_castle_rights(board, CASTLE_BK),
            (Color::Black, A1) => remove_castle_rights(board, CASTLE_WQ),
            (Color::Black, H1) => remove_castle_rights(board, CASTLE_WK),
            _ => {}
        }
    }

    if mv.is_castle() {
        match to {
            C1 => {
                move_piece_hashed(board, E1, C1, Color::White);
                move_piece_hashed(board, A1, D1, Color::White);
                remove_castle_rights(board, CASTLE_WK | CASTLE_WQ);
            }
            G1 => {
                move_piece_hashed(board, E1, G1, Color::White);
                move_piece_hashed(board, H1, F1, Color::White);
                remove_castle_rights(board, CASTLE_WK | CASTLE_WQ);
            }
            C8 => {
                move_piece_hashed(board, E8, C8, Color::Black);
                move_piece_hashed(board, A8, D8, Color::Black);
                remove_castle_rights(board, CASTLE_BK | CASTLE_BQ);
            }
            G8 => {
                move_piece_hashed(board, E8, G8, Color::Black);
                move_piece_hashed(board, H8, F8, Color::Black);
                remove_castle_rights(board, CASTLE_BK | CASTLE_BQ);
            }
            _ => unreachable!("castle destination {to}"),
        }
    } else if mv.is_en_passant() {
        move_piece_hashed(board, from, to, side);
        let captured_sq = if side == Color::White { to - 8 } else { to + 8 };
        clear_piece_hashed(board, side.opposite(), captured_sq);
        board.history[undo_index].captured_piece = Piece::Pawn as u8;
    } else if mv.is_promotion() {
        clear_piece_hashed(board, side, from);
        if mv.is_capture() {
            let captured = clear_piece_hashed(board, side.opposite(), to);
            board.history[undo_index].captured_piece = captured;
        }
        set_piece_hashed(board, side, mv.promoted_piece() as u8, to);
    } else {
        if mv.is_capture() {
            let captured = clear_piece_hashed(board, side.opposite(), to);
            board.history[undo_index].captured_piece = captured;
        }
        move_piece_hashed(board, from, to, side);

        if moved_piece == Piece::Pawn as u8 && (from ^ to) == 16 {
            board.ep_square = (from + to) / 2;
            board.hash ^= zobrist::keys().ep[board.ep_square as usize];
        } else if moved_piece == Piece::King as u8 {
            let rights = if side == Color::White {
                CASTLE_WK | CASTLE_WQ
            } else {
                CASTLE_BK | CASTLE_BQ
            };
            remove_castle_rights(board, rights);
        } else if moved_piece == Piece::Rook as u8 {
            match (side, from) {
                (Color::White, A1) => remove_castle_rights(board, CASTLE_WQ),
                (Color::White, H1) => remove_castle_rights(board, CASTLE_WK),
                (Color::Black, A8) => remove_castle_rights(board, CASTLE_BQ),
                (Color::Black, H8) => remove_castle_rights(board, CASTLE_BK),
                _ => {}
            }
        }
    }

    if moved_piece == Piece::Pawn as u8 || mv.is_capture() {
        board.fifty_move = 0;
    } else {
        board.fifty_move += 1;
    }

    board.side = side.opposite();
    board.hash ^= zobrist::keys().side;

    debug_assert_eq!(board.hash, zobrist::compute(board));

    // The mover's king may not be left in check.
    !board.square_attacked(board.king_square(side), side)
}

/// Reverts the most recent `make(mv)`. The saved hash is restored verbatim,
/// never recomputed.
pub fn undo(board: &mut Board, mv: Move) {
    board.side = board.side.opposite();
    let side = board.side;

    let entry = board.history.pop().expect("undo without a prior make");
    debug_assert_eq!(entry.mv, mv);
    board.castle_perm = entry.castle_perm;
    board.ep_square = entry.ep_square;
    board.fifty_move = entry.fifty_move;
    board.hash = entry.hash;

    let from = mv.from_sq();
    let to = mv.to_sq();

    board.clear_piece(side, to);
    board.set_piece(side, entry.moved_piece, from);

    if mv.is_capture() {
        debug_assert!(entry.captured_piece < 6);
        if mv.is_en_passant() {
            let captured_sq = if side == Color::White { to - 8 } else { to + 8 };
            board.set_piece(side.opposite(), Piece::Pawn as u8, captured_sq);
        } else {
            board.set_piece(side.opposite(), entry.captured_piece, to);
        }
    } else if mv.is_castle() {
        match to {
            C1 => board.move_piece(D1, A1, Color::White),
            G1 => board.move_piece(F1, H1, Color::White),
            C8 => board.move_piece(D8, A8, Color::Black),
            G8 => board.move_piece(F8, H8, Color::Black),
            _ => unreachable!("castle destination {to}"),
        };
    }

    debug_assert_eq!(board.hash, zobrist::compute(board));
}

/// Flips the side without moving, for null-move pruning. The history entry
/// carries `Move::NONE` so children can tell their parent was a null move.
pub fn make_null(board: &mut Board) {
    board.history.push(Undo {
        castle_perm: board.castle_perm,
        ep_square: board.ep_square,
        fifty_move: board.fifty_move,
        moved_piece: EMPTY,
        captured_piece: EMPTY,
        mv: Move::NONE,
        hash: board.hash,
    });

    board.side = board.side.opposite();
    board.hash ^= zobrist::keys().side;
    clear_ep_square(board);
    board.fifty_move = 0;

    debug_assert_eq!(board.hash, zobrist::compute(board));
}

pub fn undo_null(board: &mut Board) {
    let entry = board.history.pop().expect("undo_null without make_null");
    debug_assert!(entry.mv.is_none());

    board.side = board.side.opposite();
    board.castle_perm = entry.castle_perm;
    board.ep_square = entry.ep_square;
    board.fifty_move = entry.fifty_move;
    board.hash = entry.hash;

    debug_assert_eq!(board.hash, zobrist::compute(board));
}

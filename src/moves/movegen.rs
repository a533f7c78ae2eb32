//! Pseudo-legal move generation.
//!
//! Legality is settled later: `execute::make` reports failure when the
//! mover's king ends up attacked, and every caller undoes failed moves.
//! The only legality handled here is castling (path emptiness and attack
//! checks) plus the double-check short-circuit, where only king moves can
//! possibly help.

use crate::bitboard::{
    king_attacks, knight_attacks, pawn_attacks, pop_lsb, popcount, RANK_1, RANK_2, RANK_7,
    RANK_8,
};
use crate::board::{
    Board, Color, Piece, BOTH, CASTLE_BK, CASTLE_BQ, CASTLE_MASK_BK, CASTLE_MASK_BQ,
    CASTLE_MASK_WK, CASTLE_MASK_WQ, CASTLE_WK, CASTLE_WQ, EMPTY,
};
use crate::moves::magic;
use crate::moves::types::{
    Move, MoveList, BISHOP_PROMO_FLAG, CAPTURE_FLAG, CASTLE_FLAG, EP_FLAG, KNIGHT_PROMO_FLAG,
    QUEEN_PROMO_FLAG, QUIET_FLAG, ROOK_PROMO_FLAG,
};
use crate::square::{C1, C8, D1, D8, E1, E8, F1, F8, G1, G8, NO_SQ};

const PROMO_FLAGS: [u16; 4] = [
    KNIGHT_PROMO_FLAG,
    BISHOP_PROMO_FLAG,
    ROOK_PROMO_FLAG,
    QUEEN_PROMO_FLAG,
];

fn add_normal_moves(moves: &mut MoveList, from: u8, mut attacks: u64, board: &Board) {
    while attacks != 0 {
        let to = pop_lsb(&mut attacks);
        let flag = if board.squares[to as usize] == EMPTY {
            QUIET_FLAG
        } else {
            CAPTURE_FLAG
        };
        moves.push(Move::new(from, to, flag));
    }
}

fn add_pawn_captures(moves: &mut MoveList, from: u8, mut attacks: u64, ep_square: u8) {
    while attacks != 0 {
        let to = pop_lsb(&mut attacks);
        let flag = if to == ep_square { EP_FLAG } else { CAPTURE_FLAG };
        moves.push(Move::new(from, to, flag));
    }
}

fn add_pawn_pushes(moves: &mut MoveList, mut pushes: u64, side: Color, push_amount: i8) {
    let delta = match side {
        Color::White => -8i8,
        Color::Black => 8i8,
    } * push_amount;
    while pushes != 0 {
        let to = pop_lsb(&mut pushes);
        let from = (to as i8 + delta) as u8;
        moves.push(Move::new(from, to, QUIET_FLAG));
    }
}

fn add_promotion_pushes(moves: &mut MoveList, mut pushes: u64, side: Color) {
    let delta = match side {
        Color::White => -8i8,
        Color::Black => 8i8,
    };
    while pushes != 0 {
        let to = pop_lsb(&mut pushes);
        let from = (to as i8 + delta) as u8;
        for flag in PROMO_FLAGS {
            moves.push(Move::new(from, to, flag));
        }
    }
}

fn add_promotion_captures(moves: &mut MoveList, from: u8, mut captures: u64) {
    while captures != 0 {
        let to = pop_lsb(&mut captures);
        for flag in PROMO_FLAGS {
            moves.push(Move::new(from, to, flag | CAPTURE_FLAG));
        }
    }
}

fn generate_pawn_moves(moves: &mut MoveList, board: &Board) {
    let side = board.side;
    let mut pawns = board.piece_bb(side, Piece::Pawn);
    let empty = !board.colors[BOTH];

    let (pushes, double_pushes, promotion_rank) = match side {
        Color::White => {
            let pushes = (pawns << 8) & empty;
            // Double pushes are rank-masked, so the shifts cannot wrap files.
            let doubles = ((pawns & RANK_2) << 16) & empty & (empty << 8);
            (pushes, doubles, RANK_8)
        }
        Color::Black => {
            let pushes = (pawns >> 8) & empty;
            let doubles = ((pawns & RANK_7) >> 16) & empty & (empty >> 8);
            (pushes, doubles, RANK_1)
        }
    };

    add_pawn_pushes(moves, double_pushes, side, 2);
    add_pawn_pushes(moves, pushes & !promotion_rank, side, 1);
    add_promotion_pushes(moves, pushes & promotion_rank, side);

    // Captures target enemy occupancy plus the en passant square.
    let mut attackable = board.colors[side.opposite() as usize];
    if board.ep_square != NO_SQ {
        attackable |= 1u64 << board.ep_square;
    }

    while pawns != 0 {
        let from = pop_lsb(&mut pawns);
        let attacks = pawn_attacks(side, from) & attackable;
        if attacks & promotion_rank != 0 {
            add_promotion_captures(moves, from, attacks);
        } else {
            add_pawn_captures(moves, from, attacks, board.ep_square);
        }
    }
}

fn generate_slider_moves(moves: &mut MoveList, board: &Board) {
    let side = board.side;
    let own = board.colors[side as usize];
    let occ = board.colors[BOTH];

    let mut diagonals = (board.pieces[Piece::Bishop as usize]
        | board.pieces[Piece::Queen as usize])
        & own;
    while diagonals != 0 {
        let from = pop_lsb(&mut diagonals);
        add_normal_moves(moves, from, magic::bishop_attacks(from, occ) & !own, board);
    }

    let mut laterals =
        (board.pieces[Piece::Rook as usize] | board.pieces[Piece::Queen as usize]) & own;
    while laterals != 0 {
        let from = pop_lsb(&mut laterals);
        add_normal_moves(moves, from, magic::rook_attacks(from, occ) & !own, board);
    }
}

fn generate_knight_moves(moves: &mut MoveList, board: &Board) {
    let own = board.colors[board.side as usize];
    let mut knights = board.piece_bb(board.side, Piece::Knight);
    while knights != 0 {
        let from = pop_lsb(&mut knights);
        add_normal_moves(moves, from, knight_attacks(from) & !own, board);
    }
}

fn generate_king_moves(moves: &mut MoveList, board: &Board) {
    let side = board.side;
    let king_sq = board.king_square(side);
    let own = board.colors[side as usize];

    add_normal_moves(moves, king_sq, king_attacks(king_sq) & !own, board);

    // Castling is never generated out of check.
    if board.square_attacked(king_sq, side) {
        return;
    }

    let occ = board.colors[BOTH];
    match side {
        Color::White => {
            if board.castle_perm & CASTLE_WK != 0
                && occ & CASTLE_MASK_WK == 0
                && !board.square_attacked(F1, side)
                && !board.square_attacked(G1, side)
            {
                moves.push(Move::new(E1, G1, CASTLE_FLAG));
            }
            if board.castle_perm & CASTLE_WQ != 0
                && occ & CASTLE_MASK_WQ == 0
                && !board.square_attacked(D1, side)
                && !board.square_attacked(C1, side)
            {
                moves.push(Move::new(E1, C1, CASTLE_FLAG));
            }
        }
        Color::Black => {
            if board.castle_perm & CASTLE_BK != 0
                && occ & CASTLE_MASK_BK == 0
                && !board.square_attacked(F8, side)
                && !board.square_attacked(G8, side)
            {
                moves.push(Move::new(E8, G8, CASTLE_FLAG));
            }
            if board.castle_perm & CASTLE_BQ != 0
                && occ & CASTLE_MASK_BQ == 0
                && !board.square_attacked(D8, side)
                && !board.square_attacked(C8, side)
            {
                moves.push(Move::new(E8, C8, CASTLE_FLAG));
            }
        }
    }
}

/// Generates all pseudo-legal moves for the side to move.
pub fn generate_pseudo_legal(moves: &mut MoveList, board: &Board) {
    moves.clear();

    // A double check can only be answered by a king move.
    if popcount(board.attackers_to_king()) >= 2 {
        generate_king_moves(moves, board);
        return;
    }

    generate_pawn_moves(moves, board);
    generate_slider_moves(moves, board);
    generate_knight_moves(moves, board);
    generate_king_moves(moves, board);
}

/// Filters pseudo-legal moves through make/undo. Slow; used by perft, move
/// parsing and tests, never in the search loop.
pub fn generate_legal(moves: &mut MoveList, board: &mut Board) {
    let mut pseudo = MoveList::new();
    generate_pseudo_legal(&mut pseudo, board);

    moves.clear();
    for &mv in &pseudo {
        if crate::moves::execute::make(board, mv) {
            moves.push(mv);
        }
        crate::moves::execute::undo(board, mv);
    }
}

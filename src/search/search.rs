//! The search core: iterative deepening over an aspiration-window wrapper
//! around a negamax principal-variation search with quiescence.
//!
//! Scores are always from the side to move's point of view. A stopped
//! search returns sentinel zeros up the tree; the deepening driver never
//! propagates them and keeps the last completed iteration's PV.

use super::eval::evaluate;
use super::picker::MovePicker;
use super::timeman::LimitKind;
use super::tt::Bound;
use super::{Pv, INFINITE, MATE_BOUND, MATE_SCORE, MAX_DEPTH};
use crate::engine::{Engine, SearchState};
use crate::moves::execute::{make, make_null, undo, undo_null};
use crate::moves::types::Move;
use arrayvec::ArrayVec;
use once_cell::sync::Lazy;
use tracing::debug;

/// Stop conditions are polled every 4096 nodes.
const NODE_POLL_MASK: u64 = 4095;

const ASPIRATION_DELTA: i32 = 10;
const ASPIRATION_MAX: i32 = 500;

const RFP_MAX_DEPTH: i32 = 6;
const RFP_MARGIN: i32 = 150;

const NMP_MIN_DEPTH: i32 = 3;
const IIR_MIN_DEPTH: i32 = 3;

const LMP_MAX_DEPTH: i32 = 5;

const LMR_BASE: f64 = 0.25;
const LMR_DIVISOR: f64 = 2.6;

/// Root progress reports start after this much wall clock.
const CURRMOVE_REPORT_MS: u128 = 2500;

static LMR_TABLE: Lazy<[[i32; 64]; 64]> = Lazy::new(|| {
    let mut table = [[0i32; 64]; 64];
    for depth in 1..64 {
        for moves_played in 1..64 {
            let reduction =
                LMR_BASE + (depth as f64).ln() * (moves_played as f64).ln() / LMR_DIVISOR;
            table[depth][moves_played] = if reduction < 0.0 { 0 } else { reduction as i32 };
        }
    }
    table
});

#[inline]
fn lmr_reduction(depth: i32, moves_played: i32) -> i32 {
    LMR_TABLE[depth.clamp(0, 63) as usize][moves_played.clamp(0, 63) as usize]
}

/// Jittered draw score in {-2..1}; keeps the engine from steering blindly
/// into (or away from) every repetition line at exactly 0.00.
#[inline]
fn draw_score(nodes: u64) -> i32 {
    ((nodes & 3) as i32) - 2
}

/// Node-cadence stop polling: hard time bound, node budget, stdin.
fn check_search_over(engine: &mut Engine) {
    match engine.limits.kind {
        LimitKind::Time => {
            if engine.limits.hard_bound_reached() {
                engine.state = SearchState::Stopped;
            }
        }
        LimitKind::Nodes => {
            if engine.stats.nodes >= engine.limits.nodes {
                engine.state = SearchState::Stopped;
            }
        }
        LimitKind::Depth | LimitKind::Infinite => {}
    }
    engine.poll_input();
}

/// Captures-only extension of the main search, so leaf evaluations are
/// taken in quiet positions.
fn quiesce(engine: &mut Engine, mut alpha: i32, beta: i32, ply: usize) -> i32 {
    engine.stats.nodes += 1;
    if engine.stats.nodes & NODE_POLL_MASK == 0 {
        check_search_over(engine);
    }
    if engine.state == SearchState::Stopped {
        return 0;
    }

    if ply as i32 > engine.stats.seldepth {
        engine.stats.seldepth = ply as i32;
    }
    if ply as i32 >= MAX_DEPTH - 1 {
        return evaluate(&engine.board);
    }
    if engine.board.is_draw(ply) {
        return draw_score(engine.stats.nodes);
    }

    let pv_node = alpha != beta - 1;

    // Stored depth is irrelevant here; every quiescence entry is depth 0.
    if !pv_node {
        if let Some((_, _, tt_score, tt_bound)) = engine.tt.probe(engine.board.hash, ply as i32) {
            match tt_bound {
                Bound::Exact => return tt_score,
                Bound::Lower if tt_score >= beta => return tt_score,
                Bound::Upper if tt_score <= alpha => return tt_score,
                _ => {}
            }
        }
    }

    // Stand pat: we are not obliged to capture anything.
    let stand_pat = evaluate(&engine.board);
    if stand_pat >= beta {
        return beta;
    }
    if stand_pat > alpha {
        alpha = stand_pat;
    }

    let mut best_score = stand_pat;
    let mut best_move = Move::NONE;
    let mut bound = Bound::Upper;

    let mut picker = MovePicker::new(Move::NONE, Move::NONE, Move::NONE);
    loop {
        let mv = picker.next(&engine.board, &engine.ctx);
        if mv.is_none() || !mv.is_capture() {
            // Captures are ordered before all quiets, so the first quiet
            // ends the tactical part of the move list.
            break;
        }

        if !make(&mut engine.board, mv) {
            undo(&mut engine.board, mv);
            continue;
        }
        let score = -quiesce(engine, -beta, -alpha, ply + 1);
        undo(&mut engine.board, mv);

        if engine.state == SearchState::Stopped {
            return 0;
        }

        if score > best_score {
            best_score = score;
            best_move = mv;
            if score > alpha {
                alpha = score;
                bound = Bound::Exact;
                if alpha >= beta {
                    bound = Bound::Lower;
                    break;
                }
            }
        }
    }

    engine
        .tt
        .store(engine.board.hash, ply as i32, best_move, 0, best_score, bound);

    best_score
}

/// Negamax PVS. `cut_node` marks nodes the parent expects to fail high.
#[allow(clippy::too_many_arguments)]
fn search(
    engine: &mut Engine,
    pv: &mut Pv,
    mut alpha: i32,
    mut beta: i32,
    mut depth: i32,
    ply: usize,
    cut_node: bool,
) -> i32 {
    pv.clear();

    let root = ply == 0;
    let pv_node = alpha != beta - 1;

    // The horizon hands over to quiescence.
    if depth <= 0 {
        return quiesce(engine, alpha, beta, ply);
    }

    engine.stats.nodes += 1;
    if engine.stats.nodes & NODE_POLL_MASK == 0 {
        check_search_over(engine);
    }
    if engine.state == SearchState::Stopped {
        return 0;
    }

    if ply as i32 > engine.stats.seldepth {
        engine.stats.seldepth = ply as i32;
    }
    if ply as i32 >= MAX_DEPTH - 1 {
        return evaluate(&engine.board);
    }

    if !root {
        if engine.board.is_draw(ply) {
            return draw_score(engine.stats.nodes);
        }

        // Mate distance pruning: no line from here can beat an already
        // proven shorter mate.
        alpha = alpha.max(-MATE_SCORE + ply as i32);
        beta = beta.min(MATE_SCORE - ply as i32);
        if alpha >= beta {
            return alpha;
        }
    }

    // The table move is worth probing even when the score is unusable.
    let mut hash_move = Move::NONE;
    if let Some((tt_move, tt_depth, tt_score, tt_bound)) =
        engine.tt.probe(engine.board.hash, ply as i32)
    {
        hash_move = tt_move;
        if !root && !pv_node && tt_depth >= depth {
            match tt_bound {
                Bound::Exact => return tt_score,
                Bound::Lower if tt_score >= beta => return tt_score,
                Bound::Upper if tt_score <= alpha => return tt_score,
                _ => {}
            }
        }
    }

    let in_check = engine.board.in_check();

    // Check extension, before any depth-driven pruning decisions.
    if in_check {
        depth += 1;
    }

    let eval = if in_check {
        0
    } else {
        evaluate(&engine.board)
    };

    // Reverse futility: statically far enough above beta that a shallow
    // search is not going to come back under it.
    if !pv_node && !in_check && depth <= RFP_MAX_DEPTH && eval - RFP_MARGIN * depth >= beta {
        return eval - RFP_MARGIN * depth;
    }

    // Null move pruning: hand the opponent a free move; if we still beat
    // beta at reduced depth, the real search would too. Disabled without
    // non-pawn material (zugzwang) and directly after another null move.
    if !pv_node
        && !in_check
        && depth >= NMP_MIN_DEPTH
        && eval >= beta
        && engine.board.has_non_pawn_material(engine.board.side)
        && !engine.board.last_move_was_null()
    {
        let reduction = 4 + depth / 4;
        let null_depth = (depth - reduction).max(0);

        make_null(&mut engine.board);
        let mut child_pv = Pv::new();
        let score = -search(
            engine,
            &mut child_pv,
            -beta,
            -beta + 1,
            null_depth,
            ply + 1,
            !cut_node,
        );
        undo_null(&mut engine.board);

        if engine.state == SearchState::Stopped {
            return 0;
        }
        if score >= beta {
            return beta;
        }
    }

    // Internal iterative reductions: with no table move in an important
    // node, a shallower search now feeds a better-ordered one on re-visit.
    if depth >= IIR_MIN_DEPTH && (pv_node || cut_node) && hash_move.is_none() {
        depth -= 1;
    }

    let mut child_pv = Pv::new();
    let mut best_score = -INFINITE;
    let mut best_move = Move::NONE;
    let mut bound = Bound::Upper;
    let mut moves_played: i32 = 0;
    let mut quiets_played: i32 = 0;
    let mut quiets_tried: ArrayVec<Move, 128> = ArrayVec::new();
    let lmp_threshold = 3 + depth * depth;

    let killer_one = engine.ctx.killers[0][ply];
    let killer_two = engine.ctx.killers[1][ply];
    let mut picker = MovePicker::new(hash_move, killer_one, killer_two);

    loop {
        let mv = picker.next(&engine.board, &engine.ctx);
        if mv.is_none() {
            break;
        }

        // Late move pruning. Captures were all yielded before any quiet,
        // so breaking out of the loop entirely is safe.
        if depth <= LMP_MAX_DEPTH
            && !pv_node
            && !in_check
            && mv.is_quiet()
            && quiets_played >= lmp_threshold
        {
            break;
        }

        if !make(&mut engine.board, mv) {
            undo(&mut engine.board, mv);
            continue;
        }
        moves_played += 1;
        if mv.is_quiet() {
            quiets_played += 1;
        }

        if root && engine.stats.started.elapsed().as_millis() > CURRMOVE_REPORT_MS {
            println!(
                "info depth {} currmove {} currmovenumber {}",
                depth,
                mv.to_uci(),
                moves_played
            );
        }

        let mut score;
        if moves_played == 1 {
            score = -search(engine, &mut child_pv, -beta, -alpha, depth - 1, ply + 1, false);
        } else {
            // Late move reductions for quiet non-killer moves; the zero
            // window assumes the move fails low.
            let mut reduced = depth - 1;
            if mv.is_quiet() && !in_check && !engine.ctx.is_killer(ply, mv) {
                reduced -= lmr_reduction(depth, moves_played);
                reduced = reduced.clamp(0, depth - 1);
            }

            score = -search(engine, &mut child_pv, -alpha - 1, -alpha, reduced, ply + 1, true);

            // Fail high on the reduced window: get the real score.
            if score > alpha {
                score = -search(
                    engine,
                    &mut child_pv,
                    -beta,
                    -alpha,
                    depth - 1,
                    ply + 1,
                    !cut_node,
                );
            }
        }
        undo(&mut engine.board, mv);

        if engine.state == SearchState::Stopped {
            return 0;
        }

        if score > best_score {
            best_score = score;
            best_move = mv;

            if score > alpha {
                alpha = score;
                bound = Bound::Exact;

                if pv_node {
                    pv.load(mv, &child_pv);
                }

                if alpha >= beta {
                    bound = Bound::Lower;

                    // A quiet refutation feeds the ordering heuristics:
                    // bonus for the cutoff move, malus for the quiets
                    // searched ahead of it in this node.
                    if !mv.is_capture() {
                        let delta = depth * depth;
                        engine.ctx.update_history(&engine.board, mv, delta);
                        for &quiet in &quiets_tried {
                            engine.ctx.update_history(&engine.board, quiet, -delta);
                        }
                        engine.ctx.update_killers(ply, mv);
                    }
                    break;
                }
            }
        }

        if !mv.is_capture() && quiets_tried.len() < quiets_tried.capacity() {
            quiets_tried.push(mv);
        }
    }

    // No legal moves: checkmate scored by distance, else stalemate.
    if moves_played == 0 {
        pv.clear();
        return if in_check {
            -MATE_SCORE + ply as i32
        } else {
            0
        };
    }

    engine.tt.store(
        engine.board.hash,
        ply as i32,
        best_move,
        depth,
        best_score,
        bound,
    );

    best_score
}

/// One depth iteration behind an aspiration window. Returns `None` when the
/// search was stopped mid-iteration (the result is unusable); commits the
/// iteration's PV to the engine otherwise.
fn aspiration_search(engine: &mut Engine, depth: i32, prev_score: i32) -> Option<i32> {
    let windowed = depth >= 6 && prev_score.abs() < MATE_BOUND;
    let mut delta_low = ASPIRATION_DELTA;
    let mut delta_high = ASPIRATION_DELTA;

    loop {
        // Past 500cp of widening the window stops paying for itself.
        let full = !windowed || delta_low > ASPIRATION_MAX || delta_high > ASPIRATION_MAX;
        let (alpha, beta) = if full {
            (-INFINITE, INFINITE)
        } else {
            (prev_score - delta_low, prev_score + delta_high)
        };

        let mut pv = Pv::new();
        let score = search(engine, &mut pv, alpha, beta, depth, 0, false);

        if engine.state == SearchState::Stopped {
            return None;
        }
        if score <= alpha {
            delta_low *= 2;
            continue;
        }
        if score >= beta {
            delta_high *= 2;
            continue;
        }

        engine.pv = pv;
        return Some(score);
    }
}

fn print_search_info(engine: &Engine, depth: i32, score: i32) {
    let score_text = if score.abs() > MATE_BOUND {
        let moves_to_mate = (MATE_SCORE - score.abs() + 1) / 2;
        if score > 0 {
            format!("mate {moves_to_mate}")
        } else {
            format!("mate -{moves_to_mate}")
        }
    } else {
        format!("cp {score}")
    };

    let pv_text = engine.pv.moves[..engine.pv.len]
        .iter()
        .map(|m| m.to_uci())
        .collect::<Vec<_>>()
        .join(" ");

    println!(
        "info depth {} seldepth {} score {} nodes {} time {} pv {}",
        depth,
        engine.stats.seldepth.max(depth),
        score_text,
        engine.stats.nodes,
        engine.stats.started.elapsed().as_millis(),
        pv_text
    );
}

/// Iterative deepening driver. Emits one info line per completed depth and
/// returns the move to play.
pub fn iterative_deepening(engine: &mut Engine) -> Move {
    let mut best_move = Move::NONE;
    let mut prev_score = 0;

    for depth in 1..=engine.limits.depth {
        // The soft bound only ever stops us between iterations.
        if depth > 1 && engine.limits.soft_bound_reached() {
            debug!(depth, "soft time bound reached, not starting iteration");
            break;
        }

        match aspiration_search(engine, depth, prev_score) {
            None => break,
            Some(score) => {
                prev_score = score;
                engine.stats.score = score;
                if !engine.pv.best_move().is_none() {
                    best_move = engine.pv.best_move();
                }
                print_search_info(engine, depth, score);
            }
        }
    }

    // A stop during depth 1 can leave us with nothing; fall back to the
    // table move for this position if one exists.
    if best_move.is_none() {
        best_move = engine.tt.probe_move(engine.board.hash);
    }

    engine.state = SearchState::Idle;
    best_move
}

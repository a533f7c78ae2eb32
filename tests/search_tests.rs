use meridian::board::Board;
use meridian::engine::Engine;
use meridian::moves::movegen::generate_legal;
use meridian::moves::types::MoveList;
use meridian::search::search::iterative_deepening;
use meridian::search::timeman::SearchLimits;
use meridian::search::{MATE_BOUND, MATE_SCORE};
use meridian::square::{parse_square, rank_of};
use std::time::Instant;

fn search_fen(fen: &str, limits: SearchLimits) -> (i32, meridian::moves::types::Move, Engine) {
    let mut engine = Engine::with_hash_mb(16);
    engine.board = Board::from_fen(fen).expect("valid test FEN");
    engine.prepare_search(limits);
    let best = iterative_deepening(&mut engine);
    (engine.stats.score, best, engine)
}

fn is_legal_in(fen: &str, mv: meridian::moves::types::Move) -> bool {
    let mut board = Board::from_fen(fen).unwrap();
    let mut moves = MoveList::new();
    generate_legal(&mut moves, &mut board);
    moves.contains(&mv)
}

#[test]
fn startpos_depth_6_is_sane() {
    let fen = meridian::board::START_FEN;
    let (score, best, engine) = search_fen(fen, SearchLimits::depth(6));

    assert!(!best.is_none(), "a best move must come back");
    assert!(is_legal_in(fen, best), "best move must be legal");
    assert!(engine.pv.len > 0, "completed iterations carry a PV");
    assert_eq!(engine.pv.best_move(), best);
    assert!(score.abs() <= 200, "startpos is near-balanced, got {score}");
}

#[test]
fn mate_in_one_is_found_and_scored() {
    // Qg7# is the only mate in one.
    let fen = "7k/5Q2/5K2/8/8/8/8/8 w - - 0 1";
    let (score, best, _) = search_fen(fen, SearchLimits::depth(5));

    assert_eq!(score, MATE_SCORE - 1);
    assert_eq!(best.from_sq(), parse_square("f7").unwrap());
    assert_eq!(best.to_sq(), parse_square("g7").unwrap());

    // Reported as "mate 1" by the UCI layer's arithmetic.
    assert_eq!((MATE_SCORE - score + 1) / 2, 1);
}

#[test]
fn mate_at_ply_three_scores_mate_two() {
    // 1.Kc7 Ka7 (forced) 2.Ra1#: checkmate lands at ply 3.
    let fen = "k7/8/2K5/8/8/8/8/1R6 w - - 0 1";
    let (score, best, _) = search_fen(fen, SearchLimits::depth(6));

    assert_eq!(score, MATE_SCORE - 3);
    assert!(score > MATE_BOUND);
    assert_eq!((MATE_SCORE - score + 1) / 2, 2, "engine reports mate 2");
    assert!(is_legal_in(fen, best));
}

#[test]
fn winning_pawn_endgame_scores_positive() {
    let fen = "4k3/8/8/8/8/8/4P3/4K3 w - - 0 1";
    let (score, best, _) = search_fen(fen, SearchLimits::depth(16));

    assert!(score > 0, "extra pawn should score positive, got {score}");
    assert!(score.abs() < MATE_BOUND, "no forced mate inside this horizon");
    assert!(is_legal_in(fen, best));
}

#[test]
fn rook_endgame_finds_the_back_rank() {
    let fen = "6k1/5ppp/8/8/8/8/5PPP/R5K1 w - - 0 1";
    let (score, best, _) = search_fen(fen, SearchLimits::depth(8));

    // The winning plan (here an immediate back-rank mate) takes the rook to
    // the seventh or eighth rank.
    assert_eq!(best.from_sq(), parse_square("a1").unwrap());
    assert!(rank_of(best.to_sq()) >= 6, "rook must reach rank 7 or 8");
    assert!(score > 400);
}

#[test]
fn movetime_is_respected() {
    let start = Instant::now();
    let (_, best, _) = search_fen(
        meridian::board::START_FEN,
        SearchLimits::move_time(300),
    );
    let elapsed = start.elapsed().as_millis();

    assert!(!best.is_none());
    assert!(is_legal_in(meridian::board::START_FEN, best));
    assert!(
        elapsed < 450,
        "search with a 300ms budget returned after {elapsed}ms"
    );
}

#[test]
fn node_limit_stops_the_search() {
    let (_, best, engine) = search_fen(
        meridian::board::START_FEN,
        SearchLimits::nodes(20_000),
    );
    assert!(!best.is_none());
    // One poll window of overshoot is the allowed slack.
    assert!(engine.stats.nodes < 20_000 + 4_096 + 64);
}

#[test]
fn stalemate_scores_zero() {
    // Black to move is stalemated; searching from White's side one ply
    // earlier must see 0 for the stalemating line. Direct check: searching
    // the stalemate position itself finds no moves and no mate.
    let fen = "7k/5Q2/6K1/8/8/8/8/8 b - - 0 1";
    let (score, best, _) = search_fen(fen, SearchLimits::depth(4));
    assert_eq!(score, 0);
    assert!(best.is_none());
}

#[test]
fn deeper_search_does_not_lose_the_mate() {
    // Even with the TT warm from shallower iterations, the mate score and
    // distance must be stable across depths.
    let fen = "k7/8/2K5/8/8/8/8/1R6 w - - 0 1";
    for depth in [4, 6, 8] {
        let (score, _, _) = search_fen(fen, SearchLimits::depth(depth));
        assert_eq!(score, MATE_SCORE - 3, "depth {depth} drifted the mate score");
    }
}

use meridian::board::Board;
use meridian::moves::execute::{make, undo};
use meridian::moves::movegen::generate_legal;
use meridian::moves::perft::{perft, perft_divide};
use meridian::moves::types::MoveList;

const KIWIPETE: &str = "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1";
const POSITION_3: &str = "8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8 w - - 0 1";
const POSITION_4: &str = "r3k2r/Pppp1ppp/1b3nbN/nP6/BBP1P3/q4N2/Pp1P2PP/R2Q1RK1 w kq - 0 1";

fn run(fen: &str, depth: u32, expected: u64) {
    let mut board = Board::from_fen(fen).expect("valid test FEN");
    let nodes = perft(&mut board, depth);
    assert_eq!(nodes, expected, "perft({depth}) mismatch for {fen}");
}

#[test]
fn startpos_shallow() {
    run(meridian::board::START_FEN, 1, 20);
    run(meridian::board::START_FEN, 2, 400);
    run(meridian::board::START_FEN, 3, 8_902);
    run(meridian::board::START_FEN, 4, 197_281);
}

#[test]
fn startpos_depth_5() {
    run(meridian::board::START_FEN, 5, 4_865_609);
}

#[test]
#[ignore]
fn startpos_depth_6() {
    run(meridian::board::START_FEN, 6, 119_060_324);
}

#[test]
fn kiwipete_shallow() {
    run(KIWIPETE, 1, 48);
    run(KIWIPETE, 2, 2_039);
    run(KIWIPETE, 3, 97_862);
}

#[test]
fn kiwipete_depth_4() {
    run(KIWIPETE, 4, 4_085_603);
}

/// Exercises en passant legality while the king sits on the capture rank.
#[test]
fn position_3_depth_5() {
    run(POSITION_3, 4, 43_238);
    run(POSITION_3, 5, 674_624);
}

#[test]
fn position_4_depth_4() {
    run(POSITION_4, 3, 9_467);
    run(POSITION_4, 4, 422_333);
}

#[test]
#[ignore]
fn position_4_depth_5() {
    run(POSITION_4, 5, 15_833_292);
}

#[test]
fn divide_agrees_with_total() {
    let mut board = Board::from_fen(KIWIPETE).unwrap();
    let (rows, total) = perft_divide(&mut board, 2);
    assert_eq!(rows.len(), 48);
    assert_eq!(total, 2_039);
    let summed: u64 = rows.iter().map(|(_, n)| n).sum();
    assert_eq!(summed, total);
}

fn splitmix64(x: u64) -> u64 {
    let mut z = x.wrapping_add(0x9E37_79B9_7F4A_7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

/// Random legal walks: the board must survive make/undo round trips and the
/// incremental hash must stay equal to a full recompute throughout.
#[test]
fn random_walk_keeps_board_coherent() {
    let fens = [
        meridian::board::START_FEN,
        KIWIPETE,
        POSITION_3,
        "4k3/P7/8/8/8/8/8/4K3 w - - 0 1",
        "4k3/8/8/3pP3/8/8/8/4K3 w - d6 0 1",
    ];

    for (index, &fen) in fens.iter().enumerate() {
        for walk in 0..4u64 {
            let mut board = Board::from_fen(fen).unwrap();
            let mut seed = (index as u64 * 31 + walk)
                .wrapping_mul(0x9E37_79B9)
                .wrapping_add(7);

            for _ in 0..120 {
                board.validate().expect("board invariants hold");
                assert_eq!(board.hash, meridian::hash::zobrist::compute(&board));

                let mut moves = MoveList::new();
                generate_legal(&mut moves, &mut board);
                if moves.is_empty() {
                    break;
                }

                seed = splitmix64(seed);
                let mv = moves[(seed as usize) % moves.len()];

                let snapshot = board.clone();
                assert!(make(&mut board, mv));
                undo(&mut board, mv);
                assert_eq!(board, snapshot, "make/undo round trip diverged on {mv}");

                // Walk forward with the same move.
                make(&mut board, mv);
            }
        }
    }
}

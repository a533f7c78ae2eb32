//! UCI front-end: line-oriented command dispatch over stdin/stdout.
//!
//! A reader thread pumps stdin into a channel. Between searches the loop
//! blocks on that channel; during a search the engine drains it on the
//! node cadence, which is how `stop` and `quit` interrupt the search.

use crate::board::{Board, Color, Piece, EMPTY};
use crate::engine::Engine;
use crate::moves::perft::{perft, perft_divide};
use crate::moves::types::{
    Move, BISHOP_PROMO_FLAG, CAPTURE_FLAG, CASTLE_FLAG, EP_FLAG, KNIGHT_PROMO_FLAG,
    QUEEN_PROMO_FLAG, QUIET_FLAG, ROOK_PROMO_FLAG,
};
use crate::search::search::iterative_deepening;
use crate::search::timeman::SearchLimits;
use crate::search::tt::{HASH_SIZE_DEFAULT, HASH_SIZE_MAX, HASH_SIZE_MIN};
use crate::square::{file_of, parse_square, C1, C8, E1, E8, G1, G8};
use std::io::{self, BufRead};
use std::sync::mpsc;
use std::thread;
use std::time::Instant;
use tracing::debug;

const ENGINE_NAME: &str = "Meridian";
const ENGINE_VERSION: &str = env!("CARGO_PKG_VERSION");
const ENGINE_AUTHOR: &str = "the Meridian authors";

/// Subtracted from `movetime` budgets to cover I/O and scheduling overhead.
const MOVE_OVERHEAD_MS: u64 = 50;

/// Builds a move from UCI text, resolving the flags against the current
/// board: castling is a two-file king move from its home square, en passant
/// is a diagonal pawn move onto the ep target square.
pub fn parse_move(board: &Board, text: &str) -> Option<Move> {
    if text.len() < 4 {
        return None;
    }
    let from = parse_square(&text[0..2])?;
    let to = parse_square(&text[2..4])?;

    let moved = board.squares[from as usize];
    let captured = board.squares[to as usize];
    if moved == EMPTY {
        return None;
    }

    let mut flags = QUIET_FLAG;
    match text.as_bytes().get(4) {
        Some(b'q') => flags |= QUEEN_PROMO_FLAG,
        Some(b'r') => flags |= ROOK_PROMO_FLAG,
        Some(b'n') => flags |= KNIGHT_PROMO_FLAG,
        Some(b'b') => flags |= BISHOP_PROMO_FLAG,
        _ => {}
    }

    if captured != EMPTY {
        flags |= CAPTURE_FLAG;
    }

    if moved == Piece::King as u8
        && ((from == E1 && (to == G1 || to == C1)) || (from == E8 && (to == G8 || to == C8)))
    {
        flags = CASTLE_FLAG;
    }

    if moved == Piece::Pawn as u8 && to == board.ep_square && file_of(from) != file_of(to) {
        flags = EP_FLAG;
    }

    Some(Move::new(from, to, flags))
}

/// `position (startpos|fen <FEN>) [moves <m1> ...]`
pub fn handle_position(engine: &mut Engine, line: &str) -> Result<(), String> {
    let mut tokens = line.split_whitespace().peekable();
    tokens.next(); // "position"

    match tokens.next() {
        Some("startpos") => engine.board = Board::start(),
        Some("fen") => {
            let mut fen = String::new();
            while let Some(&token) = tokens.peek() {
                if token == "moves" {
                    break;
                }
                fen.push_str(token);
                fen.push(' ');
                tokens.next();
            }
            engine.board = Board::from_fen(fen.trim())?;
        }
        _ => return Err("position needs startpos or fen".to_string()),
    }

    if tokens.next() == Some("moves") {
        for text in tokens {
            let mv = parse_move(&engine.board, text)
                .ok_or_else(|| format!("unparsable move '{text}'"))?;

            // Flag inference trusts the text; membership in the legal move
            // list is what actually validates it.
            let mut legal = crate::moves::types::MoveList::new();
            crate::moves::movegen::generate_legal(&mut legal, &mut engine.board);
            if !legal.contains(&mv) || !crate::moves::execute::make(&mut engine.board, mv) {
                return Err(format!("illegal move '{text}' in game line"));
            }
        }
    }
    Ok(())
}

fn token_value<T: std::str::FromStr>(tokens: &[&str], name: &str) -> Option<T> {
    let index = tokens.iter().position(|&t| t == name)?;
    tokens.get(index + 1)?.parse().ok()
}

/// `go [depth N] [nodes N] [movetime ms] [wtime ms] [btime ms] [winc ms]
/// [binc ms] [movestogo N] [infinite]`
pub fn parse_go(board: &Board, line: &str) -> SearchLimits {
    let tokens: Vec<&str> = line.split_whitespace().collect();

    let depth: Option<i32> = token_value(&tokens, "depth");
    let nodes: Option<u64> = token_value(&tokens, "nodes");
    let movetime: Option<u64> = token_value(&tokens, "movetime");
    let wtime: Option<u64> = token_value(&tokens, "wtime");
    let btime: Option<u64> = token_value(&tokens, "btime");
    let winc: u64 = token_value(&tokens, "winc").unwrap_or(0);
    let binc: u64 = token_value(&tokens, "binc").unwrap_or(0);
    let movestogo: Option<u64> = token_value(&tokens, "movestogo");
    let infinite = tokens.contains(&"infinite");

    let mut limits = SearchLimits::infinite();
    if let Some(d) = depth {
        limits = SearchLimits::depth(d);
    }
    if let Some(n) = nodes {
        let d = limits.depth;
        limits = SearchLimits::nodes(n);
        limits.depth = d;
    }
    if let Some(ms) = movetime {
        let d = limits.depth;
        limits = SearchLimits::move_time(ms.saturating_sub(MOVE_OVERHEAD_MS));
        limits.depth = d;
    } else if wtime.is_some() || btime.is_some() {
        let (time_left, increment) = match board.side {
            Color::White => (wtime.unwrap_or(0), winc),
            Color::Black => (btime.unwrap_or(0), binc),
        };
        let d = limits.depth;
        limits = SearchLimits::clock(time_left, increment, movestogo);
        limits.depth = d;
    } else if infinite {
        let d = limits.depth;
        limits = SearchLimits::infinite();
        limits.depth = d;
    }

    limits
}

pub fn handle_go(engine: &mut Engine, line: &str) {
    let limits = parse_go(&engine.board, line);
    debug!(?limits, "starting search");
    engine.prepare_search(limits);
    let best_move = iterative_deepening(engine);
    println!("bestmove {}", best_move.to_uci());
}

pub fn handle_setoption(engine: &mut Engine, line: &str) {
    if let Some(value) = line.strip_prefix("setoption name Hash value ") {
        match value.trim().parse::<usize>() {
            Ok(size_mb) => {
                engine
                    .tt
                    .resize(size_mb.clamp(HASH_SIZE_MIN, HASH_SIZE_MAX));
                println!(
                    "info string Hash set to {} MB",
                    size_mb.clamp(HASH_SIZE_MIN, HASH_SIZE_MAX)
                );
            }
            Err(_) => println!("info string invalid Hash value"),
        }
    } else if line.trim() == "setoption name Clear Hash" {
        engine.tt.clear();
        println!("info string Hash cleared");
    }
}

fn handle_perft(engine: &mut Engine, line: &str) {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    if tokens.get(1) == Some(&"divide") {
        let depth = tokens.get(2).and_then(|t| t.parse().ok()).unwrap_or(4);
        let start = Instant::now();
        let (rows, total) = perft_divide(&mut engine.board, depth);
        for (text, nodes) in rows {
            println!("{text} - {nodes}");
        }
        println!("total {total} time {} ms", start.elapsed().as_millis());
    } else {
        let depth = tokens.get(1).and_then(|t| t.parse().ok()).unwrap_or(4);
        let start = Instant::now();
        let nodes = perft(&mut engine.board, depth);
        println!("nodes {nodes} time {} ms", start.elapsed().as_millis());
    }
}

fn handle_uci() {
    println!("id name {ENGINE_NAME} {ENGINE_VERSION}");
    println!("id author {ENGINE_AUTHOR}");
    println!(
        "option name Hash type spin default {HASH_SIZE_DEFAULT} min {HASH_SIZE_MIN} max {HASH_SIZE_MAX}"
    );
    println!("option name Clear Hash type button");
    println!("uciok");
}

/// Blocking command loop; returns on `quit` or closed stdin.
pub fn uci_loop() {
    let (tx, rx) = mpsc::channel::<String>();
    thread::spawn(move || {
        let stdin = io::stdin();
        for line in stdin.lock().lines() {
            match line {
                Ok(line) => {
                    if tx.send(line).is_err() {
                        break;
                    }
                }
                Err(_) => break,
            }
        }
    });

    let mut engine = Engine::new();
    engine.input = Some(rx);

    loop {
        let Some(raw) = engine.wait_input() else {
            break;
        };
        let line = raw.trim();
        if line.is_empty() {
            continue;
        }
        let command = line.split_whitespace().next().unwrap_or("");

        match command {
            "uci" => handle_uci(),
            "isready" => println!("readyok"),
            "ucinewgame" => engine.new_game(),
            "position" => {
                if let Err(err) = handle_position(&mut engine, line) {
                    eprintln!("fatal: {err}");
                    std::process::exit(1);
                }
            }
            "go" => handle_go(&mut engine, line),
            "setoption" => handle_setoption(&mut engine, line),
            "stop" => {}
            "quit" => break,
            "perft" => handle_perft(&mut engine, line),
            "display" | "d" => println!("{}", engine.board),
            _ => println!("unknown command: '{line}'"),
        }

        if engine.quit_requested {
            break;
        }
    }
}

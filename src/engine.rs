//! The engine value: board, transposition table, ordering memory, PV and
//! search bookkeeping, owned in one place and passed by reference. The
//! Zobrist keys, leaper masks and magic tables stay process-global because
//! they are immutable after initialization.

use crate::board::Board;
use crate::search::context::SearchContext;
use crate::search::timeman::SearchLimits;
use crate::search::tt::{TranspositionTable, HASH_SIZE_DEFAULT};
use crate::search::Pv;
use std::sync::mpsc::Receiver;
use std::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchState {
    Idle,
    Searching,
    Stopped,
}

pub struct SearchStats {
    pub nodes: u64,
    pub seldepth: i32,
    /// Score of the last completed iteration.
    pub score: i32,
    pub started: Instant,
}

impl SearchStats {
    fn new() -> SearchStats {
        SearchStats {
            nodes: 0,
            seldepth: 0,
            score: 0,
            started: Instant::now(),
        }
    }
}

pub struct Engine {
    pub board: Board,
    pub tt: TranspositionTable,
    pub ctx: SearchContext,
    pub pv: Pv,
    pub limits: SearchLimits,
    pub stats: SearchStats,
    pub state: SearchState,
    /// Lines pumped in from stdin; polled mid-search for stop/quit.
    pub input: Option<Receiver<String>>,
    pub quit_requested: bool,
}

impl Engine {
    pub fn new() -> Engine {
        Engine::with_hash_mb(HASH_SIZE_DEFAULT)
    }

    pub fn with_hash_mb(size_mb: usize) -> Engine {
        Engine {
            board: Board::start(),
            tt: TranspositionTable::new(size_mb),
            ctx: SearchContext::new(),
            pv: Pv::new(),
            limits: SearchLimits::infinite(),
            stats: SearchStats::new(),
            state: SearchState::Idle,
            input: None,
            quit_requested: false,
        }
    }

    /// `ucinewgame`: back to the start position with a cold table.
    pub fn new_game(&mut self) {
        self.board = Board::start();
        self.tt.clear();
    }

    /// Resets per-search state. Killers and history start fresh each root
    /// search; the transposition table persists across searches.
    pub fn prepare_search(&mut self, limits: SearchLimits) {
        self.limits = limits;
        self.pv.clear();
        self.ctx.clear();
        self.stats = SearchStats::new();
        self.state = SearchState::Searching;
    }

    /// Polls the input channel mid-search. Only `stop`, `quit` and `isready`
    /// mean anything here; other lines are dropped. Draining halts at the
    /// first stop so commands queued behind it survive for the main loop.
    pub fn poll_input(&mut self) {
        loop {
            let line = match &self.input {
                Some(rx) => match rx.try_recv() {
                    Ok(line) => line,
                    Err(_) => return,
                },
                None => return,
            };
            match line.trim() {
                "stop" => {
                    self.state = SearchState::Stopped;
                    return;
                }
                "quit" => {
                    self.state = SearchState::Stopped;
                    self.quit_requested = true;
                    return;
                }
                "isready" => println!("readyok"),
                _ => {}
            }
        }
    }

    /// Blocks for the next command line between searches.
    pub fn wait_input(&mut self) -> Option<String> {
        self.input.as_ref()?.recv().ok()
    }
}

impl Default for Engine {
    fn default() -> Engine {
        Engine::new()
    }
}

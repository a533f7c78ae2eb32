//! Two-tier time management.
//!
//! The hard bound is the absolute budget, polled inside the search on the
//! node cadence. The soft bound is half of it and is consulted only at the
//! top of each iterative-deepening iteration: if it has passed, the next
//! depth is never started. Fixed `movetime` searches collapse both bounds
//! to the same instant.

use super::MAX_DEPTH;
use std::time::{Duration, Instant};
use tracing::debug;

/// How a search is asked to stop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LimitKind {
    Depth,
    Nodes,
    Time,
    Infinite,
}

#[derive(Debug, Clone, Copy)]
pub struct SearchLimits {
    pub kind: LimitKind,
    pub depth: i32,
    pub nodes: u64,
    pub hard_deadline: Instant,
    pub soft_deadline: Instant,
}

/// Base allocation: a slice of the remaining time plus half the increment.
pub fn hard_bound_ms(time_left_ms: u64, increment_ms: u64, moves_to_go: Option<u64>) -> u64 {
    let moves_to_go = moves_to_go.unwrap_or(20);
    time_left_ms / (moves_to_go + 2) + increment_ms / 2
}

impl SearchLimits {
    pub fn infinite() -> SearchLimits {
        SearchLimits {
            kind: LimitKind::Infinite,
            depth: MAX_DEPTH - 1,
            nodes: u64::MAX,
            hard_deadline: Instant::now(),
            soft_deadline: Instant::now(),
        }
    }

    pub fn depth(depth: i32) -> SearchLimits {
        SearchLimits {
            kind: LimitKind::Depth,
            depth: depth.clamp(1, MAX_DEPTH - 1),
            ..SearchLimits::infinite()
        }
    }

    pub fn nodes(nodes: u64) -> SearchLimits {
        SearchLimits {
            kind: LimitKind::Nodes,
            nodes,
            ..SearchLimits::infinite()
        }
    }

    /// Fixed time per move; soft and hard coincide.
    pub fn move_time(budget_ms: u64) -> SearchLimits {
        let deadline = Instant::now() + Duration::from_millis(budget_ms);
        SearchLimits {
            kind: LimitKind::Time,
            hard_deadline: deadline,
            soft_deadline: deadline,
            ..SearchLimits::infinite()
        }
    }

    /// Clock-and-increment allocation.
    pub fn clock(time_left_ms: u64, increment_ms: u64, moves_to_go: Option<u64>) -> SearchLimits {
        let hard = hard_bound_ms(time_left_ms, increment_ms, moves_to_go);
        let soft = hard / 2;
        debug!(hard_ms = hard, soft_ms = soft, "time budget");
        let now = Instant::now();
        SearchLimits {
            kind: LimitKind::Time,
            hard_deadline: now + Duration::from_millis(hard),
            soft_deadline: now + Duration::from_millis(soft),
            ..SearchLimits::infinite()
        }
    }

    /// Checked at the top of each deepening iteration only.
    #[inline]
    pub fn soft_bound_reached(&self) -> bool {
        self.kind == LimitKind::Time && Instant::now() > self.soft_deadline
    }

    /// Checked on the node cadence inside the search.
    #[inline]
    pub fn hard_bound_reached(&self) -> bool {
        self.kind == LimitKind::Time && Instant::now() >= self.hard_deadline
    }
}

impl Default for SearchLimits {
    fn default() -> SearchLimits {
        SearchLimits::infinite()
    }
}

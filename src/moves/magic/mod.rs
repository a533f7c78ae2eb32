//! Magic bitboards for sliding-piece attacks.
//!
//! One-time initialization enumerates every blocker subset of each square's
//! vision mask, computes reference attacks by ray scanning, and searches for
//! a perfect-hash magic per square. After that, lookups are a mask, a
//! multiply and a shift.

pub mod attacks;
pub mod search;
mod structs;

pub use structs::{MagicEntry, MagicTables};

use once_cell::sync::Lazy;

static TABLES: Lazy<MagicTables> = Lazy::new(MagicTables::generate);

pub fn tables() -> &'static MagicTables {
    &TABLES
}

#[inline(always)]
pub fn bishop_attacks(sq: u8, occ: u64) -> u64 {
    TABLES.bishop_attacks(sq, occ)
}

#[inline(always)]
pub fn rook_attacks(sq: u8, occ: u64) -> u64 {
    TABLES.rook_attacks(sq, occ)
}

#[inline(always)]
pub fn queen_attacks(sq: u8, occ: u64) -> u64 {
    TABLES.queen_attacks(sq, occ)
}

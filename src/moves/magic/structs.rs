//! Magic table layout and the O(1) lookup path.

use super::attacks::{
    bishop_attacks_slow, bishop_mask, blocker_subsets, rook_attacks_slow, rook_mask,
};
use super::search::find_magic;
use rand::rngs::StdRng;
use rand::SeedableRng;

/// Fixed seed for the magic search; keeps startup deterministic.
const MAGIC_SEED: u64 = 0x45;

/// One square's perfect-hash data.
pub struct MagicEntry {
    pub magic: u64,
    pub shift: u32,
    pub mask: u64,
    pub table: Box<[u64]>,
}

impl MagicEntry {
    #[inline(always)]
    fn lookup(&self, occ: u64) -> u64 {
        let index = ((occ & self.mask).wrapping_mul(self.magic)) >> self.shift;
        self.table[index as usize]
    }
}

pub struct MagicTables {
    rook: Vec<MagicEntry>,
    bishop: Vec<MagicEntry>,
}

fn build_entry(sq: u8, mask: u64, reference: impl Fn(u8, u64) -> u64, rng: &mut StdRng) -> MagicEntry {
    let blockers = blocker_subsets(mask);
    let attacks: Vec<u64> = blockers.iter().map(|&b| reference(sq, b)).collect();

    let bits = mask.count_ones();
    let shift = 64 - bits;
    let magic = find_magic(&blockers, &attacks, shift, rng)
        .expect("magic search exhausted its candidate budget");

    let mut table = vec![0u64; 1 << bits].into_boxed_slice();
    for (&blocker, &attack) in blockers.iter().zip(&attacks) {
        let index = (blocker.wrapping_mul(magic)) >> shift;
        table[index as usize] = attack;
    }

    MagicEntry {
        magic,
        shift,
        mask,
        table,
    }
}

impl MagicTables {
    pub fn generate() -> MagicTables {
        let mut rng = StdRng::seed_from_u64(MAGIC_SEED);
        let mut rook = Vec::with_capacity(64);
        let mut bishop = Vec::with_capacity(64);
        for sq in 0..64u8 {
            rook.push(build_entry(sq, rook_mask(sq), rook_attacks_slow, &mut rng));
            bishop.push(build_entry(sq, bishop_mask(sq), bishop_attacks_slow, &mut rng));
        }
        MagicTables { rook, bishop }
    }

    #[inline(always)]
    pub fn rook_attacks(&self, sq: u8, occ: u64) -> u64 {
        self.rook[sq as usize].lookup(occ)
    }

    #[inline(always)]
    pub fn bishop_attacks(&self, sq: u8, occ: u64) -> u64 {
        self.bishop[sq as usize].lookup(occ)
    }

    #[inline(always)]
    pub fn queen_attacks(&self, sq: u8, occ: u64) -> u64 {
        self.rook_attacks(sq, occ) | self.bishop_attacks(sq, occ)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rook_lookup_matches_scan() {
        let tables = super::super::tables();
        let square = 27; // d4
        let blockers = (1u64 << 19) | (1u64 << 35); // d3 + d6
        assert_eq!(
            tables.rook_attacks(square, blockers),
            rook_attacks_slow(square, blockers)
        );
    }

    #[test]
    fn bishop_lookup_matches_scan() {
        let tables = super::super::tables();
        let square = 27;
        let blockers = (1u64 << 41) | (1u64 << 13); // b6 + f2
        assert_eq!(
            tables.bishop_attacks(square, blockers),
            bishop_attacks_slow(square, blockers)
        );
    }

    #[test]
    fn queen_is_union_of_rook_and_bishop() {
        let tables = super::super::tables();
        let square = 36;
        let blockers = (1u64 << 44) | (1u64 << 29) | (1u64 << 17);
        assert_eq!(
            tables.queen_attacks(square, blockers),
            tables.rook_attacks(square, blockers) | tables.bishop_attacks(square, blockers)
        );
    }

    #[test]
    fn exhaustive_against_scan_on_sample_squares() {
        let tables = super::super::tables();
        for &sq in &[0u8, 7, 27, 36, 56, 63] {
            for &subset in blocker_subsets(rook_mask(sq)).iter().step_by(7) {
                assert_eq!(tables.rook_attacks(sq, subset), rook_attacks_slow(sq, subset));
            }
            for &subset in blocker_subsets(bishop_mask(sq)).iter().step_by(3) {
                assert_eq!(
                    tables.bishop_attacks(sq, subset),
                    bishop_attacks_slow(sq, subset)
                );
            }
        }
    }
}

//! Random search for magic numbers.

use rand::RngCore;

/// Sparse 64-bit candidate: AND of three draws keeps the popcount low, which
/// is what makes a multiplier likely to hash without destructive collisions.
#[inline]
pub fn random_sparse_u64<R: RngCore>(rng: &mut R) -> u64 {
    rng.next_u64() & rng.next_u64() & rng.next_u64()
}

/// A candidate is valid when no two blocker sets with different attack sets
/// land on the same table index.
pub fn is_magic_valid(blockers: &[u64], attacks: &[u64], magic: u64, shift: u32) -> bool {
    let mut table = vec![0u64; blockers.len()];
    let mut used = vec![false; blockers.len()];

    for (&blocker, &attack) in blockers.iter().zip(attacks) {
        let index = (blocker.wrapping_mul(magic) >> shift) as usize;
        if !used[index] {
            used[index] = true;
            table[index] = attack;
        } else if table[index] != attack {
            return false;
        }
    }
    true
}

pub fn find_magic<R: RngCore>(
    blockers: &[u64],
    attacks: &[u64],
    shift: u32,
    rng: &mut R,
) -> Option<u64> {
    for _ in 0..1_000_000 {
        let magic = random_sparse_u64(rng);
        if is_magic_valid(blockers, attacks, magic, shift) {
            return Some(magic);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::moves::magic::attacks::{blocker_subsets, rook_attacks_slow, rook_mask};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn finds_a_magic_for_a_corner_rook() {
        let mask = rook_mask(0);
        let blockers = blocker_subsets(mask);
        let attacks: Vec<u64> = blockers.iter().map(|&b| rook_attacks_slow(0, b)).collect();
        let shift = 64 - mask.count_ones();

        let mut rng = StdRng::seed_from_u64(7);
        let magic = find_magic(&blockers, &attacks, shift, &mut rng).unwrap();
        assert!(is_magic_valid(&blockers, &attacks, magic, shift));
    }

    #[test]
    fn rejects_a_bad_magic() {
        let mask = rook_mask(0);
        let blockers = blocker_subsets(mask);
        let attacks: Vec<u64> = blockers.iter().map(|&b| rook_attacks_slow(0, b)).collect();
        // Multiplying by zero maps every subset to index 0.
        assert!(!is_magic_valid(&blockers, &attacks, 0, 64 - mask.count_ones()));
    }
}

//! Proof-of-work validation.

use crate::chain_params::ChainParams;
use crate::retarget::retarget_schedule;
use crate::target::{Target, Work};

/// Check whether a block hash satisfies the proof-of-work requirement
/// claimed by `nbits`.
///
/// The hash is interpreted as a 256-bit little-endian integer and must
/// not exceed the decoded target. The target itself must be positive,
/// non-overflowing, and no easier than the network's powLimit.
pub fn check_proof_of_work(hash: &[u8; 32], nbits: u32, params: &ChainParams) -> bool {
    let (target, negative, overflow) = Target::from_compact(nbits);

    if negative || target.is_zero() || overflow || target > params.pow_limit {
        return false;
    }

    Target::from_le_bytes(hash) <= target
}

/// The proof weight a block mined against `nbits` contributes to its
/// chain: `2^256 / (target + 1)`, or zero for an invalid compact.
pub fn block_proof(nbits: u32) -> Work {
    let (target, negative, overflow) = Target::from_compact(nbits);
    if negative || overflow || target.is_zero() {
        return Work::zero();
    }
    target.work()
}

/// Sanity-check a difficulty transition without walking the chain.
///
/// Off retarget boundaries the target may not change at all. On a
/// boundary the new target must fall inside the window the legacy
/// retarget could have produced: the old target scaled by the clamped
/// timespan ratio, pushed through a compact round-trip so both sides are
/// compared at the same precision.
pub fn permitted_difficulty_transition(
    params: &ChainParams,
    height: i32,
    old_nbits: u32,
    new_nbits: u32,
) -> bool {
    if params.allow_min_difficulty_blocks {
        return true;
    }

    let schedule = retarget_schedule(params, height);
    if i64::from(height) % schedule.interval != 0 {
        return old_nbits == new_nbits;
    }

    let (observed, negative, overflow) = Target::from_compact(new_nbits);
    if negative || overflow || observed.is_zero() {
        return false;
    }

    let largest = rounded_bound(old_nbits, schedule.timespan * 4, schedule.timespan, params);
    if observed > largest {
        return false;
    }

    let smallest = rounded_bound(old_nbits, schedule.timespan / 4, schedule.timespan, params);
    if observed < smallest {
        return false;
    }

    true
}

/// Scale the old target by `numerator / timespan`, clamp to powLimit,
/// and round through the compact encoding.
fn rounded_bound(old_nbits: u32, numerator: i64, timespan: i64, params: &ChainParams) -> Target {
    let (mut bound, _, _) = Target::from_compact(old_nbits);

    // Same one-bit spill guard as the legacy retarget.
    let one_bit_guard = bound.bits() > 235;
    if one_bit_guard {
        bound = bound >> 1;
    }
    bound = bound * numerator as u64 / timespan as u64;
    if one_bit_guard {
        bound = bound << 1;
    }

    if bound > params.pow_limit {
        bound = params.pow_limit;
    }

    let (rounded, _, _) = Target::from_compact(bound.to_compact());
    rounded
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::target::U256;

    fn le_hash(value: U256) -> [u8; 32] {
        let mut bytes = [0u8; 32];
        value.to_little_endian(&mut bytes);
        bytes
    }

    #[test]
    fn test_check_pow_accepts_hash_at_target() {
        let params = ChainParams::main();
        let nbits = 0x1d00_ffff;
        let (target, _, _) = Target::from_compact(nbits);

        assert!(check_proof_of_work(&le_hash(target.0), nbits, &params));
        assert!(check_proof_of_work(&le_hash(U256::zero()), nbits, &params));
        assert!(!check_proof_of_work(
            &le_hash(target.0 + U256::one()),
            nbits,
            &params
        ));
    }

    #[test]
    fn test_check_pow_rejects_bad_compacts() {
        let params = ChainParams::main();
        let hash = [0u8; 32];

        // Negative, zero, overflow.
        assert!(!check_proof_of_work(&hash, 0x01fe_dcba, &params));
        assert!(!check_proof_of_work(&hash, 0x0000_0000, &params));
        assert!(!check_proof_of_work(&hash, 0xff12_3456, &params));
    }

    #[test]
    fn test_check_pow_rejects_above_pow_limit() {
        let params = ChainParams::main();
        let hash = [0u8; 32];

        // The limit itself passes; anything easier fails.
        assert!(check_proof_of_work(&hash, 0x1e0f_ffff, &params));
        assert!(!check_proof_of_work(&hash, 0x1e10_0000, &params));
        assert!(!check_proof_of_work(&hash, 0x2100_00ff, &params));
    }

    #[test]
    fn test_block_proof_invalid_is_zero() {
        assert!(block_proof(0x0000_0000).is_zero());
        assert!(block_proof(0x01fe_dcba).is_zero());
        assert!(block_proof(0xff12_3456).is_zero());
        assert!(!block_proof(0x1d00_ffff).is_zero());
    }

    #[test]
    fn test_block_proof_monotone() {
        // A smaller target carries strictly more work.
        assert!(block_proof(0x1c00_ffff) > block_proof(0x1d00_ffff));
        assert!(block_proof(0x1d00_8888) > block_proof(0x1d00_ffff));
    }

    #[test]
    fn test_transition_off_boundary_requires_equality() {
        let params = ChainParams::main();
        assert!(permitted_difficulty_transition(
            &params,
            2017,
            0x1d00_ffff,
            0x1d00_ffff
        ));
        assert!(!permitted_difficulty_transition(
            &params,
            2017,
            0x1d00_ffff,
            0x1d00_fffe
        ));
    }

    #[test]
    fn test_transition_on_boundary_sandwich() {
        let params = ChainParams::main();
        let old = 0x1d00_ffff;

        // Unchanged and 4x in either direction stay permitted.
        assert!(permitted_difficulty_transition(&params, 2016, old, old));
        let (old_target, _, _) = Target::from_compact(old);
        let up4 = (old_target * 4).to_compact();
        let down4 = (old_target / 4).to_compact();
        assert!(permitted_difficulty_transition(&params, 2016, old, up4));
        assert!(permitted_difficulty_transition(&params, 2016, old, down4));

        // 8x either way violates the sandwich.
        let up8 = (old_target * 8).to_compact();
        let down8 = (old_target / 8).to_compact();
        assert!(!permitted_difficulty_transition(&params, 2016, old, up8));
        assert!(!permitted_difficulty_transition(&params, 2016, old, down8));
    }

    #[test]
    fn test_transition_boundary_tracks_fork_schedule() {
        let params = ChainParams::main();
        // After fork two the interval is 721, so 2016-aligned heights are
        // no longer boundaries.
        let height = 721 * 100;
        assert!(permitted_difficulty_transition(
            &params,
            height,
            0x1d00_ffff,
            (Target::from_compact(0x1d00_ffff).0 * 2).to_compact()
        ));
        assert!(!permitted_difficulty_transition(
            &params,
            height + 1,
            0x1d00_ffff,
            0x1d00_fffe
        ));
    }

    #[test]
    fn test_transition_min_difficulty_networks_skip_check() {
        let params = ChainParams::testnet();
        assert!(permitted_difficulty_transition(
            &params,
            2016,
            0x1d00_ffff,
            0x1e0f_ffff
        ));
    }

    #[test]
    fn test_transition_rejects_invalid_new_compact() {
        let params = ChainParams::main();
        assert!(!permitted_difficulty_transition(
            &params,
            2016,
            0x1d00_ffff,
            0x01fe_dcba
        ));
    }
}

//! ASERT difficulty (absolutely scheduled exponentially rising target).
//!
//! The ideal schedule issues one block every `spacing` seconds from the
//! anchor block onward. The target adapts exponentially to the tip's
//! drift from that schedule: for every `half_life` seconds behind, the
//! target doubles; for every `half_life` seconds ahead, it halves.
//!
//! The exponential is evaluated in fixed point with 16 fractional bits.
//! The integer part becomes a shift; the fractional part goes through a
//! cubic approximation of `2^x` whose error stays below 0.013%.

use crate::block_index::BlockIndexView;
use crate::chain_params::ChainParams;
use crate::error::{ConsensusError, ConsensusResult};
use crate::target::Target;
use tracing::debug;

pub(crate) fn next_work_asert<I: BlockIndexView>(tip: &I, params: &ChainParams) -> u32 {
    match asert_anchor(tip, params) {
        Ok(anchor) => {
            let time_diff = tip.time() - anchor.time();
            let height_diff = i64::from(tip.height() - anchor.height());

            let (ref_target, negative, overflow) = Target::from_compact(anchor.nbits());
            debug_assert!(!negative && !overflow);

            calculate_asert(
                ref_target,
                params.asert_spacing,
                time_diff,
                height_diff,
                params.pow_limit,
                params.asert_half_life,
            )
            .to_compact()
        }
        Err(error) => {
            // The chain state is inconsistent; minimum difficulty is the
            // safe answer because no extra work can be claimed with it.
            debug!(%error, "falling back to minimum difficulty");
            params.pow_limit.to_compact()
        }
    }
}

/// Locate the anchor block on the tip's ancestor chain.
fn asert_anchor<'a, I: BlockIndexView>(
    tip: &'a I,
    params: &ChainParams,
) -> ConsensusResult<&'a I> {
    let mut node = tip;
    while node.height() > params.asert_anchor_height {
        match node.prev() {
            Some(prev) => node = prev,
            None => break,
        }
    }

    if node.height() == params.asert_anchor_height {
        Ok(node)
    } else {
        Err(ConsensusError::AnchorMissing {
            tip_height: tip.height(),
            anchor_height: params.asert_anchor_height,
        })
    }
}

/// Floor division by `2^n` on a signed value.
///
/// Plain `/` truncates toward zero; the exponent split below needs the
/// floored quotient so that negative exponents decompose into a smaller
/// integer part and a non-negative fraction.
fn floor_shr(value: i64, n: u32) -> i64 {
    let divisor = 1i64 << n;
    let quotient = value / divisor;
    if value % divisor != 0 && value < 0 {
        quotient - 1
    } else {
        quotient
    }
}

/// Compute the ASERT target from the anchor target and the schedule
/// drift. The result is clamped to `[1, pow_limit]`.
pub fn calculate_asert(
    ref_target: Target,
    spacing: i64,
    time_diff: i64,
    height_diff: i64,
    pow_limit: Target,
    half_life: i64,
) -> Target {
    debug_assert!(!ref_target.is_zero() && ref_target <= pow_limit);
    debug_assert!(height_diff >= 0);
    // The fractional factor below is under 2^17, so the multiply stays
    // inside 256 bits as long as the anchor target leaves that headroom.
    debug_assert!(pow_limit.bits() + 17 <= 256);
    // The drift magnitude must leave room for the 16-bit fixed-point
    // scale; headers that passed timestamp rules cannot violate this.
    debug_assert!((time_diff - spacing * height_diff).unsigned_abs() < 1 << 47);

    // next = ref * 2^((time_diff - spacing * (height_diff + 1)) / half_life),
    // with the exponent carried as a signed fixed-point value * 2^16.
    let exponent = ((i128::from(time_diff) - i128::from(spacing) * (i128::from(height_diff) + 1))
        * 65536
        / i128::from(half_life)) as i64;

    // Split into integer shifts and a fraction in [0, 65536).
    let mut shifts = floor_shr(exponent, 16);
    let frac = (exponent - shifts * 65536) as u64;
    debug_assert_eq!(exponent, shifts * 65536 + frac as i64);

    // 65536 * 2^(frac/65536), via the cubic approximation
    // 2^x ~= 1 + 0.695502049*x + 0.2262698*x^2 + 0.0782318*x^3 on [0, 1).
    let frac = u128::from(frac);
    let factor = 65536u64
        + ((195_766_423_245_049u128 * frac
            + 971_821_376u128 * frac * frac
            + 5_127u128 * frac * frac * frac
            + (1u128 << 47))
            >> 48) as u64;
    let mut next = ref_target * factor;

    // Fold the 65536 scale into the integer shifts.
    shifts -= 16;
    if shifts <= 0 {
        next = next >> (-shifts).min(256) as u32;
    } else {
        // A left shift that drops high bits means the true value passed
        // 2^256; with wider integers it would have clamped to the limit
        // anyway.
        let shift = shifts.min(256) as u32;
        let shifted = next << shift;
        if shifted >> shift != next {
            next = pow_limit;
        } else {
            next = shifted;
        }
    }

    if next.is_zero() {
        // 0 is not a valid target, but 1 is.
        next = Target::one();
    } else if next > pow_limit {
        next = pow_limit;
    }
    next
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::target::U256;

    const HALF_LIFE: i64 = 7200;
    const SPACING: i64 = 123;

    fn limit() -> Target {
        Target((U256::one() << 236) - U256::one())
    }

    #[test]
    fn test_floor_shr_non_negative() {
        assert_eq!(floor_shr(0, 16), 0);
        assert_eq!(floor_shr(65535, 16), 0);
        assert_eq!(floor_shr(65536, 16), 1);
        assert_eq!(floor_shr(131_071, 16), 1);
    }

    #[test]
    fn test_floor_shr_negative_floors() {
        // Truncating division would give 0 for all of these.
        assert_eq!(floor_shr(-1, 16), -1);
        assert_eq!(floor_shr(-65535, 16), -1);
        assert_eq!(floor_shr(-65536, 16), -1);
        assert_eq!(floor_shr(-65537, 16), -2);
    }

    #[test]
    fn test_on_schedule_keeps_target() {
        // time_diff exactly matches spacing * (height_diff + 1), so the
        // exponent is zero and the target is reproduced bit for bit.
        let anchor = Target(U256::from(0x1234_5600u64) << 100);
        let next = calculate_asert(anchor, SPACING, SPACING * 101, 100, limit(), HALF_LIFE);
        assert_eq!(next, anchor);
    }

    #[test]
    fn test_one_half_life_behind_doubles() {
        let anchor = Target(U256::from(0x10_0000u64) << 80);
        let next = calculate_asert(
            anchor,
            SPACING,
            SPACING * 101 + HALF_LIFE,
            100,
            limit(),
            HALF_LIFE,
        );
        assert_eq!(next, anchor * 2);
    }

    #[test]
    fn test_one_half_life_ahead_halves() {
        let anchor = Target(U256::from(0x10_0000u64) << 80);
        let next = calculate_asert(
            anchor,
            SPACING,
            SPACING * 101 - HALF_LIFE,
            100,
            limit(),
            HALF_LIFE,
        );
        assert_eq!(next, anchor / 2);
    }

    #[test]
    fn test_eight_half_lives_behind_is_256x() {
        let anchor = Target(U256::from(0x10_0000u64) << 80);
        let next = calculate_asert(
            anchor,
            SPACING,
            SPACING * 101 + HALF_LIFE * 8,
            100,
            limit(),
            HALF_LIFE,
        );
        assert_eq!(next, anchor * 256);
    }

    #[test]
    fn test_far_behind_clamps_to_limit() {
        let next = calculate_asert(
            limit(),
            SPACING,
            SPACING * 101 + HALF_LIFE * 8,
            100,
            limit(),
            HALF_LIFE,
        );
        assert_eq!(next, limit());
    }

    #[test]
    fn test_far_ahead_clamps_to_one() {
        // 300 half-lives ahead of schedule would shift any target to
        // zero; the clamp floors it at one.
        let anchor = Target::one();
        let next = calculate_asert(
            anchor,
            SPACING,
            SPACING * 11 - HALF_LIFE * 300,
            10,
            limit(),
            HALF_LIFE,
        );
        assert_eq!(next, Target::one());
    }

    #[test]
    fn test_negative_exponent_with_fraction() {
        // One second ahead of schedule: the exponent is a small negative
        // value whose split must floor, not truncate. The result sits
        // just below the anchor target.
        let anchor = Target(U256::one() << 200);
        let next = calculate_asert(anchor, SPACING, SPACING * 101 - 60, 100, limit(), HALF_LIFE);
        assert!(next < anchor);
        assert!(next > anchor * 9930 / 10000);
    }

    #[test]
    fn test_huge_positive_shift_clamps() {
        // A drift large enough to shift past 256 bits must land exactly
        // on the limit, not wrap.
        let anchor = Target(U256::one() << 200);
        let next = calculate_asert(
            anchor,
            SPACING,
            SPACING + HALF_LIFE * 100,
            0,
            limit(),
            HALF_LIFE,
        );
        assert_eq!(next, limit());
    }
}

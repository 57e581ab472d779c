//! DarkGravityWave difficulty algorithms (revisions 2 and 3).
//!
//! Both walk a short window of recent blocks, average their targets, and
//! scale the average by the ratio of observed to scheduled block time.
//! The per-gap quantity is `prev.time - this.time` along the backward
//! walk, a signed value that is negative on a healthy chain; the clamping
//! step then pins it to a third of the scheduled span. This is historical
//! behavior and must be preserved bit for bit.

use crate::block_index::BlockIndexView;
use crate::chain_params::ChainParams;
use crate::sol::SOL_TARGET_SPACING;
use crate::target::Target;
use tracing::debug;

/// Minimum window for v2; also the depth of both v2 running averages.
const DGW2_PAST_BLOCKS_MIN: i64 = 14;

/// Maximum window for v2.
const DGW2_PAST_BLOCKS_MAX: i64 = 140;

/// Fixed window for v3.
const DGW3_PAST_BLOCKS: i64 = 24;

/// One step of the v2 running average: `avg + (value - avg) / k`, with
/// the signed difference carried on unsigned 256-bit values. Division
/// truncates toward zero on either side of the average.
fn ewma_step(avg: Target, value: Target, k: i64) -> Target {
    if value >= avg {
        avg + (value - avg) / k as u64
    } else {
        avg - (avg - value) / k as u64
    }
}

pub(crate) fn next_work_dgw2<I: BlockIndexView>(tip: &I, params: &ChainParams) -> u32 {
    if tip.height() == 0 || i64::from(tip.height()) < DGW2_PAST_BLOCKS_MIN {
        return params.pow_limit.to_compact();
    }

    let mut count: i64 = 0;
    let mut avg = Target::zero();
    let mut gap_ewma: i64 = 0;
    let mut gap_ewma_count: i64 = 0;
    let mut gap_sum: i64 = 0;
    let mut gap_count: i64 = 0;

    let mut node = tip;
    while node.height() > 0 && count < DGW2_PAST_BLOCKS_MAX {
        count += 1;

        if count <= DGW2_PAST_BLOCKS_MIN {
            let (target, negative, overflow) = Target::from_compact(node.nbits());
            debug_assert!(!negative && !overflow);
            avg = if count == 1 {
                target
            } else {
                ewma_step(avg, target, count)
            };
        }

        let Some(prev) = node.prev() else { break };
        let gap = prev.time() - node.time();
        if gap_ewma_count < DGW2_PAST_BLOCKS_MIN {
            gap_ewma_count += 1;
            gap_ewma = if gap_ewma_count == 1 {
                gap
            } else {
                (gap - gap_ewma) / gap_ewma_count + gap_ewma
            };
        }
        gap_count += 1;
        gap_sum += gap;
        node = prev;
    }

    let mut new_target = avg;
    if gap_ewma_count != 0 && gap_count != 0 {
        let mut smart_average = gap_ewma as f64 * 0.7 + (gap_sum as f64 / gap_count as f64) * 0.3;
        if smart_average < 1.0 {
            smart_average = 1.0;
        }

        let shift = SOL_TARGET_SPACING as f64 / smart_average;

        let mut actual_timespan = (count as f64 * SOL_TARGET_SPACING as f64) / shift;
        let target_timespan = count as f64 * SOL_TARGET_SPACING as f64;

        if actual_timespan < target_timespan / 3.0 {
            actual_timespan = target_timespan / 3.0;
        }
        if actual_timespan > target_timespan * 3.0 {
            actual_timespan = target_timespan * 3.0;
        }

        let actual_timespan = actual_timespan as i64;
        let target_timespan = target_timespan as i64;

        new_target = new_target * actual_timespan as u64 / target_timespan as u64;
    }

    if new_target > params.pow_limit {
        new_target = params.pow_limit;
    }

    debug!(
        height = tip.height(),
        count,
        nbits = format!("0x{:08x}", new_target.to_compact()),
        "dark gravity v2"
    );

    new_target.to_compact()
}

pub(crate) fn next_work_dgw3<I: BlockIndexView>(tip: &I, params: &ChainParams) -> u32 {
    if tip.height() == 0 || i64::from(tip.height()) < DGW3_PAST_BLOCKS {
        return params.pow_limit.to_compact();
    }

    let mut count: i64 = 0;
    let mut avg = Target::zero();
    let mut actual_timespan: i64 = 0;

    let mut node = tip;
    while node.height() > 0 && count < DGW3_PAST_BLOCKS {
        count += 1;

        let (target, negative, overflow) = Target::from_compact(node.nbits());
        debug_assert!(!negative && !overflow);
        avg = if count == 1 {
            target
        } else {
            (avg * count as u64 + target) / (count as u64 + 1)
        };

        let Some(prev) = node.prev() else { break };
        actual_timespan += prev.time() - node.time();
        node = prev;
    }

    let target_timespan = count * SOL_TARGET_SPACING;
    let actual_timespan = actual_timespan.clamp(target_timespan / 3, target_timespan * 3);

    let mut new_target = avg * actual_timespan as u64 / target_timespan as u64;
    if new_target > params.pow_limit {
        new_target = params.pow_limit;
    }

    debug!(
        height = tip.height(),
        count,
        actual_timespan,
        nbits = format!("0x{:08x}", new_target.to_compact()),
        "dark gravity v3"
    );

    new_target.to_compact()
}

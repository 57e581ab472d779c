//! Legacy interval retarget (the pre-DarkGravity algorithm).

use crate::block_index::BlockIndexView;
use crate::chain_params::ChainParams;
use crate::sol;
use crate::target::Target;
use tracing::debug;

/// Retarget cadence in force at a given height.
#[derive(Debug, Clone, Copy)]
pub(crate) struct RetargetSchedule {
    pub timespan: i64,
    pub spacing: i64,
    pub interval: i64,
}

/// The sol forks re-tune the legacy schedule. Fork one shortens the
/// retarget window to one sol but keeps the original 2016-block cadence;
/// fork two moves spacing to the Mars minute and recomputes the interval.
pub(crate) fn retarget_schedule(params: &ChainParams, height: i32) -> RetargetSchedule {
    let mut timespan = params.pow_target_timespan;
    let mut spacing = params.pow_target_spacing;
    let mut interval = params.difficulty_adjustment_interval();

    if height >= params.fork_one_height {
        timespan = sol::SOL_SECONDS;
    }
    if height >= params.fork_two_height {
        timespan = sol::SOL_SECONDS;
        spacing = sol::SOL_TARGET_SPACING;
        interval = timespan / spacing;
    }

    RetargetSchedule {
        timespan,
        spacing,
        interval,
    }
}

pub(crate) fn next_work_v1<I: BlockIndexView>(
    tip: &I,
    new_block_time: i64,
    params: &ChainParams,
) -> u32 {
    let pow_limit_compact = params.pow_limit.to_compact();
    let height = tip.height() + 1;
    let RetargetSchedule {
        timespan,
        spacing,
        interval,
    } = retarget_schedule(params, height);

    // Only change once per interval.
    if i64::from(height) % interval != 0 {
        if params.allow_min_difficulty_blocks {
            // If the chain has stalled for more than twice the target
            // spacing, a minimum-difficulty block is allowed.
            if new_block_time > tip.time() + spacing * 2 {
                return pow_limit_compact;
            }
            // Otherwise return the last non-minimum-difficulty target.
            let mut index = tip;
            loop {
                match index.prev() {
                    Some(prev)
                        if i64::from(index.height()) % interval != 0
                            && index.nbits() == pow_limit_compact =>
                    {
                        index = prev;
                    }
                    _ => break,
                }
            }
            return index.nbits();
        }
        return tip.nbits();
    }

    // Walk back the full window, except at the first retarget after
    // genesis where one fewer ancestor exists.
    let blocks_to_go_back = if i64::from(height) == interval {
        interval - 1
    } else {
        interval
    };
    let first = tip.walk_back(blocks_to_go_back);

    let actual_timespan = (tip.time() - first.time()).clamp(timespan / 4, timespan * 4);

    let (mut new_target, negative, overflow) = Target::from_compact(tip.nbits());
    debug_assert!(!negative && !overflow);

    // The intermediate product can spill one bit past 256.
    let one_bit_guard = new_target.bits() > 235;
    if one_bit_guard {
        new_target = new_target >> 1;
    }
    new_target = new_target * actual_timespan as u64 / timespan as u64;
    if one_bit_guard {
        new_target = new_target << 1;
    }

    if new_target > params.pow_limit {
        new_target = params.pow_limit;
    }

    debug!(
        height,
        timespan,
        actual_timespan,
        before = format!("0x{:08x}", tip.nbits()),
        after = format!("0x{:08x}", new_target.to_compact()),
        "legacy retarget"
    );

    new_target.to_compact()
}

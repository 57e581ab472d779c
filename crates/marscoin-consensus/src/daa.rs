//! Difficulty-adjustment dispatch.
//!
//! Four successive algorithm revisions governed this chain. Which one
//! computes the next target is a pure function of the candidate height;
//! regtest never retargets at all.

use crate::asert;
use crate::block_index::BlockIndexView;
use crate::chain_params::ChainParams;
use crate::dark_gravity;
use crate::retarget;
use tracing::trace;

/// The difficulty algorithm revisions, in activation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DaaKind {
    /// Legacy interval retarget with the sol-day forks.
    V1,
    /// DarkGravityWave v2: windowed EWMA over up to 140 blocks.
    Dgw2,
    /// DarkGravityWave v3: 24-block weighted average.
    Dgw3,
    /// Absolutely scheduled exponentially rising target.
    Asert,
}

impl DaaKind {
    /// The algorithm in force for a block at `height`.
    pub fn for_height(height: i32, params: &ChainParams) -> DaaKind {
        if height >= params.asert_height {
            DaaKind::Asert
        } else if height >= params.dgw3_height {
            DaaKind::Dgw3
        } else if height >= params.dgw2_height {
            DaaKind::Dgw2
        } else {
            DaaKind::V1
        }
    }
}

/// Compute the compact target the block after `tip` must satisfy.
///
/// `new_block_time` is the candidate header's timestamp; only the legacy
/// algorithm's testnet minimum-difficulty rule reads it. The result
/// always decodes to a target in `(0, pow_limit]`.
pub fn next_work_required<I: BlockIndexView>(
    tip: &I,
    new_block_time: i64,
    params: &ChainParams,
) -> u32 {
    if params.no_retargeting {
        return tip.nbits();
    }

    let height = tip.height() + 1;
    let kind = DaaKind::for_height(height, params);
    trace!(height, ?kind, "difficulty algorithm selected");

    match kind {
        DaaKind::V1 => retarget::next_work_v1(tip, new_block_time, params),
        DaaKind::Dgw2 => dark_gravity::next_work_dgw2(tip, params),
        DaaKind::Dgw3 => dark_gravity::next_work_dgw3(tip, params),
        DaaKind::Asert => asert::next_work_asert(tip, params),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_height_bands() {
        let params = ChainParams::main();
        assert_eq!(DaaKind::for_height(0, &params), DaaKind::V1);
        assert_eq!(DaaKind::for_height(119_999, &params), DaaKind::V1);
        assert_eq!(DaaKind::for_height(120_000, &params), DaaKind::Dgw2);
        assert_eq!(DaaKind::for_height(125_999, &params), DaaKind::Dgw2);
        assert_eq!(DaaKind::for_height(126_000, &params), DaaKind::Dgw3);
        assert_eq!(DaaKind::for_height(2_999_998, &params), DaaKind::Dgw3);
        assert_eq!(DaaKind::for_height(2_999_999, &params), DaaKind::Asert);
        assert_eq!(DaaKind::for_height(i32::MAX, &params), DaaKind::Asert);
    }
}

//! # marscoin-consensus
//!
//! Consensus rules for the Marscoin blockchain.
//!
//! This crate provides:
//! - Compact-target (nBits) arithmetic on 256-bit integers
//! - The four difficulty-adjustment algorithms and their height-gated
//!   dispatcher
//! - Proof-of-work verification and block-proof weighting
//! - Chain parameters for the five network variants
//!
//! ## Difficulty adjustment
//!
//! Marscoin's block cadence follows the Martian day: one sol is 88 775
//! seconds and the target spacing is 123 seconds after the sol forks.
//! Four algorithm revisions governed the chain over its history, selected
//! purely by block height:
//!
//! | Heights            | Algorithm                       |
//! |--------------------|---------------------------------|
//! | below 120 000      | legacy interval retarget        |
//! | 120 000 .. 126 000 | DarkGravityWave v2              |
//! | 126 000 .. 2 999 999 | DarkGravityWave v3            |
//! | 2 999 999 and up   | ASERT                           |
//!
//! Every function here is pure and deterministic: the block index is read
//! through the [`BlockIndexView`] trait and [`ChainParams`] is passed in
//! explicitly, so the same inputs produce the same compact target on
//! every node, forever.

mod asert;
mod block_index;
mod chain_params;
mod daa;
mod dark_gravity;
mod error;
mod pow;
mod retarget;
mod target;

pub use asert::calculate_asert;
pub use block_index::BlockIndexView;
pub use chain_params::{
    network_for_magic, signet_magic, BuriedDeployment, ChainParams, ChainType, Deployment,
    DeploymentPos, RegTestOptions, SigNetOptions, VersionBitsParameters,
};
pub use daa::{next_work_required, DaaKind};
pub use error::{ConsensusError, ConsensusResult};
pub use pow::{block_proof, check_proof_of_work, permitted_difficulty_transition};
pub use target::{Target, Work, U256};

/// Martian timekeeping constants.
pub mod sol {
    /// Seconds in one sol (one Martian day).
    pub const SOL_SECONDS: i64 = 88_775;

    /// Target block spacing in seconds after the second sol fork: about
    /// two Mars minutes.
    pub const SOL_TARGET_SPACING: i64 = 123;
}

//! Error types for consensus validation.

use thiserror::Error;

/// Consensus validation errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConsensusError {
    /// A compact target failed to decode to a usable value.
    #[error("invalid compact target 0x{nbits:08x}: {reason}")]
    InvalidCompact {
        nbits: u32,
        reason: &'static str,
    },

    /// The ASERT anchor block is not on the tip's ancestor chain.
    #[error("ASERT anchor at height {anchor_height} not reachable from tip at height {tip_height}")]
    AnchorMissing {
        tip_height: i32,
        anchor_height: i32,
    },
}

/// Result type for consensus operations.
pub type ConsensusResult<T> = Result<T, ConsensusError>;

//! # marscoin-tests
//!
//! Integration tests for the Marscoin consensus core:
//! - Vector tests pinning the exact compact outputs of every difficulty
//!   algorithm at its historical boundaries
//! - Property-based tests for the consensus invariants, with the
//!   fixed-width arithmetic cross-checked against an arbitrary-precision
//!   oracle

pub mod generators;



pub use generators::*;

//! Core module re-exports.
//!
//! Errors, exit codes and path layout live in `archipel-core`; cancellation
//! and directory copying are added here.

pub use archipel_core::core::*;

/// Cooperative cancellation shared across a run.
pub mod cancel;

/// Recursive directory helpers.
pub mod fs;

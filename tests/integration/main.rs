//! Integration tests
//!
//! End-to-end update runs against a mock GitHub server, and the CLI binary's
//! exit codes.

pub mod cli;
pub mod common;
pub mod update_flow;

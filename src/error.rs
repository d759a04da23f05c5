//! # Summary
//!
//! The per-slot protocol state machine never fails synchronously — every
//! condition it can observe (lost proposal, garbage radio frame, stale
//! packet) is a protocol state, not an error, and is handled inline. The
//! only real error surface is construction-time misconfiguration.

use thiserror::Error;

/// Raised when a [`crate::config::NodeConfig`] or node is constructed with
/// an inconsistent network description.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("node_index {index} out of range for node_count {count}")]
    NodeIndexOutOfRange { index: usize, count: usize },

    #[error("node_count must be at least 1")]
    EmptyNetwork,

    #[error("multipaxos batch size {k} cannot exceed log size {l}")]
    BatchLargerThanLog { k: usize, l: usize },
}

//! # Summary
//!
//! Tunables carried over from the reference implementation's `#define`s.
//! All are plain `const`s rather than compile-time feature flags since
//! nothing here needs to vary per build, only per deployment (and
//! deployment-specific values can simply be passed in).

/// Default Multi-Paxos batch size (decrees per packet), `K`.
pub const DEFAULT_PKT_SIZE: usize = 2;

/// Default Multi-Paxos ring-buffer log size, `L`. Must be `>= K`.
pub const DEFAULT_LOG_SIZE: usize = 8;

/// Reserved value filling log gaps during leader recovery.
pub const MULTIPAXOS_NO_OP: u8 = crate::value::NO_OP;

/// Rounds a Multi-Paxos node will go without hearing from a leader before
/// considering self-nomination.
pub const BECOME_LEADER_AFTER: u16 = 3;

/// Default maximum number of slots in a Synchrotron round.
pub const ROUND_MAX_SLOTS: u16 = 255;

/// Consecutive post-completion transmissions without novel information
/// before a node switches itself off.
pub const N_TX_COMPLETE: u8 = 3;

/// Lower bound (inclusive) for the randomized RX-failure restart threshold.
pub const RESTART_MIN: u8 = 3;

/// Upper bound (exclusive) for the randomized RX-failure restart threshold.
pub const RESTART_MAX: u8 = 6;

//! # Summary
//!
//! Ballots are the proposal numbers Paxos uses to totally order competing
//! proposers. A ballot packs `(round_counter, node_id)` into a single
//! comparable `u16` so that comparison, storage, and wire encoding are all
//! just integer operations.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A totally ordered, globally unique proposal number.
///
/// Packed as `round_counter << 8 | node_id`, matching the on-air layout:
/// `node_id` is the low byte, `round_counter` is the high byte. Ordering on
/// the packed integer therefore matches lexicographic `(round_counter,
/// node_id)` ordering.
///
/// Ballot `0` means "none yet" and never arises from [`Ballot::new`] because
/// callers start `round_counter` at 1.
#[derive(Copy, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Ballot(u16);

impl Ballot {
    /// The reserved "no ballot yet" value.
    pub const NONE: Ballot = Ballot(0);

    /// Builds a ballot from its two components.
    pub fn new(round_counter: u8, node_id: u8) -> Self {
        Ballot(u16::from_le_bytes([node_id, round_counter]))
    }

    /// Reconstructs a ballot from its wire-packed form.
    pub fn from_packed(packed: u16) -> Self {
        Ballot(packed)
    }

    /// The packed wire form.
    pub fn packed(self) -> u16 {
        self.0
    }

    /// The node that cast this ballot.
    pub fn node_id(self) -> u8 {
        self.0.to_le_bytes()[0]
    }

    /// The competition round this ballot was cast in.
    pub fn round_counter(self) -> u8 {
        self.0.to_le_bytes()[1]
    }

    /// `true` for [`Ballot::NONE`].
    pub fn is_none(self) -> bool {
        self.0 == 0
    }

    /// Returns a ballot with `round_counter` incremented by one, same node.
    ///
    /// Used when a proposer loses a competition and re-enters with a fresh
    /// round counter.
    pub fn next_round(self) -> Self {
        Ballot::new(self.round_counter().wrapping_add(1), self.node_id())
    }
}

impl fmt::Debug for Ballot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Ballot({}.{})", self.round_counter(), self.node_id())
    }
}

/// The three phases of a Paxos instance (or one batch of a Multi-Paxos log).
///
/// Declaration order is significant: `Phase` derives `Ord`, and the per-slot
/// ordering check relies on `Init < Prepare < Accept`.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Phase {
    /// Heartbeat only; no Paxos instance running yet.
    #[default]
    Init = 0,
    /// Phase 1 (prepare / promise).
    Prepare = 1,
    /// Phase 2 (accept / accepted).
    Accept = 2,
}

impl Phase {
    /// Decodes a phase from its wire byte, treating anything else as
    /// unreachable (ignored by the caller, logged at `trace!`).
    pub fn from_wire(byte: u8) -> Option<Phase> {
        match byte {
            0 => Some(Phase::Init),
            1 => Some(Phase::Prepare),
            2 => Some(Phase::Accept),
            _ => None,
        }
    }

    pub fn to_wire(self) -> u8 {
        self as u8
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn packed_ordering_matches_lexicographic() {
        let a = Ballot::new(1, 1);
        let b = Ballot::new(1, 2);
        let c = Ballot::new(2, 1);
        assert!(a < b);
        assert!(b < c);
        assert!(a < c);
    }

    #[test]
    fn none_is_zero() {
        assert!(Ballot::NONE.is_none());
        assert_eq!(Ballot::NONE.packed(), 0);
    }

    #[test]
    fn next_round_bumps_round_counter_only() {
        let a = Ballot::new(3, 7);
        let b = a.next_round();
        assert_eq!(b.round_counter(), 4);
        assert_eq!(b.node_id(), 7);
    }

    #[test]
    fn phase_order() {
        assert!(Phase::Init < Phase::Prepare);
        assert!(Phase::Prepare < Phase::Accept);
    }

    #[test]
    fn phase_from_wire_rejects_garbage() {
        assert_eq!(Phase::from_wire(3), None);
        assert_eq!(Phase::from_wire(2), Some(Phase::Accept));
    }
}

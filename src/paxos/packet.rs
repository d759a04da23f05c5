//! # Summary
//!
//! The on-air packet format for single-decree Wireless Paxos: a fixed
//! six-byte header followed by the variable-length participation bitset.
//! Encoding is hand-rolled rather than derived, since the wire format is
//! byte-packed and little-endian by contract (§6), not merely "whatever the
//! serializer happens to produce".

use crate::ballot::{Ballot, Phase};
use crate::flags::FlagSet;
use crate::value::Value;

/// Size in bytes of the fixed header, excluding the flags tail.
pub const HEADER_LEN: usize = 6;

/// A single-decree Paxos packet: the shared state that floods the network.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Packet {
    pub ballot: Ballot,
    pub phase: Phase,
    pub value: Value,
    pub proposal: Ballot,
    pub flags: FlagSet,
}

impl Packet {
    /// Total wire size for a network of `node_count` nodes.
    pub fn wire_len(node_count: usize) -> usize {
        HEADER_LEN + FlagSet::byte_len(node_count)
    }

    /// An INIT-phase packet with only this node's flag bit set.
    pub fn init_template(node_index: usize, node_count: usize) -> Self {
        Packet {
            ballot: Ballot::NONE,
            phase: Phase::Init,
            value: 0,
            proposal: Ballot::NONE,
            flags: FlagSet::only_self(node_index, node_count),
        }
    }

    pub fn encode(&self, out: &mut [u8]) {
        out[0..2].copy_from_slice(&self.ballot.packed().to_le_bytes());
        out[2] = self.phase.to_wire();
        out[3] = self.value;
        out[4..6].copy_from_slice(&self.proposal.packed().to_le_bytes());
        out[HEADER_LEN..].copy_from_slice(self.flags.as_bytes());
    }

    /// Decodes a packet out of a buffer sized by [`Packet::wire_len`].
    ///
    /// Returns `None` for a phase byte this build does not recognize (the
    /// unreachable-phase-value outcome, §7) rather than panicking — the
    /// caller treats it the same as a failed receive.
    pub fn decode(bytes: &[u8], node_count: usize) -> Option<Self> {
        if bytes.len() < HEADER_LEN {
            return None;
        }
        let ballot = Ballot::from_packed(u16::from_le_bytes([bytes[0], bytes[1]]));
        let phase = Phase::from_wire(bytes[2])?;
        let value = bytes[3];
        let proposal = Ballot::from_packed(u16::from_le_bytes([bytes[4], bytes[5]]));
        let flags = FlagSet::from_bytes(&bytes[HEADER_LEN..], node_count);
        Some(Packet {
            ballot,
            phase,
            value,
            proposal,
            flags,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_wire_bytes() {
        let node_count = 10;
        let mut flags = FlagSet::empty(node_count);
        flags.set(3);
        flags.set(7);
        let packet = Packet {
            ballot: Ballot::new(2, 5),
            phase: Phase::Accept,
            value: 42,
            proposal: Ballot::new(2, 5),
            flags,
        };
        let mut buf = vec![0u8; Packet::wire_len(node_count)];
        packet.encode(&mut buf);
        let decoded = Packet::decode(&buf, node_count).unwrap();
        assert_eq!(packet, decoded);
    }

    #[test]
    fn rejects_unreachable_phase_byte() {
        let mut buf = vec![0u8; Packet::wire_len(5)];
        buf[2] = 9;
        assert!(Packet::decode(&buf, 5).is_none());
    }
}

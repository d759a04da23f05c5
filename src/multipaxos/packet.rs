//! # Summary
//!
//! The on-air packet format for Multi-Paxos: a fixed header plus `K` batched
//! decree values/proposals plus the variable-length flags tail, exactly
//! like single-decree Paxos but widened to cover a window of the log.

use crate::ballot::{Ballot, Phase};
use crate::flags::FlagSet;
use crate::value::Value;

/// Fixed header size, excluding the `K` values/proposals and the flags
/// tail: ballot(2) + phase(1) + round(2) + max_heard_round(2).
pub const FIXED_HEADER_LEN: usize = 7;

/// A Multi-Paxos packet batching `K` consecutive decrees.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Packet<const K: usize> {
    pub ballot: Ballot,
    pub phase: Phase,
    /// First decree number this packet covers.
    pub round: u16,
    /// Highest decree any replying acceptor has previously participated in.
    pub max_heard_round: u16,
    pub values: [Value; K],
    pub proposals: [Ballot; K],
    pub flags: FlagSet,
}

impl<const K: usize> Packet<K> {
    pub fn header_len() -> usize {
        FIXED_HEADER_LEN + K + 2 * K
    }

    pub fn wire_len(node_count: usize) -> usize {
        Self::header_len() + FlagSet::byte_len(node_count)
    }

    pub fn init_template(node_index: usize, node_count: usize) -> Self {
        Packet {
            ballot: Ballot::NONE,
            phase: Phase::Init,
            round: 0,
            max_heard_round: 0,
            values: [0u8; K],
            proposals: [Ballot::NONE; K],
            flags: FlagSet::only_self(node_index, node_count),
        }
    }

    pub fn encode(&self, out: &mut [u8]) {
        out[0..2].copy_from_slice(&self.ballot.packed().to_le_bytes());
        out[2] = self.phase.to_wire();
        out[3..5].copy_from_slice(&self.round.to_le_bytes());
        out[5..7].copy_from_slice(&self.max_heard_round.to_le_bytes());
        let values_off = FIXED_HEADER_LEN;
        out[values_off..values_off + K].copy_from_slice(&self.values);
        let proposals_off = values_off + K;
        for i in 0..K {
            let at = proposals_off + i * 2;
            out[at..at + 2].copy_from_slice(&self.proposals[i].packed().to_le_bytes());
        }
        out[Self::header_len()..].copy_from_slice(self.flags.as_bytes());
    }

    pub fn decode(bytes: &[u8], node_count: usize) -> Option<Self> {
        if bytes.len() < Self::header_len() {
            return None;
        }
        let ballot = Ballot::from_packed(u16::from_le_bytes([bytes[0], bytes[1]]));
        let phase = Phase::from_wire(bytes[2])?;
        let round = u16::from_le_bytes([bytes[3], bytes[4]]);
        let max_heard_round = u16::from_le_bytes([bytes[5], bytes[6]]);
        let values_off = FIXED_HEADER_LEN;
        let mut values = [0u8; K];
        values.copy_from_slice(&bytes[values_off..values_off + K]);
        let proposals_off = values_off + K;
        let mut proposals = [Ballot::NONE; K];
        for i in 0..K {
            let at = proposals_off + i * 2;
            proposals[i] = Ballot::from_packed(u16::from_le_bytes([bytes[at], bytes[at + 1]]));
        }
        let flags = FlagSet::from_bytes(&bytes[Self::header_len()..], node_count);
        Some(Packet {
            ballot,
            phase,
            round,
            max_heard_round,
            values,
            proposals,
            flags,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_wire_bytes() {
        let node_count = 9;
        let packet: Packet<2> = Packet {
            ballot: Ballot::new(3, 1),
            phase: Phase::Accept,
            round: 4,
            max_heard_round: 9,
            values: [11, 22],
            proposals: [Ballot::new(3, 1), Ballot::NONE],
            flags: FlagSet::only_self(2, node_count),
        };
        let mut buf = vec![0u8; Packet::<2>::wire_len(node_count)];
        packet.encode(&mut buf);
        let decoded = Packet::<2>::decode(&buf, node_count).unwrap();
        assert_eq!(packet, decoded);
    }
}

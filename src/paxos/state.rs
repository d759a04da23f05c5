//! # Summary
//!
//! Per-node state for single-decree Wireless Paxos: an acceptor (always
//! present), an optional proposer overlay, a learner, and the scratch
//! buffers a round's worth of aggregation needs.

use crate::ballot::{Ballot, Phase};
use crate::value::Value;

/// Distributed-memory half of the protocol. Persists across rounds unless
/// explicitly reset.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct AcceptorState {
    /// Lowest ballot this acceptor will still consider.
    pub min_proposal: Ballot,
    /// Highest ballot this acceptor has accepted.
    pub accepted_proposal: Ballot,
    /// Value accepted alongside `accepted_proposal`.
    pub accepted_value: Value,
}

/// Proposer overlay, present only on the node(s) driving this round.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ProposerState {
    pub proposed_ballot: Ballot,
    pub proposed_value: Value,
    pub phase: Phase,
    pub got_majority: bool,
    pub got_majority_at_slot: u16,
    /// Slots remaining before this proposer re-enters PREPARE after losing.
    pub loser_timeout: u8,
}

impl ProposerState {
    pub fn new(node_index: usize, value: Value) -> Self {
        ProposerState {
            proposed_ballot: Ballot::new(1, node_index as u8),
            proposed_value: value,
            phase: Phase::Init,
            got_majority: false,
            got_majority_at_slot: 0,
            loser_timeout: 0,
        }
    }
}

/// Whatever value this node has learned was chosen, if any.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct LearnerState {
    pub learned_value: Option<Value>,
}

/// Round-scoped scratch cleared at every phase transition.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Aggregation {
    pub rx_min_proposal: Ballot,
    pub rx_accepted_proposal: Ballot,
    pub rx_accepted_value: Value,
}

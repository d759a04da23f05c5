//! # Summary
//!
//! Per-role state for Multi-Paxos. The acceptor and learner logs are fixed-
//! size ring buffers of `L` slots, indexed by `decree mod L`; the leader
//! and per-slot aggregation hold a batch window of `K` decrees at a time.

use crate::ballot::{Ballot, Phase};
use crate::value::Value;

/// A decree number of `0` is reserved to mean "nothing yet"; real decrees
/// are numbered starting from `1`.
pub const NO_DECREE: u16 = 0;

/// Acceptor state for `L` ring-buffered log slots. Every node carries this
/// unconditionally, just as in single-decree Paxos.
#[derive(Clone, Debug)]
pub struct AcceptorState<const L: usize> {
    pub min_proposal: Ballot,
    pub accepted_proposals: [Ballot; L],
    pub accepted_values: [Value; L],
    /// Highest decree number this acceptor has ever accepted anything for.
    pub last_round_participation: u16,
}

impl<const L: usize> Default for AcceptorState<L> {
    fn default() -> Self {
        AcceptorState {
            min_proposal: Ballot::NONE,
            accepted_proposals: [Ballot::NONE; L],
            accepted_values: [0u8; L],
            last_round_participation: NO_DECREE,
        }
    }
}

impl<const L: usize> AcceptorState<L> {
    pub fn slot_of(decree: u16) -> usize {
        decree as usize % L
    }
}

/// Learner state: one slot of "has this decree been learned, and what" per
/// ring buffer position, plus the highest decree number learned so far.
#[derive(Clone, Debug)]
pub struct LearnerState<const L: usize> {
    pub learned_values: [Option<Value>; L],
    pub last_learned_decree: u16,
}

impl<const L: usize> Default for LearnerState<L> {
    fn default() -> Self {
        LearnerState {
            learned_values: [None; L],
            last_learned_decree: NO_DECREE,
        }
    }
}

impl<const L: usize> LearnerState<L> {
    pub fn learned(&self, decree: u16) -> Option<Value> {
        if decree == NO_DECREE {
            return None;
        }
        self.learned_values[AcceptorState::<L>::slot_of(decree)]
    }

    pub fn learn(&mut self, decree: u16, value: Value) {
        self.learned_values[AcceptorState::<L>::slot_of(decree)] = Some(value);
        if decree > self.last_learned_decree {
            self.last_learned_decree = decree;
        }
    }
}

/// Leader-only state: a proposer batching `K` consecutive decrees starting
/// at `base_decree`.
#[derive(Clone, Debug)]
pub struct LeaderState<const K: usize> {
    pub proposed_ballot: Ballot,
    pub base_decree: u16,
    pub proposed_values: [Value; K],
    pub phase: Phase,
    pub got_majority: bool,
    pub got_majority_at_slot: u16,
    pub loser_timeout: u8,
    /// Set when a gap in the learned log forces another iteration of
    /// PREPARE over an earlier batch window before this one can proceed.
    pub do_another_phase_1: bool,
}

impl<const K: usize> LeaderState<K> {
    pub fn new(node_index: usize, round_counter: u8, base_decree: u16, values: [Value; K]) -> Self {
        LeaderState {
            proposed_ballot: Ballot::new(round_counter, node_index as u8),
            base_decree,
            proposed_values: values,
            phase: Phase::Init,
            got_majority: false,
            got_majority_at_slot: 0,
            loser_timeout: 0,
            do_another_phase_1: false,
        }
    }
}

/// Per-slot convergecast aggregation over the current batch window.
#[derive(Clone, Debug)]
pub struct Aggregation<const K: usize> {
    pub rx_min_proposal: Ballot,
    pub rx_accepted_proposals: [Ballot; K],
    pub rx_accepted_values: [Value; K],
    /// Highest decree any replying acceptor has previously participated in;
    /// used to detect that iterative Prepare is required.
    pub rx_max_heard_round: u16,
}

impl<const K: usize> Default for Aggregation<K> {
    fn default() -> Self {
        Aggregation {
            rx_min_proposal: Ballot::NONE,
            rx_accepted_proposals: [Ballot::NONE; K],
            rx_accepted_values: [0u8; K],
            rx_max_heard_round: NO_DECREE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn learner_tracks_highest_decree_seen() {
        let mut learner: LearnerState<4> = LearnerState::default();
        learner.learn(1, 10);
        learner.learn(3, 30);
        learner.learn(2, 20);
        assert_eq!(learner.last_learned_decree, 3);
        assert_eq!(learner.learned(1), Some(10));
        assert_eq!(learner.learned(4), None);
    }

    #[test]
    fn ring_buffer_wraps_by_modulus() {
        assert_eq!(AcceptorState::<4>::slot_of(1), 1);
        assert_eq!(AcceptorState::<4>::slot_of(5), 1);
        assert_eq!(AcceptorState::<4>::slot_of(8), 0);
    }
}

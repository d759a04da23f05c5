//! # Summary
//!
//! `PaxosNode` is the owned value a round driver holds for the lifetime of
//! a node's participation in single-decree Wireless Paxos. It replaces the
//! reference implementation's module-level statics: nothing here is ever
//! shared, so the per-slot function takes it by exclusive reference and
//! nothing more.

use crate::config::NodeConfig;
use crate::paxos::state::{Aggregation, AcceptorState, LearnerState, ProposerState};

/// Owned per-node state for one network's worth of single-decree Paxos.
pub struct PaxosNode {
    pub(crate) config: NodeConfig,
    pub(crate) acceptor: AcceptorState,
    pub(crate) proposer: Option<ProposerState>,
    pub(crate) learner: LearnerState,
    pub(crate) aggregation: Aggregation,

    // Slot-local bookkeeping, reset at the start of every round.
    pub(crate) tx_flag: bool,
    pub(crate) got_valid_rx: bool,
    pub(crate) complete: bool,
    pub(crate) completion_slot: u16,
    pub(crate) off_slot: u16,
    pub(crate) tx_count_complete: u8,
    pub(crate) invalid_rx_count: u8,
    pub(crate) restart_threshold: u8,
    pub(crate) value_chosen_this_round: bool,
    pub(crate) rx_delta: bool,
}

impl PaxosNode {
    pub fn new(config: NodeConfig) -> Self {
        PaxosNode {
            config,
            acceptor: AcceptorState::default(),
            proposer: None,
            learner: LearnerState::default(),
            aggregation: Aggregation::default(),
            tx_flag: false,
            got_valid_rx: false,
            complete: false,
            completion_slot: 0,
            off_slot: 0,
            tx_count_complete: 0,
            invalid_rx_count: 0,
            restart_threshold: 0,
            value_chosen_this_round: false,
            rx_delta: false,
        }
    }

    /// Clears acceptor, proposer, and learner state. Application-triggered,
    /// typically called between rounds once a round has completed.
    pub fn reset_state(&mut self) {
        self.acceptor = AcceptorState::default();
        self.proposer = None;
        self.learner = LearnerState::default();
        self.aggregation = Aggregation::default();
        self.completion_slot = 0;
        self.off_slot = 0;
    }

    pub fn completion_slot(&self) -> u16 {
        self.completion_slot
    }

    pub fn off_slot(&self) -> u16 {
        self.off_slot
    }

    /// `true` iff this node is proposing and has a majority of replies in
    /// ACCEPT phase.
    pub fn proposer_got_majority(&self) -> bool {
        self.proposer
            .as_ref()
            .map(|p| p.got_majority && p.phase == crate::ballot::Phase::Accept)
            .unwrap_or(false)
    }

    /// `true` iff this node is proposing and the round reached full
    /// (network-wide) participation.
    pub fn proposer_got_network_wide_consensus(&self) -> bool {
        self.proposer.is_some() && self.completion_slot > 0
    }

    pub fn learned_value(&self) -> Option<u8> {
        self.learner.learned_value
    }
}

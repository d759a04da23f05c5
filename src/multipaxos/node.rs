//! # Summary
//!
//! `MultiPaxosNode<K, L>` is the owned per-node state for one network's
//! worth of Multi-Paxos: `K` is the batch size proposed per leader round,
//! `L` is the ring-buffer log depth. Both are deployment-fixed constants,
//! unlike `node_count`, which varies per network and so still lives in
//! [`crate::config::NodeConfig`] as a runtime value.

use rand::{Rng, RngCore};

use crate::config::NodeConfig;
use crate::multipaxos::state::{AcceptorState, Aggregation, LeaderState, LearnerState};

/// Decides whether an acceptor that has stopped hearing from the leader
/// should attempt to become the new leader itself. The default
/// implementation is a Bernoulli draw, mirroring the transmission
/// dampening used elsewhere in the protocol to avoid every acceptor
/// self-promoting in lockstep.
pub trait LeaderElection {
    fn should_become_leader(&mut self, node_count: usize, rng: &mut dyn RngCore) -> bool;
}

/// Draws true with probability `~4/node_count`, so that on average about
/// four acceptors contend for leadership on any given failure.
pub struct DefaultLeaderElection;

impl LeaderElection for DefaultLeaderElection {
    fn should_become_leader(&mut self, node_count: usize, rng: &mut dyn RngCore) -> bool {
        let denom = node_count.max(1);
        rng.gen_range(0..denom) < 4.min(denom)
    }
}

/// Owned per-node state for one network's worth of Multi-Paxos.
pub struct MultiPaxosNode<const K: usize, const L: usize> {
    pub(crate) config: NodeConfig,
    pub(crate) acceptor: AcceptorState<L>,
    pub(crate) leader: Option<LeaderState<K>>,
    pub(crate) learner: LearnerState<L>,
    pub(crate) aggregation: Aggregation<K>,

    /// Decree this node currently believes is the base of the active
    /// batch window, whether or not it is leading.
    pub(crate) current_base_decree: u16,
    /// Slots elapsed since this node last heard a heartbeat or proposal
    /// from a ballot at least as high as the one it last recognized.
    pub(crate) not_heard_from_leader_since: u16,

    // Slot-local bookkeeping, reset at the start of every round.
    pub(crate) tx_flag: bool,
    pub(crate) got_valid_rx: bool,
    pub(crate) complete: bool,
    pub(crate) completion_slot: u16,
    pub(crate) off_slot: u16,
    pub(crate) tx_count_complete: u8,
    pub(crate) invalid_rx_count: u8,
    pub(crate) restart_threshold: u8,
    pub(crate) rx_delta: bool,
    /// Whether an INIT heartbeat has already been handled this round; the
    /// acceptor log is never reset between rounds, so unlike single-decree
    /// Paxos this can't be inferred from `acceptor.min_proposal`.
    pub(crate) seen_init_this_round: bool,
}

impl<const K: usize, const L: usize> MultiPaxosNode<K, L> {
    /// Builds a node for a `K`-batch, `L`-ring-buffer Multi-Paxos
    /// deployment. Fails if the batch size exceeds the log depth, since a
    /// single batch would then overwrite itself before it could be
    /// superseded.
    pub fn new(config: NodeConfig) -> Result<Self, crate::error::ConfigError> {
        if K > L {
            return Err(crate::error::ConfigError::BatchLargerThanLog { k: K, l: L });
        }
        Ok(Self::new_unchecked(config))
    }

    fn new_unchecked(config: NodeConfig) -> Self {
        MultiPaxosNode {
            config,
            acceptor: AcceptorState::default(),
            leader: None,
            learner: LearnerState::default(),
            aggregation: Aggregation::default(),
            current_base_decree: 1,
            not_heard_from_leader_since: 0,
            tx_flag: false,
            got_valid_rx: false,
            complete: false,
            completion_slot: 0,
            off_slot: 0,
            tx_count_complete: 0,
            invalid_rx_count: 0,
            restart_threshold: 0,
            rx_delta: false,
            seen_init_this_round: false,
        }
    }

    /// Seeds this node's leader state per the initial-leader-state rule:
    /// start from the first unchosen decree this node knows about, with a
    /// round counter ahead of any this node has previously proposed.
    pub(crate) fn become_leader(&mut self, values: [crate::value::Value; K]) {
        let prior_round_counter = self
            .leader
            .as_ref()
            .map(|l| l.proposed_ballot.round_counter())
            .unwrap_or(0);
        let round_counter = prior_round_counter.max(1);

        let mut base = self.learner.last_learned_decree.saturating_add(1).max(1);
        if self.acceptor.last_round_participation > 0 {
            base = base.max(
                self.acceptor
                    .last_round_participation
                    .saturating_add(1)
                    .saturating_sub(K as u16),
            );
        }

        self.leader = Some(LeaderState::new(
            self.config.node_index(),
            round_counter,
            base,
            values,
        ));
        self.current_base_decree = base;
        self.not_heard_from_leader_since = 0;
    }

    /// Forces the leader to re-propose the previous batch window, e.g.
    /// after suspecting a learner missed the decision.
    pub fn replay_last_consensus(&mut self) {
        if let Some(leader) = &mut self.leader {
            leader.base_decree = leader.base_decree.saturating_sub(K as u16);
            leader.phase = crate::ballot::Phase::Prepare;
            leader.got_majority = false;
            self.current_base_decree = leader.base_decree;
        }
    }

    /// `true` iff this node is leading and holds a majority in ACCEPT.
    pub fn leader_got_majority(&self) -> bool {
        self.leader
            .as_ref()
            .map(|l| l.got_majority && l.phase == crate::ballot::Phase::Accept)
            .unwrap_or(false)
    }

    /// `true` iff this node is leading and the round reached full
    /// (network-wide) participation.
    pub fn leader_got_network_wide_consensus(&self) -> bool {
        self.leader.is_some() && self.completion_slot > 0
    }

    pub fn reset_slot_state(&mut self) {
        self.tx_flag = false;
        self.got_valid_rx = false;
        self.complete = false;
        self.completion_slot = 0;
        self.off_slot = 0;
        self.tx_count_complete = 0;
        self.invalid_rx_count = 0;
    }

    pub fn completion_slot(&self) -> u16 {
        self.completion_slot
    }

    pub fn off_slot(&self) -> u16 {
        self.off_slot
    }

    pub fn is_leading(&self) -> bool {
        self.leader.is_some()
    }

    pub fn learned_value(&self, decree: u16) -> Option<crate::value::Value> {
        self.learner.learned(decree)
    }

    pub fn last_learned_decree(&self) -> u16 {
        self.learner.last_learned_decree
    }
}

//! # Summary
//!
//! The per-slot state update for single-decree Wireless Paxos: the
//! function a scheduler calls once per radio slot. It is simultaneously an
//! acceptor, a proposer, a convergecast aggregator over the participation
//! bitset, and the decision procedure for the next radio state.

use log::{debug, info, trace};
use rand::{Rng, RngCore};

use crate::ballot::{Ballot, Phase};
use crate::constants::{N_TX_COMPLETE, RESTART_MAX, RESTART_MIN, ROUND_MAX_SLOTS};
use crate::flags::FlagSet;
use crate::paxos::node::PaxosNode;
use crate::paxos::packet::Packet;
use crate::paxos::state::ProposerState;
use crate::scheduler::{RadioState, SlotContext};

impl PaxosNode {
    /// Runs one slot's worth of protocol logic and returns the next radio
    /// state. `tx_buf` is decoded, mutated, and re-encoded in place; it
    /// must already hold this node's previous transmit content (the round
    /// driver is responsible for seeding it at round start).
    pub(crate) fn process_slot(
        &mut self,
        ctx: SlotContext,
        rx_bytes: &[u8],
        tx_buf: &mut [u8],
        rng: &mut dyn RngCore,
    ) -> RadioState {
        let node_count = self.config.node_count();
        let node_index = self.config.node_index();

        let mut tx = Packet::decode(tx_buf, node_count).expect("tx buffer sized by round driver");
        self.rx_delta = false;

        let rx_valid = ctx.last_success
            && (ctx.current_state == RadioState::Rx
                || (ctx.current_state == RadioState::Tx && self.proposer.is_some()));

        if rx_valid {
            match Packet::decode(rx_bytes, node_count) {
                Some(payload) => {
                    self.got_valid_rx = true;
                    self.handle_payload(ctx, &payload, &mut tx, node_index, node_count, rng);
                }
                None => trace!("node {}: discarding undecodable payload", node_index),
            }
        }

        let next_state = self.decide_radio_state(ctx, rng);
        tx.encode(tx_buf);
        if next_state == RadioState::Off && self.off_slot == 0 {
            self.off_slot = ctx.slot;
        }
        next_state
    }

    fn handle_payload(
        &mut self,
        ctx: SlotContext,
        payload: &Packet,
        tx: &mut Packet,
        node_index: usize,
        node_count: usize,
        rng: &mut dyn RngCore,
    ) {
        if payload.phase == Phase::Init && self.acceptor.min_proposal.is_none() {
            self.handle_init_heartbeat(payload, tx, node_index, node_count);
            return;
        }

        let newer = payload.ballot > tx.ballot
            || (payload.ballot == tx.ballot && payload.phase >= tx.phase);
        if !newer {
            // Stale packet: teach the sender our (newer) state instead.
            self.tx_flag = true;
            return;
        }

        let new_phase = payload.ballot != tx.ballot || payload.phase != tx.phase;
        if new_phase {
            debug!(
                "node {}: new phase {:?}/{:?}",
                node_index, payload.ballot, payload.phase
            );
            *tx = payload.clone();
            self.aggregation = Default::default();
            self.rx_delta = true;
        }

        match payload.phase {
            Phase::Prepare => self.run_acceptor_prepare(payload, tx),
            Phase::Accept => self.run_acceptor_accept(payload, tx),
            Phase::Init => unreachable!("handled by the INIT-heartbeat branch above"),
        }

        if payload.phase == Phase::Accept
            && payload.ballot == payload.proposal
            && payload.flags.has_majority()
        {
            self.learner.learned_value = Some(payload.value);
            self.value_chosen_this_round = true;
        }

        if !new_phase {
            let flags_changed = tx.flags.merge(&payload.flags);
            self.rx_delta = self.rx_delta || flags_changed;
        }
        tx.flags.set(node_index);
        let n_replies = tx.flags.popcount();

        if self.proposer.is_none()
            && payload.phase == Phase::Prepare
            && n_replies * 2 > node_count
            && self.tx_flag
        {
            let half = (node_count / 2).max(1);
            self.tx_flag = rng.gen_range(0..half) == 0;
        }

        if payload.phase == Phase::Accept && tx.flags.is_complete() {
            if self.completion_slot == 0 {
                self.completion_slot = ctx.slot;
                self.complete = true;
            }
            self.tx_flag = true;
        }

        if let Some(mut proposer) = self.proposer.take() {
            if !proposer.got_majority {
                self.run_proposer(ctx, payload, tx, &mut proposer, node_index, node_count, n_replies);
            }
            self.proposer = Some(proposer);
        }
    }

    fn handle_init_heartbeat(
        &mut self,
        payload: &Packet,
        tx: &mut Packet,
        node_index: usize,
        node_count: usize,
    ) {
        if let Some(proposer) = &mut self.proposer {
            if proposer.phase == Phase::Init {
                tx.ballot = proposer.proposed_ballot;
                tx.phase = Phase::Prepare;
                tx.proposal = Ballot::NONE;
                tx.value = proposer.proposed_value;
                tx.flags = FlagSet::only_self(node_index, node_count);
                self.acceptor.min_proposal = proposer.proposed_ballot;
                proposer.phase = Phase::Prepare;
                self.tx_flag = true;
                info!("node {}: bootstrapping prepare {:?}", node_index, tx.ballot);
                return;
            }
        }
        let before = tx.flags.clone();
        *tx = payload.clone();
        tx.flags.merge(&before);
        tx.flags.set(node_index);
        self.tx_flag = tx.flags != before;
    }

    fn run_acceptor_prepare(&mut self, payload: &Packet, tx: &mut Packet) {
        if payload.ballot > self.acceptor.min_proposal {
            self.acceptor.min_proposal = payload.ballot;
        }

        let mut best = self.aggregation.rx_accepted_proposal;
        let mut best_value = self.aggregation.rx_accepted_value;
        if payload.proposal > best {
            best = payload.proposal;
            best_value = payload.value;
        }
        if self.acceptor.accepted_proposal > best {
            best = self.acceptor.accepted_proposal;
            best_value = self.acceptor.accepted_value;
        }
        self.aggregation.rx_accepted_proposal = best;
        self.aggregation.rx_accepted_value = best_value;

        if tx.proposal < best {
            tx.proposal = best;
            tx.value = best_value;
            self.tx_flag = true;
            self.rx_delta = true;
        }
    }

    fn run_acceptor_accept(&mut self, payload: &Packet, tx: &mut Packet) {
        if payload.ballot >= self.acceptor.min_proposal {
            self.acceptor.min_proposal = payload.ballot;
            self.acceptor.accepted_proposal = payload.ballot;
            self.acceptor.accepted_value = payload.value;
        }

        let mut best = self.aggregation.rx_min_proposal;
        if self.acceptor.min_proposal > best {
            best = self.acceptor.min_proposal;
        }
        if payload.proposal > best {
            best = payload.proposal;
        }
        self.aggregation.rx_min_proposal = best;
        if tx.proposal != best {
            tx.proposal = best;
            self.tx_flag = true;
            self.rx_delta = true;
        }

        if self.acceptor.accepted_proposal > self.aggregation.rx_accepted_proposal {
            self.aggregation.rx_accepted_proposal = self.acceptor.accepted_proposal;
            self.aggregation.rx_accepted_value = self.acceptor.accepted_value;
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn run_proposer(
        &mut self,
        ctx: SlotContext,
        payload: &Packet,
        tx: &mut Packet,
        proposer: &mut ProposerState,
        node_index: usize,
        node_count: usize,
        n_replies: usize,
    ) {
        if proposer.loser_timeout > 0 {
            proposer.loser_timeout -= 1;
            if proposer.loser_timeout == 0 {
                self.update_phase(proposer, tx, node_index, node_count);
            }
        }

        if payload.ballot == proposer.proposed_ballot {
            match payload.phase {
                Phase::Prepare if proposer.phase == Phase::Prepare => {
                    if !self.aggregation.rx_accepted_proposal.is_none() {
                        proposer.proposed_value = self.aggregation.rx_accepted_value;
                    }
                    if n_replies * 2 > node_count
                        && self.aggregation.rx_accepted_proposal <= proposer.proposed_ballot
                    {
                        proposer.phase = Phase::Accept;
                        self.update_phase(proposer, tx, node_index, node_count);
                    }
                }
                Phase::Accept if proposer.phase == Phase::Accept => {
                    if self.aggregation.rx_min_proposal > proposer.proposed_ballot {
                        self.lose_proposal(proposer, node_index);
                    } else if n_replies * 2 > node_count {
                        proposer.got_majority = true;
                        proposer.got_majority_at_slot = ctx.slot;
                    }
                }
                _ => {}
            }
        } else if payload.ballot > proposer.proposed_ballot {
            self.lose_proposal(proposer, node_index);
        } else if payload.ballot < proposer.proposed_ballot {
            self.tx_flag = true;
            if proposer.phase == Phase::Init {
                proposer.phase = Phase::Prepare;
                self.update_phase(proposer, tx, node_index, node_count);
            }
        }
    }

    fn lose_proposal(&mut self, proposer: &mut ProposerState, node_index: usize) {
        info!(
            "node {}: lost proposal at ballot {:?}",
            node_index, proposer.proposed_ballot
        );
        proposer.proposed_ballot = proposer.proposed_ballot.next_round();
        if !self.aggregation.rx_accepted_proposal.is_none() {
            proposer.proposed_value = self.aggregation.rx_accepted_value;
        }
        proposer.phase = Phase::Prepare;
        proposer.got_majority = false;
        proposer.loser_timeout = (ROUND_MAX_SLOTS - 1).min(u8::MAX as u16) as u8;
    }

    fn update_phase(
        &mut self,
        proposer: &mut ProposerState,
        tx: &mut Packet,
        node_index: usize,
        node_count: usize,
    ) {
        tx.ballot = proposer.proposed_ballot;
        tx.phase = proposer.phase;
        tx.proposal = Ballot::NONE;
        tx.value = proposer.proposed_value;
        tx.flags = FlagSet::only_self(node_index, node_count);
        self.aggregation = Default::default();
        self.tx_flag = true;
    }

    fn decide_radio_state(&mut self, ctx: SlotContext, rng: &mut dyn RngCore) -> RadioState {
        if ctx.current_state == RadioState::Init && self.config.is_initiator() {
            self.got_valid_rx = true;
            return RadioState::Tx;
        }

        if self.complete && self.tx_count_complete > N_TX_COMPLETE {
            return RadioState::Off;
        }

        if ctx.last_success && self.tx_flag {
            if self.complete {
                if self.rx_delta {
                    self.tx_count_complete = 0;
                } else {
                    self.tx_count_complete = self.tx_count_complete.saturating_add(1);
                }
            }
            return RadioState::Tx;
        }

        if !ctx.last_success && ctx.current_state == RadioState::Rx && self.got_valid_rx {
            self.invalid_rx_count = self.invalid_rx_count.saturating_add(1);
            if self.invalid_rx_count > self.restart_threshold {
                self.restart_threshold = RESTART_MIN + rng.gen_range(0..(RESTART_MAX - RESTART_MIN));
                self.invalid_rx_count = 0;
                return RadioState::Tx;
            }
            return RadioState::Rx;
        }

        if !ctx.last_success && ctx.current_state == RadioState::Tx {
            return RadioState::Tx;
        }

        RadioState::Rx
    }
}

//! # Summary
//!
//! The per-slot state update for Multi-Paxos: the same skeleton as
//! single-decree Paxos, widened to a `K`-decree batch window and a ring-
//! buffered acceptor/learner log, plus leader failure detection.

use log::{debug, info, trace};
use rand::RngCore;

use crate::ballot::{Ballot, Phase};
use crate::constants::N_TX_COMPLETE;
use crate::flags::FlagSet;
use crate::multipaxos::node::MultiPaxosNode;
use crate::multipaxos::packet::Packet;
use crate::multipaxos::state::{AcceptorState, LeaderState};
use crate::scheduler::{RadioState, SlotContext};
use crate::value::NO_OP;

impl<const K: usize, const L: usize> MultiPaxosNode<K, L> {
    pub(crate) fn process_slot(
        &mut self,
        ctx: SlotContext,
        rx_bytes: &[u8],
        tx_buf: &mut [u8],
        rng: &mut dyn RngCore,
    ) -> RadioState {
        let node_count = self.config.node_count();
        let node_index = self.config.node_index();

        let mut tx =
            Packet::<K>::decode(tx_buf, node_count).expect("tx buffer sized by round driver");
        self.rx_delta = false;

        let rx_valid = ctx.last_success
            && (ctx.current_state == RadioState::Rx
                || (ctx.current_state == RadioState::Tx && self.leader.is_some()));

        if rx_valid {
            match Packet::<K>::decode(rx_bytes, node_count) {
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

    #[allow(clippy::too_many_arguments)]
    fn handle_payload(
        &mut self,
        ctx: SlotContext,
        payload: &Packet<K>,
        tx: &mut Packet<K>,
        node_index: usize,
        node_count: usize,
        rng: &mut dyn RngCore,
    ) {
        if payload.phase == Phase::Init {
            if !self.seen_init_this_round {
                self.seen_init_this_round = true;
                self.handle_init_heartbeat(payload, tx, node_index, node_count);
            }
            return;
        }

        let newer = payload.ballot > tx.ballot
            || (payload.ballot == tx.ballot && payload.round > tx.round)
            || (payload.ballot == tx.ballot
                && payload.round == tx.round
                && payload.phase >= tx.phase);
        if !newer {
            self.tx_flag = true;
            return;
        }
        self.not_heard_from_leader_since = 0;

        let new_phase =
            payload.ballot != tx.ballot || payload.round != tx.round || payload.phase != tx.phase;
        if new_phase {
            debug!(
                "node {}: new multipaxos phase {:?}/{:?} at decree {}",
                node_index, payload.ballot, payload.phase, payload.round
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
            && payload.ballot == payload.proposals[0]
            && payload.flags.has_majority()
        {
            for i in 0..K {
                self.learner.learn(payload.round.wrapping_add(i as u16), payload.values[i]);
            }
        }

        if !new_phase {
            let flags_changed = tx.flags.merge(&payload.flags);
            self.rx_delta = self.rx_delta || flags_changed;
        }
        tx.flags.set(node_index);
        let n_replies = tx.flags.popcount();

        if self.leader.is_none()
            && payload.phase == Phase::Prepare
            && n_replies * 2 > node_count
            && self.tx_flag
        {
            use rand::Rng;
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

        if let Some(mut leader) = self.leader.take() {
            let keep = self.run_leader(ctx, payload, tx, &mut leader, node_index, node_count, n_replies);
            if keep {
                self.leader = Some(leader);
            } else {
                info!("node {}: stepped down as leader", node_index);
            }
        }
    }

    fn handle_init_heartbeat(
        &mut self,
        payload: &Packet<K>,
        tx: &mut Packet<K>,
        node_index: usize,
        node_count: usize,
    ) {
        if let Some(leader) = &mut self.leader {
            tx.ballot = leader.proposed_ballot;
            tx.phase = Phase::Prepare;
            tx.round = leader.base_decree;
            tx.max_heard_round = 0;
            tx.proposals = [Ballot::NONE; K];
            if leader.got_majority {
                tx.values = leader.proposed_values;
            }
            tx.flags = FlagSet::only_self(node_index, node_count);
            self.acceptor.min_proposal = leader.proposed_ballot;
            leader.got_majority = false;
            leader.phase = Phase::Prepare;
            self.aggregation = Default::default();
            self.tx_flag = true;
            info!(
                "node {}: bootstrapping multipaxos prepare at decree {}",
                node_index, tx.round
            );
            return;
        }
        let before = tx.flags.clone();
        *tx = payload.clone();
        tx.flags.merge(&before);
        tx.flags.set(node_index);
        self.tx_flag = tx.flags != before;
    }

    fn run_acceptor_prepare(&mut self, payload: &Packet<K>, tx: &mut Packet<K>) {
        if payload.ballot > self.acceptor.min_proposal {
            self.acceptor.min_proposal = payload.ballot;
        }
        self.aggregation.rx_max_heard_round = self
            .aggregation
            .rx_max_heard_round
            .max(self.acceptor.last_round_participation)
            .max(payload.max_heard_round);

        for i in 0..K {
            let decree = payload.round.wrapping_add(i as u16);
            let mut best = self.aggregation.rx_accepted_proposals[i];
            let mut best_value = self.aggregation.rx_accepted_values[i];

            if decree <= self.acceptor.last_round_participation {
                let slot = AcceptorState::<L>::slot_of(decree);
                if self.acceptor.accepted_proposals[slot] > best {
                    best = self.acceptor.accepted_proposals[slot];
                    best_value = self.acceptor.accepted_values[slot];
                }
            }
            if payload.proposals[i] > best {
                best = payload.proposals[i];
                best_value = payload.values[i];
            }
            self.aggregation.rx_accepted_proposals[i] = best;
            self.aggregation.rx_accepted_values[i] = best_value;

            if tx.proposals[i] < best {
                tx.proposals[i] = best;
                tx.values[i] = best_value;
                self.tx_flag = true;
                self.rx_delta = true;
            }
        }
        if tx.max_heard_round < self.aggregation.rx_max_heard_round {
            tx.max_heard_round = self.aggregation.rx_max_heard_round;
            self.tx_flag = true;
        }
    }

    fn run_acceptor_accept(&mut self, payload: &Packet<K>, tx: &mut Packet<K>) {
        if payload.ballot >= self.acceptor.min_proposal {
            self.acceptor.min_proposal = payload.ballot;

            let start = self.acceptor.last_round_participation.saturating_add(1);
            if payload.round > start {
                for decree in start..payload.round {
                    let slot = AcceptorState::<L>::slot_of(decree);
                    self.acceptor.accepted_proposals[slot] = Ballot::NONE;
                    self.acceptor.accepted_values[slot] = 0;
                }
            }
            for i in 0..K {
                let decree = payload.round.wrapping_add(i as u16);
                let slot = AcceptorState::<L>::slot_of(decree);
                self.acceptor.accepted_proposals[slot] = self.acceptor.min_proposal;
                self.acceptor.accepted_values[slot] = payload.values[i];
            }
            self.acceptor.last_round_participation = self
                .acceptor
                .last_round_participation
                .max(payload.round.wrapping_add(K as u16 - 1));
        }

        let best = self
            .aggregation
            .rx_min_proposal
            .max(self.acceptor.min_proposal)
            .max(payload.proposals[0]);
        self.aggregation.rx_min_proposal = best;
        if tx.proposals[0] != best {
            tx.proposals[0] = best;
            self.tx_flag = true;
            self.rx_delta = true;
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn run_leader(
        &mut self,
        ctx: SlotContext,
        payload: &Packet<K>,
        tx: &mut Packet<K>,
        leader: &mut LeaderState<K>,
        node_index: usize,
        node_count: usize,
        n_replies: usize,
    ) -> bool {
        if payload.ballot > leader.proposed_ballot {
            return false;
        }
        if payload.ballot != leader.proposed_ballot || payload.round != leader.base_decree {
            return true;
        }

        match payload.phase {
            Phase::Prepare if leader.phase == Phase::Prepare => {
                if n_replies * 2 > node_count {
                    let mut lost = false;
                    let mut seen_value = false;
                    for i in (0..K).rev() {
                        if self.aggregation.rx_accepted_proposals[i] > leader.proposed_ballot {
                            lost = true;
                        }
                        if !self.aggregation.rx_accepted_proposals[i].is_none() {
                            leader.proposed_values[i] = self.aggregation.rx_accepted_values[i];
                            seen_value = true;
                        } else if seen_value {
                            leader.proposed_values[i] = NO_OP;
                        }
                    }
                    if lost {
                        return false;
                    }
                    if self.aggregation.rx_max_heard_round
                        > leader.base_decree.wrapping_add(K as u16 - 1)
                    {
                        leader.do_another_phase_1 = true;
                    }
                    leader.phase = Phase::Accept;
                    self.seed_leader_tx(leader, tx, node_index, node_count);
                }
            }
            Phase::Accept if leader.phase == Phase::Accept => {
                if self.aggregation.rx_min_proposal > leader.proposed_ballot {
                    return false;
                }
                if n_replies * 2 > node_count {
                    leader.got_majority = true;
                    leader.got_majority_at_slot = ctx.slot;
                    leader.base_decree = leader.base_decree.wrapping_add(K as u16);
                    self.current_base_decree = leader.base_decree;
                    if leader.do_another_phase_1 {
                        leader.do_another_phase_1 = false;
                        leader.phase = Phase::Prepare;
                    }
                    self.seed_leader_tx(leader, tx, node_index, node_count);
                }
            }
            _ => {}
        }
        true
    }

    fn seed_leader_tx(
        &mut self,
        leader: &LeaderState<K>,
        tx: &mut Packet<K>,
        node_index: usize,
        node_count: usize,
    ) {
        tx.ballot = leader.proposed_ballot;
        tx.phase = leader.phase;
        tx.round = leader.base_decree;
        tx.max_heard_round = 0;
        tx.values = leader.proposed_values;
        let mut proposals = [Ballot::NONE; K];
        if leader.phase == Phase::Accept {
            proposals[0] = leader.proposed_ballot;
        }
        tx.proposals = proposals;
        tx.flags = FlagSet::only_self(node_index, node_count);
        self.aggregation = Default::default();
        self.tx_flag = true;
    }

    fn decide_radio_state(&mut self, ctx: SlotContext, rng: &mut dyn RngCore) -> RadioState {
        use rand::Rng;
        use crate::constants::{RESTART_MAX, RESTART_MIN};

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

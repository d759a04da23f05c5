//! # Summary
//!
//! The round driver: the only place that talks to the scheduler. It seeds
//! slot-local state, hands the per-slot closure to the scheduler, and
//! extracts the outcome once the scheduler returns.

use rand::{Rng, RngCore};

use crate::constants::{RESTART_MAX, RESTART_MIN};
use crate::constants::ROUND_MAX_SLOTS;
use crate::paxos::node::PaxosNode;
use crate::paxos::packet::Packet;
use crate::paxos::state::ProposerState;
use crate::scheduler::{FailureInjector, NoFailureInjection, Scheduler, SlotContext};
use crate::value::Value;

impl PaxosNode {
    /// Runs one Wireless Paxos instance to completion (or exhaustion of the
    /// round's slot budget). Returns `true` iff a value was chosen, in
    /// which case `value` is overwritten with the agreed value.
    pub fn round_begin(
        &mut self,
        round: u16,
        is_proposer: bool,
        value: &mut Value,
        scheduler: &mut dyn Scheduler,
        rng: &mut dyn RngCore,
    ) -> bool {
        self.round_begin_with_failures(round, is_proposer, value, scheduler, rng, &mut NoFailureInjection)
    }

    /// As [`PaxosNode::round_begin`], but lets a test harness probabilistically
    /// knock the node off the air to model crashes.
    pub fn round_begin_with_failures(
        &mut self,
        round: u16,
        is_proposer: bool,
        value: &mut Value,
        scheduler: &mut dyn Scheduler,
        rng: &mut dyn RngCore,
        injector: &mut dyn FailureInjector,
    ) -> bool {
        self.tx_flag = false;
        self.got_valid_rx = false;
        self.complete = false;
        self.completion_slot = 0;
        self.off_slot = 0;
        self.tx_count_complete = 0;
        self.invalid_rx_count = 0;
        self.value_chosen_this_round = false;
        self.restart_threshold = RESTART_MIN + rng.gen_range(0..(RESTART_MAX - RESTART_MIN));

        self.proposer = if is_proposer {
            Some(ProposerState::new(self.config.node_index(), *value))
        } else {
            None
        };

        let node_count = self.config.node_count();
        let template = Packet::init_template(self.config.node_index(), node_count);
        let mut initial = vec![0u8; Packet::wire_len(node_count)];
        template.encode(&mut initial);

        let node = &mut *self;
        scheduler.run_round(round, &initial, ROUND_MAX_SLOTS, &mut |ctx: SlotContext, rx, tx| {
            let next = node.process_slot(ctx, rx, tx, &mut *rng);
            if next != crate::scheduler::RadioState::Off && injector.should_force_off(ctx, &mut *rng) {
                return crate::scheduler::RadioState::Off;
            }
            next
        });

        if self.value_chosen_this_round {
            if let Some(learned) = self.learner.learned_value {
                *value = learned;
            }
        }
        self.value_chosen_this_round
    }
}

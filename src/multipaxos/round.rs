//! # Summary
//!
//! The Multi-Paxos round driver. Unlike single-decree Paxos, the acceptor
//! and learner logs persist across rounds, leader state is sticky rather
//! than re-armed, and leader election runs once per round rather than
//! being caller-supplied per instance.

use rand::{Rng, RngCore};

use crate::constants::{BECOME_LEADER_AFTER, RESTART_MAX, RESTART_MIN, ROUND_MAX_SLOTS};
use crate::multipaxos::node::{DefaultLeaderElection, LeaderElection, MultiPaxosNode};
use crate::multipaxos::packet::Packet;
use crate::scheduler::{FailureInjector, NoFailureInjection, RadioState, Scheduler, SlotContext};
use crate::value::Value;

impl<const K: usize, const L: usize> MultiPaxosNode<K, L> {
    /// Runs one batch of Multi-Paxos. `proposed` is only adopted as the
    /// next batch's values if this node is already leading with a majority
    /// (an in-flight Prepare/Accept cycle is never clobbered); otherwise it
    /// seeds a brand-new leader bid when `is_leader` is set. `learned[i]`
    /// is filled with decree `base+i`'s value if it was chosen this round.
    /// Returns `true` iff any decree in the window was chosen.
    pub fn round_begin(
        &mut self,
        round: u16,
        is_leader: bool,
        proposed: [Value; K],
        learned: &mut [Option<Value>; K],
        scheduler: &mut dyn Scheduler,
        rng: &mut dyn RngCore,
    ) -> bool {
        self.round_begin_with_hooks(
            round,
            is_leader,
            proposed,
            learned,
            scheduler,
            rng,
            &mut NoFailureInjection,
            &mut DefaultLeaderElection,
        )
    }

    /// As [`MultiPaxosNode::round_begin`], but with injectable failure and
    /// leader-election hooks for test harnesses.
    #[allow(clippy::too_many_arguments)]
    pub fn round_begin_with_hooks(
        &mut self,
        round: u16,
        is_leader: bool,
        proposed: [Value; K],
        learned: &mut [Option<Value>; K],
        scheduler: &mut dyn Scheduler,
        rng: &mut dyn RngCore,
        injector: &mut dyn FailureInjector,
        election: &mut dyn LeaderElection,
    ) -> bool {
        self.reset_slot_state();
        self.rx_delta = false;
        self.seen_init_this_round = false;
        self.restart_threshold = RESTART_MIN + rng.gen_range(0..(RESTART_MAX - RESTART_MIN));
        self.not_heard_from_leader_since = self.not_heard_from_leader_since.saturating_add(1);

        if is_leader {
            if let Some(leader) = &mut self.leader {
                if leader.got_majority {
                    leader.proposed_values = proposed;
                }
            } else {
                self.become_leader(proposed);
            }
        } else if self.leader.is_none()
            && self.not_heard_from_leader_since > BECOME_LEADER_AFTER
            && election.should_become_leader(self.config.node_count(), rng)
        {
            self.become_leader(proposed);
        }

        let node_count = self.config.node_count();
        let round_base = self.current_base_decree;
        let template = Packet::<K>::init_template(self.config.node_index(), node_count);
        let mut initial = vec![0u8; Packet::<K>::wire_len(node_count)];
        template.encode(&mut initial);

        let node = &mut *self;
        scheduler.run_round(round, &initial, ROUND_MAX_SLOTS, &mut |ctx: SlotContext, rx, tx| {
            let next = node.process_slot(ctx, rx, tx, &mut *rng);
            if next != RadioState::Off && injector.should_force_off(ctx, &mut *rng) {
                return RadioState::Off;
            }
            next
        });

        let mut any_chosen = false;
        for i in 0..K {
            let value = self.learner.learned(round_base.wrapping_add(i as u16));
            learned[i] = value;
            any_chosen = any_chosen || value.is_some();
        }
        any_chosen
    }
}

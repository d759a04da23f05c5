//! # Summary
//!
//! Wireless Multi-Paxos: a leader batches `K` consecutive log decrees per
//! packet into a ring-buffered log of `L` slots, with leader failure
//! detection so a surviving acceptor can take over when the leader goes
//! silent.

mod node;
mod packet;
mod round;
mod slot;
mod state;

pub use node::{DefaultLeaderElection, LeaderElection, MultiPaxosNode};
pub use packet::Packet;
pub use state::{AcceptorState, Aggregation, LeaderState, LearnerState};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ballot::{Ballot, Phase};
    use crate::config::NodeConfig;
    use crate::flags::FlagSet;
    use crate::scheduler::{RadioState, Scheduler, SlotContext};
    use crate::value::NO_OP;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    struct NullScheduler;
    impl Scheduler for NullScheduler {
        fn run_round(
            &mut self,
            _round_number: u16,
            _initial_tx_payload: &[u8],
            _max_slots: u16,
            _process: &mut dyn FnMut(SlotContext, &[u8], &mut [u8]) -> RadioState,
        ) {
        }
    }

    #[test]
    fn round_with_no_slots_learns_nothing() {
        let config = NodeConfig::new(0, 5, true).unwrap();
        let mut node: MultiPaxosNode<2, 8> = MultiPaxosNode::new(config).unwrap();
        let mut learned = [None; 2];
        let chosen = node.round_begin(1, true, [1, 2], &mut learned, &mut NullScheduler, &mut StdRng::seed_from_u64(1));
        assert!(!chosen);
        assert_eq!(learned, [None, None]);
    }

    /// Scenario 4 (NO_OP fill): leader runs PREPARE for window `[4,5]`
    /// (K=2). An acceptor reports an accepted value only for decree 5;
    /// decree 4 must be filled with NO_OP once majority is reached.
    #[test]
    fn prepare_completion_fills_gap_with_no_op() {
        let node_count = 5;
        let config = NodeConfig::new(1, node_count, false).unwrap();
        let mut node: MultiPaxosNode<2, 8> = MultiPaxosNode::new(config).unwrap();
        node.leader = Some(LeaderState::new(1, 1, 4, [0, 0]));
        node.leader.as_mut().unwrap().phase = Phase::Prepare;

        let mut tx_flags = FlagSet::empty(node_count);
        tx_flags.set(1);
        tx_flags.set(2);
        let mut tx_buf = vec![0u8; Packet::<2>::wire_len(node_count)];
        Packet::<2> {
            ballot: Ballot::new(1, 1),
            phase: Phase::Prepare,
            round: 4,
            max_heard_round: 0,
            values: [0, 0],
            proposals: [Ballot::NONE; 2],
            flags: tx_flags,
        }
        .encode(&mut tx_buf);

        node.aggregation.rx_accepted_proposals = [Ballot::NONE, Ballot::new(1, 0)];
        node.aggregation.rx_accepted_values = [0, 77];

        let payload = Packet::<2> {
            ballot: Ballot::new(1, 1),
            phase: Phase::Prepare,
            round: 4,
            max_heard_round: 0,
            values: [0, 0],
            proposals: [Ballot::NONE, Ballot::NONE],
            flags: FlagSet::only_self(3, node_count),
        };
        let mut rx_buf = vec![0u8; Packet::<2>::wire_len(node_count)];
        payload.encode(&mut rx_buf);

        let ctx = SlotContext {
            round: 1,
            slot: 1,
            current_state: RadioState::Rx,
            last_success: true,
        };
        node.process_slot(ctx, &rx_buf, &mut tx_buf, &mut StdRng::seed_from_u64(2));

        let leader = node.leader.unwrap();
        assert_eq!(leader.proposed_values, [NO_OP, 77]);
        assert_eq!(leader.phase, Phase::Accept);
    }

    /// Scenario 6 (leader takeover): after `BECOME_LEADER_AFTER` rounds
    /// with no heard ballot, a deterministic election hook nominates this
    /// node, which seeds leader state starting after the last learned
    /// decree.
    #[test]
    fn leader_election_fires_after_silence_threshold() {
        struct AlwaysElect;
        impl LeaderElection for AlwaysElect {
            fn should_become_leader(&mut self, _node_count: usize, _rng: &mut dyn rand::RngCore) -> bool {
                true
            }
        }

        let config = NodeConfig::new(2, 5, false).unwrap();
        let mut node: MultiPaxosNode<2, 8> = MultiPaxosNode::new(config).unwrap();
        node.learner.learn(3, 9);
        node.not_heard_from_leader_since = 10;

        let mut learned = [None; 2];
        node.round_begin_with_hooks(
            1,
            false,
            [0, 0],
            &mut learned,
            &mut NullScheduler,
            &mut StdRng::seed_from_u64(3),
            &mut crate::scheduler::NoFailureInjection,
            &mut AlwaysElect,
        );

        let leader = node.leader.expect("should have self-nominated");
        assert_eq!(leader.base_decree, 4);
        assert_eq!(node.not_heard_from_leader_since, 0);
    }
}

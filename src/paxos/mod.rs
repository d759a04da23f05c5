//! # Summary
//!
//! Single-decree Wireless Paxos: one proposer (if any) driving one
//! instance to either a chosen value or an inconclusive round.

mod node;
mod packet;
mod round;
mod slot;
mod state;

pub use node::PaxosNode;
pub use packet::Packet;
pub use state::{AcceptorState, Aggregation, LearnerState, ProposerState};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ballot::{Ballot, Phase};
    use crate::config::NodeConfig;
    use crate::flags::FlagSet;
    use crate::scheduler::{RadioState, Scheduler, SlotContext};
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
    fn round_with_no_slots_is_inconclusive() {
        let config = NodeConfig::new(0, 5, true).unwrap();
        let mut node = PaxosNode::new(config);
        let mut value = 7u8;
        let mut rng = StdRng::seed_from_u64(1);
        let chosen = node.round_begin(1, true, &mut value, &mut NullScheduler, &mut rng);
        assert!(!chosen);
        assert_eq!(value, 7);
    }

    /// Scenario 3 (value adoption), acceptor half: an acceptor that
    /// previously accepted `(1,5)/9` must report that back to a proposer
    /// running PREPARE at a higher ballot, not its own current (empty) TX.
    #[test]
    fn acceptor_reports_previously_accepted_value_in_prepare() {
        let node_count = 5;
        let config = NodeConfig::new(3, node_count, false).unwrap();
        let mut acceptor = PaxosNode::new(config);
        acceptor.acceptor.accepted_proposal = Ballot::new(1, 5);
        acceptor.acceptor.accepted_value = 9;

        let payload = Packet {
            ballot: Ballot::new(2, 1),
            phase: Phase::Prepare,
            value: 0,
            proposal: Ballot::NONE,
            flags: FlagSet::only_self(1, node_count),
        };
        let mut rx_buf = vec![0u8; Packet::wire_len(node_count)];
        payload.encode(&mut rx_buf);
        let mut tx_buf = vec![0u8; Packet::wire_len(node_count)];
        let mut rng = StdRng::seed_from_u64(2);

        let ctx = SlotContext {
            round: 1,
            slot: 1,
            current_state: RadioState::Rx,
            last_success: true,
        };
        acceptor.process_slot(ctx, &rx_buf, &mut tx_buf, &mut rng);

        let tx = Packet::decode(&tx_buf, node_count).unwrap();
        assert_eq!(tx.proposal, Ballot::new(1, 5));
        assert_eq!(tx.value, 9);
        assert_eq!(acceptor.acceptor.min_proposal, Ballot::new(2, 1));
    }

    /// Scenario 2 (contention): a proposer loses to a higher ballot from
    /// another proposer in the same competition round and re-enters PREPARE
    /// with a bumped round counter.
    #[test]
    fn proposer_loses_to_higher_ballot_and_rearms() {
        let node_count = 5;
        let config = NodeConfig::new(1, node_count, false).unwrap();
        let mut node = PaxosNode::new(config);
        node.proposer = Some(ProposerState::new(1, 42));
        node.proposer.as_mut().unwrap().phase = Phase::Prepare;

        let mut tx_buf = vec![0u8; Packet::wire_len(node_count)];
        Packet {
            ballot: Ballot::new(1, 1),
            phase: Phase::Prepare,
            value: 42,
            proposal: Ballot::NONE,
            flags: FlagSet::only_self(1, node_count),
        }
        .encode(&mut tx_buf);

        let payload = Packet {
            ballot: Ballot::new(1, 2),
            phase: Phase::Prepare,
            value: 0,
            proposal: Ballot::NONE,
            flags: FlagSet::only_self(2, node_count),
        };
        let mut rx_buf = vec![0u8; Packet::wire_len(node_count)];
        payload.encode(&mut rx_buf);
        let mut rng = StdRng::seed_from_u64(3);

        let ctx = SlotContext {
            round: 1,
            slot: 2,
            current_state: RadioState::Rx,
            last_success: true,
        };
        node.process_slot(ctx, &rx_buf, &mut tx_buf, &mut rng);

        let proposer = node.proposer.unwrap();
        assert_eq!(proposer.proposed_ballot, Ballot::new(2, 1));
        assert!(!proposer.got_majority);
        assert_eq!(proposer.phase, Phase::Prepare);
    }

    #[test]
    fn reset_state_clears_acceptor_and_learner() {
        let config = NodeConfig::new(0, 5, true).unwrap();
        let mut node = PaxosNode::new(config);
        node.acceptor.min_proposal = Ballot::new(3, 0);
        node.learner.learned_value = Some(9);
        node.reset_state();
        assert!(node.acceptor.min_proposal.is_none());
        assert_eq!(node.learned_value(), None);
    }
}

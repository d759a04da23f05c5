//! Integration test exercising the public `round_begin` API end to end
//! through the `Scheduler` trait, rather than calling crate-private
//! per-slot helpers directly.

use rand::rngs::StdRng;
use rand::SeedableRng;
use wireless_paxos::{NodeConfig, PaxosNode, RadioState, Scheduler, SlotContext};

/// A degenerate one-node "flood": whatever this node transmits becomes
/// what it receives next slot. For a single-node network this is exactly
/// what a real flood would deliver, since there is no one else to
/// overwrite the shared packet.
struct SelfEcho;

impl Scheduler for SelfEcho {
    fn run_round(
        &mut self,
        round_number: u16,
        initial_tx_payload: &[u8],
        max_slots: u16,
        process: &mut dyn FnMut(SlotContext, &[u8], &mut [u8]) -> RadioState,
    ) {
        let mut tx = initial_tx_payload.to_vec();
        let mut state = RadioState::Init;
        for slot in 1..=max_slots {
            let ctx = SlotContext {
                round: round_number,
                slot,
                current_state: state,
                last_success: true,
            };
            let rx = tx.clone();
            state = process(ctx, &rx, &mut tx);
            if state == RadioState::Off {
                break;
            }
        }
    }
}

#[test]
fn lone_proposer_reaches_consensus_with_itself() {
    let _ = env_logger::builder().is_test(true).try_init();

    let config = NodeConfig::new(0, 1, true).unwrap();
    let mut node = PaxosNode::new(config);
    let mut value = 9u8;
    let mut rng = StdRng::seed_from_u64(7);

    let chosen = node.round_begin(1, true, &mut value, &mut SelfEcho, &mut rng);

    assert!(chosen);
    assert_eq!(value, 9);
    assert_eq!(node.learned_value(), Some(9));
    assert!(node.proposer_got_network_wide_consensus());
}

/// A one-node network starting with an acceptor-only (non-proposing) node
/// never hears a proposal and should end the round inconclusive.
#[test]
fn lone_acceptor_without_proposer_is_inconclusive() {
    let _ = env_logger::builder().is_test(true).try_init();

    let config = NodeConfig::new(0, 1, false).unwrap();
    let mut node = PaxosNode::new(config);
    let mut value = 0u8;
    let mut rng = StdRng::seed_from_u64(11);

    let chosen = node.round_begin(1, false, &mut value, &mut SelfEcho, &mut rng);

    assert!(!chosen);
    assert_eq!(node.learned_value(), None);
}

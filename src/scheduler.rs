//! # Summary
//!
//! Models the Synchrotron flooding primitive and the node environment it
//! runs on as trait boundaries this crate only ever consumes. Nothing here
//! is allowed to know about radios, timers, or threads — that is exactly
//! the machinery the per-slot core is scoped to stay out of.

use rand::RngCore;

/// Radio state a node is in, or is being told to enter next.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum RadioState {
    /// Round has just begun; no transmission has happened yet.
    Init,
    Rx,
    Tx,
    Off,
}

/// Everything the per-slot update needs to know about the slot it is being
/// invoked for, besides the payload buffers themselves.
#[derive(Copy, Clone, Debug)]
pub struct SlotContext {
    pub round: u16,
    pub slot: u16,
    pub current_state: RadioState,
    pub last_success: bool,
}

/// The slotted flooding scheduler, consumed as a black box.
///
/// A production implementation drives the radio and timers; test code can
/// implement this over an in-memory simulation of several [`PaxosNode`]s
/// (or `MultiPaxosNode`s) exchanging the same buffer every slot.
///
/// [`PaxosNode`]: crate::paxos::PaxosNode
pub trait Scheduler {
    /// Runs up to `max_slots` invocations of `process`, stopping early if it
    /// returns [`RadioState::Off`]. `process` receives the slot context, the
    /// bytes the radio delivered this slot (meaningless unless
    /// `last_success` is set), and the transmit buffer to fill for next
    /// slot; it must not block or suspend.
    fn run_round(
        &mut self,
        round_number: u16,
        initial_tx_payload: &[u8],
        max_slots: u16,
        process: &mut dyn FnMut(SlotContext, &[u8], &mut [u8]) -> RadioState,
    );
}

/// Probabilistically forces a node off the air to model crashes during
/// evaluation. Disabled by default.
pub trait FailureInjector {
    fn should_force_off(&mut self, ctx: SlotContext, rng: &mut dyn RngCore) -> bool;
}

/// Never forces a node off; the default for production use.
#[derive(Copy, Clone, Debug, Default)]
pub struct NoFailureInjection;

impl FailureInjector for NoFailureInjection {
    fn should_force_off(&mut self, _ctx: SlotContext, _rng: &mut dyn RngCore) -> bool {
        false
    }
}

//! Per-slot Paxos and Multi-Paxos state machines for synchronous slotted
//! flooding wireless networks (Wireless Paxos / Wireless Multi-Paxos).
//!
//! The core of this crate is a pair of state-update functions, one per
//! protocol, each invoked once per radio slot by a [`scheduler::Scheduler`]
//! implementation. Neither ever blocks, suspends, or owns a thread; both
//! operate purely on caller-supplied byte buffers and an owned node struct.
//!
//! - [`paxos::PaxosNode`] runs single-decree Wireless Paxos.
//! - [`multipaxos::MultiPaxosNode`] runs Wireless Multi-Paxos, a batched,
//!   log-structured extension with leader failure detection.

#[macro_use]
extern crate log;

pub mod ballot;
pub mod config;
pub mod constants;
pub mod error;
pub mod flags;
pub mod multipaxos;
pub mod paxos;
pub mod scheduler;
pub mod value;

pub use config::NodeConfig;
pub use error::ConfigError;
pub use multipaxos::MultiPaxosNode;
pub use paxos::PaxosNode;
pub use scheduler::{FailureInjector, RadioState, Scheduler, SlotContext};

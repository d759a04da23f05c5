//! # Summary
//!
//! The value being agreed on is an opaque byte as far as this crate is
//! concerned; applications interpret it however they like.

/// The datum Paxos agrees on.
pub type Value = u8;

/// Reserved value used to fill unproposed log gaps during leader recovery.
///
/// The application must never propose this value; Multi-Paxos relies on it
/// being distinguishable from any real proposal.
pub const NO_OP: Value = 0xFF;

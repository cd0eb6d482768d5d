//! Payout collaborator boundary for finalized governance rounds.
//!
//! The governance core hands the finalized (payee, share) list to a
//! [`PayoutNotifier`] exactly once; actual fund custody and transfer live
//! behind this trait and are not part of the core.

pub mod splitter;

pub use splitter::{MemorySplitter, PayoutNotifier, ShareEntry};

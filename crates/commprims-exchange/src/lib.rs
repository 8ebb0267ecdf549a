//! Wait-free single-producer, single-consumer latest-value exchange.
//!
//! A producer publishes the latest value of some state whenever it likes and
//! a consumer samples it at its own pace. Updates may be lost; a stale read
//! never blocks progress on either side.
//!
//! - [`TripleSlotExchange`] — three flag-guarded slots, no locks, no waiting
//! - [`SharedCell`] — one atomically replaced value behind a shared handle
//!
//! Both implement [`LatestSink`] / [`LatestSource`], so callers can swap one
//! for the other.

pub mod cell;
pub mod traits;
pub mod triple;

pub use cell::SharedCell;
pub use traits::{LatestSink, LatestSource};
pub use triple::{Publisher, Sampler, SlotState, TripleSlotExchange};

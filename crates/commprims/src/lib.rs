//! Wait-free latest-value exchange and resynchronizing frame codecs.
//!
//! commprims moves the most recent state of a producer to a consumer that
//! runs at its own pace, and recovers fixed-layout frames from byte streams
//! that may start mid-frame or carry garbage.
//!
//! # Crate Structure
//!
//! - [`frame`] — Frame layout, typed payloads, validators, ping-pong resynchronizer
//! - [`exchange`] — Triple-slot exchange and shared cell behind latest-value traits
//! - [`pipeline`] — Reader/writer loops joining byte streams, packers, and exchanges

/// Re-export frame types.
pub mod frame {
    pub use commprims_frame::*;
}

/// Re-export exchange types.
pub mod exchange {
    pub use commprims_exchange::*;
}

/// Re-export pipeline types.
pub mod pipeline {
    pub use commprims_pipeline::*;
}

pub use commprims_exchange::{LatestSink, LatestSource, TripleSlotExchange};
pub use commprims_frame::{FrameLayout, FrameResynchronizer, MessageFrame};

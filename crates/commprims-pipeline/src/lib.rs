//! Glue between byte streams, frames, and latest-value slots.
//!
//! A [`ReaderTask`] fills a [`Packer`]'s window from a [`ByteSource`] and
//! publishes every packed item into a [`LatestSink`]. A [`WriterTask`] pops
//! from a [`LatestSource`], encodes through an [`Unpacker`], and writes to a
//! [`ByteSink`]. Both loop until a [`Monitor`] tells them to stop.
//!
//! [`LatestSink`]: commprims_exchange::LatestSink
//! [`LatestSource`]: commprims_exchange::LatestSource

pub mod error;
pub mod io;
pub mod monitor;
pub mod pack;
pub mod task;

pub use error::{Result, TaskError};
pub use io::{ByteSink, ByteSource};
pub use monitor::{FailurePolicy, Monitor, MonitorConfig};
pub use pack::{
    FramePacker, FrameUnpacker, LayoutPacker, LayoutUnpacker, Packer, RawFramePacker, Unpacker,
};
pub use task::{ReaderTask, TaskSummary, WriterTask};

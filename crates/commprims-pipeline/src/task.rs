//! Reader and writer loops between byte streams and latest-value slots.

use commprims_exchange::{LatestSink, LatestSource};
use tracing::{debug, trace};

use crate::error::{Result, TaskError};
use crate::io::{ByteSink, ByteSource};
use crate::monitor::Monitor;
use crate::pack::{Packer, Unpacker};

/// Counters reported when a task loop ends.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TaskSummary {
    pub iterations: u64,
    pub delivered: u64,
    /// Iterations that found nothing to move (no frame, empty source).
    pub misses: u64,
    pub failures: u64,
}

impl TaskSummary {
    fn record(&mut self, outcome: &Result<()>) {
        self.iterations += 1;
        match outcome {
            Ok(()) => self.delivered += 1,
            Err(err) if err.is_routine() => self.misses += 1,
            Err(_) => self.failures += 1,
        }
    }
}

/// Reads windows from a byte source, packs them, and publishes items.
#[derive(Debug)]
pub struct ReaderTask<S, P, K> {
    source: S,
    packer: P,
    sink: K,
}

impl<S, P, K> ReaderTask<S, P, K>
where
    S: ByteSource,
    P: Packer,
    K: LatestSink<P::Item>,
{
    pub fn new(source: S, packer: P, sink: K) -> Self {
        Self {
            source,
            packer,
            sink,
        }
    }

    /// One read, one pack attempt, and at most one published item.
    pub fn run_once(&mut self) -> Result<()> {
        self.source.read(self.packer.buffer())?;
        let item = self.packer.pack().ok_or(TaskError::NoFrame)?;
        self.sink.push(item);
        Ok(())
    }

    /// Loop [`run_once`](Self::run_once) until `monitor` says stop.
    pub fn run<M: Monitor>(&mut self, monitor: &mut M) -> TaskSummary {
        let summary = drive(monitor, || self.run_once());
        debug!(?summary, "reader task finished");
        summary
    }

    pub fn packer(&self) -> &P {
        &self.packer
    }

    pub fn sink(&self) -> &K {
        &self.sink
    }

    pub fn into_parts(self) -> (S, P, K) {
        (self.source, self.packer, self.sink)
    }
}

/// Takes the latest item from a source, unpacks it, and writes the bytes.
#[derive(Debug)]
pub struct WriterTask<S, U, W> {
    source: S,
    unpacker: U,
    sink: W,
}

impl<S, U, W> WriterTask<S, U, W>
where
    S: LatestSource<U::Item>,
    U: Unpacker,
    W: ByteSink,
{
    pub fn new(source: S, unpacker: U, sink: W) -> Self {
        Self {
            source,
            unpacker,
            sink,
        }
    }

    /// One pop, and if there was an item, one encoded write.
    pub fn run_once(&mut self) -> Result<()> {
        let item = self.source.pop().ok_or(TaskError::SourceEmpty)?;
        let bytes = self.unpacker.unpack(&item)?;
        self.sink.write(bytes)
    }

    /// Loop [`run_once`](Self::run_once) until `monitor` says stop.
    pub fn run<M: Monitor>(&mut self, monitor: &mut M) -> TaskSummary {
        let summary = drive(monitor, || self.run_once());
        debug!(?summary, "writer task finished");
        summary
    }

    pub fn sink(&self) -> &W {
        &self.sink
    }

    pub fn into_parts(self) -> (S, U, W) {
        (self.source, self.unpacker, self.sink)
    }
}

fn drive<M: Monitor>(monitor: &mut M, mut step: impl FnMut() -> Result<()>) -> TaskSummary {
    let mut summary = TaskSummary::default();
    loop {
        let outcome = step();
        trace!(ok = outcome.is_ok(), "task iteration");
        summary.record(&outcome);
        if !monitor.handle(&outcome) {
            return summary;
        }
    }
}

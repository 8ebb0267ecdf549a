use tracing::{debug, warn};

use crate::error::{Result, TaskError};

/// Decides, after every iteration, whether a task loop keeps going.
pub trait Monitor {
    fn handle(&mut self, outcome: &Result<()>) -> bool;
}

impl<F> Monitor for F
where
    F: FnMut(&Result<()>) -> bool,
{
    fn handle(&mut self, outcome: &Result<()>) -> bool {
        self(outcome)
    }
}

/// Limits for [`FailurePolicy`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonitorConfig {
    /// Stop after this many routine misses in a row. `None` never stops.
    pub max_consecutive_misses: Option<u64>,
    /// Stop on the first byte-stream failure (read, write, closed source).
    pub stop_on_io_error: bool,
    /// Stop after this many iterations in total. `None` never stops.
    pub max_iterations: Option<u64>,
    /// Stop after this many delivered items. `None` never stops.
    pub max_delivered: Option<u64>,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            max_consecutive_misses: None,
            stop_on_io_error: true,
            max_iterations: None,
            max_delivered: None,
        }
    }
}

/// Rides through routine misses and stops on stream failures or limits.
#[derive(Debug, Clone)]
pub struct FailurePolicy {
    config: MonitorConfig,
    iterations: u64,
    delivered: u64,
    consecutive_misses: u64,
}

impl Default for FailurePolicy {
    fn default() -> Self {
        Self::new(MonitorConfig::default())
    }
}

impl FailurePolicy {
    pub fn new(config: MonitorConfig) -> Self {
        Self {
            config,
            iterations: 0,
            delivered: 0,
            consecutive_misses: 0,
        }
    }

    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }

    fn decide(&mut self, outcome: &Result<()>) -> bool {
        match outcome {
            Ok(()) => {
                self.consecutive_misses = 0;
                self.delivered += 1;
                if self.config.max_delivered.is_some_and(|max| self.delivered >= max) {
                    debug!(delivered = self.delivered, "delivery limit reached");
                    return false;
                }
            }
            Err(err) if err.is_routine() => {
                self.consecutive_misses += 1;
                if self
                    .config
                    .max_consecutive_misses
                    .is_some_and(|max| self.consecutive_misses >= max)
                {
                    warn!(
                        misses = self.consecutive_misses,
                        "too many consecutive misses, stopping"
                    );
                    return false;
                }
            }
            Err(TaskError::SourceClosed) => {
                debug!("source closed, stopping");
                return false;
            }
            Err(err) if err.is_io() => {
                if self.config.stop_on_io_error {
                    warn!(error = %err, "stream failure, stopping");
                    return false;
                }
                debug!(error = %err, "stream failure ignored");
            }
            Err(err) => {
                warn!(error = %err, "iteration failed");
            }
        }
        true
    }
}

impl Monitor for FailurePolicy {
    fn handle(&mut self, outcome: &Result<()>) -> bool {
        self.iterations += 1;
        let keep_going = self.decide(outcome);
        if keep_going
            && self
                .config
                .max_iterations
                .is_some_and(|max| self.iterations >= max)
        {
            debug!(iterations = self.iterations, "iteration limit reached");
            return false;
        }
        keep_going
    }
}

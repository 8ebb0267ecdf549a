use std::sync::Arc;

use arc_swap::ArcSwapOption;

use crate::traits::{LatestSink, LatestSource};

/// A cloneable handle to one atomically replaced value.
///
/// The degenerate latest-value exchange: every clone sees the same cell,
/// `set` replaces the value, `get` samples it without consuming it and
/// `take` consumes it. No slot protocol is involved, so any number of
/// handles may read and write concurrently.
#[derive(Debug)]
pub struct SharedCell<T> {
    inner: Arc<ArcSwapOption<T>>,
}

impl<T> Clone for SharedCell<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> Default for SharedCell<T> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<T> SharedCell<T> {
    /// Create a cell holding `value`.
    pub fn new(value: T) -> Self {
        Self {
            inner: Arc::new(ArcSwapOption::from_pointee(value)),
        }
    }

    /// Create a cell holding nothing.
    pub fn empty() -> Self {
        Self {
            inner: Arc::new(ArcSwapOption::empty()),
        }
    }

    pub fn set(&self, value: T) {
        self.inner.store(Some(Arc::new(value)));
    }

    pub fn is_set(&self) -> bool {
        self.inner.load().is_some()
    }

    /// Shared snapshot of the current value.
    pub fn snapshot(&self) -> Option<Arc<T>> {
        self.inner.load_full()
    }

    /// Remove and return the current value.
    pub fn take_shared(&self) -> Option<Arc<T>> {
        self.inner.swap(None)
    }

    /// Number of handles pointing at this cell.
    pub fn handle_count(&self) -> usize {
        Arc::strong_count(&self.inner)
    }
}

impl<T: Clone> SharedCell<T> {
    /// Copy of the current value, leaving it in place.
    pub fn get(&self) -> Option<T> {
        self.inner.load().as_deref().cloned()
    }

    /// Remove the current value and return a copy of it.
    pub fn take(&self) -> Option<T> {
        self.take_shared().map(|value| (*value).clone())
    }
}

impl<T> LatestSink<T> for SharedCell<T> {
    fn push(&mut self, item: T) {
        self.set(item);
    }
}

impl<T: Clone> LatestSource<T> for SharedCell<T> {
    fn pop(&mut self) -> Option<T> {
        self.take()
    }
}

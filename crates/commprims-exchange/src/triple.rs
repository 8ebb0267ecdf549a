//! Wait-free latest-value exchange over three slots.
//!
//! Each slot carries a flag: `EMPTY`, `FULL` or `BUSY`. A side owns a slot's
//! contents only between its own `* -> BUSY` compare-and-swap and the store
//! that releases the slot, so contents never have two owners.
//!
//! - The writer claims any non-busy slot other than the last one written,
//!   writes, demotes older `FULL` slots to `EMPTY`, then publishes `FULL`.
//! - The reader claims the `FULL` slot, copies it out and marks it `EMPTY`.
//!
//! Writer and reader hold at most one slot each, so a third slot is always
//! free and neither side ever waits for the other. Because older values are
//! demoted before a newer one is published, at most one slot is `FULL` at any
//! instant and reads never go back in time.

use std::cell::UnsafeCell;
use std::mem::MaybeUninit;
use std::sync::atomic::{AtomicU8, AtomicUsize, Ordering};
use std::sync::Arc;

use crate::traits::{LatestSink, LatestSource};

const SLOT_COUNT: usize = 3;

const EMPTY: u8 = 0;
const FULL: u8 = 1;
const BUSY: u8 = 2;

/// State of one slot, as observed at a single instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotState {
    /// Free for the writer.
    Empty,
    /// Holds a complete, unread item.
    Full,
    /// Claimed by the writer or the reader.
    Busy,
}

impl SlotState {
    fn from_flag(flag: u8) -> Self {
        match flag {
            EMPTY => Self::Empty,
            FULL => Self::Full,
            _ => Self::Busy,
        }
    }
}

/// A single-writer, single-reader container for the most recent item.
///
/// `push` and `pop` are wait-free. Unread items are overwritten by newer ones;
/// a reader that polls faster than the writer sees `None`.
///
/// Calling `push` from several threads at once (or `pop` from several
/// threads at once) stays memory-safe, but the wait-free bound only holds
/// for one writer and one reader. Use [`split`](Self::split) to enforce that.
pub struct TripleSlotExchange<T> {
    slots: [UnsafeCell<MaybeUninit<T>>; SLOT_COUNT],
    flags: [AtomicU8; SLOT_COUNT],
    latest: AtomicUsize,
}

// SAFETY: slot contents are only accessed by the side holding the slot's BUSY
// claim, which is acquired and released through the slot's atomic flag.
unsafe impl<T: Send> Send for TripleSlotExchange<T> {}
// SAFETY: see above; items are moved across threads, never shared.
unsafe impl<T: Send> Sync for TripleSlotExchange<T> {}

impl<T: Copy> Default for TripleSlotExchange<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Copy> TripleSlotExchange<T> {
    /// Create an exchange with all slots empty.
    pub fn new() -> Self {
        Self {
            slots: [
                UnsafeCell::new(MaybeUninit::uninit()),
                UnsafeCell::new(MaybeUninit::uninit()),
                UnsafeCell::new(MaybeUninit::uninit()),
            ],
            flags: [
                AtomicU8::new(EMPTY),
                AtomicU8::new(EMPTY),
                AtomicU8::new(EMPTY),
            ],
            // Points at the last slot so the first push lands in slot 0.
            latest: AtomicUsize::new(SLOT_COUNT - 1),
        }
    }

    /// Publish `item`, replacing any unread item.
    pub fn push(&self, item: T) {
        let index = self.claim_for_write();

        // SAFETY: the BUSY claim on `index` gives the writer exclusive access.
        unsafe { (*self.slots[index].get()).write(item) };

        for (other, flag) in self.flags.iter().enumerate() {
            if other != index {
                // Fails harmlessly when the slot is empty or held by the reader.
                let _ = flag.compare_exchange(FULL, EMPTY, Ordering::AcqRel, Ordering::Relaxed);
            }
        }

        self.flags[index].store(FULL, Ordering::Release);
        self.latest.store(index, Ordering::Release);
    }

    /// Take the latest unread item, if any.
    pub fn pop(&self) -> Option<T> {
        let start = self.latest.load(Ordering::Acquire);
        for offset in 0..SLOT_COUNT {
            let index = (start + offset) % SLOT_COUNT;
            if self.flags[index]
                .compare_exchange(FULL, BUSY, Ordering::Acquire, Ordering::Relaxed)
                .is_err()
            {
                continue;
            }
            // SAFETY: FULL slots were initialized by `push`, and the BUSY
            // claim keeps the writer away until the slot is released below.
            let item = unsafe { (*self.slots[index].get()).assume_init() };
            self.flags[index].store(EMPTY, Ordering::Release);
            return Some(item);
        }
        None
    }

    /// [`pop`](Self::pop) into `out`, returning whether an item was taken.
    ///
    /// `out` is left untouched when nothing is available.
    pub fn pop_into(&self, out: &mut T) -> bool {
        match self.pop() {
            Some(item) => {
                *out = item;
                true
            }
            None => false,
        }
    }

    /// Snapshot of the three slot states. Racy by nature; for diagnostics.
    pub fn slot_states(&self) -> [SlotState; SLOT_COUNT] {
        [0, 1, 2].map(|i| SlotState::from_flag(self.flags[i].load(Ordering::Relaxed)))
    }

    /// Whether an unread item is available right now.
    pub fn has_unread(&self) -> bool {
        self.flags
            .iter()
            .any(|flag| flag.load(Ordering::Acquire) == FULL)
    }

    /// Split into single-writer and single-reader handles.
    pub fn split(self) -> (Publisher<T>, Sampler<T>) {
        let shared = Arc::new(self);
        (
            Publisher {
                shared: Arc::clone(&shared),
            },
            Sampler { shared },
        )
    }

    fn claim_for_write(&self) -> usize {
        let mut index = self.latest.load(Ordering::Relaxed);
        loop {
            index = (index + 1) % SLOT_COUNT;
            let flag = self.flags[index].load(Ordering::Relaxed);
            if flag == BUSY {
                continue;
            }
            // Acquire pairs with the reader's EMPTY release so its copy has
            // finished before this slot is overwritten.
            if self.flags[index]
                .compare_exchange(flag, BUSY, Ordering::Acquire, Ordering::Relaxed)
                .is_ok()
            {
                return index;
            }
        }
    }
}

impl<T> std::fmt::Debug for TripleSlotExchange<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let flags = [0, 1, 2].map(|i| SlotState::from_flag(self.flags[i].load(Ordering::Relaxed)));
        f.debug_struct("TripleSlotExchange")
            .field("flags", &flags)
            .field("latest", &self.latest.load(Ordering::Relaxed))
            .finish()
    }
}

/// Writing half of a split [`TripleSlotExchange`].
#[derive(Debug)]
pub struct Publisher<T> {
    shared: Arc<TripleSlotExchange<T>>,
}

impl<T: Copy> Publisher<T> {
    pub fn push(&mut self, item: T) {
        self.shared.push(item);
    }
}

impl<T: Copy> LatestSink<T> for Publisher<T> {
    fn push(&mut self, item: T) {
        self.shared.push(item);
    }
}

/// Reading half of a split [`TripleSlotExchange`].
#[derive(Debug)]
pub struct Sampler<T> {
    shared: Arc<TripleSlotExchange<T>>,
}

impl<T: Copy> Sampler<T> {
    pub fn pop(&mut self) -> Option<T> {
        self.shared.pop()
    }

    pub fn pop_into(&mut self, out: &mut T) -> bool {
        self.shared.pop_into(out)
    }

    pub fn has_unread(&self) -> bool {
        self.shared.has_unread()
    }
}

impl<T: Copy> LatestSource<T> for Sampler<T> {
    fn pop(&mut self) -> Option<T> {
        self.shared.pop()
    }
}

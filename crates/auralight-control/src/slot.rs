//! Single-value mailbox between a producer context and the tick.

use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

/// Last-value-wins slot.
///
/// A newer sample overwrites an unread one; each published sample is taken
/// at most once. No queueing: only the freshest control signal matters.
#[derive(Debug, Default)]
pub struct PendingSlot<T> {
    value: Mutex<Option<T>>,
    dirty: AtomicBool,
    overwritten: AtomicU64,
}

impl<T> PendingSlot<T> {
    /// Create an empty slot
    pub fn new() -> Self {
        Self {
            value: Mutex::new(None),
            dirty: AtomicBool::new(false),
            overwritten: AtomicU64::new(0),
        }
    }

    /// Store `value`, replacing any unread sample
    pub fn publish(&self, value: T) {
        let mut slot = self.value.lock();
        if slot.replace(value).is_some() {
            self.overwritten.fetch_add(1, Ordering::Relaxed);
        }
        self.dirty.store(true, Ordering::Release);
    }

    /// Take the unread sample, if any
    pub fn take(&self) -> Option<T> {
        if !self.dirty.load(Ordering::Acquire) {
            return None;
        }
        let mut slot = self.value.lock();
        self.dirty.store(false, Ordering::Release);
        slot.take()
    }

    /// True when an unread sample is waiting
    pub fn is_dirty(&self) -> bool {
        self.dirty.load(Ordering::Acquire)
    }

    /// Drop any unread sample
    pub fn clear(&self) {
        let mut slot = self.value.lock();
        slot.take();
        self.dirty.store(false, Ordering::Release);
    }

    /// Samples replaced before anyone read them
    pub fn overwritten(&self) -> u64 {
        self.overwritten.load(Ordering::Relaxed)
    }
}

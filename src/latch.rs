/*
 * A single-slot event flag.
 *
 * Producers run in interrupt-like contexts and may only `post()`. The one
 * consumer (the traffic light) calls `take()`, which reads and clears the flag
 * in a single atomic swap, so an event posted while a `take()` is in progress
 * either lands in that `take()` or in the next one, never in neither.
 *
 * Events are not counted: posting twice before a `take()` is the same as
 * posting once.
 */

use core::sync::atomic::{AtomicBool, Ordering};

#[derive(Debug)]
pub struct EventLatch {
    pending: AtomicBool,
}

impl EventLatch {
    pub const fn new() -> Self {
        EventLatch {
            pending: AtomicBool::new(false),
        }
    }

    /// Never blocks, never allocates.
    pub fn post(&self) {
        self.pending.store(true, Ordering::Release);
    }

    pub fn take(&self) -> bool {
        self.pending.swap(false, Ordering::AcqRel)
    }

    pub fn peek(&self) -> bool {
        self.pending.load(Ordering::Acquire)
    }
}

impl Default for EventLatch {
    fn default() -> Self {
        Self::new()
    }
}

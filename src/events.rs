/*
 * Everything that arrives asynchronously.
 *
 * One `Events` value exists per board, usually as a `static`. The input tasks
 * (or interrupt handlers) call the producer methods below, which only ever
 * store to atomics and post latches. All decisions are made later, by the
 * traffic light, when it takes the latches on its own tick.
 */

use core::sync::atomic::{AtomicBool, Ordering};

use crate::latch::EventLatch;

#[derive(Debug)]
pub struct Events {
    pub(crate) button: EventLatch,
    pub(crate) remote: EventLatch,
    pub(crate) spurious_edge: EventLatch,
    pub(crate) night_changed: EventLatch,
    night_requested: AtomicBool,
    remote_level: AtomicBool,
}

impl Events {
    pub const fn new() -> Self {
        Events {
            button: EventLatch::new(),
            remote: EventLatch::new(),
            spurious_edge: EventLatch::new(),
            night_changed: EventLatch::new(),
            night_requested: AtomicBool::new(false),
            remote_level: AtomicBool::new(false),
        }
    }

    pub fn button_pressed(&self) {
        self.button.post();
    }

    /*
     * Called with the logical level (true = active) of the peer's line
     * whenever the edge detector fires. A rising edge is one handshake event.
     * A falling edge just records the level. An "edge" that leaves the level
     * where it was is a glitch and only gets reported.
     */
    pub fn remote_edge(&self, level: bool) {
        let previous = self.remote_level.swap(level, Ordering::AcqRel);
        if previous == level {
            self.spurious_edge.post();
        } else if level {
            self.remote.post();
        }
    }

    pub fn set_night_mode(&self, enabled: bool) {
        self.night_requested.store(enabled, Ordering::Relaxed);
        self.night_changed.post();
    }

    pub fn toggle_night_mode(&self) {
        self.night_requested.fetch_xor(true, Ordering::Relaxed);
        self.night_changed.post();
    }

    pub fn night_mode_requested(&self) -> bool {
        self.night_requested.load(Ordering::Relaxed)
    }

    /// `Some(requested level)` if night mode was set since the last call.
    pub(crate) fn take_night_mode_change(&self) -> Option<bool> {
        if self.night_changed.take() {
            Some(self.night_requested.load(Ordering::Relaxed))
        } else {
            None
        }
    }

    /// Drop whatever is pending, e.g. when coming out of night mode.
    pub(crate) fn drain(&self) -> bool {
        let button = self.button.take();
        let remote = self.remote.take();
        let spurious = self.spurious_edge.take();
        button | remote | spurious
    }
}

impl Default for Events {
    fn default() -> Self {
        Self::new()
    }
}

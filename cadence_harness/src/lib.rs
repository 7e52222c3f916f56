// Copyright 2026 the Cadence Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Deterministic drivers and recording sinks for cadence tests and demos.
//!
//! A timeline is platform-free: it only sees a
//! [`FrameSource`](cadence_core::driver::FrameSource) and a
//! [`TimeSource`](cadence_core::driver::TimeSource). This crate provides
//! both as explicit, scriptable fakes:
//!
//! - [`ManualDriver`] — frame requests queue up until test code calls
//!   [`fire`](ManualDriver::fire), so every tick happens exactly when the
//!   test says so.
//! - [`ScriptedClock`] — a settable/advanceable millisecond clock.
//! - [`RecordingEvents`] — collects every `time` notification and counts
//!   `finished`.
//! - [`TweenRunner`](tween::TweenRunner) — a complete sample runner with
//!   cubic-bézier easing.

#![no_std]

extern crate alloc;

pub mod tween;

use alloc::collections::VecDeque;
use alloc::rc::Rc;
use alloc::vec::Vec;
use core::cell::{Cell, RefCell};
use core::fmt;

use cadence_core::driver::{FrameCallback, FrameHandle, FrameSource, TimeSource};
use cadence_core::event::TimelineEvents;
use cadence_core::runner::{Runner, SharedRunner};

/// Wraps a concrete runner for scheduling, keeping typed access to it.
///
/// The timeline only sees the [`SharedRunner`]; the concrete `Rc` lets the
/// caller keep reading and mutating the runner's own state.
#[must_use]
pub fn share<R: Runner + 'static>(runner: R) -> (Rc<RefCell<R>>, SharedRunner) {
    let concrete = Rc::new(RefCell::new(runner));
    let shared: SharedRunner = concrete.clone();
    (concrete, shared)
}

/// A frame source whose callbacks fire only when told to.
///
/// Requests queue in arrival order. [`fire`](Self::fire) pops the oldest
/// pending callback and invokes it *after* releasing the interior borrow,
/// so the tick it triggers can re-enter [`FrameSource::request`] and
/// [`FrameSource::cancel`] freely.
#[derive(Clone)]
pub struct ManualDriver {
    inner: Rc<RefCell<ManualFrames>>,
}

struct ManualFrames {
    queue: VecDeque<(u64, FrameCallback)>,
    next: u64,
}

impl FrameSource for ManualFrames {
    fn request(&mut self, callback: FrameCallback) -> FrameHandle {
        let id = self.next;
        self.next += 1;
        self.queue.push_back((id, callback));
        FrameHandle(id)
    }

    fn cancel(&mut self, handle: FrameHandle) {
        self.queue.retain(|(id, _)| *id != handle.0);
    }
}

impl ManualDriver {
    /// Creates a driver with an empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Rc::new(RefCell::new(ManualFrames {
                queue: VecDeque::new(),
                next: 0,
            })),
        }
    }

    /// The [`FrameSource`] half, for [`Timeline::new`](cadence_core::timeline::Timeline::new).
    #[must_use]
    pub fn source(&self) -> Rc<RefCell<dyn FrameSource>> {
        self.inner.clone()
    }

    /// Fires the oldest pending callback. Returns `false` if none was
    /// pending.
    pub fn fire(&self) -> bool {
        let popped = self.inner.borrow_mut().queue.pop_front();
        match popped {
            Some((_, callback)) => {
                callback();
                true
            }
            None => false,
        }
    }

    /// Fires callbacks until the queue stays empty or `limit` is reached.
    /// Returns how many fired.
    pub fn fire_all(&self, limit: usize) -> usize {
        let mut fired = 0;
        while fired < limit && self.fire() {
            fired += 1;
        }
        fired
    }

    /// Number of requests waiting to fire.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.inner.borrow().queue.len()
    }
}

impl Default for ManualDriver {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ManualDriver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ManualDriver")
            .field("pending", &self.pending())
            .finish_non_exhaustive()
    }
}

/// A settable millisecond clock packaged as a [`TimeSource`].
#[derive(Clone, Debug)]
pub struct ScriptedClock {
    now: Rc<Cell<f64>>,
}

impl ScriptedClock {
    /// Creates a clock reading 0.0.
    #[must_use]
    pub fn new() -> Self {
        Self {
            now: Rc::new(Cell::new(0.0)),
        }
    }

    /// The [`TimeSource`] half; clones observe later `set`/`advance` calls.
    #[must_use]
    pub fn source(&self) -> TimeSource {
        let now = self.now.clone();
        Rc::new(move || now.get())
    }

    /// Sets the absolute reading.
    pub fn set(&self, t: f64) {
        self.now.set(t);
    }

    /// Moves the reading forward (or backward) by `dt`.
    pub fn advance(&self, dt: f64) {
        self.now.set(self.now.get() + dt);
    }

    /// Current reading.
    #[must_use]
    pub fn now(&self) -> f64 {
        self.now.get()
    }
}

impl Default for ScriptedClock {
    fn default() -> Self {
        Self::new()
    }
}

/// A [`TimelineEvents`] listener that records everything it hears.
#[derive(Debug, Default)]
pub struct RecordingEvents {
    /// Every `time` notification, in order.
    pub times: Vec<f64>,
    /// How many `finished` notifications arrived.
    pub finished: usize,
}

impl TimelineEvents for RecordingEvents {
    fn on_time(&mut self, playhead: f64) {
        self.times.push(playhead);
    }

    fn on_finished(&mut self) {
        self.finished += 1;
    }
}

#[cfg(test)]
mod tests {
    use alloc::boxed::Box;

    use cadence_core::runner::Persist;
    use cadence_core::schedule::Placement;
    use cadence_core::timeline::Timeline;

    use crate::tween::{Ease, TweenRunner};

    use super::*;

    #[test]
    fn manual_driver_fires_in_arrival_order() {
        let driver = ManualDriver::new();
        let log = Rc::new(RefCell::new(Vec::new()));

        for tag in [1, 2, 3] {
            let log = log.clone();
            driver
                .inner
                .borrow_mut()
                .request(Box::new(move || log.borrow_mut().push(tag)));
        }
        assert_eq!(driver.pending(), 3);
        assert_eq!(driver.fire_all(usize::MAX), 3);
        assert_eq!(*log.borrow(), [1, 2, 3]);
        assert!(!driver.fire(), "queue drained");
    }

    #[test]
    fn manual_driver_cancel_removes_pending() {
        let driver = ManualDriver::new();
        let fired = Rc::new(Cell::new(false));
        let handle = {
            let fired = fired.clone();
            driver
                .inner
                .borrow_mut()
                .request(Box::new(move || fired.set(true)))
        };
        driver.inner.borrow_mut().cancel(handle);
        assert_eq!(driver.pending(), 0);
        assert!(!driver.fire());
        assert!(!fired.get());

        // Cancelling again (a fired/unknown handle) must be harmless.
        driver.inner.borrow_mut().cancel(handle);
        driver.inner.borrow_mut().cancel(FrameHandle(999));
    }

    #[test]
    fn manual_driver_supports_reentrant_requests() {
        let driver = ManualDriver::new();
        let count = Rc::new(Cell::new(0));
        {
            let inner = driver.inner.clone();
            let count = count.clone();
            driver.inner.borrow_mut().request(Box::new(move || {
                count.set(count.get() + 1);
                // A fired callback re-arming itself is the timeline's normal
                // continuation pattern.
                let count = count.clone();
                inner
                    .borrow_mut()
                    .request(Box::new(move || count.set(count.get() + 1)));
            }));
        }
        assert!(driver.fire());
        assert_eq!(driver.pending(), 1);
        assert!(driver.fire());
        assert_eq!(count.get(), 2);
    }

    #[test]
    fn scripted_clock_is_shared_with_its_source() {
        let clock = ScriptedClock::new();
        let source = clock.source();
        assert_eq!(source(), 0.0);
        clock.advance(16.5);
        assert_eq!(source(), 16.5);
        clock.set(100.0);
        assert_eq!(source(), 100.0);
        assert_eq!(clock.now(), 100.0);
    }

    #[test]
    fn tween_playthrough_end_to_end() {
        let driver = ManualDriver::new();
        let clock = ScriptedClock::new();
        let timeline = Timeline::new(driver.source(), clock.source());
        let events = Rc::new(RefCell::new(RecordingEvents::default()));
        timeline.add_listener(events.clone());

        let (concrete, runner) = share(TweenRunner::new(100.0, Ease::Linear));
        let progress = concrete.borrow().progress();
        timeline.schedule(&runner, 0.0, Placement::Last);
        timeline.play();

        // Half way.
        clock.set(50.0);
        assert!(driver.fire());
        assert_eq!(timeline.time(), 50.0);
        assert_eq!(progress.get(), 0.5);

        // Past the end: completion, then eviction one tick later.
        clock.set(100.0);
        assert!(driver.fire());
        assert_eq!(progress.get(), 1.0);
        assert_eq!(timeline.scheduled().len(), 1);

        clock.set(110.0);
        assert!(driver.fire());
        assert!(timeline.scheduled().is_empty());
        assert_eq!(events.borrow().finished, 1);
        assert!(timeline.paused());
        assert_eq!(events.borrow().times.as_slice(), [50.0, 100.0, 110.0]);
    }

    #[test]
    fn tween_respects_own_persistence() {
        let driver = ManualDriver::new();
        let clock = ScriptedClock::new();
        let timeline = Timeline::new(driver.source(), clock.source());

        let mut tween = TweenRunner::new(10.0, Ease::Linear);
        tween.set_persist(Some(Persist::Forever));
        let (_, runner) = share(tween);
        timeline.schedule(&runner, 0.0, Placement::Last);
        timeline.play();

        clock.set(20.0);
        assert!(driver.fire());
        assert_eq!(timeline.scheduled().len(), 1, "kept forever");
        assert!(timeline.paused());
    }
}

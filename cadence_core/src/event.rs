// Copyright 2026 the Cadence Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Notification surface for timeline progress.
//!
//! [`TimelineEvents`] is the listener contract: one `time` notification per
//! tick carrying the new playhead, and one `finished` notification when the
//! continuation decision stops the loop. All methods default to no-ops, so
//! implementing only the events you care about is fine.
//!
//! Listeners are registered with
//! [`Timeline::add_listener`](crate::timeline::Timeline::add_listener) and
//! invoked while the timeline is *not* borrowed — reading the timeline from
//! a listener is fine; mutating it from one is not supported.

use alloc::rc::Rc;
use core::cell::RefCell;
use core::fmt;

/// A shared, interior-mutable listener registration.
pub type SharedEvents = Rc<RefCell<dyn TimelineEvents>>;

/// Receives timeline progress notifications.
pub trait TimelineEvents {
    /// Called once per tick with the new playhead, after the clock update
    /// and before runners are dispatched.
    fn on_time(&mut self, playhead: f64) {
        _ = playhead;
    }

    /// Called when the continuation decision determines no further ticking
    /// is warranted, immediately before the implicit pause.
    fn on_finished(&mut self) {}
}

/// A [`TimelineEvents`] listener that discards all notifications.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopEvents;

impl TimelineEvents for NoopEvents {}

impl fmt::Debug for dyn TimelineEvents {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TimelineEvents").finish_non_exhaustive()
    }
}

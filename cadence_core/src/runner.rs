// Copyright 2026 the Cadence Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The contract between a timeline and the runners it drives.
//!
//! A *runner* is an independently-stateful, time-bounded task: it knows its
//! own [`duration`](Runner::duration), accumulates local elapsed time as the
//! timeline feeds it deltas via [`step`](Runner::step), and reports when it
//! is done. The timeline owns a runner's *placement* (when it starts, how
//! long its entry outlives completion) but never the runner itself — runners
//! are shared by reference between the timeline and their external owner.
//!
//! Runner internals (easing, value interpolation, progress state machines)
//! are deliberately out of scope here; `cadence_harness` ships a complete
//! sample implementation.

use alloc::rc::Rc;
use core::cell::RefCell;
use core::fmt;
use core::sync::atomic::{AtomicU64, Ordering};

use crate::timeline::TimelineHandle;

/// A shared, interior-mutable reference to a runner.
///
/// Timelines hold these non-owningly: dropping a timeline never drops the
/// runner's external owner's handle, and vice versa.
pub type SharedRunner = Rc<RefCell<dyn Runner>>;

/// Stable identity of a runner.
///
/// Used as the scheduling-table key, for the sorted diagnostic snapshot, and
/// to match entries on re-schedule. Identities are process-unique and
/// monotonically increasing.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RunnerId(u64);

impl RunnerId {
    /// Allocates a fresh, process-unique identity.
    #[must_use]
    pub fn next() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    /// Returns the raw counter value (for diagnostics only).
    #[inline]
    #[must_use]
    pub const fn raw(self) -> u64 {
        self.0
    }

    /// Rebuilds an identity from its raw value, e.g. when decoding a trace
    /// recording. Does not reserve the value for future [`next`](Self::next)
    /// calls.
    #[inline]
    #[must_use]
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }
}

impl fmt::Debug for RunnerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RunnerId({})", self.0)
    }
}

/// How long a finished runner's scheduling entry is kept before eviction.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Persist {
    /// Keep the entry for this many milliseconds past the moment the runner
    /// finished, then evict it on the first tick beyond that.
    Grace(f64),
    /// Never evict the entry.
    Forever,
}

impl Default for Persist {
    fn default() -> Self {
        Self::Grace(0.0)
    }
}

/// What a runner reports back from one [`step`](Runner::step).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StepResult {
    /// Whether the runner has consumed its whole duration.
    pub done: bool,
}

/// A time-bounded task the timeline can drive.
///
/// # Local time
///
/// [`time`](Self::time) reports local elapsed time and must **not** clamp at
/// [`duration`](Self::duration): the timeline reconciles
/// `duration() - time() + playhead` to recover the playhead moment at which
/// the runner finished, which only works if local time keeps accumulating
/// past the end. (Whatever *positional* state the runner derives from local
/// time is free to clamp.)
///
/// # Re-entrancy
///
/// All methods are invoked while the owning timeline's state is borrowed.
/// Implementations must not call back into a timeline from `step`, `reset`,
/// or any other method here.
pub trait Runner {
    /// Stable identity of this runner.
    fn id(&self) -> RunnerId;

    /// Total duration in milliseconds.
    fn duration(&self) -> f64;

    /// Local elapsed time in milliseconds (unclamped; see the trait docs).
    fn time(&self) -> f64;

    /// Advances local time by `dt` milliseconds (negative rewinds).
    fn step(&mut self, dt: f64) -> StepResult;

    /// Whether the runner currently wants to be stepped. Inactive runners
    /// are skipped entirely during a tick.
    fn active(&self) -> bool;

    /// Rewinds local progress to the beginning. Idempotent.
    fn reset(&mut self);

    /// Per-runner persistence policy; `None` defers to the timeline default.
    fn persist(&self) -> Option<Persist> {
        None
    }

    /// The timeline currently holding this runner, if any.
    fn timeline(&self) -> Option<TimelineHandle>;

    /// Stores (or clears) the owning-timeline back-reference.
    ///
    /// Only [`Timeline::schedule`](crate::timeline::Timeline::schedule),
    /// [`Timeline::unschedule`](crate::timeline::Timeline::unschedule), the
    /// stepper's eviction path, and [`unschedule`](Self::unschedule) call
    /// this; implementations just store the handle.
    fn set_timeline(&mut self, timeline: Option<TimelineHandle>);

    /// Detaches this runner from whichever timeline currently holds it.
    ///
    /// No-op when unscheduled. Must not be called from within a tick.
    fn unschedule(&mut self) {
        if let Some(handle) = self.timeline() {
            handle.remove(self.id());
        }
        self.set_timeline(None);
    }
}

impl fmt::Debug for dyn Runner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Runner")
            .field("id", &self.id())
            .field("duration", &self.duration())
            .field("time", &self.time())
            .field("active", &self.active())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_unique_and_increasing() {
        let a = RunnerId::next();
        let b = RunnerId::next();
        let c = RunnerId::next();
        assert!(a < b && b < c, "ids must increase: {a:?} {b:?} {c:?}");
        assert_ne!(a.raw(), c.raw());
    }

    #[test]
    fn default_persist_is_immediate_grace() {
        assert_eq!(Persist::default(), Persist::Grace(0.0));
    }
}

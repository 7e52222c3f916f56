// Copyright 2026 the Cadence Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Backend contract for the host's frame-pacing and time primitives.
//!
//! Cadence splits platform-specific work into *backend* crates. Each backend
//! provides two capabilities:
//!
//! - **Frame source** — Implements [`FrameSource`]: schedules a one-shot
//!   callback for the host's next tick opportunity (e.g.
//!   `requestAnimationFrame`) and can cancel one that has not fired yet.
//!
//! - **Time source** — A [`TimeSource`] closure reading the platform's
//!   monotonic clock in milliseconds (e.g. `performance.now()`). The origin
//!   is arbitrary; only deltas matter.
//!
//! Both capabilities are injected into
//! [`Timeline::new`](crate::timeline::Timeline::new), so a deterministic
//! fake pair (see `cadence_harness`) drives the whole core in tests with no
//! platform at all.
//!
//! # Crate boundaries
//!
//! `cadence_core` owns the clock model, scheduling, and this contract
//! module. Backend crates depend on `cadence_core` and provide platform
//! glue; application code wires the two together.

use alloc::boxed::Box;
use alloc::rc::Rc;
use core::fmt;

/// A one-shot callback handed to a [`FrameSource`].
pub type FrameCallback = Box<dyn FnOnce()>;

/// A monotonic clock read, in milliseconds from an arbitrary origin.
///
/// The closure must not call back into the timeline that reads it.
pub type TimeSource = Rc<dyn Fn() -> f64>;

/// Identity of a pending frame request, used for cancellation.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameHandle(pub u64);

impl fmt::Debug for FrameHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FrameHandle({})", self.0)
    }
}

/// Schedules one-shot callbacks on the host's tick cadence.
///
/// # Contract
///
/// - [`request`](Self::request) must **not** invoke the callback
///   synchronously; it fires from a later host tick (or an explicit
///   `fire` on a manual source).
/// - [`cancel`](Self::cancel) must be safe to call with handles that have
///   already fired or were never issued.
/// - Each issued handle fires at most once.
pub trait FrameSource {
    /// Schedules `callback` for the next tick and returns its handle.
    fn request(&mut self, callback: FrameCallback) -> FrameHandle;

    /// Drops the pending request identified by `handle`, if still pending.
    fn cancel(&mut self, handle: FrameHandle);
}

impl fmt::Debug for dyn FrameSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FrameSource").finish_non_exhaustive()
    }
}

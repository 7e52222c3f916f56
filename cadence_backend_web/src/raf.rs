// Copyright 2026 the Cadence Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! `requestAnimationFrame` frame source.
//!
//! [`RafSource`] implements the core's
//! [`FrameSource`](cadence_core::driver::FrameSource) contract over the
//! browser's `requestAnimationFrame` API. A timeline keeps at most one
//! request in flight and always cancels before re-arming; `RafSource`
//! relies on that and holds a single pending callback — a later `request`
//! supersedes an uncancelled earlier one.
//!
//! One persistent JS trampoline closure is registered with
//! `requestAnimationFrame` each time, so no closure is allocated (or can be
//! collected early) per frame.

use alloc::boxed::Box;
use alloc::rc::Rc;
use core::cell::{Cell, RefCell};

use wasm_bindgen::closure::Closure;
use wasm_bindgen::prelude::*;

use cadence_core::driver::{FrameCallback, FrameHandle, FrameSource};

// Direct global bindings instead of `web_sys::Window` methods — avoids
// fetching (and unwrapping) the Window/Performance objects on every frame.
#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(js_namespace = performance, js_name = "now")]
    pub(crate) fn performance_now() -> f64;

    #[wasm_bindgen(js_name = "requestAnimationFrame")]
    fn request_animation_frame(callback: &JsValue) -> i32;

    #[wasm_bindgen(js_name = "cancelAnimationFrame")]
    fn cancel_animation_frame(id: i32);
}

type Trampoline = Closure<dyn FnMut(f64)>;

/// A `requestAnimationFrame`-backed [`FrameSource`].
///
/// Wrap one in `Rc<RefCell<_>>` and hand it to
/// [`Timeline::new`](cadence_core::timeline::Timeline::new).
pub struct RafSource {
    inner: Rc<RafInner>,
}

struct RafInner {
    /// The persistent JS closure registered with `requestAnimationFrame`.
    ///
    /// Created lazily on the first request and kept for the lifetime of the
    /// source; its body only touches `pending`, so re-entrant requests from
    /// inside a fired callback are fine.
    trampoline: RefCell<Option<Trampoline>>,

    /// The single queued callback, tagged with its handle.
    pending: RefCell<Option<(u64, FrameCallback)>>,

    /// The ID returned by the most recent `requestAnimationFrame` call,
    /// used by [`cancel_animation_frame`] when cancelling or superseding.
    raf_id: Cell<i32>,

    /// Monotonic handle counter.
    next_handle: Cell<u64>,
}

impl RafSource {
    /// Creates a source with nothing pending.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Rc::new(RafInner {
                trampoline: RefCell::new(None),
                pending: RefCell::new(None),
                raf_id: Cell::new(0),
                next_handle: Cell::new(0),
            }),
        }
    }

    /// Whether a request is currently waiting for the browser to fire.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.inner.pending.borrow().is_some()
    }
}

impl Default for RafSource {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameSource for RafSource {
    fn request(&mut self, callback: FrameCallback) -> FrameHandle {
        let handle = FrameHandle(self.inner.next_handle.get());
        self.inner.next_handle.set(handle.0 + 1);

        if self.inner.trampoline.borrow().is_none() {
            let inner = Rc::clone(&self.inner);
            *self.inner.trampoline.borrow_mut() =
                Some(Closure::wrap(Box::new(move |_timestamp_ms: f64| {
                    // The borrow is scoped so the callback can re-enter
                    // `request`/`cancel` on this same source.
                    let taken = inner.pending.borrow_mut().take();
                    if let Some((_, callback)) = taken {
                        callback();
                    }
                }) as Box<dyn FnMut(f64)>));
        }

        {
            let mut pending = self.inner.pending.borrow_mut();
            if pending.is_some() {
                // Superseded without an explicit cancel; drop the stale
                // browser registration along with the old callback.
                cancel_animation_frame(self.inner.raf_id.get());
            }
            *pending = Some((handle.0, callback));
        }

        let trampoline = self.inner.trampoline.borrow();
        if let Some(closure) = trampoline.as_ref() {
            let id = request_animation_frame(closure.as_ref().unchecked_ref());
            self.inner.raf_id.set(id);
        }
        handle
    }

    fn cancel(&mut self, handle: FrameHandle) {
        let mut pending = self.inner.pending.borrow_mut();
        // Fired and unknown handles no longer match; cancelling them is a
        // no-op per the contract.
        if matches!(*pending, Some((id, _)) if id == handle.0) {
            *pending = None;
            cancel_animation_frame(self.inner.raf_id.get());
        }
    }
}

impl Drop for RafSource {
    fn drop(&mut self) {
        if self.inner.pending.borrow_mut().take().is_some() {
            cancel_animation_frame(self.inner.raf_id.get());
        }
        // Drop the JS closure so it doesn't leak.
        self.inner.trampoline.borrow_mut().take();
    }
}

impl core::fmt::Debug for RafSource {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("RafSource")
            .field("pending", &self.is_pending())
            .field("raf_id", &self.inner.raf_id.get())
            .finish_non_exhaustive()
    }
}

// Copyright 2026 the Cadence Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Web backend for cadence.
//!
//! This crate provides the two capabilities a
//! [`Timeline`](cadence_core::timeline::Timeline) needs from the browser:
//!
//! - [`RafSource`]: `requestAnimationFrame` frame source
//! - [`time_source`]: `performance.now()` time source
//!
//! ```rust,ignore
//! use alloc::rc::Rc;
//! use core::cell::RefCell;
//!
//! use cadence_backend_web::{RafSource, time_source};
//! use cadence_core::timeline::Timeline;
//!
//! let frames = Rc::new(RefCell::new(RafSource::new()));
//! let timeline = Timeline::new(frames, time_source());
//! ```

#![no_std]

extern crate alloc;

mod raf;

pub use raf::RafSource;

use alloc::rc::Rc;

use cadence_core::driver::TimeSource;

/// Returns the current `performance.now()` reading in milliseconds.
#[must_use]
pub fn now() -> f64 {
    raf::performance_now()
}

/// Packages `performance.now()` as the core's [`TimeSource`].
#[must_use]
pub fn time_source() -> TimeSource {
    Rc::new(raf::performance_now)
}

// Copyright 2026 the Cadence Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Virtual-time scheduling for animation runners.
//!
//! `cadence_core` drives a set of independently-stateful, time-bounded
//! *runners* along a single controllable clock: playable, pausable,
//! seekable, speed-scaled, and reversible. On every tick it reconciles the
//! external time source with manual seeks and speed changes, dispatches the
//! correct per-runner delta to each scheduled entry, and garbage-collects
//! finished entries after a configurable grace period. It is `no_std`
//! compatible (with `alloc`) and platform-free: the frame-pacing and clock
//! primitives are injected, so the whole crate runs deterministically under
//! test.
//!
//! # Architecture
//!
//! The crate is organized around a tick loop that turns host frame
//! callbacks into per-runner time deltas:
//!
//! ```text
//!   FrameSource (host pacing)        TimeSource (host clock)
//!        │ fires                          │ read once per tick
//!        ▼                                ▼
//!   Timeline stepper ── clock reconciliation ── playhead
//!        │
//!        ├──► TimelineEvents (`time`, `finished`)
//!        ├──► Runner::step(dt) per scheduling-table entry
//!        ├──► eviction of finished entries past their grace period
//!        └──► continuation controller (re-arm the FrameSource, or stop)
//! ```
//!
//! **[`timeline`]** — The clock model, the stepper, the continuation
//! controller, and the transport surface (`play`/`pause`/`stop`/`finish`/
//! `seek`/`set_time`/`set_speed`/`reverse`).
//!
//! **[`schedule`]** — Placement modes and the identity-keyed scheduling
//! table with its order sequence.
//!
//! **[`runner`]** — The contract a runner implements to be driven.
//!
//! **[`driver`]** — The backend contract: [`FrameSource`](driver::FrameSource)
//! and [`TimeSource`](driver::TimeSource).
//!
//! **[`event`]** — The [`TimelineEvents`](event::TimelineEvents) listener
//! surface.
//!
//! **[`trace`]** — [`TraceSink`](trace::TraceSink) trait and event types
//! for tick-loop instrumentation, compiled out without the `trace` feature.
//!
//! # Crate features
//!
//! - `trace` (disabled by default): Enables trace emission from the stepper
//!   (one branch per emission site when a sink is installed).

#![no_std]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]

extern crate alloc;

pub mod driver;
pub mod event;
pub mod runner;
pub mod schedule;
pub mod timeline;
pub mod trace;

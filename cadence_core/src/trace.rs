// Copyright 2026 the Cadence Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tracing and diagnostics for the tick loop.
//!
//! This module provides a [`TraceSink`] trait with per-event methods that
//! the stepper calls at each stage. All method bodies default to no-ops, so
//! implementing only the events you care about is fine.
//!
//! Emission is gated behind the `trace` cargo feature: with the feature
//! **off**, every emission site in the timeline compiles to nothing; with it
//! **on**, each site performs a single `Option` branch before dispatching to
//! the installed sink. The types here are always available so sinks can be
//! written without feature juggling.
//!
//! `cadence_debug` provides a recording sink plus a Chrome Trace exporter.

use alloc::rc::Rc;
use core::cell::RefCell;
use core::fmt;

use crate::runner::RunnerId;

/// A shared, interior-mutable trace sink registration.
pub type SharedTraceSink = Rc<RefCell<dyn TraceSink>>;

/// Emitted once per stepper run, after the clock update.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TickEvent {
    /// Whether this tick came from a synchronous seek rather than a frame.
    pub immediate: bool,
    /// The external time source's reading for this tick, in ms.
    pub source_now: f64,
    /// External elapsed time since the previous tick (0 when immediate).
    pub dt_source: f64,
    /// The speed-scaled, seek-folded delta applied this tick.
    pub dt_tick: f64,
    /// Playhead after the clock update.
    pub playhead: f64,
}

/// Emitted for each runner actually advanced during a tick.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StepEvent {
    /// Which runner was stepped.
    pub runner: RunnerId,
    /// The (possibly clamped) delta delivered to it.
    pub dt: f64,
    /// Whether the runner reported completion.
    pub done: bool,
    /// Playhead at dispatch time.
    pub playhead: f64,
}

/// Emitted when a finished runner's entry is evicted.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EvictEvent {
    /// Which runner was evicted.
    pub runner: RunnerId,
    /// The reconciled playhead moment at which the runner finished.
    pub finish_time: f64,
    /// Playhead at eviction time.
    pub playhead: f64,
}

/// Emitted with every continuation decision.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ContinueEvent {
    /// Whether another frame was requested.
    pub rearm: bool,
    /// Whether any entry still has outstanding work.
    pub work_remains: bool,
    /// Playhead at decision time.
    pub playhead: f64,
}

/// Receives trace events from the tick loop.
///
/// All methods have default no-op implementations, so you only need to
/// override the events you care about.
pub trait TraceSink {
    /// Called once per stepper run.
    fn on_tick(&mut self, e: &TickEvent) {
        _ = e;
    }

    /// Called for each runner advanced during a tick.
    fn on_step(&mut self, e: &StepEvent) {
        _ = e;
    }

    /// Called when a finished runner's entry is evicted.
    fn on_evict(&mut self, e: &EvictEvent) {
        _ = e;
    }

    /// Called with every continuation decision.
    fn on_continue(&mut self, e: &ContinueEvent) {
        _ = e;
    }
}

/// A [`TraceSink`] that discards all events.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopSink;

impl TraceSink for NoopSink {}

impl fmt::Debug for dyn TraceSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TraceSink").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn noop_sink_compiles() {
        let mut sink = NoopSink;
        sink.on_tick(&TickEvent {
            immediate: false,
            source_now: 16.7,
            dt_source: 16.7,
            dt_tick: 16.7,
            playhead: 16.7,
        });
        sink.on_continue(&ContinueEvent {
            rearm: true,
            work_remains: true,
            playhead: 16.7,
        });
    }

    #[test]
    fn sink_dispatch_overridable() {
        struct Counting {
            ticks: usize,
        }
        impl TraceSink for Counting {
            fn on_tick(&mut self, _e: &TickEvent) {
                self.ticks += 1;
            }
        }

        let mut sink = Counting { ticks: 0 };
        let e = TickEvent {
            immediate: true,
            source_now: 0.0,
            dt_source: 0.0,
            dt_tick: 5.0,
            playhead: 5.0,
        };
        sink.on_tick(&e);
        sink.on_tick(&e);
        assert_eq!(sink.ticks, 2);
    }
}

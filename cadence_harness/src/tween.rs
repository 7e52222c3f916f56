// Copyright 2026 the Cadence Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! A complete sample runner: fixed duration, eased progress output.
//!
//! [`TweenRunner`] implements the full
//! [`Runner`](cadence_core::runner::Runner) contract and writes an eased
//! progress value in `[0, 1]` to a shared cell on every step, so tests and
//! demos can observe exactly what a timeline delivered. Easing is evaluated
//! on a [`kurbo::CubicBez`] in the CSS `cubic-bezier` convention: the curve
//! runs from (0, 0) to (1, 1), input is the x axis, output the y axis.

use alloc::rc::Rc;
use core::cell::Cell;

use kurbo::{CubicBez, ParamCurve};

use cadence_core::runner::{Persist, Runner, RunnerId, StepResult};
use cadence_core::timeline::TimelineHandle;

/// Progress easing function.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Ease {
    /// Identity: progress equals the time fraction.
    Linear,
    /// CSS-style `cubic-bezier(x1, y1, x2, y2)` with control x values in
    /// `[0, 1]` (required for the x component to stay monotone).
    CubicBezier {
        /// First control point, x.
        x1: f64,
        /// First control point, y.
        y1: f64,
        /// Second control point, x.
        x2: f64,
        /// Second control point, y.
        y2: f64,
    },
}

impl Ease {
    /// The CSS `ease-in-out` curve.
    pub const EASE_IN_OUT: Self = Self::CubicBezier {
        x1: 0.42,
        y1: 0.0,
        x2: 0.58,
        y2: 1.0,
    };

    /// Maps a time fraction to eased progress; both clamped to `[0, 1]`.
    #[must_use]
    pub fn apply(&self, t: f64) -> f64 {
        let t = t.clamp(0.0, 1.0);
        match *self {
            Self::Linear => t,
            Self::CubicBezier { x1, y1, x2, y2 } => {
                let curve = CubicBez::new((0.0, 0.0), (x1, y1), (x2, y2), (1.0, 1.0));
                // Invert the monotone x component by bisection, then read y.
                let mut lo = 0.0;
                let mut hi = 1.0;
                for _ in 0..48 {
                    let mid = 0.5 * (lo + hi);
                    if curve.eval(mid).x < t {
                        lo = mid;
                    } else {
                        hi = mid;
                    }
                }
                curve.eval(0.5 * (lo + hi)).y.clamp(0.0, 1.0)
            }
        }
    }
}

/// A time-bounded runner producing eased progress.
///
/// Local time accumulates without clamping (as the runner contract
/// requires); only the derived progress clamps to `[0, 1]`.
#[derive(Debug)]
pub struct TweenRunner {
    id: RunnerId,
    duration: f64,
    time: f64,
    enabled: bool,
    persist: Option<Persist>,
    ease: Ease,
    progress: Rc<Cell<f64>>,
    timeline: Option<TimelineHandle>,
}

impl TweenRunner {
    /// Creates a runner of the given duration in milliseconds.
    ///
    /// # Panics
    ///
    /// Panics if `duration` is not strictly positive.
    #[must_use]
    pub fn new(duration: f64, ease: Ease) -> Self {
        assert!(duration > 0.0, "tween duration must be positive");
        Self {
            id: RunnerId::next(),
            duration,
            time: 0.0,
            enabled: true,
            persist: None,
            ease,
            progress: Rc::new(Cell::new(ease.apply(0.0))),
            timeline: None,
        }
    }

    /// The shared eased-progress cell, updated on every step.
    #[must_use]
    pub fn progress(&self) -> Rc<Cell<f64>> {
        self.progress.clone()
    }

    /// Enables or disables stepping; a disabled runner is skipped by the
    /// timeline without being evicted.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    /// Sets the per-runner persistence (`None` defers to the timeline).
    pub fn set_persist(&mut self, persist: Option<Persist>) {
        self.persist = persist;
    }
}

impl Runner for TweenRunner {
    fn id(&self) -> RunnerId {
        self.id
    }

    fn duration(&self) -> f64 {
        self.duration
    }

    fn time(&self) -> f64 {
        self.time
    }

    fn step(&mut self, dt: f64) -> StepResult {
        self.time += dt;
        self.progress.set(self.ease.apply(self.time / self.duration));
        StepResult {
            done: self.time >= self.duration,
        }
    }

    fn active(&self) -> bool {
        self.enabled
    }

    fn reset(&mut self) {
        self.time = 0.0;
        self.progress.set(self.ease.apply(0.0));
    }

    fn persist(&self) -> Option<Persist> {
        self.persist
    }

    fn timeline(&self) -> Option<TimelineHandle> {
        self.timeline.clone()
    }

    fn set_timeline(&mut self, timeline: Option<TimelineHandle>) {
        self.timeline = timeline;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn linear_ease_is_identity_on_unit_interval() {
        assert_eq!(Ease::Linear.apply(0.0), 0.0);
        assert_eq!(Ease::Linear.apply(0.25), 0.25);
        assert_eq!(Ease::Linear.apply(1.0), 1.0);
        assert_eq!(Ease::Linear.apply(-2.0), 0.0, "input clamps");
        assert_eq!(Ease::Linear.apply(3.0), 1.0, "input clamps");
    }

    #[test]
    fn cubic_ease_hits_endpoints() {
        let ease = Ease::EASE_IN_OUT;
        assert!(ease.apply(0.0).abs() < 1e-9);
        assert!((ease.apply(1.0) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn ease_in_out_is_symmetric_and_monotone() {
        let ease = Ease::EASE_IN_OUT;
        assert!(
            (ease.apply(0.5) - 0.5).abs() < 1e-6,
            "symmetric curve crosses the middle"
        );
        let mut prev = 0.0;
        let mut i = 1;
        while i <= 20 {
            let y = ease.apply(f64::from(i) / 20.0);
            assert!(y >= prev, "progress must not regress at sample {i}");
            prev = y;
            i += 1;
        }
    }

    #[test]
    fn ease_in_out_starts_slower_than_linear() {
        let ease = Ease::EASE_IN_OUT;
        assert!(ease.apply(0.2) < 0.2);
        assert!(ease.apply(0.8) > 0.8);
    }

    #[test]
    fn tween_tracks_unclamped_time_but_clamped_progress() {
        let mut tween = TweenRunner::new(10.0, Ease::Linear);
        let progress = tween.progress();

        assert!(!tween.step(6.0).done);
        assert_eq!(progress.get(), 0.6);

        assert!(tween.step(6.0).done);
        assert_eq!(tween.time(), 12.0, "local time runs past the end");
        assert_eq!(progress.get(), 1.0, "progress clamps");

        tween.reset();
        assert_eq!(tween.time(), 0.0);
        assert_eq!(progress.get(), 0.0);
    }

    #[test]
    fn tween_rewinds_on_negative_delta() {
        let mut tween = TweenRunner::new(10.0, Ease::Linear);
        let progress = tween.progress();
        let _ = tween.step(8.0);
        let _ = tween.step(-3.0);
        assert_eq!(tween.time(), 5.0);
        assert_eq!(progress.get(), 0.5);
    }

    #[test]
    #[should_panic(expected = "tween duration must be positive")]
    fn zero_duration_is_rejected() {
        let _ = TweenRunner::new(0.0, Ease::Linear);
    }
}

// Copyright 2026 the Cadence Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The timeline: a controllable virtual clock dispatching ticks to runners.
//!
//! A [`Timeline`] advances a single playhead along time read from an
//! injected [`TimeSource`], scaled by a signed speed, and dispatches the
//! per-tick delta to every scheduled runner. The playhead is seekable at any
//! moment; a manual seek ticks synchronously through the same stepper the
//! frame loop uses, so the two paths cannot drift apart.
//!
//! # Control flow
//!
//! ```text
//!   mutation (schedule / play / set_time / …)
//!       │ updates clock + table state
//!       ▼
//!   continuation controller ──► FrameSource::request()
//!                                     │ (host fires later)
//!                                     ▼
//!                                  stepper ──► runners, listeners
//!                                     │
//!                                     └──► continuation controller (re-arm
//!                                          or `finished` + pause)
//! ```
//!
//! At most one frame request is in flight per timeline at any time: the
//! continuation controller always cancels the pending request before arming
//! a new one, so the stepper has exclusive, non-reentrant access to the
//! clock and the scheduling table for the whole tick.

use alloc::boxed::Box;
use alloc::rc::{Rc, Weak};
use alloc::vec::Vec;
use core::cell::RefCell;
use core::fmt;

use crate::driver::{FrameCallback, FrameHandle, FrameSource, TimeSource};
use crate::event::SharedEvents;
use crate::runner::{Persist, RunnerId, SharedRunner};
use crate::schedule::{Placement, ScheduleEntry, ScheduleTable, ScheduledRunner};
use crate::trace::SharedTraceSink;

/// Mutable per-timeline state behind the shared cell.
struct State {
    /// Current virtual time in milliseconds. Never negative.
    playhead: f64,
    /// Signed speed multiplier; negative plays in reverse.
    speed: f64,
    paused: bool,
    /// Default applied to runners that do not carry their own persistence.
    default_persist: Persist,
    /// Last value read from the time source; resynchronized whenever the
    /// timeline is not frame-active, so no spurious delta accumulates
    /// across a pause.
    last_source_time: f64,
    /// Playhead as of the last completed tick. The gap between this and
    /// `playhead` is whatever changed out of band (a manual seek) and is
    /// folded into the next tick's delta exactly once.
    last_step_time: f64,
    /// The armed frame request, if any. Its presence is the
    /// "is this timeline actively ticking" predicate.
    pending_frame: Option<FrameHandle>,
    table: ScheduleTable,
    frames: Rc<RefCell<dyn FrameSource>>,
    clock: TimeSource,
    listeners: Vec<SharedEvents>,
    trace: Option<SharedTraceSink>,
}

type StateCell = Rc<RefCell<State>>;

impl State {
    fn resync(&mut self) {
        if self.pending_frame.is_none() {
            self.last_source_time = (self.clock)();
        }
    }

    /// End of the *last entry in scheduling order* — not the maximum end
    /// across entries. Default chaining depends on this quirk.
    fn end_time(&self) -> f64 {
        self.table
            .last()
            .map_or(0.0, |entry| entry.start + entry.runner.borrow().duration())
    }

    #[inline]
    fn trace_tick(&self, immediate: bool, source_now: f64, dt_source: f64, dt_tick: f64) {
        #[cfg(feature = "trace")]
        if let Some(sink) = &self.trace {
            sink.borrow_mut().on_tick(&crate::trace::TickEvent {
                immediate,
                source_now,
                dt_source,
                dt_tick,
                playhead: self.playhead,
            });
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = (immediate, source_now, dt_source, dt_tick);
        }
    }

    #[inline]
    fn trace_step(&self, runner: RunnerId, dt: f64, done: bool) {
        #[cfg(feature = "trace")]
        if let Some(sink) = &self.trace {
            sink.borrow_mut().on_step(&crate::trace::StepEvent {
                runner,
                dt,
                done,
                playhead: self.playhead,
            });
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = (runner, dt, done);
        }
    }

    #[inline]
    fn trace_evict(&self, runner: RunnerId, finish_time: f64) {
        #[cfg(feature = "trace")]
        if let Some(sink) = &self.trace {
            sink.borrow_mut().on_evict(&crate::trace::EvictEvent {
                runner,
                finish_time,
                playhead: self.playhead,
            });
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = (runner, finish_time);
        }
    }

    #[inline]
    fn trace_continue(&self, rearm: bool, work_remains: bool) {
        #[cfg(feature = "trace")]
        if let Some(sink) = &self.trace {
            sink.borrow_mut().on_continue(&crate::trace::ContinueEvent {
                rearm,
                work_remains,
                playhead: self.playhead,
            });
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = (rearm, work_remains);
        }
    }
}

/// A weak back-reference from a runner to the timeline holding it.
///
/// Handles never own the timeline; once every [`Timeline`] clone is dropped,
/// handles dangle harmlessly and all operations become no-ops.
#[derive(Clone)]
pub struct TimelineHandle {
    state: Weak<RefCell<State>>,
}

impl TimelineHandle {
    /// Removes `id`'s scheduling entry from the timeline, if both still
    /// exist. The runner's own back-reference is left untouched.
    pub fn remove(&self, id: RunnerId) {
        if let Some(state) = self.state.upgrade() {
            state.borrow_mut().table.remove(id);
        }
    }

    /// Recovers a full [`Timeline`] handle, if the timeline is still alive.
    #[must_use]
    pub fn upgrade(&self) -> Option<Timeline> {
        self.state.upgrade().map(|state| Timeline { state })
    }
}

impl fmt::Debug for TimelineHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TimelineHandle")
            .field("alive", &(self.state.strong_count() > 0))
            .finish()
    }
}

/// A cooperative, single-threaded scheduler driving runners along a shared
/// controllable clock.
///
/// `Timeline` is a cheap handle: clones share the same clock and scheduling
/// table. A fresh timeline is *playing* — scheduling a runner onto it arms
/// the frame loop immediately; call [`pause`](Self::pause) first if that is
/// not wanted.
#[derive(Clone)]
pub struct Timeline {
    state: StateCell,
}

impl Timeline {
    /// Creates a timeline over the given frame-pacing and time capabilities.
    #[must_use]
    pub fn new(frames: Rc<RefCell<dyn FrameSource>>, clock: TimeSource) -> Self {
        Self {
            state: Rc::new(RefCell::new(State {
                playhead: 0.0,
                speed: 1.0,
                paused: false,
                default_persist: Persist::default(),
                last_source_time: 0.0,
                last_step_time: 0.0,
                pending_frame: None,
                table: ScheduleTable::new(),
                frames,
                clock,
                listeners: Vec::new(),
                trace: None,
            })),
        }
    }

    /// Returns a weak back-reference suitable for storing in a runner.
    #[must_use]
    pub fn handle(&self) -> TimelineHandle {
        TimelineHandle {
            state: Rc::downgrade(&self.state),
        }
    }

    // -- Scheduling --

    /// Places `runner` on this timeline.
    ///
    /// The start offset is resolved from `placement` (see [`Placement`]),
    /// with `delay` added on top of the resolved anchor for every mode
    /// except [`Placement::Absolute`], where the delay *is* the anchor.
    ///
    /// The runner is detached from whatever timeline previously held it
    /// (this one included — re-scheduling replaces the old placement), its
    /// back-reference is pointed here, and its persistence is resolved
    /// against the timeline default once, at this moment. The clock is then
    /// resynced and the frame loop re-armed, so an already-playing timeline
    /// picks the runner up without waiting for the next tick.
    pub fn schedule(&self, runner: &SharedRunner, delay: f64, placement: Placement) {
        let id = runner.borrow().id();

        // Resolve the anchor before detaching: `Relative` reads the
        // runner's previous start and `Last` reads the current end, both of
        // which the detach below would disturb.
        let (anchor, delay) = {
            let state = self.state.borrow();
            match placement {
                Placement::Last => (state.end_time(), delay),
                Placement::Absolute => (delay, 0.0),
                Placement::Now => (state.playhead, delay),
                Placement::Relative => {
                    let prev = state.table.get(id).map_or(0.0, |entry| entry.start);
                    (prev, delay)
                }
            }
        };

        let previous = runner.borrow().timeline();
        if let Some(handle) = previous {
            handle.remove(id);
        }
        runner.borrow_mut().set_timeline(Some(self.handle()));
        let persist = runner.borrow().persist();

        {
            let mut state = self.state.borrow_mut();
            let persist = persist.unwrap_or(state.default_persist);
            state.table.insert(
                id,
                ScheduleEntry {
                    start: anchor + delay,
                    persist,
                    runner: runner.clone(),
                },
            );
            state.resync();
        }
        arm(&self.state, false);
    }

    /// Removes `runner` from this timeline and clears its back-reference.
    /// No-op if it is not scheduled here.
    pub fn unschedule(&self, runner: &SharedRunner) {
        let id = runner.borrow().id();
        let removed = self.state.borrow_mut().table.remove(id);
        if removed.is_some() {
            runner.borrow_mut().set_timeline(None);
        }
    }

    /// Read-only snapshot of all current entries, sorted by runner
    /// identity. Diagnostic view only; holding it schedules nothing.
    #[must_use]
    pub fn scheduled(&self) -> Vec<ScheduledRunner> {
        self.state.borrow().table.snapshot()
    }

    /// `start + duration` of the last entry in *scheduling order*, or 0
    /// with nothing scheduled.
    ///
    /// Known quirk, kept deliberately: this is not the maximum end time
    /// across entries. An early long runner scheduled before a short one
    /// does not extend the "end" that [`Placement::Last`] chains onto.
    #[must_use]
    pub fn end_time(&self) -> f64 {
        self.state.borrow().end_time()
    }

    // -- Transport --

    /// Starts (or resumes) playback.
    pub fn play(&self) {
        {
            let mut state = self.state.borrow_mut();
            state.paused = false;
            state.resync();
        }
        arm(&self.state, false);
    }

    /// Stops ticking after the current frame; the playhead keeps its value.
    pub fn pause(&self) {
        self.state.borrow_mut().paused = true;
        // Seeing paused, the controller cancels without re-arming.
        arm(&self.state, false);
    }

    /// Seeks to 0, then pauses.
    pub fn stop(&self) {
        self.set_time(0.0);
        self.pause();
    }

    /// Seeks one unit past [`end_time`](Self::end_time), then pauses.
    ///
    /// One past the end guarantees every runner steps across its own end
    /// and reports completion.
    pub fn finish(&self) {
        let end = self.end_time();
        self.set_time(end + 1.0);
        self.pause();
    }

    /// Current speed multiplier.
    #[must_use]
    pub fn speed(&self) -> f64 {
        self.state.borrow().speed
    }

    /// Sets the speed multiplier. Negative plays in reverse; magnitude
    /// scales external elapsed time.
    pub fn set_speed(&self, speed: f64) {
        self.state.borrow_mut().speed = speed;
    }

    /// Flips the playback direction, keeping the magnitude.
    pub fn reverse(&self) {
        let mut state = self.state.borrow_mut();
        state.speed = -state.speed;
    }

    /// Sets the playback direction explicitly: `true` plays in reverse
    /// (`-|speed|`), `false` forward (`+|speed|`).
    pub fn set_reversed(&self, reversed: bool) {
        let mut state = self.state.borrow_mut();
        let magnitude = state.speed.abs();
        state.speed = if reversed { -magnitude } else { magnitude };
    }

    /// Moves the playhead by `dt` milliseconds (see [`set_time`](Self::set_time)).
    pub fn seek(&self, dt: f64) {
        let t = self.time();
        self.set_time(t + dt);
    }

    /// Current playhead in milliseconds.
    #[must_use]
    pub fn time(&self) -> f64 {
        self.state.borrow().playhead
    }

    /// Seeks the playhead to `t` (clamped at 0) and ticks *immediately and
    /// synchronously* — runners are stepped by the seek delta before this
    /// returns, through the same stepper the frame loop uses.
    pub fn set_time(&self, t: f64) {
        self.state.borrow_mut().playhead = t.max(0.0);
        arm(&self.state, true);
    }

    /// Default persistence applied to future [`schedule`](Self::schedule)
    /// calls for runners without their own.
    #[must_use]
    pub fn persist(&self) -> Persist {
        self.state.borrow().default_persist
    }

    /// Sets the default persistence. Existing entries keep the value they
    /// resolved at schedule time.
    pub fn set_persist(&self, persist: Persist) {
        self.state.borrow_mut().default_persist = persist;
    }

    /// The external time source.
    #[must_use]
    pub fn source(&self) -> TimeSource {
        self.state.borrow().clock.clone()
    }

    /// Replaces the external time source.
    pub fn set_source(&self, clock: TimeSource) {
        self.state.borrow_mut().clock = clock;
    }

    /// Re-reads the time source if the timeline is not currently
    /// frame-active, so the idle interval is not attributed to the next
    /// tick as if it elapsed instantaneously.
    pub fn resync(&self) {
        self.state.borrow_mut().resync();
    }

    /// Whether a frame request is currently outstanding.
    #[must_use]
    pub fn active(&self) -> bool {
        self.state.borrow().pending_frame.is_some()
    }

    /// Whether the timeline is paused.
    #[must_use]
    pub fn paused(&self) -> bool {
        self.state.borrow().paused
    }

    // -- Observers --

    /// Registers a progress listener (`time` per tick, `finished` on stop).
    pub fn add_listener(&self, listener: SharedEvents) {
        self.state.borrow_mut().listeners.push(listener);
    }

    /// Installs (or clears) the trace sink. Emission requires the `trace`
    /// cargo feature; without it this stores the sink but nothing fires.
    pub fn set_trace_sink(&self, sink: Option<SharedTraceSink>) {
        self.state.borrow_mut().trace = sink;
    }
}

impl fmt::Debug for Timeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.borrow();
        f.debug_struct("Timeline")
            .field("playhead", &state.playhead)
            .field("speed", &state.speed)
            .field("paused", &state.paused)
            .field("scheduled", &state.table.len())
            .field("active", &state.pending_frame.is_some())
            .finish_non_exhaustive()
    }
}

// -- Continuation controller --

/// Cancels any pending frame request, then either ticks synchronously
/// (`immediate`) or arms a fresh request unless paused.
fn arm(state: &StateCell, immediate: bool) {
    let (frames, pending) = {
        let mut s = state.borrow_mut();
        (s.frames.clone(), s.pending_frame.take())
    };
    if let Some(handle) = pending {
        frames.borrow_mut().cancel(handle);
    }
    if immediate {
        step(state, true);
        return;
    }
    if state.borrow().paused {
        return;
    }
    let weak = Rc::downgrade(state);
    let callback: FrameCallback = Box::new(move || {
        if let Some(state) = weak.upgrade() {
            step(&state, false);
        }
    });
    let handle = frames.borrow_mut().request(callback);
    state.borrow_mut().pending_frame = Some(handle);
}

// -- Stepper --

/// One tick: reconcile the clock, notify, dispatch to every entry in
/// scheduling order, evict expired entries, and decide continuation.
///
/// `immediate` is true only for synchronous seeks; it suppresses the
/// external-time delta so the tick delta is exactly the seek delta.
fn step(state: &StateCell, immediate: bool) {
    // Clock reconciliation.
    let (dt_tick, playhead, listeners) = {
        let mut s = state.borrow_mut();
        let source_now = (s.clock)();
        let mut dt_source = source_now - s.last_source_time;
        if immediate {
            dt_source = 0.0;
        }
        // The second term folds in any out-of-band playhead change since
        // the previous tick, so a manual seek is honored exactly once.
        let dt_tick = s.speed * dt_source + (s.playhead - s.last_step_time);
        s.last_source_time = source_now;
        if !immediate {
            s.playhead = (s.playhead + dt_tick).max(0.0);
        }
        s.last_step_time = s.playhead;
        s.trace_tick(immediate, source_now, dt_source, dt_tick);
        (dt_tick, s.playhead, s.listeners.clone())
    };
    for listener in &listeners {
        listener.borrow_mut().on_time(playhead);
    }

    // Dispatch and the continuation decision.
    let rearm = {
        let mut s = state.borrow_mut();
        let mut work_remains = false;
        let order: Vec<RunnerId> = s.table.order().to_vec();
        for id in order {
            let Some((runner, start, persist)) = s
                .table
                .get(id)
                .map(|entry| (entry.runner.clone(), entry.start, entry.persist))
            else {
                continue;
            };

            let dt_to_start = s.playhead - start;
            if dt_to_start <= 0.0 {
                // Not started yet: rewind it and keep the loop alive.
                work_remains = true;
                runner.borrow_mut().reset();
                continue;
            }
            let mut dt = dt_tick;
            if dt_to_start < dt {
                // Started mid-tick: only the portion since its own start.
                dt = dt_to_start;
            }
            if !runner.borrow().active() {
                continue;
            }

            let done = runner.borrow_mut().step(dt).done;
            s.trace_step(id, dt, done);
            if !done {
                work_remains = true;
            } else if let Persist::Grace(grace) = persist {
                // Reconcile the runner's reported local time against the
                // tick time actually delivered: this is the playhead moment
                // at which it finished.
                let finish_time = {
                    let r = runner.borrow();
                    r.duration() - r.time() + s.playhead
                };
                if finish_time + grace < s.playhead {
                    s.table.remove(id);
                    runner.borrow_mut().set_timeline(None);
                    s.trace_evict(id, finish_time);
                } else {
                    // Inside its grace period: keep ticking until the
                    // eviction tick.
                    work_remains = true;
                }
            }
        }

        // Reverse playback keeps ticking merely because entries exist, so
        // they get rewound toward their starts; forward playback continues
        // only on outstanding work.
        let rearm = (work_remains && !(s.speed < 0.0 && s.playhead == 0.0))
            || (!s.table.is_empty() && s.speed < 0.0 && s.playhead > 0.0);
        s.trace_continue(rearm, work_remains);
        rearm
    };

    if rearm {
        arm(state, false);
    } else {
        for listener in &listeners {
            listener.borrow_mut().on_finished();
        }
        state.borrow_mut().paused = true;
        arm(state, false);
    }
}

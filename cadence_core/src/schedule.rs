// Copyright 2026 the Cadence Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Placement modes and the identity-keyed scheduling table.
//!
//! The table maps [`RunnerId`] to its placement entry and keeps a separate
//! *scheduling order*: the append-order sequence of identities that
//! establishes both default chaining ([`Placement::Last`]) and the dispatch
//! order during a tick. Removal splices the order, preserving the relative
//! order of survivors; re-inserting an identity removes its old slot before
//! appending, so the order never carries a stale duplicate.

use alloc::collections::BTreeMap;
use alloc::vec::Vec;
use core::error::Error;
use core::fmt;
use core::str::FromStr;

use crate::runner::{Persist, RunnerId, SharedRunner};

/// Where a newly scheduled runner is placed on the timeline.
///
/// Every mode except [`Absolute`](Self::Absolute) treats the schedule call's
/// `delay` as an additional wait added on top of the resolved anchor;
/// `Absolute` consumes the delay *as* the anchor.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Placement {
    /// Anchor at the current timeline end, chaining after everything
    /// previously scheduled (regardless of actual finish times — see
    /// [`Timeline::end_time`](crate::timeline::Timeline::end_time)).
    #[default]
    Last,
    /// The delay *is* the absolute start time.
    Absolute,
    /// Anchor at the current playhead.
    Now,
    /// Anchor at the runner's own previous start on this timeline, shifting
    /// its prior placement without touching other runners. Anchors at 0 if
    /// the runner has no prior entry.
    Relative,
}

impl FromStr for Placement {
    type Err = ParsePlacementError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "last" | "after" => Ok(Self::Last),
            "absolute" | "start" => Ok(Self::Absolute),
            "now" => Ok(Self::Now),
            "relative" => Ok(Self::Relative),
            _ => Err(ParsePlacementError),
        }
    }
}

/// The placement mode string was not one of
/// `last` / `after` / `absolute` / `start` / `now` / `relative`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ParsePlacementError;

impl fmt::Display for ParsePlacementError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(
            "invalid placement mode (expected last, after, absolute, start, now, or relative)",
        )
    }
}

impl Error for ParsePlacementError {}

/// One scheduled runner as seen through the read-only diagnostic snapshot.
#[derive(Clone, Debug)]
pub struct ScheduledRunner {
    /// Absolute playhead time at which the runner's local time 0 aligns.
    pub start: f64,
    /// The runner's duration at snapshot time.
    pub duration: f64,
    /// `start + duration`.
    pub end: f64,
    /// The runner itself.
    pub runner: SharedRunner,
}

/// A runner's placement on a timeline.
#[derive(Clone, Debug)]
pub(crate) struct ScheduleEntry {
    /// Absolute playhead time at which the runner's local time 0 aligns.
    pub(crate) start: f64,
    /// Persistence resolved at schedule time; immutable for this entry.
    pub(crate) persist: Persist,
    /// Non-owning share of the runner.
    pub(crate) runner: SharedRunner,
}

/// Identity-keyed placement entries plus the scheduling order.
///
/// Invariant: every identity in `order` has exactly one entry in `entries`
/// and vice versa.
#[derive(Debug, Default)]
pub(crate) struct ScheduleTable {
    entries: BTreeMap<RunnerId, ScheduleEntry>,
    order: Vec<RunnerId>,
}

impl ScheduleTable {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Stores `entry` for `id` and appends `id` to the scheduling order.
    ///
    /// A previous entry for the same identity is replaced and its old order
    /// slot removed first, so re-scheduling never duplicates the identity.
    pub(crate) fn insert(&mut self, id: RunnerId, entry: ScheduleEntry) {
        if self.entries.insert(id, entry).is_some() {
            self.order.retain(|&existing| existing != id);
        }
        self.order.push(id);
    }

    /// Removes the entry and order slot for `id`, preserving the relative
    /// order of survivors. Returns the entry, or `None` if not present.
    pub(crate) fn remove(&mut self, id: RunnerId) -> Option<ScheduleEntry> {
        let entry = self.entries.remove(&id);
        if entry.is_some() {
            self.order.retain(|&existing| existing != id);
        }
        entry
    }

    pub(crate) fn get(&self, id: RunnerId) -> Option<&ScheduleEntry> {
        self.entries.get(&id)
    }

    /// The scheduling order, oldest placement first.
    pub(crate) fn order(&self) -> &[RunnerId] {
        &self.order
    }

    /// The last entry in scheduling order (not the last-finishing one).
    pub(crate) fn last(&self) -> Option<&ScheduleEntry> {
        self.order.last().and_then(|id| self.entries.get(id))
    }

    pub(crate) fn len(&self) -> usize {
        self.order.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Read-only view of all entries, sorted by runner identity.
    pub(crate) fn snapshot(&self) -> Vec<ScheduledRunner> {
        // BTreeMap iteration is already identity-sorted.
        self.entries
            .values()
            .map(|entry| {
                let duration = entry.runner.borrow().duration();
                ScheduledRunner {
                    start: entry.start,
                    duration,
                    end: entry.start + duration,
                    runner: entry.runner.clone(),
                }
            })
            .collect()
    }
}

// Copyright 2026 the Cadence Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Compact binary event recording and decoding.
//!
//! [`RecorderSink`] implements [`TraceSink`] and encodes events into a
//! `Vec<u8>` as fixed-size little-endian records (`f64` via `to_bits`).
//! [`decode`] reads them back as an iterator of [`RecordedEvent`], ending
//! cleanly on truncated input.

use cadence_core::runner::RunnerId;
use cadence_core::trace::{ContinueEvent, EvictEvent, StepEvent, TickEvent, TraceSink};

// ---------------------------------------------------------------------------
// Event type discriminants
// ---------------------------------------------------------------------------

const TAG_TICK: u8 = 1;
const TAG_STEP: u8 = 2;
const TAG_EVICT: u8 = 3;
const TAG_CONTINUE: u8 = 4;

// ---------------------------------------------------------------------------
// RecorderSink
// ---------------------------------------------------------------------------

/// A [`TraceSink`] that encodes events into a compact binary buffer.
#[derive(Debug, Default)]
pub struct RecorderSink {
    buf: Vec<u8>,
}

impl RecorderSink {
    /// Creates an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a view of the recorded bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Consumes the recorder and returns the recorded bytes.
    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    // -- encoding helpers --------------------------------------------------

    fn write_u8(&mut self, v: u8) {
        self.buf.push(v);
    }

    fn write_u64(&mut self, v: u64) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    fn write_f64(&mut self, v: f64) {
        self.write_u64(v.to_bits());
    }

    fn write_bool(&mut self, v: bool) {
        self.write_u8(u8::from(v));
    }
}

impl TraceSink for RecorderSink {
    fn on_tick(&mut self, e: &TickEvent) {
        self.write_u8(TAG_TICK);
        self.write_bool(e.immediate);
        self.write_f64(e.source_now);
        self.write_f64(e.dt_source);
        self.write_f64(e.dt_tick);
        self.write_f64(e.playhead);
    }

    fn on_step(&mut self, e: &StepEvent) {
        self.write_u8(TAG_STEP);
        self.write_u64(e.runner.raw());
        self.write_f64(e.dt);
        self.write_bool(e.done);
        self.write_f64(e.playhead);
    }

    fn on_evict(&mut self, e: &EvictEvent) {
        self.write_u8(TAG_EVICT);
        self.write_u64(e.runner.raw());
        self.write_f64(e.finish_time);
        self.write_f64(e.playhead);
    }

    fn on_continue(&mut self, e: &ContinueEvent) {
        self.write_u8(TAG_CONTINUE);
        self.write_bool(e.rearm);
        self.write_bool(e.work_remains);
        self.write_f64(e.playhead);
    }
}

// ---------------------------------------------------------------------------
// Decoder
// ---------------------------------------------------------------------------

/// A decoded event from a binary recording.
#[derive(Clone, Debug, PartialEq)]
pub enum RecordedEvent {
    /// A [`TickEvent`].
    Tick(TickEvent),
    /// A [`StepEvent`].
    Step(StepEvent),
    /// An [`EvictEvent`].
    Evict(EvictEvent),
    /// A [`ContinueEvent`].
    Continue(ContinueEvent),
}

/// Decodes a byte slice produced by [`RecorderSink`] into an iterator of
/// [`RecordedEvent`].
pub fn decode(bytes: &[u8]) -> DecodeIter<'_> {
    DecodeIter {
        data: bytes,
        pos: 0,
    }
}

/// Iterator over decoded events.
#[derive(Debug)]
pub struct DecodeIter<'a> {
    data: &'a [u8],
    pos: usize,
}

impl DecodeIter<'_> {
    fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    fn read_u8(&mut self) -> Option<u8> {
        if self.remaining() < 1 {
            return None;
        }
        let v = self.data[self.pos];
        self.pos += 1;
        Some(v)
    }

    fn read_u64(&mut self) -> Option<u64> {
        if self.remaining() < 8 {
            return None;
        }
        let v = u64::from_le_bytes(self.data[self.pos..self.pos + 8].try_into().ok()?);
        self.pos += 8;
        Some(v)
    }

    fn read_f64(&mut self) -> Option<f64> {
        self.read_u64().map(f64::from_bits)
    }

    fn read_bool(&mut self) -> Option<bool> {
        self.read_u8().map(|v| v != 0)
    }

    fn decode_tick(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::Tick(TickEvent {
            immediate: self.read_bool()?,
            source_now: self.read_f64()?,
            dt_source: self.read_f64()?,
            dt_tick: self.read_f64()?,
            playhead: self.read_f64()?,
        }))
    }

    fn decode_step(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::Step(StepEvent {
            runner: RunnerId::from_raw(self.read_u64()?),
            dt: self.read_f64()?,
            done: self.read_bool()?,
            playhead: self.read_f64()?,
        }))
    }

    fn decode_evict(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::Evict(EvictEvent {
            runner: RunnerId::from_raw(self.read_u64()?),
            finish_time: self.read_f64()?,
            playhead: self.read_f64()?,
        }))
    }

    fn decode_continue(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::Continue(ContinueEvent {
            rearm: self.read_bool()?,
            work_remains: self.read_bool()?,
            playhead: self.read_f64()?,
        }))
    }
}

impl Iterator for DecodeIter<'_> {
    type Item = RecordedEvent;

    fn next(&mut self) -> Option<Self::Item> {
        let tag = self.read_u8()?;
        match tag {
            TAG_TICK => self.decode_tick(),
            TAG_STEP => self.decode_step(),
            TAG_EVICT => self.decode_evict(),
            TAG_CONTINUE => self.decode_continue(),
            _ => None, // unknown tag → stop iteration
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_tick() -> TickEvent {
        TickEvent {
            immediate: false,
            source_now: 16.7,
            dt_source: 16.7,
            dt_tick: 33.4,
            playhead: 33.4,
        }
    }

    fn sample_step() -> StepEvent {
        StepEvent {
            runner: RunnerId::from_raw(7),
            dt: 16.7,
            done: false,
            playhead: 33.4,
        }
    }

    #[test]
    fn round_trip_tick() {
        let mut rec = RecorderSink::new();
        let orig = sample_tick();
        rec.on_tick(&orig);

        let events: Vec<_> = decode(rec.as_bytes()).collect();
        assert_eq!(events, vec![RecordedEvent::Tick(orig)]);
    }

    #[test]
    fn round_trip_step() {
        let mut rec = RecorderSink::new();
        let orig = sample_step();
        rec.on_step(&orig);

        let events: Vec<_> = decode(rec.as_bytes()).collect();
        assert_eq!(events, vec![RecordedEvent::Step(orig)]);
    }

    #[test]
    fn round_trip_evict_and_continue() {
        let mut rec = RecorderSink::new();
        let evict = EvictEvent {
            runner: RunnerId::from_raw(3),
            finish_time: 100.0,
            playhead: 105.5,
        };
        let cont = ContinueEvent {
            rearm: false,
            work_remains: false,
            playhead: 105.5,
        };
        rec.on_evict(&evict);
        rec.on_continue(&cont);

        let events: Vec<_> = decode(rec.as_bytes()).collect();
        assert_eq!(
            events,
            vec![RecordedEvent::Evict(evict), RecordedEvent::Continue(cont)]
        );
    }

    #[test]
    fn round_trip_mixed_sequence_in_order() {
        let mut rec = RecorderSink::new();
        rec.on_tick(&sample_tick());
        rec.on_step(&sample_step());
        rec.on_continue(&ContinueEvent {
            rearm: true,
            work_remains: true,
            playhead: 33.4,
        });

        let events: Vec<_> = decode(rec.as_bytes()).collect();
        assert_eq!(events.len(), 3);
        assert!(matches!(events[0], RecordedEvent::Tick(_)));
        assert!(matches!(events[1], RecordedEvent::Step(_)));
        assert!(matches!(events[2], RecordedEvent::Continue(_)));
    }

    #[test]
    fn empty_buffer_decodes_to_nothing() {
        let events: Vec<_> = decode(&[]).collect();
        assert!(events.is_empty());
    }

    #[test]
    fn truncated_record_ends_iteration() {
        let mut rec = RecorderSink::new();
        rec.on_tick(&sample_tick());
        let bytes = rec.into_bytes();

        // Chop the last field in half.
        let events: Vec<_> = decode(&bytes[..bytes.len() - 4]).collect();
        assert!(events.is_empty(), "partial record must not decode");
    }

    #[test]
    fn negative_and_fractional_floats_survive() {
        let mut rec = RecorderSink::new();
        let orig = TickEvent {
            immediate: true,
            source_now: 0.0,
            dt_source: 0.0,
            dt_tick: -7.25,
            playhead: 0.125,
        };
        rec.on_tick(&orig);

        let events: Vec<_> = decode(rec.as_bytes()).collect();
        assert_eq!(events, vec![RecordedEvent::Tick(orig)]);
    }
}

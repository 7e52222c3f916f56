// Copyright 2026 the Cadence Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Chrome Trace Event Format exporter.
//!
//! [`export`] reads recorded bytes from a
//! [`RecorderSink`](super::recorder::RecorderSink) and writes
//! [Chrome Trace Event Format][spec] JSON to the given writer. Timestamps
//! are placed on the *virtual* time axis: the playhead in milliseconds,
//! converted to the format's microseconds.
//!
//! [spec]: https://docs.google.com/document/d/1CvAClvFfyA5R-PhYUmn5OOQtYMH4h6I0nSsKchNAySU

use std::io::{self, Write};

use serde_json::{Value, json};

use crate::recorder::{RecordedEvent, decode};

/// Exports recorded events as Chrome Trace Event Format JSON.
///
/// The output is a complete JSON array of trace event objects, suitable for
/// loading into `chrome://tracing` or [Perfetto](https://ui.perfetto.dev/).
pub fn export(bytes: &[u8], writer: &mut dyn Write) -> io::Result<()> {
    let mut events: Vec<Value> = Vec::new();

    for recorded in decode(bytes) {
        match recorded {
            RecordedEvent::Tick(e) => {
                events.push(json!({
                    "ph": "i",
                    "name": "Tick",
                    "cat": "Timeline",
                    "ts": ms_to_us(e.playhead),
                    "pid": 0,
                    "tid": 0,
                    "s": "g",
                    "args": {
                        "immediate": e.immediate,
                        "source_now": e.source_now,
                        "dt_source": e.dt_source,
                        "dt_tick": e.dt_tick,
                    }
                }));
            }
            RecordedEvent::Step(e) => {
                events.push(json!({
                    "ph": "i",
                    "name": "Step",
                    "cat": "Runner",
                    "ts": ms_to_us(e.playhead),
                    "pid": 0,
                    "tid": e.runner.raw(),
                    "s": "t",
                    "args": {
                        "runner": e.runner.raw(),
                        "dt": e.dt,
                        "done": e.done,
                    }
                }));
            }
            RecordedEvent::Evict(e) => {
                events.push(json!({
                    "ph": "i",
                    "name": "Evict",
                    "cat": "Runner",
                    "ts": ms_to_us(e.playhead),
                    "pid": 0,
                    "tid": e.runner.raw(),
                    "s": "t",
                    "args": {
                        "runner": e.runner.raw(),
                        "finish_time": e.finish_time,
                    }
                }));
            }
            RecordedEvent::Continue(e) => {
                events.push(json!({
                    "ph": "i",
                    "name": "Continue",
                    "cat": "Timeline",
                    "ts": ms_to_us(e.playhead),
                    "pid": 0,
                    "tid": 0,
                    "s": "g",
                    "args": {
                        "rearm": e.rearm,
                        "work_remains": e.work_remains,
                    }
                }));
            }
        }
    }

    serde_json::to_writer_pretty(writer, &events)?;
    Ok(())
}

fn ms_to_us(ms: f64) -> f64 {
    ms * 1000.0
}

#[cfg(test)]
mod tests {
    use cadence_core::runner::RunnerId;
    use cadence_core::trace::{ContinueEvent, StepEvent, TickEvent, TraceSink};

    use crate::recorder::RecorderSink;

    use super::*;

    #[test]
    fn export_produces_valid_json() {
        let mut rec = RecorderSink::new();
        rec.on_tick(&TickEvent {
            immediate: false,
            source_now: 16.0,
            dt_source: 16.0,
            dt_tick: 16.0,
            playhead: 16.0,
        });
        rec.on_step(&StepEvent {
            runner: RunnerId::from_raw(5),
            dt: 16.0,
            done: false,
            playhead: 16.0,
        });
        rec.on_continue(&ContinueEvent {
            rearm: true,
            work_remains: true,
            playhead: 16.0,
        });

        let mut out = Vec::new();
        export(rec.as_bytes(), &mut out).unwrap();
        let json_str = String::from_utf8(out).unwrap();

        // Should parse as a JSON array.
        let parsed: Vec<Value> = serde_json::from_str(&json_str).unwrap();
        assert_eq!(parsed.len(), 3);

        assert_eq!(parsed[0]["ph"], "i");
        assert_eq!(parsed[0]["name"], "Tick");
        assert_eq!(parsed[0]["ts"], 16_000.0);

        assert_eq!(parsed[1]["name"], "Step");
        assert_eq!(parsed[1]["args"]["runner"], 5);

        assert_eq!(parsed[2]["name"], "Continue");
        assert_eq!(parsed[2]["args"]["rearm"], true);
    }

    #[test]
    fn export_empty_recording() {
        let mut out = Vec::new();
        export(&[], &mut out).unwrap();
        let json_str = String::from_utf8(out).unwrap();
        let parsed: Vec<Value> = serde_json::from_str(&json_str).unwrap();
        assert!(parsed.is_empty());
    }
}

// Copyright 2026 the Cadence Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Recording and Chrome trace export for cadence diagnostics.
//!
//! Install a [`RecorderSink`](recorder::RecorderSink) on a timeline (built
//! with the core's `trace` feature), drive it, then feed the recorded bytes
//! to [`chrome::export`] to get a JSON file loadable in `chrome://tracing`
//! or [Perfetto](https://ui.perfetto.dev/).

pub mod chrome;
pub mod recorder;

// Copyright 2026 the Ductus Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Chrome Trace Event Format exporter.
//!
//! [`export`] reads recorded bytes from a [`RecorderSink`](super::recorder::RecorderSink)
//! and writes [Chrome Trace Event Format][format] JSON to the given writer.
//!
//! Frame phases land on thread 0, render commands on thread 1, and input
//! batches on thread 2.
//!
//! [format]: https://docs.google.com/document/d/1CvAClvFfyA5R-PhYUmn5OOQtYMH4h6I0nSsKchNAySU

use std::io::{self, Write};

use serde_json::{Value, json};

use crate::recorder::{RecordedEvent, decode};

const TID_FRAME: u32 = 0;
const TID_COMMANDS: u32 = 1;
const TID_INPUT: u32 = 2;

/// Exports recorded events as Chrome Trace Event Format JSON.
///
/// The output is a complete JSON array of trace event objects, suitable for
/// loading into `chrome://tracing` or [Perfetto](https://ui.perfetto.dev/).
pub fn export(bytes: &[u8], writer: &mut dyn Write) -> io::Result<()> {
    let events: Vec<Value> = decode(bytes).map(to_json).collect();
    serde_json::to_writer_pretty(writer, &events)?;
    Ok(())
}

fn to_json(recorded: RecordedEvent) -> Value {
    match recorded {
        RecordedEvent::InputBatch(e) => json!({
            "ph": "i",
            "name": format!("Touch{:?}", e.phase),
            "cat": "Input",
            "ts": nanos_to_us(e.timestamp.nanos()),
            "pid": 0,
            "tid": TID_INPUT,
            "s": "t",
            "args": {
                "accepted": e.accepted,
                "rejected": e.rejected,
                "dropped": e.dropped,
            }
        }),
        RecordedEvent::FrameBegin(e) => json!({
            "ph": "i",
            "name": "FrameBegin",
            "cat": "Scheduler",
            "ts": nanos_to_us(e.now.nanos()),
            "pid": 0,
            "tid": TID_FRAME,
            "s": "g",
            "args": {
                "frame_index": e.frame_index,
                "queued": e.queued,
            }
        }),
        RecordedEvent::PhaseBegin(e) => json!({
            "ph": "B",
            "name": e.phase.name(),
            "cat": "Frame",
            "ts": nanos_to_us(e.timestamp.nanos()),
            "pid": 0,
            "tid": TID_FRAME,
            "args": {
                "frame_index": e.frame_index,
            }
        }),
        RecordedEvent::PhaseEnd(e) => json!({
            "ph": "E",
            "name": e.phase.name(),
            "cat": "Frame",
            "ts": nanos_to_us(e.timestamp.nanos()),
            "pid": 0,
            "tid": TID_FRAME,
            "args": {
                "frame_index": e.frame_index,
            }
        }),
        RecordedEvent::Command(e) => json!({
            "ph": "X",
            "name": format!("{:?}", e.kind),
            "cat": "Command",
            "ts": nanos_to_us(e.start.nanos()),
            "dur": nanos_to_us(e.end.saturating_duration_since(e.start).nanos()),
            "pid": 0,
            "tid": TID_COMMANDS,
            "args": {
                "frame_index": e.frame_index,
                "priority": e.priority,
                "failed": e.failed,
            }
        }),
        RecordedEvent::FrameSummary(s) => json!({
            "ph": "i",
            "name": "FrameSummary",
            "cat": "Summary",
            "ts": nanos_to_us(s.now.nanos()),
            "pid": 0,
            "tid": TID_FRAME,
            "s": "g",
            "args": {
                "frame_index": s.frame_index,
                "budget_us": nanos_to_us(s.budget_ns),
                "execute_us": nanos_to_us(s.execute_ns),
                "composite_us": nanos_to_us(s.composite_ns),
                "present_us": nanos_to_us(s.present_ns),
                "executed": s.executed,
                "deferred": s.deferred,
                "failed": s.failed,
                "over_budget": s.over_budget,
            }
        }),
    }
}

fn nanos_to_us(nanos: u64) -> f64 {
    nanos as f64 / 1000.0
}

// Copyright 2026 the Ductus Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Human-readable trace output.
//!
//! [`PrettyPrintSink`] implements [`TraceSink`] and writes one line per event
//! to a [`Write`](std::io::Write) destination (default: stderr). Timestamps
//! are printed in microseconds.

use std::io::Write;

use ductus_core::time::HostTime;
use ductus_core::trace::{
    CommandEvent, FrameBeginEvent, FrameSummary, InputBatchEvent, PhaseBeginEvent, PhaseEndEvent,
    TraceSink,
};

/// Writes human-readable trace lines to a [`Write`](std::io::Write) destination.
pub struct PrettyPrintSink<W: Write = Box<dyn Write>> {
    writer: W,
    commands: bool,
}

impl<W: Write> std::fmt::Debug for PrettyPrintSink<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrettyPrintSink")
            .field("commands", &self.commands)
            .finish_non_exhaustive()
    }
}

impl PrettyPrintSink {
    /// Creates a sink that writes to stderr.
    #[must_use]
    pub fn stderr() -> Self {
        Self::new(Box::new(std::io::stderr()))
    }

    /// Creates a sink that writes to a boxed writer.
    #[must_use]
    pub fn new(writer: Box<dyn Write>) -> Self {
        Self::with_writer(writer)
    }
}

impl<W: Write> PrettyPrintSink<W> {
    /// Creates a sink that writes to the given destination.
    #[must_use]
    pub fn with_writer(writer: W) -> Self {
        Self {
            writer,
            commands: true,
        }
    }

    /// Whether a line is written for every render command. On by default;
    /// busy frames can produce hundreds.
    #[must_use]
    pub fn with_commands(mut self, commands: bool) -> Self {
        self.commands = commands;
        self
    }

    /// Consumes the sink and returns the writer.
    pub fn into_inner(self) -> W {
        self.writer
    }
}

fn us(t: HostTime) -> f64 {
    t.nanos() as f64 / 1000.0
}

impl<W: Write> TraceSink for PrettyPrintSink<W> {
    fn on_input_batch(&mut self, e: &InputBatchEvent) {
        let _ = writeln!(
            self.writer,
            "[input] {:?} at {:.1}µs accepted={} rejected={} dropped={}",
            e.phase,
            us(e.timestamp),
            e.accepted,
            e.rejected,
            e.dropped,
        );
    }

    fn on_frame_begin(&mut self, e: &FrameBeginEvent) {
        let _ = writeln!(
            self.writer,
            "[frame] frame={} now={:.1}µs queued={}",
            e.frame_index,
            us(e.now),
            e.queued,
        );
    }

    fn on_phase_begin(&mut self, e: &PhaseBeginEvent) {
        let _ = writeln!(
            self.writer,
            "[phase:begin] frame={} {} at {:.1}µs",
            e.frame_index,
            e.phase.name(),
            us(e.timestamp),
        );
    }

    fn on_phase_end(&mut self, e: &PhaseEndEvent) {
        let _ = writeln!(
            self.writer,
            "[phase:end] frame={} {} at {:.1}µs",
            e.frame_index,
            e.phase.name(),
            us(e.timestamp),
        );
    }

    fn on_command(&mut self, e: &CommandEvent) {
        if !self.commands {
            return;
        }
        let status = if e.failed { "FAILED" } else { "ok" };
        let _ = writeln!(
            self.writer,
            "[command] frame={} {:?} priority={} took={:.1}µs {status}",
            e.frame_index,
            e.kind,
            e.priority,
            e.end.saturating_duration_since(e.start).nanos() as f64 / 1000.0,
        );
    }

    fn on_frame_summary(&mut self, s: &FrameSummary) {
        let budget = if s.over_budget { "OVER" } else { "ok" };
        let _ = writeln!(
            self.writer,
            "[summary] frame={} execute={:.1}µs composite={:.1}µs present={:.1}µs \
             executed={} deferred={} failed={} budget={budget}",
            s.frame_index,
            s.execute_ns as f64 / 1000.0,
            s.composite_ns as f64 / 1000.0,
            s.present_ns as f64 / 1000.0,
            s.executed,
            s.deferred,
            s.failed,
        );
    }
}

#[cfg(test)]
mod tests {
    use ductus_core::trace::{CommandKind, TouchPhase};

    use super::*;

    fn command() -> CommandEvent {
        CommandEvent {
            frame_index: 3,
            kind: CommandKind::Stroke,
            priority: 2,
            start: HostTime(1_000),
            end: HostTime(3_500),
            failed: false,
        }
    }

    #[test]
    fn pretty_print_frame() {
        let mut sink = PrettyPrintSink::with_writer(Vec::<u8>::new());
        sink.on_frame_begin(&FrameBeginEvent {
            frame_index: 3,
            now: HostTime(1_000_000),
            queued: 4,
        });
        sink.on_command(&command());
        sink.on_input_batch(&InputBatchEvent {
            phase: TouchPhase::Move,
            timestamp: HostTime(2_000),
            accepted: 2,
            rejected: 0,
            dropped: 1,
        });
        let output = String::from_utf8(sink.into_inner()).unwrap();
        assert!(output.contains("[frame] frame=3"), "got: {output}");
        assert!(output.contains("queued=4"), "got: {output}");
        assert!(output.contains("Stroke priority=2 took=2.5µs ok"), "got: {output}");
        assert!(output.contains("[input] Move"), "got: {output}");
    }

    #[test]
    fn command_lines_can_be_muted() {
        let mut sink = PrettyPrintSink::with_writer(Vec::<u8>::new()).with_commands(false);
        sink.on_command(&command());
        assert!(sink.into_inner().is_empty());
    }
}

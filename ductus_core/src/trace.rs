// Copyright 2026 the Ductus Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tracing and diagnostics for the input and render loop.
//!
//! This module provides a [`TraceSink`] trait with per-event methods that the
//! input processor and the render engine call at each stage. All method
//! bodies default to no-ops, so implementing only the events you care about
//! is fine.
//!
//! [`Tracer`] wraps an optional `&mut dyn TraceSink`. When the `trace` feature
//! is **off**, every `Tracer` method compiles to nothing. When **on**, each
//! method performs a single `Option` branch before dispatching.
//!
//! [`FrameSummaryBuilder`] collects phase timestamps during a frame and
//! produces a [`FrameSummary`] at the end.
//!
//! Structured log output (drops, rejections, failures) goes through the
//! `tracing` crate instead; this module is for machine-readable timelines.

use crate::time::HostTime;

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// Which phase of a frame is being measured.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PhaseKind {
    /// Feeding a batch of raw touches through the input processor.
    Input,
    /// Draining the render queue within the frame budget.
    Execute,
    /// Combining layer snapshots into the composite surface.
    Composite,
    /// Producing the main surface for display.
    Present,
}

impl PhaseKind {
    /// Every phase, in frame order.
    pub const ALL: [Self; 4] = [Self::Input, Self::Execute, Self::Composite, Self::Present];

    /// Short lowercase name, used by text and JSON exporters.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Input => "input",
            Self::Execute => "execute",
            Self::Composite => "composite",
            Self::Present => "present",
        }
    }
}

/// Which kind of render command was executed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CommandKind {
    /// A stroke, tessellated and drawn.
    Stroke,
    /// A pre-built path.
    Path,
    /// A layer composite.
    Composite,
}

/// Which touch callback a batch came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TouchPhase {
    /// Contacts began.
    Begin,
    /// Contacts moved.
    Move,
    /// Contacts lifted.
    End,
    /// Contacts were cancelled by the platform.
    Cancel,
}

// ---------------------------------------------------------------------------
// Event structs
// ---------------------------------------------------------------------------

/// Emitted after the input processor handled one batch of raw touches.
#[derive(Clone, Copy, Debug)]
pub struct InputBatchEvent {
    /// Which callback delivered the batch.
    pub phase: TouchPhase,
    /// Host time of the newest sample in the batch.
    pub timestamp: HostTime,
    /// Samples that reached a stroke or gesture.
    pub accepted: u32,
    /// Samples rejected as palm contacts.
    pub rejected: u32,
    /// Malformed samples that were dropped.
    pub dropped: u32,
}

/// Emitted when a frame tick starts.
#[derive(Clone, Copy, Debug)]
pub struct FrameBeginEvent {
    /// Monotonic frame counter.
    pub frame_index: u64,
    /// Host time when the tick started.
    pub now: HostTime,
    /// Commands waiting in the render queue.
    pub queued: u32,
}

/// Marks the beginning of a frame phase.
#[derive(Clone, Copy, Debug)]
pub struct PhaseBeginEvent {
    /// Frame counter.
    pub frame_index: u64,
    /// Which phase is starting.
    pub phase: PhaseKind,
    /// Host time at the start of the phase.
    pub timestamp: HostTime,
}

/// Marks the end of a frame phase.
#[derive(Clone, Copy, Debug)]
pub struct PhaseEndEvent {
    /// Frame counter.
    pub frame_index: u64,
    /// Which phase is ending.
    pub phase: PhaseKind,
    /// Host time at the end of the phase.
    pub timestamp: HostTime,
}

/// Emitted after a single render command ran.
#[derive(Clone, Copy, Debug)]
pub struct CommandEvent {
    /// Frame counter.
    pub frame_index: u64,
    /// What was executed.
    pub kind: CommandKind,
    /// Priority level, `0` (low) to `3` (immediate).
    pub priority: u8,
    /// Host time when execution began.
    pub start: HostTime,
    /// Host time when execution finished.
    pub end: HostTime,
    /// Whether the command failed.
    pub failed: bool,
}

/// Per-frame summary produced by [`FrameSummaryBuilder`].
#[derive(Clone, Copy, Debug, Default)]
pub struct FrameSummary {
    /// Frame counter.
    pub frame_index: u64,
    /// Host time when the tick started.
    pub now: HostTime,
    /// Frame budget in nanoseconds.
    pub budget_ns: u64,
    /// Input phase duration in nanoseconds (0 if not measured).
    pub input_ns: u64,
    /// Execute phase duration in nanoseconds (0 if not measured).
    pub execute_ns: u64,
    /// Composite phase duration in nanoseconds (0 if not measured).
    pub composite_ns: u64,
    /// Present phase duration in nanoseconds (0 if not measured).
    pub present_ns: u64,
    /// Commands executed this frame.
    pub executed: u32,
    /// Commands left queued for a later frame.
    pub deferred: u32,
    /// Commands that failed.
    pub failed: u32,
    /// Whether the whole frame ran past its budget.
    pub over_budget: bool,
}

// ---------------------------------------------------------------------------
// TraceSink trait
// ---------------------------------------------------------------------------

/// Receives trace events from the input processor and render engine.
///
/// All methods have default no-op implementations, so you only need to
/// override the events you care about.
pub trait TraceSink {
    /// Called after an input batch was processed.
    fn on_input_batch(&mut self, e: &InputBatchEvent) {
        _ = e;
    }

    /// Called when a frame tick starts.
    fn on_frame_begin(&mut self, e: &FrameBeginEvent) {
        _ = e;
    }

    /// Called at the beginning of a frame phase.
    fn on_phase_begin(&mut self, e: &PhaseBeginEvent) {
        _ = e;
    }

    /// Called at the end of a frame phase.
    fn on_phase_end(&mut self, e: &PhaseEndEvent) {
        _ = e;
    }

    /// Called after each executed render command.
    fn on_command(&mut self, e: &CommandEvent) {
        _ = e;
    }

    /// Called with a per-frame summary.
    fn on_frame_summary(&mut self, s: &FrameSummary) {
        _ = s;
    }
}

/// A [`TraceSink`] that discards all events.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopSink;

impl TraceSink for NoopSink {}

// ---------------------------------------------------------------------------
// Tracer wrapper
// ---------------------------------------------------------------------------

/// Thin wrapper around an optional [`TraceSink`].
///
/// When the `trace` feature is **off**, every method compiles to nothing. When
/// **on**, each method checks the inner `Option` (one branch) before
/// dispatching to the sink.
pub struct Tracer<'a> {
    #[cfg(feature = "trace")]
    sink: Option<&'a mut dyn TraceSink>,
    #[cfg(not(feature = "trace"))]
    _marker: core::marker::PhantomData<&'a mut dyn TraceSink>,
}

impl core::fmt::Debug for Tracer<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Tracer").finish_non_exhaustive()
    }
}

impl<'a> Tracer<'a> {
    /// Creates a tracer that dispatches to the given sink.
    #[inline]
    #[must_use]
    pub fn new(sink: &'a mut dyn TraceSink) -> Self {
        #[cfg(feature = "trace")]
        {
            Self { sink: Some(sink) }
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = sink;
            Self {
                _marker: core::marker::PhantomData,
            }
        }
    }

    /// Creates a tracer that discards all events.
    #[inline]
    #[must_use]
    pub fn none() -> Self {
        #[cfg(feature = "trace")]
        {
            Self { sink: None }
        }
        #[cfg(not(feature = "trace"))]
        {
            Self {
                _marker: core::marker::PhantomData,
            }
        }
    }

    /// Emits an [`InputBatchEvent`].
    #[inline]
    pub fn input_batch(&mut self, e: &InputBatchEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_input_batch(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`FrameBeginEvent`].
    #[inline]
    pub fn frame_begin(&mut self, e: &FrameBeginEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_frame_begin(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`PhaseBeginEvent`].
    #[inline]
    pub fn phase_begin(&mut self, e: &PhaseBeginEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_phase_begin(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`PhaseEndEvent`].
    #[inline]
    pub fn phase_end(&mut self, e: &PhaseEndEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_phase_end(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`CommandEvent`].
    #[inline]
    pub fn command(&mut self, e: &CommandEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_command(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`FrameSummary`].
    #[inline]
    pub fn frame_summary(&mut self, s: &FrameSummary) {
        #[cfg(feature = "trace")]
        if let Some(sink) = &mut self.sink {
            sink.on_frame_summary(s);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = s;
        }
    }
}

// ---------------------------------------------------------------------------
// FrameSummaryBuilder
// ---------------------------------------------------------------------------

/// Collects phase timestamps during a frame and produces a [`FrameSummary`].
#[derive(Debug)]
pub struct FrameSummaryBuilder {
    summary: FrameSummary,
    phase_starts: [Option<HostTime>; 4],
    phase_ends: [Option<HostTime>; 4],
}

impl FrameSummaryBuilder {
    /// Starts building a summary for the given frame.
    #[must_use]
    pub fn new(frame_index: u64, now: HostTime, budget_ns: u64) -> Self {
        Self {
            summary: FrameSummary {
                frame_index,
                now,
                budget_ns,
                ..FrameSummary::default()
            },
            phase_starts: [None; 4],
            phase_ends: [None; 4],
        }
    }

    /// Records the start of a phase.
    pub fn phase_begin(&mut self, phase: PhaseKind, t: HostTime) {
        self.phase_starts[phase_index(phase)] = Some(t);
    }

    /// Records the end of a phase.
    pub fn phase_end(&mut self, phase: PhaseKind, t: HostTime) {
        self.phase_ends[phase_index(phase)] = Some(t);
    }

    /// Adds input processing time measured outside the frame, since the
    /// previous frame began.
    pub fn add_input_ns(&mut self, nanos: u64) {
        self.summary.input_ns = self.summary.input_ns.saturating_add(nanos);
    }

    /// Records the scheduler's counts for this frame.
    pub fn set_counts(&mut self, executed: u32, deferred: u32, failed: u32) {
        self.summary.executed = executed;
        self.summary.deferred = deferred;
        self.summary.failed = failed;
    }

    /// Consumes the builder and produces the final [`FrameSummary`].
    #[must_use]
    pub fn finish(self) -> FrameSummary {
        let mut summary = self.summary;
        summary.input_ns += self.phase_duration(PhaseKind::Input);
        summary.execute_ns = self.phase_duration(PhaseKind::Execute);
        summary.composite_ns = self.phase_duration(PhaseKind::Composite);
        summary.present_ns = self.phase_duration(PhaseKind::Present);
        let total = summary.input_ns + summary.execute_ns + summary.composite_ns + summary.present_ns;
        summary.over_budget = summary.budget_ns > 0 && total > summary.budget_ns;
        summary
    }

    fn phase_duration(&self, phase: PhaseKind) -> u64 {
        let idx = phase_index(phase);
        match (self.phase_starts[idx], self.phase_ends[idx]) {
            (Some(start), Some(end)) => end.saturating_duration_since(start).nanos(),
            _ => 0,
        }
    }
}

const fn phase_index(phase: PhaseKind) -> usize {
    match phase {
        PhaseKind::Input => 0,
        PhaseKind::Execute => 1,
        PhaseKind::Composite => 2,
        PhaseKind::Present => 3,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_measures_phases() {
        let mut b = FrameSummaryBuilder::new(3, HostTime(1_000), 8_333_333);
        b.phase_begin(PhaseKind::Execute, HostTime(1_000));
        b.phase_end(PhaseKind::Execute, HostTime(5_000));
        b.phase_begin(PhaseKind::Composite, HostTime(5_000));
        b.phase_end(PhaseKind::Composite, HostTime(6_500));
        b.set_counts(4, 2, 0);
        let s = b.finish();
        assert_eq!(s.frame_index, 3);
        assert_eq!(s.execute_ns, 4_000);
        assert_eq!(s.composite_ns, 1_500);
        assert_eq!(s.input_ns, 0, "unmeasured phase is zero");
        assert_eq!((s.executed, s.deferred, s.failed), (4, 2, 0));
        assert!(!s.over_budget);
    }

    #[test]
    fn input_time_between_frames_is_summed() {
        let mut b = FrameSummaryBuilder::new(1, HostTime(10_000), 8_333_333);
        b.add_input_ns(700);
        b.add_input_ns(300);
        b.phase_begin(PhaseKind::Input, HostTime(10_000));
        b.phase_end(PhaseKind::Input, HostTime(10_500));
        assert_eq!(b.finish().input_ns, 1_500);
    }

    #[test]
    fn builder_flags_over_budget() {
        let mut b = FrameSummaryBuilder::new(0, HostTime(0), 1_000);
        b.phase_begin(PhaseKind::Execute, HostTime(0));
        b.phase_end(PhaseKind::Execute, HostTime(2_000));
        assert!(b.finish().over_budget);
    }

    #[test]
    fn tracer_none_is_silent() {
        let mut t = Tracer::none();
        t.frame_begin(&FrameBeginEvent {
            frame_index: 0,
            now: HostTime(0),
            queued: 0,
        });
        t.phase_begin(&PhaseBeginEvent {
            frame_index: 0,
            phase: PhaseKind::Input,
            timestamp: HostTime(0),
        });
    }

    #[cfg(feature = "trace")]
    #[test]
    fn tracer_dispatches_to_sink() {
        #[derive(Default)]
        struct Counting {
            commands: u32,
            summaries: u32,
        }
        impl TraceSink for Counting {
            fn on_command(&mut self, _: &CommandEvent) {
                self.commands += 1;
            }
            fn on_frame_summary(&mut self, _: &FrameSummary) {
                self.summaries += 1;
            }
        }

        let mut sink = Counting::default();
        {
            let mut t = Tracer::new(&mut sink);
            t.command(&CommandEvent {
                frame_index: 0,
                kind: CommandKind::Stroke,
                priority: 1,
                start: HostTime(0),
                end: HostTime(10),
                failed: false,
            });
            t.frame_summary(&FrameSummary::default());
        }
        assert_eq!(sink.commands, 1);
        assert_eq!(sink.summaries, 1);
    }
}

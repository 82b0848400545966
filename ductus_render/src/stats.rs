// Copyright 2026 the Ductus Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Render statistics and the observer that receives engine events.

use ductus_core::time::HostTime;

use crate::memory::MemoryCleanupEvent;
use crate::scheduler::{CommandFailure, Ema, FrameReport};

/// A snapshot of engine performance.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct RenderStats {
    /// Smoothed frames per second, from the spacing of ticks.
    pub fps: f64,
    /// Smoothed command execution time per frame, in milliseconds.
    pub frame_time_ms: f64,
    /// Commands executed in the most recent frame.
    pub draw_calls: u32,
    /// Commands executed since initialization.
    pub total_draw_calls: u64,
    /// Bytes held by surfaces and cached snapshots.
    pub memory_bytes: u64,
    /// Smoothed time from the newest input sample to the frame that drew
    /// it, in milliseconds.
    pub input_latency_ms: f64,
    /// Frames run since initialization.
    pub frames: u64,
    /// Commands waiting in the queue.
    pub queued: usize,
}

/// Receives render engine events.
///
/// All methods have default no-op implementations.
pub trait EngineObserver {
    /// A frame finished.
    fn on_frame(&mut self, report: &FrameReport) {
        _ = report;
    }

    /// Periodic statistics.
    fn on_stats(&mut self, stats: &RenderStats) {
        _ = stats;
    }

    /// Memory pressure forced a cleanup.
    fn on_memory_cleanup(&mut self, e: &MemoryCleanupEvent) {
        _ = e;
    }

    /// A render command failed; the frame continued.
    fn on_command_failed(&mut self, failure: &CommandFailure) {
        _ = failure;
    }
}

/// An [`EngineObserver`] that ignores everything.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopEngineObserver;

impl EngineObserver for NoopEngineObserver {}

/// Accumulates per-frame measurements into [`RenderStats`].
#[derive(Clone, Debug)]
pub(crate) struct StatsTracker {
    fps: Ema,
    latency: Ema,
    last_tick: Option<HostTime>,
    frames: u64,
    draw_calls: u32,
    total_draw_calls: u64,
}

impl StatsTracker {
    pub(crate) const fn new() -> Self {
        Self {
            fps: Ema::new(0.1),
            latency: Ema::new(0.2),
            last_tick: None,
            frames: 0,
            draw_calls: 0,
            total_draw_calls: 0,
        }
    }

    /// Records a finished frame that started at `now`.
    ///
    /// `newest_input` is the timestamp of the newest input sample drawn
    /// during the frame, if any.
    pub(crate) fn record_frame(
        &mut self,
        now: HostTime,
        report: &FrameReport,
        newest_input: Option<HostTime>,
    ) {
        if let Some(prev) = self.last_tick {
            let dt = now.saturating_duration_since(prev).as_secs_f64();
            if dt > 0.0 {
                #[expect(
                    clippy::cast_possible_truncation,
                    reason = "frame rates fit in f32"
                )]
                {
                    self.fps.update((1.0 / dt) as f32);
                }
            }
        }
        if let Some(t) = newest_input {
            #[expect(
                clippy::cast_possible_truncation,
                reason = "latencies in milliseconds fit in f32"
            )]
            {
                self.latency
                    .update(now.saturating_duration_since(t).as_millis_f64() as f32);
            }
        }
        self.last_tick = Some(now);
        self.frames += 1;
        self.draw_calls = report.executed;
        self.total_draw_calls += u64::from(report.executed);
    }

    /// Forgets tick spacing, e.g. after a pause, so the gap does not count
    /// as a slow frame.
    pub(crate) fn resume(&mut self) {
        self.last_tick = None;
    }

    pub(crate) fn snapshot(&self, frame_time_ms: f64, memory_bytes: u64, queued: usize) -> RenderStats {
        RenderStats {
            fps: f64::from(self.fps.get()),
            frame_time_ms,
            draw_calls: self.draw_calls,
            total_draw_calls: self.total_draw_calls,
            memory_bytes,
            input_latency_ms: f64::from(self.latency.get()),
            frames: self.frames,
            queued,
        }
    }
}

// Copyright 2026 the Ductus Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Simulated stylus session that exercises the input, render, and tracing
//! pipeline.
//!
//! Draws one wavy stroke at 120 Hz, ticking the engine once per refresh and
//! recording events to both a
//! [`PrettyPrintSink`](ductus_debug::pretty::PrettyPrintSink) and a
//! [`RecorderSink`](ductus_debug::recorder::RecorderSink), then exports a
//! Chrome trace JSON file.

use std::fs::File;
use std::io::BufWriter;

use ductus_core::canvas::CanvasState;
use ductus_core::event::NoopObserver;
use ductus_core::input::{InputSettings, RawTouch, ToolKind, TouchId};
use ductus_core::layer::{LayerId, LayerRef};
use ductus_core::paint::{Color, Paint};
use ductus_core::time::{Clock, Duration, HostTime, ManualClock};
use ductus_core::trace::{
    CommandEvent, FrameBeginEvent, FrameSummary, InputBatchEvent, PhaseBeginEvent, PhaseEndEvent,
    TouchPhase, TraceSink, Tracer,
};
use ductus_debug::pretty::PrettyPrintSink;
use ductus_debug::recorder::RecorderSink;
use ductus_render::{DrawingSession, EngineConfig, EngineObserver, RenderStats, SurfaceTarget};
use kurbo::Point;

const FRAME_COUNT: u32 = 120;
/// Last frame with the stylus down.
const LIFT_FRAME: u32 = 90;

/// Forwards every event to two sinks.
struct Tee<'a> {
    pretty: &'a mut PrettyPrintSink,
    recorder: &'a mut RecorderSink,
}

impl TraceSink for Tee<'_> {
    fn on_input_batch(&mut self, e: &InputBatchEvent) {
        self.pretty.on_input_batch(e);
        self.recorder.on_input_batch(e);
    }
    fn on_frame_begin(&mut self, e: &FrameBeginEvent) {
        self.pretty.on_frame_begin(e);
        self.recorder.on_frame_begin(e);
    }
    fn on_phase_begin(&mut self, e: &PhaseBeginEvent) {
        self.pretty.on_phase_begin(e);
        self.recorder.on_phase_begin(e);
    }
    fn on_phase_end(&mut self, e: &PhaseEndEvent) {
        self.pretty.on_phase_end(e);
        self.recorder.on_phase_end(e);
    }
    fn on_command(&mut self, e: &CommandEvent) {
        self.pretty.on_command(e);
        self.recorder.on_command(e);
    }
    fn on_frame_summary(&mut self, s: &FrameSummary) {
        self.pretty.on_frame_summary(s);
        self.recorder.on_frame_summary(s);
    }
}

struct PrintStats;

impl EngineObserver for PrintStats {
    fn on_stats(&mut self, s: &RenderStats) {
        println!(
            "[stats] fps={:.1} frame={:.2}ms latency={:.2}ms draws={} memory={}KiB",
            s.fps,
            s.frame_time_ms,
            s.input_latency_ms,
            s.total_draw_calls,
            s.memory_bytes / 1024,
        );
    }
}

fn pen(frame: u32, t: HostTime) -> RawTouch {
    let x = 40.0 + f64::from(frame) * 8.0;
    let y = 300.0 + (f64::from(frame) * 0.15).sin() * 120.0;
    let force = 0.3 + 0.5 * (f64::from(frame) / f64::from(LIFT_FRAME));
    RawTouch::new(TouchId(1), ToolKind::Stylus, Point::new(x, y), t).with_force(force)
}

fn main() {
    let mut pretty = PrettyPrintSink::new(Box::new(std::io::stdout())).with_commands(false);
    let mut recorder = RecorderSink::new();

    let mut session = DrawingSession::new(InputSettings::default(), EngineConfig::promotion_display());
    let ratio = session
        .initialize(800, 600, 2.0)
        .expect("failed to initialize the render engine");
    session
        .engine_mut()
        .create_layer_surface(LayerId(0))
        .expect("failed to create the layer surface");
    println!("initialized at pixel ratio {ratio}");

    let canvas = CanvasState {
        paint: Paint::stroke(Color::rgb(0.1, 0.2, 0.8), 6.0),
        ..CanvasState::default()
    };
    let layers = vec![LayerRef::new(LayerId(0))];
    let clock = ManualClock::new(HostTime::from_millis(1_000));
    let interval = EngineConfig::promotion_display()
        .scheduler
        .frame_interval();

    for frame in 0..FRAME_COUNT {
        let mut tee = Tee {
            pretty: &mut pretty,
            recorder: &mut recorder,
        };
        let mut tracer = Tracer::new(&mut tee);
        let now = clock.now();
        let phase = match frame {
            0 => Some(TouchPhase::Begin),
            LIFT_FRAME => Some(TouchPhase::End),
            f if f < LIFT_FRAME => Some(TouchPhase::Move),
            _ => None,
        };
        if let Some(phase) = phase {
            session
                .touch_traced(
                    phase,
                    &[pen(frame, now)],
                    &canvas,
                    &clock,
                    &mut NoopObserver,
                    &mut tracer,
                )
                .expect("session is initialized");
        }
        if frame % 30 == 29 || frame == LIFT_FRAME {
            session
                .composite(layers.clone(), None)
                .expect("session is initialized");
        }

        clock.advance(Duration(interval.0 / 4));
        session.tick_traced(&clock, &mut PrintStats, &mut tracer);
        clock.set(HostTime(now.0 + interval.0));
    }

    let painted = session
        .engine()
        .surface(SurfaceTarget::Main)
        .map_or(0, |s| s.pixels().iter().filter(|p| p[3] > 0).count());
    println!("{painted} pixels painted on the main surface");
    session.exit();

    let path = "trace.json";
    let file = File::create(path).expect("failed to create trace.json");
    let mut writer = BufWriter::new(file);
    ductus_debug::chrome::export(recorder.as_bytes(), &mut writer)
        .expect("failed to write Chrome trace");

    println!("Wrote {path} ({FRAME_COUNT} frames)");
}

// Copyright 2026 the Ductus Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Input wired to rendering.
//!
//! A [`DrawingSession`] feeds touch batches through an [`InputProcessor`] and
//! turns the resulting stroke events into render commands:
//!
//! - stroke start and update queue a preview at [`Priority::High`], carrying
//!   the newest predictions for the ghost pass. Several updates of one stroke
//!   within a batch collapse into one preview;
//! - a completed stroke queues a commit at [`Priority::Normal`];
//! - a cancelled stroke has its preview discarded.
//!
//! Every event is also forwarded to the host's [`InputObserver`].

use ductus_core::canvas::CanvasState;
use ductus_core::event::{
    InputObserver, PredictedInputEvent, SampleDroppedEvent, StrokeEndEvent, StrokeEndReason,
    StrokeStartEvent, StrokeUpdateEvent, TouchRejectedEvent,
};
use ductus_core::input::{
    BatchSummary, GestureEvent, InputProcessor, InputSettings, PredictedPoint, RawTouch,
};
use ductus_core::layer::LayerRef;
use ductus_core::paint::Paint;
use ductus_core::stroke::Stroke;
use ductus_core::time::Clock;
use ductus_core::trace::{PhaseBeginEvent, PhaseEndEvent, PhaseKind, TouchPhase, Tracer};
use kurbo::Rect;

use crate::command::{Priority, StrokeOptions};
use crate::engine::{EngineConfig, RenderEngine};
use crate::error::RenderError;
use crate::scheduler::FrameReport;
use crate::stats::EngineObserver;

/// An input processor and a render engine driven together.
#[derive(Debug, Default)]
pub struct DrawingSession {
    input: InputProcessor,
    engine: RenderEngine,
}

impl DrawingSession {
    /// Creates a session. Call [`initialize`](Self::initialize) before
    /// feeding touches.
    #[must_use]
    pub fn new(settings: InputSettings, config: EngineConfig) -> Self {
        Self {
            input: InputProcessor::new(settings),
            engine: RenderEngine::new(config),
        }
    }

    /// See [`RenderEngine::initialize`].
    pub fn initialize(&mut self, width: u32, height: u32, pixel_ratio: f64) -> Result<f64, RenderError> {
        self.engine.initialize(width, height, pixel_ratio)
    }

    /// The input processor.
    #[must_use]
    pub fn input(&self) -> &InputProcessor {
        &self.input
    }

    /// The render engine.
    #[must_use]
    pub fn engine(&self) -> &RenderEngine {
        &self.engine
    }

    /// Mutable access to the render engine, e.g. to create layer surfaces.
    pub fn engine_mut(&mut self) -> &mut RenderEngine {
        &mut self.engine
    }

    /// Contacts going down.
    pub fn touch_begin(
        &mut self,
        touches: &[RawTouch],
        canvas: &CanvasState,
        observer: &mut dyn InputObserver,
    ) -> Result<BatchSummary, RenderError> {
        self.handle(TouchPhase::Begin, touches, canvas, observer)
    }

    /// Contacts moving.
    pub fn touch_move(
        &mut self,
        touches: &[RawTouch],
        canvas: &CanvasState,
        observer: &mut dyn InputObserver,
    ) -> Result<BatchSummary, RenderError> {
        self.handle(TouchPhase::Move, touches, canvas, observer)
    }

    /// Contacts lifting.
    pub fn touch_end(
        &mut self,
        touches: &[RawTouch],
        canvas: &CanvasState,
        observer: &mut dyn InputObserver,
    ) -> Result<BatchSummary, RenderError> {
        self.handle(TouchPhase::End, touches, canvas, observer)
    }

    /// Contacts cancelled by the platform.
    pub fn touch_cancel(
        &mut self,
        touches: &[RawTouch],
        canvas: &CanvasState,
        observer: &mut dyn InputObserver,
    ) -> Result<BatchSummary, RenderError> {
        self.handle(TouchPhase::Cancel, touches, canvas, observer)
    }

    /// Handles one touch batch inside an input phase reported to `tracer`.
    ///
    /// The phase is timed with `clock` and attributed to the next frame, and
    /// the time spent is added to that frame's summary.
    pub fn touch_traced(
        &mut self,
        phase: TouchPhase,
        touches: &[RawTouch],
        canvas: &CanvasState,
        clock: &dyn Clock,
        observer: &mut dyn InputObserver,
        tracer: &mut Tracer<'_>,
    ) -> Result<BatchSummary, RenderError> {
        if !self.engine.is_initialized() {
            return Err(RenderError::NotInitialized);
        }
        let frame_index = self.engine.frame_index();
        let start = clock.now();
        tracer.phase_begin(&PhaseBeginEvent {
            frame_index,
            phase: PhaseKind::Input,
            timestamp: start,
        });
        let result = self.handle(phase, touches, canvas, observer);
        let end = clock.now();
        if let Ok(summary) = &result {
            tracer.input_batch(&summary.to_trace_event(phase));
        }
        tracer.phase_end(&PhaseEndEvent {
            frame_index,
            phase: PhaseKind::Input,
            timestamp: end,
        });
        self.engine
            .record_input_time(end.saturating_duration_since(start));
        result
    }

    /// Feeds one batch through the input processor and queues the resulting
    /// render work.
    ///
    /// Fails with [`RenderError::NotInitialized`] before
    /// [`initialize`](Self::initialize), without touching input state.
    fn handle(
        &mut self,
        phase: TouchPhase,
        touches: &[RawTouch],
        canvas: &CanvasState,
        observer: &mut dyn InputObserver,
    ) -> Result<BatchSummary, RenderError> {
        if !self.engine.is_initialized() {
            return Err(RenderError::NotInitialized);
        }
        let mut bridge = Bridge {
            engine: &mut self.engine,
            host: observer,
            pending: None,
            error: None,
        };
        let summary = match phase {
            TouchPhase::Begin => self.input.touch_begin(touches, canvas, &mut bridge),
            TouchPhase::Move => self.input.touch_move(touches, canvas, &mut bridge),
            TouchPhase::End => self.input.touch_end(touches, canvas, &mut bridge),
            TouchPhase::Cancel => self.input.touch_cancel(touches, canvas, &mut bridge),
        };
        bridge.flush();
        match bridge.error {
            Some(e) => Err(e),
            None => Ok(summary),
        }
    }

    /// Queues a composite of `layers` at normal priority.
    pub fn composite(&mut self, layers: Vec<LayerRef>, viewport: Option<Rect>) -> Result<(), RenderError> {
        self.engine.composite(layers, viewport, Priority::Normal)
    }

    /// See [`RenderEngine::tick`].
    pub fn tick(&mut self, clock: &dyn Clock, observer: &mut dyn EngineObserver) -> Option<FrameReport> {
        self.engine.tick(clock, observer)
    }

    /// See [`RenderEngine::tick_traced`].
    pub fn tick_traced(
        &mut self,
        clock: &dyn Clock,
        observer: &mut dyn EngineObserver,
        tracer: &mut Tracer<'_>,
    ) -> Option<FrameReport> {
        self.engine.tick_traced(clock, observer, tracer)
    }

    /// Replaces the input settings. Active strokes continue.
    pub fn update_input_settings(&mut self, settings: InputSettings) {
        self.input.update_settings(settings);
    }

    /// Replaces the engine settings.
    pub fn update_engine_settings(&mut self, config: EngineConfig) {
        self.engine.update_settings(config);
    }

    /// Ends the session: active strokes are discarded without events, their
    /// previews removed, and the engine destroyed.
    pub fn exit(&mut self) {
        for stroke in self.input.reset() {
            self.engine.discard_preview(stroke);
        }
        self.engine.destroy();
    }
}

/// The newest preview of one stroke, held back until predictions for it
/// have arrived.
#[derive(Debug)]
struct PendingPreview {
    stroke: Stroke,
    paint: Paint,
    predicted: Vec<PredictedPoint>,
}

struct Bridge<'a> {
    engine: &'a mut RenderEngine,
    host: &'a mut dyn InputObserver,
    pending: Option<PendingPreview>,
    error: Option<RenderError>,
}

impl Bridge<'_> {
    fn flush(&mut self) {
        if let Some(p) = self.pending.take() {
            let result = self.engine.render_stroke(
                p.stroke,
                p.paint,
                StrokeOptions::preview(p.predicted),
                Priority::High,
            );
            self.record(result);
        }
    }

    fn record(&mut self, result: Result<(), RenderError>) {
        if let Err(e) = result
            && self.error.is_none()
        {
            self.error = Some(e);
        }
    }

    fn stage(&mut self, stroke: &Stroke, paint: Paint) {
        if self
            .pending
            .as_ref()
            .is_some_and(|p| p.stroke.id() != stroke.id())
        {
            self.flush();
        }
        self.pending = Some(PendingPreview {
            stroke: stroke.clone(),
            paint,
            predicted: Vec::new(),
        });
    }
}

impl InputObserver for Bridge<'_> {
    fn on_stroke_start(&mut self, e: &StrokeStartEvent<'_>) {
        self.stage(e.stroke, e.paint);
        self.host.on_stroke_start(e);
    }

    fn on_stroke_update(&mut self, e: &StrokeUpdateEvent<'_>) {
        self.stage(e.stroke, e.paint);
        self.host.on_stroke_update(e);
    }

    fn on_predicted_input(&mut self, e: &PredictedInputEvent<'_>) {
        if let Some(p) = &mut self.pending
            && p.stroke.id() == e.stroke
        {
            p.predicted = e.points.to_vec();
        }
        self.host.on_predicted_input(e);
    }

    fn on_stroke_end(&mut self, e: StrokeEndEvent) {
        let id = e.stroke.id();
        if self.pending.as_ref().is_some_and(|p| p.stroke.id() == id) {
            self.pending = None;
        } else {
            self.flush();
        }
        match e.reason {
            StrokeEndReason::Completed => {
                let result = self.engine.render_stroke(
                    e.stroke.clone(),
                    e.paint,
                    StrokeOptions::commit(),
                    Priority::Normal,
                );
                self.record(result);
            }
            StrokeEndReason::Cancelled => self.engine.discard_preview(id),
        }
        self.host.on_stroke_end(e);
    }

    fn on_gesture(&mut self, e: &GestureEvent) {
        self.host.on_gesture(e);
    }

    fn on_touch_rejected(&mut self, e: &TouchRejectedEvent) {
        self.host.on_touch_rejected(e);
    }

    fn on_sample_dropped(&mut self, e: &SampleDroppedEvent) {
        self.host.on_sample_dropped(e);
    }
}

#[cfg(test)]
mod tests {
    use ductus_core::input::{ToolKind, TouchId};
    use ductus_core::layer::LayerId;
    use ductus_core::paint::Color;
    use ductus_core::stroke::StrokeId;
    use ductus_core::time::{HostTime, ManualClock};
    use kurbo::Point;

    use super::*;
    use crate::command::{RenderCommand, StrokeMode, SurfaceTarget};
    use crate::stats::NoopEngineObserver;

    #[derive(Default)]
    struct Log {
        starts: u32,
        updates: u32,
        ends: Vec<(StrokeId, usize, StrokeEndReason)>,
        rejected: Vec<TouchId>,
        predicted: usize,
    }

    impl InputObserver for Log {
        fn on_stroke_start(&mut self, _e: &StrokeStartEvent<'_>) {
            self.starts += 1;
        }
        fn on_stroke_update(&mut self, _e: &StrokeUpdateEvent<'_>) {
            self.updates += 1;
            self.predicted = 0;
        }
        fn on_stroke_end(&mut self, e: StrokeEndEvent) {
            self.ends.push((e.stroke.id(), e.stroke.len(), e.reason));
        }
        fn on_predicted_input(&mut self, e: &PredictedInputEvent<'_>) {
            self.predicted = e.points.len();
        }
        fn on_touch_rejected(&mut self, e: &TouchRejectedEvent) {
            self.rejected.push(e.touch);
        }
    }

    fn stylus(x: f64, y: f64, ms: u64) -> RawTouch {
        RawTouch::new(TouchId(1), ToolKind::Stylus, Point::new(x, y), HostTime::from_millis(ms))
            .with_force(0.5)
    }

    fn session() -> DrawingSession {
        let mut s = DrawingSession::default();
        s.initialize(64, 64, 1.0).unwrap();
        s.engine_mut().create_layer_surface(LayerId(0)).unwrap();
        s
    }

    fn queued_modes(s: &DrawingSession) -> Vec<(StrokeMode, StrokeId)> {
        s.engine()
            .queued_commands()
            .filter_map(|c| match c {
                RenderCommand::Stroke(c) => Some((c.options.mode, c.stroke.id())),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn stroke_is_previewed_then_committed_and_composited() {
        let mut s = session();
        let canvas = CanvasState::default();
        let clock = ManualClock::new(HostTime(0));
        let mut log = Log::default();

        s.touch_begin(&[stylus(10.0, 20.0, 0)], &canvas, &mut log).unwrap();
        assert_eq!(queued_modes(&s), vec![(StrokeMode::Preview, StrokeId(1))]);
        s.touch_move(&[stylus(30.0, 20.0, 8)], &canvas, &mut log).unwrap();
        s.touch_move(&[stylus(50.0, 20.0, 16)], &canvas, &mut log).unwrap();
        assert_eq!(s.engine().queued(), 1, "previews of one stroke collapse");

        s.tick(&clock, &mut NoopEngineObserver).unwrap();
        assert_eq!(s.engine().previews().count(), 1);

        s.touch_end(&[stylus(50.0, 20.0, 24)], &canvas, &mut log).unwrap();
        s.composite(vec![LayerRef::new(LayerId(0))], None).unwrap();
        let report = s.tick(&clock, &mut NoopEngineObserver).unwrap();

        assert_eq!((log.starts, log.updates), (1, 2));
        assert_eq!(log.ends, vec![(StrokeId(1), 3, StrokeEndReason::Completed)]);
        assert_eq!(report.executed, 2);
        assert_eq!(s.engine().previews().count(), 0);
        let layer = s.engine().layer_surface(LayerId(0)).unwrap();
        assert!(layer.pixel(30, 20).is_some_and(|p| p[3] > 0));
        let main = s.engine().surface(SurfaceTarget::Main).unwrap();
        assert!(main.pixel(30, 20).is_some_and(|p| p[3] > 0));
        assert_eq!(main.pixel(30, 50), Some([0, 0, 0, 0]));
    }

    #[test]
    fn preview_carries_the_latest_predictions() {
        let mut s = session();
        let canvas = CanvasState::default();
        let mut log = Log::default();
        s.touch_begin(&[stylus(0.0, 0.0, 0)], &canvas, &mut log).unwrap();
        for i in 1..=6_u32 {
            let t = stylus(f64::from(i) * 4.0, 0.0, u64::from(i) * 8);
            s.touch_move(&[t], &canvas, &mut log).unwrap();
        }
        let predicted = s
            .engine()
            .queued_commands()
            .find_map(|c| match c {
                RenderCommand::Stroke(c) => Some(c.options.predicted.len()),
                _ => None,
            })
            .unwrap();
        assert_eq!(predicted, log.predicted);
    }

    #[test]
    fn cancelled_stroke_leaves_no_trace() {
        let mut s = session();
        let canvas = CanvasState::default();
        let clock = ManualClock::new(HostTime(0));
        let mut log = Log::default();
        s.touch_begin(&[stylus(10.0, 10.0, 0)], &canvas, &mut log).unwrap();
        s.touch_move(&[stylus(40.0, 10.0, 8)], &canvas, &mut log).unwrap();
        s.tick(&clock, &mut NoopEngineObserver);
        assert_eq!(s.engine().previews().count(), 1);

        s.touch_cancel(&[stylus(40.0, 10.0, 16)], &canvas, &mut log).unwrap();
        assert_eq!(log.ends[0].2, StrokeEndReason::Cancelled);
        assert_eq!(s.engine().previews().count(), 0);
        assert_eq!(s.engine().queued(), 0);

        s.tick(&clock, &mut NoopEngineObserver);
        let main = s.engine().surface(SurfaceTarget::Main).unwrap();
        assert!(main.is_clear());
        assert!(s.engine().layer_surface(LayerId(0)).unwrap().is_clear());
    }

    #[test]
    fn palm_contacts_never_reach_the_engine() {
        let mut s = session();
        let canvas = CanvasState::default();
        let mut log = Log::default();
        s.touch_begin(&[stylus(10.0, 10.0, 0)], &canvas, &mut log).unwrap();
        let palm = RawTouch::new(
            TouchId(5),
            ToolKind::Finger,
            Point::new(50.0, 40.0),
            HostTime::from_millis(40),
        )
        .with_radius(35.0);
        let summary = s.touch_begin(&[palm], &canvas, &mut log).unwrap();
        assert_eq!(summary.rejected, 1);
        assert_eq!(log.rejected, vec![TouchId(5)]);
        assert_eq!(queued_modes(&s), vec![(StrokeMode::Preview, StrokeId(1))]);
    }

    #[test]
    fn each_stroke_keeps_the_paint_it_started_with() {
        let mut s = session();
        let clock = ManualClock::new(HostTime(0));
        let red = Paint::stroke(Color::rgb(1.0, 0.0, 0.0), 4.0);
        let mut canvas = CanvasState {
            paint: red,
            ..CanvasState::default()
        };
        let mut log = Log::default();
        s.touch_begin(&[stylus(10.0, 10.0, 0)], &canvas, &mut log).unwrap();
        // The host switches brushes mid-stroke.
        canvas.paint = Paint::stroke(Color::rgb(0.0, 0.0, 1.0), 4.0);
        s.touch_move(&[stylus(20.0, 10.0, 8)], &canvas, &mut log).unwrap();
        s.touch_end(&[stylus(30.0, 10.0, 16)], &canvas, &mut log).unwrap();

        let paints: Vec<Paint> = s
            .engine()
            .queued_commands()
            .filter_map(|c| match c {
                RenderCommand::Stroke(c) => Some(c.paint),
                _ => None,
            })
            .collect();
        assert_eq!(paints, vec![red]);

        s.composite(vec![LayerRef::new(LayerId(0))], None).unwrap();
        s.tick(&clock, &mut NoopEngineObserver).unwrap();
        for surface in [
            s.engine().layer_surface(LayerId(0)),
            s.engine().surface(SurfaceTarget::Main),
        ] {
            let p = surface.and_then(|l| l.pixel(20, 10)).unwrap();
            assert!(p[0] > 0 && p[3] > 0, "drawn in red: {p:?}");
            assert_eq!(p[2], 0, "never in the live blue: {p:?}");
        }
    }

    #[cfg(feature = "trace")]
    #[test]
    fn touch_batches_are_traced_as_input_phases() {
        use ductus_core::time::{Duration, SteppingClock};
        use ductus_core::trace::{FrameSummary, InputBatchEvent, TraceSink};

        #[derive(Default)]
        struct Sink {
            phases: Vec<(PhaseKind, bool, u64)>,
            batches: Vec<InputBatchEvent>,
            summaries: Vec<FrameSummary>,
        }
        impl TraceSink for Sink {
            fn on_input_batch(&mut self, e: &InputBatchEvent) {
                self.batches.push(*e);
            }
            fn on_phase_begin(&mut self, e: &PhaseBeginEvent) {
                if e.phase == PhaseKind::Input {
                    self.phases.push((e.phase, true, e.frame_index));
                }
            }
            fn on_phase_end(&mut self, e: &PhaseEndEvent) {
                if e.phase == PhaseKind::Input {
                    self.phases.push((e.phase, false, e.frame_index));
                }
            }
            fn on_frame_summary(&mut self, s: &FrameSummary) {
                self.summaries.push(*s);
            }
        }

        let mut s = session();
        let canvas = CanvasState::default();
        let clock = SteppingClock::new(HostTime(0), Duration(1_000));
        let mut sink = Sink::default();
        let mut log = Log::default();
        {
            let mut tracer = Tracer::new(&mut sink);
            s.touch_traced(TouchPhase::Begin, &[stylus(10.0, 10.0, 0)], &canvas, &clock, &mut log, &mut tracer)
                .unwrap();
            s.touch_traced(TouchPhase::Move, &[stylus(20.0, 10.0, 8)], &canvas, &clock, &mut log, &mut tracer)
                .unwrap();
            s.tick_traced(&clock, &mut NoopEngineObserver, &mut tracer);
        }

        assert_eq!(
            sink.phases,
            vec![
                (PhaseKind::Input, true, 0),
                (PhaseKind::Input, false, 0),
                (PhaseKind::Input, true, 0),
                (PhaseKind::Input, false, 0),
            ]
        );
        assert_eq!(sink.batches.len(), 2);
        assert_eq!(sink.batches[1].phase, TouchPhase::Move);
        assert_eq!(sink.batches[1].accepted, 1);
        assert_eq!(sink.batches[1].timestamp, HostTime::from_millis(8));
        assert_eq!(sink.summaries.len(), 1);
        assert_eq!(sink.summaries[0].input_ns, 2_000, "one clock step per batch");
    }

    #[test]
    fn touches_before_initialize_are_refused() {
        let mut s = DrawingSession::default();
        let mut log = Log::default();
        let result = s.touch_begin(&[stylus(1.0, 1.0, 0)], &CanvasState::default(), &mut log);
        assert_eq!(result, Err(RenderError::NotInitialized));
        assert_eq!(s.input().active_contacts(), 0);
        assert_eq!(log.starts, 0);
    }

    #[test]
    fn exit_discards_everything() {
        let mut s = session();
        let canvas = CanvasState::default();
        let mut log = Log::default();
        s.touch_begin(&[stylus(10.0, 10.0, 0)], &canvas, &mut log).unwrap();
        s.exit();
        assert_eq!(s.input().active_contacts(), 0);
        assert!(s.input().active_stroke(TouchId(1)).is_none());
        assert!(!s.engine().is_initialized());
        assert_eq!(s.engine().queued(), 0);
        assert_eq!(s.engine().pool().in_use_count(), 0);
        assert!(log.ends.is_empty(), "exit emits no stroke events");
    }
}

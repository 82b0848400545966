// Copyright 2026 the Ductus Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The render engine.
//!
//! [`RenderEngine`] owns the render queue, the frame scheduler, the surface
//! pool, and the compositor. Hosts enqueue work with
//! [`render_stroke`](RenderEngine::render_stroke),
//! [`render_path`](RenderEngine::render_path), and
//! [`composite`](RenderEngine::composite), then call
//! [`tick`](RenderEngine::tick) once per display refresh.
//!
//! # Surfaces
//!
//! [`initialize`](RenderEngine::initialize) creates three surfaces of the
//! viewport's device size:
//!
//! - **main**: what the display shows. Rebuilt on present from the
//!   composite with the working overlay on top, followed by any paths
//!   drawn straight to main.
//! - **composite**: every layer blended together.
//! - **working**: live stroke previews and their predicted ghost tails.
//!
//! Layer surfaces are created on demand with
//! [`create_layer_surface`](RenderEngine::create_layer_surface).
//!
//! # Frame phases
//!
//! Each tick runs the phases in order:
//!
//! 1. **Execute**: the scheduler drains the queue within the frame budget.
//!    Composite commands only bring layer snapshots up to date here.
//! 2. **Composite**: the newest composite command that needs it redraws the
//!    composite surface, and the working overlay is redrawn if any preview
//!    changed.
//! 3. **Present**: main is rebuilt if anything it shows changed.
//!
//! After presenting, a memory check may run, statistics are recorded, and
//! the observer hears about the frame.

use std::collections::BTreeMap;

use ductus_core::input::PredictedPoint;
use ductus_core::layer::{LayerId, LayerRef};
use ductus_core::paint::{BlendMode, Paint};
use ductus_core::stroke::{Stroke, StrokeId};
use ductus_core::time::{Clock, Duration, HostTime};
use ductus_core::trace::{
    FrameBeginEvent, FrameSummaryBuilder, PhaseBeginEvent, PhaseEndEvent, PhaseKind, Tracer,
};
use kurbo::{Affine, BezPath, Rect};

use crate::command::{
    CompositeCommand, PathCommand, Priority, RenderCommand, StrokeCommand, StrokeMode,
    StrokeOptions, SurfaceTarget,
};
use crate::compositor::Compositor;
use crate::damage::DamageRegion;
use crate::error::RenderError;
use crate::memory::{MemoryCleanupEvent, MemoryConfig, MemoryMonitor};
use crate::pool::{PoolConfig, SurfaceId, SurfacePool};
use crate::queue::{AgingPolicy, RenderQueue};
use crate::raster;
use crate::scheduler::{FrameReport, FrameScheduler, SchedulerConfig};
use crate::stats::{EngineObserver, RenderStats, StatsTracker};
use crate::surface::Surface;
use crate::tessellate;

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Render engine configuration.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EngineConfig {
    /// Frame rate and budget.
    pub scheduler: SchedulerConfig,
    /// Promotion of commands that keep being deferred.
    pub aging: AgingPolicy,
    /// Memory pressure checks.
    pub memory: MemoryConfig,
    /// Surface reuse.
    pub pool: PoolConfig,
    /// Frames between [`EngineObserver::on_stats`] calls. `0` disables them.
    pub stats_interval: u32,
    /// Lowest pixel ratio [`RenderEngine::initialize`] falls back to when
    /// surfaces would be too large.
    pub min_pixel_ratio: f64,
}

impl EngineConfig {
    /// 120 Hz displays.
    #[must_use]
    pub const fn promotion_display() -> Self {
        Self {
            scheduler: SchedulerConfig::promotion(),
            aging: AgingPolicy::After { frames: 60 },
            memory: MemoryConfig::standard(),
            pool: PoolConfig::standard(),
            stats_interval: 120,
            min_pixel_ratio: 1.0,
        }
    }

    /// 60 Hz displays.
    #[must_use]
    pub const fn standard_display() -> Self {
        Self {
            scheduler: SchedulerConfig::standard(),
            stats_interval: 60,
            ..Self::promotion_display()
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::promotion_display()
    }
}

// ---------------------------------------------------------------------------
// Renderer: everything command execution touches
// ---------------------------------------------------------------------------

#[derive(Clone, Copy, Debug)]
struct Targets {
    width: u32,
    height: u32,
    pixel_ratio: f64,
    main: SurfaceId,
    composite: SurfaceId,
    working: SurfaceId,
}

#[derive(Debug)]
struct Preview {
    stroke: Stroke,
    paint: Paint,
    predicted: Vec<PredictedPoint>,
    ghost_alpha: f32,
}

impl Preview {
    /// Whether the preview can be drawn on the transparent overlay. Other
    /// blend modes only make sense against real content, so those previews
    /// are drawn straight onto main at present time.
    fn overlays(&self) -> bool {
        self.paint.blend_mode == BlendMode::SrcOver
    }

    fn draw(&self, surface: &mut Surface, transform: Affine) {
        raster::draw_path(surface, &tessellate::stroke_path(&self.stroke), &self.paint, transform);
        if let Some(ghost) = tessellate::ghost_path(&self.stroke, &self.predicted) {
            let paint = tessellate::ghost_paint(&self.paint, self.ghost_alpha);
            raster::draw_path(surface, &ghost, &paint, transform);
        }
    }
}

#[derive(Debug, Default)]
struct Renderer {
    pool: SurfacePool,
    targets: Option<Targets>,
    layers: BTreeMap<LayerId, SurfaceId>,
    compositor: Compositor,
    previews: BTreeMap<StrokeId, Preview>,
    main_paths: Vec<(BezPath, Paint)>,
    pending_composite: Option<CompositeCommand>,
    working_dirty: bool,
    composite_changed: bool,
    working_changed: bool,
    main_changed: bool,
    newest_input: Option<HostTime>,
}

impl Renderer {
    fn allocate_targets(
        &mut self,
        width: u32,
        height: u32,
        pixel_ratio: f64,
    ) -> Result<Targets, RenderError> {
        let main = self.pool.acquire(width, height, pixel_ratio)?;
        let composite = match self.pool.acquire(width, height, pixel_ratio) {
            Ok(id) => id,
            Err(e) => {
                self.pool.release(main);
                return Err(e);
            }
        };
        let working = match self.pool.acquire(width, height, pixel_ratio) {
            Ok(id) => id,
            Err(e) => {
                self.pool.release(main);
                self.pool.release(composite);
                return Err(e);
            }
        };
        Ok(Targets {
            width,
            height,
            pixel_ratio,
            main,
            composite,
            working,
        })
    }

    fn transform(&self) -> Affine {
        self.targets
            .map_or(Affine::IDENTITY, |t| Affine::scale(t.pixel_ratio))
    }

    fn surface_id(&self, target: SurfaceTarget) -> Option<SurfaceId> {
        let targets = self.targets.as_ref()?;
        match target {
            SurfaceTarget::Layer(layer) => self.layers.get(&layer).copied(),
            SurfaceTarget::Main => Some(targets.main),
            SurfaceTarget::Composite => Some(targets.composite),
            SurfaceTarget::Working => Some(targets.working),
        }
    }

    fn execute(&mut self, command: RenderCommand) -> Result<Option<Rect>, RenderError> {
        match command {
            RenderCommand::Stroke(c) => self.execute_stroke(c),
            RenderCommand::Path(c) => self.draw_into(c.target, &c.path, &c.paint),
            RenderCommand::Composite(c) => self.execute_composite(c),
        }
    }

    fn execute_stroke(&mut self, command: StrokeCommand) -> Result<Option<Rect>, RenderError> {
        let t = command.stroke.last().timestamp;
        self.newest_input = Some(self.newest_input.map_or(t, |n| n.max(t)));
        let id = command.stroke.id();
        match command.options.mode {
            StrokeMode::Preview => {
                self.previews.insert(
                    id,
                    Preview {
                        stroke: command.stroke,
                        paint: command.paint,
                        predicted: command.options.predicted,
                        ghost_alpha: command.options.ghost_alpha,
                    },
                );
                self.working_dirty = true;
                Ok(None)
            }
            StrokeMode::Commit => {
                if self.previews.remove(&id).is_some() {
                    self.working_dirty = true;
                }
                let path = tessellate::stroke_path(&command.stroke);
                self.draw_into(command.target, &path, &command.paint)
            }
        }
    }

    fn draw_into(
        &mut self,
        target: SurfaceTarget,
        path: &BezPath,
        paint: &Paint,
    ) -> Result<Option<Rect>, RenderError> {
        let transform = self.transform();
        let Some(id) = self.surface_id(target) else {
            tracing::debug!(?target, "no surface for target, skipping");
            return Ok(None);
        };
        if target == SurfaceTarget::Main {
            // Main is rebuilt on present, so the path is drawn there.
            self.main_paths.push((path.clone(), *paint));
            self.main_changed = true;
            return Ok(None);
        }
        let surface = self
            .pool
            .get_mut(id)
            .ok_or(RenderError::StaleSurface(id))?;
        let damage = raster::draw_path(surface, path, paint, transform);
        if damage.is_some() {
            match target {
                SurfaceTarget::Layer(layer) => self.compositor.mark_content(layer),
                SurfaceTarget::Composite => self.composite_changed = true,
                SurfaceTarget::Working => self.working_changed = true,
                SurfaceTarget::Main => self.main_changed = true,
            }
        }
        Ok(damage)
    }

    /// Brings the snapshots up to date and, if the composite must change,
    /// keeps the command for the composite phase.
    fn execute_composite(&mut self, command: CompositeCommand) -> Result<Option<Rect>, RenderError> {
        if self.targets.is_none() {
            return Err(RenderError::NotInitialized);
        }
        let (pool, layers) = (&self.pool, &self.layers);
        let redraw = self.compositor.prepare(&command.layers, command.viewport, |id| {
            layers.get(&id).and_then(|s| pool.get(*s))
        });
        if redraw {
            self.pending_composite = Some(command);
        }
        Ok(None)
    }

    /// Draws the pending composite, if any.
    fn draw_composite(&mut self) -> Option<Rect> {
        let command = self.pending_composite.take()?;
        let id = self.targets.as_ref()?.composite;
        let target = self.pool.get_mut(id)?;
        let damage = self
            .compositor
            .draw(target, &command.layers, command.viewport);
        self.composite_changed = true;
        damage
    }

    /// Redraws the working overlay from every preview that overlays.
    fn redraw_working(&mut self) -> Option<Rect> {
        self.working_dirty = false;
        let id = self.targets.as_ref()?.working;
        let transform = self.transform();
        let surface = self.pool.get_mut(id)?;
        surface.clear();
        for preview in self.previews.values().filter(|p| p.overlays()) {
            preview.draw(surface, transform);
        }
        self.working_changed = true;
        Some(surface.bounds())
    }

    /// Rebuilds main from the composite, the overlay, any previews that
    /// must draw against real content, and the paths drawn to main.
    fn present(&mut self) -> Option<Rect> {
        if !(self.composite_changed || self.working_changed || self.main_changed) {
            return None;
        }
        self.composite_changed = false;
        self.working_changed = false;
        self.main_changed = false;
        let targets = self.targets?;
        let transform = self.transform();

        let (main, composite) = self.pool.get_pair_mut(targets.main, targets.composite)?;
        main.copy_from(composite);
        let (main, working) = self.pool.get_pair_mut(targets.main, targets.working)?;
        main.draw_surface(working, BlendMode::SrcOver, 1.0, None);
        for preview in self.previews.values().filter(|p| !p.overlays()) {
            preview.draw(main, transform);
        }
        for (path, paint) in &self.main_paths {
            raster::draw_path(main, path, paint, transform);
        }
        Some(main.bounds())
    }

    fn memory_bytes(&self) -> u64 {
        self.pool.total_bytes() + self.compositor.cache_bytes()
    }

    /// Returns every checked-out surface to the pool and forgets all
    /// per-canvas state.
    fn release_all(&mut self) {
        for (_, id) in core::mem::take(&mut self.layers) {
            self.pool.release(id);
        }
        if let Some(t) = self.targets.take() {
            self.pool.release(t.main);
            self.pool.release(t.composite);
            self.pool.release(t.working);
        }
        self.previews.clear();
        self.main_paths.clear();
        self.pending_composite = None;
        self.compositor.reset();
        self.working_dirty = false;
        self.composite_changed = false;
        self.working_changed = false;
        self.main_changed = false;
        self.newest_input = None;
    }
}

// ---------------------------------------------------------------------------
// RenderEngine
// ---------------------------------------------------------------------------

/// Queues render work and executes it once per frame within a time budget.
#[derive(Debug)]
pub struct RenderEngine {
    config: EngineConfig,
    queue: RenderQueue,
    scheduler: FrameScheduler,
    renderer: Renderer,
    memory: MemoryMonitor,
    stats: StatsTracker,
    input_time: Duration,
    paused: bool,
}

impl Default for RenderEngine {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

impl RenderEngine {
    /// Creates an engine. Nothing can be rendered until
    /// [`initialize`](Self::initialize) succeeds.
    #[must_use]
    pub fn new(mut config: EngineConfig) -> Self {
        let scheduler = FrameScheduler::new(config.scheduler);
        config.scheduler = *scheduler.config();
        Self {
            queue: RenderQueue::new(config.aging),
            scheduler,
            renderer: Renderer {
                pool: SurfacePool::new(config.pool),
                ..Renderer::default()
            },
            memory: MemoryMonitor::new(config.memory),
            stats: StatsTracker::new(),
            input_time: Duration::ZERO,
            paused: false,
            config,
        }
    }

    /// Current configuration.
    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Creates the main, composite, and working surfaces for a viewport of
    /// `width` × `height` logical pixels.
    ///
    /// If the surfaces would exceed the pool's maximum side, the pixel ratio
    /// is halved until they fit or [`EngineConfig::min_pixel_ratio`] is
    /// reached. Returns the pixel ratio actually used.
    ///
    /// Re-initializing first [`destroy`](Self::destroy)s the previous state.
    pub fn initialize(&mut self, width: u32, height: u32, pixel_ratio: f64) -> Result<f64, RenderError> {
        if self.is_initialized() {
            self.destroy();
        }
        let min = self.config.min_pixel_ratio;
        let mut ratio = pixel_ratio;
        let targets = loop {
            match self.renderer.allocate_targets(width, height, ratio) {
                Ok(targets) => break targets,
                Err(RenderError::SurfaceTooLarge { .. }) if ratio > min => {
                    let lower = (ratio / 2.0).max(min);
                    tracing::warn!(from = ratio, to = lower, "surfaces too large, lowering pixel ratio");
                    ratio = lower;
                }
                Err(e) => return Err(e),
            }
        };
        tracing::info!(width, height, pixel_ratio = ratio, "render engine initialized");
        self.renderer.targets = Some(targets);
        self.renderer.compositor.invalidate();
        self.stats.resume();
        Ok(ratio)
    }

    /// Returns `true` between a successful [`initialize`](Self::initialize)
    /// and [`destroy`](Self::destroy).
    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.renderer.targets.is_some()
    }

    /// Logical viewport size and pixel ratio, once initialized.
    #[must_use]
    pub fn viewport(&self) -> Option<(u32, u32, f64)> {
        self.renderer
            .targets
            .map(|t| (t.width, t.height, t.pixel_ratio))
    }

    fn ensure_initialized(&self) -> Result<Targets, RenderError> {
        self.renderer.targets.ok_or(RenderError::NotInitialized)
    }

    /// Queues a stroke.
    ///
    /// Previews draw into the working overlay; commits draw into the
    /// stroke's layer and remove its preview. A newer submission for the same
    /// stroke replaces any preview of it still waiting in the queue.
    pub fn render_stroke(
        &mut self,
        stroke: Stroke,
        paint: Paint,
        options: StrokeOptions,
        priority: Priority,
    ) -> Result<(), RenderError> {
        self.ensure_initialized()?;
        let target = match options.mode {
            StrokeMode::Preview => SurfaceTarget::Working,
            StrokeMode::Commit => SurfaceTarget::Layer(stroke.layer()),
        };
        self.drop_queued_previews(stroke.id());
        self.queue.push(
            RenderCommand::Stroke(StrokeCommand {
                stroke,
                paint,
                options,
                target,
            }),
            priority,
        );
        Ok(())
    }

    /// Queues a canvas-space path.
    pub fn render_path(
        &mut self,
        path: BezPath,
        paint: Paint,
        target: SurfaceTarget,
        priority: Priority,
    ) -> Result<(), RenderError> {
        self.ensure_initialized()?;
        self.queue
            .push(RenderCommand::Path(PathCommand { path, paint, target }), priority);
        Ok(())
    }

    /// Queues compositing `layers` (bottom to top) into the composite
    /// surface, optionally clipped to a device-pixel `viewport`.
    pub fn composite(
        &mut self,
        layers: Vec<LayerRef>,
        viewport: Option<Rect>,
        priority: Priority,
    ) -> Result<(), RenderError> {
        self.ensure_initialized()?;
        self.queue.push(
            RenderCommand::Composite(CompositeCommand { layers, viewport }),
            priority,
        );
        Ok(())
    }

    /// Removes a stroke's preview, queued or drawn. Used when a stroke is
    /// cancelled.
    pub fn discard_preview(&mut self, stroke: StrokeId) {
        self.drop_queued_previews(stroke);
        if self.renderer.previews.remove(&stroke).is_some() {
            self.renderer.working_dirty = true;
        }
    }

    fn drop_queued_previews(&mut self, stroke: StrokeId) {
        self.queue.retain(|c| {
            !matches!(c, RenderCommand::Stroke(s)
                if s.options.mode == StrokeMode::Preview && s.stroke.id() == stroke)
        });
    }

    /// Removes every path drawn to [`SurfaceTarget::Main`].
    pub fn clear_main_paths(&mut self) {
        if !self.renderer.main_paths.is_empty() {
            self.renderer.main_paths.clear();
            self.renderer.main_changed = true;
        }
    }

    /// Strokes with a live preview.
    pub fn previews(&self) -> impl Iterator<Item = StrokeId> + '_ {
        self.renderer.previews.keys().copied()
    }

    /// Creates the content surface for `layer`, or returns the existing one.
    pub fn create_layer_surface(&mut self, layer: LayerId) -> Result<SurfaceId, RenderError> {
        let t = self.ensure_initialized()?;
        if let Some(id) = self.renderer.layers.get(&layer) {
            return Ok(*id);
        }
        let id = self.renderer.pool.acquire(t.width, t.height, t.pixel_ratio)?;
        self.renderer.layers.insert(layer, id);
        self.renderer.compositor.mark_content(layer);
        tracing::debug!(?layer, ?id, "layer surface created");
        Ok(id)
    }

    /// Returns `layer`'s surface to the pool.
    pub fn release_layer_surface(&mut self, layer: LayerId) -> Result<(), RenderError> {
        let id = self
            .renderer
            .layers
            .remove(&layer)
            .ok_or(RenderError::UnknownLayer(layer))?;
        self.renderer.pool.release(id);
        self.renderer.compositor.forget(layer);
        tracing::debug!(?layer, "layer surface released");
        Ok(())
    }

    /// The content surface of `layer`.
    #[must_use]
    pub fn layer_surface(&self, layer: LayerId) -> Option<&Surface> {
        self.surface(SurfaceTarget::Layer(layer))
    }

    /// The surface behind `target`, once initialized.
    #[must_use]
    pub fn surface(&self, target: SurfaceTarget) -> Option<&Surface> {
        let id = self.renderer.surface_id(target)?;
        self.renderer.pool.get(id)
    }

    /// The surface pool.
    #[must_use]
    pub fn pool(&self) -> &SurfacePool {
        &self.renderer.pool
    }

    /// Number of commands waiting.
    #[must_use]
    pub fn queued(&self) -> usize {
        self.queue.len()
    }

    /// The queued commands in execution order.
    pub fn queued_commands(&self) -> impl Iterator<Item = &RenderCommand> + '_ {
        self.queue.iter()
    }

    /// Current statistics.
    #[must_use]
    pub fn stats(&self) -> RenderStats {
        self.stats.snapshot(
            self.scheduler.average_frame_ms(),
            self.renderer.memory_bytes(),
            self.queue.len(),
        )
    }

    /// Stops frames from running. Queued work is kept.
    pub fn pause_rendering(&mut self) {
        if !self.paused {
            tracing::debug!("rendering paused");
        }
        self.paused = true;
    }

    /// Resumes frames after [`pause_rendering`](Self::pause_rendering).
    pub fn resume_rendering(&mut self) {
        if self.paused {
            tracing::debug!("rendering resumed");
            self.stats.resume();
        }
        self.paused = false;
    }

    /// Returns `true` while paused.
    #[must_use]
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Releases every surface, drops queued work and previews, and returns
    /// to the uninitialized state. Idle surfaces stay pooled for a later
    /// [`initialize`](Self::initialize).
    pub fn destroy(&mut self) {
        let dropped = self.queue.len();
        self.queue.clear();
        self.renderer.release_all();
        self.memory.reset();
        self.input_time = Duration::ZERO;
        tracing::info!(dropped, "render engine destroyed");
    }

    /// Applies new settings. Queued work, surfaces, and statistics are kept.
    pub fn update_settings(&mut self, mut config: EngineConfig) {
        self.scheduler.set_config(config.scheduler);
        config.scheduler = *self.scheduler.config();
        self.queue.set_aging(config.aging);
        self.memory.set_config(config.memory);
        self.renderer.pool.set_config(config.pool);
        self.config = config;
    }

    /// Index the next frame will get.
    #[must_use]
    pub fn frame_index(&self) -> u64 {
        self.scheduler.frame_index()
    }

    /// Adds input processing time to the next frame's summary.
    pub(crate) fn record_input_time(&mut self, spent: Duration) {
        self.input_time = self.input_time.saturating_add(spent);
    }

    /// Runs one frame without tracing. See [`tick_traced`](Self::tick_traced).
    pub fn tick(&mut self, clock: &dyn Clock, observer: &mut dyn EngineObserver) -> Option<FrameReport> {
        self.tick_traced(clock, observer, &mut Tracer::none())
    }

    /// Runs one frame.
    ///
    /// Returns `None` without reading the clock while paused or
    /// uninitialized.
    pub fn tick_traced(
        &mut self,
        clock: &dyn Clock,
        observer: &mut dyn EngineObserver,
        tracer: &mut Tracer<'_>,
    ) -> Option<FrameReport> {
        if self.paused || !self.is_initialized() {
            return None;
        }
        let frame_index = self.scheduler.frame_index();
        let now = clock.now();
        tracer.frame_begin(&FrameBeginEvent {
            frame_index,
            now,
            queued: u32::try_from(self.queue.len()).unwrap_or(u32::MAX),
        });
        let budget = self.scheduler.config().execution_budget();
        let mut summary = FrameSummaryBuilder::new(frame_index, now, budget.nanos());
        summary.add_input_ns(core::mem::take(&mut self.input_time).nanos());
        let mut phases = Phases {
            tracer,
            summary: &mut summary,
            frame_index,
        };

        phases.begin(PhaseKind::Execute, now);
        let renderer = &mut self.renderer;
        let mut report = self
            .scheduler
            .run_frame(&mut self.queue, clock, phases.tracer, |c| renderer.execute(c));
        phases.end(PhaseKind::Execute, clock.now());

        phases.begin(PhaseKind::Composite, clock.now());
        if let Some(rect) = self.renderer.draw_composite() {
            report.damage.add_rect(rect);
        }
        if self.renderer.working_dirty
            && let Some(rect) = self.renderer.redraw_working()
        {
            report.damage.add_rect(rect);
        }
        phases.end(PhaseKind::Composite, clock.now());

        phases.begin(PhaseKind::Present, clock.now());
        if let Some(rect) = self.renderer.present() {
            report.damage.add_rect(rect);
        }
        phases.end(PhaseKind::Present, clock.now());

        for failure in &report.failures {
            observer.on_command_failed(failure);
        }
        self.check_memory(now, observer);

        let newest_input = self.renderer.newest_input.take();
        self.stats.record_frame(now, &report, newest_input);
        summary.set_counts(report.executed, report.deferred, report.failed);
        tracer.frame_summary(&summary.finish());

        observer.on_frame(&report);
        let interval = u64::from(self.config.stats_interval);
        if interval > 0 && (frame_index + 1) % interval == 0 {
            observer.on_stats(&self.stats());
        }
        Some(report)
    }

    /// Damage from a frame clipped to the main surface, in device pixels.
    #[must_use]
    pub fn damage_bounds(&self, damage: &DamageRegion) -> Option<Rect> {
        let full = self.surface(SurfaceTarget::Main)?.bounds();
        damage.bounds(full)
    }

    fn check_memory(&mut self, now: HostTime, observer: &mut dyn EngineObserver) {
        let before = self.renderer.memory_bytes();
        let Some(pressure) = self.memory.check(now, before) else {
            return;
        };
        let snapshots_cleared = self.renderer.compositor.clear_cache();
        let surfaces_dropped = self.renderer.pool.compact();
        let after = self.renderer.memory_bytes();
        tracing::info!(
            pressure,
            before,
            after,
            snapshots_cleared,
            surfaces_dropped,
            "memory pressure cleanup"
        );
        observer.on_memory_cleanup(&MemoryCleanupEvent {
            timestamp: now,
            pressure,
            bytes_before: before,
            bytes_after: after,
            snapshots_cleared,
            surfaces_dropped,
        });
    }
}

/// Emits phase events to both the tracer and the frame summary.
struct Phases<'t, 'a, 's> {
    tracer: &'t mut Tracer<'a>,
    summary: &'s mut FrameSummaryBuilder,
    frame_index: u64,
}

impl Phases<'_, '_, '_> {
    fn begin(&mut self, phase: PhaseKind, timestamp: HostTime) {
        self.summary.phase_begin(phase, timestamp);
        self.tracer.phase_begin(&PhaseBeginEvent {
            frame_index: self.frame_index,
            phase,
            timestamp,
        });
    }

    fn end(&mut self, phase: PhaseKind, timestamp: HostTime) {
        self.summary.phase_end(phase, timestamp);
        self.tracer.phase_end(&PhaseEndEvent {
            frame_index: self.frame_index,
            phase,
            timestamp,
        });
    }
}

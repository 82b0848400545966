// Copyright 2026 the Ductus Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The input processor: raw platform touches in, stroke lifecycle out.

use std::collections::BTreeMap;

use kurbo::{Point, Vec2};

use super::calibrate::StylusAngles;
use super::gesture::{GestureEvent, GestureRecognizer};
use super::palm::PalmRejector;
use super::predict::Predictor;
use super::sample::{RawTouch, ToolKind, TouchId, TouchSample};
use super::settings::InputSettings;
use super::smooth::Smoother;
use crate::canvas::CanvasState;
use crate::event::{
    DropReason, InputObserver, PredictedInputEvent, RejectReason, SampleDroppedEvent,
    StrokeEndEvent, StrokeEndReason, StrokeStartEvent, StrokeUpdateEvent, TouchRejectedEvent,
};
use crate::paint::{BlendMode, Paint};
use crate::stroke::{Stroke, StrokeId};
use crate::time::HostTime;
use crate::trace::{InputBatchEvent, TouchPhase};

/// Running counters since the processor was created.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct InputStats {
    /// Samples that reached a stroke or a gesture.
    pub samples_accepted: u64,
    /// Samples from contacts classified as palms.
    pub samples_rejected: u64,
    /// Malformed samples.
    pub samples_dropped: u64,
    /// Strokes begun.
    pub strokes_started: u64,
    /// Strokes ended by lift-off.
    pub strokes_completed: u64,
    /// Strokes ended by cancellation.
    pub strokes_cancelled: u64,
    /// Two-finger gestures recognized.
    pub gestures: u64,
}

/// What happened to one batch of raw touches.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BatchSummary {
    /// Samples that reached a stroke or a gesture.
    pub accepted: u32,
    /// Samples from palm contacts.
    pub rejected: u32,
    /// Malformed samples.
    pub dropped: u32,
    /// Newest timestamp seen in the batch.
    pub latest: Option<HostTime>,
}

impl BatchSummary {
    fn saw(&mut self, t: HostTime) {
        self.latest = Some(self.latest.map_or(t, |l| l.max(t)));
    }

    /// Converts the summary into a trace event for the given phase.
    #[must_use]
    pub fn to_trace_event(&self, phase: TouchPhase) -> InputBatchEvent {
        InputBatchEvent {
            phase,
            timestamp: self.latest.unwrap_or_default(),
            accepted: self.accepted,
            rejected: self.rejected,
            dropped: self.dropped,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Role {
    /// Owns a stroke.
    Drawing,
    /// Drives a two-finger gesture.
    Gesture,
    /// Classified as a palm until it lifts.
    Rejected,
    /// A finger that arrived while a gesture was already running.
    Idle,
}

#[derive(Clone, Copy, Debug)]
struct Contact {
    kind: ToolKind,
    role: Role,
    last_time: HostTime,
    last_canvas: Point,
}

/// Turns raw platform touches into calibrated strokes and gestures.
///
/// Every entry point takes the batch of raw touches delivered by one platform
/// callback, the host's current [`CanvasState`], and an [`InputObserver`]
/// that receives the resulting events. Each raw touch is handled on its own:
/// a malformed one is dropped and reported without affecting the rest of the
/// batch.
#[derive(Debug)]
pub struct InputProcessor {
    settings: InputSettings,
    palm: PalmRejector,
    smoother: Smoother,
    predictor: Predictor,
    gestures: GestureRecognizer,
    contacts: BTreeMap<TouchId, Contact>,
    strokes: BTreeMap<TouchId, Stroke>,
    next_stroke: u64,
    stats: InputStats,
    gesture_events: Vec<GestureEvent>,
}

impl Default for InputProcessor {
    fn default() -> Self {
        Self::new(InputSettings::default())
    }
}

impl InputProcessor {
    /// Creates a processor with the given settings.
    #[must_use]
    pub fn new(settings: InputSettings) -> Self {
        Self {
            palm: PalmRejector::new(settings.palm_rejection),
            smoother: Smoother::new(settings.smoothing),
            predictor: Predictor::new(settings.prediction),
            gestures: GestureRecognizer::new(settings.gestures),
            settings,
            contacts: BTreeMap::new(),
            strokes: BTreeMap::new(),
            next_stroke: 1,
            stats: InputStats::default(),
            gesture_events: Vec::new(),
        }
    }

    /// Current settings.
    #[must_use]
    pub fn settings(&self) -> &InputSettings {
        &self.settings
    }

    /// Replaces the settings.
    ///
    /// Smoothing and prediction histories restart; active strokes continue.
    pub fn update_settings(&mut self, settings: InputSettings) {
        self.palm.set_config(settings.palm_rejection);
        self.smoother.set_factor(settings.smoothing);
        self.predictor.set_config(settings.prediction);
        self.gestures.set_config(settings.gestures);
        self.settings = settings;
    }

    /// Counters since creation.
    #[must_use]
    pub fn stats(&self) -> InputStats {
        self.stats
    }

    /// The active stroke owned by `touch`, if any.
    #[must_use]
    pub fn active_stroke(&self, touch: TouchId) -> Option<&Stroke> {
        self.strokes.get(&touch)
    }

    /// All active strokes, ordered by contact id.
    pub fn active_strokes(&self) -> impl Iterator<Item = &Stroke> {
        self.strokes.values()
    }

    /// Number of contacts currently down, including rejected ones.
    #[must_use]
    pub fn active_contacts(&self) -> usize {
        self.contacts.len()
    }

    /// Handles contacts going down.
    pub fn touch_begin(
        &mut self,
        touches: &[RawTouch],
        canvas: &CanvasState,
        observer: &mut dyn InputObserver,
    ) -> BatchSummary {
        let mut batch = BatchSummary::default();
        for raw in touches {
            self.begin_one(raw, canvas, observer, &mut batch);
        }
        batch
    }

    /// Handles contacts moving.
    pub fn touch_move(
        &mut self,
        touches: &[RawTouch],
        canvas: &CanvasState,
        observer: &mut dyn InputObserver,
    ) -> BatchSummary {
        let mut batch = BatchSummary::default();
        for raw in touches {
            self.move_one(raw, canvas, observer, &mut batch);
        }
        batch
    }

    /// Handles contacts lifting. Lift-off never appends a point.
    pub fn touch_end(
        &mut self,
        touches: &[RawTouch],
        canvas: &CanvasState,
        observer: &mut dyn InputObserver,
    ) -> BatchSummary {
        let mut batch = BatchSummary::default();
        for raw in touches {
            self.end_one(raw, canvas, observer, &mut batch, StrokeEndReason::Completed);
        }
        batch
    }

    /// Handles contacts cancelled by the platform. Their strokes end with
    /// [`StrokeEndReason::Cancelled`].
    pub fn touch_cancel(
        &mut self,
        touches: &[RawTouch],
        canvas: &CanvasState,
        observer: &mut dyn InputObserver,
    ) -> BatchSummary {
        let mut batch = BatchSummary::default();
        for raw in touches {
            self.end_one(raw, canvas, observer, &mut batch, StrokeEndReason::Cancelled);
        }
        batch
    }

    /// Discards every active stroke, contact, prediction, and smoothing
    /// history without emitting events. Returns the ids of the discarded
    /// strokes.
    pub fn reset(&mut self) -> Vec<StrokeId> {
        let discarded: Vec<StrokeId> = self.strokes.values().map(Stroke::id).collect();
        if !discarded.is_empty() {
            tracing::debug!(count = discarded.len(), "discarding active strokes");
        }
        self.strokes.clear();
        self.contacts.clear();
        self.palm.reset();
        self.smoother.reset();
        self.predictor.reset();
        self.gestures.reset();
        self.gesture_events.clear();
        discarded
    }

    fn begin_one(
        &mut self,
        raw: &RawTouch,
        canvas: &CanvasState,
        observer: &mut dyn InputObserver,
        batch: &mut BatchSummary,
    ) {
        let Some(id) = self.validate(raw, observer, batch) else {
            return;
        };
        if self.contacts.contains_key(&id) {
            self.drop_sample(Some(id), raw.timestamp, DropReason::DuplicateContact, observer, batch);
            return;
        }
        batch.saw(raw.timestamp);
        let canvas_pos = canvas.to_canvas(raw.position);
        let radius = contact_radius(raw);

        if self
            .palm
            .observe(id, raw.kind, raw.position, radius, raw.timestamp)
        {
            self.contacts.insert(
                id,
                Contact {
                    kind: raw.kind,
                    role: Role::Rejected,
                    last_time: raw.timestamp,
                    last_canvas: canvas_pos,
                },
            );
            self.reject(id, raw, observer, batch);
            return;
        }

        let mut role = Role::Drawing;
        if raw.kind == ToolKind::Finger {
            let already_gesturing = self.gestures.active_pair().is_some();
            let started = self.gestures.contact_down(
                id,
                raw.position,
                raw.timestamp,
                &mut self.gesture_events,
            );
            if let Some(pair) = started {
                self.stats.gestures += 1;
                for member in pair {
                    if let Some(c) = self.contacts.get_mut(&member) {
                        c.role = Role::Gesture;
                    }
                    self.end_stroke(member, raw.timestamp, canvas, StrokeEndReason::Cancelled, observer);
                }
                role = Role::Gesture;
            } else if already_gesturing {
                role = Role::Idle;
            }
            self.flush_gestures(observer);
        }

        let mut contact = Contact {
            kind: raw.kind,
            role,
            last_time: raw.timestamp,
            last_canvas: canvas_pos,
        };
        if role == Role::Drawing {
            let sample = self.calibrate(id, raw, canvas_pos, None);
            contact.last_canvas = sample.canvas_position;
            self.start_stroke(sample, canvas, observer);
        }
        if role != Role::Idle {
            batch.accepted += 1;
            self.stats.samples_accepted += 1;
        }
        self.contacts.insert(id, contact);
    }

    fn move_one(
        &mut self,
        raw: &RawTouch,
        canvas: &CanvasState,
        observer: &mut dyn InputObserver,
        batch: &mut BatchSummary,
    ) {
        let Some(id) = self.validate(raw, observer, batch) else {
            return;
        };
        let Some(contact) = self.contacts.get(&id).copied() else {
            self.drop_sample(Some(id), raw.timestamp, DropReason::UnknownContact, observer, batch);
            return;
        };
        if raw.timestamp <= contact.last_time {
            self.drop_sample(Some(id), raw.timestamp, DropReason::NonMonotonic, observer, batch);
            return;
        }
        batch.saw(raw.timestamp);
        let canvas_pos = canvas.to_canvas(raw.position);
        let mut updated = Contact {
            last_time: raw.timestamp,
            last_canvas: canvas_pos,
            ..contact
        };

        if contact.kind.is_stylus() {
            self.palm
                .observe(id, raw.kind, raw.position, contact_radius(raw), raw.timestamp);
        }
        if contact.kind == ToolKind::Finger && contact.role != Role::Rejected {
            self.gestures
                .contact_moved(id, raw.position, raw.timestamp, &mut self.gesture_events);
            self.flush_gestures(observer);
        }

        match contact.role {
            Role::Rejected => {
                batch.rejected += 1;
                self.stats.samples_rejected += 1;
            }
            Role::Idle => {}
            Role::Gesture => {
                batch.accepted += 1;
                self.stats.samples_accepted += 1;
            }
            Role::Drawing => {
                let sample = self.calibrate(id, raw, canvas_pos, Some(&contact));
                updated.last_canvas = sample.canvas_position;
                if self.append(sample, canvas, observer) {
                    batch.accepted += 1;
                    self.stats.samples_accepted += 1;
                }
            }
        }
        self.contacts.insert(id, updated);
    }

    fn end_one(
        &mut self,
        raw: &RawTouch,
        canvas: &CanvasState,
        observer: &mut dyn InputObserver,
        batch: &mut BatchSummary,
        reason: StrokeEndReason,
    ) {
        let Some(id) = raw.id else {
            self.drop_sample(None, raw.timestamp, DropReason::MissingIdentity, observer, batch);
            return;
        };
        let Some(contact) = self.contacts.remove(&id) else {
            self.drop_sample(Some(id), raw.timestamp, DropReason::UnknownContact, observer, batch);
            return;
        };
        batch.saw(raw.timestamp);
        self.palm.end_contact(id);
        if contact.kind == ToolKind::Finger {
            self.gestures
                .contact_up(id, raw.timestamp, &mut self.gesture_events);
            self.flush_gestures(observer);
        }
        self.end_stroke(id, raw.timestamp, canvas, reason, observer);
        self.smoother.forget(id);
        self.predictor.forget(id);
    }

    fn validate(
        &mut self,
        raw: &RawTouch,
        observer: &mut dyn InputObserver,
        batch: &mut BatchSummary,
    ) -> Option<TouchId> {
        let Some(id) = raw.id else {
            self.drop_sample(None, raw.timestamp, DropReason::MissingIdentity, observer, batch);
            return None;
        };
        if !raw.position.is_finite() {
            self.drop_sample(Some(id), raw.timestamp, DropReason::NonFinite, observer, batch);
            return None;
        }
        Some(id)
    }

    fn calibrate(
        &mut self,
        id: TouchId,
        raw: &RawTouch,
        canvas_pos: Point,
        previous: Option<&Contact>,
    ) -> TouchSample {
        let pressure = self.settings.pressure.calibrate(raw.force);
        let StylusAngles { azimuth, altitude } = self.settings.tilt.calibrate(raw.tilt);
        let (canvas_position, pressure) = self.smoother.smooth(id, canvas_pos, pressure);
        let velocity = previous
            .filter(|c| raw.timestamp > c.last_time)
            .map_or(Vec2::ZERO, |c| {
                let dt = (raw.timestamp - c.last_time).as_secs_f64();
                (canvas_position - c.last_canvas) / dt
            });
        TouchSample {
            id,
            kind: raw.kind,
            position: raw.position,
            canvas_position,
            pressure,
            radius: contact_radius(raw),
            azimuth,
            altitude,
            timestamp: raw.timestamp,
            velocity,
        }
    }

    fn start_stroke(
        &mut self,
        sample: TouchSample,
        canvas: &CanvasState,
        observer: &mut dyn InputObserver,
    ) {
        let id = StrokeId(self.next_stroke);
        self.next_stroke += 1;
        let paint = paint_for(sample.kind, &canvas.paint);
        let stroke = Stroke::new(id, sample, canvas.active_layer, paint, self.settings.smoothing);
        self.predictor.observe(
            sample.id,
            sample.canvas_position,
            sample.pressure,
            sample.timestamp,
        );
        self.stats.strokes_started += 1;
        tracing::trace!(stroke = id.0, touch = sample.id.0, "stroke started");

        self.strokes.insert(sample.id, stroke);
        let Some(stroke) = self.strokes.get(&sample.id) else {
            return;
        };
        observer.on_stroke_start(&StrokeStartEvent {
            stroke,
            layer: canvas.active_layer,
            paint,
            transform: canvas.view_transform,
            pressure: sample.pressure,
            timestamp: sample.timestamp,
        });
    }

    fn append(
        &mut self,
        sample: TouchSample,
        canvas: &CanvasState,
        observer: &mut dyn InputObserver,
    ) -> bool {
        let Some(stroke) = self.strokes.get_mut(&sample.id) else {
            return false;
        };
        if !stroke.push(sample) {
            return false;
        }
        self.predictor.observe(
            sample.id,
            sample.canvas_position,
            sample.pressure,
            sample.timestamp,
        );
        let stroke = &*stroke;
        observer.on_stroke_update(&StrokeUpdateEvent {
            stroke,
            sample: stroke.last(),
            layer: stroke.layer(),
            paint: *stroke.paint(),
            transform: canvas.view_transform,
            pressure: sample.pressure,
            timestamp: sample.timestamp,
        });

        let predicted = self.predictor.predict(sample.id);
        if !predicted.is_empty() {
            observer.on_predicted_input(&PredictedInputEvent {
                stroke: stroke.id(),
                touch: sample.id,
                points: &predicted,
            });
        }
        true
    }

    fn end_stroke(
        &mut self,
        touch: TouchId,
        time: HostTime,
        canvas: &CanvasState,
        reason: StrokeEndReason,
        observer: &mut dyn InputObserver,
    ) {
        let Some(mut stroke) = self.strokes.remove(&touch) else {
            return;
        };
        stroke.finish(time);
        match reason {
            StrokeEndReason::Completed => self.stats.strokes_completed += 1,
            StrokeEndReason::Cancelled => self.stats.strokes_cancelled += 1,
        }
        self.smoother.forget(touch);
        self.predictor.forget(touch);
        tracing::trace!(stroke = stroke.id().0, points = stroke.len(), ?reason, "stroke ended");
        observer.on_stroke_end(StrokeEndEvent {
            layer: stroke.layer(),
            paint: *stroke.paint(),
            transform: canvas.view_transform,
            pressure: stroke.pressure(),
            timestamp: stroke.end_time().unwrap_or(time),
            reason,
            stroke,
        });
    }

    fn reject(
        &mut self,
        id: TouchId,
        raw: &RawTouch,
        observer: &mut dyn InputObserver,
        batch: &mut BatchSummary,
    ) {
        batch.rejected += 1;
        self.stats.samples_rejected += 1;
        tracing::debug!(touch = id.0, x = raw.position.x, y = raw.position.y, "rejected palm contact");
        observer.on_touch_rejected(&TouchRejectedEvent {
            touch: id,
            position: raw.position,
            timestamp: raw.timestamp,
            reason: RejectReason::Palm,
        });
    }

    fn drop_sample(
        &mut self,
        touch: Option<TouchId>,
        timestamp: HostTime,
        reason: DropReason,
        observer: &mut dyn InputObserver,
        batch: &mut BatchSummary,
    ) {
        batch.dropped += 1;
        self.stats.samples_dropped += 1;
        tracing::debug!(?touch, ?reason, "dropping malformed touch sample");
        observer.on_sample_dropped(&SampleDroppedEvent {
            touch,
            timestamp,
            reason,
        });
    }

    fn flush_gestures(&mut self, observer: &mut dyn InputObserver) {
        for e in self.gesture_events.drain(..) {
            observer.on_gesture(&e);
        }
    }
}

fn contact_radius(raw: &RawTouch) -> f64 {
    raw.radius.filter(|r| r.is_finite() && *r >= 0.0).unwrap_or(0.0)
}

/// Eraser contacts punch out whatever is beneath them.
fn paint_for(kind: ToolKind, paint: &Paint) -> Paint {
    match kind {
        ToolKind::Eraser => paint.with_blend_mode(BlendMode::DstOut),
        ToolKind::Finger | ToolKind::Stylus => *paint,
    }
}

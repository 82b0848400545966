// Copyright 2026 the Ductus Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Typed input events and the observer that receives them.
//!
//! The input processor reports everything it decides through an
//! [`InputObserver`] passed to each call. Stroke start and update events
//! borrow the live stroke; the end event hands the finalized stroke over by
//! value so it can be moved straight into a commit command.

use kurbo::{Affine, Point};

use crate::input::{GestureEvent, PredictedPoint, TouchId, TouchSample};
use crate::layer::LayerId;
use crate::paint::Paint;
use crate::stroke::{Stroke, StrokeId};
use crate::time::HostTime;

/// A stroke began.
#[derive(Clone, Copy, Debug)]
pub struct StrokeStartEvent<'a> {
    /// The new stroke, holding its first sample.
    pub stroke: &'a Stroke,
    /// Layer the stroke draws into.
    pub layer: LayerId,
    /// Paint snapshot for the stroke.
    pub paint: Paint,
    /// View transform at the time of the sample.
    pub transform: Affine,
    /// Calibrated pressure of the first sample.
    pub pressure: f64,
    /// Time of the first sample.
    pub timestamp: HostTime,
}

/// A sample was appended to a stroke.
#[derive(Clone, Copy, Debug)]
pub struct StrokeUpdateEvent<'a> {
    /// The stroke after the append.
    pub stroke: &'a Stroke,
    /// The sample that was appended.
    pub sample: &'a TouchSample,
    /// Layer the stroke draws into.
    pub layer: LayerId,
    /// Paint snapshot for the stroke.
    pub paint: Paint,
    /// View transform at the time of the sample.
    pub transform: Affine,
    /// Calibrated pressure of the sample.
    pub pressure: f64,
    /// Time of the sample.
    pub timestamp: HostTime,
}

/// Why a stroke ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StrokeEndReason {
    /// The contact lifted normally.
    Completed,
    /// The platform cancelled the contact, or the contact became part of a
    /// multi-finger gesture.
    Cancelled,
}

/// A stroke was finalized.
#[derive(Clone, Debug)]
pub struct StrokeEndEvent {
    /// The finalized stroke, with its end time set.
    pub stroke: Stroke,
    /// Why it ended.
    pub reason: StrokeEndReason,
    /// Layer the stroke draws into.
    pub layer: LayerId,
    /// Paint snapshot for the stroke.
    pub paint: Paint,
    /// View transform at the time the contact ended.
    pub transform: Affine,
    /// Pressure of the last sample.
    pub pressure: f64,
    /// End time.
    pub timestamp: HostTime,
}

/// Predicted points for an active stroke.
#[derive(Clone, Copy, Debug)]
pub struct PredictedInputEvent<'a> {
    /// Stroke being predicted.
    pub stroke: StrokeId,
    /// Contact being predicted.
    pub touch: TouchId,
    /// Points ahead of the newest real sample, nearest first.
    pub points: &'a [PredictedPoint],
}

/// Why a contact was rejected.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RejectReason {
    /// The contact looked like a resting palm near the stylus.
    Palm,
}

/// A contact was rejected as non-drawing input.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TouchRejectedEvent {
    /// Rejected contact.
    pub touch: TouchId,
    /// Screen-space position.
    pub position: Point,
    /// Time of the sample.
    pub timestamp: HostTime,
    /// Why.
    pub reason: RejectReason,
}

/// Why a raw sample was dropped.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DropReason {
    /// The platform event carried no contact identity.
    MissingIdentity,
    /// The position was NaN or infinite.
    NonFinite,
    /// The timestamp did not advance past the contact's previous sample.
    NonMonotonic,
    /// A move or end arrived for a contact that never began.
    UnknownContact,
    /// A begin arrived for a contact that is already down.
    DuplicateContact,
}

/// A raw sample was dropped as malformed.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SampleDroppedEvent {
    /// Contact identity, if the event had one.
    pub touch: Option<TouchId>,
    /// Time of the event.
    pub timestamp: HostTime,
    /// Why.
    pub reason: DropReason,
}

/// Receives input-processing events.
///
/// All methods have default no-op implementations.
pub trait InputObserver {
    /// A stroke began.
    fn on_stroke_start(&mut self, e: &StrokeStartEvent<'_>) {
        _ = e;
    }

    /// A stroke grew by one sample.
    fn on_stroke_update(&mut self, e: &StrokeUpdateEvent<'_>) {
        _ = e;
    }

    /// A stroke was finalized; the observer takes ownership.
    fn on_stroke_end(&mut self, e: StrokeEndEvent) {
        _ = e;
    }

    /// Fresh predictions are available for an active stroke.
    fn on_predicted_input(&mut self, e: &PredictedInputEvent<'_>) {
        _ = e;
    }

    /// A multi-finger gesture progressed.
    fn on_gesture(&mut self, e: &GestureEvent) {
        _ = e;
    }

    /// A contact was rejected.
    fn on_touch_rejected(&mut self, e: &TouchRejectedEvent) {
        _ = e;
    }

    /// A malformed sample was dropped.
    fn on_sample_dropped(&mut self, e: &SampleDroppedEvent) {
        _ = e;
    }
}

/// An [`InputObserver`] that ignores everything.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopObserver;

impl InputObserver for NoopObserver {}

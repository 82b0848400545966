// Copyright 2026 the Ductus Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The authoritative stroke model.
//!
//! A [`Stroke`] is an append-only sequence of calibrated samples from one
//! contact. It is created on the first accepted sample, grows with every
//! move, and is finalized when the contact lifts. Predicted points never
//! enter a stroke.

use core::fmt;

use kurbo::{Point, Rect};

use crate::input::{TouchId, TouchSample, ToolKind};
use crate::layer::LayerId;
use crate::paint::Paint;
use crate::time::HostTime;

/// Unique identifier of a stroke within one input processor.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct StrokeId(pub u64);

impl fmt::Debug for StrokeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "StrokeId({})", self.0)
    }
}

/// A continuous drawing gesture from one contact.
#[derive(Clone, Debug, PartialEq)]
pub struct Stroke {
    id: StrokeId,
    touch: TouchId,
    tool: ToolKind,
    layer: LayerId,
    paint: Paint,
    samples: Vec<TouchSample>,
    smoothing: f64,
    start_time: HostTime,
    end_time: Option<HostTime>,
}

impl Stroke {
    /// Starts a stroke with its first sample.
    ///
    /// `paint` and `layer` are captured here and stay fixed for the life of
    /// the stroke.
    #[must_use]
    pub fn new(
        id: StrokeId,
        first: TouchSample,
        layer: LayerId,
        paint: Paint,
        smoothing: f64,
    ) -> Self {
        Self {
            id,
            touch: first.id,
            tool: first.kind,
            layer,
            paint,
            samples: vec![first],
            smoothing,
            start_time: first.timestamp,
            end_time: None,
        }
    }

    /// Stroke identity.
    #[must_use]
    pub fn id(&self) -> StrokeId {
        self.id
    }

    /// Contact that owns this stroke.
    #[must_use]
    pub fn touch(&self) -> TouchId {
        self.touch
    }

    /// Tool that drew the stroke.
    #[must_use]
    pub fn tool(&self) -> ToolKind {
        self.tool
    }

    /// Layer the stroke is drawn into.
    #[must_use]
    pub fn layer(&self) -> LayerId {
        self.layer
    }

    /// Paint captured when the stroke began.
    #[must_use]
    pub fn paint(&self) -> &Paint {
        &self.paint
    }

    /// Samples in temporal order.
    #[must_use]
    pub fn samples(&self) -> &[TouchSample] {
        &self.samples
    }

    /// Canvas-space positions in temporal order.
    pub fn points(&self) -> impl ExactSizeIterator<Item = Point> + '_ {
        self.samples.iter().map(|s| s.canvas_position)
    }

    /// Number of samples.
    #[must_use]
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Always `false`; a stroke has at least its first sample.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Newest sample.
    #[must_use]
    pub fn last(&self) -> &TouchSample {
        // Constructed with one sample and never shrinks.
        &self.samples[self.samples.len() - 1]
    }

    /// Pressure of the newest sample.
    #[must_use]
    pub fn pressure(&self) -> f64 {
        self.last().pressure
    }

    /// Speed of the newest sample, in canvas pixels per second.
    #[must_use]
    pub fn speed(&self) -> f64 {
        self.last().velocity.hypot()
    }

    /// Smoothing factor the samples were filtered with.
    #[must_use]
    pub fn smoothing(&self) -> f64 {
        self.smoothing
    }

    /// Time of the first sample.
    #[must_use]
    pub fn start_time(&self) -> HostTime {
        self.start_time
    }

    /// Time the contact ended, once finalized.
    #[must_use]
    pub fn end_time(&self) -> Option<HostTime> {
        self.end_time
    }

    /// Returns `true` until [`finish`](Self::finish) is called.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.end_time.is_none()
    }

    /// Appends a sample.
    ///
    /// Samples that do not advance time, or arrive after the stroke was
    /// finalized, are refused and `false` is returned.
    pub fn push(&mut self, sample: TouchSample) -> bool {
        if !self.is_active() || sample.timestamp <= self.last().timestamp {
            return false;
        }
        debug_assert_eq!(sample.id, self.touch, "sample from a foreign contact");
        self.samples.push(sample);
        true
    }

    /// Finalizes the stroke. The end time never precedes the newest sample.
    pub fn finish(&mut self, time: HostTime) {
        if self.end_time.is_none() {
            self.end_time = Some(time.max(self.last().timestamp));
        }
    }

    /// Canvas-space bounding box of the sample positions.
    #[must_use]
    pub fn bounds(&self) -> Rect {
        let first = self.last().canvas_position;
        self.points()
            .fold(Rect::from_points(first, first), |r, p| r.union_pt(p))
    }
}

#[cfg(test)]
mod tests {
    use kurbo::Vec2;

    use super::*;

    fn sample(x: f64, ms: u64) -> TouchSample {
        let p = Point::new(x, 0.0);
        TouchSample {
            id: TouchId(1),
            kind: ToolKind::Stylus,
            position: p,
            canvas_position: p,
            pressure: 0.5,
            radius: 0.0,
            azimuth: 0.0,
            altitude: core::f64::consts::FRAC_PI_2,
            timestamp: HostTime::from_millis(ms),
            velocity: Vec2::new(x, 0.0),
        }
    }

    fn stroke() -> Stroke {
        Stroke::new(StrokeId(1), sample(0.0, 0), LayerId(0), Paint::default(), 0.3)
    }

    #[test]
    fn append_only_in_time_order() {
        let mut s = stroke();
        assert!(s.push(sample(1.0, 1)));
        assert!(!s.push(sample(2.0, 1)), "equal timestamp refused");
        assert!(!s.push(sample(2.0, 0)), "older timestamp refused");
        assert!(s.push(sample(3.0, 2)));
        assert_eq!(s.len(), 3);
        assert_eq!(s.speed(), 3.0);
    }

    #[test]
    fn finished_stroke_is_frozen() {
        let mut s = stroke();
        s.push(sample(1.0, 5));
        s.finish(HostTime::from_millis(3));
        assert_eq!(s.end_time(), Some(HostTime::from_millis(5)));
        assert!(!s.is_active());
        assert!(!s.push(sample(9.0, 9)));
        s.finish(HostTime::from_millis(100));
        assert_eq!(s.end_time(), Some(HostTime::from_millis(5)));
    }

    #[test]
    fn bounds_cover_all_points() {
        let mut s = stroke();
        s.push(sample(-4.0, 1));
        s.push(sample(10.0, 2));
        assert_eq!(s.bounds(), Rect::new(-4.0, 0.0, 10.0, 0.0));
    }
}

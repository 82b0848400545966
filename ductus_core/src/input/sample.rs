// Copyright 2026 the Ductus Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Raw and calibrated touch samples.

use core::fmt;

use kurbo::{Point, Vec2};

use crate::time::HostTime;

/// Identifies one continuous contact, from touch-down to lift-off.
///
/// Platforms may reuse identifiers once a contact has ended.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TouchId(pub u64);

impl fmt::Debug for TouchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TouchId({})", self.0)
    }
}

/// What produced a contact.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ToolKind {
    /// A finger or other passive touch.
    #[default]
    Finger,
    /// The drawing tip of an active stylus.
    Stylus,
    /// The eraser end of an active stylus.
    Eraser,
}

impl ToolKind {
    /// Returns `true` for active-stylus contacts, which are never treated as
    /// palm touches.
    #[must_use]
    pub const fn is_stylus(self) -> bool {
        matches!(self, Self::Stylus | Self::Eraser)
    }
}

/// An unprocessed platform touch event.
///
/// Only the identity and position are required by the platform contract;
/// everything else is optional and falls back to a calibrated default.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RawTouch {
    /// Contact identity. Events without one are dropped.
    pub id: Option<TouchId>,
    /// Tool that produced the contact.
    pub kind: ToolKind,
    /// Screen-space position.
    pub position: Point,
    /// Monotonic event time.
    pub timestamp: HostTime,
    /// Raw force reading, if the hardware reports one.
    pub force: Option<f64>,
    /// Raw tilt components `(x, y)` in radians, if reported.
    pub tilt: Option<Vec2>,
    /// Contact radius in screen pixels, if reported.
    pub radius: Option<f64>,
}

impl RawTouch {
    /// A touch with identity, tool, position, and time, and no optional
    /// readings.
    #[must_use]
    pub const fn new(id: TouchId, kind: ToolKind, position: Point, timestamp: HostTime) -> Self {
        Self {
            id: Some(id),
            kind,
            position,
            timestamp,
            force: None,
            tilt: None,
            radius: None,
        }
    }

    /// Returns a copy with a force reading.
    #[must_use]
    pub const fn with_force(self, force: f64) -> Self {
        Self {
            force: Some(force),
            ..self
        }
    }

    /// Returns a copy with a tilt reading.
    #[must_use]
    pub const fn with_tilt(self, tilt: Vec2) -> Self {
        Self {
            tilt: Some(tilt),
            ..self
        }
    }

    /// Returns a copy with a contact radius.
    #[must_use]
    pub const fn with_radius(self, radius: f64) -> Self {
        Self {
            radius: Some(radius),
            ..self
        }
    }
}

/// A calibrated, time-stamped input point.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TouchSample {
    /// Contact identity.
    pub id: TouchId,
    /// Tool that produced the contact.
    pub kind: ToolKind,
    /// Screen-space position.
    pub position: Point,
    /// Canvas-space position, after the inverse view transform and
    /// smoothing.
    pub canvas_position: Point,
    /// Calibrated pressure in `[0, 1]`.
    pub pressure: f64,
    /// Contact radius in screen pixels (0 when not reported).
    pub radius: f64,
    /// Stylus azimuth in `[0, 2π)`.
    pub azimuth: f64,
    /// Stylus altitude in `[0, π/2]`; `π/2` is perpendicular to the screen.
    pub altitude: f64,
    /// Monotonic event time.
    pub timestamp: HostTime,
    /// Canvas-space velocity in pixels per second (zero for the first
    /// sample of a contact).
    pub velocity: Vec2,
}

/// A speculative point extrapolated ahead of real input.
///
/// Predicted points are only ever drawn into the transient overlay; they are
/// never appended to a [`Stroke`](crate::stroke::Stroke).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PredictedPoint {
    /// Canvas-space position.
    pub position: Point,
    /// Decayed pressure in `[0, 1]`.
    pub pressure: f64,
    /// Time the point is predicted for.
    pub timestamp: HostTime,
    /// How many frames ahead of the newest real sample, starting at 1.
    pub frame_offset: u32,
    /// Confidence in `(0, 1]`.
    pub confidence: f64,
}

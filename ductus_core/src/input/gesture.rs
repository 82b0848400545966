// Copyright 2026 the Ductus Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Two-finger pinch, pan, and rotate recognition.
//!
//! The recognizer tracks finger contacts in screen space. As soon as two
//! fingers are down at the same time a gesture begins; it ends when either of
//! them lifts. Scale and rotation are measured against the pair's geometry at
//! the moment the gesture began, pan is reported as the centroid delta since
//! the previous event.

use core::f64::consts::{PI, TAU};
use std::collections::BTreeMap;

use kurbo::{Point, Vec2};

use super::sample::TouchId;
use crate::time::HostTime;

/// Which gestures are recognized, and pinch bounds.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GestureConfig {
    /// Recognize pinch-to-zoom.
    pub pinch: bool,
    /// Recognize two-finger pan.
    pub pan: bool,
    /// Recognize two-finger rotation.
    pub rotate: bool,
    /// Smallest reported pinch scale.
    pub min_scale: f64,
    /// Largest reported pinch scale.
    pub max_scale: f64,
}

impl Default for GestureConfig {
    fn default() -> Self {
        Self {
            pinch: true,
            pan: true,
            rotate: true,
            min_scale: 0.1,
            max_scale: 10.0,
        }
    }
}

impl GestureConfig {
    /// Returns `true` if at least one gesture is enabled.
    #[must_use]
    pub const fn any_enabled(&self) -> bool {
        self.pinch || self.pan || self.rotate
    }

    /// Returns a copy with usable pinch bounds: both positive and finite,
    /// smallest first. Invalid bounds fall back to the defaults.
    #[must_use]
    pub fn sanitized(self) -> Self {
        let defaults = Self::default();
        let valid = |v: f64| v.is_finite() && v > 0.0;
        let min = if valid(self.min_scale) { self.min_scale } else { defaults.min_scale };
        let max = if valid(self.max_scale) { self.max_scale } else { defaults.max_scale };
        Self {
            min_scale: min.min(max),
            max_scale: min.max(max),
            ..self
        }
    }
}

/// What a gesture event measures.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum GestureKind {
    /// Scale relative to the distance between the fingers when the gesture
    /// began, clamped to the configured bounds.
    Pinch {
        /// Cumulative scale factor.
        scale: f64,
        /// Current centroid of the two contacts.
        center: Point,
    },
    /// Centroid movement since the previous event.
    Pan {
        /// Screen-space delta.
        translation: Vec2,
    },
    /// Rotation relative to the pair's angle when the gesture began.
    Rotate {
        /// Cumulative angle in radians, in `(-π, π]`.
        angle: f64,
        /// Current centroid of the two contacts.
        center: Point,
    },
}

/// Where in its lifetime a gesture is.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum GesturePhase {
    /// The second finger went down.
    Began,
    /// One of the fingers moved.
    Changed,
    /// One of the fingers lifted.
    Ended,
}

/// A recognized gesture update.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GestureEvent {
    /// Measurement.
    pub kind: GestureKind,
    /// Lifetime phase.
    pub phase: GesturePhase,
    /// Time of the sample that produced the event.
    pub timestamp: HostTime,
}

#[derive(Clone, Copy, Debug)]
struct ActiveGesture {
    pair: [TouchId; 2],
    start_distance: f64,
    start_angle: f64,
    last_centroid: Point,
    scale: f64,
    angle: f64,
}

/// Tracks finger contacts and turns two-finger motion into gesture events.
#[derive(Clone, Debug)]
pub struct GestureRecognizer {
    config: GestureConfig,
    contacts: BTreeMap<TouchId, Point>,
    active: Option<ActiveGesture>,
}

impl GestureRecognizer {
    /// Creates a recognizer.
    #[must_use]
    pub fn new(config: GestureConfig) -> Self {
        Self {
            config: config.sanitized(),
            contacts: BTreeMap::new(),
            active: None,
        }
    }

    /// Current configuration.
    #[must_use]
    pub fn config(&self) -> &GestureConfig {
        &self.config
    }

    /// Replaces the configuration. Takes effect from the next gesture.
    pub fn set_config(&mut self, config: GestureConfig) {
        self.config = config.sanitized();
    }

    /// Returns the contacts of the gesture in progress, if any.
    #[must_use]
    pub fn active_pair(&self) -> Option<[TouchId; 2]> {
        self.active.map(|g| g.pair)
    }

    /// Returns `true` if `id` is one of the two contacts driving the current
    /// gesture.
    #[must_use]
    pub fn is_gesture_contact(&self, id: TouchId) -> bool {
        self.active.is_some_and(|g| g.pair.contains(&id))
    }

    /// Registers a finger going down.
    ///
    /// Returns the pair of contacts if this starts a gesture; `Began` events
    /// are appended to `out`.
    pub fn contact_down(
        &mut self,
        id: TouchId,
        position: Point,
        time: HostTime,
        out: &mut Vec<GestureEvent>,
    ) -> Option<[TouchId; 2]> {
        self.contacts.insert(id, position);
        if self.active.is_some() || !self.config.any_enabled() {
            return None;
        }
        let other = self
            .contacts
            .iter()
            .find(|(other, _)| **other != id)
            .map(|(other, pos)| (*other, *pos))?;
        let (a, b) = (other.1, position);
        let centroid = a.midpoint(b);
        let gesture = ActiveGesture {
            pair: [other.0, id],
            start_distance: a.distance(b),
            start_angle: angle_of(a, b),
            last_centroid: centroid,
            scale: 1.0,
            angle: 0.0,
        };
        self.active = Some(gesture);
        self.emit(&gesture, Vec2::ZERO, centroid, GesturePhase::Began, time, out);
        Some(gesture.pair)
    }

    /// Registers finger motion; appends `Changed` events if `id` drives the
    /// current gesture.
    pub fn contact_moved(
        &mut self,
        id: TouchId,
        position: Point,
        time: HostTime,
        out: &mut Vec<GestureEvent>,
    ) {
        if let Some(p) = self.contacts.get_mut(&id) {
            *p = position;
        }
        let Some(mut gesture) = self.active else {
            return;
        };
        if !gesture.pair.contains(&id) {
            return;
        }
        let (Some(&a), Some(&b)) = (
            self.contacts.get(&gesture.pair[0]),
            self.contacts.get(&gesture.pair[1]),
        ) else {
            return;
        };
        let centroid = a.midpoint(b);
        let translation = centroid - gesture.last_centroid;
        if gesture.start_distance > f64::EPSILON {
            gesture.scale = (a.distance(b) / gesture.start_distance)
                .clamp(self.config.min_scale, self.config.max_scale);
        }
        gesture.angle = wrap_angle(angle_of(a, b) - gesture.start_angle);
        gesture.last_centroid = centroid;
        self.active = Some(gesture);
        self.emit(&gesture, translation, centroid, GesturePhase::Changed, time, out);
    }

    /// Registers a finger lifting; appends `Ended` events if it ends the
    /// current gesture.
    pub fn contact_up(&mut self, id: TouchId, time: HostTime, out: &mut Vec<GestureEvent>) {
        self.contacts.remove(&id);
        let Some(gesture) = self.active else {
            return;
        };
        if gesture.pair.contains(&id) {
            self.active = None;
            let centroid = gesture.last_centroid;
            self.emit(&gesture, Vec2::ZERO, centroid, GesturePhase::Ended, time, out);
        }
    }

    /// Forgets every contact and any gesture in progress.
    pub fn reset(&mut self) {
        self.contacts.clear();
        self.active = None;
    }

    fn emit(
        &self,
        gesture: &ActiveGesture,
        translation: Vec2,
        center: Point,
        phase: GesturePhase,
        timestamp: HostTime,
        out: &mut Vec<GestureEvent>,
    ) {
        let mut push = |kind| {
            out.push(GestureEvent {
                kind,
                phase,
                timestamp,
            });
        };
        if self.config.pinch {
            push(GestureKind::Pinch {
                scale: gesture.scale,
                center,
            });
        }
        if self.config.pan {
            push(GestureKind::Pan { translation });
        }
        if self.config.rotate {
            push(GestureKind::Rotate {
                angle: gesture.angle,
                center,
            });
        }
    }
}

fn angle_of(a: Point, b: Point) -> f64 {
    let d = b - a;
    d.y.atan2(d.x)
}

fn wrap_angle(mut a: f64) -> f64 {
    while a > PI {
        a -= TAU;
    }
    while a <= -PI {
        a += TAU;
    }
    a
}

#[cfg(test)]
mod tests {
    use core::f64::consts::FRAC_PI_2;

    use super::*;

    fn t(ms: u64) -> HostTime {
        HostTime::from_millis(ms)
    }

    #[test]
    fn one_finger_is_not_a_gesture() {
        let mut g = GestureRecognizer::new(GestureConfig::default());
        let mut out = Vec::new();
        assert!(g.contact_down(TouchId(1), Point::ZERO, t(0), &mut out).is_none());
        g.contact_moved(TouchId(1), Point::new(10.0, 0.0), t(1), &mut out);
        assert!(out.is_empty());
    }

    #[test]
    fn pinch_pan_rotate_lifecycle() {
        let mut g = GestureRecognizer::new(GestureConfig::default());
        let mut out = Vec::new();
        g.contact_down(TouchId(1), Point::new(0.0, 0.0), t(0), &mut out);
        let pair = g.contact_down(TouchId(2), Point::new(100.0, 0.0), t(1), &mut out);
        assert_eq!(pair, Some([TouchId(1), TouchId(2)]));
        assert_eq!(out.len(), 3);
        assert!(out.iter().all(|e| e.phase == GesturePhase::Began));
        out.clear();

        // Second finger swings to (0, 200): distance doubles, quarter turn.
        g.contact_moved(TouchId(2), Point::new(0.0, 200.0), t(2), &mut out);
        let mut saw = 0;
        for e in &out {
            assert_eq!(e.phase, GesturePhase::Changed);
            match e.kind {
                GestureKind::Pinch { scale, center } => {
                    assert!((scale - 2.0).abs() < 1e-12);
                    assert_eq!(center, Point::new(0.0, 100.0));
                    saw += 1;
                }
                GestureKind::Pan { translation } => {
                    assert_eq!(translation, Vec2::new(-50.0, 100.0));
                    saw += 1;
                }
                GestureKind::Rotate { angle, .. } => {
                    assert!((angle - FRAC_PI_2).abs() < 1e-12);
                    saw += 1;
                }
            }
        }
        assert_eq!(saw, 3);
        out.clear();

        g.contact_up(TouchId(1), t(3), &mut out);
        assert!(out.iter().all(|e| e.phase == GesturePhase::Ended));
        assert!(g.active_pair().is_none());
    }

    #[test]
    fn pinch_scale_is_clamped() {
        let mut g = GestureRecognizer::new(GestureConfig {
            max_scale: 1.5,
            pan: false,
            rotate: false,
            ..GestureConfig::default()
        });
        let mut out = Vec::new();
        g.contact_down(TouchId(1), Point::new(0.0, 0.0), t(0), &mut out);
        g.contact_down(TouchId(2), Point::new(10.0, 0.0), t(0), &mut out);
        out.clear();
        g.contact_moved(TouchId(2), Point::new(100.0, 0.0), t(1), &mut out);
        assert_eq!(out.len(), 1, "only pinch is enabled");
        assert!(matches!(out[0].kind, GestureKind::Pinch { scale, .. } if scale == 1.5));
    }

    #[test]
    fn inverted_or_invalid_pinch_bounds_are_repaired() {
        let mut g = GestureRecognizer::new(GestureConfig {
            min_scale: 4.0,
            max_scale: 0.5,
            pan: false,
            rotate: false,
            ..GestureConfig::default()
        });
        assert_eq!((g.config().min_scale, g.config().max_scale), (0.5, 4.0));

        let mut out = Vec::new();
        g.contact_down(TouchId(1), Point::new(0.0, 0.0), t(0), &mut out);
        g.contact_down(TouchId(2), Point::new(10.0, 0.0), t(0), &mut out);
        out.clear();
        g.contact_moved(TouchId(2), Point::new(100.0, 0.0), t(1), &mut out);
        assert!(matches!(out[0].kind, GestureKind::Pinch { scale, .. } if scale == 4.0));

        g.set_config(GestureConfig {
            min_scale: f64::NAN,
            max_scale: -1.0,
            ..GestureConfig::default()
        });
        let defaults = GestureConfig::default();
        assert_eq!(g.config().min_scale, defaults.min_scale);
        assert_eq!(g.config().max_scale, defaults.max_scale);
    }

    #[test]
    fn all_disabled_never_begins() {
        let mut g = GestureRecognizer::new(GestureConfig {
            pinch: false,
            pan: false,
            rotate: false,
            ..GestureConfig::default()
        });
        let mut out = Vec::new();
        g.contact_down(TouchId(1), Point::ZERO, t(0), &mut out);
        assert!(g.contact_down(TouchId(2), Point::new(5.0, 5.0), t(0), &mut out).is_none());
        assert!(out.is_empty());
    }

    #[test]
    fn angles_wrap_into_half_open_range() {
        assert!((wrap_angle(3.0 * PI / 2.0) + FRAC_PI_2).abs() < 1e-12);
        assert_eq!(wrap_angle(-PI), PI);
    }
}

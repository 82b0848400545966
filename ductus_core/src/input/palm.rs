// Copyright 2026 the Ductus Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Palm rejection.
//!
//! A finger contact that lands close to a recent stylus contact, in both time
//! and space, is most likely the side of the drawing hand. The heuristic is
//! deliberately simple; its thresholds live in [`PalmRejectionConfig`].

use std::collections::BTreeSet;

use kurbo::Point;

use super::sample::{TouchId, ToolKind};
use crate::time::{Duration, HostTime};

/// Thresholds for palm rejection.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PalmRejectionConfig {
    /// Master switch.
    pub enabled: bool,
    /// How long after a stylus contact nearby fingers are suspect.
    pub time_window: Duration,
    /// Fingers closer than this to the last stylus contact are suspect, in
    /// screen pixels.
    pub distance_threshold: f64,
    /// Contact radius above which a finger counts as a large contact.
    pub radius_threshold: f64,
    /// When set, only large contacts are rejected.
    pub require_large_contact: bool,
}

impl Default for PalmRejectionConfig {
    fn default() -> Self {
        Self::standard()
    }
}

impl PalmRejectionConfig {
    /// 100 ms window, 100 px distance, radius above 20 required.
    #[must_use]
    pub const fn standard() -> Self {
        Self {
            enabled: true,
            time_window: Duration::from_millis(100),
            distance_threshold: 100.0,
            radius_threshold: 20.0,
            require_large_contact: true,
        }
    }

    /// Palm rejection turned off.
    #[must_use]
    pub const fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::standard()
        }
    }
}

/// Classifies contacts as palm or genuine input.
#[derive(Clone, Debug)]
pub struct PalmRejector {
    config: PalmRejectionConfig,
    last_stylus: Option<(Point, HostTime)>,
    rejected: BTreeSet<TouchId>,
}

impl PalmRejector {
    /// Creates a rejector with the given thresholds.
    #[must_use]
    pub fn new(config: PalmRejectionConfig) -> Self {
        Self {
            config,
            last_stylus: None,
            rejected: BTreeSet::new(),
        }
    }

    /// Current thresholds.
    #[must_use]
    pub fn config(&self) -> &PalmRejectionConfig {
        &self.config
    }

    /// Replaces the thresholds. Contacts already rejected stay rejected.
    pub fn set_config(&mut self, config: PalmRejectionConfig) {
        self.config = config;
    }

    /// Feeds one contact sample and returns `true` if it is a palm.
    ///
    /// Stylus and eraser contacts are never rejected; they refresh the
    /// most-recent-stylus record instead. Once a contact is rejected it stays
    /// rejected until [`end_contact`](Self::end_contact).
    pub fn observe(
        &mut self,
        id: TouchId,
        kind: ToolKind,
        position: Point,
        radius: f64,
        time: HostTime,
    ) -> bool {
        if kind.is_stylus() {
            self.last_stylus = Some((position, time));
            return false;
        }
        if self.rejected.contains(&id) {
            return true;
        }
        if !self.config.enabled {
            return false;
        }
        let Some((stylus_pos, stylus_time)) = self.last_stylus else {
            return false;
        };
        let gap = if time >= stylus_time {
            time - stylus_time
        } else {
            stylus_time - time
        };
        let recent = gap <= self.config.time_window;
        let near = position.distance(stylus_pos) < self.config.distance_threshold;
        let large = !self.config.require_large_contact || radius > self.config.radius_threshold;
        if recent && near && large {
            self.rejected.insert(id);
            return true;
        }
        false
    }

    /// Returns `true` if `id` has been rejected and has not ended yet.
    #[must_use]
    pub fn is_rejected(&self, id: TouchId) -> bool {
        self.rejected.contains(&id)
    }

    /// Forgets a contact that lifted or was cancelled.
    pub fn end_contact(&mut self, id: TouchId) {
        self.rejected.remove(&id);
    }

    /// Forgets all contacts and the stylus record.
    pub fn reset(&mut self) {
        self.last_stylus = None;
        self.rejected.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const STYLUS: TouchId = TouchId(1);
    const PALM: TouchId = TouchId(2);

    fn rejector_with_stylus_at(p: Point, ms: u64) -> PalmRejector {
        let mut r = PalmRejector::new(PalmRejectionConfig::default());
        assert!(!r.observe(STYLUS, ToolKind::Stylus, p, 1.0, HostTime::from_millis(ms)));
        r
    }

    #[test]
    fn large_finger_near_recent_stylus_is_rejected() {
        let mut r = rejector_with_stylus_at(Point::new(100.0, 100.0), 1_000);
        let t = HostTime::from_millis(1_050);
        assert!(r.observe(PALM, ToolKind::Finger, Point::new(140.0, 130.0), 30.0, t));
        assert!(r.is_rejected(PALM));
    }

    #[test]
    fn far_or_late_fingers_are_accepted() {
        let mut r = rejector_with_stylus_at(Point::new(100.0, 100.0), 1_000);
        let far = Point::new(100.0, 320.0);
        assert!(!r.observe(PALM, ToolKind::Finger, far, 30.0, HostTime::from_millis(1_050)));
        let near = Point::new(110.0, 100.0);
        assert!(!r.observe(TouchId(3), ToolKind::Finger, near, 30.0, HostTime::from_millis(1_250)));
    }

    #[test]
    fn small_contacts_pass_when_size_is_required() {
        let mut r = rejector_with_stylus_at(Point::new(100.0, 100.0), 1_000);
        let t = HostTime::from_millis(1_010);
        assert!(!r.observe(PALM, ToolKind::Finger, Point::new(105.0, 100.0), 5.0, t));

        let mut any_size = PalmRejector::new(PalmRejectionConfig {
            require_large_contact: false,
            ..PalmRejectionConfig::default()
        });
        any_size.observe(STYLUS, ToolKind::Stylus, Point::new(100.0, 100.0), 0.0, t);
        assert!(any_size.observe(PALM, ToolKind::Finger, Point::new(105.0, 100.0), 5.0, t));
    }

    #[test]
    fn stylus_and_eraser_are_never_rejected() {
        let mut r = rejector_with_stylus_at(Point::new(100.0, 100.0), 1_000);
        let t = HostTime::from_millis(1_001);
        for kind in [ToolKind::Stylus, ToolKind::Eraser] {
            assert!(!r.observe(TouchId(9), kind, Point::new(100.0, 100.0), 500.0, t));
        }
    }

    #[test]
    fn rejection_is_sticky_until_contact_ends() {
        let mut r = rejector_with_stylus_at(Point::new(100.0, 100.0), 1_000);
        assert!(r.observe(
            PALM,
            ToolKind::Finger,
            Point::new(100.0, 150.0),
            25.0,
            HostTime::from_millis(1_020)
        ));
        // Long after the window and far away, still the same palm.
        assert!(r.observe(
            PALM,
            ToolKind::Finger,
            Point::new(900.0, 900.0),
            25.0,
            HostTime::from_millis(5_000)
        ));
        r.end_contact(PALM);
        assert!(!r.is_rejected(PALM));
    }

    #[test]
    fn disabled_never_rejects() {
        let mut r = PalmRejector::new(PalmRejectionConfig::disabled());
        let t = HostTime::from_millis(0);
        r.observe(STYLUS, ToolKind::Stylus, Point::ZERO, 1.0, t);
        assert!(!r.observe(PALM, ToolKind::Finger, Point::ZERO, 50.0, t));
    }
}

// Copyright 2026 the Ductus Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Short-horizon motion prediction.
//!
//! Each contact keeps its last few samples. From them the predictor
//! estimates velocity and acceleration and extrapolates a handful of frames
//! ahead with constant-acceleration motion:
//!
//! ```text
//! p(t) = p + v·t + ½·a·t²
//! ```
//!
//! Predicted pressure decays geometrically per frame. Confidence falls as the
//! recent speed becomes less steady.

use std::collections::BTreeMap;

use kurbo::Point;

use super::sample::{PredictedPoint, TouchId};
use crate::geometry::{BoundedHistory, Kinematics, TimedPoint, mean_variance, velocity_between};
use crate::time::{Duration, HostTime};

/// Prediction parameters.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PredictionConfig {
    /// Master switch.
    pub enabled: bool,
    /// How many frames ahead to predict.
    pub frames: u32,
    /// Interval between predicted points, normally the display's frame
    /// interval.
    pub frame_interval: Duration,
    /// Samples kept per contact.
    pub history: usize,
    /// Per-frame pressure decay factor.
    pub pressure_decay: f64,
}

impl Default for PredictionConfig {
    fn default() -> Self {
        Self::for_refresh_rate(120)
    }
}

impl PredictionConfig {
    /// Three frames ahead at the given refresh rate, five samples of history.
    ///
    /// # Panics
    ///
    /// Panics if `hz` is zero.
    #[must_use]
    pub const fn for_refresh_rate(hz: u32) -> Self {
        Self {
            enabled: true,
            frames: 3,
            frame_interval: Duration::from_refresh_rate(hz),
            history: 5,
            pressure_decay: 0.95,
        }
    }
}

#[derive(Clone, Copy, Debug)]
struct Entry {
    point: TimedPoint,
    pressure: f64,
}

/// Extrapolates contacts a few frames into the future.
#[derive(Clone, Debug)]
pub struct Predictor {
    config: PredictionConfig,
    histories: BTreeMap<TouchId, BoundedHistory<Entry>>,
}

impl Predictor {
    /// Creates a predictor.
    #[must_use]
    pub fn new(config: PredictionConfig) -> Self {
        Self {
            config,
            histories: BTreeMap::new(),
        }
    }

    /// Current parameters.
    #[must_use]
    pub fn config(&self) -> &PredictionConfig {
        &self.config
    }

    /// Replaces the parameters. Histories are dropped.
    pub fn set_config(&mut self, config: PredictionConfig) {
        self.config = config;
        self.histories.clear();
    }

    /// Records a real sample for `id`.
    pub fn observe(&mut self, id: TouchId, pos: Point, pressure: f64, time: HostTime) {
        let capacity = self.config.history.max(2);
        self.histories
            .entry(id)
            .or_insert_with(|| BoundedHistory::new(capacity))
            .push(Entry {
                point: TimedPoint { pos, time },
                pressure,
            });
    }

    /// Predicts the next [`frames`](PredictionConfig::frames) points for
    /// `id`.
    ///
    /// Returns an empty vector when prediction is disabled or fewer than two
    /// samples have been observed.
    #[must_use]
    pub fn predict(&self, id: TouchId) -> Vec<PredictedPoint> {
        if !self.config.enabled || self.config.frames == 0 {
            return Vec::new();
        }
        let Some(history) = self.histories.get(&id) else {
            return Vec::new();
        };
        let points: Vec<TimedPoint> = history.iter().map(|e| e.point).collect();
        let Some(kinematics) = Kinematics::estimate(&points) else {
            return Vec::new();
        };
        let Some(last) = history.last() else {
            return Vec::new();
        };
        let confidence = confidence(&points);
        let dt = self.config.frame_interval;

        let mut out = Vec::with_capacity(self.config.frames as usize);
        let mut pressure = last.pressure;
        let mut ahead = Duration::ZERO;
        for frame in 1..=self.config.frames {
            ahead = ahead.saturating_add(dt);
            pressure *= self.config.pressure_decay;
            out.push(PredictedPoint {
                position: kinematics.extrapolate(last.point.pos, ahead.as_secs_f64()),
                pressure: pressure.clamp(0.0, 1.0),
                timestamp: last.point.time + ahead,
                frame_offset: frame,
                confidence,
            });
        }
        out
    }

    /// Drops the history of a contact that ended.
    pub fn forget(&mut self, id: TouchId) {
        self.histories.remove(&id);
    }

    /// Drops every history.
    pub fn reset(&mut self) {
        self.histories.clear();
    }
}

/// `1 / (1 + σ²/μ²)` over the speeds between consecutive samples.
///
/// The variance is normalized by the squared mean speed so the score does
/// not depend on how fast the contact moves.
fn confidence(points: &[TimedPoint]) -> f64 {
    let speeds = points
        .windows(2)
        .filter_map(|w| velocity_between(w[0], w[1]))
        .map(|v| v.hypot());
    let (mean, variance) = mean_variance(speeds);
    if mean <= f64::EPSILON {
        return 1.0;
    }
    1.0 / (1.0 + variance / (mean * mean))
}

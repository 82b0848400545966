// Copyright 2026 the Ductus Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Per-contact recency-weighted smoothing.

use std::collections::BTreeMap;

use kurbo::Point;

use super::sample::TouchId;
use crate::geometry::BoundedHistory;

#[derive(Clone, Copy, Debug)]
struct Entry {
    pos: Point,
    pressure: f64,
}

/// Weighted moving average over the last few samples of each contact.
///
/// The window holds `max(1, floor(factor × 10))` samples. The sample of
/// recency rank `i` (oldest is 0) has weight `(i + 1)²`, so the newest
/// sample dominates and lag stays small.
#[derive(Clone, Debug)]
pub struct Smoother {
    window: usize,
    histories: BTreeMap<TouchId, BoundedHistory<Entry>>,
}

impl Smoother {
    /// Creates a smoother for the given smoothing factor in `[0, 1]`.
    #[must_use]
    pub fn new(factor: f64) -> Self {
        Self {
            window: window_for(factor),
            histories: BTreeMap::new(),
        }
    }

    /// Number of samples averaged per contact.
    #[must_use]
    pub fn window(&self) -> usize {
        self.window
    }

    /// Changes the smoothing factor. Existing histories are dropped.
    pub fn set_factor(&mut self, factor: f64) {
        self.window = window_for(factor);
        self.histories.clear();
    }

    /// Records a sample for `id` and returns the smoothed position and
    /// pressure.
    pub fn smooth(&mut self, id: TouchId, pos: Point, pressure: f64) -> (Point, f64) {
        let window = self.window;
        let history = self
            .histories
            .entry(id)
            .or_insert_with(|| BoundedHistory::new(window));
        history.push(Entry { pos, pressure });

        let mut total = 0.0;
        let (mut x, mut y, mut p) = (0.0, 0.0, 0.0);
        for (i, e) in history.iter().enumerate() {
            let rank = (i + 1) as f64;
            let w = rank * rank;
            total += w;
            x += e.pos.x * w;
            y += e.pos.y * w;
            p += e.pressure * w;
        }
        (Point::new(x / total, y / total), (p / total).clamp(0.0, 1.0))
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

#[expect(
    clippy::cast_possible_truncation,
    reason = "factor is clamped to [0, 1] so the window is at most 10"
)]
fn window_for(factor: f64) -> usize {
    let factor = if factor.is_finite() { factor.clamp(0.0, 1.0) } else { 0.0 };
    ((factor * 10.0).floor() as usize).max(1)
}

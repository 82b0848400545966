// Copyright 2026 the Ductus Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Motion primitives: bounded sample histories and finite-difference
//! kinematics.
//!
//! Positions are [`kurbo::Point`]s in canvas space; velocities and
//! accelerations are [`kurbo::Vec2`]s in pixels per second and pixels per
//! second squared.

use std::collections::VecDeque;

use kurbo::{Point, Vec2};

use crate::time::HostTime;

/// A fixed-capacity FIFO that evicts its oldest entry when full.
#[derive(Clone, Debug)]
pub struct BoundedHistory<T> {
    items: VecDeque<T>,
    capacity: usize,
}

impl<T> BoundedHistory<T> {
    /// Creates an empty history holding at most `capacity` entries.
    ///
    /// A capacity of zero is treated as one.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            items: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Appends an entry, evicting the oldest one if the history is full.
    pub fn push(&mut self, item: T) {
        if self.items.len() == self.capacity {
            self.items.pop_front();
        }
        self.items.push_back(item);
    }

    /// Number of entries currently held.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns `true` if the history holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Maximum number of entries.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Most recent entry.
    #[must_use]
    pub fn last(&self) -> Option<&T> {
        self.items.back()
    }

    /// Iterates from oldest to newest.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &T> + ExactSizeIterator {
        self.items.iter()
    }

    /// Removes every entry.
    pub fn clear(&mut self) {
        self.items.clear();
    }
}

/// A timestamped position.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TimedPoint {
    /// Canvas-space position.
    pub pos: Point,
    /// Sample time.
    pub time: HostTime,
}

/// Velocity between two timed points, in pixels per second.
///
/// Returns `None` if `b` is not strictly after `a`.
#[must_use]
pub fn velocity_between(a: TimedPoint, b: TimedPoint) -> Option<Vec2> {
    if b.time <= a.time {
        return None;
    }
    let dt = (b.time - a.time).as_secs_f64();
    Some((b.pos - a.pos) / dt)
}

/// First and second derivative estimates for the tail of a motion history.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Kinematics {
    /// Velocity from the last two samples.
    pub velocity: Vec2,
    /// Acceleration from the last two velocity estimates, or zero when only
    /// two samples are available.
    pub acceleration: Vec2,
}

impl Kinematics {
    /// Estimates kinematics from the newest samples of `points`
    /// (ordered oldest to newest).
    ///
    /// Needs at least two samples with increasing timestamps.
    #[must_use]
    pub fn estimate(points: &[TimedPoint]) -> Option<Self> {
        let n = points.len();
        if n < 2 {
            return None;
        }
        let v1 = velocity_between(points[n - 2], points[n - 1])?;
        let acceleration = if n >= 3 {
            match velocity_between(points[n - 3], points[n - 2]) {
                Some(v0) => {
                    // Velocities are centred on their intervals.
                    let t0 = mid(points[n - 3].time, points[n - 2].time);
                    let t1 = mid(points[n - 2].time, points[n - 1].time);
                    if t1 > t0 {
                        (v1 - v0) / (t1 - t0)
                    } else {
                        Vec2::ZERO
                    }
                }
                None => Vec2::ZERO,
            }
        } else {
            Vec2::ZERO
        };
        Some(Self {
            velocity: v1,
            acceleration,
        })
    }

    /// Position after `t` seconds of constant-acceleration motion from `pos`.
    #[must_use]
    pub fn extrapolate(&self, pos: Point, t: f64) -> Point {
        pos + self.velocity * t + self.acceleration * (0.5 * t * t)
    }
}

fn mid(a: HostTime, b: HostTime) -> f64 {
    (a.0 as f64 + b.0 as f64) * 0.5 / crate::time::NANOS_PER_SEC as f64
}

/// Mean and population variance of a sequence.
///
/// Returns `(0.0, 0.0)` for an empty sequence.
#[must_use]
pub fn mean_variance(values: impl IntoIterator<Item = f64>) -> (f64, f64) {
    let mut count = 0_u32;
    let mut sum = 0.0;
    let mut sum_sq = 0.0;
    for v in values {
        count += 1;
        sum += v;
        sum_sq += v * v;
    }
    if count == 0 {
        return (0.0, 0.0);
    }
    let n = f64::from(count);
    let mean = sum / n;
    let variance = (sum_sq / n - mean * mean).max(0.0);
    (mean, variance)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::NANOS_PER_MILLI;

    fn tp(x: f64, y: f64, ms: u64) -> TimedPoint {
        TimedPoint {
            pos: Point::new(x, y),
            time: HostTime(ms * NANOS_PER_MILLI),
        }
    }

    #[test]
    fn bounded_history_evicts_oldest() {
        let mut h = BoundedHistory::new(3);
        for i in 0..5 {
            h.push(i);
        }
        assert_eq!(h.iter().copied().collect::<Vec<_>>(), vec![2, 3, 4]);
        assert_eq!(h.last(), Some(&4));
    }

    #[test]
    fn zero_capacity_holds_one() {
        let mut h = BoundedHistory::new(0);
        h.push(1);
        h.push(2);
        assert_eq!(h.len(), 1);
        assert_eq!(h.last(), Some(&2));
    }

    #[test]
    fn velocity_requires_advancing_time() {
        assert!(velocity_between(tp(0.0, 0.0, 5), tp(1.0, 0.0, 5)).is_none());
        let v = velocity_between(tp(0.0, 0.0, 0), tp(10.0, 0.0, 10)).unwrap();
        assert!((v.x - 1000.0).abs() < 1e-9, "10px in 10ms is 1000px/s");
    }

    #[test]
    fn constant_velocity_has_no_acceleration() {
        let pts = [tp(0.0, 0.0, 0), tp(8.0, 0.0, 8), tp(16.0, 0.0, 16)];
        let k = Kinematics::estimate(&pts).unwrap();
        assert!((k.velocity.x - 1000.0).abs() < 1e-6);
        assert!(k.acceleration.hypot() < 1e-6);
    }

    #[test]
    fn acceleration_from_speeding_up() {
        // Speed goes from 1000 px/s to 2000 px/s over 10ms.
        let pts = [tp(0.0, 0.0, 0), tp(10.0, 0.0, 10), tp(30.0, 0.0, 20)];
        let k = Kinematics::estimate(&pts).unwrap();
        assert!((k.acceleration.x - 100_000.0).abs() < 1e-3);
        let next = k.extrapolate(Point::new(30.0, 0.0), 0.01);
        assert!((next.x - 55.0).abs() < 1e-6, "got {}", next.x);
    }

    #[test]
    fn mean_variance_of_constant_is_zero() {
        let (m, v) = mean_variance([3.0, 3.0, 3.0]);
        assert_eq!(m, 3.0);
        assert_eq!(v, 0.0);
        assert_eq!(mean_variance(core::iter::empty()), (0.0, 0.0));
    }
}

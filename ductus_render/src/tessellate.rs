// Copyright 2026 the Ductus Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Stroke to path conversion.

use ductus_core::input::PredictedPoint;
use ductus_core::paint::Paint;
use ductus_core::spline::catmull_rom;
use ductus_core::stroke::Stroke;
use kurbo::{BezPath, Point};

/// Smooth canvas-space path through the stroke's samples.
#[must_use]
pub fn stroke_path(stroke: &Stroke) -> BezPath {
    let points: Vec<Point> = stroke.points().collect();
    catmull_rom(&points)
}

/// Path through the real samples followed by the predicted points, or `None`
/// when there is nothing predicted.
#[must_use]
pub fn ghost_path(stroke: &Stroke, predicted: &[PredictedPoint]) -> Option<BezPath> {
    if predicted.is_empty() {
        return None;
    }
    let points: Vec<Point> = stroke
        .points()
        .chain(predicted.iter().map(|p| p.position))
        .collect();
    Some(catmull_rom(&points))
}

/// Paint for the ghost pass: the stroke's paint with alpha scaled.
#[must_use]
pub fn ghost_paint(paint: &Paint, ghost_alpha: f32) -> Paint {
    paint.with_alpha_scaled(ghost_alpha)
}

#[cfg(test)]
mod tests {
    use ductus_core::input::{TouchId, TouchSample, ToolKind};
    use ductus_core::layer::LayerId;
    use ductus_core::stroke::StrokeId;
    use ductus_core::time::HostTime;
    use kurbo::{PathEl, Vec2};

    use super::*;

    fn sample(x: f64, ms: u64) -> TouchSample {
        let p = Point::new(x, x);
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
            velocity: Vec2::ZERO,
        }
    }

    fn stroke(n: u32) -> Stroke {
        let mut s = Stroke::new(StrokeId(1), sample(0.0, 0), LayerId(0), Paint::default(), 0.0);
        for i in 1..n {
            s.push(sample(f64::from(i) * 10.0, u64::from(i)));
        }
        s
    }

    fn ends(path: &BezPath) -> (Point, Point) {
        let els = path.elements();
        let first = match els.first() {
            Some(PathEl::MoveTo(p)) => *p,
            other => panic!("path must start with move_to, got {other:?}"),
        };
        let last = els.last().and_then(PathEl::end_point).unwrap_or(first);
        (first, last)
    }

    #[test]
    fn path_runs_through_first_and_last_sample() {
        let path = stroke_path(&stroke(4));
        assert_eq!(ends(&path), (Point::ZERO, Point::new(30.0, 30.0)));
    }

    #[test]
    fn ghost_extends_to_last_prediction() {
        let s = stroke(3);
        assert!(ghost_path(&s, &[]).is_none());
        let predicted = [PredictedPoint {
            position: Point::new(50.0, 50.0),
            pressure: 0.5,
            timestamp: HostTime::from_millis(10),
            frame_offset: 1,
            confidence: 1.0,
        }];
        let ghost = ghost_path(&s, &predicted).unwrap();
        assert_eq!(ends(&ghost).1, Point::new(50.0, 50.0));
        assert_eq!(ghost_paint(s.paint(), 0.5).alpha, 0.5);
    }
}

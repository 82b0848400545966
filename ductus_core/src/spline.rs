// Copyright 2026 the Ductus Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Catmull-Rom interpolation of point sequences into cubic Béziers.
//!
//! Each segment `p1 → p2` becomes a cubic with control points
//!
//! ```text
//! c1 = p1 + (p2 - p0) / 6
//! c2 = p2 - (p3 - p1) / 6
//! ```
//!
//! where `p0` and `p3` are the neighbouring samples (clamped at the ends).
//! The curve passes through every input point, so noisy raw input comes out
//! smooth without a separate smoothing pass at draw time.

use kurbo::{BezPath, Point};

/// Builds a path through `points` using Catmull-Rom control points.
///
/// A single point yields a zero-length line so that stroking it still
/// produces a dot. An empty slice yields an empty path.
#[must_use]
pub fn catmull_rom(points: &[Point]) -> BezPath {
    let mut path = BezPath::new();
    let Some(&first) = points.first() else {
        return path;
    };
    path.move_to(first);
    if points.len() == 1 {
        path.line_to(first);
        return path;
    }
    let last = points.len() - 1;
    for i in 0..last {
        let p0 = points[i.saturating_sub(1)];
        let p1 = points[i];
        let p2 = points[i + 1];
        let p3 = points[(i + 2).min(last)];
        let c1 = p1 + (p2 - p0) / 6.0;
        let c2 = p2 - (p3 - p1) / 6.0;
        path.curve_to(c1, c2, p2);
    }
    path
}

#[cfg(test)]
mod tests {
    use kurbo::{PathEl, Shape};

    use super::*;

    #[test]
    fn empty_input_is_empty_path() {
        assert!(catmull_rom(&[]).elements().is_empty());
    }

    #[test]
    fn single_point_is_a_dot() {
        let p = Point::new(4.0, 5.0);
        let path = catmull_rom(&[p]);
        assert_eq!(path.elements(), &[PathEl::MoveTo(p), PathEl::LineTo(p)]);
    }

    #[test]
    fn passes_through_every_point() {
        let pts = [
            Point::new(0.0, 0.0),
            Point::new(10.0, 5.0),
            Point::new(20.0, -3.0),
            Point::new(30.0, 0.0),
        ];
        let path = catmull_rom(&pts);
        let ends: Vec<Point> = path
            .elements()
            .iter()
            .filter_map(|el| match el {
                PathEl::MoveTo(p) | PathEl::CurveTo(_, _, p) => Some(*p),
                _ => None,
            })
            .collect();
        assert_eq!(ends, pts);
    }

    #[test]
    fn collinear_points_stay_on_the_line() {
        let pts = [
            Point::new(0.0, 0.0),
            Point::new(10.0, 0.0),
            Point::new(20.0, 0.0),
        ];
        let bbox = catmull_rom(&pts).bounding_box();
        assert_eq!(bbox.y0, 0.0);
        assert_eq!(bbox.y1, 0.0);
        assert_eq!(bbox.x1, 20.0);
    }
}

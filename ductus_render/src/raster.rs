// Copyright 2026 the Ductus Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! CPU rasterization of paths into [`Surface`]s.
//!
//! Paths are transformed to device space and flattened to polylines first.
//! Strokes are rasterized by distance to each segment, accumulating the
//! maximum coverage per pixel so overlapping segments never double-blend.
//! Every corner is drawn round regardless of [`StrokeJoin`]. Fills use
//! non-zero winding with four vertical subsamples per pixel when
//! anti-aliased.
//!
//! [`StrokeJoin`]: ductus_core::paint::StrokeJoin

use ductus_core::paint::{Paint, PaintStyle, StrokeCap};
use kurbo::{Affine, BezPath, PathEl, Point, Rect, Vec2};

use crate::surface::{Surface, pixel_span};

/// Flattening tolerance in device pixels.
const TOLERANCE: f64 = 0.1;

/// Vertical subsamples per pixel row for anti-aliased fills.
const FILL_SUBSAMPLES: u8 = 4;

/// Draws `path` with `paint`, mapping path coordinates to device pixels with
/// `transform`.
///
/// Returns the device-pixel bounds of the touched pixels, or `None` if
/// nothing was drawn.
pub fn draw_path(
    surface: &mut Surface,
    path: &BezPath,
    paint: &Paint,
    transform: Affine,
) -> Option<Rect> {
    let polylines = flatten(&(transform * path.clone()));
    if polylines.is_empty() {
        return None;
    }
    match paint.style {
        PaintStyle::Stroke => {
            let width = paint.width * transform.determinant().abs().sqrt();
            stroke(surface, &polylines, paint, width)
        }
        PaintStyle::Fill => fill(surface, &polylines, paint),
    }
}

#[derive(Debug, Default)]
struct Polyline {
    points: Vec<Point>,
    closed: bool,
    /// At least one segment was drawn, possibly of zero length.
    drawn: bool,
}

fn flatten(path: &BezPath) -> Vec<Polyline> {
    let mut out = Vec::new();
    let mut current = Polyline::default();
    kurbo::flatten(path.iter(), TOLERANCE, |el| match el {
        PathEl::MoveTo(p) => {
            let done = core::mem::take(&mut current);
            if done.drawn {
                out.push(done);
            }
            current.points.push(p);
        }
        PathEl::LineTo(p) => {
            current.drawn = true;
            if current.points.last() != Some(&p) {
                current.points.push(p);
            }
        }
        PathEl::ClosePath => {
            current.closed = true;
            let done = core::mem::take(&mut current);
            if let Some(&start) = done.points.first() {
                current.points.push(start);
            }
            if done.drawn {
                out.push(done);
            }
        }
        PathEl::QuadTo(..) | PathEl::CurveTo(..) => {}
    });
    if current.drawn {
        out.push(current);
    }
    out
}

// ---------------------------------------------------------------------------
// Coverage mask
// ---------------------------------------------------------------------------

/// Per-pixel coverage over an integer span of the surface.
struct Mask {
    x0: u32,
    y0: u32,
    width: u32,
    height: u32,
    coverage: Vec<f32>,
}

impl Mask {
    fn new(span: (u32, u32, u32, u32)) -> Self {
        let (x0, y0, x1, y1) = span;
        let (width, height) = (x1 - x0, y1 - y0);
        Self {
            x0,
            y0,
            width,
            height,
            coverage: vec![0.0; width as usize * height as usize],
        }
    }

    fn rect(&self) -> Rect {
        Rect::new(
            f64::from(self.x0),
            f64::from(self.y0),
            f64::from(self.x0 + self.width),
            f64::from(self.y0 + self.height),
        )
    }

    fn raise(&mut self, x: u32, y: u32, c: f32) {
        let i = (y - self.y0) as usize * self.width as usize + (x - self.x0) as usize;
        if let Some(v) = self.coverage.get_mut(i) {
            *v = v.max(c);
        }
    }

    fn add(&mut self, x: u32, y: u32, c: f32) {
        let i = (y - self.y0) as usize * self.width as usize + (x - self.x0) as usize;
        if let Some(v) = self.coverage.get_mut(i) {
            *v = (*v + c).min(1.0);
        }
    }

    /// Blends the paint through the mask and returns the touched bounds.
    fn apply(&self, surface: &mut Surface, paint: &Paint) -> Option<Rect> {
        let src = paint.source_premultiplied();
        let mut touched: Option<Rect> = None;
        for row in 0..self.height {
            for col in 0..self.width {
                let c = self.coverage[(row * self.width + col) as usize];
                if c <= 0.0 {
                    continue;
                }
                let (x, y) = (self.x0 + col, self.y0 + row);
                surface.blend_pixel(x, y, src, paint.blend_mode, c);
                let px = Rect::new(
                    f64::from(x),
                    f64::from(y),
                    f64::from(x) + 1.0,
                    f64::from(y) + 1.0,
                );
                touched = Some(touched.map_or(px, |t| t.union(px)));
            }
        }
        touched
    }
}

/// Clamps a device coordinate to a pixel index in `[lo, hi]`.
#[expect(
    clippy::cast_possible_truncation,
    reason = "clamped to a u32 range before the cast"
)]
fn px(v: f64, lo: u32, hi: u32) -> u32 {
    v.clamp(f64::from(lo), f64::from(hi)) as u32
}

fn points_bounds(polylines: &[Polyline]) -> Option<Rect> {
    polylines
        .iter()
        .flat_map(|p| p.points.iter().copied())
        .map(|p| Rect::from_points(p, p))
        .reduce(|a, b| a.union(b))
}

// ---------------------------------------------------------------------------
// Stroke
// ---------------------------------------------------------------------------

#[derive(Clone, Copy, Debug)]
struct Segment {
    a: Point,
    b: Point,
    /// No coverage before `a` along the segment direction.
    cut_start: bool,
    /// No coverage past `b` along the segment direction.
    cut_end: bool,
}

fn stroke(
    surface: &mut Surface,
    polylines: &[Polyline],
    paint: &Paint,
    width: f64,
) -> Option<Rect> {
    if width.is_nan() || width <= 0.0 {
        return None;
    }
    let hw = width / 2.0;
    let reach = hw * core::f64::consts::SQRT_2 + 1.0;
    let area = points_bounds(polylines)?.inflate(reach, reach);
    let mut mask = Mask::new(pixel_span(area.intersect(surface.bounds()))?);

    for line in polylines {
        match line.points.as_slice() {
            [] => {}
            [p] => dot(&mut mask, *p, hw, paint),
            pts => {
                for seg in segments(pts, line.closed, paint.cap, hw) {
                    cover_segment(&mut mask, seg, hw, paint.anti_alias);
                }
            }
        }
    }
    mask.apply(surface, paint)
}

fn segments(pts: &[Point], closed: bool, cap: StrokeCap, hw: f64) -> Vec<Segment> {
    let mut segs: Vec<Segment> = pts
        .windows(2)
        .map(|w| Segment {
            a: w[0],
            b: w[1],
            cut_start: false,
            cut_end: false,
        })
        .collect();
    if closed {
        if let (Some(&first), Some(&last)) = (pts.first(), pts.last())
            && first != last
        {
            segs.push(Segment {
                a: last,
                b: first,
                cut_start: false,
                cut_end: false,
            });
        }
        return segs;
    }
    let n = segs.len();
    if cap != StrokeCap::Round {
        let ext = if cap == StrokeCap::Square { hw } else { 0.0 };
        if let Some(first) = segs.first_mut() {
            let dir = unit(first.b - first.a);
            first.a -= dir * ext;
            first.cut_start = true;
        }
        if let Some(last) = segs.get_mut(n - 1) {
            let dir = unit(last.b - last.a);
            last.b += dir * ext;
            last.cut_end = true;
        }
    }
    segs
}

fn unit(v: Vec2) -> Vec2 {
    let len = v.hypot();
    if len > 0.0 { v / len } else { Vec2::ZERO }
}

fn cover_segment(mask: &mut Mask, seg: Segment, hw: f64, anti_alias: bool) {
    let reach = hw + 1.0;
    let r = Rect::from_points(seg.a, seg.b)
        .inflate(reach, reach)
        .intersect(mask.rect());
    let Some((x0, y0, x1, y1)) = pixel_span(r) else {
        return;
    };
    let d = seg.b - seg.a;
    let len2 = d.hypot2();
    for y in y0..y1 {
        for x in x0..x1 {
            let p = Point::new(f64::from(x) + 0.5, f64::from(y) + 0.5);
            let t = if len2 > 0.0 { (p - seg.a).dot(d) / len2 } else { 0.0 };
            if (seg.cut_start && t < 0.0) || (seg.cut_end && t > 1.0) {
                continue;
            }
            let nearest = seg.a + d * t.clamp(0.0, 1.0);
            let dist = p.distance(nearest);
            let c = coverage(dist, hw, anti_alias);
            if c > 0.0 {
                mask.raise(x, y, c);
            }
        }
    }
}

#[expect(
    clippy::cast_possible_truncation,
    reason = "coverage is in [0, 1]"
)]
fn coverage(dist: f64, hw: f64, anti_alias: bool) -> f32 {
    if anti_alias {
        (hw + 0.5 - dist).clamp(0.0, 1.0) as f32
    } else if dist <= hw {
        1.0
    } else {
        0.0
    }
}

/// A lone point: a disc for round caps, a square for square caps, nothing
/// for butt caps.
fn dot(mask: &mut Mask, center: Point, hw: f64, paint: &Paint) {
    if paint.cap == StrokeCap::Butt {
        return;
    }
    let r = Rect::from_center_size(center, (2.0 * hw + 2.0, 2.0 * hw + 2.0)).intersect(mask.rect());
    let Some((x0, y0, x1, y1)) = pixel_span(r) else {
        return;
    };
    for y in y0..y1 {
        for x in x0..x1 {
            let p = Point::new(f64::from(x) + 0.5, f64::from(y) + 0.5);
            let dist = match paint.cap {
                StrokeCap::Round => p.distance(center),
                StrokeCap::Square => (p.x - center.x).abs().max((p.y - center.y).abs()),
                StrokeCap::Butt => continue,
            };
            let c = coverage(dist, hw, paint.anti_alias);
            if c > 0.0 {
                mask.raise(x, y, c);
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Fill
// ---------------------------------------------------------------------------

fn fill(surface: &mut Surface, polylines: &[Polyline], paint: &Paint) -> Option<Rect> {
    let area = points_bounds(polylines)?;
    let mut mask = Mask::new(pixel_span(area.intersect(surface.bounds()))?);

    let mut edges: Vec<(Point, Point)> = Vec::new();
    for line in polylines {
        let pts = &line.points;
        for i in 0..pts.len() {
            let (a, b) = (pts[i], pts[(i + 1) % pts.len()]);
            if a.y != b.y {
                edges.push((a, b));
            }
        }
    }

    let samples = if paint.anti_alias { FILL_SUBSAMPLES } else { 1 };
    let weight = 1.0 / f32::from(samples);
    let (mx0, mx1) = (mask.x0, mask.x0 + mask.width);
    let mut crossings: Vec<(f64, i32)> = Vec::new();
    for y in mask.y0..mask.y0 + mask.height {
        for s in 0..samples {
            let sy = f64::from(y) + (f64::from(s) + 0.5) / f64::from(samples);
            crossings.clear();
            for &(a, b) in &edges {
                let (lo, hi) = if a.y < b.y { (a.y, b.y) } else { (b.y, a.y) };
                if sy < lo || sy >= hi {
                    continue;
                }
                let x = a.x + (sy - a.y) * (b.x - a.x) / (b.y - a.y);
                crossings.push((x, if b.y > a.y { 1 } else { -1 }));
            }
            crossings.sort_by(|l, r| l.0.total_cmp(&r.0));

            let mut winding = 0;
            for pair in crossings.windows(2) {
                winding += pair[0].1;
                if winding == 0 {
                    continue;
                }
                // Pixels whose centers fall in [xa, xb).
                let start = px((pair[0].0 - 0.5).ceil(), mx0, mx1);
                let end = px((pair[1].0 - 0.5).ceil(), mx0, mx1);
                for x in start..end {
                    mask.add(x, y, weight);
                }
            }
        }
    }
    mask.apply(surface, paint)
}

#[cfg(test)]
mod tests {
    use ductus_core::paint::{BlendMode, Color};
    use kurbo::Shape;

    use super::*;

    fn line(a: (f64, f64), b: (f64, f64)) -> BezPath {
        let mut p = BezPath::new();
        p.move_to(a);
        p.line_to(b);
        p
    }

    fn alpha(s: &Surface, x: u32, y: u32) -> u8 {
        s.pixel(x, y).map_or(0, |p| p[3])
    }

    #[test]
    fn horizontal_stroke_covers_its_width() {
        let mut s = Surface::new(32, 32);
        let paint = Paint::stroke(Color::BLACK, 4.0);
        let bounds = draw_path(&mut s, &line((4.0, 16.0), (28.0, 16.0)), &paint, Affine::IDENTITY);
        assert!(bounds.is_some());
        assert_eq!(alpha(&s, 16, 15), 255);
        assert_eq!(alpha(&s, 16, 16), 255);
        assert_eq!(alpha(&s, 16, 10), 0);
        // Round caps reach past the endpoints.
        assert!(alpha(&s, 2, 16) > 0);
    }

    #[test]
    fn butt_caps_stop_at_the_endpoints() {
        let mut s = Surface::new(32, 32);
        let paint = Paint {
            cap: StrokeCap::Butt,
            ..Paint::stroke(Color::BLACK, 4.0)
        };
        draw_path(&mut s, &line((4.0, 16.0), (28.0, 16.0)), &paint, Affine::IDENTITY);
        assert_eq!(alpha(&s, 2, 16), 0);
        assert_eq!(alpha(&s, 4, 16), 255);

        let mut sq = Surface::new(32, 32);
        let paint = Paint {
            cap: StrokeCap::Square,
            ..paint
        };
        draw_path(&mut sq, &line((4.0, 16.0), (28.0, 16.0)), &paint, Affine::IDENTITY);
        assert_eq!(alpha(&sq, 2, 16), 255);
    }

    #[test]
    fn transform_scales_position_and_width() {
        let mut s = Surface::new(64, 64);
        let paint = Paint::stroke(Color::BLACK, 2.0);
        draw_path(
            &mut s,
            &line((2.0, 16.0), (30.0, 16.0)),
            &paint,
            Affine::scale(2.0),
        );
        assert_eq!(alpha(&s, 30, 31), 255);
        assert_eq!(alpha(&s, 30, 33), 255);
        assert_eq!(alpha(&s, 30, 26), 0);
    }

    #[test]
    fn overlapping_segments_do_not_double_blend() {
        let mut s = Surface::new(32, 32);
        let paint = Paint::stroke(Color::BLACK, 4.0).with_alpha_scaled(0.5);
        let mut p = BezPath::new();
        p.move_to((4.0, 16.0));
        p.line_to((28.0, 16.0));
        p.line_to((4.0, 16.0));
        draw_path(&mut s, &p, &paint, Affine::IDENTITY);
        assert_eq!(alpha(&s, 16, 16), 128);
    }

    #[test]
    fn single_point_draws_a_dot() {
        let mut s = Surface::new(16, 16);
        let mut p = BezPath::new();
        p.move_to((8.0, 8.0));
        p.line_to((8.0, 8.0));
        let bounds = draw_path(&mut s, &p, &Paint::stroke(Color::BLACK, 6.0), Affine::IDENTITY);
        assert!(bounds.is_some());
        assert_eq!(alpha(&s, 8, 8), 255);
        assert_eq!(alpha(&s, 0, 0), 0);
    }

    #[test]
    fn fill_uses_non_zero_winding() {
        let mut s = Surface::new(20, 20);
        let rect = Rect::new(2.0, 2.0, 18.0, 18.0).to_path(0.1);
        let paint = Paint::fill(Color::rgb(1.0, 0.0, 0.0));
        let bounds = draw_path(&mut s, &rect, &paint, Affine::IDENTITY);
        assert_eq!(bounds, Some(Rect::new(2.0, 2.0, 18.0, 18.0)));
        assert_eq!(s.pixel(10, 10), Some([255, 0, 0, 255]));
        assert_eq!(alpha(&s, 1, 10), 0);
        assert_eq!(alpha(&s, 18, 10), 0);
    }

    #[test]
    fn eraser_clears_covered_pixels() {
        let mut s = Surface::new(32, 32);
        let ink = Paint::stroke(Color::BLACK, 8.0);
        draw_path(&mut s, &line((4.0, 16.0), (28.0, 16.0)), &ink, Affine::IDENTITY);
        let eraser = ink.with_blend_mode(BlendMode::DstOut);
        draw_path(&mut s, &line((16.0, 4.0), (16.0, 28.0)), &eraser, Affine::IDENTITY);
        assert_eq!(alpha(&s, 16, 16), 0);
        assert_eq!(alpha(&s, 6, 16), 255);
    }
}

// Copyright 2026 the Ductus Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! CPU implementations of every [`BlendMode`].
//!
//! Colors are premultiplied `[r, g, b, a]` in `[0, 1]`. Porter-Duff operators
//! work on premultiplied values directly. Separable and non-separable blend
//! functions follow the W3C compositing model:
//!
//! ```text
//! co = (1 - ab) * cs + (1 - as) * cb + as * ab * B(Cs, Cb)
//! ao = as + ab - as * ab
//! ```
//!
//! where `Cs` and `Cb` are the unpremultiplied source and backdrop colors.

use ductus_core::paint::BlendMode;

/// A premultiplied RGBA color.
pub type Premul = [f32; 4];

/// Blends premultiplied `src` over premultiplied `dst` with `mode`.
#[must_use]
pub fn blend(mode: BlendMode, src: Premul, dst: Premul) -> Premul {
    let [sr, sg, sb, sa] = src;
    let [dr, dg, db, da] = dst;
    let pd = |fs: f32, fd: f32| {
        [
            sr * fs + dr * fd,
            sg * fs + dg * fd,
            sb * fs + db * fd,
            sa * fs + da * fd,
        ]
    };
    match mode {
        BlendMode::Clear => [0.0; 4],
        BlendMode::Src => src,
        BlendMode::Dst => dst,
        BlendMode::SrcOver => pd(1.0, 1.0 - sa),
        BlendMode::DstOver => pd(1.0 - da, 1.0),
        BlendMode::SrcIn => pd(da, 0.0),
        BlendMode::DstIn => pd(0.0, sa),
        BlendMode::SrcOut => pd(1.0 - da, 0.0),
        BlendMode::DstOut => pd(0.0, 1.0 - sa),
        BlendMode::SrcATop => pd(da, 1.0 - sa),
        BlendMode::DstATop => pd(1.0 - da, sa),
        BlendMode::Xor => pd(1.0 - da, 1.0 - sa),
        BlendMode::Plus => [
            (sr + dr).min(1.0),
            (sg + dg).min(1.0),
            (sb + db).min(1.0),
            (sa + da).min(1.0),
        ],
        BlendMode::Modulate => [sr * dr, sg * dg, sb * db, sa * da],
        BlendMode::Screen => separable(src, dst, screen),
        BlendMode::Overlay => separable(src, dst, |s, d| hard_light(d, s)),
        BlendMode::Darken => separable(src, dst, f32::min),
        BlendMode::Lighten => separable(src, dst, f32::max),
        BlendMode::ColorDodge => separable(src, dst, color_dodge),
        BlendMode::ColorBurn => separable(src, dst, color_burn),
        BlendMode::HardLight => separable(src, dst, hard_light),
        BlendMode::SoftLight => separable(src, dst, soft_light),
        BlendMode::Difference => separable(src, dst, |s, d| (s - d).abs()),
        BlendMode::Exclusion => separable(src, dst, |s, d| s + d - 2.0 * s * d),
        BlendMode::Multiply => separable(src, dst, |s, d| s * d),
        BlendMode::Hue => non_separable(src, dst, |s, d| set_lum(set_sat(s, sat(d)), lum(d))),
        BlendMode::Saturation => {
            non_separable(src, dst, |s, d| set_lum(set_sat(d, sat(s)), lum(d)))
        }
        BlendMode::Color => non_separable(src, dst, |s, d| set_lum(s, lum(d))),
        BlendMode::Luminosity => non_separable(src, dst, |s, d| set_lum(d, lum(s))),
    }
}

/// Blends with partial coverage: the result moves from `dst` toward the
/// full blend in proportion to `coverage`.
#[must_use]
pub fn blend_with_coverage(mode: BlendMode, src: Premul, dst: Premul, coverage: f32) -> Premul {
    if coverage >= 1.0 {
        return blend(mode, src, dst);
    }
    if coverage <= 0.0 {
        return dst;
    }
    let full = blend(mode, src, dst);
    core::array::from_fn(|i| dst[i] + (full[i] - dst[i]) * coverage)
}

// ---------------------------------------------------------------------------
// Separable
// ---------------------------------------------------------------------------

fn unpremultiply(c: Premul) -> [f32; 3] {
    if c[3] <= 0.0 {
        [0.0; 3]
    } else {
        [
            (c[0] / c[3]).min(1.0),
            (c[1] / c[3]).min(1.0),
            (c[2] / c[3]).min(1.0),
        ]
    }
}

fn composite_with(src: Premul, dst: Premul, mixed: [f32; 3]) -> Premul {
    let (sa, da) = (src[3], dst[3]);
    let channel = |i: usize| (1.0 - da) * src[i] + (1.0 - sa) * dst[i] + sa * da * mixed[i];
    [channel(0), channel(1), channel(2), sa + da - sa * da]
}

fn separable(src: Premul, dst: Premul, f: impl Fn(f32, f32) -> f32) -> Premul {
    let s = unpremultiply(src);
    let d = unpremultiply(dst);
    composite_with(src, dst, [f(s[0], d[0]), f(s[1], d[1]), f(s[2], d[2])])
}

fn screen(s: f32, d: f32) -> f32 {
    s + d - s * d
}

fn hard_light(s: f32, d: f32) -> f32 {
    if s <= 0.5 {
        d * 2.0 * s
    } else {
        screen(d, 2.0 * s - 1.0)
    }
}

fn color_dodge(s: f32, d: f32) -> f32 {
    if d <= 0.0 {
        0.0
    } else if s >= 1.0 {
        1.0
    } else {
        (d / (1.0 - s)).min(1.0)
    }
}

fn color_burn(s: f32, d: f32) -> f32 {
    if d >= 1.0 {
        1.0
    } else if s <= 0.0 {
        0.0
    } else {
        1.0 - ((1.0 - d) / s).min(1.0)
    }
}

fn soft_light(s: f32, d: f32) -> f32 {
    if s <= 0.5 {
        d - (1.0 - 2.0 * s) * d * (1.0 - d)
    } else {
        let dd = if d <= 0.25 {
            ((16.0 * d - 12.0) * d + 4.0) * d
        } else {
            d.sqrt()
        };
        d + (2.0 * s - 1.0) * (dd - d)
    }
}

// ---------------------------------------------------------------------------
// Non-separable
// ---------------------------------------------------------------------------

fn non_separable(
    src: Premul,
    dst: Premul,
    f: impl Fn([f32; 3], [f32; 3]) -> [f32; 3],
) -> Premul {
    composite_with(src, dst, f(unpremultiply(src), unpremultiply(dst)))
}

fn lum(c: [f32; 3]) -> f32 {
    0.3 * c[0] + 0.59 * c[1] + 0.11 * c[2]
}

fn clip_color(c: [f32; 3]) -> [f32; 3] {
    let l = lum(c);
    let n = c[0].min(c[1]).min(c[2]);
    let x = c[0].max(c[1]).max(c[2]);
    let mut out = c;
    if n < 0.0 && l - n > f32::EPSILON {
        out = out.map(|v| l + (v - l) * l / (l - n));
    }
    if x > 1.0 && x - l > f32::EPSILON {
        out = out.map(|v| l + (v - l) * (1.0 - l) / (x - l));
    }
    out
}

fn set_lum(c: [f32; 3], l: f32) -> [f32; 3] {
    let d = l - lum(c);
    clip_color(c.map(|v| v + d))
}

fn sat(c: [f32; 3]) -> f32 {
    c[0].max(c[1]).max(c[2]) - c[0].min(c[1]).min(c[2])
}

fn set_sat(c: [f32; 3], s: f32) -> [f32; 3] {
    let max = c[0].max(c[1]).max(c[2]);
    let min = c[0].min(c[1]).min(c[2]);
    if max - min <= f32::EPSILON {
        return [0.0; 3];
    }
    c.map(|v| (v - min) * s / (max - min))
}

#[cfg(test)]
mod tests {
    use super::*;

    const RED: Premul = [1.0, 0.0, 0.0, 1.0];
    const BLUE: Premul = [0.0, 0.0, 1.0, 1.0];
    const HALF_GREEN: Premul = [0.0, 0.5, 0.0, 0.5];
    const EMPTY: Premul = [0.0; 4];

    fn close(a: Premul, b: Premul) -> bool {
        a.iter().zip(b).all(|(x, y)| (x - y).abs() < 1e-5)
    }

    #[test]
    fn porter_duff_basics() {
        assert_eq!(blend(BlendMode::Clear, RED, BLUE), EMPTY);
        assert_eq!(blend(BlendMode::Src, RED, BLUE), RED);
        assert_eq!(blend(BlendMode::Dst, RED, BLUE), BLUE);
        assert_eq!(blend(BlendMode::SrcOver, RED, BLUE), RED);
        assert_eq!(blend(BlendMode::DstOver, RED, BLUE), BLUE);
        assert!(close(
            blend(BlendMode::SrcOver, HALF_GREEN, BLUE),
            [0.0, 0.5, 0.5, 1.0]
        ));
        assert_eq!(blend(BlendMode::SrcIn, RED, EMPTY), EMPTY);
        assert_eq!(blend(BlendMode::DstOut, RED, BLUE), EMPTY);
        assert_eq!(blend(BlendMode::Xor, RED, BLUE), EMPTY);
        assert_eq!(blend(BlendMode::Plus, RED, BLUE), [1.0, 0.0, 1.0, 1.0]);
    }

    #[test]
    fn eraser_removes_destination_in_proportion_to_source_alpha() {
        let out = blend(BlendMode::DstOut, HALF_GREEN, BLUE);
        assert!(close(out, [0.0, 0.0, 0.5, 0.5]));
    }

    #[test]
    fn separable_modes_over_transparent_backdrop_are_src_over() {
        for mode in BlendMode::ALL.into_iter().filter(|m| m.is_blend_function()) {
            let out = blend(mode, HALF_GREEN, EMPTY);
            assert!(close(out, HALF_GREEN), "{mode:?} gave {out:?}");
        }
    }

    #[test]
    fn multiply_and_screen() {
        let grey = [0.5, 0.5, 0.5, 1.0];
        assert!(close(blend(BlendMode::Multiply, grey, grey), [0.25, 0.25, 0.25, 1.0]));
        assert!(close(blend(BlendMode::Screen, grey, grey), [0.75, 0.75, 0.75, 1.0]));
        assert!(close(blend(BlendMode::Difference, RED, RED), [0.0, 0.0, 0.0, 1.0]));
    }

    #[test]
    fn luminosity_keeps_backdrop_hue() {
        let white = [1.0, 1.0, 1.0, 1.0];
        let out = blend(BlendMode::Luminosity, white, RED);
        assert!(close(out, white), "full luminance clips to white: {out:?}");
        let out = blend(BlendMode::Color, RED, white);
        assert!(out[0] >= out[1] && out[0] >= out[2], "{out:?}");
    }

    #[test]
    fn coverage_interpolates() {
        let out = blend_with_coverage(BlendMode::Src, RED, BLUE, 0.5);
        assert!(close(out, [0.5, 0.0, 0.5, 1.0]));
        assert_eq!(blend_with_coverage(BlendMode::Clear, RED, BLUE, 0.0), BLUE);
    }
}

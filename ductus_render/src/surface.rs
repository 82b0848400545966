// Copyright 2026 the Ductus Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! CPU pixel surfaces.

use ductus_core::paint::BlendMode;
use kurbo::Rect;

use crate::blend::{self, Premul};
use crate::error::RenderError;

/// Bytes per pixel of a [`Surface`].
pub const BYTES_PER_PIXEL: u64 = 4;

/// Converts a logical size and pixel ratio to device pixels.
///
/// Each side is `ceil(side * pixel_ratio)`. Fails on a zero side, a pixel
/// ratio that is not a positive finite number, or a device side longer than
/// `max_side`.
pub fn device_size(
    width: u32,
    height: u32,
    pixel_ratio: f64,
    max_side: u32,
) -> Result<(u32, u32), RenderError> {
    if width == 0 || height == 0 || !pixel_ratio.is_finite() || pixel_ratio <= 0.0 {
        return Err(RenderError::InvalidSurfaceSize {
            width,
            height,
            pixel_ratio,
        });
    }
    let w = (f64::from(width) * pixel_ratio).ceil();
    let h = (f64::from(height) * pixel_ratio).ceil();
    #[expect(
        clippy::cast_possible_truncation,
        reason = "positive and finite; saturates for the error report"
    )]
    let (dw, dh) = (w as u64, h as u64);
    if dw > u64::from(max_side) || dh > u64::from(max_side) {
        return Err(RenderError::SurfaceTooLarge {
            width: dw,
            height: dh,
            max: max_side,
        });
    }
    let side = |v: u64| u32::try_from(v).unwrap_or(max_side);
    Ok((side(dw), side(dh)))
}

/// A premultiplied RGBA8 pixel buffer in device pixels.
#[derive(Clone, PartialEq, Eq)]
pub struct Surface {
    width: u32,
    height: u32,
    pixels: Vec<[u8; 4]>,
}

impl core::fmt::Debug for Surface {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Surface")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("pixels", &self.pixels.len())
            .finish()
    }
}

impl Surface {
    /// Allocates a transparent surface of `width` x `height` device pixels.
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        let len = width as usize * height as usize;
        Self {
            width,
            height,
            pixels: vec![[0; 4]; len],
        }
    }

    /// Width in device pixels.
    #[must_use]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in device pixels.
    #[must_use]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// The whole surface as a rectangle.
    #[must_use]
    pub fn bounds(&self) -> Rect {
        Rect::new(0.0, 0.0, f64::from(self.width), f64::from(self.height))
    }

    /// Size of the pixel storage.
    #[must_use]
    pub fn byte_size(&self) -> u64 {
        u64::from(self.width) * u64::from(self.height) * BYTES_PER_PIXEL
    }

    /// Premultiplied RGBA8 pixels in row-major order.
    #[must_use]
    pub fn pixels(&self) -> &[[u8; 4]] {
        &self.pixels
    }

    /// Pixel at `(x, y)`, or `None` outside the surface.
    #[must_use]
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.pixels.get(self.index(x, y)).copied()
    }

    /// Resets every pixel to transparent.
    pub fn clear(&mut self) {
        self.pixels.fill([0; 4]);
    }

    /// Returns `true` if every pixel is transparent.
    #[must_use]
    pub fn is_clear(&self) -> bool {
        self.pixels.iter().all(|p| *p == [0; 4])
    }

    /// Copies `other` into this surface. Sizes must match.
    pub fn copy_from(&mut self, other: &Self) {
        debug_assert_eq!(
            (self.width, self.height),
            (other.width, other.height),
            "copy between surfaces of different sizes"
        );
        if self.pixels.len() == other.pixels.len() {
            self.pixels.copy_from_slice(&other.pixels);
        }
    }

    /// Blends `src` into the pixel at `(x, y)` with partial coverage.
    pub fn blend_pixel(&mut self, x: u32, y: u32, src: Premul, mode: BlendMode, coverage: f32) {
        if x >= self.width || y >= self.height {
            return;
        }
        let i = self.index(x, y);
        let Some(px) = self.pixels.get_mut(i) else {
            return;
        };
        let out = blend::blend_with_coverage(mode, src, to_f32(*px), coverage);
        *px = to_u8(out);
    }

    /// Draws `src` onto this surface at the origin with `mode` and `opacity`,
    /// restricted to `clip` if given.
    ///
    /// Returns the device-pixel bounds that were touched, or `None` if
    /// nothing was drawn.
    pub fn draw_surface(
        &mut self,
        src: &Self,
        mode: BlendMode,
        opacity: f32,
        clip: Option<Rect>,
    ) -> Option<Rect> {
        let opacity = opacity.clamp(0.0, 1.0);
        let mut area = self.bounds().intersect(src.bounds());
        if let Some(clip) = clip {
            area = area.intersect(clip);
        }
        let (x0, y0, x1, y1) = pixel_span(area)?;
        for y in y0..y1 {
            for x in x0..x1 {
                let Some(sp) = src.pixel(x, y) else {
                    continue;
                };
                let s = to_f32(sp).map(|c| c * opacity);
                let i = self.index(x, y);
                if let Some(dp) = self.pixels.get_mut(i) {
                    *dp = to_u8(blend::blend(mode, s, to_f32(*dp)));
                }
            }
        }
        Some(Rect::new(
            f64::from(x0),
            f64::from(y0),
            f64::from(x1),
            f64::from(y1),
        ))
    }

    fn index(&self, x: u32, y: u32) -> usize {
        y as usize * self.width as usize + x as usize
    }
}

/// Integer pixel span `[x0, x1) x [y0, y1)` covering `rect`, or `None` if it
/// is empty.
pub(crate) fn pixel_span(rect: Rect) -> Option<(u32, u32, u32, u32)> {
    if rect.width() <= 0.0 || rect.height() <= 0.0 {
        return None;
    }
    let r = rect.expand();
    #[expect(
        clippy::cast_possible_truncation,
        reason = "clamped to the u32 range"
    )]
    let clamp = |v: f64| v.clamp(0.0, f64::from(u32::MAX)) as u32;
    let span = (clamp(r.x0), clamp(r.y0), clamp(r.x1), clamp(r.y1));
    (span.0 < span.2 && span.1 < span.3).then_some(span)
}

fn to_f32(p: [u8; 4]) -> Premul {
    p.map(|c| f32::from(c) / 255.0)
}

fn to_u8(p: Premul) -> [u8; 4] {
    #[expect(
        clippy::cast_possible_truncation,
        reason = "clamped to [0, 255] before the cast"
    )]
    let quantize = |c: f32| (c.clamp(0.0, 1.0) * 255.0).round() as u8;
    p.map(quantize)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn device_size_rounds_up() {
        assert_eq!(device_size(100, 50, 1.5, 4096), Ok((150, 75)));
        assert_eq!(device_size(3, 3, 1.1, 4096), Ok((4, 4)));
    }

    #[test]
    fn device_size_rejects_bad_input() {
        assert!(matches!(
            device_size(0, 10, 1.0, 4096),
            Err(RenderError::InvalidSurfaceSize { .. })
        ));
        assert!(matches!(
            device_size(10, 10, f64::NAN, 4096),
            Err(RenderError::InvalidSurfaceSize { .. })
        ));
        assert!(matches!(
            device_size(3000, 10, 2.0, 4096),
            Err(RenderError::SurfaceTooLarge { width: 6000, .. })
        ));
    }

    #[test]
    fn blend_pixel_and_clear() {
        let mut s = Surface::new(4, 4);
        assert!(s.is_clear());
        s.blend_pixel(1, 2, [1.0, 0.0, 0.0, 1.0], BlendMode::SrcOver, 1.0);
        assert_eq!(s.pixel(1, 2), Some([255, 0, 0, 255]));
        s.blend_pixel(9, 9, [1.0, 0.0, 0.0, 1.0], BlendMode::SrcOver, 1.0);
        assert_eq!(s.pixel(9, 9), None);
        s.clear();
        assert!(s.is_clear());
        assert_eq!(s.byte_size(), 64);
    }

    #[test]
    fn draw_surface_applies_opacity_and_clip() {
        let mut src = Surface::new(4, 4);
        for y in 0..4 {
            for x in 0..4 {
                src.blend_pixel(x, y, [0.0, 0.0, 1.0, 1.0], BlendMode::Src, 1.0);
            }
        }
        let mut dst = Surface::new(4, 4);
        let touched = dst.draw_surface(
            &src,
            BlendMode::SrcOver,
            0.5,
            Some(Rect::new(0.0, 0.0, 2.0, 4.0)),
        );
        assert_eq!(touched, Some(Rect::new(0.0, 0.0, 2.0, 4.0)));
        assert_eq!(dst.pixel(0, 0), Some([0, 0, 128, 128]));
        assert_eq!(dst.pixel(3, 0), Some([0, 0, 0, 0]));
    }
}

// Copyright 2026 the Ductus Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Paint state and blend modes.
//!
//! [`Paint`] is a plain `Copy` value. Anything that queues drawing work takes
//! its own copy at enqueue time, so later edits to the brush in the host
//! application can never reach back into already-queued work.

/// Compositing operator used when drawing a paint or a layer.
///
/// Covers the Porter-Duff operators, the separable and non-separable blend
/// modes of the W3C compositing model, and the `Plus` / `Modulate`
/// arithmetic modes. [`to_native`](Self::to_native) gives the backend
/// constant for every variant.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum BlendMode {
    /// `r = 0`.
    Clear,
    /// `r = s`.
    Src,
    /// `r = d`.
    Dst,
    /// `r = s + (1 - sa) * d`. The default "normal" mode.
    #[default]
    SrcOver,
    /// `r = d + (1 - da) * s`.
    DstOver,
    /// `r = s * da`.
    SrcIn,
    /// `r = d * sa`.
    DstIn,
    /// `r = s * (1 - da)`.
    SrcOut,
    /// `r = d * (1 - sa)`.
    DstOut,
    /// `r = s * da + d * (1 - sa)`.
    SrcATop,
    /// `r = d * sa + s * (1 - da)`.
    DstATop,
    /// `r = s * (1 - da) + d * (1 - sa)`.
    Xor,
    /// `r = min(s + d, 1)`.
    Plus,
    /// `r = s * d`.
    Modulate,
    /// Inverse multiply of the inverted colors.
    Screen,
    /// Multiply or screen, depending on the destination.
    Overlay,
    /// Darker of source and destination.
    Darken,
    /// Lighter of source and destination.
    Lighten,
    /// Brightens the destination to reflect the source.
    ColorDodge,
    /// Darkens the destination to reflect the source.
    ColorBurn,
    /// Multiply or screen, depending on the source.
    HardLight,
    /// Darken or lighten, depending on the source.
    SoftLight,
    /// Absolute difference.
    Difference,
    /// Like difference, with lower contrast.
    Exclusion,
    /// Product of source and destination.
    Multiply,
    /// Hue of the source with saturation and luminosity of the destination.
    Hue,
    /// Saturation of the source with hue and luminosity of the destination.
    Saturation,
    /// Hue and saturation of the source with luminosity of the destination.
    Color,
    /// Luminosity of the source with hue and saturation of the destination.
    Luminosity,
}

impl BlendMode {
    /// Every blend mode, in native constant order.
    pub const ALL: [Self; 29] = [
        Self::Clear,
        Self::Src,
        Self::Dst,
        Self::SrcOver,
        Self::DstOver,
        Self::SrcIn,
        Self::DstIn,
        Self::SrcOut,
        Self::DstOut,
        Self::SrcATop,
        Self::DstATop,
        Self::Xor,
        Self::Plus,
        Self::Modulate,
        Self::Screen,
        Self::Overlay,
        Self::Darken,
        Self::Lighten,
        Self::ColorDodge,
        Self::ColorBurn,
        Self::HardLight,
        Self::SoftLight,
        Self::Difference,
        Self::Exclusion,
        Self::Multiply,
        Self::Hue,
        Self::Saturation,
        Self::Color,
        Self::Luminosity,
    ];

    /// Returns the backend constant (`SkBlendMode` ordinal) for this mode.
    #[must_use]
    pub const fn to_native(self) -> u8 {
        match self {
            Self::Clear => 0,
            Self::Src => 1,
            Self::Dst => 2,
            Self::SrcOver => 3,
            Self::DstOver => 4,
            Self::SrcIn => 5,
            Self::DstIn => 6,
            Self::SrcOut => 7,
            Self::DstOut => 8,
            Self::SrcATop => 9,
            Self::DstATop => 10,
            Self::Xor => 11,
            Self::Plus => 12,
            Self::Modulate => 13,
            Self::Screen => 14,
            Self::Overlay => 15,
            Self::Darken => 16,
            Self::Lighten => 17,
            Self::ColorDodge => 18,
            Self::ColorBurn => 19,
            Self::HardLight => 20,
            Self::SoftLight => 21,
            Self::Difference => 22,
            Self::Exclusion => 23,
            Self::Multiply => 24,
            Self::Hue => 25,
            Self::Saturation => 26,
            Self::Color => 27,
            Self::Luminosity => 28,
        }
    }

    /// Inverse of [`to_native`](Self::to_native).
    #[must_use]
    pub fn from_native(value: u8) -> Option<Self> {
        Self::ALL.get(usize::from(value)).copied()
    }

    /// Returns `true` for modes that combine colors through a blend function
    /// rather than a pure Porter-Duff coverage rule.
    #[must_use]
    pub const fn is_blend_function(self) -> bool {
        self.to_native() >= Self::Screen.to_native()
    }
}

/// A straight (non-premultiplied) RGBA color with components in `[0, 1]`.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Color {
    /// Red.
    pub r: f32,
    /// Green.
    pub g: f32,
    /// Blue.
    pub b: f32,
    /// Alpha.
    pub a: f32,
}

impl Color {
    /// Opaque black.
    pub const BLACK: Self = Self::rgb(0.0, 0.0, 0.0);
    /// Opaque white.
    pub const WHITE: Self = Self::rgb(1.0, 1.0, 1.0);
    /// Fully transparent black.
    pub const TRANSPARENT: Self = Self::rgba(0.0, 0.0, 0.0, 0.0);

    /// Creates an opaque color.
    #[must_use]
    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    /// Creates a color with alpha.
    #[must_use]
    pub const fn rgba(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Creates a color from 8-bit components.
    #[must_use]
    pub fn from_rgba8(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self::rgba(
            f32::from(r) / 255.0,
            f32::from(g) / 255.0,
            f32::from(b) / 255.0,
            f32::from(a) / 255.0,
        )
    }

    /// Returns the premultiplied components `[r*a, g*a, b*a, a]`, scaling
    /// alpha by `alpha` first.
    #[must_use]
    pub fn premultiplied(self, alpha: f32) -> [f32; 4] {
        let a = (self.a * alpha).clamp(0.0, 1.0);
        [self.r * a, self.g * a, self.b * a, a]
    }
}

/// Whether a path is filled or stroked.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PaintStyle {
    /// Fill the interior (non-zero winding).
    Fill,
    /// Stroke the outline.
    #[default]
    Stroke,
}

/// Shape of open stroke ends.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum StrokeCap {
    /// Ends exactly at the endpoint.
    Butt,
    /// Semicircle around the endpoint.
    #[default]
    Round,
    /// Half-square beyond the endpoint.
    Square,
}

/// Shape of stroke corners.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum StrokeJoin {
    /// Sharp corner.
    Miter,
    /// Rounded corner.
    #[default]
    Round,
    /// Cut-off corner.
    Bevel,
}

/// Rendering parameters for a stroke or path.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Paint {
    /// Fill or stroke.
    pub style: PaintStyle,
    /// Stroke width in canvas units.
    pub width: f64,
    /// Base color.
    pub color: Color,
    /// Extra alpha multiplier in `[0, 1]`.
    pub alpha: f32,
    /// Compositing operator.
    pub blend_mode: BlendMode,
    /// End caps.
    pub cap: StrokeCap,
    /// Corner joins.
    pub join: StrokeJoin,
    /// Whether edges are anti-aliased.
    pub anti_alias: bool,
}

impl Default for Paint {
    fn default() -> Self {
        Self {
            style: PaintStyle::Stroke,
            width: 4.0,
            color: Color::BLACK,
            alpha: 1.0,
            blend_mode: BlendMode::SrcOver,
            cap: StrokeCap::Round,
            join: StrokeJoin::Round,
            anti_alias: true,
        }
    }
}

impl Paint {
    /// A stroke paint with the given color and width.
    #[must_use]
    pub fn stroke(color: Color, width: f64) -> Self {
        Self {
            color,
            width,
            ..Self::default()
        }
    }

    /// A fill paint with the given color.
    #[must_use]
    pub fn fill(color: Color) -> Self {
        Self {
            style: PaintStyle::Fill,
            color,
            ..Self::default()
        }
    }

    /// Returns a copy with a different blend mode.
    #[must_use]
    pub fn with_blend_mode(self, blend_mode: BlendMode) -> Self {
        Self { blend_mode, ..self }
    }

    /// Returns a copy with the alpha multiplied by `factor`.
    #[must_use]
    pub fn with_alpha_scaled(self, factor: f32) -> Self {
        Self {
            alpha: (self.alpha * factor).clamp(0.0, 1.0),
            ..self
        }
    }

    /// Returns the premultiplied source color for this paint.
    #[must_use]
    pub fn source_premultiplied(&self) -> [f32; 4] {
        self.color.premultiplied(self.alpha)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn native_mapping_is_exhaustive_and_bijective() {
        for (i, mode) in BlendMode::ALL.iter().enumerate() {
            assert_eq!(usize::from(mode.to_native()), i, "{mode:?} out of order");
            assert_eq!(BlendMode::from_native(mode.to_native()), Some(*mode));
        }
        assert_eq!(BlendMode::from_native(29), None);
    }

    #[test]
    fn default_blend_is_source_over() {
        assert_eq!(BlendMode::default(), BlendMode::SrcOver);
        assert_eq!(BlendMode::SrcOver.to_native(), 3);
        assert!(!BlendMode::Xor.is_blend_function());
        assert!(BlendMode::Multiply.is_blend_function());
    }

    #[test]
    fn copied_paint_is_independent() {
        let mut live = Paint::stroke(Color::rgb(1.0, 0.0, 0.0), 3.0);
        let snapshot = live;
        live.color = Color::rgb(0.0, 0.0, 1.0);
        live.width = 12.0;
        live.alpha = 0.2;
        assert_eq!(snapshot.color, Color::rgb(1.0, 0.0, 0.0));
        assert_eq!(snapshot.width, 3.0);
        assert_eq!(snapshot.alpha, 1.0);
    }

    #[test]
    fn premultiplied_scales_by_alpha() {
        let c = Color::rgba(1.0, 0.5, 0.0, 0.5);
        assert_eq!(c.premultiplied(0.5), [0.25, 0.125, 0.0, 0.25]);
    }
}

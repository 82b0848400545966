// Copyright 2026 the Ductus Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Pressure and tilt calibration.
//!
//! Stylus force sensors are non-linear, so raw readings pass through a dead
//! zone, a min/max normalization, and a response curve before they reach a
//! stroke. Tilt readings become an azimuth/altitude pair.

use core::f64::consts::{FRAC_PI_2, TAU};

use kurbo::Vec2;

/// Response curve applied to normalized pressure.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PressureCurve {
    /// `y = x`.
    Linear,
    /// `y = x^0.7`, which lifts light pressure.
    #[default]
    Logarithmic,
    /// Piecewise-linear interpolation between `(x, y)` control points,
    /// sorted by `x`.
    Custom(Vec<(f64, f64)>),
}

impl PressureCurve {
    /// Exponent of the [`Logarithmic`](Self::Logarithmic) curve.
    pub const LOGARITHMIC_EXPONENT: f64 = 0.7;

    /// Builds a custom curve, discarding non-finite points and sorting the
    /// rest by `x`.
    #[must_use]
    pub fn custom(points: impl IntoIterator<Item = (f64, f64)>) -> Self {
        let mut points: Vec<(f64, f64)> = points
            .into_iter()
            .filter(|(x, y)| x.is_finite() && y.is_finite())
            .collect();
        points.sort_by(|a, b| a.0.total_cmp(&b.0));
        Self::Custom(points)
    }

    /// Maps `x` in `[0, 1]` through the curve.
    #[must_use]
    pub fn apply(&self, x: f64) -> f64 {
        match self {
            Self::Linear => x,
            Self::Logarithmic => x.powf(Self::LOGARITHMIC_EXPONENT),
            Self::Custom(points) => interpolate(points, x),
        }
    }
}

fn interpolate(points: &[(f64, f64)], x: f64) -> f64 {
    let (Some(&first), Some(&last)) = (points.first(), points.last()) else {
        return x;
    };
    if x <= first.0 {
        return first.1;
    }
    if x >= last.0 {
        return last.1;
    }
    // First control point strictly to the right of x; never 0 here.
    let hi = points.partition_point(|p| p.0 <= x);
    let (x0, y0) = points[hi - 1];
    let (x1, y1) = points[hi];
    let span = x1 - x0;
    if span <= f64::EPSILON {
        return y1;
    }
    y0 + (y1 - y0) * (x - x0) / span
}

/// Maps raw force readings to pressure in `[0, 1]`.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PressureCalibration {
    /// Raw readings strictly below this calibrate to exactly 0.
    pub dead_zone: f64,
    /// Raw reading mapped to 0 before the curve.
    pub min: f64,
    /// Raw reading mapped to 1 before the curve.
    pub max: f64,
    /// Response curve.
    pub curve: PressureCurve,
    /// Multiplier applied after the curve.
    pub sensitivity: f64,
    /// Pressure reported when the hardware has no force sensor.
    pub default_pressure: f64,
}

impl Default for PressureCalibration {
    fn default() -> Self {
        Self {
            dead_zone: 0.03,
            min: 0.0,
            max: 1.0,
            curve: PressureCurve::Logarithmic,
            sensitivity: 1.0,
            default_pressure: 0.5,
        }
    }
}

impl PressureCalibration {
    /// Calibrates a raw force reading.
    ///
    /// The result is always in `[0, 1]`. Non-finite readings count as
    /// being inside the dead zone.
    #[must_use]
    pub fn calibrate(&self, raw: Option<f64>) -> f64 {
        let Some(raw) = raw else {
            return self.default_pressure.clamp(0.0, 1.0);
        };
        if !raw.is_finite() || raw < self.dead_zone {
            return 0.0;
        }
        let span = self.max - self.min;
        let normalized = if span > f64::EPSILON {
            ((raw - self.min) / span).clamp(0.0, 1.0)
        } else {
            1.0
        };
        let out = self.curve.apply(normalized) * self.sensitivity;
        if out.is_nan() {
            return 0.0;
        }
        out.clamp(0.0, 1.0)
    }
}

/// Stylus orientation derived from tilt.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StylusAngles {
    /// Direction the stylus leans toward, in `[0, 2π)`.
    pub azimuth: f64,
    /// Angle above the screen plane, in `[0, π/2]`.
    pub altitude: f64,
}

impl StylusAngles {
    /// A stylus held perpendicular to the screen.
    pub const UPRIGHT: Self = Self {
        azimuth: 0.0,
        altitude: FRAC_PI_2,
    };
}

/// Maps raw tilt components to azimuth and altitude.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TiltCalibration {
    /// Multiplier applied to both raw tilt components.
    pub sensitivity: f64,
}

impl Default for TiltCalibration {
    fn default() -> Self {
        Self { sensitivity: 1.0 }
    }
}

impl TiltCalibration {
    /// Calibrates a raw tilt reading; a missing or non-finite reading means
    /// the stylus is upright.
    #[must_use]
    pub fn calibrate(&self, tilt: Option<Vec2>) -> StylusAngles {
        let Some(tilt) = tilt.filter(|t| t.is_finite()) else {
            return StylusAngles::UPRIGHT;
        };
        let t = tilt * self.sensitivity;
        let magnitude = t.hypot();
        if !magnitude.is_finite() {
            return StylusAngles::UPRIGHT;
        }
        let altitude = FRAC_PI_2 - magnitude.min(FRAC_PI_2);
        let mut azimuth = t.y.atan2(t.x);
        if azimuth < 0.0 {
            azimuth += TAU;
        }
        if azimuth >= TAU {
            azimuth = 0.0;
        }
        StylusAngles { azimuth, altitude }
    }
}

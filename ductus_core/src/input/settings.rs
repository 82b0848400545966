// Copyright 2026 the Ductus Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Host-provided input settings.

use super::calibrate::{PressureCalibration, TiltCalibration};
use super::gesture::GestureConfig;
use super::palm::PalmRejectionConfig;
use super::predict::PredictionConfig;

/// Everything the host can tune about input processing.
///
/// With the `serde` feature enabled this can be loaded straight from a JSON
/// settings blob.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct InputSettings {
    /// Palm rejection thresholds.
    pub palm_rejection: PalmRejectionConfig,
    /// Force-to-pressure mapping, including sensitivity.
    pub pressure: PressureCalibration,
    /// Tilt-to-angle mapping, including sensitivity.
    pub tilt: TiltCalibration,
    /// Predictive input.
    pub prediction: PredictionConfig,
    /// Smoothing factor in `[0, 1]`; each tenth adds one sample to the
    /// averaging window.
    pub smoothing: f64,
    /// Multi-finger gestures.
    pub gestures: GestureConfig,
}

impl Default for InputSettings {
    fn default() -> Self {
        Self {
            palm_rejection: PalmRejectionConfig::standard(),
            pressure: PressureCalibration::default(),
            tilt: TiltCalibration::default(),
            prediction: PredictionConfig::default(),
            smoothing: 0.3,
            gestures: GestureConfig::default(),
        }
    }
}

impl InputSettings {
    /// Settings that pass samples through untouched: no smoothing, no
    /// palm rejection, linear pressure, no prediction.
    #[must_use]
    pub fn raw() -> Self {
        Self {
            palm_rejection: PalmRejectionConfig::disabled(),
            pressure: PressureCalibration {
                curve: super::calibrate::PressureCurve::Linear,
                ..PressureCalibration::default()
            },
            prediction: PredictionConfig {
                enabled: false,
                ..PredictionConfig::default()
            },
            smoothing: 0.0,
            ..Self::default()
        }
    }
}

// Copyright 2026 the Ductus Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Stylus and touch input processing.
//!
//! Raw platform touches flow through a fixed pipeline inside
//! [`InputProcessor`]:
//!
//! ```text
//! RawTouch ─► validate ─► palm rejection ─► pressure/tilt calibration
//!          ─► smoothing ─► Stroke ─► prediction
//! ```
//!
//! Each stage is its own type so hosts and tests can use them directly:
//! [`PressureCalibration`], [`TiltCalibration`], [`PalmRejector`],
//! [`Smoother`], [`Predictor`], and [`GestureRecognizer`]. Tunables are
//! collected in [`InputSettings`].

mod calibrate;
mod gesture;
mod palm;
mod predict;
mod processor;
mod sample;
mod settings;
mod smooth;

pub use calibrate::{PressureCalibration, PressureCurve, StylusAngles, TiltCalibration};
pub use gesture::{GestureConfig, GestureEvent, GestureKind, GesturePhase, GestureRecognizer};
pub use palm::{PalmRejectionConfig, PalmRejector};
pub use predict::{PredictionConfig, Predictor};
pub use processor::{BatchSummary, InputProcessor, InputStats};
pub use sample::{PredictedPoint, RawTouch, ToolKind, TouchId, TouchSample};
pub use settings::InputSettings;
pub use smooth::Smoother;

// Copyright 2026 the Ductus Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Stylus and touch input processing for real-time drawing.
//!
//! `ductus_core` turns raw platform touches into calibrated, time-ordered
//! strokes and defines the value types the rendering side consumes: paint,
//! layers, canvas state, and time.
//!
//! # Architecture
//!
//! ```text
//!   Platform touch callback
//!       │  &[RawTouch]
//!       ▼
//!   InputProcessor ──► InputObserver
//!       │                 on_stroke_start / on_stroke_update / on_stroke_end
//!       │                 on_predicted_input / on_gesture
//!       │                 on_touch_rejected / on_sample_dropped
//!       ▼
//!   Stroke (append-only, owned by value once finalized)
//! ```
//!
//! **[`input`]** — The processor and its stages: palm rejection,
//! pressure and tilt calibration, smoothing, prediction, and two-finger
//! gestures.
//!
//! **[`stroke`]** — The authoritative [`Stroke`](stroke::Stroke) model.
//!
//! **[`event`]** — Typed events and the [`InputObserver`](event::InputObserver)
//! trait.
//!
//! **[`paint`]** — [`Paint`](paint::Paint) as a `Copy` value and the 29
//! [`BlendMode`](paint::BlendMode)s.
//!
//! **[`layer`]** / **[`canvas`]** — Read-only snapshots of host state.
//!
//! **[`geometry`]** / **[`spline`]** — Kinematics and Catmull-Rom curves.
//!
//! **[`time`]** — Nanosecond [`HostTime`](time::HostTime) and injectable
//! [`Clock`](time::Clock)s.
//!
//! **[`dirty`]** — Dirty-tracking channels shared with the compositor.
//!
//! **[`trace`]** — [`TraceSink`](trace::TraceSink) trait and event types for
//! frame-loop instrumentation, with zero-overhead [`Tracer`](trace::Tracer)
//! wrapper.
//!
//! # Crate features
//!
//! - `serde` (disabled by default): Derives `Serialize`/`Deserialize` for
//!   settings and paint types.
//! - `trace` (disabled by default): Enables `Tracer` method bodies (one branch
//!   per call site).

#![cfg_attr(docsrs, feature(doc_auto_cfg))]

pub mod canvas;
pub mod dirty;
pub mod event;
pub mod geometry;
pub mod input;
pub mod layer;
pub mod paint;
pub mod spline;
pub mod stroke;
pub mod time;
pub mod trace;

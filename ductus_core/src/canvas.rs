// Copyright 2026 the Ductus Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Snapshot of the host's canvas state.
//!
//! The brush, the active layer, and the view transform are owned by the host
//! application. Input processing reads them through a [`CanvasState`] passed
//! with every batch of touches.

use kurbo::{Affine, Point};

use crate::layer::LayerId;
use crate::paint::Paint;

/// What the host currently has selected.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CanvasState {
    /// The brush new strokes are drawn with.
    pub paint: Paint,
    /// Layer that receives new strokes.
    pub active_layer: LayerId,
    /// Canvas-to-screen transform (pan, zoom, rotation).
    pub view_transform: Affine,
}

impl Default for CanvasState {
    fn default() -> Self {
        Self {
            paint: Paint::default(),
            active_layer: LayerId(0),
            view_transform: Affine::IDENTITY,
        }
    }
}

impl CanvasState {
    /// Maps a screen-space point into canvas space.
    ///
    /// A singular view transform leaves the point unchanged.
    #[must_use]
    pub fn to_canvas(&self, screen: Point) -> Point {
        if self.view_transform.determinant().abs() < f64::EPSILON {
            return screen;
        }
        self.view_transform.inverse() * screen
    }
}

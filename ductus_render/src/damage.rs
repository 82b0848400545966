// Copyright 2026 the Ductus Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Spatial damage tracking for partial presentation.

use kurbo::Rect;

/// A region of a surface that changed during a frame.
///
/// Hosts can use this to upload or present only the pixels that changed.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum DamageRegion {
    /// The entire surface changed.
    Full,
    /// A list of device-pixel rectangles that changed.
    Rects(Vec<Rect>),
    /// Nothing changed; the previous frame can be reused.
    #[default]
    None,
}

impl DamageRegion {
    /// Returns `true` if no region changed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::None)
    }

    /// Adds one rectangle. Empty rectangles are ignored.
    pub fn add_rect(&mut self, rect: Rect) {
        if rect.is_zero_area() {
            return;
        }
        match self {
            Self::Full => {}
            Self::Rects(rects) => rects.push(rect),
            Self::None => *self = Self::Rects(vec![rect]),
        }
    }

    /// Merges another damage region into this one.
    pub fn merge(&mut self, other: &Self) {
        match (&*self, other) {
            (Self::Full, _) | (_, Self::Full) => *self = Self::Full,
            (Self::None, _) => *self = other.clone(),
            (_, Self::None) => {}
            (Self::Rects(a), Self::Rects(b)) => {
                let mut merged = a.clone();
                merged.extend_from_slice(b);
                *self = Self::Rects(merged);
            }
        }
    }

    /// Smallest rectangle covering the damage, given the full surface
    /// bounds.
    #[must_use]
    pub fn bounds(&self, full: Rect) -> Option<Rect> {
        match self {
            Self::Full => Some(full),
            Self::Rects(rects) => rects.iter().copied().reduce(|a, b| a.union(b)),
            Self::None => None,
        }
    }
}

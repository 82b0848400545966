// Copyright 2026 the Ductus Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Layer identity and compositing metadata.
//!
//! The ordered layer list belongs to the host application. The rendering
//! side only sees [`LayerRef`] snapshots: which layer, whether it is visible,
//! and how it blends.

use core::fmt;

use crate::paint::BlendMode;

/// Identifies a drawing layer.
///
/// Layer ids are assigned by the host; the engine treats them as opaque keys.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LayerId(pub u32);

impl fmt::Debug for LayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "LayerId({})", self.0)
    }
}

/// One entry of the host's ordered layer list, as seen by the compositor.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LayerRef {
    /// Which layer.
    pub id: LayerId,
    /// Hidden layers are skipped during compositing.
    pub visible: bool,
    /// Opacity in `[0, 1]`.
    pub opacity: f32,
    /// How the layer blends onto the layers beneath it.
    pub blend_mode: BlendMode,
}

impl LayerRef {
    /// A visible, fully opaque, source-over layer.
    #[must_use]
    pub const fn new(id: LayerId) -> Self {
        Self {
            id,
            visible: true,
            opacity: 1.0,
            blend_mode: BlendMode::SrcOver,
        }
    }

    /// Returns a copy with the given opacity, clamped to `[0, 1]`.
    #[must_use]
    pub fn with_opacity(self, opacity: f32) -> Self {
        Self {
            opacity: opacity.clamp(0.0, 1.0),
            ..self
        }
    }

    /// Returns a copy with the given blend mode.
    #[must_use]
    pub const fn with_blend_mode(self, blend_mode: BlendMode) -> Self {
        Self { blend_mode, ..self }
    }

    /// Returns a copy with the given visibility.
    #[must_use]
    pub const fn with_visible(self, visible: bool) -> Self {
        Self { visible, ..self }
    }

    /// Whether this layer contributes to the composite at all.
    #[must_use]
    pub fn is_drawn(&self) -> bool {
        self.visible && self.opacity > 0.0
    }
}

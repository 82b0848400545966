// Copyright 2026 the Ductus Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Render errors.

use ductus_core::layer::LayerId;

use crate::pool::SurfaceId;

/// Errors reported by the render engine and surface pool.
///
/// Transient conditions such as a missing target surface are not errors;
/// commands aimed at them are skipped.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum RenderError {
    /// A command was submitted before [`RenderEngine::initialize`] or after
    /// [`RenderEngine::destroy`].
    ///
    /// [`RenderEngine::initialize`]: crate::RenderEngine::initialize
    /// [`RenderEngine::destroy`]: crate::RenderEngine::destroy
    #[error("render engine is not initialized")]
    NotInitialized,
    /// A surface was requested with a zero dimension or a pixel ratio that
    /// is not a positive finite number.
    #[error("invalid surface size {width}x{height} at pixel ratio {pixel_ratio}")]
    InvalidSurfaceSize {
        /// Requested logical width.
        width: u32,
        /// Requested logical height.
        height: u32,
        /// Requested pixel ratio.
        pixel_ratio: f64,
    },
    /// The device-pixel size of a requested surface exceeds the pool limit.
    #[error("surface of {width}x{height} device pixels exceeds the limit of {max} per side")]
    SurfaceTooLarge {
        /// Device-pixel width.
        width: u64,
        /// Device-pixel height.
        height: u64,
        /// Largest allowed side.
        max: u32,
    },
    /// The layer has no surface.
    #[error("no surface for {0:?}")]
    UnknownLayer(LayerId),
    /// The handle refers to a surface that was already released.
    #[error("stale surface handle {0:?}")]
    StaleSurface(SurfaceId),
}

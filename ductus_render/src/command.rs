// Copyright 2026 the Ductus Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Render commands.

use ductus_core::input::PredictedPoint;
use ductus_core::layer::{LayerId, LayerRef};
use ductus_core::paint::Paint;
use ductus_core::stroke::Stroke;
use ductus_core::trace::CommandKind;
use kurbo::{BezPath, Rect};

/// Scheduling priority. Higher priorities run first.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Priority {
    /// Background work.
    Low,
    /// Committed content.
    #[default]
    Normal,
    /// Live previews.
    High,
    /// Must run in the next frame.
    Immediate,
}

impl Priority {
    /// One level up, never above [`High`](Self::High). `Immediate` stays
    /// `Immediate`.
    #[must_use]
    pub const fn promoted(self) -> Self {
        match self {
            Self::Low => Self::Normal,
            Self::Normal | Self::High => Self::High,
            Self::Immediate => Self::Immediate,
        }
    }

    /// Numeric level, `0` for `Low` up to `3` for `Immediate`.
    #[must_use]
    pub const fn level(self) -> u8 {
        self as u8
    }
}

/// Which surface a command draws into.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SurfaceTarget {
    /// A layer's content surface.
    Layer(LayerId),
    /// The surface presented to the display. Paths drawn here are kept on
    /// top of the composite and the overlay until
    /// [`RenderEngine::clear_main_paths`](crate::RenderEngine::clear_main_paths).
    Main,
    /// The result of compositing every layer.
    Composite,
    /// The overlay holding live stroke previews.
    Working,
}

/// Whether a stroke is a live preview or final content.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum StrokeMode {
    /// Drawn into the working overlay, replaced on every update.
    Preview,
    /// Drawn into the stroke's layer; replaces any preview of the stroke.
    #[default]
    Commit,
}

/// Per-stroke rendering options.
#[derive(Clone, Debug, PartialEq)]
pub struct StrokeOptions {
    /// Preview or commit.
    pub mode: StrokeMode,
    /// Predicted points drawn after the real samples in a ghost pass.
    /// Ignored for commits.
    pub predicted: Vec<PredictedPoint>,
    /// Alpha multiplier for the ghost pass.
    pub ghost_alpha: f32,
}

impl Default for StrokeOptions {
    fn default() -> Self {
        Self {
            mode: StrokeMode::Commit,
            predicted: Vec::new(),
            ghost_alpha: 0.5,
        }
    }
}

impl StrokeOptions {
    /// Options for a live preview with the given predictions.
    #[must_use]
    pub fn preview(predicted: Vec<PredictedPoint>) -> Self {
        Self {
            mode: StrokeMode::Preview,
            predicted,
            ..Self::default()
        }
    }

    /// Options for a final commit.
    #[must_use]
    pub fn commit() -> Self {
        Self::default()
    }
}

/// Draw a stroke.
#[derive(Clone, Debug, PartialEq)]
pub struct StrokeCommand {
    /// The stroke's samples at the time of submission.
    pub stroke: Stroke,
    /// Paint snapshot owned by this command.
    pub paint: Paint,
    /// Preview or commit, and predictions.
    pub options: StrokeOptions,
    /// Where to draw.
    pub target: SurfaceTarget,
}

/// Draw an arbitrary path.
#[derive(Clone, Debug, PartialEq)]
pub struct PathCommand {
    /// Canvas-space path.
    pub path: BezPath,
    /// Paint snapshot owned by this command.
    pub paint: Paint,
    /// Where to draw.
    pub target: SurfaceTarget,
}

/// Composite layers into the composite surface.
#[derive(Clone, Debug, PartialEq)]
pub struct CompositeCommand {
    /// Layers bottom to top.
    pub layers: Vec<LayerRef>,
    /// Optional device-pixel clip.
    pub viewport: Option<Rect>,
}

/// A unit of render work.
#[derive(Clone, Debug, PartialEq)]
pub enum RenderCommand {
    /// See [`StrokeCommand`].
    Stroke(StrokeCommand),
    /// See [`PathCommand`].
    Path(PathCommand),
    /// See [`CompositeCommand`].
    Composite(CompositeCommand),
}

impl RenderCommand {
    /// Surface this command draws into.
    #[must_use]
    pub fn target(&self) -> SurfaceTarget {
        match self {
            Self::Stroke(c) => c.target,
            Self::Path(c) => c.target,
            Self::Composite(_) => SurfaceTarget::Composite,
        }
    }

    /// Kind tag for tracing.
    #[must_use]
    pub fn kind(&self) -> CommandKind {
        match self {
            Self::Stroke(_) => CommandKind::Stroke,
            Self::Path(_) => CommandKind::Path,
            Self::Composite(_) => CommandKind::Composite,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn priority_order_and_promotion() {
        assert!(Priority::Immediate > Priority::High);
        assert!(Priority::High > Priority::Normal);
        assert!(Priority::Normal > Priority::Low);
        assert_eq!(Priority::Low.promoted(), Priority::Normal);
        assert_eq!(Priority::Normal.promoted(), Priority::High);
        assert_eq!(Priority::High.promoted(), Priority::High);
        assert_eq!(Priority::Immediate.promoted(), Priority::Immediate);
        assert_eq!(Priority::Immediate.level(), 3);
    }

    #[test]
    fn composite_targets_the_composite_surface() {
        let cmd = RenderCommand::Composite(CompositeCommand {
            layers: vec![LayerRef::new(LayerId(0))],
            viewport: None,
        });
        assert_eq!(cmd.target(), SurfaceTarget::Composite);
        assert_eq!(cmd.kind(), CommandKind::Composite);
    }
}

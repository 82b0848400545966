// Copyright 2026 the Ductus Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Render queue, frame scheduler, and compositor for ductus.
//!
//! This crate takes the strokes produced by [`ductus_core`]'s input
//! processor and draws them within a per-frame time budget.
//!
//! # Architecture
//!
//! ```text
//!   DrawingSession
//!       │  InputProcessor events ──► preview / commit commands
//!       ▼
//!   RenderEngine
//!       │  RenderQueue (priority, FIFO within a priority, aging)
//!       │  FrameScheduler (execute while elapsed < 80 % of a refresh)
//!       ▼
//!   Surfaces (SurfacePool)
//!       layer surfaces ──► Compositor ──► composite ─┐
//!                                       working ─────┼──► main
//!                                    main paths ─────┘
//! ```
//!
//! - [`RenderCommand`]: stroke, path, or composite work with an owned
//!   [`Paint`](ductus_core::paint::Paint) snapshot.
//! - [`RenderQueue`]: priority-ordered with FIFO ties.
//! - [`FrameScheduler`]: budgeted execution; deferred work stays queued.
//! - [`SurfacePool`]: generational [`SurfaceId`] handles and size-keyed
//!   reuse.
//! - [`Compositor`]: dirty-tracked layer snapshots blended in order.
//! - [`RenderEngine`]: the above plus memory monitoring and statistics.
//! - [`DrawingSession`]: input processing wired to the engine.
//!
//! Rasterization is CPU-only: [`raster`] fills and strokes flattened paths
//! into premultiplied RGBA8 [`Surface`]s using the [`blend`] functions.
//!
//! # Crate features
//!
//! - `serde` (disabled by default): Derives `Serialize`/`Deserialize` for
//!   the configuration types.
//! - `trace` (disabled by default): Enables tracing of frame phases and
//!   commands through [`ductus_core::trace`].

#![cfg_attr(docsrs, feature(doc_auto_cfg))]

pub mod blend;
pub mod raster;
pub mod tessellate;

mod command;
mod compositor;
mod damage;
mod engine;
mod error;
mod memory;
mod pool;
mod queue;
mod scheduler;
mod session;
mod stats;
mod surface;

pub use command::{
    CompositeCommand, PathCommand, Priority, RenderCommand, StrokeCommand, StrokeMode,
    StrokeOptions, SurfaceTarget,
};
pub use compositor::Compositor;
pub use damage::DamageRegion;
pub use engine::{EngineConfig, RenderEngine};
pub use error::RenderError;
pub use memory::{MemoryCleanupEvent, MemoryConfig, MemoryMonitor};
pub use pool::{PoolConfig, SurfaceId, SurfacePool};
pub use queue::{AgingPolicy, RenderQueue};
pub use scheduler::{CommandFailure, FrameReport, FrameScheduler, SchedulerConfig};
pub use session::DrawingSession;
pub use stats::{EngineObserver, NoopEngineObserver, RenderStats};
pub use surface::{BYTES_PER_PIXEL, Surface, device_size};

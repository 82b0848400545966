// Copyright 2026 the Ductus Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Dirty-tracking channel constants.
//!
//! The compositor keeps a cached snapshot of every layer surface and uses
//! multi-channel dirty tracking (via [`understory_dirty`]) to decide which
//! snapshots are stale. Layers are independent, so no channel propagates:
//! every mark uses the default policy and only the marked layer drains.
//!
//! - [`CONTENT`] is marked whenever a stroke or path is drawn into a layer
//!   surface, or the surface is cleared or released.
//! - [`PROPERTIES`] is marked when a layer's opacity, blend mode, or
//!   visibility changes between composites. It does not invalidate the
//!   snapshot but forces the composite to be redrawn.

use understory_dirty::Channel;

/// Layer pixels changed; the cached snapshot must be rebuilt.
pub const CONTENT: Channel = Channel::new(0);

/// Layer compositing metadata changed; the composite must be redrawn.
pub const PROPERTIES: Channel = Channel::new(1);

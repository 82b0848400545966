// Copyright 2026 the Ductus Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Surface pooling with generational handles.
//!
//! [`SurfacePool::acquire`] hands out a [`SurfaceId`] for a surface of the
//! requested size, reusing an idle surface of identical dimensions when one
//! exists. [`SurfacePool::release`] clears the surface and keeps it idle for
//! reuse up to [`PoolConfig::max_idle`]; beyond that it is dropped.
//!
//! Handles carry a slot index and a generation counter. Releasing a surface
//! bumps the slot's generation, so a released handle can never reach a
//! surface that was later issued from the same slot.

use core::fmt;

use crate::error::RenderError;
use crate::surface::{self, Surface};

/// A handle to a surface checked out of a [`SurfacePool`].
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct SurfaceId {
    idx: u32,
    generation: u32,
}

impl SurfaceId {
    /// Returns the raw slot index (for diagnostics only).
    #[inline]
    #[must_use]
    pub const fn index(self) -> u32 {
        self.idx
    }

    /// Returns the generation counter.
    #[inline]
    #[must_use]
    pub const fn generation(self) -> u32 {
        self.generation
    }
}

impl fmt::Debug for SurfaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SurfaceId({}@gen{})", self.idx, self.generation)
    }
}

/// Pool limits.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PoolConfig {
    /// Most idle surfaces kept for reuse.
    pub max_idle: usize,
    /// Longest allowed side, in device pixels.
    pub max_side: u32,
}

impl PoolConfig {
    /// Ten idle surfaces, 8192 device pixels per side.
    #[must_use]
    pub const fn standard() -> Self {
        Self {
            max_idle: 10,
            max_side: 8192,
        }
    }
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self::standard()
    }
}

/// Reuse key: logical size plus the exact pixel ratio.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct SurfaceKey {
    width: u32,
    height: u32,
    ratio_bits: u64,
}

impl SurfaceKey {
    fn new(width: u32, height: u32, pixel_ratio: f64) -> Self {
        Self {
            width,
            height,
            ratio_bits: pixel_ratio.to_bits(),
        }
    }
}

#[derive(Debug)]
struct Idle {
    key: SurfaceKey,
    surface: Surface,
}

/// Hands out and recycles [`Surface`]s.
#[derive(Debug)]
pub struct SurfacePool {
    config: PoolConfig,
    slots: Vec<Option<(SurfaceKey, Surface)>>,
    generation: Vec<u32>,
    free_list: Vec<u32>,
    /// Oldest first.
    idle: Vec<Idle>,
    allocations: u64,
}

impl Default for SurfacePool {
    fn default() -> Self {
        Self::new(PoolConfig::default())
    }
}

impl SurfacePool {
    /// Creates an empty pool.
    #[must_use]
    pub fn new(config: PoolConfig) -> Self {
        Self {
            config,
            slots: Vec::new(),
            generation: Vec::new(),
            free_list: Vec::new(),
            idle: Vec::new(),
            allocations: 0,
        }
    }

    /// Current limits.
    #[must_use]
    pub fn config(&self) -> &PoolConfig {
        &self.config
    }

    /// Replaces the limits, dropping idle surfaces above the new cap.
    pub fn set_config(&mut self, config: PoolConfig) {
        self.config = config;
        if self.idle.len() > config.max_idle {
            let excess = self.idle.len() - config.max_idle;
            self.idle.drain(..excess);
        }
    }

    /// Checks out a surface of `width` x `height` logical pixels at
    /// `pixel_ratio`.
    ///
    /// An idle surface with the same logical size and pixel ratio is reused;
    /// otherwise a new one is allocated and [`allocations`](Self::allocations)
    /// goes up by one.
    pub fn acquire(
        &mut self,
        width: u32,
        height: u32,
        pixel_ratio: f64,
    ) -> Result<SurfaceId, RenderError> {
        let (dw, dh) = surface::device_size(width, height, pixel_ratio, self.config.max_side)?;
        let key = SurfaceKey::new(width, height, pixel_ratio);
        let surface = match self.idle.iter().rposition(|i| i.key == key) {
            Some(pos) => self.idle.remove(pos).surface,
            None => {
                self.allocations += 1;
                tracing::debug!(width = dw, height = dh, "allocating surface");
                Surface::new(dw, dh)
            }
        };

        let idx = if let Some(idx) = self.free_list.pop() {
            self.slots[idx as usize] = Some((key, surface));
            idx
        } else {
            let idx = u32::try_from(self.slots.len()).map_err(|_| {
                RenderError::SurfaceTooLarge {
                    width: u64::from(dw),
                    height: u64::from(dh),
                    max: self.config.max_side,
                }
            })?;
            self.slots.push(Some((key, surface)));
            self.generation.push(0);
            idx
        };
        Ok(SurfaceId {
            idx,
            generation: self.generation[idx as usize],
        })
    }

    /// Returns a surface to the pool.
    ///
    /// The surface is cleared and kept idle for reuse while fewer than
    /// [`PoolConfig::max_idle`] surfaces are idle, otherwise dropped.
    ///
    /// # Panics
    ///
    /// In debug builds, panics if `id` was already released. Release builds
    /// log a warning and ignore the call.
    pub fn release(&mut self, id: SurfaceId) {
        debug_assert!(self.is_alive(id), "surface released twice: {id:?}");
        if !self.is_alive(id) {
            tracing::warn!(?id, "ignoring release of a stale surface handle");
            return;
        }
        let idx = id.idx as usize;
        let Some((key, mut surface)) = self.slots[idx].take() else {
            return;
        };
        self.generation[idx] += 1;
        self.free_list.push(id.idx);

        if self.idle.len() < self.config.max_idle {
            surface.clear();
            self.idle.push(Idle { key, surface });
        }
    }

    /// Returns whether `id` refers to a checked-out surface.
    #[must_use]
    pub fn is_alive(&self, id: SurfaceId) -> bool {
        let idx = id.idx as usize;
        idx < self.slots.len() && self.generation[idx] == id.generation && self.slots[idx].is_some()
    }

    /// The surface behind `id`, or `None` for a stale handle.
    #[must_use]
    pub fn get(&self, id: SurfaceId) -> Option<&Surface> {
        if !self.is_alive(id) {
            return None;
        }
        self.slots[id.idx as usize].as_ref().map(|(_, s)| s)
    }

    /// Mutable access to the surface behind `id`, or `None` for a stale
    /// handle.
    pub fn get_mut(&mut self, id: SurfaceId) -> Option<&mut Surface> {
        if !self.is_alive(id) {
            return None;
        }
        self.slots[id.idx as usize].as_mut().map(|(_, s)| s)
    }

    /// Like [`get`](Self::get), with a typed error for stale handles.
    pub fn try_get(&self, id: SurfaceId) -> Result<&Surface, RenderError> {
        self.get(id).ok_or(RenderError::StaleSurface(id))
    }

    /// Mutable access to `dst` together with shared access to `src`.
    ///
    /// Returns `None` if either handle is stale or both name the same
    /// surface.
    pub fn get_pair_mut(&mut self, dst: SurfaceId, src: SurfaceId) -> Option<(&mut Surface, &Surface)> {
        if dst.idx == src.idx || !self.is_alive(dst) || !self.is_alive(src) {
            return None;
        }
        let (d, s) = (dst.idx as usize, src.idx as usize);
        let (dst_slot, src_slot) = if d < s {
            let (lo, hi) = self.slots.split_at_mut(s);
            (&mut lo[d], &hi[0])
        } else {
            let (lo, hi) = self.slots.split_at_mut(d);
            (&mut hi[0], &lo[s])
        };
        Some((&mut dst_slot.as_mut()?.1, &src_slot.as_ref()?.1))
    }

    /// Drops the older half of the idle surfaces, rounding up. Returns how
    /// many were dropped.
    pub fn compact(&mut self) -> usize {
        let n = self.idle.len().div_ceil(2);
        self.idle.drain(..n);
        n
    }

    /// Drops every idle surface.
    pub fn clear_idle(&mut self) {
        self.idle.clear();
    }

    /// Number of surfaces ever allocated by this pool.
    #[must_use]
    pub fn allocations(&self) -> u64 {
        self.allocations
    }

    /// Number of surfaces waiting for reuse.
    #[must_use]
    pub fn idle_count(&self) -> usize {
        self.idle.len()
    }

    /// Number of checked-out surfaces.
    #[must_use]
    pub fn in_use_count(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    /// Bytes held by checked-out and idle surfaces.
    #[must_use]
    pub fn total_bytes(&self) -> u64 {
        let live: u64 = self
            .slots
            .iter()
            .flatten()
            .map(|(_, s)| s.byte_size())
            .sum();
        let idle: u64 = self.idle.iter().map(|i| i.surface.byte_size()).sum();
        live + idle
    }
}

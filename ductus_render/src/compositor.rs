// Copyright 2026 the Ductus Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Layer compositing with a snapshot cache.
//!
//! Compositing follows a drain-then-draw pattern:
//!
//! 1. **CONTENT**: drain layers whose pixels changed since the last
//!    composite and drop their cached snapshots.
//! 2. **PROPERTIES**: mark layers whose opacity, blend mode, or visibility
//!    differ from the previous composite, then drain them.
//! 3. Re-snapshot every drawn layer that has no cached snapshot.
//! 4. If anything changed, clear the target and draw each visible layer's
//!    snapshot bottom to top with its blend mode and opacity.
//!
//! The snapshot cache is the "texture cache" the memory monitor measures; it
//! can be dropped at any time and is rebuilt lazily.

use std::collections::BTreeMap;

use ductus_core::dirty;
use ductus_core::layer::{LayerId, LayerRef};
use kurbo::Rect;
use understory_dirty::{CycleHandling, DirtyTracker};

use crate::surface::Surface;

/// Combines layer surfaces into one.
#[derive(Debug)]
pub struct Compositor {
    dirty: DirtyTracker<u32>,
    snapshots: BTreeMap<LayerId, Surface>,
    last_layers: Vec<LayerRef>,
    last_viewport: Option<Rect>,
    stale: bool,
    uploads: u64,
}

impl Default for Compositor {
    fn default() -> Self {
        Self::new()
    }
}

impl Compositor {
    /// Creates a compositor with an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self {
            dirty: DirtyTracker::with_cycle_handling(CycleHandling::Error),
            snapshots: BTreeMap::new(),
            last_layers: Vec::new(),
            last_viewport: None,
            stale: true,
            uploads: 0,
        }
    }

    /// Records that `layer`'s pixels changed.
    pub fn mark_content(&mut self, layer: LayerId) {
        self.dirty.mark(layer.0, dirty::CONTENT);
    }

    /// Forgets everything about `layer`, typically after its surface was
    /// released.
    pub fn forget(&mut self, layer: LayerId) {
        self.dirty.remove_key(layer.0);
        self.snapshots.remove(&layer);
        self.stale = true;
    }

    /// Forces the next composite to redraw, e.g. after the target was
    /// re-created.
    pub fn invalidate(&mut self) {
        self.stale = true;
    }

    /// Drops every cached snapshot and returns how many there were.
    pub fn clear_cache(&mut self) -> usize {
        let n = self.snapshots.len();
        self.snapshots.clear();
        n
    }

    /// Bytes held by cached snapshots.
    #[must_use]
    pub fn cache_bytes(&self) -> u64 {
        self.snapshots.values().map(Surface::byte_size).sum()
    }

    /// Number of snapshots taken since creation.
    #[must_use]
    pub fn uploads(&self) -> u64 {
        self.uploads
    }

    /// Resets to a freshly constructed compositor, keeping the upload count.
    pub fn reset(&mut self) {
        let uploads = self.uploads;
        *self = Self::new();
        self.uploads = uploads;
    }

    /// Brings the snapshot cache up to date for `layers` and reports whether
    /// the composite must be redrawn.
    ///
    /// `source` returns the current surface of a layer; layers without one
    /// are skipped.
    pub fn prepare<'s>(
        &mut self,
        layers: &[LayerRef],
        viewport: Option<Rect>,
        source: impl Fn(LayerId) -> Option<&'s Surface>,
    ) -> bool {
        let content: Vec<u32> = self
            .dirty
            .drain(dirty::CONTENT)
            .deterministic()
            .run()
            .collect();
        for key in &content {
            self.snapshots.remove(&LayerId(*key));
        }

        for layer in layers {
            let changed = self
                .last_layers
                .iter()
                .find(|l| l.id == layer.id)
                .is_some_and(|prev| prev != layer);
            if changed {
                self.dirty.mark(layer.id.0, dirty::PROPERTIES);
            }
        }
        let properties: Vec<u32> = self
            .dirty
            .drain(dirty::PROPERTIES)
            .deterministic()
            .run()
            .collect();

        let order_changed = self
            .last_layers
            .iter()
            .map(|l| l.id)
            .ne(layers.iter().map(|l| l.id));
        let needs_redraw = self.stale
            || order_changed
            || viewport != self.last_viewport
            || !properties.is_empty()
            || content.iter().any(|k| layers.iter().any(|l| l.id.0 == *k));

        for layer in layers.iter().filter(|l| l.is_drawn()) {
            if self.snapshots.contains_key(&layer.id) {
                continue;
            }
            match source(layer.id) {
                Some(surface) => {
                    self.snapshots.insert(layer.id, surface.clone());
                    self.uploads += 1;
                }
                None => tracing::debug!(layer = ?layer.id, "no surface to composite"),
            }
        }

        self.last_layers.clear();
        self.last_layers.extend_from_slice(layers);
        self.last_viewport = viewport;
        self.stale = false;
        needs_redraw
    }

    /// Clears `target` and draws every visible layer's snapshot bottom to
    /// top, clipped to `viewport` if given.
    ///
    /// Returns the device-pixel region that changed.
    pub fn draw(
        &self,
        target: &mut Surface,
        layers: &[LayerRef],
        viewport: Option<Rect>,
    ) -> Option<Rect> {
        target.clear();
        for layer in layers.iter().filter(|l| l.is_drawn()) {
            if let Some(snapshot) = self.snapshots.get(&layer.id) {
                target.draw_surface(snapshot, layer.blend_mode, layer.opacity, viewport);
            }
        }
        Some(target.bounds())
    }
}

#[cfg(test)]
mod tests {
    use ductus_core::paint::BlendMode;

    use super::*;

    fn filled(w: u32, h: u32, rgba: [f32; 4]) -> Surface {
        let mut s = Surface::new(w, h);
        for y in 0..h {
            for x in 0..w {
                s.blend_pixel(x, y, rgba, BlendMode::Src, 1.0);
            }
        }
        s
    }

    #[test]
    fn layers_are_drawn_bottom_to_top_with_opacity() {
        let red = filled(2, 2, [1.0, 0.0, 0.0, 1.0]);
        let blue = filled(2, 2, [0.0, 0.0, 1.0, 1.0]);
        let layers = [
            LayerRef::new(LayerId(0)),
            LayerRef::new(LayerId(1)).with_opacity(0.5),
        ];
        let source = |id: LayerId| match id.0 {
            0 => Some(&red),
            1 => Some(&blue),
            _ => None,
        };
        let mut c = Compositor::new();
        assert!(c.prepare(&layers, None, source));
        let mut target = Surface::new(2, 2);
        c.draw(&mut target, &layers, None);
        assert_eq!(target.pixel(0, 0), Some([128, 0, 128, 255]));
        assert_eq!(c.uploads(), 2);
        assert_eq!(c.cache_bytes(), 32);
    }

    #[test]
    fn unchanged_inputs_skip_redraw() {
        let red = filled(2, 2, [1.0, 0.0, 0.0, 1.0]);
        let layers = [LayerRef::new(LayerId(0))];
        let mut c = Compositor::new();
        assert!(c.prepare(&layers, None, |_| Some(&red)));
        assert!(!c.prepare(&layers, None, |_| Some(&red)));
        assert_eq!(c.uploads(), 1, "snapshot reused");

        c.mark_content(LayerId(0));
        assert!(c.prepare(&layers, None, |_| Some(&red)));
        assert_eq!(c.uploads(), 2, "content change re-snapshots");

        let faded = [LayerRef::new(LayerId(0)).with_opacity(0.3)];
        assert!(c.prepare(&faded, None, |_| Some(&red)), "property change");
        assert_eq!(c.uploads(), 2, "property change keeps the snapshot");

        assert!(c.prepare(&faded, Some(Rect::new(0.0, 0.0, 1.0, 1.0)), |_| Some(&red)));
    }

    #[test]
    fn hidden_layers_and_clips() {
        let red = filled(4, 4, [1.0, 0.0, 0.0, 1.0]);
        let layers = [
            LayerRef::new(LayerId(0)),
            LayerRef::new(LayerId(1)).with_visible(false),
        ];
        let mut c = Compositor::new();
        let clip = Some(Rect::new(0.0, 0.0, 2.0, 2.0));
        c.prepare(&layers, clip, |_| Some(&red));
        assert_eq!(c.uploads(), 1, "hidden layer is not snapshotted");
        let mut target = Surface::new(4, 4);
        c.draw(&mut target, &layers, clip);
        assert_eq!(target.pixel(1, 1), Some([255, 0, 0, 255]));
        assert_eq!(target.pixel(3, 3), Some([0, 0, 0, 0]));
    }

    #[test]
    fn cache_can_be_dropped_and_rebuilt() {
        let red = filled(2, 2, [1.0, 0.0, 0.0, 1.0]);
        let layers = [LayerRef::new(LayerId(7))];
        let mut c = Compositor::new();
        c.prepare(&layers, None, |_| Some(&red));
        assert_eq!(c.clear_cache(), 1);
        assert_eq!(c.cache_bytes(), 0);
        c.prepare(&layers, None, |_| Some(&red));
        assert_eq!(c.cache_bytes(), 16);
        c.forget(LayerId(7));
        assert_eq!(c.cache_bytes(), 0);
    }
}

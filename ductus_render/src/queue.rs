// Copyright 2026 the Ductus Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The priority render queue.
//!
//! Commands are kept sorted by descending [`Priority`]; insertion is stable,
//! so commands of equal priority run in submission order. Commands are never
//! dropped by the queue: anything not executed in a frame stays at the front
//! for the next one.
//!
//! A steady stream of high-priority previews could keep low-priority work
//! waiting forever. [`AgingPolicy`] bounds that: a command that has waited
//! long enough is promoted one level, up to `High`.

use std::collections::VecDeque;

use crate::command::{Priority, RenderCommand};

/// How deferred commands are promoted.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum AgingPolicy {
    /// Never promote; low priorities can starve.
    Disabled,
    /// Promote one level after waiting through `frames` frames.
    After {
        /// Frames a command waits before each promotion.
        frames: u32,
    },
}

impl Default for AgingPolicy {
    fn default() -> Self {
        Self::After { frames: 60 }
    }
}

#[derive(Debug)]
struct Entry {
    command: RenderCommand,
    priority: Priority,
    waited: u32,
}

/// Pending render commands in execution order.
#[derive(Debug, Default)]
pub struct RenderQueue {
    entries: VecDeque<Entry>,
    aging: AgingPolicy,
}

impl RenderQueue {
    /// Creates an empty queue.
    #[must_use]
    pub fn new(aging: AgingPolicy) -> Self {
        Self {
            entries: VecDeque::new(),
            aging,
        }
    }

    /// Current aging policy.
    #[must_use]
    pub fn aging(&self) -> AgingPolicy {
        self.aging
    }

    /// Replaces the aging policy; waiting counts are kept.
    pub fn set_aging(&mut self, aging: AgingPolicy) {
        self.aging = aging;
    }

    /// Inserts `command` after every queued command of equal or higher
    /// priority.
    pub fn push(&mut self, command: RenderCommand, priority: Priority) {
        let at = self.entries.partition_point(|e| e.priority >= priority);
        self.entries.insert(
            at,
            Entry {
                command,
                priority,
                waited: 0,
            },
        );
    }

    /// Removes and returns the next command to execute.
    pub fn pop(&mut self) -> Option<(RenderCommand, Priority)> {
        self.entries.pop_front().map(|e| (e.command, e.priority))
    }

    /// Number of queued commands.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if nothing is queued.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Priorities in execution order.
    pub fn priorities(&self) -> impl Iterator<Item = Priority> + '_ {
        self.entries.iter().map(|e| e.priority)
    }

    /// Commands in execution order.
    pub fn iter(&self) -> impl Iterator<Item = &RenderCommand> + '_ {
        self.entries.iter().map(|e| &e.command)
    }

    /// Keeps only the commands for which `keep` returns `true`.
    pub fn retain(&mut self, mut keep: impl FnMut(&RenderCommand) -> bool) {
        self.entries.retain(|e| keep(&e.command));
    }

    /// Drops every queued command.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Marks the end of a frame for the commands still queued, promoting the
    /// ones that have waited long enough.
    pub fn end_frame(&mut self) {
        let AgingPolicy::After { frames } = self.aging else {
            return;
        };
        let mut promoted = false;
        for e in &mut self.entries {
            e.waited += 1;
            if e.waited >= frames && e.priority < Priority::High {
                e.priority = e.priority.promoted();
                e.waited = 0;
                promoted = true;
            }
        }
        if promoted {
            tracing::debug!(queued = self.entries.len(), "promoted starving commands");
            // Stable: promoted commands land behind those already at their
            // new level.
            self.entries
                .make_contiguous()
                .sort_by_key(|e| core::cmp::Reverse(e.priority));
        }
    }
}

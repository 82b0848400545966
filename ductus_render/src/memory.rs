// Copyright 2026 the Ductus Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Periodic memory-pressure checks.

use ductus_core::time::{Duration, HostTime};

/// When and how hard to clean up.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MemoryConfig {
    /// Time between checks.
    pub check_interval: Duration,
    /// Memory budget for surfaces and cached snapshots.
    pub ceiling_bytes: u64,
    /// Pressure (used / ceiling) above which cleanup runs.
    pub pressure_threshold: f64,
}

impl MemoryConfig {
    /// Check every 5 s against 512 MiB, clean up above 80 %.
    #[must_use]
    pub const fn standard() -> Self {
        Self {
            check_interval: Duration::from_secs(5),
            ceiling_bytes: 512 * 1024 * 1024,
            pressure_threshold: 0.8,
        }
    }
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self::standard()
    }
}

/// Emitted after a cleanup pass.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MemoryCleanupEvent {
    /// When the check ran.
    pub timestamp: HostTime,
    /// Pressure that triggered the cleanup.
    pub pressure: f64,
    /// Bytes in use before cleanup.
    pub bytes_before: u64,
    /// Bytes in use after cleanup.
    pub bytes_after: u64,
    /// Cached snapshots dropped.
    pub snapshots_cleared: usize,
    /// Idle surfaces dropped.
    pub surfaces_dropped: usize,
}

/// Decides when memory is checked and whether it is under pressure.
#[derive(Clone, Debug, Default)]
pub struct MemoryMonitor {
    config: MemoryConfig,
    last_check: Option<HostTime>,
}

impl MemoryMonitor {
    /// Creates a monitor. The first check is due immediately.
    #[must_use]
    pub fn new(config: MemoryConfig) -> Self {
        Self {
            config,
            last_check: None,
        }
    }

    /// Current configuration.
    #[must_use]
    pub fn config(&self) -> &MemoryConfig {
        &self.config
    }

    /// Replaces the configuration; the check schedule is kept.
    pub fn set_config(&mut self, config: MemoryConfig) {
        self.config = config;
    }

    /// Returns `true` if a check is due at `now`.
    #[must_use]
    pub fn is_due(&self, now: HostTime) -> bool {
        self.last_check
            .is_none_or(|t| now.saturating_duration_since(t) >= self.config.check_interval)
    }

    /// Pressure for `used` bytes: the fraction of the ceiling in use.
    #[must_use]
    pub fn pressure(&self, used: u64) -> f64 {
        if self.config.ceiling_bytes == 0 {
            return f64::INFINITY;
        }
        used as f64 / self.config.ceiling_bytes as f64
    }

    /// Runs a check at `now` if one is due.
    ///
    /// Returns the pressure when it exceeds the threshold, meaning the caller
    /// should clean up.
    pub fn check(&mut self, now: HostTime, used: u64) -> Option<f64> {
        if !self.is_due(now) {
            return None;
        }
        self.last_check = Some(now);
        let pressure = self.pressure(used);
        tracing::trace!(used, pressure, "memory check");
        (pressure > self.config.pressure_threshold).then_some(pressure)
    }

    /// Forgets the check schedule; the next check is due immediately.
    pub fn reset(&mut self) {
        self.last_check = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn monitor() -> MemoryMonitor {
        MemoryMonitor::new(MemoryConfig {
            ceiling_bytes: 1000,
            ..MemoryConfig::standard()
        })
    }

    #[test]
    fn checks_run_on_the_interval() {
        let mut m = monitor();
        let t0 = HostTime::from_millis(0);
        assert!(m.is_due(t0));
        assert_eq!(m.check(t0, 100), None);
        assert!(!m.is_due(HostTime::from_millis(4_999)));
        assert_eq!(m.check(HostTime::from_millis(4_999), 900), None, "not due yet");
        assert_eq!(m.check(HostTime::from_millis(5_000), 900), Some(0.9));
    }

    #[test]
    fn threshold_is_exclusive() {
        let mut m = monitor();
        assert_eq!(m.check(HostTime(0), 800), None);
        m.reset();
        assert!(m.check(HostTime(0), 801).is_some());
    }

    #[test]
    fn default_budget() {
        let c = MemoryConfig::default();
        assert_eq!(c.ceiling_bytes, 536_870_912);
        assert_eq!(c.check_interval, Duration::from_secs(5));
    }
}

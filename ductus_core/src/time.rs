// Copyright 2026 the Ductus Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Monotonic host time, durations, and injectable clocks.
//!
//! [`HostTime`] is a point on the host's monotonic clock expressed in
//! nanoseconds. Platform integrations that read native ticks (e.g.
//! `mach_absolute_time`) convert them at the boundary with a [`Timebase`].
//!
//! [`Duration`] uses the same nanosecond units. Conversions that can overflow
//! use `u128` intermediates.
//!
//! [`Clock`] abstracts "what time is it now" so that frame budgeting can be
//! driven by a real clock in production and by [`ManualClock`] or
//! [`SteppingClock`] in tests.

use core::cell::Cell;
use core::fmt;
use core::ops::{Add, Sub};

/// Nanoseconds per second.
pub const NANOS_PER_SEC: u64 = 1_000_000_000;

/// Nanoseconds per millisecond.
pub const NANOS_PER_MILLI: u64 = 1_000_000;

/// A point in time on the host's monotonic clock, in nanoseconds.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct HostTime(pub u64);

impl HostTime {
    /// Returns the raw nanosecond value.
    #[inline]
    #[must_use]
    pub const fn nanos(self) -> u64 {
        self.0
    }

    /// Creates a host time from a millisecond value.
    #[inline]
    #[must_use]
    pub const fn from_millis(millis: u64) -> Self {
        Self(millis * NANOS_PER_MILLI)
    }

    /// Returns the duration between `self` and an earlier time, or zero if
    /// `earlier` is after `self`.
    #[inline]
    #[must_use]
    pub const fn saturating_duration_since(self, earlier: Self) -> Duration {
        Duration(self.0.saturating_sub(earlier.0))
    }

    /// Checked addition of a duration.
    #[inline]
    #[must_use]
    pub const fn checked_add(self, duration: Duration) -> Option<Self> {
        match self.0.checked_add(duration.0) {
            Some(t) => Some(Self(t)),
            None => None,
        }
    }
}

impl Add<Duration> for HostTime {
    type Output = Self;

    #[inline]
    fn add(self, rhs: Duration) -> Self {
        Self(self.0 + rhs.0)
    }
}

impl Sub for HostTime {
    type Output = Duration;

    #[inline]
    fn sub(self, rhs: Self) -> Duration {
        Duration(self.0 - rhs.0)
    }
}

impl fmt::Debug for HostTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HostTime({})", self.0)
    }
}

/// A duration in nanoseconds.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Duration(pub u64);

impl Duration {
    /// A zero-length duration.
    pub const ZERO: Self = Self(0);

    /// Creates a duration from whole milliseconds.
    #[inline]
    #[must_use]
    pub const fn from_millis(millis: u64) -> Self {
        Self(millis * NANOS_PER_MILLI)
    }

    /// Creates a duration from whole seconds.
    #[inline]
    #[must_use]
    pub const fn from_secs(secs: u64) -> Self {
        Self(secs * NANOS_PER_SEC)
    }

    /// Returns the frame interval for a refresh rate in hertz.
    ///
    /// # Panics
    ///
    /// Panics if `hz` is zero.
    #[inline]
    #[must_use]
    pub const fn from_refresh_rate(hz: u32) -> Self {
        assert!(hz != 0, "refresh rate must not be zero");
        Self(NANOS_PER_SEC / hz as u64)
    }

    /// Returns the raw nanosecond value.
    #[inline]
    #[must_use]
    pub const fn nanos(self) -> u64 {
        self.0
    }

    /// Returns the duration in (fractional) seconds.
    #[inline]
    #[must_use]
    pub fn as_secs_f64(self) -> f64 {
        self.0 as f64 / NANOS_PER_SEC as f64
    }

    /// Returns the duration in (fractional) milliseconds.
    #[inline]
    #[must_use]
    pub fn as_millis_f64(self) -> f64 {
        self.0 as f64 / NANOS_PER_MILLI as f64
    }

    /// Scales the duration by a ratio in `[0, 1]` or above, rounding down.
    #[inline]
    #[must_use]
    #[expect(
        clippy::cast_possible_truncation,
        reason = "scaled durations of realistic frame budgets fit in u64"
    )]
    pub fn mul_f64(self, ratio: f64) -> Self {
        Self((self.0 as f64 * ratio.max(0.0)) as u64)
    }

    /// Saturating addition.
    #[inline]
    #[must_use]
    pub const fn saturating_add(self, rhs: Self) -> Self {
        Self(self.0.saturating_add(rhs.0))
    }

    /// Saturating subtraction.
    #[inline]
    #[must_use]
    pub const fn saturating_sub(self, rhs: Self) -> Self {
        Self(self.0.saturating_sub(rhs.0))
    }
}

impl Add for Duration {
    type Output = Self;

    #[inline]
    fn add(self, rhs: Self) -> Self {
        Self(self.0 + rhs.0)
    }
}

impl Sub for Duration {
    type Output = Self;

    #[inline]
    fn sub(self, rhs: Self) -> Self {
        Self(self.0 - rhs.0)
    }
}

impl fmt::Debug for Duration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Duration({})", self.0)
    }
}

/// Rational conversion factor from platform ticks to nanoseconds.
///
/// `nanoseconds = ticks * numer / denom`
///
/// This matches the `mach_timebase_info` pattern on macOS. Platform glue uses
/// it once, when turning a native event timestamp into a [`HostTime`].
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Timebase {
    /// Numerator of the ticks-to-nanoseconds ratio.
    pub numer: u32,
    /// Denominator of the ticks-to-nanoseconds ratio.
    pub denom: u32,
}

impl Timebase {
    /// A timebase where ticks are already nanoseconds (1:1).
    pub const NANOS: Self = Self { numer: 1, denom: 1 };

    /// Creates a new timebase with the given numerator and denominator.
    ///
    /// # Panics
    ///
    /// Panics if `denom` is zero.
    #[inline]
    #[must_use]
    pub const fn new(numer: u32, denom: u32) -> Self {
        assert!(denom != 0, "timebase denominator must not be zero");
        Self { numer, denom }
    }

    /// Converts platform ticks to a [`HostTime`].
    #[inline]
    #[must_use]
    #[expect(
        clippy::cast_possible_truncation,
        reason = "u128 intermediate avoids overflow; truncation back to u64 is intentional"
    )]
    pub const fn to_host_time(self, ticks: u64) -> HostTime {
        let wide = ticks as u128 * self.numer as u128 / self.denom as u128;
        HostTime(wide as u64)
    }
}

impl fmt::Debug for Timebase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Timebase({}/{})", self.numer, self.denom)
    }
}

/// A source of monotonic host time.
///
/// Reading the clock takes `&self`; implementations that need to advance on
/// read use interior mutability.
pub trait Clock {
    /// Returns the current host time.
    fn now(&self) -> HostTime;
}

/// A clock that only moves when told to.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: Cell<u64>,
}

impl ManualClock {
    /// Creates a clock reading `start`.
    #[must_use]
    pub fn new(start: HostTime) -> Self {
        Self {
            now: Cell::new(start.0),
        }
    }

    /// Sets the current time.
    pub fn set(&self, t: HostTime) {
        self.now.set(t.0);
    }

    /// Advances the current time by `d`.
    pub fn advance(&self, d: Duration) {
        self.now.set(self.now.get() + d.0);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> HostTime {
        HostTime(self.now.get())
    }
}

/// A clock that advances by a fixed step every time it is read.
///
/// Models work whose cost is proportional to the number of clock reads, which
/// is how frame-budget tests simulate slow command execution.
#[derive(Debug)]
pub struct SteppingClock {
    now: Cell<u64>,
    step: u64,
}

impl SteppingClock {
    /// Creates a clock starting at `start` that advances by `step` per read.
    #[must_use]
    pub fn new(start: HostTime, step: Duration) -> Self {
        Self {
            now: Cell::new(start.0),
            step: step.0,
        }
    }
}

impl Clock for SteppingClock {
    fn now(&self) -> HostTime {
        let t = self.now.get();
        self.now.set(t + self.step);
        HostTime(t)
    }
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now(&self) -> HostTime {
        (**self).now()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn refresh_rate_budget() {
        assert_eq!(Duration::from_refresh_rate(120).nanos(), 8_333_333);
        assert_eq!(Duration::from_refresh_rate(60).nanos(), 16_666_666);
    }

    #[test]
    fn timebase_conversion_macos_style() {
        // Typical ARM Mac: 125/3 (ticks run at 24 MHz)
        let tb = Timebase::new(125, 3);
        assert_eq!(tb.to_host_time(24_000_000), HostTime(NANOS_PER_SEC));
    }

    #[test]
    fn duration_arithmetic() {
        let a = Duration(100);
        let b = Duration(30);
        assert_eq!((a + b).nanos(), 130);
        assert_eq!((a - b).nanos(), 70);
        assert_eq!(a.saturating_sub(Duration(200)), Duration::ZERO);
        assert_eq!(Duration(1000).mul_f64(0.8), Duration(800));
    }

    #[test]
    fn host_time_duration_ops() {
        let t = HostTime(1000);
        assert_eq!((t + Duration(200)).nanos(), 1200);
        assert_eq!(t.saturating_duration_since(HostTime(1500)), Duration::ZERO);
        assert_eq!(t.saturating_duration_since(HostTime(400)), Duration(600));
    }

    #[test]
    fn stepping_clock_advances_per_read() {
        let clock = SteppingClock::new(HostTime(10), Duration(5));
        assert_eq!(clock.now(), HostTime(10));
        assert_eq!(clock.now(), HostTime(15));
        assert_eq!(clock.now(), HostTime(20));
    }

    #[test]
    fn manual_clock_only_moves_when_told() {
        let clock = ManualClock::new(HostTime(0));
        assert_eq!(clock.now(), clock.now());
        clock.advance(Duration::from_millis(3));
        assert_eq!(clock.now(), HostTime(3_000_000));
    }
}

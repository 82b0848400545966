// Copyright 2026 the Ductus Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Frame-budgeted execution of the render queue.
//!
//! The [`FrameScheduler`] drains a [`RenderQueue`] once per display refresh.
//! Each frame gets a budget of one refresh interval; commands are executed
//! from the front of the queue while the time spent so far is below
//! [`SchedulerConfig::budget_fraction`] of that interval. Whatever is left
//! stays queued for the next frame, never dropped and never run twice.
//!
//! A command that fails is logged and counted, and the frame moves on.

use ductus_core::time::{Clock, Duration};
use ductus_core::trace::{CommandEvent, CommandKind, Tracer};
use kurbo::Rect;

use crate::command::RenderCommand;
use crate::damage::DamageRegion;
use crate::error::RenderError;
use crate::queue::RenderQueue;

/// Configuration for the [`FrameScheduler`].
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SchedulerConfig {
    /// Display refresh rate in Hz.
    pub refresh_rate: u32,
    /// Share of the refresh interval spent executing commands (0.0–1.0).
    pub budget_fraction: f64,
    /// EMA smoothing factor for frame time (0.0–1.0).
    /// Smaller values = more smoothing.
    pub ema_alpha: f32,
}

impl SchedulerConfig {
    /// 120 Hz displays.
    #[must_use]
    pub const fn promotion() -> Self {
        Self {
            refresh_rate: 120,
            budget_fraction: 0.8,
            ema_alpha: 0.2,
        }
    }

    /// 60 Hz displays.
    #[must_use]
    pub const fn standard() -> Self {
        Self {
            refresh_rate: 60,
            budget_fraction: 0.8,
            ema_alpha: 0.2,
        }
    }

    /// One refresh interval. A zero refresh rate is treated as 1 Hz.
    #[must_use]
    pub const fn frame_interval(&self) -> Duration {
        let hz = if self.refresh_rate == 0 { 1 } else { self.refresh_rate };
        Duration::from_refresh_rate(hz)
    }

    /// Returns a copy the scheduler can run with. A zero refresh rate, a
    /// budget fraction outside `(0, 1]`, and an EMA factor outside `(0, 1]`
    /// fall back to the defaults.
    #[must_use]
    pub fn sanitized(self) -> Self {
        let defaults = Self::default();
        let unit = |v: f64| v.is_finite() && v > 0.0 && v <= 1.0;
        Self {
            refresh_rate: if self.refresh_rate == 0 {
                defaults.refresh_rate
            } else {
                self.refresh_rate
            },
            budget_fraction: if unit(self.budget_fraction) {
                self.budget_fraction
            } else {
                defaults.budget_fraction
            },
            ema_alpha: if unit(f64::from(self.ema_alpha)) {
                self.ema_alpha
            } else {
                defaults.ema_alpha
            },
        }
    }

    /// Time available for command execution in one frame.
    #[must_use]
    pub fn execution_budget(&self) -> Duration {
        self.frame_interval()
            .mul_f64(self.budget_fraction.clamp(0.0, 1.0))
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self::promotion()
    }
}

/// Exponential moving average tracker.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Ema {
    value: f32,
    alpha: f32,
    initialized: bool,
}

impl Ema {
    pub(crate) const fn new(alpha: f32) -> Self {
        Self {
            value: 0.0,
            alpha,
            initialized: false,
        }
    }

    pub(crate) fn update(&mut self, sample: f32) {
        if self.initialized {
            self.value = self.alpha * sample + (1.0 - self.alpha) * self.value;
        } else {
            self.value = sample;
            self.initialized = true;
        }
    }

    pub(crate) const fn get(&self) -> f32 {
        self.value
    }
}

/// A command that failed during a frame.
#[derive(Clone, Debug, PartialEq)]
pub struct CommandFailure {
    /// What kind of command failed.
    pub kind: CommandKind,
    /// Why.
    pub error: RenderError,
}

/// What happened during one frame.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FrameReport {
    /// Monotonic frame counter.
    pub frame_index: u64,
    /// Commands that ran, including failed ones.
    pub executed: u32,
    /// Commands that ran and failed.
    pub failed: u32,
    /// Commands left in the queue for the next frame.
    pub deferred: u32,
    /// Time spent executing commands.
    pub elapsed: Duration,
    /// Execution budget for the frame.
    pub budget: Duration,
    /// Device-pixel regions drawn during the frame.
    pub damage: DamageRegion,
    /// Every failure, in execution order.
    pub failures: Vec<CommandFailure>,
}

/// Drains the render queue within a per-frame time budget.
#[derive(Debug)]
pub struct FrameScheduler {
    config: SchedulerConfig,
    frame_index: u64,
    frame_time_ema: Ema,
}

impl FrameScheduler {
    /// Creates a new scheduler with the given configuration.
    #[must_use]
    pub fn new(config: SchedulerConfig) -> Self {
        let config = checked(config);
        Self {
            config,
            frame_index: 0,
            frame_time_ema: Ema::new(config.ema_alpha),
        }
    }

    /// Current configuration.
    #[must_use]
    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    /// Replaces the configuration. The frame time average restarts.
    pub fn set_config(&mut self, config: SchedulerConfig) {
        let config = checked(config);
        self.config = config;
        self.frame_time_ema = Ema::new(config.ema_alpha);
    }

    /// Index the next frame will get.
    #[must_use]
    pub fn frame_index(&self) -> u64 {
        self.frame_index
    }

    /// Smoothed execution time per frame, in milliseconds.
    #[must_use]
    pub fn average_frame_ms(&self) -> f64 {
        f64::from(self.frame_time_ema.get())
    }

    /// Runs one frame: executes commands from the front of `queue` until it
    /// is empty or the execution budget is spent.
    ///
    /// `exec` draws one command and returns the device-pixel bounds it
    /// touched. The clock is read once before the first command and once
    /// after each command.
    pub fn run_frame<F>(
        &mut self,
        queue: &mut RenderQueue,
        clock: &dyn Clock,
        tracer: &mut Tracer<'_>,
        mut exec: F,
    ) -> FrameReport
    where
        F: FnMut(RenderCommand) -> Result<Option<Rect>, RenderError>,
    {
        let budget = self.config.execution_budget();
        let frame_index = self.frame_index;
        self.frame_index += 1;

        let start = clock.now();
        let mut now = start;
        let mut report = FrameReport {
            frame_index,
            budget,
            ..FrameReport::default()
        };

        while now.saturating_duration_since(start) < budget {
            let Some((command, priority)) = queue.pop() else {
                break;
            };
            let kind = command.kind();
            let result = exec(command);
            let end = clock.now();
            report.executed += 1;

            let failed = match result {
                Ok(Some(rect)) => {
                    report.damage.add_rect(rect);
                    false
                }
                Ok(None) => false,
                Err(error) => {
                    tracing::error!(?kind, %error, "render command failed");
                    report.failed += 1;
                    report.failures.push(CommandFailure { kind, error });
                    true
                }
            };
            tracer.command(&CommandEvent {
                frame_index,
                kind,
                priority: priority.level(),
                start: now,
                end,
                failed,
            });
            now = end;
        }

        report.elapsed = now.saturating_duration_since(start);
        report.deferred = u32::try_from(queue.len()).unwrap_or(u32::MAX);
        if report.deferred > 0 {
            tracing::trace!(
                frame_index,
                deferred = report.deferred,
                "frame budget spent"
            );
        }
        queue.end_frame();

        #[expect(
            clippy::cast_possible_truncation,
            reason = "frame times in milliseconds fit in f32"
        )]
        {
            self.frame_time_ema
                .update(report.elapsed.as_millis_f64() as f32);
        }
        report
    }
}

fn checked(config: SchedulerConfig) -> SchedulerConfig {
    let sanitized = config.sanitized();
    if sanitized != config {
        tracing::warn!(?config, ?sanitized, "invalid scheduler settings replaced");
    }
    sanitized
}

#[cfg(test)]
mod tests {
    use ductus_core::paint::Paint;
    use ductus_core::time::{HostTime, SteppingClock};
    use kurbo::BezPath;

    use super::*;
    use crate::command::{PathCommand, Priority, SurfaceTarget};

    fn path_command() -> RenderCommand {
        RenderCommand::Path(PathCommand {
            path: BezPath::new(),
            paint: Paint::default(),
            target: SurfaceTarget::Main,
        })
    }

    fn queue_of(n: usize) -> RenderQueue {
        let mut q = RenderQueue::default();
        for _ in 0..n {
            q.push(path_command(), Priority::Normal);
        }
        q
    }

    #[test]
    fn budget_matches_refresh_rate() {
        let c = SchedulerConfig::promotion();
        assert_eq!(c.frame_interval(), Duration(8_333_333));
        assert_eq!(c.execution_budget(), Duration(6_666_666));
        assert_eq!(
            SchedulerConfig::standard().execution_budget(),
            Duration(13_333_332)
        );
    }

    #[test]
    fn unusable_settings_fall_back_to_defaults() {
        let mut sched = FrameScheduler::new(SchedulerConfig {
            refresh_rate: 0,
            budget_fraction: f64::NAN,
            ema_alpha: -1.0,
        });
        assert_eq!(*sched.config(), SchedulerConfig::default());

        sched.set_config(SchedulerConfig {
            refresh_rate: 60,
            budget_fraction: 0.0,
            ..SchedulerConfig::standard()
        });
        assert_eq!(sched.config().refresh_rate, 60);
        assert_eq!(sched.config().execution_budget(), Duration(13_333_332));

        // A frame with the repaired settings still makes progress.
        let clock = SteppingClock::new(HostTime(0), Duration::from_millis(1));
        let mut queue = queue_of(3);
        let report = sched.run_frame(&mut queue, &clock, &mut Tracer::none(), |_| Ok(None));
        assert_eq!(report.executed, 3);

        let raw = SchedulerConfig {
            refresh_rate: 0,
            ..SchedulerConfig::default()
        };
        assert_eq!(raw.frame_interval(), Duration::from_secs(1));
    }

    #[test]
    fn executes_only_what_fits_and_defers_the_rest() {
        // 2 ms per clock read; commands start at 0, 2, 4 and 6 ms, all below
        // the 6.67 ms budget. The fifth would start at 8 ms.
        let clock = SteppingClock::new(HostTime(0), Duration::from_millis(2));
        let mut sched = FrameScheduler::new(SchedulerConfig::promotion());
        let mut queue = queue_of(10);
        let mut ran = 0;

        let r1 = sched.run_frame(&mut queue, &clock, &mut Tracer::none(), |_| {
            ran += 1;
            Ok(None)
        });
        assert_eq!((r1.executed, r1.deferred), (4, 6));
        assert_eq!(r1.elapsed, Duration::from_millis(8));

        let r2 = sched.run_frame(&mut queue, &clock, &mut Tracer::none(), |_| {
            ran += 1;
            Ok(None)
        });
        assert_eq!((r2.executed, r2.deferred), (4, 2));

        let r3 = sched.run_frame(&mut queue, &clock, &mut Tracer::none(), |_| {
            ran += 1;
            Ok(None)
        });
        assert_eq!((r3.executed, r3.deferred), (2, 0));
        assert_eq!(ran, 10, "every command ran exactly once");
        assert_eq!(r3.frame_index, 2);
        assert!(sched.average_frame_ms() > 0.0);
    }

    #[test]
    fn failures_do_not_stop_the_frame() {
        let clock = SteppingClock::new(HostTime(0), Duration(1));
        let mut sched = FrameScheduler::new(SchedulerConfig::standard());
        let mut queue = queue_of(3);
        let mut n = 0;
        let report = sched.run_frame(&mut queue, &clock, &mut Tracer::none(), |_| {
            n += 1;
            if n == 2 {
                Err(RenderError::NotInitialized)
            } else {
                Ok(Some(Rect::new(0.0, 0.0, 1.0, 1.0)))
            }
        });
        assert_eq!(report.executed, 3);
        assert_eq!(report.failed, 1);
        assert_eq!(report.failures[0].kind, CommandKind::Path);
        assert_eq!(
            report.damage,
            DamageRegion::Rects(vec![Rect::new(0.0, 0.0, 1.0, 1.0); 2])
        );
    }

    #[test]
    fn empty_queue_is_a_quiet_frame() {
        let clock = SteppingClock::new(HostTime(0), Duration(1));
        let mut sched = FrameScheduler::new(SchedulerConfig::default());
        let report = sched.run_frame(&mut RenderQueue::default(), &clock, &mut Tracer::none(), |_| {
            Ok(None)
        });
        assert_eq!(report.executed, 0);
        assert!(report.damage.is_empty());
    }
}

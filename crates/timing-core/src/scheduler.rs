//! Host-time to emulated-cycle scheduler.
//!
//! Each call to [`Scheduler::tick`] measures the host time elapsed since the
//! previous call, clamps it, and converts it into a bounded number of
//! fixed-size emulation steps. Render presentation and FPS measurement are
//! paced from the same clamped wall-clock span, independent of how many steps
//! ran.

use crate::clock::{CycleClock, TickSource};
use crate::config::SchedulerConfig;
use crate::ConfigError;

/// Consumer of scheduler steps and render cadence.
pub trait EmulationTarget {
    /// Advances emulation by `cycles` emulated cycles.
    fn step(&mut self, cycles: u32);

    /// Presents the current frame.
    fn render(&mut self);
}

/// Host status surface (window title, terminal line, ...).
pub trait StatusSink {
    /// Receives a status string such as `"FPS: 60"`.
    fn publish_status(&mut self, status: &str);
}

/// Formats the status string published once per FPS window.
#[must_use]
pub fn fps_status(fps: u32) -> String {
    format!("FPS: {fps:02}")
}

/// Accumulators and diagnostics carried between scheduler calls.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SchedulerState {
    prev_cycles: u64,
    current_cycles: u64,
    total_host_ticks: u64,
    emulated_cycles: u64,
    span_accumulator: f64,
    render_time_span: f64,
    fps_time_span: f64,
    fps_counter: u32,
    fps: u32,
    dropped_backlog_ms: f64,
}

impl SchedulerState {
    /// Host tick value sampled by the previous call.
    #[must_use]
    pub const fn prev_cycles(&self) -> u64 {
        self.prev_cycles
    }

    /// Host tick value sampled by the latest call.
    #[must_use]
    pub const fn current_cycles(&self) -> u64 {
        self.current_cycles
    }

    /// Host ticks observed since the scheduler was created.
    #[must_use]
    pub const fn total_host_ticks(&self) -> u64 {
        self.total_host_ticks
    }

    /// Emulated cycles handed to the target.
    #[must_use]
    pub const fn emulated_cycles(&self) -> u64 {
        self.emulated_cycles
    }

    /// Unconsumed milliseconds awaiting conversion into steps.
    #[must_use]
    pub const fn span_accumulator(&self) -> f64 {
        self.span_accumulator
    }

    /// Milliseconds since the last render.
    #[must_use]
    pub const fn render_time_span(&self) -> f64 {
        self.render_time_span
    }

    /// Milliseconds into the current FPS window.
    #[must_use]
    pub const fn fps_time_span(&self) -> f64 {
        self.fps_time_span
    }

    /// Frames rendered in the current FPS window.
    #[must_use]
    pub const fn fps_counter(&self) -> u32 {
        self.fps_counter
    }

    /// Last published FPS value.
    #[must_use]
    pub const fn fps(&self) -> u32 {
        self.fps
    }

    /// Backlog discarded because the step cap was reached.
    #[must_use]
    pub const fn dropped_backlog_ms(&self) -> f64 {
        self.dropped_backlog_ms
    }
}

/// Summary of one scheduler call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TickReport {
    /// Clamped host span fed into the accumulators, in ms.
    pub span_ms: f64,
    /// Drain steps executed.
    pub steps: u32,
    /// True when the render callback ran.
    pub rendered: bool,
    /// FPS value published by this call, if the window closed.
    pub published_fps: Option<u32>,
}

/// Paces an [`EmulationTarget`] from a calibrated host clock.
#[derive(Debug)]
pub struct Scheduler<S> {
    clock: CycleClock<S>,
    config: SchedulerConfig,
    step_ms: f64,
    state: SchedulerState,
}

impl<S: TickSource> Scheduler<S> {
    /// Creates a scheduler whose first span starts now.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when `config` fails validation.
    pub fn new(clock: CycleClock<S>, config: SchedulerConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let mut scheduler = Self {
            clock,
            config,
            step_ms: config.step_ms(),
            state: SchedulerState::default(),
        };
        scheduler.reset_timebase();
        Ok(scheduler)
    }

    /// Re-samples the host clock so time spent paused is not replayed.
    pub fn reset_timebase(&mut self) {
        let now = self.clock.current_cycles();
        self.state.prev_cycles = now;
        self.state.current_cycles = now;
    }

    /// Runs one host callback's worth of scheduling.
    pub fn tick<T, K>(&mut self, target: &mut T, status: &mut K) -> TickReport
    where
        T: EmulationTarget + ?Sized,
        K: StatusSink + ?Sized,
    {
        let current = self.clock.current_cycles();
        self.state.current_cycles = current;
        let delta = current.saturating_sub(self.state.prev_cycles);
        let span_ms = self.clock.ticks_to_ms(delta).min(self.config.max_span_ms);

        self.state.span_accumulator += span_ms;
        let steps = self.drain(target);

        self.state.total_host_ticks = self.state.total_host_ticks.saturating_add(delta);
        self.state.prev_cycles = current;

        self.state.render_time_span += span_ms;
        let rendered = self.state.render_time_span >= self.config.render_interval_ms;
        if rendered {
            target.render();
            self.state.render_time_span = 0.0;
            self.state.fps_counter = self.state.fps_counter.saturating_add(1);
        }

        self.state.fps_time_span += span_ms;
        let published_fps = if self.state.fps_time_span >= self.config.fps_window_ms {
            self.state.fps = self.state.fps_counter;
            self.state.fps_counter = 0;
            self.state.fps_time_span = 0.0;
            tracing::debug!(fps = self.state.fps, "fps window closed");
            status.publish_status(&fps_status(self.state.fps));
            Some(self.state.fps)
        } else {
            None
        };

        TickReport {
            span_ms,
            steps,
            rendered,
            published_fps,
        }
    }

    fn drain<T: EmulationTarget + ?Sized>(&mut self, target: &mut T) -> u32 {
        let mut steps = 0;
        while self.state.span_accumulator >= self.step_ms && steps < self.config.max_steps_per_call
        {
            target.step(self.config.cycles_per_step);
            self.state.span_accumulator -= self.step_ms;
            steps += 1;
        }
        self.state.emulated_cycles = self
            .state
            .emulated_cycles
            .saturating_add(u64::from(steps) * u64::from(self.config.cycles_per_step));

        if self.state.span_accumulator > self.config.max_span_ms {
            let dropped_ms = self.state.span_accumulator - self.config.max_span_ms;
            self.state.dropped_backlog_ms += dropped_ms;
            self.state.span_accumulator = self.config.max_span_ms;
            tracing::debug!(dropped_ms, "step cap reached, dropping backlog");
        }
        steps
    }

    /// Current accumulators and diagnostics.
    #[must_use]
    pub const fn state(&self) -> &SchedulerState {
        &self.state
    }

    /// Active configuration.
    #[must_use]
    pub const fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    /// Calibrated host clock.
    #[must_use]
    pub const fn clock(&self) -> &CycleClock<S> {
        &self.clock
    }
}

//! Scheduler pacing configuration.

use crate::ConfigError;

/// Emulated CPU clock rate (33.8688 MHz).
pub const DEFAULT_CPU_FREQUENCY_HZ: u32 = 33_868_800;

/// Largest host delta, in ms, accepted by a single scheduler call.
pub const DEFAULT_MAX_SPAN_MS: f64 = 250.0;

/// Render cadence (~60 Hz).
pub const DEFAULT_RENDER_INTERVAL_MS: f64 = 16.667;

/// FPS measurement window.
pub const DEFAULT_FPS_WINDOW_MS: f64 = 1000.0;

/// Enough single-cycle steps to drain one clamped 250 ms span.
pub const DEFAULT_MAX_STEPS_PER_CALL: u32 = DEFAULT_CPU_FREQUENCY_HZ / 4;

/// Immutable pacing parameters for a [`crate::Scheduler`].
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SchedulerConfig {
    /// Reference emulated clock rate in Hz.
    pub cpu_frequency_hz: u32,
    /// Emulated cycles handed to the target per drain step.
    pub cycles_per_step: u32,
    /// Clamp applied to each host delta, in ms.
    pub max_span_ms: f64,
    /// Render callback cadence, in ms.
    pub render_interval_ms: f64,
    /// FPS publication window, in ms.
    pub fps_window_ms: f64,
    /// Upper bound on drain steps per scheduler call.
    pub max_steps_per_call: u32,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            cpu_frequency_hz: DEFAULT_CPU_FREQUENCY_HZ,
            cycles_per_step: 1,
            max_span_ms: DEFAULT_MAX_SPAN_MS,
            render_interval_ms: DEFAULT_RENDER_INTERVAL_MS,
            fps_window_ms: DEFAULT_FPS_WINDOW_MS,
            max_steps_per_call: DEFAULT_MAX_STEPS_PER_CALL,
        }
    }
}

impl SchedulerConfig {
    /// Milliseconds of host time consumed by one drain step.
    #[must_use]
    pub fn step_ms(&self) -> f64 {
        f64::from(self.cycles_per_step) * 1000.0 / f64::from(self.cpu_frequency_hz)
    }

    /// Checks every field for a usable value.
    ///
    /// # Errors
    ///
    /// Returns the first [`ConfigError`] found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.cpu_frequency_hz == 0 {
            return Err(ConfigError::ZeroFrequency);
        }
        if self.cycles_per_step == 0 {
            return Err(ConfigError::ZeroCyclesPerStep);
        }
        if self.max_steps_per_call == 0 {
            return Err(ConfigError::ZeroStepCap);
        }
        for (name, value) in [
            ("max_span_ms", self.max_span_ms),
            ("render_interval_ms", self.render_interval_ms),
            ("fps_window_ms", self.fps_window_ms),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(ConfigError::InvalidInterval { name, value });
            }
        }
        Ok(())
    }
}

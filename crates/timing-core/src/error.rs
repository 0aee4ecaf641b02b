use thiserror::Error;

/// Startup failure while calibrating the host clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
pub enum ClockError {
    /// The tick source reported no usable high-resolution frequency.
    #[error("host provides no usable high-resolution tick source")]
    Unavailable,
}

/// Rejected scheduler configuration values.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum ConfigError {
    /// Emulated CPU clock rate must be non-zero.
    #[error("cpu frequency must be non-zero")]
    ZeroFrequency,
    /// Each drain step must advance at least one cycle.
    #[error("cycles per step must be non-zero")]
    ZeroCyclesPerStep,
    /// The drain loop must be allowed at least one step per call.
    #[error("max steps per call must be non-zero")]
    ZeroStepCap,
    /// A pacing interval was zero, negative, or not finite.
    #[error("{name} must be a positive finite number of milliseconds, got {value}")]
    InvalidInterval {
        /// Configuration field that failed validation.
        name: &'static str,
        /// Offending value.
        value: f64,
    },
}

/// Lifecycle misuse on the [`crate::System`] facade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
pub enum SystemError {
    /// `initialize` was called while subsystems are already owned.
    #[error("system is already initialized")]
    AlreadyInitialized,
    /// The operation requires an initialized system.
    #[error("system is not initialized")]
    NotInitialized,
}

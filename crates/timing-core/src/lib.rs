//! Console timing core: root counters, interrupt glue and host-time scheduler.

/// Error taxonomy for calibration, configuration and lifecycle misuse.
pub mod error;
pub use error::{ClockError, ConfigError, SystemError};

/// Calibrated host tick sources.
pub mod clock;
pub use clock::{CycleClock, ManualSource, MonotonicSource, TickSource, MONOTONIC_FREQUENCY_HZ};

/// Root counter timer peripheral and its mode register layout.
pub mod root_counter;
pub use root_counter::{
    CounterIndex, CounterMode, RootCounter, WrapKind, COUNTER_COUNT, COUNTER_OVERFLOW_LIMIT,
    MODE_EN, MODE_INTREQ, MODE_IRQ_0XFFFF, MODE_IRQ_REPEAT, MODE_IRQ_TARGET, MODE_IRQ_TOGGLE,
    MODE_REACHED_0XFFFF, MODE_REACHED_TARGET, MODE_RESET_AT_TARGET, TARGET_MASK,
};

/// Wrap-event to interrupt-line policy.
pub mod interrupt;
pub use interrupt::{InterruptAdapter, InterruptLine, IrqSignal};

/// Scheduler pacing configuration.
pub mod config;
pub use config::{
    SchedulerConfig, DEFAULT_CPU_FREQUENCY_HZ, DEFAULT_FPS_WINDOW_MS, DEFAULT_MAX_SPAN_MS,
    DEFAULT_MAX_STEPS_PER_CALL, DEFAULT_RENDER_INTERVAL_MS,
};

/// Host-time to emulated-cycle scheduler.
pub mod scheduler;
pub use scheduler::{
    fps_status, EmulationTarget, Scheduler, SchedulerState, StatusSink, TickReport,
};

/// System facade owning CPU, GPU and counters.
pub mod system;
pub use system::{Cpu, Gpu, StepOutcome, System, SystemState, WindowHandle};

#[cfg(test)]
use proptest as _;
#[cfg(test)]
use rstest as _;

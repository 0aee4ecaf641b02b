//! Calibrated host tick source used to measure elapsed wall-clock time.
//!
//! The clock is calibrated exactly once at startup; the resolution derived
//! there is used for every later tick-to-millisecond conversion.

use std::cell::Cell;
use std::rc::Rc;
use std::time::Instant;

use crate::ClockError;

/// Nanosecond tick rate reported by [`MonotonicSource`].
pub const MONOTONIC_FREQUENCY_HZ: u64 = 1_000_000_000;

/// Raw host time provider.
pub trait TickSource {
    /// Tick frequency in Hz, or `None` when no high-resolution source exists.
    fn frequency_hz(&self) -> Option<u64>;

    /// Current raw tick value.
    fn ticks(&self) -> u64;
}

/// Host monotonic clock measured in nanoseconds since construction.
#[derive(Debug, Clone, Copy)]
pub struct MonotonicSource {
    origin: Instant,
}

impl Default for MonotonicSource {
    fn default() -> Self {
        Self::new()
    }
}

impl MonotonicSource {
    /// Starts a source whose tick zero is now.
    #[must_use]
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl TickSource for MonotonicSource {
    fn frequency_hz(&self) -> Option<u64> {
        Some(MONOTONIC_FREQUENCY_HZ)
    }

    fn ticks(&self) -> u64 {
        u64::try_from(self.origin.elapsed().as_nanos()).unwrap_or(u64::MAX)
    }
}

/// Host-advanced tick counter for deterministic hosts and replay.
///
/// Clones share the same counter, so a host can keep one handle and hand
/// another to the clock.
#[derive(Debug, Clone)]
pub struct ManualSource {
    frequency_hz: Option<u64>,
    ticks: Rc<Cell<u64>>,
}

impl ManualSource {
    /// Creates a source at tick zero running at `frequency_hz`.
    #[must_use]
    pub fn new(frequency_hz: u64) -> Self {
        Self {
            frequency_hz: Some(frequency_hz),
            ticks: Rc::new(Cell::new(0)),
        }
    }

    /// Creates a source that reports no usable frequency.
    #[must_use]
    pub fn uncalibrated() -> Self {
        Self {
            frequency_hz: None,
            ticks: Rc::new(Cell::new(0)),
        }
    }

    /// Moves the shared counter forward by `delta` ticks.
    pub fn advance(&self, delta: u64) {
        self.ticks.set(self.ticks.get().saturating_add(delta));
    }

    /// Overwrites the shared counter.
    pub fn set(&self, value: u64) {
        self.ticks.set(value);
    }
}

impl TickSource for ManualSource {
    fn frequency_hz(&self) -> Option<u64> {
        self.frequency_hz
    }

    fn ticks(&self) -> u64 {
        self.ticks.get()
    }
}

/// Calibrated monotonic clock.
#[derive(Debug, Clone)]
pub struct CycleClock<S> {
    source: S,
    resolution_ms: f64,
    last: u64,
}

impl<S: TickSource> CycleClock<S> {
    /// Measures the source frequency once and derives ms-per-tick.
    ///
    /// # Errors
    ///
    /// Returns [`ClockError::Unavailable`] when the source has no frequency
    /// or reports zero.
    #[allow(clippy::cast_precision_loss)]
    pub fn calibrate(source: S) -> Result<Self, ClockError> {
        let frequency = source
            .frequency_hz()
            .filter(|hz| *hz != 0)
            .ok_or(ClockError::Unavailable)?;
        let resolution_ms = 1000.0 / frequency as f64;
        let last = source.ticks();
        tracing::debug!(frequency, resolution_ms, "host clock calibrated");

        Ok(Self {
            source,
            resolution_ms,
            last,
        })
    }

    /// Samples the source, never returning less than a previous sample.
    pub fn current_cycles(&mut self) -> u64 {
        let now = self.source.ticks();
        if now > self.last {
            self.last = now;
        }
        self.last
    }

    /// Milliseconds represented by one host tick.
    #[must_use]
    pub const fn resolution_ms(&self) -> f64 {
        self.resolution_ms
    }

    /// Converts a tick delta to milliseconds.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn ticks_to_ms(&self, delta: u64) -> f64 {
        delta as f64 * self.resolution_ms
    }

    /// Borrows the underlying source.
    #[must_use]
    pub const fn source(&self) -> &S {
        &self.source
    }
}

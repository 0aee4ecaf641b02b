//! Translation of counter wrap events into interrupt-line activity.
//!
//! [`crate::RootCounter::tick`] only reports that a wrap happened. The adapter
//! latches the matching status bits and applies the counter's IRQ policy:
//! whether the wrap is IRQ-worthy, one-shot versus repeat, and pulse versus
//! toggle signaling.

use crate::root_counter::{
    CounterIndex, RootCounter, WrapKind, COUNTER_COUNT, COUNTER_OVERFLOW_LIMIT,
};

/// Interrupt lines owned by the root counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[allow(missing_docs)]
pub enum InterruptLine {
    Timer0,
    Timer1,
    Timer2,
}

impl InterruptLine {
    /// Line driven by a counter channel.
    #[must_use]
    pub const fn for_channel(channel: CounterIndex) -> Self {
        match channel {
            CounterIndex::Zero => Self::Timer0,
            CounterIndex::One => Self::Timer1,
            CounterIndex::Two => Self::Timer2,
        }
    }

    /// Counter channel driving this line.
    #[must_use]
    pub const fn channel(self) -> CounterIndex {
        match self {
            Self::Timer0 => CounterIndex::Zero,
            Self::Timer1 => CounterIndex::One,
            Self::Timer2 => CounterIndex::Two,
        }
    }

    /// Bit position in the interrupt status register.
    #[must_use]
    pub const fn status_bit(self) -> u8 {
        match self {
            Self::Timer0 => 4,
            Self::Timer1 => 5,
            Self::Timer2 => 6,
        }
    }

    /// Interrupt status register mask for this line.
    #[must_use]
    pub const fn mask(self) -> u32 {
        1 << self.status_bit()
    }
}

/// Line activity requested for one IRQ-worthy wrap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IrqSignal {
    /// Assert the line for a single cycle.
    Pulse,
    /// Hold the line at the given level until the next toggle.
    Level(bool),
}

/// Per-channel IRQ arming state and wrap policy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InterruptAdapter {
    fired: [bool; COUNTER_COUNT],
}

impl InterruptAdapter {
    /// Creates an adapter with every channel armed.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            fired: [false; COUNTER_COUNT],
        }
    }

    /// Re-arms a one-shot channel. Called whenever its mode word is written.
    pub const fn rearm(&mut self, channel: CounterIndex) {
        self.fired[channel.index()] = false;
    }

    /// Re-arms every channel.
    pub const fn reset(&mut self) {
        self.fired = [false; COUNTER_COUNT];
    }

    /// Returns `true` when a one-shot channel has fired since its last rearm.
    #[must_use]
    pub const fn has_fired(&self, channel: CounterIndex) -> bool {
        self.fired[channel.index()]
    }

    /// Handles a wrap reported by `counter.tick`.
    ///
    /// Status latches are updated even when the wrap does not raise an IRQ.
    pub fn on_wrap(
        &mut self,
        channel: CounterIndex,
        counter: &mut RootCounter,
    ) -> Option<IrqSignal> {
        let at_overflow = counter.limit() == COUNTER_OVERFLOW_LIMIT;
        let kind = counter.wrap_kind();
        let mode = counter.mode_mut();

        let irq_worthy = match kind {
            WrapKind::Target => {
                mode.reached_target = true;
                if at_overflow {
                    mode.reached_0xffff = true;
                }
                mode.irq_target || (at_overflow && mode.irq_0xffff)
            }
            WrapKind::Overflow => {
                mode.reached_0xffff = true;
                mode.irq_0xffff
            }
        };
        if !irq_worthy {
            return None;
        }

        let fired = &mut self.fired[channel.index()];
        if !mode.irq_repeat && *fired {
            tracing::trace!(?channel, "one-shot irq already fired, suppressed");
            return None;
        }
        *fired = true;

        let signal = if mode.irq_toggle {
            mode.intreq = !mode.intreq;
            IrqSignal::Level(mode.intreq)
        } else {
            mode.intreq = true;
            IrqSignal::Pulse
        };
        tracing::trace!(?channel, ?signal, "counter irq");
        Some(signal)
    }
}

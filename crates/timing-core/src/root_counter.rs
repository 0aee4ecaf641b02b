//! Root counter interval-timer peripheral.
//!
//! Each counter holds a 16-bit count, a 16-bit target and a 32-bit mode word.
//! The mode word is kept as named fields and serialized with an explicit bit
//! layout so every write reads back bit-exact.

/// Free-run wrap boundary.
pub const COUNTER_OVERFLOW_LIMIT: u32 = 0xFFFF;

/// Mask applied to target writes.
pub const TARGET_MASK: u32 = 0xFFFF;

/// Mode bit 0: counter runs while clear.
pub const MODE_EN: u32 = 1 << 0;
/// Mode bit 3: wrap at target instead of 0xFFFF.
pub const MODE_RESET_AT_TARGET: u32 = 1 << 3;
/// Mode bit 4: reaching target is IRQ-worthy.
pub const MODE_IRQ_TARGET: u32 = 1 << 4;
/// Mode bit 5: reaching 0xFFFF is IRQ-worthy.
pub const MODE_IRQ_0XFFFF: u32 = 1 << 5;
/// Mode bit 6: repeat IRQs instead of one-shot.
pub const MODE_IRQ_REPEAT: u32 = 1 << 6;
/// Mode bit 7: toggle the IRQ line instead of pulsing it.
pub const MODE_IRQ_TOGGLE: u32 = 1 << 7;
/// Mode bit 10: interrupt request pending.
pub const MODE_INTREQ: u32 = 1 << 10;
/// Mode bit 11: target reached latch.
pub const MODE_REACHED_TARGET: u32 = 1 << 11;
/// Mode bit 12: 0xFFFF reached latch.
pub const MODE_REACHED_0XFFFF: u32 = 1 << 12;

const SYNC_MODE_SHIFT: u32 = 1;
const CLOCK_SOURCE_SHIFT: u32 = 8;
const RESERVED_SHIFT: u32 = 13;
const UPPER_SHIFT: u32 = 16;
const TWO_BIT_MASK: u32 = 0b11;
const RESERVED_MASK: u32 = 0b111;

/// Named-field view of the 32-bit counter mode register.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct CounterMode {
    /// Bit 0. The counter advances only while this bit is clear.
    pub en: bool,
    /// Bits 1-2, external sync behaviour. Stored only.
    pub sync_mode: u8,
    /// Bit 3. Wrap at `target` when set, at 0xFFFF when clear.
    pub reset_at_target: bool,
    /// Bit 4.
    pub irq_target: bool,
    /// Bit 5.
    pub irq_0xffff: bool,
    /// Bit 6. Clear means one-shot.
    pub irq_repeat: bool,
    /// Bit 7. Clear pulses the line, set toggles it.
    pub irq_toggle: bool,
    /// Bits 8-9. Stored only; every counter advances at the stepped rate.
    pub clock_source: u8,
    /// Bit 10.
    pub intreq: bool,
    /// Bit 11.
    pub reached_target: bool,
    /// Bit 12.
    pub reached_0xffff: bool,
    /// Bits 13-15, preserved verbatim.
    pub reserved: u8,
    /// Bits 16-31, preserved verbatim.
    pub upper: u16,
}

impl CounterMode {
    /// Decodes a raw mode word.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub const fn from_raw(raw: u32) -> Self {
        Self {
            en: raw & MODE_EN != 0,
            sync_mode: ((raw >> SYNC_MODE_SHIFT) & TWO_BIT_MASK) as u8,
            reset_at_target: raw & MODE_RESET_AT_TARGET != 0,
            irq_target: raw & MODE_IRQ_TARGET != 0,
            irq_0xffff: raw & MODE_IRQ_0XFFFF != 0,
            irq_repeat: raw & MODE_IRQ_REPEAT != 0,
            irq_toggle: raw & MODE_IRQ_TOGGLE != 0,
            clock_source: ((raw >> CLOCK_SOURCE_SHIFT) & TWO_BIT_MASK) as u8,
            intreq: raw & MODE_INTREQ != 0,
            reached_target: raw & MODE_REACHED_TARGET != 0,
            reached_0xffff: raw & MODE_REACHED_0XFFFF != 0,
            reserved: ((raw >> RESERVED_SHIFT) & RESERVED_MASK) as u8,
            upper: (raw >> UPPER_SHIFT) as u16,
        }
    }

    /// Encodes the fields back into a raw mode word.
    ///
    /// Multi-bit fields are masked to their width so an oversized value
    /// cannot spill into a neighbouring field.
    #[must_use]
    pub const fn to_raw(self) -> u32 {
        let mut raw = 0;
        raw |= bit(self.en, MODE_EN);
        raw |= (self.sync_mode as u32 & TWO_BIT_MASK) << SYNC_MODE_SHIFT;
        raw |= bit(self.reset_at_target, MODE_RESET_AT_TARGET);
        raw |= bit(self.irq_target, MODE_IRQ_TARGET);
        raw |= bit(self.irq_0xffff, MODE_IRQ_0XFFFF);
        raw |= bit(self.irq_repeat, MODE_IRQ_REPEAT);
        raw |= bit(self.irq_toggle, MODE_IRQ_TOGGLE);
        raw |= (self.clock_source as u32 & TWO_BIT_MASK) << CLOCK_SOURCE_SHIFT;
        raw |= bit(self.intreq, MODE_INTREQ);
        raw |= bit(self.reached_target, MODE_REACHED_TARGET);
        raw |= bit(self.reached_0xffff, MODE_REACHED_0XFFFF);
        raw |= (self.reserved as u32 & RESERVED_MASK) << RESERVED_SHIFT;
        raw |= (self.upper as u32) << UPPER_SHIFT;
        raw
    }
}

const fn bit(set: bool, mask: u32) -> u32 {
    if set {
        mask
    } else {
        0
    }
}

/// Number of root counter channels in the system.
pub const COUNTER_COUNT: usize = 3;

/// Root counter channel identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
#[allow(missing_docs)]
pub enum CounterIndex {
    Zero = 0,
    One = 1,
    Two = 2,
}

impl CounterIndex {
    /// All channels in ascending order.
    pub const ALL: [Self; COUNTER_COUNT] = [Self::Zero, Self::One, Self::Two];

    /// Array index for this channel.
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Decodes a bus-supplied channel number.
    #[must_use]
    pub const fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Zero),
            1 => Some(Self::One),
            2 => Some(Self::Two),
            _ => None,
        }
    }
}

/// Boundary a counter wraps at under its current mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WrapKind {
    /// Wraps when the count reaches `target`.
    Target,
    /// Wraps when the count reaches 0xFFFF.
    Overflow,
}

/// One root counter channel.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RootCounter {
    counter: u32,
    target: u32,
    mode: CounterMode,
}

impl RootCounter {
    /// Creates a zeroed counter.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            counter: 0,
            target: 0,
            mode: CounterMode::from_raw(0),
        }
    }

    /// Current count value.
    #[must_use]
    pub const fn read_counter(&self) -> u32 {
        self.counter
    }

    /// Raw mode word.
    #[must_use]
    pub const fn read_mode(&self) -> u32 {
        self.mode.to_raw()
    }

    /// Stored target value.
    #[must_use]
    pub const fn read_target(&self) -> u32 {
        self.target
    }

    /// Replaces the whole mode word, which also clears the status latches.
    pub const fn write_mode(&mut self, value: u32) {
        self.mode = CounterMode::from_raw(value);
    }

    /// Stores the low 16 bits of `value` as the target.
    pub const fn write_target(&mut self, value: u32) {
        self.target = value & TARGET_MASK;
    }

    /// Named-field view of the mode word.
    #[must_use]
    pub const fn mode(&self) -> CounterMode {
        self.mode
    }

    pub(crate) const fn mode_mut(&mut self) -> &mut CounterMode {
        &mut self.mode
    }

    /// Returns `true` when [`Self::tick`] advances the count.
    #[must_use]
    pub const fn is_running(&self) -> bool {
        !self.mode.en
    }

    /// Boundary the counter wraps at under the current mode.
    #[must_use]
    pub const fn wrap_kind(&self) -> WrapKind {
        if self.mode.reset_at_target {
            WrapKind::Target
        } else {
            WrapKind::Overflow
        }
    }

    /// Current wrap boundary value.
    #[must_use]
    pub const fn limit(&self) -> u32 {
        match self.wrap_kind() {
            WrapKind::Target => self.target,
            WrapKind::Overflow => COUNTER_OVERFLOW_LIMIT,
        }
    }

    /// Advances the count by `cycles` and reports whether it wrapped.
    ///
    /// The sum saturates, so a step that would carry past `u32::MAX` still
    /// wraps. Status bits are left untouched; the caller latches them.
    pub const fn tick(&mut self, cycles: u32) -> bool {
        if !self.is_running() {
            return false;
        }

        self.counter = self.counter.saturating_add(cycles);
        if self.counter >= self.limit() {
            self.counter = 0;
            return true;
        }
        false
    }

    /// Restores the power-on state.
    pub const fn reset(&mut self) {
        *self = Self::new();
    }
}

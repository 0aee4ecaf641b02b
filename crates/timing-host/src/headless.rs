//! Placeholder CPU, GPU and terminal status sink for the headless host.

use std::io::Write;

use psx_timing_core::{Cpu, Gpu, InterruptLine, IrqSignal, StatusSink, WindowHandle};

/// CPU stand-in that executes nothing and tallies interrupt signals per line.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct HeadlessCpu {
    cycles: u64,
    irqs: [u64; 3],
}

impl HeadlessCpu {
    /// Cycles handed to the CPU so far.
    #[must_use]
    pub const fn cycles(&self) -> u64 {
        self.cycles
    }

    /// Interrupt signals seen on `line`.
    #[must_use]
    pub const fn irq_count(&self, line: InterruptLine) -> u64 {
        self.irqs[line.channel().index()]
    }

    /// Per-line interrupt tally, indexed by counter channel.
    #[must_use]
    pub const fn irqs(&self) -> [u64; 3] {
        self.irqs
    }
}

impl Cpu for HeadlessCpu {
    fn step(&mut self, cycles: u32) {
        self.cycles += u64::from(cycles);
    }

    fn signal_interrupt(&mut self, line: InterruptLine, signal: IrqSignal) {
        tracing::trace!(?line, ?signal, "irq");
        self.irqs[line.channel().index()] += 1;
    }
}

/// GPU stand-in with no render target; counts presented frames.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct HeadlessGpu {
    window: Option<WindowHandle>,
    frames: u64,
}

impl HeadlessGpu {
    /// Window the GPU was attached to, if any.
    #[must_use]
    pub const fn window(&self) -> Option<WindowHandle> {
        self.window
    }

    /// Frames presented so far.
    #[must_use]
    pub const fn frames(&self) -> u64 {
        self.frames
    }
}

impl Gpu for HeadlessGpu {
    fn attach(&mut self, window: WindowHandle) {
        tracing::debug!(window = window.raw(), "gpu attached");
        self.window = Some(window);
    }

    fn step(&mut self, _cycles: u32) {}

    fn present(&mut self) {
        self.frames += 1;
    }
}

/// Status sink that writes each published line to a terminal stream.
#[derive(Debug)]
pub struct TerminalStatus<W> {
    out: W,
    last: Option<String>,
}

impl<W: Write> TerminalStatus<W> {
    /// Wraps an output stream.
    #[must_use]
    pub const fn new(out: W) -> Self {
        Self { out, last: None }
    }

    /// Most recently published status line.
    #[must_use]
    pub fn last(&self) -> Option<&str> {
        self.last.as_deref()
    }

    /// Releases the wrapped stream.
    #[must_use]
    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> StatusSink for TerminalStatus<W> {
    fn publish_status(&mut self, status: &str) {
        if let Err(error) = writeln!(self.out, "{status}") {
            tracing::warn!(%error, "failed to write status line");
        }
        self.last = Some(status.to_string());
    }
}

//! Orchestration facade owning the CPU, GPU and root counters.
//!
//! The CPU and GPU bodies live outside this crate; the system only needs the
//! narrow [`Cpu`] and [`Gpu`] contracts. Counter wraps are routed through the
//! [`InterruptAdapter`] and delivered to the CPU's interrupt input.

use crate::interrupt::{InterruptAdapter, InterruptLine, IrqSignal};
use crate::root_counter::{CounterIndex, RootCounter, COUNTER_COUNT};
use crate::scheduler::EmulationTarget;
use crate::SystemError;

/// Opaque host window identifier the GPU renders into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WindowHandle(u64);

impl WindowHandle {
    /// Wraps a platform handle value.
    #[must_use]
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Platform handle value.
    #[must_use]
    pub const fn raw(self) -> u64 {
        self.0
    }
}

/// CPU contract consumed by the system.
pub trait Cpu {
    /// Executes `cycles` emulated cycles worth of instructions.
    fn step(&mut self, cycles: u32);

    /// Drives an interrupt input.
    fn signal_interrupt(&mut self, line: InterruptLine, signal: IrqSignal);
}

/// GPU contract consumed by the system.
pub trait Gpu {
    /// Binds the render target to a host window.
    fn attach(&mut self, window: WindowHandle);

    /// Advances GPU work by `cycles` emulated cycles.
    fn step(&mut self, cycles: u32);

    /// Presents the current frame.
    fn present(&mut self);
}

/// Lifecycle state of a [`System`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SystemState {
    /// No subsystems are owned.
    #[default]
    Uninitialized,
    /// Subsystems are owned but `step` has no effect.
    Stopped,
    /// `step` advances emulation.
    Running,
}

/// Result of one [`System::step`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StepOutcome {
    /// The system is not running; nothing changed.
    Idle,
    /// CPU, GPU and counters advanced.
    Advanced {
        /// Cycles applied to every subsystem.
        cycles: u32,
        /// Counters that wrapped during this step.
        wraps: u8,
        /// Interrupt signals delivered to the CPU.
        interrupts: u8,
    },
}

#[derive(Debug)]
struct Subsystems<C, G> {
    cpu: C,
    gpu: G,
}

/// Console timing system: CPU, GPU and three root counters.
#[derive(Debug)]
pub struct System<C, G> {
    subsystems: Option<Subsystems<C, G>>,
    counters: [RootCounter; COUNTER_COUNT],
    interrupts: InterruptAdapter,
    running: bool,
}

impl<C, G> Default for System<C, G> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C, G> System<C, G> {
    /// Creates an uninitialized system.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            subsystems: None,
            counters: [RootCounter::new(), RootCounter::new(), RootCounter::new()],
            interrupts: InterruptAdapter::new(),
            running: false,
        }
    }

    /// Current lifecycle state.
    #[must_use]
    pub const fn state(&self) -> SystemState {
        match (&self.subsystems, self.running) {
            (None, _) => SystemState::Uninitialized,
            (Some(_), false) => SystemState::Stopped,
            (Some(_), true) => SystemState::Running,
        }
    }

    /// Makes `step` effective.
    ///
    /// # Errors
    ///
    /// Returns [`SystemError::NotInitialized`] before `initialize`.
    pub fn run(&mut self) -> Result<(), SystemError> {
        if self.subsystems.is_none() {
            return Err(SystemError::NotInitialized);
        }
        if !self.running {
            self.running = true;
            tracing::debug!("system running");
        }
        Ok(())
    }

    /// Makes `step` a no-op. Safe to call repeatedly.
    pub fn stop(&mut self) {
        if self.running {
            self.running = false;
            tracing::debug!("system stopped");
        }
    }

    /// Stops and releases the CPU and GPU. Safe to call repeatedly.
    pub fn deinitialize(&mut self) {
        self.stop();
        if let Some(subsystems) = self.subsystems.take() {
            drop(subsystems);
            tracing::debug!("system deinitialized");
        }
    }

    /// Borrows the owned CPU, if initialized.
    #[must_use]
    pub fn cpu(&self) -> Option<&C> {
        self.subsystems.as_ref().map(|subsystems| &subsystems.cpu)
    }

    /// Borrows the owned GPU, if initialized.
    #[must_use]
    pub fn gpu(&self) -> Option<&G> {
        self.subsystems.as_ref().map(|subsystems| &subsystems.gpu)
    }

    /// Borrows a counter channel.
    #[must_use]
    pub const fn counter(&self, index: CounterIndex) -> &RootCounter {
        &self.counters[index.index()]
    }

    /// Count register of a channel.
    #[must_use]
    pub const fn read_counter(&self, index: CounterIndex) -> u32 {
        self.counters[index.index()].read_counter()
    }

    /// Mode register of a channel.
    #[must_use]
    pub const fn read_mode(&self, index: CounterIndex) -> u32 {
        self.counters[index.index()].read_mode()
    }

    /// Target register of a channel.
    #[must_use]
    pub const fn read_target(&self, index: CounterIndex) -> u32 {
        self.counters[index.index()].read_target()
    }

    /// Writes a mode register and re-arms the channel's one-shot IRQ.
    pub const fn write_mode(&mut self, index: CounterIndex, value: u32) {
        self.counters[index.index()].write_mode(value);
        self.interrupts.rearm(index);
    }

    /// Writes a target register (masked to 16 bits).
    pub const fn write_target(&mut self, index: CounterIndex, value: u32) {
        self.counters[index.index()].write_target(value);
    }
}

impl<C: Cpu, G: Gpu> System<C, G> {
    /// Takes ownership of the subsystems, attaches the GPU to `window` and
    /// zeroes every counter.
    ///
    /// # Errors
    ///
    /// Returns [`SystemError::AlreadyInitialized`] when subsystems are
    /// already owned; the passed subsystems are dropped.
    pub fn initialize(
        &mut self,
        cpu: C,
        mut gpu: G,
        window: WindowHandle,
    ) -> Result<(), SystemError> {
        if self.subsystems.is_some() {
            return Err(SystemError::AlreadyInitialized);
        }

        gpu.attach(window);
        for counter in &mut self.counters {
            counter.reset();
        }
        self.interrupts.reset();
        self.running = false;
        self.subsystems = Some(Subsystems { cpu, gpu });
        tracing::debug!(window = window.raw(), "system initialized");
        Ok(())
    }

    /// Advances CPU, GPU and counters by `cycles` when running.
    pub fn step(&mut self, cycles: u32) -> StepOutcome {
        if !self.running {
            return StepOutcome::Idle;
        }
        let Some(subsystems) = self.subsystems.as_mut() else {
            return StepOutcome::Idle;
        };

        subsystems.cpu.step(cycles);
        subsystems.gpu.step(cycles);

        let mut wraps = 0;
        let mut interrupts = 0;
        for channel in CounterIndex::ALL {
            let counter = &mut self.counters[channel.index()];
            if !counter.tick(cycles) {
                continue;
            }
            wraps += 1;
            tracing::trace!(?channel, "root counter wrapped");

            if let Some(signal) = self.interrupts.on_wrap(channel, counter) {
                subsystems
                    .cpu
                    .signal_interrupt(InterruptLine::for_channel(channel), signal);
                interrupts += 1;
            }
        }

        StepOutcome::Advanced {
            cycles,
            wraps,
            interrupts,
        }
    }

    /// Presents the current frame through the GPU, if initialized.
    pub fn present(&mut self) {
        if let Some(subsystems) = self.subsystems.as_mut() {
            subsystems.gpu.present();
        }
    }
}

impl<C: Cpu, G: Gpu> EmulationTarget for System<C, G> {
    fn step(&mut self, cycles: u32) {
        let _ = Self::step(self, cycles);
    }

    fn render(&mut self) {
        self.present();
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::rc::Rc;

    use super::{Cpu, Gpu, StepOutcome, System, SystemState, WindowHandle};
    use crate::interrupt::{InterruptLine, IrqSignal};
    use crate::root_counter::{
        CounterIndex, MODE_EN, MODE_IRQ_0XFFFF, MODE_IRQ_TARGET, MODE_RESET_AT_TARGET,
    };
    use crate::SystemError;

    #[derive(Debug, Default)]
    struct FakeCpu {
        cycles: u64,
        irqs: Vec<(InterruptLine, IrqSignal)>,
    }

    impl Cpu for FakeCpu {
        fn step(&mut self, cycles: u32) {
            self.cycles += u64::from(cycles);
        }

        fn signal_interrupt(&mut self, line: InterruptLine, signal: IrqSignal) {
            self.irqs.push((line, signal));
        }
    }

    #[derive(Debug, Default)]
    struct FakeGpu {
        window: Option<WindowHandle>,
        cycles: u64,
        presents: u32,
        drops: Rc<Cell<u32>>,
    }

    impl Gpu for FakeGpu {
        fn attach(&mut self, window: WindowHandle) {
            self.window = Some(window);
        }

        fn step(&mut self, cycles: u32) {
            self.cycles += u64::from(cycles);
        }

        fn present(&mut self) {
            self.presents += 1;
        }
    }

    impl FakeGpu {
        fn counting_drops(drops: Rc<Cell<u32>>) -> Self {
            Self {
                window: None,
                cycles: 0,
                presents: 0,
                drops,
            }
        }
    }

    impl Drop for FakeGpu {
        fn drop(&mut self) {
            self.drops.set(self.drops.get() + 1);
        }
    }

    fn running_system() -> System<FakeCpu, FakeGpu> {
        let mut system = System::new();
        system
            .initialize(FakeCpu::default(), FakeGpu::default(), WindowHandle::new(7))
            .expect("first initialize succeeds");
        system.run().expect("initialized system runs");
        system
    }

    #[test]
    fn initialize_attaches_gpu_and_zeroes_counters() {
        let mut system: System<FakeCpu, FakeGpu> = System::new();
        system.write_target(CounterIndex::One, 0x1234);
        assert_eq!(system.state(), SystemState::Uninitialized);

        system
            .initialize(FakeCpu::default(), FakeGpu::default(), WindowHandle::new(42))
            .expect("initialize succeeds");

        assert_eq!(system.state(), SystemState::Stopped);
        assert_eq!(
            system.gpu().and_then(|gpu| gpu.window),
            Some(WindowHandle::new(42))
        );
        for index in CounterIndex::ALL {
            assert_eq!(system.read_counter(index), 0);
            assert_eq!(system.read_mode(index), 0);
            assert_eq!(system.read_target(index), 0);
        }
    }

    #[test]
    fn double_initialize_is_rejected() {
        let mut system = running_system();
        let result =
            system.initialize(FakeCpu::default(), FakeGpu::default(), WindowHandle::new(1));
        assert_eq!(result, Err(SystemError::AlreadyInitialized));
        assert_eq!(system.state(), SystemState::Running);
    }

    #[test]
    fn run_requires_initialization() {
        let mut system: System<FakeCpu, FakeGpu> = System::new();
        assert_eq!(system.run(), Err(SystemError::NotInitialized));
    }

    #[test]
    fn step_is_idle_unless_running() {
        let mut system = running_system();
        system.stop();
        assert_eq!(system.step(100), StepOutcome::Idle);
        assert_eq!(system.cpu().map(|cpu| cpu.cycles), Some(0));
        assert_eq!(system.read_counter(CounterIndex::Zero), 0);
    }

    #[test]
    fn step_advances_cpu_gpu_and_counters() {
        let mut system = running_system();
        let outcome = system.step(100);

        assert_eq!(
            outcome,
            StepOutcome::Advanced {
                cycles: 100,
                wraps: 0,
                interrupts: 0,
            }
        );
        assert_eq!(system.cpu().map(|cpu| cpu.cycles), Some(100));
        assert_eq!(system.gpu().map(|gpu| gpu.cycles), Some(100));
        for index in CounterIndex::ALL {
            assert_eq!(system.read_counter(index), 100);
        }
    }

    #[test]
    fn target_wrap_raises_irq_on_matching_line() {
        let mut system = running_system();
        system.write_mode(CounterIndex::Two, MODE_RESET_AT_TARGET | MODE_IRQ_TARGET);
        system.write_target(CounterIndex::Two, 50);
        system.write_mode(CounterIndex::Zero, MODE_EN);
        system.write_mode(CounterIndex::One, MODE_EN);

        let outcome = system.step(50);

        assert_eq!(
            outcome,
            StepOutcome::Advanced {
                cycles: 50,
                wraps: 1,
                interrupts: 1,
            }
        );
        let cpu = system.cpu().expect("initialized");
        assert_eq!(cpu.irqs, vec![(InterruptLine::Timer2, IrqSignal::Pulse)]);
        assert!(system.counter(CounterIndex::Two).mode().reached_target);
        assert!(system.counter(CounterIndex::Two).mode().intreq);
    }

    #[test]
    fn mode_write_rearms_one_shot_irq() {
        let mut system = running_system();
        let mode = MODE_IRQ_0XFFFF;
        system.write_mode(CounterIndex::Zero, mode);

        let _ = system.step(0xFFFF);
        let _ = system.step(0xFFFF);
        assert_eq!(system.cpu().map(|cpu| cpu.irqs.len()), Some(1));

        system.write_mode(CounterIndex::Zero, mode);
        let _ = system.step(0xFFFF);
        assert_eq!(system.cpu().map(|cpu| cpu.irqs.len()), Some(2));
    }

    #[test]
    fn stop_twice_matches_stop_once() {
        let mut system = running_system();
        system.stop();
        let after_first = system.state();
        system.stop();
        assert_eq!(system.state(), after_first);
        assert_eq!(system.state(), SystemState::Stopped);
    }

    #[test]
    fn deinitialize_releases_gpu_exactly_once() {
        let drops = Rc::new(Cell::new(0));
        let mut system = System::new();
        system
            .initialize(
                FakeCpu::default(),
                FakeGpu::counting_drops(Rc::clone(&drops)),
                WindowHandle::new(3),
            )
            .expect("initialize succeeds");
        system.run().expect("runs");

        system.stop();
        system.deinitialize();
        assert_eq!(drops.get(), 1);
        assert_eq!(system.state(), SystemState::Uninitialized);

        system.deinitialize();
        system.stop();
        assert_eq!(drops.get(), 1);
        assert_eq!(system.step(10), StepOutcome::Idle);
    }

    #[test]
    fn render_presents_through_gpu() {
        use crate::scheduler::EmulationTarget;

        let mut system = running_system();
        EmulationTarget::render(&mut system);
        EmulationTarget::step(&mut system, 5);
        assert_eq!(system.gpu().map(|gpu| gpu.presents), Some(1));
        assert_eq!(system.read_counter(CounterIndex::One), 5);
    }
}

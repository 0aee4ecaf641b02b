//! Message-loop driver: one scheduler call per host poll, then a run summary.

use anyhow::Context;
use psx_timing_core::{
    CycleClock, Scheduler, SchedulerConfig, StatusSink, System, TickReport, TickSource,
    WindowHandle,
};

use crate::config::{RegisterKind, RegisterWrite};
use crate::headless::{HeadlessCpu, HeadlessGpu};

/// Window id handed to the headless GPU.
pub const HEADLESS_WINDOW: WindowHandle = WindowHandle::new(0);

/// Totals reported once the host loop finishes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RunSummary {
    /// Scheduler calls made.
    pub polls: u64,
    /// Emulated cycles drained.
    pub emulated_cycles: u64,
    /// Frames presented.
    pub frames: u64,
    /// Last published FPS value.
    pub fps: u32,
    /// Interrupt signals per counter channel.
    pub irqs: [u64; 3],
    /// Backlog discarded by the drain cap, in ms.
    pub dropped_backlog_ms: f64,
}

/// Message-loop driver: one scheduler call per host poll.
#[derive(Debug)]
pub struct HostLoop<S> {
    scheduler: Scheduler<S>,
    system: System<HeadlessCpu, HeadlessGpu>,
    polls: u64,
}

impl<S: TickSource> HostLoop<S> {
    /// Calibrates `source`, builds the system and applies `writes` before starting it.
    ///
    /// # Errors
    ///
    /// Fails when the source cannot be calibrated, the configuration is invalid
    /// or the system refuses to start.
    pub fn new(
        source: S,
        config: SchedulerConfig,
        writes: &[(RegisterKind, RegisterWrite)],
    ) -> anyhow::Result<Self> {
        let clock = CycleClock::calibrate(source).context("calibrating host tick source")?;
        let scheduler = Scheduler::new(clock, config).context("invalid scheduler configuration")?;

        let mut system = System::new();
        system
            .initialize(HeadlessCpu::default(), HeadlessGpu::default(), HEADLESS_WINDOW)
            .context("initializing system")?;
        for &(kind, write) in writes {
            tracing::debug!(
                ?kind,
                channel = write.index.index(),
                value = write.value,
                "register write"
            );
            match kind {
                RegisterKind::Mode => system.write_mode(write.index, write.value),
                RegisterKind::Target => system.write_target(write.index, write.value),
            }
        }
        system.run().context("starting system")?;

        tracing::info!(
            cpu_hz = config.cpu_frequency_hz,
            cycles_per_step = config.cycles_per_step,
            "host loop started"
        );
        Ok(Self {
            scheduler,
            system,
            polls: 0,
        })
    }

    /// Runs one scheduler call.
    pub fn poll<K: StatusSink>(&mut self, status: &mut K) -> TickReport {
        self.polls += 1;
        self.scheduler.tick(&mut self.system, status)
    }

    /// Scheduler driving the system.
    #[must_use]
    pub const fn scheduler(&self) -> &Scheduler<S> {
        &self.scheduler
    }

    /// System under the scheduler.
    #[must_use]
    pub const fn system(&self) -> &System<HeadlessCpu, HeadlessGpu> {
        &self.system
    }

    /// Collects totals, then stops and tears down the system.
    pub fn finish(mut self) -> RunSummary {
        let state = self.scheduler.state();
        let summary = RunSummary {
            polls: self.polls,
            emulated_cycles: state.emulated_cycles(),
            frames: self.system.gpu().map_or(0, HeadlessGpu::frames),
            fps: state.fps(),
            irqs: self.system.cpu().map_or([0; 3], HeadlessCpu::irqs),
            dropped_backlog_ms: state.dropped_backlog_ms(),
        };

        self.system.stop();
        self.system.deinitialize();
        tracing::info!(?summary, "host loop finished");
        summary
    }
}

#[cfg(test)]
mod tests {
    use psx_timing_core::{
        CounterIndex, ManualSource, StatusSink, SystemState, MODE_IRQ_0XFFFF, MODE_IRQ_REPEAT,
    };

    use super::*;

    struct Discard;

    impl StatusSink for Discard {
        fn publish_status(&mut self, _status: &str) {}
    }

    fn batched() -> SchedulerConfig {
        SchedulerConfig {
            cycles_per_step: 4_096,
            ..SchedulerConfig::default()
        }
    }

    #[test]
    fn applies_writes_before_running() {
        let source = ManualSource::new(1_000_000);
        let writes = [
            (
                RegisterKind::Mode,
                RegisterWrite {
                    index: CounterIndex::Zero,
                    value: 0x58,
                },
            ),
            (
                RegisterKind::Target,
                RegisterWrite {
                    index: CounterIndex::Zero,
                    value: 0x1_2345,
                },
            ),
        ];

        let host = HostLoop::new(source, batched(), &writes).expect("host starts");
        assert_eq!(host.system().state(), SystemState::Running);
        assert_eq!(host.system().read_mode(CounterIndex::Zero), 0x58);
        assert_eq!(host.system().read_target(CounterIndex::Zero), 0x2345);
        assert_eq!(
            host.system().gpu().and_then(HeadlessGpu::window),
            Some(HEADLESS_WINDOW)
        );
    }

    #[test]
    fn rejects_uncalibrated_source() {
        let error = HostLoop::new(ManualSource::uncalibrated(), batched(), &[])
            .expect_err("no frequency");
        assert!(error.to_string().contains("calibrating"));
    }

    #[test]
    fn rejects_invalid_config() {
        let config = SchedulerConfig {
            cycles_per_step: 0,
            ..SchedulerConfig::default()
        };
        assert!(HostLoop::new(ManualSource::new(1_000), config, &[]).is_err());
    }

    #[test]
    fn one_second_of_polls_summarizes_run() {
        let source = ManualSource::new(1_000_000);
        let writes = [(
            RegisterKind::Mode,
            RegisterWrite {
                index: CounterIndex::Zero,
                value: MODE_IRQ_0XFFFF | MODE_IRQ_REPEAT,
            },
        )];
        let mut host = HostLoop::new(source.clone(), batched(), &writes).expect("host starts");

        for _ in 0..60 {
            source.advance(16_668);
            let _ = host.poll(&mut Discard);
        }

        let summary = host.finish();
        assert_eq!(summary.polls, 60);
        assert_eq!(summary.frames, 60);
        assert_eq!(summary.fps, 60);
        assert_eq!(summary.emulated_cycles % 4_096, 0);
        assert_eq!(summary.irqs[0], summary.emulated_cycles / (4_096 * 16));
        assert_eq!(summary.irqs[1..], [0, 0]);
        assert!(summary.dropped_backlog_ms.abs() < f64::EPSILON);
    }
}

//! CLI entry point for the headless timing host.

use std::io;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::{bail, Context};
use clap::Parser;
use psx_timing_core::MonotonicSource;
use psx_timing_host::{
    parse_register_write, HostConfig, HostLoop, RegisterKind, RegisterWrite, RunSummary,
    TerminalStatus,
};
use serde as _;
use serde_json as _;
#[cfg(test)]
use tempfile as _;
use tracing as _;
use tracing_subscriber::EnvFilter;

/// Runs the timing core against the host monotonic clock with no video output.
#[derive(Debug, Parser)]
#[command(name = "psx-timing-host", version)]
struct Args {
    /// Wall-clock seconds to run before tearing down.
    #[arg(long, default_value_t = 3.0)]
    seconds: f64,

    /// Sleep between scheduler calls, in milliseconds.
    #[arg(long, default_value_t = 1)]
    poll_interval_ms: u64,

    /// JSON file with `scheduler` and `counters` sections.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Override emulated cycles per drain step.
    #[arg(long)]
    cycles_per_step: Option<u32>,

    /// Write a counter mode register before starting, as IDX=VALUE.
    #[arg(
        long = "write-mode",
        value_name = "IDX=VALUE",
        value_parser = parse_register_write
    )]
    write_mode: Vec<RegisterWrite>,

    /// Write a counter target register before starting, as IDX=VALUE.
    #[arg(
        long = "write-target",
        value_name = "IDX=VALUE",
        value_parser = parse_register_write
    )]
    write_target: Vec<RegisterWrite>,
}

impl Args {
    fn host_config(&self) -> anyhow::Result<HostConfig> {
        let mut config = match &self.config {
            Some(path) => HostConfig::load(path)?,
            None => HostConfig::default(),
        };
        if let Some(cycles) = self.cycles_per_step {
            config.scheduler.cycles_per_step = cycles;
        }
        Ok(config)
    }

    fn register_writes(
        &self,
        config: &HostConfig,
    ) -> anyhow::Result<Vec<(RegisterKind, RegisterWrite)>> {
        let mut writes = config.register_writes()?;
        writes.extend(self.write_mode.iter().map(|&w| (RegisterKind::Mode, w)));
        writes.extend(self.write_target.iter().map(|&w| (RegisterKind::Target, w)));
        Ok(writes)
    }

    fn run_duration(&self) -> anyhow::Result<Duration> {
        if !self.seconds.is_finite() || self.seconds < 0.0 {
            bail!("--seconds must be a non-negative number, got {}", self.seconds);
        }
        Duration::try_from_secs_f64(self.seconds).context("--seconds out of range")
    }
}

fn print_summary(summary: &RunSummary) {
    println!("polls:            {}", summary.polls);
    println!("emulated cycles:  {}", summary.emulated_cycles);
    println!("frames presented: {}", summary.frames);
    println!("last fps:         {}", summary.fps);
    println!(
        "irqs (t0 t1 t2):  {} {} {}",
        summary.irqs[0], summary.irqs[1], summary.irqs[2]
    );
    println!("dropped backlog:  {:.3} ms", summary.dropped_backlog_ms);
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();
    let config = args.host_config()?;
    let writes = args.register_writes(&config)?;
    let duration = args.run_duration()?;
    let poll_interval = Duration::from_millis(args.poll_interval_ms);

    let mut host = HostLoop::new(MonotonicSource::new(), config.scheduler, &writes)?;
    let mut status = TerminalStatus::new(io::stdout());

    let started = Instant::now();
    while started.elapsed() < duration {
        let _ = host.poll(&mut status);
        spin_sleep::sleep(poll_interval);
    }

    print_summary(&host.finish());
    Ok(())
}

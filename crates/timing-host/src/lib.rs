//! Headless native host for the console timing core.

use clap as _;
use spin_sleep as _;
use tracing_subscriber as _;

/// JSON configuration file and register-write parsing.
pub mod config;
pub use config::{parse_register_write, CounterSetup, HostConfig, RegisterKind, RegisterWrite};

/// CPU, GPU and status stand-ins with no real hardware behind them.
pub mod headless;
pub use headless::{HeadlessCpu, HeadlessGpu, TerminalStatus};

/// Message-loop driver tying a tick source, scheduler and system together.
pub mod host_loop;
pub use host_loop::{HostLoop, RunSummary, HEADLESS_WINDOW};

#[cfg(test)]
use tempfile as _;

//! Host configuration file and `IDX=VALUE` register-write parsing.

use std::fs;
use std::path::Path;

use anyhow::{anyhow, Context};
use psx_timing_core::{CounterIndex, SchedulerConfig};
use serde::Deserialize;

/// Which register of a counter channel a [`RegisterWrite`] lands in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RegisterKind {
    /// Mode/control word.
    Mode,
    /// Target value.
    Target,
}

/// One register store applied before the host loop starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RegisterWrite {
    /// Destination channel.
    pub index: CounterIndex,
    /// Raw value written.
    pub value: u32,
}

/// Parses `IDX=VALUE`, where `VALUE` is decimal or `0x`-prefixed hex.
///
/// # Errors
///
/// Returns a message suitable for a CLI diagnostic when either side is malformed.
pub fn parse_register_write(text: &str) -> Result<RegisterWrite, String> {
    let (index, value) = text
        .split_once('=')
        .ok_or_else(|| format!("expected IDX=VALUE, got `{text}`"))?;

    let raw_index: u8 = index
        .trim()
        .parse()
        .map_err(|_| format!("invalid counter index `{index}`"))?;
    let index = CounterIndex::from_u8(raw_index)
        .ok_or_else(|| format!("counter index {raw_index} out of range (0..=2)"))?;

    Ok(RegisterWrite {
        index,
        value: parse_register_value(value.trim())?,
    })
}

fn parse_register_value(text: &str) -> Result<u32, String> {
    let parsed = match text
        .strip_prefix("0x")
        .or_else(|| text.strip_prefix("0X"))
    {
        Some(hex) => u32::from_str_radix(&hex.replace('_', ""), 16),
        None => text.replace('_', "").parse(),
    };
    parsed.map_err(|_| format!("invalid register value `{text}`"))
}

/// Initial register contents for one counter channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CounterSetup {
    /// Channel index, 0 through 2.
    pub index: u8,
    /// Mode word; omitted means free-running with no interrupts.
    #[serde(default)]
    pub mode: u32,
    /// Target value; omitted means zero.
    #[serde(default)]
    pub target: u32,
}

/// JSON configuration file accepted by `--config`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HostConfig {
    /// Scheduler pacing parameters.
    pub scheduler: SchedulerConfig,
    /// Counter registers programmed before the first tick.
    pub counters: Vec<CounterSetup>,
}

impl HostConfig {
    /// Reads and parses a configuration file.
    ///
    /// # Errors
    ///
    /// Fails when the file cannot be read or is not valid configuration JSON.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        Self::from_json(&text).with_context(|| format!("parsing config file {}", path.display()))
    }

    /// Parses configuration JSON.
    ///
    /// # Errors
    ///
    /// Fails on malformed JSON or unknown fields.
    pub fn from_json(text: &str) -> anyhow::Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Flattens the counter table into mode and target writes, in that order per channel.
    ///
    /// # Errors
    ///
    /// Fails when a channel index is out of range.
    pub fn register_writes(&self) -> anyhow::Result<Vec<(RegisterKind, RegisterWrite)>> {
        let mut writes = Vec::with_capacity(self.counters.len() * 2);
        for setup in &self.counters {
            let index = CounterIndex::from_u8(setup.index)
                .ok_or_else(|| anyhow!("counter index {} out of range (0..=2)", setup.index))?;
            writes.push((
                RegisterKind::Mode,
                RegisterWrite {
                    index,
                    value: setup.mode,
                },
            ));
            writes.push((
                RegisterKind::Target,
                RegisterWrite {
                    index,
                    value: setup.target,
                },
            ));
        }
        Ok(writes)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write as _;

    use psx_timing_core::DEFAULT_CPU_FREQUENCY_HZ;

    use super::*;

    #[test]
    fn register_write_accepts_decimal_and_hex() {
        assert_eq!(
            parse_register_write("1=0x0058"),
            Ok(RegisterWrite {
                index: CounterIndex::One,
                value: 0x58,
            })
        );
        assert_eq!(
            parse_register_write("2=1000"),
            Ok(RegisterWrite {
                index: CounterIndex::Two,
                value: 1000,
            })
        );
        assert_eq!(
            parse_register_write("0=0xFFFF_FFFF"),
            Ok(RegisterWrite {
                index: CounterIndex::Zero,
                value: u32::MAX,
            })
        );
    }

    #[test]
    fn register_write_rejects_malformed_input() {
        assert!(parse_register_write("1").is_err());
        assert!(parse_register_write("3=0").is_err());
        assert!(parse_register_write("x=0").is_err());
        assert!(parse_register_write("0=0xZZ").is_err());
        assert!(parse_register_write("0=4294967296").is_err());
    }

    #[test]
    fn empty_object_is_default_config() {
        let config = HostConfig::from_json("{}").expect("parses");
        assert_eq!(config, HostConfig::default());
        assert_eq!(config.scheduler.cpu_frequency_hz, DEFAULT_CPU_FREQUENCY_HZ);
    }

    #[test]
    fn partial_scheduler_section_keeps_other_defaults() {
        let config = HostConfig::from_json(
            r#"{ "scheduler": { "cycles_per_step": 64 },
                 "counters": [ { "index": 2, "mode": 88, "target": 512 } ] }"#,
        )
        .expect("parses");

        assert_eq!(config.scheduler.cycles_per_step, 64);
        assert_eq!(config.scheduler.cpu_frequency_hz, DEFAULT_CPU_FREQUENCY_HZ);
        assert_eq!(
            config.register_writes().expect("valid indices"),
            vec![
                (
                    RegisterKind::Mode,
                    RegisterWrite {
                        index: CounterIndex::Two,
                        value: 88,
                    },
                ),
                (
                    RegisterKind::Target,
                    RegisterWrite {
                        index: CounterIndex::Two,
                        value: 512,
                    },
                ),
            ]
        );
    }

    #[test]
    fn unknown_fields_and_bad_indices_are_rejected() {
        assert!(HostConfig::from_json(r#"{ "speed": 2 }"#).is_err());

        let config = HostConfig::from_json(r#"{ "counters": [ { "index": 7 } ] }"#)
            .expect("parses");
        assert!(config.register_writes().is_err());
    }

    #[test]
    fn load_reads_file_from_disk() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        write!(file, r#"{{ "scheduler": {{ "max_span_ms": 100.0 }} }}"#).expect("write config");

        let config = HostConfig::load(file.path()).expect("loads");
        assert!((config.scheduler.max_span_ms - 100.0).abs() < f64::EPSILON);
    }

    #[test]
    fn load_reports_missing_file() {
        let dir = tempfile::tempdir().expect("temp dir");
        let error = HostConfig::load(&dir.path().join("absent.json")).expect_err("missing");
        assert!(error.to_string().starts_with("reading config file"));
    }
}

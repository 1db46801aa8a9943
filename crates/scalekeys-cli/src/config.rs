use std::path::{Path, PathBuf};
use std::time::Duration;

use scalekeys_services::{OutputMode, SchedulerTiming, SerialSettings};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
#[serde(default)]
pub(crate) struct AppConfig {
    pub scales_path: PathBuf,
    pub effect_state_path: PathBuf,
    pub output: OutputMode,
    pub serial: SerialConfig,
    pub timing: TimingConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            scales_path: PathBuf::from("scales.csv"),
            effect_state_path: PathBuf::from("blocks-config.txt"),
            output: OutputMode::default(),
            serial: SerialConfig::default(),
            timing: TimingConfig::default(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(default)]
pub(crate) struct SerialConfig {
    pub port: Option<String>,
    pub baud_rate: u32,
    pub write_timeout_ms: u64,
    pub pacing_ms: u64,
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            port: None,
            baud_rate: 9600,
            write_timeout_ms: 100,
            pacing_ms: 5,
        }
    }
}

impl SerialConfig {
    pub fn settings(&self) -> SerialSettings {
        SerialSettings {
            baud_rate: self.baud_rate,
            write_timeout: Duration::from_millis(self.write_timeout_ms),
            pacing: Duration::from_millis(self.pacing_ms),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(default)]
pub(crate) struct TimingConfig {
    pub arp_step_ms: u64,
    pub arp_random_step_ms: u64,
    pub metronome_tick_ms: u64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            arp_step_ms: 150,
            arp_random_step_ms: 500,
            metronome_tick_ms: 500,
        }
    }
}

impl TimingConfig {
    pub fn scheduler(&self) -> SchedulerTiming {
        SchedulerTiming {
            arp_step: Duration::from_millis(self.arp_step_ms),
            arp_random_step: Duration::from_millis(self.arp_random_step_ms),
            metronome_tick: Duration::from_millis(self.metronome_tick_ms),
        }
    }
}

pub(crate) fn config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("scalekeys")
        .join("config.toml")
}

pub(crate) fn load_config() -> AppConfig {
    load_config_from(&config_path())
}

/// Missing or unreadable files fall back to defaults.
pub(crate) fn load_config_from(path: &Path) -> AppConfig {
    std::fs::read_to_string(path)
        .ok()
        .and_then(|s| toml::from_str(&s).ok())
        .unwrap_or_default()
}

//! Configuration loading for spardha-ctl

use crate::core::{Alliance, HueWindow};
use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Main configuration structure
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Config {
    /// Alliance colour for this match (default: red)
    #[serde(default = "default_alliance")]
    pub alliance: Alliance,

    /// Routine to run at match start (default: "WP Rush")
    #[serde(default = "default_routine")]
    pub routine: String,

    #[serde(default)]
    pub device: DeviceConfig,

    #[serde(default)]
    pub sort: SortConfig,

    #[serde(default)]
    pub skills: SkillsConfig,
}

/// Device selection
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DeviceConfig {
    /// Device type; only "mock" is compiled into this crate
    #[serde(rename = "type", default = "default_device_type")]
    pub device_type: String,

    /// Display name for logging
    #[serde(default = "default_device_name")]
    pub name: String,

    /// Simulated settle latency per motion, mock device only (default: 0)
    #[serde(default)]
    pub motion_latency_ms: u64,
}

/// Colour-sort monitor settings
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SortConfig {
    /// Initial state of the colour-sort toggle (default: true)
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Monitor cycle period in milliseconds (default: 10)
    #[serde(default = "default_sample_interval")]
    pub sample_interval_ms: u64,

    /// Hue window of blue rings (default: 190-240)
    #[serde(default = "default_blue_ring_hue")]
    pub blue_ring_hue: HueWindow,

    /// Hue window of red rings (default: 8-20)
    #[serde(default = "default_red_ring_hue")]
    pub red_ring_hue: HueWindow,

    /// Brake settle time after detection in milliseconds (default: 230)
    #[serde(default = "default_brake_settle")]
    pub brake_settle_ms: u64,

    /// Additional brake hold before resuming in milliseconds (default: 220)
    #[serde(default = "default_brake_hold")]
    pub brake_hold_ms: u64,

    /// Intake voltage to resume with after an eject (default: 12000)
    #[serde(default = "default_eject_voltage")]
    pub eject_voltage_mv: i32,

    /// Enable stall-based anti-jam recovery (default: false)
    #[serde(default)]
    pub anti_jam: bool,

    /// Velocity drop between cycles that signals a jam (default: 47)
    #[serde(default = "default_stall_delta")]
    pub stall_delta: f32,

    /// Minimum commanded voltage for jam detection to apply (default: 6000)
    #[serde(default = "default_stall_min_voltage")]
    pub stall_min_voltage_mv: i32,

    /// Reverse voltage while clearing a jam (default: -10000)
    #[serde(default = "default_jam_reverse_voltage")]
    pub jam_reverse_mv: i32,

    /// Reverse duration while clearing a jam in milliseconds (default: 270)
    #[serde(default = "default_jam_reverse_ms")]
    pub jam_reverse_ms: u64,
}

/// Skills supervisor settings
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SkillsConfig {
    /// Run the skills routine under the cancellation supervisor (default: true)
    #[serde(default = "default_true")]
    pub supervised: bool,

    /// Abort-input poll period in milliseconds (default: 10)
    #[serde(default = "default_sample_interval")]
    pub poll_interval_ms: u64,
}

fn default_alliance() -> Alliance {
    Alliance::Red
}

fn default_routine() -> String {
    "WP Rush".to_string()
}

fn default_device_type() -> String {
    "mock".to_string()
}

fn default_device_name() -> String {
    "Simulated competition robot".to_string()
}

fn default_true() -> bool {
    true
}

fn default_sample_interval() -> u64 {
    10
}

fn default_blue_ring_hue() -> HueWindow {
    HueWindow::new(190.0, 240.0)
}

fn default_red_ring_hue() -> HueWindow {
    HueWindow::new(8.0, 20.0)
}

fn default_brake_settle() -> u64 {
    230
}

fn default_brake_hold() -> u64 {
    220
}

fn default_eject_voltage() -> i32 {
    12_000
}

fn default_stall_delta() -> f32 {
    47.0
}

fn default_stall_min_voltage() -> i32 {
    6_000
}

fn default_jam_reverse_voltage() -> i32 {
    -10_000
}

fn default_jam_reverse_ms() -> u64 {
    270
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            device_type: default_device_type(),
            name: default_device_name(),
            motion_latency_ms: 0,
        }
    }
}

impl Default for SortConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            sample_interval_ms: default_sample_interval(),
            blue_ring_hue: default_blue_ring_hue(),
            red_ring_hue: default_red_ring_hue(),
            brake_settle_ms: default_brake_settle(),
            brake_hold_ms: default_brake_hold(),
            eject_voltage_mv: default_eject_voltage(),
            anti_jam: false,
            stall_delta: default_stall_delta(),
            stall_min_voltage_mv: default_stall_min_voltage(),
            jam_reverse_mv: default_jam_reverse_voltage(),
            jam_reverse_ms: default_jam_reverse_ms(),
        }
    }
}

impl Default for SkillsConfig {
    fn default() -> Self {
        Self {
            supervised: true,
            poll_interval_ms: default_sample_interval(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            alliance: default_alliance(),
            routine: default_routine(),
            device: DeviceConfig::default(),
            sort: SortConfig::default(),
            skills: SkillsConfig::default(),
        }
    }
}

impl SortConfig {
    /// The hue window that marks a ring as an impostor for `alliance`:
    /// the opposing alliance's ring colour.
    pub fn impostor_window(&self, alliance: Alliance) -> HueWindow {
        match alliance {
            Alliance::Red => self.blue_ring_hue,
            Alliance::Blue => self.red_ring_hue,
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let contents = toml::to_string_pretty(self)?;
        fs::write(path, contents)?;
        Ok(())
    }
}

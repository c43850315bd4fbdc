//! Configuration loading for venuslink.
//!
//! All settings are plain scalars: where the device lives (`[device]`) and
//! how often to talk to it (`[schedule]`). Defaults are tuned for the
//! Venus E firmware, which misbehaves under back-to-back requests — hence
//! the global `min_request_gap`.
//!
//! # Config File Locations
//!
//! Files are loaded in order (later wins):
//! 1. `/etc/venuslink/config.toml` (system)
//! 2. `~/.config/venuslink/config.toml` (user)
//! 3. `./venuslink.toml` (local override)
//! 4. Environment variables (`VENUSLINK_*`)
//!
//! # Example Config
//!
//! ```toml
//! [device]
//! host = "192.168.1.50"
//! port = 30000
//!
//! [schedule]
//! loop_interval = 2
//! es_status_interval = 30
//! bat_status_interval = 60
//! es_mode_interval = 600
//! min_request_gap = 2
//! udp_timeout = 2.0
//! ```

pub mod loader;

pub use loader::ConfigSources;

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Configuration loading errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {message}")]
    Parse { path: PathBuf, message: String },
}

/// Where the device lives on the network.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceConfig {
    /// Device IP or hostname. No default; set by the wizard or by hand.
    #[serde(default)]
    pub host: String,

    /// UDP port of the local API.
    /// Default: 30000
    #[serde(default = "DeviceConfig::default_port")]
    pub port: u16,

    /// Display name used in readings and diagnostics.
    #[serde(default = "DeviceConfig::default_name")]
    pub name: String,
}

impl DeviceConfig {
    fn default_port() -> u16 {
        30000
    }

    fn default_name() -> String {
        "Marstek Venus E 3.0".to_string()
    }
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            host: String::new(),
            port: Self::default_port(),
            name: Self::default_name(),
        }
    }
}

/// Polling cadence and request pacing, all in seconds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleConfig {
    /// Scheduler tick cadence. Each tick sends at most one request.
    /// Default: 2
    #[serde(default = "ScheduleConfig::default_loop_interval")]
    pub loop_interval: u64,

    /// Refresh period for ES.GetStatus.
    /// Default: 30
    #[serde(default = "ScheduleConfig::default_es_status_interval")]
    pub es_status_interval: u64,

    /// Refresh period for Bat.GetStatus.
    /// Default: 60
    #[serde(default = "ScheduleConfig::default_bat_status_interval")]
    pub bat_status_interval: u64,

    /// Refresh period for ES.GetMode.
    /// Default: 600 (10 minutes)
    #[serde(default = "ScheduleConfig::default_es_mode_interval")]
    pub es_mode_interval: u64,

    /// Minimum time between any two outgoing requests.
    /// Default: 2
    #[serde(default = "ScheduleConfig::default_min_request_gap")]
    pub min_request_gap: u64,

    /// UDP socket timeout in seconds (fractional allowed).
    /// Default: 2.0
    #[serde(default = "ScheduleConfig::default_udp_timeout")]
    pub udp_timeout: f64,
}

impl ScheduleConfig {
    fn default_loop_interval() -> u64 {
        2
    }

    fn default_es_status_interval() -> u64 {
        30
    }

    fn default_bat_status_interval() -> u64 {
        60
    }

    fn default_es_mode_interval() -> u64 {
        600
    }

    fn default_min_request_gap() -> u64 {
        2
    }

    fn default_udp_timeout() -> f64 {
        2.0
    }

    pub fn loop_interval(&self) -> Duration {
        Duration::from_secs(self.loop_interval)
    }

    pub fn es_status_interval(&self) -> Duration {
        Duration::from_secs(self.es_status_interval)
    }

    pub fn bat_status_interval(&self) -> Duration {
        Duration::from_secs(self.bat_status_interval)
    }

    pub fn es_mode_interval(&self) -> Duration {
        Duration::from_secs(self.es_mode_interval)
    }

    pub fn min_request_gap(&self) -> Duration {
        Duration::from_secs(self.min_request_gap)
    }

    pub fn udp_timeout(&self) -> Duration {
        Duration::from_secs_f64(self.udp_timeout)
    }
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            loop_interval: Self::default_loop_interval(),
            es_status_interval: Self::default_es_status_interval(),
            bat_status_interval: Self::default_bat_status_interval(),
            es_mode_interval: Self::default_es_mode_interval(),
            min_request_gap: Self::default_min_request_gap(),
            udp_timeout: Self::default_udp_timeout(),
        }
    }
}

/// Complete venuslink configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct VenusConfig {
    #[serde(default)]
    pub device: DeviceConfig,

    #[serde(default)]
    pub schedule: ScheduleConfig,
}

impl VenusConfig {
    /// Load configuration from all sources.
    ///
    /// Load order (later wins):
    /// 1. Compiled defaults
    /// 2. `/etc/venuslink/config.toml`
    /// 3. `~/.config/venuslink/config.toml`
    /// 4. `./venuslink.toml`
    /// 5. Environment variables
    pub fn load() -> Result<Self, ConfigError> {
        let (config, _sources) = Self::load_with_sources_from(None)?;
        Ok(config)
    }

    /// Load configuration from a specific file path, then apply env overrides.
    ///
    /// If `config_path` is provided, it takes precedence over the local
    /// `./venuslink.toml` override. System and user configs still load first.
    pub fn load_from(config_path: Option<&std::path::Path>) -> Result<Self, ConfigError> {
        let (config, _sources) = Self::load_with_sources_from(config_path)?;
        Ok(config)
    }

    /// Load configuration from optional path and return information about sources.
    pub fn load_with_sources_from(
        config_path: Option<&std::path::Path>,
    ) -> Result<(Self, ConfigSources), ConfigError> {
        let mut sources = ConfigSources::default();
        let mut config = VenusConfig::default();

        for path in loader::discover_config_files(config_path) {
            let file_config = loader::load_from_file(&path)?;
            config = loader::merge_configs(config, file_config);
            sources.files.push(path);
        }

        loader::apply_env_overrides(&mut config, &mut sources);

        Ok((config, sources))
    }

    /// Serialize config to TOML string.
    ///
    /// Built manually so the wizard writes a commented, ordered file.
    pub fn to_toml(&self) -> String {
        let mut output = String::new();

        output.push_str("# venuslink configuration\n\n");

        output.push_str("[device]\n");
        output.push_str(&format!("host = \"{}\"\n", self.device.host));
        output.push_str(&format!("port = {}\n", self.device.port));
        output.push_str(&format!("name = \"{}\"\n", self.device.name));

        output.push_str("\n[schedule]\n");
        output.push_str("# seconds; each tick sends at most one request\n");
        output.push_str(&format!("loop_interval = {}\n", self.schedule.loop_interval));
        output.push_str(&format!(
            "es_status_interval = {}\n",
            self.schedule.es_status_interval
        ));
        output.push_str(&format!(
            "bat_status_interval = {}\n",
            self.schedule.bat_status_interval
        ));
        output.push_str(&format!(
            "es_mode_interval = {}\n",
            self.schedule.es_mode_interval
        ));
        output.push_str(&format!(
            "min_request_gap = {}\n",
            self.schedule.min_request_gap
        ));
        output.push_str(&format!("udp_timeout = {:.1}\n", self.schedule.udp_timeout));

        output
    }
}

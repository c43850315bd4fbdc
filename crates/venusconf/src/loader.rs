//! Config file discovery, loading, and environment variable overlay.

use crate::{ConfigError, VenusConfig};
use std::env;
use std::path::{Path, PathBuf};

/// Information about where config values came from.
#[derive(Debug, Clone, Default)]
pub struct ConfigSources {
    /// Config files that were loaded (in order)
    pub files: Vec<PathBuf>,
    /// Environment variables that overrode config values
    pub env_overrides: Vec<String>,
}

/// Discover config files, optionally with a CLI override path.
///
/// If `cli_path` is provided and exists, it replaces the local override.
/// Returns paths in load order (system, user, local/cli). Only returns
/// files that exist.
pub fn discover_config_files(cli_path: Option<&Path>) -> Vec<PathBuf> {
    let mut files = Vec::new();

    // System config
    let system = PathBuf::from("/etc/venuslink/config.toml");
    if system.exists() {
        files.push(system);
    }

    // User config (XDG_CONFIG_HOME or ~/.config)
    if let Some(config_dir) = directories::BaseDirs::new().map(|d| d.config_dir().to_path_buf()) {
        let user = config_dir.join("venuslink/config.toml");
        if user.exists() {
            files.push(user);
        }
    }

    // CLI override takes precedence over local
    if let Some(path) = cli_path {
        if path.exists() {
            files.push(path.to_path_buf());
            return files;
        }
    }

    // Local override (current directory)
    let local = PathBuf::from("venuslink.toml");
    if local.exists() {
        files.push(local);
    }

    files
}

/// Load config from a TOML file.
pub fn load_from_file(path: &Path) -> Result<VenusConfig, ConfigError> {
    let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::FileRead {
        path: path.to_path_buf(),
        source: e,
    })?;

    toml::from_str(&contents).map_err(|e| ConfigError::Parse {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

/// Merge two configs, with `overlay` taking precedence for any value that
/// differs from the compiled default.
pub fn merge_configs(base: VenusConfig, overlay: VenusConfig) -> VenusConfig {
    let default = VenusConfig::default();
    let mut merged = base;

    macro_rules! take {
        ($($field:ident).+) => {
            if overlay.$($field).+ != default.$($field).+ {
                merged.$($field).+ = overlay.$($field).+.clone();
            }
        };
    }

    take!(device.host);
    take!(device.port);
    take!(device.name);
    take!(schedule.loop_interval);
    take!(schedule.es_status_interval);
    take!(schedule.bat_status_interval);
    take!(schedule.es_mode_interval);
    take!(schedule.min_request_gap);
    take!(schedule.udp_timeout);

    merged
}

/// Apply `VENUSLINK_*` environment variable overrides.
pub fn apply_env_overrides(config: &mut VenusConfig, sources: &mut ConfigSources) {
    if let Ok(host) = env::var("VENUSLINK_HOST") {
        config.device.host = host;
        sources.env_overrides.push("VENUSLINK_HOST".to_string());
    }

    if let Ok(port) = env::var("VENUSLINK_PORT") {
        if let Ok(port) = port.parse() {
            config.device.port = port;
            sources.env_overrides.push("VENUSLINK_PORT".to_string());
        }
    }

    if let Ok(gap) = env::var("VENUSLINK_MIN_REQUEST_GAP") {
        if let Ok(gap) = gap.parse() {
            config.schedule.min_request_gap = gap;
            sources
                .env_overrides
                .push("VENUSLINK_MIN_REQUEST_GAP".to_string());
        }
    }

    if let Ok(timeout) = env::var("VENUSLINK_UDP_TIMEOUT") {
        if let Ok(timeout) = timeout.parse() {
            config.schedule.udp_timeout = timeout;
            sources
                .env_overrides
                .push("VENUSLINK_UDP_TIMEOUT".to_string());
        }
    }
}

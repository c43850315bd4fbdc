//! Operating modes and their `ES.SetMode` payloads.
//!
//! Each supported mode has a fixed payload shape. The table fails closed:
//! a name that is not listed never reaches the wire.

use serde_json::{json, Value};
use thiserror::Error;

/// The caller asked for a mode the firmware does not have.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unsupported mode: {0}")]
pub struct UnsupportedMode(pub String);

/// Operating modes the Venus E accepts over the local API.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceMode {
    Auto,
    Ai,
    Manual,
}

struct ModeSpec {
    mode: DeviceMode,
    name: &'static str,
    build_cfg: fn() -> Value,
}

/// One row per supported mode; adding a mode is adding a row.
static MODES: &[ModeSpec] = &[
    ModeSpec {
        mode: DeviceMode::Auto,
        name: "Auto",
        build_cfg: || json!({"mode": "Auto", "auto_cfg": {"enable": 1}}),
    },
    ModeSpec {
        mode: DeviceMode::Ai,
        name: "AI",
        build_cfg: || json!({"mode": "AI", "ai_cfg": {"enable": 1}}),
    },
    ModeSpec {
        mode: DeviceMode::Manual,
        // Minimal "do nothing" slot: power 0, enabled, 1 minute window.
        // Several firmware revisions reject ES.SetMode Manual without a
        // manual_cfg block.
        name: "Manual",
        build_cfg: || {
            json!({
                "mode": "Manual",
                "manual_cfg": {
                    "time_num": 9,
                    "start_time": "00:00",
                    "end_time": "00:01",
                    "week_set": 127,
                    "power": 0,
                    "enable": 1,
                },
            })
        },
    },
];

impl DeviceMode {
    /// Every supported mode, in display order.
    pub fn all() -> impl Iterator<Item = DeviceMode> {
        MODES.iter().map(|spec| spec.mode)
    }

    /// Resolve a mode name, failing closed for anything not in the table.
    pub fn from_name(name: &str) -> Result<DeviceMode, UnsupportedMode> {
        MODES
            .iter()
            .find(|spec| spec.name == name)
            .map(|spec| spec.mode)
            .ok_or_else(|| UnsupportedMode(name.to_string()))
    }

    pub fn name(self) -> &'static str {
        self.spec().name
    }

    /// Full `ES.SetMode` params for this mode.
    ///
    /// Picky firmwares want `id` at both levels, so it is sent at both.
    pub fn set_params(self) -> Value {
        let mut config = serde_json::Map::new();
        config.insert("id".to_string(), json!(0));
        if let Value::Object(cfg) = (self.spec().build_cfg)() {
            config.extend(cfg);
        }
        json!({"id": 0, "config": config})
    }

    fn spec(self) -> &'static ModeSpec {
        MODES
            .iter()
            .find(|spec| spec.mode == self)
            .expect("every DeviceMode has a table row")
    }
}

impl std::fmt::Display for DeviceMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

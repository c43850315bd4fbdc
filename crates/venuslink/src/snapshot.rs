//! The device state snapshot read by external consumers.
//!
//! Written only by the scheduler, between requests; the status blocks are
//! replaced wholesale on a successful query of their kind and stay `None`
//! until the first success. Serializes flat, so readings and diagnostics
//! address fields with dotted paths (`es.ongrid_power`).

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

use crate::poll::QueryKind;

/// Static endpoint identity, set at construction and never mutated.
#[derive(Debug, Clone, Serialize)]
pub struct DeviceIdentity {
    pub host: String,
    pub port: u16,
    #[serde(rename = "device_name")]
    pub name: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct DeviceSnapshot {
    /// Time of last scheduler activity.
    pub ts: Option<DateTime<Utc>>,

    #[serde(flatten)]
    pub identity: DeviceIdentity,

    /// Battery pack status, last successful `Bat.GetStatus` result.
    pub bat: Option<Value>,
    /// Energy system status, last successful `ES.GetStatus` result.
    pub es: Option<Value>,
    /// Operating mode block, last successful `ES.GetMode` result.
    pub mode: Option<Value>,

    /// Method name of the most recently attempted query or command.
    pub last_request: Option<String>,
    /// Last failure detail, cleared on the next success.
    pub last_error: Option<Value>,

    // Per-kind success times, for diagnostics only — the scheduler keeps
    // its own due clocks.
    pub last_es_ok: Option<DateTime<Utc>>,
    pub last_bat_ok: Option<DateTime<Utc>>,
    pub last_mode_ok: Option<DateTime<Utc>>,
}

impl DeviceSnapshot {
    pub fn new(identity: DeviceIdentity) -> Self {
        Self {
            ts: None,
            identity,
            bat: None,
            es: None,
            mode: None,
            last_request: None,
            last_error: None,
            last_es_ok: None,
            last_bat_ok: None,
            last_mode_ok: None,
        }
    }

    /// Replace `kind`'s block with a fresh result and clear `last_error`.
    pub(crate) fn merge_poll(&mut self, kind: QueryKind, result: Value, when: DateTime<Utc>) {
        match kind {
            QueryKind::EsStatus => {
                self.es = Some(result);
                self.last_es_ok = Some(when);
            }
            QueryKind::BatStatus => {
                self.bat = Some(result);
                self.last_bat_ok = Some(when);
            }
            QueryKind::EsMode => {
                self.mode = Some(result);
                self.last_mode_ok = Some(when);
            }
        }
        self.last_error = None;
    }

    /// Diagnostics view of a kind's last success time.
    pub fn last_success(&self, kind: QueryKind) -> Option<DateTime<Utc>> {
        match kind {
            QueryKind::EsStatus => self.last_es_ok,
            QueryKind::BatStatus => self.last_bat_ok,
            QueryKind::EsMode => self.last_mode_ok,
        }
    }
}

//! Request and response shapes for the UDP JSON exchange.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Method names understood by the device firmware.
///
/// The numeric id tags sent alongside these are chosen by the caller and
/// only need to be unique within a single exchange; the conventional
/// values live next to each call site in `venuslink`.
pub mod method {
    /// Energy system status (power flows, energy totals).
    pub const ES_STATUS: &str = "ES.GetStatus";
    /// Battery pack status (SoC, temperature, capacity).
    pub const BAT_STATUS: &str = "Bat.GetStatus";
    /// Read the current operating mode. Authoritative for verification.
    pub const ES_GET_MODE: &str = "ES.GetMode";
    /// Request an operating mode change.
    pub const ES_SET_MODE: &str = "ES.SetMode";
    /// Discovery broadcast; every device on the segment answers.
    pub const GET_DEVICE: &str = "Marstek.GetDevice";
}

/// A single request datagram.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceRequest {
    pub id: i64,
    pub method: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

impl DeviceRequest {
    /// Create a request without params.
    pub fn new(id: i64, method: impl Into<String>) -> Self {
        Self {
            id,
            method: method.into(),
            params: None,
        }
    }

    /// Create a request with params.
    pub fn with_params(id: i64, method: impl Into<String>, params: Value) -> Self {
        Self {
            id,
            method: method.into(),
            params: Some(params),
        }
    }
}

/// A single response datagram.
///
/// The firmware answers with either `result` or `error`; a reply carrying
/// neither is malformed and the caller treats it as a transport failure.
/// Unknown extra keys are ignored rather than rejected — firmware
/// revisions differ in what they tack on.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<Value>,
}

impl DeviceResponse {
    /// A response is keyed iff it has a `result` or an `error`.
    pub fn is_keyed(&self) -> bool {
        self.result.is_some() || self.error.is_some()
    }

    /// The `error` body if present, otherwise the whole response as JSON.
    ///
    /// Matches what gets recorded for a failed poll: the device error when
    /// it gave one, the raw reply when it did not.
    pub fn error_detail(&self) -> Value {
        match &self.error {
            Some(err) => err.clone(),
            None => serde_json::to_value(self).unwrap_or(Value::Null),
        }
    }
}

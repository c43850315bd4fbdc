//! Error taxonomy for the polling core.
//!
//! Every error here is soft: the scheduler records it into the snapshot's
//! `last_error` and stays retryable. Nothing crosses the `tick()` /
//! `set_mode()` boundary as a fault.

use serde_json::Value;
use std::time::Duration;
use thiserror::Error;

/// A UDP exchange failed before a usable response was decoded.
///
/// Always recovered locally: the transport discards its socket and the
/// next call starts from a fresh one.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    #[error("udp i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed response payload: {0}")]
    Malformed(#[from] serde_json::Error),

    /// Decoded fine but carries neither `result` nor `error`. Raised by
    /// the caller, not the transport, which returns whatever it decoded.
    #[error("response carries neither result nor error")]
    Unkeyed,
}

/// The device answered, but without the expected `result`.
#[derive(Debug, Error)]
#[error("{method} returned no result")]
pub struct ProtocolError {
    pub method: String,
    /// The device's `error` body, or the whole reply when there was none.
    pub detail: Value,
}

/// A failed query, in either flavor.
#[derive(Debug, Error)]
pub enum CallError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}

impl CallError {
    /// What gets recorded into the snapshot's `last_error`.
    ///
    /// Transport failures stringify; protocol failures keep the device's
    /// error body keyed under the method name that produced it.
    pub fn detail(&self) -> Value {
        match self {
            CallError::Transport(err) => Value::String(err.to_string()),
            CallError::Protocol(err) => {
                let mut map = serde_json::Map::new();
                map.insert(err.method.clone(), err.detail.clone());
                Value::Object(map)
            }
        }
    }
}

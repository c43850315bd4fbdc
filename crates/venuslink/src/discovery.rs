//! One-shot broadcast discovery of devices on the local segment.
//!
//! Sends `Marstek.GetDevice` to the limited broadcast address and collects
//! replies until the timeout, deduplicated by source IP. Reply shapes vary
//! by firmware, so the display fields are best-effort and the raw parsed
//! reply is kept alongside them.

use serde::Serialize;
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::time::Duration;
use tokio::net::UdpSocket;
use tokio::time::Instant;
use tracing::debug;
use venusproto::{method, DeviceRequest};

const MAX_DATAGRAM: usize = 65535;

/// One responding device.
#[derive(Debug, Clone, Serialize)]
pub struct DiscoveredDevice {
    pub ip: String,
    pub device_name: Option<String>,
    pub model: Option<String>,
    pub serial: Option<String>,
    pub mac: Option<String>,
    /// The full parsed reply, for anything the fields above missed.
    pub raw: Value,
}

impl DiscoveredDevice {
    fn from_reply(ip: String, raw: Value) -> Self {
        let result = raw.get("result").and_then(Value::as_object);
        let field = |keys: &[&str]| -> Option<String> {
            keys.iter().find_map(|key| {
                result?
                    .get(*key)
                    .filter(|v| !v.is_null())
                    .map(display_string)
            })
        };

        let device_name = field(&["device_name", "name"]);
        let model = field(&["model"]);
        let serial = field(&["sn", "serial"]);
        let mac = field(&["mac"]);

        Self {
            ip,
            device_name,
            model,
            serial,
            mac,
            raw,
        }
    }

    /// Human-readable line for pickers: IP plus the best available name.
    pub fn label(&self) -> String {
        let detail = self
            .device_name
            .clone()
            .or_else(|| self.model.clone())
            .or_else(|| self.serial.as_ref().map(|sn| format!("SN {sn}")));
        match detail {
            Some(detail) => format!("{} - {}", self.ip, detail),
            None => self.ip.clone(),
        }
    }
}

fn display_string(v: &Value) -> String {
    match v {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Broadcast `Marstek.GetDevice` and collect responses until `timeout`.
///
/// Unparseable replies are skipped; a socket error ends collection with
/// whatever was gathered so far.
pub async fn discover(port: u16, timeout: Duration) -> std::io::Result<Vec<DiscoveredDevice>> {
    let socket = UdpSocket::bind(("0.0.0.0", 0)).await?;
    socket.set_broadcast(true)?;

    let request = DeviceRequest::with_params(1, method::GET_DEVICE, json!({}));
    let payload = serde_json::to_vec(&request)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
    socket.send_to(&payload, ("255.255.255.255", port)).await?;

    let deadline = Instant::now() + timeout;
    let mut found: BTreeMap<String, DiscoveredDevice> = BTreeMap::new();
    let mut buf = vec![0u8; MAX_DATAGRAM];

    loop {
        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            break;
        }

        let (n, addr) = match tokio::time::timeout(remaining, socket.recv_from(&mut buf)).await {
            Ok(Ok(received)) => received,
            // Collection window over, or the socket gave up.
            Ok(Err(_)) | Err(_) => break,
        };

        let ip = addr.ip().to_string();
        let Ok(parsed) = serde_json::from_slice::<Value>(&buf[..n]) else {
            debug!(%ip, "discarding unparseable discovery reply");
            continue;
        };
        found.insert(ip.clone(), DiscoveredDevice::from_reply(ip, parsed));
    }

    Ok(found.into_values().collect())
}

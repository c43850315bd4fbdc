//! UDP datagram transport: one request out, one response back.
//!
//! The socket is created lazily and thrown away on any failure — timeouts
//! included — so a wedged exchange can never poison later ones. The
//! transport performs no locking and no retries; the scheduler serializes
//! access and decides when to try again.

use async_trait::async_trait;
use serde_json::json;
use std::time::Duration;
use tokio::net::UdpSocket;
use tracing::{debug, trace};
use venusproto::{method, DeviceRequest, DeviceResponse};

use crate::error::TransportError;

/// Largest datagram the firmware is known to send.
const MAX_DATAGRAM: usize = 65535;

/// One request/response exchange with the device.
///
/// The seam between the scheduler and the network; tests implement this
/// with scripted exchanges.
#[async_trait]
pub trait DeviceTransport: Send {
    /// Send `request` and wait for exactly one response.
    ///
    /// Implementations must leave themselves usable after an error.
    async fn call(&mut self, request: &DeviceRequest) -> Result<DeviceResponse, TransportError>;

    /// Release any held resources. Must be idempotent.
    fn close(&mut self);
}

/// Connection-oriented UDP client for the device's local API.
pub struct UdpTransport {
    host: String,
    port: u16,
    timeout: Duration,
    socket: Option<UdpSocket>,
}

impl UdpTransport {
    pub fn new(host: impl Into<String>, port: u16, timeout: Duration) -> Self {
        Self {
            host: host.into(),
            port,
            timeout,
            socket: None,
        }
    }

    async fn exchange(
        socket: &UdpSocket,
        request: &DeviceRequest,
        timeout: Duration,
    ) -> Result<DeviceResponse, TransportError> {
        let payload = serde_json::to_vec(request)?;
        socket.send(&payload).await?;

        let mut buf = vec![0u8; MAX_DATAGRAM];
        let n = tokio::time::timeout(timeout, socket.recv(&mut buf))
            .await
            .map_err(|_| TransportError::Timeout(timeout))??;

        trace!(method = %request.method, bytes = n, "response received");
        Ok(serde_json::from_slice(&buf[..n])?)
    }
}

#[async_trait]
impl DeviceTransport for UdpTransport {
    async fn call(&mut self, request: &DeviceRequest) -> Result<DeviceResponse, TransportError> {
        let socket = match self.socket.take() {
            Some(socket) => socket,
            None => {
                let socket = UdpSocket::bind(("0.0.0.0", 0)).await?;
                socket.connect((self.host.as_str(), self.port)).await?;
                debug!(host = %self.host, port = self.port, "udp socket created");
                socket
            }
        };

        match Self::exchange(&socket, request, self.timeout).await {
            Ok(response) => {
                self.socket = Some(socket);
                Ok(response)
            }
            Err(err) => {
                // Socket dropped here; the next call starts fresh.
                debug!(method = %request.method, error = %err, "udp exchange failed");
                Err(err)
            }
        }
    }

    fn close(&mut self) {
        self.socket = None;
    }
}

/// Quick connectivity check used by the setup wizard.
///
/// One `ES.GetStatus` exchange on a throwaway socket; any keyed reply —
/// `result` or `error` — proves something is answering the protocol.
pub async fn probe(host: &str, port: u16, timeout: Duration) -> bool {
    let mut transport = UdpTransport::new(host, port, timeout);
    let request = DeviceRequest::with_params(1, method::ES_STATUS, json!({"id": 0}));
    let reachable = matches!(transport.call(&request).await, Ok(resp) if resp.is_keyed());
    transport.close();
    reachable
}

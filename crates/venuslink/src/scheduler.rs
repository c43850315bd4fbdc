//! The composition root: one exclusive section over transport, gate,
//! poll table, and snapshot.
//!
//! The host drives [`Scheduler::tick`] on a fixed cadence; each tick sends
//! at most one request. When the gate is still closed the tick skips
//! rather than waits, so the host's polling cadence is never blocked.
//! Mode changes ([`Scheduler::set_mode`], in [`crate::command`]) take the
//! same lock, so a poll can never interleave with the set-then-verify
//! sequence.

use chrono::Utc;
use serde_json::Value;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, warn};
use venusconf::{DeviceConfig, ScheduleConfig};
use venusproto::DeviceRequest;

use crate::error::{CallError, ProtocolError, TransportError};
use crate::gate::RequestGate;
use crate::poll::PollTable;
use crate::snapshot::{DeviceIdentity, DeviceSnapshot};
use crate::transport::{DeviceTransport, UdpTransport};

pub(crate) struct Inner<T> {
    pub(crate) transport: T,
    pub(crate) gate: RequestGate,
    pub(crate) polls: PollTable,
    pub(crate) snapshot: DeviceSnapshot,
}

impl<T: DeviceTransport> Inner<T> {
    /// One exchange, resolved down to the `result` payload.
    ///
    /// A reply with neither `result` nor `error` counts as a transport
    /// failure; a reply with only `error` is a protocol failure carrying
    /// the device's own detail.
    pub(crate) async fn exchange(&mut self, request: &DeviceRequest) -> Result<Value, CallError> {
        let response = self.transport.call(request).await?;
        if !response.is_keyed() {
            return Err(TransportError::Unkeyed.into());
        }
        match response.result {
            Some(result) => Ok(result),
            None => Err(ProtocolError {
                method: request.method.clone(),
                detail: response.error_detail(),
            }
            .into()),
        }
    }
}

/// Polls the device and applies verified mode changes, one request at a
/// time, never closer together than the configured minimum gap.
pub struct Scheduler<T: DeviceTransport = UdpTransport> {
    pub(crate) inner: Mutex<Inner<T>>,
}

impl Scheduler<UdpTransport> {
    pub fn new(device: &DeviceConfig, schedule: &ScheduleConfig) -> Self {
        let transport =
            UdpTransport::new(device.host.clone(), device.port, schedule.udp_timeout());
        Self::with_transport(transport, device, schedule)
    }
}

impl<T: DeviceTransport> Scheduler<T> {
    /// Build a scheduler over any transport; tests script the exchanges.
    pub fn with_transport(transport: T, device: &DeviceConfig, schedule: &ScheduleConfig) -> Self {
        let identity = DeviceIdentity {
            host: device.host.clone(),
            port: device.port,
            name: device.name.clone(),
        };
        Self {
            inner: Mutex::new(Inner {
                transport,
                gate: RequestGate::new(schedule.min_request_gap()),
                polls: PollTable::new(
                    schedule.es_status_interval(),
                    schedule.bat_status_interval(),
                    schedule.es_mode_interval(),
                ),
                snapshot: DeviceSnapshot::new(identity),
            }),
        }
    }

    /// One scheduling step: send the highest-priority due query, if the
    /// gate allows one, and merge its result.
    ///
    /// Returns the snapshot either way. Never waits on the gate — a tick
    /// inside the gap is a skip, not a stall — and never raises: failures
    /// land in `last_error` with prior values untouched.
    pub async fn tick(&self) -> DeviceSnapshot {
        let mut inner = self.inner.lock().await;
        inner.snapshot.ts = Some(Utc::now());

        let now = Instant::now();
        if !inner.gate.is_open(now) {
            return inner.snapshot.clone();
        }

        let Some(kind) = inner.polls.pick_due(now) else {
            return inner.snapshot.clone();
        };

        inner.snapshot.last_request = Some(kind.method().to_string());
        let outcome = inner.exchange(&kind.request()).await;
        inner.gate.record_sent(Instant::now());

        match outcome {
            Ok(result) => {
                debug!(method = kind.method(), "poll ok");
                inner.snapshot.merge_poll(kind, result, Utc::now());
                inner.polls.mark_success(kind, Instant::now());
            }
            Err(err) => {
                warn!(method = kind.method(), error = %err, "poll failed");
                inner.snapshot.last_error = Some(err.detail());
            }
        }

        inner.snapshot.clone()
    }

    /// Current snapshot without any scheduling activity.
    pub async fn snapshot(&self) -> DeviceSnapshot {
        self.inner.lock().await.snapshot.clone()
    }

    /// Release the transport's socket. Idempotent.
    pub async fn close(&self) {
        self.inner.lock().await.transport.close();
    }
}

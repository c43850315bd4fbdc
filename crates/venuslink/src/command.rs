//! Set-then-verify mode changes.
//!
//! The device's acknowledgment for `ES.SetMode` is not trustworthy in
//! isolation: firmwares have been seen to ack a set they did not apply.
//! The only correctness signal accepted here is a subsequent `ES.GetMode`
//! read-back agreeing with the request. The whole sequence runs under the
//! scheduler's exclusive section, so no poll can interleave with it.

use chrono::Utc;
use serde_json::{json, Value};
use std::time::Duration;
use tokio::time::Instant;
use tracing::{info, warn};
use venusproto::{dig, is_trueish, method, DeviceMode, DeviceRequest};

use crate::poll::QueryKind;
use crate::scheduler::Scheduler;
use crate::transport::DeviceTransport;

/// Id tags for the two calls of the sequence; only local uniqueness matters.
const SET_MODE_ID: i64 = 20;
const VERIFY_MODE_ID: i64 = 21;

/// Pause between the ack and the read-back, giving the firmware time to
/// actually apply the change.
const SETTLE_DELAY: Duration = Duration::from_millis(300);

impl<T: DeviceTransport> Scheduler<T> {
    /// Request an operating mode change and verify it took effect.
    ///
    /// Returns `true` only when the read-back reports the requested mode.
    /// Every failure path — unknown mode, transport error, unconvincing
    /// ack, missing read-back result, mismatch — records its detail in
    /// `last_error` and returns `false`; nothing is raised.
    pub async fn set_mode(&self, requested: &str) -> bool {
        let mut inner = self.inner.lock().await;
        inner.snapshot.ts = Some(Utc::now());

        let mode = match DeviceMode::from_name(requested) {
            Ok(mode) => mode,
            Err(err) => {
                warn!(requested, "mode change rejected before any i/o");
                inner.snapshot.last_error = Some(Value::String(err.to_string()));
                return false;
            }
        };

        // Unlike a poll tick, a user-initiated command waits the gap out.
        inner.gate.wait_if_needed().await;

        inner.snapshot.last_request = Some(method::ES_SET_MODE.to_string());
        let set_request =
            DeviceRequest::with_params(SET_MODE_ID, method::ES_SET_MODE, mode.set_params());
        let set_outcome = inner.transport.call(&set_request).await;
        inner.gate.record_sent(Instant::now());

        let set_response = match set_outcome {
            Ok(response) => response,
            Err(err) => {
                warn!(mode = %mode, error = %err, "set command failed");
                inner.snapshot.last_error = Some(Value::String(err.to_string()));
                return false;
            }
        };

        let set_value = serde_json::to_value(&set_response).unwrap_or(Value::Null);
        let acked = is_trueish(
            set_response
                .result
                .as_ref()
                .and_then(|result| dig(result, "set_result")),
        );
        if !acked {
            warn!(mode = %mode, "set command not acknowledged");
            inner.snapshot.last_error = Some(json!({ "ES.SetMode": set_value }));
            return false;
        }

        tokio::time::sleep(SETTLE_DELAY).await;
        inner.gate.wait_if_needed().await;

        inner.snapshot.last_request = Some(method::ES_GET_MODE.to_string());
        let verify_request = DeviceRequest::with_params(
            VERIFY_MODE_ID,
            method::ES_GET_MODE,
            json!({"id": 0}),
        );
        let verify_outcome = inner.transport.call(&verify_request).await;
        inner.gate.record_sent(Instant::now());

        let verify_response = match verify_outcome {
            Ok(response) => response,
            Err(err) => {
                warn!(mode = %mode, error = %err, "read-back failed");
                inner.snapshot.last_error = Some(Value::String(err.to_string()));
                return false;
            }
        };

        let Some(result) = verify_response.result else {
            inner.snapshot.last_error = Some(json!({
                "ES.GetMode_after_set":
                    serde_json::to_value(&verify_response).unwrap_or(Value::Null)
            }));
            return false;
        };

        // The read-back is authoritative device state; store it even if it
        // disagrees with what we asked for.
        let actual = dig(&result, "mode").cloned();
        inner.snapshot.mode = Some(result);
        inner.snapshot.last_mode_ok = Some(Utc::now());

        if actual.as_ref().and_then(Value::as_str) != Some(mode.name()) {
            warn!(requested = mode.name(), ?actual, "mode mismatch after set");
            inner.snapshot.last_error = Some(json!({
                "mode_mismatch": {
                    "requested": mode.name(),
                    "actual": actual,
                    "set_response": set_value,
                }
            }));
            return false;
        }

        info!(mode = %mode, "mode change verified");
        inner.snapshot.last_error = None;
        // Force the next periodic mode poll to refresh again later.
        inner.polls.invalidate(QueryKind::EsMode);
        true
    }
}

//! Scheduler behavior under a scripted transport and a paused clock.
//!
//! Every test drives the real scheduler, gate, and poll table; only the
//! network is replaced. Time is tokio's paused test clock, so gate waits
//! and the settle delay run instantly but keep their arithmetic.

use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::{advance, Instant};
use venusconf::{DeviceConfig, ScheduleConfig};
use venuslink::{DeviceTransport, Scheduler, TransportError};
use venusproto::{DeviceRequest, DeviceResponse};

#[derive(Debug, Clone)]
struct SentRequest {
    at: Instant,
    request: DeviceRequest,
}

/// Shared view of everything the scheduler put on the wire.
#[derive(Clone, Default)]
struct CallLog(Arc<Mutex<Vec<SentRequest>>>);

impl CallLog {
    fn sent(&self) -> Vec<SentRequest> {
        self.0.lock().unwrap().clone()
    }

    fn methods(&self) -> Vec<String> {
        self.sent().iter().map(|s| s.request.method.clone()).collect()
    }

    fn count(&self) -> usize {
        self.0.lock().unwrap().len()
    }
}

/// Transport double that pops one scripted reply per call.
struct ScriptedTransport {
    log: CallLog,
    replies: VecDeque<Result<DeviceResponse, TransportError>>,
}

#[async_trait]
impl DeviceTransport for ScriptedTransport {
    async fn call(&mut self, request: &DeviceRequest) -> Result<DeviceResponse, TransportError> {
        self.log.0.lock().unwrap().push(SentRequest {
            at: Instant::now(),
            request: request.clone(),
        });
        self.replies
            .pop_front()
            .unwrap_or_else(|| panic!("unscripted request: {}", request.method))
    }

    fn close(&mut self) {}
}

fn ok(result: Value) -> Result<DeviceResponse, TransportError> {
    Ok(DeviceResponse {
        id: Some(0),
        result: Some(result),
        error: None,
    })
}

fn device_error(error: Value) -> Result<DeviceResponse, TransportError> {
    Ok(DeviceResponse {
        id: Some(0),
        result: None,
        error: Some(error),
    })
}

fn unkeyed() -> Result<DeviceResponse, TransportError> {
    Ok(DeviceResponse {
        id: Some(0),
        result: None,
        error: None,
    })
}

fn scheduler(
    replies: Vec<Result<DeviceResponse, TransportError>>,
) -> (Scheduler<ScriptedTransport>, CallLog) {
    let mut device = DeviceConfig::default();
    device.host = "192.0.2.1".to_string();

    // min gap 2s, intervals 30/60/600 — the defaults under test.
    let schedule = ScheduleConfig::default();

    let log = CallLog::default();
    let transport = ScriptedTransport {
        log: log.clone(),
        replies: replies.into(),
    };
    (
        Scheduler::with_transport(transport, &device, &schedule),
        log,
    )
}

fn min_gap() -> Duration {
    ScheduleConfig::default().min_request_gap()
}

/// No two requests closer together than the gap, over any log.
fn assert_gap_respected(log: &CallLog) {
    let sent = log.sent();
    for pair in sent.windows(2) {
        let gap = pair[1].at.duration_since(pair[0].at);
        assert!(
            gap >= min_gap(),
            "requests {} and {} only {:?} apart",
            pair[0].request.method,
            pair[1].request.method,
            gap
        );
    }
}

#[tokio::test(start_paused = true)]
async fn first_tick_polls_es_status() {
    let (scheduler, log) = scheduler(vec![ok(json!({"ongrid_power": 120}))]);

    let snap = scheduler.tick().await;

    assert_eq!(log.methods(), vec!["ES.GetStatus"]);
    assert_eq!(snap.es, Some(json!({"ongrid_power": 120})));
    assert_eq!(snap.last_request.as_deref(), Some("ES.GetStatus"));
    assert_eq!(snap.last_error, None);
    assert!(snap.last_es_ok.is_some());
}

#[tokio::test(start_paused = true)]
async fn tick_inside_gap_skips_without_waiting() {
    let (scheduler, log) = scheduler(vec![ok(json!({"a": 1}))]);

    let first = scheduler.tick().await;
    let second = scheduler.tick().await;

    assert_eq!(log.count(), 1);
    assert_eq!(second.es, first.es);
    assert_eq!(second.bat, first.bat);
    assert_eq!(second.last_error, first.last_error);
}

#[tokio::test(start_paused = true)]
async fn all_kinds_due_advance_one_per_tick_in_priority_order() {
    let (scheduler, log) = scheduler(vec![
        ok(json!({"es": 1})),
        ok(json!({"soc": 55})),
        ok(json!({"mode": "Auto"})),
    ]);

    scheduler.tick().await;
    advance(min_gap()).await;
    scheduler.tick().await;
    advance(min_gap()).await;
    let snap = scheduler.tick().await;

    assert_eq!(
        log.methods(),
        vec!["ES.GetStatus", "Bat.GetStatus", "ES.GetMode"]
    );
    assert_gap_respected(&log);
    assert!(snap.es.is_some() && snap.bat.is_some() && snap.mode.is_some());
}

#[tokio::test(start_paused = true)]
async fn end_to_end_cadence_from_the_device_playbook() {
    // min gap 2s, ES status interval 30s, fresh state.
    let (scheduler, log) = scheduler(vec![ok(json!({"es": 1})), ok(json!({"soc": 60}))]);

    // t=0: first tick issues the ES status query.
    scheduler.tick().await;
    assert_eq!(log.methods(), vec!["ES.GetStatus"]);

    // t=1: gate not yet elapsed — unchanged, no request.
    advance(Duration::from_secs(1)).await;
    scheduler.tick().await;
    assert_eq!(log.count(), 1);

    // t=3: gate open; ES status not due again, battery status is.
    advance(Duration::from_secs(2)).await;
    scheduler.tick().await;
    assert_eq!(log.methods(), vec!["ES.GetStatus", "Bat.GetStatus"]);
    assert_gap_respected(&log);
}

#[tokio::test(start_paused = true)]
async fn nothing_due_means_no_request_and_unchanged_snapshot() {
    let (scheduler, log) = scheduler(vec![
        ok(json!({"es": 1})),
        ok(json!({"soc": 55})),
        ok(json!({"mode": "Auto"})),
    ]);

    for _ in 0..3 {
        scheduler.tick().await;
        advance(min_gap()).await;
    }
    assert_eq!(log.count(), 3);

    // All three kinds fresh, gate open: a tick is a pure no-op.
    let before = scheduler.snapshot().await;
    let after = scheduler.tick().await;
    assert_eq!(log.count(), 3);
    assert_eq!(after.es, before.es);
    assert_eq!(after.bat, before.bat);
    assert_eq!(after.mode, before.mode);
    assert_eq!(after.last_request, before.last_request);
    assert_eq!(after.last_error, before.last_error);
}

#[tokio::test(start_paused = true)]
async fn device_error_reply_is_recorded_and_prior_value_kept() {
    let (scheduler, log) = scheduler(vec![
        ok(json!({"es": 1})),
        device_error(json!({"code": -3})),
    ]);

    scheduler.tick().await;
    // 30s later the ES interval has re-elapsed.
    advance(Duration::from_secs(30)).await;
    let snap = scheduler.tick().await;

    assert_eq!(log.count(), 2);
    assert_eq!(snap.last_error, Some(json!({"ES.GetStatus": {"code": -3}})));
    // failed poll leaves the previous block untouched
    assert_eq!(snap.es, Some(json!({"es": 1})));

    // the failed attempt still stamped the gate
    advance(Duration::from_secs(1)).await;
    scheduler.tick().await;
    assert_eq!(log.count(), 2);
}

#[tokio::test(start_paused = true)]
async fn transport_failure_is_recorded_as_text() {
    let (scheduler, _log) =
        scheduler(vec![Err(TransportError::Timeout(Duration::from_secs(2)))]);

    let snap = scheduler.tick().await;

    let detail = snap.last_error.expect("error recorded");
    assert!(detail.as_str().unwrap().contains("timed out"));
    assert_eq!(snap.es, None);
}

#[tokio::test(start_paused = true)]
async fn reply_without_result_or_error_counts_as_transport_failure() {
    let (scheduler, _log) = scheduler(vec![unkeyed()]);

    let snap = scheduler.tick().await;

    let detail = snap.last_error.expect("error recorded");
    assert!(detail.as_str().unwrap().contains("neither result nor error"));
}

#[tokio::test(start_paused = true)]
async fn unsupported_mode_fails_without_any_io() {
    let (scheduler, log) = scheduler(vec![]);

    assert!(!scheduler.set_mode("Bogus").await);

    assert_eq!(log.count(), 0);
    let snap = scheduler.snapshot().await;
    assert_eq!(snap.last_error, Some(json!("Unsupported mode: Bogus")));
}

#[tokio::test(start_paused = true)]
async fn set_mode_is_verified_by_read_back() {
    let (scheduler, log) = scheduler(vec![
        ok(json!({"set_result": true})),
        ok(json!({"mode": "Auto"})),
    ]);

    assert!(scheduler.set_mode("Auto").await);

    assert_eq!(log.methods(), vec!["ES.SetMode", "ES.GetMode"]);
    assert_gap_respected(&log);

    let set = &log.sent()[0].request;
    let params = set.params.as_ref().unwrap();
    assert_eq!(params["config"]["mode"], "Auto");
    assert_eq!(params["config"]["auto_cfg"]["enable"], 1);

    let snap = scheduler.snapshot().await;
    assert_eq!(snap.mode, Some(json!({"mode": "Auto"})));
    assert_eq!(snap.last_error, None);
    assert!(snap.last_mode_ok.is_some());
}

#[tokio::test(start_paused = true)]
async fn read_back_mismatch_fails_despite_acked_set() {
    let (scheduler, log) = scheduler(vec![
        ok(json!({"set_result": 1})),
        ok(json!({"mode": "Manual"})),
    ]);

    assert!(!scheduler.set_mode("Auto").await);
    assert_eq!(log.count(), 2);

    let snap = scheduler.snapshot().await;
    let mismatch = &snap.last_error.as_ref().unwrap()["mode_mismatch"];
    assert_eq!(mismatch["requested"], "Auto");
    assert_eq!(mismatch["actual"], "Manual");
    assert!(mismatch.get("set_response").is_some());
    // the read-back is authoritative state and is kept
    assert_eq!(snap.mode, Some(json!({"mode": "Manual"})));
}

#[tokio::test(start_paused = true)]
async fn unconvincing_ack_skips_the_read_back() {
    let (scheduler, log) = scheduler(vec![ok(json!({"set_result": 0}))]);

    assert!(!scheduler.set_mode("Auto").await);

    assert_eq!(log.count(), 1, "no verification after a failed set");
    let snap = scheduler.snapshot().await;
    assert!(snap.last_error.as_ref().unwrap().get("ES.SetMode").is_some());
    assert_eq!(snap.mode, None);
}

#[tokio::test(start_paused = true)]
async fn loose_ack_strings_are_accepted() {
    let (scheduler, _log) = scheduler(vec![
        ok(json!({"set_result": "ok"})),
        ok(json!({"mode": "Manual"})),
    ]);

    assert!(scheduler.set_mode("Manual").await);
}

#[tokio::test(start_paused = true)]
async fn read_back_without_result_fails() {
    let (scheduler, _log) = scheduler(vec![
        ok(json!({"set_result": true})),
        device_error(json!({"code": -9})),
    ]);

    assert!(!scheduler.set_mode("Auto").await);

    let snap = scheduler.snapshot().await;
    assert!(snap
        .last_error
        .as_ref()
        .unwrap()
        .get("ES.GetMode_after_set")
        .is_some());
}

#[tokio::test(start_paused = true)]
async fn verified_set_forces_a_fresh_mode_poll() {
    let (scheduler, log) = scheduler(vec![
        ok(json!({"es": 1})),
        ok(json!({"soc": 55})),
        ok(json!({"mode": "Auto"})),
        ok(json!({"set_result": true})),
        ok(json!({"mode": "Manual"})),
        ok(json!({"mode": "Manual", "manual_cfg": {}})),
    ]);

    // Freshen every kind, then flip the mode.
    for _ in 0..3 {
        scheduler.tick().await;
        advance(min_gap()).await;
    }
    assert!(scheduler.set_mode("Manual").await);

    // ES and battery are fresh; only the invalidated mode poll is due.
    advance(min_gap()).await;
    scheduler.tick().await;
    assert_eq!(log.methods().last().map(String::as_str), Some("ES.GetMode"));
    assert_eq!(log.count(), 6);
    assert_gap_respected(&log);
}

#[tokio::test(start_paused = true)]
async fn poll_followed_by_command_respects_the_gap() {
    let (scheduler, log) = scheduler(vec![
        ok(json!({"es": 1})),
        ok(json!({"set_result": true})),
        ok(json!({"mode": "Auto"})),
    ]);

    scheduler.tick().await;
    // Immediately after the poll; the command path waits the gap out.
    assert!(scheduler.set_mode("Auto").await);

    assert_eq!(
        log.methods(),
        vec!["ES.GetStatus", "ES.SetMode", "ES.GetMode"]
    );
    assert_gap_respected(&log);
}

#[tokio::test(start_paused = true)]
async fn close_twice_is_idempotent() {
    let (scheduler, _log) = scheduler(vec![]);
    scheduler.close().await;
    scheduler.close().await;
}

//! Priority-ordered due-clock table for the periodic queries.
//!
//! Each query kind keeps its own refresh interval and last-success time;
//! kinds do not share a due clock. A tick asks [`PollTable::pick_due`] for
//! at most one kind, evaluated in fixed priority order — ES status first,
//! as the highest-value, most time-sensitive signal. The ordering is a
//! policy choice, not an artifact of the slot layout.

use serde_json::{json, Value};
use std::time::Duration;
use tokio::time::Instant;
use venusproto::{method, DeviceRequest};

/// The logical data categories polled from the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueryKind {
    /// Energy system status (`ES.GetStatus`).
    EsStatus,
    /// Battery pack status (`Bat.GetStatus`).
    BatStatus,
    /// Operating mode (`ES.GetMode`).
    EsMode,
}

impl QueryKind {
    pub fn method(self) -> &'static str {
        match self {
            QueryKind::EsStatus => method::ES_STATUS,
            QueryKind::BatStatus => method::BAT_STATUS,
            QueryKind::EsMode => method::ES_GET_MODE,
        }
    }

    /// Conventional id tag for the periodic poll of this kind.
    pub fn rpc_id(self) -> i64 {
        match self {
            QueryKind::EsStatus => 12,
            QueryKind::BatStatus => 11,
            QueryKind::EsMode => 13,
        }
    }

    pub fn params(self) -> Value {
        json!({"id": 0})
    }

    pub fn request(self) -> DeviceRequest {
        DeviceRequest::with_params(self.rpc_id(), self.method(), self.params())
    }
}

/// One kind's descriptor: interval plus its private due clock.
#[derive(Debug)]
struct QuerySlot {
    kind: QueryKind,
    interval: Duration,
    last_success: Option<Instant>,
}

impl QuerySlot {
    /// Due iff never succeeded, or the interval has elapsed since success.
    fn is_due(&self, now: Instant) -> bool {
        match self.last_success {
            None => true,
            Some(at) => now.saturating_duration_since(at) >= self.interval,
        }
    }
}

/// Ordered slot list; adding a fourth query kind is adding a row.
#[derive(Debug)]
pub struct PollTable {
    slots: Vec<QuerySlot>,
}

impl PollTable {
    pub fn new(es_status: Duration, bat_status: Duration, es_mode: Duration) -> Self {
        Self {
            slots: vec![
                QuerySlot {
                    kind: QueryKind::EsStatus,
                    interval: es_status,
                    last_success: None,
                },
                QuerySlot {
                    kind: QueryKind::BatStatus,
                    interval: bat_status,
                    last_success: None,
                },
                QuerySlot {
                    kind: QueryKind::EsMode,
                    interval: es_mode,
                    last_success: None,
                },
            ],
        }
    }

    /// First due kind in priority order, or `None` when nothing is due.
    pub fn pick_due(&self, now: Instant) -> Option<QueryKind> {
        self.slots
            .iter()
            .find(|slot| slot.is_due(now))
            .map(|slot| slot.kind)
    }

    /// Reset `kind`'s due clock after a successful query.
    pub fn mark_success(&mut self, kind: QueryKind, now: Instant) {
        if let Some(slot) = self.slots.iter_mut().find(|slot| slot.kind == kind) {
            slot.last_success = Some(now);
        }
    }

    /// Force `kind` due on the next tick, e.g. after a verified mode change.
    pub fn invalidate(&mut self, kind: QueryKind) {
        if let Some(slot) = self.slots.iter_mut().find(|slot| slot.kind == kind) {
            slot.last_success = None;
        }
    }
}

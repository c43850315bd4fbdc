//! Global minimum spacing between outgoing requests.
//!
//! The device firmware rejects or misbehaves under back-to-back requests,
//! so the gap is enforced across all query kinds and the command protocol,
//! not per-kind. The poll path checks [`RequestGate::is_open`] and simply
//! skips its tick; the command path calls [`RequestGate::wait_if_needed`]
//! and sleeps out the remainder.

use std::time::Duration;
use tokio::time::Instant;

#[derive(Debug)]
pub struct RequestGate {
    min_gap: Duration,
    last_sent: Option<Instant>,
}

impl RequestGate {
    pub fn new(min_gap: Duration) -> Self {
        Self {
            min_gap,
            last_sent: None,
        }
    }

    /// True when a request may be sent now.
    pub fn is_open(&self, now: Instant) -> bool {
        self.remaining(now).is_none()
    }

    /// Time left until the gate opens, or `None` if it already is.
    pub fn remaining(&self, now: Instant) -> Option<Duration> {
        let last = self.last_sent?;
        let elapsed = now.saturating_duration_since(last);
        if elapsed >= self.min_gap {
            None
        } else {
            Some(self.min_gap - elapsed)
        }
    }

    /// Sleep out whatever is left of the gap, then return.
    pub async fn wait_if_needed(&self) {
        if let Some(rest) = self.remaining(Instant::now()) {
            tokio::time::sleep(rest).await;
        }
    }

    /// Stamp the gate. Called after every request attempt, success or
    /// failure — a timed-out request still hit the device.
    pub fn record_sent(&mut self, now: Instant) {
        self.last_sent = Some(now);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_before_any_request() {
        let gate = RequestGate::new(Duration::from_secs(2));
        assert!(gate.is_open(Instant::now()));
        assert_eq!(gate.remaining(Instant::now()), None);
    }

    #[test]
    fn closed_inside_the_gap() {
        let mut gate = RequestGate::new(Duration::from_secs(2));
        let t0 = Instant::now();
        gate.record_sent(t0);

        assert!(!gate.is_open(t0));
        assert_eq!(gate.remaining(t0), Some(Duration::from_secs(2)));
        assert_eq!(
            gate.remaining(t0 + Duration::from_millis(1500)),
            Some(Duration::from_millis(500))
        );
    }

    #[test]
    fn reopens_once_the_gap_has_elapsed() {
        let mut gate = RequestGate::new(Duration::from_secs(2));
        let t0 = Instant::now();
        gate.record_sent(t0);

        assert!(gate.is_open(t0 + Duration::from_secs(2)));
        assert!(gate.is_open(t0 + Duration::from_secs(5)));
    }

    #[test]
    fn restamping_extends_the_gap() {
        let mut gate = RequestGate::new(Duration::from_secs(2));
        let t0 = Instant::now();
        gate.record_sent(t0);
        gate.record_sent(t0 + Duration::from_secs(1));

        assert!(!gate.is_open(t0 + Duration::from_secs(2)));
        assert!(gate.is_open(t0 + Duration::from_secs(3)));
    }
}

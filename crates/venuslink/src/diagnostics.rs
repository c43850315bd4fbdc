//! Diagnostics dump: endpoint, schedule settings, current snapshot.

use serde::Serialize;
use venusconf::{DeviceConfig, ScheduleConfig};

use crate::scheduler::Scheduler;
use crate::snapshot::DeviceSnapshot;
use crate::transport::DeviceTransport;

#[derive(Debug, Clone, Serialize)]
pub struct EntryDiagnostics {
    pub host: String,
    pub port: u16,
    pub options: ScheduleConfig,
}

/// Everything needed to debug a misbehaving setup from one paste.
#[derive(Debug, Clone, Serialize)]
pub struct DiagnosticsReport {
    pub entry: EntryDiagnostics,
    pub data: DeviceSnapshot,
}

impl DiagnosticsReport {
    pub async fn collect<T: DeviceTransport>(
        scheduler: &Scheduler<T>,
        device: &DeviceConfig,
        schedule: &ScheduleConfig,
    ) -> Self {
        Self {
            entry: EntryDiagnostics {
                host: device.host.clone(),
                port: device.port,
                options: schedule.clone(),
            },
            data: scheduler.snapshot().await,
        }
    }
}

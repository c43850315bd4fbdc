//! Named readings over the snapshot.
//!
//! A data-driven table mapping dotted snapshot paths to reading names and
//! unit strings. Pure extraction: what a presentation layer does with
//! units and classes is its own business.

use serde::Serialize;
use serde_json::Value;
use venusproto::dig;

use crate::snapshot::DeviceSnapshot;

pub struct ReadingSpec {
    pub key: &'static str,
    pub path: &'static str,
    pub unit: Option<&'static str>,
}

/// Every surfaced reading, in display order.
pub static READINGS: &[ReadingSpec] = &[
    ReadingSpec { key: "device", path: "device_name", unit: None },
    // diagnostics
    ReadingSpec { key: "last_request", path: "last_request", unit: None },
    ReadingSpec { key: "last_error", path: "last_error", unit: None },
    ReadingSpec { key: "last_es_ok", path: "last_es_ok", unit: None },
    ReadingSpec { key: "last_bat_ok", path: "last_bat_ok", unit: None },
    ReadingSpec { key: "last_mode_ok", path: "last_mode_ok", unit: None },
    // battery (Bat.GetStatus)
    ReadingSpec { key: "bat_soc", path: "bat.soc", unit: Some("%") },
    ReadingSpec { key: "bat_temp", path: "bat.bat_temp", unit: Some("°C") },
    ReadingSpec { key: "bat_capacity", path: "bat.bat_capacity", unit: Some("Wh") },
    ReadingSpec { key: "rated_capacity", path: "bat.rated_capacity", unit: Some("Wh") },
    // energy system (ES.GetStatus)
    ReadingSpec { key: "ongrid_power", path: "es.ongrid_power", unit: Some("W") },
    ReadingSpec { key: "offgrid_power", path: "es.offgrid_power", unit: Some("W") },
    ReadingSpec { key: "total_grid_output_energy", path: "es.total_grid_output_energy", unit: Some("Wh") },
    ReadingSpec { key: "total_grid_input_energy", path: "es.total_grid_input_energy", unit: Some("Wh") },
    ReadingSpec { key: "total_load_energy", path: "es.total_load_energy", unit: Some("Wh") },
    // mode (ES.GetMode)
    ReadingSpec { key: "mode", path: "mode.mode", unit: None },
];

/// One extracted reading; `value` is `Null` until its source has data.
#[derive(Debug, Clone, Serialize)]
pub struct Reading {
    pub key: &'static str,
    pub value: Value,
    pub unit: Option<&'static str>,
}

/// Extract every reading in [`READINGS`] from the snapshot.
pub fn extract(snapshot: &DeviceSnapshot) -> Vec<Reading> {
    let data = serde_json::to_value(snapshot).unwrap_or(Value::Null);
    READINGS
        .iter()
        .map(|spec| Reading {
            key: spec.key,
            value: dig(&data, spec.path).cloned().unwrap_or(Value::Null),
            unit: spec.unit,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::poll::QueryKind;
    use crate::snapshot::DeviceIdentity;
    use chrono::Utc;
    use serde_json::json;

    fn snapshot_with_data() -> DeviceSnapshot {
        let mut snap = DeviceSnapshot::new(DeviceIdentity {
            host: "192.168.1.50".to_string(),
            port: 30000,
            name: "Marstek Venus E 3.0".to_string(),
        });
        snap.merge_poll(
            QueryKind::BatStatus,
            json!({"soc": 57, "bat_temp": 23.5}),
            Utc::now(),
        );
        snap.merge_poll(
            QueryKind::EsStatus,
            json!({"ongrid_power": 120, "offgrid_power": 0}),
            Utc::now(),
        );
        snap
    }

    fn reading<'a>(readings: &'a [Reading], key: &str) -> &'a Reading {
        readings
            .iter()
            .find(|r| r.key == key)
            .unwrap_or_else(|| panic!("missing reading {key}"))
    }

    #[test]
    fn extracts_values_through_dotted_paths() {
        let readings = extract(&snapshot_with_data());
        assert_eq!(reading(&readings, "bat_soc").value, json!(57));
        assert_eq!(reading(&readings, "bat_soc").unit, Some("%"));
        assert_eq!(reading(&readings, "bat_temp").value, json!(23.5));
        assert_eq!(reading(&readings, "ongrid_power").value, json!(120));
        assert_eq!(reading(&readings, "device").value, json!("Marstek Venus E 3.0"));
    }

    #[test]
    fn missing_sources_read_as_null() {
        let readings = extract(&snapshot_with_data());
        // no mode poll has happened yet
        assert_eq!(reading(&readings, "mode").value, Value::Null);
        assert_eq!(reading(&readings, "last_mode_ok").value, Value::Null);
    }

    #[test]
    fn table_covers_every_block_of_the_snapshot() {
        let paths: Vec<&str> = READINGS.iter().map(|spec| spec.path).collect();
        assert!(paths.iter().any(|p| p.starts_with("bat.")));
        assert!(paths.iter().any(|p| p.starts_with("es.")));
        assert!(paths.iter().any(|p| p.starts_with("mode.")));
    }
}

//! Sensor-kind classification

use serde::{Deserialize, Serialize};

/// Name of the account command whose result is a vehicle location
pub const LOCATION_COMMAND: &str = "getLocation";

/// Suffixes marking on/off readings (matched case-insensitively)
const BINARY_SUFFIXES: [&str; 3] = ["STATE", "INDICATOR", "STATUS"];

/// Home-automation entity component a reading maps to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SensorKind {
    Sensor,
    BinarySensor,
    DeviceTracker,
}

impl SensorKind {
    /// Topic segment for this kind
    pub fn as_str(&self) -> &'static str {
        match self {
            SensorKind::Sensor => "sensor",
            SensorKind::BinarySensor => "binary_sensor",
            SensorKind::DeviceTracker => "device_tracker",
        }
    }
}

impl std::fmt::Display for SensorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classify a diagnostic, element or command name.
///
/// - trimmed name ending in `STATE`, `INDICATOR` or `STATUS` → `binary_sensor`
/// - exactly [`LOCATION_COMMAND`] → `device_tracker`
/// - anything else, including the empty string → `sensor`
pub fn classify_sensor_kind(name: &str) -> SensorKind {
    let upper = name.trim().to_uppercase();
    if BINARY_SUFFIXES.iter().any(|suffix| upper.ends_with(suffix)) {
        SensorKind::BinarySensor
    } else if name == LOCATION_COMMAND {
        SensorKind::DeviceTracker
    } else {
        SensorKind::Sensor
    }
}

//! Vehicle identity and location models

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Identity of the bridged vehicle
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VehicleIdentity {
    pub make: String,
    pub model: String,
    /// Vehicle identification number, used verbatim in topics
    pub vin: String,
    pub year: u16,
    /// Diagnostic items the vehicle reports on request
    #[serde(default)]
    pub supported_diagnostics: Vec<String>,
}

impl VehicleIdentity {
    pub fn new(
        make: impl Into<String>,
        model: impl Into<String>,
        vin: impl Into<String>,
        year: u16,
    ) -> Self {
        Self {
            make: make.into(),
            model: model.into(),
            vin: vin.into(),
            year,
            supported_diagnostics: Vec::new(),
        }
    }

    /// Add the list of supported diagnostic items
    pub fn with_supported_diagnostics(mut self, items: Vec<String>) -> Self {
        self.supported_diagnostics = items;
        self
    }

    /// Key identifying this vehicle on the bus (case-sensitive)
    pub fn instance_key(&self) -> &str {
        &self.vin
    }

    /// `"{year} {make} {model}"`
    pub fn display_name(&self) -> String {
        format!("{} {} {}", self.year, self.make, self.model)
    }

    /// Build from a raw `vehicles.vehicle[]` record.
    ///
    /// The VIN is required; `year` may be a string or a number.
    pub fn from_record(record: &Value) -> Option<Self> {
        let text = |field: &str| {
            record
                .get(field)
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string()
        };

        let vin = record.get("vin").and_then(Value::as_str)?;
        let year = match record.get("year") {
            Some(Value::Number(n)) => n.as_u64().and_then(|y| u16::try_from(y).ok()),
            Some(Value::String(s)) => s.trim().parse().ok(),
            _ => None,
        }
        .unwrap_or_default();

        Some(
            Self::new(text("make"), text("model"), vin, year)
                .with_supported_diagnostics(supported_diagnostics(record)),
        )
    }
}

impl std::fmt::Display for VehicleIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.display_name(), self.vin)
    }
}

/// Items listed under the vehicle's `diagnostics` command capability
fn supported_diagnostics(record: &Value) -> Vec<String> {
    record
        .pointer("/commands/command")
        .and_then(Value::as_array)
        .and_then(|commands| {
            commands
                .iter()
                .find(|c| c.get("name").and_then(Value::as_str) == Some("diagnostics"))
        })
        .and_then(|c| c.pointer("/commandData/supportedDiagnostics/supportedDiagnostic"))
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(String::from)
                .collect()
        })
        .unwrap_or_default()
}

/// Vehicle position reported by a location command
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
}

impl Location {
    /// Build from a raw `{lat, long}` record; coordinates may be strings.
    pub fn from_record(record: &Value) -> Option<Self> {
        let coordinate = |field: &str| match record.get(field)? {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        };

        Some(Self {
            latitude: coordinate("lat")?,
            longitude: coordinate("long")?,
        })
    }
}

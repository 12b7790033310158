//! Diagnostic reading models
//!
//! Built once per poll from the account's diagnostics reply and discarded
//! at the end of the cycle.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use telebridge_conv::normalize_unit;
use tracing::warn;

/// Message used when the source reading carries none
pub const DEFAULT_MESSAGE: &str = "na";

/// One scalar or boolean reading within a [`Diagnostic`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiagnosticElement {
    /// Raw vehicle-system identifier (e.g. "AMBIENT AIR TEMPERATURE")
    pub name: String,
    /// Raw value as reported; `None` when the record was unreadable
    pub value: Option<String>,
    /// Normalized unit (e.g. "°C", "km"); absent for on/off readings
    pub unit: Option<String>,
    /// Status qualifier, `"na"` when absent
    pub message: String,
}

impl DiagnosticElement {
    pub fn new(
        name: impl Into<String>,
        value: Option<String>,
        unit: Option<String>,
        message: Option<String>,
    ) -> Self {
        Self {
            name: name.into(),
            value,
            unit: unit.map(|u| normalize_unit(&u).to_string()),
            message: message.unwrap_or_else(|| DEFAULT_MESSAGE.to_string()),
        }
    }

    /// Build from a raw `diagnosticElement` record.
    ///
    /// Returns `None` only when the record has no name; any other malformed
    /// field degrades to `value = None` / `message = "na"`.
    pub fn from_record(record: &Value) -> Option<Self> {
        let name = record.get("name").and_then(Value::as_str)?;
        let value = match record.get("value") {
            Some(Value::String(s)) => Some(s.clone()),
            Some(Value::Number(n)) => Some(n.to_string()),
            Some(Value::Bool(b)) => Some(b.to_string()),
            _ => None,
        };
        let unit = record
            .get("unit")
            .and_then(Value::as_str)
            .filter(|u| !u.is_empty())
            .map(String::from);
        let message = record
            .get("message")
            .and_then(Value::as_str)
            .filter(|m| !m.is_empty())
            .map(String::from);

        Some(Self::new(name, value, unit, message))
    }
}

/// A named group of related readings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// Group name (e.g. "TIRE PRESSURE")
    pub name: String,
    /// Readings in source order
    pub elements: Vec<DiagnosticElement>,
}

impl Diagnostic {
    pub fn new(name: impl Into<String>, elements: Vec<DiagnosticElement>) -> Self {
        Self {
            name: name.into(),
            elements,
        }
    }

    /// Groups without elements are excluded from publishing
    pub fn has_elements(&self) -> bool {
        !self.elements.is_empty()
    }

    /// Build from a raw `diagnosticResponse` record.
    ///
    /// Nameless element records are skipped with a warning.
    pub fn from_record(record: &Value) -> Option<Self> {
        let name = record.get("name").and_then(Value::as_str)?;
        let elements = record
            .get("diagnosticElement")
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter_map(|item| {
                        let element = DiagnosticElement::from_record(item);
                        if element.is_none() {
                            warn!(diagnostic = %name, "Skipping diagnostic element without a name");
                        }
                        element
                    })
                    .collect()
            })
            .unwrap_or_default();

        Some(Self::new(name, elements))
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({} elements)", self.name, self.elements.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_element_from_record() {
        let element = DiagnosticElement::from_record(&json!({
            "name": "AMBIENT AIR TEMPERATURE",
            "status": "NA",
            "message": "na",
            "value": "15",
            "unit": "Cel"
        }))
        .unwrap();

        assert_eq!(
            element,
            DiagnosticElement {
                name: "AMBIENT AIR TEMPERATURE".to_string(),
                value: Some("15".to_string()),
                unit: Some("°C".to_string()),
                message: "na".to_string(),
            }
        );
    }

    #[test]
    fn test_element_degrades_softly() {
        let element = DiagnosticElement::from_record(&json!({
            "name": "OIL LIFE",
            "value": {"unexpected": true},
            "message": null
        }))
        .unwrap();

        assert_eq!(element.value, None);
        assert_eq!(element.unit, None);
        assert_eq!(element.message, DEFAULT_MESSAGE);
    }

    #[test]
    fn test_numeric_value_is_kept_as_text() {
        let element =
            DiagnosticElement::from_record(&json!({"name": "ODOMETER", "value": 6013.8})).unwrap();
        assert_eq!(element.value.as_deref(), Some("6013.8"));
    }

    #[test]
    fn test_element_without_name() {
        assert!(DiagnosticElement::from_record(&json!({"value": "1"})).is_none());
    }

    #[test]
    fn test_diagnostic_from_record() {
        let diagnostic = Diagnostic::from_record(&json!({
            "name": "FUEL TANK INFO",
            "diagnosticElement": [
                {"name": "FUEL AMOUNT", "value": "19.98", "unit": "L"},
                {"value": "60", "unit": "L"},
                {"name": "FUEL LEVEL", "value": "33.3", "unit": "%"}
            ]
        }))
        .unwrap();

        assert_eq!(diagnostic.name, "FUEL TANK INFO");
        assert_eq!(diagnostic.elements.len(), 2);
        assert!(diagnostic.has_elements());
    }

    #[test]
    fn test_diagnostic_without_elements() {
        let diagnostic = Diagnostic::from_record(&json!({"name": "LAST TRIP DISTANCE"})).unwrap();
        assert!(!diagnostic.has_elements());
        assert_eq!(diagnostic.to_string(), "LAST TRIP DISTANCE (0 elements)");
    }
}

//! Discovery and state payload builder
//!
//! Pure functions from (vehicle, diagnostic, element) to topics and JSON
//! payloads. Nothing here performs I/O, and identical inputs always produce
//! byte-identical payloads.
//!
//! Every element whose unit has a conversion rule yields exactly one
//! secondary element (`ODOMETER` → `ODOMETER MI`) that shares the source
//! element's message and the group's state topic.

use serde::Serialize;
use serde_json::{Map, Value};
use telebridge_conv::{
    attribute_template, canonical_key, classify_sensor_kind, conversion_for, friendly_name,
    resolve_metadata, to_json_number, unique_id, SensorKind,
};
use telebridge_core::{Diagnostic, DiagnosticElement, Location, VehicleIdentity};
use tracing::warn;

use crate::topics::Topics;

/// Value advertised for an online vehicle
pub const PAYLOAD_AVAILABLE: &str = "true";
/// Value advertised for an offline vehicle
pub const PAYLOAD_NOT_AVAILABLE: &str = "false";

/// Device block shared by every entity of one vehicle
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeviceInfo {
    pub identifiers: Vec<String>,
    pub manufacturer: String,
    pub model: u16,
    pub name: String,
}

/// Discovery config for one entity
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConfigPayload {
    pub availability_topic: String,
    pub device: DeviceInfo,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state_class: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device_class: Option<String>,
    pub name: String,
    pub payload_available: String,
    pub payload_not_available: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload_on: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload_off: Option<bool>,
    pub state_topic: String,
    pub unique_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit_of_measurement: Option<String>,
    pub value_template: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub json_attributes_topic: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub json_attributes_template: Option<String>,
}

/// State body published for a located vehicle
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LocationPayload {
    pub latitude: f64,
    pub longitude: f64,
}

impl From<Location> for LocationPayload {
    fn from(location: Location) -> Self {
        Self {
            latitude: location.latitude,
            longitude: location.longitude,
        }
    }
}

/// Builds topics and payloads for one vehicle
#[derive(Debug, Clone)]
pub struct DiscoveryBuilder {
    vehicle: VehicleIdentity,
    topics: Topics,
    name_prefix: String,
}

impl DiscoveryBuilder {
    pub fn new(vehicle: VehicleIdentity, prefix: impl Into<String>) -> Self {
        let topics = Topics::new(prefix, vehicle.instance_key());
        Self {
            vehicle,
            topics,
            name_prefix: String::new(),
        }
    }

    /// Prefix prepended (space separated) to every entity name
    pub fn with_name_prefix(mut self, name_prefix: impl Into<String>) -> Self {
        self.name_prefix = name_prefix.into();
        self
    }

    pub fn vehicle(&self) -> &VehicleIdentity {
        &self.vehicle
    }

    pub fn topics(&self) -> &Topics {
        &self.topics
    }

    /// Config topic for an element
    pub fn config_topic(&self, element: &DiagnosticElement) -> String {
        self.topics.config(&element.name)
    }

    /// State topic for a diagnostic group or command name
    pub fn state_topic(&self, name: &str) -> String {
        self.topics.state(name)
    }

    /// Elements of a group in publishing order, each convertible element
    /// followed by its secondary element
    pub fn entity_elements(diagnostic: &Diagnostic) -> Vec<DiagnosticElement> {
        let mut elements = Vec::with_capacity(diagnostic.elements.len() * 2);
        for element in &diagnostic.elements {
            if canonical_key(&element.name).is_empty() {
                warn!(diagnostic = %diagnostic.name, element = ?element.name, "Skipping element without a usable name");
                continue;
            }
            elements.push(element.clone());
            if let Some(secondary) = secondary_element(element) {
                elements.push(secondary);
            }
        }
        elements
    }

    /// Discovery config for one element of a group
    pub fn config_payload(
        &self,
        diagnostic: &Diagnostic,
        element: &DiagnosticElement,
    ) -> ConfigPayload {
        let key = canonical_key(&element.name);
        let kind = classify_sensor_kind(&element.name);
        // Decided from the unit so a config built from a missing first
        // reading matches one built from a later numeric reading
        let measured = element.unit.as_deref().is_some_and(|u| !u.trim().is_empty());
        let metadata = resolve_metadata(&key, kind, measured);
        let state_topic = self.state_topic(&diagnostic.name);
        let binary = kind == SensorKind::BinarySensor;

        let name = friendly_name(&element.name);
        let name = if self.name_prefix.is_empty() {
            name
        } else {
            format!("{} {}", self.name_prefix, name)
        };

        ConfigPayload {
            availability_topic: self.topics.availability(),
            device: DeviceInfo {
                identifiers: vec![self.vehicle.vin.clone()],
                manufacturer: self.vehicle.make.clone(),
                model: self.vehicle.year,
                name: self.vehicle.display_name(),
            },
            state_class: metadata.state_class.map(String::from),
            device_class: metadata.device_class.map(String::from),
            name,
            payload_available: PAYLOAD_AVAILABLE.to_string(),
            payload_not_available: PAYLOAD_NOT_AVAILABLE.to_string(),
            payload_on: binary.then_some(true),
            payload_off: binary.then_some(false),
            unique_id: unique_id(&self.vehicle.vin, &key),
            unit_of_measurement: if binary { None } else { element.unit.clone() },
            value_template: format!("{{{{ value_json.{} }}}}", key),
            json_attributes_topic: metadata.attribute.map(|_| state_topic.clone()),
            json_attributes_template: metadata
                .attribute
                .map(|attribute| attribute_template(attribute, &key)),
            state_topic,
        }
    }

    /// State body for a group: `{key: value, key_message: message}` for
    /// every element and secondary element
    ///
    /// Elements with no readable value still publish their `_message`.
    /// Duplicate keys resolve to the last element.
    pub fn state_payload(diagnostic: &Diagnostic) -> Map<String, Value> {
        let mut state = Map::new();
        for element in Self::entity_elements(diagnostic) {
            let key = canonical_key(&element.name);
            if let Some(value) = element.value.as_deref() {
                state.insert(key.clone(), coerce_value(value));
            }
            state.insert(format!("{}_message", key), Value::String(element.message));
        }
        state
    }
}

/// `"true"`/`"false"` (any case) become booleans, numeric text becomes a
/// number, anything else stays a string
pub fn coerce_value(raw: &str) -> Value {
    let trimmed = raw.trim();
    if trimmed.eq_ignore_ascii_case("true") {
        return Value::Bool(true);
    }
    if trimmed.eq_ignore_ascii_case("false") {
        return Value::Bool(false);
    }
    match trimmed.parse::<f64>() {
        Ok(number) if number.is_finite() => to_json_number(number),
        _ => Value::String(raw.to_string()),
    }
}

fn secondary_element(element: &DiagnosticElement) -> Option<DiagnosticElement> {
    let rule = conversion_for(element.unit.as_deref()?)?;
    let value = element
        .value
        .as_deref()
        .and_then(|v| v.trim().parse::<f64>().ok())
        .filter(|v| v.is_finite())
        .map(|v| to_json_number(rule.apply(v)).to_string());

    Some(DiagnosticElement::new(
        format!("{} {}", element.name, rule.name_suffix()),
        value,
        Some(rule.to_unit.to_string()),
        Some(element.message.clone()),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn builder() -> DiscoveryBuilder {
        DiscoveryBuilder::new(VehicleIdentity::new("foo", "bar", "XXX", 2020), "homeassistant")
    }

    fn element(name: &str, value: &str, unit: Option<&str>, message: &str) -> DiagnosticElement {
        DiagnosticElement::new(
            name,
            Some(value.to_string()),
            unit.map(String::from),
            Some(message.to_string()),
        )
    }

    fn device() -> Value {
        json!({
            "identifiers": ["XXX"],
            "manufacturer": "foo",
            "model": 2020,
            "name": "2020 foo bar"
        })
    }

    fn ambient() -> Diagnostic {
        Diagnostic::new(
            "AMBIENT AIR TEMPERATURE",
            vec![element("AMBIENT AIR TEMPERATURE", "15", Some("Cel"), "na")],
        )
    }

    #[test]
    fn test_secondary_elements() {
        let elements = DiscoveryBuilder::entity_elements(&ambient());
        assert_eq!(elements.len(), 2);
        assert_eq!(elements[1].name, "AMBIENT AIR TEMPERATURE F");
        assert_eq!(elements[1].value.as_deref(), Some("59"));
        assert_eq!(elements[1].unit.as_deref(), Some("°F"));
        assert_eq!(elements[1].message, "na");
    }

    #[test]
    fn test_sensor_config_payloads() {
        let b = builder();
        let d = ambient();
        let elements = DiscoveryBuilder::entity_elements(&d);

        assert_eq!(
            serde_json::to_value(b.config_payload(&d, &elements[0])).unwrap(),
            json!({
                "availability_topic": "homeassistant/XXX/available",
                "device": device(),
                "state_class": "measurement",
                "device_class": "temperature",
                "name": "Ambient Air Temperature",
                "payload_available": "true",
                "payload_not_available": "false",
                "state_topic": "homeassistant/sensor/XXX/ambient_air_temperature/state",
                "unique_id": "xxx-ambient-air-temperature",
                "unit_of_measurement": "°C",
                "value_template": "{{ value_json.ambient_air_temperature }}"
            })
        );
        assert_eq!(
            serde_json::to_value(b.config_payload(&d, &elements[1])).unwrap(),
            json!({
                "availability_topic": "homeassistant/XXX/available",
                "device": device(),
                "state_class": "measurement",
                "device_class": "temperature",
                "name": "Ambient Air Temperature F",
                "payload_available": "true",
                "payload_not_available": "false",
                "state_topic": "homeassistant/sensor/XXX/ambient_air_temperature/state",
                "unique_id": "xxx-ambient-air-temperature-f",
                "unit_of_measurement": "°F",
                "value_template": "{{ value_json.ambient_air_temperature_f }}"
            })
        );
    }

    #[test]
    fn test_sensor_state_payload() {
        assert_eq!(
            Value::Object(DiscoveryBuilder::state_payload(&ambient())),
            json!({
                "ambient_air_temperature": 15,
                "ambient_air_temperature_message": "na",
                "ambient_air_temperature_f": 59,
                "ambient_air_temperature_f_message": "na"
            })
        );
    }

    #[test]
    fn test_odometer_secondary_config() {
        let b = builder();
        let d = Diagnostic::new("ODOMETER", vec![element("ODOMETER", "6013.8", Some("KM"), "na")]);
        let elements = DiscoveryBuilder::entity_elements(&d);
        let config = b.config_payload(&d, &elements[1]);

        assert_eq!(config.name, "Odometer Mi");
        assert_eq!(config.unique_id, "xxx-odometer-mi");
        assert_eq!(config.state_class.as_deref(), Some("total_increasing"));
        assert_eq!(config.device_class.as_deref(), Some("distance"));
        assert_eq!(config.unit_of_measurement.as_deref(), Some("mi"));
        assert_eq!(config.state_topic, "homeassistant/sensor/XXX/odometer/state");
        assert_eq!(
            Value::Object(DiscoveryBuilder::state_payload(&d)),
            json!({
                "odometer": 6013.8,
                "odometer_message": "na",
                "odometer_mi": 3736.8,
                "odometer_mi_message": "na"
            })
        );
    }

    #[test]
    fn test_binary_sensor_payloads() {
        let b = builder();
        let d = Diagnostic::new(
            "EV CHARGE STATE",
            vec![
                element("EV CHARGE STATE", "false", None, "charging_complete"),
                element("PRIORITY CHARGE INDICATOR", "FALSE", None, "na"),
                element("PRIORITY CHARGE STATUS", "false", None, "na"),
            ],
        );

        assert_eq!(
            serde_json::to_value(b.config_payload(&d, &d.elements[1])).unwrap(),
            json!({
                "availability_topic": "homeassistant/XXX/available",
                "device": device(),
                "name": "Priority Charge Indicator",
                "payload_available": "true",
                "payload_not_available": "false",
                "payload_on": true,
                "payload_off": false,
                "state_topic": "homeassistant/binary_sensor/XXX/ev_charge_state/state",
                "unique_id": "xxx-priority-charge-indicator",
                "value_template": "{{ value_json.priority_charge_indicator }}"
            })
        );
        assert_eq!(
            Value::Object(DiscoveryBuilder::state_payload(&d)),
            json!({
                "ev_charge_state": false,
                "ev_charge_state_message": "charging_complete",
                "priority_charge_indicator": false,
                "priority_charge_indicator_message": "na",
                "priority_charge_status": false,
                "priority_charge_status_message": "na"
            })
        );
    }

    #[test]
    fn test_plug_state_keeps_device_class() {
        let b = builder();
        let d = Diagnostic::new(
            "EV PLUG STATE",
            vec![element("EV PLUG STATE", "true", None, "plugged")],
        );
        let config = b.config_payload(&d, &d.elements[0]);

        assert_eq!(config.device_class.as_deref(), Some("plug"));
        assert_eq!(config.state_class, None);
        assert_eq!(config.unit_of_measurement, None);
        assert_eq!(config.name, "Ev Plug State");
    }

    #[test]
    fn test_attribute_templates() {
        let b = builder();
        let tires = Diagnostic::new(
            "TIRE PRESSURE",
            vec![
                element("TIRE PRESSURE LF", "240.0", Some("KPa"), "YELLOW"),
                element("TIRE PRESSURE RR", "238.0", Some("KPa"), "GREEN"),
            ],
        );

        let lf = b.config_payload(&tires, &tires.elements[0]);
        assert_eq!(lf.name, "Tire Pressure: Left Front");
        assert_eq!(lf.unit_of_measurement.as_deref(), Some("kPa"));
        assert_eq!(
            lf.json_attributes_topic.as_deref(),
            Some("homeassistant/sensor/XXX/tire_pressure/state")
        );
        assert_eq!(
            lf.json_attributes_template.as_deref(),
            Some("{{ {'recommendation': value_json.tire_pressure_placard_front, 'message': value_json.tire_pressure_lf_message} | tojson }}")
        );

        let rr = b.config_payload(&tires, &tires.elements[1]);
        assert_eq!(rr.name, "Tire Pressure: Right Rear");
        assert_eq!(
            rr.json_attributes_template.as_deref(),
            Some("{{ {'recommendation': value_json.tire_pressure_placard_rear, 'message': value_json.tire_pressure_rr_message} | tojson }}")
        );

        let oil = Diagnostic::new("OIL LIFE", vec![element("OIL LIFE", "72", Some("%"), "na")]);
        let config = b.config_payload(&oil, &oil.elements[0]);
        assert_eq!(config.device_class, None);
        assert_eq!(config.state_class.as_deref(), Some("measurement"));
        assert_eq!(
            config.json_attributes_template.as_deref(),
            Some("{{ {'message': value_json.oil_life_message} | tojson }}")
        );
    }

    #[test]
    fn test_fuel_tank_state_payload() {
        let d = Diagnostic::new(
            "FUEL TANK INFO",
            vec![
                element("FUEL AMOUNT", "19.98", Some("L"), "na"),
                element("FUEL CAPACITY", "60", Some("L"), "na"),
                element("FUEL LEVEL", "33.3", Some("%"), "na"),
                element("FUEL LEVEL IN GAL", "19.98", Some("L"), "na"),
            ],
        );

        assert_eq!(
            Value::Object(DiscoveryBuilder::state_payload(&d)),
            json!({
                "fuel_amount": 19.98,
                "fuel_amount_gal": 5.3,
                "fuel_amount_gal_message": "na",
                "fuel_amount_message": "na",
                "fuel_capacity": 60,
                "fuel_capacity_gal": 15.9,
                "fuel_capacity_gal_message": "na",
                "fuel_capacity_message": "na",
                "fuel_level": 33.3,
                "fuel_level_in_gal": 19.98,
                "fuel_level_in_gal_gal": 5.3,
                "fuel_level_in_gal_gal_message": "na",
                "fuel_level_in_gal_message": "na",
                "fuel_level_message": "na"
            })
        );

        let config = builder().config_payload(&d, &d.elements[2]);
        assert_eq!(config.name, "Fuel Level");
        assert_eq!(config.device_class, None);
        assert_eq!(config.state_class.as_deref(), Some("measurement"));
    }

    #[test]
    fn test_fuel_economy_conversion() {
        let d = Diagnostic::new(
            "LIFETIME FUEL ECON",
            vec![element("LIFETIME FUEL ECON", "11.86", Some("kmple"), "na")],
        );
        let config = builder().config_payload(&d, &d.elements[0]);
        assert_eq!(config.unit_of_measurement.as_deref(), Some("km/L"));
        assert_eq!(
            Value::Object(DiscoveryBuilder::state_payload(&d)),
            json!({
                "lifetime_fuel_econ": 11.86,
                "lifetime_fuel_econ_message": "na",
                "lifetime_fuel_econ_mpg": 27.9,
                "lifetime_fuel_econ_mpg_message": "na"
            })
        );
    }

    #[test]
    fn test_unreadable_value_keeps_message() {
        let d = Diagnostic::new(
            "OIL LIFE",
            vec![DiagnosticElement::new("OIL LIFE", None, Some("%".to_string()), None)],
        );
        assert_eq!(
            Value::Object(DiscoveryBuilder::state_payload(&d)),
            json!({"oil_life_message": "na"})
        );
    }

    #[test]
    fn test_unknown_keys_fall_back() {
        let b = builder();
        let d = Diagnostic::new(
            "EV SCHEDULED CHARGE START",
            vec![
                element("SCHED CHG START", "Tue 00:00", None, "na"),
                element("EV RANGE REMAINING", "312", Some("km"), "na"),
            ],
        );

        let text = b.config_payload(&d, &d.elements[0]);
        assert_eq!(text.state_class, None);
        assert_eq!(text.device_class, None);

        let numeric = b.config_payload(&d, &d.elements[1]);
        assert_eq!(numeric.state_class.as_deref(), Some("measurement"));
        assert_eq!(numeric.device_class, None);
    }

    #[test]
    fn test_fallback_state_class_ignores_first_reading() {
        let b = builder();
        let d = Diagnostic::new(
            "EV RANGE",
            vec![
                element("EV RANGE REMAINING", "--", Some("km"), "na"),
                DiagnosticElement::new("EV RANGE ESTIMATE", None, Some("km".to_string()), None),
                element("EV RANGE MODE", "12", None, "na"),
            ],
        );

        let placeholder = b.config_payload(&d, &d.elements[0]);
        assert_eq!(placeholder.state_class.as_deref(), Some("measurement"));
        let missing = b.config_payload(&d, &d.elements[1]);
        assert_eq!(missing.state_class.as_deref(), Some("measurement"));
        let unitless = b.config_payload(&d, &d.elements[2]);
        assert_eq!(unitless.state_class, None);
    }

    #[test]
    fn test_name_prefix() {
        let b = builder().with_name_prefix("Bolt");
        let d = ambient();
        assert_eq!(
            b.config_payload(&d, &d.elements[0]).name,
            "Bolt Ambient Air Temperature"
        );
    }

    #[test]
    fn test_config_is_deterministic() {
        let b = builder();
        let d = ambient();
        let first = serde_json::to_vec(&b.config_payload(&d, &d.elements[0])).unwrap();
        let second = serde_json::to_vec(&b.config_payload(&d, &d.elements[0])).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_coerce_value() {
        assert_eq!(coerce_value("TRUE"), json!(true));
        assert_eq!(coerce_value("false"), json!(false));
        assert_eq!(coerce_value("240.0"), json!(240));
        assert_eq!(coerce_value("-79.38"), json!(-79.38));
        assert_eq!(coerce_value("Tue 00:00"), json!("Tue 00:00"));
        assert_eq!(coerce_value("NaN"), json!("NaN"));
    }
}

//! Entity metadata table
//!
//! Maps a canonical key to the device class, state class and optional JSON
//! attributes an automation platform should register for it. Secondary
//! (converted) readings inherit the classes of their source reading but
//! never its attributes. Keys absent from the table fall back to:
//!
//! - `sensor` with a unit of measurement → `state_class = "measurement"`,
//!   no device class
//! - anything else → no classes

use crate::classify::SensorKind;
use crate::units::CONVERSIONS;

/// Companion JSON attributes published alongside a reading
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributeRule {
    /// Surface the reading's status message
    Message,
    /// Surface a recommended value (another key in the same state payload)
    /// and the reading's status message
    Recommendation { key: &'static str },
}

/// Classes and attributes for one entity
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetadataRule {
    pub device_class: Option<&'static str>,
    pub state_class: Option<&'static str>,
    pub attribute: Option<AttributeRule>,
}

const MEASUREMENT: Option<&str> = Some("measurement");
const TOTAL_INCREASING: Option<&str> = Some("total_increasing");

const fn rule(device_class: Option<&'static str>, state_class: Option<&'static str>) -> MetadataRule {
    MetadataRule {
        device_class,
        state_class,
        attribute: None,
    }
}

const fn tire_pressure(placard: &'static str) -> MetadataRule {
    MetadataRule {
        device_class: Some("pressure"),
        state_class: MEASUREMENT,
        attribute: Some(AttributeRule::Recommendation { key: placard }),
    }
}

static METADATA: &[(&str, MetadataRule)] = &[
    ("ambient_air_temperature", rule(Some("temperature"), MEASUREMENT)),
    ("odometer", rule(Some("distance"), TOTAL_INCREASING)),
    ("fuel_amount", rule(Some("volume_storage"), MEASUREMENT)),
    ("fuel_capacity", rule(Some("volume_storage"), MEASUREMENT)),
    ("fuel_level", rule(None, MEASUREMENT)),
    ("lifetime_fuel_econ", rule(None, MEASUREMENT)),
    ("lifetime_fuel_used", rule(Some("volume"), TOTAL_INCREASING)),
    ("lifetime_energy_used", rule(Some("energy"), TOTAL_INCREASING)),
    ("ev_battery_level", rule(Some("battery"), MEASUREMENT)),
    ("ev_range", rule(Some("distance"), MEASUREMENT)),
    ("interm_volt_batt_volt", rule(Some("voltage"), MEASUREMENT)),
    ("ev_plug_state", rule(Some("plug"), None)),
    ("ev_charge_state", rule(Some("battery_charging"), None)),
    (
        "oil_life",
        MetadataRule {
            device_class: None,
            state_class: MEASUREMENT,
            attribute: Some(AttributeRule::Message),
        },
    ),
    ("tire_pressure_lf", tire_pressure("tire_pressure_placard_front")),
    ("tire_pressure_rf", tire_pressure("tire_pressure_placard_front")),
    ("tire_pressure_lr", tire_pressure("tire_pressure_placard_rear")),
    ("tire_pressure_rr", tire_pressure("tire_pressure_placard_rear")),
    ("tire_pressure_placard_front", rule(Some("pressure"), MEASUREMENT)),
    ("tire_pressure_placard_rear", rule(Some("pressure"), MEASUREMENT)),
];

/// Look up the table entry for a canonical key.
///
/// Keys carrying a conversion suffix (`odometer_mi`) resolve to their source
/// key's entry with the attribute removed.
pub fn metadata_for(key: &str) -> Option<MetadataRule> {
    if let Some((_, rule)) = METADATA.iter().find(|(k, _)| *k == key) {
        return Some(*rule);
    }

    CONVERSIONS
        .iter()
        .filter_map(|conversion| key.strip_suffix(conversion.suffix))
        .find_map(|base| METADATA.iter().find(|(k, _)| *k == base))
        .map(|(_, rule)| MetadataRule {
            attribute: None,
            ..*rule
        })
}

/// Resolve metadata for an entity, applying the fallback rule.
///
/// `measured` is whether the entity reports a unit. Binary sensors never
/// carry a state class.
pub fn resolve_metadata(key: &str, kind: SensorKind, measured: bool) -> MetadataRule {
    let rule = metadata_for(key).unwrap_or(MetadataRule {
        state_class: if measured && kind == SensorKind::Sensor {
            MEASUREMENT
        } else {
            None
        },
        ..MetadataRule::default()
    });

    match kind {
        SensorKind::BinarySensor => MetadataRule {
            state_class: None,
            ..rule
        },
        _ => rule,
    }
}

/// JSON-attributes template for a reading published under `key`
pub fn attribute_template(attribute: AttributeRule, key: &str) -> String {
    match attribute {
        AttributeRule::Message => {
            format!("{{{{ {{'message': value_json.{}_message}} | tojson }}}}", key)
        }
        AttributeRule::Recommendation { key: recommended } => format!(
            "{{{{ {{'recommendation': value_json.{}, 'message': value_json.{}_message}} | tojson }}}}",
            recommended, key
        ),
    }
}

//! Naming rules for topics, payload keys and display names

/// Display names that do not follow the start-case rule, keyed by canonical key
static FRIENDLY_NAME_OVERRIDES: &[(&str, &str)] = &[
    ("tire_pressure_lf", "Tire Pressure: Left Front"),
    ("tire_pressure_lr", "Tire Pressure: Left Rear"),
    ("tire_pressure_rf", "Tire Pressure: Right Front"),
    ("tire_pressure_rr", "Tire Pressure: Right Rear"),
];

/// Characters with a meaning in MQTT topic names
const TOPIC_RESERVED: [char; 4] = ['/', '+', '#', '\0'];

/// Snake-case key used in topics and JSON payload fields.
///
/// Whitespace runs collapse to a single `_` and the result is lower-cased:
/// `"AMBIENT AIR TEMPERATURE"` → `ambient_air_temperature`. Topic-reserved
/// characters count as whitespace, so the key is always a single topic level.
pub fn canonical_key(name: &str) -> String {
    name.split(|c: char| c.is_whitespace() || TOPIC_RESERVED.contains(&c))
        .filter(|word| !word.is_empty())
        .collect::<Vec<_>>()
        .join("_")
        .to_lowercase()
}

/// Human-readable entity name: `"EV PLUG STATE"` → `Ev Plug State`
pub fn friendly_name(name: &str) -> String {
    let key = canonical_key(name);
    if let Some((_, name)) = FRIENDLY_NAME_OVERRIDES.iter().find(|(k, _)| *k == key) {
        return (*name).to_string();
    }

    name.split(|c: char| !c.is_alphanumeric())
        .filter(|word| !word.is_empty())
        .map(|word| {
            let lower = word.to_lowercase();
            let mut chars = lower.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Discovery `unique_id`: `{vin-lowercase}-{key-with-dashes}`
pub fn unique_id(vin: &str, key: &str) -> String {
    format!("{}-{}", vin.to_lowercase(), key.replace('_', "-"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_key() {
        assert_eq!(canonical_key("foo bar"), "foo_bar");
        assert_eq!(canonical_key("foo bar bazz"), "foo_bar_bazz");
        assert_eq!(canonical_key("FOO BAR"), "foo_bar");
        assert_eq!(canonical_key("FOO BAR bazz"), "foo_bar_bazz");
        assert_eq!(canonical_key("  AMBIENT   AIR\tTEMPERATURE "), "ambient_air_temperature");
        assert_eq!(canonical_key("getLocation"), "getlocation");
    }

    #[test]
    fn test_canonical_key_is_one_topic_level() {
        assert_eq!(canonical_key("TIRE PRESSURE #1"), "tire_pressure_1");
        assert_eq!(canonical_key("FUEL+OIL"), "fuel_oil");
        assert_eq!(canonical_key("KM/H AVG"), "km_h_avg");
        assert_eq!(canonical_key("BATT\0 TEMP"), "batt_temp");
        assert_eq!(canonical_key("# +"), "");
    }

    #[test]
    fn test_friendly_name() {
        assert_eq!(friendly_name("foo bar"), "Foo Bar");
        assert_eq!(friendly_name("FOO BAR"), "Foo Bar");
        assert_eq!(
            friendly_name("AMBIENT AIR TEMPERATURE F"),
            "Ambient Air Temperature F"
        );
        assert_eq!(friendly_name("ODOMETER MI"), "Odometer Mi");
    }

    #[test]
    fn test_friendly_name_overrides() {
        assert_eq!(friendly_name("TIRE PRESSURE LF"), "Tire Pressure: Left Front");
        assert_eq!(friendly_name("TIRE PRESSURE RR"), "Tire Pressure: Right Rear");
        assert_eq!(
            friendly_name("TIRE PRESSURE PLACARD FRONT"),
            "Tire Pressure Placard Front"
        );
    }

    #[test]
    fn test_unique_id() {
        assert_eq!(
            unique_id("XXX", "ambient_air_temperature_f"),
            "xxx-ambient-air-temperature-f"
        );
    }
}

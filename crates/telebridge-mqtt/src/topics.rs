//! Topic grammar
//!
//! All topics live under the discovery prefix and carry the VIN verbatim:
//!
//! | Topic | Layout |
//! |-------|--------|
//! | availability | `{prefix}/{vin}/available` |
//! | command | `{prefix}/{vin}/command` |
//! | polling status | `{prefix}/{vin}/polling_status` |
//! | refresh interval | `{prefix}/{vin}/refresh_interval` |
//! | refresh interval (current) | `{prefix}/{vin}/refresh_interval_current_val` |
//! | device tracker config | `{prefix}/device_tracker/{vin}/config` |
//! | entity config | `{prefix}/{kind}/{vin}/{key}/config` |
//! | entity state | `{prefix}/{kind}/{vin}/{key}/state` |
//!
//! `kind` and `key` are derived from the reading name, so the same name
//! always maps to the same topic.

use telebridge_conv::{canonical_key, classify_sensor_kind};

/// Default discovery prefix
pub const DEFAULT_PREFIX: &str = "homeassistant";

/// Topic builder for one vehicle
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Topics {
    prefix: String,
    vin: String,
}

impl Topics {
    pub fn new(prefix: impl Into<String>, vin: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            vin: vin.into(),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn vin(&self) -> &str {
        &self.vin
    }

    fn vehicle_topic(&self, leaf: &str) -> String {
        format!("{}/{}/{}", self.prefix, self.vin, leaf)
    }

    fn entity_topic(&self, name: &str, leaf: &str) -> String {
        format!(
            "{}/{}/{}/{}/{}",
            self.prefix,
            classify_sensor_kind(name),
            self.vin,
            canonical_key(name),
            leaf
        )
    }

    pub fn availability(&self) -> String {
        self.vehicle_topic("available")
    }

    pub fn command(&self) -> String {
        self.vehicle_topic("command")
    }

    pub fn polling_status(&self) -> String {
        self.vehicle_topic("polling_status")
    }

    pub fn refresh_interval(&self) -> String {
        self.vehicle_topic("refresh_interval")
    }

    pub fn refresh_interval_current_val(&self) -> String {
        self.vehicle_topic("refresh_interval_current_val")
    }

    pub fn device_tracker_config(&self) -> String {
        format!("{}/device_tracker/{}/config", self.prefix, self.vin)
    }

    /// Discovery config topic for a reading
    pub fn config(&self, name: &str) -> String {
        self.entity_topic(name, "config")
    }

    /// State topic for a diagnostic group (or a command result)
    pub fn state(&self, name: &str) -> String {
        self.entity_topic(name, "state")
    }

    /// Per-command status topic: `{command topic}/{command}/state`
    pub fn command_status(&self, command: &str) -> String {
        format!("{}/{}/state", self.command(), command)
    }
}

/// `{base}/state` for polling-status heartbeats
pub fn polling_state(base: &str) -> String {
    format!("{}/state", base)
}

/// `{base}/lastpollsuccessful` for polling-status heartbeats
pub fn polling_last_successful(base: &str) -> String {
    format!("{}/lastpollsuccessful", base)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn topics() -> Topics {
        Topics::new(DEFAULT_PREFIX, "XXX")
    }

    #[test]
    fn test_vehicle_topics() {
        let t = topics();
        assert_eq!(t.availability(), "homeassistant/XXX/available");
        assert_eq!(t.command(), "homeassistant/XXX/command");
        assert_eq!(t.polling_status(), "homeassistant/XXX/polling_status");
        assert_eq!(t.refresh_interval(), "homeassistant/XXX/refresh_interval");
        assert_eq!(
            t.refresh_interval_current_val(),
            "homeassistant/XXX/refresh_interval_current_val"
        );
        assert_eq!(
            t.device_tracker_config(),
            "homeassistant/device_tracker/XXX/config"
        );
    }

    #[test]
    fn test_entity_topics() {
        let t = topics();
        assert_eq!(
            t.config("AMBIENT AIR TEMPERATURE"),
            "homeassistant/sensor/XXX/ambient_air_temperature/config"
        );
        assert_eq!(
            t.state("AMBIENT AIR TEMPERATURE"),
            "homeassistant/sensor/XXX/ambient_air_temperature/state"
        );
        assert_eq!(
            t.config("EV CHARGE STATE"),
            "homeassistant/binary_sensor/XXX/ev_charge_state/config"
        );
        assert_eq!(
            t.state("PRIORITY CHARGE INDICATOR"),
            "homeassistant/binary_sensor/XXX/priority_charge_indicator/state"
        );
        assert_eq!(
            t.state("getLocation"),
            "homeassistant/device_tracker/XXX/getlocation/state"
        );
    }

    #[test]
    fn test_topics_are_stable_and_distinct() {
        let t = topics();
        assert_eq!(t.config("ODOMETER"), t.config("ODOMETER"));
        assert_ne!(t.config("ODOMETER"), t.config("ODOMETER MI"));
        assert_ne!(
            Topics::new(DEFAULT_PREFIX, "AAA").config("ODOMETER"),
            t.config("ODOMETER")
        );
    }

    #[test]
    fn test_status_topics() {
        let t = topics();
        assert_eq!(
            t.command_status("startVehicle"),
            "homeassistant/XXX/command/startVehicle/state"
        );
        assert_eq!(
            polling_state(&t.polling_status()),
            "homeassistant/XXX/polling_status/state"
        );
        assert_eq!(
            polling_last_successful(&t.polling_status()),
            "homeassistant/XXX/polling_status/lastpollsuccessful"
        );
    }
}

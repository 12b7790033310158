//! telebridged - Vehicle telematics to MQTT bridge daemon
//!
//! Library half of the daemon: configuration loading and the bridge
//! lifecycle. The binary wires these to logging, the account API and
//! signal handling.

pub mod bridge;
pub mod config;

pub use bridge::{select_vehicle, Bridge};
pub use config::{AccountConfig, Args, BridgeConfig, LogFormat, MqttConfig, VehicleConfig};

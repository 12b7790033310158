//! telebridge-mqtt - Home-automation MQTT surface for the telematics bridge
//!
//! Turns vehicle diagnostics into self-describing MQTT entities and remote
//! command requests into account API calls:
//!
//! - [`Topics`] / [`DiscoveryBuilder`] - topic grammar plus discovery config
//!   and state payloads (pure, no I/O)
//! - [`PublishCycle`] - one polling round: fetch, build, publish, heartbeat
//! - [`CommandDispatcher`] - command topic listener with status reporting
//! - [`MqttBus`] - rumqttc-backed [`BusClient`] with birth and last-will
//!   availability messages
//!
//! # Topic Layout
//!
//! ```text
//! homeassistant/
//! ├── {vin}/available                         "true" / "false" (retained)
//! ├── {vin}/command                           inbound command requests
//! │   └── {command}/state                     command status (retained)
//! ├── {vin}/polling_status/state              polling heartbeat
//! ├── {vin}/polling_status/lastpollsuccessful "true" / "false"
//! └── {kind}/{vin}/{key}/config|state         entities
//! ```

pub mod bus;
pub mod cycle;
pub mod dispatcher;
pub mod error;
pub mod payload;
pub mod testing;
pub mod topics;
pub mod transport;

pub use bus::{BusClient, InboundMessage};
pub use cycle::{polling_success_payload, CycleReport, CycleState, PublishCycle};
pub use dispatcher::{CommandDispatcher, CommandRequest, CommandStatus, DispatchOutcome};
pub use error::{BusError, BusResult, CycleError};
pub use payload::{
    coerce_value, ConfigPayload, DeviceInfo, DiscoveryBuilder, LocationPayload,
    PAYLOAD_AVAILABLE, PAYLOAD_NOT_AVAILABLE,
};
pub use topics::{Topics, DEFAULT_PREFIX};
pub use transport::{MqttBus, MqttSettings};

//! telebridge-conv - Unit conversion and classification rules
//!
//! Static knowledge tables used to turn raw vehicle diagnostic readings into
//! home-automation entities:
//!
//! - **Unit conversions** - metric to imperial pairs producing one secondary
//!   reading per convertible element
//! - **Unit normalization** - vendor unit spellings (`Cel`, `KPa`, `kmple`)
//!   mapped to canonical symbols
//! - **Sensor classification** - `sensor`, `binary_sensor` or `device_tracker`
//!   derived from the reading name
//! - **Entity metadata** - device/state classes and JSON-attribute templates
//!   keyed by canonical key
//!
//! # Quick Start
//!
//! ```rust
//! use telebridge_conv::{canonical_key, classify_sensor_kind, conversion_for, SensorKind};
//!
//! assert_eq!(canonical_key("AMBIENT AIR TEMPERATURE"), "ambient_air_temperature");
//! assert_eq!(classify_sensor_kind("EV PLUG STATE"), SensorKind::BinarySensor);
//!
//! let rule = conversion_for("°C").unwrap();
//! assert_eq!(rule.apply(15.0), 59.0);
//! assert_eq!(rule.suffix, "_f");
//! ```
//!
//! All tables are immutable `static` data; nothing here performs I/O.

pub mod classify;
pub mod error;
pub mod metadata;
pub mod naming;
pub mod precision;
pub mod units;

pub use classify::{classify_sensor_kind, SensorKind, LOCATION_COMMAND};
pub use error::{ConvError, ConvResult};
pub use metadata::{
    attribute_template, metadata_for, resolve_metadata, AttributeRule, MetadataRule,
};
pub use naming::{canonical_key, friendly_name, unique_id};
pub use precision::{round_to_precision, to_json_number};
pub use units::{convert, conversion_for, normalize_unit, ConversionRule, CONVERSIONS};

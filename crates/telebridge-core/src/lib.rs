//! telebridge-core - Core types for the vehicle telematics bridge
//!
//! This crate provides the entity model built from account diagnostics, the
//! account API abstraction the bridge consumes, the remote command registry
//! and the error shape published onto the bus.

pub mod api;
pub mod command;
pub mod error;
pub mod mock;
pub mod models;

pub use api::{ApiReply, VehicleApi};
pub use command::{
    AlertAction, AlertOptions, AlertOverride, ChargeMode, ChargeOverrideMode,
    ChargeOverrideOptions, ChargingProfileOptions, DiagnosticsOptions, DoorOptions, RateType,
    RemoteCommand,
};
pub use error::{
    CommandError, ErrorDetail, ErrorPayload, RequestInfo, ResponseInfo, VehicleError,
    VehicleResult,
};
pub use models::*;

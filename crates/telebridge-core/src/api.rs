//! VehicleApi trait - the account service collaborator
//!
//! The bridge never talks to the vehicle cloud directly. Everything it needs
//! (vehicle list, diagnostics, remote commands) goes through this trait, so a
//! vendor client, the in-memory [`MockVehicleApi`](crate::mock::MockVehicleApi)
//! or a recorded snapshot can sit behind it.
//!
//! Implementations handle authentication and request polling themselves;
//! every method resolves once the vehicle has answered or the request failed.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::command::{
    AlertOptions, ChargeOverrideOptions, ChargingProfileOptions, DiagnosticsOptions, DoorOptions,
};
use crate::error::{VehicleError, VehicleResult};
use crate::models::{Diagnostic, Location, VehicleIdentity};

/// Reply from the account service.
///
/// `data` is the decoded response body; accessors below read the fields the
/// bridge uses and tolerate anything missing or malformed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ApiReply {
    /// Request status as reported by the service (e.g. "success")
    #[serde(default)]
    pub status: Option<String>,
    /// Response body
    #[serde(default)]
    pub data: Value,
}

impl ApiReply {
    pub fn new(status: impl Into<String>, data: Value) -> Self {
        Self {
            status: Some(status.into()),
            data,
        }
    }

    /// Vehicles from `vehicles.vehicle[]`
    pub fn vehicles(&self) -> Vec<VehicleIdentity> {
        self.data
            .pointer("/vehicles/vehicle")
            .and_then(Value::as_array)
            .map(|items| items.iter().filter_map(VehicleIdentity::from_record).collect())
            .unwrap_or_default()
    }

    /// Body of a command reply (`commandResponse.body`)
    pub fn command_body(&self) -> Option<&Value> {
        self.data.pointer("/commandResponse/body")
    }

    /// Diagnostics from `commandResponse.body.diagnosticResponse[]`
    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        self.command_body()
            .and_then(|body| body.get("diagnosticResponse"))
            .and_then(Value::as_array)
            .map(|items| items.iter().filter_map(Diagnostic::from_record).collect())
            .unwrap_or_default()
    }

    /// Whether the reply carries diagnostic telemetry
    pub fn has_diagnostics(&self) -> bool {
        self.command_body()
            .and_then(|body| body.get("diagnosticResponse"))
            .is_some()
    }

    /// Location from `commandResponse.body.location`
    pub fn location(&self) -> Option<Location> {
        self.command_body()
            .and_then(|body| body.get("location"))
            .and_then(Location::from_record)
    }
}

fn not_supported(command: &str) -> VehicleResult<ApiReply> {
    Err(VehicleError::NotSupported(command.to_string()))
}

/// The account service operations the bridge consumes.
///
/// Only the vehicle list and diagnostics are required; remote commands
/// default to `NotSupported` so partial implementations stay small.
#[async_trait]
pub trait VehicleApi: Send + Sync {
    // =========================================================================
    // Account
    // =========================================================================

    /// List vehicles on the account
    async fn account_vehicles(&self) -> VehicleResult<ApiReply>;

    /// Request a diagnostics report
    async fn diagnostics(&self, options: &DiagnosticsOptions) -> VehicleResult<ApiReply>;

    // =========================================================================
    // Remote Commands
    // =========================================================================

    /// Remote engine start
    async fn start(&self) -> VehicleResult<ApiReply> {
        not_supported("startVehicle")
    }

    /// Cancel a remote engine start
    async fn cancel_start(&self) -> VehicleResult<ApiReply> {
        not_supported("cancelStartVehicle")
    }

    /// Sound the horn and/or flash the lights
    async fn alert(&self, _options: &AlertOptions) -> VehicleResult<ApiReply> {
        not_supported("alert")
    }

    /// Stop an active alert
    async fn cancel_alert(&self) -> VehicleResult<ApiReply> {
        not_supported("cancelAlert")
    }

    async fn lock_door(&self, _options: &DoorOptions) -> VehicleResult<ApiReply> {
        not_supported("lockDoor")
    }

    async fn unlock_door(&self, _options: &DoorOptions) -> VehicleResult<ApiReply> {
        not_supported("unlockDoor")
    }

    async fn lock_trunk(&self, _options: &DoorOptions) -> VehicleResult<ApiReply> {
        not_supported("lockTrunk")
    }

    async fn unlock_trunk(&self, _options: &DoorOptions) -> VehicleResult<ApiReply> {
        not_supported("unlockTrunk")
    }

    /// Override the charging schedule (charge now or cancel the override)
    async fn charge_override(&self, _options: &ChargeOverrideOptions) -> VehicleResult<ApiReply> {
        not_supported("chargeOverride")
    }

    async fn get_charging_profile(&self) -> VehicleResult<ApiReply> {
        not_supported("getChargingProfile")
    }

    async fn set_charging_profile(
        &self,
        _options: &ChargingProfileOptions,
    ) -> VehicleResult<ApiReply> {
        not_supported("setChargingProfile")
    }

    /// Locate the vehicle
    async fn location(&self) -> VehicleResult<ApiReply> {
        not_supported("getLocation")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_reply_accessors() {
        let reply = ApiReply::new(
            "success",
            json!({
                "commandResponse": {
                    "body": {
                        "location": {"lat": "43.65", "long": "-79.38"},
                        "diagnosticResponse": [
                            {"name": "ODOMETER", "diagnosticElement": [
                                {"name": "ODOMETER", "value": "6013.8", "unit": "KM"}
                            ]},
                            {"noName": true}
                        ]
                    }
                }
            }),
        );

        assert!(reply.has_diagnostics());
        let diagnostics = reply.diagnostics();
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].elements[0].unit.as_deref(), Some("km"));
        assert_eq!(reply.location().unwrap().latitude, 43.65);
    }

    #[test]
    fn test_empty_reply() {
        let reply = ApiReply::default();
        assert!(reply.vehicles().is_empty());
        assert!(reply.diagnostics().is_empty());
        assert!(reply.location().is_none());
        assert!(!reply.has_diagnostics());
    }

    /// Account that only lists vehicles and reports diagnostics
    struct ReadOnlyAccount;

    #[async_trait]
    impl VehicleApi for ReadOnlyAccount {
        async fn account_vehicles(&self) -> VehicleResult<ApiReply> {
            Ok(ApiReply::new("success", json!({})))
        }

        async fn diagnostics(&self, _options: &DiagnosticsOptions) -> VehicleResult<ApiReply> {
            Ok(ApiReply::new("success", json!({})))
        }
    }

    #[tokio::test]
    async fn test_commands_default_to_not_supported() {
        let api = ReadOnlyAccount;

        let err = api.lock_door(&DoorOptions::default()).await.unwrap_err();
        assert_eq!(err, VehicleError::NotSupported("lockDoor".to_string()));
        let err = api.alert(&AlertOptions::default()).await.unwrap_err();
        assert_eq!(err, VehicleError::NotSupported("alert".to_string()));
        let err = api
            .set_charging_profile(&ChargingProfileOptions::default())
            .await
            .unwrap_err();
        assert_eq!(err, VehicleError::NotSupported("setChargingProfile".to_string()));
        assert!(api.account_vehicles().await.is_ok());
    }
}

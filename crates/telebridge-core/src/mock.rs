//! In-memory account API for testing and offline runs
//!
//! [`MockVehicleApi`] answers every [`VehicleApi`] operation from scripted
//! replies, records each call and can be told to fail individual
//! operations. Replies can be loaded from a snapshot file:
//!
//! ```json
//! {"vehicles": {...}, "diagnostics": {...}, "commands": {"getLocation": {...}}}
//! ```
//!
//! Each value is the response body the account service would have returned
//! for that operation.

use std::collections::HashMap;
use std::path::Path;

use async_trait::async_trait;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::debug;

use crate::api::{ApiReply, VehicleApi};
use crate::command::{
    AlertOptions, ChargeOverrideOptions, ChargingProfileOptions, DiagnosticsOptions, DoorOptions,
};
use crate::error::{VehicleError, VehicleResult};

/// VIN of the vehicle in the built-in sample account
pub const SAMPLE_VIN: &str = "1G1FZ6S02L4100000";

const SAMPLE_ACCOUNT: &str = include_str!("../fixtures/sample_account.json");

const SUCCESS: &str = "success";

/// Recorded account API replies
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub vehicles: Value,
    #[serde(default)]
    pub diagnostics: Value,
    #[serde(default)]
    pub commands: HashMap<String, Value>,
}

/// One recorded call against the mock
#[derive(Debug, Clone, PartialEq)]
pub struct MockCall {
    /// Operation name (`getAccountVehicles`, `alert`, `chargeOverride`, ...)
    pub operation: String,
    /// Options passed to the operation, as JSON
    pub options: Option<Value>,
}

/// Scripted account API
pub struct MockVehicleApi {
    vehicles: RwLock<Value>,
    diagnostics: RwLock<Value>,
    /// Reply bodies for remote commands (operation -> data)
    commands: RwLock<HashMap<String, Value>>,
    /// Injected failures (operation -> error)
    failures: RwLock<HashMap<String, VehicleError>>,
    calls: RwLock<Vec<MockCall>>,
}

impl MockVehicleApi {
    /// Account with no vehicles and an empty diagnostics report
    pub fn new() -> Self {
        Self::from_snapshot(Snapshot::default())
    }

    pub fn from_snapshot(snapshot: Snapshot) -> Self {
        Self {
            vehicles: RwLock::new(snapshot.vehicles),
            diagnostics: RwLock::new(snapshot.diagnostics),
            commands: RwLock::new(snapshot.commands),
            failures: RwLock::new(HashMap::new()),
            calls: RwLock::new(Vec::new()),
        }
    }

    /// Built-in sample account: one 2020 Chevrolet Bolt EV with a full
    /// diagnostics report and a location reply
    pub fn sample() -> VehicleResult<Self> {
        Self::from_json(SAMPLE_ACCOUNT)
    }

    /// Parse a snapshot document
    pub fn from_json(json: &str) -> VehicleResult<Self> {
        let snapshot: Snapshot = serde_json::from_str(json)
            .map_err(|e| VehicleError::Internal(format!("invalid account snapshot: {}", e)))?;
        Ok(Self::from_snapshot(snapshot))
    }

    /// Load a snapshot file
    pub fn load(path: impl AsRef<Path>) -> VehicleResult<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| {
            VehicleError::Internal(format!("failed to read {}: {}", path.display(), e))
        })?;
        Self::from_json(&json)
    }

    /// Replace the diagnostics reply
    pub fn set_diagnostics(&self, data: Value) {
        *self.diagnostics.write() = data;
    }

    /// Set the reply for a remote command operation
    pub fn set_reply(&self, operation: &str, data: Value) {
        self.commands.write().insert(operation.to_string(), data);
    }

    /// Make an operation fail until cleared
    pub fn fail(&self, operation: &str, error: VehicleError) {
        self.failures.write().insert(operation.to_string(), error);
    }

    pub fn clear_failure(&self, operation: &str) {
        self.failures.write().remove(operation);
    }

    /// Calls made so far, oldest first
    pub fn calls(&self) -> Vec<MockCall> {
        self.calls.read().clone()
    }

    /// Number of calls made to one operation
    pub fn call_count(&self, operation: &str) -> usize {
        self.calls
            .read()
            .iter()
            .filter(|c| c.operation == operation)
            .count()
    }

    fn record<T: Serialize>(&self, operation: &str, options: Option<&T>) {
        let options = options.and_then(|o| serde_json::to_value(o).ok());
        debug!(operation, ?options, "Mock account call");
        self.calls.write().push(MockCall {
            operation: operation.to_string(),
            options,
        });
    }

    fn reply(&self, operation: &str, data: Value) -> VehicleResult<ApiReply> {
        match self.failures.read().get(operation) {
            Some(error) => Err(error.clone()),
            None => Ok(ApiReply::new(SUCCESS, data)),
        }
    }

    fn command<T: Serialize>(&self, operation: &str, options: Option<&T>) -> VehicleResult<ApiReply> {
        self.record(operation, options);
        let data = self
            .commands
            .read()
            .get(operation)
            .cloned()
            .unwrap_or_else(|| json!({"commandResponse": {"status": SUCCESS}}));
        self.reply(operation, data)
    }
}

impl Default for MockVehicleApi {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl VehicleApi for MockVehicleApi {
    async fn account_vehicles(&self) -> VehicleResult<ApiReply> {
        self.record::<()>("getAccountVehicles", None);
        let data = self.vehicles.read().clone();
        self.reply("getAccountVehicles", data)
    }

    async fn diagnostics(&self, options: &DiagnosticsOptions) -> VehicleResult<ApiReply> {
        self.record("diagnostics", Some(options));
        let data = self.diagnostics.read().clone();
        self.reply("diagnostics", data)
    }

    async fn start(&self) -> VehicleResult<ApiReply> {
        self.command::<()>("startVehicle", None)
    }

    async fn cancel_start(&self) -> VehicleResult<ApiReply> {
        self.command::<()>("cancelStartVehicle", None)
    }

    async fn alert(&self, options: &AlertOptions) -> VehicleResult<ApiReply> {
        self.command("alert", Some(options))
    }

    async fn cancel_alert(&self) -> VehicleResult<ApiReply> {
        self.command::<()>("cancelAlert", None)
    }

    async fn lock_door(&self, options: &DoorOptions) -> VehicleResult<ApiReply> {
        self.command("lockDoor", Some(options))
    }

    async fn unlock_door(&self, options: &DoorOptions) -> VehicleResult<ApiReply> {
        self.command("unlockDoor", Some(options))
    }

    async fn lock_trunk(&self, options: &DoorOptions) -> VehicleResult<ApiReply> {
        self.command("lockTrunk", Some(options))
    }

    async fn unlock_trunk(&self, options: &DoorOptions) -> VehicleResult<ApiReply> {
        self.command("unlockTrunk", Some(options))
    }

    async fn charge_override(&self, options: &ChargeOverrideOptions) -> VehicleResult<ApiReply> {
        self.command("chargeOverride", Some(options))
    }

    async fn get_charging_profile(&self) -> VehicleResult<ApiReply> {
        self.command::<()>("getChargingProfile", None)
    }

    async fn set_charging_profile(
        &self,
        options: &ChargingProfileOptions,
    ) -> VehicleResult<ApiReply> {
        self.command("setChargingProfile", Some(options))
    }

    async fn location(&self) -> VehicleResult<ApiReply> {
        self.command::<()>("getLocation", None)
    }
}

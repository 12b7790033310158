//! Remote command registry
//!
//! Inbound requests name a command as a string. Names are resolved against a
//! closed set of operations; anything else is rejected with
//! [`CommandError::NotFound`] before the account API is touched.
//!
//! | Name | Account operation | Options |
//! |------|-------------------|---------|
//! | `getAccountVehicles` | `account_vehicles` | - |
//! | `startVehicle` | `start` | - |
//! | `cancelStartVehicle` | `cancel_start` | - |
//! | `alert` | `alert` | [`AlertOptions`] |
//! | `alertFlash` | `alert` (flash only) | [`AlertOptions`] |
//! | `alertHonk` | `alert` (honk only) | [`AlertOptions`] |
//! | `cancelAlert` | `cancel_alert` | - |
//! | `lockDoor` / `unlockDoor` | `lock_door` / `unlock_door` | [`DoorOptions`] |
//! | `lockTrunk` / `unlockTrunk` | `lock_trunk` / `unlock_trunk` | [`DoorOptions`] |
//! | `chargeOverride` | `charge_override` | [`ChargeOverrideOptions`] |
//! | `cancelChargeOverride` | `charge_override` (cancel) | - |
//! | `getChargingProfile` | `get_charging_profile` | - |
//! | `setChargingProfile` | `set_charging_profile` | [`ChargingProfileOptions`] |
//! | `getLocation` | `location` | - |
//! | `diagnostics` | `diagnostics` | [`DiagnosticsOptions`] |
//!
//! Missing or `null` options fall back to each type's defaults; unknown
//! option fields are ignored.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::api::{ApiReply, VehicleApi};
use crate::error::{CommandError, VehicleResult};

// =============================================================================
// Options
// =============================================================================

/// What an alert does
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AlertAction {
    Honk,
    Flash,
}

/// Conditions under which an alert still fires
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AlertOverride {
    DoorOpen,
    IgnitionOn,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlertOptions {
    pub action: Vec<AlertAction>,
    /// Seconds before the alert starts
    pub delay: u32,
    /// Alert length in minutes
    pub duration: u32,
    #[serde(rename = "override")]
    pub overrides: Vec<AlertOverride>,
}

impl Default for AlertOptions {
    fn default() -> Self {
        Self {
            action: vec![AlertAction::Honk, AlertAction::Flash],
            delay: 0,
            duration: 1,
            overrides: vec![AlertOverride::DoorOpen, AlertOverride::IgnitionOn],
        }
    }
}

/// Options for door and trunk (un)lock
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DoorOptions {
    /// Seconds before the lock state changes
    pub delay: u32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ChargeOverrideMode {
    #[default]
    ChargeNow,
    CancelOverride,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChargeOverrideOptions {
    pub mode: ChargeOverrideMode,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ChargeMode {
    DefaultImmediate,
    #[default]
    Immediate,
    DepartureBased,
    RateBased,
    PhevAfterMidnight,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RateType {
    Offpeak,
    #[default]
    Midpeak,
    Peak,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ChargingProfileOptions {
    pub charge_mode: ChargeMode,
    pub rate_type: RateType,
}

/// Options for a diagnostics request
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DiagnosticsOptions {
    /// Items to report; empty leaves the choice to the account service
    pub diagnostic_item: Vec<String>,
}

impl DiagnosticsOptions {
    pub fn new(items: Vec<String>) -> Self {
        Self {
            diagnostic_item: items,
        }
    }
}

// =============================================================================
// Registry
// =============================================================================

/// A resolved remote command with its parsed options
#[derive(Debug, Clone, PartialEq)]
pub enum RemoteCommand {
    GetAccountVehicles,
    StartVehicle,
    CancelStartVehicle,
    Alert(AlertOptions),
    AlertFlash(AlertOptions),
    AlertHonk(AlertOptions),
    CancelAlert,
    LockDoor(DoorOptions),
    UnlockDoor(DoorOptions),
    LockTrunk(DoorOptions),
    UnlockTrunk(DoorOptions),
    ChargeOverride(ChargeOverrideOptions),
    CancelChargeOverride,
    GetChargingProfile,
    SetChargingProfile(ChargingProfileOptions),
    GetLocation,
    Diagnostics(DiagnosticsOptions),
}

impl RemoteCommand {
    /// Every accepted command name
    pub const NAMES: [&'static str; 17] = [
        "getAccountVehicles",
        "startVehicle",
        "cancelStartVehicle",
        "alert",
        "alertFlash",
        "alertHonk",
        "cancelAlert",
        "lockDoor",
        "unlockDoor",
        "lockTrunk",
        "unlockTrunk",
        "chargeOverride",
        "cancelChargeOverride",
        "getChargingProfile",
        "setChargingProfile",
        "getLocation",
        "diagnostics",
    ];

    /// Resolve a command name and parse its options
    pub fn parse(name: &str, options: Option<Value>) -> Result<Self, CommandError> {
        let command = match name {
            "getAccountVehicles" => Self::GetAccountVehicles,
            "startVehicle" => Self::StartVehicle,
            "cancelStartVehicle" => Self::CancelStartVehicle,
            "alert" => Self::Alert(parse_options(name, options)?),
            "alertFlash" => Self::AlertFlash(AlertOptions {
                action: vec![AlertAction::Flash],
                ..parse_options(name, options)?
            }),
            "alertHonk" => Self::AlertHonk(AlertOptions {
                action: vec![AlertAction::Honk],
                ..parse_options(name, options)?
            }),
            "cancelAlert" => Self::CancelAlert,
            "lockDoor" => Self::LockDoor(parse_options(name, options)?),
            "unlockDoor" => Self::UnlockDoor(parse_options(name, options)?),
            "lockTrunk" => Self::LockTrunk(parse_options(name, options)?),
            "unlockTrunk" => Self::UnlockTrunk(parse_options(name, options)?),
            "chargeOverride" => Self::ChargeOverride(parse_options(name, options)?),
            "cancelChargeOverride" => Self::CancelChargeOverride,
            "getChargingProfile" => Self::GetChargingProfile,
            "setChargingProfile" => Self::SetChargingProfile(parse_options(name, options)?),
            "getLocation" => Self::GetLocation,
            "diagnostics" => Self::Diagnostics(parse_options(name, options)?),
            other => return Err(CommandError::NotFound(other.to_string())),
        };
        Ok(command)
    }

    /// Name the command was requested under
    pub fn name(&self) -> &'static str {
        match self {
            Self::GetAccountVehicles => "getAccountVehicles",
            Self::StartVehicle => "startVehicle",
            Self::CancelStartVehicle => "cancelStartVehicle",
            Self::Alert(_) => "alert",
            Self::AlertFlash(_) => "alertFlash",
            Self::AlertHonk(_) => "alertHonk",
            Self::CancelAlert => "cancelAlert",
            Self::LockDoor(_) => "lockDoor",
            Self::UnlockDoor(_) => "unlockDoor",
            Self::LockTrunk(_) => "lockTrunk",
            Self::UnlockTrunk(_) => "unlockTrunk",
            Self::ChargeOverride(_) => "chargeOverride",
            Self::CancelChargeOverride => "cancelChargeOverride",
            Self::GetChargingProfile => "getChargingProfile",
            Self::SetChargingProfile(_) => "setChargingProfile",
            Self::GetLocation => "getLocation",
            Self::Diagnostics(_) => "diagnostics",
        }
    }

    /// Run the command against the account API
    pub async fn execute(&self, api: &dyn VehicleApi) -> VehicleResult<ApiReply> {
        match self {
            Self::GetAccountVehicles => api.account_vehicles().await,
            Self::StartVehicle => api.start().await,
            Self::CancelStartVehicle => api.cancel_start().await,
            Self::Alert(options) | Self::AlertFlash(options) | Self::AlertHonk(options) => {
                api.alert(options).await
            }
            Self::CancelAlert => api.cancel_alert().await,
            Self::LockDoor(options) => api.lock_door(options).await,
            Self::UnlockDoor(options) => api.unlock_door(options).await,
            Self::LockTrunk(options) => api.lock_trunk(options).await,
            Self::UnlockTrunk(options) => api.unlock_trunk(options).await,
            Self::ChargeOverride(options) => api.charge_override(options).await,
            Self::CancelChargeOverride => {
                api.charge_override(&ChargeOverrideOptions {
                    mode: ChargeOverrideMode::CancelOverride,
                })
                .await
            }
            Self::GetChargingProfile => api.get_charging_profile().await,
            Self::SetChargingProfile(options) => api.set_charging_profile(options).await,
            Self::GetLocation => api.location().await,
            Self::Diagnostics(options) => api.diagnostics(options).await,
        }
    }
}

impl std::fmt::Display for RemoteCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

fn parse_options<T>(command: &str, options: Option<Value>) -> Result<T, CommandError>
where
    T: DeserializeOwned + Default,
{
    match options {
        None | Some(Value::Null) => Ok(T::default()),
        Some(value) => serde_json::from_value(value).map_err(|e| CommandError::InvalidOptions {
            command: command.to_string(),
            reason: e.to_string(),
        }),
    }
}

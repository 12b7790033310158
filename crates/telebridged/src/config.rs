//! Daemon configuration
//!
//! Loaded from an optional TOML file, then overridden by command-line flags
//! and their environment variables. Every field has a default except the
//! VIN, which must come from one of the two.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Parser, ValueEnum};
use serde::{Deserialize, Serialize};
use telebridge_mqtt::{MqttSettings, Topics, DEFAULT_PREFIX};
use uuid::Uuid;

/// Log output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

#[derive(Parser, Debug, Default)]
#[command(name = "telebridged")]
#[command(about = "Bridge a vehicle telematics account to MQTT discovery topics")]
#[command(version)]
pub struct Args {
    /// Configuration file path (TOML format)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// VIN of the vehicle to bridge
    #[arg(long, env = "ONSTAR_VIN")]
    pub vin: Option<String>,

    /// Polling interval in milliseconds
    #[arg(long = "refresh-ms", env = "ONSTAR_REFRESH")]
    pub refresh_ms: Option<u64>,

    /// Accept remote commands on the command topic
    #[arg(long, env = "ONSTAR_ALLOW_COMMANDS")]
    pub allow_commands: Option<bool>,

    #[arg(long, env = "MQTT_HOST")]
    pub mqtt_host: Option<String>,

    #[arg(long, env = "MQTT_PORT")]
    pub mqtt_port: Option<u16>,

    #[arg(long, env = "MQTT_USERNAME")]
    pub mqtt_username: Option<String>,

    #[arg(long, env = "MQTT_PASSWORD", hide_env_values = true)]
    pub mqtt_password: Option<String>,

    /// Connect with TLS
    #[arg(long, env = "MQTT_TLS")]
    pub mqtt_tls: Option<bool>,

    /// Discovery topic prefix
    #[arg(long, env = "MQTT_PREFIX")]
    pub mqtt_prefix: Option<String>,

    /// Prefix prepended to every entity name
    #[arg(long, env = "MQTT_NAME_PREFIX")]
    pub mqtt_name_prefix: Option<String>,

    /// Base topic for polling heartbeats
    #[arg(long, env = "MQTT_ONSTAR_POLLING_STATUS_TOPIC")]
    pub polling_status_topic: Option<String>,

    /// Replay account replies from a snapshot file instead of the sample account
    #[arg(long)]
    pub snapshot: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,

    /// Enable debug logging
    #[arg(short, long)]
    pub verbose: bool,
}

/// Complete daemon configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BridgeConfig {
    #[serde(default)]
    pub vehicle: VehicleConfig,

    #[serde(default)]
    pub mqtt: MqttConfig,

    #[serde(default)]
    pub account: AccountConfig,
}

impl BridgeConfig {
    /// Load configuration from a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        toml::from_str(&content).with_context(|| format!("Invalid config {}", path.display()))
    }

    /// Config file (if any) with command-line overrides applied
    pub fn from_args(args: &Args) -> Result<Self> {
        let mut config = match &args.config {
            Some(path) => Self::load(path)?,
            None => Self::default(),
        };
        config.apply(args);
        config.validate()?;
        Ok(config)
    }

    /// Apply command-line and environment overrides
    pub fn apply(&mut self, args: &Args) {
        if let Some(vin) = &args.vin {
            self.vehicle.vin = vin.clone();
        }
        if let Some(ms) = args.refresh_ms {
            self.vehicle.refresh_interval_secs = (ms / 1000).max(1);
        }
        if let Some(allow) = args.allow_commands {
            self.vehicle.allow_commands = allow;
        }
        if let Some(host) = &args.mqtt_host {
            self.mqtt.host = host.clone();
        }
        if let Some(port) = args.mqtt_port {
            self.mqtt.port = port;
        }
        if args.mqtt_username.is_some() {
            self.mqtt.username = args.mqtt_username.clone();
        }
        if args.mqtt_password.is_some() {
            self.mqtt.password = args.mqtt_password.clone();
        }
        if let Some(tls) = args.mqtt_tls {
            self.mqtt.tls = tls;
        }
        if let Some(prefix) = &args.mqtt_prefix {
            self.mqtt.prefix = prefix.clone();
        }
        if let Some(name_prefix) = &args.mqtt_name_prefix {
            self.mqtt.name_prefix = name_prefix.clone();
        }
        if args.polling_status_topic.is_some() {
            self.mqtt.polling_status_topic = args.polling_status_topic.clone();
        }
        if let Some(path) = &args.snapshot {
            self.account = AccountConfig::Snapshot { path: path.clone() };
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.vehicle.vin.trim().is_empty() {
            bail!("No vehicle VIN configured (set [vehicle] vin or ONSTAR_VIN)");
        }
        if self.vehicle.refresh_interval_secs == 0 {
            bail!("refresh_interval_secs must be greater than zero");
        }
        Ok(())
    }

    /// Copy safe to log
    pub fn redacted(&self) -> Self {
        let mut config = self.clone();
        if config.mqtt.password.is_some() {
            config.mqtt.password = Some("***".to_string());
        }
        config
    }
}

// =============================================================================
// Vehicle
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VehicleConfig {
    /// VIN of the vehicle to bridge (matched case-insensitively)
    #[serde(default)]
    pub vin: String,

    /// Seconds between polling rounds
    #[serde(default = "default_refresh_interval_secs")]
    pub refresh_interval_secs: u64,

    /// Subscribe to the command topic
    #[serde(default = "default_true")]
    pub allow_commands: bool,
}

fn default_refresh_interval_secs() -> u64 {
    30 * 60
}

fn default_true() -> bool {
    true
}

impl Default for VehicleConfig {
    fn default() -> Self {
        Self {
            vin: String::new(),
            refresh_interval_secs: default_refresh_interval_secs(),
            allow_commands: default_true(),
        }
    }
}

impl VehicleConfig {
    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval_secs)
    }
}

// =============================================================================
// MQTT
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MqttConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default)]
    pub username: Option<String>,

    #[serde(default)]
    pub password: Option<String>,

    #[serde(default)]
    pub tls: bool,

    /// Discovery topic prefix
    #[serde(default = "default_prefix")]
    pub prefix: String,

    /// Prepended (space separated) to every entity name
    #[serde(default)]
    pub name_prefix: String,

    /// Base topic for polling heartbeats; `{prefix}/{vin}/polling_status`
    /// when unset
    #[serde(default)]
    pub polling_status_topic: Option<String>,

    /// MQTT client id; random per run when unset
    #[serde(default)]
    pub client_id: Option<String>,

    #[serde(default = "default_keep_alive_secs")]
    pub keep_alive_secs: u64,
}

fn default_host() -> String {
    "localhost".to_string()
}

fn default_port() -> u16 {
    1883
}

fn default_prefix() -> String {
    DEFAULT_PREFIX.to_string()
}

fn default_keep_alive_secs() -> u64 {
    30
}

impl Default for MqttConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            username: None,
            password: None,
            tls: false,
            prefix: default_prefix(),
            name_prefix: String::new(),
            polling_status_topic: None,
            client_id: None,
            keep_alive_secs: default_keep_alive_secs(),
        }
    }
}

impl MqttConfig {
    /// Connection settings for the transport
    pub fn settings(&self) -> MqttSettings {
        MqttSettings {
            host: self.host.clone(),
            port: self.port,
            username: self.username.clone(),
            password: self.password.clone(),
            tls: self.tls,
            client_id: self
                .client_id
                .clone()
                .unwrap_or_else(|| format!("telebridge-{}", Uuid::new_v4())),
            keep_alive: Duration::from_secs(self.keep_alive_secs),
        }
    }

    /// Polling-status base topic for a vehicle
    pub fn polling_status_topic(&self, vin: &str) -> String {
        self.polling_status_topic
            .clone()
            .unwrap_or_else(|| Topics::new(&self.prefix, vin).polling_status())
    }
}

// =============================================================================
// Account
// =============================================================================

/// Source of account API replies
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AccountConfig {
    /// Built-in sample account
    #[default]
    Mock,
    /// Recorded replies loaded from a JSON file
    Snapshot { path: PathBuf },
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config: BridgeConfig = toml::from_str("[vehicle]\nvin = \"ABC\"\n").unwrap();
        assert_eq!(config.vehicle.vin, "ABC");
        assert_eq!(config.vehicle.refresh_interval(), Duration::from_secs(1800));
        assert!(config.vehicle.allow_commands);
        assert_eq!(config.mqtt.host, "localhost");
        assert_eq!(config.mqtt.port, 1883);
        assert_eq!(config.mqtt.prefix, "homeassistant");
        assert_eq!(config.account, AccountConfig::Mock);
        assert_eq!(
            config.mqtt.polling_status_topic("ABC"),
            "homeassistant/ABC/polling_status"
        );
    }

    #[test]
    fn test_load_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[vehicle]
vin = "1G1FZ6S02L4100000"
refresh_interval_secs = 600
allow_commands = false

[mqtt]
host = "broker.local"
port = 8883
tls = true
username = "bridge"
password = "secret"
name_prefix = "Bolt"
polling_status_topic = "garage/bolt/polling"
client_id = "telebridge-garage"

[account]
type = "snapshot"
path = "/var/lib/telebridge/account.json"
"#
        )
        .unwrap();

        let config = BridgeConfig::load(file.path()).unwrap();
        assert_eq!(config.vehicle.refresh_interval_secs, 600);
        assert!(!config.vehicle.allow_commands);
        assert_eq!(
            config.account,
            AccountConfig::Snapshot {
                path: PathBuf::from("/var/lib/telebridge/account.json")
            }
        );

        let settings = config.mqtt.settings();
        assert_eq!(settings.url(), "mqtts://broker.local:8883");
        assert_eq!(settings.client_id, "telebridge-garage");
        assert_eq!(
            config.mqtt.polling_status_topic("ignored"),
            "garage/bolt/polling"
        );
    }

    #[test]
    fn test_overrides() {
        let args = Args {
            vin: Some("XYZ".to_string()),
            refresh_ms: Some(60_000),
            allow_commands: Some(false),
            mqtt_host: Some("mqtt.example".to_string()),
            mqtt_password: Some("hunter2".to_string()),
            snapshot: Some(PathBuf::from("replies.json")),
            ..Args::default()
        };

        let mut config = BridgeConfig::default();
        config.apply(&args);
        assert_eq!(config.vehicle.vin, "XYZ");
        assert_eq!(config.vehicle.refresh_interval_secs, 60);
        assert!(!config.vehicle.allow_commands);
        assert_eq!(config.mqtt.host, "mqtt.example");
        assert_eq!(
            config.account,
            AccountConfig::Snapshot {
                path: PathBuf::from("replies.json")
            }
        );
        assert_eq!(config.redacted().mqtt.password.as_deref(), Some("***"));
        assert_eq!(config.mqtt.password.as_deref(), Some("hunter2"));
    }

    #[test]
    fn test_vin_is_required() {
        assert!(BridgeConfig::default().validate().is_err());
    }

    #[test]
    fn test_random_client_id() {
        let config = MqttConfig::default();
        let first = config.settings().client_id;
        assert!(first.starts_with("telebridge-"));
        assert_ne!(first, config.settings().client_id);
    }
}

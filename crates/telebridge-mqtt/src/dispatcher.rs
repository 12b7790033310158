//! Remote command dispatcher
//!
//! Listens on `{prefix}/{vin}/command` for `{"command": "...", "options": {...}}`
//! and reports progress on `{command topic}/{command}/state` (retained):
//!
//! | Stage | Payload |
//! |-------|---------|
//! | accepted | `{"Command": "Sent"}` |
//! | succeeded | `{"Command": "Completed Successfully"}` |
//! | failed | `{"Command": {"error": {...}}}` |
//!
//! Unknown commands and unreadable messages are logged and dropped without
//! any publish. A command reply carrying a location is republished as
//! `{latitude, longitude}` on the command's own state topic.
//!
//! Each message is handled in its own task; a failing command never stops
//! the listener.

use std::sync::Arc;

use serde::Deserialize;
use serde_json::{json, Value};
use telebridge_core::{CommandError, ErrorDetail, RemoteCommand, VehicleApi};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::bus::{BusClient, InboundMessage};
use crate::error::BusResult;
use crate::payload::{DiscoveryBuilder, LocationPayload};

/// Inbound command request
#[derive(Debug, Clone, Deserialize)]
pub struct CommandRequest {
    pub command: String,
    #[serde(default)]
    pub options: Option<Value>,
}

/// Progress reported on a command's status topic
#[derive(Debug, Clone, PartialEq)]
pub enum CommandStatus {
    Sent,
    Completed,
    Failed(ErrorDetail),
}

impl CommandStatus {
    pub fn payload(&self) -> Value {
        match self {
            CommandStatus::Sent => json!({"Command": "Sent"}),
            CommandStatus::Completed => json!({"Command": "Completed Successfully"}),
            CommandStatus::Failed(detail) => json!({"Command": {"error": detail}}),
        }
    }
}

/// How a message was handled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// Not a command request, or not an accepted command
    Dropped,
    Completed,
    Failed,
}

/// Routes command requests to the account API
#[derive(Clone)]
pub struct CommandDispatcher {
    api: Arc<dyn VehicleApi>,
    bus: Arc<dyn BusClient>,
    builder: Arc<DiscoveryBuilder>,
}

impl CommandDispatcher {
    pub fn new(api: Arc<dyn VehicleApi>, bus: Arc<dyn BusClient>, builder: DiscoveryBuilder) -> Self {
        Self {
            api,
            bus,
            builder: Arc::new(builder),
        }
    }

    pub fn command_topic(&self) -> String {
        self.builder.topics().command()
    }

    /// Subscribe to the command topic
    pub async fn subscribe(&self) -> BusResult<()> {
        let topic = self.command_topic();
        self.bus.subscribe(&topic).await?;
        info!(topic = %topic, "Subscribed to command topic");
        Ok(())
    }

    /// Handle inbound messages until the channel closes
    pub fn run(self, mut inbound: mpsc::Receiver<InboundMessage>) -> JoinHandle<()> {
        let command_topic = self.command_topic();
        tokio::spawn(async move {
            while let Some(message) = inbound.recv().await {
                if message.topic != command_topic {
                    debug!(topic = %message.topic, "Ignoring message outside the command topic");
                    continue;
                }
                let dispatcher = self.clone();
                tokio::spawn(async move {
                    dispatcher.handle(&message).await;
                });
            }
            debug!("Command listener stopped");
        })
    }

    /// Handle one inbound message
    pub async fn handle(&self, message: &InboundMessage) -> DispatchOutcome {
        let request: CommandRequest = match serde_json::from_slice(&message.payload) {
            Ok(request) => request,
            Err(e) => {
                warn!(topic = %message.topic, error = %e, "Unreadable command message");
                return DispatchOutcome::Dropped;
            }
        };

        let status_topic = self.builder.topics().command_status(&request.command);
        let command = match RemoteCommand::parse(&request.command, request.options) {
            Ok(command) => command,
            Err(CommandError::NotFound(name)) => {
                error!(command = %name, "Command not found");
                return DispatchOutcome::Dropped;
            }
            Err(err) => {
                self.publish_status(&status_topic, &CommandStatus::Sent).await;
                error!(command = %request.command, error = %err, "Command error");
                let status = CommandStatus::Failed(ErrorDetail::from_error(&err));
                self.publish_status(&status_topic, &status).await;
                return DispatchOutcome::Failed;
            }
        };

        info!(command = %command, topic = %status_topic, "Command sent");
        self.publish_status(&status_topic, &CommandStatus::Sent).await;

        match command.execute(self.api.as_ref()).await {
            Ok(reply) => {
                info!(command = %command, "Command completed");
                self.publish_status(&status_topic, &CommandStatus::Completed)
                    .await;

                if let Some(location) = reply.location() {
                    let topic = self.builder.state_topic(command.name());
                    let payload = json!(LocationPayload::from(location));
                    if self.publish(&topic, &payload).await {
                        info!(topic = %topic, "Published location");
                    }
                }
                if reply.has_diagnostics() {
                    info!(command = %command, "Received diagnostics");
                }
                DispatchOutcome::Completed
            }
            Err(err) => {
                error!(command = %command, error = %err, "Command error");
                let status = CommandStatus::Failed(ErrorDetail::from(&err));
                self.publish_status(&status_topic, &status).await;
                DispatchOutcome::Failed
            }
        }
    }

    async fn publish_status(&self, topic: &str, status: &CommandStatus) {
        self.publish(topic, &status.payload()).await;
    }

    /// Retained publish; failures are logged
    async fn publish(&self, topic: &str, payload: &Value) -> bool {
        let bytes = payload.to_string().into_bytes();
        match self.bus.publish(topic, bytes, true).await {
            Ok(()) => true,
            Err(e) => {
                warn!(topic = %topic, error = %e, "Failed to publish command status");
                false
            }
        }
    }
}

//! Publish cycle controller
//!
//! One [`PublishCycle::tick`] is one polling round:
//!
//! ```text
//! Fetching ─► Building ─► Publishing ─► Done
//!     │           │            │
//!     └───────────┴────────────┴──────► Failed
//! ```
//!
//! - **Fetching** - request the vehicle's supported diagnostics
//! - **Building** - add discovery configs not seen before, merge state
//!   bodies per state topic
//! - **Publishing** - publish configs not yet published by this process and
//!   every state body (retained), then the polling-status heartbeat
//!   (not retained)
//!
//! A failed round publishes the error on the polling-status topic and ends;
//! the next round runs independently. The config cache lives as long as the
//! cycle, so each discovery config is published once per process.

use std::collections::BTreeMap;
use std::sync::Arc;

use futures::future::try_join_all;
use serde::Serialize;
use serde_json::{Map, Value};
use telebridge_core::{DiagnosticsOptions, ErrorDetail, ResponseInfo, VehicleApi};
use tracing::{debug, error, info, warn};

use crate::bus::BusClient;
use crate::error::{BusResult, CycleError};
use crate::payload::{ConfigPayload, DiscoveryBuilder};
use crate::topics::{polling_last_successful, polling_state};

/// Where a polling round currently is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleState {
    Idle,
    Fetching,
    Building,
    Publishing,
    Done,
    Failed,
}

/// Outcome of a successful round
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleReport {
    /// Diagnostic groups with at least one element
    pub diagnostics: usize,
    /// Discovery configs published this round
    pub configs_published: usize,
    /// State bodies published this round
    pub states_published: usize,
}

struct ConfigEntry {
    configured: bool,
    payload: ConfigPayload,
}

impl CycleError {
    /// Error body published on the polling-status topic
    pub fn detail(&self) -> ErrorDetail {
        match self {
            CycleError::Fetch(err) => ErrorDetail::from(err),
            other => ErrorDetail::from_error(other),
        }
    }
}

/// Heartbeat body for a successful round; same shape as a failure body so
/// dashboards can template both
pub fn polling_success_payload() -> Value {
    let detail = ErrorDetail {
        message: "N/A".to_string(),
        response: Some(ResponseInfo {
            status: Some(0),
            status_text: Some("N/A".to_string()),
            ..ResponseInfo::default()
        }),
        ..ErrorDetail::default()
    };
    serde_json::to_value(detail.into_payload()).unwrap_or(Value::Null)
}

/// Drives polling rounds for one vehicle
pub struct PublishCycle {
    api: Arc<dyn VehicleApi>,
    bus: Arc<dyn BusClient>,
    builder: DiscoveryBuilder,
    polling_status_topic: String,
    configs: BTreeMap<String, ConfigEntry>,
    state: CycleState,
}

impl PublishCycle {
    pub fn new(api: Arc<dyn VehicleApi>, bus: Arc<dyn BusClient>, builder: DiscoveryBuilder) -> Self {
        let polling_status_topic = builder.topics().polling_status();
        Self {
            api,
            bus,
            builder,
            polling_status_topic,
            configs: BTreeMap::new(),
            state: CycleState::Idle,
        }
    }

    /// Base topic for heartbeats (`{base}/state`, `{base}/lastpollsuccessful`)
    pub fn with_polling_status_topic(mut self, topic: impl Into<String>) -> Self {
        self.polling_status_topic = topic.into();
        self
    }

    pub fn state(&self) -> CycleState {
        self.state
    }

    pub fn polling_status_topic(&self) -> &str {
        &self.polling_status_topic
    }

    /// Discovery configs known to this cycle
    pub fn known_configs(&self) -> usize {
        self.configs.len()
    }

    /// Discovery configs already published by this process
    pub fn configured(&self) -> usize {
        self.configs.values().filter(|c| c.configured).count()
    }

    fn transition(&mut self, state: CycleState) {
        debug!(from = ?self.state, to = ?state, "Publish cycle");
        self.state = state;
    }

    /// Run one round; failures are published and logged, never returned
    pub async fn tick(&mut self) -> Option<CycleReport> {
        match self.run().await {
            Ok(report) => {
                info!(
                    diagnostics = report.diagnostics,
                    configs = report.configs_published,
                    states = report.states_published,
                    "Updates complete"
                );
                Some(report)
            }
            Err(err) => {
                self.transition(CycleState::Failed);
                let payload = err.detail().into_payload();
                error!(error = %err, "Error polling data");
                if let Err(e) = self.publish_failure(&payload).await {
                    warn!(error = %e, "Failed to publish polling status");
                }
                None
            }
        }
    }

    /// Run one round, returning the first failure
    pub async fn run(&mut self) -> Result<CycleReport, CycleError> {
        self.transition(CycleState::Fetching);
        info!("Requesting diagnostics");
        let options =
            DiagnosticsOptions::new(self.builder.vehicle().supported_diagnostics.clone());
        let reply = self.api.diagnostics(&options).await?;
        info!(status = ?reply.status, "Diagnostic request status");
        let diagnostics = reply.diagnostics();
        debug!(
            diagnostics = ?diagnostics.iter().map(ToString::to_string).collect::<Vec<_>>(),
            "Diagnostic request response"
        );

        self.transition(CycleState::Building);
        let mut states: BTreeMap<String, Map<String, Value>> = BTreeMap::new();
        let mut groups = 0;
        for diagnostic in diagnostics.iter().filter(|d| d.has_elements()) {
            groups += 1;
            for element in DiscoveryBuilder::entity_elements(diagnostic) {
                let topic = self.builder.config_topic(&element);
                self.configs.entry(topic).or_insert_with(|| ConfigEntry {
                    configured: false,
                    payload: self.builder.config_payload(diagnostic, &element),
                });
            }
            states
                .entry(self.builder.state_topic(&diagnostic.name))
                .or_default()
                .extend(DiscoveryBuilder::state_payload(diagnostic));
        }

        self.transition(CycleState::Publishing);
        let mut messages = Vec::new();
        let mut pending = Vec::new();
        for (topic, entry) in self.configs.iter().filter(|(_, c)| !c.configured) {
            info!(topic = %topic, "Publishing config");
            messages.push((topic.clone(), serde_json::to_vec(&entry.payload)?, true));
            pending.push(topic.clone());
        }
        for (topic, state) in &states {
            info!(topic = %topic, "Publishing state");
            debug!(topic = %topic, state = %serde_json::Value::Object(state.clone()), "State payload");
            messages.push((topic.clone(), serde_json::to_vec(state)?, true));
        }

        self.publish_all(messages).await?;
        for topic in &pending {
            if let Some(entry) = self.configs.get_mut(topic) {
                entry.configured = true;
            }
        }

        self.publish_heartbeat(&polling_success_payload(), true).await?;
        self.transition(CycleState::Done);

        Ok(CycleReport {
            diagnostics: groups,
            configs_published: pending.len(),
            states_published: states.len(),
        })
    }

    async fn publish_all(&self, messages: Vec<(String, Vec<u8>, bool)>) -> BusResult<()> {
        try_join_all(messages.into_iter().map(|(topic, payload, retain)| {
            let bus = self.bus.clone();
            async move { bus.publish(&topic, payload, retain).await }
        }))
        .await?;
        Ok(())
    }

    async fn publish_heartbeat<T: Serialize>(&self, body: &T, successful: bool) -> Result<(), CycleError> {
        let base = &self.polling_status_topic;
        self.bus
            .publish(&polling_state(base), serde_json::to_vec(body)?, false)
            .await?;
        self.bus
            .publish(
                &polling_last_successful(base),
                successful.to_string().into_bytes(),
                false,
            )
            .await?;
        Ok(())
    }

    async fn publish_failure<T: Serialize>(&self, body: &T) -> Result<(), CycleError> {
        self.publish_heartbeat(body, false).await
    }
}

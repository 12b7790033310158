//! In-memory bus for tests

use std::collections::HashSet;

use async_trait::async_trait;
use parking_lot::RwLock;
use serde_json::Value;

use crate::bus::BusClient;
use crate::error::{BusError, BusResult};

/// One recorded publish
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Published {
    pub topic: String,
    pub payload: Vec<u8>,
    pub retain: bool,
}

impl Published {
    /// Payload as UTF-8 text
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.payload).into_owned()
    }

    /// Payload decoded as JSON (`Null` when it is not JSON)
    pub fn json(&self) -> Value {
        serde_json::from_slice(&self.payload).unwrap_or(Value::Null)
    }
}

/// Bus client that records publishes and subscriptions
#[derive(Default)]
pub struct RecordingBus {
    published: RwLock<Vec<Published>>,
    subscriptions: RwLock<Vec<String>>,
    /// Topics whose publishes fail
    failing: RwLock<HashSet<String>>,
}

impl RecordingBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make publishes to one topic fail
    pub fn fail_topic(&self, topic: &str) {
        self.failing.write().insert(topic.to_string());
    }

    /// Everything published so far, oldest first
    pub fn published(&self) -> Vec<Published> {
        self.published.read().clone()
    }

    /// Publishes to one topic, oldest first
    pub fn published_to(&self, topic: &str) -> Vec<Published> {
        self.published
            .read()
            .iter()
            .filter(|p| p.topic == topic)
            .cloned()
            .collect()
    }

    /// Most recent publish to a topic
    pub fn last(&self, topic: &str) -> Option<Published> {
        self.published
            .read()
            .iter()
            .rev()
            .find(|p| p.topic == topic)
            .cloned()
    }

    pub fn subscriptions(&self) -> Vec<String> {
        self.subscriptions.read().clone()
    }

    pub fn clear(&self) {
        self.published.write().clear();
    }
}

#[async_trait]
impl BusClient for RecordingBus {
    async fn publish(&self, topic: &str, payload: Vec<u8>, retain: bool) -> BusResult<()> {
        // Publish topics may not carry wildcards, same as the MQTT client
        if topic.is_empty() || topic.contains(['+', '#', '\0']) {
            return Err(BusError::Publish {
                topic: topic.to_string(),
                reason: "invalid topic".to_string(),
            });
        }
        if self.failing.read().contains(topic) {
            return Err(BusError::Publish {
                topic: topic.to_string(),
                reason: "broker unavailable".to_string(),
            });
        }

        self.published.write().push(Published {
            topic: topic.to_string(),
            payload,
            retain,
        });
        Ok(())
    }

    async fn subscribe(&self, topic: &str) -> BusResult<()> {
        self.subscriptions.write().push(topic.to_string());
        Ok(())
    }
}

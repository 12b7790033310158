//! Bus client abstraction
//!
//! The publish cycle and command dispatcher only need publish and subscribe.
//! [`MqttBus`](crate::transport::MqttBus) implements this over a broker
//! connection and [`RecordingBus`](crate::testing::RecordingBus) records
//! everything in memory.

use async_trait::async_trait;

use crate::error::BusResult;

/// Message received on a subscribed topic
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundMessage {
    pub topic: String,
    pub payload: Vec<u8>,
}

impl InboundMessage {
    pub fn new(topic: impl Into<String>, payload: impl Into<Vec<u8>>) -> Self {
        Self {
            topic: topic.into(),
            payload: payload.into(),
        }
    }
}

/// Publish/subscribe primitives
#[async_trait]
pub trait BusClient: Send + Sync {
    /// Publish a payload; `retain` asks the broker to keep it for late
    /// subscribers
    async fn publish(&self, topic: &str, payload: Vec<u8>, retain: bool) -> BusResult<()>;

    /// Subscribe to a topic; messages arrive on the client's inbound channel
    async fn subscribe(&self, topic: &str) -> BusResult<()>;
}

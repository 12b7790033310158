//! MQTT transport over rumqttc
//!
//! The connection carries a retained last-will of `"false"` on the vehicle's
//! availability topic. Every time the broker acknowledges a connection the
//! event loop publishes the retained `"true"` birth message and re-issues
//! all subscriptions, so a reconnect restores the same state as the first
//! connect.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use rumqttc::{AsyncClient, Event, LastWill, MqttOptions, Outgoing, Packet, QoS, Transport};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::bus::{BusClient, InboundMessage};
use crate::error::{BusError, BusResult};
use crate::payload::{PAYLOAD_AVAILABLE, PAYLOAD_NOT_AVAILABLE};

/// Requests buffered between the client handle and the event loop
const REQUEST_CAPACITY: usize = 64;

/// Inbound messages buffered for the consumer
const INBOUND_CAPACITY: usize = 32;

/// Pause after a connection error before polling again
const RECONNECT_DELAY: Duration = Duration::from_secs(1);

/// Time allowed for queued publishes to drain on disconnect
const DISCONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Broker connection settings
#[derive(Debug, Clone)]
pub struct MqttSettings {
    pub host: String,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
    /// Connect with TLS (`mqtts`)
    pub tls: bool,
    pub client_id: String,
    pub keep_alive: Duration,
}

impl MqttSettings {
    /// `mqtt://host:port` or `mqtts://host:port`
    pub fn url(&self) -> String {
        let scheme = if self.tls { "mqtts" } else { "mqtt" };
        format!("{}://{}:{}", scheme, self.host, self.port)
    }

    fn options(&self, availability_topic: &str) -> MqttOptions {
        let mut options = MqttOptions::new(&self.client_id, &self.host, self.port);
        options.set_keep_alive(self.keep_alive);
        options.set_last_will(LastWill::new(
            availability_topic,
            PAYLOAD_NOT_AVAILABLE,
            QoS::AtLeastOnce,
            true,
        ));

        if let Some(username) = &self.username {
            options.set_credentials(username, self.password.as_deref().unwrap_or_default());
        }

        if self.tls {
            options.set_transport(Transport::tls_with_default_config());
        }

        options
    }
}

/// Bus client backed by a broker connection
pub struct MqttBus {
    client: AsyncClient,
    subscriptions: Arc<RwLock<Vec<String>>>,
    event_loop: Mutex<Option<JoinHandle<()>>>,
}

impl MqttBus {
    /// Start the connection and its event loop.
    ///
    /// Returns the client and the channel inbound publishes are forwarded
    /// to. The broker connection is established asynchronously; requests
    /// made before it is up are queued.
    pub fn connect(
        settings: &MqttSettings,
        availability_topic: &str,
    ) -> (Self, mpsc::Receiver<InboundMessage>) {
        info!(
            url = %settings.url(),
            client_id = %settings.client_id,
            username = ?settings.username,
            "Connecting to MQTT"
        );

        let (client, mut eventloop) =
            AsyncClient::new(settings.options(availability_topic), REQUEST_CAPACITY);
        let (inbound_tx, inbound_rx) = mpsc::channel(INBOUND_CAPACITY);
        let subscriptions = Arc::new(RwLock::new(Vec::<String>::new()));

        let loop_client = client.clone();
        let loop_subscriptions = subscriptions.clone();
        let availability_topic = availability_topic.to_string();

        let event_loop = tokio::spawn(async move {
            loop {
                match eventloop.poll().await {
                    Ok(Event::Incoming(Packet::ConnAck(_))) => {
                        info!("Connected to MQTT");
                        if let Err(e) = loop_client.try_publish(
                            &availability_topic,
                            QoS::AtLeastOnce,
                            true,
                            PAYLOAD_AVAILABLE,
                        ) {
                            warn!(topic = %availability_topic, error = %e, "Failed to publish availability");
                        }
                        for topic in loop_subscriptions.read().iter() {
                            if let Err(e) = loop_client.try_subscribe(topic, QoS::AtLeastOnce) {
                                warn!(topic = %topic, error = %e, "Failed to resubscribe");
                            }
                        }
                    }
                    Ok(Event::Incoming(Packet::Publish(publish))) => {
                        debug!(topic = %publish.topic, bytes = publish.payload.len(), "Subscription message");
                        let message = InboundMessage::new(publish.topic, publish.payload.to_vec());
                        if inbound_tx.send(message).await.is_err() {
                            debug!("Inbound receiver dropped");
                        }
                    }
                    Ok(Event::Outgoing(Outgoing::Disconnect)) => {
                        info!("Disconnected from MQTT");
                        break;
                    }
                    Ok(_) => {}
                    Err(e) => {
                        warn!(error = %e, "MQTT connection error");
                        tokio::time::sleep(RECONNECT_DELAY).await;
                    }
                }
            }
        });

        (
            Self {
                client,
                subscriptions,
                event_loop: Mutex::new(Some(event_loop)),
            },
            inbound_rx,
        )
    }

    /// Send a clean disconnect and wait for the event loop to stop
    pub async fn disconnect(&self) -> BusResult<()> {
        self.client
            .disconnect()
            .await
            .map_err(|_| BusError::Closed)?;
        let event_loop = self.event_loop.lock().take();
        if let Some(event_loop) = event_loop {
            if tokio::time::timeout(DISCONNECT_TIMEOUT, event_loop)
                .await
                .is_err()
            {
                warn!("MQTT event loop did not stop after disconnect");
            }
        }
        Ok(())
    }
}

#[async_trait]
impl BusClient for MqttBus {
    async fn publish(&self, topic: &str, payload: Vec<u8>, retain: bool) -> BusResult<()> {
        self.client
            .publish(topic, QoS::AtLeastOnce, retain, payload)
            .await
            .map_err(|e| BusError::Publish {
                topic: topic.to_string(),
                reason: e.to_string(),
            })
    }

    async fn subscribe(&self, topic: &str) -> BusResult<()> {
        {
            let mut subscriptions = self.subscriptions.write();
            if !subscriptions.iter().any(|t| t == topic) {
                subscriptions.push(topic.to_string());
            }
        }
        self.client
            .subscribe(topic, QoS::AtLeastOnce)
            .await
            .map_err(|e| BusError::Subscribe {
                topic: topic.to_string(),
                reason: e.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> MqttSettings {
        MqttSettings {
            host: "broker.local".to_string(),
            port: 8883,
            username: Some("bridge".to_string()),
            password: None,
            tls: true,
            client_id: "telebridge-test".to_string(),
            keep_alive: Duration::from_secs(30),
        }
    }

    #[test]
    fn test_url() {
        let mut s = settings();
        assert_eq!(s.url(), "mqtts://broker.local:8883");
        s.tls = false;
        s.port = 1883;
        assert_eq!(s.url(), "mqtt://broker.local:1883");
    }

    #[test]
    fn test_options_carry_last_will() {
        let options = settings().options("homeassistant/XXX/available");
        let will = options.last_will().unwrap();
        assert_eq!(will.topic, "homeassistant/XXX/available");
        assert_eq!(&will.message[..], b"false");
        assert!(will.retain);
        assert_eq!(options.keep_alive(), Duration::from_secs(30));
        assert_eq!(options.client_id(), "telebridge-test");
    }
}

//! Bridge lifecycle
//!
//! Selects the configured vehicle, connects to the broker, then alternates
//! polling rounds with command handling until shutdown is signalled.

use std::sync::Arc;

use anyhow::{Context, Result};
use telebridge_core::{VehicleApi, VehicleError, VehicleIdentity};
use telebridge_mqtt::{
    BusClient, CommandDispatcher, DiscoveryBuilder, InboundMessage, MqttBus, PublishCycle,
    PAYLOAD_NOT_AVAILABLE,
};
use tokio::sync::{mpsc, watch};
use tracing::{info, warn};

use crate::config::BridgeConfig;

/// Pick the configured vehicle out of the account's vehicle list
pub fn select_vehicle(
    vehicles: Vec<VehicleIdentity>,
    vin: &str,
) -> Result<VehicleIdentity, VehicleError> {
    vehicles
        .into_iter()
        .find(|v| v.vin.eq_ignore_ascii_case(vin))
        .ok_or_else(|| VehicleError::VehicleNotFound(vin.to_string()))
}

pub struct Bridge {
    config: BridgeConfig,
    api: Arc<dyn VehicleApi>,
}

impl Bridge {
    pub fn new(config: BridgeConfig, api: Arc<dyn VehicleApi>) -> Self {
        Self { config, api }
    }

    /// Resolve the vehicle and build its discovery builder
    pub async fn discovery(&self) -> Result<DiscoveryBuilder> {
        let reply = self
            .api
            .account_vehicles()
            .await
            .context("Failed to list account vehicles")?;
        let vehicles = reply.vehicles();
        info!(count = vehicles.len(), "Account vehicles");

        let vehicle = select_vehicle(vehicles, &self.config.vehicle.vin)?;
        info!(vin = %vehicle.vin, name = %vehicle.display_name(), "Using vehicle");

        Ok(DiscoveryBuilder::new(vehicle, &self.config.mqtt.prefix)
            .with_name_prefix(&self.config.mqtt.name_prefix))
    }

    /// Connect to the broker and serve until `shutdown` turns true
    pub async fn run(&self, shutdown: watch::Receiver<bool>) -> Result<()> {
        let builder = self.discovery().await?;
        let availability = builder.topics().availability();

        let (bus, inbound) = MqttBus::connect(&self.config.mqtt.settings(), &availability);
        let bus = Arc::new(bus);

        let served = self
            .serve(builder, bus.clone(), inbound, shutdown)
            .await;

        if let Err(e) = bus.disconnect().await {
            warn!(error = %e, "MQTT disconnect failed");
        }
        served
    }

    /// Polling loop over an established bus
    pub async fn serve(
        &self,
        builder: DiscoveryBuilder,
        bus: Arc<dyn BusClient>,
        inbound: mpsc::Receiver<InboundMessage>,
        mut shutdown: watch::Receiver<bool>,
    ) -> Result<()> {
        let availability = builder.topics().availability();
        let polling_topic = self
            .config
            .mqtt
            .polling_status_topic(&builder.vehicle().vin);

        let listener = if self.config.vehicle.allow_commands {
            let dispatcher = CommandDispatcher::new(self.api.clone(), bus.clone(), builder.clone());
            dispatcher.subscribe().await?;
            Some(dispatcher.run(inbound))
        } else {
            info!("Remote commands disabled");
            drop(inbound);
            None
        };

        let mut cycle = PublishCycle::new(self.api.clone(), bus.clone(), builder)
            .with_polling_status_topic(polling_topic);
        let interval = self.config.vehicle.refresh_interval();
        info!(interval_secs = interval.as_secs(), "Polling started");

        while !*shutdown.borrow() {
            cycle.tick().await;

            tokio::select! {
                _ = tokio::time::sleep(interval) => {}
                changed = shutdown.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
            }
        }

        info!("Shutting down");
        if let Some(listener) = listener {
            listener.abort();
        }
        bus.publish(&availability, PAYLOAD_NOT_AVAILABLE.as_bytes().to_vec(), true)
            .await?;
        Ok(())
    }
}

use anyhow::{anyhow, Result};
use rumqttc::v5::{mqttbytes::QoS, Client, Connection, Event, MqttOptions};
use std::thread::JoinHandle;
use std::time::Duration;

use super::publisher::ReportPublisher;
use super::tls::{build_transport, MqttEndpoint, TlsMaterials};

/// Request channel capacity between the frame loop and the connection thread.
const REQUEST_CAPACITY: usize = 10;

#[derive(Clone, Debug)]
pub struct MqttPublisherConfig {
    pub endpoint: MqttEndpoint,
    pub client_id: String,
    pub username: Option<String>,
    pub password: Option<String>,
    pub keep_alive: Duration,
}

/// rumqttc-backed publisher.
///
/// The connection event loop runs on its own thread. Publishes use
/// `try_publish`, so a full request channel or a dead connection turns into an
/// error for the caller instead of blocking the frame loop.
pub struct MqttPublisher {
    client: Client,
    connection_handle: Option<JoinHandle<()>>,
}

impl MqttPublisher {
    pub fn connect(config: &MqttPublisherConfig, tls: &TlsMaterials) -> Result<Self> {
        let mut options = MqttOptions::new(
            config.client_id.clone(),
            config.endpoint.host.clone(),
            config.endpoint.port,
        );
        options.set_keep_alive(config.keep_alive);
        options.set_clean_start(true);
        if let Some(user) = config.username.as_deref() {
            options.set_credentials(user, config.password.clone().unwrap_or_default());
        }
        options.set_transport(build_transport(&config.endpoint, tls)?);

        let (client, connection) = Client::new(options, REQUEST_CAPACITY);
        log::info!(
            "MQTT client started for {}:{} (TLS: {}, auth: {})",
            config.endpoint.host,
            config.endpoint.port,
            config.endpoint.use_tls,
            config.username.is_some()
        );
        Ok(Self {
            client,
            connection_handle: Some(spawn_connection(connection)),
        })
    }
}

fn spawn_connection(mut connection: Connection) -> JoinHandle<()> {
    std::thread::spawn(move || {
        for event in connection.iter() {
            match event {
                Ok(Event::Incoming(incoming)) => {
                    log::trace!("MQTT incoming: {:?}", incoming);
                }
                Ok(Event::Outgoing(_)) => {}
                Err(e) => {
                    log::warn!("MQTT connection error: {}", e);
                    break;
                }
            }
        }
    })
}

impl ReportPublisher for MqttPublisher {
    fn publish(&mut self, topic: &str, payload: &[u8]) -> Result<()> {
        self.client
            .try_publish(topic, QoS::AtLeastOnce, false, payload.to_vec())
            .map_err(|e| anyhow!("MQTT publish to {} failed: {}", topic, e))
    }

    fn shutdown(&mut self) -> Result<()> {
        let result = self
            .client
            .try_disconnect()
            .map_err(|e| anyhow!("MQTT disconnect failed: {}", e));
        if let Some(handle) = self.connection_handle.take() {
            let _ = handle.join();
        }
        result
    }
}

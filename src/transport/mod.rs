//! Report publishing.
//!
//! The monitor hands every outbound message to a `ReportPublisher` exactly once.
//! Publishing is best-effort: failures are returned to the caller, which logs
//! them and moves on. Nothing here retries or queues.

mod mqtt;
mod publisher;
mod tls;

pub use mqtt::{MqttPublisher, MqttPublisherConfig};
pub use publisher::{NullPublisher, PublishedMessage, RecordingPublisher, ReportPublisher};
pub use tls::{build_transport, parse_mqtt_endpoint, MqttEndpoint, TlsMaterials};

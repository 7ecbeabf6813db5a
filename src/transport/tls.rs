//! Broker address parsing and TLS transport selection.
//!
//! - `host:port`, `mqtt://`, `tcp://` are plain TCP unless TLS is forced
//! - `mqtts://`, `ssl://` are TLS
//! - TLS without custom materials uses the rumqttc default root store
//! - a client certificate and key come as a pair, and need a CA

use anyhow::{anyhow, bail, Context, Result};
use rumqttc::Transport;
use std::path::Path;

/// Where the broker lives and whether to speak TLS to it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MqttEndpoint {
    pub host: String,
    pub port: u16,
    pub use_tls: bool,
}

/// PEM material read from disk for a TLS broker connection.
#[derive(Clone, Debug, Default)]
pub struct TlsMaterials {
    /// CA bundle. `None` falls back to the default roots.
    pub ca: Option<Vec<u8>>,

    /// Client certificate and key, for brokers that require mutual TLS.
    pub client_auth: Option<(Vec<u8>, Vec<u8>)>,
}

impl TlsMaterials {
    pub fn load(
        ca_path: Option<&Path>,
        client_cert_path: Option<&Path>,
        client_key_path: Option<&Path>,
    ) -> Result<Self> {
        let ca = ca_path.map(|path| read_pem(path, "CA")).transpose()?;
        let client_auth = match (client_cert_path, client_key_path) {
            (None, None) => None,
            (Some(cert), Some(key)) => {
                Some((read_pem(cert, "client cert")?, read_pem(key, "client key")?))
            }
            (Some(_), None) => bail!("MQTT TLS client certificate provided without key"),
            (None, Some(_)) => bail!("MQTT TLS client key provided without certificate"),
        };
        Ok(Self { ca, client_auth })
    }

    pub fn is_configured(&self) -> bool {
        self.ca.is_some() || self.client_auth.is_some()
    }
}

fn read_pem(path: &Path, what: &str) -> Result<Vec<u8>> {
    std::fs::read(path)
        .with_context(|| format!("failed to read MQTT TLS {} '{}'", what, path.display()))
}

/// Choose the rumqttc transport for an endpoint.
pub fn build_transport(endpoint: &MqttEndpoint, tls: &TlsMaterials) -> Result<Transport> {
    match (endpoint.use_tls, tls.is_configured()) {
        (false, false) => Ok(Transport::tcp()),
        (false, true) => Err(anyhow!(
            "MQTT TLS materials provided but TLS is disabled (set mqtt.use_tls or use mqtts://)"
        )),
        (true, false) => Ok(Transport::tls_with_default_config()),
        (true, true) => {
            let ca = tls.ca.clone().ok_or_else(|| {
                anyhow!("MQTT TLS CA certificate is required when providing client certificates")
            })?;
            Ok(Transport::tls(ca, tls.client_auth.clone(), None))
        }
    }
}

/// Parse a broker address. `force_tls` upgrades schemeless and `mqtt://` addresses.
pub fn parse_mqtt_endpoint(addr: &str, force_tls: bool) -> Result<MqttEndpoint> {
    let addr = addr.trim();
    let (scheme_tls, authority) = match addr.split_once("://") {
        None => (false, addr),
        Some(("mqtt" | "tcp", rest)) => (false, rest),
        Some(("mqtts" | "ssl", rest)) => (true, rest),
        Some((other, _)) => bail!("unsupported MQTT scheme: {}", other),
    };

    let (host, port) = split_host_port(authority)
        .with_context(|| format!("invalid MQTT broker address '{}'", addr))?;
    if host.is_empty() {
        bail!("missing MQTT host in '{}'", addr);
    }
    Ok(MqttEndpoint {
        host: host.to_string(),
        port,
        use_tls: scheme_tls || force_tls,
    })
}

/// `host:port` or `[v6addr]:port`.
fn split_host_port(authority: &str) -> Result<(&str, u16)> {
    let (host, port) = match authority.strip_prefix('[') {
        Some(bracketed) => {
            let (host, tail) = bracketed
                .split_once(']')
                .ok_or_else(|| anyhow!("unterminated IPv6 literal"))?;
            let port = tail
                .strip_prefix(':')
                .ok_or_else(|| anyhow!("missing port"))?;
            (host, port)
        }
        None => authority
            .rsplit_once(':')
            .ok_or_else(|| anyhow!("missing port"))?,
    };
    let port = port
        .parse::<u16>()
        .map_err(|_| anyhow!("port '{}' is not a number in 0..=65535", port))?;
    Ok((host, port))
}

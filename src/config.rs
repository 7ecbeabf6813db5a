use anyhow::{anyhow, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::scoring::{
    BenchIdentity, ScoringPolicy, DEFAULT_ACCEPT_THRESHOLD, DEFAULT_COOLDOWN,
    DEFAULT_DEDUCTION_PER_EVENT, DEFAULT_PERIOD, DEFAULT_TOPIC,
};

const DEFAULT_STUDENT_ID: &str = "231549999";
const DEFAULT_BENCH_ID: &str = "66";
const DEFAULT_BROKER_ADDR: &str = "broker.hivemq.com:1883";
const DEFAULT_CLIENT_ID: &str = "openmv";
const DEFAULT_KEEP_ALIVE_SECS: u64 = 60;
const DEFAULT_SOURCE_URL: &str = "stub://bench";
const DEFAULT_SOURCE_FPS: u32 = 10;
const DEFAULT_FRAME_WIDTH: u32 = 240;
const DEFAULT_FRAME_HEIGHT: u32 = 240;
const DEFAULT_BACKEND: &str = "stub";
const DEFAULT_MODEL_PATH: &str = "trained.onnx";
const DEFAULT_LABELS_PATH: &str = "labels.txt";

#[derive(Debug, Deserialize, Default)]
struct MonitorConfigFile {
    session: Option<SessionConfigFile>,
    mqtt: Option<MqttConfigFile>,
    source: Option<SourceConfigFile>,
    classifier: Option<ClassifierConfigFile>,
    indicator: Option<IndicatorConfigFile>,
}

#[derive(Debug, Deserialize, Default)]
struct SessionConfigFile {
    student_id: Option<String>,
    bench_id: Option<String>,
    deduction_per_event: Option<u32>,
    period_secs: Option<u64>,
    cooldown_secs: Option<u64>,
    accept_threshold: Option<f32>,
}

#[derive(Debug, Deserialize, Default)]
struct MqttConfigFile {
    broker_addr: Option<String>,
    client_id: Option<String>,
    topic: Option<String>,
    username: Option<String>,
    password: Option<String>,
    use_tls: Option<bool>,
    tls_ca_path: Option<PathBuf>,
    tls_client_cert_path: Option<PathBuf>,
    tls_client_key_path: Option<PathBuf>,
    keep_alive_secs: Option<u64>,
}

#[derive(Debug, Deserialize, Default)]
struct SourceConfigFile {
    url: Option<String>,
    target_fps: Option<u32>,
    width: Option<u32>,
    height: Option<u32>,
}

#[derive(Debug, Deserialize, Default)]
struct ClassifierConfigFile {
    backend: Option<String>,
    model_path: Option<PathBuf>,
    labels_path: Option<PathBuf>,
    target_label: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
struct IndicatorConfigFile {
    led_path: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct MonitorConfig {
    pub identity: BenchIdentity,
    pub policy: ScoringPolicy,
    pub mqtt: MqttSettings,
    pub source: SourceSettings,
    pub classifier: ClassifierSettings,
    pub led_path: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct MqttSettings {
    pub broker_addr: String,
    pub client_id: String,
    pub topic: String,
    pub username: Option<String>,
    pub password: Option<String>,
    pub use_tls: bool,
    pub tls_ca_path: Option<PathBuf>,
    pub tls_client_cert_path: Option<PathBuf>,
    pub tls_client_key_path: Option<PathBuf>,
    pub keep_alive: Duration,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceSettings {
    pub url: String,
    pub target_fps: u32,
    pub width: u32,
    pub height: u32,
}

impl SourceSettings {
    /// Target spacing between frames.
    pub fn frame_interval(&self) -> Duration {
        Duration::from_secs(1) / self.target_fps.max(1)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassifierSettings {
    pub backend: String,
    pub model_path: PathBuf,
    pub labels_path: PathBuf,
    pub target_label: Option<String>,
}

impl MonitorConfig {
    /// Load from the file named by `CLEANLINESS_CONFIG` (if set), then env overrides.
    pub fn load() -> Result<Self> {
        let config_path = std::env::var("CLEANLINESS_CONFIG").ok();
        Self::load_from(config_path.as_deref().map(Path::new))
    }

    /// Load from an explicit file (or defaults), then env overrides.
    pub fn load_from(path: Option<&Path>) -> Result<Self> {
        let file_cfg = match path {
            Some(path) => Some(read_config_file(path)?),
            None => None,
        };
        let mut cfg = Self::from_file(file_cfg.unwrap_or_default());
        cfg.apply_env()?;
        cfg.validate()?;
        Ok(cfg)
    }

    fn from_file(file: MonitorConfigFile) -> Self {
        let session = file.session.unwrap_or_default();
        let mqtt = file.mqtt.unwrap_or_default();
        let source = file.source.unwrap_or_default();
        let classifier = file.classifier.unwrap_or_default();

        let identity = BenchIdentity {
            student_id: session
                .student_id
                .unwrap_or_else(|| DEFAULT_STUDENT_ID.to_string()),
            bench_id: session
                .bench_id
                .unwrap_or_else(|| DEFAULT_BENCH_ID.to_string()),
        };
        let policy = ScoringPolicy {
            deduction_per_event: session
                .deduction_per_event
                .unwrap_or(DEFAULT_DEDUCTION_PER_EVENT),
            period: session
                .period_secs
                .map(Duration::from_secs)
                .unwrap_or(DEFAULT_PERIOD),
            cooldown: session
                .cooldown_secs
                .map(Duration::from_secs)
                .unwrap_or(DEFAULT_COOLDOWN),
            accept_threshold: session
                .accept_threshold
                .unwrap_or(DEFAULT_ACCEPT_THRESHOLD),
        };
        let mqtt = MqttSettings {
            broker_addr: mqtt
                .broker_addr
                .unwrap_or_else(|| DEFAULT_BROKER_ADDR.to_string()),
            client_id: mqtt
                .client_id
                .unwrap_or_else(|| DEFAULT_CLIENT_ID.to_string()),
            topic: mqtt.topic.unwrap_or_else(|| DEFAULT_TOPIC.to_string()),
            username: mqtt.username,
            password: mqtt.password,
            use_tls: mqtt.use_tls.unwrap_or(false),
            tls_ca_path: mqtt.tls_ca_path,
            tls_client_cert_path: mqtt.tls_client_cert_path,
            tls_client_key_path: mqtt.tls_client_key_path,
            keep_alive: Duration::from_secs(
                mqtt.keep_alive_secs.unwrap_or(DEFAULT_KEEP_ALIVE_SECS),
            ),
        };
        let source = SourceSettings {
            url: source
                .url
                .unwrap_or_else(|| DEFAULT_SOURCE_URL.to_string()),
            target_fps: source.target_fps.unwrap_or(DEFAULT_SOURCE_FPS),
            width: source.width.unwrap_or(DEFAULT_FRAME_WIDTH),
            height: source.height.unwrap_or(DEFAULT_FRAME_HEIGHT),
        };
        let classifier = ClassifierSettings {
            backend: classifier
                .backend
                .unwrap_or_else(|| DEFAULT_BACKEND.to_string()),
            model_path: classifier
                .model_path
                .unwrap_or_else(|| PathBuf::from(DEFAULT_MODEL_PATH)),
            labels_path: classifier
                .labels_path
                .unwrap_or_else(|| PathBuf::from(DEFAULT_LABELS_PATH)),
            target_label: classifier.target_label,
        };
        Self {
            identity,
            policy,
            mqtt,
            source,
            classifier,
            led_path: file.indicator.and_then(|indicator| indicator.led_path),
        }
    }

    fn apply_env(&mut self) -> Result<()> {
        if let Some(value) = env_string("CLEANLINESS_STUDENT_ID") {
            self.identity.student_id = value;
        }
        if let Some(value) = env_string("CLEANLINESS_BENCH_ID") {
            self.identity.bench_id = value;
        }
        if let Some(value) = env_string("CLEANLINESS_DEDUCTION") {
            self.policy.deduction_per_event = value
                .parse()
                .map_err(|_| anyhow!("CLEANLINESS_DEDUCTION must be an integer number of points"))?;
        }
        if let Some(value) = env_string("CLEANLINESS_PERIOD_SECS") {
            let seconds: u64 = value.parse().map_err(|_| {
                anyhow!("CLEANLINESS_PERIOD_SECS must be an integer number of seconds")
            })?;
            self.policy.period = Duration::from_secs(seconds);
        }
        if let Some(value) = env_string("CLEANLINESS_COOLDOWN_SECS") {
            let seconds: u64 = value.parse().map_err(|_| {
                anyhow!("CLEANLINESS_COOLDOWN_SECS must be an integer number of seconds")
            })?;
            self.policy.cooldown = Duration::from_secs(seconds);
        }
        if let Some(value) = env_string("CLEANLINESS_ACCEPT_THRESHOLD") {
            self.policy.accept_threshold = value
                .parse()
                .map_err(|_| anyhow!("CLEANLINESS_ACCEPT_THRESHOLD must be a number in [0, 1]"))?;
        }
        if let Some(value) = env_string("CLEANLINESS_SOURCE_URL") {
            self.source.url = value;
        }
        if let Some(value) = env_string("CLEANLINESS_BACKEND") {
            self.classifier.backend = value;
        }
        if let Some(value) = env_string("CLEANLINESS_MODEL_PATH") {
            self.classifier.model_path = PathBuf::from(value);
        }
        if let Some(value) = env_string("CLEANLINESS_LABELS_PATH") {
            self.classifier.labels_path = PathBuf::from(value);
        }
        if let Some(value) = env_string("CLEANLINESS_LED_PATH") {
            self.led_path = Some(PathBuf::from(value));
        }
        if let Some(value) = env_string("MQTT_BROKER_ADDR") {
            self.mqtt.broker_addr = value;
        }
        if let Some(value) = env_string("MQTT_TOPIC") {
            self.mqtt.topic = value;
        }
        if let Some(value) = env_string("MQTT_CLIENT_ID") {
            self.mqtt.client_id = value;
        }
        if let Some(value) = env_string("MQTT_USERNAME") {
            self.mqtt.username = Some(value);
        }
        if let Some(value) = env_string("MQTT_PASSWORD") {
            self.mqtt.password = Some(value);
        }
        if let Some(value) = env_string("MQTT_USE_TLS") {
            self.mqtt.use_tls = parse_bool(&value)
                .ok_or_else(|| anyhow!("MQTT_USE_TLS must be true or false"))?;
        }
        Ok(())
    }

    fn validate(&mut self) -> Result<()> {
        validate_identifier("student_id", &self.identity.student_id)?;
        validate_identifier("bench_id", &self.identity.bench_id)?;
        self.policy.validate()?;
        validate_topic(&self.mqtt.topic)?;
        if self.mqtt.client_id.trim().is_empty() {
            return Err(anyhow!("mqtt client_id must not be empty"));
        }
        if self.source.target_fps == 0 {
            return Err(anyhow!("source target_fps must be greater than zero"));
        }
        if self.source.width == 0 || self.source.height == 0 {
            return Err(anyhow!("source frame size must be non-empty"));
        }
        Ok(())
    }
}

/// Identifiers end up in the report payload: `^[A-Za-z0-9_-]{1,64}$`.
pub fn validate_identifier(field: &str, value: &str) -> Result<()> {
    let re = regex::Regex::new(r"^[A-Za-z0-9_-]{1,64}$")?;
    if !re.is_match(value) {
        return Err(anyhow!(
            "{} must match ^[A-Za-z0-9_-]{{1,64}}$, got '{}'",
            field,
            value
        ));
    }
    Ok(())
}

/// Publish topics must be non-empty and free of MQTT wildcards.
pub fn validate_topic(topic: &str) -> Result<()> {
    if topic.is_empty() {
        return Err(anyhow!("mqtt topic must not be empty"));
    }
    if topic.contains(&['+', '#', '\0'][..]) {
        return Err(anyhow!(
            "mqtt topic '{}' must not contain wildcards or NUL",
            topic
        ));
    }
    Ok(())
}

fn read_config_file(path: &Path) -> Result<MonitorConfigFile> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| anyhow!("failed to read config file {}: {}", path.display(), e))?;
    let cfg = serde_json::from_str(&raw)
        .map_err(|e| anyhow!("invalid config file {}: {}", path.display(), e))?;
    Ok(cfg)
}

fn env_string(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identifiers_are_allowlisted() {
        assert!(validate_identifier("bench_id", "66").is_ok());
        assert!(validate_identifier("bench_id", "lab-3_bench7").is_ok());
        assert!(validate_identifier("bench_id", "").is_err());
        assert!(validate_identifier("bench_id", "66 ").is_err());
        assert!(validate_identifier("student_id", "a/b").is_err());
    }

    #[test]
    fn topics_reject_wildcards() {
        assert!(validate_topic("mqtt/test/result").is_ok());
        assert!(validate_topic("mqtt/+/result").is_err());
        assert!(validate_topic("mqtt/#").is_err());
        assert!(validate_topic("").is_err());
    }

    #[test]
    fn frame_interval_follows_fps() {
        let settings = SourceSettings {
            url: DEFAULT_SOURCE_URL.to_string(),
            target_fps: 10,
            width: 1,
            height: 1,
        };
        assert_eq!(settings.frame_interval(), Duration::from_millis(100));
    }

    #[test]
    fn parse_bool_accepts_common_spellings() {
        assert_eq!(parse_bool("TRUE"), Some(true));
        assert_eq!(parse_bool("off"), Some(false));
        assert_eq!(parse_bool("maybe"), None);
    }
}

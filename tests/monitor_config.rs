use std::path::PathBuf;
use std::sync::Mutex;
use std::time::Duration;

use tempfile::NamedTempFile;

use cleanliness_monitor::config::MonitorConfig;

static ENV_LOCK: Mutex<()> = Mutex::new(());

fn clear_env() {
    for key in [
        "CLEANLINESS_CONFIG",
        "CLEANLINESS_STUDENT_ID",
        "CLEANLINESS_BENCH_ID",
        "CLEANLINESS_DEDUCTION",
        "CLEANLINESS_PERIOD_SECS",
        "CLEANLINESS_COOLDOWN_SECS",
        "CLEANLINESS_ACCEPT_THRESHOLD",
        "CLEANLINESS_SOURCE_URL",
        "CLEANLINESS_BACKEND",
        "CLEANLINESS_MODEL_PATH",
        "CLEANLINESS_LABELS_PATH",
        "CLEANLINESS_LED_PATH",
        "MQTT_BROKER_ADDR",
        "MQTT_TOPIC",
        "MQTT_CLIENT_ID",
        "MQTT_USERNAME",
        "MQTT_PASSWORD",
        "MQTT_USE_TLS",
    ] {
        std::env::remove_var(key);
    }
}

fn write_config(json: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("temp config");
    std::io::Write::write_all(&mut file, json.as_bytes()).expect("write config");
    file
}

#[test]
fn defaults_without_file_or_env() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    let cfg = MonitorConfig::load().expect("load defaults");

    assert_eq!(cfg.identity.student_id, "231549999");
    assert_eq!(cfg.identity.bench_id, "66");
    assert_eq!(cfg.policy.deduction_per_event, 20);
    assert_eq!(cfg.policy.period, Duration::from_secs(30));
    assert_eq!(cfg.policy.cooldown, Duration::from_secs(5));
    assert!((cfg.policy.accept_threshold - 0.95).abs() < f32::EPSILON);
    assert_eq!(cfg.mqtt.broker_addr, "broker.hivemq.com:1883");
    assert_eq!(cfg.mqtt.topic, "mqtt/test/result");
    assert_eq!(cfg.mqtt.client_id, "openmv");
    assert!(!cfg.mqtt.use_tls);
    assert_eq!(cfg.source.url, "stub://bench");
    assert_eq!(cfg.source.frame_interval(), Duration::from_millis(100));
    assert_eq!(cfg.classifier.backend, "stub");
    assert!(cfg.led_path.is_none());

    clear_env();
}

#[test]
fn loads_config_from_file_and_env_overrides() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    let file = write_config(
        r#"{
            "session": {
                "student_id": "s1001",
                "bench_id": "12",
                "deduction_per_event": 10,
                "period_secs": 600,
                "cooldown_secs": 15
            },
            "mqtt": {
                "broker_addr": "mqtts://broker.lab:8883",
                "topic": "lab/bench/12",
                "keep_alive_secs": 30
            },
            "source": {
                "url": "dir:///srv/frames",
                "target_fps": 4,
                "width": 320,
                "height": 240
            },
            "classifier": {
                "backend": "tract",
                "model_path": "/opt/models/trained.onnx",
                "target_label": "rubbish"
            },
            "indicator": {
                "led_path": "/sys/class/leds/red/brightness"
            }
        }"#,
    );

    std::env::set_var("CLEANLINESS_CONFIG", file.path());
    std::env::set_var("CLEANLINESS_BENCH_ID", "14");
    std::env::set_var("CLEANLINESS_ACCEPT_THRESHOLD", "0.8");
    std::env::set_var("MQTT_CLIENT_ID", "bench-14");

    let cfg = MonitorConfig::load().expect("load config");

    assert_eq!(cfg.identity.student_id, "s1001");
    assert_eq!(cfg.identity.bench_id, "14");
    assert_eq!(cfg.policy.deduction_per_event, 10);
    assert_eq!(cfg.policy.period, Duration::from_secs(600));
    assert_eq!(cfg.policy.cooldown, Duration::from_secs(15));
    assert!((cfg.policy.accept_threshold - 0.8).abs() < f32::EPSILON);
    assert_eq!(cfg.mqtt.broker_addr, "mqtts://broker.lab:8883");
    assert_eq!(cfg.mqtt.topic, "lab/bench/12");
    assert_eq!(cfg.mqtt.client_id, "bench-14");
    assert_eq!(cfg.mqtt.keep_alive, Duration::from_secs(30));
    assert_eq!(cfg.source.url, "dir:///srv/frames");
    assert_eq!(cfg.source.target_fps, 4);
    assert_eq!(cfg.source.width, 320);
    assert_eq!(cfg.classifier.backend, "tract");
    assert_eq!(
        cfg.classifier.model_path,
        PathBuf::from("/opt/models/trained.onnx")
    );
    assert_eq!(cfg.classifier.labels_path, PathBuf::from("labels.txt"));
    assert_eq!(cfg.classifier.target_label.as_deref(), Some("rubbish"));
    assert_eq!(
        cfg.led_path,
        Some(PathBuf::from("/sys/class/leds/red/brightness"))
    );

    clear_env();
}

#[test]
fn rejects_invalid_values() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    std::env::set_var("CLEANLINESS_BENCH_ID", "bench 66");
    assert!(MonitorConfig::load().is_err());
    clear_env();

    std::env::set_var("MQTT_TOPIC", "mqtt/+/result");
    assert!(MonitorConfig::load().is_err());
    clear_env();

    std::env::set_var("CLEANLINESS_PERIOD_SECS", "0");
    assert!(MonitorConfig::load().is_err());
    clear_env();

    std::env::set_var("CLEANLINESS_DEDUCTION", "twenty");
    assert!(MonitorConfig::load().is_err());
    clear_env();

    std::env::set_var("MQTT_USE_TLS", "sometimes");
    assert!(MonitorConfig::load().is_err());
    clear_env();

    let file = write_config(r#"{"session": {"accept_threshold": 1.5}}"#);
    assert!(MonitorConfig::load_from(Some(file.path())).is_err());

    let file = write_config("not json");
    let err = MonitorConfig::load_from(Some(file.path())).unwrap_err();
    assert!(err.to_string().contains("invalid config file"));

    clear_env();
}

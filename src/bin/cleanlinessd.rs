//! cleanlinessd - bench cleanliness scoring daemon
//!
//! This daemon:
//! 1. Loads configuration (file + environment)
//! 2. Opens the frame source and classifier (fatal on failure)
//! 3. Starts the MQTT publisher (connection problems are logged, not fatal)
//! 4. Runs one scoring period, lighting the indicator on clutter
//! 5. Publishes the final report, prints it to stdout and exits

use anyhow::Result;
use clap::Parser;
use std::io::IsTerminal;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use cleanliness_monitor::transport::{parse_mqtt_endpoint, TlsMaterials};
use cleanliness_monitor::{
    open_backend, open_indicator, open_source, Clock, Monitor, MonitorConfig, MqttPublisher,
    MqttPublisherConfig, NullPublisher, ReportPublisher, RunOutcome, ScoringSession, SystemClock,
};

#[path = "../ui.rs"]
mod ui;

#[derive(Parser, Debug)]
#[command(author, version, about = "Score bench cleanliness over one scoring period")]
struct Args {
    /// Path to a JSON config file.
    #[arg(long, env = "CLEANLINESS_CONFIG")]
    config: Option<PathBuf>,

    /// Score locally without publishing anything.
    #[arg(long, env = "CLEANLINESS_NO_PUBLISH")]
    no_publish: bool,

    /// UI mode for stderr progress (auto|plain|pretty).
    #[arg(long, default_value = "auto", value_name = "MODE")]
    ui: ui::UiMode,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();
    let ui = ui::Ui::new(args.ui, std::io::stderr().is_terminal());

    let stage = ui.stage("Load configuration");
    let cfg = MonitorConfig::load_from(args.config.as_deref())?;
    stage.done();

    let stage = ui.stage("Open frame source");
    let source = open_source(&cfg.source)?;
    stage.done();

    let stage = ui.stage("Load classifier");
    let classifier = open_backend(&cfg.classifier, cfg.source.width, cfg.source.height)?;
    stage.done();

    let publisher: Box<dyn ReportPublisher> = if args.no_publish {
        log::warn!("publishing disabled; reports are logged only");
        Box::new(NullPublisher)
    } else {
        let stage = ui.stage("Start MQTT client");
        let publisher = connect_publisher(&cfg)?;
        stage.done();
        publisher
    };

    let stop = Arc::new(AtomicBool::new(false));
    {
        let stop = stop.clone();
        ctrlc::set_handler(move || {
            stop.store(true, Ordering::SeqCst);
        })?;
    }

    let clock = SystemClock;
    let session = ScoringSession::new(cfg.policy.clone(), cfg.identity.clone(), clock.now());
    let mut monitor = Monitor::new(
        session,
        source,
        classifier,
        publisher,
        open_indicator(cfg.led_path.as_ref()),
        Box::new(clock),
        cfg.mqtt.topic.clone(),
        cfg.source.frame_interval(),
    );

    let outcome = monitor.run(&stop);
    if let Err(e) = monitor.shutdown() {
        log::warn!("publisher shutdown: {}", e);
    }

    match outcome? {
        RunOutcome::Completed(report) => {
            println!("{}", report.to_json()?);
        }
        RunOutcome::Interrupted(summary) => {
            log::info!(
                "interrupted after {} frames (score so far {})",
                monitor.frames_processed(),
                summary.total_score
            );
        }
    }
    Ok(())
}

fn connect_publisher(cfg: &MonitorConfig) -> Result<Box<dyn ReportPublisher>> {
    let endpoint = parse_mqtt_endpoint(&cfg.mqtt.broker_addr, cfg.mqtt.use_tls)?;
    let tls = TlsMaterials::load(
        cfg.mqtt.tls_ca_path.as_deref(),
        cfg.mqtt.tls_client_cert_path.as_deref(),
        cfg.mqtt.tls_client_key_path.as_deref(),
    )?;
    let publisher_cfg = MqttPublisherConfig {
        endpoint,
        client_id: cfg.mqtt.client_id.clone(),
        username: cfg.mqtt.username.clone(),
        password: cfg.mqtt.password.clone(),
        keep_alive: cfg.mqtt.keep_alive,
    };
    Ok(Box::new(MqttPublisher::connect(&publisher_cfg, &tls)?))
}

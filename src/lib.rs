//! Bench cleanliness monitor.
//!
//! Watches a camera feed for a trained clutter class, deducts points on each
//! qualifying detection (rate-limited by a cooldown), and reports a final
//! cleanliness score when the scoring period ends.
//!
//! # Module Structure
//!
//! - `scoring`: the scoring engine (`ScoringSession`) and its report payloads
//! - `detect`: classifier backends and the qualifying-detection rule
//! - `ingest`: frame sources
//! - `transport`: report publishers (MQTT, recording, null)
//! - `indicator`: clutter indicator drivers
//! - `monitor`: the frame loop tying the above together
//! - `config`: file + environment configuration
//! - `clock`: injected clocks

pub mod clock;
pub mod config;
pub mod detect;
pub mod frame;
pub mod indicator;
pub mod ingest;
pub mod monitor;
pub mod scoring;
pub mod transport;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{ClassifierSettings, MonitorConfig, MqttSettings, SourceSettings};
pub use detect::{
    first_qualifying, has_qualifying_detection, open_backend, ClassifierBackend, Detection,
    Region, StubBackend,
};
pub use frame::Frame;
pub use indicator::{open_indicator, Indicator, LogIndicator, SysfsLedIndicator};
pub use ingest::{open_source, FrameSource, SourceStats, SyntheticConfig, SyntheticSource};
pub use monitor::{Monitor, RunOutcome};
pub use scoring::{
    BenchIdentity, DetectionEvent, FinalReport, ScoringPolicy, ScoringSession, SessionState,
    SessionSummary, TickOutcome, VisualState, MAX_SCORE,
};
pub use transport::{
    MqttPublisher, MqttPublisherConfig, NullPublisher, RecordingPublisher, ReportPublisher,
};

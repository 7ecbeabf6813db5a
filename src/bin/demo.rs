//! demo - run a full scoring period offline, in simulated time.
//!
//! Uses the synthetic bench scene, the stub classifier and a manual clock, so a
//! 30 second period finishes instantly. Published payloads are recorded and
//! printed instead of being sent to a broker.

use anyhow::Result;
use clap::Parser;
use std::sync::atomic::AtomicBool;
use std::time::Duration;

use cleanliness_monitor::{
    BenchIdentity, Clock, LogIndicator, ManualClock, Monitor, RecordingPublisher, RunOutcome,
    ScoringPolicy, ScoringSession, StubBackend, SyntheticConfig, SyntheticSource,
};

#[derive(Parser, Debug)]
#[command(author, version, about = "Offline cleanliness scoring demo")]
struct Args {
    /// Scoring period in seconds.
    #[arg(long, default_value_t = 30)]
    period_secs: u64,

    /// Cooldown between deductions in seconds.
    #[arg(long, default_value_t = 5)]
    cooldown_secs: u64,

    /// Simulated frame rate.
    #[arg(long, default_value_t = 10)]
    fps: u32,

    /// Frames per clean + cluttered cycle of the synthetic scene.
    #[arg(long, default_value_t = 120)]
    cycle_frames: u64,

    /// Cluttered frames at the end of each cycle.
    #[arg(long, default_value_t = 40)]
    clutter_frames: u64,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let policy = ScoringPolicy {
        period: Duration::from_secs(args.period_secs),
        cooldown: Duration::from_secs(args.cooldown_secs),
        ..ScoringPolicy::default()
    };
    policy.validate()?;

    let source = SyntheticSource::new(SyntheticConfig {
        cycle_frames: args.cycle_frames,
        clutter_frames: args.clutter_frames,
        ..SyntheticConfig::default()
    })?;
    let clock = ManualClock::starting_now();
    let recorder = RecordingPublisher::new();
    let session = ScoringSession::new(
        policy,
        BenchIdentity::new("demo-student", "demo-bench"),
        clock.now(),
    );
    let mut monitor = Monitor::new(
        session,
        Box::new(source),
        Box::new(StubBackend::new()),
        Box::new(recorder.clone()),
        Box::new(LogIndicator::new()),
        Box::new(clock.clone()),
        cleanliness_monitor::scoring::DEFAULT_TOPIC,
        Duration::from_secs(1) / args.fps.max(1),
    );

    let outcome = monitor.run(&AtomicBool::new(false))?;
    monitor.shutdown()?;

    for message in recorder.messages() {
        println!("{} <- {}", message.topic, message.payload_str());
    }
    if let RunOutcome::Completed(report) = outcome {
        println!(
            "final score {} after {} frames",
            report.cleanliness_score,
            monitor.frames_processed()
        );
    }
    Ok(())
}

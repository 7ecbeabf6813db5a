//! Frame loop.
//!
//! One tick = one frame:
//! 1. Capture a frame from the source
//! 2. Classify it and reduce the detections to one evidence boolean
//! 3. Feed `(now, evidence)` into the scoring session
//! 4. Drive the indicator from the outcome
//! 5. Publish the outbound message, if the tick produced one
//!
//! Publish and indicator failures are logged and never touch the session.

use anyhow::Result;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use crate::clock::Clock;
use crate::detect::{first_qualifying, ClassifierBackend};
use crate::indicator::Indicator;
use crate::ingest::FrameSource;
use crate::scoring::{outbound_for, FinalReport, ScoringSession, SessionSummary, TickOutcome};
use crate::transport::ReportPublisher;

/// How a run finished.
#[derive(Clone, Debug, PartialEq)]
pub enum RunOutcome {
    /// The scoring period ended and the final report was emitted.
    Completed(FinalReport),
    /// The stop flag was raised before the period ended.
    Interrupted(SessionSummary),
}

pub struct Monitor {
    session: ScoringSession,
    source: Box<dyn FrameSource>,
    classifier: Box<dyn ClassifierBackend>,
    publisher: Box<dyn ReportPublisher>,
    indicator: Box<dyn Indicator>,
    clock: Box<dyn Clock>,
    topic: String,
    frame_interval: Duration,
    frames_processed: u64,
    final_report: Option<FinalReport>,
}

impl Monitor {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        session: ScoringSession,
        source: Box<dyn FrameSource>,
        classifier: Box<dyn ClassifierBackend>,
        publisher: Box<dyn ReportPublisher>,
        indicator: Box<dyn Indicator>,
        clock: Box<dyn Clock>,
        topic: impl Into<String>,
        frame_interval: Duration,
    ) -> Self {
        Self {
            session,
            source,
            classifier,
            publisher,
            indicator,
            clock,
            topic: topic.into(),
            frame_interval,
            frames_processed: 0,
            final_report: None,
        }
    }

    pub fn session(&self) -> &ScoringSession {
        &self.session
    }

    pub fn frames_processed(&self) -> u64 {
        self.frames_processed
    }

    pub fn final_report(&self) -> Option<&FinalReport> {
        self.final_report.as_ref()
    }

    /// Process one frame.
    ///
    /// Once the session has ended this returns `Idle` without capturing.
    pub fn step(&mut self) -> Result<TickOutcome> {
        if self.session.is_ended() {
            return Ok(TickOutcome::Idle);
        }

        let frame = self.source.next_frame()?;
        let threshold = self.session.policy().accept_threshold;
        let evidence = match frame.classify_with(self.classifier.as_mut()) {
            Ok(detections) => match first_qualifying(&detections, threshold) {
                Some(hit) => {
                    log::debug!(
                        "frame {}: {} ({:.3}) at x={} y={} w={} h={}",
                        frame.sequence,
                        hit.label,
                        hit.confidence,
                        hit.region.x,
                        hit.region.y,
                        hit.region.w,
                        hit.region.h
                    );
                    true
                }
                None => false,
            },
            Err(e) => {
                log::warn!(
                    "classifier {} failed on frame {}: {}",
                    self.classifier.name(),
                    frame.sequence,
                    e
                );
                false
            }
        };
        drop(frame);
        self.frames_processed += 1;

        let now = self.clock.now();
        let outcome = self.session.tick(now, evidence);
        self.apply(&outcome);
        Ok(outcome)
    }

    fn apply(&mut self, outcome: &TickOutcome) {
        if let TickOutcome::Ended(report) = outcome {
            self.log_final(report);
            self.final_report = Some(report.clone());
        }
        if outcome.deducted() {
            log::info!(
                "clutter recorded: score={} events={}",
                self.session.total_score(),
                self.session.event_count()
            );
        }

        if let Some(visual) = outcome.visual_state() {
            self.indicator.set(visual.is_on());
        }

        match outbound_for(outcome, &self.topic) {
            Ok(Some(message)) => {
                match self.publisher.publish(&message.topic, &message.payload) {
                    Ok(()) => log::info!("published {} to {}", message.kind, message.topic),
                    Err(e) => log::error!("failed to publish {}: {}", message.kind, e),
                }
            }
            Ok(None) => {}
            Err(e) => log::error!("failed to build outbound message: {}", e),
        }
    }

    fn log_final(&self, report: &FinalReport) {
        log::info!("==============================");
        log::info!(
            "scoring period ({}s) ended for student {} at bench {}",
            self.session.policy().period.as_secs(),
            report.student_id,
            report.bench_id
        );
        log::info!("final cleanliness score: {}", report.cleanliness_score);
        log::info!(
            "clutter detected {} times during the period",
            self.session.event_count()
        );
        log::info!("==============================");
    }

    /// Step until the period ends or `stop` is raised.
    pub fn run(&mut self, stop: &AtomicBool) -> Result<RunOutcome> {
        self.source.connect()?;
        self.classifier.warm_up()?;
        log::info!(
            "scoring {} for {}s from {} (classifier: {})",
            self.session.identity().bench_id,
            self.session.policy().period.as_secs(),
            self.source.name(),
            self.classifier.name()
        );

        loop {
            if stop.load(Ordering::SeqCst) {
                let summary = self.session.summary();
                log::warn!(
                    "stopped before the scoring period ended: score={} events={} (no final report)",
                    summary.total_score,
                    summary.event_count
                );
                self.indicator.set(false);
                return Ok(RunOutcome::Interrupted(summary));
            }

            let started = self.clock.now();
            let outcome = self.step()?;
            if let TickOutcome::Ended(report) = outcome {
                let stats = self.source.stats();
                log::debug!(
                    "source {} delivered {} frames",
                    stats.url,
                    stats.frames_captured
                );
                return Ok(RunOutcome::Completed(report));
            }
            if outcome.is_idle() {
                return Ok(match self.final_report.clone() {
                    Some(report) => RunOutcome::Completed(report),
                    None => RunOutcome::Interrupted(self.session.summary()),
                });
            }

            let spent = self.clock.now().saturating_duration_since(started);
            if spent < self.frame_interval {
                self.clock.pace(self.frame_interval - spent);
            }
        }
    }

    /// Close the publisher. Call once after `run`.
    pub fn shutdown(&mut self) -> Result<()> {
        self.publisher.shutdown()
    }
}

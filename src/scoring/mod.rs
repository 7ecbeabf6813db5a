//! Cleanliness scoring engine.
//!
//! A `ScoringSession` turns a stream of per-frame evidence booleans into a
//! rate-limited, floored score and a one-shot final report:
//!
//! - The score starts at `MAX_SCORE` and only ever decreases, never below zero.
//! - Deductions are spaced by more than `ScoringPolicy::cooldown`.
//! - The session ends on the first tick where elapsed time exceeds
//!   `ScoringPolicy::period`. That tick emits the `FinalReport`, and every tick
//!   after it is a no-op.
//!
//! The engine performs no I/O and has no error path. Callers own publishing and
//! the indicator; failures there never feed back into the score.

use anyhow::{anyhow, Result};
use serde::Serialize;
use std::time::{Duration, Instant};

pub mod report;

pub use report::{
    outbound_for, DetectionEvent, FinalReport, OutboundMessage, SessionMessage, DEFAULT_TOPIC,
    DETECTION_MESSAGE,
};

/// Starting (and maximum) score of every session.
pub const MAX_SCORE: u32 = 100;

pub const DEFAULT_DEDUCTION_PER_EVENT: u32 = 20;
pub const DEFAULT_PERIOD: Duration = Duration::from_secs(30);
pub const DEFAULT_COOLDOWN: Duration = Duration::from_secs(5);
pub const DEFAULT_ACCEPT_THRESHOLD: f32 = 0.95;

/// Scoring constants, fixed for the lifetime of a session.
#[derive(Clone, Debug, PartialEq)]
pub struct ScoringPolicy {
    /// Points removed per deduction event.
    pub deduction_per_event: u32,
    /// Length of the scoring period.
    pub period: Duration,
    /// Minimum spacing between two deduction events.
    pub cooldown: Duration,
    /// A detection qualifies when its confidence is strictly above this.
    pub accept_threshold: f32,
}

impl Default for ScoringPolicy {
    fn default() -> Self {
        Self {
            deduction_per_event: DEFAULT_DEDUCTION_PER_EVENT,
            period: DEFAULT_PERIOD,
            cooldown: DEFAULT_COOLDOWN,
            accept_threshold: DEFAULT_ACCEPT_THRESHOLD,
        }
    }
}

impl ScoringPolicy {
    pub fn validate(&self) -> Result<()> {
        if self.deduction_per_event == 0 {
            return Err(anyhow!("deduction per event must be greater than zero"));
        }
        if self.deduction_per_event > MAX_SCORE {
            return Err(anyhow!(
                "deduction per event must not exceed {} points",
                MAX_SCORE
            ));
        }
        if self.period.is_zero() {
            return Err(anyhow!("scoring period must be greater than zero"));
        }
        if !(0.0..=1.0).contains(&self.accept_threshold) {
            return Err(anyhow!(
                "accept threshold must be within [0, 1], got {}",
                self.accept_threshold
            ));
        }
        Ok(())
    }
}

/// Who is being scored. Carried into the final report.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BenchIdentity {
    pub student_id: String,
    pub bench_id: String,
}

impl BenchIdentity {
    pub fn new(student_id: impl Into<String>, bench_id: impl Into<String>) -> Self {
        Self {
            student_id: student_id.into(),
            bench_id: bench_id.into(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    Active,
    Ended,
}

/// What the indicator should show after a tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VisualState {
    Clear,
    Alert,
}

impl VisualState {
    pub fn is_on(self) -> bool {
        matches!(self, Self::Alert)
    }
}

/// Result of feeding one tick into the session.
#[derive(Clone, Debug, PartialEq)]
pub enum TickOutcome {
    /// No qualifying detection this frame.
    Clear,
    /// Qualifying detection. `event` is set only when the tick deducted points.
    Alert { event: Option<DetectionEvent> },
    /// The scoring period just ended.
    Ended(FinalReport),
    /// The session had already ended; nothing happened.
    Idle,
}

impl TickOutcome {
    /// Indicator state implied by this outcome. `None` leaves the indicator alone.
    pub fn visual_state(&self) -> Option<VisualState> {
        match self {
            Self::Clear | Self::Ended(_) => Some(VisualState::Clear),
            Self::Alert { .. } => Some(VisualState::Alert),
            Self::Idle => None,
        }
    }

    pub fn deducted(&self) -> bool {
        matches!(self, Self::Alert { event: Some(_) })
    }

    pub fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }
}

/// Snapshot of the counters, for logging.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct SessionSummary {
    pub total_score: u32,
    pub event_count: u32,
    pub state: SessionState,
}

/// One scoring period for one bench.
#[derive(Clone, Debug)]
pub struct ScoringSession {
    policy: ScoringPolicy,
    identity: BenchIdentity,
    total_score: u32,
    session_start: Instant,
    last_event_time: Option<Instant>,
    event_count: u32,
    state: SessionState,
    final_report_sent: bool,
}

impl ScoringSession {
    pub fn new(policy: ScoringPolicy, identity: BenchIdentity, session_start: Instant) -> Self {
        Self {
            policy,
            identity,
            total_score: MAX_SCORE,
            session_start,
            last_event_time: None,
            event_count: 0,
            state: SessionState::Active,
            final_report_sent: false,
        }
    }

    /// Advance the session by one frame.
    ///
    /// `evidence` is whether the frame held at least one qualifying detection.
    /// Several qualifying detections in one frame still count once.
    pub fn tick(&mut self, now: Instant, evidence: bool) -> TickOutcome {
        if self.state == SessionState::Ended {
            return TickOutcome::Idle;
        }

        if self.elapsed(now) > self.policy.period {
            self.state = SessionState::Ended;
            if self.final_report_sent {
                return TickOutcome::Idle;
            }
            self.final_report_sent = true;
            return TickOutcome::Ended(self.final_report());
        }

        if !evidence {
            return TickOutcome::Clear;
        }

        if !self.cooldown_elapsed(now) {
            return TickOutcome::Alert { event: None };
        }

        self.total_score = self
            .total_score
            .saturating_sub(self.policy.deduction_per_event);
        self.event_count += 1;
        self.last_event_time = Some(now);
        TickOutcome::Alert {
            event: Some(DetectionEvent::default()),
        }
    }

    /// Time since session start. Never negative: an earlier `now` reads as zero.
    pub fn elapsed(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.session_start)
    }

    /// Time left in the scoring period, zero once it has run out.
    pub fn remaining(&self, now: Instant) -> Duration {
        self.policy.period.saturating_sub(self.elapsed(now))
    }

    fn cooldown_elapsed(&self, now: Instant) -> bool {
        match self.last_event_time {
            None => true,
            Some(last) => now.saturating_duration_since(last) > self.policy.cooldown,
        }
    }

    fn final_report(&self) -> FinalReport {
        FinalReport {
            student_id: self.identity.student_id.clone(),
            bench_id: self.identity.bench_id.clone(),
            cleanliness_score: self.total_score,
        }
    }

    pub fn policy(&self) -> &ScoringPolicy {
        &self.policy
    }

    pub fn identity(&self) -> &BenchIdentity {
        &self.identity
    }

    pub fn total_score(&self) -> u32 {
        self.total_score
    }

    pub fn event_count(&self) -> u32 {
        self.event_count
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_ended(&self) -> bool {
        self.state == SessionState::Ended
    }

    pub fn session_start(&self) -> Instant {
        self.session_start
    }

    pub fn last_event_time(&self) -> Option<Instant> {
        self.last_event_time
    }

    pub fn final_report_sent(&self) -> bool {
        self.final_report_sent
    }

    pub fn summary(&self) -> SessionSummary {
        SessionSummary {
            total_score: self.total_score,
            event_count: self.event_count,
            state: self.state,
        }
    }
}

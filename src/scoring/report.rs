//! Payloads emitted by the scoring engine.
//!
//! Both kinds go to the same topic:
//! - `DetectionEvent`: fixed plain-text message, once per deduction.
//! - `FinalReport`: JSON `{student_id, bench_id, cleanliness_score}`, once per session.

use anyhow::Result;
use serde::Serialize;

use super::TickOutcome;

pub const DEFAULT_TOPIC: &str = "mqtt/test/result";
pub const DETECTION_MESSAGE: &str = "there are some rubbish";

/// Emitted for every deduction.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DetectionEvent {
    pub message: &'static str,
}

impl Default for DetectionEvent {
    fn default() -> Self {
        Self {
            message: DETECTION_MESSAGE,
        }
    }
}

/// Emitted once, when the scoring period ends.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct FinalReport {
    pub student_id: String,
    pub bench_id: String,
    pub cleanliness_score: u32,
}

impl FinalReport {
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Either emitted payload kind.
#[derive(Clone, Debug, PartialEq)]
pub enum SessionMessage<'a> {
    Detection(&'a DetectionEvent),
    Final(&'a FinalReport),
}

impl<'a> SessionMessage<'a> {
    pub fn from_outcome(outcome: &'a TickOutcome) -> Option<Self> {
        match outcome {
            TickOutcome::Alert { event: Some(event) } => Some(Self::Detection(event)),
            TickOutcome::Ended(report) => Some(Self::Final(report)),
            _ => None,
        }
    }

    pub fn payload(&self) -> Result<Vec<u8>> {
        match self {
            Self::Detection(event) => Ok(event.message.as_bytes().to_vec()),
            Self::Final(report) => Ok(serde_json::to_vec(report)?),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Detection(_) => "detection event",
            Self::Final(_) => "final report",
        }
    }
}

/// A publish request ready for the report publisher.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OutboundMessage {
    pub kind: &'static str,
    pub topic: String,
    pub payload: Vec<u8>,
}

/// Build the publish request implied by a tick, if any.
pub fn outbound_for(outcome: &TickOutcome, topic: &str) -> Result<Option<OutboundMessage>> {
    let Some(message) = SessionMessage::from_outcome(outcome) else {
        return Ok(None);
    };
    Ok(Some(OutboundMessage {
        kind: message.kind(),
        topic: topic.to_string(),
        payload: message.payload()?,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(score: u32) -> FinalReport {
        FinalReport {
            student_id: "231549999".to_string(),
            bench_id: "66".to_string(),
            cleanliness_score: score,
        }
    }

    #[test]
    fn final_report_serializes_expected_keys() {
        let json = report(60).to_json().expect("serialize");
        assert_eq!(
            json,
            r#"{"student_id":"231549999","bench_id":"66","cleanliness_score":60}"#
        );
    }

    #[test]
    fn detection_outcome_publishes_fixed_text() {
        let outcome = TickOutcome::Alert {
            event: Some(DetectionEvent::default()),
        };
        let msg = outbound_for(&outcome, DEFAULT_TOPIC)
            .expect("build")
            .expect("message");
        assert_eq!(msg.topic, "mqtt/test/result");
        assert_eq!(msg.payload, b"there are some rubbish");
        assert_eq!(msg.kind, "detection event");
    }

    #[test]
    fn ended_outcome_publishes_json_report() {
        let outcome = TickOutcome::Ended(report(0));
        let msg = outbound_for(&outcome, "bench/66")
            .expect("build")
            .expect("message");
        let value: serde_json::Value = serde_json::from_slice(&msg.payload).expect("json");
        assert_eq!(value["cleanliness_score"], 0);
        assert_eq!(value["bench_id"], "66");
        assert_eq!(msg.topic, "bench/66");
    }

    #[test]
    fn quiet_outcomes_publish_nothing() {
        for outcome in [
            TickOutcome::Clear,
            TickOutcome::Idle,
            TickOutcome::Alert { event: None },
        ] {
            assert!(outbound_for(&outcome, DEFAULT_TOPIC).unwrap().is_none());
        }
    }
}

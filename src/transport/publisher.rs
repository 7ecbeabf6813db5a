use anyhow::{anyhow, Result};
use std::sync::{Arc, Mutex};

/// Best-effort delivery of a payload to a topic.
pub trait ReportPublisher: Send {
    fn publish(&mut self, topic: &str, payload: &[u8]) -> Result<()>;

    /// Flush and close the connection. Called once after the session.
    fn shutdown(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Publisher used when reporting is switched off.
#[derive(Debug, Default)]
pub struct NullPublisher;

impl ReportPublisher for NullPublisher {
    fn publish(&mut self, topic: &str, payload: &[u8]) -> Result<()> {
        log::debug!(
            "publishing disabled; dropped {} bytes for {}",
            payload.len(),
            topic
        );
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PublishedMessage {
    pub topic: String,
    pub payload: Vec<u8>,
}

impl PublishedMessage {
    pub fn payload_str(&self) -> &str {
        std::str::from_utf8(&self.payload).unwrap_or("<binary>")
    }
}

#[derive(Debug, Default)]
struct Recorded {
    messages: Vec<PublishedMessage>,
    attempts: usize,
    fail: bool,
}

/// In-memory publisher. Clones share the same record.
#[derive(Clone, Debug, Default)]
pub struct RecordingPublisher {
    inner: Arc<Mutex<Recorded>>,
}

impl RecordingPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    /// A publisher whose every attempt fails. Attempts are still counted.
    pub fn failing() -> Self {
        let publisher = Self::default();
        publisher.set_failing(true);
        publisher
    }

    pub fn set_failing(&self, fail: bool) {
        self.lock().fail = fail;
    }

    pub fn messages(&self) -> Vec<PublishedMessage> {
        self.lock().messages.clone()
    }

    pub fn attempts(&self) -> usize {
        self.lock().attempts
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Recorded> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl ReportPublisher for RecordingPublisher {
    fn publish(&mut self, topic: &str, payload: &[u8]) -> Result<()> {
        let mut inner = self.lock();
        inner.attempts += 1;
        if inner.fail {
            return Err(anyhow!("broker unavailable"));
        }
        inner.messages.push(PublishedMessage {
            topic: topic.to_string(),
            payload: payload.to_vec(),
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recording_publisher_shares_state_across_clones() {
        let recorder = RecordingPublisher::new();
        let mut publisher = recorder.clone();
        publisher.publish("mqtt/test/result", b"hello").unwrap();

        let messages = recorder.messages();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].payload_str(), "hello");
        assert_eq!(recorder.attempts(), 1);
    }

    #[test]
    fn failing_publisher_counts_attempts() {
        let recorder = RecordingPublisher::failing();
        let mut publisher = recorder.clone();
        assert!(publisher.publish("t", b"x").is_err());
        assert!(publisher.publish("t", b"y").is_err());
        assert_eq!(recorder.attempts(), 2);
        assert!(recorder.messages().is_empty());
    }
}

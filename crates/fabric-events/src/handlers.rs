//! # Event Handlers
//!
//! `EventHandler` implementations that bind the normalizers to subscribed
//! topics. Failures are contained here: a bad payload is logged and dropped
//! so the fabric's delivery task never sees an error and the subscription
//! survives. Output goes through an injected sink rather than straight to
//! stdout, so tests can observe what a handler displayed.

use crate::normalize::{decode_reputation_change, normalize_telemetry};
use fabric_bus::EventHandler;
use fabric_types::ReputationChangeRecord;
use std::fmt::Write as _;
use std::sync::Arc;
use tracing::{info, warn};

/// Where handler output lines go. The console wires this to stdout; tests
/// wire it to a buffer.
pub type OutputSink = Arc<dyn Fn(String) + Send + Sync>;

/// Displays reputation-change notifications as a banner with the event
/// timestamp, topic, content hashes, and per-provider trust transitions.
pub struct ReputationChangeHandler {
    sink: OutputSink,
}

impl ReputationChangeHandler {
    /// Create a handler writing banners to `sink`.
    #[must_use]
    pub fn new(sink: OutputSink) -> Self {
        Self { sink }
    }

    fn banner(topic: &str, record: &ReputationChangeRecord, received_at: &str) -> String {
        let mut out = String::new();
        let rule = "=".repeat(75);
        let _ = writeln!(out, "{rule}");
        let _ = writeln!(out, "{received_at} Reputation change");
        let _ = writeln!(out, "Topic: {topic}");
        let _ = writeln!(out, "File MD5: {}", record.md5);
        let _ = writeln!(out, "File SHA1: {}", record.sha1);
        let _ = writeln!(out, "File SHA256: {}", record.sha256);
        for change in &record.changes {
            let _ = writeln!(
                out,
                "{} Old Rep: {}.  New: {}",
                change.provider.label(),
                change.old_trust,
                change.new_trust
            );
        }
        let _ = write!(out, "{rule}");
        out
    }
}

impl EventHandler for ReputationChangeHandler {
    fn handle(&self, topic: &str, payload: &[u8]) {
        match decode_reputation_change(payload) {
            Ok(record) => {
                let received_at = chrono::Local::now().format("%a %b %e %T %Y").to_string();
                (self.sink)(Self::banner(topic, &record, &received_at));
            }
            Err(e) => {
                // Drop the event, keep the subscription.
                warn!(topic = %topic, error = %e, "Malformed reputation-change payload dropped");
            }
        }
    }
}

/// Logs generic telemetry events after a strict UTF-8 decode.
pub struct TelemetryHandler {
    sink: OutputSink,
}

impl TelemetryHandler {
    /// Create a handler writing decoded events to `sink`.
    #[must_use]
    pub fn new(sink: OutputSink) -> Self {
        Self { sink }
    }
}

impl EventHandler for TelemetryHandler {
    fn handle(&self, topic: &str, payload: &[u8]) {
        match normalize_telemetry(topic, payload) {
            Ok(event) => {
                info!(topic = %event.topic, "Event received");
                (self.sink)(format!(
                    "Event received:\n   Topic: {}\n   Payload: {}",
                    event.topic, event.text
                ));
            }
            Err(e) => {
                // Best-effort delivery: one bad payload must not halt the
                // subscriber.
                warn!(topic = %topic, error = %e, "Undecodable telemetry payload dropped");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Mutex;

    fn capture() -> (OutputSink, Arc<Mutex<Vec<String>>>) {
        let lines = Arc::new(Mutex::new(Vec::new()));
        let captured = lines.clone();
        let sink: OutputSink = Arc::new(move |line| {
            captured.lock().unwrap().push(line);
        });
        (sink, lines)
    }

    fn sample_payload() -> Vec<u8> {
        let reputations = |levels: [i64; 6]| {
            json!(levels
                .iter()
                .map(|l| json!({ "trustLevel": l }))
                .collect::<Vec<_>>())
        };
        serde_json::to_vec(&json!({
            "hashes": {
                "md5": "d41d8cd98f00b204e9800998ecf8427e",
                "sha1": "da39a3ee5e6b4b0d3255bfef95601890afd80709",
                "sha256": "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855",
            },
            "oldReputations": reputations([0, 50, 0, 70, 0, 30]),
            "newReputations": reputations([0, 85, 0, 99, 0, 15]),
        }))
        .unwrap()
    }

    #[test]
    fn test_reputation_banner_contents() {
        let (sink, lines) = capture();
        let handler = ReputationChangeHandler::new(sink);

        handler.handle("/fabric/event/intel/file/repchange", &sample_payload());

        let lines = lines.lock().unwrap();
        assert_eq!(lines.len(), 1);
        let banner = &lines[0];
        assert!(banner.contains("File MD5: d41d8cd98f00b204e9800998ecf8427e"));
        assert!(banner.contains("GTI Old Rep: 50.  New: 85"));
        assert!(banner.contains("Enterprise Old Rep: 70.  New: 99"));
        assert!(banner.contains("ATD Old Rep: 30.  New: 15"));
        assert!(banner.contains("/fabric/event/intel/file/repchange"));
    }

    #[test]
    fn test_malformed_reputation_payload_dropped() {
        let (sink, lines) = capture();
        let handler = ReputationChangeHandler::new(sink);

        handler.handle("/t", b"{\"hashes\": {}}");
        assert!(lines.lock().unwrap().is_empty());

        // The handler still works after a bad payload.
        handler.handle("/t", &sample_payload());
        assert_eq!(lines.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_telemetry_decode_and_display() {
        let (sink, lines) = capture();
        let handler = TelemetryHandler::new(sink);

        handler.handle("/fabric/event/intel/file/firstinstance", b"hello");

        let lines = lines.lock().unwrap();
        assert_eq!(lines.len(), 1);
        assert!(lines[0].contains("Payload: hello"));
    }

    #[test]
    fn test_invalid_utf8_dropped_subscription_continues() {
        let (sink, lines) = capture();
        let handler = TelemetryHandler::new(sink);

        handler.handle("/t", &[0xff, 0xfe]);
        assert!(lines.lock().unwrap().is_empty());

        // A later valid payload on the same topic is still processed.
        handler.handle("/t", b"still alive");
        let lines = lines.lock().unwrap();
        assert_eq!(lines.len(), 1);
        assert!(lines[0].contains("still alive"));
    }
}

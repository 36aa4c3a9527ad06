//! # Telemetry Events
//!
//! Normalized view of a generic telemetry payload received on a subscribed
//! topic. Transient: created on receipt, displayed, discarded.

use serde::{Deserialize, Serialize};

/// A decoded telemetry event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TelemetryEvent {
    /// The topic the event arrived on.
    pub topic: String,
    /// Raw payload bytes as received.
    pub payload: Vec<u8>,
    /// The payload decoded as UTF-8 text.
    pub text: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_carries_topic_and_text() {
        let event = TelemetryEvent {
            topic: "/fabric/event/file/firstinstance".to_string(),
            payload: b"hello".to_vec(),
            text: "hello".to_string(),
        };
        assert_eq!(event.text, "hello");
        assert_eq!(event.payload, b"hello");
    }
}

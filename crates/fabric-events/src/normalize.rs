//! # Payload Normalizers
//!
//! Stateless transforms from wire payloads to normalized records. All shape
//! assumptions are validated explicitly: nested keys via `json_path`, array
//! length before any contract-slot index, and hash format before the record
//! is returned.

use fabric_types::access::{json_path, json_path_str};
use fabric_types::reputation::validate_hash;
use fabric_types::{
    EncodingError, MalformedPayloadError, ProviderChange, ReputationChangeRecord,
    ReputationProvider, TelemetryEvent,
};
use serde_json::Value;

/// Pull one provider's trust level out of a reputation array.
///
/// The arrays are heterogeneous with providers at contract-defined slots, so
/// the length check comes first: a short array is a malformed payload, not a
/// silent default.
fn trust_level_at(
    payload: &Value,
    array: &'static str,
    index: usize,
) -> Result<i64, MalformedPayloadError> {
    let entries = json_path(payload, &[array])?
        .as_array()
        .ok_or(MalformedPayloadError::UnexpectedType {
            path: vec![array.to_string()],
            expected: "array",
        })?;

    if entries.len() <= index {
        return Err(MalformedPayloadError::IndexOutOfRange {
            array,
            index,
            len: entries.len(),
        });
    }

    let entry = &entries[index];
    let trust = entry
        .get("trustLevel")
        .ok_or_else(|| MalformedPayloadError::MissingKey {
            path: vec![array.to_string(), index.to_string()],
            segment: "trustLevel".to_string(),
        })?;
    trust
        .as_i64()
        .ok_or(MalformedPayloadError::UnexpectedType {
            path: vec![array.to_string(), index.to_string(), "trustLevel".to_string()],
            expected: "integer",
        })
}

/// Normalize a decoded reputation-change document.
///
/// Extracts the three content hashes at `hashes.{md5,sha1,sha256}` and the
/// old/new trust level pair for every provider in
/// `ReputationProvider::ALL`.
pub fn normalize_reputation_change(
    payload: &Value,
) -> Result<ReputationChangeRecord, MalformedPayloadError> {
    let md5 = json_path_str(payload, &["hashes", "md5"])?.to_string();
    let sha1 = json_path_str(payload, &["hashes", "sha1"])?.to_string();
    let sha256 = json_path_str(payload, &["hashes", "sha256"])?.to_string();

    validate_hash("md5", &md5, 32)?;
    validate_hash("sha1", &sha1, 40)?;
    validate_hash("sha256", &sha256, 64)?;

    let mut changes = Vec::with_capacity(ReputationProvider::ALL.len());
    for provider in ReputationProvider::ALL {
        let slot = provider.slot();
        changes.push(ProviderChange {
            provider,
            old_trust: trust_level_at(payload, "oldReputations", slot)?,
            new_trust: trust_level_at(payload, "newReputations", slot)?,
        });
    }

    Ok(ReputationChangeRecord {
        md5,
        sha1,
        sha256,
        changes,
    })
}

/// Decode raw payload bytes as JSON and normalize the reputation change.
pub fn decode_reputation_change(
    payload: &[u8],
) -> Result<ReputationChangeRecord, MalformedPayloadError> {
    let document: Value = serde_json::from_slice(payload)
        .map_err(|e| MalformedPayloadError::NotJson(e.to_string()))?;
    normalize_reputation_change(&document)
}

/// Decode a generic telemetry payload as UTF-8 text.
///
/// Strict decode, no lossy fallback: a payload that is not valid text is an
/// `EncodingError` and the caller drops the event.
pub fn normalize_telemetry(topic: &str, payload: &[u8]) -> Result<TelemetryEvent, EncodingError> {
    let text = std::str::from_utf8(payload).map_err(|e| EncodingError {
        topic: topic.to_string(),
        valid_up_to: e.valid_up_to(),
    })?;
    Ok(TelemetryEvent {
        topic: topic.to_string(),
        payload: payload.to_vec(),
        text: text.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const MD5_EMPTY: &str = "d41d8cd98f00b204e9800998ecf8427e";
    const SHA1_EMPTY: &str = "da39a3ee5e6b4b0d3255bfef95601890afd80709";
    const SHA256_EMPTY: &str = "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855";

    fn reputations(levels: [i64; 6]) -> Value {
        json!(levels
            .iter()
            .map(|l| json!({ "trustLevel": l, "providerId": 0 }))
            .collect::<Vec<_>>())
    }

    fn sample_payload() -> Value {
        json!({
            "hashes": {
                "md5": MD5_EMPTY,
                "sha1": SHA1_EMPTY,
                "sha256": SHA256_EMPTY,
            },
            "oldReputations": reputations([0, 50, 0, 70, 0, 30]),
            "newReputations": reputations([0, 85, 0, 99, 0, 15]),
        })
    }

    #[test]
    fn test_round_trip() {
        let record = normalize_reputation_change(&sample_payload()).unwrap();

        assert_eq!(record.md5, MD5_EMPTY);
        assert_eq!(record.sha1, SHA1_EMPTY);
        assert_eq!(record.sha256, SHA256_EMPTY);

        let by_provider: Vec<(ReputationProvider, i64, i64)> = record
            .changes
            .iter()
            .map(|c| (c.provider, c.old_trust, c.new_trust))
            .collect();
        assert_eq!(
            by_provider,
            vec![
                (ReputationProvider::Gti, 50, 85),
                (ReputationProvider::Enterprise, 70, 99),
                (ReputationProvider::Atd, 30, 15),
            ]
        );
    }

    #[test]
    fn test_missing_sha1_is_malformed_payload() {
        let mut payload = sample_payload();
        payload["hashes"]
            .as_object_mut()
            .unwrap()
            .remove("sha1");

        let err = normalize_reputation_change(&payload).unwrap_err();
        assert_eq!(
            err,
            MalformedPayloadError::MissingKey {
                path: vec!["hashes".into(), "sha1".into()],
                segment: "sha1".into(),
            }
        );
    }

    #[test]
    fn test_short_reputation_array() {
        let mut payload = sample_payload();
        payload["newReputations"] = reputations([0, 1, 2, 3, 4, 5]);
        payload["newReputations"].as_array_mut().unwrap().truncate(2);

        let err = normalize_reputation_change(&payload).unwrap_err();
        assert_eq!(
            err,
            MalformedPayloadError::IndexOutOfRange {
                array: "newReputations",
                index: 3,
                len: 2,
            }
        );
    }

    #[test]
    fn test_non_integer_trust_level() {
        let mut payload = sample_payload();
        payload["oldReputations"][1]["trustLevel"] = json!("high");

        let err = normalize_reputation_change(&payload).unwrap_err();
        assert!(matches!(
            err,
            MalformedPayloadError::UnexpectedType {
                expected: "integer",
                ..
            }
        ));
    }

    #[test]
    fn test_bad_hash_format() {
        let mut payload = sample_payload();
        payload["hashes"]["md5"] = json!("not-hex");

        let err = normalize_reputation_change(&payload).unwrap_err();
        assert!(matches!(err, MalformedPayloadError::InvalidHash { .. }));
    }

    #[test]
    fn test_decode_rejects_non_json() {
        let err = decode_reputation_change(b"{ truncated").unwrap_err();
        assert!(matches!(err, MalformedPayloadError::NotJson(_)));
    }

    #[test]
    fn test_telemetry_utf8() {
        let event = normalize_telemetry("/t", b"hello").unwrap();
        assert_eq!(event.text, "hello");
        assert_eq!(event.topic, "/t");
        assert_eq!(event.payload, b"hello");
    }

    #[test]
    fn test_telemetry_invalid_utf8() {
        let err = normalize_telemetry("/t", &[0x68, 0x69, 0xff, 0xfe]).unwrap_err();
        assert_eq!(err.topic, "/t");
        assert_eq!(err.valid_up_to, 2);
    }
}

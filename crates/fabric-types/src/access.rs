//! # Typed Nested-JSON Access
//!
//! Replaces ad-hoc path walks over decoded payloads with an accessor that
//! checks presence at every level and reports the first missing segment as a
//! structured error instead of a generic lookup failure.

use crate::errors::MalformedPayloadError;
use serde_json::Value;

/// Walk `path` through nested JSON objects, failing on the first absent key.
///
/// Each intermediate value must be an object; the error carries the full
/// path walked so far plus the segment that was missing or mistyped.
pub fn json_path<'a>(root: &'a Value, path: &[&str]) -> Result<&'a Value, MalformedPayloadError> {
    let mut current = root;
    for (depth, segment) in path.iter().enumerate() {
        let walked = || path[..=depth].iter().map(|s| (*s).to_string()).collect();
        let obj = current
            .as_object()
            .ok_or_else(|| MalformedPayloadError::UnexpectedType {
                path: walked(),
                expected: "object",
            })?;
        current = obj
            .get(*segment)
            .ok_or_else(|| MalformedPayloadError::MissingKey {
                path: walked(),
                segment: (*segment).to_string(),
            })?;
    }
    Ok(current)
}

/// Extract a string at `path`, failing if absent or not a string.
pub fn json_path_str<'a>(
    root: &'a Value,
    path: &[&str],
) -> Result<&'a str, MalformedPayloadError> {
    let value = json_path(root, path)?;
    value
        .as_str()
        .ok_or_else(|| MalformedPayloadError::UnexpectedType {
            path: path.iter().map(|s| (*s).to_string()).collect(),
            expected: "string",
        })
}

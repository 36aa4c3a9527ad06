//! # Reputation Change Records
//!
//! Normalized view of a reputation-change notification from the
//! threat-intelligence service: the affected content hashes and, per
//! reputation provider, the old and new trust level.

use crate::errors::MalformedPayloadError;
use serde::{Deserialize, Serialize};

/// Reputation providers and their contract-defined slots in the
/// `oldReputations`/`newReputations` arrays.
///
/// The slot numbers come from the service contract, not from the payload:
/// the arrays are heterogeneous with providers at fixed positions. The
/// mapping below was taken from the service's published schema and must be
/// re-verified whenever the threat-intelligence service bumps its schema
/// version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReputationProvider {
    /// Global threat-intelligence authority.
    Gti,
    /// Local enterprise reputation authority.
    Enterprise,
    /// Sandbox / detonation analysis authority.
    Atd,
}

impl ReputationProvider {
    /// All providers the normalizer extracts, in display order.
    pub const ALL: [Self; 3] = [Self::Gti, Self::Enterprise, Self::Atd];

    /// The provider's slot index in the reputation arrays.
    #[must_use]
    pub fn slot(&self) -> usize {
        match self {
            Self::Gti => 1,
            Self::Enterprise => 3,
            Self::Atd => 5,
        }
    }

    /// Short display label.
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::Gti => "GTI",
            Self::Enterprise => "Enterprise",
            Self::Atd => "ATD",
        }
    }
}

/// Old and new trust level at one provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderChange {
    /// The provider this change belongs to.
    pub provider: ReputationProvider,
    /// Trust level before the change.
    pub old_trust: i64,
    /// Trust level after the change.
    pub new_trust: i64,
}

/// Normalized reputation-change notification, independent of the wire schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReputationChangeRecord {
    /// MD5 of the affected content, 32 hex chars.
    pub md5: String,
    /// SHA-1 of the affected content, 40 hex chars.
    pub sha1: String,
    /// SHA-256 of the affected content, 64 hex chars.
    pub sha256: String,
    /// Per-provider trust level changes, in `ReputationProvider::ALL` order.
    pub changes: Vec<ProviderChange>,
}

/// Validate that a hash field is a fixed-length hex string.
pub fn validate_hash(
    field: &'static str,
    value: &str,
    expected_len: usize,
) -> Result<(), MalformedPayloadError> {
    if value.len() != expected_len || !value.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(MalformedPayloadError::InvalidHash {
            field,
            expected_len,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_slots() {
        assert_eq!(ReputationProvider::Gti.slot(), 1);
        assert_eq!(ReputationProvider::Enterprise.slot(), 3);
        assert_eq!(ReputationProvider::Atd.slot(), 5);
    }

    #[test]
    fn test_validate_hash_ok() {
        validate_hash("md5", "d41d8cd98f00b204e9800998ecf8427e", 32).unwrap();
    }

    #[test]
    fn test_validate_hash_wrong_length() {
        let err = validate_hash("md5", "abc", 32).unwrap_err();
        assert!(matches!(
            err,
            MalformedPayloadError::InvalidHash {
                field: "md5",
                expected_len: 32
            }
        ));
    }

    #[test]
    fn test_validate_hash_non_hex() {
        let bad = "z".repeat(32);
        assert!(validate_hash("md5", &bad, 32).is_err());
    }
}

//! Refuses mutating operations on records whose digest no longer matches.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use crate::error::IntegrityError;

use super::canonical::DATA_HASH;
use super::hasher::{seal, verify_record};

/// Integrity state of a record as read from storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum IntegrityStatus {
    /// The record carries no digest.
    Unsealed,
    /// The stored digest matches the content.
    Intact,
    /// Content changed after sealing.
    Tampered {
        expected: String,
        actual: Option<String>,
    },
}

/// Operations blocked while a record is tampered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GuardedOperation {
    Edit,
    Send,
    Download,
    Delete,
}

impl GuardedOperation {
    pub const ALL: [GuardedOperation; 4] = [Self::Edit, Self::Send, Self::Download, Self::Delete];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Edit => "edit",
            Self::Send => "send",
            Self::Download => "download",
            Self::Delete => "delete",
        }
    }
}

impl fmt::Display for GuardedOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// Tamper flag for one record. There is no override.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TamperGuard {
    status: IntegrityStatus,
}

impl TamperGuard {
    /// Verify a record read from storage.
    pub fn inspect(record: &Value) -> Self {
        let status = match record.get(DATA_HASH) {
            None => IntegrityStatus::Unsealed,
            Some(stored) if !stored.is_string() => {
                warn!("Tamper detected: stored digest is not a string ({})", stored);
                IntegrityStatus::Tampered {
                    expected: stored.to_string(),
                    actual: seal(record).ok(),
                }
            }
            Some(_) => {
                let verification = verify_record(record);
                if verification.valid {
                    IntegrityStatus::Intact
                } else {
                    let expected = verification.expected_digest.unwrap_or_default();
                    warn!(
                        "Tamper detected: stored digest {} does not match content ({})",
                        expected,
                        verification.current_digest.as_deref().unwrap_or("uncomputable")
                    );
                    IntegrityStatus::Tampered {
                        expected,
                        actual: verification.current_digest,
                    }
                }
            }
        };
        Self { status }
    }

    pub fn status(&self) -> &IntegrityStatus {
        &self.status
    }

    pub fn is_tampered(&self) -> bool {
        matches!(self.status, IntegrityStatus::Tampered { .. })
    }

    /// Fail with [`IntegrityError::Tampered`] if the record must not be touched.
    pub fn ensure_mutable(&self, operation: GuardedOperation) -> Result<(), IntegrityError> {
        match &self.status {
            IntegrityStatus::Tampered { expected, actual } => Err(IntegrityError::Tampered {
                operation: operation.to_string(),
                expected: expected.clone(),
                actual: actual.clone().unwrap_or_else(|| "uncomputable".to_string()),
            }),
            IntegrityStatus::Unsealed | IntegrityStatus::Intact => Ok(()),
        }
    }
}

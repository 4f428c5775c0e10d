//! SHA-256 sealing and verification of records.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};
use tracing::{debug, warn};

use crate::error::IntegrityError;

use super::canonical::{canonical_bytes, DATA_HASH, HASH_FIELDS, HASH_GENERATED_AT};

/// Outcome of comparing a record against a stored digest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Verification {
    pub valid: bool,
    /// Digest the record claims, if any.
    pub expected_digest: Option<String>,
    /// Digest of the record as it is now; `None` when it could not be computed.
    pub current_digest: Option<String>,
}

/// Lowercase hex SHA-256 of `bytes`.
pub fn digest_bytes(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

/// Digest of a record's canonical form (hash attributes excluded).
pub fn seal<T: Serialize + ?Sized>(record: &T) -> Result<String, IntegrityError> {
    Ok(digest_bytes(&canonical_bytes(record)?))
}

/// Compare a record against `digest`. Never fails: an uncomputable digest is invalid.
pub fn verify<T: Serialize + ?Sized>(record: &T, digest: &str) -> Verification {
    match seal(record) {
        Ok(current) => Verification {
            valid: current == digest,
            expected_digest: Some(digest.to_string()),
            current_digest: Some(current),
        },
        Err(e) => {
            warn!("Cannot compute digest for verification: {}", e);
            Verification {
                valid: false,
                expected_digest: Some(digest.to_string()),
                current_digest: None,
            }
        }
    }
}

/// Replace the record's hash attributes with a fresh digest stamped at `at`.
pub fn seal_record(record: &mut Value, at: DateTime<Utc>) -> Result<String, IntegrityError> {
    let Value::Object(map) = record else {
        return Err(IntegrityError::NotAnObject(kind(record)));
    };
    for field in HASH_FIELDS {
        map.remove(field);
    }

    let digest = seal(&*map)?;
    map.insert(DATA_HASH.to_string(), Value::String(digest.clone()));
    map.insert(
        HASH_GENERATED_AT.to_string(),
        Value::String(at.to_rfc3339_opts(SecondsFormat::Millis, true)),
    );

    debug!("Sealed record with digest {}", digest);
    Ok(digest)
}

/// Verify a record against the `dataHash` it carries. A record without one is invalid.
pub fn verify_record(record: &Value) -> Verification {
    match record.get(DATA_HASH).and_then(Value::as_str) {
        Some(stored) => verify(record, stored),
        None => Verification {
            valid: false,
            expected_digest: None,
            current_digest: seal(record).ok(),
        },
    }
}

/// [`seal`] on the blocking thread pool.
pub async fn seal_async<T>(record: T) -> Result<String, IntegrityError>
where
    T: Serialize + Send + 'static,
{
    tokio::task::spawn_blocking(move || seal(&record))
        .await
        .map_err(|e| IntegrityError::Canonicalization(format!("hashing task failed: {}", e)))?
}

/// [`verify`] on the blocking thread pool.
pub async fn verify_async<T>(record: T, digest: String) -> Verification
where
    T: Serialize + Send + 'static,
{
    let expected = digest.clone();
    match tokio::task::spawn_blocking(move || verify(&record, &digest)).await {
        Ok(verification) => verification,
        Err(e) => {
            warn!("Verification task failed: {}", e);
            Verification {
                valid: false,
                expected_digest: Some(expected),
                current_digest: None,
            }
        }
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 9, 30, 0).unwrap()
    }

    #[test]
    fn test_digest_format() {
        let digest = seal(&json!({"name": "A"})).unwrap();
        assert_eq!(digest.len(), 64);
        assert!(digest.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
        assert_eq!(
            digest_bytes(b""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn test_seal_is_idempotent_and_order_independent() {
        let a = json!({"name": "A", "amount": 100, "lines": [{"qty": 1, "sku": "X"}]});
        let b = json!({"lines": [{"sku": "X", "qty": 1}], "amount": 100, "name": "A"});

        assert_eq!(seal(&a).unwrap(), seal(&a).unwrap());
        assert_eq!(seal(&a).unwrap(), seal(&b).unwrap());
    }

    #[test]
    fn test_any_change_alters_digest() {
        let base = json!({"name": "A", "amount": 100, "client": {"id": 1}});
        let digest = seal(&base).unwrap();

        let variants = [
            json!({"name": "B", "amount": 100, "client": {"id": 1}}),
            json!({"name": "A", "amount": 101, "client": {"id": 1}}),
            json!({"name": "A", "amount": 100, "client": {"id": 1, "extra": true}}),
            json!({"name": "A", "amount": 100, "client": {}}),
            json!({"name": "A", "amount": 100}),
        ];
        for variant in variants {
            assert!(!verify(&variant, &digest).valid, "{} verified", variant);
        }
    }

    #[test]
    fn test_tampered_amount_is_detected() {
        let mut record = json!({"name": "A", "amount": 100});
        let digest = seal_record(&mut record, at()).unwrap();
        assert!(verify_record(&record).valid);

        let tampered = json!({"name": "A", "amount": 200, "dataHash": digest});
        let verification = verify_record(&tampered);

        assert!(!verification.valid);
        assert_eq!(verification.expected_digest.as_deref(), Some(digest.as_str()));
        assert_ne!(verification.current_digest, verification.expected_digest);
    }

    #[test]
    fn test_seal_record_attributes() {
        let mut record = json!({"name": "A", "dataHash": "stale", "hashGeneratedAt": "then"});
        let digest = seal_record(&mut record, at()).unwrap();

        assert_eq!(record["dataHash"], json!(digest));
        assert_eq!(record["hashGeneratedAt"], json!("2024-03-01T09:30:00.000Z"));
        assert_eq!(digest, seal(&json!({"name": "A"})).unwrap());

        // Resealing an unchanged record yields the same digest.
        let again = seal_record(&mut record, Utc::now()).unwrap();
        assert_eq!(again, digest);
    }

    #[test]
    fn test_unsealable_inputs() {
        assert!(matches!(
            seal_record(&mut json!([1, 2]), at()),
            Err(IntegrityError::NotAnObject("array"))
        ));

        let unsealed = verify_record(&json!({"name": "A"}));
        assert!(!unsealed.valid);
        assert_eq!(unsealed.expected_digest, None);
    }

    #[test]
    fn test_uncomputable_digest_is_invalid() {
        use std::collections::HashMap;

        let record: HashMap<(u8, u8), u8> = HashMap::from([((1, 2), 3)]);
        let verification = verify(&record, &digest_bytes(b"{}"));

        assert!(!verification.valid);
        assert_eq!(verification.current_digest, None);
        assert!(verification.expected_digest.is_some());
    }

    #[test]
    fn test_stored_digest_must_be_lowercase() {
        let record = json!({"name": "A"});
        let digest = seal(&record).unwrap();

        assert!(verify(&record, &digest).valid);
        assert!(!verify(&record, &digest.to_ascii_uppercase()).valid);
    }

    #[tokio::test]
    async fn test_async_wrappers() {
        let record = json!({"name": "A", "amount": 100});
        let digest = seal_async(record.clone()).await.unwrap();

        assert_eq!(digest, seal(&record).unwrap());
        assert!(verify_async(record, digest.clone()).await.valid);
        assert!(!verify_async(json!({"name": "A"}), digest).await.valid);
    }
}

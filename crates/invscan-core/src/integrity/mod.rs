//! Record sealing and tamper detection.

pub mod canonical;
mod guard;
mod hasher;

pub use canonical::{canonical_bytes, DATA_HASH, HASH_FIELDS, HASH_GENERATED_AT};
pub use guard::{GuardedOperation, IntegrityStatus, TamperGuard};
pub use hasher::{
    digest_bytes, seal, seal_async, seal_record, verify, verify_async, verify_record, Verification,
};

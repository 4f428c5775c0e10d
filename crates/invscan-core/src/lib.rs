//! Core library for invoice scanning.
//!
//! This crate provides:
//! - A text recognizer seam with a lazily started single-worker adapter
//! - Rule-cascade extraction of invoice fields with per-field confidence
//! - SHA-256 sealing of records over a canonical form, with tamper detection
//! - A bounded audit log of create/update/delete actions

pub mod audit;
pub mod error;
pub mod extraction;
pub mod integrity;
pub mod models;
pub mod ocr;

pub use audit::{
    Actor, AuditAction, AuditLog, AuditLogEntry, AuditQuery, AuditStore, AuditTargetType,
    JsonFileAuditStore, MemoryAuditStore, AUDIT_LOG_CAPACITY,
};
pub use error::{AuditError, IntegrityError, OcrError, Result, ScanError};
pub use extraction::{FieldExtractionEngine, normalize_text};
pub use integrity::{
    GuardedOperation, IntegrityStatus, TamperGuard, Verification, seal, seal_record, verify,
    verify_record,
};
pub use models::{ExtractionResult, FieldName, RecognizedField, ScanConfig};
pub use ocr::{Recognition, RecognizerAdapter, RecognizerFactory, TextRecognizer};
#[cfg(feature = "native")]
pub use ocr::{PureOcrEngine, PureOcrFactory};

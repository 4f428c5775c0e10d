//! Error types for the invscan-core library.

use thiserror::Error;

/// Main error type for the invscan library.
#[derive(Error, Debug)]
pub enum ScanError {
    /// Text recognition error.
    #[error("OCR error: {0}")]
    Ocr(#[from] OcrError),

    /// Record integrity error.
    #[error("integrity error: {0}")]
    Integrity(#[from] IntegrityError),

    /// Audit storage error.
    #[error("audit error: {0}")]
    Audit(#[from] AuditError),

    /// JSON (de)serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised by the text recognizer adapter.
#[derive(Error, Debug)]
pub enum OcrError {
    /// The recognizer could not be initialized or is not compiled in.
    #[error("text recognizer unavailable: {0}")]
    Unavailable(String),

    /// Failed to load OCR models.
    #[error("failed to load model: {0}")]
    ModelLoad(String),

    /// The engine ran but failed on this image.
    #[error("text recognition failed: {0}")]
    Recognition(String),
}

/// Errors related to record sealing and tamper detection.
#[derive(Error, Debug)]
pub enum IntegrityError {
    /// The record could not be turned into a canonical byte sequence.
    #[error("cannot canonicalize record: {0}")]
    Canonicalization(String),

    /// Sealing requires a JSON object at the top level.
    #[error("record must be a JSON object, got {0}")]
    NotAnObject(&'static str),

    /// A mutating operation was attempted on a record whose digest no longer matches.
    #[error("record has been tampered with: refusing to {operation} (stored {expected}, computed {actual})")]
    Tampered {
        operation: String,
        expected: String,
        actual: String,
    },
}

/// Errors related to audit log storage.
#[derive(Error, Debug)]
pub enum AuditError {
    /// The backing store rejected the write or read.
    #[error("audit storage failure: {0}")]
    Storage(String),

    /// Stored entries could not be (de)serialized.
    #[error("audit serialization failure: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Filesystem error in a file-backed store.
    #[error("audit I/O failure: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for the invscan library.
pub type Result<T> = std::result::Result<T, ScanError>;

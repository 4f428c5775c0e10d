//! Data models shared across the pipeline.

pub mod config;
pub mod scan;

pub use config::{AuditConfig, ExtractionConfig, OcrConfig, ScanConfig};
pub use scan::{ExtractionResult, FieldName, RecognizedField};

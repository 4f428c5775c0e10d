//! Structured scan results produced by field extraction.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Logical invoice fields the extraction engine knows how to find.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FieldName {
    InvoiceNumber,
    ClientName,
    IssueDate,
    DueDate,
    Total,
    Subtotal,
    Tax,
    BankName,
    BranchName,
    AccountType,
    AccountNumber,
    AccountHolder,
}

impl FieldName {
    /// Every field, in display order.
    pub const ALL: [FieldName; 12] = [
        FieldName::InvoiceNumber,
        FieldName::ClientName,
        FieldName::IssueDate,
        FieldName::DueDate,
        FieldName::Total,
        FieldName::Subtotal,
        FieldName::Tax,
        FieldName::BankName,
        FieldName::BranchName,
        FieldName::AccountType,
        FieldName::AccountNumber,
        FieldName::AccountHolder,
    ];

    /// The wire name used in serialized results.
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldName::InvoiceNumber => "invoiceNumber",
            FieldName::ClientName => "clientName",
            FieldName::IssueDate => "issueDate",
            FieldName::DueDate => "dueDate",
            FieldName::Total => "total",
            FieldName::Subtotal => "subtotal",
            FieldName::Tax => "tax",
            FieldName::BankName => "bankName",
            FieldName::BranchName => "branchName",
            FieldName::AccountType => "accountType",
            FieldName::AccountNumber => "accountNumber",
            FieldName::AccountHolder => "accountHolder",
        }
    }
}

impl fmt::Display for FieldName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// A single extracted value with its confidence score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecognizedField {
    /// Normalized value.
    pub value: String,
    /// Confidence score (0.0 - 1.0).
    pub confidence: f32,
}

impl RecognizedField {
    pub fn new(value: impl Into<String>, confidence: f32) -> Self {
        Self {
            value: value.into(),
            confidence,
        }
    }
}

/// Result of running field extraction over recognized text.
///
/// `fields` is sparse: a field that no rule matched has no key.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtractionResult {
    /// Overall confidence (0.0 - 1.0).
    #[serde(rename = "confidence")]
    pub overall_confidence: f32,

    /// Wall-clock processing time in milliseconds.
    #[serde(rename = "processingTime")]
    pub processing_time_ms: f64,

    /// Extracted fields keyed by name.
    #[serde(rename = "extractedFields")]
    pub fields: BTreeMap<FieldName, RecognizedField>,
}

impl ExtractionResult {
    /// Look up a field.
    pub fn get(&self, field: FieldName) -> Option<&RecognizedField> {
        self.fields.get(&field)
    }

    /// Value of a field, if extracted.
    pub fn value(&self, field: FieldName) -> Option<&str> {
        self.get(field).map(|f| f.value.as_str())
    }

    /// Fields that were not found.
    pub fn missing_fields(&self) -> Vec<FieldName> {
        FieldName::ALL
            .iter()
            .copied()
            .filter(|f| !self.fields.contains_key(f))
            .collect()
    }

    /// Whether the caller should fall back to manual entry.
    pub fn needs_manual_entry(&self, min_overall_confidence: f32) -> bool {
        self.overall_confidence < min_overall_confidence
            || !self.fields.contains_key(&FieldName::Total)
    }
}

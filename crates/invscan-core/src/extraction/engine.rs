//! Field extraction engine: runs every field cascade over recognized text.

use std::collections::BTreeMap;
use std::time::Instant;

use tracing::{debug, info, warn};

use crate::models::config::ExtractionConfig;
use crate::models::scan::{ExtractionResult, FieldName, RecognizedField};
use crate::ocr::Recognition;

use super::cascade::{CascadeMatch, FieldCascade};
use super::confidence;
use super::normalize_text;
use super::rules::default_cascades;

/// Rule-driven extractor for invoice fields.
///
/// Holds no mutable state, so one engine can serve any number of threads.
#[derive(Debug, Clone)]
pub struct FieldExtractionEngine {
    cascades: Vec<FieldCascade>,
    config: ExtractionConfig,
}

impl FieldExtractionEngine {
    /// Create an engine with the default rule tables.
    pub fn new() -> Self {
        Self {
            cascades: default_cascades(),
            config: ExtractionConfig::default(),
        }
    }

    /// Set extraction configuration.
    pub fn with_config(mut self, config: ExtractionConfig) -> Self {
        self.config = config;
        self
    }

    /// Replace the rule tables.
    pub fn with_cascades(mut self, cascades: Vec<FieldCascade>) -> Self {
        self.cascades = cascades;
        self
    }

    /// Add a cascade for a field no default table covers.
    pub fn with_cascade(mut self, cascade: FieldCascade) -> Self {
        self.cascades.push(cascade);
        self
    }

    pub fn config(&self) -> &ExtractionConfig {
        &self.config
    }

    /// Extract fields from raw recognized text. Never fails; unmatched fields are omitted.
    pub fn extract(&self, raw_text: &str) -> ExtractionResult {
        let start = Instant::now();
        let matches = self.explain(raw_text);

        let mut fields: BTreeMap<FieldName, RecognizedField> = BTreeMap::new();
        for m in matches {
            fields.entry(m.field).or_insert_with(|| m.into());
        }

        let overall_confidence = confidence::overall(fields.values());
        let result = ExtractionResult {
            overall_confidence,
            processing_time_ms: start.elapsed().as_secs_f64() * 1000.0,
            fields,
        };

        check_date_order(&result);

        info!(
            "Extracted {} of {} fields (confidence {:.2})",
            result.fields.len(),
            FieldName::ALL.len(),
            result.overall_confidence
        );

        result
    }

    /// Extract fields from a recognizer's output.
    ///
    /// The recognizer's own confidence becomes the overall score and its
    /// processing time is added to the extraction time.
    pub fn extract_recognized(&self, recognition: &Recognition) -> ExtractionResult {
        let mut result = self.extract(&recognition.text);
        result.overall_confidence = recognition.confidence.clamp(0.0, 1.0);
        result.processing_time_ms += recognition.processing_time_ms as f64;
        result
    }

    /// Every winning match with its provenance, in cascade order.
    pub fn explain(&self, raw_text: &str) -> Vec<CascadeMatch> {
        let text = normalize_text(raw_text);
        debug!("Running {} cascades over {} bytes", self.cascades.len(), text.len());

        self.cascades
            .iter()
            .filter_map(|cascade| cascade.run(&text, &self.config))
            .collect()
    }
}

impl Default for FieldExtractionEngine {
    fn default() -> Self {
        Self::new()
    }
}

/// Dates are assigned by position only; flag documents where that looks wrong.
fn check_date_order(result: &ExtractionResult) {
    if let (Some(issue), Some(due)) = (
        result.value(FieldName::IssueDate),
        result.value(FieldName::DueDate),
    ) {
        // ISO dates compare correctly as strings.
        if due < issue {
            warn!("Due date {} precedes issue date {}; positional assignment may be wrong", due, issue);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extraction::confidence::{CONTEXTUAL, LABELED, LABELED_SPECIFIC};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_reference_scan() {
        let engine = FieldExtractionEngine::new();
        let result = engine.extract("請求書番号: INV-001\n合計¥15,000\n2024年03月01日発行");

        assert_eq!(
            result.get(FieldName::InvoiceNumber),
            Some(&RecognizedField::new("INV-001", LABELED))
        );
        assert_eq!(
            result.get(FieldName::Total),
            Some(&RecognizedField::new("15000", LABELED_SPECIFIC))
        );
        assert_eq!(
            result.get(FieldName::IssueDate),
            Some(&RecognizedField::new("2024-03-01", CONTEXTUAL))
        );
        assert_eq!(result.get(FieldName::DueDate), None);
        assert_eq!(result.fields.len(), 3);
    }

    #[test]
    fn test_full_width_text_is_folded() {
        let engine = FieldExtractionEngine::new();
        let result = engine.extract("合計：１５，０００円\r\n");

        assert_eq!(result.value(FieldName::Total), Some("15000"));
    }

    #[test]
    fn test_empty_and_garbage_input() {
        let engine = FieldExtractionEngine::new();

        let result = engine.extract("");
        assert!(result.fields.is_empty());
        assert_eq!(result.overall_confidence, 0.0);

        let result = engine.extract("\u{0}\u{FFFD}%%%###");
        assert!(result.fields.is_empty());
    }

    #[test]
    fn test_deterministic() {
        let engine = FieldExtractionEngine::new();
        let text = "請求先: 株式会社サンプル 御中\n小計 10,000\n消費税 1,000\n合計 11,000\n2024/04/01\n2024/04/30";

        let a = engine.extract(text);
        let b = engine.extract(text);
        assert_eq!(a.fields, b.fields);
        assert_eq!(a.overall_confidence, b.overall_confidence);
    }

    #[test]
    fn test_recognizer_confidence_becomes_overall() {
        let engine = FieldExtractionEngine::new();
        let recognition = Recognition {
            text: "合計 ¥15,000".to_string(),
            confidence: 0.73,
            processing_time_ms: 120,
        };

        let result = engine.extract_recognized(&recognition);
        assert_eq!(result.overall_confidence, 0.73);
        assert!(result.processing_time_ms >= 120.0);
        assert_eq!(result.value(FieldName::Total), Some("15000"));
    }

    #[test]
    fn test_configured_bounds() {
        let config = ExtractionConfig {
            min_amount: 20_000,
            ..ExtractionConfig::default()
        };
        let engine = FieldExtractionEngine::new().with_config(config);

        assert_eq!(engine.extract("合計 ¥15,000").value(FieldName::Total), None);
    }

    #[test]
    fn test_explain_reports_rule() {
        let engine = FieldExtractionEngine::new();
        let matches = engine.explain("合計¥15,000");
        let total = matches.iter().find(|m| m.field == FieldName::Total).unwrap();

        assert_eq!(total.rule, "total_labeled");
    }
}

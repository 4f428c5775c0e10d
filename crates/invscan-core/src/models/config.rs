//! Configuration structures for the scanning pipeline.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::audit::AUDIT_LOG_CAPACITY;
use crate::error::Result;

/// Main configuration for the invscan pipeline.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// OCR configuration.
    pub ocr: OcrConfig,

    /// Field extraction configuration.
    pub extraction: ExtractionConfig,

    /// Audit log configuration.
    pub audit: AuditConfig,
}

/// Text recognizer configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OcrConfig {
    /// Directory containing model files.
    pub model_dir: PathBuf,

    /// Text detection model file name.
    pub detection_model: String,

    /// Text recognition model file name.
    pub recognition_model: String,

    /// Character dictionary file name.
    pub dictionary: String,

    /// Keep `[UNK]` markers emitted for unknown glyphs.
    pub keep_unk: bool,

    /// Recognition confidence below which callers are warned (0.0 - 1.0).
    pub min_confidence: f32,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            model_dir: PathBuf::from("models"),
            detection_model: "det.onnx".to_string(),
            recognition_model: "japan_rec.onnx".to_string(),
            dictionary: "japan_dict.txt".to_string(),
            keep_unk: false,
            min_confidence: 0.6,
        }
    }
}

impl OcrConfig {
    /// Full path to the detection model.
    pub fn detection_path(&self) -> PathBuf {
        self.model_dir.join(&self.detection_model)
    }

    /// Full path to the recognition model.
    pub fn recognition_path(&self) -> PathBuf {
        self.model_dir.join(&self.recognition_model)
    }

    /// Full path to the character dictionary.
    pub fn dictionary_path(&self) -> PathBuf {
        self.model_dir.join(&self.dictionary)
    }
}

/// Field extraction configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Smallest plausible monetary amount.
    pub min_amount: u64,

    /// Largest plausible monetary amount.
    pub max_amount: u64,

    /// Overall confidence below which a scan should be entered manually.
    pub min_overall_confidence: f32,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            min_amount: 100,
            max_amount: 100_000_000,
            min_overall_confidence: 0.5,
        }
    }
}

impl ExtractionConfig {
    /// Whether `amount` passes the plausibility filter.
    pub fn is_plausible(&self, amount: u64) -> bool {
        (self.min_amount..=self.max_amount).contains(&amount)
    }
}

/// Audit log configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuditConfig {
    /// Maximum number of retained entries.
    pub capacity: usize,

    /// JSON file backing the log.
    pub store_path: PathBuf,

    /// Actor recorded for CLI-initiated mutations.
    pub user_id: String,

    /// Display name recorded alongside `user_id`.
    pub user_name: String,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            capacity: AUDIT_LOG_CAPACITY,
            store_path: PathBuf::from("audit_logs.json"),
            user_id: "local".to_string(),
            user_name: "Local User".to_string(),
        }
    }
}

impl ScanConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ScanError;

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: ScanConfig =
            serde_json::from_str(r#"{"extraction": {"min_amount": 500}}"#).unwrap();

        assert_eq!(config.extraction.min_amount, 500);
        assert_eq!(config.extraction.max_amount, 100_000_000);
        assert_eq!(config.audit.capacity, 1000);
        assert_eq!(config.ocr.detection_model, "det.onnx");
    }

    #[test]
    fn test_plausibility_bounds_are_inclusive() {
        let config = ExtractionConfig::default();
        assert!(config.is_plausible(100));
        assert!(config.is_plausible(100_000_000));
        assert!(!config.is_plausible(99));
        assert!(!config.is_plausible(100_000_001));
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");

        let mut config = ScanConfig::default();
        config.audit.user_name = "Sato".to_string();
        config.save(&path).unwrap();

        let loaded = ScanConfig::from_file(&path).unwrap();
        assert_eq!(loaded.audit.user_name, "Sato");
    }

    #[test]
    fn test_load_errors() {
        let dir = tempfile::tempdir().unwrap();

        let missing = ScanConfig::from_file(&dir.path().join("missing.json"));
        assert!(matches!(missing, Err(ScanError::Io(_))));

        let broken = dir.path().join("broken.json");
        std::fs::write(&broken, "{not json").unwrap();
        assert!(matches!(ScanConfig::from_file(&broken), Err(ScanError::Json(_))));
    }
}

pub mod audit;
pub mod batch;
pub mod config;
pub mod extract;
pub mod seal;
pub mod verify;

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use invscan_core::models::config::ScanConfig;
use invscan_core::{Actor, AuditLog, ExtractionResult, FieldExtractionEngine, JsonFileAuditStore};

/// File extensions routed through the text recognizer.
pub const IMAGE_EXTENSIONS: [&str; 7] = ["png", "jpg", "jpeg", "webp", "tiff", "tif", "bmp"];

pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("invscan")
        .join("config.json")
}

/// Explicit `--config` path, else the default file if present, else defaults.
pub fn load_config(config_path: Option<&str>) -> anyhow::Result<ScanConfig> {
    if let Some(path) = config_path {
        return Ok(ScanConfig::from_file(Path::new(path))?);
    }

    let default_path = default_config_path();
    if default_path.exists() {
        debug!("Loading configuration from {}", default_path.display());
        Ok(ScanConfig::from_file(&default_path)?)
    } else {
        Ok(ScanConfig::default())
    }
}

pub fn open_audit_log(config: &ScanConfig) -> AuditLog<JsonFileAuditStore> {
    AuditLog::with_capacity(
        JsonFileAuditStore::new(&config.audit.store_path),
        config.audit.capacity,
    )
}

pub fn configured_actor(config: &ScanConfig) -> Actor {
    Actor::new(&config.audit.user_id, &config.audit.user_name)
}

pub fn is_image(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| IMAGE_EXTENSIONS.contains(&e.to_lowercase().as_str()))
        .unwrap_or(false)
}

/// Text extraction plus, when built with OCR support, the recognizer worker.
pub struct Scanner {
    engine: FieldExtractionEngine,
    #[cfg(feature = "ocr")]
    ocr: invscan_core::RecognizerAdapter<invscan_core::PureOcrFactory>,
    #[cfg(feature = "ocr")]
    min_ocr_confidence: f32,
}

impl Scanner {
    pub fn new(config: &ScanConfig) -> Self {
        Self {
            engine: FieldExtractionEngine::new().with_config(config.extraction.clone()),
            #[cfg(feature = "ocr")]
            ocr: invscan_core::RecognizerAdapter::new(invscan_core::PureOcrFactory::new(
                config.ocr.clone(),
            )),
            #[cfg(feature = "ocr")]
            min_ocr_confidence: config.ocr.min_confidence,
        }
    }

    pub fn engine(&self) -> &FieldExtractionEngine {
        &self.engine
    }

    /// Extract fields from an image (through OCR) or a UTF-8 text file.
    pub async fn scan(&self, path: &Path) -> anyhow::Result<ExtractionResult> {
        if is_image(path) {
            self.scan_image(path).await
        } else {
            Ok(self.engine.extract(&read_text(path)?))
        }
    }

    #[cfg(feature = "ocr")]
    async fn scan_image(&self, path: &Path) -> anyhow::Result<ExtractionResult> {
        let image = image::open(path)?;
        let recognition = self.ocr.recognize(image).await?;

        if recognition.text.trim().is_empty() {
            anyhow::bail!("No text detected in image");
        }
        if recognition.confidence < self.min_ocr_confidence {
            tracing::warn!(
                "Low OCR confidence for {}: {:.2}",
                path.display(),
                recognition.confidence
            );
        }

        Ok(self.engine.extract_recognized(&recognition))
    }

    #[cfg(not(feature = "ocr"))]
    async fn scan_image(&self, path: &Path) -> anyhow::Result<ExtractionResult> {
        anyhow::bail!(
            "Cannot read {}: this build has no OCR support. Rebuild with `--features ocr` or pass recognized text.",
            path.display()
        )
    }

    pub async fn shutdown(&self) {
        #[cfg(feature = "ocr")]
        self.ocr.shutdown().await;
    }
}

pub fn read_text(path: &Path) -> anyhow::Result<String> {
    let bytes = fs::read(path)?;
    match String::from_utf8(bytes) {
        Ok(text) => Ok(text),
        Err(_) => anyhow::bail!("{} is not UTF-8 text", path.display()),
    }
}

//! Recognizer backed by `pure-onnx-ocr` (pure Rust, no external ONNX Runtime).

use std::time::Instant;

use image::{DynamicImage, GenericImageView};
use tracing::{debug, info};

use crate::error::OcrError;
use crate::models::config::OcrConfig;

use super::{Recognition, RecognizerFactory, TextRecognizer};

/// Rows closer than this many pixels are read as one line.
const ROW_HEIGHT: f64 = 20.0;

/// Loads a [`PureOcrEngine`] from the model files named in [`OcrConfig`].
#[derive(Debug, Clone)]
pub struct PureOcrFactory {
    config: OcrConfig,
}

impl PureOcrFactory {
    pub fn new(config: OcrConfig) -> Self {
        Self { config }
    }
}

impl RecognizerFactory for PureOcrFactory {
    type Recognizer = PureOcrEngine;

    fn create(&self) -> Result<PureOcrEngine, OcrError> {
        PureOcrEngine::from_config(self.config.clone())
    }
}

pub struct PureOcrEngine {
    engine: pure_onnx_ocr::engine::OcrEngine,
    config: OcrConfig,
}

impl PureOcrEngine {
    /// Load detection, recognition and dictionary files from `config.model_dir`.
    pub fn from_config(config: OcrConfig) -> Result<Self, OcrError> {
        let det_path = config.detection_path();
        let rec_path = config.recognition_path();
        let dict_path = config.dictionary_path();

        for path in [&det_path, &rec_path, &dict_path] {
            if !path.exists() {
                return Err(OcrError::ModelLoad(format!("{} not found", path.display())));
            }
        }

        let engine = pure_onnx_ocr::engine::OcrEngineBuilder::new()
            .det_model_path(&det_path)
            .rec_model_path(&rec_path)
            .dictionary_path(&dict_path)
            .build()
            .map_err(|e| OcrError::ModelLoad(format!("pure-onnx-ocr: {}", e)))?;

        info!("Loaded pure-onnx-ocr engine from {}", config.model_dir.display());

        Ok(Self { engine, config })
    }
}

impl TextRecognizer for PureOcrEngine {
    fn recognize(&mut self, image: &DynamicImage) -> Result<Recognition, OcrError> {
        let start = Instant::now();
        let (width, height) = image.dimensions();
        debug!("Recognizing {}x{} image", width, height);

        let results = self
            .engine
            .run_from_image(image)
            .map_err(|e| OcrError::Recognition(format!("pure-onnx-ocr: {}", e)))?;

        let mut lines: Vec<(i64, f64, String, f32)> = results
            .iter()
            .map(|r| {
                let (x, y) = top_left(&r.bounding_box);
                let text = if self.config.keep_unk {
                    r.text.clone()
                } else {
                    r.text.replace("[UNK]", " ")
                };
                ((y / ROW_HEIGHT) as i64, x, text, r.confidence)
            })
            .collect();

        lines.sort_by(|a, b| a.0.cmp(&b.0).then(a.1.total_cmp(&b.1)));

        let confidence = if lines.is_empty() {
            0.0
        } else {
            lines.iter().map(|l| l.3).sum::<f32>() / lines.len() as f32
        };
        let text = lines
            .into_iter()
            .map(|l| l.2)
            .collect::<Vec<_>>()
            .join("\n");

        let processing_time_ms = start.elapsed().as_millis() as u64;
        info!(
            "OCR complete: {} regions in {}ms (confidence {:.2})",
            results.len(),
            processing_time_ms,
            confidence
        );

        Ok(Recognition {
            text,
            confidence: confidence.clamp(0.0, 1.0),
            processing_time_ms,
        })
    }
}

/// Smallest x and y of the region's outline.
fn top_left(polygon: &pure_onnx_ocr::Polygon<f64>) -> (f64, f64) {
    polygon
        .exterior()
        .coords()
        .fold((f64::INFINITY, f64::INFINITY), |(x, y), c| (x.min(c.x), y.min(c.y)))
}

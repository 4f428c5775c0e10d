//! Text recognition seam.
//!
//! The OCR engine itself is opaque: anything implementing [`TextRecognizer`]
//! can feed the extraction engine. [`RecognizerAdapter`] owns the single
//! long-lived worker that runs it.

mod adapter;
#[cfg(feature = "native")]
mod pure_engine;

pub use adapter::RecognizerAdapter;
#[cfg(feature = "native")]
pub use pure_engine::{PureOcrEngine, PureOcrFactory};

use image::DynamicImage;
use serde::{Deserialize, Serialize};

use crate::error::OcrError;

/// Raw output of a text recognizer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recognition {
    /// Recognized text, lines in reading order joined with `\n`.
    pub text: String,

    /// Recognition confidence (0.0 - 1.0).
    pub confidence: f32,

    /// Processing time in milliseconds.
    pub processing_time_ms: u64,
}

/// An OCR engine turning an image into text.
///
/// Engines are used from one thread at a time and need not be `Send`.
pub trait TextRecognizer {
    fn recognize(&mut self, image: &DynamicImage) -> Result<Recognition, OcrError>;
}

/// Creates the recognizer on the adapter's worker thread.
pub trait RecognizerFactory: Send + Sync + 'static {
    type Recognizer: TextRecognizer;

    fn create(&self) -> Result<Self::Recognizer, OcrError>;
}

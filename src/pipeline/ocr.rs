//! OCR text extraction for raster images.
//!
//! The recognition engine sits behind [`RecognitionEngine`] so the pipeline
//! does not depend on one engine's calling convention. The bundled backend,
//! [`OcrsRecognizer`], runs the `ocrs` neural models (executed by `rten`)
//! in three steps: detect words, group them into lines, recognise each line.
//! Lines are recognised in batches so progress can be reported between them.
//!
//! Model loading is the expensive step. Hosts that OCR many images should
//! load one engine and hand it in through
//! [`crate::config::DigestConfigBuilder::ocr_engine`].

use crate::config::{DigestConfig, OcrConfig, OCR_LANGUAGE};
use crate::error::DocSumError;
use crate::stream::{recognize_stream, OcrEvent};
use futures::StreamExt;
use image::DynamicImage;
use ocrs::{ImageSource, OcrEngine, OcrEngineParams};
use rten::Model;
use std::ops::ControlFlow;
use std::sync::Arc;
use tracing::{debug, info};

/// Phase an engine is in when it reports progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecognitionStatus {
    LoadingModels,
    Detecting,
    RecognizingText,
}

/// A progress report from an engine. `progress` is a fraction in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RecognitionProgress {
    pub status: RecognitionStatus,
    pub progress: f32,
}

/// A blocking text-recognition engine.
///
/// Implementations call `report` as work proceeds and must stop promptly,
/// returning an error, when it answers [`ControlFlow::Break`].
pub trait RecognitionEngine: Send + Sync {
    /// Short identifier used in logs.
    fn name(&self) -> &str;

    /// Recognise all text in `image`. Lines are separated by `\n`.
    fn recognize(
        &self,
        image: &DynamicImage,
        language: &str,
        report: &mut dyn FnMut(RecognitionProgress) -> ControlFlow<()>,
    ) -> Result<String, DocSumError>;
}

/// [`RecognitionEngine`] backed by the `ocrs` crate.
pub struct OcrsRecognizer {
    engine: OcrEngine,
    lines_per_batch: usize,
}

impl OcrsRecognizer {
    /// Load the detection and recognition models named in `config`.
    pub fn load(config: &OcrConfig) -> Result<Self, DocSumError> {
        config.validate_models()?;

        info!("Loading OCR detection model");
        let detection_model = Model::load_file(&config.detection_model_path).map_err(|e| {
            DocSumError::OcrFailed {
                detail: format!(
                    "failed to load detection model from {}: {}",
                    config.detection_model_path.display(),
                    e
                ),
            }
        })?;

        info!("Loading OCR recognition model");
        let recognition_model =
            Model::load_file(&config.recognition_model_path).map_err(|e| {
                DocSumError::OcrFailed {
                    detail: format!(
                        "failed to load recognition model from {}: {}",
                        config.recognition_model_path.display(),
                        e
                    ),
                }
            })?;

        let engine = OcrEngine::new(OcrEngineParams {
            detection_model: Some(detection_model),
            recognition_model: Some(recognition_model),
            ..Default::default()
        })
        .map_err(|e| DocSumError::OcrFailed {
            detail: format!("failed to initialise OCR engine: {}", e),
        })?;

        Ok(Self {
            engine,
            lines_per_batch: config.lines_per_batch.max(1),
        })
    }
}

impl RecognitionEngine for OcrsRecognizer {
    fn name(&self) -> &str {
        "ocrs"
    }

    fn recognize(
        &self,
        image: &DynamicImage,
        language: &str,
        report: &mut dyn FnMut(RecognitionProgress) -> ControlFlow<()>,
    ) -> Result<String, DocSumError> {
        if language != OCR_LANGUAGE {
            return Err(DocSumError::OcrFailed {
                detail: format!("unsupported OCR language '{}'", language),
            });
        }

        let mut step = |status: RecognitionStatus, progress: f32| -> Result<(), DocSumError> {
            match report(RecognitionProgress { status, progress }) {
                ControlFlow::Continue(()) => Ok(()),
                ControlFlow::Break(()) => Err(DocSumError::OcrFailed {
                    detail: "recognition cancelled".into(),
                }),
            }
        };

        let rgb = image.to_rgb8();
        let (width, height) = rgb.dimensions();
        let source = ImageSource::from_bytes(rgb.as_raw(), (width, height)).map_err(|e| {
            DocSumError::OcrFailed {
                detail: format!("failed to create image source ({}x{}): {}", width, height, e),
            }
        })?;
        let input = self
            .engine
            .prepare_input(source)
            .map_err(|e| DocSumError::OcrFailed {
                detail: format!("OCR preprocessing failed: {}", e),
            })?;

        // ── Detect ───────────────────────────────────────────────────────
        step(RecognitionStatus::Detecting, 0.0)?;
        let words = self
            .engine
            .detect_words(&input)
            .map_err(|e| DocSumError::OcrFailed {
                detail: format!("word detection failed: {}", e),
            })?;
        let line_rects = self.engine.find_text_lines(&input, &words);
        step(RecognitionStatus::Detecting, 1.0)?;
        debug!(words = words.len(), lines = line_rects.len(), "Text lines found");

        // ── Recognise, one batch of lines at a time ──────────────────────
        let total = line_rects.len();
        let mut lines = Vec::with_capacity(total);
        step(RecognitionStatus::RecognizingText, 0.0)?;
        let mut done = 0usize;
        for batch in line_rects.chunks(self.lines_per_batch) {
            let recognised = self
                .engine
                .recognize_text(&input, batch)
                .map_err(|e| DocSumError::OcrFailed {
                    detail: format!("line recognition failed: {}", e),
                })?;
            lines.extend(
                recognised
                    .iter()
                    .flatten()
                    .map(|line| line.to_string())
                    .filter(|text| !text.trim().is_empty()),
            );
            done += batch.len();
            step(RecognitionStatus::RecognizingText, done as f32 / total as f32)?;
        }
        if total == 0 {
            step(RecognitionStatus::RecognizingText, 1.0)?;
        }

        debug!(lines = lines.len(), "OCR recognition complete");
        Ok(lines.join("\n"))
    }
}

/// Recognise the text in an image document.
///
/// Uses `config.ocr_engine` when set, otherwise loads the models named in
/// `config.ocr`. Progress goes to `config.progress_callback` as a
/// non-decreasing percentage. The returned text is trimmed and may be empty.
pub async fn extract_image_text(bytes: &[u8], config: &DigestConfig) -> Result<String, DocSumError> {
    let engine: Arc<dyn RecognitionEngine> = match &config.ocr_engine {
        Some(engine) => Arc::clone(engine),
        None => {
            let ocr = config.ocr.clone();
            let loaded = tokio::task::spawn_blocking(move || OcrsRecognizer::load(&ocr))
                .await
                .map_err(|e| DocSumError::Internal(format!("OCR model loading panicked: {}", e)))??;
            Arc::new(loaded)
        }
    };
    info!("Running OCR with engine '{}'", engine.name());

    let mut events = recognize_stream(engine, bytes.to_vec(), config.ocr.language.clone());
    while let Some(event) = events.next().await {
        match event {
            OcrEvent::Progress(pct) => {
                if let Some(ref cb) = config.progress_callback {
                    cb.on_ocr_progress(pct);
                }
            }
            OcrEvent::Completed(text) => return Ok(text),
            OcrEvent::Failed(e) => return Err(e),
        }
    }

    Err(DocSumError::Internal(
        "OCR stream ended without a result".into(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::DigestProgressCallback;
    use image::ImageFormat;
    use std::io::Cursor;
    use std::sync::Mutex;

    fn png_bytes() -> Vec<u8> {
        let mut buf = Vec::new();
        DynamicImage::new_luma8(8, 8)
            .write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
            .unwrap();
        buf
    }

    struct FixedEngine(Result<&'static str, &'static str>);

    impl RecognitionEngine for FixedEngine {
        fn name(&self) -> &str {
            "fixed"
        }

        fn recognize(
            &self,
            _image: &DynamicImage,
            _language: &str,
            report: &mut dyn FnMut(RecognitionProgress) -> ControlFlow<()>,
        ) -> Result<String, DocSumError> {
            for progress in [0.333, 0.5, 0.999] {
                let _ = report(RecognitionProgress {
                    status: RecognitionStatus::RecognizingText,
                    progress,
                });
            }
            match self.0 {
                Ok(text) => Ok(text.to_string()),
                Err(detail) => Err(DocSumError::OcrFailed {
                    detail: detail.to_string(),
                }),
            }
        }
    }

    #[derive(Default)]
    struct Percents(Mutex<Vec<u8>>);

    impl DigestProgressCallback for Percents {
        fn on_ocr_progress(&self, percent: u8) {
            self.0.lock().unwrap().push(percent);
        }
    }

    #[tokio::test]
    async fn extracts_trimmed_text_and_reports_percentages() {
        let percents = Arc::new(Percents::default());
        let config = DigestConfig::builder()
            .ocr_engine(Arc::new(FixedEngine(Ok("\n  Invoice 42\nTotal: 10 EUR  \n"))))
            .progress_callback(percents.clone())
            .build()
            .unwrap();

        let text = extract_image_text(&png_bytes(), &config).await.unwrap();
        assert_eq!(text, "Invoice 42\nTotal: 10 EUR");
        assert_eq!(*percents.0.lock().unwrap(), vec![33, 50, 100]);
    }

    #[tokio::test]
    async fn recognition_failure_propagates() {
        let config = DigestConfig::builder()
            .ocr_engine(Arc::new(FixedEngine(Err("engine crashed"))))
            .build()
            .unwrap();
        let err = extract_image_text(&png_bytes(), &config).await.unwrap_err();
        assert!(matches!(err, DocSumError::OcrFailed { .. }));
    }

    #[tokio::test]
    async fn missing_models_are_reported_before_decoding() {
        let config = DigestConfig::builder()
            .ocr(OcrConfig::from_dir("/nonexistent/ocr-models"))
            .build()
            .unwrap();
        let err = extract_image_text(&png_bytes(), &config).await.unwrap_err();
        assert!(matches!(err, DocSumError::OcrModelsMissing { .. }));
    }
}

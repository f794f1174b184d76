//! Configuration types for document summarisation.
//!
//! All pipeline behaviour is controlled through [`DigestConfig`], built via
//! its [`DigestConfigBuilder`]. Keeping every knob in one struct makes it
//! trivial to share configs across concurrent requests and to diff two runs.
//!
//! The generative summariser is a capability, not an environment lookup:
//! it is present exactly when [`DigestConfig::generator`] is `Some`. The
//! library never inspects API-key variables to make that decision; the
//! binary (or any other host) resolves a provider and passes it in.

use crate::error::DocSumError;
use crate::output::MAX_HIGHLIGHTS;
use crate::pipeline::generative::SummaryGenerator;
use crate::pipeline::ocr::RecognitionEngine;
use crate::pipeline::parse::{BulletListParser, SummaryParser};
use crate::progress::ProgressCallback;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Default intake limit for uploaded documents: 20 MiB.
pub const DEFAULT_MAX_DOCUMENT_BYTES: u64 = 20 * 1024 * 1024;

/// Default character budget for text handed to the summariser.
pub const DEFAULT_MAX_TEXT_CHARS: usize = 500_000;

/// Default timeout for one generative call, in seconds.
pub const DEFAULT_API_TIMEOUT_SECS: u64 = 120;

/// The only recognition language supported by the OCR extractor.
pub const OCR_LANGUAGE: &str = "eng";

/// Configuration for a document summarisation run.
///
/// # Example
/// ```rust
/// use edgequake_docsum::{DigestConfig, LengthMode};
///
/// let config = DigestConfig::builder()
///     .length(LengthMode::Medium)
///     .max_text_chars(100_000)
///     .build()
///     .unwrap();
/// assert!(config.generator.is_none());
/// ```
#[derive(Clone)]
pub struct DigestConfig {
    /// Maximum document size accepted at intake, in bytes. Default: 20 MiB.
    pub max_document_bytes: u64,

    /// Maximum number of characters the orchestrator will summarise. Default: 500 000.
    pub max_text_chars: usize,

    /// Number of highlights the extractive fallback selects (1–5). Default: 5.
    pub max_highlights: usize,

    /// Verbosity hint for the generative request. Default: [`LengthMode::Short`].
    pub length: LengthMode,

    /// Generative capability. `None` means every request uses the extractive path.
    pub generator: Option<Arc<dyn SummaryGenerator>>,

    /// Parser turning the generative reply into summary + highlights.
    pub parser: Arc<dyn SummaryParser>,

    /// Per-call timeout for the generative request, in seconds. Default: 120.
    pub api_timeout_secs: u64,

    /// OCR engine settings (language, model locations).
    pub ocr: OcrConfig,

    /// Pre-loaded recognition engine. Takes precedence over loading models from [`Self::ocr`].
    pub ocr_engine: Option<Arc<dyn RecognitionEngine>>,

    /// PDF user password for encrypted documents.
    pub password: Option<String>,

    /// Download timeout for URL inputs in seconds. Default: 120.
    pub download_timeout_secs: u64,

    /// Observer for state transitions and OCR progress.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for DigestConfig {
    fn default() -> Self {
        Self {
            max_document_bytes: DEFAULT_MAX_DOCUMENT_BYTES,
            max_text_chars: DEFAULT_MAX_TEXT_CHARS,
            max_highlights: MAX_HIGHLIGHTS,
            length: LengthMode::default(),
            generator: None,
            parser: Arc::new(BulletListParser),
            api_timeout_secs: DEFAULT_API_TIMEOUT_SECS,
            ocr: OcrConfig::default(),
            ocr_engine: None,
            password: None,
            download_timeout_secs: 120,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for DigestConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DigestConfig")
            .field("max_document_bytes", &self.max_document_bytes)
            .field("max_text_chars", &self.max_text_chars)
            .field("max_highlights", &self.max_highlights)
            .field("length", &self.length)
            .field(
                "generator",
                &self.generator.as_ref().map(|g| g.name().to_string()),
            )
            .field("parser", &self.parser.name())
            .field("api_timeout_secs", &self.api_timeout_secs)
            .field("ocr", &self.ocr)
            .field(
                "ocr_engine",
                &self.ocr_engine.as_ref().map(|_| "<dyn RecognitionEngine>"),
            )
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("download_timeout_secs", &self.download_timeout_secs)
            .finish()
    }
}

impl DigestConfig {
    /// Create a new builder for `DigestConfig`.
    pub fn builder() -> DigestConfigBuilder {
        DigestConfigBuilder {
            config: Self::default(),
        }
    }

    /// `true` when a generative summariser is configured.
    pub fn generative_enabled(&self) -> bool {
        self.generator.is_some()
    }
}

/// Builder for [`DigestConfig`].
#[derive(Debug)]
pub struct DigestConfigBuilder {
    config: DigestConfig,
}

impl DigestConfigBuilder {
    pub fn max_document_bytes(mut self, bytes: u64) -> Self {
        self.config.max_document_bytes = bytes;
        self
    }

    pub fn max_text_chars(mut self, chars: usize) -> Self {
        self.config.max_text_chars = chars;
        self
    }

    pub fn max_highlights(mut self, n: usize) -> Self {
        self.config.max_highlights = n;
        self
    }

    pub fn length(mut self, length: LengthMode) -> Self {
        self.config.length = length;
        self
    }

    pub fn generator(mut self, generator: Arc<dyn SummaryGenerator>) -> Self {
        self.config.generator = Some(generator);
        self
    }

    /// Set or clear the generative capability in one call.
    pub fn generator_opt(mut self, generator: Option<Arc<dyn SummaryGenerator>>) -> Self {
        self.config.generator = generator;
        self
    }

    pub fn parser(mut self, parser: Arc<dyn SummaryParser>) -> Self {
        self.config.parser = parser;
        self
    }

    pub fn api_timeout_secs(mut self, secs: u64) -> Self {
        self.config.api_timeout_secs = secs;
        self
    }

    pub fn ocr(mut self, ocr: OcrConfig) -> Self {
        self.config.ocr = ocr;
        self
    }

    pub fn ocr_engine(mut self, engine: Arc<dyn RecognitionEngine>) -> Self {
        self.config.ocr_engine = Some(engine);
        self
    }

    pub fn password(mut self, pwd: impl Into<String>) -> Self {
        self.config.password = Some(pwd.into());
        self
    }

    pub fn download_timeout_secs(mut self, secs: u64) -> Self {
        self.config.download_timeout_secs = secs;
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<DigestConfig, DocSumError> {
        let c = &self.config;
        if c.max_document_bytes == 0 {
            return Err(DocSumError::InvalidConfig(
                "max_document_bytes must be ≥ 1".into(),
            ));
        }
        if c.max_text_chars == 0 {
            return Err(DocSumError::InvalidConfig(
                "max_text_chars must be ≥ 1".into(),
            ));
        }
        if c.max_highlights == 0 || c.max_highlights > MAX_HIGHLIGHTS {
            return Err(DocSumError::InvalidConfig(format!(
                "max_highlights must be 1–{}, got {}",
                MAX_HIGHLIGHTS, c.max_highlights
            )));
        }
        if c.api_timeout_secs == 0 {
            return Err(DocSumError::InvalidConfig(
                "api_timeout_secs must be ≥ 1".into(),
            ));
        }
        c.ocr.validate_language()?;
        Ok(self.config)
    }
}

// ── Enums ────────────────────────────────────────────────────────────────

/// Requested verbosity of the generative summary.
///
/// Only the generative prompt reads this; the extractive fallback ignores it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LengthMode {
    #[default]
    Short,
    Medium,
    Long,
}

impl LengthMode {
    /// Map a caller-supplied hint onto a mode; anything unrecognised
    /// (including absence) becomes [`LengthMode::Short`].
    pub fn from_hint(hint: Option<&str>) -> Self {
        match hint {
            Some("short") => LengthMode::Short,
            Some("medium") => LengthMode::Medium,
            Some("long") => LengthMode::Long,
            _ => LengthMode::Short,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LengthMode::Short => "short",
            LengthMode::Medium => "medium",
            LengthMode::Long => "long",
        }
    }
}

impl fmt::Display for LengthMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── OCR ──────────────────────────────────────────────────────────────────

const DETECTION_MODEL_FILENAME: &str = "text-detection.rten";
const RECOGNITION_MODEL_FILENAME: &str = "text-recognition.rten";

/// Settings for the OCR extractor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OcrConfig {
    /// Recognition language. Only `"eng"` is supported.
    pub language: String,
    /// Path to the text-detection model file (`.rten`).
    pub detection_model_path: PathBuf,
    /// Path to the text-recognition model file (`.rten`).
    pub recognition_model_path: PathBuf,
    /// Text lines recognised per batch; one progress event is emitted per batch. Default: 8.
    pub lines_per_batch: usize,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self::from_dir(default_model_dir())
    }
}

impl OcrConfig {
    /// Config pointing at a directory holding `text-detection.rten` and
    /// `text-recognition.rten`.
    pub fn from_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        Self {
            language: OCR_LANGUAGE.to_string(),
            detection_model_path: dir.join(DETECTION_MODEL_FILENAME),
            recognition_model_path: dir.join(RECOGNITION_MODEL_FILENAME),
            lines_per_batch: 8,
        }
    }

    fn validate_language(&self) -> Result<(), DocSumError> {
        if self.language != OCR_LANGUAGE {
            return Err(DocSumError::InvalidConfig(format!(
                "OCR language must be '{}', got '{}'",
                OCR_LANGUAGE, self.language
            )));
        }
        if self.lines_per_batch == 0 {
            return Err(DocSumError::InvalidConfig(
                "OCR lines_per_batch must be ≥ 1".into(),
            ));
        }
        Ok(())
    }

    /// Verify that both model files exist.
    pub fn validate_models(&self) -> Result<(), DocSumError> {
        for path in [&self.detection_model_path, &self.recognition_model_path] {
            if !path.exists() {
                return Err(DocSumError::OcrModelsMissing { path: path.clone() });
            }
        }
        Ok(())
    }
}

/// `$XDG_CACHE_HOME/ocrs`, falling back to `~/.cache/ocrs`.
fn default_model_dir() -> PathBuf {
    if let Ok(xdg) = std::env::var("XDG_CACHE_HOME") {
        PathBuf::from(xdg).join("ocrs")
    } else if let Ok(home) = std::env::var("HOME") {
        PathBuf::from(home).join(".cache").join("ocrs")
    } else {
        PathBuf::from("ocrs-models")
    }
}

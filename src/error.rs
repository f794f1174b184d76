//! Error types for the edgequake-docsum library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`DocSumError`] — **Fatal**: the request cannot produce a summary at all
//!   (blank or oversized text, unreadable document, no text extracted, both
//!   summarisers came back empty). Returned as `Err(DocSumError)` from the
//!   top-level `digest*` and `summarize` functions.
//!
//! * [`GenerativeError`] — **Recovered**: the remote language model failed
//!   (network, auth, timeout, unparseable reply). The orchestrator logs it
//!   and switches to the extractive summariser; it never reaches the caller.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the edgequake-docsum library.
#[derive(Debug, Error)]
pub enum DocSumError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Text to summarise was missing or blank after trimming.
    #[error("Text is required")]
    EmptyText,

    /// Text exceeds the configured character budget.
    #[error("Text too large. Max {max} characters allowed.")]
    TextTooLarge { len: usize, max: usize },

    // ── Extraction errors ─────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("File not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// Document exceeds the intake byte limit; rejected before extraction.
    #[error("File too large (max {} MB)", .max / (1024 * 1024))]
    DocumentTooLarge { size: u64, max: u64 },

    /// Bytes are neither a PDF nor a decodable raster image.
    #[error("Unsupported document format: {detail}")]
    UnsupportedFormat { detail: String },

    /// HTTP URL was syntactically valid but download failed.
    #[error("Failed to download '{url}': {reason}\nCheck your internet connection.")]
    DownloadFailed { url: String, reason: String },

    /// Download exceeded the configured timeout.
    #[error("Download timed out after {secs}s for '{url}'")]
    DownloadTimeout { url: String, secs: u64 },

    /// PDF header/trailer/xref is corrupt and cannot be parsed.
    #[error("PDF is corrupt: {detail}")]
    CorruptPdf { detail: String },

    /// PDF requires a password but none (or a wrong one) was provided.
    #[error("PDF is encrypted and requires a password.\nProvide it with --password <PASSWORD>.")]
    PasswordRequired,

    /// Extraction finished but produced nothing but whitespace.
    #[error("No text could be extracted from the document.")]
    NoTextExtracted,

    /// Raster image bytes could not be decoded.
    #[error("Failed to decode image: {detail}")]
    ImageDecodeFailed { detail: String },

    /// The recognition engine reported a failure.
    #[error("OCR failed: {detail}")]
    OcrFailed { detail: String },

    /// OCR model files are not present where the config points.
    #[error(
        "OCR model not found at '{path}'\n\
Download text-detection.rten and text-recognition.rten from \
https://github.com/robertknight/ocrs-models or run `ocrs` once to cache them."
    )]
    OcrModelsMissing { path: PathBuf },

    /// Could not bind to a pdfium library.
    #[error(
        "Failed to bind to pdfium library: {0}\n\
Set PDFIUM_LIB_PATH=/path/to/libpdfium or install pdfium system-wide."
    )]
    PdfiumBindingFailed(String),

    // ── Summarisation errors ──────────────────────────────────────────────
    /// Both the generative and the extractive path yielded empty text.
    #[error("Could not produce a summary: both generative and extractive paths returned empty text")]
    FallbackExhausted,

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Coarse classification used by callers that map errors onto a transport
/// (HTTP status codes, CLI exit messages).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Caller-supplied text was rejected before any work happened.
    Input,
    /// The document could not be turned into text.
    Extraction,
    /// Neither summariser produced output.
    FallbackExhausted,
    /// Configuration or runtime failure inside the library.
    Internal,
}

impl DocSumError {
    /// Classify this error into one of the [`ErrorCategory`] buckets.
    pub fn category(&self) -> ErrorCategory {
        match self {
            DocSumError::EmptyText | DocSumError::TextTooLarge { .. } => ErrorCategory::Input,
            DocSumError::FileNotFound { .. }
            | DocSumError::PermissionDenied { .. }
            | DocSumError::DocumentTooLarge { .. }
            | DocSumError::UnsupportedFormat { .. }
            | DocSumError::DownloadFailed { .. }
            | DocSumError::DownloadTimeout { .. }
            | DocSumError::CorruptPdf { .. }
            | DocSumError::PasswordRequired
            | DocSumError::NoTextExtracted
            | DocSumError::ImageDecodeFailed { .. }
            | DocSumError::OcrFailed { .. }
            | DocSumError::OcrModelsMissing { .. }
            | DocSumError::PdfiumBindingFailed(_) => ErrorCategory::Extraction,
            DocSumError::FallbackExhausted => ErrorCategory::FallbackExhausted,
            DocSumError::InvalidConfig(_) | DocSumError::Internal(_) => ErrorCategory::Internal,
        }
    }
}

/// A failure of the remote generative summariser.
///
/// Always absorbed by [`crate::summarize::Summarizer`], which logs it and
/// falls back to the extractive path.
#[derive(Debug, Clone, Error)]
pub enum GenerativeError {
    /// The provider call itself failed (network, auth, rate limit, 5xx).
    #[error("provider call failed: {0}")]
    Provider(String),

    /// The provider did not answer within the configured timeout.
    #[error("provider call timed out after {secs}s")]
    Timeout { secs: u64 },

    /// The provider answered with nothing but whitespace.
    #[error("provider returned an empty response")]
    EmptyResponse,

    /// The reply could not be parsed into a summary and highlights.
    #[error("could not parse provider response: {0}")]
    ParseFailed(String),
}

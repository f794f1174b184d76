//! End-to-end entry points: document in, summary out.
//!
//! One run is a straight line of suspending steps with no fan-out:
//!
//! ```text
//! intake ──▶ extract (pdf | ocr) ──▶ summarise
//! ```
//!
//! Progress callbacks observe the run as `Idle → Extracting → Summarizing →
//! Done`, or `Error` from either working state. Extraction failures stop the
//! run immediately; a failed generative call does not (see
//! [`crate::summarize`]).

use crate::config::DigestConfig;
use crate::document::{load_document, Document, MediaKind};
use crate::error::DocSumError;
use crate::output::{DigestOutput, DigestStats};
use crate::pipeline::{ocr, pdf};
use crate::progress::PipelineState;
use crate::summarize::Summarizer;
use std::future::Future;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Summarise a local file or an HTTP(S) URL.
///
/// # Arguments
/// * `input`  — Local file path or HTTP/HTTPS URL to a PDF or image
/// * `config` — Pipeline configuration
///
/// # Errors
/// Returns `Err(DocSumError)` when the document is oversized, unreadable or
/// yields no text, or when neither summariser produced output. Generative
/// failures are absorbed and never returned.
///
/// # Example
/// ```rust,no_run
/// use edgequake_docsum::{digest, DigestConfig};
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let output = digest("report.pdf", &DigestConfig::default()).await?;
/// println!("{}", output.summary.text);
/// for h in &output.summary.highlights {
///     println!("- {h}");
/// }
/// # Ok(())
/// # }
/// ```
pub async fn digest(
    input: impl AsRef<str>,
    config: &DigestConfig,
) -> Result<DigestOutput, DocSumError> {
    let input = input.as_ref();
    info!("Starting digest: {}", input);
    run(
        load_document(input, config.max_document_bytes, config.download_timeout_secs),
        config,
    )
    .await
}

/// Summarise a document held in memory.
///
/// `name` selects the extractor the same way a file name does: a `.pdf`
/// suffix means PDF, anything else means OCR. Without a name the `%PDF`
/// magic bytes decide.
pub async fn digest_from_bytes(
    bytes: Vec<u8>,
    name: Option<&str>,
    config: &DigestConfig,
) -> Result<DigestOutput, DocSumError> {
    let loaded = Document::from_bytes(bytes, name, config.max_document_bytes);
    run(async move { loaded }, config).await
}

/// Summarise an already size-checked [`Document`].
pub async fn digest_document(
    document: Document,
    config: &DigestConfig,
) -> Result<DigestOutput, DocSumError> {
    if document.len() > config.max_document_bytes {
        let err = DocSumError::DocumentTooLarge {
            size: document.len(),
            max: config.max_document_bytes,
        };
        return run(async move { Err(err) }, config).await;
    }
    run(async move { Ok(document) }, config).await
}

/// Synchronous wrapper around [`digest`].
///
/// Creates a temporary tokio runtime internally.
pub fn digest_sync(
    input: impl AsRef<str>,
    config: &DigestConfig,
) -> Result<DigestOutput, DocSumError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| DocSumError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(digest(input, config))
}

/// Extract a document's text with the extractor its kind selects.
///
/// Text that is empty after trimming is [`DocSumError::NoTextExtracted`].
pub async fn extract_text(document: &Document, config: &DigestConfig) -> Result<String, DocSumError> {
    let text = match document.kind() {
        MediaKind::Pdf => pdf::extract_pdf_text(document.bytes(), config.password.as_deref()).await?,
        MediaKind::Image => ocr::extract_image_text(document.bytes(), config).await?,
    };
    let text = text.trim();
    if text.is_empty() {
        return Err(DocSumError::NoTextExtracted);
    }
    Ok(text.to_string())
}

// ── Internal helpers ─────────────────────────────────────────────────────

fn notify(config: &DigestConfig, state: PipelineState) {
    debug!("Pipeline state: {}", state);
    if let Some(ref cb) = config.progress_callback {
        cb.on_state_change(state);
    }
}

/// Drive one run and report its terminal state.
async fn run<F>(load: F, config: &DigestConfig) -> Result<DigestOutput, DocSumError>
where
    F: Future<Output = Result<Document, DocSumError>>,
{
    notify(config, PipelineState::Idle);
    notify(config, PipelineState::Extracting);

    let outcome = process(load, config).await;
    match &outcome {
        Ok(output) => {
            info!(
                "Digest complete: {} chars, {:?} summary, {}ms total",
                output.stats.extracted_chars, output.source, output.stats.total_duration_ms
            );
            notify(config, PipelineState::Done);
        }
        Err(e) => {
            warn!(error = %e, "Digest failed");
            notify(config, PipelineState::Error);
        }
    }
    outcome
}

async fn process<F>(load: F, config: &DigestConfig) -> Result<DigestOutput, DocSumError>
where
    F: Future<Output = Result<Document, DocSumError>>,
{
    let total_start = Instant::now();

    // ── Step 1: Intake ───────────────────────────────────────────────────
    let document = load.await?;
    debug!("Document accepted: {:?}", document);

    // ── Step 2: Extract ──────────────────────────────────────────────────
    let extract_start = Instant::now();
    let text = extract_text(&document, config).await?;
    let extraction_duration_ms = extract_start.elapsed().as_millis() as u64;
    let extracted_chars = text.chars().count();
    info!(
        "Extracted {} chars from {} in {}ms",
        extracted_chars,
        document.kind(),
        extraction_duration_ms
    );
    if let Some(ref cb) = config.progress_callback {
        cb.on_extraction_complete(document.kind(), extracted_chars);
    }

    // ── Step 3: Summarise ────────────────────────────────────────────────
    notify(config, PipelineState::Summarizing);
    let summary_start = Instant::now();
    let (summary, source) = Summarizer::new(config)
        .summarize_with_source(&text, config.length)
        .await?;
    let summary_duration_ms = summary_start.elapsed().as_millis() as u64;

    Ok(DigestOutput {
        kind: document.kind(),
        extracted_text: text,
        summary,
        source,
        stats: DigestStats {
            document_bytes: document.len(),
            extracted_chars,
            extraction_duration_ms,
            summary_duration_ms,
            total_duration_ms: total_start.elapsed().as_millis() as u64,
        },
    })
}

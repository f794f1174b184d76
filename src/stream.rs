//! OCR progress as an async event stream.
//!
//! ## Why stream?
//!
//! Recognition of a full-page scan takes seconds to minutes. Callers want a
//! live percentage for a progress bar while the blocking engine runs, and a
//! single terminal event carrying either the text or the error.
//!
//! [`recognize_stream`] runs the engine on the blocking pool and yields
//! [`OcrEvent`]s through a bounded channel:
//!
//! ```text
//! Progress(3) ─▶ Progress(17) ─▶ … ─▶ Progress(100) ─▶ Completed(text)
//!                                                   └▶ Failed(err)
//! ```
//!
//! Contract: percentages never decrease within one stream, exactly one
//! terminal event (`Completed` or `Failed`) ends it, and the number and
//! spacing of `Progress` events is unspecified. Dropping the stream cancels
//! the engine at its next progress report.

use crate::error::DocSumError;
use crate::pipeline::ocr::{RecognitionEngine, RecognitionProgress, RecognitionStatus};
use std::ops::ControlFlow;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::task::{Context, Poll};
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tokio_stream::Stream;
use tracing::debug;

const EVENT_BUFFER: usize = 32;

/// One event from a running OCR job.
#[derive(Debug)]
pub enum OcrEvent {
    /// Recognition progress, 0–100.
    Progress(u8),
    /// Recognised text, trimmed.
    Completed(String),
    /// Decoding or recognition failed.
    Failed(DocSumError),
}

impl OcrEvent {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, OcrEvent::Progress(_))
    }
}

/// Turns raw engine fractions into a non-decreasing integer percentage.
#[derive(Debug, Default, Clone)]
pub struct MonotonicPercent {
    last: Option<u8>,
}

impl MonotonicPercent {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a fraction in `[0, 1]`. Returns the percentage to report, or
    /// `None` when the fraction is out of range or not a number.
    pub fn advance(&mut self, fraction: f32) -> Option<u8> {
        if !fraction.is_finite() || !(0.0..=1.0).contains(&fraction) {
            return None;
        }
        let pct = (fraction * 100.0).round() as u8;
        let next = self.last.map_or(pct, |last| last.max(pct));
        self.last = Some(next);
        Some(next)
    }

    pub fn last(&self) -> Option<u8> {
        self.last
    }
}

/// Stream of [`OcrEvent`]s. Dropping it cancels the underlying job.
pub struct OcrEventStream {
    inner: ReceiverStream<OcrEvent>,
    cancelled: Arc<AtomicBool>,
}

impl Stream for OcrEventStream {
    type Item = OcrEvent;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.inner).poll_next(cx)
    }
}

impl Drop for OcrEventStream {
    fn drop(&mut self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }
}

/// Decode `bytes` as an image and recognise its text with `engine`,
/// streaming progress.
///
/// Only progress reported with [`RecognitionStatus::RecognizingText`] is
/// forwarded; detection and model-loading phases stay silent.
///
/// # Example
/// ```rust,no_run
/// use edgequake_docsum::pipeline::ocr::OcrsRecognizer;
/// use edgequake_docsum::{recognize_stream, OcrConfig, OcrEvent};
/// use futures::StreamExt;
/// use std::sync::Arc;
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let engine = Arc::new(OcrsRecognizer::load(&OcrConfig::default())?);
/// let bytes = std::fs::read("scan.png")?;
/// let mut events = recognize_stream(engine, bytes, "eng");
/// while let Some(event) = events.next().await {
///     match event {
///         OcrEvent::Progress(p) => eprintln!("OCR {p}%"),
///         OcrEvent::Completed(text) => println!("{text}"),
///         OcrEvent::Failed(e) => eprintln!("error: {e}"),
///     }
/// }
/// # Ok(())
/// # }
/// ```
pub fn recognize_stream(
    engine: Arc<dyn RecognitionEngine>,
    bytes: Vec<u8>,
    language: impl Into<String>,
) -> OcrEventStream {
    let language = language.into();
    let (tx, rx) = mpsc::channel(EVENT_BUFFER);
    let cancelled = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&cancelled);

    tokio::task::spawn_blocking(move || {
        let terminal = match run_recognition(engine.as_ref(), &bytes, &language, &tx, &flag) {
            Ok(text) => OcrEvent::Completed(text.trim().to_string()),
            Err(e) => OcrEvent::Failed(e),
        };
        // Receiver gone means the caller cancelled; nothing left to report.
        if tx.blocking_send(terminal).is_err() {
            debug!("OCR result discarded: stream dropped");
        }
    });

    OcrEventStream {
        inner: ReceiverStream::new(rx),
        cancelled,
    }
}

fn run_recognition(
    engine: &dyn RecognitionEngine,
    bytes: &[u8],
    language: &str,
    tx: &mpsc::Sender<OcrEvent>,
    cancelled: &AtomicBool,
) -> Result<String, DocSumError> {
    let image = image::load_from_memory(bytes).map_err(|e| match e {
        image::ImageError::Unsupported(u) => DocSumError::UnsupportedFormat {
            detail: u.to_string(),
        },
        other => DocSumError::ImageDecodeFailed {
            detail: other.to_string(),
        },
    })?;
    debug!(
        "OCR input decoded: {}x{} via {}",
        image.width(),
        image.height(),
        engine.name()
    );

    let mut percent = MonotonicPercent::new();
    let mut report = |p: RecognitionProgress| -> ControlFlow<()> {
        if cancelled.load(Ordering::SeqCst) {
            return ControlFlow::Break(());
        }
        if p.status != RecognitionStatus::RecognizingText {
            return ControlFlow::Continue(());
        }
        match percent.advance(p.progress) {
            Some(pct) if tx.blocking_send(OcrEvent::Progress(pct)).is_err() => {
                ControlFlow::Break(())
            }
            _ => ControlFlow::Continue(()),
        }
    };

    engine.recognize(&image, language, &mut report)
}

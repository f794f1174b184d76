//! Progress-callback trait for pipeline events.
//!
//! Inject an [`Arc<dyn DigestProgressCallback>`] via
//! [`crate::config::DigestConfigBuilder::progress_callback`] to observe a
//! run as it moves through its states:
//!
//! ```text
//! Idle ──▶ Extracting ──▶ Summarizing ──▶ Done
//!              │               │
//!              └──────┬────────┘
//!                     ▼
//!                   Error
//! ```
//!
//! `Extracting` fails on an oversized or unreadable document or when no text
//! comes out. A failed generative call inside `Summarizing` is reported via
//! [`DigestProgressCallback::on_fallback`] and does not move the run to
//! `Error`; only an exhausted fallback does.
//!
//! # Example
//!
//! ```rust
//! use edgequake_docsum::{DigestConfig, DigestProgressCallback, PipelineState};
//! use std::sync::{Arc, Mutex};
//!
//! #[derive(Default)]
//! struct Recorder {
//!     states: Mutex<Vec<PipelineState>>,
//! }
//!
//! impl DigestProgressCallback for Recorder {
//!     fn on_state_change(&self, state: PipelineState) {
//!         self.states.lock().unwrap().push(state);
//!     }
//! }
//!
//! let config = DigestConfig::builder()
//!     .progress_callback(Arc::new(Recorder::default()))
//!     .build()
//!     .unwrap();
//! ```

use crate::document::MediaKind;
use crate::output::SummarySource;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Where a single pipeline run currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PipelineState {
    Idle,
    Extracting,
    Summarizing,
    Done,
    Error,
}

impl PipelineState {
    /// `true` for `Done` and `Error`.
    pub fn is_terminal(&self) -> bool {
        matches!(self, PipelineState::Done | PipelineState::Error)
    }
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            PipelineState::Idle => "Ready",
            PipelineState::Extracting => "Extracting text...",
            PipelineState::Summarizing => "Generating summary...",
            PipelineState::Done => "Done",
            PipelineState::Error => "Error",
        };
        f.write_str(label)
    }
}

/// Called by the pipeline as a document moves through extraction and
/// summarisation.
///
/// Implementations must be `Send + Sync`; independent runs may share one
/// callback and execute on different threads. All methods have default
/// no-op implementations so callers only override what they care about.
pub trait DigestProgressCallback: Send + Sync {
    /// Called on every state transition, including the initial `Idle`.
    fn on_state_change(&self, state: PipelineState) {
        let _ = state;
    }

    /// Called while OCR is recognising text.
    ///
    /// # Arguments
    /// * `percent` — 0–100, never lower than the previous call within one run
    fn on_ocr_progress(&self, percent: u8) {
        let _ = percent;
    }

    /// Called once extraction produced non-empty text.
    ///
    /// # Arguments
    /// * `kind`  — which extractor ran
    /// * `chars` — characters of extracted text
    fn on_extraction_complete(&self, kind: MediaKind, chars: usize) {
        let _ = (kind, chars);
    }

    /// Called when the generative attempt failed or came back empty and the
    /// extractive summariser takes over.
    ///
    /// # Arguments
    /// * `reason` — human-readable cause, for logs only
    fn on_fallback(&self, reason: &str) {
        let _ = reason;
    }

    /// Called once a summary has been produced.
    ///
    /// # Arguments
    /// * `source`     — which summariser produced it
    /// * `highlights` — number of highlights returned
    fn on_summary_complete(&self, source: SummarySource, highlights: usize) {
        let _ = (source, highlights);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl DigestProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::DigestConfig`].
pub type ProgressCallback = Arc<dyn DigestProgressCallback>;

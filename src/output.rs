//! Result types returned by the summarisation pipeline.

use crate::document::MediaKind;
use serde::{Deserialize, Serialize};

/// Hard cap on the number of highlights any result may carry.
pub const MAX_HIGHLIGHTS: usize = 5;

/// A summary plus its key points.
///
/// Every constructor in this crate guarantees at most
/// [`MAX_HIGHLIGHTS`] highlights, and each highlight is non-empty after
/// trimming. `text` is non-empty whenever the value comes out of a
/// successful [`crate::summarize::Summarizer::summarize`] call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryResult {
    pub text: String,
    pub highlights: Vec<String>,
}

impl SummaryResult {
    /// Build a result, trimming the text and every highlight, dropping blank
    /// highlights and capping the list at [`MAX_HIGHLIGHTS`].
    pub fn normalized<I, S>(text: &str, highlights: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            text: text.trim().to_string(),
            highlights: highlights
                .into_iter()
                .map(|h| h.as_ref().trim().to_string())
                .filter(|h| !h.is_empty())
                .take(MAX_HIGHLIGHTS)
                .collect(),
        }
    }

    /// `true` when there is no summary text.
    pub fn is_empty(&self) -> bool {
        self.text.trim().is_empty()
    }
}

/// Which summariser produced a [`SummaryResult`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SummarySource {
    /// The remote language model.
    Generative,
    /// The local sentence-scoring fallback.
    Extractive,
}

/// Timing and size figures for one pipeline run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DigestStats {
    /// Size of the input document in bytes.
    pub document_bytes: u64,
    /// Characters of extracted text handed to the summariser.
    pub extracted_chars: usize,
    /// Wall-clock time spent extracting text.
    pub extraction_duration_ms: u64,
    /// Wall-clock time spent summarising (generative attempt included).
    pub summary_duration_ms: u64,
    /// End-to-end wall-clock time.
    pub total_duration_ms: u64,
}

/// Everything produced by a full document run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DigestOutput {
    /// What kind of document was processed.
    pub kind: MediaKind,
    /// The reconstructed document text.
    pub extracted_text: String,
    /// The normalised summary.
    pub summary: SummaryResult,
    /// Which summariser produced `summary`.
    pub source: SummarySource,
    pub stats: DigestStats,
}

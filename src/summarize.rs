//! Summarisation orchestrator.
//!
//! Decides between the generative client and the extractive fallback and
//! normalises whichever answered:
//!
//! ```text
//! text ──▶ validate ──▶ generative? ──ok, non-empty──▶ result
//!             │              │
//!          Err(Input)    fail / empty / absent
//!                            ▼
//!                       extractive ──non-empty──▶ result
//!                            │
//!                            ▼
//!                   Err(FallbackExhausted)
//! ```
//!
//! Generative failures are logged and absorbed here; they never reach the
//! caller.

use crate::config::{DigestConfig, LengthMode};
use crate::error::DocSumError;
use crate::output::{SummaryResult, SummarySource};
use crate::pipeline::extractive::summarize_extractive;
use crate::pipeline::generative::GenerativeClient;
use crate::progress::ProgressCallback;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Validates text and produces a [`SummaryResult`].
///
/// Cheap to clone; holds no per-request state, so one instance can serve
/// concurrent requests.
#[derive(Clone)]
pub struct Summarizer {
    generative: Option<GenerativeClient>,
    max_text_chars: usize,
    max_highlights: usize,
    progress_callback: Option<ProgressCallback>,
}

impl Summarizer {
    /// Build from a config. The generative path is attempted exactly when
    /// `config.generator` is set.
    pub fn new(config: &DigestConfig) -> Self {
        let generative = config.generator.as_ref().map(|generator| {
            GenerativeClient::new(
                generator.clone(),
                config.parser.clone(),
                Duration::from_secs(config.api_timeout_secs),
            )
        });
        Self {
            generative,
            max_text_chars: config.max_text_chars,
            max_highlights: config.max_highlights,
            progress_callback: config.progress_callback.clone(),
        }
    }

    pub fn max_text_chars(&self) -> usize {
        self.max_text_chars
    }

    pub fn generative_enabled(&self) -> bool {
        self.generative.is_some()
    }

    /// Reject blank or oversized text. Character counts are Unicode scalar
    /// values, so an astral-plane character (most emoji) counts once, not
    /// twice as in a UTF-16 length.
    pub fn validate(&self, text: &str) -> Result<(), DocSumError> {
        if text.trim().is_empty() {
            return Err(DocSumError::EmptyText);
        }
        // Byte length bounds char count, so short texts skip the scan.
        if text.len() > self.max_text_chars {
            let len = text.chars().count();
            if len > self.max_text_chars {
                return Err(DocSumError::TextTooLarge {
                    len,
                    max: self.max_text_chars,
                });
            }
        }
        Ok(())
    }

    /// Summarise `text`. Fails only on invalid input or when neither path
    /// produced any text.
    pub async fn summarize(
        &self,
        text: &str,
        length: LengthMode,
    ) -> Result<SummaryResult, DocSumError> {
        self.summarize_with_source(text, length)
            .await
            .map(|(result, _)| result)
    }

    /// Like [`Self::summarize`], also reporting which path answered.
    pub async fn summarize_with_source(
        &self,
        text: &str,
        length: LengthMode,
    ) -> Result<(SummaryResult, SummarySource), DocSumError> {
        self.validate(text)?;

        // ── Generative attempt ──────────────────────────────────────────
        if let Some(ref client) = self.generative {
            match client.summarize(text, length).await {
                Ok(raw) => {
                    let result = SummaryResult::normalized(&raw.text, &raw.highlights);
                    if !result.is_empty() {
                        info!(
                            generator = client.name(),
                            highlights = result.highlights.len(),
                            "Generative summary produced"
                        );
                        self.report_complete(SummarySource::Generative, &result);
                        return Ok((result, SummarySource::Generative));
                    }
                    self.fall_back("generative summary was empty");
                }
                Err(error) => {
                    warn!(
                        generator = client.name(),
                        error = %error,
                        "Generative summarization failed; falling back to extractive"
                    );
                    self.fall_back(&error.to_string());
                }
            }
        } else {
            debug!("No generative summarizer configured; using extractive path");
        }

        // ── Extractive fallback ─────────────────────────────────────────
        let extractive = summarize_extractive(text, self.max_highlights);
        let result = SummaryResult::normalized(&extractive.text, &extractive.highlights);
        if result.is_empty() {
            return Err(DocSumError::FallbackExhausted);
        }
        info!(
            highlights = result.highlights.len(),
            "Extractive summary produced"
        );
        self.report_complete(SummarySource::Extractive, &result);
        Ok((result, SummarySource::Extractive))
    }

    fn fall_back(&self, reason: &str) {
        if let Some(ref cb) = self.progress_callback {
            cb.on_fallback(reason);
        }
    }

    fn report_complete(&self, source: SummarySource, result: &SummaryResult) {
        if let Some(ref cb) = self.progress_callback {
            cb.on_summary_complete(source, result.highlights.len());
        }
    }
}

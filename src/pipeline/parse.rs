//! Structured-summary parsing of free-text model replies.
//!
//! Language models are asked for "a paragraph, then bullet points", and
//! mostly comply. A [`SummaryParser`] turns that reply into a
//! [`SummaryResult`]; a parse failure is a [`GenerativeError`], so the
//! orchestrator falls back to the extractive path exactly as it would for a
//! network error.

use crate::error::GenerativeError;
use crate::output::{SummaryResult, MAX_HIGHLIGHTS};
use once_cell::sync::Lazy;
use regex::Regex;

/// Turns a raw generative reply into summary text plus highlights.
pub trait SummaryParser: Send + Sync {
    /// Short identifier used in logs.
    fn name(&self) -> &str;

    fn parse(&self, raw: &str) -> Result<SummaryResult, GenerativeError>;
}

/// Line break followed by a bullet marker (`-`, `•` or `*`), with optional
/// surrounding whitespace.
static BULLET_BREAK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\n\s*[-•*]\s*").expect("bullet regex is valid"));

static LEADING_BULLET: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[-•*]\s*").expect("leading bullet regex is valid"));

/// Parser for "summary paragraph, then one bulleted line per highlight".
///
/// ```text
/// Summary sentence.          ──▶ text
/// - Point A                  ──▶ highlights[0]
/// • Point B                  ──▶ highlights[1]
/// ```
#[derive(Debug, Default, Clone, Copy)]
pub struct BulletListParser;

impl SummaryParser for BulletListParser {
    fn name(&self) -> &str {
        "bullet-list"
    }

    fn parse(&self, raw: &str) -> Result<SummaryResult, GenerativeError> {
        if raw.trim().is_empty() {
            return Err(GenerativeError::EmptyResponse);
        }

        let mut segments = BULLET_BREAK.split(raw);
        let text = segments.next().unwrap_or_default().trim();
        if text.is_empty() {
            return Err(GenerativeError::ParseFailed(
                "reply has highlights but no summary paragraph".into(),
            ));
        }

        let highlights: Vec<String> = segments
            .map(|seg| LEADING_BULLET.replace(seg.trim(), "").trim().to_string())
            .filter(|h| !h.is_empty())
            .take(MAX_HIGHLIGHTS)
            .collect();

        Ok(SummaryResult {
            text: text.to_string(),
            highlights,
        })
    }
}

//! Extractive fallback summariser.
//!
//! Picks existing sentences by a cheap salience score that prefers long
//! sentences and, among those, early ones:
//!
//! ```text
//! score(i) = 0.7 · min(1, len / 200) + 0.3 · 1 / (i + 1)
//! ```
//!
//! Deterministic and allocation-light; used whenever the generative path is
//! unavailable, fails, or comes back empty.

use crate::output::{SummaryResult, MAX_HIGHLIGHTS};
use once_cell::sync::Lazy;
use regex::Regex;
use std::cmp::Ordering;

/// Sentence length (in characters) at which the length score saturates.
const FULL_LENGTH_CHARS: f64 = 200.0;
const LENGTH_WEIGHT: f64 = 0.7;
const POSITION_WEIGHT: f64 = 0.3;

/// Characters used as the sole sentence when no boundary is found.
pub const NO_BOUNDARY_PREFIX_CHARS: usize = 500;

static NEWLINE_RUNS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\n+").expect("newline regex is valid"));

static SENTENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^.!?]+[.!?]*").expect("sentence regex is valid"));

/// A candidate sentence with its position and score.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredSentence {
    pub text: String,
    pub position: usize,
    pub score: f64,
}

/// Split `text` into trimmed, non-blank sentences in document order.
///
/// Newline runs become single spaces first. When the text contains no
/// sentence at all, its first 500 characters are returned as the only one.
pub fn split_sentences(text: &str) -> Vec<String> {
    let flattened = NEWLINE_RUNS.replace_all(text, " ");
    let sentences: Vec<String> = SENTENCE
        .find_iter(&flattened)
        .map(|m| m.as_str().trim())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect();

    if !sentences.is_empty() {
        return sentences;
    }

    let prefix: String = text.chars().take(NO_BOUNDARY_PREFIX_CHARS).collect();
    let prefix = prefix.trim();
    if prefix.is_empty() {
        Vec::new()
    } else {
        vec![prefix.to_string()]
    }
}

/// Salience score of a sentence at zero-based `position`.
pub fn score_sentence(sentence: &str, position: usize) -> f64 {
    let len = sentence.trim().chars().count() as f64;
    let length_score = (len / FULL_LENGTH_CHARS).min(1.0);
    let position_score = 1.0 / (position as f64 + 1.0);
    LENGTH_WEIGHT * length_score + POSITION_WEIGHT * position_score
}

/// Score every sentence and order them best first. Equal scores keep
/// document order.
pub fn rank_sentences(sentences: Vec<String>) -> Vec<ScoredSentence> {
    let mut scored: Vec<ScoredSentence> = sentences
        .into_iter()
        .enumerate()
        .map(|(position, text)| ScoredSentence {
            score: score_sentence(&text, position),
            text,
            position,
        })
        .collect();
    scored.sort_by(by_rank);
    scored
}

fn by_rank(a: &ScoredSentence, b: &ScoredSentence) -> Ordering {
    b.score
        .total_cmp(&a.score)
        .then_with(|| a.position.cmp(&b.position))
}

/// Summarise `text` by selecting up to `max_highlights` sentences.
///
/// The summary is the selected sentences joined by single spaces in ranked
/// order. Blank input yields an empty result, not an error.
///
/// `max_highlights` is clamped to [`MAX_HIGHLIGHTS`], so the result holds
/// `min(max_highlights, 5, sentence count)` highlights.
pub fn summarize_extractive(text: &str, max_highlights: usize) -> SummaryResult {
    let limit = max_highlights.min(MAX_HIGHLIGHTS);
    let highlights: Vec<String> = rank_sentences(split_sentences(text))
        .into_iter()
        .take(limit)
        .map(|s| s.text)
        .collect();

    SummaryResult {
        text: highlights.join(" "),
        highlights,
    }
}

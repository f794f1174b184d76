//! # edgequake-docsum
//!
//! Summarise PDF documents and scanned images into a short summary plus up
//! to five highlight sentences.
//!
//! ## Why this crate?
//!
//! Language models write good summaries but fail in all the usual ways:
//! timeouts, revoked keys, empty or rambling replies. This crate treats the
//! model as optional. Every request that has text gets a summary: when the
//! generative path fails, a deterministic extractive summariser answers
//! instead, and the caller never sees the model's error.
//!
//! ## Pipeline Overview
//!
//! ```text
//! document
//!  │
//!  ├─ 1. Intake     local file or URL, 20 MB limit, kind by extension
//!  ├─ 2. Extract    PDF text layer (pdfium) or OCR (ocrs), trimmed
//!  ├─ 3. Validate   non-blank, ≤ 500 000 characters
//!  ├─ 4. Summarise  language model via edgequake-llm, 120 s timeout
//!  ├─ 5. Fallback   extractive sentence scoring if step 4 failed
//!  └─ 6. Output     { text, highlights ≤ 5 } + source + timings
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use edgequake_docsum::pipeline::generative::{resolve_llm_provider, LlmGenerator};
//! use edgequake_docsum::{digest, DigestConfig, LengthMode};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let (provider, label) = resolve_llm_provider(Some("openai"), None)?;
//!     let config = DigestConfig::builder()
//!         .generator(Arc::new(LlmGenerator::new(provider, label)))
//!         .length(LengthMode::Medium)
//!         .build()?;
//!     let output = digest("report.pdf", &config).await?;
//!     println!("{}", output.summary.text);
//!     Ok(())
//! }
//! ```
//!
//! Without `.generator(...)` every request takes the extractive path.
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `docsum` binary (clap + anyhow + indicatif + tracing-subscriber) |
//!
//! Disable `cli` when using only the library to avoid pulling in CLI-only deps:
//! ```toml
//! edgequake-docsum = { version = "0.1", default-features = false }
//! ```
//!
//! ## OCR models
//!
//! Image inputs need the `ocrs` models `text-detection.rten` and
//! `text-recognition.rten`, looked up under `$XDG_CACHE_HOME/ocrs` by default
//! (see [`OcrConfig`]).

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod digest;
pub mod document;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod prompts;
pub mod server;
pub mod stream;
pub mod summarize;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{DigestConfig, DigestConfigBuilder, LengthMode, OcrConfig};
pub use digest::{digest, digest_document, digest_from_bytes, digest_sync, extract_text};
pub use document::{load_document, Document, MediaKind};
pub use error::{DocSumError, ErrorCategory, GenerativeError};
pub use output::{DigestOutput, DigestStats, SummaryResult, SummarySource, MAX_HIGHLIGHTS};
pub use pipeline::extractive::summarize_extractive;
pub use pipeline::generative::{GenerativeClient, LlmGenerator, SummaryGenerator};
pub use pipeline::ocr::{OcrsRecognizer, RecognitionEngine};
pub use pipeline::parse::{BulletListParser, SummaryParser};
pub use progress::{DigestProgressCallback, NoopProgressCallback, PipelineState, ProgressCallback};
pub use server::{create_router, serve, ServerConfig};
pub use stream::{recognize_stream, OcrEvent, OcrEventStream};
pub use summarize::Summarizer;

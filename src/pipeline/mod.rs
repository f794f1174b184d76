//! Pipeline stages for document summarisation.
//!
//! Each submodule implements exactly one transformation step.
//! Keeping stages separate makes each independently testable and lets us
//! swap implementations (e.g. another OCR engine or model provider) without
//! touching other stages.
//!
//! ## Data Flow
//!
//! ```text
//!            ┌─▶ pdf ──▶ layout ─┐
//! document ──┤                   ├──▶ generative ──▶ parse ─┐
//!            └─▶ ocr ────────────┘        │ (fails)         ├──▶ summary
//!                                         └──▶ extractive ──┘
//! ```
//!
//! 1. [`pdf`]        — read the text layer via pdfium; runs in
//!    `spawn_blocking` because pdfium is not async-safe
//! 2. [`layout`]     — rebuild lines from positioned fragments
//! 3. [`ocr`]        — recognise text in raster images, streaming progress
//! 4. [`generative`] — one bounded-time call to a language model; the only
//!    stage with network I/O
//! 5. [`parse`]      — turn the model's free text into summary + highlights
//! 6. [`extractive`] — deterministic sentence-scoring fallback

pub mod extractive;
pub mod generative;
pub mod layout;
pub mod ocr;
pub mod parse;
pub mod pdf;

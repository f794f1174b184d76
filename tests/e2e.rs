//! End-to-end integration tests for edgequake-docsum.
//!
//! The first group runs everywhere: OCR and the language model are replaced
//! by in-process stubs, so a whole run (intake, extraction, summary,
//! fallback, HTTP surface) is exercised without models or network.
//!
//! The second group uses real PDFs in `./test_cases/`, real `ocrs` models and
//! live LLM API calls. Those are gated behind the `E2E_ENABLED` environment
//! variable so they do not run in CI unless explicitly requested.
//!
//! Run with:
//!   E2E_ENABLED=1 DYLD_LIBRARY_PATH=. cargo test --test e2e -- --nocapture
//!
//! To restrict to a specific test:
//!   cargo test --test e2e test_router -- --nocapture

use axum::body::{to_bytes, Body};
use axum::http::{Method, Request, StatusCode};
use edgequake_docsum::pipeline::generative::{resolve_llm_provider, LlmGenerator};
use edgequake_docsum::pipeline::ocr::{RecognitionProgress, RecognitionStatus};
use edgequake_docsum::{
    create_router, digest, digest_from_bytes, summarize_extractive, DigestConfig,
    DigestProgressCallback, DocSumError, GenerativeError, LengthMode, MediaKind,
    NoopProgressCallback, OcrConfig, PipelineState, RecognitionEngine, SummaryGenerator,
    SummarySource, Summarizer,
};
use futures::future::BoxFuture;
use image::{DynamicImage, ImageFormat};
use serde_json::{json, Value};
use std::io::{Cursor, Write};
use std::ops::ControlFlow;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tower::ServiceExt;

// ── Test helpers ─────────────────────────────────────────────────────────────

const MEMO: &str = "The quarterly budget review found that travel spending rose by a third. \
Finance will freeze new travel requests until the end of the year. \
Teams may appeal. \
A follow-up review is scheduled for March, when the freeze will be reconsidered.";

fn test_cases_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("test_cases")
}

/// Skip this test if E2E_ENABLED is not set *or* no file at `path`.
macro_rules! e2e_skip_unless_ready {
    ($path:expr) => {{
        if std::env::var("E2E_ENABLED").is_err() {
            println!("SKIP — set E2E_ENABLED=1 to run e2e tests");
            return;
        }
        let p: PathBuf = $path;
        if !p.exists() {
            println!("SKIP — test file not found: {}", p.display());
            return;
        }
        p
    }};
}

/// OCR engine that "reads" fixed text in four progress steps.
struct ScriptedEngine {
    text: &'static str,
}

impl RecognitionEngine for ScriptedEngine {
    fn name(&self) -> &str {
        "scripted"
    }

    fn recognize(
        &self,
        _image: &DynamicImage,
        _language: &str,
        report: &mut dyn FnMut(RecognitionProgress) -> ControlFlow<()>,
    ) -> Result<String, DocSumError> {
        let _ = report(RecognitionProgress {
            status: RecognitionStatus::LoadingModels,
            progress: 0.9,
        });
        for progress in [0.25, 0.5, 0.4, 1.0] {
            if report(RecognitionProgress {
                status: RecognitionStatus::RecognizingText,
                progress,
            })
            .is_break()
            {
                return Err(DocSumError::OcrFailed {
                    detail: "cancelled".into(),
                });
            }
        }
        Ok(self.text.to_string())
    }
}

/// Generator with a canned reply; counts calls.
struct CannedGenerator {
    reply: Result<&'static str, GenerativeError>,
    calls: Mutex<usize>,
}

impl CannedGenerator {
    fn new(reply: Result<&'static str, GenerativeError>) -> Arc<Self> {
        Arc::new(Self {
            reply,
            calls: Mutex::new(0),
        })
    }

    fn calls(&self) -> usize {
        *self.calls.lock().unwrap()
    }
}

impl SummaryGenerator for CannedGenerator {
    fn name(&self) -> &str {
        "canned"
    }

    fn generate<'a>(&'a self, _prompt: &'a str) -> BoxFuture<'a, Result<String, GenerativeError>> {
        *self.calls.lock().unwrap() += 1;
        let reply = self.reply.clone().map(str::to_string);
        Box::pin(async move { reply })
    }
}

/// Records every callback for later assertions.
#[derive(Default)]
struct Recorder {
    states: Mutex<Vec<PipelineState>>,
    percents: Mutex<Vec<u8>>,
    fallbacks: Mutex<Vec<String>>,
    extracted: Mutex<Option<(MediaKind, usize)>>,
    completed: Mutex<Option<(SummarySource, usize)>>,
}

impl DigestProgressCallback for Recorder {
    fn on_state_change(&self, state: PipelineState) {
        self.states.lock().unwrap().push(state);
    }

    fn on_ocr_progress(&self, percent: u8) {
        self.percents.lock().unwrap().push(percent);
    }

    fn on_extraction_complete(&self, kind: MediaKind, chars: usize) {
        *self.extracted.lock().unwrap() = Some((kind, chars));
    }

    fn on_fallback(&self, reason: &str) {
        self.fallbacks.lock().unwrap().push(reason.to_string());
    }

    fn on_summary_complete(&self, source: SummarySource, highlights: usize) {
        *self.completed.lock().unwrap() = Some((source, highlights));
    }
}

fn png_bytes() -> Vec<u8> {
    let mut buf = Vec::new();
    DynamicImage::new_rgb8(32, 32)
        .write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
        .expect("encode png");
    buf
}

fn config_with(
    generator: Option<Arc<CannedGenerator>>,
    recorder: Arc<Recorder>,
) -> DigestConfig {
    let mut builder = DigestConfig::builder()
        .ocr_engine(Arc::new(ScriptedEngine { text: MEMO }))
        .progress_callback(recorder);
    if let Some(g) = generator {
        builder = builder.generator(g);
    }
    builder.build().expect("config")
}

/// Assert the result respects the output contract.
fn assert_summary_shape(text: &str, highlights: &[String], context: &str) {
    assert!(!text.trim().is_empty(), "[{context}] summary is empty");
    assert_eq!(text, text.trim(), "[{context}] summary not trimmed");
    assert!(highlights.len() <= 5, "[{context}] too many highlights");
    for h in highlights {
        assert!(!h.trim().is_empty(), "[{context}] blank highlight");
        assert_eq!(h, h.trim(), "[{context}] highlight not trimmed: {h:?}");
    }
}

// ── Stubbed pipeline (always run) ────────────────────────────────────────────

#[tokio::test]
async fn test_image_digest_with_generator() {
    let generator = CannedGenerator::new(Ok(
        "  Travel spending is frozen after a budget review.\n- Travel up a third\n- Freeze until year end\n-   \n",
    ));
    let recorder = Arc::new(Recorder::default());
    let config = config_with(Some(generator.clone()), recorder.clone());

    let out = digest_from_bytes(png_bytes(), Some("memo.png"), &config)
        .await
        .expect("digest");

    assert_eq!(out.kind, MediaKind::Image);
    assert_eq!(out.source, SummarySource::Generative);
    assert_eq!(out.extracted_text, MEMO);
    assert_eq!(
        out.summary.text,
        "Travel spending is frozen after a budget review."
    );
    assert_eq!(
        out.summary.highlights,
        vec!["Travel up a third", "Freeze until year end"]
    );
    assert_summary_shape(&out.summary.text, &out.summary.highlights, "image+llm");
    assert_eq!(generator.calls(), 1);

    assert_eq!(*recorder.percents.lock().unwrap(), vec![25, 50, 50, 100]);
    assert_eq!(
        *recorder.extracted.lock().unwrap(),
        Some((MediaKind::Image, MEMO.chars().count()))
    );
    assert_eq!(
        *recorder.completed.lock().unwrap(),
        Some((SummarySource::Generative, 2))
    );
    assert!(recorder.fallbacks.lock().unwrap().is_empty());
    assert_eq!(
        *recorder.states.lock().unwrap(),
        vec![
            PipelineState::Idle,
            PipelineState::Extracting,
            PipelineState::Summarizing,
            PipelineState::Done,
        ]
    );
}

#[tokio::test]
async fn test_image_digest_falls_back_when_generator_fails() {
    let generator = CannedGenerator::new(Err(GenerativeError::Timeout { secs: 120 }));
    let recorder = Arc::new(Recorder::default());
    let config = config_with(Some(generator.clone()), recorder.clone());

    let out = digest_from_bytes(png_bytes(), Some("memo.jpg"), &config)
        .await
        .expect("digest");

    let expected = summarize_extractive(MEMO, 5);
    assert_eq!(out.source, SummarySource::Extractive);
    assert_eq!(out.summary, expected);
    assert_eq!(out.summary.highlights.len(), 4);
    // Position weight lifts the opening sentence above the longer closing one.
    assert!(out.summary.highlights[0].starts_with("The quarterly budget review"));
    assert_eq!(out.summary.highlights[3], "Teams may appeal.");
    assert_summary_shape(&out.summary.text, &out.summary.highlights, "fallback");

    assert_eq!(recorder.fallbacks.lock().unwrap().len(), 1);
    assert_eq!(
        recorder.states.lock().unwrap().last(),
        Some(&PipelineState::Done)
    );
}

#[tokio::test]
async fn test_image_digest_without_generator_is_extractive() {
    let recorder = Arc::new(Recorder::default());
    let config = config_with(None, recorder.clone());
    let out = digest_from_bytes(png_bytes(), None, &config)
        .await
        .expect("digest");
    assert_eq!(out.source, SummarySource::Extractive);
    assert_eq!(out.stats.document_bytes, png_bytes().len() as u64);
    assert_eq!(out.stats.extracted_chars, MEMO.chars().count());
}

#[tokio::test]
async fn test_digest_local_file() {
    let mut file = tempfile::Builder::new()
        .suffix(".png")
        .tempfile()
        .expect("tempfile");
    file.write_all(&png_bytes()).expect("write png");

    let recorder = Arc::new(Recorder::default());
    let config = config_with(None, recorder);
    let path = file.path().to_string_lossy().to_string();
    let out = digest(&path, &config).await.expect("digest");
    assert_eq!(out.kind, MediaKind::Image);
    assert!(!out.summary.highlights.is_empty());
}

#[tokio::test]
async fn test_digest_rejects_oversized_file() {
    let mut file = tempfile::Builder::new()
        .suffix(".png")
        .tempfile()
        .expect("tempfile");
    file.write_all(&png_bytes()).expect("write png");

    let recorder = Arc::new(Recorder::default());
    let config = DigestConfig::builder()
        .ocr_engine(Arc::new(ScriptedEngine { text: MEMO }))
        .progress_callback(recorder.clone())
        .max_document_bytes(16)
        .build()
        .expect("config");
    let path = file.path().to_string_lossy().to_string();
    let err = digest(&path, &config).await.unwrap_err();
    assert!(matches!(err, DocSumError::DocumentTooLarge { max: 16, .. }));
    assert!(recorder.percents.lock().unwrap().is_empty());
    assert_eq!(
        recorder.states.lock().unwrap().last(),
        Some(&PipelineState::Error)
    );
}

#[tokio::test]
async fn test_digest_rejects_undecodable_image() {
    let recorder = Arc::new(Recorder::default());
    let config = config_with(None, recorder);
    let err = digest_from_bytes(b"definitely not an image".to_vec(), Some("scan.png"), &config)
        .await
        .unwrap_err();
    assert!(
        matches!(
            err,
            DocSumError::ImageDecodeFailed { .. } | DocSumError::UnsupportedFormat { .. }
        ),
        "unexpected error: {err}"
    );
}

#[tokio::test]
async fn test_missing_ocr_models_are_reported() {
    let dir = tempfile::tempdir().expect("tempdir");
    let config = DigestConfig::builder()
        .ocr(OcrConfig::from_dir(dir.path()))
        .build()
        .expect("config");
    let err = digest_from_bytes(png_bytes(), Some("scan.png"), &config)
        .await
        .unwrap_err();
    assert!(matches!(err, DocSumError::OcrModelsMissing { .. }));
}

// ── HTTP surface (always run) ────────────────────────────────────────────────

async fn post_review(summarizer: Summarizer, body: Value) -> (StatusCode, Value) {
    let response = create_router(Arc::new(summarizer))
        .oneshot(
            Request::builder()
                .method(Method::POST)
                .uri("/ai/get-review")
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .expect("request"),
        )
        .await
        .expect("router response");
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    (status, serde_json::from_slice(&bytes).expect("json body"))
}

#[tokio::test]
async fn test_router_extractive_review() {
    let config = DigestConfig::default();
    let (status, json) = post_review(Summarizer::new(&config), json!({ "text": MEMO })).await;
    assert_eq!(status, StatusCode::OK);

    let expected = summarize_extractive(MEMO, 5);
    assert_eq!(json["text"], expected.text);
    assert_eq!(json["highlights"], json!(expected.highlights));
}

#[tokio::test]
async fn test_router_caps_generator_highlights() {
    let generator = CannedGenerator::new(Ok("Summary.\n- a\n- b\n- c\n- d\n- e\n- f\n- g"));
    let config = DigestConfig::builder()
        .generator(generator.clone())
        .build()
        .expect("config");
    let (status, json) = post_review(
        Summarizer::new(&config),
        json!({ "text": MEMO, "length": "medium" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["text"], "Summary.");
    assert_eq!(json["highlights"], json!(["a", "b", "c", "d", "e"]));
    assert_eq!(generator.calls(), 1);
}

#[tokio::test]
async fn test_router_limit_counts_characters() {
    let config = DigestConfig::builder()
        .max_text_chars(10)
        .build()
        .expect("config");

    // Ten multi-byte characters fit.
    let (status, _) = post_review(Summarizer::new(&config), json!({ "text": "ééééé ééé." })).await;
    assert_eq!(status, StatusCode::OK);

    let (status, json) =
        post_review(Summarizer::new(&config), json!({ "text": "ééééé éééé." })).await;
    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(json["error"], "Text too large. Max 10 characters allowed.");
}

// ── Callback trait bounds ────────────────────────────────────────────────────

/// The callback must be usable from spawned tasks.
#[tokio::test]
async fn test_callback_send_in_tokio_spawn() {
    let recorder = Arc::new(Recorder::default());
    let config = config_with(None, recorder.clone());
    let handle = tokio::spawn(async move {
        digest_from_bytes(png_bytes(), Some("memo.png"), &config).await
    });
    let out = handle.await.expect("join").expect("digest");
    assert_eq!(out.source, SummarySource::Extractive);
    assert_eq!(
        recorder.states.lock().unwrap().last(),
        Some(&PipelineState::Done)
    );
}

#[test]
fn test_noop_callback_is_send_sync() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<NoopProgressCallback>();
    assert_send_sync::<Summarizer>();
    assert_send_sync::<DigestConfig>();
}

// ── Real documents and providers (E2E_ENABLED) ───────────────────────────────

#[tokio::test]
async fn test_pdf_text_layer_extractive() {
    let path = e2e_skip_unless_ready!(test_cases_dir().join("sample.pdf"));
    let config = DigestConfig::default();
    let out = digest(path.to_string_lossy(), &config)
        .await
        .expect("digest sample.pdf");
    assert_eq!(out.kind, MediaKind::Pdf);
    assert_eq!(out.source, SummarySource::Extractive);
    assert!(out.extracted_text.lines().count() > 1, "lines not rebuilt");
    assert_summary_shape(&out.summary.text, &out.summary.highlights, "sample.pdf");
    println!("{}", serde_json::to_string_pretty(&out.summary).unwrap());
}

#[tokio::test]
async fn test_pdf_without_text_layer() {
    let path = e2e_skip_unless_ready!(test_cases_dir().join("scanned.pdf"));
    let err = digest(path.to_string_lossy(), &DigestConfig::default())
        .await
        .unwrap_err();
    assert!(matches!(err, DocSumError::NoTextExtracted));
}

#[tokio::test]
async fn test_corrupt_pdf_is_rejected() {
    if std::env::var("E2E_ENABLED").is_err() {
        println!("SKIP — set E2E_ENABLED=1 to run e2e tests");
        return;
    }
    let err = digest_from_bytes(
        b"%PDF-1.7\nthis is not a pdf body".to_vec(),
        Some("broken.pdf"),
        &DigestConfig::default(),
    )
    .await
    .unwrap_err();
    assert!(
        matches!(
            err,
            DocSumError::CorruptPdf { .. } | DocSumError::PdfiumBindingFailed(_)
        ),
        "unexpected error: {err}"
    );
}

/// Needs the `ocrs` models in the default cache directory.
#[tokio::test]
async fn test_real_ocr_on_scan() {
    let path = e2e_skip_unless_ready!(test_cases_dir().join("scan.png"));
    let ocr = OcrConfig::default();
    if ocr.validate_models().is_err() {
        println!("SKIP — ocrs models not found under the default cache dir");
        return;
    }
    let recorder = Arc::new(Recorder::default());
    let config = DigestConfig::builder()
        .ocr(ocr)
        .progress_callback(recorder.clone())
        .build()
        .expect("config");
    let out = digest(path.to_string_lossy(), &config)
        .await
        .expect("digest scan.png");
    assert_eq!(out.kind, MediaKind::Image);
    let percents = recorder.percents.lock().unwrap();
    assert!(percents.windows(2).all(|w| w[0] <= w[1]), "{percents:?}");
    assert_summary_shape(&out.summary.text, &out.summary.highlights, "scan.png");
}

/// Live provider call. Requires E2E_ENABLED=1 and OPENAI_API_KEY.
#[tokio::test]
async fn test_live_generative_summary() {
    if std::env::var("E2E_ENABLED").is_err() || std::env::var("OPENAI_API_KEY").is_err() {
        println!("SKIP — set E2E_ENABLED=1 and OPENAI_API_KEY to run");
        return;
    }
    let (provider, label) = resolve_llm_provider(Some("openai"), None).expect("provider");
    let config = DigestConfig::builder()
        .generator(Arc::new(LlmGenerator::new(provider, label)))
        .length(LengthMode::Short)
        .build()
        .expect("config");
    let (result, source) = Summarizer::new(&config)
        .summarize_with_source(MEMO, LengthMode::Short)
        .await
        .expect("summary");
    println!("{source:?}: {result:#?}");
    assert_summary_shape(&result.text, &result.highlights, "live");
}

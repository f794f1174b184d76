//! CLI binary for edgequake-docsum.
//!
//! A thin shim over the library crate that maps CLI flags to
//! `DigestConfig`, resolves the language-model provider, and either
//! summarises one document or serves the HTTP API.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use edgequake_docsum::pipeline::generative::{resolve_llm_provider, LlmGenerator};
use edgequake_docsum::{
    digest, serve, DigestConfig, DigestProgressCallback, LengthMode, MediaKind, OcrConfig,
    PipelineState, ProgressCallback, ServerConfig, Summarizer, SummaryGenerator, SummarySource,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress callback: a spinner whose message tracks the pipeline
/// state, with the OCR percentage while an image is being recognised.
struct CliProgressCallback {
    bar: ProgressBar,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new_spinner();
        let style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}  {elapsed:.dim}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);
        bar.set_style(style);
        bar.set_prefix("docsum");
        bar.set_message(PipelineState::Idle.to_string());
        bar.enable_steady_tick(Duration::from_millis(80));
        Arc::new(Self { bar })
    }
}

impl DigestProgressCallback for CliProgressCallback {
    fn on_state_change(&self, state: PipelineState) {
        match state {
            PipelineState::Done => self.bar.finish_and_clear(),
            PipelineState::Error => {
                self.bar.finish_and_clear();
                eprintln!("{} {}", red("✘"), bold(&state.to_string()));
            }
            _ => self.bar.set_message(state.to_string()),
        }
    }

    fn on_ocr_progress(&self, percent: u8) {
        self.bar
            .set_message(format!("Extracting text \u{2014} OCR {percent}%"));
    }

    fn on_extraction_complete(&self, kind: MediaKind, chars: usize) {
        self.bar.println(format!(
            "  {} Extracted {} from {}",
            green("✓"),
            dim(&format!("{chars} chars")),
            kind
        ));
    }

    fn on_fallback(&self, reason: &str) {
        self.bar.println(format!(
            "  {} Generative summary unavailable ({}); using extractive summary",
            cyan("⚠"),
            dim(reason)
        ));
    }

    fn on_summary_complete(&self, source: SummarySource, highlights: usize) {
        let source = match source {
            SummarySource::Generative => "generative",
            SummarySource::Extractive => "extractive",
        };
        self.bar.println(format!(
            "  {} {} summary, {} highlights",
            green("✓"),
            source,
            highlights
        ));
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Summarise a PDF (text layer) with the auto-detected provider
  docsum summarize report.pdf

  # Summarise a scanned image via OCR, longer summary
  docsum summarize --length long scan.png

  # No language model: deterministic extractive summary only
  docsum summarize --no-generative report.pdf

  # Structured JSON output (summary, source, extracted text, timings)
  docsum summarize --json https://example.com/paper.pdf > out.json

  # Run the HTTP API on port 3000
  docsum serve

HTTP API:
  POST /ai/get-review   {"text": "...", "length": "short|medium|long"}
                        → {"text": "...", "highlights": ["..."]}
  GET  /healthz         → {"ok": true}

ENVIRONMENT VARIABLES:
  OPENAI_API_KEY          OpenAI API key
  ANTHROPIC_API_KEY       Anthropic API key
  GEMINI_API_KEY          Google Gemini API key
  EDGEQUAKE_LLM_PROVIDER  Override provider (openai, anthropic, gemini, ollama)
  EDGEQUAKE_MODEL         Override model ID
  DOCSUM_PORT / PORT      HTTP port for `serve` (default 3000)
  DOCSUM_BIND             HTTP bind address for `serve` (default 0.0.0.0)
  PDFIUM_LIB_PATH         Path to an existing libpdfium
  XDG_CACHE_HOME          OCR models are read from $XDG_CACHE_HOME/ocrs

SETUP:
  1. Set an API key (optional):  export OPENAI_API_KEY=sk-...
  2. For images, fetch the ocrs models (text-detection.rten and
     text-recognition.rten) into ~/.cache/ocrs, or pass --ocr-models DIR.
"#;

/// Summarise PDF documents and scanned images.
#[derive(Parser, Debug)]
#[command(
    name = "docsum",
    version,
    about = "Summarise PDF documents and scanned images",
    long_about = "Summarise PDF documents and scanned images into a short summary plus up to five \
highlights. Uses a language model when one is configured and falls back to a deterministic \
extractive summary otherwise.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, global = true, env = "DOCSUM_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, global = true, env = "DOCSUM_QUIET")]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Summarise one local file or HTTP/HTTPS URL.
    Summarize(SummarizeArgs),
    /// Serve the HTTP API.
    Serve(ServeArgs),
}

#[derive(Args, Debug)]
struct SummarizeArgs {
    /// Local PDF/image path or HTTP/HTTPS URL.
    input: String,

    /// Summary length requested from the language model.
    #[arg(long, env = "DOCSUM_LENGTH", value_enum, default_value = "short")]
    length: LengthArg,

    /// Number of highlights the extractive fallback selects (1–5).
    #[arg(long, env = "DOCSUM_MAX_HIGHLIGHTS", default_value_t = 5,
          value_parser = clap::value_parser!(u8).range(1..=5))]
    max_highlights: u8,

    /// PDF user password for encrypted documents.
    #[arg(long, env = "DOCSUM_PASSWORD")]
    password: Option<String>,

    /// Directory holding text-detection.rten and text-recognition.rten.
    #[arg(long, env = "DOCSUM_OCR_MODELS")]
    ocr_models: Option<PathBuf>,

    /// HTTP download timeout in seconds.
    #[arg(long, env = "DOCSUM_DOWNLOAD_TIMEOUT", default_value_t = 120)]
    download_timeout: u64,

    /// Output structured JSON (DigestOutput) instead of text.
    #[arg(long, env = "DOCSUM_JSON")]
    json: bool,

    /// Disable the progress spinner.
    #[arg(long, env = "DOCSUM_NO_PROGRESS")]
    no_progress: bool,

    #[command(flatten)]
    generative: GenerativeArgs,
}

#[derive(Args, Debug)]
struct ServeArgs {
    #[command(flatten)]
    generative: GenerativeArgs,
}

#[derive(Args, Debug)]
struct GenerativeArgs {
    /// LLM provider: openai, anthropic, gemini, ollama, ...
    #[arg(long, env = "EDGEQUAKE_PROVIDER")]
    provider: Option<String>,

    /// LLM model ID (e.g. gpt-4.1-nano, gemini-2.0-flash).
    #[arg(long)]
    model: Option<String>,

    /// Never call a language model; always use the extractive summary.
    #[arg(long, env = "DOCSUM_NO_GENERATIVE")]
    no_generative: bool,

    /// LLM temperature (0.0–2.0).
    #[arg(long, env = "DOCSUM_TEMPERATURE", default_value_t = 0.2)]
    temperature: f32,

    /// Max LLM output tokens.
    #[arg(long, env = "DOCSUM_MAX_TOKENS", default_value_t = 1024)]
    max_tokens: usize,

    /// LLM call timeout in seconds.
    #[arg(long, env = "DOCSUM_API_TIMEOUT", default_value_t = 120)]
    api_timeout: u64,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum LengthArg {
    Short,
    Medium,
    Long,
}

impl From<LengthArg> for LengthMode {
    fn from(v: LengthArg) -> Self {
        match v {
            LengthArg::Short => LengthMode::Short,
            LengthArg::Medium => LengthMode::Medium,
            LengthArg::Long => LengthMode::Long,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // Suppress INFO-level library logs when the spinner is active; it
    // provides all the feedback that matters to the user.
    let show_progress = match &cli.command {
        Command::Summarize(args) => !cli.quiet && !args.no_progress && !args.json,
        Command::Serve(_) => false,
    };
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    match cli.command {
        Command::Summarize(args) => run_summarize(args, show_progress, cli.quiet).await,
        Command::Serve(args) => run_serve(args).await,
    }
}

async fn run_summarize(args: SummarizeArgs, show_progress: bool, quiet: bool) -> Result<()> {
    let progress_cb: Option<ProgressCallback> = if show_progress {
        Some(CliProgressCallback::new() as Arc<dyn DigestProgressCallback>)
    } else {
        None
    };
    let config = build_config(&args, progress_cb)?;

    let output = digest(&args.input, &config)
        .await
        .context("Summarisation failed")?;

    if args.json {
        let json = serde_json::to_string_pretty(&output).context("Failed to serialise output")?;
        println!("{json}");
        return Ok(());
    }

    println!("{}", output.summary.text);
    if !output.summary.highlights.is_empty() {
        println!();
        for highlight in &output.summary.highlights {
            println!("- {highlight}");
        }
    }

    if !quiet {
        eprintln!(
            "{}  {} summary  {} chars extracted  {}ms",
            green("✔"),
            bold(match output.source {
                SummarySource::Generative => "generative",
                SummarySource::Extractive => "extractive",
            }),
            output.stats.extracted_chars,
            output.stats.total_duration_ms,
        );
    }
    Ok(())
}

async fn run_serve(args: ServeArgs) -> Result<()> {
    let server = ServerConfig::from_env();
    let config = DigestConfig::builder()
        .generator_opt(resolve_generator(&args.generative))
        .api_timeout_secs(args.generative.api_timeout)
        .build()
        .context("Invalid configuration")?;

    if !config.generative_enabled() {
        eprintln!(
            "{} No language model configured; /ai/get-review will use extractive summaries",
            cyan("⚠")
        );
    }

    serve(&server, Arc::new(Summarizer::new(&config)))
        .await
        .with_context(|| format!("Server on {} failed", server.addr()))?;
    Ok(())
}

/// Map CLI args to `DigestConfig`.
fn build_config(args: &SummarizeArgs, progress: Option<ProgressCallback>) -> Result<DigestConfig> {
    let mut builder = DigestConfig::builder()
        .length(args.length.into())
        .max_highlights(args.max_highlights as usize)
        .download_timeout_secs(args.download_timeout)
        .api_timeout_secs(args.generative.api_timeout)
        .generator_opt(resolve_generator(&args.generative));

    if let Some(ref dir) = args.ocr_models {
        builder = builder.ocr(OcrConfig::from_dir(dir));
    }
    if let Some(ref pwd) = args.password {
        builder = builder.password(pwd.clone());
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}

/// Resolve the language model, or `None` when disabled or unavailable.
///
/// A missing provider is not an error: the extractive path always works.
fn resolve_generator(args: &GenerativeArgs) -> Option<Arc<dyn SummaryGenerator>> {
    if args.no_generative {
        return None;
    }
    match resolve_llm_provider(args.provider.as_deref(), args.model.as_deref()) {
        Ok((provider, label)) => {
            let generator = LlmGenerator::new(provider, label)
                .with_temperature(args.temperature.clamp(0.0, 2.0))
                .with_max_tokens(args.max_tokens);
            Some(Arc::new(generator))
        }
        Err(e) => {
            warn!("{}", e);
            eprintln!(
                "{} {}",
                cyan("⚠"),
                dim(&format!("Language model unavailable, using extractive summaries: {e}"))
            );
            None
        }
    }
}

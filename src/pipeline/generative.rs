//! Generative summariser client.
//!
//! This module is intentionally thin: it sends one prompt, waits at most
//! `timeout` for the reply, and hands the text to a [`SummaryParser`]. The
//! prompt wording lives in [`crate::prompts`]; the fallback policy lives in
//! [`crate::summarize`].
//!
//! ## No retries
//!
//! A failed call returns immediately with a [`GenerativeError`]. The
//! orchestrator answers with the extractive summary, which is always
//! available, so a retry would only add latency to the worst case.
//!
//! ## Provider resolution
//!
//! The library never looks at API-key variables on its own. Hosts call
//! [`resolve_llm_provider`] (or build an `LLMProvider` themselves) and pass
//! the resulting [`SummaryGenerator`] into the config.

use crate::config::LengthMode;
use crate::error::GenerativeError;
use crate::output::{SummaryResult, MAX_HIGHLIGHTS};
use crate::pipeline::parse::SummaryParser;
use crate::prompts::{summary_prompt, SUMMARY_SYSTEM_PROMPT};
use edgequake_llm::{ChatMessage, CompletionOptions, LLMProvider, ProviderFactory};
use futures::future::BoxFuture;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::debug;

/// Default sampling temperature for summarisation requests.
pub const DEFAULT_TEMPERATURE: f32 = 0.2;

/// Default cap on reply tokens.
pub const DEFAULT_MAX_TOKENS: usize = 1024;

/// A remote text-generation capability: one prompt in, free text out.
pub trait SummaryGenerator: Send + Sync {
    /// Short identifier used in logs, e.g. `"openai/gpt-4.1-nano"`.
    fn name(&self) -> &str;

    fn generate<'a>(&'a self, prompt: &'a str) -> BoxFuture<'a, Result<String, GenerativeError>>;
}

/// [`SummaryGenerator`] over any `edgequake_llm` chat provider.
pub struct LlmGenerator {
    provider: Arc<dyn LLMProvider>,
    label: String,
    temperature: f32,
    max_tokens: usize,
    system_prompt: String,
}

impl LlmGenerator {
    pub fn new(provider: Arc<dyn LLMProvider>, label: impl Into<String>) -> Self {
        Self {
            provider,
            label: label.into(),
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: DEFAULT_MAX_TOKENS,
            system_prompt: SUMMARY_SYSTEM_PROMPT.to_string(),
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: usize) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = prompt.into();
        self
    }

    fn options(&self) -> CompletionOptions {
        CompletionOptions {
            temperature: Some(self.temperature),
            max_tokens: Some(self.max_tokens),
            ..Default::default()
        }
    }
}

impl SummaryGenerator for LlmGenerator {
    fn name(&self) -> &str {
        &self.label
    }

    fn generate<'a>(&'a self, prompt: &'a str) -> BoxFuture<'a, Result<String, GenerativeError>> {
        Box::pin(async move {
            let messages = vec![
                ChatMessage::system(&self.system_prompt),
                ChatMessage::user(prompt),
            ];
            let response = self
                .provider
                .chat(&messages, Some(&self.options()))
                .await
                .map_err(|e| GenerativeError::Provider(e.to_string()))?;
            debug!(
                "{}: {} input tokens, {} output tokens",
                self.label, response.prompt_tokens, response.completion_tokens
            );
            Ok(response.content)
        })
    }
}

/// Sends summarisation requests and parses the replies.
#[derive(Clone)]
pub struct GenerativeClient {
    generator: Arc<dyn SummaryGenerator>,
    parser: Arc<dyn SummaryParser>,
    timeout: Duration,
}

impl GenerativeClient {
    pub fn new(
        generator: Arc<dyn SummaryGenerator>,
        parser: Arc<dyn SummaryParser>,
        timeout: Duration,
    ) -> Self {
        Self {
            generator,
            parser,
            timeout,
        }
    }

    pub fn name(&self) -> &str {
        self.generator.name()
    }

    /// Summarise `text` in the given register.
    ///
    /// Exceeding the timeout is [`GenerativeError::Timeout`]; a blank reply
    /// is [`GenerativeError::EmptyResponse`]. At most five highlights are
    /// returned.
    pub async fn summarize(
        &self,
        text: &str,
        length: LengthMode,
    ) -> Result<SummaryResult, GenerativeError> {
        let start = Instant::now();
        let prompt = summary_prompt(text, length);

        let raw = tokio::time::timeout(self.timeout, self.generator.generate(&prompt))
            .await
            .map_err(|_| GenerativeError::Timeout {
                secs: self.timeout.as_secs(),
            })??;

        if raw.trim().is_empty() {
            return Err(GenerativeError::EmptyResponse);
        }

        let mut result = self.parser.parse(&raw)?;
        result.highlights.truncate(MAX_HIGHLIGHTS);
        debug!(
            "{} replied in {:?} ({} highlights)",
            self.generator.name(),
            start.elapsed(),
            result.highlights.len()
        );
        Ok(result)
    }
}

/// Default model per provider when only the provider is named.
pub fn default_model_for(provider: &str) -> &'static str {
    match provider {
        "openai" => "gpt-4.1-nano",
        "anthropic" => "claude-3-5-haiku-latest",
        "gemini" => "gemini-2.0-flash",
        "ollama" => "llama3.2",
        "mistral" => "mistral-small-latest",
        _ => "gpt-4.1-nano",
    }
}

/// Resolve an LLM provider, from most-specific to least-specific:
///
/// 1. **Named provider** (`provider`, with `model` or the provider default).
/// 2. **Environment pair** (`EDGEQUAKE_LLM_PROVIDER` + `EDGEQUAKE_MODEL`).
/// 3. **Full auto-detection** (`ProviderFactory::from_env`), which scans the
///    known API-key variables.
///
/// Returns the provider and a `provider/model` label for logs.
pub fn resolve_llm_provider(
    provider: Option<&str>,
    model: Option<&str>,
) -> Result<(Arc<dyn LLMProvider>, String), GenerativeError> {
    let create = |name: &str, model: &str| {
        ProviderFactory::create_llm_provider(name, model)
            .map(|p| (p, format!("{}/{}", name, model)))
            .map_err(|e| GenerativeError::Provider(format!("{}: {}", name, e)))
    };

    if let Some(name) = provider.filter(|n| !n.is_empty()) {
        return create(name, model.unwrap_or_else(|| default_model_for(name)));
    }

    if let (Ok(prov), Ok(env_model)) = (
        std::env::var("EDGEQUAKE_LLM_PROVIDER"),
        std::env::var("EDGEQUAKE_MODEL"),
    ) {
        if !prov.is_empty() && !env_model.is_empty() {
            return create(&prov, &env_model);
        }
    }

    let (llm, _embedding) = ProviderFactory::from_env().map_err(|e| {
        GenerativeError::Provider(format!(
            "no LLM provider could be auto-detected from environment: {}",
            e
        ))
    })?;
    Ok((llm, "auto".to_string()))
}

//! Structure inference: prompt the LLM and parse its JSON answer.
//!
//! The model sits behind [`CompletionBackend`] so the pipeline can be driven
//! by a real provider ([`LlmBackend`], built on `edgequake-llm`) or by a
//! canned backend in tests. All prompt text lives in [`crate::prompts`].
//!
//! ## Retry Strategy
//!
//! The default is fail-fast (`max_retries = 0`): a failed completion fails
//! the request and the client resubmits. When retries are configured the
//! backoff is exponential (`retry_backoff_ms * 2^(attempt-1)`). Only the
//! completion call is retried; an answer that is not valid structure JSON
//! fails immediately, since asking again costs as much as a fresh request.

use crate::config::FormatConfig;
use crate::error::AutodoxError;
use crate::model::StructuredDocument;
use crate::pipeline::postprocess::clean_response;
use crate::prompts::{build_prompt, STRUCTURE_PROMPT};
use edgequake_llm::{ChatMessage, CompletionOptions, LLMProvider, ProviderFactory};
use futures::future::BoxFuture;
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use tokio::time::{sleep, timeout, Duration};
use tracing::{debug, info, warn};

/// Text and token usage of one completion.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Completion {
    pub content: String,
    pub input_tokens: usize,
    pub output_tokens: usize,
}

/// A failed completion call, as reported by the backend.
#[derive(Debug, Clone, Error)]
#[error("{0}")]
pub struct BackendError(pub String);

/// Anything that can turn a prompt into a completion.
pub trait CompletionBackend: Send + Sync {
    /// Human-readable backend label for logs and `/health`.
    fn name(&self) -> &str;

    /// Send one prompt and return the model's answer.
    fn complete<'a>(&'a self, prompt: &'a str) -> BoxFuture<'a, Result<Completion, BackendError>>;
}

// ── edgequake-llm backend ────────────────────────────────────────────────

/// [`CompletionBackend`] over any `edgequake-llm` provider.
pub struct LlmBackend {
    provider: Arc<dyn LLMProvider>,
    label: String,
    temperature: f32,
    max_tokens: usize,
}

impl LlmBackend {
    /// Wrap an already-constructed provider.
    pub fn new(provider: Arc<dyn LLMProvider>, label: impl Into<String>, config: &FormatConfig) -> Self {
        Self {
            provider,
            label: label.into(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
        }
    }

    /// Create the provider named in the config.
    ///
    /// The provider factory reads the API key from the environment
    /// (`GEMINI_API_KEY` for the default Gemini provider).
    pub fn from_config(config: &FormatConfig) -> Result<Self, AutodoxError> {
        let provider_name = config.effective_provider();
        let model = config.effective_model();
        let provider = ProviderFactory::create_llm_provider(provider_name, model).map_err(|e| {
            AutodoxError::ProviderNotConfigured {
                provider: provider_name.to_string(),
                hint: format!(
                    "{}\nSet the provider's API key (GEMINI_API_KEY for gemini) and try again.",
                    e
                ),
            }
        })?;
        Ok(Self::new(
            provider,
            format!("{}/{}", provider_name, model),
            config,
        ))
    }

    fn options(&self) -> CompletionOptions {
        CompletionOptions {
            temperature: Some(self.temperature),
            max_tokens: Some(self.max_tokens),
            ..Default::default()
        }
    }
}

impl CompletionBackend for LlmBackend {
    fn name(&self) -> &str {
        &self.label
    }

    fn complete<'a>(&'a self, prompt: &'a str) -> BoxFuture<'a, Result<Completion, BackendError>> {
        Box::pin(async move {
            let messages = vec![ChatMessage::user(prompt)];
            let options = self.options();
            let response = self
                .provider
                .chat(&messages, Some(&options))
                .await
                .map_err(|e| BackendError(e.to_string()))?;
            Ok(Completion {
                content: response.content,
                input_tokens: response.prompt_tokens,
                output_tokens: response.completion_tokens,
            })
        })
    }
}

/// Resolve the backend: a pre-built one from the config, else the named provider.
pub fn resolve_backend(config: &FormatConfig) -> Result<Arc<dyn CompletionBackend>, AutodoxError> {
    if let Some(ref backend) = config.backend {
        return Ok(Arc::clone(backend));
    }
    let backend = LlmBackend::from_config(config)?;
    info!("Using LLM backend {}", backend.name());
    Ok(Arc::new(backend))
}

// ── Inference ────────────────────────────────────────────────────────────

/// A validated structure plus the cost of obtaining it.
#[derive(Debug, Clone)]
pub struct Inference {
    pub structure: StructuredDocument,
    pub input_tokens: usize,
    pub output_tokens: usize,
    pub attempts: u32,
    pub truncated: bool,
}

/// Prompt the model with the document text and parse its answer.
pub async fn infer_structure(
    backend: &dyn CompletionBackend,
    document_text: &str,
    config: &FormatConfig,
) -> Result<Inference, AutodoxError> {
    let (text, truncated) = truncate_chars(document_text, config.max_prompt_chars);
    if truncated {
        warn!(
            "Document text truncated to {} chars before prompting",
            config.max_prompt_chars
        );
    }

    let instruction = config
        .system_prompt
        .as_deref()
        .unwrap_or(STRUCTURE_PROMPT);
    let prompt = build_prompt(instruction, text);

    let (completion, attempts) = complete_with_retry(backend, &prompt, config).await?;
    let structure = parse_structure(&completion.content)?;

    Ok(Inference {
        structure,
        input_tokens: completion.input_tokens,
        output_tokens: completion.output_tokens,
        attempts,
        truncated,
    })
}

/// Clean, parse and validate a raw model answer.
pub fn parse_structure(raw: &str) -> Result<StructuredDocument, AutodoxError> {
    let cleaned = clean_response(raw);
    let structure: StructuredDocument =
        serde_json::from_str(&cleaned).map_err(|e| AutodoxError::InvalidJson {
            detail: format!("{} (response starts with {:?})", e, preview(&cleaned)),
        })?;
    structure.validate()?;
    Ok(structure)
}

/// Call the backend, retrying failed calls when configured.
///
/// Returns the completion and the number of attempts it took.
async fn complete_with_retry(
    backend: &dyn CompletionBackend,
    prompt: &str,
    config: &FormatConfig,
) -> Result<(Completion, u32), AutodoxError> {
    let start = Instant::now();
    let mut last_err = AutodoxError::LlmApiError {
        attempts: 0,
        message: "no attempt made".into(),
    };

    for attempt in 0..=config.max_retries {
        if attempt > 0 {
            let backoff = config.retry_backoff_ms * 2u64.pow(attempt - 1);
            warn!(
                "Completion retry {}/{} after {}ms",
                attempt, config.max_retries, backoff
            );
            sleep(Duration::from_millis(backoff)).await;
        }

        let call = backend.complete(prompt);
        let outcome = match config.api_timeout_secs {
            Some(secs) => match timeout(Duration::from_secs(secs), call).await {
                Ok(result) => result.map_err(|e| AutodoxError::LlmApiError {
                    attempts: attempt + 1,
                    message: e.0,
                }),
                Err(_) => Err(AutodoxError::ApiTimeout { secs }),
            },
            None => call.await.map_err(|e| AutodoxError::LlmApiError {
                attempts: attempt + 1,
                message: e.0,
            }),
        };

        match outcome {
            Ok(completion) => {
                debug!(
                    "{}: {} input tokens, {} output tokens, {:?}",
                    backend.name(),
                    completion.input_tokens,
                    completion.output_tokens,
                    start.elapsed()
                );
                return Ok((completion, attempt + 1));
            }
            Err(e) => {
                warn!("Completion attempt {} failed: {}", attempt + 1, e);
                last_err = e;
            }
        }
    }

    Err(last_err)
}

/// Cut `text` to at most `max_chars` characters on a char boundary.
pub fn truncate_chars(text: &str, max_chars: usize) -> (&str, bool) {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => (&text[..byte_idx], true),
        None => (text, false),
    }
}

fn preview(s: &str) -> String {
    s.chars().take(40).collect()
}

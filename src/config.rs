//! Configuration types for document reformatting.
//!
//! All pipeline behaviour is controlled through [`FormatConfig`], built via
//! its [`FormatConfigBuilder`]. The server and the CLI build exactly one
//! config at startup and share it read-only across requests.
//!
//! [`ServerConfig`] holds the few knobs that only matter to `autodox serve`.

use crate::error::AutodoxError;
use crate::pipeline::infer::CompletionBackend;
use crate::progress::ProgressCallback;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Provider used when none is configured.
pub const DEFAULT_PROVIDER: &str = "gemini";

/// Model used when none is configured.
pub const DEFAULT_MODEL: &str = "gemini-1.5-flash";

/// Configuration for one reformatting run.
///
/// Built via [`FormatConfig::builder()`] or using [`FormatConfig::default()`].
///
/// # Example
/// ```rust
/// use autodox::{FormatConfig, SectionLabels};
///
/// let config = FormatConfig::builder()
///     .model("gemini-1.5-flash")
///     .labels(SectionLabels::english())
///     .max_retries(2)
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct FormatConfig {
    /// LLM model identifier. If None, uses [`DEFAULT_MODEL`].
    pub model: Option<String>,

    /// LLM provider name (e.g. "gemini", "openai"). If None, uses [`DEFAULT_PROVIDER`].
    pub provider_name: Option<String>,

    /// Pre-constructed completion backend. Takes precedence over `provider_name`.
    pub backend: Option<Arc<dyn CompletionBackend>>,

    /// Sampling temperature (0.0–2.0). Default: 0.1.
    pub temperature: f32,

    /// Maximum tokens the model may generate. Default: 8192.
    pub max_tokens: usize,

    /// Retry attempts on a failed completion call. Default: 0.
    ///
    /// Zero keeps the request fail-fast: the client resubmits. Parse errors
    /// are never retried regardless of this value.
    pub max_retries: u32,

    /// Initial retry delay in milliseconds (exponential backoff). Default: 500.
    pub retry_backoff_ms: u64,

    /// Per-call timeout for the completion request in seconds. Default: None.
    pub api_timeout_secs: Option<u64>,

    /// Custom instruction placed before the document text. If None, uses
    /// [`crate::prompts::STRUCTURE_PROMPT`].
    pub system_prompt: Option<String>,

    /// Extracted text beyond this many characters is cut before prompting.
    /// Default: 400 000.
    pub max_prompt_chars: usize,

    /// Headings and title used in the generated document.
    pub labels: SectionLabels,

    /// Optional stage progress callback.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for FormatConfig {
    fn default() -> Self {
        Self {
            model: None,
            provider_name: None,
            backend: None,
            temperature: 0.1,
            max_tokens: 8192,
            max_retries: 0,
            retry_backoff_ms: 500,
            api_timeout_secs: None,
            system_prompt: None,
            max_prompt_chars: 400_000,
            labels: SectionLabels::default(),
            progress_callback: None,
        }
    }
}

impl fmt::Debug for FormatConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FormatConfig")
            .field("model", &self.model)
            .field("provider_name", &self.provider_name)
            .field("backend", &self.backend.as_ref().map(|b| b.name().to_string()))
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("max_retries", &self.max_retries)
            .field("retry_backoff_ms", &self.retry_backoff_ms)
            .field("api_timeout_secs", &self.api_timeout_secs)
            .field("max_prompt_chars", &self.max_prompt_chars)
            .field("labels", &self.labels)
            .finish()
    }
}

impl FormatConfig {
    /// Create a new builder for `FormatConfig`.
    pub fn builder() -> FormatConfigBuilder {
        FormatConfigBuilder {
            config: Self::default(),
        }
    }

    /// The provider name that will be used.
    pub fn effective_provider(&self) -> &str {
        self.provider_name.as_deref().unwrap_or(DEFAULT_PROVIDER)
    }

    /// The model name that will be used.
    pub fn effective_model(&self) -> &str {
        self.model.as_deref().unwrap_or(DEFAULT_MODEL)
    }
}

/// Builder for [`FormatConfig`].
#[derive(Debug)]
pub struct FormatConfigBuilder {
    config: FormatConfig,
}

impl FormatConfigBuilder {
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = Some(model.into());
        self
    }

    pub fn provider_name(mut self, name: impl Into<String>) -> Self {
        self.config.provider_name = Some(name.into());
        self
    }

    pub fn backend(mut self, backend: Arc<dyn CompletionBackend>) -> Self {
        self.config.backend = Some(backend);
        self
    }

    pub fn temperature(mut self, t: f32) -> Self {
        self.config.temperature = t.clamp(0.0, 2.0);
        self
    }

    pub fn max_tokens(mut self, n: usize) -> Self {
        self.config.max_tokens = n;
        self
    }

    pub fn max_retries(mut self, n: u32) -> Self {
        self.config.max_retries = n;
        self
    }

    pub fn retry_backoff_ms(mut self, ms: u64) -> Self {
        self.config.retry_backoff_ms = ms;
        self
    }

    pub fn api_timeout_secs(mut self, secs: u64) -> Self {
        self.config.api_timeout_secs = Some(secs);
        self
    }

    pub fn system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.config.system_prompt = Some(prompt.into());
        self
    }

    pub fn max_prompt_chars(mut self, n: usize) -> Self {
        self.config.max_prompt_chars = n;
        self
    }

    pub fn labels(mut self, labels: SectionLabels) -> Self {
        self.config.labels = labels;
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<FormatConfig, AutodoxError> {
        let c = &self.config;
        if c.max_tokens == 0 {
            return Err(AutodoxError::InvalidConfig(
                "max_tokens must be ≥ 1".into(),
            ));
        }
        if c.max_prompt_chars == 0 {
            return Err(AutodoxError::InvalidConfig(
                "max_prompt_chars must be ≥ 1".into(),
            ));
        }
        if c.api_timeout_secs == Some(0) {
            return Err(AutodoxError::InvalidConfig(
                "api_timeout_secs must be ≥ 1 when set".into(),
            ));
        }
        if c.labels.title.trim().is_empty() {
            return Err(AutodoxError::InvalidConfig(
                "document title label must not be empty".into(),
            ));
        }
        Ok(self.config)
    }
}

// ── Labels ───────────────────────────────────────────────────────────────

/// Visible text of the generated document's title and list headings.
///
/// The default is the Indonesian academic convention (Daftar Isi, …).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionLabels {
    pub title: String,
    pub table_of_contents: String,
    pub figures: String,
    pub tables: String,
    pub appendices: String,
    pub bibliography: String,
}

impl Default for SectionLabels {
    fn default() -> Self {
        Self::indonesian()
    }
}

impl SectionLabels {
    pub fn indonesian() -> Self {
        Self {
            title: "AutoDOCx v2 - Formatted Document".into(),
            table_of_contents: "Daftar Isi".into(),
            figures: "Daftar Gambar".into(),
            tables: "Daftar Tabel".into(),
            appendices: "Daftar Lampiran".into(),
            bibliography: "Daftar Pustaka".into(),
        }
    }

    pub fn english() -> Self {
        Self {
            title: "AutoDOCx v2 - Formatted Document".into(),
            table_of_contents: "Table of Contents".into(),
            figures: "List of Figures".into(),
            tables: "List of Tables".into(),
            appendices: "List of Appendices".into(),
            bibliography: "Bibliography".into(),
        }
    }
}

// ── Server ───────────────────────────────────────────────────────────────

/// Settings for the HTTP service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Socket address to listen on. Default: `0.0.0.0:8787`.
    pub bind: String,

    /// Largest accepted request body in bytes. Default: 20 MiB.
    pub max_upload_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0:8787".into(),
            max_upload_bytes: 20 * 1024 * 1024,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_fail_fast() {
        let c = FormatConfig::default();
        assert_eq!(c.max_retries, 0);
        assert_eq!(c.api_timeout_secs, None);
        assert_eq!(c.effective_provider(), "gemini");
        assert_eq!(c.effective_model(), "gemini-1.5-flash");
    }

    #[test]
    fn builder_sets_fields() {
        let c = FormatConfig::builder()
            .provider_name("openai")
            .model("gpt-4.1-mini")
            .temperature(5.0)
            .max_retries(2)
            .api_timeout_secs(30)
            .build()
            .unwrap();
        assert_eq!(c.effective_provider(), "openai");
        assert_eq!(c.effective_model(), "gpt-4.1-mini");
        assert_eq!(c.temperature, 2.0);
        assert_eq!(c.max_retries, 2);
        assert_eq!(c.api_timeout_secs, Some(30));
    }

    #[test]
    fn zero_timeout_rejected() {
        let err = FormatConfig::builder().api_timeout_secs(0).build().unwrap_err();
        assert!(matches!(err, AutodoxError::InvalidConfig(_)));
    }

    #[test]
    fn zero_max_tokens_rejected() {
        assert!(FormatConfig::builder().max_tokens(0).build().is_err());
    }

    #[test]
    fn default_labels_are_indonesian() {
        let l = SectionLabels::default();
        assert_eq!(l.table_of_contents, "Daftar Isi");
        assert_eq!(l.bibliography, "Daftar Pustaka");
        assert_eq!(SectionLabels::english().figures, "List of Figures");
    }

    #[test]
    fn server_defaults() {
        let s = ServerConfig::default();
        assert_eq!(s.bind, "0.0.0.0:8787");
        assert_eq!(s.max_upload_bytes, 20 * 1024 * 1024);
    }
}

//! Configuration for a reconciliation run.
//!
//! All behaviour is controlled through [`ReconcileConfig`], built via its
//! [`ReconcileConfigBuilder`]. Keeping every knob in one struct makes it
//! trivial to share configs across tasks, serialise the scalar fields for
//! logging, and diff two runs to understand why their outputs differ.
//!
//! # Design choice: builder over constructor
//! A dozen-field constructor is unreadable and breaks on every new field.
//! The builder lets callers set only what they care about and rely on
//! well-documented defaults for the rest.

use crate::client::CompletionClient;
use crate::error::ReconError;
use crate::progress::ProgressCallback;
use std::fmt;
use std::sync::Arc;

/// Configuration for reconciling a filing against a workbook.
///
/// Built via [`ReconcileConfig::builder()`] or using
/// [`ReconcileConfig::default()`].
///
/// # Example
/// ```rust
/// use finrecon::ReconcileConfig;
///
/// let config = ReconcileConfig::builder()
///     .model("gpt-4.1-mini")
///     .max_retries(2)
///     .api_timeout_secs(180)
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct ReconcileConfig {
    /// LLM model identifier, e.g. "gpt-4.1-mini". If None, uses the
    /// provider default.
    pub model: Option<String>,

    /// LLM provider name (e.g. "openai", "anthropic", "ollama").
    /// If None along with `client`, the provider is auto-detected from the
    /// environment.
    pub provider_name: Option<String>,

    /// Pre-constructed completion client. Takes precedence over
    /// `provider_name`. The injection point for tests and for callers that
    /// need custom middleware (caching, rate-limiting).
    pub client: Option<Arc<dyn CompletionClient>>,

    /// Sampling temperature for the completion. Default: 0.2.
    ///
    /// Low temperature keeps the model faithful to the two source texts —
    /// exactly what a data-alignment task wants. Higher values introduce
    /// creativity that corrupts numeric cells.
    pub temperature: f32,

    /// Maximum tokens the model may generate per statement. Default: 8192.
    ///
    /// A reconciled statement with 40 categories and 5 fiscal years runs to
    /// roughly 2 000 output tokens; 8 192 leaves headroom for verbose
    /// models without letting a runaway reply grow unbounded.
    pub max_tokens: usize,

    /// Maximum retry attempts on a transient completion failure. Default: 3.
    ///
    /// Most 5xx and connection errors are transient. Permanent errors (bad
    /// credential, empty reply, timeout) are not retried — they fail the
    /// statement immediately.
    pub max_retries: u32,

    /// Initial retry delay in milliseconds (exponential backoff).
    /// Default: 500.
    ///
    /// Doubles after each attempt: 500 ms → 1 s → 2 s.
    pub retry_backoff_ms: u64,

    /// Per-completion-call timeout in seconds. Default: 120.
    ///
    /// The completion call is the only suspension point with meaningful
    /// wall-clock time; the ceiling is enforced with `tokio::time::timeout`
    /// rather than trusting the HTTP client's defaults.
    pub api_timeout_secs: u64,

    /// Download timeout for URL-supplied filings in seconds. Default: 120.
    pub download_timeout_secs: u64,

    /// Custom system prompt. If None, uses the built-in default.
    pub system_prompt: Option<String>,

    /// Custom user-prompt template. Must contain both the `{pdf_data}` and
    /// `{excel_data}` markers. If None, uses the built-in default.
    pub user_template: Option<String>,

    /// Optional progress callback receiving per-statement events.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for ReconcileConfig {
    fn default() -> Self {
        Self {
            model: None,
            provider_name: None,
            client: None,
            temperature: 0.2,
            max_tokens: 8192,
            max_retries: 3,
            retry_backoff_ms: 500,
            api_timeout_secs: 120,
            download_timeout_secs: 120,
            system_prompt: None,
            user_template: None,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for ReconcileConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReconcileConfig")
            .field("model", &self.model)
            .field("provider_name", &self.provider_name)
            .field("client", &self.client.as_ref().map(|_| "<dyn CompletionClient>"))
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("max_retries", &self.max_retries)
            .field("retry_backoff_ms", &self.retry_backoff_ms)
            .field("api_timeout_secs", &self.api_timeout_secs)
            .field("download_timeout_secs", &self.download_timeout_secs)
            .field("system_prompt", &self.system_prompt.as_ref().map(|_| "<custom>"))
            .field("user_template", &self.user_template.as_ref().map(|_| "<custom>"))
            .finish()
    }
}

impl ReconcileConfig {
    /// Create a new builder for `ReconcileConfig`.
    pub fn builder() -> ReconcileConfigBuilder {
        ReconcileConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`ReconcileConfig`].
#[derive(Debug)]
pub struct ReconcileConfigBuilder {
    config: ReconcileConfig,
}

impl ReconcileConfigBuilder {
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = Some(model.into());
        self
    }

    pub fn provider_name(mut self, name: impl Into<String>) -> Self {
        self.config.provider_name = Some(name.into());
        self
    }

    pub fn client(mut self, client: Arc<dyn CompletionClient>) -> Self {
        self.config.client = Some(client);
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
        self.config.api_timeout_secs = secs;
        self
    }

    pub fn download_timeout_secs(mut self, secs: u64) -> Self {
        self.config.download_timeout_secs = secs;
        self
    }

    pub fn system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.config.system_prompt = Some(prompt.into());
        self
    }

    pub fn user_template(mut self, template: impl Into<String>) -> Self {
        self.config.user_template = Some(template.into());
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ReconcileConfig, ReconError> {
        let c = &self.config;
        if c.max_tokens == 0 {
            return Err(ReconError::InvalidConfig(
                "max_tokens must be ≥ 1".into(),
            ));
        }
        if c.api_timeout_secs == 0 {
            return Err(ReconError::InvalidConfig(
                "api_timeout_secs must be ≥ 1".into(),
            ));
        }
        if let Some(ref template) = c.user_template {
            for marker in [crate::prompts::PDF_MARKER, crate::prompts::EXCEL_MARKER] {
                if !template.contains(marker) {
                    return Err(ReconError::InvalidConfig(format!(
                        "user_template must contain the '{marker}' marker"
                    )));
                }
            }
        }
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sane() {
        let c = ReconcileConfig::default();
        assert_eq!(c.max_retries, 3);
        assert_eq!(c.api_timeout_secs, 120);
        assert!(c.model.is_none());
        assert!(c.client.is_none());
    }

    #[test]
    fn temperature_is_clamped() {
        let c = ReconcileConfig::builder().temperature(9.0).build().unwrap();
        assert_eq!(c.temperature, 2.0);
    }

    #[test]
    fn zero_max_tokens_is_rejected() {
        let err = ReconcileConfig::builder().max_tokens(0).build();
        assert!(matches!(err, Err(ReconError::InvalidConfig(_))));
    }

    #[test]
    fn custom_template_must_carry_both_markers() {
        let err = ReconcileConfig::builder()
            .user_template("only {pdf_data} here")
            .build();
        assert!(matches!(err, Err(ReconError::InvalidConfig(_))));

        let ok = ReconcileConfig::builder()
            .user_template("{pdf_data} and {excel_data}")
            .build();
        assert!(ok.is_ok());
    }
}

//! The completion-client seam between the pipeline and LLM providers.
//!
//! The pipeline talks to [`CompletionClient`], a small text-in/text-out
//! trait, rather than to a concrete provider SDK. Production code wraps an
//! `edgequake_llm` provider in [`ProviderClient`]; tests inject canned
//! clients through [`crate::config::ReconcileConfigBuilder::client`].

use crate::config::ReconcileConfig;
use crate::error::{ReconError, StatementError};
use async_trait::async_trait;
use edgequake_llm::{ChatMessage, CompletionOptions, LLMProvider, ProviderFactory};
use std::sync::Arc;
use tracing::debug;

/// One successful completion: the reply text plus token accounting.
#[derive(Debug, Clone)]
pub struct CompletionReply {
    pub content: String,
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
}

/// A text completion backend.
///
/// One call sends a system prompt and a user prompt and returns the model's
/// reply. Implementations map their transport failures onto
/// [`StatementError`] so the retry layer can distinguish transient provider
/// trouble from permanent rejections.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    async fn complete(&self, system: &str, user: &str) -> Result<CompletionReply, StatementError>;
}

/// [`CompletionClient`] backed by an `edgequake_llm` provider.
pub struct ProviderClient {
    provider: Arc<dyn LLMProvider>,
    temperature: f32,
    max_tokens: usize,
}

impl ProviderClient {
    pub fn new(provider: Arc<dyn LLMProvider>, temperature: f32, max_tokens: usize) -> Self {
        Self {
            provider,
            temperature,
            max_tokens,
        }
    }
}

#[async_trait]
impl CompletionClient for ProviderClient {
    async fn complete(&self, system: &str, user: &str) -> Result<CompletionReply, StatementError> {
        let messages = vec![ChatMessage::system(system), ChatMessage::user(user)];
        let options = CompletionOptions {
            temperature: Some(self.temperature),
            max_tokens: Some(self.max_tokens),
            ..Default::default()
        };

        let response = self
            .provider
            .chat(&messages, Some(&options))
            .await
            .map_err(|e| classify_provider_error(&format!("{e}")))?;

        debug!(
            "completion: {} prompt tokens, {} completion tokens",
            response.prompt_tokens, response.completion_tokens
        );

        if response.content.trim().is_empty() {
            return Err(StatementError::EmptyResponse);
        }

        Ok(CompletionReply {
            content: response.content,
            prompt_tokens: response.prompt_tokens as u64,
            completion_tokens: response.completion_tokens as u64,
        })
    }
}

/// Map a provider error message onto the statement-error taxonomy.
///
/// Provider SDKs expose errors as strings, so classification is by
/// inspection. Unknown errors default to `ServiceUnavailable` so the retry
/// layer gets a chance at them; a genuine credential problem keeps
/// reappearing and fails every attempt the same way.
fn classify_provider_error(msg: &str) -> StatementError {
    let lower = msg.to_lowercase();
    if lower.contains("401")
        || lower.contains("403")
        || lower.contains("unauthorized")
        || lower.contains("forbidden")
        || lower.contains("invalid api key")
        || lower.contains("authentication")
    {
        StatementError::Authentication {
            detail: msg.to_string(),
        }
    } else {
        StatementError::ServiceUnavailable {
            detail: msg.to_string(),
        }
    }
}

fn create_provider(
    provider_name: &str,
    model: &str,
) -> Result<Arc<dyn LLMProvider>, ReconError> {
    ProviderFactory::create_llm_provider(provider_name, model).map_err(|e| {
        ReconError::ClientNotConfigured {
            provider: provider_name.to_string(),
            hint: format!("{e}"),
        }
    })
}

/// Resolve the completion client, from most-specific to least-specific.
///
/// The four-level fallback chain lets library users and CLI users each set
/// exactly as much or as little as they need:
///
/// 1. **Injected client** (`config.client`) — the caller constructed the
///    client entirely; we use it as-is. The seam for tests and custom
///    middleware.
///
/// 2. **Named provider + model** (`config.provider_name`) — the caller named
///    a provider (e.g. `"openai"`) and optional model. The factory reads the
///    corresponding API key (`OPENAI_API_KEY`, etc.) from the environment.
///
/// 3. **`FINRECON_LLM_PROVIDER` + `FINRECON_MODEL`** — both set and
///    non-empty selects that pair.
///
/// 4. **Environment auto-detect** — prefer OpenAI when `OPENAI_API_KEY` is
///    present (users with several provider keys get a stable default),
///    otherwise whatever the factory detects.
pub fn resolve_client(config: &ReconcileConfig) -> Result<Arc<dyn CompletionClient>, ReconError> {
    if let Some(ref client) = config.client {
        return Ok(Arc::clone(client));
    }

    let wrap = |provider: Arc<dyn LLMProvider>| -> Arc<dyn CompletionClient> {
        Arc::new(ProviderClient::new(
            provider,
            config.temperature,
            config.max_tokens,
        ))
    };

    if let Some(ref name) = config.provider_name {
        let model = config.model.as_deref().unwrap_or("gpt-4.1-mini");
        return Ok(wrap(create_provider(name, model)?));
    }

    if let (Ok(prov), Ok(model)) = (
        std::env::var("FINRECON_LLM_PROVIDER"),
        std::env::var("FINRECON_MODEL"),
    ) {
        if !prov.is_empty() && !model.is_empty() {
            return Ok(wrap(create_provider(&prov, &model)?));
        }
    }

    if let Ok(openai_key) = std::env::var("OPENAI_API_KEY") {
        if !openai_key.is_empty() {
            let model = config.model.as_deref().unwrap_or("gpt-4.1-mini");
            return Ok(wrap(create_provider("openai", model)?));
        }
    }

    let (provider, _embedding) =
        ProviderFactory::from_env().map_err(|e| ReconError::ClientNotConfigured {
            provider: "auto".to_string(),
            hint: format!(
                "No LLM provider could be auto-detected from environment.\n\
                Set OPENAI_API_KEY, ANTHROPIC_API_KEY, or configure a provider.\n\
                Error: {}",
                e
            ),
        })?;

    Ok(wrap(provider))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_errors_are_classified_as_permanent() {
        let e = classify_provider_error("HTTP 401 Unauthorized");
        assert!(matches!(e, StatementError::Authentication { .. }));
        assert!(!e.is_transient());

        let e = classify_provider_error("invalid API key provided");
        assert!(matches!(e, StatementError::Authentication { .. }));
    }

    #[test]
    fn other_errors_default_to_transient() {
        for msg in ["HTTP 429 Too Many Requests", "503 upstream", "connection reset"] {
            let e = classify_provider_error(msg);
            assert!(matches!(e, StatementError::ServiceUnavailable { .. }), "{msg}");
            assert!(e.is_transient());
        }
    }

    #[tokio::test]
    async fn injected_client_wins_resolution() {
        struct Fixed;

        #[async_trait]
        impl CompletionClient for Fixed {
            async fn complete(
                &self,
                _system: &str,
                _user: &str,
            ) -> Result<CompletionReply, StatementError> {
                Ok(CompletionReply {
                    content: "reply".into(),
                    prompt_tokens: 1,
                    completion_tokens: 1,
                })
            }
        }

        let config = ReconcileConfig::builder()
            .client(Arc::new(Fixed))
            .build()
            .unwrap();
        let client = resolve_client(&config).unwrap();
        let reply = client.complete("s", "u").await.unwrap();
        assert_eq!(reply.content, "reply");
    }
}

//! Completion call with timeout and retry.
//!
//! This module is intentionally thin — all prompt engineering lives in
//! [`crate::prompts`] so it can be changed without touching retry or
//! error-handling logic here.
//!
//! ## Retry Strategy
//!
//! HTTP 429 / 5xx errors from LLM APIs are transient and frequent.
//! Exponential backoff (`retry_backoff_ms * 2^(attempt-1)`) avoids
//! thundering-herd: with 500 ms base and 3 retries the wait sequence is
//! 500 ms → 1 s → 2 s, totalling < 4 s of back-off per statement. Only
//! transient errors are retried; an authentication failure or a timeout
//! fails the statement on the first attempt.

use crate::client::{CompletionClient, CompletionReply};
use crate::config::ReconcileConfig;
use crate::error::StatementError;
use crate::types::StatementKind;
use std::sync::Arc;
use tokio::time::{sleep, timeout, Duration};
use tracing::{debug, warn};

/// Ask the model to reconcile one statement, retrying transient failures.
///
/// Returns the reply together with the number of retries that were needed.
pub async fn request_reconciliation(
    client: &Arc<dyn CompletionClient>,
    kind: StatementKind,
    system: &str,
    user: &str,
    config: &ReconcileConfig,
) -> Result<(CompletionReply, u8), StatementError> {
    let ceiling = Duration::from_secs(config.api_timeout_secs);
    let mut last_err = StatementError::EmptyResponse;

    for attempt in 0..=config.max_retries {
        if attempt > 0 {
            let backoff = config.retry_backoff_ms * 2u64.pow(attempt - 1);
            warn!(
                "{}: retry {}/{} after {}ms",
                kind, attempt, config.max_retries, backoff
            );
            sleep(Duration::from_millis(backoff)).await;
        }

        match timeout(ceiling, client.complete(system, user)).await {
            Err(_elapsed) => {
                // A hung provider will hang again; don't burn retries on it.
                return Err(StatementError::Timeout {
                    secs: config.api_timeout_secs,
                });
            }
            Ok(Ok(reply)) => {
                debug!(
                    "{}: {} prompt tokens, {} completion tokens, attempt {}",
                    kind, reply.prompt_tokens, reply.completion_tokens, attempt
                );
                return Ok((reply, attempt as u8));
            }
            Ok(Err(e)) => {
                warn!("{}: attempt {} failed — {}", kind, attempt + 1, e);
                if !e.is_transient() {
                    return Err(e);
                }
                last_err = e;
            }
        }
    }

    Err(last_err)
}

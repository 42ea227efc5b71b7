//! Top-level orchestration: run the reconciliation pipeline end to end.
//!
//! [`reconcile`] drives every stage for each statement kind in turn and
//! returns one [`StatementOutcome`] per kind; [`reconcile_to_file`]
//! additionally writes the output workbook. Statement kinds are processed
//! sequentially — a run makes at most three completion calls, so the
//! latency win from concurrency would not cover the rate-limit exposure.
//!
//! A statement-level failure never aborts the run: the failed kind gets an
//! empty table and a diagnostic, and the remaining kinds proceed.

use crate::client::{resolve_client, CompletionClient};
use crate::config::ReconcileConfig;
use crate::error::{ReconError, StatementError};
use crate::output::{ReconcileOutput, ReconcileStats, StatementOutcome, StatementStatus};
use crate::pipeline::{extract, input, llm, normalize, pages, sheet, workbook};
use crate::prompts::{compose_prompt, DEFAULT_SYSTEM_PROMPT, DEFAULT_USER_TEMPLATE};
use crate::types::{PageMap, StatementKind};
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

/// Reconcile a filing against a workbook and return the per-statement
/// tables.
///
/// `pdf_input` is a local path or an HTTP(S) URL; `workbook_path` is the
/// Excel workbook carrying the company's model; `page_map` names the
/// 1-indexed filing pages for each statement kind. Kinds with no pages are
/// skipped.
///
/// # Errors
///
/// Fails only for run-level problems: unusable filing or workbook, no pages
/// for any kind, or no completion provider. Per-statement failures are
/// reported inside the returned [`ReconcileOutput`].
pub async fn reconcile(
    pdf_input: &str,
    workbook_path: &Path,
    page_map: &PageMap,
    config: &ReconcileConfig,
) -> Result<ReconcileOutput, ReconError> {
    let run_start = Instant::now();

    // ── Step 1: validate the request ─────────────────────────────────────
    if page_map.is_empty() {
        return Err(ReconError::NoPagesSelected);
    }

    // ── Step 2: resolve the filing (download if URL) ─────────────────────
    let resolved = input::resolve_input(pdf_input, config.download_timeout_secs).await?;
    let pdf_path = resolved.path().to_path_buf();

    // ── Step 3: check the workbook opens before spending tokens ─────────
    {
        let path = workbook_path.to_path_buf();
        tokio::task::spawn_blocking(move || input::validate_workbook(&path))
            .await
            .map_err(|e| ReconError::Internal(format!("Validation task panicked: {}", e)))??;
    }

    // ── Step 4: resolve the completion client ────────────────────────────
    let client = resolve_client(config)?;

    // ── Step 5: run each statement kind in the fixed order ───────────────
    let runnable = StatementKind::ALL
        .iter()
        .filter(|&&k| !page_map.pages(k).is_empty())
        .count();
    if let Some(ref cb) = config.progress_callback {
        cb.on_run_start(runnable);
    }

    let mut statements = Vec::with_capacity(StatementKind::ALL.len());
    let mut stats = ReconcileStats::default();

    for kind in StatementKind::ALL {
        let requested = page_map.pages(kind);
        if requested.is_empty() {
            info!("{}: no pages requested, skipping", kind);
            stats.statements_skipped += 1;
            statements.push(StatementOutcome::empty(kind, StatementStatus::Skipped));
            continue;
        }

        if let Some(ref cb) = config.progress_callback {
            cb.on_statement_start(kind);
        }

        let (outcome, llm_ms) =
            run_statement(kind, &pdf_path, workbook_path, requested, &client, config).await;

        match outcome.status {
            StatementStatus::Reconciled => {
                stats.statements_reconciled += 1;
                if let Some(ref cb) = config.progress_callback {
                    cb.on_statement_complete(kind, outcome.table.row_count(), outcome.retries);
                }
            }
            StatementStatus::Failed => {
                stats.statements_failed += 1;
                if let Some(ref cb) = config.progress_callback {
                    let detail = outcome
                        .diagnostic
                        .as_ref()
                        .map(|e| e.to_string())
                        .unwrap_or_else(|| "unknown failure".to_string());
                    cb.on_statement_error(kind, &detail);
                }
            }
            StatementStatus::Skipped => unreachable!("skip handled above"),
        }

        stats.total_prompt_tokens += outcome.prompt_tokens;
        stats.total_completion_tokens += outcome.completion_tokens;
        stats.llm_duration_ms += llm_ms;
        statements.push(outcome);
    }

    stats.total_duration_ms = run_start.elapsed().as_millis() as u64;
    if let Some(ref cb) = config.progress_callback {
        cb.on_run_complete(stats.statements_reconciled, stats.statements_failed);
    }

    info!(
        "Run complete: {} reconciled, {} skipped, {} failed in {}ms",
        stats.statements_reconciled,
        stats.statements_skipped,
        stats.statements_failed,
        stats.total_duration_ms
    );

    Ok(ReconcileOutput { statements, stats })
}

/// [`reconcile`], then write the output workbook to `output_path`.
pub async fn reconcile_to_file(
    pdf_input: &str,
    workbook_path: &Path,
    page_map: &PageMap,
    output_path: &Path,
    config: &ReconcileConfig,
) -> Result<ReconcileOutput, ReconError> {
    let output = reconcile(pdf_input, workbook_path, page_map, config).await?;

    let path = output_path.to_path_buf();
    let outcomes = output.statements.clone();
    tokio::task::spawn_blocking(move || workbook::write_workbook(&path, &outcomes))
        .await
        .map_err(|e| ReconError::Internal(format!("Workbook task panicked: {}", e)))??;

    Ok(output)
}

/// Run one statement kind's pipeline from the two source paths.
///
/// Returns the outcome plus the milliseconds spent inside the completion
/// call (for run statistics). Errors become `Failed` outcomes here; nothing
/// propagates.
async fn run_statement(
    kind: StatementKind,
    pdf_path: &Path,
    workbook_path: &Path,
    requested_pages: &[usize],
    client: &Arc<dyn CompletionClient>,
    config: &ReconcileConfig,
) -> (StatementOutcome, u64) {
    let start = Instant::now();

    let fail = |err: StatementError, start: Instant| {
        warn!("{}: {}", kind, err);
        let mut outcome = StatementOutcome::empty(kind, StatementStatus::Failed);
        outcome.diagnostic = Some(err);
        outcome.duration_ms = start.elapsed().as_millis() as u64;
        (outcome, 0)
    };

    let pdf_text = match pages::extract_pages_text(pdf_path, requested_pages).await {
        Ok(text) => text,
        Err(e) => return fail(e, start),
    };

    let excel_text = match sheet::read_sheet_text(workbook_path, kind.sheet_name()).await {
        Ok(text) => text,
        Err(e) => return fail(e, start),
    };

    let (mut outcome, llm_ms) =
        reconcile_texts_inner(kind, &pdf_text, &excel_text, client, config).await;
    outcome.duration_ms = start.elapsed().as_millis() as u64;
    (outcome, llm_ms)
}

/// Reconcile one statement from already-extracted source texts.
///
/// The prompt-to-table tail of the pipeline, exposed for callers that get
/// their source texts elsewhere (or tests that need no PDF on disk). The
/// returned outcome is `Reconciled` or `Failed`, never `Skipped`.
pub async fn reconcile_texts(
    kind: StatementKind,
    pdf_text: &str,
    excel_text: &str,
    client: &Arc<dyn CompletionClient>,
    config: &ReconcileConfig,
) -> StatementOutcome {
    reconcile_texts_inner(kind, pdf_text, excel_text, client, config)
        .await
        .0
}

async fn reconcile_texts_inner(
    kind: StatementKind,
    pdf_text: &str,
    excel_text: &str,
    client: &Arc<dyn CompletionClient>,
    config: &ReconcileConfig,
) -> (StatementOutcome, u64) {
    let start = Instant::now();

    let fail = |err: StatementError| {
        warn!("{}: {}", kind, err);
        let mut outcome = StatementOutcome::empty(kind, StatementStatus::Failed);
        outcome.diagnostic = Some(err);
        outcome.duration_ms = start.elapsed().as_millis() as u64;
        (outcome, 0)
    };

    let system = config.system_prompt.as_deref().unwrap_or(DEFAULT_SYSTEM_PROMPT);
    let template = config
        .user_template
        .as_deref()
        .unwrap_or(DEFAULT_USER_TEMPLATE);

    let user = match compose_prompt(template, pdf_text, excel_text) {
        Ok(prompt) => prompt,
        Err(e) => return fail(e),
    };

    let llm_start = Instant::now();
    let (reply, retries) = match llm::request_reconciliation(client, kind, system, &user, config)
        .await
    {
        Ok(ok) => ok,
        Err(e) => return fail(e),
    };
    let llm_ms = llm_start.elapsed().as_millis() as u64;

    let (columns, mut diagnostic) = extract::extract_columns(&reply.content);

    let table = match normalize::normalize_columns(columns) {
        Ok(table) => table,
        Err(e) => return fail(e),
    };

    // A reply that parsed cleanly to nothing still deserves an explanation.
    if table.is_empty() && diagnostic.is_none() {
        diagnostic = Some(StatementError::EmptyInput);
    }

    let outcome = StatementOutcome {
        kind,
        status: StatementStatus::Reconciled,
        table,
        diagnostic,
        duration_ms: start.elapsed().as_millis() as u64,
        retries,
        prompt_tokens: reply.prompt_tokens,
        completion_tokens: reply.completion_tokens,
    };
    (outcome, llm_ms)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::CompletionReply;
    use async_trait::async_trait;

    struct CannedClient {
        reply: String,
    }

    #[async_trait]
    impl CompletionClient for CannedClient {
        async fn complete(
            &self,
            _system: &str,
            _user: &str,
        ) -> Result<CompletionReply, StatementError> {
            Ok(CompletionReply {
                content: self.reply.clone(),
                prompt_tokens: 100,
                completion_tokens: 40,
            })
        }
    }

    fn canned(reply: &str) -> Arc<dyn CompletionClient> {
        Arc::new(CannedClient {
            reply: reply.into(),
        })
    }

    #[tokio::test]
    async fn text_reconciliation_builds_a_table() {
        let client = canned("```json\n{\"Category\": [\"Cash\"], \"2022\": [50]}\n```");
        let config = ReconcileConfig::default();

        let outcome =
            reconcile_texts(StatementKind::Balance, "pdf text", "excel text", &client, &config)
                .await;

        assert_eq!(outcome.status, StatementStatus::Reconciled);
        assert!(outcome.diagnostic.is_none());
        assert_eq!(outcome.table.row_count(), 1);
        assert_eq!(outcome.prompt_tokens, 100);
    }

    #[tokio::test]
    async fn prose_reply_degrades_to_empty_table() {
        let client = canned("No statement found on those pages, sorry.");
        let config = ReconcileConfig::default();

        let outcome =
            reconcile_texts(StatementKind::Income, "pdf", "excel", &client, &config).await;

        assert_eq!(outcome.status, StatementStatus::Reconciled);
        assert!(outcome.table.is_empty());
        assert!(matches!(
            outcome.diagnostic,
            Some(StatementError::NoStructuredBlock)
        ));
    }

    #[tokio::test]
    async fn empty_mapping_gets_an_explanation() {
        let client = canned("```json\n{}\n```");
        let config = ReconcileConfig::default();

        let outcome =
            reconcile_texts(StatementKind::CashFlow, "pdf", "excel", &client, &config).await;

        assert_eq!(outcome.status, StatementStatus::Reconciled);
        assert!(outcome.table.is_empty());
        assert!(matches!(
            outcome.diagnostic,
            Some(StatementError::EmptyInput)
        ));
    }

    #[tokio::test]
    async fn scalar_column_fails_the_statement() {
        let client = canned("```json\n{\"Category\": \"oops\"}\n```");
        let config = ReconcileConfig::default();

        let outcome =
            reconcile_texts(StatementKind::Income, "pdf", "excel", &client, &config).await;

        assert_eq!(outcome.status, StatementStatus::Failed);
        assert!(outcome.table.is_empty());
        assert!(matches!(
            outcome.diagnostic,
            Some(StatementError::InvalidColumnData { .. })
        ));
    }

    #[tokio::test]
    async fn empty_page_map_is_a_run_level_error() {
        let config = ReconcileConfig::builder().client(canned("```json\n{}\n```")).build().unwrap();
        let err = reconcile(
            "/nonexistent.pdf",
            Path::new("/nonexistent.xlsx"),
            &PageMap::default(),
            &config,
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ReconError::NoPagesSelected));
    }
}

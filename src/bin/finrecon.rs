//! CLI binary for finrecon.
//!
//! A thin shim over the library crate that maps CLI flags to
//! `ReconcileConfig` and prints results.

use anyhow::{Context, Result};
use clap::Parser;
use finrecon::{
    reconcile_to_file, PageMap, ProgressCallback, ReconcileConfig, ReconcileProgressCallback,
    StatementKind, StatementStatus,
};
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
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

// ── CLI progress callback ────────────────────────────────────────────────────

/// Prints a line per statement as the run progresses. Three statements at
/// most, so plain lines beat a progress bar here.
struct CliProgressCallback;

impl ReconcileProgressCallback for CliProgressCallback {
    fn on_run_start(&self, total_statements: usize) {
        eprintln!(
            "{} {}",
            cyan("◆"),
            bold(&format!("Reconciling {total_statements} statement(s)…"))
        );
    }

    fn on_statement_start(&self, kind: StatementKind) {
        eprintln!("  {} {}…", dim("→"), kind);
    }

    fn on_statement_complete(&self, kind: StatementKind, rows: usize, retries: u8) {
        let retry_note = if retries > 0 {
            dim(&format!("  ({retries} retries)"))
        } else {
            String::new()
        };
        eprintln!(
            "  {} {:<20} {}{}",
            green("✓"),
            kind.to_string(),
            dim(&format!("{rows} rows")),
            retry_note,
        );
    }

    fn on_statement_error(&self, kind: StatementKind, error: &str) {
        let msg = truncate_message(error, 99);
        eprintln!("  {} {:<20} {}", red("✗"), kind.to_string(), red(&msg));
    }

    fn on_run_complete(&self, reconciled: usize, failed: usize) {
        if failed == 0 {
            eprintln!(
                "{} {} statement(s) reconciled",
                green("✔"),
                bold(&reconciled.to_string())
            );
        } else {
            eprintln!(
                "{} {} reconciled, {} failed",
                if reconciled == 0 { red("✘") } else { cyan("⚠") },
                bold(&reconciled.to_string()),
                red(&failed.to_string()),
            );
        }
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Reconcile all three statements
  finrecon filing.pdf model.xlsx --income-pages 45,46 --balance-pages 47 \
      --cashflow-pages 48-49 -o reconciled.xlsx

  # Only the balance sheet, from a URL
  finrecon https://example.com/10k.pdf model.xlsx --balance-pages 47

  # Page ranges and lists mix freely
  finrecon filing.pdf model.xlsx --income-pages 45-47,52

  # Use a specific model
  finrecon --model gpt-4.1 --provider openai filing.pdf model.xlsx --income-pages 45

  # Structured JSON report on stdout (tables, diagnostics, stats)
  finrecon --json filing.pdf model.xlsx --income-pages 45 > report.json

WORKBOOK LAYOUT:
  The source workbook is expected to carry its statements on sheets named
  "Income Statement", "Balance Sheet", and "Cash Flow Statement". The output
  workbook always carries exactly those three sheets, in that order; a
  skipped or failed statement leaves its sheet empty.

ENVIRONMENT VARIABLES:
  OPENAI_API_KEY          OpenAI API key
  ANTHROPIC_API_KEY       Anthropic API key
  GEMINI_API_KEY          Google Gemini API key
  FINRECON_LLM_PROVIDER   Override provider (openai, anthropic, gemini, ollama)
  FINRECON_MODEL          Override model ID
  PDFIUM_LIB_PATH         Path to an existing libpdfium

SETUP:
  1. Set API key:   export OPENAI_API_KEY=sk-...
  2. Reconcile:     finrecon filing.pdf model.xlsx --balance-pages 47
"#;

/// Reconcile financial statements from a PDF filing and an Excel workbook.
#[derive(Parser, Debug)]
#[command(
    name = "finrecon",
    version,
    about = "Reconcile financial statements from PDF filings and Excel workbooks using LLMs",
    long_about = "Extract the income statement, balance sheet, and cash flow statement from a \
PDF filing, merge each against the matching worksheet of an Excel model using an LLM, and \
write the reconciled tables into one output workbook.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Local PDF file path or HTTP/HTTPS URL of the filing.
    pdf: String,

    /// Excel workbook carrying the company model.
    excel: PathBuf,

    /// Filing pages of the income statement: 45, 45-47, or 45,46,52.
    #[arg(long, env = "FINRECON_INCOME_PAGES")]
    income_pages: Option<String>,

    /// Filing pages of the balance sheet.
    #[arg(long, env = "FINRECON_BALANCE_PAGES")]
    balance_pages: Option<String>,

    /// Filing pages of the cash flow statement.
    #[arg(long, env = "FINRECON_CASHFLOW_PAGES")]
    cashflow_pages: Option<String>,

    /// Write the reconciled workbook to this path.
    #[arg(short, long, env = "FINRECON_OUTPUT", default_value = "reconciled.xlsx")]
    output: PathBuf,

    /// LLM model ID (e.g. gpt-4.1-mini, gpt-4.1, claude-sonnet-4-20250514).
    #[arg(long, env = "FINRECON_MODEL")]
    model: Option<String>,

    /// LLM provider: openai, anthropic, gemini, ollama, azure.
    #[arg(
        long,
        env = "FINRECON_LLM_PROVIDER",
        long_help = "LLM provider. Auto-detected from API key env vars if not set.\n\
          Supported: openai, anthropic, gemini, azure, ollama, or any OpenAI-compatible URL."
    )]
    provider: Option<String>,

    /// Path to a text file containing a custom system prompt.
    #[arg(long, env = "FINRECON_SYSTEM_PROMPT")]
    system_prompt: Option<PathBuf>,

    /// Max LLM output tokens per statement.
    #[arg(long, env = "FINRECON_MAX_TOKENS", default_value_t = 8192)]
    max_tokens: usize,

    /// LLM temperature (0.0–2.0).
    #[arg(long, env = "FINRECON_TEMPERATURE", default_value_t = 0.2)]
    temperature: f32,

    /// Retries per statement on transient LLM failure.
    #[arg(long, env = "FINRECON_MAX_RETRIES", default_value_t = 3)]
    max_retries: u32,

    /// Per-statement LLM call timeout in seconds.
    #[arg(long, env = "FINRECON_API_TIMEOUT", default_value_t = 120)]
    api_timeout: u64,

    /// HTTP download timeout in seconds.
    #[arg(long, env = "FINRECON_DOWNLOAD_TIMEOUT", default_value_t = 120)]
    download_timeout: u64,

    /// Print the full run report (tables, diagnostics, stats) as JSON on stdout.
    #[arg(long, env = "FINRECON_JSON")]
    json: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "FINRECON_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "FINRECON_QUIET")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "error"
    } else {
        "warn"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    // ── Page maps ────────────────────────────────────────────────────────
    let page_map = PageMap {
        income: parse_page_list(cli.income_pages.as_deref())?,
        balance: parse_page_list(cli.balance_pages.as_deref())?,
        cash_flow: parse_page_list(cli.cashflow_pages.as_deref())?,
    };

    // ── Build config ─────────────────────────────────────────────────────
    let config = build_config(&cli).await?;

    // ── Run ──────────────────────────────────────────────────────────────
    let output = reconcile_to_file(&cli.pdf, &cli.excel, &page_map, &cli.output, &config)
        .await
        .context("Reconciliation failed")?;

    if cli.json {
        let json = serde_json::to_string_pretty(&output).context("Failed to serialise output")?;
        println!("{json}");
    }

    if !cli.quiet {
        eprintln!(
            "{}  {} statement(s)  {}ms  →  {}",
            if output.stats.statements_failed == 0 {
                green("✔")
            } else {
                cyan("⚠")
            },
            output.stats.statements_reconciled,
            output.stats.total_duration_ms,
            bold(&cli.output.display().to_string()),
        );
        eprintln!(
            "   {} tokens in  /  {} tokens out",
            dim(&output.stats.total_prompt_tokens.to_string()),
            dim(&output.stats.total_completion_tokens.to_string()),
        );
        for outcome in &output.statements {
            if outcome.status == StatementStatus::Reconciled {
                if let Some(ref diag) = outcome.diagnostic {
                    eprintln!(
                        "   {} {}: {}",
                        cyan("⚠"),
                        outcome.kind,
                        dim(&diag.to_string())
                    );
                }
            }
        }
    }

    if output.stats.statements_failed > 0 {
        std::process::exit(1);
    }

    Ok(())
}

/// Map CLI args to `ReconcileConfig`.
async fn build_config(cli: &Cli) -> Result<ReconcileConfig> {
    let system_prompt = if let Some(ref path) = cli.system_prompt {
        Some(
            tokio::fs::read_to_string(path)
                .await
                .with_context(|| format!("Failed to read system prompt from {:?}", path))?,
        )
    } else {
        None
    };

    let mut builder = ReconcileConfig::builder()
        .max_tokens(cli.max_tokens)
        .temperature(cli.temperature)
        .max_retries(cli.max_retries)
        .api_timeout_secs(cli.api_timeout)
        .download_timeout_secs(cli.download_timeout);

    if !cli.quiet && !cli.json {
        builder =
            builder.progress_callback(Arc::new(CliProgressCallback) as ProgressCallback);
    }

    let mut config = builder.build().context("Invalid configuration")?;

    // Apply fields the builder doesn't have setters for.
    config.model = cli.model.clone();
    config.provider_name = cli.provider.clone();
    config.system_prompt = system_prompt;

    Ok(config)
}

/// Truncate a long message to `max_chars` characters plus an ellipsis.
///
/// Provider errors routinely echo non-ASCII model output, so the cut is on
/// a character boundary, never a byte offset.
fn truncate_message(s: &str, max_chars: usize) -> String {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}\u{2026}", &s[..idx]),
        None => s.to_string(),
    }
}

/// Parse a page-list flag: comma-separated page numbers and inclusive
/// ranges, e.g. "45", "45-47", "45,46,52", "45-47,52". Order is preserved.
fn parse_page_list(s: Option<&str>) -> Result<Vec<usize>> {
    let Some(s) = s else {
        return Ok(Vec::new());
    };

    let mut pages = Vec::new();
    for item in s.split(',') {
        let item = item.trim();
        if item.is_empty() {
            continue;
        }

        if let Some((start, end)) = item.split_once('-') {
            let start: usize = start
                .trim()
                .parse()
                .context(format!("Invalid start page in range '{item}'"))?;
            let end: usize = end
                .trim()
                .parse()
                .context(format!("Invalid end page in range '{item}'"))?;
            if start < 1 {
                anyhow::bail!("Pages are 1-indexed, minimum is 1 (got {start})");
            }
            if start > end {
                anyhow::bail!("Invalid page range '{start}-{end}': start must be <= end");
            }
            pages.extend(start..=end);
        } else {
            let page: usize = item
                .parse()
                .context(format!("Invalid page number: '{item}'"))?;
            if page < 1 {
                anyhow::bail!("Pages are 1-indexed, minimum is 1 (got {page})");
            }
            pages.push(page);
        }
    }

    Ok(pages)
}

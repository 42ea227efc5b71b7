//! # finrecon
//!
//! Reconcile financial statements from PDF filings and Excel workbooks into
//! one spreadsheet using LLMs.
//!
//! ## Why this crate?
//!
//! Analysts keep a company model in Excel while the authoritative numbers
//! live in PDF filings — with different line-item names, different year
//! coverage, and the occasional restated figure. Merging the two by hand is
//! slow and error-prone. This crate extracts the statement pages from the
//! filing, renders the matching worksheet as text, and lets an LLM align
//! the two into one rectangular table per statement, written out as a fresh
//! workbook.
//!
//! ## Pipeline Overview
//!
//! ```text
//! filing.pdf + model.xlsx
//!  │
//!  ├─ 1. Input      resolve local file or download from URL
//!  ├─ 2. Pages      extract statement-page text via pdfium (spawn_blocking)
//!  ├─ 3. Sheet      render the worksheet as tab-separated text (calamine)
//!  ├─ 4. LLM        one completion call per statement, retry on 429/5xx
//!  ├─ 5. Extract    pull the fenced JSON block out of the reply
//!  ├─ 6. Normalize  pad columns, "NA" nulls, Category first
//!  └─ 7. Workbook   three fixed worksheets in one output xlsx
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use finrecon::{reconcile_to_file, PageMap, ReconcileConfig};
//! use std::path::Path;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Provider auto-detected from OPENAI_API_KEY / ANTHROPIC_API_KEY / …
//!     let config = ReconcileConfig::default();
//!     let pages = PageMap {
//!         income: vec![45, 46],
//!         balance: vec![47],
//!         cash_flow: vec![48, 49],
//!     };
//!     let output = reconcile_to_file(
//!         "filing.pdf",
//!         Path::new("model.xlsx"),
//!         &pages,
//!         Path::new("reconciled.xlsx"),
//!         &config,
//!     )
//!     .await?;
//!     eprintln!(
//!         "{} reconciled, {} failed, {} tokens",
//!         output.stats.statements_reconciled,
//!         output.stats.statements_failed,
//!         output.stats.total_prompt_tokens + output.stats.total_completion_tokens,
//!     );
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `finrecon` binary (clap + anyhow + tracing-subscriber) |
//!
//! Disable `cli` when using only the library to avoid pulling in CLI-only deps:
//! ```toml
//! finrecon = { version = "0.3", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod client;
pub mod config;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod prompts;
pub mod reconcile;
pub mod types;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use client::{CompletionClient, CompletionReply, ProviderClient};
pub use config::{ReconcileConfig, ReconcileConfigBuilder};
pub use error::{ReconError, StatementError};
pub use output::{ReconcileOutput, ReconcileStats, StatementOutcome, StatementStatus};
pub use progress::{NoopProgressCallback, ProgressCallback, ReconcileProgressCallback};
pub use reconcile::{reconcile, reconcile_texts, reconcile_to_file};
pub use types::{Column, PageMap, ReconciledTable, StatementKind, CATEGORY_COLUMN};

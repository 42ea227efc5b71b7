//! Error types for the finrecon library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`ReconError`] — **Fatal**: the reconciliation run cannot proceed at all
//!   (bad PDF input, unopenable workbook, no provider configured, no pages
//!   requested for any statement). Returned as `Err(ReconError)` from the
//!   top-level `reconcile*` functions.
//!
//! * [`StatementError`] — **Non-fatal**: one statement kind failed (bad page
//!   selection, missing sheet, provider timeout) but the other kinds are
//!   fine. Stored inside [`crate::output::StatementOutcome`] so callers can
//!   inspect partial success rather than losing the whole run to one bad
//!   statement.
//!
//! The separation lets callers decide their own tolerance: abort when any
//! statement fails, log and ship the workbook with empty sheets, or collect
//! all diagnostics for a post-run report.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the finrecon library.
///
/// Statement-level failures use [`StatementError`] and are stored in
/// [`crate::output::StatementOutcome`] rather than propagated here.
#[derive(Debug, Error)]
pub enum ReconError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("File not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The input string is not a valid file path or URL.
    #[error("Invalid input '{input}': not a file path or a valid HTTP/HTTPS URL")]
    InvalidInput { input: String },

    /// HTTP URL was syntactically valid but download failed.
    #[error("Failed to download '{url}': {reason}\nCheck your internet connection.")]
    DownloadFailed { url: String, reason: String },

    /// Download exceeded the configured timeout.
    #[error("Download timed out after {secs}s for '{url}'\nIncrease --download-timeout.")]
    DownloadTimeout { url: String, secs: u64 },

    /// The file exists and was read, but is not a PDF.
    #[error("File is not a valid PDF: '{path}'\nFirst bytes: {magic:?}")]
    NotAPdf { path: PathBuf, magic: [u8; 4] },

    /// The Excel workbook shared by all statement kinds cannot be opened.
    #[error("Cannot open workbook '{path}': {detail}")]
    SourceUnavailable { path: PathBuf, detail: String },

    /// The page map contained no pages for any statement kind, so no
    /// statement could run at all.
    #[error("No pages selected for any statement kind.\nSupply at least one of --income-pages, --balance-pages, --cashflow-pages.")]
    NoPagesSelected,

    // ── LLM errors ────────────────────────────────────────────────────────
    /// The configured completion provider is not initialised (missing API
    /// key etc.).
    #[error("LLM provider '{provider}' is not configured.\n{hint}")]
    ClientNotConfigured { provider: String, hint: String },

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create or write the output workbook.
    #[error("Failed to write output workbook '{path}': {detail}")]
    WorkbookWriteFailed { path: PathBuf, detail: String },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// A non-fatal error scoped to a single statement kind.
///
/// Recorded in [`crate::output::StatementOutcome::diagnostic`]. A failed
/// statement yields an explicitly empty table; the overall run continues
/// with the remaining statement kinds.
#[derive(Debug, Clone, Error, serde::Serialize, serde::Deserialize)]
pub enum StatementError {
    /// The page list was empty or no listed page fell inside the document.
    #[error("Invalid page selection: {detail}")]
    InvalidPageSelection { detail: String },

    /// The PDF could not be opened during this statement's run.
    #[error("Source document unavailable: {detail}")]
    SourceUnavailable { detail: String },

    /// PDF-to-text conversion failed or produced no content.
    #[error("Text conversion failed: {detail}")]
    Conversion { detail: String },

    /// The named worksheet does not exist in the workbook.
    #[error("Sheet '{sheet}' not found in the workbook")]
    SheetNotFound { sheet: String },

    /// A placeholder marker was absent from the prompt template.
    #[error("Prompt template is missing the '{marker}' marker")]
    Template { marker: String },

    /// The provider rejected the credential (401/403).
    #[error("Authentication failed: {detail}")]
    Authentication { detail: String },

    /// Transient provider failure (network error, 429, 5xx).
    #[error("Completion service unavailable: {detail}")]
    ServiceUnavailable { detail: String },

    /// The provider replied without any content.
    #[error("Completion service returned an empty response")]
    EmptyResponse,

    /// The provider call exceeded the configured ceiling.
    #[error("Completion call timed out after {secs}s")]
    Timeout { secs: u64 },

    /// The model reply contained no fenced structured block.
    #[error("No structured block found in the model reply")]
    NoStructuredBlock,

    /// A fenced block was found but did not parse as a JSON object.
    #[error("Malformed structured block: {detail}")]
    Malformed { detail: String },

    /// A column value in the parsed mapping was not a sequence.
    #[error("Column '{column}' is not a value list")]
    InvalidColumnData { column: String },

    /// The parsed mapping had no columns at all.
    #[error("Model reply parsed to an empty column mapping")]
    EmptyInput,
}

impl StatementError {
    /// Whether a retry with backoff may reasonably succeed.
    ///
    /// Only transient provider failures qualify; authentication errors,
    /// timeouts, and every parse-side failure are deterministic for this
    /// run and fail the statement immediately.
    pub fn is_transient(&self) -> bool {
        matches!(self, StatementError::ServiceUnavailable { .. })
    }
}

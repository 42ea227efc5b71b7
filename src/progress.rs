//! Progress-callback trait for per-statement reconciliation events.
//!
//! Inject an [`Arc<dyn ReconcileProgressCallback>`] via
//! [`crate::config::ReconcileConfigBuilder::progress_callback`] to receive
//! real-time events as the pipeline processes each statement kind.
//!
//! # Why callbacks instead of channels?
//!
//! The callback approach is the least-invasive integration point: callers can
//! forward events to a Tokio broadcast channel, a WebSocket, a database record,
//! or a terminal progress line — without the library knowing anything about how
//! the host application communicates. The trait is `Send + Sync` so it stays
//! usable if statements are ever processed concurrently.
//!
//! # Example
//!
//! ```rust
//! use finrecon::{ReconcileConfig, ReconcileProgressCallback, StatementKind};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct CountingCallback {
//!     completed: Arc<AtomicUsize>,
//! }
//!
//! impl ReconcileProgressCallback for CountingCallback {
//!     fn on_statement_complete(&self, kind: StatementKind, rows: usize, retries: u8) {
//!         let done = self.completed.fetch_add(1, Ordering::SeqCst) + 1;
//!         eprintln!("{} done: {} rows ({} retries), {} statements so far", kind, rows, retries, done);
//!     }
//! }
//!
//! let counter = Arc::new(CountingCallback {
//!     completed: Arc::new(AtomicUsize::new(0)),
//! });
//!
//! let config = ReconcileConfig::builder()
//!     .progress_callback(counter as Arc<dyn ReconcileProgressCallback>)
//!     .build()
//!     .unwrap();
//! ```

use crate::types::StatementKind;
use std::sync::Arc;

/// Called by the pipeline as it reconciles each statement kind.
///
/// All methods have default no-op implementations so callers only override
/// what they care about.
pub trait ReconcileProgressCallback: Send + Sync {
    /// Called once before any statement runs.
    ///
    /// # Arguments
    /// * `total_statements` — number of statement kinds that have pages and
    ///   will actually run
    fn on_run_start(&self, total_statements: usize) {
        let _ = total_statements;
    }

    /// Called just before a statement kind's pipeline pass begins.
    fn on_statement_start(&self, kind: StatementKind) {
        let _ = kind;
    }

    /// Called when a statement kind reconciles successfully.
    ///
    /// # Arguments
    /// * `kind`    — the statement that finished
    /// * `rows`    — data rows in its reconciled table
    /// * `retries` — completion-call retries that were needed
    fn on_statement_complete(&self, kind: StatementKind, rows: usize, retries: u8) {
        let _ = (kind, rows, retries);
    }

    /// Called when a statement kind fails after all retries are exhausted.
    ///
    /// # Arguments
    /// * `kind`  — the statement that failed
    /// * `error` — human-readable failure description
    fn on_statement_error(&self, kind: StatementKind, error: &str) {
        let _ = (kind, error);
    }

    /// Called once after all statement kinds have been attempted.
    ///
    /// # Arguments
    /// * `reconciled` — statements that produced a table
    /// * `failed`     — statements that ended in a failure outcome
    fn on_run_complete(&self, reconciled: usize, failed: usize) {
        let _ = (reconciled, failed);
    }
}

/// A no-op implementation for callers that don't need progress events.
///
/// This is the default when no callback is configured.
pub struct NoopProgressCallback;

impl ReconcileProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::ReconcileConfig`].
pub type ProgressCallback = Arc<dyn ReconcileProgressCallback>;

//! Output types: per-statement outcomes and whole-run results.

use crate::error::StatementError;
use crate::types::{ReconciledTable, StatementKind};
use serde::{Deserialize, Serialize};

/// Terminal state of one statement's pipeline run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StatementStatus {
    /// The full pipeline ran and produced a (possibly degraded) table.
    Reconciled,
    /// No pages were supplied for this kind; nothing ran.
    Skipped,
    /// A stage failed; the table is explicitly empty.
    Failed,
}

/// Result of one statement kind's reconciliation run.
///
/// Every run yields exactly one outcome per kind — a failed or skipped
/// statement carries an empty [`ReconciledTable`], never an absent entry,
/// so the output workbook always has its three sheets.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatementOutcome {
    pub kind: StatementKind,
    pub status: StatementStatus,
    /// The normalized table; empty for `Skipped` and `Failed` outcomes.
    pub table: ReconciledTable,
    /// The failure cause for `Failed` outcomes, or a recorded degradation
    /// (e.g. no structured block in the reply) for `Reconciled` ones.
    pub diagnostic: Option<StatementError>,
    /// Wall-clock duration of this statement's run in milliseconds.
    pub duration_ms: u64,
    /// Completion-call retries that were needed.
    pub retries: u8,
    /// Prompt tokens consumed by the completion call.
    pub prompt_tokens: u64,
    /// Completion tokens produced by the completion call.
    pub completion_tokens: u64,
}

impl StatementOutcome {
    /// An outcome with an empty table, used for skipped and failed runs.
    pub fn empty(kind: StatementKind, status: StatementStatus) -> Self {
        Self {
            kind,
            status,
            table: ReconciledTable::empty(),
            diagnostic: None,
            duration_ms: 0,
            retries: 0,
            prompt_tokens: 0,
            completion_tokens: 0,
        }
    }
}

/// Aggregate statistics for one end-to-end run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReconcileStats {
    pub statements_reconciled: usize,
    pub statements_skipped: usize,
    pub statements_failed: usize,
    pub total_prompt_tokens: u64,
    pub total_completion_tokens: u64,
    /// End-to-end wall-clock time, milliseconds.
    pub total_duration_ms: u64,
    /// Time spent inside completion calls (including retries), milliseconds.
    pub llm_duration_ms: u64,
}

/// Complete result of [`crate::reconcile::reconcile`]: one outcome per
/// statement kind, in the fixed `Income → Balance → CashFlow` order, plus
/// run statistics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReconcileOutput {
    pub statements: Vec<StatementOutcome>,
    pub stats: ReconcileStats,
}

impl ReconcileOutput {
    /// The outcome for a given kind.
    pub fn statement(&self, kind: StatementKind) -> Option<&StatementOutcome> {
        self.statements.iter().find(|s| s.kind == kind)
    }
}

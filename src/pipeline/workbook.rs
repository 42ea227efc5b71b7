//! Output assembly: write all statement tables into one xlsx workbook.
//!
//! The workbook always carries exactly three worksheets in the fixed
//! `Income Statement`, `Balance Sheet`, `Cash Flow Statement` order, so
//! downstream tooling can address sheets positionally. A skipped or failed
//! statement still gets its worksheet — empty, rather than absent.
//!
//! The file is written to a `.tmp` sibling and renamed into place, so a
//! crash mid-write never leaves a truncated workbook at the target path.

use crate::error::ReconError;
use crate::output::StatementOutcome;
use crate::types::StatementKind;
use rust_xlsxwriter::Workbook;
use std::path::Path;
use tracing::info;

/// Write one worksheet per statement kind to `path`.
///
/// `outcomes` may arrive in any order and with kinds missing; the worksheet
/// set and order are fixed regardless.
pub fn write_workbook(path: &Path, outcomes: &[StatementOutcome]) -> Result<(), ReconError> {
    let fail = |detail: String| ReconError::WorkbookWriteFailed {
        path: path.to_path_buf(),
        detail,
    };

    let mut workbook = Workbook::new();

    for kind in StatementKind::ALL {
        let worksheet = workbook.add_worksheet();
        worksheet
            .set_name(kind.sheet_name())
            .map_err(|e| fail(e.to_string()))?;

        let Some(outcome) = outcomes.iter().find(|o| o.kind == kind) else {
            continue;
        };

        for (col_idx, column) in outcome.table.columns.iter().enumerate() {
            let col = col_idx as u16;
            worksheet
                .write_string(0, col, &column.name)
                .map_err(|e| fail(e.to_string()))?;
            for (row_idx, value) in column.values.iter().enumerate() {
                worksheet
                    .write_string(row_idx as u32 + 1, col, value)
                    .map_err(|e| fail(e.to_string()))?;
            }
        }
    }

    let tmp_path = path.with_extension("xlsx.tmp");
    workbook
        .save(&tmp_path)
        .map_err(|e| fail(e.to_string()))?;
    std::fs::rename(&tmp_path, path).map_err(|e| fail(e.to_string()))?;

    info!("Workbook written: {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::StatementStatus;
    use crate::types::{Column, ReconciledTable};
    use calamine::{open_workbook_auto, Data, Reader};

    fn outcome(kind: StatementKind, columns: Vec<(&str, Vec<&str>)>) -> StatementOutcome {
        let mut o = StatementOutcome::empty(kind, StatementStatus::Reconciled);
        o.table = ReconciledTable {
            columns: columns
                .into_iter()
                .map(|(name, values)| Column {
                    name: name.into(),
                    values: values.into_iter().map(String::from).collect(),
                })
                .collect(),
        };
        o
    }

    #[test]
    fn workbook_carries_all_three_sheets_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.xlsx");

        let outcomes = vec![outcome(
            StatementKind::Balance,
            vec![("Category", vec!["Cash"]), ("2022", vec!["50"])],
        )];
        write_workbook(&path, &outcomes).unwrap();

        let workbook = open_workbook_auto(&path).unwrap();
        assert_eq!(
            workbook.sheet_names(),
            vec!["Income Statement", "Balance Sheet", "Cash Flow Statement"]
        );
    }

    #[test]
    fn written_cells_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.xlsx");

        let outcomes = vec![outcome(
            StatementKind::Income,
            vec![
                ("Category", vec!["Revenue", "Net income"]),
                ("2023", vec!["1200", "NA"]),
            ],
        )];
        write_workbook(&path, &outcomes).unwrap();

        let mut workbook = open_workbook_auto(&path).unwrap();
        let range = workbook.worksheet_range("Income Statement").unwrap();
        assert_eq!(range.get((0, 0)), Some(&Data::String("Category".into())));
        assert_eq!(range.get((0, 1)), Some(&Data::String("2023".into())));
        assert_eq!(range.get((1, 0)), Some(&Data::String("Revenue".into())));
        assert_eq!(range.get((2, 1)), Some(&Data::String("NA".into())));
    }

    #[test]
    fn no_tmp_file_survives_a_successful_write() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.xlsx");

        write_workbook(&path, &[]).unwrap();

        assert!(path.exists());
        assert!(!dir.path().join("out.xlsx.tmp").exists());
    }

    #[test]
    fn unwritable_target_fails_cleanly() {
        let err = write_workbook(Path::new("/nonexistent/dir/out.xlsx"), &[]).unwrap_err();
        assert!(matches!(err, ReconError::WorkbookWriteFailed { .. }));
    }
}

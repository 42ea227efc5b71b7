//! Workbook reading: render one worksheet as plain text for the prompt.
//!
//! calamine reads the whole sheet range eagerly from disk, so the work runs
//! in `spawn_blocking` like the pdfium stage. The rendering is deliberately
//! plain — tab-separated cells, one row per line — because the model needs
//! the values and their layout, not xlsx styling.

use crate::error::StatementError;
use calamine::{open_workbook_auto, Data, Reader};
use std::path::Path;
use tracing::debug;

/// Read the named worksheet and render it as tab-separated text.
///
/// The sheet name must match exactly; a missing sheet is a statement-level
/// failure rather than a run-level one, since the workbook may legitimately
/// carry only some of the three statements.
pub async fn read_sheet_text(
    workbook_path: &Path,
    sheet_name: &str,
) -> Result<String, StatementError> {
    let path = workbook_path.to_path_buf();
    let sheet = sheet_name.to_string();

    tokio::task::spawn_blocking(move || read_sheet_blocking(&path, &sheet))
        .await
        .map_err(|e| StatementError::Conversion {
            detail: format!("Workbook task panicked: {}", e),
        })?
}

/// Blocking implementation of sheet reading.
fn read_sheet_blocking(path: &Path, sheet_name: &str) -> Result<String, StatementError> {
    let mut workbook =
        open_workbook_auto(path).map_err(|e| StatementError::SourceUnavailable {
            detail: e.to_string(),
        })?;

    if !workbook.sheet_names().iter().any(|n| n == sheet_name) {
        return Err(StatementError::SheetNotFound {
            sheet: sheet_name.to_string(),
        });
    }

    let range = workbook
        .worksheet_range(sheet_name)
        .map_err(|e| StatementError::Conversion {
            detail: format!("reading sheet '{}': {}", sheet_name, e),
        })?;

    let mut lines = Vec::with_capacity(range.height());
    for row in range.rows() {
        let cells: Vec<String> = row.iter().map(format_cell).collect();
        lines.push(cells.join("\t"));
    }

    let text = lines.join("\n").trim().to_string();
    if text.is_empty() {
        return Err(StatementError::Conversion {
            detail: format!("sheet '{}' is empty", sheet_name),
        });
    }

    debug!(
        "Sheet '{}': {} rows, {} chars",
        sheet_name,
        range.height(),
        text.len()
    );

    Ok(text)
}

/// Render one cell the way a reader of the sheet would see it.
fn format_cell(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        // Whole floats print without the trailing ".0" Excel never shows.
        Data::Float(f) if f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", *f as i64),
        Data::Float(f) => f.to_string(),
        Data::Int(i) => i.to_string(),
        Data::Bool(b) => b.to_string(),
        Data::DateTime(dt) => dt.to_string(),
        Data::DateTimeIso(s) => s.clone(),
        Data::DurationIso(s) => s.clone(),
        Data::Error(e) => format!("{:?}", e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cells_render_like_excel_displays_them() {
        assert_eq!(format_cell(&Data::Empty), "");
        assert_eq!(format_cell(&Data::String("Revenue".into())), "Revenue");
        assert_eq!(format_cell(&Data::Float(1250.0)), "1250");
        assert_eq!(format_cell(&Data::Float(12.5)), "12.5");
        assert_eq!(format_cell(&Data::Int(-300)), "-300");
        assert_eq!(format_cell(&Data::Bool(true)), "true");
    }

    #[test]
    fn missing_workbook_is_source_unavailable() {
        let err =
            read_sheet_blocking(Path::new("/nonexistent/model.xlsx"), "Income Statement")
                .unwrap_err();
        assert!(matches!(err, StatementError::SourceUnavailable { .. }));
    }

    fn write_fixture_workbook(path: &Path) {
        let mut workbook = rust_xlsxwriter::Workbook::new();
        let worksheet = workbook.add_worksheet();
        worksheet.set_name("Income Statement").unwrap();
        worksheet.write_string(0, 0, "Category").unwrap();
        worksheet.write_string(0, 1, "2022").unwrap();
        worksheet.write_string(1, 0, "Revenue").unwrap();
        worksheet.write_number(1, 1, 1250.0).unwrap();
        workbook.save(path).unwrap();
    }

    #[test]
    fn absent_sheet_is_sheet_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.xlsx");
        write_fixture_workbook(&path);

        let err = read_sheet_blocking(&path, "Balance Sheet").unwrap_err();
        assert!(
            matches!(err, StatementError::SheetNotFound { sheet } if sheet == "Balance Sheet")
        );
    }

    #[test]
    fn present_sheet_renders_tab_separated_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.xlsx");
        write_fixture_workbook(&path);

        let text = read_sheet_blocking(&path, "Income Statement").unwrap();
        assert_eq!(text, "Category\t2022\nRevenue\t1250");
    }
}

//! Table normalisation: turn a raw column mapping into a rectangular table.
//!
//! The model's mapping arrives as JSON arrays of mixed value types with no
//! length guarantee. This stage establishes the invariants every downstream
//! consumer relies on: string cells only, equal column lengths, and the
//! `Category` column first.

use crate::error::StatementError;
use crate::types::{Column, ReconciledTable, CATEGORY_COLUMN};
use serde_json::{Map, Value};

/// Normalise a parsed column mapping into a [`ReconciledTable`].
///
/// * `null` cells become `"NA"` — a value the model looked for and did not
///   find in either source.
/// * Columns shorter than the longest are right-padded with `""` — cells
///   that were never produced at all. The two gaps stay distinguishable in
///   the output.
/// * The `Category` column is moved to the front; all other columns keep
///   the mapping's order.
///
/// An empty mapping yields an empty table, not an error; the caller decides
/// whether upstream diagnostics already explain it.
pub fn normalize_columns(map: Map<String, Value>) -> Result<ReconciledTable, StatementError> {
    if map.is_empty() {
        return Ok(ReconciledTable::empty());
    }

    let mut columns = Vec::with_capacity(map.len());
    for (name, value) in map {
        let cells = match value {
            Value::Array(items) => items.into_iter().map(cell_to_string).collect(),
            _ => {
                return Err(StatementError::InvalidColumnData { column: name });
            }
        };
        columns.push(Column {
            name,
            values: cells,
        });
    }

    let max_len = columns.iter().map(|c| c.values.len()).max().unwrap_or(0);
    for column in &mut columns {
        column.values.resize(max_len, String::new());
    }

    if let Some(pos) = columns.iter().position(|c| c.name == CATEGORY_COLUMN) {
        let category = columns.remove(pos);
        columns.insert(0, category);
    }

    Ok(ReconciledTable { columns })
}

/// Render one JSON cell as the string written into the worksheet.
fn cell_to_string(v: Value) -> String {
    match v {
        Value::Null => "NA".to_string(),
        Value::String(s) => s,
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        // Nested structures should not appear; keep them inspectable.
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn map(v: Value) -> Map<String, Value> {
        match v {
            Value::Object(m) => m,
            _ => panic!("fixture must be an object"),
        }
    }

    #[test]
    fn empty_mapping_yields_empty_table() {
        let table = normalize_columns(Map::new()).unwrap();
        assert!(table.is_empty());
    }

    #[test]
    fn ragged_columns_are_padded_to_rectangles() {
        let table = normalize_columns(map(json!({
            "Category": ["Cash", "Debt", "Equity"],
            "2022": [50, 30],
        })))
        .unwrap();

        assert_eq!(table.row_count(), 3);
        assert_eq!(table.column("2022").unwrap().values, vec!["50", "30", ""]);
    }

    #[test]
    fn null_cells_become_na_but_padding_stays_blank() {
        let table = normalize_columns(map(json!({
            "Category": ["Cash", "Debt"],
            "2023": [120.5, null],
            "2024": [7],
        })))
        .unwrap();

        assert_eq!(table.column("2023").unwrap().values, vec!["120.5", "NA"]);
        assert_eq!(table.column("2024").unwrap().values, vec!["7", ""]);
    }

    #[test]
    fn category_column_moves_to_front() {
        let table = normalize_columns(map(json!({
            "2021": ["1"],
            "2022": ["2"],
            "Category": ["Revenue"],
        })))
        .unwrap();

        let names: Vec<_> = table.columns.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec![CATEGORY_COLUMN, "2021", "2022"]);
    }

    #[test]
    fn year_column_order_is_preserved() {
        let table = normalize_columns(map(json!({
            "Category": [],
            "FY2020": [],
            "FY2019": [],
        })))
        .unwrap();

        let names: Vec<_> = table.columns.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec![CATEGORY_COLUMN, "FY2020", "FY2019"]);
    }

    #[test]
    fn scalar_column_value_is_rejected() {
        let err = normalize_columns(map(json!({
            "Category": ["Cash"],
            "2022": "not a list",
        })))
        .unwrap_err();
        assert!(matches!(err, StatementError::InvalidColumnData { column } if column == "2022"));
    }

    #[test]
    fn normalisation_is_idempotent() {
        let raw = map(json!({
            "Category": ["Cash", "Debt"],
            "2022": [50],
        }));
        let once = normalize_columns(raw).unwrap();

        let again = normalize_columns(
            once.columns
                .iter()
                .map(|c| {
                    (
                        c.name.clone(),
                        Value::Array(c.values.iter().cloned().map(Value::String).collect()),
                    )
                })
                .collect(),
        )
        .unwrap();

        assert_eq!(once, again);
    }
}

//! Core domain types: statement kinds, page maps, and reconciled tables.

use serde::{Deserialize, Serialize};
use std::fmt;

/// One of the three financial statements a filing carries.
///
/// The kind is the unit of reconciliation: each kind runs its own pipeline
/// pass and fills its own sheet in the output workbook.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StatementKind {
    Income,
    Balance,
    CashFlow,
}

impl StatementKind {
    /// All kinds in the fixed processing (and output-sheet) order.
    pub const ALL: [StatementKind; 3] = [
        StatementKind::Income,
        StatementKind::Balance,
        StatementKind::CashFlow,
    ];

    /// The worksheet name used both when reading the source workbook and
    /// when writing the output workbook.
    pub fn sheet_name(&self) -> &'static str {
        match self {
            StatementKind::Income => "Income Statement",
            StatementKind::Balance => "Balance Sheet",
            StatementKind::CashFlow => "Cash Flow Statement",
        }
    }

    /// The key used in JSON page maps (`{"income": [...], "cashFlow": [...]}`).
    pub fn key(&self) -> &'static str {
        match self {
            StatementKind::Income => "income",
            StatementKind::Balance => "balance",
            StatementKind::CashFlow => "cashFlow",
        }
    }
}

impl fmt::Display for StatementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.sheet_name())
    }
}

/// Which PDF pages carry each statement, 1-indexed.
///
/// An empty list for a kind means that kind is skipped entirely — it is not
/// an error for the run. A map with no pages for *any* kind is rejected at
/// the invocation level.
///
/// The serde field names match the JSON shape used by transport layers:
/// `{"income": [5, 6], "balance": [7], "cashFlow": []}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageMap {
    #[serde(default)]
    pub income: Vec<usize>,
    #[serde(default)]
    pub balance: Vec<usize>,
    #[serde(default, rename = "cashFlow")]
    pub cash_flow: Vec<usize>,
}

impl PageMap {
    /// The page list for one statement kind.
    pub fn pages(&self, kind: StatementKind) -> &[usize] {
        match kind {
            StatementKind::Income => &self.income,
            StatementKind::Balance => &self.balance,
            StatementKind::CashFlow => &self.cash_flow,
        }
    }

    /// True when no kind has any pages at all.
    pub fn is_empty(&self) -> bool {
        self.income.is_empty() && self.balance.is_empty() && self.cash_flow.is_empty()
    }
}

/// A single named column of cell values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    pub values: Vec<String>,
}

/// A rectangular reconciled table: ordered columns of equal-length value
/// lists.
///
/// The first column is always `Category` when present; the remaining columns
/// are fiscal-year labels in the order the model produced them. The equal-
/// length invariant is established by
/// [`crate::pipeline::normalize::normalize_columns`] and is required before
/// the table can be written as a worksheet.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconciledTable {
    pub columns: Vec<Column>,
}

/// The reserved column key holding line-item names.
pub const CATEGORY_COLUMN: &str = "Category";

impl ReconciledTable {
    /// A table with no columns at all — the result of a skipped or failed
    /// statement.
    pub fn empty() -> Self {
        Self {
            columns: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Number of data rows (0 for an empty table).
    pub fn row_count(&self) -> usize {
        self.columns.first().map(|c| c.values.len()).unwrap_or(0)
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Look up a column by name.
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sheet_names_are_fixed() {
        assert_eq!(StatementKind::Income.sheet_name(), "Income Statement");
        assert_eq!(StatementKind::Balance.sheet_name(), "Balance Sheet");
        assert_eq!(StatementKind::CashFlow.sheet_name(), "Cash Flow Statement");
    }

    #[test]
    fn page_map_json_uses_camel_case_cash_flow() {
        let map: PageMap = serde_json::from_str(r#"{"income": [3, 4], "cashFlow": [9]}"#).unwrap();
        assert_eq!(map.pages(StatementKind::Income), &[3, 4]);
        assert_eq!(map.pages(StatementKind::Balance), &[] as &[usize]);
        assert_eq!(map.pages(StatementKind::CashFlow), &[9]);

        let json = serde_json::to_string(&map).unwrap();
        assert!(json.contains("cashFlow"), "got: {json}");
    }

    #[test]
    fn page_map_empty_detection() {
        assert!(PageMap::default().is_empty());
        let map = PageMap {
            balance: vec![7],
            ..Default::default()
        };
        assert!(!map.is_empty());
    }

    #[test]
    fn empty_table_has_zero_rows_and_columns() {
        let t = ReconciledTable::empty();
        assert!(t.is_empty());
        assert_eq!(t.row_count(), 0);
        assert_eq!(t.column_count(), 0);
    }

    #[test]
    fn column_lookup_by_name() {
        let t = ReconciledTable {
            columns: vec![
                Column {
                    name: CATEGORY_COLUMN.into(),
                    values: vec!["Cash".into()],
                },
                Column {
                    name: "2022".into(),
                    values: vec!["50".into()],
                },
            ],
        };
        assert_eq!(t.column("2022").unwrap().values, vec!["50"]);
        assert!(t.column("2021").is_none());
        assert_eq!(t.row_count(), 1);
    }
}

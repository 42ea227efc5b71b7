//! Prompts for LLM-driven statement reconciliation.
//!
//! Centralising every prompt here serves two purposes:
//!
//! 1. **Single source of truth** — changing the reconciliation contract (e.g.
//!    the placeholder token or the output fence) requires editing exactly one
//!    place.
//!
//! 2. **Testability** — unit tests can import and compose prompts directly
//!    without spinning up a real provider, making prompt regressions easy to
//!    catch.
//!
//! Callers can override both texts via
//! [`crate::config::ReconcileConfig::system_prompt`] and
//! [`crate::config::ReconcileConfig::user_template`]; the constants here are
//! used only when no override is provided.

use crate::error::StatementError;

/// Placeholder in the user template replaced with the filing's page text.
pub const PDF_MARKER: &str = "{pdf_data}";

/// Placeholder in the user template replaced with the workbook sheet text.
pub const EXCEL_MARKER: &str = "{excel_data}";

/// Default system prompt framing the reconciliation task.
///
/// Used when `ReconcileConfig::system_prompt` is `None`.
pub const DEFAULT_SYSTEM_PROMPT: &str = r#"You are an expert financial analyst. Your task is to reconcile a financial statement that appears in two sources: the text of a company's PDF filing and a worksheet from an Excel workbook covering the same statement.

Follow these rules precisely:

1. MERGING
   - Produce one merged table covering every fiscal year that appears in EITHER source
   - Where both sources report a value for the same line item and year, use the Excel value
   - Where only one source reports a value, use that value
   - Where neither source reports a value for a year the table covers, use the string "NA"

2. LINE ITEMS
   - Keep the line-item names and their order from the Excel worksheet
   - Append line items that appear only in the PDF after the Excel ones, in PDF order
   - Do not invent, merge, or rename line items

3. VALUES
   - Copy numbers exactly as reported; do not rescale, round, or recompute
   - Keep negative values negative (parenthesised values are negative)
   - Do not compute totals or subtotals that neither source reports

4. OUTPUT FORMAT
   - Output ONLY a single fenced code block tagged json
   - The block must contain one JSON object mapping column names to value arrays
   - The first key must be "Category" holding the line-item names
   - Every other key is a fiscal-year label, in chronological order
   - Every array must have one entry per line item
   - Do NOT add commentary before or after the block"#;

/// Default user-prompt template.
///
/// Both [`PDF_MARKER`] and [`EXCEL_MARKER`] must be present; they are
/// substituted with the source texts by [`compose_prompt`].
pub const DEFAULT_USER_TEMPLATE: &str = r#"Reconcile the financial statement below.

PDF filing text:
"""
{pdf_data}
"""

Excel worksheet:
"""
{excel_data}
"""

Reply with the single fenced json block described in your instructions."#;

/// Substitute the source texts into a user-prompt template.
///
/// Each marker is replaced exactly once, located by its position in the
/// template *before* any substitution, so source text that happens to
/// contain a marker string cannot trigger a second expansion. A template
/// missing either marker yields [`StatementError::Template`].
pub fn compose_prompt(
    template: &str,
    pdf_text: &str,
    excel_text: &str,
) -> Result<String, StatementError> {
    let missing = |marker: &str| StatementError::Template {
        marker: marker.to_string(),
    };
    let pdf_pos = template.find(PDF_MARKER).ok_or_else(|| missing(PDF_MARKER))?;
    let excel_pos = template
        .find(EXCEL_MARKER)
        .ok_or_else(|| missing(EXCEL_MARKER))?;

    let (first_pos, first_marker, first_text, second_marker, second_text) = if pdf_pos < excel_pos {
        (pdf_pos, PDF_MARKER, pdf_text, EXCEL_MARKER, excel_text)
    } else {
        (excel_pos, EXCEL_MARKER, excel_text, PDF_MARKER, pdf_text)
    };

    let head = &template[..first_pos];
    let tail = &template[first_pos + first_marker.len()..];
    let second_pos = tail
        .find(second_marker)
        .ok_or_else(|| missing(second_marker))?;

    let mut out = String::with_capacity(template.len() + pdf_text.len() + excel_text.len());
    out.push_str(head);
    out.push_str(first_text);
    out.push_str(&tail[..second_pos]);
    out.push_str(second_text);
    out.push_str(&tail[second_pos + second_marker.len()..]);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_template_carries_both_markers() {
        assert!(DEFAULT_USER_TEMPLATE.contains(PDF_MARKER));
        assert!(DEFAULT_USER_TEMPLATE.contains(EXCEL_MARKER));
    }

    #[test]
    fn compose_substitutes_both_sources() {
        let out = compose_prompt(DEFAULT_USER_TEMPLATE, "PDF TEXT", "EXCEL TEXT").unwrap();
        assert!(out.contains("PDF TEXT"));
        assert!(out.contains("EXCEL TEXT"));
        assert!(!out.contains(PDF_MARKER));
        assert!(!out.contains(EXCEL_MARKER));
    }

    #[test]
    fn missing_marker_is_a_template_error() {
        let err = compose_prompt("no markers at all", "p", "e").unwrap_err();
        assert!(matches!(err, StatementError::Template { marker } if marker == PDF_MARKER));

        let err = compose_prompt("{pdf_data} only", "p", "e").unwrap_err();
        assert!(matches!(err, StatementError::Template { marker } if marker == EXCEL_MARKER));
    }

    #[test]
    fn markers_are_substituted_exactly_once() {
        // Source text containing a marker string must not be re-expanded.
        let out = compose_prompt(
            "{pdf_data}\n{excel_data}",
            "pdf says {excel_data}",
            "excel cells",
        )
        .unwrap();
        assert!(out.contains("pdf says {excel_data}"));
        assert_eq!(out.matches("excel cells").count(), 1);
    }
}

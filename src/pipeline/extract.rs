//! Reply parsing: pull the fenced JSON block out of the model reply.
//!
//! The reconciliation prompt asks for exactly one fenced block tagged
//! `json` holding a column-name → value-array object. Models occasionally
//! wrap it in prose, use a bare fence, or emit broken JSON; this stage
//! degrades instead of failing — a reply that cannot be parsed yields an
//! empty mapping plus a diagnostic, so the statement still produces its
//! (empty) worksheet and the other statements are untouched.

use crate::error::StatementError;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};
use tracing::{debug, warn};

/// First fenced code block, tag optional. `(?s)` lets the body span lines;
/// lazy `.*?` stops at the first closing fence. Line breaks match with or
/// without a carriage return, since some providers reply with CRLF.
static FENCED_BLOCK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)```(?:json)?[ \t]*\r?\n(.*?)\r?\n[ \t]*```").expect("fence regex is valid")
});

/// Extract the column mapping from a model reply.
///
/// Returns the mapping (insertion-ordered) and, when the reply deviated
/// from the contract, the diagnostic describing how. Never returns `Err`:
/// a malformed reply is a degradation, not a statement failure.
pub fn extract_columns(reply: &str) -> (Map<String, Value>, Option<StatementError>) {
    let body = match FENCED_BLOCK.captures(reply) {
        Some(caps) => caps.get(1).map(|m| m.as_str()).unwrap_or(""),
        None => {
            warn!("model reply carries no fenced block ({} chars)", reply.len());
            return (Map::new(), Some(StatementError::NoStructuredBlock));
        }
    };

    match serde_json::from_str::<Value>(body) {
        Ok(Value::Object(map)) => {
            debug!("extracted {} columns from reply", map.len());
            (map, None)
        }
        Ok(other) => {
            warn!("fenced block is not a JSON object");
            (
                Map::new(),
                Some(StatementError::Malformed {
                    detail: format!("expected a JSON object, got {}", json_kind(&other)),
                }),
            )
        }
        Err(e) => {
            warn!("fenced block is not valid JSON: {}", e);
            (
                Map::new(),
                Some(StatementError::Malformed {
                    detail: e.to_string(),
                }),
            )
        }
    }
}

fn json_kind(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

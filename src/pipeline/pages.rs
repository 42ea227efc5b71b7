//! Page selection and text extraction via pdfium.
//!
//! ## Why spawn_blocking?
//!
//! The `pdfium-render` crate wraps the pdfium C++ library, which uses
//! thread-local state internally and is not safe to call from async contexts.
//! `tokio::task::spawn_blocking` moves the work onto a dedicated thread pool
//! thread designed for blocking operations, preventing the Tokio worker
//! threads from stalling during CPU-heavy extraction.
//!
//! ## Why copy into an excerpt document?
//!
//! Each statement reads a handful of pages out of a filing that can run to
//! hundreds. Copying the selected pages into a fresh in-memory document
//! scopes all further work to exactly those pages, and the excerpt is
//! dropped when the blocking closure returns, on success and on every error
//! path alike.

use crate::error::StatementError;
use pdfium_render::prelude::*;
use std::path::Path;
use tracing::{debug, warn};

/// Extract the text of the selected pages, in the requested order.
///
/// `requested` holds 1-indexed page numbers. Out-of-range entries are
/// dropped with a warning; duplicates and arbitrary order are honoured as
/// given, since callers may deliberately read a continuation page before
/// the statement's first page. If no requested page falls inside the
/// document the selection is invalid.
pub async fn extract_pages_text(
    pdf_path: &Path,
    requested: &[usize],
) -> Result<String, StatementError> {
    let path = pdf_path.to_path_buf();
    let pages = requested.to_vec();

    tokio::task::spawn_blocking(move || extract_pages_blocking(&path, &pages))
        .await
        .map_err(|e| StatementError::Conversion {
            detail: format!("Extraction task panicked: {}", e),
        })?
}

/// Map 1-indexed page numbers onto in-range 0-based indices, keeping the
/// requested order.
fn select_indices(requested: &[usize], total_pages: usize) -> Vec<u16> {
    requested
        .iter()
        .filter_map(|&p| {
            if p >= 1 && p <= total_pages {
                Some((p - 1) as u16)
            } else {
                warn!("Skipping page {} (out of range, total={})", p, total_pages);
                None
            }
        })
        .collect()
}

/// Blocking implementation of page-text extraction.
fn extract_pages_blocking(pdf_path: &Path, requested: &[usize]) -> Result<String, StatementError> {
    if requested.is_empty() {
        return Err(StatementError::InvalidPageSelection {
            detail: "no pages requested".to_string(),
        });
    }

    let pdfium = Pdfium::default();

    let document = pdfium.load_pdf_from_file(pdf_path, None).map_err(|e| {
        StatementError::SourceUnavailable {
            detail: format!("{:?}", e),
        }
    })?;

    let total_pages = document.pages().len() as usize;
    debug!("PDF loaded: {} pages", total_pages);

    let indices = select_indices(requested, total_pages);
    if indices.is_empty() {
        return Err(StatementError::InvalidPageSelection {
            detail: format!(
                "no requested page falls within 1..={} (requested {:?})",
                total_pages, requested
            ),
        });
    }

    let mut excerpt = pdfium
        .create_new_pdf()
        .map_err(|e| StatementError::Conversion {
            detail: format!("{:?}", e),
        })?;

    for (dest, &src) in indices.iter().enumerate() {
        excerpt
            .pages_mut()
            .copy_page_from_document(&document, src, dest as u16)
            .map_err(|e| StatementError::Conversion {
                detail: format!("copying page {}: {:?}", src as usize + 1, e),
            })?;
    }

    let mut parts = Vec::with_capacity(indices.len());
    for page in excerpt.pages().iter() {
        let text = page
            .text()
            .map_err(|e| StatementError::Conversion {
                detail: format!("{:?}", e),
            })?
            .all();
        parts.push(text);
    }

    let combined = parts.join("\n\n").trim().to_string();
    if combined.is_empty() {
        return Err(StatementError::Conversion {
            detail: "selected pages contain no extractable text".to_string(),
        });
    }

    debug!(
        "Extracted {} chars from {} pages",
        combined.len(),
        indices.len()
    );

    Ok(combined)
}

//! Input resolution: normalise a user-supplied path or URL to a local file.
//!
//! ## Why download to a temp file?
//!
//! pdfium requires a file-system path — it cannot stream from a byte buffer.
//! Downloading to a `TempDir` gives us a path pdfium can open while ensuring
//! cleanup happens automatically when `ResolvedInput` is dropped, even if
//! the process panics. We validate the PDF magic bytes (`%PDF`) before
//! returning so callers get a meaningful error rather than a pdfium crash.
//!
//! The source workbook is always a local path; [`validate_workbook`] checks
//! it opens before any completion tokens are spent.

use crate::error::ReconError;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tracing::{debug, info};

/// The resolved filing — either a local path or a downloaded temp file.
#[derive(Debug)]
pub enum ResolvedInput {
    /// Input was already a local file.
    Local(PathBuf),
    /// Input was a URL; PDF downloaded to a temp directory.
    /// The `TempDir` is kept alive to prevent cleanup until the run completes.
    Downloaded { path: PathBuf, _temp_dir: TempDir },
}

impl ResolvedInput {
    /// Get the path to the PDF file regardless of how it was resolved.
    pub fn path(&self) -> &Path {
        match self {
            ResolvedInput::Local(p) => p,
            ResolvedInput::Downloaded { path, .. } => path,
        }
    }
}

/// Check if the input string looks like a URL.
pub fn is_url(input: &str) -> bool {
    input.starts_with("http://") || input.starts_with("https://")
}

/// Resolve the filing input string to a local PDF file path.
///
/// If the input is a URL, download it to a temporary directory.
/// If the input is a local file, validate it exists and is readable.
pub async fn resolve_input(input: &str, timeout_secs: u64) -> Result<ResolvedInput, ReconError> {
    if is_url(input) {
        download_url(input, timeout_secs).await
    } else {
        resolve_local(input)
    }
}

/// Check that the source workbook exists and opens as a spreadsheet.
///
/// Every statement kind reads from this one workbook, so an unopenable file
/// is a run-level failure and is caught up front.
pub fn validate_workbook(path: &Path) -> Result<(), ReconError> {
    if !path.exists() {
        return Err(ReconError::FileNotFound {
            path: path.to_path_buf(),
        });
    }
    calamine::open_workbook_auto(path)
        .map(|_| ())
        .map_err(|e| ReconError::SourceUnavailable {
            path: path.to_path_buf(),
            detail: e.to_string(),
        })
}

/// Reject byte content that does not open with the PDF magic bytes.
///
/// Shared by the local and download paths; a filing shorter than four bytes
/// is left for pdfium to reject with its own diagnostics.
fn check_pdf_magic(path: &Path, head: &[u8]) -> Result<(), ReconError> {
    if head.len() >= 4 && &head[..4] != b"%PDF" {
        let mut magic = [0u8; 4];
        magic.copy_from_slice(&head[..4]);
        return Err(ReconError::NotAPdf {
            path: path.to_path_buf(),
            magic,
        });
    }
    Ok(())
}

/// Resolve a local file path, validating existence and PDF magic bytes.
fn resolve_local(path_str: &str) -> Result<ResolvedInput, ReconError> {
    let path = PathBuf::from(path_str);

    if !path.exists() {
        return Err(ReconError::FileNotFound { path });
    }

    // Opening doubles as the read-permission check.
    let head = match std::fs::File::open(&path) {
        Ok(mut f) => {
            use std::io::Read;
            let mut head = [0u8; 4];
            let n = f.read(&mut head).unwrap_or(0);
            head[..n].to_vec()
        }
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
            return Err(ReconError::PermissionDenied { path });
        }
        Err(_) => {
            return Err(ReconError::FileNotFound { path });
        }
    };
    check_pdf_magic(&path, &head)?;

    debug!("Resolved local PDF: {}", path.display());
    Ok(ResolvedInput::Local(path))
}

/// Download a URL to a temporary directory and return the path.
async fn download_url(url: &str, timeout_secs: u64) -> Result<ResolvedInput, ReconError> {
    info!("Downloading PDF from: {}", url);

    let client = reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| ReconError::DownloadFailed {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

    let response = client.get(url).send().await.map_err(|e| {
        if e.is_timeout() {
            ReconError::DownloadTimeout {
                url: url.to_string(),
                secs: timeout_secs,
            }
        } else {
            ReconError::DownloadFailed {
                url: url.to_string(),
                reason: e.to_string(),
            }
        }
    })?;

    if !response.status().is_success() {
        return Err(ReconError::DownloadFailed {
            url: url.to_string(),
            reason: format!("HTTP {}", response.status()),
        });
    }

    let bytes = response
        .bytes()
        .await
        .map_err(|e| ReconError::DownloadFailed {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

    let temp_dir = TempDir::new().map_err(|e| ReconError::Internal(e.to_string()))?;
    let file_path = temp_dir.path().join(extract_filename(url));

    // Rejecting non-PDF content before touching disk keeps the tempdir
    // free of half-resolved downloads.
    check_pdf_magic(&file_path, &bytes)?;

    tokio::fs::write(&file_path, &bytes)
        .await
        .map_err(|e| ReconError::Internal(format!("Failed to write temp file: {}", e)))?;

    info!("Downloaded to: {}", file_path.display());

    Ok(ResolvedInput::Downloaded {
        path: file_path,
        _temp_dir: temp_dir,
    })
}

/// Extract a reasonable filename from the URL path.
fn extract_filename(url: &str) -> String {
    if let Ok(parsed) = reqwest::Url::parse(url) {
        if let Some(mut segments) = parsed.path_segments() {
            if let Some(last) = segments.next_back() {
                if !last.is_empty() && last.contains('.') {
                    return last.to_string();
                }
            }
        }
    }

    "downloaded.pdf".to_string()
}

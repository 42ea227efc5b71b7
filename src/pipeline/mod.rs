//! Pipeline stages for statement reconciliation.
//!
//! Each submodule implements exactly one transformation step.
//! Keeping stages separate makes each independently testable and lets us
//! swap implementations (e.g. switch the spreadsheet backend) without
//! touching other stages.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ pages ──▶ sheet ──▶ llm ──▶ extract ──▶ normalize ──▶ workbook
//! (URL/path) (pdfium) (calamine) (LLM)   (fence)    (rectangle)   (xlsx)
//! ```
//!
//! 1. [`input`]     — canonicalise the user-supplied path or URL to a local
//!    file and validate the source workbook
//! 2. [`pages`]     — extract the selected pages' text; runs in
//!    `spawn_blocking` because pdfium is not async-safe
//! 3. [`sheet`]     — render one worksheet as tab-separated text
//! 4. [`llm`]       — drive the completion call with retry/backoff; the only
//!    stage with network I/O
//! 5. [`extract`]   — pull the fenced JSON block out of the model reply
//! 6. [`normalize`] — turn the raw column mapping into a rectangular table
//! 7. [`workbook`]  — write all statement tables into one output workbook

pub mod extract;
pub mod input;
pub mod llm;
pub mod normalize;
pub mod pages;
pub mod sheet;
pub mod workbook;

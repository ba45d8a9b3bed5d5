//! # pdf-outline
//!
//! Recover a document title and an H1/H2/H3 outline from PDF files using
//! layout heuristics only: positions, font sizes and text patterns. No
//! machine-learning model and no network access are involved.
//!
//! ## Why heuristics?
//!
//! PDFs rarely carry a usable structure tree, and embedded bookmarks are
//! missing or wrong more often than not. Visual layout, however, is always
//! there: headings are larger, set apart vertically, aligned on a left edge
//! and short. This crate turns that layout into an outline, with every
//! spacing threshold derived from the document itself rather than hard-coded.
//!
//! ## Pipeline Overview
//!
//! ```text
//! PDF
//!  │
//!  ├─ 1. Decode     spans + table boxes per page via pdfium (spawn_blocking)
//!  ├─ 2. Assemble   virtual lines, table exclusion     ┐ phase 1, per page
//!  ├─ 3. OCR        broken pages only (tesseract)      ┘
//!  ├─ 4. Calibrate  document-wide spacing/font modes      (barrier)
//!  ├─ 5. Merge      row stitch + block merge             phase 2, per page
//!  ├─ 6. Rank       global font statistics, noise filters (barrier)
//!  └─ 7. Polish     adjacent merge, repetition filter, level consistency
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pdf_outline::{extract_outline, OutlineConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = OutlineConfig::default();
//!     let output = extract_outline("document.pdf", &config).await?;
//!     println!("{}", output.outline.to_json()?);
//!     eprintln!("{} headings from {} pages",
//!         output.stats.outline_entries,
//!         output.stats.total_pages);
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `pdf-outline` binary (clap + anyhow + indicatif + tracing-subscriber) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! pdf-outline = { version = "0.1", default-features = false }
//! ```
//!
//! ## Runtime requirements
//!
//! - the pdfium shared library (next to the binary, installed system-wide, or
//!   named by `PDFIUM_LIB_PATH`)
//! - optionally the `tesseract` binary on `PATH`, used only for pages whose
//!   text layer is unusable

// ── Modules ──────────────────────────────────────────────────────────────

pub mod batch;
pub mod config;
pub mod convert;
pub mod error;
pub mod layout;
pub mod output;
pub mod pipeline;
pub mod progress;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use batch::{
    discover_pdfs, process_directory, resolve_dirs, BatchDirs, BatchReport, DocumentFailure, DocumentSuccess,
};
pub use config::{LeaderCheck, OutlineConfig, OutlineConfigBuilder, SpacingRepair, TableCaptionRule};
pub use convert::{
    extract_outline, extract_outline_from_bytes, extract_outline_sync, extract_outline_to_file, write_outline,
    OutlineExtractor,
};
pub use error::OutlineError;
pub use layout::{HeadingLevel, Thresholds};
pub use output::{ExtractionStats, Outline, OutlineEntry, OutlineOutput};
pub use pipeline::engine::{PdfEngine, PdfiumEngine};
pub use pipeline::ocr::{OcrEngine, OcrWord};
pub use pipeline::tesseract::TesseractEngine;
pub use progress::{NoopProgressCallback, OutlineProgressCallback, ProgressCallback};

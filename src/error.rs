//! Error types for the pdf-outline library.
//!
//! A single [`OutlineError`] covers every way one document can fail. There is
//! no per-page error type: a page that cannot be assembled,
//! OCR'd, or merged fails the whole document, because both global steps of
//! the pipeline (threshold calibration and heading ranking) need every page.
//!
//! Batch callers absorb failures one level up: [`crate::batch`] records each
//! failed document as a [`crate::batch::DocumentFailure`] and keeps going.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the pdf-outline library.
#[derive(Debug, Error)]
pub enum OutlineError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("PDF file not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The file exists and was read, but is not a PDF.
    #[error("File is not a valid PDF: '{path}'\nFirst bytes: {magic:?}")]
    NotAPdf { path: PathBuf, magic: [u8; 4] },

    // ── PDF errors ────────────────────────────────────────────────────────
    /// PDF header/trailer/xref is corrupt and cannot be parsed.
    #[error("PDF '{path}' is corrupt: {detail}\nTry repairing with: qpdf --decrypt input.pdf output.pdf")]
    CorruptPdf { path: PathBuf, detail: String },

    /// PDF requires a password but none was provided.
    #[error("PDF '{path}' is encrypted and requires a password.\nProvide it with --password <PASSWORD>.")]
    PasswordRequired { path: PathBuf },

    /// A password was provided but it is wrong.
    #[error("Wrong password for PDF '{path}'")]
    WrongPassword { path: PathBuf },

    /// The PDF engine could not decode the text of a page.
    #[error("Text extraction failed for page {page}: {detail}")]
    PageExtractionFailed { page: usize, detail: String },

    /// pdfium-render returned an error while rasterising a page for OCR.
    #[error("Rasterisation failed for page {page}: {detail}")]
    RasterisationFailed { page: usize, detail: String },

    /// Could not bind to a pdfium library.
    #[error(
        "Failed to bind to pdfium library: {0}\n\n\
PDFium must be available as a shared library. You can:\n\
  • Place libpdfium next to the binary (./libpdfium.so, ./libpdfium.dylib, ./pdfium.dll).\n\
  • Install it system-wide so the dynamic loader can find it.\n\
  • Set PDFIUM_LIB_PATH=/path/to/libpdfium.\n"
    )]
    PdfiumBindingFailed(String),

    // ── OCR errors ────────────────────────────────────────────────────────
    /// OCR is required but the engine cannot be used on this machine.
    #[error("OCR engine '{engine}' is not available.\n{hint}")]
    OcrEngineUnavailable { engine: String, hint: String },

    /// The OCR engine ran but failed on a page.
    #[error("OCR failed for page {page}: {detail}")]
    OcrFailed { page: usize, detail: String },

    // ── Pipeline errors ───────────────────────────────────────────────────
    /// A per-page worker failed; the whole document is abandoned.
    #[error("{phase} phase failed on page {page}: {detail}")]
    PhaseFailed {
        phase: String,
        page: usize,
        detail: String,
    },

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create or write the output JSON file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A batch input or output directory could not be read or created.
    #[error("Cannot use directory '{path}': {source}")]
    BatchDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

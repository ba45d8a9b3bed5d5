//! Document-level entry points.
//!
//! [`OutlineExtractor`] owns the engines and the config and runs the whole
//! pipeline for one document at a time:
//!
//! 1. validate the path, decode every page (blocking thread)
//! 2. phase 1 per page: line assembly, broken-text check, OCR
//! 3. calibrate thresholds over all pages
//! 4. phase 2 per page: fragment merging
//! 5. rank all candidates, post-process into an [`Outline`]
//!
//! The free functions ([`extract_outline`] and friends) build a default
//! extractor from an [`OutlineConfig`] for one-off use. Reuse an extractor
//! when processing many documents so the OCR engine is located only once.

use crate::config::OutlineConfig;
use crate::error::OutlineError;
use crate::layout::{PageLayout, RawLine};
use crate::output::{ExtractionStats, Outline, OutlineOutput};
use crate::pipeline::assemble::assemble_page;
use crate::pipeline::calibrate::calibrate;
use crate::pipeline::engine::{PdfEngine, PdfiumEngine};
use crate::pipeline::input;
use crate::pipeline::merge::merge_page;
use crate::pipeline::ocr::{is_broken_page, words_to_lines, OcrEngine};
use crate::pipeline::phase::{run_phase, Phase};
use crate::pipeline::postprocess::build_outline;
use crate::pipeline::rank::rank_headings;
use crate::pipeline::tesseract::TesseractEngine;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Runs the outline pipeline with a fixed PDF engine, optional OCR engine and
/// config.
#[derive(Clone)]
pub struct OutlineExtractor {
    engine: Arc<dyn PdfEngine>,
    ocr: Option<Arc<dyn OcrEngine>>,
    config: OutlineConfig,
}

impl OutlineExtractor {
    /// pdfium-backed extractor. When OCR is enabled, `tesseract` is looked up
    /// on `PATH`; if it is missing a warning is logged and broken pages keep
    /// their native text.
    pub fn new(config: OutlineConfig) -> Self {
        let engine = Arc::new(PdfiumEngine::new(config.pdfium_library_path.clone()));
        let ocr: Option<Arc<dyn OcrEngine>> = if config.enable_ocr {
            match TesseractEngine::locate() {
                Ok(engine) => Some(Arc::new(engine)),
                Err(e) => {
                    warn!("OCR disabled: {}", e);
                    None
                }
            }
        } else {
            None
        };
        Self { engine, ocr, config }
    }

    /// Extractor over a caller-supplied PDF engine, without OCR.
    pub fn with_engine(engine: Arc<dyn PdfEngine>, config: OutlineConfig) -> Self {
        Self {
            engine,
            ocr: None,
            config,
        }
    }

    /// Use `ocr` for broken pages. Ignored when `enable_ocr` is off.
    pub fn with_ocr(mut self, ocr: Arc<dyn OcrEngine>) -> Self {
        self.ocr = Some(ocr);
        self
    }

    pub fn config(&self) -> &OutlineConfig {
        &self.config
    }

    /// Extract the outline of one PDF.
    ///
    /// Fires `on_document_start` and then either `on_document_complete` or
    /// `on_document_error` on the configured progress callback.
    pub async fn extract(&self, path: impl AsRef<Path>) -> Result<OutlineOutput, OutlineError> {
        let path = path.as_ref();
        let name = document_name(path);
        let cb = self.config.progress_callback.as_ref();
        if let Some(cb) = cb {
            cb.on_document_start(&name);
        }

        let result = self.run(path).await;
        if let Some(cb) = cb {
            match &result {
                Ok(out) => cb.on_document_complete(&name, out.outline.outline.len(), out.stats.duration_ms),
                Err(e) => cb.on_document_error(&name, &e.to_string()),
            }
        }
        result
    }

    async fn run(&self, path: &Path) -> Result<OutlineOutput, OutlineError> {
        let start = Instant::now();
        let path = input::validate_pdf_path(path)?;
        info!("Extracting outline: {}", path.display());

        // ── Decode ───────────────────────────────────────────────────────────
        let layouts = {
            let engine = Arc::clone(&self.engine);
            let path = path.clone();
            let password = self.config.password.clone();
            tokio::task::spawn_blocking(move || engine.extract_pages(&path, password.as_deref()))
                .await
                .map_err(|e| OutlineError::Internal(format!("Extraction task panicked: {}", e)))??
        };
        let total_pages = layouts.len();

        // ── Phase 1: assemble + OCR ──────────────────────────────────────────
        let ctx = Arc::new(PageContext {
            engine: Arc::clone(&self.engine),
            ocr: self.ocr.clone().filter(|_| self.config.enable_ocr),
            path,
            config: self.config.clone(),
        });
        let items: Vec<(usize, PageLayout)> = layouts.into_iter().map(|l| (l.page_number(), l)).collect();
        let assembled = run_phase(Phase::Assemble, items, self.config.concurrency, move |layout| {
            ctx.assemble(layout)
        })
        .await?;

        let ocr_pages = assembled.iter().filter(|p| p.ocr_used).count();
        let pages: Vec<Vec<RawLine>> = assembled.into_iter().map(|p| p.lines).collect();
        let raw_lines = pages.iter().map(Vec::len).sum();

        // ── Calibrate ────────────────────────────────────────────────────────
        let thresholds = calibrate(&pages, self.config.fallback_thresholds);

        // ── Phase 2: merge ───────────────────────────────────────────────────
        let items: Vec<(usize, Vec<RawLine>)> = pages.into_iter().enumerate().map(|(i, l)| (i + 1, l)).collect();
        let merge_config = self.config.clone();
        let merged = run_phase(Phase::Merge, items, self.config.concurrency, move |lines| {
            Ok(merge_page(&lines, &thresholds, &merge_config))
        })
        .await?;
        let candidates: Vec<_> = merged.into_iter().flatten().collect();

        // ── Rank + post-process ──────────────────────────────────────────────
        let ranked = rank_headings(&candidates, &self.config);
        let ranked_headings = ranked.len();
        let outline = build_outline(ranked, total_pages, &self.config);

        let stats = ExtractionStats {
            total_pages,
            ocr_pages,
            raw_lines,
            candidates: candidates.len(),
            ranked_headings,
            outline_entries: outline.outline.len(),
            thresholds,
            duration_ms: start.elapsed().as_millis() as u64,
        };
        info!(
            "Outline complete: {} entries from {} pages ({} OCR), {}ms",
            stats.outline_entries, total_pages, ocr_pages, stats.duration_ms
        );

        Ok(OutlineOutput { outline, stats })
    }
}

/// Everything a phase 1 worker needs, shared read-only across workers.
struct PageContext {
    engine: Arc<dyn PdfEngine>,
    ocr: Option<Arc<dyn OcrEngine>>,
    path: PathBuf,
    config: OutlineConfig,
}

struct AssembledPage {
    lines: Vec<RawLine>,
    ocr_used: bool,
}

impl PageContext {
    fn assemble(&self, layout: PageLayout) -> Result<AssembledPage, OutlineError> {
        let page = layout.page_number();
        let mut lines = assemble_page(&layout, &self.config);

        if !is_broken_page(&lines, self.config.min_alpha_ratio, self.config.max_digit_ratio) {
            return Ok(AssembledPage {
                lines,
                ocr_used: false,
            });
        }
        let Some(ocr) = &self.ocr else {
            debug!("Page {}: text looks broken but OCR is off", page);
            return Ok(AssembledPage {
                lines,
                ocr_used: false,
            });
        };

        let image = self.engine.render_page(
            &self.path,
            self.config.password.as_deref(),
            layout.index,
            self.config.dpi,
            self.config.max_rendered_pixels,
        )?;
        let words = ocr.recognize(&image, page)?;
        let ocr_lines = words_to_lines(&words, page);
        debug!(
            "Page {}: {} broken-text lines, {} OCR lines via {}",
            page,
            lines.len(),
            ocr_lines.len(),
            ocr.name()
        );
        lines.extend(ocr_lines);

        Ok(AssembledPage {
            lines,
            ocr_used: true,
        })
    }
}

/// Extract the outline of a PDF file.
///
/// This is the primary entry point for the library.
///
/// # Example
/// ```rust,no_run
/// use pdf_outline::{extract_outline, OutlineConfig};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let output = extract_outline("report.pdf", &OutlineConfig::default()).await?;
///     println!("{}", output.outline.to_json()?);
///     Ok(())
/// }
/// ```
pub async fn extract_outline(
    path: impl AsRef<Path>,
    config: &OutlineConfig,
) -> Result<OutlineOutput, OutlineError> {
    OutlineExtractor::new(config.clone()).extract(path).await
}

/// Synchronous wrapper around [`extract_outline`].
///
/// Creates a temporary tokio runtime internally.
pub fn extract_outline_sync(
    path: impl AsRef<Path>,
    config: &OutlineConfig,
) -> Result<OutlineOutput, OutlineError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| OutlineError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(extract_outline(path, config))
}

/// Extract an outline and write it as JSON to `output_path`.
pub async fn extract_outline_to_file(
    path: impl AsRef<Path>,
    output_path: impl AsRef<Path>,
    config: &OutlineConfig,
) -> Result<ExtractionStats, OutlineError> {
    let output = extract_outline(path, config).await?;
    write_outline(&output.outline, output_path.as_ref()).await?;
    Ok(output.stats)
}

/// Extract the outline of PDF bytes held in memory.
///
/// The bytes are written to a managed [`tempfile`] that is removed on return.
pub async fn extract_outline_from_bytes(
    bytes: &[u8],
    config: &OutlineConfig,
) -> Result<OutlineOutput, OutlineError> {
    let mut tmp = tempfile::Builder::new()
        .prefix("pdf-outline-")
        .suffix(".pdf")
        .tempfile()
        .map_err(|e| OutlineError::Internal(format!("tempfile: {e}")))?;
    tmp.write_all(bytes)
        .map_err(|e| OutlineError::Internal(format!("tempfile write: {e}")))?;
    // `tmp` is dropped (and the file deleted) when extraction returns
    extract_outline(tmp.path(), config).await
}

/// Write `outline` as pretty JSON plus a trailing newline.
///
/// Uses atomic write (temp file + rename) to prevent partial files.
pub async fn write_outline(outline: &Outline, path: &Path) -> Result<(), OutlineError> {
    let write_err = |e: std::io::Error| OutlineError::OutputWriteFailed {
        path: path.to_path_buf(),
        source: e,
    };

    let mut json = outline
        .to_json()
        .map_err(|e| OutlineError::Internal(format!("JSON encoding failed: {e}")))?;
    json.push('\n');

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await.map_err(write_err)?;
    }

    let tmp_path = path.with_extension("json.tmp");
    tokio::fs::write(&tmp_path, json).await.map_err(write_err)?;
    tokio::fs::rename(&tmp_path, path).await.map_err(write_err)?;
    debug!("Wrote {}", path.display());
    Ok(())
}

fn document_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::HeadingLevel;
    use crate::output::OutlineEntry;

    #[tokio::test]
    async fn write_outline_is_atomic_and_newline_terminated() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("doc.json");
        let outline = Outline {
            title: Some("Doc".into()),
            outline: vec![OutlineEntry {
                level: HeadingLevel::H1,
                text: "Scope".into(),
                page: 1,
            }],
        };
        write_outline(&outline, &path).await.unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.ends_with("}\n"));
        assert!(!dir.path().join("nested").join("doc.json.tmp").exists());
        let back: Outline = serde_json::from_str(&text).unwrap();
        assert_eq!(back, outline);
    }

    #[tokio::test]
    async fn missing_input_fails_before_pdfium() {
        let config = OutlineConfig::builder().enable_ocr(false).build().unwrap();
        let err = extract_outline("/no/such/file.pdf", &config).await.unwrap_err();
        assert!(matches!(err, OutlineError::FileNotFound { .. }));
    }

    #[tokio::test]
    async fn bytes_without_magic_are_rejected() {
        let config = OutlineConfig::builder().enable_ocr(false).build().unwrap();
        let err = extract_outline_from_bytes(b"hello world", &config)
            .await
            .unwrap_err();
        assert!(matches!(err, OutlineError::NotAPdf { .. }));
    }

    #[test]
    fn document_name_is_file_name() {
        assert_eq!(document_name(Path::new("/tmp/in/report.pdf")), "report.pdf");
    }
}

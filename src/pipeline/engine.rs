//! PDF engine: decode pages into positioned spans and render pages for OCR.
//!
//! ## Why a trait?
//!
//! Everything downstream of this module is pure layout arithmetic. Hiding
//! pdfium behind [`PdfEngine`] lets the whole pipeline run against in-memory
//! page layouts in tests, with no shared library installed.
//!
//! ## Why bind per call?
//!
//! pdfium keeps thread-local state and is not safe to share across the tokio
//! worker pool. Each call binds, opens the document, does its work on the
//! calling (blocking) thread and drops everything before returning.

use super::tables::{cluster_rows, detect_tables, TableDetectorConfig};
use crate::error::OutlineError;
use crate::layout::{BBox, PageLayout, Span, TextLine};
use image::DynamicImage;
use pdfium_render::prelude::*;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Spans whose vertical centres are this close (points) share a text row.
const ROW_TOLERANCE: f32 = 3.0;

/// PDF user-space units per inch.
const POINTS_PER_INCH: f32 = 72.0;

/// Source of page layouts and page bitmaps.
///
/// Both methods block; callers run them on a blocking thread.
pub trait PdfEngine: Send + Sync {
    /// Decode every page into rows of spans plus detected table boxes.
    /// Coordinates use a top-left origin.
    fn extract_pages(&self, path: &Path, password: Option<&str>) -> Result<Vec<PageLayout>, OutlineError>;

    /// Render one page (0-based `page_index`) at `dpi`, with the longest edge
    /// capped at `max_pixels`.
    fn render_page(
        &self,
        path: &Path,
        password: Option<&str>,
        page_index: usize,
        dpi: u32,
        max_pixels: u32,
    ) -> Result<DynamicImage, OutlineError>;
}

/// [`PdfEngine`] backed by the pdfium shared library.
#[derive(Debug, Clone, Default)]
pub struct PdfiumEngine {
    library_path: Option<PathBuf>,
    tables: TableDetectorConfig,
}

impl PdfiumEngine {
    /// `library_path` is a directory or file holding libpdfium. When `None`,
    /// `PDFIUM_LIB_PATH` is consulted, then `./`, then the system library.
    pub fn new(library_path: Option<PathBuf>) -> Self {
        Self {
            library_path,
            tables: TableDetectorConfig::default(),
        }
    }

    fn bind(&self) -> Result<Pdfium, OutlineError> {
        let explicit = self
            .library_path
            .clone()
            .or_else(|| std::env::var_os("PDFIUM_LIB_PATH").map(PathBuf::from));

        let bindings = match explicit {
            Some(path) => {
                let lib = if path.is_dir() {
                    Pdfium::pdfium_platform_library_name_at_path(&path)
                } else {
                    path
                };
                debug!("Binding pdfium at {}", lib.display());
                Pdfium::bind_to_library(&lib)
            }
            None => Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path("./"))
                .or_else(|_| Pdfium::bind_to_system_library()),
        }
        .map_err(|e| OutlineError::PdfiumBindingFailed(format!("{:?}", e)))?;

        Ok(Pdfium::new(bindings))
    }
}

impl PdfEngine for PdfiumEngine {
    fn extract_pages(&self, path: &Path, password: Option<&str>) -> Result<Vec<PageLayout>, OutlineError> {
        let pdfium = self.bind()?;
        let document = open_document(&pdfium, path, password)?;
        let pages = document.pages();
        let total_pages = pages.len() as usize;
        info!("PDF loaded: {} pages", total_pages);

        let mut layouts = Vec::with_capacity(total_pages);
        for (index, page) in pages.iter().enumerate() {
            let spans = page_spans(&page).map_err(|e| OutlineError::PageExtractionFailed {
                page: index + 1,
                detail: format!("{:?}", e),
            })?;

            let tables = detect_tables(&spans, &self.tables);
            let lines: Vec<TextLine> = cluster_rows(&spans, ROW_TOLERANCE)
                .into_iter()
                .map(|row| TextLine {
                    spans: row.into_iter().cloned().collect(),
                })
                .collect();

            debug!(
                "Page {}: {} spans, {} rows, {} tables",
                index + 1,
                spans.len(),
                lines.len(),
                tables.len()
            );
            layouts.push(PageLayout {
                index,
                width: page.width().value,
                height: page.height().value,
                lines,
                tables,
            });
        }

        Ok(layouts)
    }

    fn render_page(
        &self,
        path: &Path,
        password: Option<&str>,
        page_index: usize,
        dpi: u32,
        max_pixels: u32,
    ) -> Result<DynamicImage, OutlineError> {
        let raster_err = |detail: String| OutlineError::RasterisationFailed {
            page: page_index + 1,
            detail,
        };

        let index = pdfium_page_index(page_index)?;
        let pdfium = self.bind()?;
        let document = open_document(&pdfium, path, password)?;
        let page = document
            .pages()
            .get(index)
            .map_err(|e| raster_err(format!("{:?}", e)))?;

        let (width, height) = target_size(page.width().value, page.height().value, dpi, max_pixels);
        let render_config = PdfRenderConfig::new()
            .set_target_width(width)
            .set_maximum_height(height);

        let bitmap = page
            .render_with_config(&render_config)
            .map_err(|e| raster_err(format!("{:?}", e)))?;
        let image = bitmap.as_image();
        debug!(
            "Rendered page {} → {}x{} px",
            page_index + 1,
            image.width(),
            image.height()
        );
        Ok(image)
    }
}

fn open_document<'a>(
    pdfium: &'a Pdfium,
    path: &Path,
    password: Option<&'a str>,
) -> Result<PdfDocument<'a>, OutlineError> {
    pdfium.load_pdf_from_file(path, password).map_err(|e| {
        let err_str = format!("{:?}", e);
        if err_str.contains("Password") || err_str.contains("password") {
            if password.is_some() {
                OutlineError::WrongPassword {
                    path: path.to_path_buf(),
                }
            } else {
                OutlineError::PasswordRequired {
                    path: path.to_path_buf(),
                }
            }
        } else {
            OutlineError::CorruptPdf {
                path: path.to_path_buf(),
                detail: err_str,
            }
        }
    })
}

/// Every non-blank text segment of a page as a [`Span`] in top-left
/// coordinates. The font size is the scaled size of the segment's first
/// character, or the segment height when pdfium reports none.
fn page_spans(page: &PdfPage) -> Result<Vec<Span>, PdfiumError> {
    let page_height = page.height().value;
    let text = page.text()?;

    let mut spans = Vec::new();
    for segment in text.segments().iter() {
        let content = segment.text();
        if content.trim().is_empty() {
            continue;
        }

        let bounds = segment.bounds();
        let bbox = BBox::new(
            bounds.left().value,
            page_height - bounds.top().value,
            bounds.right().value,
            page_height - bounds.bottom().value,
        );

        let font_size = segment
            .chars()
            .ok()
            .and_then(|chars| chars.iter().next().map(|c| c.scaled_font_size().value))
            .filter(|size| *size > 0.0)
            .unwrap_or_else(|| bbox.height().max(1.0));

        spans.push(Span::new(content, bbox, font_size));
    }
    Ok(spans)
}

/// Pixel size for a page of `width`×`height` points at `dpi`, scaled down so
/// neither edge exceeds `max_pixels`.
fn target_size(width: f32, height: f32, dpi: u32, max_pixels: u32) -> (i32, i32) {
    let scale = dpi as f32 / POINTS_PER_INCH;
    let (w, h) = (width * scale, height * scale);
    let longest = w.max(h);
    let cap = if longest > max_pixels as f32 {
        max_pixels as f32 / longest
    } else {
        1.0
    };
    (
        ((w * cap).round() as i32).max(1),
        ((h * cap).round() as i32).max(1),
    )
}

/// pdfium addresses pages with a `u16`.
fn pdfium_page_index(page_index: usize) -> Result<u16, OutlineError> {
    u16::try_from(page_index).map_err(|_| OutlineError::RasterisationFailed {
        page: page_index + 1,
        detail: format!("page index {page_index} is beyond pdfium's {} page limit", u16::MAX),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn letter_page_at_150_dpi() {
        // 8.5in × 11in.
        assert_eq!(target_size(612.0, 792.0, 150, 2000), (1275, 1650));
    }

    #[test]
    fn longest_edge_is_capped() {
        let (w, h) = target_size(612.0, 792.0, 300, 2000);
        assert_eq!(h, 2000);
        assert!(w < 2000);
    }

    #[test]
    fn missing_library_is_binding_error() {
        let engine = PdfiumEngine::new(Some(PathBuf::from("/nonexistent/libpdfium.so")));
        let err = engine
            .extract_pages(Path::new("/nonexistent/file.pdf"), None)
            .unwrap_err();
        assert!(matches!(err, OutlineError::PdfiumBindingFailed(_)));
    }

    #[test]
    fn page_index_beyond_u16_is_rejected() {
        assert_eq!(pdfium_page_index(65_535).unwrap(), u16::MAX);
        let err = pdfium_page_index(65_536).unwrap_err();
        assert!(matches!(err, OutlineError::RasterisationFailed { page: 65_537, .. }));

        // Rejected before pdfium is even bound.
        let engine = PdfiumEngine::new(Some(PathBuf::from("/nonexistent/libpdfium.so")));
        let err = engine
            .render_page(Path::new("/nonexistent/file.pdf"), None, 70_000, 150, 2000)
            .unwrap_err();
        assert!(matches!(err, OutlineError::RasterisationFailed { page: 70_001, .. }));
    }
}

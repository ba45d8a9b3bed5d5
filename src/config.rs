//! Configuration types for outline extraction.
//!
//! Every heuristic constant the pipeline uses lives in [`OutlineConfig`], so
//! none of them is a magic number buried inside an algorithm. Defaults
//! reproduce the tuned behaviour; callers override only what they need via
//! [`OutlineConfigBuilder`].

use crate::error::OutlineError;
use crate::layout::Thresholds;
use crate::progress::ProgressCallback;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Configuration for one outline extraction run.
///
/// Built via [`OutlineConfig::builder()`] or using [`OutlineConfig::default()`].
///
/// # Example
/// ```rust
/// use pdf_outline::OutlineConfig;
///
/// let config = OutlineConfig::builder()
///     .concurrency(4)
///     .enable_ocr(false)
///     .repetition_threshold(0.8)
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct OutlineConfig {
    // ── Execution ────────────────────────────────────────────────────────
    /// Worker-pool size for the per-page phases. Default: 8.
    ///
    /// Pages are independent inside a phase, so this bounds how many run at
    /// once. OCR'd pages dominate wall-clock time; raise it on machines with
    /// many cores and heavily scanned inputs.
    pub concurrency: usize,

    /// Rendering DPI for pages routed to OCR. Range: 72–400. Default: 150.
    pub dpi: u32,

    /// Maximum rendered bitmap edge in pixels. Default: 2000.
    ///
    /// Caps memory on oversized pages independent of DPI.
    pub max_rendered_pixels: u32,

    /// PDF user password for encrypted documents.
    pub password: Option<String>,

    /// Explicit pdfium shared library. If None, tries `./` then the system loader.
    pub pdfium_library_path: Option<PathBuf>,

    /// Route broken pages through OCR. Default: true.
    ///
    /// When enabled but no OCR engine is installed, extraction logs a warning
    /// and continues with the native text only.
    pub enable_ocr: bool,

    // ── Line assembly ────────────────────────────────────────────────────
    /// Horizontal gap (layout units) that splits one physical row into
    /// separate virtual lines. Default: 50.
    pub virtual_line_gap: f32,

    /// Detected tables no taller than this are ignored. Default: 40.
    pub min_table_height: f32,

    /// Detected tables at least this fraction of the page width are ignored.
    /// Default: 0.98.
    pub max_table_width_ratio: f32,

    /// Which lines inside a table survive as captions/headers.
    pub table_caption: TableCaptionRule,

    // ── Broken-text detection ────────────────────────────────────────────
    /// Pages whose alphabetic ratio falls below this are broken. Default: 0.75.
    pub min_alpha_ratio: f32,

    /// Pages whose digit ratio exceeds this are broken. Default: 0.25.
    pub max_digit_ratio: f32,

    // ── Calibration & merging ────────────────────────────────────────────
    /// Used for each threshold whose sample set is empty. Default: (5, 5, 12).
    pub fallback_thresholds: Thresholds,

    /// Letter-spacing repair applied to raw lines before merging.
    pub spacing_repair: SpacingRepair,

    /// How stage-B block merging screens out leader lines.
    pub leader_check: LeaderCheck,

    // ── Ranking ──────────────────────────────────────────────────────────
    /// Candidates longer than this (chars) are body text. Default: 120.
    pub max_heading_chars: usize,

    /// Candidates with more words than this are body text. Default: 15.
    pub max_heading_words: usize,

    /// Candidates with fewer alphanumeric characters are dropped. Default: 3.
    pub min_meaningful_chars: usize,

    // ── Post-processing ──────────────────────────────────────────────────
    /// Fixed gap allowance for the adjacent-heading merge; half of it is
    /// added to the font size. Default: 5.
    pub adjacent_merge_gap: f32,

    /// Headings found on more than this fraction of pages are removed as
    /// running headers/footers. Default: 0.7.
    pub repetition_threshold: f32,

    /// Title emitted when no candidate qualifies. Default: "Untitled Document".
    /// `None` leaves the title `null`.
    pub fallback_title: Option<String>,

    /// Optional observer for batch/document events.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for OutlineConfig {
    fn default() -> Self {
        Self {
            concurrency: 8,
            dpi: 150,
            max_rendered_pixels: 2000,
            password: None,
            pdfium_library_path: None,
            enable_ocr: true,
            virtual_line_gap: 50.0,
            min_table_height: 40.0,
            max_table_width_ratio: 0.98,
            table_caption: TableCaptionRule::default(),
            min_alpha_ratio: 0.75,
            max_digit_ratio: 0.25,
            fallback_thresholds: Thresholds::default(),
            spacing_repair: SpacingRepair::default(),
            leader_check: LeaderCheck::default(),
            max_heading_chars: 120,
            max_heading_words: 15,
            min_meaningful_chars: 3,
            adjacent_merge_gap: 5.0,
            repetition_threshold: 0.7,
            fallback_title: Some("Untitled Document".to_string()),
            progress_callback: None,
        }
    }
}

impl fmt::Debug for OutlineConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OutlineConfig")
            .field("concurrency", &self.concurrency)
            .field("dpi", &self.dpi)
            .field("max_rendered_pixels", &self.max_rendered_pixels)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("pdfium_library_path", &self.pdfium_library_path)
            .field("enable_ocr", &self.enable_ocr)
            .field("virtual_line_gap", &self.virtual_line_gap)
            .field("min_table_height", &self.min_table_height)
            .field("max_table_width_ratio", &self.max_table_width_ratio)
            .field("table_caption", &self.table_caption)
            .field("min_alpha_ratio", &self.min_alpha_ratio)
            .field("max_digit_ratio", &self.max_digit_ratio)
            .field("fallback_thresholds", &self.fallback_thresholds)
            .field("spacing_repair", &self.spacing_repair)
            .field("leader_check", &self.leader_check)
            .field("max_heading_chars", &self.max_heading_chars)
            .field("max_heading_words", &self.max_heading_words)
            .field("min_meaningful_chars", &self.min_meaningful_chars)
            .field("adjacent_merge_gap", &self.adjacent_merge_gap)
            .field("repetition_threshold", &self.repetition_threshold)
            .field("fallback_title", &self.fallback_title)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<dyn OutlineProgressCallback>"),
            )
            .finish()
    }
}

impl OutlineConfig {
    /// Create a new builder for `OutlineConfig`.
    pub fn builder() -> OutlineConfigBuilder {
        OutlineConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`OutlineConfig`].
#[derive(Debug)]
pub struct OutlineConfigBuilder {
    config: OutlineConfig,
}

impl OutlineConfigBuilder {
    pub fn concurrency(mut self, n: usize) -> Self {
        self.config.concurrency = n.max(1);
        self
    }

    pub fn dpi(mut self, dpi: u32) -> Self {
        self.config.dpi = dpi.clamp(72, 400);
        self
    }

    pub fn max_rendered_pixels(mut self, px: u32) -> Self {
        self.config.max_rendered_pixels = px.max(100);
        self
    }

    pub fn password(mut self, pwd: impl Into<String>) -> Self {
        self.config.password = Some(pwd.into());
        self
    }

    pub fn pdfium_library_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.pdfium_library_path = Some(path.into());
        self
    }

    pub fn enable_ocr(mut self, v: bool) -> Self {
        self.config.enable_ocr = v;
        self
    }

    pub fn virtual_line_gap(mut self, gap: f32) -> Self {
        self.config.virtual_line_gap = gap;
        self
    }

    pub fn min_table_height(mut self, h: f32) -> Self {
        self.config.min_table_height = h;
        self
    }

    pub fn max_table_width_ratio(mut self, ratio: f32) -> Self {
        self.config.max_table_width_ratio = ratio;
        self
    }

    pub fn table_caption(mut self, rule: TableCaptionRule) -> Self {
        self.config.table_caption = rule;
        self
    }

    pub fn min_alpha_ratio(mut self, ratio: f32) -> Self {
        self.config.min_alpha_ratio = ratio;
        self
    }

    pub fn max_digit_ratio(mut self, ratio: f32) -> Self {
        self.config.max_digit_ratio = ratio;
        self
    }

    pub fn fallback_thresholds(mut self, t: Thresholds) -> Self {
        self.config.fallback_thresholds = t;
        self
    }

    pub fn spacing_repair(mut self, mode: SpacingRepair) -> Self {
        self.config.spacing_repair = mode;
        self
    }

    pub fn leader_check(mut self, mode: LeaderCheck) -> Self {
        self.config.leader_check = mode;
        self
    }

    pub fn max_heading_chars(mut self, n: usize) -> Self {
        self.config.max_heading_chars = n;
        self
    }

    pub fn max_heading_words(mut self, n: usize) -> Self {
        self.config.max_heading_words = n;
        self
    }

    pub fn min_meaningful_chars(mut self, n: usize) -> Self {
        self.config.min_meaningful_chars = n;
        self
    }

    pub fn adjacent_merge_gap(mut self, gap: f32) -> Self {
        self.config.adjacent_merge_gap = gap;
        self
    }

    pub fn repetition_threshold(mut self, t: f32) -> Self {
        self.config.repetition_threshold = t;
        self
    }

    pub fn fallback_title(mut self, title: Option<String>) -> Self {
        self.config.fallback_title = title;
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<OutlineConfig, OutlineError> {
        let c = &self.config;
        if c.dpi < 72 || c.dpi > 400 {
            return Err(OutlineError::InvalidConfig(format!(
                "DPI must be 72–400, got {}",
                c.dpi
            )));
        }
        if c.concurrency == 0 {
            return Err(OutlineError::InvalidConfig(
                "Concurrency must be ≥ 1".into(),
            ));
        }
        if !(0.0..=1.0).contains(&c.min_alpha_ratio) || !(0.0..=1.0).contains(&c.max_digit_ratio) {
            return Err(OutlineError::InvalidConfig(
                "Character ratios must lie in 0.0–1.0".into(),
            ));
        }
        if c.repetition_threshold <= 0.0 {
            return Err(OutlineError::InvalidConfig(format!(
                "Repetition threshold must be > 0, got {}",
                c.repetition_threshold
            )));
        }
        let t = &c.fallback_thresholds;
        if t.dyn_y_gap <= 0.0 || t.dyn_x_gap <= 0.0 || t.common_font <= 0.0 {
            return Err(OutlineError::InvalidConfig(
                "Fallback thresholds must all be > 0".into(),
            ));
        }
        if c.virtual_line_gap <= 0.0 {
            return Err(OutlineError::InvalidConfig(
                "Virtual line gap must be > 0".into(),
            ));
        }
        Ok(self.config)
    }
}

// ── Policies ─────────────────────────────────────────────────────────────

/// Exception that keeps short, shouty, large lines found inside a table box.
///
/// Such lines are usually a table's caption or column header rather than
/// cell content, and are worth keeping as heading candidates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TableCaptionRule {
    /// Maximum number of whitespace-separated words. Default: 5.
    pub max_words: usize,
    /// Average span font size must be strictly greater. Default: 12.
    pub min_font_size: f32,
    /// Require every cased character to be upper-case. Default: true.
    pub require_uppercase: bool,
}

impl Default for TableCaptionRule {
    fn default() -> Self {
        Self {
            max_words: 5,
            min_font_size: 12.0,
            require_uppercase: true,
        }
    }
}

/// Letter-spacing repair applied to each raw line before merging.
///
/// Tracked-out headings ("C OURSE  O BJECTIVE") arrive from some PDF
/// producers as single capitals followed by the rest of the word.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SpacingRepair {
    /// Leave text untouched.
    Off,
    /// Glue a lone capital to the following letters (default).
    ///
    /// A genuine one-letter word is glued as well: "Appendix A Results"
    /// becomes "Appendix AResults". Use [`SpacingRepair::Off`] for documents
    /// whose headings carry single-letter labels.
    #[default]
    SingleCapital,
    /// Glue a lone capital to the following word, then collapse runs of
    /// single letters ("A B C" → "ABC").
    CollapseLetters,
}

/// Which line decides that a stage-B group is a leader/separator line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum LeaderCheck {
    /// Screen every fragment on its own (default).
    #[default]
    PerFragment,
    /// Also drop a bucket's final group whenever the bucket's last line
    /// (by `y`) is a leader line, even though that line is not in the group.
    TrailingLine,
}

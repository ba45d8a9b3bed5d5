//! Layout data model shared by every pipeline stage.
//!
//! Coordinates are page-local with a top-left origin: `y` grows downward, so
//! sorting by `y` ascending reads a page top to bottom. Units are whatever the
//! producing engine reports (PDF points for pdfium, pixels for OCR).
//!
//! ```text
//! Span ──▶ TextLine ──▶ RawLine ──▶ MergedCandidate ──▶ RankedHeading
//!         (engine row)  (§ assemble)  (§ merge)          (§ rank)
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

/// Axis-aligned bounding box, `(x0, y0)` top-left and `(x1, y1)` bottom-right.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct BBox {
    pub x0: f32,
    pub y0: f32,
    pub x1: f32,
    pub y1: f32,
}

impl BBox {
    pub fn new(x0: f32, y0: f32, x1: f32, y1: f32) -> Self {
        Self { x0, y0, x1, y1 }
    }

    pub fn width(&self) -> f32 {
        self.x1 - self.x0
    }

    pub fn height(&self) -> f32 {
        self.y1 - self.y0
    }

    /// Smallest box containing both.
    pub fn union(&self, other: &BBox) -> BBox {
        BBox {
            x0: self.x0.min(other.x0),
            y0: self.y0.min(other.y0),
            x1: self.x1.max(other.x1),
            y1: self.y1.max(other.y1),
        }
    }

    /// True when `self` lies inside `outer`, allowing each edge to poke out
    /// by up to `tolerance` units.
    pub fn is_inside(&self, outer: &BBox, tolerance: f32) -> bool {
        self.x0 + tolerance >= outer.x0
            && self.y0 + tolerance >= outer.y0
            && self.x1 - tolerance <= outer.x1
            && self.y1 - tolerance <= outer.y1
    }
}

/// Smallest unit of positioned text reported by the PDF engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Span {
    pub text: String,
    pub bbox: BBox,
    /// Always `> 0` for spans coming out of an engine.
    pub font_size: f32,
}

impl Span {
    pub fn new(text: impl Into<String>, bbox: BBox, font_size: f32) -> Self {
        Self {
            text: text.into(),
            bbox,
            font_size,
        }
    }
}

/// One physical text row as grouped by the PDF engine, spans left to right.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TextLine {
    pub spans: Vec<Span>,
}

/// Everything the PDF engine reports about a single page.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PageLayout {
    /// 0-based page index within the document.
    pub index: usize,
    pub width: f32,
    pub height: f32,
    pub lines: Vec<TextLine>,
    /// Detected table regions. Empty when detection found nothing or failed.
    pub tables: Vec<BBox>,
}

impl PageLayout {
    /// 1-based page number.
    pub fn page_number(&self) -> usize {
        self.index + 1
    }
}

/// A virtual line that survived assembly; the unit fed to calibration and
/// merging. Also produced by the OCR bridge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawLine {
    pub text: String,
    pub x: f32,
    pub y: f32,
    pub font_size: f32,
    /// 1-based page number.
    pub page: usize,
}

/// Document-wide spacing anchors computed once by the calibrator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Thresholds {
    pub dyn_y_gap: f32,
    pub dyn_x_gap: f32,
    pub common_font: f32,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            dyn_y_gap: 5.0,
            dyn_x_gap: 5.0,
            common_font: 12.0,
        }
    }
}

/// Raw lines stitched into one heading-candidate text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MergedCandidate {
    pub text: String,
    pub x: f32,
    pub y: f32,
    pub font_size: f32,
    pub page: usize,
}

/// Outline level assigned by the ranker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum HeadingLevel {
    Title,
    H1,
    H2,
    H3,
}

impl HeadingLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            HeadingLevel::Title => "Title",
            HeadingLevel::H1 => "H1",
            HeadingLevel::H2 => "H2",
            HeadingLevel::H3 => "H3",
        }
    }
}

impl fmt::Display for HeadingLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A candidate that passed every noise filter and received a level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedHeading {
    pub level: HeadingLevel,
    pub text: String,
    pub x: f32,
    pub y: f32,
    pub font_size: f32,
    pub page: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inside_with_tolerance() {
        let table = BBox::new(10.0, 10.0, 200.0, 100.0);
        assert!(BBox::new(20.0, 20.0, 50.0, 30.0).is_inside(&table, 2.0));
        // Pokes out by 1.5 on the left, still within tolerance.
        assert!(BBox::new(8.5, 20.0, 50.0, 30.0).is_inside(&table, 2.0));
        assert!(!BBox::new(5.0, 20.0, 50.0, 30.0).is_inside(&table, 2.0));
    }

    #[test]
    fn union_covers_both() {
        let a = BBox::new(0.0, 5.0, 10.0, 15.0);
        let b = BBox::new(-2.0, 7.0, 8.0, 20.0);
        assert_eq!(a.union(&b), BBox::new(-2.0, 5.0, 10.0, 20.0));
    }

    #[test]
    fn level_serialises_as_label() {
        assert_eq!(serde_json::to_string(&HeadingLevel::H2).unwrap(), "\"H2\"");
        assert_eq!(HeadingLevel::Title.to_string(), "Title");
    }
}

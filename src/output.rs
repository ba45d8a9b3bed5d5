//! Output types: the persisted [`Outline`] and run statistics.

use crate::layout::{HeadingLevel, Thresholds};
use serde::{Deserialize, Serialize};

/// One outline entry. `level` is always `H1`, `H2` or `H3`; the title lives
/// in [`Outline::title`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutlineEntry {
    pub level: HeadingLevel,
    pub text: String,
    /// 1-based page number.
    pub page: usize,
}

/// The only durable artifact of the pipeline: written once per document.
///
/// Serialises to
/// `{"title": string|null, "outline": [{"level", "text", "page"}, ...]}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Outline {
    pub title: Option<String>,
    pub outline: Vec<OutlineEntry>,
}

impl Outline {
    /// Pretty JSON with 2-space indentation, non-ASCII kept as UTF-8.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// Counters collected while extracting one document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtractionStats {
    pub total_pages: usize,
    /// Pages classified as broken and sent through OCR.
    pub ocr_pages: usize,
    pub raw_lines: usize,
    pub candidates: usize,
    pub ranked_headings: usize,
    pub outline_entries: usize,
    pub thresholds: Thresholds,
    pub duration_ms: u64,
}

/// Outline plus the statistics of the run that produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutlineOutput {
    pub outline: Outline,
    pub stats: ExtractionStats,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_shape_and_indent() {
        let outline = Outline {
            title: Some("Überblick".into()),
            outline: vec![OutlineEntry {
                level: HeadingLevel::H1,
                text: "Introduction".into(),
                page: 1,
            }],
        };
        let json = outline.to_json().unwrap();
        assert!(json.starts_with("{\n  \"title\": \"Überblick\""), "got: {json}");
        assert!(json.contains("\"level\": \"H1\""));
        assert!(json.contains("\"page\": 1"));
    }

    #[test]
    fn missing_title_is_null() {
        let json = Outline::default().to_json().unwrap();
        assert!(json.contains("\"title\": null"));
        assert!(json.contains("\"outline\": []"));
    }
}

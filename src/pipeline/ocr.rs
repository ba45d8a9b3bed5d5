//! Broken-text detection and the OCR line bridge.
//!
//! Some PDFs carry text that decodes to garbage: scanned pages with no text
//! layer, subset fonts without a usable ToUnicode map, or numeric tables
//! that dominate a page. Such pages are rendered and read by an
//! [`OcrEngine`]; its words are folded back into [`RawLine`]s and appended to
//! whatever native lines the page already had.

use crate::error::OutlineError;
use crate::layout::RawLine;
use image::DynamicImage;
use std::collections::HashMap;

/// One recognised word, in pixel coordinates of the rendered page.
#[derive(Debug, Clone, PartialEq)]
pub struct OcrWord {
    pub text: String,
    pub left: f32,
    pub top: f32,
    pub width: f32,
    pub height: f32,
    /// Engine-assigned line index; words sharing it form one line.
    pub line: usize,
}

/// An image-to-words recogniser.
///
/// Implementations are called from blocking worker threads, one page at a
/// time, and must be shareable across them.
pub trait OcrEngine: Send + Sync {
    /// Short engine name used in logs and errors.
    fn name(&self) -> &str;

    /// Recognise the words on one rendered page. `page` is 1-based and only
    /// used for logs and errors.
    fn recognize(&self, image: &DynamicImage, page: usize) -> Result<Vec<OcrWord>, OutlineError>;
}

/// True when a page's extracted text is unusable.
///
/// The text is broken if it is blank, if letters make up less than
/// `min_alpha_ratio` of its non-whitespace characters, or if digits make up
/// more than `max_digit_ratio`.
pub fn is_broken_text(text: &str, min_alpha_ratio: f32, max_digit_ratio: f32) -> bool {
    let (mut total, mut alpha, mut digit) = (0usize, 0usize, 0usize);
    for c in text.chars().filter(|c| !c.is_whitespace()) {
        total += 1;
        if c.is_alphabetic() {
            alpha += 1;
        } else if c.is_numeric() {
            digit += 1;
        }
    }
    if total == 0 {
        return true;
    }
    let alpha_ratio = alpha as f32 / total as f32;
    let digit_ratio = digit as f32 / total as f32;
    alpha_ratio < min_alpha_ratio || digit_ratio > max_digit_ratio
}

/// [`is_broken_text`] over the joined text of a page's lines.
pub fn is_broken_page(lines: &[RawLine], min_alpha_ratio: f32, max_digit_ratio: f32) -> bool {
    let text = lines
        .iter()
        .map(|l| l.text.as_str())
        .collect::<Vec<_>>()
        .join("\n");
    is_broken_text(&text, min_alpha_ratio, max_digit_ratio)
}

/// Fold OCR words into one [`RawLine`] per engine line index.
///
/// Lines come out in the order their index first appears. Within a line,
/// words are joined left to right with single spaces; `x`/`y` are the
/// smallest word origin and `font_size` the tallest word height.
pub fn words_to_lines(words: &[OcrWord], page: usize) -> Vec<RawLine> {
    let mut order: Vec<usize> = Vec::new();
    let mut by_line: HashMap<usize, Vec<&OcrWord>> = HashMap::new();
    for word in words.iter().filter(|w| !w.text.trim().is_empty()) {
        by_line
            .entry(word.line)
            .or_insert_with(|| {
                order.push(word.line);
                Vec::new()
            })
            .push(word);
    }

    order
        .into_iter()
        .filter_map(|idx| {
            let mut line_words = by_line.remove(&idx)?;
            line_words.sort_by(|a, b| a.left.total_cmp(&b.left));
            let text = line_words
                .iter()
                .map(|w| w.text.trim())
                .collect::<Vec<_>>()
                .join(" ");
            Some(RawLine {
                text,
                x: line_words.iter().map(|w| w.left).fold(f32::INFINITY, f32::min),
                y: line_words.iter().map(|w| w.top).fold(f32::INFINITY, f32::min),
                font_size: line_words.iter().map(|w| w.height).fold(0.0, f32::max),
                page,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn word(text: &str, left: f32, top: f32, height: f32, line: usize) -> OcrWord {
        OcrWord {
            text: text.into(),
            left,
            top,
            width: 10.0 * text.len() as f32,
            height,
            line,
        }
    }

    #[test]
    fn broken_text_classification() {
        assert!(is_broken_text("", 0.75, 0.25));
        assert!(is_broken_text("   \n\t ", 0.75, 0.25));
        assert!(is_broken_text("12 34 56 78 ab", 0.75, 0.25));
        assert!(is_broken_text("#$%& ()*+ ,-./", 0.75, 0.25));
        assert!(!is_broken_text("Introduction to the course", 0.75, 0.25));
        // 1 digit in 16 non-space chars stays under the digit limit.
        assert!(!is_broken_text("Chapter 1 Overview", 0.75, 0.25));
    }

    #[test]
    fn page_text_joins_lines() {
        let lines = vec![RawLine {
            text: "Scope".into(),
            x: 0.0,
            y: 0.0,
            font_size: 12.0,
            page: 1,
        }];
        assert!(!is_broken_page(&lines, 0.75, 0.25));
        assert!(is_broken_page(&[], 0.75, 0.25));
    }

    #[test]
    fn words_fold_into_lines_in_first_seen_order() {
        let words = vec![
            word("World", 120.0, 52.0, 30.0, 4),
            word("Hello", 40.0, 50.0, 28.0, 4),
            word("Second", 40.0, 120.0, 20.0, 1),
            word("  ", 300.0, 120.0, 20.0, 1),
        ];
        let lines = words_to_lines(&words, 7);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].text, "Hello World");
        assert_eq!(lines[0].x, 40.0);
        assert_eq!(lines[0].y, 50.0);
        assert_eq!(lines[0].font_size, 30.0);
        assert_eq!(lines[0].page, 7);
        assert_eq!(lines[1].text, "Second");
    }
}

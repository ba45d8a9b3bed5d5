//! Line assembly and table exclusion.
//!
//! Turns one page's engine rows into [`RawLine`]s:
//! - each row is split into virtual lines wherever two neighbouring spans
//!   are further apart than `virtual_line_gap`, so side-by-side columns are
//!   not glued together
//! - virtual lines lying inside a detected table are dropped, except short
//!   upper-case large-font captions
//! - lines made only of leader characters are dropped

use super::filters::is_leader_line;
use crate::config::{OutlineConfig, TableCaptionRule};
use crate::layout::{BBox, PageLayout, RawLine, Span};
use tracing::trace;

/// How far a line may poke out of a table box and still count as inside.
const TABLE_TOLERANCE: f32 = 2.0;

/// Assemble the raw lines of one page.
pub fn assemble_page(page: &PageLayout, config: &OutlineConfig) -> Vec<RawLine> {
    let tables = usable_tables(page, config);
    let mut lines = Vec::new();

    for row in &page.lines {
        for spans in split_virtual_lines(&row.spans, config.virtual_line_gap) {
            let Some(line) = build_line(spans, page.page_number()) else {
                continue;
            };
            let bbox = spans_bbox(spans);
            if inside_table(&line.text, spans, &bbox, &tables, &config.table_caption) {
                trace!(page = line.page, text = %line.text, "dropped table line");
                continue;
            }
            if is_leader_line(&line.text) {
                continue;
            }
            lines.push(line);
        }
    }

    lines
}

/// Table boxes worth honouring: taller than `min_table_height` and narrower
/// than `max_table_width_ratio` of the page.
pub fn usable_tables(page: &PageLayout, config: &OutlineConfig) -> Vec<BBox> {
    page.tables
        .iter()
        .filter(|t| t.height() > config.min_table_height)
        .filter(|t| page.width <= 0.0 || t.width() / page.width < config.max_table_width_ratio)
        .copied()
        .collect()
}

/// Split a row's spans wherever `next.x0 - prev.x1 > gap`.
pub fn split_virtual_lines(spans: &[Span], gap: f32) -> Vec<&[Span]> {
    let mut out = Vec::new();
    let mut start = 0;
    for i in 1..spans.len() {
        if spans[i].bbox.x0 - spans[i - 1].bbox.x1 > gap {
            out.push(&spans[start..i]);
            start = i;
        }
    }
    if start < spans.len() {
        out.push(&spans[start..]);
    }
    out
}

fn build_line(spans: &[Span], page: usize) -> Option<RawLine> {
    let first = spans.first()?;
    let text = spans
        .iter()
        .map(|s| s.text.trim())
        .collect::<Vec<_>>()
        .join(" ");
    if text.trim().is_empty() {
        return None;
    }
    let bbox = spans_bbox(spans);
    Some(RawLine {
        text,
        x: bbox.x0,
        y: bbox.y0,
        font_size: first.font_size,
        page,
    })
}

fn spans_bbox(spans: &[Span]) -> BBox {
    spans
        .iter()
        .map(|s| s.bbox)
        .reduce(|acc, b| acc.union(&b))
        .unwrap_or_default()
}

fn inside_table(
    text: &str,
    spans: &[Span],
    bbox: &BBox,
    tables: &[BBox],
    caption: &TableCaptionRule,
) -> bool {
    tables.iter().any(|t| bbox.is_inside(t, TABLE_TOLERANCE)) && !is_caption(text, spans, caption)
}

/// Short, upper-case, large-font text: a table caption or column header.
fn is_caption(text: &str, spans: &[Span], rule: &TableCaptionRule) -> bool {
    if spans.is_empty() {
        return false;
    }
    let avg_font = spans.iter().map(|s| s.font_size).sum::<f32>() / spans.len() as f32;
    avg_font > rule.min_font_size
        && (!rule.require_uppercase || is_upper(text))
        && text.split_whitespace().count() <= rule.max_words
}

/// At least one cased character, and no lower-case ones.
fn is_upper(text: &str) -> bool {
    text.chars().any(char::is_uppercase) && !text.chars().any(char::is_lowercase)
}

//! Fragment merger: turns one page's raw lines into heading candidates.
//!
//! Stage A stitches fragments that share a visual row. Stage B merges rows
//! that share a left edge and font size and sit within one line pitch of each
//! other, i.e. a heading wrapped over several lines. Both stages work on one
//! page at a time and never look at other pages.

use super::filters::{has_leader_run, is_leader_line};
use super::group_first_seen;
use super::stitch::{repair_spacing, stitch, StitchMode};
use crate::config::{LeaderCheck, OutlineConfig};
use crate::layout::{MergedCandidate, RawLine, Thresholds};

/// Multiplier on `dyn_y_gap` for the largest vertical step inside one block.
const BLOCK_GAP_FACTOR: f32 = 1.2;
/// Added to `dyn_x_gap` to widen the left-edge buckets of stage B.
const BLOCK_X_SLACK: f32 = 2.0;

/// Run spacing repair, stage A and stage B on one page.
pub fn merge_page(
    lines: &[RawLine],
    thresholds: &Thresholds,
    config: &OutlineConfig,
) -> Vec<MergedCandidate> {
    // OCR lines never went through assembly, so leader lines are screened
    // here as well.
    let repaired: Vec<RawLine> = lines
        .iter()
        .filter(|l| !is_leader_line(&l.text))
        .map(|l| RawLine {
            text: repair_spacing(&l.text, config.spacing_repair),
            ..l.clone()
        })
        .collect();

    let rows = stitch_rows(&repaired, thresholds.dyn_y_gap);
    merge_blocks(&rows, thresholds, config.leader_check)
}

/// Stage A: bucket by `round(y / dyn_y_gap)` and stitch each bucket left to
/// right.
pub fn stitch_rows(lines: &[RawLine], dyn_y_gap: f32) -> Vec<MergedCandidate> {
    let buckets = group_first_seen(lines.iter(), |l| bucket(l.y, dyn_y_gap));

    buckets
        .into_iter()
        .filter_map(|mut row| {
            row.sort_by(|a, b| a.x.total_cmp(&b.x));
            row.retain(|l| !l.text.trim().is_empty());
            let base = *row.first()?;
            let text = stitch(row.iter().map(|l| l.text.as_str()), StitchMode::Row);
            Some(MergedCandidate {
                text,
                x: base.x,
                y: row.iter().map(|l| l.y).fold(f32::INFINITY, f32::min),
                font_size: base.font_size,
                page: base.page,
            })
        })
        .collect()
}

/// Stage B: bucket by `(round(x / (dyn_x_gap + 2)), round(font, 1))`, split
/// each bucket into runs of lines no more than `1.2 × dyn_y_gap` apart, and
/// stitch each run.
pub fn merge_blocks(
    rows: &[MergedCandidate],
    thresholds: &Thresholds,
    leader_check: LeaderCheck,
) -> Vec<MergedCandidate> {
    let max_step = thresholds.dyn_y_gap * BLOCK_GAP_FACTOR;
    let x_width = thresholds.dyn_x_gap + BLOCK_X_SLACK;
    let buckets = group_first_seen(rows.iter(), |r| {
        (bucket(r.x, x_width), font_key(r.font_size))
    });

    let mut merged = Vec::new();
    for mut column in buckets {
        column.sort_by(|a, b| a.y.total_cmp(&b.y));

        // Legacy behaviour: a trailing leader line anywhere in the bucket
        // discards the bucket's final block.
        let drop_last = leader_check == LeaderCheck::TrailingLine
            && column.last().is_some_and(|r| has_leader_run(&r.text));

        let mut blocks: Vec<Vec<&MergedCandidate>> = Vec::new();
        let mut prev_y: Option<f32> = None;
        for row in column {
            if has_leader_run(&row.text) {
                continue;
            }
            let joins = prev_y.is_some_and(|py| (row.y - py).abs() <= max_step);
            if !joins {
                blocks.push(Vec::new());
            }
            if let Some(block) = blocks.last_mut() {
                block.push(row);
            }
            prev_y = Some(row.y);
        }
        if drop_last {
            blocks.pop();
        }

        merged.extend(blocks.into_iter().filter_map(|block| flush_block(&block)));
    }
    merged
}

fn flush_block(block: &[&MergedCandidate]) -> Option<MergedCandidate> {
    let base = block.first()?;
    let text = stitch(block.iter().map(|r| r.text.as_str()), StitchMode::Block);
    if text.is_empty() {
        return None;
    }
    Some(MergedCandidate {
        text,
        x: block.iter().map(|r| r.x).fold(f32::INFINITY, f32::min),
        y: base.y,
        font_size: base.font_size,
        page: base.page,
    })
}

/// `round(value / width)` with round-half-even, as an integer bucket key.
fn bucket(value: f32, width: f32) -> i64 {
    (f64::from(value) / f64::from(width)).round_ties_even() as i64
}

/// Font size rounded to one decimal, as tenths.
fn font_key(font_size: f32) -> i64 {
    (f64::from(font_size) * 10.0).round_ties_even() as i64
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(text: &str, x: f32, y: f32, font_size: f32) -> RawLine {
        RawLine {
            text: text.into(),
            x,
            y,
            font_size,
            page: 1,
        }
    }

    fn thresholds(gap: f32) -> Thresholds {
        Thresholds {
            dyn_y_gap: gap,
            dyn_x_gap: gap,
            common_font: 12.0,
        }
    }

    #[test]
    fn row_fragments_stitch_into_one_candidate() {
        let lines = vec![raw("OBJECTIVE", 70.0, 100.0, 20.0), raw("COURSE ", 10.0, 100.0, 20.0)];
        let merged = merge_page(&lines, &thresholds(5.0), &OutlineConfig::default());
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].text, "COURSE OBJECTIVE");
        assert_eq!(merged[0].x, 10.0);
        assert_eq!(merged[0].font_size, 20.0);
    }

    #[test]
    fn spaced_capitals_are_repaired_before_merging() {
        let lines = vec![raw("C OURSE  O BJECTIVE", 10.0, 100.0, 20.0)];
        let merged = merge_page(&lines, &thresholds(5.0), &OutlineConfig::default());
        assert_eq!(merged[0].text, "COURSE OBJECTIVE");
    }

    #[test]
    fn wrapped_heading_merges_across_lines() {
        let lines = vec![
            raw("Foundation Level", 72.0, 100.0, 16.0),
            raw("Extensions", 72.0, 112.0, 16.0),
            raw("Body text", 72.0, 200.0, 16.0),
        ];
        let merged = merge_page(&lines, &thresholds(10.0), &OutlineConfig::default());
        let texts: Vec<&str> = merged.iter().map(|m| m.text.as_str()).collect();
        assert_eq!(texts, vec!["Foundation Level Extensions", "Body text"]);
        assert_eq!(merged[0].y, 100.0);
    }

    #[test]
    fn different_fonts_do_not_merge_vertically() {
        let lines = vec![
            raw("Chapter One", 72.0, 100.0, 20.0),
            raw("First section", 72.0, 110.0, 12.0),
        ];
        let merged = merge_page(&lines, &thresholds(10.0), &OutlineConfig::default());
        assert_eq!(merged.len(), 2);
    }

    #[test]
    fn spaced_dash_heading_is_dropped_as_leader() {
        let lines = vec![
            raw("Part 1 - Introduction", 72.0, 100.0, 18.0),
            raw("Part 2 Methods", 72.0, 300.0, 18.0),
        ];
        let merged = merge_page(&lines, &thresholds(10.0), &OutlineConfig::default());
        let texts: Vec<&str> = merged.iter().map(|m| m.text.as_str()).collect();
        assert_eq!(texts, vec!["Part 2 Methods"]);
    }

    #[test]
    fn leader_rows_are_excluded() {
        let lines = vec![
            raw("..........", 72.0, 80.0, 12.0),
            raw("Contents ..... 3", 72.0, 100.0, 12.0),
            raw("Overview", 72.0, 300.0, 12.0),
        ];
        let merged = merge_page(&lines, &thresholds(10.0), &OutlineConfig::default());
        let texts: Vec<&str> = merged.iter().map(|m| m.text.as_str()).collect();
        assert_eq!(texts, vec!["Overview"]);
    }

    #[test]
    fn trailing_leader_mode_drops_final_block() {
        let rows = vec![
            MergedCandidate {
                text: "Scope".into(),
                x: 72.0,
                y: 100.0,
                font_size: 14.0,
                page: 1,
            },
            MergedCandidate {
                text: "Terms".into(),
                x: 72.0,
                y: 300.0,
                font_size: 14.0,
                page: 1,
            },
            MergedCandidate {
                text: "-----".into(),
                x: 72.0,
                y: 500.0,
                font_size: 14.0,
                page: 1,
            },
        ];
        let t = thresholds(10.0);
        let per_fragment = merge_blocks(&rows, &t, LeaderCheck::PerFragment);
        assert_eq!(per_fragment.len(), 2);
        let trailing = merge_blocks(&rows, &t, LeaderCheck::TrailingLine);
        assert_eq!(trailing.len(), 1);
        assert_eq!(trailing[0].text, "Scope");
    }

    #[test]
    fn buckets_round_half_to_even() {
        assert_eq!(bucket(12.5, 5.0), 2);
        assert_eq!(bucket(17.5, 5.0), 4);
        assert_eq!(bucket(13.0, 5.0), 3);
    }
}

//! Threshold calibration: document-wide spacing and font anchors.
//!
//! Fixed merge thresholds break across documents with different typography.
//! The mode of the vertical pitch between consecutive lines is a stable
//! estimate of "one normal line" for this document, unaffected by a few
//! large headings or a cramped table.

use super::mode_first_seen;
use crate::layout::{RawLine, Thresholds};
use tracing::{debug, warn};

/// Compute [`Thresholds`] from every page's raw lines.
///
/// Per page, lines are ordered by `(y, x)`; the absolute `y` and `x`
/// differences between neighbours, rounded to 2 decimals, feed two sample
/// sets (zero differences excluded). Every font size, rounded to 2 decimals,
/// feeds a third. Each threshold is its set's mode, or the matching field of
/// `fallback` when the set is empty.
pub fn calibrate(pages: &[Vec<RawLine>], fallback: Thresholds) -> Thresholds {
    let mut y_gaps: Vec<i64> = Vec::new();
    let mut x_gaps: Vec<i64> = Vec::new();
    let mut fonts: Vec<i64> = Vec::new();

    for lines in pages {
        let mut sorted: Vec<&RawLine> = lines.iter().collect();
        sorted.sort_by(|a, b| a.y.total_cmp(&b.y).then(a.x.total_cmp(&b.x)));

        for pair in sorted.windows(2) {
            let dy = hundredths((pair[1].y - pair[0].y).abs());
            let dx = hundredths((pair[1].x - pair[0].x).abs());
            if dy > 0 {
                y_gaps.push(dy);
            }
            if dx > 0 {
                x_gaps.push(dx);
            }
        }
        fonts.extend(lines.iter().map(|l| hundredths(l.font_size)));
    }

    let pick = |name: &str, samples: &[i64], default: f32| match mode_first_seen(samples) {
        Some(v) => v as f32 / 100.0,
        None => {
            warn!("No {} samples in document; using default {}", name, default);
            default
        }
    };

    let thresholds = Thresholds {
        dyn_y_gap: pick("vertical gap", &y_gaps, fallback.dyn_y_gap),
        dyn_x_gap: pick("horizontal gap", &x_gaps, fallback.dyn_x_gap),
        common_font: pick("font size", &fonts, fallback.common_font),
    };
    debug!(
        "Calibrated thresholds: y_gap={} x_gap={} font={} ({} / {} / {} samples)",
        thresholds.dyn_y_gap,
        thresholds.dyn_x_gap,
        thresholds.common_font,
        y_gaps.len(),
        x_gaps.len(),
        fonts.len()
    );
    thresholds
}

/// Value rounded half-to-even to 2 decimals, as integer hundredths so equal
/// samples compare exactly.
fn hundredths(v: f32) -> i64 {
    (f64::from(v) * 100.0).round_ties_even() as i64
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(x: f32, y: f32, font_size: f32) -> RawLine {
        RawLine {
            text: "text".into(),
            x,
            y,
            font_size,
            page: 1,
        }
    }

    #[test]
    fn modes_of_each_sample_set() {
        let page = vec![
            line(72.0, 100.0, 11.0),
            line(72.0, 114.0, 11.0),
            line(72.0, 128.0, 11.0),
            line(90.0, 160.0, 18.0),
        ];
        let t = calibrate(&[page], Thresholds::default());
        assert_eq!(t.dyn_y_gap, 14.0);
        assert_eq!(t.dyn_x_gap, 18.0);
        assert_eq!(t.common_font, 11.0);
    }

    #[test]
    fn gaps_are_per_page() {
        // Pages are not chained: the jump from page 1's last line to page 2's
        // first line is never a sample.
        let p1 = vec![line(10.0, 700.0, 12.0)];
        let p2 = vec![line(10.0, 50.0, 12.0), line(10.0, 62.0, 12.0)];
        let t = calibrate(&[p1, p2], Thresholds::default());
        assert_eq!(t.dyn_y_gap, 12.0);
    }

    #[test]
    fn tie_goes_to_first_seen() {
        let page = vec![
            line(0.0, 0.0, 10.0),
            line(0.0, 8.0, 10.0),
            line(0.0, 20.0, 14.0),
            line(0.0, 28.0, 14.0),
            line(0.0, 40.0, 14.0),
        ];
        // y gaps: 8, 12, 8, 12 → 8 seen first.
        let t = calibrate(&[page], Thresholds::default());
        assert_eq!(t.dyn_y_gap, 8.0);
        assert_eq!(t.common_font, 14.0);
    }

    #[test]
    fn empty_sets_fall_back() {
        let t = calibrate(&[vec![], vec![line(5.0, 5.0, 9.5)]], Thresholds::default());
        assert_eq!(t.dyn_y_gap, 5.0);
        assert_eq!(t.dyn_x_gap, 5.0);
        assert_eq!(t.common_font, 9.5);

        let t = calibrate(&[], Thresholds::default());
        assert_eq!(t, Thresholds::default());
    }
}

//! Heading ranker: global font statistics, noise filtering and levelling.
//!
//! Runs once per document over every page's merged candidates, because the
//! level thresholds are derived from the font-size distribution of the whole
//! document:
//!
//! | Level | Threshold |
//! |-------|-----------|
//! | Title | `max` (within 0.1), first match only |
//! | H1    | `max − 0.5·mean` |
//! | H2    | `mean + 0.2·stddev` |
//! | H3    | `0.8·mean` |
//!
//! `stddev` is the sample standard deviation. Candidates below H3 are body
//! text and dropped.

use super::filters::{bullet_label, noise_reason, strip_abbreviation_dot};
use crate::config::OutlineConfig;
use crate::layout::{HeadingLevel, MergedCandidate, RankedHeading};
use tracing::{debug, trace};

/// A candidate matches the title size when within this distance of `max`.
const TITLE_TOLERANCE: f32 = 0.1;

/// Level cut-offs derived from the document's candidate font sizes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LevelThresholds {
    pub title: f32,
    pub h1: f32,
    pub h2: f32,
    pub h3: f32,
}

impl LevelThresholds {
    /// `None` when there are no font sizes at all.
    pub fn from_font_sizes(sizes: &[f32]) -> Option<Self> {
        if sizes.is_empty() {
            return None;
        }
        let n = sizes.len() as f64;
        let max = sizes.iter().copied().fold(f32::NEG_INFINITY, f32::max) as f64;
        let mean = sizes.iter().map(|&s| s as f64).sum::<f64>() / n;
        let std = if sizes.len() > 1 {
            let ss: f64 = sizes.iter().map(|&s| (s as f64 - mean).powi(2)).sum();
            (ss / (n - 1.0)).sqrt()
        } else {
            0.0
        };
        Some(Self {
            title: max as f32,
            h1: (max - 0.5 * mean) as f32,
            h2: (mean + 0.2 * std) as f32,
            h3: (mean - 0.2 * mean) as f32,
        })
    }

    /// Level for a font size, ignoring the Title rule.
    pub fn level_for(&self, font_size: f32) -> Option<HeadingLevel> {
        if font_size >= self.h1 {
            Some(HeadingLevel::H1)
        } else if font_size >= self.h2 {
            Some(HeadingLevel::H2)
        } else if font_size >= self.h3 {
            Some(HeadingLevel::H3)
        } else {
            None
        }
    }
}

/// Rank every candidate of a document.
///
/// Candidates are visited page by page, top to bottom. Each one has its
/// bullet label extracted (when that shortens it), is screened for length
/// and noise, and then receives a level. The first candidate at title size
/// becomes the only [`HeadingLevel::Title`].
pub fn rank_headings(candidates: &[MergedCandidate], config: &OutlineConfig) -> Vec<RankedHeading> {
    let sizes: Vec<f32> = candidates.iter().map(|c| c.font_size).collect();
    let Some(thresholds) = LevelThresholds::from_font_sizes(&sizes) else {
        return Vec::new();
    };
    debug!(
        "Level thresholds: title={:.2} h1={:.2} h2={:.2} h3={:.2}",
        thresholds.title, thresholds.h1, thresholds.h2, thresholds.h3
    );

    let mut ordered: Vec<&MergedCandidate> = candidates.iter().collect();
    ordered.sort_by(|a, b| a.page.cmp(&b.page).then(a.y.total_cmp(&b.y)));

    let mut ranked = Vec::new();
    let mut title_assigned = false;

    for cand in ordered {
        let Some(text) = heading_text(&cand.text, config) else {
            continue;
        };
        if let Some(kind) = noise_reason(&text, config.min_meaningful_chars) {
            trace!(page = cand.page, text = %text, reason = %kind, "filtered candidate");
            continue;
        }

        let level = if !title_assigned && (cand.font_size - thresholds.title).abs() < TITLE_TOLERANCE {
            title_assigned = true;
            HeadingLevel::Title
        } else {
            match thresholds.level_for(cand.font_size) {
                Some(level) => level,
                None => continue,
            }
        };

        ranked.push(RankedHeading {
            level,
            text,
            x: cand.x,
            y: cand.y,
            font_size: cand.font_size,
            page: cand.page,
        });
    }

    debug!("Ranked {} of {} candidates", ranked.len(), candidates.len());
    ranked
}

/// Normalised heading text, or `None` when the candidate is too long to be a
/// heading.
fn heading_text(raw: &str, config: &OutlineConfig) -> Option<String> {
    let text = raw.trim();
    if text.is_empty() {
        return None;
    }
    let label = bullet_label(text);
    let text = if label.chars().count() < text.chars().count() {
        label
    } else {
        text
    };
    if text.chars().count() > config.max_heading_chars
        || text.split_whitespace().count() > config.max_heading_words
    {
        return None;
    }
    Some(strip_abbreviation_dot(text).to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cand(text: &str, page: usize, y: f32, font_size: f32) -> MergedCandidate {
        MergedCandidate {
            text: text.into(),
            x: 72.0,
            y,
            font_size,
            page,
        }
    }

    #[test]
    fn thresholds_from_example_distribution() {
        let t = LevelThresholds::from_font_sizes(&[24.0, 24.0, 12.0, 12.0, 12.0, 10.0]).unwrap();
        assert_eq!(t.title, 24.0);
        assert!((t.h1 - 16.1667).abs() < 1e-3, "h1 = {}", t.h1);
        assert!((t.h2 - 16.8968).abs() < 1e-3, "h2 = {}", t.h2);
        assert!((t.h3 - 12.5333).abs() < 1e-3, "h3 = {}", t.h3);
        assert_eq!(LevelThresholds::from_font_sizes(&[]), None);
    }

    #[test]
    fn example_levels_title_then_h1_and_body_dropped() {
        let cands = vec![
            cand("Annual Report", 1, 50.0, 24.0),
            cand("Financial Highlights", 2, 50.0, 24.0),
            cand("Revenue grew strongly", 2, 100.0, 12.0),
            cand("Costs were contained", 2, 120.0, 12.0),
            cand("Staff numbers rose", 2, 140.0, 12.0),
            cand("Footnote detail", 2, 700.0, 10.0),
        ];
        let ranked = rank_headings(&cands, &OutlineConfig::default());
        let got: Vec<(HeadingLevel, &str)> = ranked.iter().map(|r| (r.level, r.text.as_str())).collect();
        assert_eq!(
            got,
            vec![
                (HeadingLevel::Title, "Annual Report"),
                (HeadingLevel::H1, "Financial Highlights"),
            ]
        );
    }

    #[test]
    fn only_one_title_in_page_order() {
        let cands = vec![
            cand("Second Page Big", 2, 10.0, 30.0),
            cand("First Page Big", 1, 500.0, 30.0),
            cand("Body", 1, 600.0, 10.0),
        ];
        let ranked = rank_headings(&cands, &OutlineConfig::default());
        let titles: Vec<&str> = ranked
            .iter()
            .filter(|r| r.level == HeadingLevel::Title)
            .map(|r| r.text.as_str())
            .collect();
        assert_eq!(titles, vec!["First Page Big"]);
    }

    #[test]
    fn pagination_never_ranked() {
        let cands = vec![cand("- 4 of 9", 1, 10.0, 40.0), cand("Overview", 1, 50.0, 20.0)];
        let ranked = rank_headings(&cands, &OutlineConfig::default());
        assert!(ranked.iter().all(|r| r.text != "- 4 of 9"));
    }

    #[test]
    fn bullet_label_and_length_limits() {
        let config = OutlineConfig::default();
        assert_eq!(
            heading_text("• Eligibility: applicants must be residents", &config).as_deref(),
            Some("Eligibility")
        );
        let long = "Word ".repeat(16);
        assert_eq!(heading_text(&long, &config), None);
        assert_eq!(heading_text("Acme Ltd.", &config).as_deref(), Some("Acme Ltd"));
        assert_eq!(heading_text("   ", &config), None);
    }

    #[test]
    fn no_candidates_no_headings() {
        assert!(rank_headings(&[], &OutlineConfig::default()).is_empty());
    }
}

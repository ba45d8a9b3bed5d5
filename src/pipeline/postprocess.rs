//! Post-processing: turn ranked headings into the final [`Outline`].
//!
//! Rules (applied in order):
//! 1. Merge adjacent same-level headings wrapped across two lines
//! 2. Re-check merged text against the pattern filters
//! 3. Sort by page (stable) and split off the title
//! 4. Drop running headers/footers that recur on too many pages
//! 5. Force every occurrence of a text to its most frequent level
//! 6. Fill in the fallback title
//!
//! Every rule is a pure function over owned vectors, so each can be tested in
//! isolation.

use super::filters::pattern_noise;
use super::{group_first_seen, mode_first_seen};
use crate::config::OutlineConfig;
use crate::layout::{HeadingLevel, RankedHeading};
use crate::output::{Outline, OutlineEntry};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::{HashMap, HashSet};
use tracing::{debug, trace};

static RE_NOT_KEY_CHAR: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^a-z0-9\s]").unwrap());

/// Run every rule and build the outline of a document with `total_pages`
/// pages.
pub fn build_outline(ranked: Vec<RankedHeading>, total_pages: usize, config: &OutlineConfig) -> Outline {
    let merged = merge_adjacent(ranked, config.adjacent_merge_gap);
    let mut clean = drop_pattern_noise(merged);
    clean.sort_by_key(|h| h.page);

    let mut title = None;
    let mut entries = Vec::with_capacity(clean.len());
    for heading in clean {
        if heading.level == HeadingLevel::Title {
            if title.is_none() {
                title = Some(heading.text);
            }
            continue;
        }
        entries.push(OutlineEntry {
            level: heading.level,
            text: heading.text,
            page: heading.page,
        });
    }

    let entries = filter_repetitive(entries, total_pages, config.repetition_threshold);
    let entries = normalize_levels(entries);

    debug!(
        "Outline: title={} entries={}",
        title.is_some(),
        entries.len()
    );
    Outline {
        title: title.or_else(|| config.fallback_title.clone()),
        outline: entries,
    }
}

// ── Rule 1: Adjacent merge ───────────────────────────────────────────────────

/// Concatenate consecutive headings that share a page and a level and sit
/// within `font_size + gap / 2` of each other vertically.
///
/// The merged heading keeps the first heading's level and page, the smallest
/// `x`/`y` and the largest font size.
pub fn merge_adjacent(ranked: Vec<RankedHeading>, gap: f32) -> Vec<RankedHeading> {
    let mut out: Vec<RankedHeading> = Vec::with_capacity(ranked.len());
    let mut prev: Option<(HeadingLevel, usize, f32)> = None;

    for curr in ranked {
        let joins = prev.is_some_and(|(level, page, y)| {
            level == curr.level && page == curr.page && (curr.y - y).abs() <= curr.font_size + gap * 0.5
        });
        prev = Some((curr.level, curr.page, curr.y));

        match out.last_mut() {
            Some(base) if joins => {
                trace!(page = curr.page, "merged wrapped heading: {:?} + {:?}", base.text, curr.text);
                base.text.push(' ');
                base.text.push_str(&curr.text);
                base.x = base.x.min(curr.x);
                base.y = base.y.min(curr.y);
                base.font_size = base.font_size.max(curr.font_size);
            }
            _ => out.push(curr),
        }
    }

    out
}

// ── Rule 2: Final noise sweep ────────────────────────────────────────────────

fn drop_pattern_noise(headings: Vec<RankedHeading>) -> Vec<RankedHeading> {
    headings
        .into_iter()
        .filter(|h| match pattern_noise(&h.text) {
            Some(kind) => {
                trace!(page = h.page, text = %h.text, reason = %kind, "dropped merged heading");
                false
            }
            None => true,
        })
        .collect()
}

// ── Rule 4: Repetition filter ────────────────────────────────────────────────

/// Remove every entry whose text appears on more than
/// `max(1, floor(threshold × total_pages))` distinct pages.
pub fn filter_repetitive(entries: Vec<OutlineEntry>, total_pages: usize, threshold: f32) -> Vec<OutlineEntry> {
    let limit = ((threshold as f64 * total_pages as f64).floor() as usize).max(1);

    let mut pages: HashMap<String, HashSet<usize>> = HashMap::new();
    for entry in &entries {
        pages
            .entry(repetition_key(&entry.text))
            .or_default()
            .insert(entry.page);
    }

    entries
        .into_iter()
        .filter(|e| {
            let count = pages.get(&repetition_key(&e.text)).map_or(0, HashSet::len);
            if count > limit {
                trace!(text = %e.text, pages = count, "dropped repeated heading");
                false
            } else {
                true
            }
        })
        .collect()
}

fn repetition_key(text: &str) -> String {
    text.to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

// ── Rule 5: Level normalisation ──────────────────────────────────────────────

/// Give every entry the most frequent level among entries with the same
/// alphanumeric text; ties go to the level seen first.
pub fn normalize_levels(mut entries: Vec<OutlineEntry>) -> Vec<OutlineEntry> {
    let keyed: Vec<(String, HeadingLevel)> =
        entries.iter().map(|e| (level_key(&e.text), e.level)).collect();

    let mut canonical: HashMap<String, HeadingLevel> = HashMap::new();
    for group in group_first_seen(keyed, |(key, _)| key.clone()) {
        let levels: Vec<HeadingLevel> = group.iter().map(|(_, level)| *level).collect();
        if let (Some((key, _)), Some(level)) = (group.first(), mode_first_seen(&levels)) {
            canonical.insert(key.clone(), level);
        }
    }

    for entry in &mut entries {
        if let Some(&level) = canonical.get(&level_key(&entry.text)) {
            entry.level = level;
        }
    }
    entries
}

fn level_key(text: &str) -> String {
    let lower = text.to_lowercase();
    RE_NOT_KEY_CHAR
        .replace_all(&lower, "")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

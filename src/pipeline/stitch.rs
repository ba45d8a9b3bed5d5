//! Text stitching: the one place fragment texts are joined and repaired.
//!
//! Both merge stages and the post-processor join heading fragments, and the
//! rules differ only in a few switches, so they share these helpers:
//!
//! - [`repair_spacing`] undoes letter-tracked headings ("C OURSE" → "COURSE")
//! - [`stitch`] joins fragments left-to-right, absorbing any suffix/prefix
//!   overlap between the running text and the next fragment
//! - [`collapse_repeats`] folds OCR stutter ("IntroIntroIntro" → "Intro")
//!
//! All functions are pure `&str → String`.

use crate::config::SpacingRepair;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;

/// How consecutive fragments are glued together.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StitchMode {
    /// Fragments sharing one visual row. Overlaps join tight; a lowercase
    /// boundary on both sides is treated as a mid-word split.
    Row,
    /// Fragments stacked vertically in one block. Fragments already present
    /// in the running text are skipped; every join gets a space; repeated
    /// runs are collapsed at the end.
    Block,
}

/// Join fragment texts in order according to `mode`.
///
/// Fragments are trimmed; empty fragments and exact repeats of an earlier
/// fragment are skipped.
pub fn stitch<'a, I>(fragments: I, mode: StitchMode) -> String
where
    I: IntoIterator<Item = &'a str>,
{
    let mut result = String::new();
    let mut seen: HashSet<&str> = HashSet::new();

    for raw in fragments {
        let text = raw.trim();
        if text.is_empty() || !seen.insert(text) {
            continue;
        }
        if result.is_empty() {
            result.push_str(text);
            continue;
        }
        if mode == StitchMode::Block && result.contains(text) {
            continue;
        }

        let overlap = suffix_prefix_overlap(&result, text);
        let new_part = skip_chars(text, overlap);

        match mode {
            StitchMode::Row => {
                if overlap > 0 {
                    result.push_str(new_part);
                } else if ends_lowercase(&result) && starts_lowercase(text) {
                    result.push_str(text);
                } else {
                    result.push(' ');
                    result.push_str(text);
                }
            }
            StitchMode::Block => {
                if !new_part.is_empty() && overlap > 0 && result.contains(new_part) {
                    continue;
                }
                result.push(' ');
                result.push_str(new_part);
            }
        }
    }

    let joined = collapse_whitespace(&result);
    match mode {
        StitchMode::Row => joined,
        StitchMode::Block => collapse_repeats(&joined).trim().to_string(),
    }
}

/// Length in chars of the longest suffix of `a` that is also a prefix of `b`.
pub fn suffix_prefix_overlap(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let max_len = a.len().min(b.len());
    (1..=max_len)
        .rev()
        .find(|&i| a[a.len() - i..] == b[..i])
        .unwrap_or(0)
}

fn skip_chars(text: &str, n: usize) -> &str {
    match text.char_indices().nth(n) {
        Some((idx, _)) => &text[idx..],
        None => "",
    }
}

fn ends_lowercase(text: &str) -> bool {
    text.chars().last().is_some_and(char::is_lowercase)
}

fn starts_lowercase(text: &str) -> bool {
    text.chars().next().is_some_and(char::is_lowercase)
}

static RE_WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// Collapse whitespace runs to one space and trim.
pub fn collapse_whitespace(text: &str) -> String {
    RE_WHITESPACE.replace_all(text, " ").trim().to_string()
}

/// Replace any word-initial unit of 3+ word characters that is immediately
/// repeated at least twice more with a single copy.
///
/// Shortest qualifying unit wins, scanning left to right; equivalent to the
/// backreference substitution `(\b\w{3,}?)\1{2,}` → `\1`.
pub fn collapse_repeats(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let is_word = |c: char| c.is_alphanumeric() || c == '_';
    let mut out = String::with_capacity(text.len());
    let mut i = 0;

    'scan: while i < chars.len() {
        let at_boundary = is_word(chars[i]) && (i == 0 || !is_word(chars[i - 1]));
        if at_boundary {
            let mut len = 3;
            while i + len <= chars.len() && chars[i..i + len].iter().all(|&c| is_word(c)) {
                let unit = &chars[i..i + len];
                let mut reps = 1;
                let mut j = i + len;
                while j + len <= chars.len() && &chars[j..j + len] == unit {
                    reps += 1;
                    j += len;
                }
                if reps >= 3 {
                    out.extend(unit.iter());
                    i = j;
                    continue 'scan;
                }
                len += 1;
            }
        }
        out.push(chars[i]);
        i += 1;
    }

    out
}

// ── Spacing repair ───────────────────────────────────────────────────────

static RE_CAPITAL_THEN_UPPER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b([A-Z])\s+([A-Z]+)").unwrap());
static RE_CAPITAL_THEN_WORD: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b([A-Z])\s+([A-Za-z]{2,})").unwrap());
static RE_CAPITAL_THEN_LOWER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b([A-Z])\s+([a-z]+)").unwrap());

/// Undo letter-tracking in a heading according to `mode`.
pub fn repair_spacing(text: &str, mode: SpacingRepair) -> String {
    if text.is_empty() {
        return String::new();
    }
    match mode {
        SpacingRepair::Off => text.to_string(),
        SpacingRepair::SingleCapital => {
            let fixed = RE_CAPITAL_THEN_UPPER.replace_all(text, "${1}${2}");
            let fixed = RE_CAPITAL_THEN_LOWER.replace_all(&fixed, "${1}${2}");
            collapse_whitespace(&fixed)
        }
        SpacingRepair::CollapseLetters => {
            let fixed = RE_CAPITAL_THEN_WORD.replace_all(text, "${1}${2}");
            let fixed = RE_CAPITAL_THEN_LOWER.replace_all(&fixed, "${1}${2}");
            collapse_single_letters(&fixed)
        }
    }
}

/// "A B C Corp" → "ABC Corp".
fn collapse_single_letters(text: &str) -> String {
    let mut words: Vec<String> = Vec::new();
    let mut buffer = String::new();
    for word in text.split_whitespace() {
        let mut chars = word.chars();
        let single_letter = matches!((chars.next(), chars.next()), (Some(c), None) if c.is_alphabetic());
        if single_letter {
            buffer.push_str(word);
        } else {
            if !buffer.is_empty() {
                words.push(std::mem::take(&mut buffer));
            }
            words.push(word.to_string());
        }
    }
    if !buffer.is_empty() {
        words.push(buffer);
    }
    words.join(" ")
}

//! Noise filter bank for heading candidates.
//!
//! Each filter recognises one kind of text that is laid out like a heading
//! but is not one: page numbers, dates, contact lines, running prose,
//! fragments too short to mean anything. [`noise_reason`] runs the whole bank
//! in a fixed order and reports the first category that matched, so trace
//! logs can say *why* a candidate was dropped.

use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;

/// Why a candidate was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NoiseKind {
    /// "3 of 9", "Page 3", "3/9", "(6)", "- 4".
    Pagination,
    /// Dot/dash/underscore leader runs from tables of contents.
    Leader,
    /// Trailing `;`, or a lone short word ending in `.`.
    Punctuation,
    /// Long text that starts with neither a capital nor a digit.
    Casing,
    /// Dates, month names, years in short fragments, time ranges.
    DateTime,
    /// Emails, URLs, phone numbers, contact/form field words.
    Contact,
    /// "©", "All rights reserved", committee/version notices.
    Boilerplate,
    /// Sentence-like text with an auxiliary verb.
    Prose,
    /// Too few meaningful characters, or only tiny tokens.
    Degenerate,
}

impl NoiseKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NoiseKind::Pagination => "pagination",
            NoiseKind::Leader => "leader",
            NoiseKind::Punctuation => "punctuation",
            NoiseKind::Casing => "casing",
            NoiseKind::DateTime => "date/time",
            NoiseKind::Contact => "contact",
            NoiseKind::Boilerplate => "boilerplate",
            NoiseKind::Prose => "prose",
            NoiseKind::Degenerate => "degenerate",
        }
    }
}

impl fmt::Display for NoiseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

macro_rules! regex {
    ($name:ident, $re:expr) => {
        static $name: Lazy<Regex> = Lazy::new(|| Regex::new($re).unwrap());
    };
}

// Pagination
regex!(RE_N_OF_M, r"[-–—()]?\s*\d+\s*of\s*\d+");
regex!(RE_PAGE_N, r"(?i)page\s*\d+");
regex!(RE_TRAILING_DASH_NUMBER, r"[-–—]\s*\d+\s*$");
regex!(RE_FRACTION, r"^\d+\s*/\s*\d+\s*$");
regex!(RE_LONE_NUMBER, r"^\(?\s*\d+\s*\)?$");
regex!(RE_SHORT_MARKER, r"^\s*(?:\d{1,3}|[a-zA-Z])[.)]?\s*$");

// Leaders
regex!(RE_LEADER_RUN, r"[.\-_*=\s]{3,}");
regex!(RE_LEADER_LINE, r"^[.\-_*=\s]{6,}$");

// Dates and times
regex!(RE_DATE_NUMERIC, r"^\d{1,2}[/-]\d{1,2}[/-]\d{2,4}$");
regex!(RE_DATE_LONG, r"^[A-Z][a-z]+\s\d{1,2},\s\d{4}$");
regex!(RE_DATE_FRAGMENT, r"\b\d{1,2}[/-]\d{1,2}(?:[/-]\d{2,4})?\b");
regex!(
    RE_MONTH_DATE,
    r"(?i)\b(?:Jan|Feb|Mar|Apr|May|Jun|Jul|Aug|Sep|Oct|Nov|Dec)[a-z]*\.? \d{1,2},? \d{2,4}\b"
);
regex!(RE_YEAR, r"\b(?:19|20)\d{2}\b");
regex!(
    RE_TIME_RANGE,
    r"(?i)^\s*\d{1,2}:\d{2}\s*(?:AM|PM|–|-|to)?\s*\d{1,2}:\d{2}"
);

// Contact
regex!(RE_EMAIL, r"\b[\w.-]+@[\w.-]+\.\w+\b");
regex!(RE_URL, r"(?i)https?://");
regex!(
    RE_CONTACT_WORD,
    r"(?i)\b(?:Tel|Phone|Fax|Email|E-mail|Signature|Location|Class|Room)\b"
);
regex!(RE_PHONE, r"\(?\d{3}\)?[-.\s]?\d{3}[-.\s]?\d{4}");

// Boilerplate and prose
regex!(
    RE_BOILERPLATE,
    r"(?i)\b(?:Board|Tel|Committee|Version|Organization|Published|©|All rights reserved)\b"
);
regex!(
    RE_AUX_VERB,
    r"(?i)\b(?:is|are|was|were|be|being|been|will|shall|have|has|had|should|would|could|may|might|must|do|does|did)\b"
);

// Text normalisation
regex!(RE_BULLET_LABEL, r"^[\x{2022}\-*]\s*([^:]+?)\s*:\s*(.*)");
regex!(RE_ABBREVIATION_DOT, r"^.*\b(?:Inc|Ltd|Co|etc)\.$");
regex!(RE_NON_ALNUM, r"[^A-Za-z0-9 ]");

/// A whole line made of 6+ leader characters (`.` `-` `_` `*` `=` space).
pub fn is_leader_line(text: &str) -> bool {
    RE_LEADER_LINE.is_match(text.trim())
}

/// Text containing a run of 3+ leader characters anywhere.
///
/// Spaces count as leader characters, so a spaced dash separator (" - ") is a
/// run too: "Part 1 - Introduction" matches and never becomes a heading.
pub fn has_leader_run(text: &str) -> bool {
    RE_LEADER_RUN.is_match(text.trim())
}

/// For `"• Label: rest of line"` return `"Label"`; otherwise the input.
pub fn bullet_label(text: &str) -> &str {
    RE_BULLET_LABEL
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim())
        .unwrap_or(text)
}

/// Drop the trailing period of "Acme Inc." style company suffixes.
pub fn strip_abbreviation_dot(text: &str) -> &str {
    if RE_ABBREVIATION_DOT.is_match(text) {
        text.trim_end_matches('.')
    } else {
        text
    }
}

/// Run the full filter bank. `None` means the text may be a heading.
///
/// `min_meaningful_chars` is the smallest number of ASCII alphanumerics a
/// heading must carry.
pub fn noise_reason(text: &str, min_meaningful_chars: usize) -> Option<NoiseKind> {
    let text = text.trim();
    let words: Vec<&str> = text.split_whitespace().collect();
    let char_count = text.chars().count();

    if is_pagination(text) {
        return Some(NoiseKind::Pagination);
    }
    if RE_LEADER_RUN.is_match(text) {
        return Some(NoiseKind::Leader);
    }
    if text.ends_with(';') || (text.ends_with('.') && words.len() == 1 && char_count <= 12) {
        return Some(NoiseKind::Punctuation);
    }
    if char_count >= 10 {
        let starts_well = text
            .chars()
            .next()
            .is_some_and(|c| c.is_uppercase() || c.is_numeric());
        if !starts_well {
            return Some(NoiseKind::Casing);
        }
    }
    if is_date_or_time(text, words.len()) {
        return Some(NoiseKind::DateTime);
    }
    if is_contact(text) {
        return Some(NoiseKind::Contact);
    }
    if char_count < 3 && RE_SHORT_MARKER.is_match(text) {
        return Some(NoiseKind::Pagination);
    }
    if words.len() > 12 && RE_AUX_VERB.is_match(text) {
        return Some(NoiseKind::Prose);
    }
    if words.len() >= 2 && RE_BOILERPLATE.is_match(text) {
        return Some(NoiseKind::Boilerplate);
    }
    if RE_CONTACT_WORD.is_match(text) || RE_PHONE.is_match(text) {
        return Some(NoiseKind::Contact);
    }
    if RE_TIME_RANGE.is_match(text) {
        return Some(NoiseKind::DateTime);
    }
    if is_degenerate(text, min_meaningful_chars) {
        return Some(NoiseKind::Degenerate);
    }
    None
}

/// Only the pattern categories: pagination, dates and times, contact details.
///
/// Concatenating two clean headings can still produce one of these, so the
/// post-processor re-checks merged text with this subset.
pub fn pattern_noise(text: &str) -> Option<NoiseKind> {
    let text = text.trim();
    let word_count = text.split_whitespace().count();
    if is_pagination(text) {
        Some(NoiseKind::Pagination)
    } else if is_date_or_time(text, word_count) || RE_TIME_RANGE.is_match(text) {
        Some(NoiseKind::DateTime)
    } else if is_contact(text) || RE_CONTACT_WORD.is_match(text) || RE_PHONE.is_match(text) {
        Some(NoiseKind::Contact)
    } else {
        None
    }
}

fn is_pagination(text: &str) -> bool {
    RE_N_OF_M.is_match(text)
        || RE_PAGE_N.is_match(text)
        || RE_TRAILING_DASH_NUMBER.is_match(text)
        || RE_FRACTION.is_match(text)
        || RE_LONE_NUMBER.is_match(text)
}

fn is_date_or_time(text: &str, word_count: usize) -> bool {
    RE_DATE_NUMERIC.is_match(text)
        || RE_DATE_LONG.is_match(text)
        || RE_DATE_FRAGMENT.is_match(text)
        || RE_MONTH_DATE.is_match(text)
        || (word_count <= 3 && RE_YEAR.is_match(text))
}

fn is_contact(text: &str) -> bool {
    RE_EMAIL.is_match(text) || RE_URL.is_match(text) || text.to_lowercase().contains("www.")
}

fn is_degenerate(text: &str, min_meaningful_chars: usize) -> bool {
    let stripped = RE_NON_ALNUM.replace_all(text, "");
    let tokens: Vec<&str> = stripped.split_whitespace().collect();
    let meaningful = tokens.iter().map(|t| t.len()).sum::<usize>();
    meaningful < min_meaningful_chars
        || (!tokens.is_empty() && tokens.len() <= 3 && tokens.iter().all(|t| t.len() <= 2))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reason(text: &str) -> Option<NoiseKind> {
        noise_reason(text, 3)
    }

    #[test]
    fn pagination_variants() {
        for text in ["- 4 of 9", "(2 of 10)", "Page 3", "page12", "Summary - 4", "3/9", "(6)", "5"] {
            assert_eq!(reason(text), Some(NoiseKind::Pagination), "{text}");
        }
    }

    #[test]
    fn dates_and_times() {
        for text in [
            "12/05/2021",
            "March 5, 2021",
            "Due 3/4 Draft",
            "Submitted Jan. 12, 2023",
            "Spring 2019",
            "9:00 to 10:30",
        ] {
            assert_eq!(reason(text), Some(NoiseKind::DateTime), "{text}");
        }
        // A year inside a longer title is fine.
        assert_eq!(reason("Annual Report Of The Year 2020"), None);
    }

    #[test]
    fn contact_lines() {
        for text in [
            "Contact info@example.com",
            "See https://example.org",
            "Visit www.example.org",
            "Phone Numbers",
            "Room Allocation",
            "Call (555) 123 4567",
        ] {
            assert_eq!(reason(text), Some(NoiseKind::Contact), "{text}");
        }
    }

    #[test]
    fn boilerplate_needs_two_words() {
        assert_eq!(reason("All rights reserved"), Some(NoiseKind::Boilerplate));
        assert_eq!(reason("Version History"), Some(NoiseKind::Boilerplate));
        assert_eq!(reason("Version"), None);
    }

    #[test]
    fn prose_with_auxiliary_verb() {
        let sentence = "The committee members that attended said the plan would be reviewed again next year";
        assert_eq!(reason(sentence), Some(NoiseKind::Prose));
        assert_eq!(reason("Revised Plan For Regional Training Programmes"), None);
    }

    #[test]
    fn punctuation_casing_and_degenerate() {
        assert_eq!(reason("Goals;"), Some(NoiseKind::Punctuation));
        assert_eq!(reason("Summary."), Some(NoiseKind::Punctuation));
        assert_eq!(reason("continued from before"), Some(NoiseKind::Casing));
        assert_eq!(reason("A B"), Some(NoiseKind::Degenerate));
        assert_eq!(reason("!!"), Some(NoiseKind::Degenerate));
        assert_eq!(reason("ab cd ef"), Some(NoiseKind::Degenerate));
        assert_eq!(reason("Introduction"), None);
        assert_eq!(reason("3 Methods"), None);
    }

    #[test]
    fn leader_runs() {
        assert_eq!(reason("Contents....... 4"), Some(NoiseKind::Leader));
        assert_eq!(reason("Contents......"), Some(NoiseKind::Leader));
        assert!(is_leader_line("  ........  "));
        assert!(!is_leader_line("...."));
        assert!(has_leader_run("Title ---"));
        assert!(!has_leader_run("Plain Title"));
    }

    #[test]
    fn spaced_dash_counts_as_leader_run() {
        assert!(has_leader_run("Part 1 - Introduction"));
        assert_eq!(reason("Part 1 - Introduction"), Some(NoiseKind::Leader));
        assert!(!has_leader_run("Part 1-Introduction"));
    }

    #[test]
    fn bullet_and_abbreviation_helpers() {
        assert_eq!(bullet_label("• Scope: what is covered"), "Scope");
        assert_eq!(bullet_label("- Budget : details"), "Budget");
        assert_eq!(bullet_label("No bullet: here"), "No bullet: here");
        assert_eq!(strip_abbreviation_dot("Acme Inc."), "Acme Inc");
        assert_eq!(strip_abbreviation_dot("Overview."), "Overview.");
    }

    #[test]
    fn pattern_subset_ignores_style_filters() {
        assert_eq!(pattern_noise("continued from before"), None);
        assert_eq!(pattern_noise("Overview - 4 of 9"), Some(NoiseKind::Pagination));
        assert_eq!(pattern_noise("Contact info@example.com"), Some(NoiseKind::Contact));
        assert_eq!(pattern_noise("9:00 - 10:30"), Some(NoiseKind::DateTime));
    }
}

//! Pipeline stages for layout-to-outline extraction.
//!
//! Each submodule implements exactly one transformation step. Stages are
//! plain functions over owned data so they can run on worker threads and be
//! tested without a PDF library.
//!
//! ## Data Flow
//!
//! ```text
//!            ┌──────────── phase 1 (per page) ────────────┐
//! input ──▶ engine ──▶ assemble ──▶ ocr (broken pages only)
//! (path)    (pdfium)   (lines, tables)  (tesseract)
//!                                          │
//!                       ═══════ barrier ═══╪═══════
//!                                          ▼
//!                                      calibrate (whole document)
//!                                          │
//!            ┌──────── phase 2 (per page) ─┴──────────┐
//!            │              merge (stitch)            │
//!            └─────────────────┬──────────────────────┘
//!                       ═══════ barrier ═══════
//!                                 ▼
//!                  rank (whole document, filters) ──▶ postprocess
//! ```
//!
//! 1. [`input`]     : validate the user-supplied path
//! 2. [`engine`]    : decode pages into spans and table boxes; render pages
//! 3. [`assemble`]  : virtual lines, table exclusion, leader removal
//! 4. [`ocr`]       : broken-text detection and the OCR line bridge
//! 5. [`calibrate`] : document-wide spacing/font modes
//! 6. [`merge`]     : row stitch (stage A) then block merge (stage B)
//! 7. [`rank`]      : global font statistics, noise filters, levels
//! 8. [`postprocess`] : adjacent merge, repetition filter, level consistency
//!
//! [`phase`] runs the per-page steps with a bounded worker pool and is the
//! only place the two barriers exist.

pub mod assemble;
pub mod calibrate;
pub mod engine;
pub mod filters;
pub mod input;
pub mod merge;
pub mod ocr;
pub mod phase;
pub mod postprocess;
pub mod rank;
pub mod stitch;
pub mod tables;
pub mod tesseract;

use std::collections::HashMap;
use std::hash::Hash;

/// Group `items` by `key`, keeping groups in the order their key was first
/// seen and items in input order within each group.
pub(crate) fn group_first_seen<T, K, F>(items: impl IntoIterator<Item = T>, key: F) -> Vec<Vec<T>>
where
    K: Eq + Hash,
    F: Fn(&T) -> K,
{
    let mut slots: HashMap<K, usize> = HashMap::new();
    let mut groups: Vec<Vec<T>> = Vec::new();
    for item in items {
        let k = key(&item);
        let idx = *slots.entry(k).or_insert_with(|| {
            groups.push(Vec::new());
            groups.len() - 1
        });
        groups[idx].push(item);
    }
    groups
}

/// Most frequent value; the earliest one wins ties.
pub(crate) fn mode_first_seen<T: Eq + Hash + Copy>(values: &[T]) -> Option<T> {
    let mut counts: HashMap<T, usize> = HashMap::new();
    for v in values {
        *counts.entry(*v).or_insert(0) += 1;
    }
    let mut best: Option<(T, usize)> = None;
    for v in values {
        let c = counts[v];
        if best.is_none_or(|(_, bc)| c > bc) {
            best = Some((*v, c));
        }
    }
    best.map(|(v, _)| v)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn groups_keep_first_seen_order() {
        let groups = group_first_seen(vec![3, 1, 4, 1, 5, 9, 2, 6], |n| n % 3);
        assert_eq!(groups, vec![vec![3, 9, 6], vec![1, 4, 1], vec![5, 2]]);
    }

    #[test]
    fn mode_prefers_earliest_on_tie() {
        assert_eq!(mode_first_seen(&[7, 2, 2, 7]), Some(7));
        assert_eq!(mode_first_seen(&[1, 2, 2]), Some(2));
        assert_eq!(mode_first_seen::<i64>(&[]), None);
    }
}

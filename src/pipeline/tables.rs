//! Heuristic table-region detection from positioned spans.
//!
//! No ML model is involved; a table is recognised purely by alignment:
//! 1. Cluster spans into rows by vertical centre
//! 2. Find runs of consecutive rows with a similar number of cells
//! 3. Keep runs whose cell left edges line up in at least two columns
//! 4. Report each run's bounding box
//!
//! Detection is infallible: anything that does not look like a grid is simply
//! not a table.

use crate::layout::{BBox, Span};

/// Table detector tuning.
#[derive(Debug, Clone)]
pub struct TableDetectorConfig {
    /// Spans whose vertical centres differ by at most this share a row (points).
    pub row_tolerance: f32,
    /// Cell left edges within this distance count as one column (points).
    pub col_tolerance: f32,
    /// Minimum cells in a region.
    pub min_cells: usize,
    /// Minimum rows in a region.
    pub min_rows: usize,
    /// Minimum cells per row, and minimum aligned columns.
    pub min_cols: usize,
}

impl Default for TableDetectorConfig {
    fn default() -> Self {
        Self {
            row_tolerance: 5.0,
            col_tolerance: 10.0,
            min_cells: 6,
            min_rows: 2,
            min_cols: 2,
        }
    }
}

/// Group spans into visual rows, top to bottom, each row sorted left to right.
///
/// A span joins the first existing row whose first span's vertical centre is
/// within `tolerance` of its own.
pub fn cluster_rows(spans: &[Span], tolerance: f32) -> Vec<Vec<&Span>> {
    let mut ordered: Vec<&Span> = spans.iter().collect();
    ordered.sort_by(|a, b| a.bbox.y0.total_cmp(&b.bbox.y0).then(a.bbox.x0.total_cmp(&b.bbox.x0)));

    let mut rows: Vec<Vec<&Span>> = Vec::new();
    for span in ordered {
        let cy = center_y(span);
        match rows
            .iter()
            .position(|row| row.first().is_some_and(|first| (center_y(first) - cy).abs() <= tolerance))
        {
            Some(idx) => rows[idx].push(span),
            None => rows.push(vec![span]),
        }
    }

    for row in &mut rows {
        row.sort_by(|a, b| a.bbox.x0.total_cmp(&b.bbox.x0));
    }
    rows.sort_by(|a, b| {
        let ay = a.first().map(|s| s.bbox.y0).unwrap_or(0.0);
        let by = b.first().map(|s| s.bbox.y0).unwrap_or(0.0);
        ay.total_cmp(&by)
    });
    rows
}

/// Detect table regions on one page.
pub fn detect_tables(spans: &[Span], config: &TableDetectorConfig) -> Vec<BBox> {
    let cells: Vec<Span> = spans
        .iter()
        .filter(|s| !s.text.trim().is_empty())
        .cloned()
        .collect();
    if cells.len() < config.min_cells {
        return Vec::new();
    }

    let rows = cluster_rows(&cells, config.row_tolerance);
    find_regions(&rows, config)
        .into_iter()
        .filter(|region| is_grid(region, config))
        .filter_map(|region| region_bbox(&region))
        .collect()
}

/// Runs of consecutive multi-cell rows whose cell counts stay within ±1 of
/// the run's first row.
fn find_regions<'a>(rows: &[Vec<&'a Span>], config: &TableDetectorConfig) -> Vec<Vec<Vec<&'a Span>>> {
    let mut regions = Vec::new();
    let mut current: Vec<Vec<&Span>> = Vec::new();
    let mut expected_cols: Option<usize> = None;

    let close = |current: &mut Vec<Vec<&'a Span>>, regions: &mut Vec<Vec<Vec<&'a Span>>>| {
        if current.len() >= config.min_rows {
            regions.push(std::mem::take(current));
        } else {
            current.clear();
        }
    };

    for row in rows {
        let n = row.len();
        if n < config.min_cols {
            close(&mut current, &mut regions);
            expected_cols = None;
            continue;
        }
        match expected_cols {
            Some(exp) if n.abs_diff(exp) <= 1 => current.push(row.clone()),
            _ => {
                close(&mut current, &mut regions);
                current.push(row.clone());
                expected_cols = Some(n);
            }
        }
    }
    close(&mut current, &mut regions);
    regions
}

/// At least `min_cols` left edges of the first row reappear in every row,
/// and the region holds at least `min_cells` cells.
fn is_grid(region: &[Vec<&Span>], config: &TableDetectorConfig) -> bool {
    let total: usize = region.iter().map(Vec::len).sum();
    if total < config.min_cells {
        return false;
    }
    let Some(first) = region.first() else {
        return false;
    };
    let aligned = first
        .iter()
        .filter(|cell| {
            region.iter().skip(1).all(|row| {
                row.iter()
                    .any(|other| (other.bbox.x0 - cell.bbox.x0).abs() <= config.col_tolerance)
            })
        })
        .count();
    aligned >= config.min_cols
}

fn region_bbox(region: &[Vec<&Span>]) -> Option<BBox> {
    region
        .iter()
        .flatten()
        .map(|s| s.bbox)
        .reduce(|acc, b| acc.union(&b))
}

fn center_y(span: &Span) -> f32 {
    (span.bbox.y0 + span.bbox.y1) / 2.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cell(text: &str, x: f32, y: f32) -> Span {
        Span::new(text, BBox::new(x, y, x + 40.0, y + 10.0), 10.0)
    }

    #[test]
    fn rows_cluster_by_centre() {
        let spans = vec![cell("b", 100.0, 50.0), cell("a", 10.0, 51.0), cell("c", 10.0, 80.0)];
        let rows = cluster_rows(&spans, 5.0);
        assert_eq!(rows.len(), 2);
        let first: Vec<&str> = rows[0].iter().map(|s| s.text.as_str()).collect();
        assert_eq!(first, vec!["a", "b"]);
    }

    #[test]
    fn grid_is_detected() {
        let mut spans = Vec::new();
        for r in 0..4 {
            let y = 200.0 + r as f32 * 20.0;
            spans.push(cell("Name", 50.0, y));
            spans.push(cell("Qty", 200.0, y));
            spans.push(cell("Price", 350.0, y));
        }
        let tables = detect_tables(&spans, &TableDetectorConfig::default());
        assert_eq!(tables.len(), 1);
        assert_eq!(tables[0], BBox::new(50.0, 200.0, 390.0, 270.0));
    }

    #[test]
    fn prose_is_not_a_table() {
        let spans: Vec<Span> = (0..10)
            .map(|i| cell("A full line of running text", 72.0, 100.0 + i as f32 * 14.0))
            .collect();
        assert!(detect_tables(&spans, &TableDetectorConfig::default()).is_empty());
    }

    #[test]
    fn misaligned_rows_are_not_a_grid() {
        let spans = vec![
            cell("a", 10.0, 100.0),
            cell("b", 200.0, 100.0),
            cell("c", 400.0, 100.0),
            cell("d", 90.0, 120.0),
            cell("e", 300.0, 120.0),
            cell("f", 480.0, 120.0),
        ];
        assert!(detect_tables(&spans, &TableDetectorConfig::default()).is_empty());
    }
}

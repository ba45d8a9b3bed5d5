//! Directory batch mode: every `*.pdf` in an input directory becomes a
//! `<stem>.json` outline in an output directory.
//!
//! A batch never aborts because of one document. Each failure is logged,
//! recorded as a [`DocumentFailure`] and the next document is processed.
//! Only problems with the directories themselves are returned as errors.

use crate::convert::{write_outline, OutlineExtractor};
use crate::error::OutlineError;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{error, info};

/// An input directory and the output directory paired with it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchDirs {
    pub input: PathBuf,
    pub output: PathBuf,
}

impl BatchDirs {
    pub fn new(input: impl Into<PathBuf>, output: impl Into<PathBuf>) -> Self {
        Self {
            input: input.into(),
            output: output.into(),
        }
    }
}

/// Choose between a primary and a fallback directory pair.
///
/// The primary pair wins when its input directory exists and holds at least
/// one PDF. Pairs are never mixed: the fallback input always goes with the
/// fallback output.
pub fn resolve_dirs(primary: BatchDirs, fallback: Option<BatchDirs>) -> BatchDirs {
    let primary_has_pdfs = primary.input.is_dir()
        && discover_pdfs(&primary.input).is_ok_and(|pdfs| !pdfs.is_empty());

    match fallback {
        Some(fallback) if !primary_has_pdfs => {
            info!(
                "No PDFs in {}; using fallback directories {} → {}",
                primary.input.display(),
                fallback.input.display(),
                fallback.output.display()
            );
            fallback
        }
        _ => primary,
    }
}

/// PDFs directly inside `dir` (extension matched case-insensitively), sorted
/// by file name.
pub fn discover_pdfs(dir: &Path) -> Result<Vec<PathBuf>, OutlineError> {
    let dir_err = |e: std::io::Error| OutlineError::BatchDirectory {
        path: dir.to_path_buf(),
        source: e,
    };

    let mut pdfs = Vec::new();
    for entry in std::fs::read_dir(dir).map_err(dir_err)? {
        let path = entry.map_err(dir_err)?.path();
        let is_pdf = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"));
        if is_pdf && path.is_file() {
            pdfs.push(path);
        }
    }
    pdfs.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(pdfs)
}

/// A document that produced an outline file.
#[derive(Debug, Clone, Serialize)]
pub struct DocumentSuccess {
    pub input: PathBuf,
    pub output: PathBuf,
    pub entries: usize,
    pub duration_ms: u64,
}

/// A document that failed; the batch carried on without it.
#[derive(Debug, Clone, Serialize)]
pub struct DocumentFailure {
    pub input: PathBuf,
    pub error: String,
    pub duration_ms: u64,
}

/// Outcome of one batch run.
#[derive(Debug, Clone, Serialize)]
pub struct BatchReport {
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
    pub succeeded: Vec<DocumentSuccess>,
    pub failed: Vec<DocumentFailure>,
    pub duration_ms: u64,
}

impl BatchReport {
    pub fn total(&self) -> usize {
        self.succeeded.len() + self.failed.len()
    }
}

/// Extract every PDF in `dirs.input` and write `<stem>.json` files into
/// `dirs.output`, creating it if needed.
///
/// Documents run one after another; each document already fans its pages out
/// over the extractor's worker pool.
pub async fn process_directory(
    extractor: &OutlineExtractor,
    dirs: &BatchDirs,
) -> Result<BatchReport, OutlineError> {
    let start = Instant::now();
    tokio::fs::create_dir_all(&dirs.output)
        .await
        .map_err(|e| OutlineError::BatchDirectory {
            path: dirs.output.clone(),
            source: e,
        })?;

    let pdfs = discover_pdfs(&dirs.input)?;
    info!("Found {} PDFs in {}", pdfs.len(), dirs.input.display());

    let cb = extractor.config().progress_callback.clone();
    if let Some(cb) = &cb {
        cb.on_batch_start(pdfs.len());
    }

    let mut report = BatchReport {
        input_dir: dirs.input.clone(),
        output_dir: dirs.output.clone(),
        succeeded: Vec::new(),
        failed: Vec::new(),
        duration_ms: 0,
    };

    for input in pdfs {
        let doc_start = Instant::now();
        let output = dirs.output.join(output_file_name(&input));

        let result = match extractor.extract(&input).await {
            Ok(out) => write_outline(&out.outline, &output)
                .await
                .map(|_| out.outline.outline.len()),
            Err(e) => Err(e),
        };
        let duration_ms = doc_start.elapsed().as_millis() as u64;

        match result {
            Ok(entries) => {
                info!(
                    "Saved {} ({} entries) in {:.2}s",
                    output.display(),
                    entries,
                    duration_ms as f64 / 1000.0
                );
                report.succeeded.push(DocumentSuccess {
                    input,
                    output,
                    entries,
                    duration_ms,
                });
            }
            Err(e) => {
                error!("Failed to process {}: {}", input.display(), e);
                report.failed.push(DocumentFailure {
                    input,
                    error: e.to_string(),
                    duration_ms,
                });
            }
        }
    }

    report.duration_ms = start.elapsed().as_millis() as u64;
    if let Some(cb) = &cb {
        cb.on_batch_complete(report.total(), report.succeeded.len());
    }
    info!(
        "Batch complete: {}/{} documents in {}ms",
        report.succeeded.len(),
        report.total(),
        report.duration_ms
    );
    Ok(report)
}

/// `report.PDF` → `report.json`.
fn output_file_name(input: &Path) -> PathBuf {
    let mut name = input.file_stem().unwrap_or(input.as_os_str()).to_os_string();
    name.push(".json");
    PathBuf::from(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn touch(dir: &Path, name: &str, contents: &[u8]) {
        std::fs::write(dir.join(name), contents).unwrap();
    }

    #[test]
    fn discovers_pdfs_case_insensitively_sorted() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "b.PDF", b"%PDF");
        touch(dir.path(), "a.pdf", b"%PDF");
        touch(dir.path(), "notes.txt", b"x");
        std::fs::create_dir(dir.path().join("sub.pdf")).unwrap();

        let names: Vec<String> = discover_pdfs(dir.path())
            .unwrap()
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["a.pdf", "b.PDF"]);
    }

    #[test]
    fn missing_directory_is_error() {
        let err = discover_pdfs(Path::new("/no/such/dir")).unwrap_err();
        assert!(matches!(err, OutlineError::BatchDirectory { .. }));
    }

    #[test]
    fn primary_pair_used_when_it_has_pdfs() {
        let primary = tempfile::tempdir().unwrap();
        touch(primary.path(), "doc.pdf", b"%PDF");
        let chosen = resolve_dirs(
            BatchDirs::new(primary.path(), "/out/primary"),
            Some(BatchDirs::new("/in/fallback", "/out/fallback")),
        );
        assert_eq!(chosen, BatchDirs::new(primary.path(), "/out/primary"));
    }

    #[test]
    fn fallback_pair_never_mixed() {
        let empty = tempfile::tempdir().unwrap();
        let chosen = resolve_dirs(
            BatchDirs::new(empty.path(), "/out/primary"),
            Some(BatchDirs::new("/in/fallback", "/out/fallback")),
        );
        assert_eq!(chosen, BatchDirs::new("/in/fallback", "/out/fallback"));

        // Without a fallback the primary pair stays.
        let chosen = resolve_dirs(BatchDirs::new("/in/missing", "/out/primary"), None);
        assert_eq!(chosen.output, PathBuf::from("/out/primary"));
    }

    #[test]
    fn output_name_uses_stem() {
        assert_eq!(output_file_name(Path::new("/in/Report.v2.PDF")), PathBuf::from("Report.v2.json"));
    }
}

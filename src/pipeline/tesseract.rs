//! [`OcrEngine`] backed by the `tesseract` command-line tool.
//!
//! The page bitmap is written as a PNG to a temp file (lossless, so glyph
//! edges survive) and `tesseract <png> stdout tsv` is parsed. Only word rows
//! are kept; tesseract numbers lines per paragraph, so the engine line index
//! is assigned from the `(block, paragraph, line)` triple in first-seen order.

use super::ocr::{OcrEngine, OcrWord};
use crate::error::OutlineError;
use image::{DynamicImage, ImageFormat};
use std::collections::HashMap;
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use std::process::Command;
use tracing::debug;

/// TSV row level of a single word.
const WORD_LEVEL: u32 = 5;

/// Runs the `tesseract` binary once per page.
#[derive(Debug, Clone)]
pub struct TesseractEngine {
    binary: PathBuf,
    language: Option<String>,
}

impl TesseractEngine {
    /// Find `tesseract` on `PATH`.
    pub fn locate() -> Result<Self, OutlineError> {
        let binary = which::which("tesseract").map_err(|e| OutlineError::OcrEngineUnavailable {
            engine: "tesseract".into(),
            hint: format!(
                "{e}\nInstall it with: apt install tesseract-ocr (Debian/Ubuntu) or brew install tesseract (macOS)"
            ),
        })?;
        Ok(Self::with_binary(binary))
    }

    /// Use an explicit binary path.
    pub fn with_binary(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
            language: None,
        }
    }

    /// Tesseract language pack(s), e.g. `"eng"` or `"eng+deu"`.
    pub fn language(mut self, lang: impl Into<String>) -> Self {
        self.language = Some(lang.into());
        self
    }
}

impl OcrEngine for TesseractEngine {
    fn name(&self) -> &str {
        "tesseract"
    }

    fn recognize(&self, image: &DynamicImage, page: usize) -> Result<Vec<OcrWord>, OutlineError> {
        let ocr_err = |detail: String| OutlineError::OcrFailed { page, detail };

        let png = tempfile::Builder::new()
            .prefix("pdf-outline-")
            .suffix(".png")
            .tempfile()
            .map_err(|e| ocr_err(format!("temp file: {e}")))?;
        let mut writer = BufWriter::new(png.as_file());
        image
            .write_to(&mut writer, ImageFormat::Png)
            .map_err(|e| ocr_err(format!("PNG encode: {e}")))?;
        writer
            .flush()
            .map_err(|e| ocr_err(format!("PNG write: {e}")))?;
        drop(writer);

        let mut cmd = Command::new(&self.binary);
        cmd.arg(png.path()).arg("stdout");
        if let Some(lang) = &self.language {
            cmd.arg("-l").arg(lang);
        }
        cmd.arg("tsv");

        let output = cmd
            .output()
            .map_err(|e| ocr_err(format!("cannot run {}: {e}", self.binary.display())))?;
        if !output.status.success() {
            return Err(ocr_err(format!(
                "tesseract exited with {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        let words = parse_tsv(&String::from_utf8_lossy(&output.stdout));
        debug!("Page {}: tesseract returned {} words", page, words.len());
        Ok(words)
    }
}

/// Parse tesseract TSV output into words.
///
/// Columns: `level page_num block_num par_num line_num word_num left top
/// width height conf text`. The header and malformed rows are skipped.
pub fn parse_tsv(tsv: &str) -> Vec<OcrWord> {
    let mut line_ids: HashMap<(u32, u32, u32), usize> = HashMap::new();
    let mut words = Vec::new();

    for row in tsv.lines() {
        let cols: Vec<&str> = row.split('\t').collect();
        if cols.len() < 12 {
            continue;
        }
        let Ok(level) = cols[0].parse::<u32>() else {
            continue;
        };
        let text = cols[11].trim();
        if level != WORD_LEVEL || text.is_empty() {
            continue;
        }
        let nums: Option<Vec<f32>> = cols[2..10].iter().map(|c| c.trim().parse::<f32>().ok()).collect();
        let Some(n) = nums else {
            continue;
        };
        let key = (n[0] as u32, n[1] as u32, n[2] as u32);
        let next_id = line_ids.len();
        let line = *line_ids.entry(key).or_insert(next_id);

        words.push(OcrWord {
            text: text.to_string(),
            left: n[4],
            top: n[5],
            width: n[6],
            height: n[7],
            line,
        });
    }

    words
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "level\tpage_num\tblock_num\tpar_num\tline_num\tword_num\tleft\ttop\twidth\theight\tconf\ttext
1\t1\t0\t0\t0\t0\t0\t0\t1275\t1650\t-1\t
4\t1\t1\t1\t1\t0\t100\t90\t400\t40\t-1\t
5\t1\t1\t1\t1\t1\t100\t90\t180\t40\t95.1\tAnnual
5\t1\t1\t1\t1\t2\t300\t92\t200\t38\t94.0\tReport
5\t1\t1\t1\t1\t3\t520\t92\t10\t38\t10.0\t
5\t1\t2\t1\t1\t1\t100\t300\t90\t20\t91.3\tScope
5\t1\t1\t1\t2\t1\t100\t150\t90\t20\t90.0\tSummary
bad row
";

    #[test]
    fn tsv_words_and_line_ids() {
        let words = parse_tsv(SAMPLE);
        let texts: Vec<&str> = words.iter().map(|w| w.text.as_str()).collect();
        assert_eq!(texts, vec!["Annual", "Report", "Scope", "Summary"]);
        // Block 2 line 1 and block 1 line 2 are different lines from block 1
        // line 1, numbered as first encountered.
        let lines: Vec<usize> = words.iter().map(|w| w.line).collect();
        assert_eq!(lines, vec![0, 0, 1, 2]);
        assert_eq!(words[1].left, 300.0);
        assert_eq!(words[1].height, 38.0);
    }

    #[test]
    fn empty_output_yields_no_words() {
        assert!(parse_tsv("").is_empty());
    }

    #[test]
    fn explicit_binary_engine_reports_name() {
        let engine = TesseractEngine::with_binary("/usr/bin/tesseract").language("eng");
        assert_eq!(engine.name(), "tesseract");
        assert_eq!(engine.language.as_deref(), Some("eng"));
    }
}

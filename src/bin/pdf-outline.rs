//! CLI binary for pdf-outline.
//!
//! A thin shim over the library crate that maps CLI flags to
//! `OutlineConfig` and either prints one outline or processes a directory.

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use pdf_outline::{
    process_directory, resolve_dirs, BatchDirs, LeaderCheck, OutlineConfig, OutlineExtractor,
    OutlineProgressCallback, ProgressCallback, SpacingRepair,
};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

const TICKS: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"];

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress callback: a spinner for single documents that turns
/// into a document counter once a batch announces its size.
struct CliProgressCallback {
    bar: ProgressBar,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new(0);
        let spinner_style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(TICKS);
        bar.set_style(spinner_style);
        bar.set_prefix("Preparing");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self { bar })
    }

    fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

impl OutlineProgressCallback for CliProgressCallback {
    fn on_batch_start(&self, total_documents: usize) {
        let style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {pos:>3}/{len} documents  \
             ⏱ {elapsed_precise}  ETA {eta_precise}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(TICKS);

        self.bar.set_length(total_documents as u64);
        self.bar.set_style(style);
        self.bar.set_prefix("Extracting");
        self.bar.reset_eta();
        self.bar.println(format!(
            "{} {}",
            cyan("◆"),
            bold(&format!("Processing {total_documents} documents…"))
        ));
    }

    fn on_document_start(&self, name: &str) {
        self.bar.set_prefix("Extracting");
        self.bar.set_message(name.to_string());
    }

    fn on_document_complete(&self, name: &str, entries: usize, elapsed_ms: u64) {
        self.bar.println(format!(
            "  {} {:<40}  {:<12}  {}",
            green("✓"),
            name,
            dim(&format!("{entries:>4} headings")),
            dim(&format!("{:.2}s", elapsed_ms as f64 / 1000.0)),
        ));
        self.bar.inc(1);
    }

    fn on_document_error(&self, name: &str, error: &str) {
        // First line only; hints follow on later lines.
        let first = error.lines().next().unwrap_or(error);
        let msg: String = if first.chars().count() > 80 {
            format!("{}\u{2026}", first.chars().take(79).collect::<String>())
        } else {
            first.to_string()
        };
        self.bar.println(format!("  {} {:<40}  {}", red("✗"), name, red(&msg)));
        self.bar.inc(1);
    }

    fn on_batch_complete(&self, total_documents: usize, success_count: usize) {
        let failed = total_documents.saturating_sub(success_count);
        self.bar.finish_and_clear();
        if failed == 0 {
            eprintln!(
                "{} {} documents processed successfully",
                green("✔"),
                bold(&success_count.to_string())
            );
        } else {
            eprintln!(
                "{} {}/{} documents processed  ({} failed)",
                if failed == total_documents {
                    red("✘")
                } else {
                    cyan("⚠")
                },
                bold(&success_count.to_string()),
                total_documents,
                red(&failed.to_string()),
            );
        }
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Outline of one PDF (JSON on stdout)
  pdf-outline report.pdf

  # Write the outline to a file
  pdf-outline report.pdf -o report.json

  # Every PDF in a directory → <stem>.json in another directory
  pdf-outline ./pdfs -o ./outlines

  # Container mode: /app/input → /app/output, falling back to the sample set
  pdf-outline

  # No OCR, more workers, debug logs
  pdf-outline --no-ocr --concurrency 16 -v report.pdf

OUTPUT FORMAT:
  {
    "title": "Annual Report 2024",
    "outline": [
      { "level": "H1", "text": "Introduction", "page": 1 },
      { "level": "H2", "text": "Scope", "page": 2 }
    ]
  }

ENVIRONMENT VARIABLES:
  PDFIUM_LIB_PATH         Path to libpdfium (file or directory)
  PDF_OUTLINE_*           Every flag has one, e.g. PDF_OUTLINE_CONCURRENCY
  RUST_LOG                Overrides the log filter (e.g. pdf_outline=trace)

SETUP:
  pdfium must be available as a shared library: next to the binary, installed
  system-wide, or pointed to by PDFIUM_LIB_PATH. OCR of scanned pages needs
  the `tesseract` binary on PATH; without it those pages keep their raw text.
"#;

/// Extract a title and heading outline from PDF files.
#[derive(Parser, Debug)]
#[command(
    name = "pdf-outline",
    version,
    about = "Extract a title and H1/H2/H3 outline from PDF files",
    long_about = "Extract a document title and an H1/H2/H3 heading outline from PDF files using \
layout heuristics (font size, position, spacing). Scanned or garbled pages are read with \
tesseract OCR when it is installed.",
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// PDF file or directory of PDFs. Omit to use the input/output directory flags.
    input: Option<PathBuf>,

    /// Output JSON file (single PDF) or directory (directory input).
    #[arg(short, long, env = "PDF_OUTLINE_OUTPUT")]
    output: Option<PathBuf>,

    /// Batch input directory used when INPUT is omitted.
    #[arg(long, env = "PDF_OUTLINE_INPUT_DIR", default_value = "/app/input")]
    input_dir: PathBuf,

    /// Batch output directory paired with --input-dir.
    #[arg(long, env = "PDF_OUTLINE_OUTPUT_DIR", default_value = "/app/output")]
    output_dir: PathBuf,

    /// Input directory used when --input-dir holds no PDFs.
    #[arg(long, env = "PDF_OUTLINE_FALLBACK_INPUT_DIR", default_value = "/app/sample_dataset/pdfs")]
    fallback_input_dir: PathBuf,

    /// Output directory paired with --fallback-input-dir.
    #[arg(long, env = "PDF_OUTLINE_FALLBACK_OUTPUT_DIR", default_value = "/app/sample_dataset/outputs")]
    fallback_output_dir: PathBuf,

    /// Number of pages processed concurrently.
    #[arg(short, long, env = "PDF_OUTLINE_CONCURRENCY", default_value_t = 8)]
    concurrency: usize,

    /// Rendering DPI for OCR (72–400).
    #[arg(long, env = "PDF_OUTLINE_DPI", default_value_t = 150,
          value_parser = clap::value_parser!(u32).range(72..=400))]
    dpi: u32,

    /// Disable OCR of pages with broken text.
    #[arg(long, env = "PDF_OUTLINE_NO_OCR")]
    no_ocr: bool,

    /// PDF user password for encrypted documents.
    #[arg(long, env = "PDF_OUTLINE_PASSWORD")]
    password: Option<String>,

    /// Path to libpdfium (file or directory).
    #[arg(long, env = "PDFIUM_LIB_PATH")]
    pdfium_lib: Option<PathBuf>,

    /// Letter-spacing repair: off, single-capital, collapse-letters.
    #[arg(long, env = "PDF_OUTLINE_SPACING_REPAIR", value_enum, default_value = "single-capital")]
    spacing_repair: SpacingRepairArg,

    /// Leader-line screening in block merge: per-fragment, trailing-line.
    #[arg(long, env = "PDF_OUTLINE_LEADER_CHECK", value_enum, default_value = "per-fragment")]
    leader_check: LeaderCheckArg,

    /// Fraction of pages above which a repeated heading is dropped.
    #[arg(long, env = "PDF_OUTLINE_REPETITION_THRESHOLD", default_value_t = 0.7)]
    repetition_threshold: f32,

    /// Emit `null` instead of "Untitled Document" when no title is found.
    #[arg(long, env = "PDF_OUTLINE_NO_FALLBACK_TITLE")]
    no_fallback_title: bool,

    /// Print outline plus run statistics (single PDF only).
    #[arg(long, env = "PDF_OUTLINE_STATS")]
    stats: bool,

    /// Disable progress bar.
    #[arg(long, env = "PDF_OUTLINE_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "PDF_OUTLINE_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "PDF_OUTLINE_QUIET")]
    quiet: bool,
}

#[derive(clap::ValueEnum, Clone, Debug)]
enum SpacingRepairArg {
    Off,
    SingleCapital,
    CollapseLetters,
}

impl From<SpacingRepairArg> for SpacingRepair {
    fn from(v: SpacingRepairArg) -> Self {
        match v {
            SpacingRepairArg::Off => SpacingRepair::Off,
            SpacingRepairArg::SingleCapital => SpacingRepair::SingleCapital,
            SpacingRepairArg::CollapseLetters => SpacingRepair::CollapseLetters,
        }
    }
}

#[derive(clap::ValueEnum, Clone, Debug)]
enum LeaderCheckArg {
    PerFragment,
    TrailingLine,
}

impl From<LeaderCheckArg> for LeaderCheck {
    fn from(v: LeaderCheckArg) -> Self {
        match v {
            LeaderCheckArg::PerFragment => LeaderCheck::PerFragment,
            LeaderCheckArg::TrailingLine => LeaderCheck::TrailingLine,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The progress bar replaces INFO logs; verbose mode always gets them.
    let show_progress = !cli.quiet && !cli.no_progress;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .with_writer(io::stderr)
        .init();

    let progress = show_progress.then(CliProgressCallback::new);
    let config = build_config(&cli, progress.clone().map(|cb| cb as ProgressCallback))?;
    let extractor = OutlineExtractor::new(config);

    let result = match &cli.input {
        Some(input) if input.is_dir() => {
            let output = cli.output.clone().unwrap_or_else(|| input.clone());
            run_batch(&extractor, BatchDirs::new(input, output), &cli).await
        }
        Some(input) => run_single(&extractor, input, &cli).await,
        None => {
            let dirs = resolve_dirs(
                BatchDirs::new(&cli.input_dir, &cli.output_dir),
                Some(BatchDirs::new(&cli.fallback_input_dir, &cli.fallback_output_dir)),
            );
            run_batch(&extractor, dirs, &cli).await
        }
    };
    if let Some(cb) = &progress {
        cb.finish();
    }
    result
}

async fn run_single(extractor: &OutlineExtractor, input: &Path, cli: &Cli) -> Result<()> {
    let output = extractor
        .extract(input)
        .await
        .with_context(|| format!("Outline extraction failed for {}", input.display()))?;

    if let Some(ref path) = cli.output {
        pdf_outline::write_outline(&output.outline, path)
            .await
            .context("Failed to write outline")?;
        if !cli.quiet {
            eprintln!(
                "{}  {} headings  {}/{} pages OCR  {}ms  →  {}",
                green("✔"),
                output.stats.outline_entries,
                output.stats.ocr_pages,
                output.stats.total_pages,
                output.stats.duration_ms,
                bold(&path.display().to_string()),
            );
        }
        return Ok(());
    }

    let json = if cli.stats {
        serde_json::to_string_pretty(&output).context("Failed to serialise output")?
    } else {
        output.outline.to_json().context("Failed to serialise outline")?
    };
    let stdout = io::stdout();
    let mut handle = stdout.lock();
    writeln!(handle, "{json}").context("Failed to write to stdout")?;
    Ok(())
}

async fn run_batch(extractor: &OutlineExtractor, dirs: BatchDirs, cli: &Cli) -> Result<()> {
    if !cli.quiet {
        eprintln!(
            "{} {} → {}",
            dim("Directories:"),
            dirs.input.display(),
            dirs.output.display()
        );
    }
    let report = process_directory(extractor, &dirs)
        .await
        .context("Batch processing failed")?;

    if report.total() == 0 && !cli.quiet {
        eprintln!("No PDF files found in {}.", dirs.input.display());
    }
    if !report.failed.is_empty() {
        anyhow::bail!(
            "{} of {} documents failed",
            report.failed.len(),
            report.total()
        );
    }
    Ok(())
}

/// Map CLI args to `OutlineConfig`.
fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<OutlineConfig> {
    let mut builder = OutlineConfig::builder()
        .concurrency(cli.concurrency)
        .dpi(cli.dpi)
        .enable_ocr(!cli.no_ocr)
        .spacing_repair(cli.spacing_repair.clone().into())
        .leader_check(cli.leader_check.clone().into())
        .repetition_threshold(cli.repetition_threshold);

    if let Some(ref pwd) = cli.password {
        builder = builder.password(pwd);
    }
    if let Some(ref lib) = cli.pdfium_lib {
        builder = builder.pdfium_library_path(lib);
    }
    if cli.no_fallback_title {
        builder = builder.fallback_title(None);
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}

//! CLI binary for the ACRIS download pipeline.
//!
//! A thin shim over the library crate that maps CLI flags to `FetchConfig`
//! and prints a per-page progress bar plus a final summary.

use acris_scout::{
    fetch_document, AcrisError, FetchConfig, FetchProgress, ProgressHandle, StopReason,
};
use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use std::io;
use std::path::PathBuf;
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
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress: a spinner while the viewer page is inspected, then a
/// page-counting bar once the total is known.
struct CliProgress {
    bar: ProgressBar,
}

impl CliProgress {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new(0);
        bar.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        bar.set_prefix("Preparing");
        bar.set_message("Fetching document metadata…");
        bar.enable_steady_tick(Duration::from_millis(80));
        Arc::new(Self { bar })
    }
}

impl FetchProgress for CliProgress {
    fn on_metadata(&self, total_pages: u32) {
        self.bar.set_length(total_pages as u64);
        self.bar.set_style(
            ProgressStyle::with_template(
                "{spinner:.cyan} {prefix:.bold}  [{bar:42.green/238}] {pos:>3}/{len} pages  ⏱ {elapsed_precise}",
            )
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█▉▊▋▌▍▎▏  "),
        );
        self.bar.set_prefix("Downloading");
        self.bar.println(format!(
            "{} {}",
            cyan("◆"),
            bold(&format!("Document has {total_pages} pages"))
        ));
    }

    fn on_page_start(&self, page: u32, _total: u32) {
        self.bar.set_message(format!("page {page}"));
    }

    fn on_page_done(&self, page: u32, total: u32) {
        self.bar
            .println(format!("  {} Page {page:>3}/{total:<3}", green("✓")));
        self.bar.inc(1);
    }

    fn on_stopped(&self, reason: &StopReason) {
        self.bar
            .println(format!("  {} {}", red("✗"), red(&reason.to_string())));
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Download by document ID into the current directory
  acris-fetch FT_1234567890123

  # Paste a viewer URL straight from the browser
  acris-fetch "https://a836-acris.nyc.gov/DS/DocumentSearch/DocumentImageView?doc_id=FT_1234567890123"

  # Choose an output directory
  acris-fetch FT_1234567890123 -o ~/deeds

EXIT CODES:
  1  missing argument, or no usable document ID in the input
  0  otherwise; the summary line reports how many pages were merged
"#;

/// Download a scanned ACRIS document and assemble it into one PDF.
#[derive(Parser, Debug)]
#[command(
    name = "acris-fetch",
    version,
    about = "Download a scanned ACRIS document and assemble it into one PDF",
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Document ID, or an ACRIS URL containing doc_id=<ID>.
    input: Option<String>,

    /// Directory to write <doc_id>.pdf into.
    #[arg(short, long, env = "ACRIS_OUTPUT_DIR", default_value = ".")]
    output_dir: PathBuf,

    /// ACRIS host (useful against a mirror or a local test server).
    #[arg(long, env = "ACRIS_BASE_URL", default_value = acris_scout::config::DEFAULT_BASE_URL)]
    base_url: String,

    /// Per-page request timeout in seconds.
    #[arg(long, env = "ACRIS_PAGE_TIMEOUT", default_value_t = 20)]
    page_timeout: u64,

    /// Disable the progress bar.
    #[arg(long, env = "ACRIS_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "ACRIS_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "ACRIS_QUIET")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The progress bar is the user-facing feedback; library INFO logs only
    // appear when the bar is off or verbose is on.
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

    // A missing argument exits 1, matching the no-usable-identifier case.
    let Some(input) = cli.input else {
        eprintln!("Usage: acris-fetch <doc_id_or_url> [-o DIR]");
        std::process::exit(1);
    };

    // ── Build config ─────────────────────────────────────────────────────
    let mut builder = FetchConfig::builder()
        .base_url(&cli.base_url)
        .output_dir(&cli.output_dir)
        .page_timeout_secs(cli.page_timeout);

    let progress: Option<ProgressHandle> = show_progress.then(|| {
        let cb = CliProgress::new();
        cb as ProgressHandle
    });
    if let Some(cb) = progress {
        builder = builder.progress(cb);
    }

    let config = builder.build().context("Invalid configuration")?;

    // ── Run the download ─────────────────────────────────────────────────
    let output = match fetch_document(&input, &config).await {
        Ok(output) => output,
        Err(AcrisError::InvalidDocId { input }) => {
            eprintln!("{} No usable document ID in '{input}'", red("✘"));
            std::process::exit(1);
        }
        // Other fatal errors report but keep the historical exit code 0:
        // callers read the summary, not the code.
        Err(e) => {
            eprintln!("{} {e}", red("✘"));
            return Ok(());
        }
    };

    // ── Summary ──────────────────────────────────────────────────────────
    if !cli.quiet {
        let tick = if output.success() { green("✔") } else { red("✘") };
        eprintln!(
            "{tick} Merged {} of {} pages in {}ms",
            bold(&output.merged_pages.to_string()),
            output.total_pages,
            output.duration_ms,
        );
        if let Some(reason) = &output.stopped {
            eprintln!("   stopped early: {reason}");
        }
        if let Some(path) = &output.artifact {
            eprintln!("   → {}", bold(&path.display().to_string()));
        }
    }

    Ok(())
}

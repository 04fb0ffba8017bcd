//! CLI binary for the ACRIS parcel search pipeline.
//!
//! A thin shim over the library crate: three positional arguments in, one
//! line (or JSON object) per discovered document out.

use acris_scout::{search_parcel, AcrisError, ParcelQuery, SearchConfig};
use anyhow::{Context, Result};
use clap::Parser;
use std::io;
use tracing_subscriber::EnvFilter;

fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Search a Brooklyn parcel
  acris-search BROOKLYN 1234 56

  # Aliases and prefixes resolve too
  acris-search kings 1234 56
  acris-search "staten is" 100 7

  # Machine-readable output
  acris-search --json QUEENS 987 65

EXIT CODES:
  1  wrong argument count, or the borough could not be resolved
  0  otherwise
"#;

/// Search ACRIS for documents recorded against a borough/block/lot parcel.
#[derive(Parser, Debug)]
#[command(
    name = "acris-search",
    version,
    about = "Search ACRIS for documents recorded against a borough/block/lot parcel",
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Borough name, alias, or prefix (e.g. BROOKLYN, kings, "staten is").
    borough: Option<String>,

    /// Tax block.
    block: Option<String>,

    /// Tax lot.
    lot: Option<String>,

    /// Print records as a JSON array instead of text lines.
    #[arg(long, env = "ACRIS_JSON")]
    json: bool,

    /// ACRIS host (useful against a mirror or a local test server).
    #[arg(long, env = "ACRIS_BASE_URL", default_value = acris_scout::config::DEFAULT_BASE_URL)]
    base_url: String,

    /// Run Chrome with a visible window (debugging aid).
    #[arg(long, env = "ACRIS_HEADED")]
    headed: bool,

    /// Seconds to wait for the results page after submitting.
    #[arg(long, env = "ACRIS_NAV_TIMEOUT", default_value_t = 60)]
    nav_timeout: u64,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "ACRIS_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors and records.
    #[arg(short, long, env = "ACRIS_QUIET")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "error"
    } else {
        "info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .with_writer(io::stderr)
        .init();

    // All three positionals are required; a missing one exits 1.
    let (Some(borough), Some(block), Some(lot)) = (cli.borough, cli.block, cli.lot) else {
        eprintln!("Usage: acris-search <borough> <block> <lot>");
        std::process::exit(1);
    };

    let config = SearchConfig::builder()
        .base_url(&cli.base_url)
        .headless(!cli.headed)
        .nav_timeout_secs(cli.nav_timeout)
        .build()
        .context("Invalid configuration")?;

    let query = ParcelQuery::new(borough, block, lot);
    let records = match search_parcel(&query, &config).await {
        Ok(records) => records,
        Err(e @ AcrisError::BoroughUnresolved { .. }) => {
            eprintln!("{} {e}", red("✘"));
            std::process::exit(1);
        }
        Err(e) => return Err(e).context("Search failed"),
    };

    if cli.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&records).context("Failed to serialise records")?
        );
    } else if records.is_empty() {
        eprintln!("No documents found for this parcel.");
    } else {
        for record in &records {
            println!("{}  {}", bold(&record.document_id), record.doc_type);
        }
        eprintln!("{} documents", records.len());
    }

    Ok(())
}

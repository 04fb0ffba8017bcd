//! # acris-scout
//!
//! Fetch scanned property-record documents from NYC ACRIS and assemble them
//! into a single PDF, or search a parcel (borough/block/lot) for its
//! recorded documents.
//!
//! ## Why this crate?
//!
//! ACRIS serves each document as a pile of per-page TIFF scans behind a
//! cookie-gated viewer, and hides its parcel search behind a script-heavy
//! form that plain HTTP clients cannot submit. This crate does the tedious
//! parts: session bootstrap, page-count discovery, fault-tolerant page
//! retrieval, PDF assembly, and browser-driven form automation with table
//! scraping.
//!
//! ## Pipeline Overview
//!
//! ```text
//! download:
//!  input ─▶ docid     resolve bare ID or viewer URL to a document ID
//!        ─▶ session   cookie-bearing client + best-effort warm-up
//!        ─▶ metadata  viewer page → "hid_TotalPages" → page count
//!        ─▶ retrieve  fetch pages 1..N, stop at first failure, keep prefix
//!        ─▶ assemble  ordered RGB pages → one multi-page PDF
//!
//! search:
//!  parcel ─▶ borough  free text → form code "1".."5"
//!         ─▶ search   headless Chrome drives the BBL form
//!         ─▶ extract  results table rows → {document_id, doc_type}
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use acris_scout::{fetch_document, FetchConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = FetchConfig::default();
//!     let output = fetch_document("FT_1234567890123", &config).await?;
//!     println!(
//!         "merged {} of {} pages -> {:?}",
//!         output.merged_pages, output.total_pages, output.artifact
//!     );
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `acris-fetch` and `acris-search` binaries (clap + anyhow + indicatif + tracing-subscriber) |

// ── Modules ──────────────────────────────────────────────────────────────

pub mod borough;
pub mod config;
pub mod docid;
pub mod error;
pub mod fetch;
pub mod pipeline;
pub mod progress;
pub mod search;
pub mod session;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use borough::resolve_borough;
pub use config::{FetchConfig, FetchConfigBuilder, SearchConfig, SearchConfigBuilder};
pub use docid::resolve_doc_id;
pub use error::{AcrisError, StopReason};
pub use fetch::{fetch_document, FetchOutput};
pub use pipeline::extract::{extract_records, DocumentRecord};
pub use pipeline::retrieve::{PageBody, PageImage, PageSource};
pub use progress::{FetchProgress, ProgressHandle};
pub use search::{search_parcel, ParcelQuery};
pub use session::{Session, WarmUp};

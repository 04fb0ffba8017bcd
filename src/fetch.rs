//! Download pipeline: raw identifier in, multi-page PDF out.
//!
//! ## Failure policy, stage by stage
//!
//! The stages disagree on how bad a failure is, deliberately:
//! identifier resolution and the viewer page are fatal (nothing sensible
//! can happen without them); the warm-up is advisory and its failure is
//! ignored; a page fetch ends the loop but keeps what came before; and the
//! assembler reports zero pages rather than erroring on an empty sequence.
//! [`FetchOutput`] surfaces all of it so callers see exactly how far the
//! run got.

use crate::config::FetchConfig;
use crate::docid::resolve_doc_id;
use crate::error::{AcrisError, StopReason};
use crate::pipeline::{assemble, metadata, retrieve};
use crate::session::Session;
use serde::Serialize;
use std::path::PathBuf;
use std::time::Instant;
use tracing::info;

/// Result of one download run, including partial ones.
#[derive(Debug, Serialize)]
pub struct FetchOutput {
    /// The resolved document identifier.
    pub doc_id: String,
    /// Page count discovered from the viewer page (1 if undetermined).
    pub total_pages: u32,
    /// Pages actually fetched, decoded, and merged into the artifact.
    pub merged_pages: usize,
    /// Path of the written artifact; `None` when no page survived.
    pub artifact: Option<PathBuf>,
    /// Why retrieval ended early, if it did.
    pub stopped: Option<StopReason>,
    /// Wall-clock duration of the whole run.
    pub duration_ms: u64,
}

impl FetchOutput {
    /// The pipeline's success signal: at least one page was merged.
    pub fn success(&self) -> bool {
        self.merged_pages > 0
    }
}

/// Download a registry document and assemble it into a single PDF.
///
/// `input_str` is either a bare document ID or an ACRIS URL containing a
/// `doc_id` query parameter. The artifact lands at
/// `<output_dir>/<doc_id>.pdf`.
///
/// # Errors
/// Returns `Err(AcrisError)` only for fatal conditions (unusable
/// identifier, unreachable viewer page, unwritable artifact). Per-page
/// failures end retrieval early but still produce an `Ok(FetchOutput)`
/// carrying the partial result; check [`FetchOutput::success`].
pub async fn fetch_document(
    input_str: &str,
    config: &FetchConfig,
) -> Result<FetchOutput, AcrisError> {
    let started = Instant::now();

    // ── Step 1: Resolve the document identifier ──────────────────────────
    let doc_id = resolve_doc_id(input_str)?;
    info!("Starting download for document {doc_id}");

    // ── Step 2: Fresh session + advisory warm-up ─────────────────────────
    let session = Session::new(config)?;
    let _ = session.warm_up(config).await;

    // ── Step 3: Discover the page count ──────────────────────────────────
    let total_pages = metadata::fetch_total_pages(&session, &doc_id, config).await?;
    if let Some(cb) = &config.progress {
        cb.on_metadata(total_pages);
    }

    // ── Step 4: Retrieve pages until done or stopped ─────────────────────
    let mut source = retrieve::HttpPageSource::new(&session, &doc_id, config);
    let (pages, stopped) = retrieve::collect_pages(
        &mut source,
        total_pages,
        config.min_image_bytes,
        config.progress.as_deref(),
    )
    .await;

    // ── Step 5: Assemble the artifact ────────────────────────────────────
    let dest = config.output_dir.join(format!("{doc_id}.pdf"));
    let merged_pages = assemble::write_pdf(pages, &dest, config.resolution_dpi).await?;
    let artifact = (merged_pages > 0).then_some(dest);

    let output = FetchOutput {
        doc_id,
        total_pages,
        merged_pages,
        artifact,
        stopped,
        duration_ms: started.elapsed().as_millis() as u64,
    };
    info!(
        "Download finished: merged {} of {} pages in {}ms",
        output.merged_pages, output.total_pages, output.duration_ms
    );
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_requires_at_least_one_page() {
        let mut out = FetchOutput {
            doc_id: "X".into(),
            total_pages: 3,
            merged_pages: 0,
            artifact: None,
            stopped: None,
            duration_ms: 1,
        };
        assert!(!out.success());
        out.merged_pages = 1;
        assert!(out.success());
    }
}

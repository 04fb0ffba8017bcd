//! Progress reporting for the download pipeline.
//!
//! The library reports through a trait rather than printing, so the CLI can
//! render a live bar while embedders log or ignore events. All methods have
//! empty default bodies; implementors override only what they display.

use crate::error::StopReason;
use std::sync::Arc;

/// Callback surface for download progress. All methods are optional.
///
/// Invoked from the pipeline's single task, in order: `on_metadata` once,
/// then `on_page_start`/`on_page_done` per page, and `on_stopped` at most
/// once if retrieval ended early.
pub trait FetchProgress: Send + Sync {
    /// Total page count discovered from the viewer page.
    fn on_metadata(&self, _total_pages: u32) {}

    /// A page request is about to be issued.
    fn on_page_start(&self, _page: u32, _total: u32) {}

    /// A page was fetched, decoded, and queued for assembly.
    fn on_page_done(&self, _page: u32, _total: u32) {}

    /// Retrieval stopped before the last page.
    fn on_stopped(&self, _reason: &StopReason) {}
}

/// Shared handle to a progress callback.
pub type ProgressHandle = Arc<dyn FetchProgress>;

//! Error types for the acris-scout library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`AcrisError`] — **Fatal**: the pipeline cannot proceed at all
//!   (no usable document ID, viewer page unreachable, browser died).
//!   Returned as `Err(AcrisError)` from the top-level entry points.
//!
//! * [`StopReason`] — **Non-fatal**: the page-retrieval loop ended early
//!   (bad status, error page in place of an image, decode failure). Pages
//!   fetched before the stop are kept and assembled; the reason is carried
//!   in [`crate::fetch::FetchOutput`] so callers can report partial success.
//!
//! The warm-up request has a third, even softer mode: its failure is a
//! logged status ([`crate::session::WarmUp`]), never an error.

use serde::Serialize;
use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the acris-scout library.
///
/// Page-level failures use [`StopReason`] and are stored in
/// [`crate::fetch::FetchOutput`] rather than propagated here.
#[derive(Debug, Error)]
pub enum AcrisError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// No document ID could be produced from the raw input.
    #[error("No usable document ID in '{input}'\nPass a bare ID or an ACRIS URL containing doc_id=<ID>.")]
    InvalidDocId { input: String },

    /// Borough text matched nothing in the borough table, not even by prefix.
    #[error("Could not resolve borough '{input}' to a code (1-5).\nTry MANHATTAN, BRONX, BROOKLYN, QUEENS, or STATEN ISLAND (aliases and prefixes work).")]
    BoroughUnresolved { input: String },

    // ── Download-pipeline errors ──────────────────────────────────────────
    /// The document viewer page could not be fetched. Fatal: without it we
    /// have no page count and no session state worth continuing with.
    #[error("Failed to fetch document viewer page '{url}': {reason}")]
    ViewerPage { url: String, reason: String },

    /// The assembled PDF could not be written to disk.
    #[error("Failed to write artifact '{path}': {source}")]
    OutputWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Search-pipeline errors ────────────────────────────────────────────
    /// Launching or driving the browser failed.
    #[error("Browser automation failed: {detail}")]
    Browser { detail: String },

    /// The BBL results page never appeared within the navigation timeout.
    #[error("Timed out after {secs}s waiting for the BBL results page.\nACRIS may be slow or the parcel form may have rejected the input.")]
    ResultsTimeout { secs: u64 },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Why the page-retrieval loop stopped before reaching the last page.
///
/// Retrieval keeps every page fetched before the stop; this is the reason
/// attached to the partial result. None of these trigger a retry.
#[derive(Debug, Clone, Error, Serialize)]
pub enum StopReason {
    /// The page request failed outright (timeout, connection error).
    #[error("page {page}: request failed: {detail}")]
    RequestFailed { page: u32, detail: String },

    /// The page endpoint answered with a non-2xx status.
    #[error("page {page}: HTTP {status}")]
    HttpStatus { page: u32, status: u16 },

    /// A small non-image body came back where image bytes were expected.
    /// ACRIS substitutes an HTML error page when a document page is missing.
    #[error("page {page}: {size}-byte non-image body ({content_type}), likely an error page")]
    ErrorPage {
        page: u32,
        content_type: String,
        size: usize,
    },

    /// The body could not be decoded as an image.
    #[error("page {page}: image decode failed: {detail}")]
    DecodeFailed { page: u32, detail: String },
}

impl StopReason {
    /// 1-based number of the page that failed.
    pub fn page(&self) -> u32 {
        match self {
            StopReason::RequestFailed { page, .. }
            | StopReason::HttpStatus { page, .. }
            | StopReason::ErrorPage { page, .. }
            | StopReason::DecodeFailed { page, .. } => *page,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_doc_id_display() {
        let e = AcrisError::InvalidDocId {
            input: "   ".into(),
        };
        assert!(e.to_string().contains("doc_id=<ID>"));
    }

    #[test]
    fn results_timeout_display() {
        let e = AcrisError::ResultsTimeout { secs: 60 };
        assert!(e.to_string().contains("60s"));
    }

    #[test]
    fn stop_reason_page_accessor() {
        let r = StopReason::HttpStatus {
            page: 4,
            status: 503,
        };
        assert_eq!(r.page(), 4);
        assert!(r.to_string().contains("HTTP 503"));
    }

    #[test]
    fn error_page_display() {
        let r = StopReason::ErrorPage {
            page: 2,
            content_type: "text/html".into(),
            size: 812,
        };
        let msg = r.to_string();
        assert!(msg.contains("812-byte"), "got: {msg}");
        assert!(msg.contains("text/html"));
    }
}

//! Integration tests for the download pipeline stages.
//!
//! The retriever is exercised through a scripted [`PageSource`] instead of
//! live HTTP, so these run everywhere without network access or an ACRIS
//! session. Stage wiring (retrieve → assemble) matches what
//! `fetch_document` does after metadata discovery.

use acris_scout::pipeline::assemble::write_pdf;
use acris_scout::pipeline::retrieve::{collect_pages, PageBody, PageSource};
use acris_scout::{resolve_doc_id, StopReason};
use image::codecs::png::PngEncoder;
use image::{ExtendedColorType, ImageEncoder};
use lopdf::Document;

// ── Test helpers ─────────────────────────────────────────────────────────────

/// In-memory page server: serves the scripted outcomes in page order.
struct ScriptedSource(Vec<Result<PageBody, StopReason>>);

impl PageSource for ScriptedSource {
    async fn fetch_page(&mut self, _page: u32) -> Result<PageBody, StopReason> {
        self.0.remove(0)
    }
}

/// A valid single-colour PNG body, decodable by the retriever.
fn png_page(shade: u8) -> Result<PageBody, StopReason> {
    let mut buf = Vec::new();
    let pixels = vec![shade; 16 * 24 * 3];
    PngEncoder::new(&mut buf)
        .write_image(&pixels, 16, 24, ExtendedColorType::Rgb8)
        .unwrap();
    Ok(PageBody {
        content_type: Some("image/png".into()),
        bytes: buf,
    })
}

// ── End-to-end: retrieve → assemble ──────────────────────────────────────────

#[tokio::test]
async fn three_good_pages_make_a_three_page_artifact() {
    let doc_id = resolve_doc_id("FT_1234567890123").unwrap();
    let total_pages = 3;

    let mut source = ScriptedSource(vec![png_page(30), png_page(120), png_page(210)]);
    let (pages, stopped) = collect_pages(&mut source, total_pages, 5000, None).await;
    assert_eq!(pages.len(), 3);
    assert!(stopped.is_none());

    let dir = tempfile::tempdir().unwrap();
    let dest = dir.path().join(format!("{doc_id}.pdf"));
    let merged = write_pdf(pages, &dest, 100.0).await.unwrap();

    assert_eq!(merged, 3, "success signal is 3 of 3");
    assert!(dest.exists());
    let artifact = Document::load(&dest).expect("artifact should be a valid PDF");
    assert_eq!(artifact.get_pages().len(), 3);
}

#[tokio::test]
async fn mid_document_failure_yields_a_partial_artifact() {
    let stop = StopReason::HttpStatus {
        page: 3,
        status: 500,
    };
    let mut source = ScriptedSource(vec![png_page(1), png_page(2), Err(stop), png_page(4)]);
    let (pages, stopped) = collect_pages(&mut source, 4, 5000, None).await;

    assert_eq!(pages.len(), 2);
    assert!(matches!(stopped, Some(StopReason::HttpStatus { page: 3, .. })));

    let dir = tempfile::tempdir().unwrap();
    let dest = dir.path().join("partial.pdf");
    let merged = write_pdf(pages, &dest, 100.0).await.unwrap();

    assert_eq!(merged, 2, "the contiguous prefix is still assembled");
    assert_eq!(Document::load(&dest).unwrap().get_pages().len(), 2);
}

#[tokio::test]
async fn first_page_error_page_means_no_artifact() {
    let error_page = Ok(PageBody {
        content_type: Some("text/html".into()),
        bytes: b"<html><body>Document not available</body></html>".to_vec(),
    });
    let mut source = ScriptedSource(vec![error_page]);
    let (pages, stopped) = collect_pages(&mut source, 2, 5000, None).await;

    assert!(pages.is_empty());
    assert!(matches!(stopped, Some(StopReason::ErrorPage { page: 1, .. })));

    let dir = tempfile::tempdir().unwrap();
    let dest = dir.path().join("nothing.pdf");
    let merged = write_pdf(pages, &dest, 100.0).await.unwrap();

    assert_eq!(merged, 0);
    assert!(!dest.exists(), "no file is written for an empty sequence");
}

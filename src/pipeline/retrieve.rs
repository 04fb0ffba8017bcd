//! Page retrieval: fetch document pages in order until done or stopped.
//!
//! ## The partial-success contract
//!
//! Retrieval never skips or retries. Pages are fetched 1..=N; the first
//! failure of any kind ends the loop and whatever was collected so far goes
//! to assembly. The returned sequence is therefore always a contiguous
//! prefix of the document. An explicit [`FetchState`] machine carries that
//! contract instead of a loop flag, so it can be tested in isolation
//! against scripted outcomes.
//!
//! ## Why a trait seam?
//!
//! [`PageSource`] separates "how bytes arrive" from "what the loop does
//! with them". The production source speaks HTTP through the session; tests
//! hand the loop canned bodies and failures.

use crate::config::FetchConfig;
use crate::error::StopReason;
use crate::progress::FetchProgress;
use crate::session::Session;
use image::RgbImage;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Path of the page-image endpoint, queried with `doc_id` and `page`.
const IMAGE_PATH: &str = "/DS/DocumentSearch/GetImage";

/// One fetched page body, before decoding.
pub struct PageBody {
    /// The response's declared content type, if any.
    pub content_type: Option<String>,
    /// Raw body bytes (TIFF for real pages, HTML for substituted errors).
    pub bytes: Vec<u8>,
}

/// A decoded page, normalised to RGB8 and tagged with its 1-based number.
pub struct PageImage {
    pub page: u32,
    pub image: RgbImage,
}

/// Where page bytes come from. Implementations report failures as the
/// [`StopReason`] that ends the loop.
#[allow(async_fn_in_trait)]
pub trait PageSource {
    async fn fetch_page(&mut self, page: u32) -> Result<PageBody, StopReason>;
}

/// Loop state: either fetching a specific page, stopped with a reason, or
/// cleanly done.
#[derive(Debug)]
enum FetchState {
    Fetching(u32),
    Stopped(StopReason),
    Done,
}

/// Fetch pages 1..=`total_pages` from `source`, decoding and normalising
/// each, until the document ends or a page fails.
///
/// Returns the contiguous prefix of successful pages plus the stop reason,
/// if any. An empty result with `None` only happens for `total_pages == 0`.
pub async fn collect_pages<S: PageSource>(
    source: &mut S,
    total_pages: u32,
    min_image_bytes: usize,
    progress: Option<&dyn FetchProgress>,
) -> (Vec<PageImage>, Option<StopReason>) {
    let mut pages = Vec::with_capacity(total_pages as usize);
    let mut state = if total_pages == 0 {
        FetchState::Done
    } else {
        FetchState::Fetching(1)
    };

    while let FetchState::Fetching(page) = state {
        if let Some(cb) = progress {
            cb.on_page_start(page, total_pages);
        }
        debug!("Fetching page {page}/{total_pages}");

        state = match source.fetch_page(page).await {
            Err(reason) => FetchState::Stopped(reason),
            Ok(body) => match decode_page(page, body, min_image_bytes).await {
                Err(reason) => FetchState::Stopped(reason),
                Ok(image) => {
                    pages.push(image);
                    if let Some(cb) = progress {
                        cb.on_page_done(page, total_pages);
                    }
                    if page == total_pages {
                        FetchState::Done
                    } else {
                        FetchState::Fetching(page + 1)
                    }
                }
            },
        };
    }

    match state {
        FetchState::Stopped(reason) => {
            warn!("Page retrieval stopped: {reason}");
            if let Some(cb) = progress {
                cb.on_stopped(&reason);
            }
            (pages, Some(reason))
        }
        _ => {
            info!("Retrieved all {} pages", pages.len());
            (pages, None)
        }
    }
}

/// Decode one page body into a normalised [`PageImage`].
///
/// A small body without an image content type is ACRIS substituting an
/// error page; a large one might still be a mislabelled scan, so it goes to
/// the decoder and fails there if it is not. Decoding runs in
/// `spawn_blocking`: multi-megabyte TIFFs are CPU-bound work.
async fn decode_page(
    page: u32,
    body: PageBody,
    min_image_bytes: usize,
) -> Result<PageImage, StopReason> {
    let content_type = body.content_type.unwrap_or_default();
    if !content_type.contains("image/") {
        warn!(
            "Page {page} content type '{content_type}' does not look like an image ({} bytes)",
            body.bytes.len()
        );
        if body.bytes.len() < min_image_bytes {
            return Err(StopReason::ErrorPage {
                page,
                content_type,
                size: body.bytes.len(),
            });
        }
    }

    let bytes = body.bytes;
    let decoded = tokio::task::spawn_blocking(move || {
        image::load_from_memory(&bytes).map(|img| img.into_rgb8())
    })
    .await
    .map_err(|e| StopReason::DecodeFailed {
        page,
        detail: format!("decode task panicked: {e}"),
    })?;

    match decoded {
        Ok(image) => {
            debug!("Page {page} decoded to {}x{} RGB", image.width(), image.height());
            Ok(PageImage { page, image })
        }
        Err(e) => Err(StopReason::DecodeFailed {
            page,
            detail: e.to_string(),
        }),
    }
}

/// The production source: GETs the page-image endpoint over the session.
pub struct HttpPageSource<'a> {
    session: &'a Session,
    doc_id: &'a str,
    base_url: &'a str,
    timeout: Duration,
}

impl<'a> HttpPageSource<'a> {
    pub fn new(session: &'a Session, doc_id: &'a str, config: &'a FetchConfig) -> Self {
        Self {
            session,
            doc_id,
            base_url: &config.base_url,
            timeout: Duration::from_secs(config.page_timeout_secs),
        }
    }
}

impl PageSource for HttpPageSource<'_> {
    async fn fetch_page(&mut self, page: u32) -> Result<PageBody, StopReason> {
        let url = format!(
            "{}{}?doc_id={}&page={}",
            self.base_url, IMAGE_PATH, self.doc_id, page
        );

        let response = self
            .session
            .client()
            .get(&url)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| StopReason::RequestFailed {
                page,
                detail: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(StopReason::HttpStatus {
                page,
                status: status.as_u16(),
            });
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());

        let bytes = response
            .bytes()
            .await
            .map_err(|e| StopReason::RequestFailed {
                page,
                detail: format!("failed to read body: {e}"),
            })?;

        Ok(PageBody {
            content_type,
            bytes: bytes.to_vec(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::codecs::png::PngEncoder;
    use image::{ExtendedColorType, ImageEncoder};

    /// A scripted source: each entry is one page outcome, in order.
    struct ScriptedSource {
        outcomes: Vec<Result<PageBody, StopReason>>,
        served: usize,
    }

    impl ScriptedSource {
        fn new(outcomes: Vec<Result<PageBody, StopReason>>) -> Self {
            Self {
                outcomes,
                served: 0,
            }
        }
    }

    impl PageSource for ScriptedSource {
        async fn fetch_page(&mut self, _page: u32) -> Result<PageBody, StopReason> {
            let outcome = self.outcomes.remove(0);
            self.served += 1;
            outcome
        }
    }

    fn png_body(shade: u8) -> PageBody {
        let mut buf = Vec::new();
        let pixels = vec![shade; 8 * 8 * 3];
        PngEncoder::new(&mut buf)
            .write_image(&pixels, 8, 8, ExtendedColorType::Rgb8)
            .unwrap();
        PageBody {
            content_type: Some("image/png".into()),
            bytes: buf,
        }
    }

    fn failed(page: u32) -> StopReason {
        StopReason::RequestFailed {
            page,
            detail: "connection reset".into(),
        }
    }

    #[tokio::test]
    async fn all_pages_succeed() {
        let mut source = ScriptedSource::new(vec![Ok(png_body(10)), Ok(png_body(20))]);
        let (pages, stopped) = collect_pages(&mut source, 2, 5000, None).await;
        assert_eq!(pages.len(), 2);
        assert!(stopped.is_none());
        assert_eq!(pages[0].page, 1);
        assert_eq!(pages[1].page, 2);
    }

    #[tokio::test]
    async fn stops_at_first_failure_keeping_prefix() {
        // [ok, ok, fail, ok]: the loop must return exactly pages 1-2 and
        // never ask for page 4.
        let mut source = ScriptedSource::new(vec![
            Ok(png_body(1)),
            Ok(png_body(2)),
            Err(failed(3)),
            Ok(png_body(4)),
        ]);
        let (pages, stopped) = collect_pages(&mut source, 4, 5000, None).await;
        assert_eq!(pages.len(), 2);
        assert_eq!(pages.last().unwrap().page, 2);
        assert!(matches!(stopped, Some(StopReason::RequestFailed { page: 3, .. })));
        assert_eq!(source.served, 3, "page 4 must never be requested");
    }

    #[tokio::test]
    async fn small_non_image_body_is_an_error_page() {
        let html = PageBody {
            content_type: Some("text/html".into()),
            bytes: b"<html>Too many requests</html>".to_vec(),
        };
        let mut source = ScriptedSource::new(vec![Ok(png_body(1)), Ok(html)]);
        let (pages, stopped) = collect_pages(&mut source, 3, 5000, None).await;
        assert_eq!(pages.len(), 1);
        assert!(matches!(stopped, Some(StopReason::ErrorPage { page: 2, .. })));
    }

    #[tokio::test]
    async fn undecodable_body_stops_the_loop() {
        let garbage = PageBody {
            content_type: Some("image/tiff".into()),
            bytes: vec![0u8; 6000],
        };
        let mut source = ScriptedSource::new(vec![Ok(garbage)]);
        let (pages, stopped) = collect_pages(&mut source, 1, 5000, None).await;
        assert!(pages.is_empty());
        assert!(matches!(stopped, Some(StopReason::DecodeFailed { page: 1, .. })));
    }

    #[tokio::test]
    async fn large_mislabelled_body_still_reaches_the_decoder() {
        // Content type says HTML but the body is a real image above the
        // threshold: decoding decides, and it succeeds.
        let mut body = png_body(42);
        body.content_type = Some("text/html".into());
        body.bytes.resize(body.bytes.len().max(5001), 0);
        // Padding trailing zeros keeps PNG decodable (data after IEND is
        // ignored by the decoder).
        let mut source = ScriptedSource::new(vec![Ok(body)]);
        let (pages, stopped) = collect_pages(&mut source, 1, 5000, None).await;
        assert_eq!(pages.len(), 1);
        assert!(stopped.is_none());
    }

    #[tokio::test]
    async fn zero_pages_is_a_clean_done() {
        let mut source = ScriptedSource::new(vec![]);
        let (pages, stopped) = collect_pages(&mut source, 0, 5000, None).await;
        assert!(pages.is_empty());
        assert!(stopped.is_none());
    }
}

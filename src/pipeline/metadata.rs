//! Metadata: discover how many pages a document has.
//!
//! The viewer page embeds its state as a percent-encoded JSON blob inside
//! an iframe URL; somewhere in there sits `"hid_TotalPages": N`. Rather
//! than parse the whole structure we decode the percent-escapes and match
//! the one field we need. A document whose count cannot be found is assumed
//! to have one page: attempting page 1 and failing is more informative than
//! refusing to try.

use crate::config::FetchConfig;
use crate::error::AcrisError;
use crate::session::Session;
use once_cell::sync::Lazy;
use regex::Regex;
use std::time::Duration;
use tracing::{info, warn};

/// Path of the document viewer page, queried with `doc_id`.
const VIEWER_PATH: &str = "/DS/DocumentSearch/DocumentImageView";

static RE_TOTAL_PAGES: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#""hid_TotalPages"\s*:\s*(\d+)"#).unwrap());

/// Fetch the viewer page and extract the total page count.
///
/// # Errors
/// [`AcrisError::ViewerPage`] on any network failure or non-2xx status.
/// This is the one fetch the pipeline cannot shrug off: without the viewer
/// page there is no page count and no primed session worth continuing with.
///
/// A reachable page that simply lacks the count degrades to 1 with a
/// warning instead of failing.
pub async fn fetch_total_pages(
    session: &Session,
    doc_id: &str,
    config: &FetchConfig,
) -> Result<u32, AcrisError> {
    let url = format!("{}{}?doc_id={}", config.base_url, VIEWER_PATH, doc_id);

    let response = session
        .client()
        .get(&url)
        .timeout(Duration::from_secs(config.viewer_timeout_secs))
        .send()
        .await
        .map_err(|e| AcrisError::ViewerPage {
            url: url.clone(),
            reason: if e.is_timeout() {
                format!("timed out after {}s", config.viewer_timeout_secs)
            } else {
                e.to_string()
            },
        })?;

    if !response.status().is_success() {
        return Err(AcrisError::ViewerPage {
            url,
            reason: format!("HTTP {}", response.status()),
        });
    }

    let body = response.text().await.map_err(|e| AcrisError::ViewerPage {
        url: url.clone(),
        reason: format!("failed to read body: {e}"),
    })?;

    match parse_total_pages(&body) {
        Some(total) => {
            info!("Document has {total} pages");
            Ok(total)
        }
        None => {
            warn!("Could not determine total pages from viewer metadata; trying page 1 only");
            Ok(1)
        }
    }
}

/// Pull the total page count out of viewer-page markup.
///
/// The count may appear raw or percent-encoded (`%22hid_TotalPages%22`);
/// decoding first handles both.
pub fn parse_total_pages(body: &str) -> Option<u32> {
    let decoded = percent_decode(body);
    RE_TOTAL_PAGES
        .captures(&decoded)
        .and_then(|cap| cap[1].parse().ok())
}

/// Minimal percent-decoding over raw bytes. Invalid escapes pass through
/// untouched; non-UTF-8 results are lossily converted, which is fine for
/// pattern matching on an ASCII field name.
fn percent_decode(input: &str) -> String {
    let bytes = input.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' && i + 2 < bytes.len() {
            if let (Some(hi), Some(lo)) = (hex_val(bytes[i + 1]), hex_val(bytes[i + 2])) {
                out.push(hi << 4 | lo);
                i += 3;
                continue;
            }
        }
        out.push(bytes[i]);
        i += 1;
    }
    String::from_utf8_lossy(&out).into_owned()
}

fn hex_val(b: u8) -> Option<u8> {
    match b {
        b'0'..=b'9' => Some(b - b'0'),
        b'a'..=b'f' => Some(b - b'a' + 10),
        b'A'..=b'F' => Some(b - b'A' + 10),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_plain_count() {
        let body = r#"<script>var state = {"hid_TotalPages": 5, "hid_Doc": "X"};</script>"#;
        assert_eq!(parse_total_pages(body), Some(5));
    }

    #[test]
    fn finds_percent_encoded_count() {
        let body = "iframe.src = 'DocumentImageVtu?stateValue=%7B%22hid_TotalPages%22%3A%2012%7D';";
        assert_eq!(parse_total_pages(body), Some(12));
    }

    #[test]
    fn tolerates_spacing_variants() {
        assert_eq!(parse_total_pages(r#""hid_TotalPages":3"#), Some(3));
        assert_eq!(parse_total_pages(r#""hid_TotalPages"  :  42"#), Some(42));
    }

    #[test]
    fn missing_count_yields_none() {
        assert_eq!(parse_total_pages("<html>no state here</html>"), None);
        assert_eq!(parse_total_pages(""), None);
    }

    #[test]
    fn percent_decode_leaves_invalid_escapes() {
        assert_eq!(percent_decode("100%25 sure"), "100% sure");
        assert_eq!(percent_decode("50% off"), "50% off");
        assert_eq!(percent_decode("trailing%2"), "trailing%2");
    }
}

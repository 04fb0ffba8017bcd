//! Identifier resolution: normalise raw input to a document ID.
//!
//! Users paste either a bare ID (`FT_1234567890123`) or a full ACRIS viewer
//! URL containing a `doc_id` query parameter. Both normalise to the same
//! token here, before any network activity, so a hopeless input aborts the
//! run without ever opening a connection.

use crate::error::AcrisError;
use once_cell::sync::Lazy;
use regex::Regex;

static RE_DOC_ID: Lazy<Regex> = Lazy::new(|| Regex::new(r"doc_id=([A-Za-z0-9]+)").unwrap());

/// Extract the document ID from a raw string or an ACRIS URL.
///
/// If the input contains a `doc_id=` marker, the contiguous alphanumeric
/// token following it wins. Otherwise the trimmed input is taken as the ID
/// itself.
///
/// # Errors
/// [`AcrisError::InvalidDocId`] when nothing usable remains after trimming.
pub fn resolve_doc_id(raw: &str) -> Result<String, AcrisError> {
    if raw.contains("doc_id=") {
        if let Some(cap) = RE_DOC_ID.captures(raw) {
            return Ok(cap[1].to_string());
        }
    }
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(AcrisError::InvalidDocId {
            input: raw.to_string(),
        });
    }
    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_from_viewer_url() {
        let url = "https://a836-acris.nyc.gov/DS/DocumentSearch/DocumentImageView?doc_id=ABC123&other=1";
        assert_eq!(resolve_doc_id(url).unwrap(), "ABC123");
    }

    #[test]
    fn extracts_regardless_of_surrounding_structure() {
        assert_eq!(resolve_doc_id("x?a=b&doc_id=FT999&c=d#frag").unwrap(), "FT999");
        assert_eq!(resolve_doc_id("doc_id=2023010100001001").unwrap(), "2023010100001001");
    }

    #[test]
    fn bare_id_returned_trimmed() {
        assert_eq!(resolve_doc_id("  FT_1234567890123  ").unwrap(), "FT_1234567890123");
    }

    #[test]
    fn marker_without_token_falls_back_to_trimmed_input() {
        // Mirrors the lenient handling of a dangling marker: the trimmed
        // input survives and fails later at the server, not here.
        assert_eq!(resolve_doc_id("doc_id=&x=1").unwrap(), "doc_id=&x=1");
    }

    #[test]
    fn empty_input_is_fatal() {
        assert!(matches!(
            resolve_doc_id("   "),
            Err(AcrisError::InvalidDocId { .. })
        ));
    }
}

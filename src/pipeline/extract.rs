//! Result extraction: parse the BBL results table into document records.
//!
//! The results page is a legacy table layout. Document rows carry a control
//! whose `onclick` handler opens the image viewer with the document ID as
//! its single quoted argument; header rows, spacer rows, and pagination
//! rows have no such control and are skipped without comment. The document
//! type label sits at a fixed column offset (the layout has not changed in
//! years), so a row too short to have that column is not a document row
//! either.

use crate::error::AcrisError;
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{Html, Selector};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Zero-based offset of the document-type cell within a results row.
const DOC_TYPE_COLUMN: usize = 8;

/// `go_image('FT_...')`: the viewer invocation carrying the document ID.
static RE_GO_IMAGE: Lazy<Regex> = Lazy::new(|| Regex::new(r"go_image\('([^']+)'\)").unwrap());

/// One document surfaced by a parcel search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentRecord {
    /// Opaque registry identifier, usable with the download pipeline.
    pub document_id: String,
    /// Document type label as shown in the results table (e.g. "DEED").
    pub doc_type: String,
}

/// Extract one [`DocumentRecord`] per qualifying results-table row, in
/// document order. No deduplication, no identifier validation.
pub fn extract_records(html: &str) -> Result<Vec<DocumentRecord>, AcrisError> {
    let row_sel = selector("tr")?;
    let cell_sel = selector("td")?;
    let onclick_sel = selector("[onclick]")?;

    let doc = Html::parse_document(html);
    let mut records = Vec::new();

    for row in doc.select(&row_sel) {
        // The viewer control marks a document row; anything else is layout.
        let Some(document_id) = row
            .select(&onclick_sel)
            .filter_map(|el| el.value().attr("onclick"))
            .find_map(|handler| RE_GO_IMAGE.captures(handler))
            .map(|cap| cap[1].to_string())
        else {
            continue;
        };

        let cells: Vec<_> = row.select(&cell_sel).collect();
        let Some(type_cell) = cells.get(DOC_TYPE_COLUMN) else {
            debug!(
                "Row for {document_id} has only {} cells; skipping",
                cells.len()
            );
            continue;
        };

        let doc_type = type_cell.text().collect::<String>().trim().to_string();
        records.push(DocumentRecord {
            document_id,
            doc_type,
        });
    }

    debug!("Extracted {} document records", records.len());
    Ok(records)
}

fn selector(s: &str) -> Result<Selector, AcrisError> {
    Selector::parse(s).map_err(|e| AcrisError::Internal(format!("selector '{s}': {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(onclick: Option<&str>, cells: usize, doc_type: &str) -> String {
        let mut tds = String::new();
        for i in 0..cells {
            if i == DOC_TYPE_COLUMN {
                tds.push_str(&format!("<td> {doc_type} </td>"));
            } else if i == 0 && onclick.is_some() {
                tds.push_str(&format!(
                    "<td><input type=\"button\" value=\"IMG\" onclick=\"{}\"></td>",
                    onclick.unwrap()
                ));
            } else {
                tds.push_str(&format!("<td>col{i}</td>"));
            }
        }
        format!("<tr>{tds}</tr>")
    }

    fn table(rows: &[String]) -> String {
        format!("<html><body><table>{}</table></body></html>", rows.join(""))
    }

    #[test]
    fn qualifying_row_yields_a_record() {
        let html = table(&[row(Some("go_image('DOC999')"), 10, "DEED")]);
        let records = extract_records(&html).unwrap();
        assert_eq!(
            records,
            vec![DocumentRecord {
                document_id: "DOC999".into(),
                doc_type: "DEED".into(),
            }]
        );
    }

    #[test]
    fn row_without_handler_yields_nothing() {
        let html = table(&[row(None, 10, "MORTGAGE")]);
        assert!(extract_records(&html).unwrap().is_empty());
    }

    #[test]
    fn short_row_with_handler_is_skipped() {
        let html = table(&[row(Some("go_image('DOC111')"), 5, "ignored")]);
        assert!(extract_records(&html).unwrap().is_empty());
    }

    #[test]
    fn order_preserved_and_no_dedup() {
        let html = table(&[
            row(Some("go_image('A1')"), 10, "DEED"),
            row(None, 10, "header"),
            row(Some("go_image('B2')"), 10, "MORTGAGE"),
            row(Some("go_image('A1')"), 10, "DEED"),
        ]);
        let ids: Vec<_> = extract_records(&html)
            .unwrap()
            .into_iter()
            .map(|r| r.document_id)
            .collect();
        assert_eq!(ids, vec!["A1", "B2", "A1"]);
    }

    #[test]
    fn handler_embedded_in_longer_invocation_still_matches() {
        let html = table(&[row(
            Some("javascript:go_image('FT_1234567890123');return false;"),
            9,
            "AGREEMENT",
        )]);
        let records = extract_records(&html).unwrap();
        assert_eq!(records[0].document_id, "FT_1234567890123");
        assert_eq!(records[0].doc_type, "AGREEMENT");
    }

    #[test]
    fn empty_markup_yields_nothing() {
        assert!(extract_records("").unwrap().is_empty());
        assert!(extract_records("<html><body><p>no table</p></body></html>")
            .unwrap()
            .is_empty());
    }
}

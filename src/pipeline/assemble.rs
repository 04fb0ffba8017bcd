//! Artifact assembly: compose ordered page images into one PDF.
//!
//! Each page becomes a JPEG-compressed image XObject drawn over the full
//! page box, sized so the scan's pixels map to paper at the configured
//! resolution (a 850x1100 px scan at 100 DPI becomes an 8.5x11in page).
//! JPEG keeps multi-hundred-page deed files to a sane size; the scans are
//! halftone registry microfilm, not line art worth lossless encoding.
//!
//! Writing is CPU-bound (JPEG encode + PDF serialisation) and runs in
//! `spawn_blocking`.

use crate::error::AcrisError;
use crate::pipeline::retrieve::PageImage;
use image::codecs::jpeg::JpegEncoder;
use image::ExtendedColorType;
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// JPEG quality for embedded page images. 90 keeps stamp and margin text
/// readable on 200-DPI registry scans.
const JPEG_QUALITY: u8 = 90;

/// Write `pages` to a single PDF at `path`, in input order.
///
/// Returns the number of pages written, which is the pipeline's success
/// signal: zero means no file was created at all.
///
/// # Errors
/// [`AcrisError::OutputWrite`] when the file cannot be produced;
/// [`AcrisError::Internal`] if a page image fails to re-encode.
pub async fn write_pdf(
    pages: Vec<PageImage>,
    path: &Path,
    resolution_dpi: f32,
) -> Result<usize, AcrisError> {
    if pages.is_empty() {
        info!("No pages collected; skipping artifact write");
        return Ok(0);
    }

    let dest = path.to_path_buf();
    let count = pages.len();
    tokio::task::spawn_blocking(move || write_pdf_blocking(pages, &dest, resolution_dpi))
        .await
        .map_err(|e| AcrisError::Internal(format!("assembly task panicked: {e}")))??;

    info!("Wrote {count} pages to {}", path.display());
    Ok(count)
}

/// Blocking implementation of the PDF write.
fn write_pdf_blocking(
    pages: Vec<PageImage>,
    path: &PathBuf,
    resolution_dpi: f32,
) -> Result<(), AcrisError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(|e| AcrisError::OutputWrite {
                path: path.clone(),
                source: e,
            })?;
        }
    }

    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let mut kids: Vec<Object> = Vec::with_capacity(pages.len());

    for page in &pages {
        let (width, height) = page.image.dimensions();

        let mut jpeg = Vec::new();
        JpegEncoder::new_with_quality(&mut jpeg, JPEG_QUALITY)
            .encode(page.image.as_raw(), width, height, ExtendedColorType::Rgb8)
            .map_err(|e| {
                AcrisError::Internal(format!("JPEG encode failed for page {}: {e}", page.page))
            })?;

        let image_stream = Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Image",
                "Width" => width as i64,
                "Height" => height as i64,
                "ColorSpace" => "DeviceRGB",
                "BitsPerComponent" => 8,
                "Filter" => "DCTDecode",
            },
            jpeg,
        );
        let image_id = doc.add_object(image_stream);

        // Pixels to points at the fixed rendering resolution.
        let pt_width = width as f32 * 72.0 / resolution_dpi;
        let pt_height = height as f32 * 72.0 / resolution_dpi;

        let content = Content {
            operations: vec![
                Operation::new("q", vec![]),
                Operation::new(
                    "cm",
                    vec![
                        Object::Real(pt_width),
                        0.into(),
                        0.into(),
                        Object::Real(pt_height),
                        0.into(),
                        0.into(),
                    ],
                ),
                Operation::new("Do", vec![Object::Name(b"Im0".to_vec())]),
                Operation::new("Q", vec![]),
            ],
        };
        let encoded = content
            .encode()
            .map_err(|e| AcrisError::Internal(format!("content stream encode failed: {e}")))?;
        let content_id = doc.add_object(Stream::new(dictionary! {}, encoded));

        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => vec![
                0.into(),
                0.into(),
                Object::Real(pt_width),
                Object::Real(pt_height),
            ],
            "Contents" => content_id,
            "Resources" => dictionary! {
                "XObject" => dictionary! { "Im0" => image_id },
            },
        });

        debug!(
            "Page {} embedded as {}x{} px ({:.1}x{:.1} pt)",
            page.page, width, height, pt_width, pt_height
        );
        kids.push(page_id.into());
    }

    let kid_count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => kid_count,
        }),
    );

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    doc.save(path).map_err(|e| AcrisError::OutputWrite {
        path: path.clone(),
        source: std::io::Error::other(e.to_string()),
    })?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::RgbImage;

    fn page(n: u32, shade: u8) -> PageImage {
        PageImage {
            page: n,
            image: RgbImage::from_pixel(40, 60, image::Rgb([shade, shade, shade])),
        }
    }

    #[tokio::test]
    async fn empty_input_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("empty.pdf");
        let written = write_pdf(vec![], &dest, 100.0).await.unwrap();
        assert_eq!(written, 0);
        assert!(!dest.exists());
    }

    #[tokio::test]
    async fn three_pages_become_a_three_page_pdf() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("doc.pdf");
        let written = write_pdf(vec![page(1, 10), page(2, 120), page(3, 240)], &dest, 100.0)
            .await
            .unwrap();
        assert_eq!(written, 3);

        let reloaded = Document::load(&dest).expect("artifact should re-parse");
        assert_eq!(reloaded.get_pages().len(), 3);
    }

    #[tokio::test]
    async fn page_box_scales_with_resolution() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("scaled.pdf");
        // 40 px wide at 100 DPI => 28.8 pt wide.
        write_pdf(vec![page(1, 0)], &dest, 100.0).await.unwrap();

        let reloaded = Document::load(&dest).unwrap();
        let (_, page_id) = reloaded.get_pages().into_iter().next().unwrap();
        let page_dict = reloaded.get_dictionary(page_id).unwrap();
        let media_box = page_dict.get(b"MediaBox").unwrap().as_array().unwrap();
        let width = match media_box[2] {
            Object::Real(f) => f,
            Object::Integer(i) => i as f32,
            ref other => panic!("unexpected MediaBox entry: {other:?}"),
        };
        assert!((width - 28.8).abs() < 0.05, "got width {width}");
    }

    #[tokio::test]
    async fn missing_parent_dir_is_created() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("nested/out/doc.pdf");
        let written = write_pdf(vec![page(1, 77)], &dest, 100.0).await.unwrap();
        assert_eq!(written, 1);
        assert!(dest.exists());
    }
}

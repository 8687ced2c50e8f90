//! Whole-page rendering through pdfium.
//!
//! Renders what a reader would see, so scans stored in formats the embedded
//! image decoder cannot unpack (fax, JBIG2, JPEG 2000) still reach OCR. Needs
//! a pdfium shared library next to the binary or on the system path.

use image::DynamicImage;
use pdfium_render::prelude::*;

use crate::error::{DocCheckError, Result};

/// Resolution pages are rendered at.
pub const RENDER_DPI: f32 = 200.0;

/// Render the first `limit` pages of a PDF.
pub fn render_pages(data: &[u8], limit: usize) -> Result<Vec<DynamicImage>> {
    let bindings = Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path("./"))
        .or_else(|_| Pdfium::bind_to_system_library())
        .map_err(pdfium_error)?;
    let pdfium = Pdfium::new(bindings);
    let document = pdfium
        .load_pdf_from_byte_slice(data, None)
        .map_err(pdfium_error)?;

    let mut images = Vec::new();
    for page in document.pages().iter().take(limit) {
        images.push(render_page(&page)?);
    }
    tracing::debug!(pages = images.len(), dpi = RENDER_DPI, "rendered PDF pages");
    Ok(images)
}

#[allow(clippy::cast_possible_truncation)]
fn render_page(page: &PdfPage) -> Result<DynamicImage> {
    let scale = RENDER_DPI / 72.0;
    let width = (page.width().value * scale) as i32;
    let height = (page.height().value * scale) as i32;

    let bitmap = page
        .render_with_config(
            &PdfRenderConfig::new()
                .set_target_width(width)
                .set_target_height(height)
                .render_form_data(true)
                .render_annotations(true),
        )
        .map_err(pdfium_error)?;
    Ok(bitmap.as_image())
}

fn pdfium_error(e: PdfiumError) -> DocCheckError {
    DocCheckError::Other(format!("pdfium: {e}"))
}

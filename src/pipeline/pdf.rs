//! PDF text-layer extraction via pdfium.
//!
//! ## Why spawn_blocking?
//!
//! The `pdfium-render` crate wraps the pdfium C++ library, which uses
//! thread-local state internally and is not safe to call from async contexts.
//! `tokio::task::spawn_blocking` moves the work onto the blocking pool so the
//! Tokio worker threads never stall on a large document.
//!
//! pdfium hands us text segments (runs of characters sharing a baseline)
//! with their bounding boxes; [`super::layout`] turns those into lines.
//! Pages without a text layer come back empty. There is no OCR fallback
//! for PDFs: a scan-only PDF yields an empty string, and the caller decides
//! what that means.

use super::layout::{reconstruct_document, TextFragment};
use crate::error::DocSumError;
use pdfium_render::prelude::*;
use tracing::{debug, info};

/// Extract the text layer of a PDF held in memory.
pub async fn extract_pdf_text(bytes: &[u8], password: Option<&str>) -> Result<String, DocSumError> {
    let bytes = bytes.to_vec();
    let password = password.map(|s| s.to_string());

    let pages = tokio::task::spawn_blocking(move || {
        extract_fragments_blocking(&bytes, password.as_deref())
    })
    .await
    .map_err(|e| DocSumError::Internal(format!("PDF extraction task panicked: {}", e)))??;

    Ok(reconstruct_document(&pages))
}

/// Bind to a pdfium library: `PDFIUM_LIB_PATH` first, then the working
/// directory, then the system library search path.
pub fn bind_pdfium() -> Result<Pdfium, DocSumError> {
    let bindings = match std::env::var("PDFIUM_LIB_PATH") {
        Ok(path) if !path.is_empty() => Pdfium::bind_to_library(&path),
        _ => Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path("./"))
            .or_else(|_| Pdfium::bind_to_system_library()),
    }
    .map_err(|e| DocSumError::PdfiumBindingFailed(format!("{:?}", e)))?;

    Ok(Pdfium::new(bindings))
}

/// Blocking implementation: one `Vec<TextFragment>` per page, in page order.
fn extract_fragments_blocking(
    bytes: &[u8],
    password: Option<&str>,
) -> Result<Vec<Vec<TextFragment>>, DocSumError> {
    let pdfium = bind_pdfium()?;

    let document = pdfium
        .load_pdf_from_byte_slice(bytes, password)
        .map_err(|e| {
            let err_str = format!("{:?}", e);
            if err_str.contains("Password") || err_str.contains("password") {
                DocSumError::PasswordRequired
            } else {
                DocSumError::CorruptPdf { detail: err_str }
            }
        })?;

    let pages = document.pages();
    let total_pages = pages.len() as usize;
    info!("PDF loaded: {} pages", total_pages);

    let mut result = Vec::with_capacity(total_pages);
    for (idx, page) in pages.iter().enumerate() {
        let fragments: Vec<TextFragment> = match page.text() {
            Ok(text) => text
                .segments()
                .iter()
                .map(|segment| TextFragment::new(segment.text(), segment.bounds().bottom().value))
                .collect(),
            Err(e) => {
                debug!("Page {}: no text layer ({:?})", idx + 1, e);
                Vec::new()
            }
        };
        debug!("Page {}: {} text fragments", idx + 1, fragments.len());
        result.push(fragments);
    }

    Ok(result)
}

//! Text extraction for uploaded documents.
//!
//! Supports plain text files (strict UTF-8) and PDFs, the latter via
//! either the embedded text layer or an OCR engine for scanned
//! documents. Dispatch happens on the file extension plus, for PDFs,
//! an explicit processing method chosen by the uploader; anything else
//! is rejected before any extraction work begins.

use std::path::Path;

use crate::error::PipelineError;
use crate::ocr::OcrEngine;

/// How to pull text out of a PDF.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PdfMethod {
    /// Extract the embedded text layer page by page.
    Standard,
    /// Render-and-recognize through the OCR engine. Slower and lossy;
    /// for scanned documents with no text layer.
    Ocr,
}

impl PdfMethod {
    /// Parse the form-field value (trimmed, case-insensitive).
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "standard text extraction" => Some(Self::Standard),
            "ocr based extraction" => Some(Self::Ocr),
            _ => None,
        }
    }
}

/// Extract raw text from a staged upload.
///
/// `pdf_method` is required for `.pdf` files and ignored for `.txt`.
pub async fn extract_text(
    path: &Path,
    pdf_method: Option<PdfMethod>,
    ocr: &dyn OcrEngine,
) -> Result<String, PipelineError> {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_lowercase())
        .unwrap_or_default();

    match extension.as_str() {
        "txt" => extract_txt(path),
        "pdf" => match pdf_method {
            Some(PdfMethod::Standard) => extract_pdf(path),
            Some(PdfMethod::Ocr) => extract_pdf_ocr(path, ocr).await,
            None => Err(PipelineError::UnsupportedFormat(
                "pdf_processing_method is required for PDF files".to_string(),
            )),
        },
        other => Err(PipelineError::UnsupportedFormat(format!(
            "unsupported file extension '{}': only PDF and TXT are supported",
            other
        ))),
    }
}

/// Read a plain text file as strict UTF-8.
fn extract_txt(path: &Path) -> Result<String, PipelineError> {
    let bytes =
        std::fs::read(path).map_err(|e| PipelineError::Extraction(format!("read failed: {}", e)))?;
    String::from_utf8(bytes).map_err(|e| PipelineError::Decode(e.to_string()))
}

/// Extract the embedded text layer of a PDF, all pages in page order.
fn extract_pdf(path: &Path) -> Result<String, PipelineError> {
    pdf_extract::extract_text(path).map_err(|e| PipelineError::Extraction(e.to_string()))
}

/// OCR every page of a PDF in page order.
///
/// Tokens recognized on a page are joined with single spaces; a
/// newline separates pages. The OCR engine is restricted to English.
async fn extract_pdf_ocr(path: &Path, ocr: &dyn OcrEngine) -> Result<String, PipelineError> {
    let bytes =
        std::fs::read(path).map_err(|e| PipelineError::Extraction(format!("read failed: {}", e)))?;
    let document = lopdf::Document::load_mem(&bytes)
        .map_err(|e| PipelineError::Extraction(format!("invalid PDF: {}", e)))?;
    let page_count = document.get_pages().len() as u32;

    let mut text = String::new();
    for page in 1..=page_count {
        let tokens = ocr.recognize_page(&bytes, page).await?;
        tracing::debug!(page, tokens = tokens.len(), "OCR page done");
        text.push_str(&tokens.join(" "));
        text.push('\n');
    }
    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ocr::DisabledOcr;

    fn write_temp(dir: &tempfile::TempDir, name: &str, bytes: &[u8]) -> std::path::PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, bytes).unwrap();
        path
    }

    #[tokio::test]
    async fn reads_txt_as_utf8() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = write_temp(&dir, "notes.txt", "compound interest".as_bytes());
        let text = extract_text(&path, None, &DisabledOcr).await.unwrap();
        assert_eq!(text, "compound interest");
    }

    #[tokio::test]
    async fn invalid_utf8_is_decode_error() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = write_temp(&dir, "bad.txt", &[0xff, 0xfe, 0x61]);
        let err = extract_text(&path, None, &DisabledOcr).await.unwrap_err();
        assert!(matches!(err, PipelineError::Decode(_)));
    }

    #[tokio::test]
    async fn pdf_without_method_rejected_before_extraction() {
        let dir = tempfile::TempDir::new().unwrap();
        // Deliberately not a valid PDF: dispatch must fail first.
        let path = write_temp(&dir, "scan.pdf", b"not a pdf");
        let err = extract_text(&path, None, &DisabledOcr).await.unwrap_err();
        assert!(matches!(err, PipelineError::UnsupportedFormat(_)));
    }

    #[tokio::test]
    async fn invalid_pdf_is_extraction_error() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = write_temp(&dir, "broken.pdf", b"not a pdf");
        let err = extract_text(&path, Some(PdfMethod::Standard), &DisabledOcr)
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::Extraction(_)));
    }

    #[tokio::test]
    async fn unknown_extension_rejected() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = write_temp(&dir, "sheet.docx", b"zip bytes");
        let err = extract_text(&path, None, &DisabledOcr).await.unwrap_err();
        assert!(matches!(err, PipelineError::UnsupportedFormat(_)));
    }

    #[test]
    fn method_strings_parse_case_insensitively() {
        assert_eq!(
            PdfMethod::parse("  Standard Text Extraction "),
            Some(PdfMethod::Standard)
        );
        assert_eq!(PdfMethod::parse("OCR BASED EXTRACTION"), Some(PdfMethod::Ocr));
        assert_eq!(PdfMethod::parse("fast extraction"), None);
    }
}

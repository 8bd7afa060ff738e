// src/pdf/reader.rs
use std::path::Path;

use lopdf::Document;

use super::content;
use super::layout::{self, LayoutSettings};
use super::models::PageContent;
use crate::schema::normalize;
use crate::utils::error::PdfError;

/// Anything that can turn a PDF file into per-page tables and lines.
pub trait PageSource: Send + Sync {
    fn read_pages(&self, path: &Path) -> Result<Vec<PageContent>, PdfError>;
}

/// `lopdf`-backed reader with layout reconstruction.
#[derive(Debug, Clone, Default)]
pub struct LopdfReader {
    settings: LayoutSettings,
}

impl LopdfReader {
    pub fn new(settings: LayoutSettings) -> Self {
        Self { settings }
    }
}

impl PageSource for LopdfReader {
    fn read_pages(&self, path: &Path) -> Result<Vec<PageContent>, PdfError> {
        let doc = Document::load(path).map_err(|e| PdfError::Load(e.to_string()))?;
        let page_ids = doc.get_pages();
        tracing::debug!("Loaded {} ({} pages)", path.display(), page_ids.len());

        let mut pages = Vec::with_capacity(page_ids.len());
        for (number, page_id) in page_ids {
            let spans = match content::page_spans(&doc, page_id) {
                Ok(spans) => spans,
                Err(e) => {
                    let err = PdfError::Page {
                        page: number,
                        message: e.to_string(),
                    };
                    tracing::warn!("{}: {}", path.display(), err);
                    Vec::new()
                }
            };

            let mut page = layout::build_page(number, spans, &self.settings);
            if !page.has_text() {
                page.lines = fallback_lines(&doc, number);
            }
            tracing::trace!(
                "Page {}: {} tables, {} lines",
                number,
                page.tables.len(),
                page.lines.len()
            );
            pages.push(page);
        }

        if !pages.iter().any(PageContent::has_text) {
            return Err(PdfError::NoText);
        }
        Ok(pages)
    }
}

/// Lines from lopdf's own text extraction, for pages the interpreter found nothing on.
fn fallback_lines(doc: &Document, number: u32) -> Vec<String> {
    match doc.extract_text(&[number]) {
        Ok(text) => text
            .lines()
            .map(normalize)
            .filter(|line| !line.is_empty())
            .collect(),
        Err(e) => {
            tracing::debug!("lopdf text extraction failed on page {}: {}", number, e);
            Vec::new()
        }
    }
}

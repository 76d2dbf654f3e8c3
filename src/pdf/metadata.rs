//! PDF metadata extraction

use std::path::Path;

use lopdf::{Dictionary, Document, Object};

use crate::error::{Error, Result};

/// Count pages by reading the Count field from the Pages dictionary
/// This is more reliable than get_pages() which doesn't handle nested page trees
fn count_pages_from_catalog(doc: &Document) -> Result<usize> {
    let catalog_id = doc
        .trailer
        .get(b"Root")
        .and_then(Object::as_reference)
        .map_err(|_| Error::General("No Root in trailer".to_string()))?;
    let catalog = doc.get_dictionary(catalog_id)?;

    let pages_id = catalog
        .get(b"Pages")
        .and_then(Object::as_reference)
        .map_err(|_| Error::General("No Pages in catalog".to_string()))?;
    let pages = doc.get_dictionary(pages_id)?;

    match pages.get(b"Count") {
        Ok(Object::Integer(n)) if *n >= 0 => Ok(*n as usize),
        Ok(_) => Err(Error::General("Count is not a page count".to_string())),
        Err(_) => Err(Error::General("No Count in Pages".to_string())),
    }
}

/// Read a text entry from the Info dictionary
fn info_string(info: &Dictionary, key: &[u8]) -> Option<String> {
    let bytes = info.get(key).and_then(Object::as_str).ok()?;
    String::from_utf8(bytes.to_vec()).ok()
}

/// PDF metadata
#[derive(Debug, Clone)]
pub struct PdfMetadata {
    /// Number of pages in the PDF
    pub page_count: usize,
    /// Document title (if present)
    pub title: Option<String>,
    /// Document author (if present)
    pub author: Option<String>,
    /// Producing application (if present)
    pub producer: Option<String>,
}

fn load_existing(path: &Path) -> Result<Document> {
    if !path.exists() {
        return Err(Error::FileNotFound(path.to_path_buf()));
    }
    Ok(Document::load(path)?)
}

/// Extract metadata from a PDF file
pub fn extract_metadata(path: &Path) -> Result<PdfMetadata> {
    let doc = load_existing(path)?;

    // Use catalog-based counting for accuracy
    let page_count = count_pages_from_catalog(&doc)?;

    if page_count == 0 {
        return Err(Error::EmptyPdf(path.display().to_string()));
    }

    let info = doc
        .trailer
        .get(b"Info")
        .and_then(Object::as_reference)
        .and_then(|id| doc.get_dictionary(id))
        .ok();

    Ok(PdfMetadata {
        page_count,
        title: info.and_then(|d| info_string(d, b"Title")),
        author: info.and_then(|d| info_string(d, b"Author")),
        producer: info.and_then(|d| info_string(d, b"Producer")),
    })
}

/// Count the number of pages in a PDF file
///
/// This is a quick operation that reads the Count field from the Pages dictionary.
pub fn count_pages(path: &Path) -> Result<usize> {
    let doc = load_existing(path)?;
    let page_count = count_pages_from_catalog(&doc)?;

    if page_count == 0 {
        return Err(Error::EmptyPdf(path.display().to_string()));
    }

    Ok(page_count)
}

/// Count the pages of a PDF held in memory
///
/// A document with no pages yields `Ok(0)`; callers decide whether that is an
/// error for their operation.
pub fn count_pages_in_memory(bytes: &[u8]) -> Result<usize> {
    let doc = Document::load_mem(bytes)?;
    count_pages_from_catalog(&doc)
}

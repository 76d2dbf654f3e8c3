//! Shared fixtures: in-memory PDFs and a renderer that needs no pdfium

#![allow(dead_code)]

use image::{Rgba, RgbaImage};
use lopdf::{Dictionary, Document, Object, Stream};
use pdf_sheets::error::{Error, Result};
use pdf_sheets::render::{PageRenderer, RenderDocument};

pub const LETTER: (f32, f32) = (612.0, 792.0);
pub const A4: (f32, f32) = (595.0, 842.0);

/// Build a PDF with one page per entry of `sizes`, each carrying a
/// `% page N` marker in its content stream
pub fn fixture_pdf(sizes: &[(f32, f32)]) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let mut kids = Vec::new();
    for (i, &(width, height)) in sizes.iter().enumerate() {
        let content_id = doc.add_object(Stream::new(
            Dictionary::new(),
            format!("% page {}", i + 1).into_bytes(),
        ));

        let mut page = Dictionary::new();
        page.set("Type", Object::Name(b"Page".to_vec()));
        page.set("Parent", Object::Reference(pages_id));
        page.set(
            "MediaBox",
            Object::Array(vec![
                Object::Integer(0),
                Object::Integer(0),
                Object::Real(width),
                Object::Real(height),
            ]),
        );
        page.set("Contents", Object::Reference(content_id));
        page.set("Resources", Object::Dictionary(Dictionary::new()));
        kids.push(Object::Reference(doc.add_object(Object::Dictionary(page))));
    }

    let mut pages = Dictionary::new();
    pages.set("Type", Object::Name(b"Pages".to_vec()));
    pages.set("Count", Object::Integer(sizes.len() as i64));
    pages.set("Kids", Object::Array(kids));
    doc.objects.insert(pages_id, Object::Dictionary(pages));

    let mut catalog = Dictionary::new();
    catalog.set("Type", Object::Name(b"Catalog".to_vec()));
    catalog.set("Pages", Object::Reference(pages_id));
    let catalog_id = doc.add_object(Object::Dictionary(catalog));
    doc.trailer.set("Root", Object::Reference(catalog_id));

    let mut buf = Vec::new();
    doc.save_to(&mut buf).expect("save fixture");
    buf
}

/// `count` letter-sized pages
pub fn letter_pdf(count: usize) -> Vec<u8> {
    fixture_pdf(&vec![LETTER; count])
}

/// Marker text from each page's content stream, in page order
pub fn page_markers(bytes: &[u8]) -> Vec<String> {
    let doc = Document::load_mem(bytes).expect("load output");
    doc.get_pages()
        .values()
        .map(|&id| String::from_utf8_lossy(&doc.get_page_content(id).expect("content")).into_owned())
        .collect()
}

/// Page sizes from each page's MediaBox, in page order
pub fn page_sizes(bytes: &[u8]) -> Vec<(f32, f32)> {
    let doc = Document::load_mem(bytes).expect("load output");
    doc.get_pages()
        .values()
        .map(|&id| media_box(&doc, id).expect("media box"))
        .collect()
}

fn media_box(doc: &Document, page_id: lopdf::ObjectId) -> Option<(f32, f32)> {
    let page = doc.get_dictionary(page_id).ok()?;
    let rect = page.get(b"MediaBox").and_then(Object::as_array).ok()?;
    let value = |i: usize| rect.get(i).and_then(|o| o.as_float().ok());
    Some((value(2)? - value(0)?, value(3)? - value(1)?))
}

/// Renderer that paints each page a solid color at the requested scale
///
/// Sizes come from the page MediaBox. Page `fail_on` (0-based), when set,
/// fails to render.
#[derive(Default)]
pub struct FakeRenderer {
    pub fail_on: Option<usize>,
}

impl FakeRenderer {
    pub fn failing_on(index: usize) -> Self {
        Self {
            fail_on: Some(index),
        }
    }
}

pub struct FakeDocument {
    sizes: Vec<(f32, f32)>,
    fail_on: Option<usize>,
}

impl PageRenderer for FakeRenderer {
    fn open<'a>(&'a self, bytes: &'a [u8]) -> Result<Box<dyn RenderDocument + 'a>> {
        let doc = Document::load_mem(bytes)?;
        let sizes = doc
            .get_pages()
            .values()
            .map(|&id| media_box(&doc, id).unwrap_or(LETTER))
            .collect();
        Ok(Box::new(FakeDocument {
            sizes,
            fail_on: self.fail_on,
        }))
    }
}

impl RenderDocument for FakeDocument {
    fn page_count(&self) -> usize {
        self.sizes.len()
    }

    fn page_size(&self, index: usize) -> Result<(f32, f32)> {
        self.sizes
            .get(index)
            .copied()
            .ok_or_else(|| Error::render(index + 1, "no such page"))
    }

    fn render(&self, index: usize, scale: f32) -> Result<RgbaImage> {
        if self.fail_on == Some(index) {
            return Err(Error::render(index + 1, "simulated failure"));
        }
        let (width, height) = self.page_size(index)?;
        let shade = (index * 40 % 200) as u8;
        Ok(RgbaImage::from_pixel(
            ((width * scale).round() as u32).max(1),
            ((height * scale).round() as u32).max(1),
            Rgba([shade, shade, shade, 255]),
        ))
    }
}

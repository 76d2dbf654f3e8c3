//! PDF creation from raster images using lopdf
//!
//! Pages are built one at a time: [`ImagePdfWriter::add_page`] starts a page,
//! drawing calls append to its content stream, and [`ImagePdfWriter::finish`]
//! assembles the page tree. Images are embedded as JPEG (DCTDecode) image
//! XObjects. All coordinates are PDF points with the origin at the bottom-left.

use chrono::Local;
use image::RgbaImage;
use lopdf::{Dictionary, Document, Object, ObjectId, Stream};

use crate::error::{Error, Result};
use crate::raster::{encode_jpeg, flatten_on_white};

/// Rectangle in PDF points, origin at the bottom-left of the page
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PdfRect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl PdfRect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self { x, y, width, height }
    }
}

/// Page under construction
struct PendingPage {
    width: f32,
    height: f32,
    content: String,
    xobjects: Dictionary,
    image_count: usize,
}

/// Builds a PDF whose pages are made of placed images and simple strokes
pub struct ImagePdfWriter {
    doc: Document,
    pages_id: ObjectId,
    page_ids: Vec<ObjectId>,
    current: Option<PendingPage>,
}

impl Default for ImagePdfWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl ImagePdfWriter {
    pub fn new() -> Self {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        Self {
            doc,
            pages_id,
            page_ids: Vec::new(),
            current: None,
        }
    }

    /// Start a new page of the given size, closing the previous one
    pub fn add_page(&mut self, width: f32, height: f32) {
        self.flush_page();
        self.current = Some(PendingPage {
            width,
            height,
            content: String::new(),
            xobjects: Dictionary::new(),
            image_count: 0,
        });
    }

    /// Number of pages written so far, including the open one
    pub fn page_count(&self) -> usize {
        self.page_ids.len() + usize::from(self.current.is_some())
    }

    /// Encode an RGBA bitmap as JPEG and draw it into `rect`
    pub fn draw_image(&mut self, image: &RgbaImage, rect: PdfRect, quality: u8) -> Result<()> {
        let jpeg = encode_jpeg(&flatten_on_white(image), quality)?;
        self.draw_jpeg(jpeg, image.width(), image.height(), rect)
    }

    /// Draw already-encoded JPEG data of `width`×`height` pixels into `rect`
    pub fn draw_jpeg(&mut self, jpeg: Vec<u8>, width: u32, height: u32, rect: PdfRect) -> Result<()> {
        let page = self
            .current
            .as_mut()
            .ok_or_else(|| Error::General("No page to draw on".to_string()))?;

        let mut dict = Dictionary::new();
        dict.set("Type", Object::Name(b"XObject".to_vec()));
        dict.set("Subtype", Object::Name(b"Image".to_vec()));
        dict.set("Width", Object::Integer(width as i64));
        dict.set("Height", Object::Integer(height as i64));
        dict.set("ColorSpace", Object::Name(b"DeviceRGB".to_vec()));
        dict.set("BitsPerComponent", Object::Integer(8));
        dict.set("Filter", Object::Name(b"DCTDecode".to_vec()));

        // Already compressed
        let image_id = self
            .doc
            .add_object(Stream::new(dict, jpeg).with_compression(false));

        let name = format!("Im{}", page.image_count);
        page.image_count += 1;
        page.xobjects.set(name.as_bytes(), Object::Reference(image_id));

        page.content.push_str("q\n");
        page.content.push_str(&format!(
            "{} 0 0 {} {} {} cm\n",
            fmt_num(rect.width),
            fmt_num(rect.height),
            fmt_num(rect.x),
            fmt_num(rect.y)
        ));
        page.content.push_str(&format!("/{} Do\n", name));
        page.content.push_str("Q\n");

        Ok(())
    }

    /// Stroke a rectangle outline in the given gray level (0 = black, 1 = white)
    pub fn stroke_rect(&mut self, rect: PdfRect, gray: f32, line_width: f32) -> Result<()> {
        let page = self
            .current
            .as_mut()
            .ok_or_else(|| Error::General("No page to draw on".to_string()))?;

        page.content.push_str("q\n");
        page.content.push_str(&format!("{} G\n", fmt_num(gray)));
        page.content.push_str(&format!("{} w\n", fmt_num(line_width)));
        page.content.push_str(&format!(
            "{} {} {} {} re S\n",
            fmt_num(rect.x),
            fmt_num(rect.y),
            fmt_num(rect.width),
            fmt_num(rect.height)
        ));
        page.content.push_str("Q\n");

        Ok(())
    }

    /// Turn the open page into page objects
    fn flush_page(&mut self) {
        let Some(page) = self.current.take() else {
            return;
        };

        let content_id = self.doc.add_object(Stream::new(
            Dictionary::new(),
            page.content.into_bytes(),
        ));

        let mut resources = Dictionary::new();
        resources.set("XObject", Object::Dictionary(page.xobjects));

        let mut page_dict = Dictionary::new();
        page_dict.set("Type", Object::Name(b"Page".to_vec()));
        page_dict.set("Parent", Object::Reference(self.pages_id));
        page_dict.set(
            "MediaBox",
            Object::Array(vec![
                Object::Integer(0),
                Object::Integer(0),
                Object::Real(page.width),
                Object::Real(page.height),
            ]),
        );
        page_dict.set("Resources", Object::Dictionary(resources));
        page_dict.set("Contents", Object::Reference(content_id));

        let page_id = self.doc.add_object(Object::Dictionary(page_dict));
        self.page_ids.push(page_id);
    }

    /// Assemble the page tree and serialize the document
    pub fn finish(mut self) -> Result<Vec<u8>> {
        self.flush_page();

        if self.page_ids.is_empty() {
            return Err(Error::NoPages("No pages to write".to_string()));
        }

        let kids: Vec<Object> = self
            .page_ids
            .iter()
            .map(|&id| Object::Reference(id))
            .collect();

        let mut pages_object = Dictionary::new();
        pages_object.set("Type", Object::Name(b"Pages".to_vec()));
        pages_object.set("Count", Object::Integer(self.page_ids.len() as i64));
        pages_object.set("Kids", Object::Array(kids));
        self.doc
            .objects
            .insert(self.pages_id, Object::Dictionary(pages_object));

        let mut catalog = Dictionary::new();
        catalog.set("Type", Object::Name(b"Catalog".to_vec()));
        catalog.set("Pages", Object::Reference(self.pages_id));
        let catalog_id = self.doc.add_object(Object::Dictionary(catalog));

        let mut info = Dictionary::new();
        info.set(
            "Producer",
            Object::string_literal(concat!("pdf-sheets ", env!("CARGO_PKG_VERSION"))),
        );
        info.set(
            "CreationDate",
            Object::string_literal(Local::now().format("D:%Y%m%d%H%M%S").to_string()),
        );
        let info_id = self.doc.add_object(Object::Dictionary(info));

        self.doc.trailer.set("Root", Object::Reference(catalog_id));
        self.doc.trailer.set("Info", Object::Reference(info_id));

        self.doc.compress();
        let mut buf = Vec::new();
        self.doc.save_to(&mut buf)?;
        Ok(buf)
    }
}

/// Format a coordinate without trailing zeros
fn fmt_num(value: f32) -> String {
    let s = format!("{:.3}", value);
    let s = s.trim_end_matches('0').trim_end_matches('.');
    if s == "-0" {
        "0".to_string()
    } else {
        s.to_string()
    }
}

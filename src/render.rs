//! Page rasterization.
//!
//! Rendering goes through the [`PageRenderer`] trait so that every operation
//! that needs pixels (color inversion, N-up composition, image export) can be
//! driven by pdfium in production and by a lightweight stand-in in tests.
//!
//! [`PdfiumRenderer`] binds the pdfium shared library at runtime. It looks
//! next to the working directory first and then falls back to the system
//! library path; a missing library surfaces as [`Error::Render`] rather than a
//! panic.

use image::RgbaImage;
use pdfium_render::prelude::*;
use tracing::debug;

use crate::error::{Error, Result};

/// Opens PDF bytes for rendering
pub trait PageRenderer {
    fn open<'a>(&'a self, bytes: &'a [u8]) -> Result<Box<dyn RenderDocument + 'a>>;
}

/// An opened document that can rasterize its pages
///
/// Page indices are 0-based. Sizes are in PDF points as displayed, i.e. with
/// the page's rotation applied.
pub trait RenderDocument {
    fn page_count(&self) -> usize;

    fn page_size(&self, index: usize) -> Result<(f32, f32)>;

    /// Render a page at `scale` pixels per point onto a white background
    fn render(&self, index: usize, scale: f32) -> Result<RgbaImage>;
}

/// Renderer backed by the pdfium library
pub struct PdfiumRenderer {
    pdfium: Pdfium,
}

impl PdfiumRenderer {
    /// Bind pdfium from the working directory or the system library path
    pub fn new() -> Result<Self> {
        let bindings = Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path("./"))
            .or_else(|_| Pdfium::bind_to_system_library())
            .map_err(|e| Error::Render {
                page: 0,
                detail: format!("pdfium library not available: {:?}", e),
            })?;

        Ok(Self {
            pdfium: Pdfium::new(bindings),
        })
    }
}

impl PageRenderer for PdfiumRenderer {
    fn open<'a>(&'a self, bytes: &'a [u8]) -> Result<Box<dyn RenderDocument + 'a>> {
        let document = self
            .pdfium
            .load_pdf_from_byte_slice(bytes, None)
            .map_err(|e| Error::General(format!("Failed to load PDF: {:?}", e)))?;

        Ok(Box::new(PdfiumDocument { document }))
    }
}

struct PdfiumDocument<'a> {
    document: PdfDocument<'a>,
}

impl PdfiumDocument<'_> {
    fn page(&self, index: usize) -> Result<PdfPage<'_>> {
        let page_index = PdfPageIndex::try_from(index).map_err(|e| Error::render(index + 1, e))?;
        self.document
            .pages()
            .get(page_index)
            .map_err(|e| Error::render(index + 1, format!("{:?}", e)))
    }
}

impl RenderDocument for PdfiumDocument<'_> {
    fn page_count(&self) -> usize {
        self.document.pages().len() as usize
    }

    fn page_size(&self, index: usize) -> Result<(f32, f32)> {
        let page = self.page(index)?;
        Ok((page.width().value, page.height().value))
    }

    fn render(&self, index: usize, scale: f32) -> Result<RgbaImage> {
        let page = self.page(index)?;

        // The default clear color is white, which transparent pages need
        let config = PdfRenderConfig::new().scale_page_by_factor(scale);
        let bitmap = page
            .render_with_config(&config)
            .map_err(|e| Error::render(index + 1, format!("{:?}", e)))?;

        let image = bitmap.as_image().to_rgba8();
        debug!(
            "Rendered page {} at {:.2}x -> {}x{} px",
            index + 1,
            scale,
            image.width(),
            image.height()
        );

        Ok(image)
    }
}

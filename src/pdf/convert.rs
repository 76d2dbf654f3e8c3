//! Export PDF pages as PNG, JPEG or WebP images

use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::output::OutputFile;
use crate::progress::{scaled, ProgressSink};
use crate::raster::{encode_image, ImageFormat};
use crate::ranges::PageSelection;
use crate::render::PageRenderer;

/// Largest accepted render scale (720 DPI)
pub const MAX_SCALE: f32 = 10.0;

/// Options for page image export
#[derive(Debug, Clone)]
pub struct ConvertOptions {
    pub format: ImageFormat,
    /// JPEG quality, 1-100
    pub quality: u8,
    /// Pixels per point; 2.0 renders at 144 DPI
    pub scale: f32,
    pub pages: PageSelection,
    /// File name prefix, images are named `{prefix}_{page}.{ext}`
    pub prefix: String,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            format: ImageFormat::Png,
            quality: 95,
            scale: 2.0,
            pages: PageSelection::All,
            prefix: "page".to_string(),
        }
    }
}

impl ConvertOptions {
    pub fn validate(&self) -> Result<()> {
        if !(1..=100).contains(&self.quality) {
            return Err(Error::General(format!(
                "Quality must be between 1 and 100, got {}",
                self.quality
            )));
        }
        if !self.scale.is_finite() || self.scale <= 0.0 || self.scale > MAX_SCALE {
            return Err(Error::General(format!(
                "Scale must be greater than 0 and at most {}, got {}",
                MAX_SCALE, self.scale
            )));
        }
        Ok(())
    }

    /// Output DPI implied by the scale
    pub fn dpi(&self) -> f32 {
        72.0 * self.scale
    }

    fn file_name(&self, page: u32) -> String {
        let prefix = match self.prefix.trim() {
            "" => "page",
            prefix => prefix,
        };
        format!("{}_{}.{}", prefix, page, self.format.extension())
    }
}

/// One exported page image
#[derive(Debug, Clone)]
pub struct RenderedImage {
    pub file: OutputFile,
    /// 1-based source page
    pub page_number: u32,
    pub width: u32,
    pub height: u32,
}

/// Number of pages in a PDF, as seen by the renderer
pub fn get_page_count(bytes: &[u8], renderer: &dyn PageRenderer) -> Result<usize> {
    Ok(renderer.open(bytes)?.page_count())
}

/// Render the selected pages of a PDF to images
///
/// Images come back in ascending page order. A failure on any page aborts
/// the export.
pub fn pdf_to_images(
    bytes: &[u8],
    options: &ConvertOptions,
    renderer: &dyn PageRenderer,
    progress: &dyn ProgressSink,
) -> Result<Vec<RenderedImage>> {
    options.validate()?;

    progress.report("Loading PDF...", 10);
    let document = renderer.open(bytes)?;
    let total = document.page_count() as u32;
    if total == 0 {
        return Err(Error::NoPages("No pages found in PDF".to_string()));
    }

    let pages = options.pages.resolve(total)?;
    progress.report(&format!("Converting {} page(s)...", pages.len()), 20);

    let mut images = Vec::with_capacity(pages.len());
    for (done, &page) in pages.iter().enumerate() {
        let image = document.render(page as usize - 1, options.scale)?;
        let (width, height) = image.dimensions();
        let encoded = encode_image(&image, options.format, options.quality)?;

        debug!(
            "Page {} -> {}x{} {} ({} bytes)",
            page,
            width,
            height,
            options.format,
            encoded.len()
        );

        images.push(RenderedImage {
            file: OutputFile::new(options.file_name(page), encoded),
            page_number: page,
            width,
            height,
        });

        progress.report(
            &format!("Converted page {} ({}/{})", page, done + 1, pages.len()),
            scaled(20, 70, done + 1, pages.len()),
        );
    }

    info!(
        "Converted {} pages to {} at {:.0} DPI",
        images.len(),
        options.format,
        options.dpi()
    );
    progress.report("Complete!", 100);

    Ok(images)
}

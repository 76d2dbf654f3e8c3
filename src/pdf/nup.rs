//! N-up composition: several source pages per printed sheet
//!
//! Every page of every input is rasterized, scaled to fit a cell of the
//! sheet grid computed by [`SheetLayout`], and placed in reading order. The
//! output sheets keep their physical paper size whatever DPI the grid was
//! computed at.

use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::layout::{LayoutOptions, Rect, SheetLayout};
use crate::pdf::input::InputPdf;
use crate::pdf::writer::{ImagePdfWriter, PdfRect};
use crate::progress::{scaled, ProgressSink};
use crate::raster::{encode_jpeg, flatten_on_white};
use crate::render::PageRenderer;

/// JPEG quality of placed thumbnails
pub const THUMBNAIL_JPEG_QUALITY: u8 = 90;

/// Cell border color, light grey (200, 200, 200)
const BORDER_GRAY: f32 = 200.0 / 255.0;

/// Options for composing an N-up document
#[derive(Debug, Clone, Default)]
pub struct NupOptions {
    pub layout: LayoutOptions,
    /// Outline each populated cell
    pub show_border: bool,
    /// Output name without extension
    pub output_name: Option<String>,
}

impl NupOptions {
    /// File name for the composed document
    pub fn output_file_name(&self) -> String {
        match self.output_name.as_deref().map(str::trim) {
            Some(name) if !name.is_empty() => format!("{}.pdf", name),
            _ => "nup_output.pdf".to_string(),
        }
    }
}

/// A rendered source page, already encoded for embedding
struct Thumbnail {
    jpeg: Vec<u8>,
    width: u32,
    height: u32,
}

/// Compose the pages of `inputs` onto N-up sheets
pub fn compose_nup(
    inputs: &[InputPdf],
    options: &NupOptions,
    renderer: &dyn PageRenderer,
    progress: &dyn ProgressSink,
) -> Result<Vec<u8>> {
    if inputs.is_empty() {
        return Err(Error::NoPages("No files selected".to_string()));
    }

    let layout = SheetLayout::new(&options.layout)?;

    progress.report("Loading documents...", 5);
    let documents = inputs
        .iter()
        .map(|input| renderer.open(&input.bytes))
        .collect::<Result<Vec<_>>>()?;

    let total_pages: usize = documents.iter().map(|doc| doc.page_count()).sum();
    if total_pages == 0 {
        return Err(Error::NoPages("No pages found".to_string()));
    }

    debug!(
        "Composing {} pages on a {}x{} grid, {}x{} px cells",
        total_pages, layout.rows, layout.cols, layout.cell_width, layout.cell_height
    );

    progress.report("Rendering pages...", 10);
    let mut thumbnails = Vec::with_capacity(total_pages);
    for document in &documents {
        for index in 0..document.page_count() {
            let (width_pt, height_pt) = document.page_size(index)?;
            let scale = layout.render_scale(width_pt, height_pt);
            let image = document.render(index, scale)?;

            thumbnails.push(Thumbnail {
                jpeg: encode_jpeg(&flatten_on_white(&image), THUMBNAIL_JPEG_QUALITY)?,
                width: image.width(),
                height: image.height(),
            });

            progress.report(
                &format!("Rendered {}/{} pages", thumbnails.len(), total_pages),
                scaled(10, 50, thumbnails.len(), total_pages),
            );
        }
    }
    // Document handles are no longer needed once every page is encoded
    drop(documents);

    let (sheet_width_pt, sheet_height_pt) = layout.sheet_size_pt();
    let k = layout.pt_per_px();
    let to_pdf = |rect: Rect| {
        PdfRect::new(
            rect.x as f32 * k,
            sheet_height_pt - (rect.y + rect.height) as f32 * k,
            rect.width as f32 * k,
            rect.height as f32 * k,
        )
    };

    let mut writer = ImagePdfWriter::new();
    let mut current_sheet = None;

    for (index, thumb) in thumbnails.into_iter().enumerate() {
        let placement = layout.placement(index);
        if current_sheet != Some(placement.sheet) {
            writer.add_page(sheet_width_pt, sheet_height_pt);
            current_sheet = Some(placement.sheet);
        }

        let target = layout.fit(placement.cell, thumb.width, thumb.height);
        writer.draw_jpeg(thumb.jpeg, thumb.width, thumb.height, to_pdf(target))?;

        if options.show_border {
            let cell = placement.cell;
            // Half-pixel inset keeps the 1 px stroke inside the cell
            let border = PdfRect::new(
                (cell.x as f32 + 0.5) * k,
                sheet_height_pt - (cell.y as f32 + cell.height as f32 - 0.5) * k,
                (cell.width as f32 - 1.0) * k,
                (cell.height as f32 - 1.0) * k,
            );
            writer.stroke_rect(border, BORDER_GRAY, k)?;
        }

        progress.report(
            &format!("Placed {}/{} thumbnails", index + 1, total_pages),
            scaled(60, 35, index + 1, total_pages),
        );
    }

    progress.report("Finalizing PDF...", 98);
    let sheets = writer.page_count();
    let bytes = writer.finish()?;

    info!(
        "Composed {} pages onto {} sheets ({} per sheet)",
        total_pages,
        sheets,
        layout.cells_per_sheet()
    );
    progress.report("Complete!", 100);

    Ok(bytes)
}

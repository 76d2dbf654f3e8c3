//! N-up sheet layout calculations
//!
//! All sheet geometry is computed in pixels at the requested DPI with the
//! origin at the top-left corner of the sheet. Conversion to PDF points happens
//! only when a sheet is written out.

use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

/// Lowest DPI accepted for sheet rendering
pub const MIN_DPI: u32 = 72;

/// Highest DPI accepted for sheet rendering
pub const MAX_DPI: u32 = 1200;

/// Most rows or columns a sheet grid may have
pub const MAX_GRID: u32 = 100;

/// Upper bound on the rasterization scale of a single thumbnail
pub const MAX_RENDER_SCALE: f32 = 2.5;

/// Simple length type in millimeters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Length(pub f64);

impl Length {
    /// Create a length from millimeters
    pub fn from_mm(mm: f64) -> Self {
        Length(mm)
    }

    /// Get the value in millimeters
    pub fn mm(&self) -> f64 {
        self.0
    }

    /// Get the value in points (1/72 inch)
    pub fn pt(&self) -> f64 {
        self.0 * 72.0 / 25.4
    }

    /// Get the value in whole pixels at the given DPI
    pub fn px(&self, dpi: u32) -> i64 {
        mm_to_px(self.0, dpi)
    }
}

/// Convert millimeters to pixels, rounding to the nearest pixel
pub fn mm_to_px(mm: f64, dpi: u32) -> i64 {
    (mm * (dpi as f64 / 25.4)).round() as i64
}

/// Page dimensions
#[derive(Debug, Clone, Copy)]
pub struct PageDimensions {
    pub width: Length,
    pub height: Length,
}

impl PageDimensions {
    /// US Letter size (8.5" × 11")
    pub fn letter() -> Self {
        Self {
            width: Length::from_mm(215.9),
            height: Length::from_mm(279.4),
        }
    }

    /// A4 size (210mm × 297mm)
    pub fn a4() -> Self {
        Self {
            width: Length::from_mm(210.0),
            height: Length::from_mm(297.0),
        }
    }

    /// Swap width and height
    pub fn rotated(self) -> Self {
        Self {
            width: self.height,
            height: self.width,
        }
    }
}

/// Supported output paper sizes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PaperSize {
    #[default]
    A4,
    Letter,
}

impl PaperSize {
    pub fn dimensions(&self) -> PageDimensions {
        match self {
            PaperSize::A4 => PageDimensions::a4(),
            PaperSize::Letter => PageDimensions::letter(),
        }
    }
}

impl FromStr for PaperSize {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "a4" => Ok(PaperSize::A4),
            "letter" => Ok(PaperSize::Letter),
            other => Err(Error::InvalidLayout(format!("Unknown paper size: {}", other))),
        }
    }
}

impl fmt::Display for PaperSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PaperSize::A4 => write!(f, "A4"),
            PaperSize::Letter => write!(f, "Letter"),
        }
    }
}

/// Sheet orientation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Orientation {
    #[default]
    Portrait,
    Landscape,
}

impl FromStr for Orientation {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "portrait" => Ok(Orientation::Portrait),
            "landscape" => Ok(Orientation::Landscape),
            other => Err(Error::InvalidLayout(format!("Unknown orientation: {}", other))),
        }
    }
}

/// Inputs for an N-up sheet grid
#[derive(Debug, Clone)]
pub struct LayoutOptions {
    pub paper: PaperSize,
    pub orientation: Orientation,
    pub rows: u32,
    pub cols: u32,
    pub dpi: u32,
    /// Margin between the sheet edge and the grid
    pub outer_margin: Length,
    /// Gap between neighbouring cells
    pub inner_margin: Length,
}

impl Default for LayoutOptions {
    fn default() -> Self {
        Self {
            paper: PaperSize::A4,
            orientation: Orientation::Portrait,
            rows: 2,
            cols: 2,
            dpi: 180,
            outer_margin: Length::from_mm(5.0),
            inner_margin: Length::from_mm(1.0),
        }
    }
}

impl LayoutOptions {
    /// Check the inputs before any geometry is computed
    pub fn validate(&self) -> Result<()> {
        if self.rows < 1 || self.cols < 1 {
            return Err(Error::InvalidLayout(format!(
                "rows and columns must be at least 1, got {}x{}",
                self.rows, self.cols
            )));
        }
        if self.rows > MAX_GRID || self.cols > MAX_GRID {
            return Err(Error::InvalidLayout(format!(
                "rows and columns must be at most {}, got {}x{}",
                MAX_GRID, self.rows, self.cols
            )));
        }
        if !(MIN_DPI..=MAX_DPI).contains(&self.dpi) {
            return Err(Error::InvalidLayout(format!(
                "DPI must be between {} and {}, got {}",
                MIN_DPI, MAX_DPI, self.dpi
            )));
        }
        for (name, margin) in [("outer", self.outer_margin), ("inner", self.inner_margin)] {
            if !margin.mm().is_finite() || margin.mm() < 0.0 {
                return Err(Error::InvalidLayout(format!(
                    "{} margin must be a non-negative number, got {}",
                    name,
                    margin.mm()
                )));
            }
        }

        // Margins must fit on the sheet before they are turned into pixels
        let dims = self.sheet_dimensions();
        let short_side = dims.width.mm().min(dims.height.mm());
        if 2.0 * self.outer_margin.mm() >= short_side {
            return Err(Error::InvalidLayout(format!(
                "outer margin of {} mm does not fit on a {} mm wide sheet",
                self.outer_margin.mm(),
                short_side
            )));
        }
        if self.inner_margin.mm() >= short_side {
            return Err(Error::InvalidLayout(format!(
                "inner margin of {} mm does not fit on a {} mm wide sheet",
                self.inner_margin.mm(),
                short_side
            )));
        }
        Ok(())
    }

    /// Sheet dimensions after applying orientation
    pub fn sheet_dimensions(&self) -> PageDimensions {
        let dims = self.paper.dimensions();
        match self.orientation {
            Orientation::Portrait => dims,
            Orientation::Landscape => dims.rotated(),
        }
    }
}

/// Axis-aligned rectangle in sheet pixels, origin at top-left
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rect {
    pub x: i64,
    pub y: i64,
    pub width: i64,
    pub height: i64,
}

/// Where a page lands in the composed output
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement {
    /// 0-based sheet index
    pub sheet: usize,
    /// 0-based cell index on the sheet, row-major
    pub slot: usize,
    pub cell: Rect,
}

/// Pixel-space geometry of an N-up sheet
#[derive(Debug, Clone, PartialEq)]
pub struct SheetLayout {
    pub rows: u32,
    pub cols: u32,
    pub dpi: u32,
    pub sheet_width: i64,
    pub sheet_height: i64,
    pub outer_margin: i64,
    pub inner_margin: i64,
    pub cell_width: i64,
    pub cell_height: i64,
    sheet_size_pt: (f32, f32),
}

impl SheetLayout {
    /// Compute the sheet grid for the given options
    pub fn new(options: &LayoutOptions) -> Result<Self> {
        options.validate()?;

        let dims = options.sheet_dimensions();
        let dpi = options.dpi;

        let sheet_width = dims.width.px(dpi);
        let sheet_height = dims.height.px(dpi);
        let outer_margin = options.outer_margin.px(dpi);
        let inner_margin = options.inner_margin.px(dpi);

        let printable_width = sheet_width - 2 * outer_margin;
        let printable_height = sheet_height - 2 * outer_margin;
        let cols = options.cols as i64;
        let rows = options.rows as i64;

        let cell_width = (printable_width - (cols - 1) * inner_margin).div_euclid(cols);
        let cell_height = (printable_height - (rows - 1) * inner_margin).div_euclid(rows);

        if cell_width <= 0 || cell_height <= 0 {
            return Err(Error::InvalidLayout(format!(
                "margins leave no room for a {}x{} grid on a {}x{} px sheet",
                options.rows, options.cols, sheet_width, sheet_height
            )));
        }

        Ok(Self {
            rows: options.rows,
            cols: options.cols,
            dpi,
            sheet_width,
            sheet_height,
            outer_margin,
            inner_margin,
            cell_width,
            cell_height,
            sheet_size_pt: (dims.width.pt() as f32, dims.height.pt() as f32),
        })
    }

    pub fn cells_per_sheet(&self) -> usize {
        (self.rows * self.cols) as usize
    }

    /// Number of sheets needed for `page_count` pages
    pub fn sheet_count(&self, page_count: usize) -> usize {
        page_count.div_ceil(self.cells_per_sheet())
    }

    /// Rectangle of the cell at `slot` (row-major)
    pub fn cell_rect(&self, slot: usize) -> Rect {
        let cols = self.cols as usize;
        let row = (slot / cols) as i64;
        let col = (slot % cols) as i64;
        Rect {
            x: self.outer_margin + col * (self.cell_width + self.inner_margin),
            y: self.outer_margin + row * (self.cell_height + self.inner_margin),
            width: self.cell_width,
            height: self.cell_height,
        }
    }

    /// Sheet, slot and cell for the page at `index` in reading order
    pub fn placement(&self, index: usize) -> Placement {
        let per_sheet = self.cells_per_sheet();
        let slot = index % per_sheet;
        Placement {
            sheet: index / per_sheet,
            slot,
            cell: self.cell_rect(slot),
        }
    }

    /// Scale an image of `width`×`height` pixels to fit `cell`, centered
    pub fn fit(&self, cell: Rect, width: u32, height: u32) -> Rect {
        if width == 0 || height == 0 {
            return Rect { x: cell.x, y: cell.y, width: 0, height: 0 };
        }
        let scale = f64::min(
            cell.width as f64 / width as f64,
            cell.height as f64 / height as f64,
        );
        let draw_width = (width as f64 * scale).round() as i64;
        let draw_height = (height as f64 * scale).round() as i64;

        Rect {
            x: cell.x + ((cell.width - draw_width) as f64 / 2.0).round() as i64,
            y: cell.y + ((cell.height - draw_height) as f64 / 2.0).round() as i64,
            width: draw_width,
            height: draw_height,
        }
    }

    /// Rasterization scale for a source page measured in points
    ///
    /// Scale 1.0 renders one pixel per point (72 DPI).
    pub fn render_scale(&self, page_width_pt: f32, page_height_pt: f32) -> f32 {
        if page_width_pt <= 0.0 || page_height_pt <= 0.0 {
            return 1.0;
        }
        (self.cell_width as f32 / page_width_pt)
            .min(self.cell_height as f32 / page_height_pt)
            .min(MAX_RENDER_SCALE)
    }

    /// Physical sheet size in PDF points
    pub fn sheet_size_pt(&self) -> (f32, f32) {
        self.sheet_size_pt
    }

    /// Points per sheet pixel
    pub fn pt_per_px(&self) -> f32 {
        72.0 / self.dpi as f32
    }
}

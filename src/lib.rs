//! PDF Sheets Library
//!
//! A cross-platform library for everyday PDF page work.
//! This library provides functionality to:
//! - Merge multiple PDF files, optionally inverting their colors
//! - Split a PDF by page ranges, fixed intervals, or page by page
//! - Compose N-up sheets (several pages per printed sheet)
//! - Export pages as PNG, JPEG or WebP images
//! - Bundle multi-file results into a zip archive
//!
//! Operations take bytes and return bytes. Anything that needs pixels goes
//! through a [`render::PageRenderer`], which is pdfium in production.
//!
//! # Example
//!
//! ```no_run
//! use pdf_sheets::pdf::{split_document, SplitMode};
//! use pdf_sheets::progress::NoProgress;
//!
//! let bytes = std::fs::read("lecture.pdf").expect("read input");
//! let mode = SplitMode::Ranges("1-3, 5".to_string());
//! let files = split_document(&bytes, &mode, &NoProgress).expect("Failed to split");
//!
//! for file in &files {
//!     println!("{} ({} bytes)", file.filename, file.bytes.len());
//! }
//! ```

pub mod error;
pub mod layout;
pub mod output;
pub mod pdf;
pub mod progress;
pub mod ranges;
pub mod raster;
pub mod render;
pub mod util;

// Re-export commonly used items
pub use error::{Error, Result};

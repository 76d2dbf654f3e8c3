//! Error types for the pdf-sheets library

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the pdf-sheets library
#[derive(Error, Debug)]
pub enum Error {
    /// PDF processing error
    #[error("PDF error: {0}")]
    Pdf(#[from] lopdf::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Image encoding error
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    /// Zip packaging error
    #[error("Zip error: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// A page could not be rasterized
    #[error("Failed to render page {page}: {detail}")]
    Render { page: usize, detail: String },

    /// Page range text produced nothing usable
    #[error("Invalid page range: {0}")]
    InvalidRange(String),

    /// Sheet geometry cannot be laid out
    #[error("Invalid layout: {0}")]
    InvalidLayout(String),

    /// Nothing to process
    #[error("{0}")]
    NoPages(String),

    /// File not found
    #[error("File not found: {}", .0.display())]
    FileNotFound(PathBuf),

    /// Invalid glob pattern
    #[error("Invalid glob pattern: {0}")]
    InvalidGlob(String),

    /// No files matched pattern
    #[error("No PDF files found matching pattern: {0}")]
    NoFilesMatched(String),

    /// Invalid PDF (no pages)
    #[error("PDF has no pages: {0}")]
    EmptyPdf(String),

    /// General error
    #[error("{0}")]
    General(String),
}

impl Error {
    /// Build a render error for a 1-based page number
    pub fn render(page: usize, detail: impl std::fmt::Display) -> Self {
        Error::Render {
            page,
            detail: detail.to_string(),
        }
    }
}

//! PDF operations: merge, split, N-up composition and image export

pub mod convert;
pub mod input;
pub mod merge;
pub mod metadata;
pub mod nup;
pub mod split;
pub mod writer;

// Re-export commonly used items
pub use convert::{get_page_count, pdf_to_images, ConvertOptions, RenderedImage};
pub use input::InputPdf;
pub use merge::{merge_documents, merge_pdfs, merge_with_invert, MergeOptions};
pub use metadata::{count_pages, count_pages_in_memory, extract_metadata, PdfMetadata};
pub use nup::{compose_nup, NupOptions};
pub use split::{split_bundle_name, split_document, SplitMode};
pub use writer::{ImagePdfWriter, PdfRect};

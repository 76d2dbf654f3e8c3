//! Split one PDF into several, by range list, fixed interval, or page

use lopdf::Document;
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::output::OutputFile;
use crate::pdf::merge::{extract_pages, inherit_all_page_attributes, save_to_bytes};
use crate::progress::{scaled, ProgressSink};
use crate::ranges::{interval_ranges, parse_ranges, PageRange};

/// How to cut the document
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SplitMode {
    /// One file per page
    #[default]
    All,
    /// One file per item of range text such as `"1-3, 5, 7-10"`
    Ranges(String),
    /// One file per run of N pages
    Interval(u32),
}

impl SplitMode {
    /// Expand the mode into page ranges for a document of `total` pages
    pub fn ranges(&self, total: u32) -> Result<Vec<PageRange>> {
        match self {
            SplitMode::All => Ok((1..=total).map(PageRange::single).collect()),
            SplitMode::Ranges(text) => {
                let ranges: Vec<PageRange> = parse_ranges(text, total)
                    .into_iter()
                    .filter(|r| r.is_valid_for(total))
                    .collect();
                if ranges.is_empty() {
                    return Err(Error::InvalidRange(
                        "No valid page ranges specified".to_string(),
                    ));
                }
                Ok(ranges)
            }
            SplitMode::Interval(every) => Ok(interval_ranges(total, *every)),
        }
    }
}

/// Split a PDF into one document per range
///
/// Pages are copied with their vector content intact. Output files are named
/// after their range (`page_4.pdf`, `pages_1-3.pdf`) and come back in range
/// order. Any failure aborts the whole split.
pub fn split_document(
    bytes: &[u8],
    mode: &SplitMode,
    progress: &dyn ProgressSink,
) -> Result<Vec<OutputFile>> {
    progress.report("Loading PDF...", 10);

    let mut source = Document::load_mem(bytes)?;
    let page_ids = source.get_pages();
    let total = page_ids.len() as u32;
    if total == 0 {
        return Err(Error::NoPages("No pages found in PDF".to_string()));
    }

    let ranges = mode.ranges(total)?;
    let total_pages: usize = ranges.iter().map(PageRange::len).sum();
    progress.report(&format!("Processing {} range(s)...", ranges.len()), 20);

    // Once per document, so every range can be lifted out as-is
    inherit_all_page_attributes(&mut source)?;

    let mut outputs = Vec::with_capacity(ranges.len());
    let mut pages_done = 0;

    for (i, range) in ranges.iter().enumerate() {
        let selected = range
            .pages()
            .map(|page| {
                page_ids.get(&page).copied().ok_or_else(|| {
                    Error::InvalidRange(format!(
                        "page {} does not exist (document has {} pages)",
                        page, total
                    ))
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let mut doc = extract_pages(&source, &selected)?;
        let file = OutputFile::new(range.file_name(), save_to_bytes(&mut doc)?);
        debug!("Wrote {} ({} bytes)", file.filename, file.bytes.len());
        outputs.push(file);

        for page in range.pages() {
            pages_done += 1;
            progress.report(
                &format!("Processing range {}/{}, page {}", i + 1, ranges.len(), page),
                scaled(20, 70, pages_done, total_pages),
            );
        }
    }

    info!("Split {} pages into {} files", total, outputs.len());
    progress.report("Complete!", 100);

    Ok(outputs)
}

/// Name of the zip bundle holding the split files
///
/// Whitespace runs in the prefix become a single `_`.
pub fn split_bundle_name(prefix: Option<&str>) -> String {
    let prefix = prefix
        .map(|p| p.split_whitespace().collect::<Vec<_>>().join("_"))
        .unwrap_or_default();
    if prefix.is_empty() {
        "split_pdfs.zip".to_string()
    } else {
        format!("{}_split_pdfs.zip", prefix)
    }
}

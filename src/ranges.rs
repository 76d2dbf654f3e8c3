//! Page range parsing
//!
//! Range text follows the usual print-dialog grammar: comma separated items,
//! each either a single page (`5`) or an inclusive span (`7-10`). Pages are
//! 1-based. Items that do not parse are skipped rather than rejected, so
//! `"1-3, x, 5"` yields the two usable items.

use std::collections::BTreeSet;

use crate::error::{Error, Result};

/// An inclusive, 1-based span of pages
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRange {
    pub start: u32,
    pub end: u32,
}

impl PageRange {
    pub fn new(start: u32, end: u32) -> Self {
        Self { start, end }
    }

    pub fn single(page: u32) -> Self {
        Self { start: page, end: page }
    }

    /// Number of pages covered
    pub fn len(&self) -> usize {
        if self.is_empty() {
            0
        } else {
            (self.end - self.start + 1) as usize
        }
    }

    pub fn is_empty(&self) -> bool {
        self.end < self.start
    }

    /// True when the range lies within a document of `total` pages
    pub fn is_valid_for(&self, total: u32) -> bool {
        self.start >= 1 && self.start <= self.end && self.end <= total
    }

    pub fn pages(&self) -> impl Iterator<Item = u32> {
        self.start..=self.end
    }

    /// File name used when this range is written out on its own
    pub fn file_name(&self) -> String {
        if self.start == self.end {
            format!("page_{}.pdf", self.start)
        } else {
            format!("pages_{}-{}.pdf", self.start, self.end)
        }
    }
}

/// Parse one item into an unclamped (start, end) pair
fn parse_item(item: &str) -> Option<(u32, u32)> {
    if let Some((start, end)) = item.split_once('-') {
        let start: u32 = start.trim().parse().ok()?;
        let end: u32 = end.trim().parse().ok()?;
        if start >= 1 && end >= start {
            return Some((start, end));
        }
        None
    } else {
        let page: u32 = item.parse().ok()?;
        (page >= 1).then_some((page, page))
    }
}

/// Parse range text into spans, in the order written
///
/// When `max_pages` is non-zero, span ends are clamped to it. Starts are not,
/// so a span that begins past the end still comes back and is dropped later
/// by [`PageRange::is_valid_for`].
pub fn parse_ranges(text: &str, max_pages: u32) -> Vec<PageRange> {
    text.split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .filter_map(|item| {
            let is_span = item.contains('-');
            let (start, end) = parse_item(item)?;
            let end = if is_span && max_pages > 0 {
                end.min(max_pages)
            } else {
                end
            };
            Some(PageRange::new(start, end))
        })
        .collect()
}

/// Parse range text into a sorted list of distinct page numbers
pub fn parse_page_list(text: &str) -> Vec<u32> {
    parse_page_list_within(text, u32::MAX)
}

/// [`parse_page_list`] limited to pages `1..=max`
///
/// Spans are cut at `max` before they are expanded, so `"1-4000000000"`
/// costs no more than the document it is applied to.
pub fn parse_page_list_within(text: &str, max: u32) -> Vec<u32> {
    let mut pages = BTreeSet::new();
    for item in text.split(',').map(str::trim) {
        if let Some((start, end)) = parse_item(item) {
            if start <= max {
                pages.extend(start..=end.min(max));
            }
        }
    }
    pages.into_iter().collect()
}

/// Consecutive spans of `every` pages covering `1..=total`
pub fn interval_ranges(total: u32, every: u32) -> Vec<PageRange> {
    let every = every.max(1);
    (1..=total)
        .step_by(every as usize)
        .map(|start| PageRange::new(start, (start + every - 1).min(total)))
        .collect()
}

/// Which pages of a document an operation should touch
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum PageSelection {
    /// Every page (default)
    #[default]
    All,
    /// Pages named by range text such as `"1-3, 5"`
    Ranges(String),
}

impl PageSelection {
    /// Expand the selection into sorted page numbers within `1..=total`
    pub fn resolve(&self, total: u32) -> Result<Vec<u32>> {
        let pages: Vec<u32> = match self {
            PageSelection::All => (1..=total).collect(),
            PageSelection::Ranges(text) => {
                if text.trim().is_empty() {
                    return Err(Error::InvalidRange("Please specify page ranges".to_string()));
                }
                parse_page_list_within(text, total)
            }
        };

        if pages.is_empty() {
            return Err(Error::NoPages("No valid pages to convert".to_string()));
        }
        Ok(pages)
    }
}

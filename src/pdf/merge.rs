//! PDF merging functionality using lopdf

use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;

use lopdf::{Dictionary, Document, Object, ObjectId};
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::pdf::input::InputPdf;
use crate::pdf::writer::{ImagePdfWriter, PdfRect};
use crate::progress::{scaled, NoProgress, ProgressSink};
use crate::raster::invert_colors;
use crate::render::{PageRenderer, PdfiumRenderer};

/// Render scale used when pages are rasterized for color inversion
pub const INVERT_RENDER_SCALE: f32 = 3.0;

/// JPEG quality for rasterized pages
pub const INVERT_JPEG_QUALITY: u8 = 90;

/// Page attributes a page may inherit from its ancestors in the page tree
const INHERITABLE_ATTRIBUTES: [&[u8]; 4] = [b"Resources", b"MediaBox", b"CropBox", b"Rotate"];

/// Options for merging PDFs
#[derive(Debug, Clone)]
pub struct MergeOptions {
    /// Input PDF file paths in the order they should be merged
    pub input_paths: Vec<PathBuf>,
    /// Output PDF file path
    pub output_path: PathBuf,
    /// Rasterize the merged pages and invert their colors
    pub invert_colors: bool,
}

/// Merge multiple PDF files into a single PDF
///
/// Based on the lopdf merge example:
/// https://github.com/J-F-Liu/lopdf/blob/main/examples/merge.rs
///
/// # Example
///
/// ```no_run
/// use pdf_sheets::pdf::{MergeOptions, merge_pdfs};
/// use std::path::PathBuf;
///
/// let options = MergeOptions {
///     input_paths: vec![
///         PathBuf::from("1. first.pdf"),
///         PathBuf::from("2. second.pdf"),
///     ],
///     output_path: PathBuf::from("merged.pdf"),
///     invert_colors: false,
/// };
///
/// merge_pdfs(&options).expect("Failed to merge");
/// ```
pub fn merge_pdfs(options: &MergeOptions) -> Result<()> {
    if options.input_paths.is_empty() {
        return Err(Error::General("No input files provided".to_string()));
    }

    let inputs = options
        .input_paths
        .iter()
        .map(|path| InputPdf::from_path(path))
        .collect::<Result<Vec<_>>>()?;

    let bytes = if options.invert_colors {
        let renderer = PdfiumRenderer::new()?;
        merge_with_invert(&inputs, &renderer, &NoProgress)?
    } else {
        merge_documents(&inputs, &NoProgress)?
    };

    fs::write(&options.output_path, bytes)?;

    Ok(())
}

/// Merge in-memory PDFs, keeping every page in input order
pub fn merge_documents(inputs: &[InputPdf], progress: &dyn ProgressSink) -> Result<Vec<u8>> {
    if inputs.is_empty() {
        return Err(Error::General("No input files provided".to_string()));
    }

    progress.report("Starting merge...", 0);

    let mut sources = Vec::with_capacity(inputs.len());
    for (i, input) in inputs.iter().enumerate() {
        let doc = Document::load_mem(&input.bytes)?;
        let page_numbers: Vec<u32> = doc.get_pages().keys().copied().collect();

        // Validate document has pages
        if page_numbers.is_empty() {
            return Err(Error::EmptyPdf(input.name.clone()));
        }

        debug!("Loaded {} ({} pages)", input.name, page_numbers.len());
        sources.push((doc, page_numbers));

        progress.report(
            &format!("Merging: {}/{} files", i + 1, inputs.len()),
            scaled(0, 100, i + 1, inputs.len()),
        );
    }

    let mut merged = assemble_pages(sources)?;
    info!(
        "Merged {} files into {} pages",
        inputs.len(),
        merged.get_pages().len()
    );

    save_to_bytes(&mut merged)
}

/// Merge PDFs, then rasterize each page with inverted colors
///
/// The merge phase reports 0-50%, the inversion phase 50-100%. Output pages
/// keep the physical size of the source pages.
pub fn merge_with_invert(
    inputs: &[InputPdf],
    renderer: &dyn PageRenderer,
    progress: &dyn ProgressSink,
) -> Result<Vec<u8>> {
    let merge_progress = |status: &str, percent: u8| progress.report(status, percent / 2);
    let merged = merge_documents(inputs, &merge_progress)?;

    progress.report("Starting color inversion...", 50);

    let document = renderer.open(&merged)?;
    let total_pages = document.page_count();
    let mut writer = ImagePdfWriter::new();

    for index in 0..total_pages {
        let (width, height) = document.page_size(index)?;
        let mut image = document.render(index, INVERT_RENDER_SCALE)?;
        invert_colors(&mut image);

        writer.add_page(width, height);
        writer.draw_image(
            &image,
            PdfRect::new(0.0, 0.0, width, height),
            INVERT_JPEG_QUALITY,
        )?;

        progress.report(
            &format!("Inverting colors: {}/{} pages", index + 1, total_pages),
            scaled(50, 50, index + 1, total_pages),
        );
    }

    writer.finish()
}

/// Build a new document from selected pages of several source documents
///
/// `sources` pairs each document with the 1-based page numbers to take from
/// it, in output order. Objects are renumbered so sources cannot collide, and
/// inherited page attributes are copied onto each page before the page is
/// re-parented under the new page tree. Unreachable objects are pruned.
pub(crate) fn assemble_pages(sources: Vec<(Document, Vec<u32>)>) -> Result<Document> {
    // Define a starting max_id for merged document
    let mut max_id = 1;
    let mut page_ids: Vec<ObjectId> = Vec::new();
    let mut objects: BTreeMap<ObjectId, Object> = BTreeMap::new();

    for (mut doc, page_numbers) in sources {
        // Renumber objects in this document to avoid conflicts
        doc.renumber_objects_with(max_id);

        // Update max_id for next document
        max_id = doc.max_id + 1;

        let pages = doc.get_pages();
        for number in page_numbers {
            let page_id = *pages.get(&number).ok_or_else(|| {
                Error::InvalidRange(format!(
                    "page {} does not exist (document has {} pages)",
                    number,
                    pages.len()
                ))
            })?;
            inherit_page_attributes(&mut doc, page_id)?;
            page_ids.push(page_id);
        }

        // Collect all objects from this document
        objects.extend(doc.objects);
    }

    let mut merged_doc = Document::with_version("1.5");

    // Add all collected objects FIRST
    merged_doc.objects.extend(objects);

    // new_object_id() must hand out ids above everything just added
    merged_doc.max_id = max_id - 1;

    install_page_tree(&mut merged_doc, &page_ids);

    // Drops the old catalogs and any page that was not selected
    merged_doc.prune_objects();

    Ok(merged_doc)
}

/// Copy inherited attributes onto every page of `doc`
///
/// Afterwards each page can be lifted out of the page tree on its own.
pub(crate) fn inherit_all_page_attributes(doc: &mut Document) -> Result<()> {
    let page_ids: Vec<ObjectId> = doc.get_pages().into_values().collect();
    for page_id in page_ids {
        inherit_page_attributes(doc, page_id)?;
    }
    Ok(())
}

/// Build a document holding only `page_ids` of `source` and what they use
///
/// Object ids are kept, so nothing is renumbered. Only objects reachable from
/// the selected pages are copied; links from a page to its old page tree are
/// not followed. Run [`inherit_all_page_attributes`] on `source` first.
pub(crate) fn extract_pages(source: &Document, page_ids: &[ObjectId]) -> Result<Document> {
    let mut doc = Document::with_version(source.version.clone());
    let mut pending: Vec<ObjectId> = page_ids.to_vec();

    while let Some(id) = pending.pop() {
        if doc.objects.contains_key(&id) {
            continue;
        }
        // Dangling references are left as they are
        let Ok(object) = source.get_object(id) else {
            continue;
        };
        collect_references(object, &mut pending);
        doc.objects.insert(id, object.clone());
    }

    doc.max_id = source.max_id;
    install_page_tree(&mut doc, page_ids);

    Ok(doc)
}

fn collect_references(object: &Object, out: &mut Vec<ObjectId>) {
    match object {
        Object::Reference(id) => out.push(*id),
        Object::Array(items) => {
            for item in items {
                collect_references(item, out);
            }
        }
        Object::Dictionary(dict) => collect_dictionary_references(dict, out),
        Object::Stream(stream) => collect_dictionary_references(&stream.dict, out),
        _ => {}
    }
}

fn collect_dictionary_references(dict: &Dictionary, out: &mut Vec<ObjectId>) {
    let is_tree_node = matches!(
        dict.get(b"Type").and_then(Object::as_name),
        Ok(b"Page") | Ok(b"Pages")
    );
    for (key, value) in dict.iter() {
        if is_tree_node && key.as_slice() == b"Parent" {
            continue;
        }
        collect_references(value, out);
    }
}

/// Add a Pages node and Catalog over `page_ids` and point the trailer at them
fn install_page_tree(doc: &mut Document, page_ids: &[ObjectId]) {
    let pages_id = doc.new_object_id();

    let kids: Vec<Object> = page_ids
        .iter()
        .map(|&id| Object::Reference(id))
        .collect();

    let mut pages_object = Dictionary::new();
    pages_object.set("Type", Object::Name(b"Pages".to_vec()));
    pages_object.set("Count", Object::Integer(page_ids.len() as i64));
    pages_object.set("Kids", Object::Array(kids));

    let catalog_id = doc.new_object_id();
    let mut catalog = Dictionary::new();
    catalog.set("Type", Object::Name(b"Catalog".to_vec()));
    catalog.set("Pages", Object::Reference(pages_id));

    doc.objects.insert(catalog_id, Object::Dictionary(catalog));
    doc.objects.insert(pages_id, Object::Dictionary(pages_object));

    doc.trailer.set("Root", Object::Reference(catalog_id));

    // Update parent references for all pages
    for &page_id in page_ids {
        if let Ok(Object::Dictionary(dict)) = doc.get_object_mut(page_id) {
            dict.set("Parent", Object::Reference(pages_id));
        }
    }
}

/// Copy attributes a page inherits from its parents onto the page itself
fn inherit_page_attributes(doc: &mut Document, page_id: ObjectId) -> Result<()> {
    let mut inherited: Vec<(Vec<u8>, Object)> = Vec::new();

    {
        let page = doc.get_dictionary(page_id)?;
        let mut missing: Vec<&[u8]> = INHERITABLE_ATTRIBUTES
            .iter()
            .copied()
            .filter(|key| !page.has(key))
            .collect();

        let mut parent = page.get(b"Parent").and_then(Object::as_reference).ok();
        // Page trees are shallow; the cap guards against Parent cycles
        let mut depth = 0;

        while let Some(parent_id) = parent {
            if missing.is_empty() || depth > 64 {
                break;
            }
            let Ok(node) = doc.get_dictionary(parent_id) else {
                break;
            };

            missing.retain(|key| match node.get(key) {
                Ok(value) => {
                    inherited.push((key.to_vec(), value.clone()));
                    false
                }
                Err(_) => true,
            });

            parent = node.get(b"Parent").and_then(Object::as_reference).ok();
            depth += 1;
        }
    }

    if !inherited.is_empty() {
        let page = doc.get_dictionary_mut(page_id)?;
        for (key, value) in inherited {
            page.set(key, value);
        }
    }

    Ok(())
}

/// Compress and serialize a document
pub(crate) fn save_to_bytes(doc: &mut Document) -> Result<Vec<u8>> {
    doc.compress();
    let mut buf = Vec::new();
    doc.save_to(&mut buf)?;
    Ok(buf)
}

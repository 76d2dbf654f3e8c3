//! Integration tests for the pdf-sheets library

mod common;

use std::cell::RefCell;
use std::fs;
use std::path::PathBuf;

use common::{fixture_pdf, letter_pdf, page_markers, page_sizes, FakeRenderer, A4, LETTER};
use pdf_sheets::layout::{LayoutOptions, Length, Orientation, PaperSize, SheetLayout};
use pdf_sheets::output::{write_outputs, zip_to_bytes};
use pdf_sheets::pdf::{
    compose_nup, count_pages, count_pages_in_memory, get_page_count, merge_documents,
    merge_pdfs, merge_with_invert, pdf_to_images, split_document, ConvertOptions, InputPdf,
    MergeOptions, NupOptions, SplitMode,
};
use pdf_sheets::progress::NoProgress;
use pdf_sheets::raster::ImageFormat;
use pdf_sheets::ranges::PageSelection;
use pdf_sheets::Error;
use tempfile::TempDir;

/// Records every progress report
#[derive(Default)]
struct Recorder {
    seen: RefCell<Vec<(String, u8)>>,
}

impl Recorder {
    fn sink(&self) -> impl Fn(&str, u8) + '_ {
        move |status: &str, percent: u8| self.seen.borrow_mut().push((status.to_string(), percent))
    }

    fn percents(&self) -> Vec<u8> {
        self.seen.borrow().iter().map(|(_, p)| *p).collect()
    }

    fn statuses(&self) -> Vec<String> {
        self.seen.borrow().iter().map(|(s, _)| s.clone()).collect()
    }
}

fn assert_monotonic(percents: &[u8]) {
    assert!(
        percents.windows(2).all(|w| w[0] <= w[1]),
        "progress went backwards: {:?}",
        percents
    );
}

fn write_fixture(dir: &TempDir, name: &str, bytes: &[u8]) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, bytes).expect("write fixture");
    path
}

// ── merge ──────────────────────────────────────────────────────────────────

#[test]
fn test_merge_pdfs_page_count() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let input_paths = vec![
        write_fixture(&temp_dir, "1. intro.pdf", &letter_pdf(1)),
        write_fixture(&temp_dir, "2. practice.pdf", &letter_pdf(1)),
        write_fixture(&temp_dir, "3. handout.pdf", &letter_pdf(6)),
    ];
    let output_path = temp_dir.path().join("merged.pdf");

    let options = MergeOptions {
        input_paths,
        output_path: output_path.clone(),
        invert_colors: false,
    };

    merge_pdfs(&options).expect("Failed to merge PDFs");

    assert!(output_path.exists(), "Merged PDF was not created");
    let merged_page_count = count_pages(&output_path).expect("Failed to count pages in merged PDF");
    assert_eq!(merged_page_count, 8);
}

#[test]
fn test_merge_preserves_content_order() {
    let first = fixture_pdf(&[LETTER, A4]);
    let second = fixture_pdf(&[(300.0, 300.0)]);
    let inputs = vec![
        InputPdf::new("first.pdf", first),
        InputPdf::new("second.pdf", second),
    ];

    let merged = merge_documents(&inputs, &NoProgress).expect("merge");

    assert_eq!(page_markers(&merged), vec!["% page 1", "% page 2", "% page 1"]);
    assert_eq!(page_sizes(&merged), vec![LETTER, A4, (300.0, 300.0)]);
}

#[test]
fn test_merge_single_file_is_identity() {
    let original = fixture_pdf(&[LETTER, A4, LETTER]);
    let inputs = vec![InputPdf::new("only.pdf", original.clone())];

    let merged = merge_documents(&inputs, &NoProgress).expect("merge");

    assert_eq!(count_pages_in_memory(&merged).unwrap(), 3);
    assert_eq!(page_markers(&merged), page_markers(&original));
}

#[test]
fn test_merge_progress_per_file() {
    let inputs: Vec<InputPdf> = (0..4)
        .map(|i| InputPdf::new(format!("{}.pdf", i), letter_pdf(1)))
        .collect();
    let recorder = Recorder::default();

    merge_documents(&inputs, &recorder.sink()).expect("merge");

    let statuses = recorder.statuses();
    assert!(statuses.contains(&"Merging: 2/4 files".to_string()));
    assert_eq!(recorder.percents().last(), Some(&100));
    assert_monotonic(&recorder.percents());
}

#[test]
fn test_merge_rejects_empty_document() {
    let inputs = vec![
        InputPdf::new("good.pdf", letter_pdf(2)),
        InputPdf::new("blank.pdf", fixture_pdf(&[])),
    ];

    let result = merge_documents(&inputs, &NoProgress);
    assert!(matches!(result, Err(Error::EmptyPdf(name)) if name == "blank.pdf"));
}

#[test]
fn test_merge_empty_input_list() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let output_path = temp_dir.path().join("empty.pdf");

    let options = MergeOptions {
        input_paths: vec![],
        output_path: output_path.clone(),
        invert_colors: false,
    };

    let result = merge_pdfs(&options);
    assert!(result.is_err(), "Should fail with empty input list");

    if let Err(e) = result {
        assert!(
            e.to_string().contains("No input files"),
            "Error message should mention no input files"
        );
    }
    assert!(!output_path.exists());
}

#[test]
fn test_merge_nonexistent_file() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let output_path = temp_dir.path().join("output.pdf");

    let options = MergeOptions {
        input_paths: vec![PathBuf::from("nonexistent.pdf")],
        output_path: output_path.clone(),
        invert_colors: false,
    };

    let result = merge_pdfs(&options);
    assert!(result.is_err(), "Should fail with nonexistent file");

    if let Err(e) = result {
        assert!(
            e.to_string().contains("not found") || e.to_string().contains("nonexistent"),
            "Error should mention file not found: {}",
            e
        );
    }
}

#[test]
fn test_merge_with_invert_keeps_physical_size() {
    let inputs = vec![
        InputPdf::new("a.pdf", fixture_pdf(&[LETTER])),
        InputPdf::new("b.pdf", fixture_pdf(&[A4, (200.0, 100.0)])),
    ];
    let recorder = Recorder::default();

    let inverted =
        merge_with_invert(&inputs, &FakeRenderer::default(), &recorder.sink()).expect("invert");

    assert_eq!(page_sizes(&inverted), vec![LETTER, A4, (200.0, 100.0)]);

    let percents = recorder.percents();
    assert_monotonic(&percents);
    assert!(percents.contains(&50));
    assert_eq!(percents.last(), Some(&100));
    assert!(recorder
        .statuses()
        .contains(&"Inverting colors: 3/3 pages".to_string()));
}

#[test]
fn test_merge_with_invert_aborts_on_render_failure() {
    let inputs = vec![InputPdf::new("a.pdf", letter_pdf(3))];

    let result = merge_with_invert(&inputs, &FakeRenderer::failing_on(1), &NoProgress);
    assert!(matches!(result, Err(Error::Render { page: 2, .. })));
}

// ── split ──────────────────────────────────────────────────────────────────

#[test]
fn test_split_by_ranges() {
    let source = letter_pdf(10);
    let mode = SplitMode::Ranges("1-3, 5, 7-12".to_string());

    let files = split_document(&source, &mode, &NoProgress).expect("split");

    let names: Vec<&str> = files.iter().map(|f| f.filename.as_str()).collect();
    assert_eq!(names, vec!["pages_1-3.pdf", "page_5.pdf", "pages_7-10.pdf"]);

    assert_eq!(
        page_markers(&files[0].bytes),
        vec!["% page 1", "% page 2", "% page 3"]
    );
    assert_eq!(page_markers(&files[1].bytes), vec!["% page 5"]);
    assert_eq!(count_pages_in_memory(&files[2].bytes).unwrap(), 4);
}

#[test]
fn test_split_by_interval() {
    let files = split_document(&letter_pdf(7), &SplitMode::Interval(3), &NoProgress).expect("split");

    let counts: Vec<usize> = files
        .iter()
        .map(|f| count_pages_in_memory(&f.bytes).unwrap())
        .collect();
    assert_eq!(counts, vec![3, 3, 1]);
    assert_eq!(files[2].filename, "page_7.pdf");
    assert_eq!(page_markers(&files[1].bytes)[0], "% page 4");
}

#[test]
fn test_split_all_pages_keeps_sizes() {
    let source = fixture_pdf(&[LETTER, A4]);
    let files = split_document(&source, &SplitMode::All, &NoProgress).expect("split");

    assert_eq!(files.len(), 2);
    assert_eq!(page_sizes(&files[1].bytes), vec![A4]);
}

#[test]
fn test_split_without_valid_ranges() {
    let mode = SplitMode::Ranges("20-30".to_string());
    let result = split_document(&letter_pdf(3), &mode, &NoProgress);
    assert!(matches!(result, Err(Error::InvalidRange(_))));
}

#[test]
fn test_split_progress() {
    let recorder = Recorder::default();
    split_document(&letter_pdf(4), &SplitMode::Interval(2), &recorder.sink()).expect("split");

    let percents = recorder.percents();
    assert_monotonic(&percents);
    assert_eq!(percents.first(), Some(&10));
    assert_eq!(percents.last(), Some(&100));
    assert!(recorder
        .statuses()
        .contains(&"Processing range 2/2, page 4".to_string()));
}

#[test]
fn test_split_progress_reports_each_range_once_written() {
    let recorder = Recorder::default();
    let files = split_document(&letter_pdf(4), &SplitMode::Interval(2), &recorder.sink())
        .expect("split");
    assert_eq!(files.len(), 2);

    let seen = recorder.seen.borrow().clone();
    let expected = [
        ("Loading PDF...", 10),
        ("Processing 2 range(s)...", 20),
        ("Processing range 1/2, page 1", 38),
        ("Processing range 1/2, page 2", 55),
        ("Processing range 2/2, page 3", 73),
        ("Processing range 2/2, page 4", 90),
        ("Complete!", 100),
    ];
    assert_eq!(seen.len(), expected.len());
    for ((status, percent), (want_status, want_percent)) in seen.iter().zip(expected) {
        assert_eq!(status, want_status);
        assert_eq!(*percent, want_percent);
    }
}

#[test]
fn test_split_to_zip_bundle() {
    let files = split_document(&letter_pdf(3), &SplitMode::All, &NoProgress).expect("split");
    let bytes = zip_to_bytes(&files).expect("zip");

    let mut archive = zip::ZipArchive::new(std::io::Cursor::new(bytes)).expect("open zip");
    assert_eq!(archive.len(), 3);
    assert_eq!(archive.by_index(2).unwrap().name(), "page_3.pdf");
}

// ── nup ────────────────────────────────────────────────────────────────────

fn nup_options() -> NupOptions {
    NupOptions {
        layout: LayoutOptions {
            dpi: 72,
            ..Default::default()
        },
        show_border: false,
        output_name: None,
    }
}

#[test]
fn test_nup_four_pages_fill_one_sheet() {
    let inputs = vec![InputPdf::new("slides.pdf", letter_pdf(4))];

    let bytes = compose_nup(&inputs, &nup_options(), &FakeRenderer::default(), &NoProgress)
        .expect("compose");

    let sizes = page_sizes(&bytes);
    assert_eq!(sizes.len(), 1);
    // A4 portrait in points
    assert!((sizes[0].0 - 595.28).abs() < 0.1);
    assert!((sizes[0].1 - 841.89).abs() < 0.1);
}

#[test]
fn test_nup_five_pages_across_inputs_need_two_sheets() {
    let inputs = vec![
        InputPdf::new("a.pdf", letter_pdf(3)),
        InputPdf::new("b.pdf", fixture_pdf(&[A4, (842.0, 595.0)])),
    ];

    let bytes = compose_nup(&inputs, &nup_options(), &FakeRenderer::default(), &NoProgress)
        .expect("compose");

    assert_eq!(count_pages_in_memory(&bytes).unwrap(), 2);
}

#[test]
fn test_nup_landscape_letter_with_borders() {
    let options = NupOptions {
        layout: LayoutOptions {
            paper: PaperSize::Letter,
            orientation: Orientation::Landscape,
            rows: 1,
            cols: 3,
            dpi: 96,
            outer_margin: Length::from_mm(10.0),
            inner_margin: Length::from_mm(2.0),
        },
        show_border: true,
        output_name: Some("handout".to_string()),
    };
    let inputs = vec![InputPdf::new("a.pdf", letter_pdf(2))];

    let bytes = compose_nup(&inputs, &options, &FakeRenderer::default(), &NoProgress)
        .expect("compose");

    let sizes = page_sizes(&bytes);
    assert_eq!(sizes.len(), 1);
    assert!((sizes[0].0 - 792.0).abs() < 0.1);
    assert!((sizes[0].1 - 612.0).abs() < 0.1);

    let content = page_markers(&bytes).remove(0);
    assert_eq!(content.matches(" Do").count(), 2);
    assert_eq!(content.matches("re S").count(), 2);
    assert_eq!(options.output_file_name(), "handout.pdf");
}

/// Numeric operands of every content line ending in `op`
fn operands(content: &str, op: &str) -> Vec<Vec<f32>> {
    content
        .lines()
        .filter_map(|line| line.strip_suffix(op))
        .map(|args| {
            args.split_whitespace()
                .map(|n| n.parse().expect("numeric operand"))
                .collect()
        })
        .collect()
}

#[test]
fn test_nup_places_pages_top_left_first_and_centered() {
    let options = NupOptions {
        show_border: true,
        ..nup_options()
    };
    let inputs = vec![InputPdf::new("a.pdf", letter_pdf(4))];

    let bytes = compose_nup(&inputs, &options, &FakeRenderer::default(), &NoProgress)
        .expect("compose");

    let layout = SheetLayout::new(&options.layout).unwrap();
    let k = layout.pt_per_px();
    let (_, sheet_height) = layout.sheet_size_pt();
    let content = page_markers(&bytes).remove(0);

    let images = operands(&content, " cm");
    let borders = operands(&content, " re S");
    assert_eq!(images.len(), 4);
    assert_eq!(borders.len(), 4);

    // Page 1 sits top-left: highest y, lowest x
    let (x0, y0) = (images[0][4], images[0][5]);
    assert!(images.iter().all(|m| m[4] >= x0 && m[5] <= y0));
    // Reading order is row-major
    assert!(images[1][4] > x0 && (images[1][5] - y0).abs() < k);
    assert!(images[2][5] < y0 && (images[2][4] - x0).abs() < k);

    for (index, (image, border)) in images.iter().zip(&borders).enumerate() {
        let cell = layout.placement(index).cell;
        let cell_x = cell.x as f32 * k;
        let cell_y = sheet_height - (cell.y + cell.height) as f32 * k;
        let cell_w = cell.width as f32 * k;
        let cell_h = cell.height as f32 * k;

        let (w, h, x, y) = (image[0], image[3], image[4], image[5]);
        assert!(w <= cell_w + 0.01 && h <= cell_h + 0.01, "page {} overflows its cell", index + 1);
        assert!(
            (w - cell_w).abs() <= k + 0.01 || (h - cell_h).abs() <= k + 0.01,
            "page {} does not fill its cell",
            index + 1
        );
        assert!((x + w / 2.0 - (cell_x + cell_w / 2.0)).abs() <= k, "page {} off center", index + 1);
        assert!((y + h / 2.0 - (cell_y + cell_h / 2.0)).abs() <= k, "page {} off center", index + 1);

        let expected = [
            (cell.x as f32 + 0.5) * k,
            sheet_height - (cell.y as f32 + cell.height as f32 - 0.5) * k,
            (cell.width as f32 - 1.0) * k,
            (cell.height as f32 - 1.0) * k,
        ];
        for (got, want) in border.iter().zip(expected) {
            assert!((got - want).abs() < 0.01, "border {}: {} != {}", index + 1, got, want);
        }
    }
}

#[test]
fn test_nup_rejects_empty_selection() {
    let result = compose_nup(&[], &nup_options(), &FakeRenderer::default(), &NoProgress);
    assert!(matches!(result, Err(Error::NoPages(msg)) if msg == "No files selected"));

    let inputs = vec![InputPdf::new("blank.pdf", fixture_pdf(&[]))];
    let result = compose_nup(&inputs, &nup_options(), &FakeRenderer::default(), &NoProgress);
    assert!(matches!(result, Err(Error::NoPages(msg)) if msg == "No pages found"));
}

#[test]
fn test_nup_render_failure_aborts() {
    let inputs = vec![InputPdf::new("a.pdf", letter_pdf(4))];
    let result = compose_nup(
        &inputs,
        &nup_options(),
        &FakeRenderer::failing_on(2),
        &NoProgress,
    );
    assert!(matches!(result, Err(Error::Render { page: 3, .. })));
}

#[test]
fn test_nup_progress_phases() {
    let inputs = vec![InputPdf::new("a.pdf", letter_pdf(5))];
    let recorder = Recorder::default();

    compose_nup(&inputs, &nup_options(), &FakeRenderer::default(), &recorder.sink())
        .expect("compose");

    let percents = recorder.percents();
    assert_monotonic(&percents);
    assert_eq!(percents.first(), Some(&5));
    assert!(percents.contains(&60));
    assert!(percents.contains(&95));
    assert!(percents.contains(&98));
    assert_eq!(percents.last(), Some(&100));
}

// ── images ─────────────────────────────────────────────────────────────────

#[test]
fn test_images_selected_pages() {
    let options = ConvertOptions {
        format: ImageFormat::Jpeg,
        quality: 80,
        scale: 1.0,
        pages: PageSelection::Ranges("2, 4-9".to_string()),
        prefix: "slide".to_string(),
    };

    let images = pdf_to_images(&letter_pdf(5), &options, &FakeRenderer::default(), &NoProgress)
        .expect("convert");

    let names: Vec<&str> = images.iter().map(|i| i.file.filename.as_str()).collect();
    assert_eq!(names, vec!["slide_2.jpg", "slide_4.jpg", "slide_5.jpg"]);
    assert_eq!(images[0].page_number, 2);
    assert_eq!((images[0].width, images[0].height), (612, 792));
    assert_eq!(&images[0].file.bytes[..2], &[0xFF, 0xD8]);
}

#[test]
fn test_images_default_scale_doubles_size() {
    let images = pdf_to_images(
        &fixture_pdf(&[(100.0, 50.0)]),
        &ConvertOptions::default(),
        &FakeRenderer::default(),
        &NoProgress,
    )
    .expect("convert");

    assert_eq!(images.len(), 1);
    assert_eq!(images[0].file.filename, "page_1.png");
    assert_eq!((images[0].width, images[0].height), (200, 100));
}

#[test]
fn test_images_out_of_range_selection() {
    let options = ConvertOptions {
        pages: PageSelection::Ranges("8-9".to_string()),
        ..Default::default()
    };
    let result = pdf_to_images(&letter_pdf(3), &options, &FakeRenderer::default(), &NoProgress);
    assert!(matches!(result, Err(Error::NoPages(msg)) if msg == "No valid pages to convert"));
}

#[test]
fn test_images_progress_and_failure() {
    let recorder = Recorder::default();
    let options = ConvertOptions {
        scale: 0.5,
        ..Default::default()
    };
    pdf_to_images(&letter_pdf(4), &options, &FakeRenderer::default(), &recorder.sink())
        .expect("convert");
    assert_eq!(recorder.percents(), vec![10, 20, 38, 55, 73, 90, 100]);

    let result = pdf_to_images(&letter_pdf(4), &options, &FakeRenderer::failing_on(3), &NoProgress);
    assert!(matches!(result, Err(Error::Render { page: 4, .. })));
}

#[test]
fn test_images_written_to_directory() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let options = ConvertOptions {
        format: ImageFormat::Webp,
        scale: 0.25,
        ..Default::default()
    };
    let images = pdf_to_images(&letter_pdf(2), &options, &FakeRenderer::default(), &NoProgress)
        .expect("convert");
    let files: Vec<_> = images.into_iter().map(|i| i.file).collect();

    let out = temp_dir.path().join("pages");
    write_outputs(&files, &out).expect("write");

    assert!(out.join("page_1.webp").exists());
    assert!(out.join("page_2.webp").exists());
}

#[test]
fn test_get_page_count() {
    assert_eq!(get_page_count(&letter_pdf(6), &FakeRenderer::default()).unwrap(), 6);
}

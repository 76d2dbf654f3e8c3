//! PDF Sheets CLI tool
//!
//! A command-line tool for merging, splitting, N-up composing and
//! converting PDF pages to images.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use glob::glob;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info_span;
use tracing_subscriber::EnvFilter;

use pdf_sheets::layout::{Length, LayoutOptions, Orientation, PaperSize};
use pdf_sheets::output::{write_outputs, OutputFile};
use pdf_sheets::pdf::{
    compose_nup, merge_documents, merge_with_invert, pdf_to_images, split_bundle_name,
    split_document, ConvertOptions, InputPdf, NupOptions, SplitMode,
};
use pdf_sheets::progress::ProgressSink;
use pdf_sheets::raster::ImageFormat;
use pdf_sheets::ranges::PageSelection;
use pdf_sheets::render::PdfiumRenderer;
use pdf_sheets::util::{format_file_size, generate_id};

/// PDF Sheets - Merge, split, N-up and rasterize PDFs
#[derive(Parser)]
#[command(name = "pdf-sheets")]
#[command(author, version, about, long_about = None)]
#[command(after_help = "EXAMPLES:
    # Merge numbered PDFs in order
    pdf-sheets merge -o handout.pdf \"[0-9]*.pdf\"

    # Merge and invert colors for on-screen reading
    pdf-sheets merge -o dark.pdf --invert slides.pdf

    # Split pages 1-3 and 5 into a zip
    pdf-sheets split lecture.pdf --ranges \"1-3, 5\" -o parts.zip

    # Four slides per landscape A4 sheet with cell borders
    pdf-sheets nup slides.pdf --rows 2 --cols 2 --orientation landscape --border

    # Export pages 1-5 as JPEG at 216 DPI
    pdf-sheets images lecture.pdf --format jpeg --scale 3 --pages 1-5 -o pages/")]
struct Cli {
    /// Show debug logging (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Open the output file after creation
    #[arg(long, global = true)]
    open: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Merge multiple PDF files into one
    Merge {
        /// Input PDF files (in order). Supports glob patterns like "*.pdf"
        #[arg(required = true)]
        inputs: Vec<String>,

        /// Output PDF file path
        #[arg(short, long)]
        output: PathBuf,

        /// Rasterize the merged pages with inverted colors
        #[arg(long)]
        invert: bool,
    },

    /// Split a PDF into several files
    Split {
        /// Input PDF file
        input: PathBuf,

        /// Output path: a .zip archive or a directory [default: <prefix>_split_pdfs.zip]
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Page ranges, one file per item (e.g. "1-3, 5, 7-10")
        #[arg(long, conflicts_with = "every")]
        ranges: Option<String>,

        /// One file per run of N pages
        #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
        every: Option<u32>,

        /// Prefix for the default zip name
        #[arg(long)]
        prefix: Option<String>,
    },

    /// Place several pages on each printed sheet
    Nup {
        /// Input PDF files (in order). Supports glob patterns like "*.pdf"
        #[arg(required = true)]
        inputs: Vec<String>,

        /// Output PDF file path [default: <name>.pdf or nup_output.pdf]
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Rows per sheet
        #[arg(long, default_value_t = 2)]
        rows: u32,

        /// Columns per sheet
        #[arg(long, default_value_t = 2)]
        cols: u32,

        /// Paper size: a4 or letter
        #[arg(long, default_value = "a4")]
        paper: PaperSize,

        /// Sheet orientation: portrait or landscape
        #[arg(long, default_value = "portrait")]
        orientation: Orientation,

        /// Margin around the grid in millimetres
        #[arg(long, default_value_t = 5.0)]
        outer_margin: f64,

        /// Gap between cells in millimetres
        #[arg(long, default_value_t = 1.0)]
        inner_margin: f64,

        /// Sheet resolution
        #[arg(long, default_value_t = 180)]
        dpi: u32,

        /// Draw a light border around each cell
        #[arg(long)]
        border: bool,

        /// Output name used when --output is not given
        #[arg(long)]
        name: Option<String>,
    },

    /// Convert PDF pages to images
    Images {
        /// Input PDF file
        input: PathBuf,

        /// Output path: a .zip archive or a directory
        #[arg(short, long)]
        output: PathBuf,

        /// Image format: png, jpeg or webp
        #[arg(long, default_value = "png")]
        format: ImageFormat,

        /// JPEG quality (1-100)
        #[arg(long, default_value_t = 95)]
        quality: u8,

        /// Render scale; 1.0 is 72 DPI
        #[arg(long, default_value_t = 2.0)]
        scale: f32,

        /// Pages to convert (e.g. "1-5, 8"); all pages when omitted
        #[arg(long)]
        pages: Option<String>,

        /// File name prefix for the images
        #[arg(long, default_value = "page")]
        prefix: String,
    },

    /// Show information about a PDF file
    Info {
        /// PDF file to inspect
        input: PathBuf,
    },
}

/// Drives an indicatif bar from library progress reports
struct CliProgress {
    bar: ProgressBar,
}

impl CliProgress {
    fn new() -> Self {
        let bar = ProgressBar::new(100);
        let style = ProgressStyle::with_template("{spinner:.cyan} [{bar:40.green/238}] {pos:>3}%  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█▉▊▋▌▍▎▏  ");
        bar.set_style(style);
        Self { bar }
    }

    fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

impl ProgressSink for CliProgress {
    fn report(&self, status: &str, percent: u8) {
        self.bar.set_position(percent as u64);
        self.bar.set_message(status.to_string());
    }
}

fn main() {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    let open = cli.open;
    let result = run(cli.command).and_then(|written| {
        if open {
            open_file(&written)?;
        }
        Ok(())
    });

    if let Err(e) = result {
        eprintln!("Error: {:#}", e);
        process::exit(1);
    }
}

/// Run one subcommand, returning the path it wrote
fn run(command: Commands) -> Result<PathBuf> {
    let job = generate_id();

    match command {
        Commands::Merge {
            inputs,
            output,
            invert,
        } => {
            let _span = info_span!("merge", job = %job).entered();
            cmd_merge(inputs, output, invert)
        }
        Commands::Split {
            input,
            output,
            ranges,
            every,
            prefix,
        } => {
            let _span = info_span!("split", job = %job).entered();
            let mode = match (ranges, every) {
                (Some(ranges), _) => SplitMode::Ranges(ranges),
                (None, Some(every)) => SplitMode::Interval(every),
                (None, None) => SplitMode::All,
            };
            let output =
                output.unwrap_or_else(|| PathBuf::from(split_bundle_name(prefix.as_deref())));
            cmd_split(input, output, mode)
        }
        Commands::Nup {
            inputs,
            output,
            rows,
            cols,
            paper,
            orientation,
            outer_margin,
            inner_margin,
            dpi,
            border,
            name,
        } => {
            let _span = info_span!("nup", job = %job).entered();
            let options = NupOptions {
                layout: LayoutOptions {
                    paper,
                    orientation,
                    rows,
                    cols,
                    dpi,
                    outer_margin: Length::from_mm(outer_margin),
                    inner_margin: Length::from_mm(inner_margin),
                },
                show_border: border,
                output_name: name,
            };
            let output = output.unwrap_or_else(|| PathBuf::from(options.output_file_name()));
            cmd_nup(inputs, output, options)
        }
        Commands::Images {
            input,
            output,
            format,
            quality,
            scale,
            pages,
            prefix,
        } => {
            let _span = info_span!("images", job = %job).entered();
            let options = ConvertOptions {
                format,
                quality,
                scale,
                pages: pages.map_or(PageSelection::All, PageSelection::Ranges),
                prefix,
            };
            cmd_images(input, output, options)
        }
        Commands::Info { input } => {
            cmd_info(&input)?;
            Ok(input)
        }
    }
}

/// Expand glob patterns in input paths
fn expand_globs(patterns: Vec<String>) -> Result<Vec<PathBuf>> {
    let mut paths = Vec::new();

    for pattern in patterns {
        // Check if pattern contains glob characters
        if pattern.contains('*') || pattern.contains('?') || pattern.contains('[') {
            let mut matches = Vec::new();
            let entries = glob(&pattern)
                .with_context(|| format!("Invalid glob pattern: {}", pattern))?;
            for entry in entries {
                match entry {
                    Ok(path) => matches.push(path),
                    Err(e) => eprintln!("Warning: glob error for {}: {}", pattern, e),
                }
            }
            if matches.is_empty() {
                bail!("No files matched pattern: {}", pattern);
            }
            // Matches of one pattern are sorted; arguments keep their order
            matches.sort();
            paths.extend(matches);
        } else {
            // No glob characters, treat as literal path
            paths.push(PathBuf::from(pattern));
        }
    }

    Ok(paths)
}

/// Read every input, failing on the first missing file
fn load_inputs(paths: &[PathBuf]) -> Result<Vec<InputPdf>> {
    paths
        .iter()
        .map(|path| {
            InputPdf::from_path(path)
                .with_context(|| format!("Cannot read input {}", path.display()))
        })
        .collect()
}

/// Open a file with the system default application
fn open_file(path: &Path) -> Result<()> {
    #[cfg(target_os = "macos")]
    {
        std::process::Command::new("open")
            .arg(path)
            .spawn()?;
    }
    #[cfg(target_os = "linux")]
    {
        std::process::Command::new("xdg-open")
            .arg(path)
            .spawn()?;
    }
    #[cfg(target_os = "windows")]
    {
        std::process::Command::new("cmd")
            .args(["/C", "start", "", &path.display().to_string()])
            .spawn()?;
    }
    Ok(())
}

fn write_pdf(path: &Path, bytes: &[u8]) -> Result<()> {
    fs::write(path, bytes).with_context(|| format!("Cannot write {}", path.display()))?;
    eprintln!(
        "Output: {} ({})",
        path.display(),
        format_file_size(bytes.len() as u64)
    );
    Ok(())
}

fn write_files(path: &Path, files: &[OutputFile]) -> Result<()> {
    write_outputs(files, path).with_context(|| format!("Cannot write {}", path.display()))?;
    let total: u64 = files.iter().map(OutputFile::size).sum();
    eprintln!(
        "Output: {} ({} files, {})",
        path.display(),
        files.len(),
        format_file_size(total)
    );
    Ok(())
}

/// Merge multiple PDFs into one
fn cmd_merge(inputs: Vec<String>, output: PathBuf, invert: bool) -> Result<PathBuf> {
    let inputs = load_inputs(&expand_globs(inputs)?)?;

    eprintln!("Merging {} PDF files...", inputs.len());

    let progress = CliProgress::new();
    let bytes = if invert {
        let renderer = PdfiumRenderer::new()?;
        merge_with_invert(&inputs, &renderer, &progress)
    } else {
        merge_documents(&inputs, &progress)
    };
    progress.finish();

    write_pdf(&output, &bytes.context("Merge failed")?)?;
    Ok(output)
}

/// Split one PDF into several
fn cmd_split(input: PathBuf, output: PathBuf, mode: SplitMode) -> Result<PathBuf> {
    let input = InputPdf::from_path(&input)?;

    eprintln!("Splitting {} ({})...", input.name, format_file_size(input.size()));

    let progress = CliProgress::new();
    let files = split_document(&input.bytes, &mode, &progress);
    progress.finish();

    write_files(&output, &files.context("Split failed")?)?;
    Ok(output)
}

/// Compose N-up sheets
fn cmd_nup(inputs: Vec<String>, output: PathBuf, options: NupOptions) -> Result<PathBuf> {
    let inputs = load_inputs(&expand_globs(inputs)?)?;

    eprintln!(
        "Composing {} PDF files, {}x{} per sheet...",
        inputs.len(),
        options.layout.rows,
        options.layout.cols
    );

    let renderer = PdfiumRenderer::new()?;
    let progress = CliProgress::new();
    let bytes = compose_nup(&inputs, &options, &renderer, &progress);
    progress.finish();

    write_pdf(&output, &bytes.context("N-up composition failed")?)?;
    Ok(output)
}

/// Convert pages to images
fn cmd_images(input: PathBuf, output: PathBuf, options: ConvertOptions) -> Result<PathBuf> {
    let input = InputPdf::from_path(&input)?;

    eprintln!(
        "Converting {} to {} at {:.0} DPI...",
        input.name,
        options.format,
        options.dpi()
    );

    let renderer = PdfiumRenderer::new()?;
    let progress = CliProgress::new();
    let images = pdf_to_images(&input.bytes, &options, &renderer, &progress);
    progress.finish();

    let files: Vec<OutputFile> = images
        .context("Image conversion failed")?
        .into_iter()
        .map(|image| image.file)
        .collect();
    write_files(&output, &files)?;
    Ok(output)
}

/// Show information about a PDF
fn cmd_info(input: &Path) -> Result<()> {
    let metadata = pdf_sheets::pdf::extract_metadata(input)?;
    let size = fs::metadata(input)?.len();

    println!("File: {}", input.display());
    println!("Size: {}", format_file_size(size));
    println!("Pages: {}", metadata.page_count);

    if let Some(title) = metadata.title {
        println!("Title: {}", title);
    }
    if let Some(author) = metadata.author {
        println!("Author: {}", author);
    }
    if let Some(producer) = metadata.producer {
        println!("Producer: {}", producer);
    }

    Ok(())
}

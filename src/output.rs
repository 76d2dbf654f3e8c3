//! Produced artifacts and how they are written out

use std::fs;
use std::io::{Seek, Write};
use std::path::Path;

use tracing::{debug, info};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::error::Result;

/// Deflate level used for bundles
const ZIP_COMPRESSION_LEVEL: i64 = 6;

/// One produced file: a name and its contents
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputFile {
    pub filename: String,
    pub bytes: Vec<u8>,
}

impl OutputFile {
    pub fn new(filename: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            filename: filename.into(),
            bytes,
        }
    }

    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }
}

/// Write `files` into a zip archive, entries in the order given
pub fn write_zip<W: Write + Seek>(files: &[OutputFile], writer: W) -> Result<W> {
    let mut zip = ZipWriter::new(writer);
    let options = SimpleFileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .compression_level(Some(ZIP_COMPRESSION_LEVEL));

    for file in files {
        zip.start_file(file.filename.as_str(), options)?;
        zip.write_all(&file.bytes)?;
    }

    Ok(zip.finish()?)
}

/// Bundle `files` into an in-memory zip archive
pub fn zip_to_bytes(files: &[OutputFile]) -> Result<Vec<u8>> {
    let cursor = write_zip(files, std::io::Cursor::new(Vec::new()))?;
    Ok(cursor.into_inner())
}

/// Write `files` to `path`
///
/// A path ending in `.zip` becomes an archive. Anything else is treated as a
/// directory, created if needed, and the files are written into it.
pub fn write_outputs(files: &[OutputFile], path: &Path) -> Result<()> {
    if is_zip_path(path) {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let file = fs::File::create(path)?;
        write_zip(files, file)?;
        info!("Wrote {} files to {}", files.len(), path.display());
    } else {
        fs::create_dir_all(path)?;
        for file in files {
            let target = path.join(&file.filename);
            debug!("Writing {}", target.display());
            fs::write(target, &file.bytes)?;
        }
        info!("Wrote {} files into {}", files.len(), path.display());
    }

    Ok(())
}

pub fn is_zip_path(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("zip"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;

    fn sample_files() -> Vec<OutputFile> {
        vec![
            OutputFile::new("page_1.pdf", b"first".to_vec()),
            OutputFile::new("pages_2-3.pdf", b"second and third".to_vec()),
        ]
    }

    #[test]
    fn test_zip_keeps_entry_order() {
        let bytes = zip_to_bytes(&sample_files()).unwrap();
        let mut archive = zip::ZipArchive::new(std::io::Cursor::new(bytes)).unwrap();
        assert_eq!(archive.len(), 2);

        let names: Vec<String> = archive.file_names().map(String::from).collect();
        assert!(names.contains(&"page_1.pdf".to_string()));

        let mut first = archive.by_index(0).unwrap();
        assert_eq!(first.name(), "page_1.pdf");
        assert_eq!(first.compression(), CompressionMethod::Deflated);
        let mut content = String::new();
        first.read_to_string(&mut content).unwrap();
        assert_eq!(content, "first");
    }

    #[test]
    fn test_write_outputs_to_directory() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("pages");
        write_outputs(&sample_files(), &target).unwrap();

        assert_eq!(fs::read(target.join("page_1.pdf")).unwrap(), b"first");
        assert!(target.join("pages_2-3.pdf").exists());
    }

    #[test]
    fn test_write_outputs_to_zip() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("split_pdfs.ZIP");
        write_outputs(&sample_files(), &target).unwrap();

        let archive = zip::ZipArchive::new(fs::File::open(&target).unwrap()).unwrap();
        assert_eq!(archive.len(), 2);
    }

    #[test]
    fn test_is_zip_path() {
        assert!(is_zip_path(Path::new("out/bundle.zip")));
        assert!(!is_zip_path(Path::new("out/bundle")));
        assert!(!is_zip_path(Path::new("zip")));
    }
}

//! Input documents held in memory for the length of one operation

use std::fs;
use std::path::Path;

use crate::error::{Error, Result};

/// A PDF supplied by the user: display name plus raw bytes
#[derive(Debug, Clone)]
pub struct InputPdf {
    pub name: String,
    pub bytes: Vec<u8>,
}

impl InputPdf {
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            bytes,
        }
    }

    /// Read a PDF from disk, naming it after the file
    pub fn from_path(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(Error::FileNotFound(path.to_path_buf()));
        }

        let bytes = fs::read(path)?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        Ok(Self { name, bytes })
    }

    /// Size of the raw file in bytes
    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }
}

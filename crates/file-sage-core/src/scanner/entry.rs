use crate::category::{categorize, extension_of, Category};
use chrono::{DateTime, Utc};
use std::fs::Metadata;
use std::io;
use std::path::{Path, PathBuf};

const BYTES_PER_MIB: f64 = 1024.0 * 1024.0;

/// A regular file observed on disk. Rebuilt from the filesystem on every scan.
#[derive(Debug, Clone, PartialEq)]
pub struct FileEntry {
    pub path: PathBuf,
    pub size: u64,
    pub modified: DateTime<Utc>,
}

impl FileEntry {
    pub fn new(path: impl Into<PathBuf>, size: u64, modified: DateTime<Utc>) -> Self {
        Self {
            path: path.into(),
            size,
            modified,
        }
    }

    pub fn from_metadata(path: &Path, metadata: &Metadata) -> io::Result<Self> {
        let modified = metadata.modified()?;
        Ok(Self::new(path, metadata.len(), DateTime::<Utc>::from(modified)))
    }

    pub fn from_path(path: &Path) -> io::Result<Self> {
        let metadata = std::fs::metadata(path)?;
        Self::from_metadata(path, &metadata)
    }

    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    pub fn file_name_lower(&self) -> String {
        self.file_name().to_lowercase()
    }

    pub fn parent_dir(&self) -> &Path {
        self.path.parent().unwrap_or_else(|| Path::new(""))
    }

    /// Name of the directory that directly contains the file.
    pub fn parent_name(&self) -> Option<String> {
        self.parent_dir()
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
    }

    pub fn extension(&self) -> Option<String> {
        extension_of(&self.path)
    }

    pub fn category(&self) -> Category {
        categorize(&self.path)
    }

    pub fn size_mb(&self) -> f64 {
        self.size as f64 / BYTES_PER_MIB
    }

    /// Zero-byte files are treated as placeholders and never counted or returned.
    pub fn is_placeholder(&self) -> bool {
        self.size == 0
    }
}

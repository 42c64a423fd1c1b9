use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// Last observed state of a file on disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileTime {
    pub path: PathBuf,
    pub mtime: Option<SystemTime>,
    pub exists: bool,
}

impl FileTime {
    /// Read the current state of `path`
    pub fn read(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match fs::metadata(path) {
            Ok(metadata) => Self {
                path: path.to_path_buf(),
                mtime: metadata.modified().ok(),
                exists: true,
            },
            Err(_) => Self {
                path: path.to_path_buf(),
                mtime: None,
                exists: false,
            },
        }
    }

    /// Whether `current` describes a different write than `self`
    pub fn differs_from(&self, current: &FileTime) -> bool {
        self.exists != current.exists || self.mtime != current.mtime
    }
}

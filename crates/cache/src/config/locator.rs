//! Descriptor file discovery

use std::env;
use std::path::{Path, PathBuf};

/// Environment variable naming an extra directory searched first
pub const CONFIG_DIR_ENV: &str = "CACHET_CONFIG_DIR";

/// File name suffix of a cache descriptor
pub const DESCRIPTOR_SUFFIX: &str = ".cache.json";

/// Ordered list of directories searched for `<cache>.cache.json`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigLocator {
    dirs: Vec<PathBuf>,
}

impl ConfigLocator {
    /// Search exactly `dirs`, in order
    pub fn new<I, P>(dirs: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        Self {
            dirs: dirs.into_iter().map(Into::into).collect(),
        }
    }

    /// Search the `CACHET_CONFIG_DIR` directory, the working directory, the
    /// executable's directory and its sibling `config/` directory
    pub fn from_env() -> Self {
        let mut dirs = Vec::new();

        if let Some(dir) = env::var_os(CONFIG_DIR_ENV).filter(|d| !d.is_empty()) {
            dirs.push(PathBuf::from(dir));
        }
        if let Ok(cwd) = env::current_dir() {
            dirs.push(cwd);
        }
        if let Some(exe_dir) = env::current_exe()
            .ok()
            .and_then(|exe| exe.parent().map(Path::to_path_buf))
        {
            let sibling = exe_dir.join("config");
            dirs.push(exe_dir);
            dirs.push(sibling);
        }

        dirs.dedup();
        Self { dirs }
    }

    /// Descriptor file name for a cache
    pub fn file_name(cache: &str) -> String {
        format!("{cache}{DESCRIPTOR_SUFFIX}")
    }

    /// First existing descriptor for `cache`
    pub fn find(&self, cache: &str) -> Option<PathBuf> {
        let file_name = Self::file_name(cache);
        self.dirs
            .iter()
            .map(|dir| dir.join(&file_name))
            .find(|path| path.is_file())
    }

    pub fn dirs(&self) -> &[PathBuf] {
        &self.dirs
    }
}

impl Default for ConfigLocator {
    fn default() -> Self {
        Self::from_env()
    }
}

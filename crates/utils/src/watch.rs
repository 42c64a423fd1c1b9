//! Single-file change notification
//!
//! [`FileWatcher`] watches the parent directory of one file and invokes a
//! callback when that file's last-write time changes. Events that arrive
//! while the callback is still running are dropped, so a reload that touches
//! the file cannot trigger itself.

use crate::file_times::FileTime;
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use parking_lot::Mutex;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, warn};

/// Errors that can occur while installing a file watch
#[derive(Debug, thiserror::Error)]
pub enum WatchError {
    #[error("failed to create file watcher for {path}: {source}")]
    Init {
        path: PathBuf,
        #[source]
        source: notify::Error,
    },

    #[error("failed to watch directory {dir}: {source}")]
    Watch {
        dir: PathBuf,
        #[source]
        source: notify::Error,
    },
}

/// Watches a single file and reports last-write-time changes
///
/// The watch stays active until the value is dropped.
pub struct FileWatcher {
    path: PathBuf,
    _watcher: RecommendedWatcher,
}

struct WatchState {
    last_seen: Mutex<FileTime>,
    busy: AtomicBool,
}

struct BusyGuard<'a>(&'a AtomicBool);

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl WatchState {
    fn dispatch<F>(&self, path: &Path, on_change: &F)
    where
        F: Fn(&Path),
    {
        if self.busy.swap(true, Ordering::AcqRel) {
            debug!(path = %path.display(), "change ignored, handler still running");
            return;
        }
        let _busy = BusyGuard(&self.busy);

        let current = FileTime::read(path);
        {
            let mut last_seen = self.last_seen.lock();
            if !last_seen.differs_from(&current) {
                return;
            }
            *last_seen = current.clone();
        }

        if current.exists {
            on_change(path);
        } else {
            debug!(path = %path.display(), "watched file removed");
        }
    }
}

impl FileWatcher {
    /// Start watching `path`, calling `on_change` after every new write
    pub fn watch<F>(path: impl Into<PathBuf>, on_change: F) -> Result<Self, WatchError>
    where
        F: Fn(&Path) + Send + Sync + 'static,
    {
        let path = path.into();
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let file_name = path.file_name().map(|name| name.to_os_string());

        let state = Arc::new(WatchState {
            last_seen: Mutex::new(FileTime::read(&path)),
            busy: AtomicBool::new(false),
        });

        let target = path.clone();
        let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| {
            match res {
                Ok(event) => {
                    if is_relevant(&event, file_name.as_ref()) {
                        state.dispatch(&target, &on_change);
                    }
                }
                Err(e) => warn!(path = %target.display(), error = %e, "file watcher error"),
            }
        })
        .map_err(|source| WatchError::Init {
            path: path.clone(),
            source,
        })?;

        watcher
            .watch(&dir, RecursiveMode::NonRecursive)
            .map_err(|source| WatchError::Watch {
                dir: dir.clone(),
                source,
            })?;

        debug!(path = %path.display(), "watching file for changes");

        Ok(Self {
            path,
            _watcher: watcher,
        })
    }

    /// The watched file
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl std::fmt::Debug for FileWatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileWatcher")
            .field("path", &self.path)
            .finish()
    }
}

fn is_relevant(event: &Event, file_name: Option<&OsString>) -> bool {
    if !matches!(event.kind, EventKind::Create(_) | EventKind::Modify(_)) {
        return false;
    }
    match file_name {
        Some(name) => event
            .paths
            .iter()
            .any(|p| p.file_name() == Some(name.as_os_str())),
        None => false,
    }
}

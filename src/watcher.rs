//! Attaches a `notify` watcher to the source directory
//!
//! Backend callbacks are flattened into `WatchMessage`s on a std channel
//! that the dispatch loop consumes.

use notify::{RecommendedWatcher, RecursiveMode, Watcher};
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, Sender};

use crate::error::WatchError;
use crate::event::{ChangeEvent, WatchMessage};

/// Live watch on one directory
///
/// Dropping it releases the OS watch and closes the event channel.
pub struct DirWatcher {
    _watcher: RecommendedWatcher,
    path: PathBuf,
}

impl DirWatcher {
    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn forward(tx: &Sender<WatchMessage>, result: notify::Result<notify::Event>) {
    // Send errors only mean the loop is gone, nothing left to tell
    match result {
        Ok(event) => {
            for change in ChangeEvent::from_notify(event) {
                let _ = tx.send(Ok(change));
            }
        }
        Err(e) => {
            let _ = tx.send(Err(WatchError::Runtime(e.to_string())));
        }
    }
}

/// Starts watching `source_dir` (non-recursive)
///
/// # Errors
/// `WatchError::Setup` if the path is not an existing directory or the
/// backend refuses the watch.
pub fn attach(source_dir: &Path) -> Result<(DirWatcher, Receiver<WatchMessage>), WatchError> {
    let setup_error = |reason: String| WatchError::Setup {
        path: source_dir.to_path_buf(),
        reason,
    };

    if !source_dir.is_dir() {
        return Err(setup_error("not an existing directory".to_string()));
    }

    let (tx, rx) = mpsc::channel();
    let mut watcher = notify::recommended_watcher(move |result| forward(&tx, result))
        .map_err(|e| setup_error(e.to_string()))?;

    watcher
        .watch(source_dir, RecursiveMode::NonRecursive)
        .map_err(|e| setup_error(e.to_string()))?;

    Ok((
        DirWatcher {
            _watcher: watcher,
            path: source_dir.to_path_buf(),
        },
        rx,
    ))
}

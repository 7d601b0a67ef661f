//! Archive file watcher for hot reload.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};

use crate::archive::store::ArchiveStore;

/// Watches the archive directory and reloads the active archive when the
/// file backing it changes.
pub struct ArchiveWatcher {
    directory: PathBuf,
    store: Arc<ArchiveStore>,
}

impl ArchiveWatcher {
    pub fn new(store: Arc<ArchiveStore>) -> Self {
        Self {
            directory: store.directory().to_path_buf(),
            store,
        }
    }

    /// Start watching in notify's background thread. The watch stops when the
    /// returned watcher is dropped.
    pub fn run(self) -> Result<RecommendedWatcher, notify::Error> {
        let store = self.store.clone();

        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) => {
                    if !(event.kind.is_modify() || event.kind.is_create()) {
                        return;
                    }
                    let Some(current) = store.current() else {
                        return;
                    };
                    let Some(source) = current.source.as_deref() else {
                        return;
                    };
                    if event.paths.iter().any(|p| is_same_file(p, source)) {
                        tracing::info!(path = %source.display(), "Archive file change detected, reloading...");
                        // Failures are logged by the store; the current archive stays.
                        let _ = store.reload_from(&current);
                    }
                }
                Err(e) => tracing::error!("Watch error: {:?}", e),
            },
            Config::default().with_poll_interval(Duration::from_secs(2)),
        )?;

        watcher.watch(&self.directory, RecursiveMode::NonRecursive)?;

        tracing::info!(directory = ?self.directory, "Archive watcher started");
        Ok(watcher)
    }
}

/// Only the archive directory is watched, non-recursively, so the file name
/// identifies the file.
fn is_same_file(changed: &Path, source: &Path) -> bool {
    changed == source || (changed.file_name().is_some() && changed.file_name() == source.file_name())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_same_file() {
        assert!(is_same_file(Path::new("/srv/hars/a.har"), Path::new("hars/a.har")));
        assert!(!is_same_file(Path::new("/srv/hars/b.har"), Path::new("hars/a.har")));
        assert!(!is_same_file(Path::new("/"), Path::new("/srv")));
    }
}

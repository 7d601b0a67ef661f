//! The active archive and its atomic replacement.
//!
//! # Design Decisions
//! - A snapshot is built completely before it is published
//! - Publication is a single `ArcSwapOption::store`; readers never lock
//! - A failed load leaves the current snapshot untouched
//! - A reload only replaces the snapshot it was read from

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use arc_swap::ArcSwapOption;
use serde::Serialize;
use uuid::Uuid;

use crate::archive::error::ArchiveError;
use crate::archive::index::ArchiveIndex;
use crate::archive::loader::{read_archive, resolve_archive_path};
use crate::archive::model::{Archive, Page};
use crate::observability::metrics;
use crate::replay::origin::page_origin;

/// An archive together with everything derived from it at load time.
#[derive(Debug)]
pub struct ArchiveSnapshot {
    /// Generation id, new for every load.
    pub id: Uuid,
    pub pages: Vec<Page>,
    /// Owns the archive's entries.
    pub index: ArchiveIndex,
    /// `scheme://host` of the first page, used when a request cannot name
    /// its own origin.
    pub fallback_origin: String,
    /// File the archive was read from, if any.
    pub source: Option<PathBuf>,
    pub loaded_at: SystemTime,
}

impl ArchiveSnapshot {
    /// Validate the archive and build its index. The entries move into the
    /// index.
    pub fn new(archive: Archive, source: Option<PathBuf>) -> Result<Self, ArchiveError> {
        let page = archive.pages.first().ok_or(ArchiveError::NoPages)?;
        let fallback_origin = page_origin(&page.title)
            .ok_or_else(|| ArchiveError::InvalidPageUrl(page.title.clone()))?;

        let Archive { pages, entries, .. } = archive;
        let index = ArchiveIndex::build(entries);

        Ok(Self {
            id: Uuid::new_v4(),
            pages,
            index,
            fallback_origin,
            source,
            loaded_at: SystemTime::now(),
        })
    }

    pub fn summary(&self) -> ArchiveSummary {
        ArchiveSummary {
            id: self.id,
            source: self.source.as_ref().map(|p| p.display().to_string()),
            loaded_at: self
                .loaded_at
                .duration_since(UNIX_EPOCH)
                .unwrap_or_default()
                .as_secs(),
            pages: self.pages.len(),
            entries: self.index.entry_count(),
            keys: self.index.len(),
            fallback_origin: self.fallback_origin.clone(),
        }
    }
}

/// Serializable description of a loaded snapshot.
#[derive(Debug, Clone, Serialize)]
pub struct ArchiveSummary {
    pub id: Uuid,
    pub source: Option<String>,
    pub loaded_at: u64,
    pub pages: usize,
    pub entries: usize,
    pub keys: usize,
    pub fallback_origin: String,
}

/// Owner of the single active snapshot, shared by every request handler.
#[derive(Debug)]
pub struct ArchiveStore {
    current: ArcSwapOption<ArchiveSnapshot>,
    directory: PathBuf,
}

impl ArchiveStore {
    /// Create an empty store that loads archives from `directory`.
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            current: ArcSwapOption::empty(),
            directory: directory.into(),
        }
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// The active snapshot, if any. The returned reference stays valid even
    /// if a load replaces the snapshot meanwhile.
    pub fn current(&self) -> Option<Arc<ArchiveSnapshot>> {
        self.current.load_full()
    }

    pub fn is_loaded(&self) -> bool {
        self.current.load().is_some()
    }

    /// Publish a fully built snapshot.
    pub fn install(&self, snapshot: ArchiveSnapshot) -> Arc<ArchiveSnapshot> {
        let snapshot = Arc::new(snapshot);
        self.current.store(Some(snapshot.clone()));
        Self::record_install(&snapshot);
        snapshot
    }

    /// Publish `snapshot` only if `expected` is still the active snapshot.
    /// Returns `None`, leaving the store untouched, when something else was
    /// installed meanwhile.
    pub fn install_if_current(
        &self,
        expected: &Arc<ArchiveSnapshot>,
        snapshot: ArchiveSnapshot,
    ) -> Option<Arc<ArchiveSnapshot>> {
        let snapshot = Arc::new(snapshot);
        let mut replaced = false;

        self.current.rcu(|current| match current {
            Some(active) if Arc::ptr_eq(active, expected) => {
                replaced = true;
                Some(snapshot.clone())
            }
            other => {
                replaced = false;
                other.clone()
            }
        });

        if !replaced {
            return None;
        }
        Self::record_install(&snapshot);
        Some(snapshot)
    }

    fn record_install(snapshot: &ArchiveSnapshot) {
        tracing::info!(
            generation = %snapshot.id,
            source = ?snapshot.source,
            pages = snapshot.pages.len(),
            entries = snapshot.index.entry_count(),
            keys = snapshot.index.len(),
            fallback_origin = %snapshot.fallback_origin,
            "Archive loaded"
        );
        metrics::record_archive_load(true);
        metrics::set_archive_size(snapshot.index.entry_count(), snapshot.index.len());
    }

    /// Load a file by name from the archive directory.
    pub fn load_file(&self, file_name: &str) -> Result<Arc<ArchiveSnapshot>, ArchiveError> {
        let path = resolve_archive_path(&self.directory, file_name).inspect_err(|e| {
            tracing::warn!(file_name = %file_name, error = %e, "Rejected archive load");
            metrics::record_archive_load(false);
        })?;
        self.load_path(&path)
    }

    /// Load an archive from an arbitrary path.
    pub fn load_path(&self, path: &Path) -> Result<Arc<ArchiveSnapshot>, ArchiveError> {
        let snapshot = self.build_snapshot(path)?;
        Ok(self.install(snapshot))
    }

    /// Re-read the file backing the active snapshot.
    pub fn reload(&self) -> Result<Arc<ArchiveSnapshot>, ArchiveError> {
        let current = self.current().ok_or(ArchiveError::NotLoaded)?;
        self.reload_from(&current)
    }

    /// Re-read the file backing `previous` and replace it. A load that
    /// finished in the meantime wins: the re-read archive is discarded and
    /// `ArchiveError::Superseded` returned.
    pub fn reload_from(
        &self,
        previous: &Arc<ArchiveSnapshot>,
    ) -> Result<Arc<ArchiveSnapshot>, ArchiveError> {
        let source = previous.source.as_deref().ok_or(ArchiveError::NotLoaded)?;
        let snapshot = self.build_snapshot(source)?;

        self.install_if_current(previous, snapshot).ok_or_else(|| {
            tracing::warn!(
                path = %source.display(),
                "Archive replaced during reload. Discarding reloaded copy."
            );
            ArchiveError::Superseded
        })
    }

    fn build_snapshot(&self, path: &Path) -> Result<ArchiveSnapshot, ArchiveError> {
        tracing::info!(path = %path.display(), "Loading archive");

        read_archive(path)
            .and_then(|a| ArchiveSnapshot::new(a, Some(path.to_path_buf())))
            .inspect_err(|e| {
                tracing::error!(
                    path = %path.display(),
                    error = %e,
                    "Failed to load archive. Keeping current archive."
                );
                metrics::record_archive_load(false);
            })
    }
}

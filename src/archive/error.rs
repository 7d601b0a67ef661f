//! Archive load errors.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while loading an archive. All of them are local to the load
/// call: the previously active snapshot stays in force.
#[derive(Debug, Error)]
pub enum ArchiveError {
    /// Archive file could not be read.
    #[error("failed to read archive {}: {}", .path.display(), .source)]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Archive file is not a valid HAR document.
    #[error("failed to decode archive {}: {}", .path.display(), .source)]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },

    /// Archive has no pages, so there is no fallback origin.
    #[error("archive contains no pages")]
    NoPages,

    /// First page's title is not an absolute URL with a host.
    #[error("first page title {0:?} is not an absolute URL with a host")]
    InvalidPageUrl(String),

    /// Requested file name escapes the archive directory.
    #[error("invalid archive file name {0:?}")]
    InvalidFileName(String),

    /// Reload requested but the active archive did not come from a file.
    #[error("no archive file is loaded")]
    NotLoaded,

    /// Another archive was installed while a reload was reading its file.
    #[error("archive was replaced while reloading")]
    Superseded,
}

//! Archive loading from disk.

use std::fs;
use std::path::{Component, Path, PathBuf};

use crate::archive::error::ArchiveError;
use crate::archive::model::{Archive, HarDocument};

/// Decode a HAR document held in memory.
pub fn parse_archive(json: &str) -> Result<Archive, serde_json::Error> {
    let document: HarDocument = serde_json::from_str(json)?;
    Ok(document.log)
}

/// Read and decode a HAR file.
pub fn read_archive(path: &Path) -> Result<Archive, ArchiveError> {
    let content = fs::read_to_string(path).map_err(|source| ArchiveError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    parse_archive(&content).map_err(|source| ArchiveError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Join a client-supplied file name onto the archive directory.
///
/// Only a single plain path component is accepted, so a load request can
/// never reach outside `directory`.
pub fn resolve_archive_path(directory: &Path, file_name: &str) -> Result<PathBuf, ArchiveError> {
    let mut components = Path::new(file_name).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(name)), None) if !file_name.contains(['/', '\\']) => {
            Ok(directory.join(name))
        }
        _ => Err(ArchiveError::InvalidFileName(file_name.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_resolve_plain_name() {
        let path = resolve_archive_path(Path::new("hars"), "archive.har").unwrap();
        assert_eq!(path, PathBuf::from("hars/archive.har"));
    }

    #[test]
    fn test_resolve_rejects_traversal() {
        for name in ["", ".", "..", "../secret.har", "sub/archive.har", "/etc/passwd", "a\\b.har"] {
            assert!(
                matches!(
                    resolve_archive_path(Path::new("hars"), name),
                    Err(ArchiveError::InvalidFileName(_))
                ),
                "{name:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_read_archive_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.har");
        let mut file = fs::File::create(&path).unwrap();
        write!(
            file,
            r#"{{"log":{{"pages":[{{"title":"https://a.test/"}}],"entries":[]}}}}"#
        )
        .unwrap();

        let archive = read_archive(&path).unwrap();
        assert_eq!(archive.pages.len(), 1);
        assert!(archive.entries.is_empty());
    }

    #[test]
    fn test_read_archive_errors() {
        let dir = tempfile::tempdir().unwrap();

        let missing = dir.path().join("missing.har");
        assert!(matches!(read_archive(&missing), Err(ArchiveError::Io { .. })));

        let broken = dir.path().join("broken.har");
        fs::write(&broken, "{ not json").unwrap();
        assert!(matches!(read_archive(&broken), Err(ArchiveError::Parse { .. })));
    }
}

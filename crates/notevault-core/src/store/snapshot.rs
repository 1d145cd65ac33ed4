//! On-disk version envelope

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Envelope layout written by this version of the crate
pub const FORMAT_VERSION: u32 = 1;

/// Full content of one stored version
///
/// Serialized to JSON and gzip-compressed. Files are written once and never
/// modified.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionSnapshot {
    pub format_version: u32,
    pub note_id: String,
    pub title: String,
    pub folder_path: String,
    pub version_number: u32,
    /// Unix ms
    pub captured_at: i64,
    pub source_modified_at: Option<i64>,
    pub content_hash: String,
    pub plaintext: String,
    pub markdown: String,
    pub html: String,
    #[serde(default)]
    pub has_embedded_objects: bool,
    pub character_count: usize,
    pub word_count: usize,
}

/// Write `snapshot` to `path` through a temporary sibling and a rename
pub(super) fn write(path: &Path, snapshot: &VersionSnapshot) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let tmp_path = path.with_extension("gz.tmp");
    let result = write_compressed(&tmp_path, snapshot);
    if let Err(error) = result {
        let _ = fs::remove_file(&tmp_path);
        return Err(error);
    }

    fs::rename(&tmp_path, path)?;
    Ok(())
}

fn write_compressed(path: &Path, snapshot: &VersionSnapshot) -> Result<()> {
    let file = File::create(path)?;
    let mut encoder = GzEncoder::new(BufWriter::new(file), Compression::default());
    serde_json::to_writer(&mut encoder, snapshot)?;
    let mut writer = encoder
        .finish()
        .map_err(|e| Error::Storage(format!("compressing {}: {e}", path.display())))?;
    writer.flush()?;
    writer
        .get_ref()
        .sync_all()
        .map_err(|e| Error::Storage(format!("syncing {}: {e}", path.display())))?;
    Ok(())
}

/// Read and decompress a snapshot file
pub(super) fn read(path: &Path) -> Result<VersionSnapshot> {
    let file = match File::open(path) {
        Ok(file) => file,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(Error::NotFound(format!("version file {}", path.display())));
        }
        Err(e) => return Err(e.into()),
    };

    let decoder = GzDecoder::new(BufReader::new(file));
    let snapshot: VersionSnapshot = serde_json::from_reader(decoder)
        .map_err(|e| Error::Storage(format!("reading {}: {e}", path.display())))?;

    if snapshot.format_version > FORMAT_VERSION {
        return Err(Error::Storage(format!(
            "{} uses envelope format {}, newest supported is {FORMAT_VERSION}",
            path.display(),
            snapshot.format_version
        )));
    }
    Ok(snapshot)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn snapshot() -> VersionSnapshot {
        VersionSnapshot {
            format_version: FORMAT_VERSION,
            note_id: "n1".to_string(),
            title: "Title".to_string(),
            folder_path: "Notes".to_string(),
            version_number: 1,
            captured_at: 1_704_153_600_000,
            source_modified_at: None,
            content_hash: "abc".to_string(),
            plaintext: "Title\nbody".to_string(),
            markdown: "# Title\nbody".to_string(),
            html: "<h1>Title</h1>".to_string(),
            has_embedded_objects: false,
            character_count: 10,
            word_count: 2,
        }
    }

    #[test]
    fn test_write_leaves_no_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("2024/01/02/n1-v001.json.gz");

        write(&path, &snapshot()).unwrap();
        assert_eq!(read(&path).unwrap(), snapshot());

        let entries: Vec<_> = fs::read_dir(path.parent().unwrap()).unwrap().collect();
        assert_eq!(entries.len(), 1);
    }

    #[test]
    fn test_read_missing_and_corrupt() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.json.gz");
        assert!(matches!(read(&missing), Err(Error::NotFound(_))));

        let corrupt = dir.path().join("corrupt.json.gz");
        fs::write(&corrupt, b"not gzip at all").unwrap();
        assert!(matches!(read(&corrupt), Err(Error::Storage(_))));
    }

    #[test]
    fn test_newer_format_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("future.json.gz");
        let mut future = snapshot();
        future.format_version = FORMAT_VERSION + 1;

        write(&path, &future).unwrap();
        assert!(matches!(read(&path), Err(Error::Storage(_))));
    }
}

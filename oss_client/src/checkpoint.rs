use std::ffi::OsString;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tempfile::NamedTempFile;
use tracing::debug;

use crate::constants::{CHECKPOINT_MAGIC, CHECKPOINT_SUFFIX};
use crate::error::{OssClientError, Result};

/// Size and modification time of a local file, used to detect whether the
/// file changed since a checkpoint was written.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileStat {
    pub size: u64,
    pub modified_secs: u64,
    pub modified_nanos: u32,
}

impl FileStat {
    pub fn read(path: impl AsRef<Path>) -> Result<Self> {
        let metadata = std::fs::metadata(path)?;
        let modified = metadata
            .modified()?
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default();

        Ok(Self {
            size: metadata.len(),
            modified_secs: modified.as_secs(),
            modified_nanos: modified.subsec_nanos(),
        })
    }
}

/// One part already stored by the service.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletedPartRecord {
    pub part_number: i32,
    pub offset: u64,
    pub size: u64,
    pub etag: String,
}

/// Resumability record for a multipart upload in progress.
///
/// The record is rewritten after every completed part.  A record is only
/// trusted when its digest matches its contents and it describes the same
/// file, destination and part layout as the upload about to start.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadCheckpoint {
    magic: String,
    digest: String,
    pub local_path: String,
    pub file_stat: FileStat,
    pub bucket: String,
    pub object_key: String,
    pub part_size: u64,
    pub upload_id: String,
    pub completed_parts: Vec<CompletedPartRecord>,
}

/// The checkpoint file used for `local_path`: the same path with `.cp` appended.
pub fn checkpoint_path(local_path: impl AsRef<Path>) -> PathBuf {
    let mut path = OsString::from(local_path.as_ref().as_os_str());
    path.push(CHECKPOINT_SUFFIX);
    PathBuf::from(path)
}

impl UploadCheckpoint {
    pub fn new(
        local_path: &Path,
        file_stat: FileStat,
        bucket: &str,
        object_key: &str,
        part_size: u64,
        upload_id: String,
    ) -> Self {
        Self {
            magic: CHECKPOINT_MAGIC.to_string(),
            digest: String::new(),
            local_path: local_path.to_string_lossy().into_owned(),
            file_stat,
            bucket: bucket.to_string(),
            object_key: object_key.to_string(),
            part_size,
            upload_id,
            completed_parts: Vec::new(),
        }
    }

    /// Loads the checkpoint at `path`.  Returns `Ok(None)` if there is none,
    /// and an error if the file exists but is unreadable, malformed, or was
    /// modified outside of this program.
    pub fn load(path: impl AsRef<Path>) -> Result<Option<Self>> {
        let path = path.as_ref();
        let data = match std::fs::read(path) {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let checkpoint: UploadCheckpoint = serde_json::from_slice(&data)?;

        if checkpoint.magic != CHECKPOINT_MAGIC {
            return Err(OssClientError::CheckpointError(format!("{path:?} is not an upload checkpoint")));
        }
        if checkpoint.digest != checkpoint.compute_digest()? {
            return Err(OssClientError::CheckpointError(format!("{path:?} failed its integrity check")));
        }

        Ok(Some(checkpoint))
    }

    /// Writes the checkpoint to `path`, replacing any previous version atomically.
    pub fn save(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        self.digest = self.compute_digest()?;

        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let mut tmp = NamedTempFile::new_in(dir)?;
        tmp.write_all(&serde_json::to_vec(self)?)?;
        tmp.persist(path).map_err(|e| OssClientError::IOError(e.error))?;

        debug!("Saved upload checkpoint {path:?} ({} parts done)", self.completed_parts.len());
        Ok(())
    }

    /// Removes the checkpoint file at `path`, if present.
    pub fn remove(path: impl AsRef<Path>) -> Result<()> {
        match std::fs::remove_file(path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    /// True if this checkpoint can resume the described upload.
    pub fn matches(&self, local_path: &Path, file_stat: &FileStat, bucket: &str, object_key: &str, part_size: u64) -> bool {
        self.local_path == local_path.to_string_lossy()
            && &self.file_stat == file_stat
            && self.bucket == bucket
            && self.object_key == object_key
            && self.part_size == part_size
            && !self.upload_id.is_empty()
    }

    pub fn is_part_done(&self, part_number: i32) -> bool {
        self.completed_parts.iter().any(|p| p.part_number == part_number)
    }

    pub fn record_part(&mut self, part: CompletedPartRecord) {
        self.completed_parts.retain(|p| p.part_number != part.part_number);
        self.completed_parts.push(part);
    }

    pub fn completed_bytes(&self) -> u64 {
        self.completed_parts.iter().map(|p| p.size).sum()
    }

    /// Completed parts ordered by part number, as the service requires when
    /// assembling the object.
    pub fn sorted_parts(&self) -> Vec<CompletedPartRecord> {
        let mut parts = self.completed_parts.clone();
        parts.sort_by_key(|p| p.part_number);
        parts
    }

    fn compute_digest(&self) -> Result<String> {
        let mut unsigned = self.clone();
        unsigned.digest.clear();
        let bytes = serde_json::to_vec(&unsigned)?;
        Ok(format!("{:x}", Sha256::digest(&bytes)))
    }
}

#[cfg(test)]
mod tests {
    use tempfile::tempdir;

    use super::*;

    fn sample(dir: &Path) -> (PathBuf, FileStat, UploadCheckpoint) {
        let local = dir.join("a.bin");
        std::fs::write(&local, vec![7u8; 300]).unwrap();
        let stat = FileStat::read(&local).unwrap();
        let checkpoint = UploadCheckpoint::new(&local, stat, "bucket", "dev1/a.bin", 100, "upload-1".to_string());
        (local, stat, checkpoint)
    }

    #[test]
    fn test_checkpoint_path_appends_suffix() {
        assert_eq!(checkpoint_path("/data/a.bin"), PathBuf::from("/data/a.bin.cp"));
        assert_eq!(checkpoint_path("./a"), PathBuf::from("./a.cp"));
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempdir().unwrap();
        let (local, stat, mut checkpoint) = sample(dir.path());
        let cp_path = checkpoint_path(&local);

        assert_eq!(UploadCheckpoint::load(&cp_path).unwrap(), None);

        checkpoint.record_part(CompletedPartRecord {
            part_number: 2,
            offset: 100,
            size: 100,
            etag: "\"e2\"".to_string(),
        });
        checkpoint.save(&cp_path).unwrap();

        let loaded = UploadCheckpoint::load(&cp_path).unwrap().unwrap();
        assert_eq!(loaded, checkpoint);
        assert!(loaded.matches(&local, &stat, "bucket", "dev1/a.bin", 100));
        assert!(loaded.is_part_done(2));
        assert!(!loaded.is_part_done(1));
        assert_eq!(loaded.completed_bytes(), 100);

        UploadCheckpoint::remove(&cp_path).unwrap();
        assert!(!cp_path.exists());
        UploadCheckpoint::remove(&cp_path).unwrap();
    }

    #[test]
    fn test_mismatched_upload_is_rejected() {
        let dir = tempdir().unwrap();
        let (local, stat, checkpoint) = sample(dir.path());

        assert!(!checkpoint.matches(&local, &stat, "other", "dev1/a.bin", 100));
        assert!(!checkpoint.matches(&local, &stat, "bucket", "dev2/a.bin", 100));
        assert!(!checkpoint.matches(&local, &stat, "bucket", "dev1/a.bin", 200));

        let grown = FileStat {
            size: stat.size + 1,
            ..stat
        };
        assert!(!checkpoint.matches(&local, &grown, "bucket", "dev1/a.bin", 100));
    }

    #[test]
    fn test_tampered_checkpoint_fails_to_load() {
        let dir = tempdir().unwrap();
        let (local, _, mut checkpoint) = sample(dir.path());
        let cp_path = checkpoint_path(&local);
        checkpoint.save(&cp_path).unwrap();

        let text = std::fs::read_to_string(&cp_path).unwrap();
        std::fs::write(&cp_path, text.replace("upload-1", "upload-2")).unwrap();
        assert!(matches!(UploadCheckpoint::load(&cp_path), Err(OssClientError::CheckpointError(_))));

        std::fs::write(&cp_path, b"not json").unwrap();
        assert!(matches!(UploadCheckpoint::load(&cp_path), Err(OssClientError::SerializationError(_))));
    }

    #[test]
    fn test_record_part_replaces_duplicates() {
        let dir = tempdir().unwrap();
        let (_, _, mut checkpoint) = sample(dir.path());
        for (n, etag) in [(3, "a"), (1, "b"), (3, "c")] {
            checkpoint.record_part(CompletedPartRecord {
                part_number: n,
                offset: (n as u64 - 1) * 100,
                size: 100,
                etag: etag.to_string(),
            });
        }

        let parts = checkpoint.sorted_parts();
        assert_eq!(parts.iter().map(|p| p.part_number).collect::<Vec<_>>(), vec![1, 3]);
        assert_eq!(parts[1].etag, "c");
    }
}

use std::io::SeekFrom;
use std::path::Path;
use std::sync::Arc;

use bytes::Bytes;
use error_printer::ErrorPrinter;
use futures::{StreamExt, TryStreamExt};
use progress_tracking::{ItemTransferTracker, TransferProgressListener};
use tokio::io::{AsyncReadExt, AsyncSeekExt};
use tracing::{debug, info, warn};

use crate::checkpoint::{checkpoint_path, CompletedPartRecord, FileStat, UploadCheckpoint};
use crate::constants::{DEFAULT_PART_SIZE, DEFAULT_UPLOAD_ROUTINES};
use crate::error::{OssClientError, Result};
use crate::interface::{MultipartApi, UploadClient};
use crate::multipart::{effective_part_size, plan_parts, PartRange};

/// Uploads whole files through a [MultipartApi].
///
/// Non-empty files are uploaded in parts, several at a time, with a
/// checkpoint file next to the local file so that an interrupted upload
/// resumes from the parts already stored.  Empty files are stored with a
/// single request.
pub struct FileUploader<A: MultipartApi> {
    api: A,
    part_size: u64,
    routines: usize,
}

impl<A: MultipartApi> FileUploader<A> {
    pub fn new(api: A) -> Self {
        Self {
            api,
            part_size: DEFAULT_PART_SIZE,
            routines: DEFAULT_UPLOAD_ROUTINES,
        }
    }

    pub fn with_part_size(mut self, part_size: u64) -> Self {
        self.part_size = part_size.max(1);
        self
    }

    pub fn with_routines(mut self, routines: usize) -> Self {
        self.routines = routines.max(1);
        self
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    async fn upload_empty(&self, remote_key: &str, tracker: &ItemTransferTracker) -> Result<()> {
        tracker.start(0);
        self.api.put_object(remote_key, Bytes::new()).await
    }

    async fn upload_multipart(
        &self,
        remote_key: &str,
        local_path: &Path,
        file_stat: &FileStat,
        tracker: &ItemTransferTracker,
    ) -> Result<()> {
        let part_size = effective_part_size(file_stat.size, self.part_size);
        let cp_path = checkpoint_path(local_path);

        let mut checkpoint = match self.resume_checkpoint(&cp_path, local_path, file_stat, remote_key, part_size) {
            Some(checkpoint) => checkpoint,
            None => {
                let upload_id = self.api.create_multipart_upload(remote_key).await?;
                debug!("Started multipart upload {upload_id} for {local_path:?} -> {remote_key}");
                let mut checkpoint =
                    UploadCheckpoint::new(local_path, *file_stat, self.api.bucket(), remote_key, part_size, upload_id);
                checkpoint.save(&cp_path)?;
                checkpoint
            },
        };

        tracker.start(checkpoint.completed_bytes());

        let upload_id = checkpoint.upload_id.clone();
        let pending: Vec<PartRange> = plan_parts(file_stat.size, part_size)
            .into_iter()
            .filter(|part| !checkpoint.is_part_done(part.part_number))
            .collect();

        let mut uploads = std::pin::pin!(futures::stream::iter(pending)
            .map(|part| self.upload_part(remote_key, upload_id.as_str(), local_path, part))
            .buffer_unordered(self.routines));

        loop {
            let completed = match uploads.try_next().await {
                Ok(Some(completed)) => completed,
                Ok(None) => break,
                Err(e) => return Err(discard_if_missing(e, &cp_path, remote_key, &upload_id)),
            };

            tracker.update(completed.size);
            checkpoint.record_part(completed);
            checkpoint.save(&cp_path)?;
        }

        self.api
            .complete_multipart_upload(remote_key, &upload_id, &checkpoint.sorted_parts())
            .await
            .map_err(|e| discard_if_missing(e, &cp_path, remote_key, &upload_id))?;

        let _ = UploadCheckpoint::remove(&cp_path).log_error("failed to remove upload checkpoint");
        Ok(())
    }

    /// Loads the checkpoint for this upload if one exists and still describes
    /// it.  Unusable checkpoints are deleted.
    fn resume_checkpoint(
        &self,
        cp_path: &Path,
        local_path: &Path,
        file_stat: &FileStat,
        remote_key: &str,
        part_size: u64,
    ) -> Option<UploadCheckpoint> {
        let checkpoint = match UploadCheckpoint::load(cp_path) {
            Ok(Some(checkpoint)) => checkpoint,
            Ok(None) => return None,
            Err(e) => {
                warn!("Ignoring unreadable checkpoint {cp_path:?}: {e}");
                let _ = UploadCheckpoint::remove(cp_path).log_error("failed to remove unreadable checkpoint");
                return None;
            },
        };

        if checkpoint.matches(local_path, file_stat, self.api.bucket(), remote_key, part_size) {
            info!(
                "Resuming upload {} of {local_path:?}: {} parts already stored",
                checkpoint.upload_id,
                checkpoint.completed_parts.len()
            );
            Some(checkpoint)
        } else {
            debug!("Checkpoint {cp_path:?} describes a different upload; starting over");
            let _ = UploadCheckpoint::remove(cp_path).log_error("failed to remove outdated checkpoint");
            None
        }
    }

    async fn upload_part(
        &self,
        remote_key: &str,
        upload_id: &str,
        local_path: &Path,
        part: PartRange,
    ) -> Result<CompletedPartRecord> {
        let mut file = tokio::fs::File::open(local_path).await?;
        file.seek(SeekFrom::Start(part.offset)).await?;

        let mut buffer = vec![0u8; part.size as usize];
        file.read_exact(&mut buffer).await?;

        let etag = self
            .api
            .upload_part(remote_key, upload_id, part.part_number, Bytes::from(buffer))
            .await?;

        Ok(CompletedPartRecord {
            part_number: part.part_number,
            offset: part.offset,
            size: part.size,
            etag,
        })
    }
}

/// Removes the checkpoint when the service no longer knows `upload_id`, so the
/// next attempt starts a new upload.
fn discard_if_missing(e: OssClientError, cp_path: &Path, remote_key: &str, upload_id: &str) -> OssClientError {
    if e.is_missing_upload() {
        warn!("Multipart upload {upload_id} for {remote_key} no longer exists; discarding checkpoint");
        let _ = UploadCheckpoint::remove(cp_path).log_error("failed to remove stale checkpoint");
    }
    e
}

#[async_trait::async_trait]
impl<A: MultipartApi> UploadClient for FileUploader<A> {
    async fn upload_file(
        &self,
        remote_key: &str,
        local_path: &Path,
        listener: Arc<dyn TransferProgressListener>,
    ) -> Result<()> {
        let file_stat = FileStat::read(local_path)?;
        let tracker = ItemTransferTracker::new(listener, file_stat.size);

        let result = if file_stat.size == 0 {
            self.upload_empty(remote_key, &tracker).await
        } else {
            self.upload_multipart(remote_key, local_path, &file_stat, &tracker).await
        };

        match &result {
            Ok(()) => tracker.complete(),
            Err(_) => tracker.fail(),
        }
        result
    }
}

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use bytes::Bytes;
use progress_tracking::TransferProgressListener;

use crate::checkpoint::CompletedPartRecord;
use crate::error::Result;

/// Where and as whom to connect: the storage endpoint, the bucket to write
/// to, and the access key pair.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct OssTarget {
    pub endpoint: String,
    pub bucket: String,
    pub access_id: String,
    pub access_key: String,
}

impl fmt::Debug for OssTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OssTarget")
            .field("endpoint", &self.endpoint)
            .field("bucket", &self.bucket)
            .field("access_id", &self.access_id)
            .field("access_key", &"<redacted>")
            .finish()
    }
}

/// The object-store calls needed to upload a file, either in one request or
/// as a multipart upload.  All keys are relative to the bucket the
/// implementation was created for.
#[async_trait::async_trait]
pub trait MultipartApi: Send + Sync {
    /// The bucket this client writes to.
    fn bucket(&self) -> &str;

    /// Store `body` as the whole object at `key`.
    async fn put_object(&self, key: &str, body: Bytes) -> Result<()>;

    /// Start a multipart upload, returning its upload id.
    async fn create_multipart_upload(&self, key: &str) -> Result<String>;

    /// Upload one part, returning the part's etag.
    async fn upload_part(&self, key: &str, upload_id: &str, part_number: i32, body: Bytes) -> Result<String>;

    /// Assemble the object from `parts`, which must be ordered by part number.
    async fn complete_multipart_upload(&self, key: &str, upload_id: &str, parts: &[CompletedPartRecord]) -> Result<()>;
}

#[async_trait::async_trait]
impl<T: MultipartApi + ?Sized> MultipartApi for Arc<T> {
    fn bucket(&self) -> &str {
        (**self).bucket()
    }

    async fn put_object(&self, key: &str, body: Bytes) -> Result<()> {
        (**self).put_object(key, body).await
    }

    async fn create_multipart_upload(&self, key: &str) -> Result<String> {
        (**self).create_multipart_upload(key).await
    }

    async fn upload_part(&self, key: &str, upload_id: &str, part_number: i32, body: Bytes) -> Result<String> {
        (**self).upload_part(key, upload_id, part_number, body).await
    }

    async fn complete_multipart_upload(&self, key: &str, upload_id: &str, parts: &[CompletedPartRecord]) -> Result<()> {
        (**self).complete_multipart_upload(key, upload_id, parts).await
    }
}

/// A connected handle that uploads local files to remote keys.
#[async_trait::async_trait]
pub trait UploadClient: Send + Sync {
    /// Upload the file at `local_path` to `remote_key`, reporting progress to
    /// `listener`.
    async fn upload_file(
        &self,
        remote_key: &str,
        local_path: &Path,
        listener: Arc<dyn TransferProgressListener>,
    ) -> Result<()>;
}

/// Establishes upload clients.  Every call yields a fresh client; nothing is
/// shared with clients returned by earlier calls.
#[async_trait::async_trait]
pub trait Connector: Send + Sync {
    type Client: UploadClient;

    async fn connect(&self, target: &OssTarget) -> Result<Self::Client>;
}

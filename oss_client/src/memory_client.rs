use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use bytes::{Bytes, BytesMut};
use sha2::{Digest, Sha256};

use crate::checkpoint::CompletedPartRecord;
use crate::error::{OssClientError, Result};
use crate::interface::MultipartApi;

struct PendingUpload {
    key: String,
    parts: BTreeMap<i32, (String, Bytes)>,
}

#[derive(Default)]
struct MemoryState {
    objects: HashMap<String, Bytes>,
    uploads: HashMap<String, PendingUpload>,
    failing_parts: HashSet<i32>,
    next_upload_id: u64,
}

/// An in-process object store implementing [MultipartApi].
///
/// Objects live only as long as the client.  Part uploads can be made to
/// fail once with [MemoryClient::fail_part_once], which makes interrupted
/// transfers reproducible.
pub struct MemoryClient {
    bucket: String,
    state: Mutex<MemoryState>,
    created_uploads: AtomicUsize,
    uploaded_parts: AtomicUsize,
}

impl MemoryClient {
    pub fn new(bucket: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            state: Mutex::new(MemoryState::default()),
            created_uploads: AtomicUsize::new(0),
            uploaded_parts: AtomicUsize::new(0),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// The next upload of `part_number` fails with a service error.
    pub fn fail_part_once(&self, part_number: i32) {
        self.lock().failing_parts.insert(part_number);
    }

    /// Drops a multipart upload as if the service had expired it.
    pub fn abort_upload(&self, upload_id: &str) -> bool {
        self.lock().uploads.remove(upload_id).is_some()
    }

    pub fn get_object(&self, key: &str) -> Option<Bytes> {
        self.lock().objects.get(key).cloned()
    }

    pub fn object_keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.lock().objects.keys().cloned().collect();
        keys.sort();
        keys
    }

    pub fn pending_upload_ids(&self) -> Vec<String> {
        self.lock().uploads.keys().cloned().collect()
    }

    /// Number of multipart uploads started so far.
    pub fn created_uploads(&self) -> usize {
        self.created_uploads.load(Ordering::Relaxed)
    }

    /// Number of parts accepted so far.
    pub fn uploaded_parts(&self) -> usize {
        self.uploaded_parts.load(Ordering::Relaxed)
    }
}

fn no_such_upload(operation: &'static str, upload_id: &str) -> OssClientError {
    OssClientError::ServiceError {
        operation,
        code: Some("NoSuchUpload".to_string()),
        message: format!("upload {upload_id} does not exist"),
    }
}

#[async_trait::async_trait]
impl MultipartApi for MemoryClient {
    fn bucket(&self) -> &str {
        &self.bucket
    }

    async fn put_object(&self, key: &str, body: Bytes) -> Result<()> {
        self.lock().objects.insert(key.to_string(), body);
        Ok(())
    }

    async fn create_multipart_upload(&self, key: &str) -> Result<String> {
        let mut state = self.lock();
        state.next_upload_id += 1;
        let upload_id = format!("memory-upload-{}", state.next_upload_id);
        state.uploads.insert(
            upload_id.clone(),
            PendingUpload {
                key: key.to_string(),
                parts: BTreeMap::new(),
            },
        );
        self.created_uploads.fetch_add(1, Ordering::Relaxed);
        Ok(upload_id)
    }

    async fn upload_part(&self, key: &str, upload_id: &str, part_number: i32, body: Bytes) -> Result<String> {
        let mut state = self.lock();
        if state.failing_parts.remove(&part_number) {
            return Err(OssClientError::ServiceError {
                operation: "UploadPart",
                code: Some("InternalError".to_string()),
                message: format!("injected failure for part {part_number}"),
            });
        }

        let upload = state
            .uploads
            .get_mut(upload_id)
            .filter(|u| u.key == key)
            .ok_or_else(|| no_such_upload("UploadPart", upload_id))?;

        let etag = format!("\"{:x}\"", Sha256::digest(&body));
        upload.parts.insert(part_number, (etag.clone(), body));
        self.uploaded_parts.fetch_add(1, Ordering::Relaxed);
        Ok(etag)
    }

    async fn complete_multipart_upload(&self, key: &str, upload_id: &str, parts: &[CompletedPartRecord]) -> Result<()> {
        let mut state = self.lock();
        let upload = state
            .uploads
            .get(upload_id)
            .filter(|u| u.key == key)
            .ok_or_else(|| no_such_upload("CompleteMultipartUpload", upload_id))?;

        let invalid = |message: String| OssClientError::ServiceError {
            operation: "CompleteMultipartUpload",
            code: Some("InvalidPart".to_string()),
            message,
        };

        let mut data = BytesMut::new();
        let mut last_part_number = 0;
        for part in parts {
            if part.part_number <= last_part_number {
                return Err(invalid(format!("part {} is out of order", part.part_number)));
            }
            match upload.parts.get(&part.part_number) {
                Some((etag, body)) if *etag == part.etag => data.extend_from_slice(body),
                _ => return Err(invalid(format!("part {} does not match an uploaded part", part.part_number))),
            }
            last_part_number = part.part_number;
        }

        state.uploads.remove(upload_id);
        state.objects.insert(key.to_string(), data.freeze());
        Ok(())
    }
}

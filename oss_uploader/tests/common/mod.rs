#![allow(dead_code)]

use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use oss_client::{Connector, FileUploader, MemoryClient, OssClientError, OssTarget, UploadClient};
use oss_uploader::{RetryPolicy, Settings, UploadSession};
use progress_tracking::TransferProgressListener;

/// Shared counters and behavior switches for [StubConnector] and its clients.
#[derive(Debug, Default)]
pub struct StubState {
    connects: AtomicUsize,
    uploads: AtomicUsize,
    attempts_per_key: Mutex<HashMap<String, usize>>,
    keys: Mutex<Vec<String>>,
    /// Uploads of a key succeed from this attempt on; `None` never succeeds.
    succeed_on_attempt: Option<usize>,
    fail_connect: bool,
    /// Remove the local file while "uploading" it, to make a later delete fail.
    remove_local_file: bool,
}

impl StubState {
    pub fn connects(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }

    pub fn uploads(&self) -> usize {
        self.uploads.load(Ordering::SeqCst)
    }

    pub fn keys(&self) -> Vec<String> {
        self.keys.lock().unwrap().clone()
    }
}

#[derive(Clone, Debug)]
pub struct StubConnector {
    pub state: Arc<StubState>,
}

impl StubConnector {
    fn with_state(state: StubState) -> Self {
        Self { state: Arc::new(state) }
    }

    pub fn always_succeeds() -> Self {
        Self::succeeds_on(1)
    }

    pub fn succeeds_on(attempt: usize) -> Self {
        Self::with_state(StubState {
            succeed_on_attempt: Some(attempt),
            ..Default::default()
        })
    }

    pub fn always_fails() -> Self {
        Self::with_state(StubState::default())
    }

    pub fn unreachable() -> Self {
        Self::with_state(StubState {
            fail_connect: true,
            ..Default::default()
        })
    }

    pub fn removes_local_file() -> Self {
        Self::with_state(StubState {
            succeed_on_attempt: Some(1),
            remove_local_file: true,
            ..Default::default()
        })
    }
}

#[derive(Debug)]
pub struct StubClient {
    state: Arc<StubState>,
}

#[async_trait::async_trait]
impl UploadClient for StubClient {
    async fn upload_file(
        &self,
        remote_key: &str,
        local_path: &Path,
        _listener: Arc<dyn TransferProgressListener>,
    ) -> oss_client::Result<()> {
        self.state.uploads.fetch_add(1, Ordering::SeqCst);
        self.state.keys.lock().unwrap().push(remote_key.to_owned());

        let attempt = {
            let mut attempts = self.state.attempts_per_key.lock().unwrap();
            let count = attempts.entry(remote_key.to_owned()).or_default();
            *count += 1;
            *count
        };

        if self.state.remove_local_file {
            std::fs::remove_file(local_path)?;
        }

        match self.state.succeed_on_attempt {
            Some(n) if attempt >= n => Ok(()),
            _ => Err(OssClientError::Other(format!("stub failure on attempt {attempt}"))),
        }
    }
}

#[async_trait::async_trait]
impl Connector for StubConnector {
    type Client = StubClient;

    async fn connect(&self, _target: &OssTarget) -> oss_client::Result<StubClient> {
        self.state.connects.fetch_add(1, Ordering::SeqCst);
        if self.state.fail_connect {
            return Err(OssClientError::Other("connection refused".to_owned()));
        }
        Ok(StubClient {
            state: self.state.clone(),
        })
    }
}

/// Connects to one shared in-memory bucket, so retries see earlier parts.
#[derive(Clone)]
pub struct MemoryConnector {
    pub store: Arc<MemoryClient>,
    pub part_size: u64,
}

#[async_trait::async_trait]
impl Connector for MemoryConnector {
    type Client = FileUploader<Arc<MemoryClient>>;

    async fn connect(&self, _target: &OssTarget) -> oss_client::Result<Self::Client> {
        Ok(FileUploader::new(self.store.clone()).with_part_size(self.part_size))
    }
}

pub fn settings(device_id: &str) -> Settings {
    Settings {
        device_id: device_id.to_owned(),
        oss_end_point: "oss-cn-hangzhou.aliyuncs.com".to_owned(),
        oss_bucket: "test-bucket".to_owned(),
        oss_access_id: "id".to_owned(),
        oss_access_key: "key".to_owned(),
    }
}

pub fn session<C: Connector>(connector: C, settings: &Settings) -> UploadSession<C> {
    UploadSession::new(connector, settings.oss_target()).quiet()
}

pub fn default_policy() -> RetryPolicy {
    RetryPolicy::default()
}

use std::io;
use std::path::{Path, PathBuf};

use error_printer::ErrorPrinter;
use oss_client::Connector;
use tracing::{info, info_span, Instrument};

use crate::constants::DEFAULT_WORK_DIR;
use crate::file_listing::list_upload_files;
use crate::retry::{upload_with_retry, RetryPolicy, RetryState};
use crate::session::UploadSession;
use crate::settings::Settings;

#[derive(Clone, Debug)]
pub struct RunOptions {
    pub work_dir: PathBuf,
    pub delete_after_upload: bool,
    pub retry_policy: RetryPolicy,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            work_dir: PathBuf::from(DEFAULT_WORK_DIR),
            delete_after_upload: false,
            retry_policy: RetryPolicy::default(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DeletionStatus {
    /// Deletion was not requested, or the upload did not succeed.
    Kept,
    Deleted,
    Failed(String),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FileUploadReport {
    pub index: usize,
    pub file_name: String,
    pub remote_key: String,
    pub status: RetryState,
    pub attempts: usize,
    pub deletion: DeletionStatus,
}

impl FileUploadReport {
    pub fn succeeded(&self) -> bool {
        self.status == RetryState::Succeeded
    }
}

#[derive(Debug, Default)]
pub struct RunSummary {
    pub listing_error: Option<io::Error>,
    pub reports: Vec<FileUploadReport>,
}

impl RunSummary {
    pub fn succeeded(&self) -> usize {
        self.reports.iter().filter(|r| r.succeeded()).count()
    }

    pub fn failed(&self) -> usize {
        self.reports.len() - self.succeeded()
    }
}

/// Object key for a file: the device id and the file name joined by `/`.
pub fn remote_key(device_id: &str, file_name: &str) -> String {
    format!("{device_id}/{file_name}")
}

pub fn delete_local_file(path: &Path) -> DeletionStatus {
    println!("Upload {} finished, to delete it", path.display());

    match std::fs::remove_file(path).warn_error(format!("could not delete {path:?}")) {
        Ok(()) => DeletionStatus::Deleted,
        Err(e) => {
            println!("Error: {e}");
            DeletionStatus::Failed(e.to_string())
        },
    }
}

/// Upload every file in the working directory, one at a time in listing order.
///
/// The session is connected once up front and reconnected before each retry.
/// Per-file failures never abort the run.
pub async fn run_uploads<C: Connector>(
    settings: &Settings,
    options: &RunOptions,
    session: &mut UploadSession<C>,
) -> RunSummary {
    let mut summary = RunSummary::default();

    let files = match list_upload_files(&options.work_dir) {
        Ok(files) => files,
        Err(e) => {
            println!("read dir error");
            summary.listing_error = Some(e);
            Vec::new()
        },
    };
    info!(count = files.len(), work_dir = ?options.work_dir, "files to upload");

    let _ = session.initialize().await.warn_error("initial connection failed");

    for (index, file_name) in files.into_iter().enumerate() {
        let local_path = options.work_dir.join(&file_name);
        let key = remote_key(&settings.device_id, &file_name);

        let outcome = upload_with_retry(session, &key, &local_path, &options.retry_policy)
            .instrument(info_span!("upload_file", index, key = %key))
            .await;

        println!("Upload {index}: {file_name:<16} status: {}", outcome.succeeded());

        let deletion = if outcome.succeeded() && options.delete_after_upload {
            delete_local_file(&local_path)
        } else {
            DeletionStatus::Kept
        };

        summary.reports.push(FileUploadReport {
            index,
            file_name,
            remote_key: key,
            status: outcome.state,
            attempts: outcome.attempts,
            deletion,
        });
    }

    info!(succeeded = summary.succeeded(), failed = summary.failed(), "upload run finished");
    summary
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remote_key_joins_device_and_name() {
        assert_eq!(remote_key("dev1", "a.txt"), "dev1/a.txt");
        assert_eq!(remote_key("", "a.txt"), "/a.txt");
    }

    #[test]
    fn test_delete_missing_file_reports_failure() {
        let dir = tempfile::tempdir().unwrap();
        let status = delete_local_file(&dir.path().join("gone"));
        assert!(matches!(status, DeletionStatus::Failed(_)));
    }

    #[test]
    fn test_delete_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.txt");
        std::fs::write(&path, b"x").unwrap();

        assert_eq!(delete_local_file(&path), DeletionStatus::Deleted);
        assert!(!path.exists());
    }
}

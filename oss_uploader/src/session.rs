use std::path::Path;
use std::sync::Arc;

use error_printer::ErrorPrinter;
use oss_client::{Connector, OssTarget, UploadClient};
use progress_tracking::{ConsoleProgressPrinter, NoOpProgressListener, TransferProgressListener};
use tracing::{info, instrument};

use crate::errors::Result;

/// Builds the progress listener for one upload, given the local file path.
pub type ProgressFactory = Box<dyn Fn(&str) -> Arc<dyn TransferProgressListener> + Send + Sync>;

fn console_progress(name: &str) -> Arc<dyn TransferProgressListener> {
    ConsoleProgressPrinter::stdout(name)
}

fn no_progress(_name: &str) -> Arc<dyn TransferProgressListener> {
    NoOpProgressListener::new()
}

#[derive(Debug)]
pub enum SessionState<T> {
    Disconnected,
    Connected(T),
}

impl<T> SessionState<T> {
    pub fn is_connected(&self) -> bool {
        matches!(self, SessionState::Connected(_))
    }
}

/// A storage session that can be torn down and re-established between
/// attempts.  Uploads are only issued through a connected client.
pub struct UploadSession<C: Connector> {
    connector: C,
    target: OssTarget,
    state: SessionState<C::Client>,
    progress: ProgressFactory,
}

impl<C: Connector> UploadSession<C> {
    /// A disconnected session whose uploads print progress to stdout.
    pub fn new(connector: C, target: OssTarget) -> Self {
        Self {
            connector,
            target,
            state: SessionState::Disconnected,
            progress: Box::new(console_progress),
        }
    }

    pub fn with_progress(mut self, progress: ProgressFactory) -> Self {
        self.progress = progress;
        self
    }

    /// Drop progress output entirely.
    pub fn quiet(self) -> Self {
        self.with_progress(Box::new(no_progress))
    }

    pub fn state(&self) -> &SessionState<C::Client> {
        &self.state
    }

    /// Discard any current client and connect again.  On failure the error is
    /// printed and the session stays disconnected.
    #[instrument(skip(self), fields(endpoint = %self.target.endpoint, bucket = %self.target.bucket))]
    pub async fn initialize(&mut self) -> Result<()> {
        self.state = SessionState::Disconnected;

        match self.connector.connect(&self.target).await {
            Ok(client) => {
                info!("storage session connected");
                self.state = SessionState::Connected(client);
                Ok(())
            },
            Err(e) => {
                println!("Error: {e}");
                Err(e.into())
            },
        }
    }

    /// Upload `local_path` to `remote_key`, returning whether it succeeded.
    /// A disconnected session fails without contacting the store.
    pub async fn upload(&self, remote_key: &str, local_path: &Path) -> bool {
        let SessionState::Connected(client) = &self.state else {
            info!(remote_key, "upload skipped, session is disconnected");
            return false;
        };

        let listener = (self.progress)(&local_path.display().to_string());

        client
            .upload_file(remote_key, local_path, listener)
            .await
            .log_error(format!("upload of {local_path:?} to {remote_key} failed"))
            .is_ok()
    }
}

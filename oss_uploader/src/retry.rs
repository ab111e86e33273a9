use std::path::Path;
use std::time::Duration;

use error_printer::ErrorPrinter;
use oss_client::Connector;
use tracing::{debug, warn};

use crate::constants::{DEFAULT_MAX_RETRIES, DEFAULT_RETRY_DELAY};
use crate::session::UploadSession;

/// How often, and how far apart, a failed upload is tried again.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: usize,
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            delay: DEFAULT_RETRY_DELAY,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RetryState {
    Attempting,
    Succeeded,
    ExhaustedRetries,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RetryOutcome {
    pub state: RetryState,
    pub attempts: usize,
}

impl RetryOutcome {
    pub fn succeeded(&self) -> bool {
        self.state == RetryState::Succeeded
    }
}

/// Upload one file, reconnecting the session and trying again after each
/// failure until the policy's retry budget is spent.  Every failure is
/// treated the same way.
pub async fn upload_with_retry<C: Connector>(
    session: &mut UploadSession<C>,
    remote_key: &str,
    local_path: &Path,
    policy: &RetryPolicy,
) -> RetryOutcome {
    let mut state = RetryState::Attempting;
    let mut retries_left = policy.max_retries;
    let mut attempts = 0;

    while state == RetryState::Attempting {
        attempts += 1;
        debug!(remote_key, attempts, "uploading");

        if session.upload(remote_key, local_path).await {
            state = RetryState::Succeeded;
        } else if retries_left == 0 {
            warn!(remote_key, attempts, "giving up after exhausting retries");
            state = RetryState::ExhaustedRetries;
        } else {
            println!("Sleep {}s to retry", policy.delay.as_secs());
            tokio::time::sleep(policy.delay).await;

            let _ = session.initialize().await.warn_error("reconnect before retry failed");
            retries_left -= 1;
        }
    }

    RetryOutcome { state, attempts }
}

pub mod app;
pub mod constants;
pub mod errors;
pub mod file_listing;
pub mod logging;
pub mod retry;
pub mod session;
pub mod settings;
pub mod upload_run;

pub use errors::{Result, SettingsError, UploaderError};
pub use retry::{upload_with_retry, RetryOutcome, RetryPolicy, RetryState};
pub use session::{SessionState, UploadSession};
pub use settings::Settings;
pub use upload_run::{run_uploads, DeletionStatus, FileUploadReport, RunOptions, RunSummary};

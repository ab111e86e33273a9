use std::time::Duration;

// Naming convention
pub const PROGRAM_NAME: &str = "oss-uploader";
pub const LOG_FILE_PREFIX: &str = "oss-uploader";

// The current version of executable
pub const CURRENT_VERSION: &str = env!("CARGO_PKG_VERSION");

// Command line defaults
pub const DEFAULT_DEVICE_FILE: &str = "device.ini";
pub const DEFAULT_CONFIG_FILE: &str = "config.ini";
pub const DEFAULT_WORK_DIR: &str = "./";

// Configuration file layout
pub const DEVICE_SECTION: &str = "device";
pub const DEVICE_ID_KEY: &str = "device_id";
pub const UPLOAD_SECTION: &str = "upload";
pub const OSS_END_POINT_KEY: &str = "oss_end_point";
pub const OSS_BUCKET_KEY: &str = "oss_bucket";
pub const OSS_ACCESS_ID_KEY: &str = "oss_access_id";
pub const OSS_ACCESS_KEY_KEY: &str = "oss_access_key";

// Retry policy: 1 initial attempt plus this many retries, spaced by the delay.
pub const DEFAULT_MAX_RETRIES: usize = 5;
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(60);

/// Default log levels. Override using the `RUST_LOG` env variable.
pub const DEFAULT_LOG_LEVEL_FILE: &str = "info";
pub const DEFAULT_LOG_LEVEL_CONSOLE: &str = "warn";

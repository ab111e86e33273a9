// Multipart transfer layout
pub const DEFAULT_PART_SIZE: u64 = 100 * 1024;
pub const DEFAULT_UPLOAD_ROUTINES: usize = 3;
pub const MAX_PART_COUNT: u64 = 10_000;

// Resumable upload bookkeeping, stored next to the local file
pub const CHECKPOINT_SUFFIX: &str = ".cp";
pub const CHECKPOINT_MAGIC: &str = "oss-uploader/checkpoint/v1";

// Connection
pub const DEFAULT_ENDPOINT_SCHEME: &str = "http://";
pub const FALLBACK_SIGNING_REGION: &str = "us-east-1";
pub const CREDENTIALS_PROVIDER_NAME: &str = "oss-uploader";

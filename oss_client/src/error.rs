use thiserror::Error;

#[non_exhaustive]
#[derive(Error, Debug)]
pub enum OssClientError {
    #[error("Invalid Endpoint {endpoint:?}: {reason}")]
    InvalidEndpoint { endpoint: String, reason: String },

    #[error("Invalid Bucket Name {0:?}")]
    InvalidBucketName(String),

    #[error("IO Error: {0}")]
    IOError(#[from] std::io::Error),

    #[error("Checkpoint Error: {0}")]
    CheckpointError(String),

    #[error("Serialization Error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Service Error during {operation}: {message}")]
    ServiceError {
        operation: &'static str,
        code: Option<String>,
        message: String,
    },

    #[error("Missing {field} in {operation} response")]
    MissingResponseField {
        operation: &'static str,
        field: &'static str,
    },

    #[error("Error : {0}")]
    Other(String),
}

// Define our own result type here (this seems to be the standard).
pub type Result<T> = std::result::Result<T, OssClientError>;

impl OssClientError {
    /// The service-side error code, if the storage service returned one.
    pub fn service_code(&self) -> Option<&str> {
        match self {
            OssClientError::ServiceError { code, .. } => code.as_deref(),
            _ => None,
        }
    }

    /// True when the service no longer knows the multipart upload being resumed.
    pub fn is_missing_upload(&self) -> bool {
        self.service_code() == Some("NoSuchUpload")
    }
}

impl PartialEq for OssClientError {
    fn eq(&self, other: &OssClientError) -> bool {
        match (self, other) {
            (OssClientError::InvalidBucketName(a), OssClientError::InvalidBucketName(b)) => a == b,
            (e1, e2) => std::mem::discriminant(e1) == std::mem::discriminant(e2),
        }
    }
}

use std::fmt::Debug;

use aws_config::{BehaviorVersion, Region};
use aws_sdk_s3::config::{Credentials, RequestChecksumCalculation, ResponseChecksumValidation};
use aws_sdk_s3::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::{CompletedMultipartUpload, CompletedPart};
use aws_sdk_s3::Client as S3Client;
use bytes::Bytes;
use tracing::{debug, info};

use crate::checkpoint::CompletedPartRecord;
use crate::constants::CREDENTIALS_PROVIDER_NAME;
use crate::endpoint::{normalize_endpoint, signing_region, validate_bucket_name};
use crate::error::{OssClientError, Result};
use crate::file_uploader::FileUploader;
use crate::interface::{Connector, MultipartApi, OssTarget};

/// Talks to an S3-compatible object storage service for one bucket.
pub struct RemoteClient {
    s3_client: S3Client,
    bucket: String,
}

impl RemoteClient {
    /// Builds a client for `target`.  The endpoint and bucket name are checked
    /// locally; no request is sent and the credentials are not verified.
    pub async fn new(target: &OssTarget) -> Result<Self> {
        let endpoint = normalize_endpoint(&target.endpoint)?;
        validate_bucket_name(&target.bucket)?;

        let region = signing_region(&endpoint);
        let credentials =
            Credentials::new(&target.access_id, &target.access_key, None, None, CREDENTIALS_PROVIDER_NAME);

        let sdk_config = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(region.clone()))
            .credentials_provider(credentials)
            .load()
            .await;

        // S3-compatible services reject the default flexible-checksum trailers.
        let s3_config = aws_sdk_s3::config::Builder::from(&sdk_config)
            .endpoint_url(endpoint.as_str().trim_end_matches('/'))
            .force_path_style(false)
            .request_checksum_calculation(RequestChecksumCalculation::WhenRequired)
            .response_checksum_validation(ResponseChecksumValidation::WhenRequired)
            .build();

        info!("Connected to {endpoint} (region {region}), bucket {}", target.bucket);

        Ok(Self::from_client(S3Client::from_conf(s3_config), target.bucket.clone()))
    }

    /// Create a client from an existing S3Client.
    pub fn from_client(s3_client: S3Client, bucket: String) -> Self {
        Self { s3_client, bucket }
    }
}

fn service_error<E, R>(operation: &'static str, err: SdkError<E, R>) -> OssClientError
where
    E: ProvideErrorMetadata + std::error::Error + Send + Sync + 'static,
    R: Debug,
{
    match err.as_service_error() {
        Some(service_err) => OssClientError::ServiceError {
            operation,
            code: service_err.code().map(str::to_string),
            message: service_err.message().unwrap_or("No message").to_string(),
        },
        None => OssClientError::ServiceError {
            operation,
            code: None,
            message: DisplayErrorContext(&err).to_string(),
        },
    }
}

#[async_trait::async_trait]
impl MultipartApi for RemoteClient {
    fn bucket(&self) -> &str {
        &self.bucket
    }

    async fn put_object(&self, key: &str, body: Bytes) -> Result<()> {
        self.s3_client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(ByteStream::from(body))
            .send()
            .await
            .map_err(|e| service_error("PutObject", e))?;
        Ok(())
    }

    async fn create_multipart_upload(&self, key: &str) -> Result<String> {
        let output = self
            .s3_client
            .create_multipart_upload()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| service_error("CreateMultipartUpload", e))?;

        output
            .upload_id()
            .map(str::to_string)
            .ok_or(OssClientError::MissingResponseField {
                operation: "CreateMultipartUpload",
                field: "UploadId",
            })
    }

    async fn upload_part(&self, key: &str, upload_id: &str, part_number: i32, body: Bytes) -> Result<String> {
        let output = self
            .s3_client
            .upload_part()
            .bucket(&self.bucket)
            .key(key)
            .upload_id(upload_id)
            .part_number(part_number)
            .body(ByteStream::from(body))
            .send()
            .await
            .map_err(|e| service_error("UploadPart", e))?;

        debug!("Uploaded part {part_number} of {key}");

        output
            .e_tag()
            .map(str::to_string)
            .ok_or(OssClientError::MissingResponseField {
                operation: "UploadPart",
                field: "ETag",
            })
    }

    async fn complete_multipart_upload(&self, key: &str, upload_id: &str, parts: &[CompletedPartRecord]) -> Result<()> {
        let completed_parts = parts
            .iter()
            .map(|p| CompletedPart::builder().part_number(p.part_number).e_tag(&p.etag).build())
            .collect();

        self.s3_client
            .complete_multipart_upload()
            .bucket(&self.bucket)
            .key(key)
            .upload_id(upload_id)
            .multipart_upload(CompletedMultipartUpload::builder().set_parts(Some(completed_parts)).build())
            .send()
            .await
            .map_err(|e| service_error("CompleteMultipartUpload", e))?;
        Ok(())
    }
}

/// Connects [FileUploader]s backed by a [RemoteClient].
#[derive(Clone, Copy, Debug, Default)]
pub struct RemoteConnector;

#[async_trait::async_trait]
impl Connector for RemoteConnector {
    type Client = FileUploader<RemoteClient>;

    async fn connect(&self, target: &OssTarget) -> Result<Self::Client> {
        Ok(FileUploader::new(RemoteClient::new(target).await?))
    }
}

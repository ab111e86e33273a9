use url::{Host, Url};

use crate::constants::{DEFAULT_ENDPOINT_SCHEME, FALLBACK_SIGNING_REGION};
use crate::error::{OssClientError, Result};

/// Turns a user-supplied endpoint such as `oss-cn-hangzhou.aliyuncs.com` into
/// a full URL.  Endpoints without a scheme are assumed to be plain http.
pub fn normalize_endpoint(endpoint: &str) -> Result<Url> {
    let trimmed = endpoint.trim();
    let invalid = |reason: &str| OssClientError::InvalidEndpoint {
        endpoint: endpoint.to_string(),
        reason: reason.to_string(),
    };

    if trimmed.is_empty() {
        return Err(invalid("endpoint is empty"));
    }

    let with_scheme = if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        trimmed.to_string()
    } else {
        format!("{DEFAULT_ENDPOINT_SCHEME}{trimmed}")
    };

    let url = Url::parse(&with_scheme).map_err(|e| invalid(&e.to_string()))?;
    if url.host().is_none() {
        return Err(invalid("endpoint has no host"));
    }
    Ok(url)
}

/// The region used to sign requests against `endpoint`.
///
/// Regional endpoints carry the region in their first host label
/// (`oss-cn-hangzhou.aliyuncs.com` signs as `oss-cn-hangzhou`).  IP addresses
/// and single-label hosts fall back to a fixed region.
pub fn signing_region(endpoint: &Url) -> String {
    match endpoint.host() {
        Some(Host::Domain(domain)) => match domain.split_once('.') {
            Some((label, rest)) if !label.is_empty() && !rest.is_empty() => label.to_ascii_lowercase(),
            _ => FALLBACK_SIGNING_REGION.to_string(),
        },
        _ => FALLBACK_SIGNING_REGION.to_string(),
    }
}

/// Bucket names are 3 to 63 characters of lowercase letters, digits and
/// hyphens, and must start and end with a letter or digit.
pub fn validate_bucket_name(bucket: &str) -> Result<()> {
    let is_edge_char = |c: char| c.is_ascii_lowercase() || c.is_ascii_digit();
    let valid = (3..=63).contains(&bucket.len())
        && bucket.chars().all(|c| is_edge_char(c) || c == '-')
        && bucket.starts_with(is_edge_char)
        && bucket.ends_with(is_edge_char);

    if valid {
        Ok(())
    } else {
        Err(OssClientError::InvalidBucketName(bucket.to_string()))
    }
}

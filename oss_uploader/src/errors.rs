use std::path::PathBuf;

use oss_client::OssClientError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("Fail to find {path:?}: {source}")]
    Unreadable {
        path: PathBuf,
        #[source]
        source: ini::Error,
    },
}

#[derive(Error, Debug)]
#[non_exhaustive]
pub enum UploaderError {
    #[error("Configuration error: {0}")]
    Settings(#[from] SettingsError),

    #[error("Storage client error: {0}")]
    Client(#[from] OssClientError),
}

pub type Result<T> = std::result::Result<T, UploaderError>;

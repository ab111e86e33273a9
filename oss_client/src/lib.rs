#![cfg_attr(feature = "strict", deny(warnings))]

pub use crate::error::{OssClientError, Result};
pub use checkpoint::{checkpoint_path, CompletedPartRecord, FileStat, UploadCheckpoint};
pub use file_uploader::FileUploader;
pub use interface::{Connector, MultipartApi, OssTarget, UploadClient};
pub use memory_client::MemoryClient;
pub use remote_client::{RemoteClient, RemoteConnector};

mod checkpoint;
pub mod constants;
pub mod endpoint;
mod error;
mod file_uploader;
mod interface;
mod memory_client;
pub mod multipart;
mod remote_client;

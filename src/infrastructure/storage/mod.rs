use async_trait::async_trait;
use std::path::{Path, PathBuf};
use thiserror::Error;
use url::Url;

pub mod s3;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to initiate upload: {0}")]
    Initiate(String),
    #[error("failed to upload part {part}: {message}")]
    UploadPart { part: i32, message: String },
    #[error("failed to complete upload: {0}")]
    Complete(String),
    #[error("invalid public url: {0}")]
    PublicUrl(String),
}

/// Persists a local file and returns where it can be fetched from.
#[async_trait]
pub trait BlobStore: Send + Sync {
    async fn store(&self, local: &Path, key: &str) -> Result<Url, StorageError>;
}

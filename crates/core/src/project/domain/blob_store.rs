use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::shared::error::DubbingError;

#[derive(Error, Debug)]
pub enum BlobStoreError {
    #[error("blob {remote} not found")]
    NotFound { remote: String },
    #[error("local file {} not found", path.display())]
    LocalNotFound { path: PathBuf },
    #[error("blob store: {0}")]
    Backend(String),
}

/// Domain interface for remote object storage holding sources and artifacts.
pub trait BlobStore: Send + Sync {
    fn download(&self, remote_path: &str, local_path: &Path) -> Result<(), BlobStoreError>;

    /// Uploads and returns a link the project owner can open.
    fn upload(&self, local_path: &Path, remote_path: &str) -> Result<String, BlobStoreError>;
}

impl From<BlobStoreError> for DubbingError {
    fn from(err: BlobStoreError) -> Self {
        match err {
            BlobStoreError::NotFound { remote } => DubbingError::InputNotFound {
                path: remote.into(),
            },
            BlobStoreError::LocalNotFound { path } => DubbingError::InputNotFound { path },
            BlobStoreError::Backend(message) => DubbingError::Storage(message),
        }
    }
}

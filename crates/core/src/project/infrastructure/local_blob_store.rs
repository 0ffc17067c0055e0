use std::fs;
use std::path::{Path, PathBuf};

use crate::project::domain::blob_store::{BlobStore, BlobStoreError};

/// Blob store backed by a local directory; links are `file://` URLs.
pub struct LocalBlobStore {
    root: PathBuf,
}

impl LocalBlobStore {
    pub fn new(root: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
        }
    }

    fn resolve(&self, remote_path: &str) -> PathBuf {
        self.root.join(remote_path.trim_start_matches('/'))
    }
}

impl BlobStore for LocalBlobStore {
    fn download(&self, remote_path: &str, local_path: &Path) -> Result<(), BlobStoreError> {
        let source = self.resolve(remote_path);
        if !source.is_file() {
            return Err(BlobStoreError::NotFound {
                remote: remote_path.to_string(),
            });
        }
        copy(&source, local_path)
    }

    fn upload(&self, local_path: &Path, remote_path: &str) -> Result<String, BlobStoreError> {
        if !local_path.is_file() {
            return Err(BlobStoreError::LocalNotFound {
                path: local_path.to_path_buf(),
            });
        }
        let dest = self.resolve(remote_path);
        copy(local_path, &dest)?;
        Ok(format!("file://{}", dest.display()))
    }
}

fn copy(from: &Path, to: &Path) -> Result<(), BlobStoreError> {
    if let Some(parent) = to.parent() {
        fs::create_dir_all(parent)
            .map_err(|e| BlobStoreError::Backend(format!("creating {}: {e}", parent.display())))?;
    }
    fs::copy(from, to).map_err(|e| {
        BlobStoreError::Backend(format!("copying {} to {}: {e}", from.display(), to.display()))
    })?;
    Ok(())
}

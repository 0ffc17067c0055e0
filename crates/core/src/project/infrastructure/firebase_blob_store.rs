use std::path::Path;
use std::time::Duration;

use reqwest::Url;
use serde::Deserialize;

use crate::project::domain::blob_store::{BlobStore, BlobStoreError};
use crate::shared::http_download::download_to_file;

const FIREBASE_STORAGE_URL: &str = "https://firebasestorage.googleapis.com";

/// Firebase Cloud Storage through its REST API.
pub struct FirebaseBlobStore {
    base_url: String,
    bucket: String,
    token: Option<String>,
    client: reqwest::blocking::Client,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UploadResponse {
    #[serde(default)]
    download_tokens: Option<String>,
}

impl FirebaseBlobStore {
    pub fn new(bucket: &str, token: Option<String>) -> Result<Self, BlobStoreError> {
        Self::with_base_url(FIREBASE_STORAGE_URL, bucket, token)
    }

    pub fn with_base_url(
        base_url: &str,
        bucket: &str,
        token: Option<String>,
    ) -> Result<Self, BlobStoreError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(30 * 60))
            .build()
            .map_err(backend)?;
        Ok(Self {
            base_url: base_url.to_string(),
            bucket: bucket.to_string(),
            token,
            client,
        })
    }

    /// URL of one object; the name is a single path segment, so `/` is escaped.
    pub fn object_url(&self, remote_path: &str) -> Result<Url, BlobStoreError> {
        let mut url = self.bucket_url()?;
        url.path_segments_mut()
            .map_err(|_| BlobStoreError::Backend(format!("invalid base url {}", self.base_url)))?
            .push(remote_path);
        Ok(url)
    }

    fn bucket_url(&self) -> Result<Url, BlobStoreError> {
        let mut url = Url::parse(&self.base_url).map_err(backend)?;
        url.path_segments_mut()
            .map_err(|_| BlobStoreError::Backend(format!("invalid base url {}", self.base_url)))?
            .pop_if_empty()
            .extend(["v0", "b", self.bucket.as_str(), "o"]);
        Ok(url)
    }

    fn authorize(
        &self,
        request: reqwest::blocking::RequestBuilder,
    ) -> reqwest::blocking::RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }
}

impl BlobStore for FirebaseBlobStore {
    fn download(&self, remote_path: &str, local_path: &Path) -> Result<(), BlobStoreError> {
        let mut url = self.object_url(remote_path)?;
        url.query_pairs_mut().append_pair("alt", "media");
        let request = self.authorize(self.client.get(url.clone()));
        download_to_file(request, url.as_str(), local_path, None).map_err(|e| {
            if e.is_not_found() {
                BlobStoreError::NotFound {
                    remote: remote_path.to_string(),
                }
            } else {
                backend(e)
            }
        })
    }

    fn upload(&self, local_path: &Path, remote_path: &str) -> Result<String, BlobStoreError> {
        let bytes = std::fs::read(local_path).map_err(|_| BlobStoreError::LocalNotFound {
            path: local_path.to_path_buf(),
        })?;
        let mut url = self.bucket_url()?;
        url.query_pairs_mut().append_pair("name", remote_path);

        let response: UploadResponse = self
            .authorize(self.client.post(url))
            .header("Content-Type", content_type(remote_path))
            .body(bytes)
            .send()
            .map_err(backend)?
            .error_for_status()
            .map_err(backend)?
            .json()
            .map_err(backend)?;

        let mut link = self.object_url(remote_path)?;
        link.query_pairs_mut().append_pair("alt", "media");
        if let Some(token) = response.download_tokens.as_deref().and_then(|t| t.split(',').next()) {
            link.query_pairs_mut().append_pair("token", token);
        }
        Ok(link.to_string())
    }
}

fn content_type(remote_path: &str) -> &'static str {
    let ext = Path::new(remote_path)
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_lowercase);
    match ext.as_deref() {
        Some("mp4") | Some("m4v") => "video/mp4",
        Some("mov") => "video/quicktime",
        Some("webm") => "video/webm",
        Some("mkv") => "video/x-matroska",
        Some("mp3") => "audio/mpeg",
        Some("wav") => "audio/wav",
        Some("ogg") | Some("opus") => "audio/ogg",
        _ => "application/octet-stream",
    }
}

fn backend(e: impl std::fmt::Display) -> BlobStoreError {
    BlobStoreError::Backend(e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_object_url_escapes_slashes() {
        let store = FirebaseBlobStore::new("dubbing.appspot.com", None).unwrap();
        let url = store.object_url("user/proj/clip.mp4").unwrap();
        assert_eq!(
            url.as_str(),
            "https://firebasestorage.googleapis.com/v0/b/dubbing.appspot.com/o/user%2Fproj%2Fclip.mp4"
        );
    }

    #[rstest]
    #[case("a/b/clip.MP4", "video/mp4")]
    #[case("voice.ogg", "audio/ogg")]
    #[case("dubbed.wav", "audio/wav")]
    #[case("blob", "application/octet-stream")]
    fn test_content_type(#[case] path: &str, #[case] expected: &str) {
        assert_eq!(content_type(path), expected);
    }

    #[test]
    fn test_upload_missing_local_file() {
        let store = FirebaseBlobStore::with_base_url("http://127.0.0.1:9", "bucket", None).unwrap();
        let err = store
            .upload(Path::new("/nonexistent/dubbed.wav"), "x/y.wav")
            .unwrap_err();
        assert!(matches!(err, BlobStoreError::LocalNotFound { .. }));
    }
}

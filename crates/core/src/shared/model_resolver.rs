use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::shared::http_download::{download_to_file, DownloadError, ProgressFn};

#[derive(Error, Debug)]
pub enum ModelResolveError {
    #[error("failed to create cache directory: {0}")]
    CacheDir(#[source] std::io::Error),
    #[error(transparent)]
    Download(#[from] DownloadError),
    #[error("could not determine cache directory")]
    NoCacheDir,
}

/// Resolve a model file by name, checking cache locations before downloading.
///
/// Resolution order:
/// 1. Explicit model directory (from configuration)
/// 2. User cache directory (platform-specific)
/// 3. Download from URL to the user cache
pub fn resolve(
    name: &str,
    url: &str,
    model_dir: Option<&Path>,
    progress: Option<ProgressFn>,
) -> Result<PathBuf, ModelResolveError> {
    if let Some(found) = model_dir.map(|d| d.join(name)).filter(|p| p.exists()) {
        return Ok(found);
    }

    let cache_dir = model_cache_dir()?;
    let cached_path = cache_dir.join(name);
    if cached_path.exists() {
        return Ok(cached_path);
    }

    fs::create_dir_all(&cache_dir).map_err(ModelResolveError::CacheDir)?;
    log::info!("Downloading {name} from {url}");
    let client = reqwest::blocking::Client::builder()
        .timeout(None)
        .build()
        .map_err(|e| DownloadError::Request {
            url: url.to_string(),
            source: e,
        })?;
    download_to_file(client.get(url), url, &cached_path, progress.as_ref())?;
    Ok(cached_path)
}

/// Platform-specific model cache directory, e.g. `~/.cache/Dubbing/models/`.
pub fn model_cache_dir() -> Result<PathBuf, ModelResolveError> {
    #[cfg(target_os = "macos")]
    {
        dirs::data_dir()
            .map(|d| d.join("Dubbing").join("models"))
            .ok_or(ModelResolveError::NoCacheDir)
    }
    #[cfg(not(target_os = "macos"))]
    {
        dirs::cache_dir()
            .map(|d| d.join("Dubbing").join("models"))
            .ok_or(ModelResolveError::NoCacheDir)
    }
}

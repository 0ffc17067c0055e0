use std::path::Path;
use std::time::Duration;

use crate::shared::error::BoxError;
use crate::shared::http_download::download_to_file;
use crate::voice::domain::voice_catalog::{CatalogVoice, VoiceCatalog};

/// Voice catalog read from a JSON file, with samples served over HTTP.
///
/// The file holds an array of `{"voice_id", "sample", "languages"}` entries;
/// `sample` is resolved against `base_url`.
pub struct JsonVoiceCatalog {
    voices: Vec<CatalogVoice>,
    base_url: String,
    client: reqwest::blocking::Client,
}

impl JsonVoiceCatalog {
    pub fn load(path: &Path, base_url: &str) -> Result<Self, BoxError> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| format!("reading voice catalog {}: {e}", path.display()))?;
        let voices: Vec<CatalogVoice> = serde_json::from_str(&raw)
            .map_err(|e| format!("parsing voice catalog {}: {e}", path.display()))?;
        log::debug!("Loaded {} catalog voices from {}", voices.len(), path.display());
        Self::from_voices(voices, base_url)
    }

    pub fn from_voices(voices: Vec<CatalogVoice>, base_url: &str) -> Result<Self, BoxError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(120))
            .build()?;
        Ok(Self {
            voices,
            base_url: base_url.to_string(),
            client,
        })
    }

    pub fn sample_url(&self, voice: &CatalogVoice) -> String {
        if self.base_url.ends_with('/') {
            format!("{}{}", self.base_url, voice.sample)
        } else {
            format!("{}/{}", self.base_url, voice.sample)
        }
    }
}

impl VoiceCatalog for JsonVoiceCatalog {
    fn voices(&self) -> &[CatalogVoice] {
        &self.voices
    }

    fn fetch_sample(&self, voice: &CatalogVoice, dest: &Path) -> Result<(), BoxError> {
        let url = self.sample_url(voice);
        log::info!("Downloading voice {} from {url}", voice.voice_id);
        download_to_file(self.client.get(&url), &url, dest, None)?;
        Ok(())
    }
}

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::audio::domain::audio_timeline::{SynthesisMode, TimelineSettings};
use crate::audio::domain::silence_detector::SilenceDetection;
use crate::pipeline::dub_project_use_case::PipelineSettings;
use crate::shared::constants::{
    DEFAULT_SEGMENT_PAUSE_MS, DEFAULT_VOICE_SAMPLE_BASE_URL, OUTPUT_SAMPLE_RATE,
    WHISPER_MODEL_FILENAME, WHISPER_MODEL_URL,
};
use crate::translation::domain::segment_translation::TranslationSettings;

const APP_DIR: &str = "Dubbing";
const DEFAULT_SYNTHESIS_URL: &str = "http://127.0.0.1:8020/synthesize";
const DEFAULT_FIRESTORE_COLLECTION: &str = "miniProjects";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed config {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TranslatorBackend {
    #[default]
    Google,
    Microsoft,
}

impl std::fmt::Display for TranslatorBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TranslatorBackend::Google => write!(f, "google"),
            TranslatorBackend::Microsoft => write!(f, "microsoft"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum BlobStoreConfig {
    /// Blob paths resolve under a local directory.
    Local { root: PathBuf },
    Firebase {
        bucket: String,
        #[serde(default)]
        token: String,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ProjectStoreConfig {
    /// One JSON document per project in a local directory.
    Local { dir: PathBuf },
    Firestore {
        project: String,
        #[serde(default = "default_collection")]
        collection: String,
        #[serde(default)]
        token: String,
    },
}

fn default_collection() -> String {
    DEFAULT_FIRESTORE_COLLECTION.to_string()
}

/// Everything a dubbing process needs to know, loaded once at startup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DubbingConfig {
    /// Per-project scratch directories are created under this one.
    pub processing_dir: PathBuf,
    pub translator: TranslatorBackend,
    pub microsoft_key: String,
    pub microsoft_region: String,
    pub translation: TranslationSettings,
    pub synthesis_mode: SynthesisMode,
    pub segment_pause_ms: u32,
    pub silence: SilenceDetection,
    pub synthesis_url: String,
    /// No diarization service means every segment is spoken by speaker 0.
    pub diarization_url: Option<String>,
    pub voice_catalog_path: PathBuf,
    pub voice_sample_base_url: String,
    pub blob_store: BlobStoreConfig,
    pub project_store: ProjectStoreConfig,
    pub whisper_model: String,
    pub whisper_model_url: String,
    pub model_dir: Option<PathBuf>,
    pub error_webhook_url: Option<String>,
    /// Failures go to Sentry instead of the webhook when set.
    pub sentry_dsn: Option<String>,
    pub remove_original_audio: bool,
    /// Level of the original soundtrack when it is kept under the dub.
    pub original_audio_gain: f32,
    /// Concurrent jobs in batch mode.
    pub workers: usize,
}

impl Default for DubbingConfig {
    fn default() -> Self {
        let data_dir = dirs::data_dir()
            .unwrap_or_else(std::env::temp_dir)
            .join(APP_DIR);
        Self {
            processing_dir: std::env::temp_dir().join(APP_DIR).join("processing"),
            translator: TranslatorBackend::default(),
            microsoft_key: String::new(),
            microsoft_region: String::new(),
            translation: TranslationSettings::default(),
            synthesis_mode: SynthesisMode::default(),
            segment_pause_ms: DEFAULT_SEGMENT_PAUSE_MS,
            silence: SilenceDetection::default(),
            synthesis_url: DEFAULT_SYNTHESIS_URL.to_string(),
            diarization_url: None,
            voice_catalog_path: data_dir.join("voices.json"),
            voice_sample_base_url: DEFAULT_VOICE_SAMPLE_BASE_URL.to_string(),
            blob_store: BlobStoreConfig::Local {
                root: data_dir.join("blobs"),
            },
            project_store: ProjectStoreConfig::Local {
                dir: data_dir.join("projects"),
            },
            whisper_model: WHISPER_MODEL_FILENAME.to_string(),
            whisper_model_url: WHISPER_MODEL_URL.to_string(),
            model_dir: None,
            error_webhook_url: None,
            sentry_dsn: None,
            remove_original_audio: true,
            original_audio_gain: 0.3,
            workers: 2,
        }
    }
}

impl DubbingConfig {
    /// `<config dir>/Dubbing/config.json`, when the platform has one.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join(APP_DIR).join("config.json"))
    }

    /// Reads `path`. A missing file yields the defaults; a malformed one is
    /// an error.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let json = match fs::read_to_string(path) {
            Ok(json) => json,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::debug!("No config at {}, using defaults", path.display());
                return Ok(Self::default());
            }
            Err(source) => {
                return Err(ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };
        serde_json::from_str(&json).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn pipeline_settings(&self) -> PipelineSettings {
        PipelineSettings {
            scratch_root: self.processing_dir.clone(),
            translation: self.translation,
            timeline: TimelineSettings {
                mode: self.synthesis_mode,
                segment_pause_ms: self.segment_pause_ms,
                silence: self.silence,
                sample_rate: OUTPUT_SAMPLE_RATE,
            },
            remove_original_audio: self.remove_original_audio,
        }
    }
}

use std::sync::Arc;

use dubbing_core::audio::domain::diarizer::Diarizer;
use dubbing_core::audio::infrastructure::http_diarizer::HttpDiarizer;
use dubbing_core::audio::infrastructure::http_synthesizer::HttpSynthesizer;
use dubbing_core::audio::infrastructure::whisper_recognizer::WhisperRecognizer;
use dubbing_core::pipeline::dub_project_use_case::DubbingServices;
use dubbing_core::project::domain::blob_store::BlobStore;
use dubbing_core::project::domain::error_reporter::{ErrorReporter, NullErrorReporter};
use dubbing_core::project::domain::project_store::ProjectStore;
use dubbing_core::project::infrastructure::firebase_blob_store::FirebaseBlobStore;
use dubbing_core::project::infrastructure::firestore_project_store::FirestoreProjectStore;
use dubbing_core::project::infrastructure::json_project_store::JsonProjectStore;
use dubbing_core::project::infrastructure::local_blob_store::LocalBlobStore;
use dubbing_core::project::infrastructure::sentry_error_reporter::SentryErrorReporter;
use dubbing_core::project::infrastructure::webhook_error_reporter::WebhookErrorReporter;
use dubbing_core::shared::config::{
    BlobStoreConfig, DubbingConfig, ProjectStoreConfig, TranslatorBackend,
};
use dubbing_core::shared::error::BoxError;
use dubbing_core::shared::model_resolver;
use dubbing_core::translation::domain::translator::Translator;
use dubbing_core::translation::infrastructure::google_translator::GoogleTranslator;
use dubbing_core::translation::infrastructure::microsoft_translator::MicrosoftTranslator;
use dubbing_core::video::domain::audio_reader::AudioReader;
use dubbing_core::video::infrastructure::ffmpeg_audio_reader::FfmpegAudioReader;
use dubbing_core::video::infrastructure::ffmpeg_muxer::FfmpegMuxer;
use dubbing_core::video::infrastructure::wav_audio_writer::WavAudioWriter;
use dubbing_core::voice::infrastructure::json_voice_catalog::JsonVoiceCatalog;

/// Builds every service handle once; jobs share them read-only.
pub fn build_services(config: &DubbingConfig) -> Result<DubbingServices, BoxError> {
    let audio_reader: Arc<dyn AudioReader> = Arc::new(FfmpegAudioReader);

    log::info!("Resolving model: {}", config.whisper_model);
    let model_path = model_resolver::resolve(
        &config.whisper_model,
        &config.whisper_model_url,
        config.model_dir.as_deref(),
        Some(Box::new(download_progress)),
    )?;
    eprintln!();
    let recognizer = WhisperRecognizer::new(&model_path, audio_reader.clone())?;

    let diarizer = match &config.diarization_url {
        Some(url) => Some(Arc::new(HttpDiarizer::new(url)?) as Arc<dyn Diarizer>),
        None => None,
    };

    Ok(DubbingServices {
        blob_store: build_blob_store(config)?,
        project_store: build_project_store(config)?,
        recognizer: Arc::new(recognizer),
        diarizer,
        translator: build_translator(config)?,
        synthesizer: Arc::new(HttpSynthesizer::new(&config.synthesis_url)?),
        voice_catalog: Arc::new(load_catalog(config)?),
        audio_reader,
        audio_writer: Arc::new(WavAudioWriter),
        muxer: Arc::new(FfmpegMuxer::new(config.original_audio_gain)),
        error_reporter: build_error_reporter(config)?,
    })
}

pub fn load_catalog(config: &DubbingConfig) -> Result<JsonVoiceCatalog, BoxError> {
    JsonVoiceCatalog::load(&config.voice_catalog_path, &config.voice_sample_base_url)
}

fn build_translator(config: &DubbingConfig) -> Result<Arc<dyn Translator>, BoxError> {
    let translator: Arc<dyn Translator> = match config.translator {
        TranslatorBackend::Google => Arc::new(GoogleTranslator::new()?),
        TranslatorBackend::Microsoft => Arc::new(MicrosoftTranslator::new(
            &config.microsoft_key,
            &config.microsoft_region,
        )?),
    };
    Ok(translator)
}

fn build_blob_store(config: &DubbingConfig) -> Result<Arc<dyn BlobStore>, BoxError> {
    let store: Arc<dyn BlobStore> = match &config.blob_store {
        BlobStoreConfig::Local { root } => Arc::new(LocalBlobStore::new(root)),
        BlobStoreConfig::Firebase { bucket, token } => {
            Arc::new(FirebaseBlobStore::new(bucket, non_empty(token))?)
        }
    };
    Ok(store)
}

fn build_project_store(config: &DubbingConfig) -> Result<Arc<dyn ProjectStore>, BoxError> {
    let store: Arc<dyn ProjectStore> = match &config.project_store {
        ProjectStoreConfig::Local { dir } => Arc::new(JsonProjectStore::new(dir)),
        ProjectStoreConfig::Firestore {
            project,
            collection,
            token,
        } => Arc::new(FirestoreProjectStore::new(
            project,
            collection,
            non_empty(token),
        )?),
    };
    Ok(store)
}

fn build_error_reporter(config: &DubbingConfig) -> Result<Arc<dyn ErrorReporter>, BoxError> {
    let reporter: Arc<dyn ErrorReporter> = match (&config.sentry_dsn, &config.error_webhook_url) {
        (Some(_), _) => Arc::new(SentryErrorReporter),
        (None, Some(url)) => Arc::new(WebhookErrorReporter::new(url)?),
        (None, None) => Arc::new(NullErrorReporter),
    };
    Ok(reporter)
}

/// Creates the local project document when it does not exist yet.
pub fn ensure_local_project(config: &DubbingConfig, project_id: &str) -> Result<(), BoxError> {
    match &config.project_store {
        ProjectStoreConfig::Local { dir } => {
            let store = JsonProjectStore::new(dir);
            if store.load(project_id).is_err() {
                log::info!("[{project_id}] Creating project document in {}", dir.display());
                store.create(project_id)?;
            }
            Ok(())
        }
        ProjectStoreConfig::Firestore { .. } => {
            Err("--create-project only works with the local project store".into())
        }
    }
}

fn non_empty(value: &str) -> Option<String> {
    Some(value.trim())
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn download_progress(downloaded: u64, total: u64) {
    if total > 0 {
        let pct = (downloaded as f64 / total as f64 * 100.0) as u32;
        eprint!("\rDownloading speech recognition model... {pct}%");
    } else {
        eprint!("\rDownloading speech recognition model... {downloaded} bytes");
    }
}

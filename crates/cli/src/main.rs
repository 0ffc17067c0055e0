mod services;

use std::fs;
use std::path::{Path, PathBuf};
use std::process;
use std::sync::Arc;

use clap::{Parser, Subcommand};

use dubbing_core::pipeline::dub_project_use_case::DubProjectUseCase;
use dubbing_core::pipeline::dubbing_request::DubbingRequest;
use dubbing_core::pipeline::infrastructure::threaded_pipeline_executor::ThreadedPipelineExecutor;
use dubbing_core::pipeline::pipeline_executor::{LoggerFactory, PipelineExecutor};
use dubbing_core::pipeline::pipeline_logger::{PipelineLogger, StdoutPipelineLogger};
use dubbing_core::shared::config::{DubbingConfig, TranslatorBackend};
use dubbing_core::shared::error::BoxError;
use dubbing_core::video::domain::media_kind::MediaKind;
use dubbing_core::voice::domain::voice_catalog::VoiceCatalog;

/// Dub videos and audio into another language.
#[derive(Parser)]
#[command(name = "dub")]
struct Cli {
    /// Config file (defaults to <config dir>/Dubbing/config.json).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Microsoft Translator subscription key.
    #[arg(long, env = "MICROSOFT_TRANSLATOR_API_KEY", hide_env_values = true, global = true)]
    microsoft_key: Option<String>,

    /// Microsoft Translator resource region.
    #[arg(long, env = "MICROSOFT_TRANSLATOR_REGION", global = true)]
    microsoft_region: Option<String>,

    /// Sentry DSN for failure reports.
    #[arg(long, env = "SENTRY_DSN", hide_env_values = true, global = true)]
    sentry_dsn: Option<String>,

    /// Bearer token for the blob and project stores.
    #[arg(long, env = "DUBBING_STORAGE_TOKEN", hide_env_values = true, global = true)]
    storage_token: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Dub a single project.
    Run {
        #[arg(long)]
        project_id: String,

        /// Target language code, e.g. "fr".
        #[arg(long)]
        language: String,

        /// Blob-store path of the source video or audio.
        #[arg(long)]
        source: String,

        /// Catalog voices, one per speaker in order of first appearance (comma-separated).
        #[arg(long, value_delimiter = ',')]
        voice_ids: Option<Vec<u32>>,

        /// Clone each speaker's own voice from the source.
        #[arg(long)]
        cloning: bool,

        /// Expected number of distinct speakers.
        #[arg(long)]
        speakers: Option<usize>,

        /// Blob-store path of a voice sample to use for every speaker.
        #[arg(long)]
        reference_voice: Option<String>,

        /// Create the project document first (local project store only).
        #[arg(long)]
        create_project: bool,
    },
    /// Dub many projects concurrently from a JSON array of requests.
    Batch {
        requests: PathBuf,

        /// Concurrent jobs (defaults to the configured worker count).
        #[arg(long)]
        workers: Option<usize>,
    },
    /// List catalog voices.
    Voices {
        /// Only voices that speak this language.
        #[arg(long)]
        language: Option<String>,
    },
}

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run() -> Result<(), BoxError> {
    let cli = Cli::parse();
    let config = load_config(&cli)?;
    let _sentry = init_sentry(&config);

    match cli.command {
        Command::Run {
            project_id,
            language,
            source,
            voice_ids,
            cloning,
            speakers,
            reference_voice,
            create_project,
        } => {
            let request = DubbingRequest {
                voice_ids: voice_ids.unwrap_or_default(),
                cloning,
                expected_speakers: speakers,
                reference_voice_location: reference_voice,
                ..DubbingRequest::new(&project_id, &language, &source)
            };
            validate_request(&request)?;
            validate_config(&config)?;
            if create_project {
                services::ensure_local_project(&config, &project_id)?;
            }
            run_single(&config, &request)
        }
        Command::Batch { requests, workers } => {
            let requests = read_requests(&requests)?;
            for request in &requests {
                validate_request(request)?;
            }
            validate_config(&config)?;
            run_batch(&config, requests, workers.unwrap_or(config.workers))
        }
        Command::Voices { language } => list_voices(&config, language.as_deref()),
    }
}

fn init_sentry(config: &DubbingConfig) -> sentry::ClientInitGuard {
    let dsn = config
        .sentry_dsn
        .as_deref()
        .and_then(|raw| match raw.parse::<sentry::types::Dsn>() {
            Ok(dsn) => Some(dsn),
            Err(e) => {
                log::warn!("Ignoring invalid Sentry DSN: {e}");
                None
            }
        });
    sentry::init(sentry::ClientOptions {
        dsn,
        release: sentry::release_name!(),
        environment: Some(
            if cfg!(debug_assertions) {
                "development"
            } else {
                "production"
            }
            .into(),
        ),
        attach_stacktrace: true,
        ..Default::default()
    })
}

fn run_single(
    config: &DubbingConfig,
    request: &DubbingRequest,
) -> Result<(), BoxError> {
    let use_case = DubProjectUseCase::new(
        services::build_services(config)?,
        config.pipeline_settings(),
    );
    let mut logger = StdoutPipelineLogger::new();
    let outcome = use_case.execute(request, &mut logger)?;
    log::info!(
        "Dubbed {} segments for project {}",
        outcome.segments.len(),
        request.project_id
    );
    println!("{}", outcome.translated_file_link);
    Ok(())
}

fn run_batch(
    config: &DubbingConfig,
    requests: Vec<DubbingRequest>,
    workers: usize,
) -> Result<(), BoxError> {
    let total = requests.len();
    let use_case = Arc::new(DubProjectUseCase::new(
        services::build_services(config)?,
        config.pipeline_settings(),
    ));
    let make_logger: Arc<LoggerFactory> = Arc::new(|_: &DubbingRequest| {
        Box::new(StdoutPipelineLogger::new()) as Box<dyn PipelineLogger>
    });

    let executor = ThreadedPipelineExecutor::new(workers);
    log::info!("Running {total} jobs on {} workers", executor.workers());
    let reports = executor.execute(use_case, requests, make_logger)?;

    let mut failed = 0;
    for report in &reports {
        match &report.result {
            Ok(outcome) => println!("{}\t{}", report.project_id, outcome.translated_file_link),
            Err(e) => {
                failed += 1;
                println!("{}\terror: {e}", report.project_id);
            }
        }
    }
    if failed > 0 {
        return Err(format!("{failed} of {total} jobs failed").into());
    }
    Ok(())
}

fn list_voices(
    config: &DubbingConfig,
    language: Option<&str>,
) -> Result<(), BoxError> {
    let catalog = services::load_catalog(config)?;
    let voices = catalog
        .voices()
        .iter()
        .filter(|voice| language.map_or(true, |lang| voice.speaks(lang)));
    for voice in voices {
        println!(
            "{}\t{}\t{}",
            voice.voice_id,
            voice.sample,
            voice.languages.join(",")
        );
    }
    Ok(())
}

fn load_config(cli: &Cli) -> Result<DubbingConfig, BoxError> {
    let path = match &cli.config {
        Some(path) => {
            if !path.exists() {
                return Err(format!("Config file not found: {}", path.display()).into());
            }
            path.clone()
        }
        None => match DubbingConfig::default_path() {
            Some(path) => path,
            None => return Ok(apply_overrides(DubbingConfig::default(), cli)),
        },
    };
    log::debug!("Loading config from {}", path.display());
    Ok(apply_overrides(DubbingConfig::load(&path)?, cli))
}

fn apply_overrides(mut config: DubbingConfig, cli: &Cli) -> DubbingConfig {
    if let Some(key) = &cli.microsoft_key {
        config.microsoft_key = key.clone();
    }
    if let Some(region) = &cli.microsoft_region {
        config.microsoft_region = region.clone();
    }
    if let Some(dsn) = &cli.sentry_dsn {
        config.sentry_dsn = Some(dsn.clone());
    }
    if let Some(token) = &cli.storage_token {
        set_storage_token(&mut config, token);
    }
    config
}

fn set_storage_token(config: &mut DubbingConfig, value: &str) {
    use dubbing_core::shared::config::{BlobStoreConfig, ProjectStoreConfig};

    if let BlobStoreConfig::Firebase { token, .. } = &mut config.blob_store {
        *token = value.to_string();
    }
    if let ProjectStoreConfig::Firestore { token, .. } = &mut config.project_store {
        *token = value.to_string();
    }
}

fn read_requests(path: &Path) -> Result<Vec<DubbingRequest>, BoxError> {
    if !path.exists() {
        return Err(format!("Requests file not found: {}", path.display()).into());
    }
    let json = fs::read_to_string(path)?;
    let requests: Vec<DubbingRequest> = serde_json::from_str(&json)
        .map_err(|e| format!("Malformed requests file {}: {e}", path.display()))?;
    if requests.is_empty() {
        return Err(format!("No requests in {}", path.display()).into());
    }
    Ok(requests)
}

fn validate_request(request: &DubbingRequest) -> Result<(), BoxError> {
    let id = &request.project_id;
    if id.trim().is_empty() {
        return Err("Project id must not be empty".into());
    }
    if request.target_language.trim().is_empty() {
        return Err(format!("[{id}] Target language must not be empty").into());
    }
    if !MediaKind::is_supported(Path::new(&request.source_location)) {
        return Err(format!(
            "[{id}] Unsupported source file type: {}",
            request.source_location
        )
        .into());
    }
    if request.expected_speakers == Some(0) {
        return Err(format!("[{id}] Speaker count must be at least 1").into());
    }
    if request.cloning && !request.voice_ids.is_empty() {
        log::warn!("[{id}] Voice cloning takes precedence over --voice-ids");
    }
    Ok(())
}

fn validate_config(config: &DubbingConfig) -> Result<(), BoxError> {
    if config.translator == TranslatorBackend::Microsoft && config.microsoft_key.trim().is_empty() {
        return Err(
            "Microsoft translator selected but no key configured (MICROSOFT_TRANSLATOR_API_KEY)"
                .into(),
        );
    }
    if config.translation.max_chunk_len == 0 {
        return Err("Max chunk length must be positive".into());
    }
    if !(0.0..=1.0).contains(&config.original_audio_gain) {
        return Err(format!(
            "Original audio gain must be between 0.0 and 1.0, got {}",
            config.original_audio_gain
        )
        .into());
    }
    if config.workers == 0 {
        return Err("Worker count must be at least 1".into());
    }
    Ok(())
}

use std::path::PathBuf;

use thiserror::Error;

use crate::pipeline::job_stage::InvalidTransition;
use crate::segment::domain::text_segment::SegmentError;

/// Error type returned by collaborator ports (recognizer, translator, ...).
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Failure of a dubbing job, as surfaced at the orchestrator boundary.
#[derive(Error, Debug)]
pub enum DubbingError {
    #[error("input not found: {}", path.display())]
    InputNotFound { path: PathBuf },
    #[error("translation failed for chunk {chunk_index}: {reason}")]
    TranslationFailure { chunk_index: usize, reason: String },
    #[error("translation produced {actual} segments, expected {expected}")]
    ReassemblyMismatch { expected: usize, actual: usize },
    #[error("synthesis failed for {context}: {reason}")]
    SynthesisFailure { context: String, reason: String },
    #[error("{speakers} speakers detected but {voice_ids} voice ids supplied")]
    AssignmentPrecondition { speakers: usize, voice_ids: usize },
    #[error("project {project_id} does not exist")]
    ProjectNotFound { project_id: String },
    #[error(transparent)]
    InvalidSegment(#[from] SegmentError),
    #[error(transparent)]
    Transition(#[from] InvalidTransition),
    #[error("speech recognition failed: {0}")]
    Recognition(String),
    #[error("diarization failed: {0}")]
    Diarization(String),
    #[error("voice catalog: {0}")]
    VoiceCatalog(String),
    #[error("storage: {0}")]
    Storage(String),
    #[error("audio processing failed: {0}")]
    Audio(String),
    #[error("muxing failed: {0}")]
    Muxing(String),
    #[error("I/O error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl DubbingError {
    /// Short machine-readable kind, used when forwarding to monitoring.
    pub fn kind(&self) -> &'static str {
        match self {
            DubbingError::InputNotFound { .. } => "input_not_found",
            DubbingError::TranslationFailure { .. } => "translation_failure",
            DubbingError::ReassemblyMismatch { .. } => "reassembly_mismatch",
            DubbingError::SynthesisFailure { .. } => "synthesis_failure",
            DubbingError::AssignmentPrecondition { .. } => "assignment_precondition",
            DubbingError::ProjectNotFound { .. } => "project_not_found",
            DubbingError::InvalidSegment(_) => "invalid_segment",
            DubbingError::Transition(_) => "invalid_transition",
            DubbingError::Recognition(_) => "recognition",
            DubbingError::Diarization(_) => "diarization",
            DubbingError::VoiceCatalog(_) => "voice_catalog",
            DubbingError::Storage(_) => "storage",
            DubbingError::Audio(_) => "audio",
            DubbingError::Muxing(_) => "muxing",
            DubbingError::Io { .. } => "io",
        }
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        DubbingError::Io {
            path: path.into(),
            source,
        }
    }
}

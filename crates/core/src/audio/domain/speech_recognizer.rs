use std::path::Path;

use super::audio_segment::AudioSegment;
use crate::segment::domain::text_segment::TextSegment;
use crate::shared::error::BoxError;

/// Recognized segments plus the decoded waveform they were recognized from.
///
/// The waveform is kept so voice cloning can cut reference samples out of it
/// without decoding the source a second time.
#[derive(Clone, Debug)]
pub struct Transcription {
    pub segments: Vec<TextSegment>,
    pub audio: AudioSegment,
}

/// Domain interface for speech-to-text transcription.
///
/// Implementations load their model once and are shared read-only across jobs.
pub trait SpeechRecognizer: Send + Sync {
    fn transcribe(&self, media_path: &Path) -> Result<Transcription, BoxError>;
}

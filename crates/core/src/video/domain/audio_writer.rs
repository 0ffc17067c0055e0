use std::path::Path;

use crate::audio::domain::audio_segment::AudioSegment;
use crate::shared::error::BoxError;

/// Domain interface for encoding an AudioSegment to a standalone audio file.
pub trait AudioWriter: Send + Sync {
    fn write_audio(&self, path: &Path, audio: &AudioSegment) -> Result<(), BoxError>;
}

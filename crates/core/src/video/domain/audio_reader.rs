use std::path::Path;

use crate::audio::domain::audio_segment::AudioSegment;
use crate::shared::error::BoxError;

/// Domain interface for decoding the audio track of a media file.
pub trait AudioReader: Send + Sync {
    /// Decode the audio track to a mono PCM AudioSegment at the given sample rate.
    /// Returns None if the file has no audio track.
    fn read_audio(
        &self,
        path: &Path,
        target_sample_rate: u32,
    ) -> Result<Option<AudioSegment>, BoxError>;
}

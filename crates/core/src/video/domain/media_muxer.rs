use std::path::{Path, PathBuf};

use crate::segment::domain::text_segment::TextSegmentWithAudioTimestamp;
use crate::shared::error::BoxError;

/// Overlays a dubbed audio track onto a video.
pub trait MediaMuxer: Send + Sync {
    /// Writes a copy of `video_path` to `output_path` whose audio is the dubbed
    /// track, with each segment's span moved back to its original start time.
    /// The original audio is kept underneath unless `remove_original_audio`.
    fn overlay(
        &self,
        video_path: &Path,
        audio_path: &Path,
        segments: &[TextSegmentWithAudioTimestamp],
        remove_original_audio: bool,
        output_path: &Path,
    ) -> Result<PathBuf, BoxError>;
}

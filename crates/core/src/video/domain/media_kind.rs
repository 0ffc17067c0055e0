use std::path::Path;

use crate::shared::constants::{AUDIO_EXTENSIONS, VIDEO_EXTENSIONS};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Video,
    Audio,
}

impl MediaKind {
    /// Classifies by extension; anything not known as video is treated as audio.
    pub fn from_path(path: &Path) -> Self {
        let is_video =
            lowercase_extension(path).is_some_and(|ext| VIDEO_EXTENSIONS.contains(&ext.as_str()));
        if is_video {
            MediaKind::Video
        } else {
            MediaKind::Audio
        }
    }

    pub fn is_video(&self) -> bool {
        matches!(self, MediaKind::Video)
    }

    /// True when the extension is one the decoders are expected to handle.
    pub fn is_supported(path: &Path) -> bool {
        lowercase_extension(path).is_some_and(|ext| {
            VIDEO_EXTENSIONS.contains(&ext.as_str()) || AUDIO_EXTENSIONS.contains(&ext.as_str())
        })
    }
}

fn lowercase_extension(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("user/proj/test-video-1min.mp4", MediaKind::Video)]
    #[case("clip.MOV", MediaKind::Video)]
    #[case("talk.webm", MediaKind::Video)]
    #[case("voice.mp3", MediaKind::Audio)]
    #[case("podcast.wav", MediaKind::Audio)]
    #[case("no_extension", MediaKind::Audio)]
    fn test_from_path(#[case] path: &str, #[case] expected: MediaKind) {
        assert_eq!(MediaKind::from_path(Path::new(path)), expected);
    }

    #[rstest]
    #[case("a.mp4", true)]
    #[case("a.FLAC", true)]
    #[case("a.txt", false)]
    #[case("a", false)]
    fn test_is_supported(#[case] path: &str, #[case] expected: bool) {
        assert_eq!(MediaKind::is_supported(Path::new(path)), expected);
    }
}

use serde::{Deserialize, Serialize};

use crate::video::domain::media_kind::MediaKind;

/// Parameters of one dubbing job.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DubbingRequest {
    pub project_id: String,
    pub target_language: String,
    /// Blob-store path of the source video or audio.
    pub source_location: String,
    /// Catalog voices, matched to speakers in order of first appearance.
    #[serde(default)]
    pub voice_ids: Vec<u32>,
    #[serde(default)]
    pub cloning: bool,
    #[serde(default)]
    pub expected_speakers: Option<usize>,
    /// Blob-store path of a voice sample uploaded by the user.
    #[serde(default)]
    pub reference_voice_location: Option<String>,
}

impl DubbingRequest {
    pub fn new(project_id: &str, target_language: &str, source_location: &str) -> Self {
        Self {
            project_id: project_id.to_string(),
            target_language: target_language.to_string(),
            source_location: source_location.to_string(),
            voice_ids: Vec::new(),
            cloning: false,
            expected_speakers: None,
            reference_voice_location: None,
        }
    }

    pub fn media_kind(&self) -> MediaKind {
        MediaKind::from_path(std::path::Path::new(&self.source_location))
    }

    /// Speaker turns matter when voices differ per speaker.
    pub fn needs_diarization(&self) -> bool {
        self.cloning || self.voice_ids.len() > 1 || self.expected_speakers.is_some_and(|n| n > 1)
    }

    pub fn source_extension(&self) -> Option<&str> {
        extension(&self.source_location)
    }

    /// `<dir>/<stem>-translated.<ext>` next to the source.
    pub fn translated_location(&self) -> String {
        let location = self.source_location.as_str();
        match extension(location) {
            Some(ext) => {
                let stem_end = location.len() - ext.len() - 1;
                format!("{}-translated.{ext}", &location[..stem_end])
            }
            None => format!("{location}-translated"),
        }
    }
}

fn extension(location: &str) -> Option<&str> {
    let name = location.rsplit('/').next().unwrap_or(location);
    match name.rfind('.') {
        Some(0) | None => None,
        Some(dot) if dot + 1 < name.len() => Some(&name[dot + 1..]),
        Some(_) => None,
    }
}

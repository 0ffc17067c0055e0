use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::shared::error::BoxError;

/// A pre-recorded reference voice.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CatalogVoice {
    pub voice_id: u32,
    /// Object name of the sample relative to the sample store.
    pub sample: String,
    #[serde(default)]
    pub languages: Vec<String>,
}

impl CatalogVoice {
    pub fn speaks(&self, language: &str) -> bool {
        self.languages
            .iter()
            .any(|l| l.eq_ignore_ascii_case(language.trim()))
    }
}

/// Domain interface for the voice catalog and its sample store.
pub trait VoiceCatalog: Send + Sync {
    fn voices(&self) -> &[CatalogVoice];

    /// Downloads the voice's reference sample to `dest`.
    fn fetch_sample(&self, voice: &CatalogVoice, dest: &Path) -> Result<(), BoxError>;

    fn find(&self, voice_id: u32) -> Option<&CatalogVoice> {
        self.voices().iter().find(|v| v.voice_id == voice_id)
    }

    /// First voice in catalog order that declares `language`.
    fn find_for_language(&self, language: &str) -> Option<&CatalogVoice> {
        self.voices().iter().find(|v| v.speaks(language))
    }
}

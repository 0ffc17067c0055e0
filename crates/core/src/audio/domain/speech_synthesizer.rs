use std::path::Path;

use crate::shared::error::BoxError;

/// Domain interface for text-to-speech with a reference voice sample.
pub trait SpeechSynthesizer: Send + Sync {
    /// Speaks `text` in `language` using the voice in `reference_voice`,
    /// writing the result to `output_path`.
    fn synthesize(
        &self,
        text: &str,
        reference_voice: &Path,
        language: &str,
        output_path: &Path,
    ) -> Result<(), BoxError>;
}

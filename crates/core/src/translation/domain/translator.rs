use crate::shared::error::BoxError;

/// Domain interface for a machine-translation backend.
pub trait Translator: Send + Sync {
    /// Translates `text` into `target_language`. An empty result is an error.
    fn translate(&self, text: &str, target_language: &str) -> Result<String, BoxError>;
}

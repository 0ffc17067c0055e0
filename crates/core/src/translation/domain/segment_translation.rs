use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::text_chunker::TextChunker;
use super::translator::Translator;
use crate::segment::domain::text_segment::TextSegment;
use crate::shared::constants::DEFAULT_MAX_CHUNK_LEN;
use crate::shared::error::DubbingError;

/// How segment texts are sent to the translator.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TranslationStrategy {
    /// Delimiter-marked chunks, fewest requests.
    #[default]
    Chunked,
    /// One request per segment; no delimiter parsing.
    PerSegment,
}

/// What to do when reassembly yields a different number of texts than went in.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MismatchPolicy {
    #[default]
    Fail,
    /// Assign positionally up to the shorter count; extra segments keep their source text.
    Truncate,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TranslationSettings {
    pub strategy: TranslationStrategy,
    pub mismatch_policy: MismatchPolicy,
    pub max_chunk_len: usize,
}

impl Default for TranslationSettings {
    fn default() -> Self {
        Self {
            strategy: TranslationStrategy::default(),
            mismatch_policy: MismatchPolicy::default(),
            max_chunk_len: DEFAULT_MAX_CHUNK_LEN,
        }
    }
}

/// Translates the text of a segment list, keeping timing and speakers.
pub struct SegmentTranslator {
    translator: Arc<dyn Translator>,
    settings: TranslationSettings,
}

impl SegmentTranslator {
    pub fn new(translator: Arc<dyn Translator>, settings: TranslationSettings) -> Self {
        Self {
            translator,
            settings,
        }
    }

    /// Returns new segments carrying translated text. Blank segments are
    /// passed through untouched and never sent to the backend.
    pub fn translate(
        &self,
        segments: &[TextSegment],
        target_language: &str,
    ) -> Result<Vec<TextSegment>, DubbingError> {
        let spoken: Vec<usize> = segments
            .iter()
            .enumerate()
            .filter(|(_, s)| !s.is_blank())
            .map(|(i, _)| i)
            .collect();
        if spoken.is_empty() {
            return Ok(segments.to_vec());
        }
        let texts: Vec<&str> = spoken.iter().map(|&i| segments[i].text.as_str()).collect();

        let translated = match self.settings.strategy {
            TranslationStrategy::Chunked => self.translate_chunked(&texts, target_language)?,
            TranslationStrategy::PerSegment => self.translate_each(&texts, target_language)?,
        };

        let assigned = self.check_count(texts.len(), translated.len())?;
        let mut out = segments.to_vec();
        for (&index, text) in spoken.iter().zip(translated).take(assigned) {
            out[index] = segments[index].with_text(text);
        }
        Ok(out)
    }

    fn translate_chunked(
        &self,
        texts: &[&str],
        target_language: &str,
    ) -> Result<Vec<String>, DubbingError> {
        let chunker = TextChunker::new(self.settings.max_chunk_len);
        let chunks = chunker.chunk(texts);
        log::debug!(
            "Translating {} segments in {} chunks of at most {} chars",
            texts.len(),
            chunks.len(),
            chunker.max_chunk_len()
        );
        let translated = chunks
            .iter()
            .enumerate()
            .map(|(i, chunk)| self.call(i, chunk, target_language))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(TextChunker::reassemble(&translated))
    }

    fn translate_each(
        &self,
        texts: &[&str],
        target_language: &str,
    ) -> Result<Vec<String>, DubbingError> {
        texts
            .iter()
            .enumerate()
            .map(|(i, text)| self.call(i, text, target_language))
            .collect()
    }

    fn call(&self, chunk_index: usize, text: &str, target_language: &str) -> Result<String, DubbingError> {
        let translated = self
            .translator
            .translate(text, target_language)
            .map_err(|e| DubbingError::TranslationFailure {
                chunk_index,
                reason: e.to_string(),
            })?;
        if translated.trim().is_empty() {
            return Err(DubbingError::TranslationFailure {
                chunk_index,
                reason: "backend returned empty text".to_string(),
            });
        }
        Ok(translated)
    }

    /// Number of texts to assign, per the mismatch policy.
    fn check_count(&self, expected: usize, actual: usize) -> Result<usize, DubbingError> {
        if expected == actual {
            return Ok(expected);
        }
        match self.settings.mismatch_policy {
            MismatchPolicy::Fail => Err(DubbingError::ReassemblyMismatch { expected, actual }),
            MismatchPolicy::Truncate => {
                log::warn!(
                    "Translation returned {actual} segments for {expected}; assigning the first {}",
                    expected.min(actual)
                );
                Ok(expected.min(actual))
            }
        }
    }
}

use std::path::Path;
use std::time::Duration;

use reqwest::blocking::multipart::Form;

use crate::audio::domain::speech_synthesizer::SpeechSynthesizer;
use crate::shared::error::BoxError;

/// Voice-cloning TTS served over HTTP (an XTTS-style endpoint).
///
/// Posts the text, language, and reference sample as a multipart form and
/// writes the returned audio bytes to the output path.
pub struct HttpSynthesizer {
    endpoint: String,
    client: reqwest::blocking::Client,
}

impl HttpSynthesizer {
    pub fn new(endpoint: &str) -> Result<Self, BoxError> {
        // Long texts in single-pass mode can take minutes to synthesize.
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(30 * 60))
            .build()?;
        Ok(Self {
            endpoint: endpoint.to_string(),
            client,
        })
    }
}

impl SpeechSynthesizer for HttpSynthesizer {
    fn synthesize(
        &self,
        text: &str,
        reference_voice: &Path,
        language: &str,
        output_path: &Path,
    ) -> Result<(), BoxError> {
        let form = Form::new()
            .text("text", text.to_string())
            .text("language", language.to_string())
            .file("speaker_wav", reference_voice)?;

        let response = self
            .client
            .post(&self.endpoint)
            .multipart(form)
            .send()?
            .error_for_status()?;
        let bytes = response.bytes()?;
        if bytes.is_empty() {
            return Err("synthesis service returned no audio".into());
        }
        std::fs::write(output_path, &bytes)?;
        log::debug!(
            "Synthesized {} chars into {} ({} bytes)",
            text.chars().count(),
            output_path.display(),
            bytes.len()
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_reference_voice_is_error() {
        let synth = HttpSynthesizer::new("http://127.0.0.1:9/tts").unwrap();
        let dir = tempfile::tempdir().unwrap();
        let result = synth.synthesize(
            "Bonjour",
            Path::new("/nonexistent/voice.wav"),
            "fr",
            &dir.path().join("out.wav"),
        );
        assert!(result.is_err());
    }
}

use std::path::Path;
use std::time::Duration;

use reqwest::blocking::multipart::Form;
use serde::Deserialize;

use crate::audio::domain::diarizer::{Diarizer, SpeakerTurn};
use crate::shared::error::BoxError;

/// Speaker diarization served over HTTP (a pyannote-style endpoint).
///
/// The service answers with `{"turns": [{"start", "end", "speaker"}, ...]}`.
pub struct HttpDiarizer {
    endpoint: String,
    client: reqwest::blocking::Client,
}

#[derive(Deserialize)]
struct DiarizationResponse {
    turns: Vec<SpeakerTurn>,
}

impl HttpDiarizer {
    pub fn new(endpoint: &str) -> Result<Self, BoxError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(30 * 60))
            .build()?;
        Ok(Self {
            endpoint: endpoint.to_string(),
            client,
        })
    }
}

impl Diarizer for HttpDiarizer {
    fn diarize(
        &self,
        media_path: &Path,
        expected_speakers: Option<usize>,
    ) -> Result<Vec<SpeakerTurn>, BoxError> {
        let mut form = Form::new().file("file", media_path)?;
        if let Some(n) = expected_speakers {
            form = form.text("num_speakers", n.to_string());
        }
        let body = self
            .client
            .post(&self.endpoint)
            .multipart(form)
            .send()?
            .error_for_status()?
            .text()?;
        parse_turns(&body)
    }
}

/// Parses the service response, ordering turns by start time.
fn parse_turns(body: &str) -> Result<Vec<SpeakerTurn>, BoxError> {
    let mut turns = serde_json::from_str::<DiarizationResponse>(body)?.turns;
    turns.sort_by(|a, b| a.start.total_cmp(&b.start));
    Ok(turns)
}

use std::time::Duration;

use serde_json::Value;

use crate::shared::error::BoxError;
use crate::translation::domain::translator::Translator;

const GOOGLE_TRANSLATE_URL: &str = "https://translate.googleapis.com/translate_a/single";

/// Google's public web translation endpoint (`client=gtx`). Needs no key.
pub struct GoogleTranslator {
    client: reqwest::blocking::Client,
    url: String,
}

impl GoogleTranslator {
    pub fn new() -> Result<Self, BoxError> {
        Self::with_url(GOOGLE_TRANSLATE_URL)
    }

    pub fn with_url(url: &str) -> Result<Self, BoxError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(60))
            .build()?;
        Ok(Self {
            client,
            url: url.to_string(),
        })
    }
}

impl Translator for GoogleTranslator {
    fn translate(&self, text: &str, target_language: &str) -> Result<String, BoxError> {
        let body: Value = self
            .client
            .post(&self.url)
            .query(&[
                ("client", "gtx"),
                ("sl", "auto"),
                ("tl", target_language),
                ("dt", "t"),
            ])
            .form(&[("q", text)])
            .send()?
            .error_for_status()?
            .json()?;
        let translated = parse_response(&body)?;
        if translated.trim().is_empty() {
            return Err(format!("Google could not translate text chunk: {text}").into());
        }
        Ok(translated)
    }
}

/// The answer is a nested array; element `[0]` lists `[translated, source, ...]`
/// sentence pairs whose first entries concatenate to the full translation.
fn parse_response(body: &Value) -> Result<String, BoxError> {
    let sentences = body
        .get(0)
        .and_then(Value::as_array)
        .ok_or("unexpected Google Translate response shape")?;
    Ok(sentences
        .iter()
        .filter_map(|s| s.get(0).and_then(Value::as_str))
        .collect())
}

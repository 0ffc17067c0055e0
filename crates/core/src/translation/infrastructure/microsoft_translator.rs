use std::time::Duration;

use serde_json::{json, Value};

use crate::shared::error::BoxError;
use crate::translation::domain::translator::Translator;

const MICROSOFT_TRANSLATE_URL: &str = "https://api.cognitive.microsofttranslator.com/translate";

/// Microsoft Translator v3 REST API.
pub struct MicrosoftTranslator {
    client: reqwest::blocking::Client,
    api_key: String,
    region: String,
}

impl MicrosoftTranslator {
    pub fn new(api_key: &str, region: &str) -> Result<Self, BoxError> {
        if api_key.is_empty() {
            return Err("Microsoft Translator API key is not configured".into());
        }
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(60))
            .build()?;
        Ok(Self {
            client,
            api_key: api_key.to_string(),
            region: region.to_string(),
        })
    }
}

impl Translator for MicrosoftTranslator {
    fn translate(&self, text: &str, target_language: &str) -> Result<String, BoxError> {
        let mut request = self
            .client
            .post(MICROSOFT_TRANSLATE_URL)
            .query(&[("api-version", "3.0"), ("to", target_language)])
            .header("Ocp-Apim-Subscription-Key", &self.api_key)
            .json(&json!([{ "Text": text }]));
        if !self.region.is_empty() {
            request = request.header("Ocp-Apim-Subscription-Region", &self.region);
        }
        let body: Value = request.send()?.error_for_status()?.json()?;
        match parse_response(&body) {
            Some(translated) if !translated.trim().is_empty() => Ok(translated),
            _ => Err(format!("Microsoft could not translate text chunk: {text}").into()),
        }
    }
}

fn parse_response(body: &Value) -> Option<String> {
    body.get(0)?
        .get("translations")?
        .get(0)?
        .get("text")?
        .as_str()
        .map(str::to_string)
}

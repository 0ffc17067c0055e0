use std::time::Duration;

use serde::Serialize;

use crate::project::domain::error_reporter::ErrorReporter;
use crate::shared::error::{BoxError, DubbingError};

#[derive(Serialize, Debug, PartialEq)]
struct ErrorReport<'a> {
    project_id: &'a str,
    stage: &'a str,
    kind: &'static str,
    message: String,
}

/// Posts failures as JSON to a monitoring webhook. Delivery is best effort.
pub struct WebhookErrorReporter {
    url: String,
    client: reqwest::blocking::Client,
}

impl WebhookErrorReporter {
    pub fn new(url: &str) -> Result<Self, BoxError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self {
            url: url.to_string(),
            client,
        })
    }
}

impl ErrorReporter for WebhookErrorReporter {
    fn report(&self, project_id: &str, stage: &str, error: &DubbingError) {
        let report = build_report(project_id, stage, error);
        let result = self
            .client
            .post(&self.url)
            .json(&report)
            .send()
            .and_then(|r| r.error_for_status());
        if let Err(e) = result {
            log::warn!("[{project_id}] Could not deliver error report: {e}");
        }
    }
}

fn build_report<'a>(project_id: &'a str, stage: &'a str, error: &DubbingError) -> ErrorReport<'a> {
    ErrorReport {
        project_id,
        stage,
        kind: error.kind(),
        message: error.to_string(),
    }
}

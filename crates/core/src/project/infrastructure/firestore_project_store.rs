use std::time::Duration;

use serde_json::{json, Value};

use crate::project::domain::project_store::{ProjectStatus, ProjectStore, ProjectStoreError};

const FIRESTORE_URL: &str = "https://firestore.googleapis.com/v1";

/// Project documents in a Firestore collection, via the REST API.
pub struct FirestoreProjectStore {
    base_url: String,
    project: String,
    collection: String,
    token: Option<String>,
    client: reqwest::blocking::Client,
}

impl FirestoreProjectStore {
    pub fn new(
        project: &str,
        collection: &str,
        token: Option<String>,
    ) -> Result<Self, ProjectStoreError> {
        Self::with_base_url(FIRESTORE_URL, project, collection, token)
    }

    pub fn with_base_url(
        base_url: &str,
        project: &str,
        collection: &str,
        token: Option<String>,
    ) -> Result<Self, ProjectStoreError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(backend)?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            project: project.to_string(),
            collection: collection.to_string(),
            token,
            client,
        })
    }

    pub fn document_url(&self, project_id: &str) -> String {
        format!(
            "{}/projects/{}/databases/(default)/documents/{}/{}",
            self.base_url, self.project, self.collection, project_id
        )
    }

    fn authorize(
        &self,
        request: reqwest::blocking::RequestBuilder,
    ) -> reqwest::blocking::RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }
}

impl ProjectStore for FirestoreProjectStore {
    fn set_status(
        &self,
        project_id: &str,
        status: ProjectStatus,
        translated_file_link: &str,
    ) -> Result<(), ProjectStoreError> {
        let url = self.document_url(project_id);

        let existing = self
            .authorize(self.client.get(&url))
            .send()
            .map_err(backend)?;
        if existing.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(ProjectStoreError::NotFound {
                project_id: project_id.to_string(),
            });
        }
        existing.error_for_status().map_err(backend)?;

        self.authorize(self.client.patch(&url))
            .query(&[
                ("updateMask.fieldPaths", "id"),
                ("updateMask.fieldPaths", "status"),
                ("updateMask.fieldPaths", "translatedFileLink"),
            ])
            .json(&update_body(project_id, status, translated_file_link))
            .send()
            .map_err(backend)?
            .error_for_status()
            .map_err(backend)?;
        Ok(())
    }
}

fn update_body(project_id: &str, status: ProjectStatus, translated_file_link: &str) -> Value {
    json!({
        "fields": {
            "id": { "stringValue": project_id },
            "status": { "stringValue": status.as_str() },
            "translatedFileLink": { "stringValue": translated_file_link },
        }
    })
}

fn backend(e: impl std::fmt::Display) -> ProjectStoreError {
    ProjectStoreError::Backend(e.to_string())
}

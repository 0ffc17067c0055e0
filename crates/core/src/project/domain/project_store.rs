use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::shared::error::DubbingError;

/// Externally visible status of a dubbing project.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProjectStatus {
    Queued,
    Translating,
    Translated,
    Error,
}

impl ProjectStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProjectStatus::Queued => "queued",
            ProjectStatus::Translating => "translating",
            ProjectStatus::Translated => "translated",
            ProjectStatus::Error => "error",
        }
    }
}

impl std::fmt::Display for ProjectStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Error, Debug)]
pub enum ProjectStoreError {
    #[error("project {project_id} does not exist")]
    NotFound { project_id: String },
    #[error("project store: {0}")]
    Backend(String),
}

/// Domain interface for the persisted project document.
pub trait ProjectStore: Send + Sync {
    /// Overwrites status and translated-file link. Unknown ids are `NotFound`.
    fn set_status(
        &self,
        project_id: &str,
        status: ProjectStatus,
        translated_file_link: &str,
    ) -> Result<(), ProjectStoreError>;
}

impl From<ProjectStoreError> for DubbingError {
    fn from(err: ProjectStoreError) -> Self {
        match err {
            ProjectStoreError::NotFound { project_id } => DubbingError::ProjectNotFound { project_id },
            ProjectStoreError::Backend(message) => DubbingError::Storage(message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&ProjectStatus::Translating).unwrap(),
            "\"translating\""
        );
        let status: ProjectStatus = serde_json::from_str("\"error\"").unwrap();
        assert_eq!(status, ProjectStatus::Error);
        assert_eq!(ProjectStatus::Translated.to_string(), "translated");
    }

    #[test]
    fn test_missing_project_converts() {
        let err: DubbingError = ProjectStoreError::NotFound {
            project_id: "p1".to_string(),
        }
        .into();
        assert!(matches!(err, DubbingError::ProjectNotFound { ref project_id } if project_id == "p1"));
    }
}

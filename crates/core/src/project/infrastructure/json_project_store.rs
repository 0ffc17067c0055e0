use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::project::domain::project_store::{ProjectStatus, ProjectStore, ProjectStoreError};
use crate::shared::scratch_space::file_safe_id;

/// The fields of a project document this crate reads and writes.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectDocument {
    pub id: String,
    pub status: ProjectStatus,
    #[serde(default)]
    pub translated_file_link: String,
}

/// Project documents stored as `<dir>/<project id>.json`. Characters other
/// than ASCII alphanumerics, `-` and `_` become `_` in the file name.
///
/// Fields other than `id`, `status` and `translatedFileLink` are preserved on update.
pub struct JsonProjectStore {
    dir: PathBuf,
}

impl JsonProjectStore {
    pub fn new(dir: &Path) -> Self {
        Self {
            dir: dir.to_path_buf(),
        }
    }

    /// Creates (or resets) a queued project document.
    pub fn create(&self, project_id: &str) -> Result<(), ProjectStoreError> {
        fs::create_dir_all(&self.dir).map_err(|e| backend(&self.dir, e))?;
        let doc = ProjectDocument {
            id: project_id.to_string(),
            status: ProjectStatus::Queued,
            translated_file_link: String::new(),
        };
        let value = serde_json::to_value(&doc).map_err(|e| ProjectStoreError::Backend(e.to_string()))?;
        self.write(project_id, &value)
    }

    pub fn load(&self, project_id: &str) -> Result<ProjectDocument, ProjectStoreError> {
        let value = self.read(project_id)?;
        serde_json::from_value(value).map_err(|e| ProjectStoreError::Backend(e.to_string()))
    }

    fn path(&self, project_id: &str) -> PathBuf {
        self.dir.join(format!("{}.json", file_safe_id(project_id)))
    }

    fn read(&self, project_id: &str) -> Result<Value, ProjectStoreError> {
        let path = self.path(project_id);
        let raw = match fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(ProjectStoreError::NotFound {
                    project_id: project_id.to_string(),
                })
            }
            Err(e) => return Err(backend(&path, e)),
        };
        serde_json::from_str(&raw)
            .map_err(|e| ProjectStoreError::Backend(format!("{}: {e}", path.display())))
    }

    fn write(&self, project_id: &str, value: &Value) -> Result<(), ProjectStoreError> {
        let path = self.path(project_id);
        let raw = serde_json::to_string_pretty(value)
            .map_err(|e| ProjectStoreError::Backend(e.to_string()))?;
        let temp = path.with_extension("json.tmp");
        fs::write(&temp, raw).map_err(|e| backend(&temp, e))?;
        fs::rename(&temp, &path).map_err(|e| backend(&path, e))
    }
}

impl ProjectStore for JsonProjectStore {
    fn set_status(
        &self,
        project_id: &str,
        status: ProjectStatus,
        translated_file_link: &str,
    ) -> Result<(), ProjectStoreError> {
        let mut doc = self.read(project_id)?;
        let fields = doc.as_object_mut().ok_or_else(|| {
            ProjectStoreError::Backend(format!("project {project_id} is not a JSON object"))
        })?;
        fields.insert("id".into(), Value::from(project_id));
        fields.insert("status".into(), Value::from(status.as_str()));
        fields.insert("translatedFileLink".into(), Value::from(translated_file_link));
        self.write(project_id, &doc)?;
        log::debug!("Project {project_id} status set to {status}");
        Ok(())
    }
}

fn backend(path: &Path, e: std::io::Error) -> ProjectStoreError {
    ProjectStoreError::Backend(format!("{}: {e}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_then_set_status() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonProjectStore::new(dir.path());
        store.create("07fsfECkwma6fVTDyqQf").unwrap();

        store
            .set_status("07fsfECkwma6fVTDyqQf", ProjectStatus::Translated, "file:///out.mp4")
            .unwrap();

        let doc = store.load("07fsfECkwma6fVTDyqQf").unwrap();
        assert_eq!(doc.status, ProjectStatus::Translated);
        assert_eq!(doc.translated_file_link, "file:///out.mp4");
    }

    #[test]
    fn test_unknown_project_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let err = JsonProjectStore::new(dir.path())
            .set_status("missing", ProjectStatus::Translating, "")
            .unwrap_err();
        assert!(matches!(err, ProjectStoreError::NotFound { .. }));
    }

    #[test]
    fn test_project_id_cannot_leave_store_dir() {
        let root = tempfile::tempdir().unwrap();
        let dir = root.path().join("projects");
        let store = JsonProjectStore::new(&dir);

        store.create("../escaped").unwrap();
        store.set_status("../escaped", ProjectStatus::Translating, "").unwrap();

        assert!(!root.path().join("escaped.json").exists());
        assert!(dir.join("___escaped.json").exists());
        assert_eq!(
            store.load("../escaped").unwrap().status,
            ProjectStatus::Translating
        );
    }

    #[test]
    fn test_other_fields_survive_update() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("p1.json"),
            r#"{"id": "p1", "status": "queued", "owner": "z8Z5j71W"}"#,
        )
        .unwrap();
        let store = JsonProjectStore::new(dir.path());

        store.set_status("p1", ProjectStatus::Error, "").unwrap();

        let raw: Value =
            serde_json::from_str(&fs::read_to_string(dir.path().join("p1.json")).unwrap()).unwrap();
        assert_eq!(raw["owner"], "z8Z5j71W");
        assert_eq!(raw["status"], "error");
        assert_eq!(raw["translatedFileLink"], "");
    }
}

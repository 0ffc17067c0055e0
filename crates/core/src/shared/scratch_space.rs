use std::fs;
use std::path::{Path, PathBuf};

use crate::shared::error::DubbingError;

/// Per-project scratch directory for downloaded and intermediate files.
///
/// Every file a job creates lives under `<root>/<project id>/`, so jobs for
/// different projects never share a path. The directory is removed by
/// `clean_up`, or on drop if the job never got that far.
#[derive(Debug)]
pub struct ScratchSpace {
    dir: PathBuf,
    released: bool,
}

impl ScratchSpace {
    pub fn create(root: &Path, project_id: &str) -> Result<Self, DubbingError> {
        let dir = root.join(file_safe_id(project_id));
        fs::create_dir_all(&dir).map_err(|e| DubbingError::io(&dir, e))?;
        Ok(Self {
            dir,
            released: false,
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path(&self, file_name: &str) -> PathBuf {
        self.dir.join(file_name)
    }

    /// Removes the directory and everything in it. Not retried on failure.
    pub fn clean_up(mut self) -> std::io::Result<()> {
        self.released = true;
        remove_if_present(&self.dir)
    }
}

impl Drop for ScratchSpace {
    fn drop(&mut self) {
        if !self.released {
            let _ = remove_if_present(&self.dir);
        }
    }
}

fn remove_if_present(dir: &Path) -> std::io::Result<()> {
    match fs::remove_dir_all(dir) {
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        other => other,
    }
}

/// `project_id` reduced to a single safe path component.
pub(crate) fn file_safe_id(project_id: &str) -> String {
    let cleaned: String = project_id
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    if cleaned.is_empty() {
        "_".to_string()
    } else {
        cleaned
    }
}

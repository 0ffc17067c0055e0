use thiserror::Error;

use crate::project::domain::project_store::ProjectStatus;

/// Stage of a single dubbing job.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum JobStage {
    Queued,
    Downloading,
    Transcribing,
    Translating,
    Synthesizing,
    Muxing,
    Uploading,
    CleaningUp,
    Translated,
    Error,
}

impl JobStage {
    pub fn name(&self) -> &'static str {
        match self {
            JobStage::Queued => "queued",
            JobStage::Downloading => "downloading",
            JobStage::Transcribing => "transcribing",
            JobStage::Translating => "translating",
            JobStage::Synthesizing => "synthesizing",
            JobStage::Muxing => "muxing",
            JobStage::Uploading => "uploading",
            JobStage::CleaningUp => "cleaning_up",
            JobStage::Translated => "translated",
            JobStage::Error => "error",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStage::Translated | JobStage::Error)
    }

    /// Status written to the project store on entering this stage, if any.
    pub fn project_status(&self) -> Option<ProjectStatus> {
        match self {
            JobStage::Translating => Some(ProjectStatus::Translating),
            JobStage::Translated => Some(ProjectStatus::Translated),
            JobStage::Error => Some(ProjectStatus::Error),
            _ => None,
        }
    }
}

impl std::fmt::Display for JobStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("invalid job transition {from} -> {to}")]
pub struct InvalidTransition {
    pub from: JobStage,
    pub to: JobStage,
}

/// Enforces the linear stage order of one job.
///
/// `Muxing` only exists for video sources. `Error` can be entered from any
/// non-terminal stage. No stage is entered twice.
#[derive(Debug, Clone)]
pub struct StageMachine {
    current: JobStage,
    is_video: bool,
    history: Vec<JobStage>,
}

impl StageMachine {
    pub fn new(is_video: bool) -> Self {
        Self {
            current: JobStage::Queued,
            is_video,
            history: vec![JobStage::Queued],
        }
    }

    pub fn current(&self) -> JobStage {
        self.current
    }

    pub fn history(&self) -> &[JobStage] {
        &self.history
    }

    /// The stage that follows the current one on the success path.
    pub fn next(&self) -> Option<JobStage> {
        let next = match self.current {
            JobStage::Queued => JobStage::Downloading,
            JobStage::Downloading => JobStage::Transcribing,
            JobStage::Transcribing => JobStage::Translating,
            JobStage::Translating => JobStage::Synthesizing,
            JobStage::Synthesizing if self.is_video => JobStage::Muxing,
            JobStage::Synthesizing | JobStage::Muxing => JobStage::Uploading,
            JobStage::Uploading => JobStage::CleaningUp,
            JobStage::CleaningUp => JobStage::Translated,
            JobStage::Translated | JobStage::Error => return None,
        };
        Some(next)
    }

    pub fn advance(&mut self, to: JobStage) -> Result<(), InvalidTransition> {
        if self.next() != Some(to) {
            return Err(InvalidTransition {
                from: self.current,
                to,
            });
        }
        self.enter(to);
        Ok(())
    }

    pub fn fail(&mut self) -> Result<(), InvalidTransition> {
        if self.current.is_terminal() {
            return Err(InvalidTransition {
                from: self.current,
                to: JobStage::Error,
            });
        }
        self.enter(JobStage::Error);
        Ok(())
    }

    fn enter(&mut self, stage: JobStage) {
        self.current = stage;
        self.history.push(stage);
    }
}

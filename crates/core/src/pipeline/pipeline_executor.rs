use std::sync::Arc;

use thiserror::Error;

use super::dub_project_use_case::{DubProjectUseCase, DubbingOutcome};
use super::dubbing_request::DubbingRequest;
use super::pipeline_logger::PipelineLogger;
use crate::shared::error::DubbingError;

/// One job as seen by an executor. Implemented by `DubProjectUseCase`.
pub trait DubbingJob: Send + Sync {
    fn run(
        &self,
        request: &DubbingRequest,
        logger: &mut dyn PipelineLogger,
    ) -> Result<DubbingOutcome, DubbingError>;
}

impl DubbingJob for DubProjectUseCase {
    fn run(
        &self,
        request: &DubbingRequest,
        logger: &mut dyn PipelineLogger,
    ) -> Result<DubbingOutcome, DubbingError> {
        self.execute(request, logger)
    }
}

/// Builds a fresh logger for each job in a batch.
pub type LoggerFactory = dyn Fn(&DubbingRequest) -> Box<dyn PipelineLogger> + Send + Sync;

/// Outcome of one job in a batch.
#[derive(Debug)]
pub struct JobReport {
    pub project_id: String,
    pub result: Result<DubbingOutcome, DubbingError>,
}

impl JobReport {
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum BatchError {
    /// Two requests target the same project; their scratch space and status
    /// document would collide.
    #[error("project {0} appears more than once in the batch")]
    DuplicateProject(String),
    #[error("a batch worker thread panicked")]
    WorkerPanicked,
}

/// Abstracts how a batch of independent dubbing jobs is executed.
///
/// This is a port (application-layer interface). Infrastructure provides
/// concrete implementations (e.g. threaded).
pub trait PipelineExecutor: Send {
    /// Runs every request and returns one report per request, in request
    /// order. A failing job does not stop the others.
    fn execute(
        &self,
        job: Arc<dyn DubbingJob>,
        requests: Vec<DubbingRequest>,
        make_logger: Arc<LoggerFactory>,
    ) -> Result<Vec<JobReport>, BatchError>;
}

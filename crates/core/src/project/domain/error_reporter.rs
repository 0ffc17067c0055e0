use crate::shared::error::DubbingError;

/// Forwards job failures to external monitoring.
pub trait ErrorReporter: Send + Sync {
    fn report(&self, project_id: &str, stage: &str, error: &DubbingError);
}

/// Reporter that drops everything; failures are still logged by the caller.
pub struct NullErrorReporter;

impl ErrorReporter for NullErrorReporter {
    fn report(&self, _project_id: &str, _stage: &str, _error: &DubbingError) {}
}

use crate::project::domain::error_reporter::ErrorReporter;
use crate::shared::error::DubbingError;

/// Captures failures as Sentry events tagged with project, stage and error kind.
///
/// Uses the client bound by `sentry::init`. Without one, events are dropped.
pub struct SentryErrorReporter;

impl ErrorReporter for SentryErrorReporter {
    fn report(&self, project_id: &str, stage: &str, error: &DubbingError) {
        let event_id = sentry::with_scope(
            |scope| {
                scope.set_tag("project_id", project_id);
                scope.set_tag("stage", stage);
                scope.set_tag("kind", error.kind());
            },
            || sentry::capture_error(error),
        );
        log::debug!("[{project_id}] Reported {stage} failure as Sentry event {event_id}");
    }
}

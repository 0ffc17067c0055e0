use std::collections::HashSet;
use std::sync::Arc;
use std::thread::JoinHandle;

use crate::pipeline::dubbing_request::DubbingRequest;
use crate::pipeline::pipeline_executor::{
    BatchError, DubbingJob, JobReport, LoggerFactory, PipelineExecutor,
};

const DEFAULT_WORKERS: usize = 2;

/// Executes a batch on a fixed pool of worker threads.
///
/// Layout: `queue → N workers [job.run] → main [collect]`
///
/// Workers share the job (and through it the loaded models) read-only. Each
/// request is processed by exactly one worker.
pub struct ThreadedPipelineExecutor {
    workers: usize,
}

impl ThreadedPipelineExecutor {
    pub fn new(workers: usize) -> Self {
        Self {
            workers: workers.max(1),
        }
    }

    pub fn workers(&self) -> usize {
        self.workers
    }
}

impl Default for ThreadedPipelineExecutor {
    fn default() -> Self {
        Self::new(DEFAULT_WORKERS)
    }
}

impl PipelineExecutor for ThreadedPipelineExecutor {
    fn execute(
        &self,
        job: Arc<dyn DubbingJob>,
        requests: Vec<DubbingRequest>,
        make_logger: Arc<LoggerFactory>,
    ) -> Result<Vec<JobReport>, BatchError> {
        check_unique(&requests)?;
        let total = requests.len();
        if total == 0 {
            return Ok(Vec::new());
        }

        let (job_tx, job_rx) = crossbeam_channel::unbounded::<(usize, DubbingRequest)>();
        let (report_tx, report_rx) = crossbeam_channel::unbounded::<(usize, JobReport)>();
        for entry in requests.into_iter().enumerate() {
            // Receiver is alive until the workers exit.
            let _ = job_tx.send(entry);
        }
        drop(job_tx);

        let handles: Vec<JoinHandle<()>> = (0..self.workers.min(total))
            .map(|_| {
                spawn_worker(
                    job.clone(),
                    make_logger.clone(),
                    job_rx.clone(),
                    report_tx.clone(),
                )
            })
            .collect();
        drop(report_tx);

        let mut slots: Vec<Option<JobReport>> = (0..total).map(|_| None).collect();
        for (index, report) in report_rx {
            slots[index] = Some(report);
        }

        join_workers(handles)?;
        slots
            .into_iter()
            .map(|slot| slot.ok_or(BatchError::WorkerPanicked))
            .collect()
    }
}

fn check_unique(requests: &[DubbingRequest]) -> Result<(), BatchError> {
    let mut seen = HashSet::new();
    for request in requests {
        if !seen.insert(request.project_id.as_str()) {
            return Err(BatchError::DuplicateProject(request.project_id.clone()));
        }
    }
    Ok(())
}

fn spawn_worker(
    job: Arc<dyn DubbingJob>,
    make_logger: Arc<LoggerFactory>,
    job_rx: crossbeam_channel::Receiver<(usize, DubbingRequest)>,
    report_tx: crossbeam_channel::Sender<(usize, JobReport)>,
) -> JoinHandle<()> {
    std::thread::spawn(move || {
        for (index, request) in job_rx {
            let mut logger = make_logger(&request);
            let result = job.run(&request, logger.as_mut());
            if let Err(e) = &result {
                log::warn!("[{}] Job failed: {e}", request.project_id);
            }
            let report = JobReport {
                project_id: request.project_id,
                result,
            };
            if report_tx.send((index, report)).is_err() {
                break;
            }
        }
    })
}

fn join_workers(handles: Vec<JoinHandle<()>>) -> Result<(), BatchError> {
    let mut panicked = false;
    for handle in handles {
        panicked |= handle.join().is_err();
    }
    if panicked {
        Err(BatchError::WorkerPanicked)
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::dub_project_use_case::DubbingOutcome;
    use crate::pipeline::pipeline_logger::{NullPipelineLogger, PipelineLogger};
    use crate::shared::error::DubbingError;
    use std::sync::Mutex;
    use std::thread::ThreadId;

    /// Fails projects whose id starts with "bad", succeeds otherwise.
    #[derive(Default)]
    struct StubJob {
        runs: Arc<Mutex<Vec<(String, ThreadId)>>>,
    }

    impl DubbingJob for StubJob {
        fn run(
            &self,
            request: &DubbingRequest,
            logger: &mut dyn PipelineLogger,
        ) -> Result<DubbingOutcome, DubbingError> {
            logger.info(&request.project_id);
            std::thread::sleep(std::time::Duration::from_millis(5));
            self.runs
                .lock()
                .unwrap()
                .push((request.project_id.clone(), std::thread::current().id()));
            if request.project_id.starts_with("bad") {
                return Err(DubbingError::Storage("offline".to_string()));
            }
            Ok(DubbingOutcome {
                translated_file_link: format!("link/{}", request.project_id),
                segments: Vec::new(),
            })
        }
    }

    struct PanickingJob;

    impl DubbingJob for PanickingJob {
        fn run(
            &self,
            _request: &DubbingRequest,
            _logger: &mut dyn PipelineLogger,
        ) -> Result<DubbingOutcome, DubbingError> {
            panic!("model crashed");
        }
    }

    fn requests(ids: &[&str]) -> Vec<DubbingRequest> {
        ids.iter()
            .map(|id| DubbingRequest::new(id, "fr", &format!("videos/{id}.mp4")))
            .collect()
    }

    fn null_logger() -> Arc<LoggerFactory> {
        Arc::new(|_: &DubbingRequest| Box::new(NullPipelineLogger) as Box<dyn PipelineLogger>)
    }

    #[test]
    fn test_reports_follow_request_order() {
        let job = StubJob::default();
        let runs = job.runs.clone();
        let executor = ThreadedPipelineExecutor::new(3);

        let reports = executor
            .execute(
                Arc::new(job),
                requests(&["a", "bad-b", "c", "d", "e"]),
                null_logger(),
            )
            .unwrap();

        let ids: Vec<&str> = reports.iter().map(|r| r.project_id.as_str()).collect();
        assert_eq!(ids, vec!["a", "bad-b", "c", "d", "e"]);
        assert!(reports[0].is_success());
        assert!(!reports[1].is_success());
        assert_eq!(reports[4].result.as_ref().unwrap().translated_file_link, "link/e");
        assert_eq!(runs.lock().unwrap().len(), 5);
    }

    #[test]
    fn test_worker_count_is_capped_by_job_count() {
        let job = StubJob::default();
        let runs = job.runs.clone();

        ThreadedPipelineExecutor::new(8)
            .execute(Arc::new(job), requests(&["a", "b"]), null_logger())
            .unwrap();

        let threads: HashSet<ThreadId> = runs.lock().unwrap().iter().map(|(_, t)| *t).collect();
        assert!(threads.len() <= 2);
        assert!(!threads.contains(&std::thread::current().id()));
    }

    #[test]
    fn test_duplicate_project_rejected_before_running() {
        let job = StubJob::default();
        let runs = job.runs.clone();

        let err = ThreadedPipelineExecutor::default()
            .execute(Arc::new(job), requests(&["a", "b", "a"]), null_logger())
            .unwrap_err();

        assert_eq!(err, BatchError::DuplicateProject("a".to_string()));
        assert!(runs.lock().unwrap().is_empty());
    }

    #[test]
    fn test_logger_created_per_job() {
        let created = Arc::new(Mutex::new(Vec::new()));
        let sink = created.clone();
        let factory: Arc<LoggerFactory> = Arc::new(move |request: &DubbingRequest| {
            sink.lock().unwrap().push(request.project_id.clone());
            Box::new(NullPipelineLogger) as Box<dyn PipelineLogger>
        });

        ThreadedPipelineExecutor::new(2)
            .execute(Arc::new(StubJob::default()), requests(&["a", "b", "c"]), factory)
            .unwrap();

        let mut ids = created.lock().unwrap().clone();
        ids.sort();
        assert_eq!(ids, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_empty_batch_returns_no_reports() {
        let reports = ThreadedPipelineExecutor::default()
            .execute(Arc::new(StubJob::default()), Vec::new(), null_logger())
            .unwrap();
        assert!(reports.is_empty());
    }

    #[test]
    fn test_worker_panic_is_reported() {
        let err = ThreadedPipelineExecutor::new(1)
            .execute(Arc::new(PanickingJob), requests(&["a"]), null_logger())
            .unwrap_err();
        assert_eq!(err, BatchError::WorkerPanicked);
    }
}

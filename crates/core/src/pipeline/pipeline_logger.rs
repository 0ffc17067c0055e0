use std::collections::HashMap;
use std::time::Instant;

/// Cross-cutting logger for dubbing job events.
///
/// Keeps the orchestration code independent of where stage progress ends up
/// (stdout, a batch report, nothing at all in tests).
pub trait PipelineLogger: Send {
    /// A job entered a new stage.
    fn stage_started(&mut self, project_id: &str, stage: &str);

    /// Record how long a stage took.
    fn timing(&mut self, stage: &str, duration_ms: f64);

    /// Record a point-in-time metric (e.g. segment or chunk count).
    fn metric(&mut self, name: &str, value: f64);

    /// A free-form progress message.
    fn info(&mut self, message: &str);

    /// Emit an end-of-job summary. Default: no-op.
    fn summary(&self) {}
}

/// Silent logger that discards all events.
pub struct NullPipelineLogger;

impl PipelineLogger for NullPipelineLogger {
    fn stage_started(&mut self, _project_id: &str, _stage: &str) {}
    fn timing(&mut self, _stage: &str, _duration_ms: f64) {}
    fn metric(&mut self, _name: &str, _value: f64) {}
    fn info(&mut self, _message: &str) {}
}

/// CLI-oriented logger that tracks per-stage timing and metrics and reports
/// a summary when the job finishes.
pub struct StdoutPipelineLogger {
    timings: HashMap<String, Vec<f64>>,
    metrics: HashMap<String, Vec<f64>>,
    stages: Vec<String>,
    start_time: Instant,
}

impl StdoutPipelineLogger {
    pub fn new() -> Self {
        Self {
            timings: HashMap::new(),
            metrics: HashMap::new(),
            stages: Vec::new(),
            start_time: Instant::now(),
        }
    }

    /// Returns the formatted summary string, or `None` if no data recorded.
    pub fn summary_string(&self) -> Option<String> {
        if self.timings.is_empty() && self.metrics.is_empty() {
            return None;
        }

        let elapsed_ms = self.start_time.elapsed().as_secs_f64() * 1000.0;
        let mut lines = vec![format!(
            "Job summary ({} stages, {:.1}s total):",
            self.stages.len(),
            elapsed_ms / 1000.0
        )];

        // Stages in the order they ran, then anything timed without a stage event.
        let mut names: Vec<&String> = self
            .stages
            .iter()
            .filter(|s| self.timings.contains_key(*s))
            .collect();
        let mut extra: Vec<&String> = self
            .timings
            .keys()
            .filter(|k| !self.stages.contains(k))
            .collect();
        extra.sort();
        names.extend(extra);

        for stage in names {
            let total_ms: f64 = self.timings[stage].iter().sum();
            let pct = if elapsed_ms > 0.0 {
                total_ms / elapsed_ms * 100.0
            } else {
                0.0
            };
            lines.push(format!("  {stage:14}: {total_ms:9.0}ms  ({pct:4.1}%)"));
        }

        let mut metric_names: Vec<_> = self.metrics.keys().collect();
        metric_names.sort();
        for name in metric_names {
            let values = &self.metrics[name];
            let last = values.last().copied().unwrap_or(0.0);
            lines.push(format!("  {name}: {last}"));
        }

        Some(lines.join("\n"))
    }

    pub fn timings_for(&self, stage: &str) -> Option<&[f64]> {
        self.timings.get(stage).map(|v| v.as_slice())
    }

    pub fn metrics_for(&self, name: &str) -> Option<&[f64]> {
        self.metrics.get(name).map(|v| v.as_slice())
    }

    pub fn stages(&self) -> &[String] {
        &self.stages
    }
}

impl Default for StdoutPipelineLogger {
    fn default() -> Self {
        Self::new()
    }
}

impl PipelineLogger for StdoutPipelineLogger {
    fn stage_started(&mut self, project_id: &str, stage: &str) {
        self.stages.push(stage.to_string());
        log::info!("[{project_id}] Stage: {stage}");
    }

    fn timing(&mut self, stage: &str, duration_ms: f64) {
        self.timings
            .entry(stage.to_string())
            .or_default()
            .push(duration_ms);
    }

    fn metric(&mut self, name: &str, value: f64) {
        self.metrics
            .entry(name.to_string())
            .or_default()
            .push(value);
    }

    fn info(&mut self, message: &str) {
        log::info!("{message}");
    }

    fn summary(&self) {
        if let Some(text) = self.summary_string() {
            log::info!("\n\n{text}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_null_logger_all_methods_are_noop() {
        let mut logger = NullPipelineLogger;
        logger.stage_started("p1", "downloading");
        logger.timing("downloading", 5.0);
        logger.metric("segments", 3.0);
        logger.info("hello");
        logger.summary();
    }

    #[test]
    fn test_timing_records_values() {
        let mut logger = StdoutPipelineLogger::new();
        logger.timing("translating", 20.0);
        logger.timing("synthesizing", 5.0);

        assert_eq!(logger.timings_for("translating"), Some(&[20.0][..]));
        assert_eq!(logger.timings_for("synthesizing"), Some(&[5.0][..]));
        assert!(logger.timings_for("muxing").is_none());
    }

    #[test]
    fn test_summary_lists_stages_in_run_order() {
        let mut logger = StdoutPipelineLogger::new();
        for stage in ["transcribing", "translating", "synthesizing"] {
            logger.stage_started("p1", stage);
            logger.timing(stage, 10.0);
        }
        logger.metric("segments", 3.0);

        let summary = logger.summary_string().unwrap();
        assert!(summary.starts_with("Job summary (3 stages"));
        let t = summary.find("transcribing").unwrap();
        let s = summary.find("synthesizing").unwrap();
        assert!(t < s);
        assert!(summary.contains("segments: 3"));
    }

    #[test]
    fn test_empty_summary_returns_none() {
        assert!(StdoutPipelineLogger::new().summary_string().is_none());
    }

    #[test]
    fn test_stages_are_recorded_in_order() {
        let mut logger = StdoutPipelineLogger::new();
        logger.stage_started("p1", "downloading");
        logger.info("hello world");
        logger.stage_started("p1", "transcribing");
        assert_eq!(
            logger.stages(),
            &["downloading".to_string(), "transcribing".to_string()]
        );
    }
}

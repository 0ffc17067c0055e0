pub mod dub_project_use_case;
pub mod dubbing_request;
pub mod infrastructure;
pub mod job_stage;
pub mod pipeline_executor;
pub mod pipeline_logger;

pub mod blob_store;
pub mod error_reporter;
pub mod project_store;

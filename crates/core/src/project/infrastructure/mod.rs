pub mod firebase_blob_store;
pub mod firestore_project_store;
pub mod json_project_store;
pub mod local_blob_store;
pub mod sentry_error_reporter;
pub mod webhook_error_reporter;

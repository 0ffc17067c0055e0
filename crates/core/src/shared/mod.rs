pub mod config;
pub mod constants;
pub mod error;
pub mod http_download;
pub mod model_resolver;
pub mod scratch_space;

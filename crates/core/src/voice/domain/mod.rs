pub mod voice_assignment;
pub mod voice_catalog;

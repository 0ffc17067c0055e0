pub mod speaker_registry;
pub mod text_segment;

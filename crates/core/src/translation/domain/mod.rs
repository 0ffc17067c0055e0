pub mod segment_translation;
pub mod text_chunker;
pub mod translator;

pub mod audio_reader;
pub mod audio_writer;
pub mod media_kind;
pub mod media_muxer;

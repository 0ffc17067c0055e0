pub mod ffmpeg_audio_reader;
pub mod ffmpeg_muxer;
pub mod wav_audio_writer;

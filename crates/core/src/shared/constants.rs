pub const WHISPER_MODEL_FILENAME: &str = "ggml-base.bin";
pub const WHISPER_MODEL_URL: &str =
    "https://huggingface.co/ggerganov/whisper.cpp/resolve/main/ggml-base.bin";
pub const WHISPER_SAMPLE_RATE: u32 = 16000;

/// Sample rate of the dubbed track and of the audio muxed back into video.
pub const OUTPUT_SAMPLE_RATE: u32 = 24000;

/// Translation backends reject payloads above ~5000 characters.
pub const DEFAULT_MAX_CHUNK_LEN: usize = 4500;

/// Pause inserted between per-segment synthesized clips.
pub const DEFAULT_SEGMENT_PAUSE_MS: u32 = 3000;

pub const DEFAULT_MIN_SILENCE_MS: u32 = 2000;
pub const DEFAULT_SILENCE_THRESH_DB: f64 = -30.0;
pub const DEFAULT_SILENCE_PADDING_MS: u32 = 500;

pub const DEFAULT_VOICE_SAMPLE_BASE_URL: &str = "https://speechki-book.s3.amazonaws.com/";

pub const VIDEO_EXTENSIONS: &[&str] = &["mp4", "mov", "mkv", "avi", "webm", "m4v"];
pub const AUDIO_EXTENSIONS: &[&str] = &["mp3", "wav", "m4a", "aac", "ogg", "flac", "opus"];

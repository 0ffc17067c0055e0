pub mod http_diarizer;
pub mod http_synthesizer;
pub mod whisper_recognizer;

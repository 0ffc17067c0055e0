pub mod audio_segment;
pub mod audio_timeline;
pub mod diarizer;
pub mod silence_detector;
pub mod speech_recognizer;
pub mod speech_synthesizer;

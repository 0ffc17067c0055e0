use std::path::Path;
use std::sync::Arc;

use whisper_rs::{FullParams, SamplingStrategy, WhisperContext, WhisperContextParameters};

use crate::audio::domain::speech_recognizer::{SpeechRecognizer, Transcription};
use crate::segment::domain::text_segment::TextSegment;
use crate::shared::constants::WHISPER_SAMPLE_RATE;
use crate::shared::error::BoxError;
use crate::video::domain::audio_reader::AudioReader;

/// Speech recognizer using whisper.cpp via whisper-rs.
///
/// The model is loaded once in `new`; every call gets its own inference state,
/// so one recognizer can serve concurrent jobs.
pub struct WhisperRecognizer {
    context: WhisperContext,
    reader: Arc<dyn AudioReader>,
}

impl WhisperRecognizer {
    pub fn new(model_path: &Path, reader: Arc<dyn AudioReader>) -> Result<Self, BoxError> {
        if !model_path.exists() {
            return Err(format!("Whisper model not found at: {}", model_path.display()).into());
        }
        let context = WhisperContext::new_with_params(
            model_path.to_str().ok_or("Invalid model path")?,
            WhisperContextParameters::default(),
        )
        .map_err(|e| format!("Failed to load Whisper model: {e}"))?;
        log::info!("Loaded Whisper model from {}", model_path.display());
        Ok(Self { context, reader })
    }
}

impl SpeechRecognizer for WhisperRecognizer {
    fn transcribe(&self, media_path: &Path) -> Result<Transcription, BoxError> {
        let audio = self
            .reader
            .read_audio(media_path, WHISPER_SAMPLE_RATE)?
            .ok_or_else(|| format!("{} has no audio track", media_path.display()))?;

        let mut state = self
            .context
            .create_state()
            .map_err(|e| format!("Failed to create Whisper state: {e}"))?;

        let mut params = FullParams::new(SamplingStrategy::Greedy { best_of: 1 });
        params.set_language(Some("auto"));
        params.set_translate(false);
        params.set_temperature(1.0);
        params.set_no_speech_thold(0.2);
        params.set_print_special(false);
        params.set_print_progress(false);
        params.set_print_realtime(false);
        params.set_print_timestamps(false);
        params.set_n_threads(num_cpus().min(4) as i32);

        state
            .full(params, audio.samples())
            .map_err(|e| format!("Whisper inference failed: {e}"))?;

        let mut raw = Vec::new();
        for segment in state.as_iter() {
            // Segment timestamps are in centiseconds.
            raw.push((
                segment.start_timestamp() as f64 / 100.0,
                segment.end_timestamp() as f64 / 100.0,
                segment.to_string(),
            ));
        }
        let segments = to_segments(raw)?;
        log::debug!(
            "Recognized {} segments in {:.1}s of audio",
            segments.len(),
            audio.duration()
        );

        Ok(Transcription { segments, audio })
    }
}

/// Builds ordered segments from raw `(start, end, text)` results, repairing
/// the small inversions whisper occasionally reports.
fn to_segments(raw: Vec<(f64, f64, String)>) -> Result<Vec<TextSegment>, BoxError> {
    let mut previous_start: f64 = 0.0;
    let mut segments = Vec::with_capacity(raw.len());
    for (start, end, text) in raw {
        let start = start.max(previous_start).max(0.0);
        let end = end.max(start);
        segments.push(TextSegment::new(start, end, text)?);
        previous_start = start;
    }
    Ok(segments)
}

fn num_cpus() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

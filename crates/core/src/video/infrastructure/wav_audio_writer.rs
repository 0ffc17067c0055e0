use std::path::Path;

use crate::audio::domain::audio_segment::AudioSegment;
use crate::shared::error::BoxError;
use crate::video::domain::audio_writer::AudioWriter;

/// Writes 16-bit PCM WAV files.
pub struct WavAudioWriter;

impl AudioWriter for WavAudioWriter {
    fn write_audio(&self, path: &Path, audio: &AudioSegment) -> Result<(), BoxError> {
        let spec = hound::WavSpec {
            channels: audio.channels(),
            sample_rate: audio.sample_rate(),
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(path, spec)?;
        for &sample in audio.samples() {
            let clamped = sample.clamp(-1.0, 1.0);
            writer.write_sample((clamped * i16::MAX as f32) as i16)?;
        }
        writer.finalize()?;
        Ok(())
    }
}

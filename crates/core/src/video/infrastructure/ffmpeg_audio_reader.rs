use std::path::Path;

use crate::audio::domain::audio_segment::AudioSegment;
use crate::shared::error::BoxError;
use crate::video::domain::audio_reader::AudioReader;

/// Decodes the audio track of any container ffmpeg understands, resampled to mono f32.
pub struct FfmpegAudioReader;

impl AudioReader for FfmpegAudioReader {
    fn read_audio(
        &self,
        path: &Path,
        target_sample_rate: u32,
    ) -> Result<Option<AudioSegment>, BoxError> {
        ffmpeg_next::init()?;

        let mut ictx = ffmpeg_next::format::input(path)?;

        let audio_stream = match ictx.streams().best(ffmpeg_next::media::Type::Audio) {
            Some(stream) => stream,
            None => return Ok(None),
        };
        let audio_stream_index = audio_stream.index();

        let codec_ctx =
            ffmpeg_next::codec::context::Context::from_parameters(audio_stream.parameters())?;
        let mut decoder = codec_ctx.decoder().audio()?;

        // WAV files written by some synthesizers carry no channel layout.
        let input_layout = if decoder.channel_layout().is_empty() {
            ffmpeg_next::ChannelLayout::default(decoder.channels() as i32)
        } else {
            decoder.channel_layout()
        };

        let mut resampler = ffmpeg_next::software::resampling::Context::get(
            decoder.format(),
            input_layout,
            decoder.rate(),
            ffmpeg_next::format::Sample::F32(ffmpeg_next::format::sample::Type::Planar),
            ffmpeg_next::ChannelLayout::MONO,
            target_sample_rate,
        )?;

        let mut samples: Vec<f32> = Vec::new();
        let mut decoded = ffmpeg_next::util::frame::audio::Audio::empty();
        let mut resampled = ffmpeg_next::util::frame::audio::Audio::empty();

        for (stream, packet) in ictx.packets() {
            if stream.index() != audio_stream_index {
                continue;
            }
            decoder.send_packet(&packet)?;
            while decoder.receive_frame(&mut decoded).is_ok() {
                resampler.run(&decoded, &mut resampled)?;
                extract_f32_samples(&resampled, &mut samples);
            }
        }

        decoder.send_eof()?;
        while decoder.receive_frame(&mut decoded).is_ok() {
            resampler.run(&decoded, &mut resampled)?;
            extract_f32_samples(&resampled, &mut samples);
        }

        if let Ok(Some(delay)) = resampler.flush(&mut resampled) {
            if delay.output > 0 {
                extract_f32_samples(&resampled, &mut samples);
            }
        }

        log::debug!(
            "Decoded {} samples at {} Hz from {}",
            samples.len(),
            target_sample_rate,
            path.display()
        );
        Ok(Some(AudioSegment::new(samples, target_sample_rate, 1)))
    }
}

fn extract_f32_samples(frame: &ffmpeg_next::util::frame::audio::Audio, out: &mut Vec<f32>) {
    let num_samples = frame.samples();
    if num_samples == 0 {
        return;
    }
    let data = frame.data(0);
    let floats = unsafe { std::slice::from_raw_parts(data.as_ptr() as *const f32, num_samples) };
    out.extend_from_slice(floats);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::video::domain::audio_writer::AudioWriter;
    use crate::video::infrastructure::wav_audio_writer::WavAudioWriter;

    #[test]
    fn test_read_audio_nonexistent_file() {
        let result = FfmpegAudioReader.read_audio(Path::new("/nonexistent/file.mp4"), 16000);
        assert!(result.is_err());
    }

    #[test]
    #[ignore] // Requires ffmpeg shared libraries
    fn test_reads_wav_and_resamples() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tone.wav");
        let tone: Vec<f32> = (0..48000)
            .map(|i| (i as f32 * 0.05).sin() * 0.5)
            .collect();
        WavAudioWriter
            .write_audio(&path, &AudioSegment::new(tone, 48000, 1))
            .unwrap();

        let audio = FfmpegAudioReader
            .read_audio(&path, 16000)
            .unwrap()
            .expect("wav has an audio stream");
        assert_eq!(audio.sample_rate(), 16000);
        assert!((audio.duration() - 1.0).abs() < 0.05);
    }
}

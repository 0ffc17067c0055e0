use std::path::{Path, PathBuf};

use crate::audio::domain::audio_segment::AudioSegment;
use crate::audio::domain::audio_timeline::realign_to_original;
use crate::segment::domain::text_segment::TextSegmentWithAudioTimestamp;
use crate::shared::constants::OUTPUT_SAMPLE_RATE;
use crate::shared::error::BoxError;
use crate::video::domain::audio_reader::AudioReader;
use crate::video::domain::media_muxer::MediaMuxer;
use crate::video::infrastructure::ffmpeg_audio_reader::FfmpegAudioReader;

/// Replaces the audio of a video with the dubbed track using ffmpeg-next.
///
/// Video packets are copied without re-encoding. The dubbed clips are laid
/// back onto the source timeline, padded to the length of the source audio,
/// and encoded as AAC into a new file at the output path. The source video is
/// left untouched.
pub struct FfmpegMuxer {
    original_audio_gain: f32,
}

impl FfmpegMuxer {
    /// `original_audio_gain` scales the source audio when it is kept under the dub.
    pub fn new(original_audio_gain: f32) -> Self {
        Self {
            original_audio_gain,
        }
    }

    fn build_track(
        &self,
        video_path: &Path,
        audio_path: &Path,
        segments: &[TextSegmentWithAudioTimestamp],
        remove_original_audio: bool,
    ) -> Result<AudioSegment, BoxError> {
        let reader = FfmpegAudioReader;
        let dubbed = reader
            .read_audio(audio_path, OUTPUT_SAMPLE_RATE)?
            .ok_or_else(|| format!("{} has no audio stream", audio_path.display()))?;

        let original = reader.read_audio(video_path, OUTPUT_SAMPLE_RATE)?;
        let source_duration = original.as_ref().map_or(0.0, AudioSegment::duration);
        let base = if remove_original_audio {
            None
        } else {
            original.map(|mut original| {
                original.scale(self.original_audio_gain);
                original
            })
        };

        Ok(realign_to_original(
            &dubbed,
            segments,
            base.as_ref(),
            source_duration,
        )?)
    }
}

impl MediaMuxer for FfmpegMuxer {
    fn overlay(
        &self,
        video_path: &Path,
        audio_path: &Path,
        segments: &[TextSegmentWithAudioTimestamp],
        remove_original_audio: bool,
        output_path: &Path,
    ) -> Result<PathBuf, BoxError> {
        let track = self.build_track(video_path, audio_path, segments, remove_original_audio)?;

        ffmpeg_next::init()?;
        let mut ictx = ffmpeg_next::format::input(video_path)?;
        let mut octx = ffmpeg_next::format::output(output_path)?;

        let video_stream = ictx
            .streams()
            .best(ffmpeg_next::media::Type::Video)
            .ok_or("No video stream in source file")?;
        let video_src_idx = video_stream.index();
        let video_in_tb = video_stream.time_base();

        let mut ost_video =
            octx.add_stream(ffmpeg_next::encoder::find(ffmpeg_next::codec::Id::None))?;
        ost_video.set_parameters(video_stream.parameters());
        unsafe {
            (*ost_video.parameters().as_mut_ptr()).codec_tag = 0;
        }
        let video_ost_idx = ost_video.index();

        let aac_codec = ffmpeg_next::encoder::find(ffmpeg_next::codec::Id::AAC)
            .ok_or("AAC encoder not found")?;
        let mut ost_audio = octx.add_stream(Some(aac_codec))?;
        let audio_ost_idx = ost_audio.index();

        let mut audio_encoder = ffmpeg_next::codec::context::Context::new_with_codec(aac_codec)
            .encoder()
            .audio()?;
        audio_encoder.set_rate(track.sample_rate() as i32);
        audio_encoder.set_channel_layout(ffmpeg_next::ChannelLayout::MONO);
        audio_encoder.set_format(ffmpeg_next::format::Sample::F32(
            ffmpeg_next::format::sample::Type::Planar,
        ));
        audio_encoder.set_time_base(ffmpeg_next::Rational(1, track.sample_rate() as i32));

        let mut audio_encoder = audio_encoder.open_as(aac_codec)?;
        ost_audio.set_parameters(&audio_encoder);

        let audio_time_base = audio_encoder.time_base();
        let frame_size = audio_encoder.frame_size() as usize;

        octx.write_header()?;

        let ost_video_tb = octx
            .stream(video_ost_idx)
            .ok_or("video output stream missing")?
            .time_base();
        let ost_audio_tb = octx
            .stream(audio_ost_idx)
            .ok_or("audio output stream missing")?
            .time_base();

        for (stream, mut packet) in ictx.packets() {
            if stream.index() != video_src_idx {
                continue;
            }
            packet.rescale_ts(video_in_tb, ost_video_tb);
            packet.set_position(-1);
            packet.set_stream(video_ost_idx);
            packet.write_interleaved(&mut octx)?;
        }

        encode_track(
            &mut audio_encoder,
            &track,
            &mut octx,
            audio_ost_idx,
            audio_time_base,
            ost_audio_tb,
            frame_size,
        )?;

        octx.write_trailer()?;

        log::debug!(
            "Muxed {:.1}s of dubbed audio into {}",
            track.duration(),
            output_path.display()
        );
        Ok(output_path.to_path_buf())
    }
}

fn encode_track(
    encoder: &mut ffmpeg_next::codec::encoder::audio::Encoder,
    audio: &AudioSegment,
    octx: &mut ffmpeg_next::format::context::Output,
    stream_idx: usize,
    enc_time_base: ffmpeg_next::Rational,
    ost_time_base: ffmpeg_next::Rational,
    frame_size: usize,
) -> Result<(), BoxError> {
    let effective_frame_size = if frame_size == 0 { 1024 } else { frame_size };
    let mut pts: i64 = 0;

    for chunk in audio.samples().chunks(effective_frame_size) {
        let mut frame = ffmpeg_next::util::frame::audio::Audio::new(
            ffmpeg_next::format::Sample::F32(ffmpeg_next::format::sample::Type::Planar),
            chunk.len(),
            ffmpeg_next::ChannelLayout::MONO,
        );
        frame.set_rate(audio.sample_rate());
        frame.set_pts(Some(pts));

        let dst = frame.data_mut(0);
        let src_bytes =
            unsafe { std::slice::from_raw_parts(chunk.as_ptr() as *const u8, chunk.len() * 4) };
        dst[..src_bytes.len()].copy_from_slice(src_bytes);

        encoder.send_frame(&frame)?;
        drain_packets(encoder, octx, stream_idx, enc_time_base, ost_time_base)?;
        pts += chunk.len() as i64;
    }

    encoder.send_eof()?;
    drain_packets(encoder, octx, stream_idx, enc_time_base, ost_time_base)?;
    Ok(())
}

fn drain_packets(
    encoder: &mut ffmpeg_next::codec::encoder::audio::Encoder,
    octx: &mut ffmpeg_next::format::context::Output,
    stream_idx: usize,
    enc_time_base: ffmpeg_next::Rational,
    ost_time_base: ffmpeg_next::Rational,
) -> Result<(), BoxError> {
    let mut encoded = ffmpeg_next::Packet::empty();
    while encoder.receive_packet(&mut encoded).is_ok() {
        encoded.set_stream(stream_idx);
        encoded.rescale_ts(enc_time_base, ost_time_base);
        encoded.write_interleaved(octx)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overlay_missing_dubbed_track_is_error() {
        let muxer = FfmpegMuxer::new(0.3);
        let result = muxer.overlay(
            Path::new("/nonexistent/video.mp4"),
            Path::new("/nonexistent/dubbed.wav"),
            &[],
            true,
            Path::new("/nonexistent/out.mp4"),
        );
        assert!(result.is_err());
    }
}

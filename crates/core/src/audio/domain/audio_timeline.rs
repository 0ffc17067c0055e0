use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::audio_segment::{AudioSegment, FormatMismatch};
use super::silence_detector::SilenceDetection;
use super::speech_synthesizer::SpeechSynthesizer;
use crate::segment::domain::text_segment::{TextSegment, TextSegmentWithAudioTimestamp, Timestamp};
use crate::shared::constants::{DEFAULT_SEGMENT_PAUSE_MS, OUTPUT_SAMPLE_RATE};
use crate::shared::error::DubbingError;
use crate::shared::scratch_space::ScratchSpace;
use crate::video::domain::audio_reader::AudioReader;
use crate::video::domain::audio_writer::AudioWriter;
use crate::voice::domain::voice_assignment::VoiceAssignment;

const DUBBED_TRACK_FILE: &str = "dubbed.wav";

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SynthesisMode {
    /// One synthesis call per segment, each in its speaker's voice.
    #[default]
    PerSegment,
    /// All text in one call with a single voice; spans recovered from pauses.
    SinglePass,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TimelineSettings {
    pub mode: SynthesisMode,
    /// Silence inserted between per-segment clips.
    pub segment_pause_ms: u32,
    pub silence: SilenceDetection,
    pub sample_rate: u32,
}

impl Default for TimelineSettings {
    fn default() -> Self {
        Self {
            mode: SynthesisMode::default(),
            segment_pause_ms: DEFAULT_SEGMENT_PAUSE_MS,
            silence: SilenceDetection::default(),
            sample_rate: OUTPUT_SAMPLE_RATE,
        }
    }
}

/// The synthesized track and where each segment landed in it.
#[derive(Clone, Debug, PartialEq)]
pub struct DubbedTrack {
    pub audio_path: PathBuf,
    pub segments: Vec<TextSegmentWithAudioTimestamp>,
}

/// Synthesizes translated segments into one dubbed track.
pub struct AudioTimelineBuilder {
    synthesizer: Arc<dyn SpeechSynthesizer>,
    reader: Arc<dyn AudioReader>,
    writer: Arc<dyn AudioWriter>,
    settings: TimelineSettings,
}

impl AudioTimelineBuilder {
    pub fn new(
        synthesizer: Arc<dyn SpeechSynthesizer>,
        reader: Arc<dyn AudioReader>,
        writer: Arc<dyn AudioWriter>,
        settings: TimelineSettings,
    ) -> Self {
        Self {
            synthesizer,
            reader,
            writer,
            settings,
        }
    }

    pub fn settings(&self) -> &TimelineSettings {
        &self.settings
    }

    pub fn build(
        &self,
        segments: &[TextSegment],
        voices: &VoiceAssignment,
        language: &str,
        scratch: &ScratchSpace,
    ) -> Result<DubbedTrack, DubbingError> {
        match self.settings.mode {
            SynthesisMode::PerSegment => self.build_per_segment(segments, voices, language, scratch),
            SynthesisMode::SinglePass => self.build_single_pass(segments, voices, language, scratch),
        }
    }

    fn build_per_segment(
        &self,
        segments: &[TextSegment],
        voices: &VoiceAssignment,
        language: &str,
        scratch: &ScratchSpace,
    ) -> Result<DubbedTrack, DubbingError> {
        let rate = self.settings.sample_rate;
        let pause = AudioSegment::silence(self.settings.segment_pause_ms as f64 / 1000.0, rate, 1);
        let mut track = AudioSegment::empty(rate, 1);
        let mut placed = Vec::with_capacity(segments.len());

        for (i, segment) in segments.iter().enumerate() {
            if i > 0 {
                track.append(&pause).map_err(audio_error)?;
            }
            let start = track.duration();

            if !segment.is_blank() {
                let context = format!("segment {i}");
                let voice = voices.voice_for(segment.speaker).ok_or_else(|| {
                    DubbingError::SynthesisFailure {
                        context: context.clone(),
                        reason: format!("no voice assigned to speaker {}", segment.speaker),
                    }
                })?;
                let clip_path = scratch.path(&format!("clip-{i:04}.wav"));
                self.synthesize(segment.text.trim(), voice, language, &clip_path, &context)?;
                let clip = self.read_clip(&clip_path, &context)?;
                track.append(&clip).map_err(audio_error)?;
            }

            placed.push(TextSegmentWithAudioTimestamp {
                segment: segment.clone(),
                audio_timestamp: Timestamp {
                    start,
                    end: track.duration(),
                },
            });
        }

        let audio_path = scratch.path(DUBBED_TRACK_FILE);
        self.write_track(&audio_path, &track)?;
        log::debug!(
            "Per-segment synthesis produced {:.1}s for {} segments",
            track.duration(),
            placed.len()
        );

        Ok(DubbedTrack {
            audio_path,
            segments: placed,
        })
    }

    fn build_single_pass(
        &self,
        segments: &[TextSegment],
        voices: &VoiceAssignment,
        language: &str,
        scratch: &ScratchSpace,
    ) -> Result<DubbedTrack, DubbingError> {
        let spoken: Vec<&TextSegment> = segments.iter().filter(|s| !s.is_blank()).collect();
        let audio_path = scratch.path(DUBBED_TRACK_FILE);
        if spoken.is_empty() {
            log::debug!("Nothing to synthesize in {} segments", segments.len());
            self.write_track(&audio_path, &AudioSegment::empty(self.settings.sample_rate, 1))?;
            return Ok(DubbedTrack {
                audio_path,
                segments: pair_with_spans(segments, &[]),
            });
        }

        let context = "full text".to_string();
        let voice = voices.primary().ok_or_else(|| DubbingError::SynthesisFailure {
            context: context.clone(),
            reason: "no voice assigned".to_string(),
        })?;
        let text = spoken
            .iter()
            .map(|s| s.text.trim())
            .collect::<Vec<_>>()
            .join(" ");

        self.synthesize(&text, voice, language, &audio_path, &context)?;
        let track = self.read_clip(&audio_path, &context)?;

        let spans = self.settings.silence.speech_spans(&track);
        if spans.len() != spoken.len() {
            log::warn!(
                "Detected {} speech spans for {} segments; pairing the first {}",
                spans.len(),
                spoken.len(),
                spans.len().min(spoken.len())
            );
        }

        Ok(DubbedTrack {
            audio_path,
            segments: pair_with_spans(segments, &spans),
        })
    }

    fn synthesize(
        &self,
        text: &str,
        voice: &Path,
        language: &str,
        output: &Path,
        context: &str,
    ) -> Result<(), DubbingError> {
        if !voice.exists() {
            return Err(DubbingError::InputNotFound {
                path: voice.to_path_buf(),
            });
        }
        self.synthesizer
            .synthesize(text, voice, language, output)
            .map_err(|e| DubbingError::SynthesisFailure {
                context: context.to_string(),
                reason: e.to_string(),
            })
    }

    fn write_track(&self, path: &Path, track: &AudioSegment) -> Result<(), DubbingError> {
        self.writer
            .write_audio(path, track)
            .map_err(|e| DubbingError::Audio(format!("writing {}: {e}", path.display())))
    }

    fn read_clip(&self, path: &Path, context: &str) -> Result<AudioSegment, DubbingError> {
        self.reader
            .read_audio(path, self.settings.sample_rate)
            .map_err(|e| DubbingError::Audio(format!("reading {}: {e}", path.display())))?
            .ok_or_else(|| DubbingError::SynthesisFailure {
                context: context.to_string(),
                reason: format!("{} contains no audio", path.display()),
            })
    }
}

/// Pairs non-blank segments with detected spans in order.
///
/// Blank segments get an empty span at the end of the previous one. Segments
/// left over once the spans run out are dropped.
fn pair_with_spans(segments: &[TextSegment], spans: &[Timestamp]) -> Vec<TextSegmentWithAudioTimestamp> {
    let mut spans = spans.iter();
    let mut cursor = 0.0;
    let mut placed = Vec::with_capacity(segments.len());
    for segment in segments {
        let audio_timestamp = if segment.is_blank() {
            Timestamp {
                start: cursor,
                end: cursor,
            }
        } else {
            match spans.next() {
                Some(span) => *span,
                None => break,
            }
        };
        cursor = audio_timestamp.end;
        placed.push(TextSegmentWithAudioTimestamp {
            segment: segment.clone(),
            audio_timestamp,
        });
    }
    placed
}

/// Lays each segment's dubbed span back at its original start time.
///
/// A clip that would overlap the previous one is pushed right until it
/// doesn't. When `base` is given the clips are mixed on top of it. The result
/// is padded with silence to at least `source_duration` seconds.
pub fn realign_to_original(
    dubbed: &AudioSegment,
    segments: &[TextSegmentWithAudioTimestamp],
    base: Option<&AudioSegment>,
    source_duration: f64,
) -> Result<AudioSegment, FormatMismatch> {
    let mut track = match base {
        Some(base) => base.clone(),
        None => AudioSegment::empty(dubbed.sample_rate(), dubbed.channels()),
    };
    let mut cursor: f64 = 0.0;
    for placed in segments {
        let clip = dubbed.slice(placed.audio_timestamp.start, placed.audio_timestamp.end);
        if clip.is_empty() {
            continue;
        }
        let offset = placed.segment.original_timestamp.start.max(cursor);
        track.overlay(&clip, offset)?;
        cursor = offset + clip.duration();
    }
    track.pad_to(source_duration);
    Ok(track)
}

fn audio_error(e: FormatMismatch) -> DubbingError {
    DubbingError::Audio(e.to_string())
}

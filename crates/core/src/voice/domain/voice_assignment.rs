use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::voice_catalog::{CatalogVoice, VoiceCatalog};
use crate::audio::domain::audio_segment::AudioSegment;
use crate::segment::domain::text_segment::{speakers_in_order, TextSegment};
use crate::shared::error::DubbingError;
use crate::shared::scratch_space::ScratchSpace;
use crate::video::domain::audio_writer::AudioWriter;

/// Reference voice sample per speaker index, built once before synthesis.
#[derive(Clone, Debug, PartialEq)]
pub enum VoiceAssignment {
    PerSpeaker(BTreeMap<u32, PathBuf>),
    /// One voice for every speaker.
    Shared(PathBuf),
}

impl VoiceAssignment {
    pub fn voice_for(&self, speaker: u32) -> Option<&Path> {
        match self {
            VoiceAssignment::PerSpeaker(map) => map.get(&speaker).map(PathBuf::as_path),
            VoiceAssignment::Shared(path) => Some(path),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            VoiceAssignment::PerSpeaker(map) => map.len(),
            VoiceAssignment::Shared(_) => 1,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The voice used when a single voice has to speak everything.
    pub fn primary(&self) -> Option<&Path> {
        match self {
            VoiceAssignment::PerSpeaker(map) => map.values().next().map(PathBuf::as_path),
            VoiceAssignment::Shared(path) => Some(path),
        }
    }
}

/// Where reference voices come from, in decreasing priority.
#[derive(Clone, Copy, Debug)]
pub enum VoiceSource<'a> {
    /// Cut each speaker's own speech out of the source waveform.
    Cloning(&'a AudioSegment),
    /// A sample the user uploaded, shared by every speaker.
    Uploaded(&'a Path),
    /// Catalog ids matched to speakers in order of first appearance.
    Catalog(&'a [u32]),
    LanguageDefault,
}

impl<'a> VoiceSource<'a> {
    pub fn choose(
        cloning: bool,
        source_audio: &'a AudioSegment,
        uploaded: Option<&'a Path>,
        voice_ids: &'a [u32],
    ) -> Self {
        if cloning {
            VoiceSource::Cloning(source_audio)
        } else if let Some(path) = uploaded {
            VoiceSource::Uploaded(path)
        } else if !voice_ids.is_empty() {
            VoiceSource::Catalog(voice_ids)
        } else {
            VoiceSource::LanguageDefault
        }
    }
}

/// Resolves a reference voice sample for every speaker in a segment list.
pub struct VoiceAssigner {
    catalog: Arc<dyn VoiceCatalog>,
    writer: Arc<dyn AudioWriter>,
}

impl VoiceAssigner {
    pub fn new(catalog: Arc<dyn VoiceCatalog>, writer: Arc<dyn AudioWriter>) -> Self {
        Self { catalog, writer }
    }

    pub fn assign(
        &self,
        segments: &[TextSegment],
        source: VoiceSource<'_>,
        language: &str,
        scratch: &ScratchSpace,
    ) -> Result<VoiceAssignment, DubbingError> {
        match source {
            VoiceSource::Cloning(audio) => self.clone_voices(segments, audio, scratch),
            VoiceSource::Uploaded(path) => {
                if !path.exists() {
                    return Err(DubbingError::InputNotFound {
                        path: path.to_path_buf(),
                    });
                }
                Ok(VoiceAssignment::Shared(path.to_path_buf()))
            }
            VoiceSource::Catalog(voice_ids) => {
                self.catalog_voices(segments, voice_ids, language, scratch)
            }
            VoiceSource::LanguageDefault => Ok(VoiceAssignment::Shared(
                self.default_voice(language, scratch)?,
            )),
        }
    }

    fn clone_voices(
        &self,
        segments: &[TextSegment],
        audio: &AudioSegment,
        scratch: &ScratchSpace,
    ) -> Result<VoiceAssignment, DubbingError> {
        let mut voices = BTreeMap::new();
        for (speaker, sample) in collect_speaker_audio(segments, audio)? {
            let path = scratch.path(&format!("voice-sample-{speaker}.wav"));
            self.writer
                .write_audio(&path, &sample)
                .map_err(|e| DubbingError::Audio(format!("writing {}: {e}", path.display())))?;
            log::debug!(
                "Speaker {speaker}: {:.1}s reference sample at {}",
                sample.duration(),
                path.display()
            );
            voices.insert(speaker, path);
        }
        Ok(VoiceAssignment::PerSpeaker(voices))
    }

    fn catalog_voices(
        &self,
        segments: &[TextSegment],
        voice_ids: &[u32],
        language: &str,
        scratch: &ScratchSpace,
    ) -> Result<VoiceAssignment, DubbingError> {
        let speakers = speakers_in_order(segments);
        if speakers.len() != voice_ids.len() {
            return Err(DubbingError::AssignmentPrecondition {
                speakers: speakers.len(),
                voice_ids: voice_ids.len(),
            });
        }

        let mut fetched: BTreeMap<u32, PathBuf> = BTreeMap::new();
        let mut default_voice: Option<PathBuf> = None;
        let mut voices = BTreeMap::new();

        for (&speaker, &voice_id) in speakers.iter().zip(voice_ids) {
            let path = match self.catalog.find(voice_id) {
                Some(voice) => match fetched.get(&voice_id) {
                    Some(path) => path.clone(),
                    None => {
                        let dest = scratch.path(&sample_file_name(voice, &voice_id.to_string()));
                        self.fetch(voice, &dest)?;
                        fetched.insert(voice_id, dest.clone());
                        dest
                    }
                },
                None => {
                    log::warn!("Voice {voice_id} is not in the catalog, using the {language} default");
                    match &default_voice {
                        Some(path) => path.clone(),
                        None => {
                            let path = self.default_voice(language, scratch)?;
                            default_voice = Some(path.clone());
                            path
                        }
                    }
                }
            };
            voices.insert(speaker, path);
        }
        Ok(VoiceAssignment::PerSpeaker(voices))
    }

    fn default_voice(&self, language: &str, scratch: &ScratchSpace) -> Result<PathBuf, DubbingError> {
        let voice = self.catalog.find_for_language(language).ok_or_else(|| {
            DubbingError::VoiceCatalog(format!("no catalog voice speaks {language}"))
        })?;
        let dest = scratch.path(&sample_file_name(voice, "default"));
        self.fetch(voice, &dest)?;
        Ok(dest)
    }

    fn fetch(&self, voice: &CatalogVoice, dest: &Path) -> Result<(), DubbingError> {
        self.catalog.fetch_sample(voice, dest).map_err(|e| {
            DubbingError::VoiceCatalog(format!("fetching voice {}: {e}", voice.voice_id))
        })
    }
}

/// Concatenates every segment's span of `audio` per speaker, in segment order.
pub fn collect_speaker_audio(
    segments: &[TextSegment],
    audio: &AudioSegment,
) -> Result<BTreeMap<u32, AudioSegment>, DubbingError> {
    let mut samples: BTreeMap<u32, AudioSegment> = BTreeMap::new();
    for segment in segments {
        let ts = &segment.original_timestamp;
        let span = audio.slice(ts.start, ts.end);
        let entry = samples
            .entry(segment.speaker)
            .or_insert_with(|| AudioSegment::empty(audio.sample_rate(), audio.channels()));
        entry
            .append(&span)
            .map_err(|e| DubbingError::Audio(format!("speaker {} sample: {e}", segment.speaker)))?;
    }
    Ok(samples)
}

fn sample_file_name(voice: &CatalogVoice, tag: &str) -> String {
    let ext = Path::new(&voice.sample)
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("ogg");
    format!("voice-{tag}.{ext}")
}

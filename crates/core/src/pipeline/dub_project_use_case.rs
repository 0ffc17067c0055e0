use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use crate::audio::domain::audio_timeline::{AudioTimelineBuilder, TimelineSettings};
use crate::audio::domain::diarizer::{assign_speakers, Diarizer};
use crate::audio::domain::speech_recognizer::SpeechRecognizer;
use crate::audio::domain::speech_synthesizer::SpeechSynthesizer;
use crate::project::domain::blob_store::BlobStore;
use crate::project::domain::error_reporter::ErrorReporter;
use crate::project::domain::project_store::ProjectStore;
use crate::segment::domain::text_segment::{
    speakers_in_order, validate_segments, TextSegment, TextSegmentWithAudioTimestamp,
};
use crate::shared::error::DubbingError;
use crate::shared::scratch_space::ScratchSpace;
use crate::translation::domain::segment_translation::{SegmentTranslator, TranslationSettings};
use crate::translation::domain::translator::Translator;
use crate::video::domain::audio_reader::AudioReader;
use crate::video::domain::audio_writer::AudioWriter;
use crate::video::domain::media_muxer::MediaMuxer;
use crate::voice::domain::voice_assignment::{VoiceAssigner, VoiceSource};
use crate::voice::domain::voice_catalog::VoiceCatalog;

use super::dubbing_request::DubbingRequest;
use super::job_stage::{JobStage, StageMachine};
use super::pipeline_logger::PipelineLogger;

/// Process-wide service handles, loaded once and shared by every job.
#[derive(Clone)]
pub struct DubbingServices {
    pub blob_store: Arc<dyn BlobStore>,
    pub project_store: Arc<dyn ProjectStore>,
    pub recognizer: Arc<dyn SpeechRecognizer>,
    /// Without one, every segment stays on speaker 0.
    pub diarizer: Option<Arc<dyn Diarizer>>,
    pub translator: Arc<dyn Translator>,
    pub synthesizer: Arc<dyn SpeechSynthesizer>,
    pub voice_catalog: Arc<dyn VoiceCatalog>,
    pub audio_reader: Arc<dyn AudioReader>,
    pub audio_writer: Arc<dyn AudioWriter>,
    pub muxer: Arc<dyn MediaMuxer>,
    pub error_reporter: Arc<dyn ErrorReporter>,
}

#[derive(Clone, Debug)]
pub struct PipelineSettings {
    /// Parent of the per-project scratch directories.
    pub scratch_root: PathBuf,
    pub translation: TranslationSettings,
    pub timeline: TimelineSettings,
    pub remove_original_audio: bool,
}

/// Result of a successful job.
#[derive(Clone, Debug, PartialEq)]
pub struct DubbingOutcome {
    pub translated_file_link: String,
    pub segments: Vec<TextSegmentWithAudioTimestamp>,
}

/// Runs one dubbing job from source download to status update.
///
/// Stateless between calls; the same instance can serve many jobs, including
/// concurrently from several threads.
pub struct DubProjectUseCase {
    services: DubbingServices,
    settings: PipelineSettings,
}

impl DubProjectUseCase {
    pub fn new(services: DubbingServices, settings: PipelineSettings) -> Self {
        Self { services, settings }
    }

    pub fn settings(&self) -> &PipelineSettings {
        &self.settings
    }

    /// Executes every stage in order. On failure the project status is set
    /// to `error` and the failure is returned unchanged.
    pub fn execute(
        &self,
        request: &DubbingRequest,
        logger: &mut dyn PipelineLogger,
    ) -> Result<DubbingOutcome, DubbingError> {
        let started = Instant::now();
        let mut job = JobProgress::new(request, logger);
        log::info!(
            "[{}] Dubbing {} into {}",
            request.project_id,
            request.source_location,
            request.target_language
        );

        let scratch = match ScratchSpace::create(&self.settings.scratch_root, &request.project_id) {
            Ok(scratch) => scratch,
            Err(e) => return Err(self.fail(request, &mut job, e)),
        };

        let produced = self
            .run_stages(request, &mut job, &scratch)
            .and_then(|outcome| job.advance(JobStage::CleaningUp).map(|_| outcome));
        clean_up(&request.project_id, scratch);

        let outcome = match produced.and_then(|outcome| self.finish(request, &mut job, outcome)) {
            Ok(outcome) => outcome,
            Err(e) => return Err(self.fail(request, &mut job, e)),
        };

        log::debug!(
            "[{}] Stages: {}",
            request.project_id,
            job.machine
                .history()
                .iter()
                .map(JobStage::name)
                .collect::<Vec<_>>()
                .join(" -> ")
        );
        job.logger.info(&format!(
            "[{}] Translated in {:.1}s: {}",
            request.project_id,
            started.elapsed().as_secs_f64(),
            outcome.translated_file_link
        ));
        job.logger.summary();
        Ok(outcome)
    }

    fn run_stages(
        &self,
        request: &DubbingRequest,
        job: &mut JobProgress<'_>,
        scratch: &ScratchSpace,
    ) -> Result<DubbingOutcome, DubbingError> {
        let svc = &self.services;
        let language = request.target_language.as_str();

        job.advance(JobStage::Downloading)?;
        let extension = request.source_extension().unwrap_or("bin");
        let source_path = scratch.path(&format!("source.{extension}"));
        svc.blob_store
            .download(&request.source_location, &source_path)?;
        let reference_voice = match &request.reference_voice_location {
            Some(location) if !request.cloning => Some(self.fetch_reference_voice(location, scratch)?),
            _ => None,
        };

        job.advance(JobStage::Transcribing)?;
        let transcription = svc
            .recognizer
            .transcribe(&source_path)
            .map_err(|e| DubbingError::Recognition(e.to_string()))?;
        validate_segments(&transcription.segments)?;
        if transcription.segments.is_empty() {
            log::warn!("[{}] No speech recognized", request.project_id);
        }
        let segments = self.attribute_speakers(request, &source_path, transcription.segments)?;
        job.logger.metric("segments", segments.len() as f64);
        job.logger
            .metric("speakers", speakers_in_order(&segments).len() as f64);

        job.advance(JobStage::Translating)?;
        self.record_status(request, JobStage::Translating, "")?;
        let translated = SegmentTranslator::new(svc.translator.clone(), self.settings.translation)
            .translate(&segments, language)?;

        job.advance(JobStage::Synthesizing)?;
        let source = VoiceSource::choose(
            request.cloning,
            &transcription.audio,
            reference_voice.as_deref(),
            &request.voice_ids,
        );
        let voices = VoiceAssigner::new(svc.voice_catalog.clone(), svc.audio_writer.clone())
            .assign(&translated, source, language, scratch)?;
        let track = AudioTimelineBuilder::new(
            svc.synthesizer.clone(),
            svc.audio_reader.clone(),
            svc.audio_writer.clone(),
            self.settings.timeline,
        )
        .build(&translated, &voices, language, scratch)?;

        let artifact = if request.media_kind().is_video() {
            job.advance(JobStage::Muxing)?;
            svc.muxer
                .overlay(
                    &source_path,
                    &track.audio_path,
                    &track.segments,
                    self.settings.remove_original_audio,
                    &scratch.path(&format!("translated.{extension}")),
                )
                .map_err(|e| DubbingError::Muxing(e.to_string()))?
        } else {
            track.audio_path.clone()
        };

        job.advance(JobStage::Uploading)?;
        let link = svc
            .blob_store
            .upload(&artifact, &request.translated_location())?;

        Ok(DubbingOutcome {
            translated_file_link: link,
            segments: track.segments,
        })
    }

    fn fetch_reference_voice(
        &self,
        location: &str,
        scratch: &ScratchSpace,
    ) -> Result<PathBuf, DubbingError> {
        let extension = Path::new(location)
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("wav");
        let dest = scratch.path(&format!("reference-voice.{extension}"));
        self.services.blob_store.download(location, &dest)?;
        Ok(dest)
    }

    fn attribute_speakers(
        &self,
        request: &DubbingRequest,
        source_path: &Path,
        segments: Vec<TextSegment>,
    ) -> Result<Vec<TextSegment>, DubbingError> {
        if !request.needs_diarization() {
            return Ok(segments);
        }
        let Some(diarizer) = &self.services.diarizer else {
            log::warn!(
                "[{}] Diarization requested but no diarizer is configured; using one speaker",
                request.project_id
            );
            return Ok(segments);
        };
        let turns = diarizer
            .diarize(source_path, request.expected_speakers)
            .map_err(|e| DubbingError::Diarization(e.to_string()))?;
        log::debug!(
            "[{}] {} speaker turns",
            request.project_id,
            turns.len()
        );
        Ok(assign_speakers(&segments, &turns))
    }

    fn finish(
        &self,
        request: &DubbingRequest,
        job: &mut JobProgress<'_>,
        outcome: DubbingOutcome,
    ) -> Result<DubbingOutcome, DubbingError> {
        self.record_status(request, JobStage::Translated, &outcome.translated_file_link)?;
        job.advance(JobStage::Translated)?;
        Ok(outcome)
    }

    /// Writes the project status tied to `stage`, if it has one.
    fn record_status(
        &self,
        request: &DubbingRequest,
        stage: JobStage,
        translated_file_link: &str,
    ) -> Result<(), DubbingError> {
        if let Some(status) = stage.project_status() {
            self.services
                .project_store
                .set_status(&request.project_id, status, translated_file_link)?;
        }
        Ok(())
    }

    fn fail(
        &self,
        request: &DubbingRequest,
        job: &mut JobProgress<'_>,
        error: DubbingError,
    ) -> DubbingError {
        let stage = job.machine.current();
        log::error!(
            "[{}] Failed during {stage}: {error}",
            request.project_id
        );
        self.services
            .error_reporter
            .report(&request.project_id, stage.name(), &error);
        if let Err(e) = job.fail() {
            log::debug!("[{}] {e}", request.project_id);
        }
        if let Err(e) = self.record_status(request, JobStage::Error, "") {
            log::error!(
                "[{}] Could not record error status: {e}",
                request.project_id
            );
        }
        job.logger.summary();
        error
    }
}

fn clean_up(project_id: &str, scratch: ScratchSpace) {
    let dir = scratch.dir().to_path_buf();
    if let Err(e) = scratch.clean_up() {
        log::warn!(
            "[{project_id}] Failed to remove {}: {e}",
            dir.display()
        );
    }
}

/// Stage machine plus per-stage timing for one job.
struct JobProgress<'a> {
    project_id: &'a str,
    machine: StageMachine,
    stage_started: Instant,
    logger: &'a mut dyn PipelineLogger,
}

impl<'a> JobProgress<'a> {
    fn new(request: &'a DubbingRequest, logger: &'a mut dyn PipelineLogger) -> Self {
        Self {
            project_id: &request.project_id,
            machine: StageMachine::new(request.media_kind().is_video()),
            stage_started: Instant::now(),
            logger,
        }
    }

    fn advance(&mut self, to: JobStage) -> Result<(), DubbingError> {
        self.record_stage_time();
        self.machine.advance(to)?;
        self.logger.stage_started(self.project_id, to.name());
        Ok(())
    }

    fn fail(&mut self) -> Result<(), DubbingError> {
        self.record_stage_time();
        self.machine.fail()?;
        self.logger
            .stage_started(self.project_id, JobStage::Error.name());
        Ok(())
    }

    /// Records the time spent in the stage being left.
    fn record_stage_time(&mut self) {
        let leaving = self.machine.current();
        if leaving != JobStage::Queued && !leaving.is_terminal() {
            let elapsed_ms = self.stage_started.elapsed().as_secs_f64() * 1000.0;
            self.logger.timing(leaving.name(), elapsed_ms);
        }
        self.stage_started = Instant::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::domain::audio_segment::AudioSegment;
    use crate::audio::domain::audio_timeline::SynthesisMode;
    use crate::audio::domain::diarizer::SpeakerTurn;
    use crate::audio::domain::speech_recognizer::Transcription;
    use crate::pipeline::pipeline_logger::{NullPipelineLogger, StdoutPipelineLogger};
    use crate::project::domain::blob_store::BlobStoreError;
    use crate::project::domain::error_reporter::NullErrorReporter;
    use crate::project::domain::project_store::ProjectStatus;
    use crate::project::domain::project_store::ProjectStoreError;
    use crate::shared::error::BoxError;
    use crate::voice::domain::voice_catalog::CatalogVoice;
    use std::fs;
    use std::sync::Mutex;

    // --- Stubs ---

    #[derive(Default)]
    struct StubBlobStore {
        downloads: Arc<Mutex<Vec<String>>>,
        uploads: Arc<Mutex<Vec<(PathBuf, String)>>>,
    }

    impl BlobStore for StubBlobStore {
        fn download(&self, remote_path: &str, local_path: &Path) -> Result<(), BlobStoreError> {
            if remote_path.starts_with("missing/") {
                return Err(BlobStoreError::NotFound {
                    remote: remote_path.to_string(),
                });
            }
            self.downloads.lock().unwrap().push(remote_path.to_string());
            fs::write(local_path, b"media").map_err(|e| BlobStoreError::Backend(e.to_string()))
        }

        fn upload(&self, local_path: &Path, remote_path: &str) -> Result<String, BlobStoreError> {
            self.uploads
                .lock()
                .unwrap()
                .push((local_path.to_path_buf(), remote_path.to_string()));
            Ok(format!("https://blobs.test/{remote_path}"))
        }
    }

    #[derive(Default)]
    struct RecordingProjectStore {
        writes: Arc<Mutex<Vec<(String, ProjectStatus, String)>>>,
        unknown: bool,
    }

    impl ProjectStore for RecordingProjectStore {
        fn set_status(
            &self,
            project_id: &str,
            status: ProjectStatus,
            translated_file_link: &str,
        ) -> Result<(), ProjectStoreError> {
            if self.unknown {
                return Err(ProjectStoreError::NotFound {
                    project_id: project_id.to_string(),
                });
            }
            self.writes.lock().unwrap().push((
                project_id.to_string(),
                status,
                translated_file_link.to_string(),
            ));
            Ok(())
        }
    }

    struct StubRecognizer {
        segments: Vec<TextSegment>,
    }

    impl SpeechRecognizer for StubRecognizer {
        fn transcribe(&self, _media_path: &Path) -> Result<Transcription, BoxError> {
            Ok(Transcription {
                segments: self.segments.clone(),
                audio: AudioSegment::new(vec![0.3; 800], 100, 1),
            })
        }
    }

    struct StubDiarizer {
        calls: Arc<Mutex<Vec<Option<usize>>>>,
        turns: Vec<SpeakerTurn>,
    }

    impl Diarizer for StubDiarizer {
        fn diarize(
            &self,
            _media_path: &Path,
            expected_speakers: Option<usize>,
        ) -> Result<Vec<SpeakerTurn>, BoxError> {
            self.calls.lock().unwrap().push(expected_speakers);
            Ok(self.turns.clone())
        }
    }

    #[derive(Default)]
    struct StubTranslator {
        calls: Arc<Mutex<Vec<String>>>,
        fail: bool,
    }

    impl Translator for StubTranslator {
        fn translate(&self, text: &str, _target_language: &str) -> Result<String, BoxError> {
            self.calls.lock().unwrap().push(text.to_string());
            if self.fail {
                return Ok(String::new());
            }
            Ok(text.to_string())
        }
    }

    #[derive(Default)]
    struct RecordingSynthesizer {
        calls: Arc<Mutex<Vec<(String, PathBuf)>>>,
    }

    impl SpeechSynthesizer for RecordingSynthesizer {
        fn synthesize(
            &self,
            text: &str,
            reference_voice: &Path,
            _language: &str,
            output_path: &Path,
        ) -> Result<(), BoxError> {
            self.calls
                .lock()
                .unwrap()
                .push((text.to_string(), reference_voice.to_path_buf()));
            fs::write(output_path, b"wav")?;
            Ok(())
        }
    }

    struct StubCatalog {
        voices: Vec<CatalogVoice>,
        fetched: Arc<Mutex<Vec<u32>>>,
    }

    impl VoiceCatalog for StubCatalog {
        fn voices(&self) -> &[CatalogVoice] {
            &self.voices
        }

        fn fetch_sample(&self, voice: &CatalogVoice, dest: &Path) -> Result<(), BoxError> {
            self.fetched.lock().unwrap().push(voice.voice_id);
            fs::write(dest, b"sample")?;
            Ok(())
        }
    }

    /// Returns the same decoded audio for every path.
    struct FixedReader(AudioSegment);

    impl AudioReader for FixedReader {
        fn read_audio(&self, _path: &Path, _rate: u32) -> Result<Option<AudioSegment>, BoxError> {
            Ok(Some(self.0.clone()))
        }
    }

    struct NullWriter;

    impl AudioWriter for NullWriter {
        fn write_audio(&self, path: &Path, _audio: &AudioSegment) -> Result<(), BoxError> {
            fs::write(path, b"wav")?;
            Ok(())
        }
    }

    #[derive(Default)]
    struct RecordingMuxer {
        calls: Arc<Mutex<Vec<(PathBuf, bool, usize)>>>,
    }

    impl MediaMuxer for RecordingMuxer {
        fn overlay(
            &self,
            _video_path: &Path,
            audio_path: &Path,
            segments: &[TextSegmentWithAudioTimestamp],
            remove_original_audio: bool,
            output_path: &Path,
        ) -> Result<PathBuf, BoxError> {
            self.calls.lock().unwrap().push((
                audio_path.to_path_buf(),
                remove_original_audio,
                segments.len(),
            ));
            Ok(output_path.to_path_buf())
        }
    }

    struct RecordingReporter {
        reports: Arc<Mutex<Vec<(String, String, &'static str)>>>,
    }

    impl ErrorReporter for RecordingReporter {
        fn report(&self, project_id: &str, stage: &str, error: &DubbingError) {
            self.reports.lock().unwrap().push((
                project_id.to_string(),
                stage.to_string(),
                error.kind(),
            ));
        }
    }

    // --- Harness ---

    struct Harness {
        scratch_root: tempfile::TempDir,
        blob_store: Arc<StubBlobStore>,
        project_store: Arc<RecordingProjectStore>,
        translator: Arc<StubTranslator>,
        synthesizer: Arc<RecordingSynthesizer>,
        muxer: Arc<RecordingMuxer>,
        fetched: Arc<Mutex<Vec<u32>>>,
        diarizer_calls: Arc<Mutex<Vec<Option<usize>>>>,
        reports: Arc<Mutex<Vec<(String, String, &'static str)>>>,
        services: DubbingServices,
    }

    fn seg(start: f64, end: f64, text: &str) -> TextSegment {
        TextSegment::new(start, end, text).unwrap()
    }

    fn three_segments() -> Vec<TextSegment> {
        vec![
            seg(0.0, 3.0, "Hello there"),
            seg(3.0, 5.0, "my"),
            seg(5.0, 8.0, "friend"),
        ]
    }

    fn catalog_voice(voice_id: u32, language: &str) -> CatalogVoice {
        CatalogVoice {
            voice_id,
            sample: format!("{voice_id}.ogg"),
            languages: vec![language.to_string()],
        }
    }

    fn harness(clip: AudioSegment, translator: StubTranslator) -> Harness {
        let blob_store = Arc::new(StubBlobStore::default());
        let project_store = Arc::new(RecordingProjectStore::default());
        let translator = Arc::new(translator);
        let synthesizer = Arc::new(RecordingSynthesizer::default());
        let muxer = Arc::new(RecordingMuxer::default());
        let fetched = Arc::new(Mutex::new(Vec::new()));
        let diarizer_calls = Arc::new(Mutex::new(Vec::new()));
        let reports = Arc::new(Mutex::new(Vec::new()));

        let services = DubbingServices {
            blob_store: blob_store.clone(),
            project_store: project_store.clone(),
            recognizer: Arc::new(StubRecognizer {
                segments: three_segments(),
            }),
            diarizer: Some(Arc::new(StubDiarizer {
                calls: diarizer_calls.clone(),
                turns: vec![
                    SpeakerTurn {
                        start: 0.0,
                        end: 3.0,
                        label: "SPEAKER_01".to_string(),
                    },
                    SpeakerTurn {
                        start: 3.0,
                        end: 8.0,
                        label: "SPEAKER_00".to_string(),
                    },
                ],
            })),
            translator: translator.clone(),
            synthesizer: synthesizer.clone(),
            voice_catalog: Arc::new(StubCatalog {
                voices: vec![catalog_voice(7, "de"), catalog_voice(3, "fr"), catalog_voice(4, "fr")],
                fetched: fetched.clone(),
            }),
            audio_reader: Arc::new(FixedReader(clip)),
            audio_writer: Arc::new(NullWriter),
            muxer: muxer.clone(),
            error_reporter: Arc::new(RecordingReporter {
                reports: reports.clone(),
            }),
        };

        Harness {
            scratch_root: tempfile::tempdir().unwrap(),
            blob_store,
            project_store,
            translator,
            synthesizer,
            muxer,
            fetched,
            diarizer_calls,
            reports,
            services,
        }
    }

    impl Harness {
        fn use_case(&self, mode: SynthesisMode, sample_rate: u32) -> DubProjectUseCase {
            let mut timeline = TimelineSettings {
                mode,
                sample_rate,
                ..TimelineSettings::default()
            };
            timeline.silence.silence_thresh_db = -60.0;
            DubProjectUseCase::new(
                self.services.clone(),
                PipelineSettings {
                    scratch_root: self.scratch_root.path().to_path_buf(),
                    translation: TranslationSettings::default(),
                    timeline,
                    remove_original_audio: true,
                },
            )
        }

        fn statuses(&self) -> Vec<(ProjectStatus, String)> {
            self.project_store
                .writes
                .lock()
                .unwrap()
                .iter()
                .map(|(_, status, link)| (*status, link.clone()))
                .collect()
        }

        fn scratch_dir(&self, project_id: &str) -> PathBuf {
            self.scratch_root.path().join(project_id)
        }
    }

    fn one_second_clip() -> AudioSegment {
        AudioSegment::new(vec![0.2; 100], 100, 1)
    }

    fn spans(outcome: &DubbingOutcome) -> Vec<(f64, f64)> {
        outcome
            .segments
            .iter()
            .map(|s| (s.audio_timestamp.start, s.audio_timestamp.end))
            .collect()
    }

    // --- Tests ---

    #[test]
    fn test_per_segment_job_dubs_video_end_to_end() {
        let h = harness(one_second_clip(), StubTranslator::default());
        let request = DubbingRequest::new("p1", "fr", "videos/talk.mp4");
        let mut logger = StdoutPipelineLogger::new();

        let outcome = h
            .use_case(SynthesisMode::PerSegment, 100)
            .execute(&request, &mut logger)
            .unwrap();

        assert_eq!(h.translator.calls.lock().unwrap().len(), 1);
        assert_eq!(*h.fetched.lock().unwrap(), vec![3]);
        let synth_calls = h.synthesizer.calls.lock().unwrap();
        assert_eq!(synth_calls.len(), 3);
        assert!(synth_calls.iter().all(|(_, voice)| voice == &synth_calls[0].1));
        assert_eq!(synth_calls[0].0, "Hello there");

        assert_eq!(spans(&outcome), vec![(0.0, 1.0), (4.0, 5.0), (8.0, 9.0)]);
        for pair in outcome.segments.windows(2) {
            assert!(pair[0].audio_timestamp.end <= pair[1].audio_timestamp.start);
        }

        let link = "https://blobs.test/videos/talk-translated.mp4";
        assert_eq!(outcome.translated_file_link, link);
        assert_eq!(
            h.statuses(),
            vec![
                (ProjectStatus::Translating, String::new()),
                (ProjectStatus::Translated, link.to_string()),
            ]
        );
        let mux_calls = h.muxer.calls.lock().unwrap();
        assert_eq!(mux_calls.len(), 1);
        assert!(mux_calls[0].1);
        assert_eq!(mux_calls[0].2, 3);
        let uploads = h.blob_store.uploads.lock().unwrap();
        assert_eq!(uploads[0].0, h.scratch_dir("p1").join("translated.mp4"));
        assert_eq!(uploads[0].1, "videos/talk-translated.mp4");

        assert!(h.diarizer_calls.lock().unwrap().is_empty());
        assert!(!h.scratch_dir("p1").exists());
        assert_eq!(
            logger.stages(),
            &[
                "downloading",
                "transcribing",
                "translating",
                "synthesizing",
                "muxing",
                "uploading",
                "cleaning_up",
                "translated"
            ]
        );
        assert!(logger.timings_for("translating").is_some());
        assert_eq!(logger.metrics_for("segments"), Some(&[3.0][..]));
    }

    #[test]
    fn test_single_pass_job_synthesizes_once() {
        // 1 kHz: speech 0-1s, 4-5s, 8-9s with 3s pauses between.
        let mut samples = vec![0.0f32; 9000];
        for range in [0..1000, 4000..5000, 8000..9000] {
            for s in &mut samples[range] {
                *s = 0.5;
            }
        }
        let h = harness(AudioSegment::new(samples, 1000, 1), StubTranslator::default());
        let request = DubbingRequest::new("p1", "fr", "videos/talk.mp4");

        let outcome = h
            .use_case(SynthesisMode::SinglePass, 1000)
            .execute(&request, &mut NullPipelineLogger)
            .unwrap();

        let synth_calls = h.synthesizer.calls.lock().unwrap();
        assert_eq!(synth_calls.len(), 1);
        assert_eq!(synth_calls[0].0, "Hello there my friend");
        assert_eq!(*h.fetched.lock().unwrap(), vec![3]);
        assert_eq!(spans(&outcome), vec![(0.0, 1.5), (3.5, 5.5), (7.5, 9.0)]);
    }

    #[test]
    fn test_audio_source_skips_muxing() {
        let h = harness(one_second_clip(), StubTranslator::default());
        let request = DubbingRequest::new("p2", "fr", "podcasts/episode.mp3");
        let mut logger = StdoutPipelineLogger::new();

        let outcome = h
            .use_case(SynthesisMode::PerSegment, 100)
            .execute(&request, &mut logger)
            .unwrap();

        assert!(h.muxer.calls.lock().unwrap().is_empty());
        assert!(!logger.stages().iter().any(|s| s == "muxing"));
        let uploads = h.blob_store.uploads.lock().unwrap();
        assert_eq!(uploads[0].0, h.scratch_dir("p2").join("dubbed.wav"));
        assert_eq!(uploads[0].1, "podcasts/episode-translated.mp3");
        assert_eq!(
            outcome.translated_file_link,
            "https://blobs.test/podcasts/episode-translated.mp3"
        );
    }

    #[test]
    fn test_translation_failure_writes_error_status_once() {
        let h = harness(
            one_second_clip(),
            StubTranslator {
                fail: true,
                ..StubTranslator::default()
            },
        );
        let request = DubbingRequest::new("p1", "fr", "videos/talk.mp4");

        let err = h
            .use_case(SynthesisMode::PerSegment, 100)
            .execute(&request, &mut NullPipelineLogger)
            .unwrap_err();

        assert!(matches!(err, DubbingError::TranslationFailure { chunk_index: 0, .. }));
        assert_eq!(
            h.statuses(),
            vec![
                (ProjectStatus::Translating, String::new()),
                (ProjectStatus::Error, String::new()),
            ]
        );
        assert!(h.synthesizer.calls.lock().unwrap().is_empty());
        assert!(h.blob_store.uploads.lock().unwrap().is_empty());
        assert_eq!(
            *h.reports.lock().unwrap(),
            vec![(
                "p1".to_string(),
                "translating".to_string(),
                "translation_failure"
            )]
        );
        assert!(!h.scratch_dir("p1").exists());
    }

    #[test]
    fn test_missing_source_fails_before_transcription() {
        let h = harness(one_second_clip(), StubTranslator::default());
        let request = DubbingRequest::new("p1", "fr", "missing/talk.mp4");

        let err = h
            .use_case(SynthesisMode::PerSegment, 100)
            .execute(&request, &mut NullPipelineLogger)
            .unwrap_err();

        assert_eq!(err.kind(), "input_not_found");
        assert_eq!(h.statuses(), vec![(ProjectStatus::Error, String::new())]);
        assert!(h.translator.calls.lock().unwrap().is_empty());
        assert!(!h.scratch_dir("p1").exists());
    }

    #[test]
    fn test_voice_id_mismatch_fails_before_synthesis() {
        let h = harness(one_second_clip(), StubTranslator::default());
        let mut request = DubbingRequest::new("p1", "fr", "videos/talk.mp4");
        request.voice_ids = vec![3, 4, 7];

        let err = h
            .use_case(SynthesisMode::PerSegment, 100)
            .execute(&request, &mut NullPipelineLogger)
            .unwrap_err();

        assert!(matches!(
            err,
            DubbingError::AssignmentPrecondition {
                speakers: 2,
                voice_ids: 3
            }
        ));
        assert!(h.synthesizer.calls.lock().unwrap().is_empty());
        assert!(h.fetched.lock().unwrap().is_empty());
    }

    #[test]
    fn test_catalog_voices_follow_diarized_speakers() {
        let h = harness(one_second_clip(), StubTranslator::default());
        let mut request = DubbingRequest::new("p1", "fr", "videos/talk.mp4");
        request.voice_ids = vec![4, 3];
        request.expected_speakers = Some(2);

        h.use_case(SynthesisMode::PerSegment, 100)
            .execute(&request, &mut NullPipelineLogger)
            .unwrap();

        assert_eq!(*h.diarizer_calls.lock().unwrap(), vec![Some(2)]);
        // SPEAKER_01 speaks first, so it becomes speaker 0 and takes voice 4.
        let scratch = h.scratch_dir("p1");
        let synth_calls = h.synthesizer.calls.lock().unwrap();
        assert_eq!(synth_calls[0].1, scratch.join("voice-4.ogg"));
        assert_eq!(synth_calls[1].1, scratch.join("voice-3.ogg"));
        assert_eq!(synth_calls[2].1, scratch.join("voice-3.ogg"));
    }

    #[test]
    fn test_uploaded_reference_voice_is_downloaded_and_shared() {
        let h = harness(one_second_clip(), StubTranslator::default());
        let mut request = DubbingRequest::new("p1", "fr", "videos/talk.mp4");
        request.reference_voice_location = Some("voices/me.ogg".to_string());

        h.use_case(SynthesisMode::PerSegment, 100)
            .execute(&request, &mut NullPipelineLogger)
            .unwrap();

        assert_eq!(
            *h.blob_store.downloads.lock().unwrap(),
            vec!["videos/talk.mp4".to_string(), "voices/me.ogg".to_string()]
        );
        assert!(h.fetched.lock().unwrap().is_empty());
        let expected = h.scratch_dir("p1").join("reference-voice.ogg");
        let synth_calls = h.synthesizer.calls.lock().unwrap();
        assert!(synth_calls.iter().all(|(_, voice)| voice == &expected));
    }

    #[test]
    fn test_unknown_project_surfaces_project_not_found() {
        let mut h = harness(one_second_clip(), StubTranslator::default());
        let unknown_store: Arc<dyn ProjectStore> = Arc::new(RecordingProjectStore {
            unknown: true,
            ..RecordingProjectStore::default()
        });
        let reporter: Arc<dyn ErrorReporter> = Arc::new(NullErrorReporter);
        h.services.project_store = unknown_store;
        h.services.error_reporter = reporter;
        let request = DubbingRequest::new("ghost", "fr", "videos/talk.mp4");

        let err = h
            .use_case(SynthesisMode::PerSegment, 100)
            .execute(&request, &mut NullPipelineLogger)
            .unwrap_err();

        assert!(matches!(err, DubbingError::ProjectNotFound { ref project_id } if project_id == "ghost"));
        assert!(h.translator.calls.lock().unwrap().is_empty());
        assert!(!h.scratch_dir("ghost").exists());
    }
}

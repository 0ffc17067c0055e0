use serde::{Deserialize, Serialize};

use super::audio_segment::AudioSegment;
use crate::segment::domain::text_segment::Timestamp;
use crate::shared::constants::{
    DEFAULT_MIN_SILENCE_MS, DEFAULT_SILENCE_PADDING_MS, DEFAULT_SILENCE_THRESH_DB,
};

/// Parameters for splitting a synthesized track at its pauses.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SilenceDetection {
    /// Minimum length of a pause, in milliseconds.
    pub min_silence_ms: u32,
    /// Windows whose RMS level is at or below this (dBFS) count as silent.
    pub silence_thresh_db: f64,
    /// Added on both sides of every detected span, in milliseconds.
    pub padding_ms: u32,
}

impl Default for SilenceDetection {
    fn default() -> Self {
        Self {
            min_silence_ms: DEFAULT_MIN_SILENCE_MS,
            silence_thresh_db: DEFAULT_SILENCE_THRESH_DB,
            padding_ms: DEFAULT_SILENCE_PADDING_MS,
        }
    }
}

impl SilenceDetection {
    /// Non-silent spans of `audio` in seconds, padded and clamped to the track.
    pub fn speech_spans(&self, audio: &AudioSegment) -> Vec<Timestamp> {
        let total_ms = track_ms(audio);
        let spans = detect_nonsilent(audio, self.min_silence_ms, self.silence_thresh_db);
        pad_spans(&spans, self.padding_ms as u64, total_ms)
    }
}

/// Length of the track in whole milliseconds.
fn track_ms(audio: &AudioSegment) -> u64 {
    (audio.duration() * 1000.0).round() as u64
}

/// Finds `[start, end)` millisecond ranges that are not silent.
///
/// A silent range is any run of at least `min_silence_ms` whose RMS level is
/// at or below `silence_thresh_db` dBFS, probed in 1 ms steps.
pub fn detect_nonsilent(
    audio: &AudioSegment,
    min_silence_ms: u32,
    silence_thresh_db: f64,
) -> Vec<(u64, u64)> {
    let total_ms = track_ms(audio);
    let silent = detect_silence(audio, min_silence_ms as u64, silence_thresh_db);

    if silent.is_empty() {
        return if total_ms > 0 {
            vec![(0, total_ms)]
        } else {
            Vec::new()
        };
    }
    if silent.len() == 1 && silent[0] == (0, total_ms) {
        return Vec::new();
    }

    let mut spans = Vec::new();
    let mut prev_end = 0;
    for &(start, end) in &silent {
        if start > prev_end {
            spans.push((prev_end, start));
        }
        prev_end = end;
    }
    if prev_end < total_ms {
        spans.push((prev_end, total_ms));
    }
    spans
}

fn detect_silence(audio: &AudioSegment, min_silence_ms: u64, silence_thresh_db: f64) -> Vec<(u64, u64)> {
    let total_ms = track_ms(audio);
    if min_silence_ms == 0 || total_ms < min_silence_ms {
        return Vec::new();
    }

    // prefix[i] = sum of squares of the first i samples
    let samples = audio.samples();
    let mut prefix = Vec::with_capacity(samples.len() + 1);
    prefix.push(0.0f64);
    let mut acc = 0.0f64;
    for s in samples {
        acc += (*s as f64) * (*s as f64);
        prefix.push(acc);
    }

    let threshold = 10f64.powf(silence_thresh_db / 20.0);
    let rate = audio.sample_rate() as u64;
    let channels = audio.channels() as usize;
    let index_at = |ms: u64| ((ms * rate / 1000) as usize * channels).min(samples.len());
    let is_silent = |from_ms: u64| {
        let a = index_at(from_ms);
        let b = index_at(from_ms + min_silence_ms);
        if b <= a {
            return true;
        }
        let rms = ((prefix[b] - prefix[a]) / (b - a) as f64).sqrt();
        rms <= threshold
    };

    let mut ranges: Vec<(u64, u64)> = Vec::new();
    for start in 0..=(total_ms - min_silence_ms) {
        if !is_silent(start) {
            continue;
        }
        let end = start + min_silence_ms;
        match ranges.last_mut() {
            Some(last) if start <= last.1 => last.1 = end,
            _ => ranges.push((start, end)),
        }
    }
    ranges
}

/// Widens each span by `padding_ms` on both sides, clamped to `[0, total_ms]`,
/// and converts to seconds.
pub fn pad_spans(spans: &[(u64, u64)], padding_ms: u64, total_ms: u64) -> Vec<Timestamp> {
    spans
        .iter()
        .map(|&(start, end)| {
            let start = start.saturating_sub(padding_ms).min(total_ms);
            let end = end.saturating_add(padding_ms).min(total_ms).max(start);
            Timestamp {
                start: start as f64 / 1000.0,
                end: end as f64 / 1000.0,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    const RATE: u32 = 1000;

    /// Builds a 1 kHz mono track from (duration_ms, loud) pieces. Tests use a
    /// -60 dBFS threshold so a single loud sample makes a window non-silent.
    fn track(pieces: &[(usize, bool)]) -> AudioSegment {
        let mut samples = Vec::new();
        for &(ms, loud) in pieces {
            let value = if loud { 0.5 } else { 0.0 };
            samples.extend(std::iter::repeat(value).take(ms * RATE as usize / 1000));
        }
        AudioSegment::new(samples, RATE, 1)
    }

    #[test]
    fn test_all_loud_is_one_span() {
        let audio = track(&[(3000, true)]);
        assert_eq!(detect_nonsilent(&audio, 2000, -60.0), vec![(0, 3000)]);
    }

    #[test]
    fn test_all_silent_is_empty() {
        let audio = track(&[(5000, false)]);
        assert!(detect_nonsilent(&audio, 2000, -60.0).is_empty());
    }

    #[test]
    fn test_short_pause_does_not_split() {
        let audio = track(&[(1000, true), (500, false), (1000, true)]);
        assert_eq!(detect_nonsilent(&audio, 2000, -60.0), vec![(0, 2500)]);
    }

    #[test]
    fn test_long_pauses_split_segments() {
        let audio = track(&[
            (1000, true),
            (3000, false),
            (2000, true),
            (3000, false),
            (500, true),
        ]);
        assert_eq!(
            detect_nonsilent(&audio, 2000, -60.0),
            vec![(0, 1000), (4000, 6000), (9000, 9500)]
        );
    }

    #[test]
    fn test_leading_and_trailing_silence_excluded() {
        let audio = track(&[(2500, false), (1000, true), (2500, false)]);
        assert_eq!(detect_nonsilent(&audio, 2000, -60.0), vec![(2500, 3500)]);
    }

    #[test]
    fn test_track_shorter_than_min_silence_is_one_span() {
        let audio = track(&[(800, false)]);
        assert_eq!(detect_nonsilent(&audio, 2000, -60.0), vec![(0, 800)]);
    }

    #[rstest]
    #[case::near_start(vec![(100, 900)], 500, 1000)]
    #[case::near_end(vec![(200, 990)], 500, 1000)]
    #[case::huge_padding(vec![(300, 400)], u64::MAX, 1000)]
    #[case::zero_padding(vec![(0, 1000)], 0, 1000)]
    #[case::span_past_end(vec![(900, 1500)], 10, 1000)]
    fn test_padding_is_clamped(
        #[case] spans: Vec<(u64, u64)>,
        #[case] padding: u64,
        #[case] total_ms: u64,
    ) {
        let total = total_ms as f64 / 1000.0;
        for ts in pad_spans(&spans, padding, total_ms) {
            assert!(ts.start >= 0.0);
            assert!(ts.end <= total);
            assert!(ts.start <= ts.end);
        }
    }

    #[test]
    fn test_quiet_noise_counts_as_silence() {
        let mut samples = vec![0.5f32; 1000];
        samples.extend(std::iter::repeat(0.01f32).take(3000));
        samples.extend(std::iter::repeat(0.5f32).take(1000));
        let audio = AudioSegment::new(samples, RATE, 1);
        let spans = detect_nonsilent(&audio, 2000, -30.0);
        assert_eq!(spans.len(), 2);
        // A window holding a few loud samples still averages below -30 dBFS,
        // so boundaries may move inward by several milliseconds.
        assert_eq!(spans[0].0, 0);
        assert!((990..=1000).contains(&spans[0].1));
        assert!((4000..=4010).contains(&spans[1].0));
        assert_eq!(spans[1].1, 5000);
    }

    #[test]
    fn test_padding_widens_interior_span() {
        let padded = pad_spans(&[(2000, 3000)], 500, 10_000);
        assert_eq!(padded[0].start, 1.5);
        assert_eq!(padded[0].end, 3.5);
    }

    #[test]
    fn test_speech_spans_uses_settings() {
        let audio = track(&[(1000, true), (3000, false), (1000, true)]);
        let settings = SilenceDetection {
            min_silence_ms: 2000,
            silence_thresh_db: -60.0,
            padding_ms: 500,
        };
        let spans = settings.speech_spans(&audio);
        assert_eq!(spans.len(), 2);
        assert_eq!((spans[0].start, spans[0].end), (0.0, 1.5));
        assert_eq!((spans[1].start, spans[1].end), (3.5, 5.0));
    }
}

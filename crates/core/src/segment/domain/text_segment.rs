use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SegmentError {
    #[error("timestamp start {start} is after end {end}")]
    Inverted { start: f64, end: f64 },
    #[error("timestamp ({start}, {end}) must be finite and non-negative")]
    OutOfRange { start: f64, end: f64 },
    #[error("segment {index} starts at {start}s, before the previous segment ({previous}s)")]
    OutOfOrder {
        index: usize,
        start: f64,
        previous: f64,
    },
}

/// A `(start, end)` span in seconds.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Timestamp {
    pub start: f64,
    pub end: f64,
}

impl Timestamp {
    pub fn new(start: f64, end: f64) -> Result<Self, SegmentError> {
        let ts = Self { start, end };
        ts.validate()?;
        Ok(ts)
    }

    pub fn validate(&self) -> Result<(), SegmentError> {
        if !self.start.is_finite() || !self.end.is_finite() || self.start < 0.0 {
            return Err(SegmentError::OutOfRange {
                start: self.start,
                end: self.end,
            });
        }
        if self.start > self.end {
            return Err(SegmentError::Inverted {
                start: self.start,
                end: self.end,
            });
        }
        Ok(())
    }

    pub fn duration(&self) -> f64 {
        self.end - self.start
    }

    /// Length of the intersection with `other`, 0 if disjoint.
    pub fn overlap(&self, other: &Timestamp) -> f64 {
        (self.end.min(other.end) - self.start.max(other.start)).max(0.0)
    }
}

/// A contiguous span of source speech attributed to one speaker.
///
/// `speaker` is a small per-job index, not a global identity.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TextSegment {
    pub original_timestamp: Timestamp,
    pub text: String,
    #[serde(default)]
    pub speaker: u32,
}

impl TextSegment {
    pub fn new(start: f64, end: f64, text: impl Into<String>) -> Result<Self, SegmentError> {
        Ok(Self {
            original_timestamp: Timestamp::new(start, end)?,
            text: text.into(),
            speaker: 0,
        })
    }

    pub fn with_speaker(mut self, speaker: u32) -> Self {
        self.speaker = speaker;
        self
    }

    /// Copy of this segment carrying different text; timing and speaker are kept.
    pub fn with_text(&self, text: impl Into<String>) -> Self {
        Self {
            original_timestamp: self.original_timestamp,
            text: text.into(),
            speaker: self.speaker,
        }
    }

    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }
}

/// A segment placed on the synthesized audio track.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TextSegmentWithAudioTimestamp {
    #[serde(flatten)]
    pub segment: TextSegment,
    pub audio_timestamp: Timestamp,
}

/// Checks every timestamp and that starts never decrease.
pub fn validate_segments(segments: &[TextSegment]) -> Result<(), SegmentError> {
    let mut previous: Option<f64> = None;
    for (index, segment) in segments.iter().enumerate() {
        segment.original_timestamp.validate()?;
        let start = segment.original_timestamp.start;
        if let Some(prev) = previous {
            if start < prev {
                return Err(SegmentError::OutOfOrder {
                    index,
                    start,
                    previous: prev,
                });
            }
        }
        previous = Some(start);
    }
    Ok(())
}

/// Distinct speaker indices in order of first appearance.
pub fn speakers_in_order(segments: &[TextSegment]) -> Vec<u32> {
    let mut seen = HashSet::new();
    segments
        .iter()
        .map(|s| s.speaker)
        .filter(|speaker| seen.insert(*speaker))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rstest::rstest;

    fn seg(start: f64, end: f64, speaker: u32) -> TextSegment {
        TextSegment::new(start, end, "text").unwrap().with_speaker(speaker)
    }

    #[test]
    fn test_new_defaults_to_speaker_zero() {
        let s = TextSegment::new(0.0, 3.36, " I wake up").unwrap();
        assert_eq!(s.speaker, 0);
        assert_eq!(s.text, " I wake up");
    }

    #[rstest]
    #[case::inverted(3.0, 1.0)]
    #[case::negative_start(-0.5, 1.0)]
    #[case::nan(f64::NAN, 1.0)]
    #[case::infinite_end(0.0, f64::INFINITY)]
    fn test_new_rejects_bad_timestamps(#[case] start: f64, #[case] end: f64) {
        assert!(TextSegment::new(start, end, "x").is_err());
    }

    #[test]
    fn test_zero_length_segment_is_valid() {
        assert!(TextSegment::new(2.0, 2.0, "um").is_ok());
    }

    #[test]
    fn test_with_text_keeps_timing_and_speaker() {
        let s = seg(1.0, 2.0, 3);
        let t = s.with_text("bonjour");
        assert_eq!(t.text, "bonjour");
        assert_eq!(t.speaker, 3);
        assert_eq!(t.original_timestamp, s.original_timestamp);
        assert_eq!(s.text, "text");
    }

    #[test]
    fn test_overlap() {
        let a = Timestamp::new(0.0, 3.0).unwrap();
        let b = Timestamp::new(2.0, 5.0).unwrap();
        let c = Timestamp::new(4.0, 6.0).unwrap();
        assert_relative_eq!(a.overlap(&b), 1.0);
        assert_relative_eq!(a.overlap(&c), 0.0);
    }

    #[test]
    fn test_validate_segments_accepts_equal_starts() {
        let segments = vec![seg(0.0, 1.0, 0), seg(0.0, 2.0, 0), seg(3.0, 4.0, 1)];
        assert!(validate_segments(&segments).is_ok());
    }

    #[test]
    fn test_validate_segments_rejects_reordering() {
        let segments = vec![seg(0.0, 1.0, 0), seg(5.0, 6.0, 0), seg(3.0, 4.0, 0)];
        assert_eq!(
            validate_segments(&segments),
            Err(SegmentError::OutOfOrder {
                index: 2,
                start: 3.0,
                previous: 5.0
            })
        );
    }

    #[test]
    fn test_speakers_in_first_appearance_order() {
        let segments = vec![seg(0.0, 1.0, 1), seg(1.0, 2.0, 0), seg(2.0, 3.0, 0), seg(3.0, 4.0, 1)];
        assert_eq!(speakers_in_order(&segments), vec![1, 0]);
    }

    #[test]
    fn test_with_audio_timestamp_serializes_flat() {
        let s = TextSegmentWithAudioTimestamp {
            segment: seg(0.0, 1.0, 2),
            audio_timestamp: Timestamp::new(0.5, 1.5).unwrap(),
        };
        let json = serde_json::to_value(&s).unwrap();
        assert_eq!(json["speaker"], 2);
        assert_eq!(json["audio_timestamp"]["start"], 0.5);
        assert_eq!(json["original_timestamp"]["end"], 1.0);
    }
}

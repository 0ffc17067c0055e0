use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::segment::domain::speaker_registry::SpeakerRegistry;
use crate::segment::domain::text_segment::{TextSegment, Timestamp};
use crate::shared::error::BoxError;

/// One diarizer turn: a span attributed to an opaque speaker label.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SpeakerTurn {
    pub start: f64,
    pub end: f64,
    #[serde(alias = "speaker")]
    pub label: String,
}

/// Domain interface for speaker diarization.
pub trait Diarizer: Send + Sync {
    /// Returns turns ordered by start time.
    fn diarize(
        &self,
        media_path: &Path,
        expected_speakers: Option<usize>,
    ) -> Result<Vec<SpeakerTurn>, BoxError>;
}

/// Attributes each segment to the turn it overlaps most.
///
/// Labels become indices in order of first appearance among the turns. A
/// segment overlapping no turn takes the turn whose midpoint is closest to its
/// own. With no turns at all the segments are returned unchanged.
pub fn assign_speakers(segments: &[TextSegment], turns: &[SpeakerTurn]) -> Vec<TextSegment> {
    if turns.is_empty() {
        return segments.to_vec();
    }

    let mut registry = SpeakerRegistry::new();
    let indices: Vec<u32> = turns.iter().map(|t| registry.index_for(&t.label)).collect();
    for index in 0..registry.len() as u32 {
        if let Some(label) = registry.label(index) {
            log::debug!("Speaker {index} is diarizer label {label}");
        }
    }

    segments
        .iter()
        .map(|segment| {
            let turn = best_turn(&segment.original_timestamp, turns);
            segment.clone().with_speaker(indices[turn])
        })
        .collect()
}

fn best_turn(span: &Timestamp, turns: &[SpeakerTurn]) -> usize {
    let mut best = 0;
    let mut best_overlap = 0.0;
    for (i, turn) in turns.iter().enumerate() {
        let overlap = span.overlap(&Timestamp {
            start: turn.start,
            end: turn.end,
        });
        if overlap > best_overlap {
            best = i;
            best_overlap = overlap;
        }
    }
    if best_overlap > 0.0 {
        return best;
    }

    let mid = (span.start + span.end) / 2.0;
    let distance = |t: &SpeakerTurn| ((t.start + t.end) / 2.0 - mid).abs();
    turns
        .iter()
        .enumerate()
        .min_by(|(_, a), (_, b)| distance(a).total_cmp(&distance(b)))
        .map(|(i, _)| i)
        .unwrap_or(0)
}

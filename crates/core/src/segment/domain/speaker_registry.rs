use std::collections::HashMap;

/// Maps opaque diarizer labels ("SPEAKER_01", "spk3", ...) to small
/// indices assigned in order of first appearance.
#[derive(Debug, Default)]
pub struct SpeakerRegistry {
    indices: HashMap<String, u32>,
    labels: Vec<String>,
}

impl SpeakerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn index_for(&mut self, label: &str) -> u32 {
        if let Some(index) = self.indices.get(label) {
            return *index;
        }
        let index = self.labels.len() as u32;
        self.indices.insert(label.to_string(), index);
        self.labels.push(label.to_string());
        index
    }

    pub fn label(&self, index: u32) -> Option<&str> {
        self.labels.get(index as usize).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

/// Marks the start of a segment inside a chunk.
pub const SEGMENT_OPEN: char = '[';
/// Marks the end of a segment inside a chunk.
pub const SEGMENT_CLOSE: char = ']';

/// Packs segment texts into size-bounded, delimiter-marked chunks and splits
/// translated chunks back into per-segment texts.
///
/// Lengths are counted in characters, delimiters included.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TextChunker {
    max_chunk_len: usize,
}

impl TextChunker {
    pub fn new(max_chunk_len: usize) -> Self {
        Self {
            max_chunk_len: max_chunk_len.max(1),
        }
    }

    pub fn max_chunk_len(&self) -> usize {
        self.max_chunk_len
    }

    /// Wraps each text in delimiters and packs them in order.
    ///
    /// A chunk is closed when the next wrapped text would push it past the
    /// limit. A text that alone exceeds the limit gets a chunk of its own.
    pub fn chunk<S: AsRef<str>>(&self, texts: &[S]) -> Vec<String> {
        let mut chunks = Vec::new();
        let mut current = String::new();
        let mut current_len = 0;

        for text in texts {
            let unit = wrap(text.as_ref());
            let unit_len = unit.chars().count();
            if current_len > 0 && current_len + unit_len > self.max_chunk_len {
                chunks.push(std::mem::take(&mut current));
                current_len = 0;
            }
            current.push_str(&unit);
            current_len += unit_len;
        }
        if current_len > 0 {
            chunks.push(current);
        }
        chunks
    }

    /// Joins translated chunks in order and splits on the delimiters,
    /// dropping whitespace-only fragments.
    pub fn reassemble<S: AsRef<str>>(chunks: &[S]) -> Vec<String> {
        let combined: String = chunks.iter().map(|c| c.as_ref()).collect();
        combined
            .split(|c: char| c == SEGMENT_OPEN || c == SEGMENT_CLOSE)
            .filter(|fragment| !fragment.trim().is_empty())
            .map(str::to_string)
            .collect()
    }
}

/// Delimiters inside a text would fabricate boundaries, so they become parentheses.
fn wrap(text: &str) -> String {
    let mut unit = String::with_capacity(text.len() + 2);
    unit.push(SEGMENT_OPEN);
    for c in text.chars() {
        unit.push(match c {
            SEGMENT_OPEN => '(',
            SEGMENT_CLOSE => ')',
            other => other,
        });
    }
    unit.push(SEGMENT_CLOSE);
    unit
}

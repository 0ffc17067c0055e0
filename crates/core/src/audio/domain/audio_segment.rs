/// A segment of decoded audio: interleaved PCM samples normalized to [-1.0, 1.0].
#[derive(Clone, Debug, PartialEq)]
pub struct AudioSegment {
    samples: Vec<f32>,
    sample_rate: u32,
    channels: u16,
}

impl AudioSegment {
    pub fn new(samples: Vec<f32>, sample_rate: u32, channels: u16) -> Self {
        Self {
            samples,
            sample_rate,
            channels: channels.max(1),
        }
    }

    /// An empty track with the given format.
    pub fn empty(sample_rate: u32, channels: u16) -> Self {
        Self::new(Vec::new(), sample_rate, channels)
    }

    pub fn silence(duration: f64, sample_rate: u32, channels: u16) -> Self {
        let mut seg = Self::empty(sample_rate, channels);
        let len = seg.sample_index_at_time(duration.max(0.0));
        seg.samples = vec![0.0; len];
        seg
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn channels(&self) -> u16 {
        self.channels
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn duration(&self) -> f64 {
        self.samples.len() as f64 / (self.sample_rate as f64 * self.channels as f64)
    }

    /// Index of the first sample at `time`, aligned to a frame boundary.
    pub fn sample_index_at_time(&self, time: f64) -> usize {
        let frame = (time.max(0.0) * self.sample_rate as f64) as usize;
        frame * self.channels as usize
    }

    /// Copy of the `[start, end)` span in seconds, clamped to the track.
    pub fn slice(&self, start: f64, end: f64) -> AudioSegment {
        let len = self.samples.len();
        let from = self.sample_index_at_time(start).min(len);
        let to = self.sample_index_at_time(end).min(len).max(from);
        AudioSegment::new(self.samples[from..to].to_vec(), self.sample_rate, self.channels)
    }

    /// Appends `other`, which must share this segment's format.
    pub fn append(&mut self, other: &AudioSegment) -> Result<(), FormatMismatch> {
        self.check_format(other)?;
        self.samples.extend_from_slice(other.samples());
        Ok(())
    }

    /// Adds `other` into this track starting at `offset` seconds, growing the
    /// track if needed. Sums are clamped to [-1.0, 1.0].
    pub fn overlay(&mut self, other: &AudioSegment, offset: f64) -> Result<(), FormatMismatch> {
        self.check_format(other)?;
        let start = self.sample_index_at_time(offset);
        let needed = start + other.samples.len();
        if self.samples.len() < needed {
            self.samples.resize(needed, 0.0);
        }
        for (dst, src) in self.samples[start..needed].iter_mut().zip(other.samples()) {
            *dst = (*dst + *src).clamp(-1.0, 1.0);
        }
        Ok(())
    }

    /// Extends the track with silence up to `duration` seconds.
    pub fn pad_to(&mut self, duration: f64) {
        let len = self.sample_index_at_time(duration);
        if self.samples.len() < len {
            self.samples.resize(len, 0.0);
        }
    }

    pub fn scale(&mut self, gain: f32) {
        for s in self.samples.iter_mut() {
            *s = (*s * gain).clamp(-1.0, 1.0);
        }
    }

    fn check_format(&self, other: &AudioSegment) -> Result<(), FormatMismatch> {
        if self.sample_rate != other.sample_rate || self.channels != other.channels {
            return Err(FormatMismatch {
                expected: (self.sample_rate, self.channels),
                actual: (other.sample_rate, other.channels),
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("audio format mismatch: expected {expected:?} (rate, channels), got {actual:?}")]
pub struct FormatMismatch {
    pub expected: (u32, u16),
    pub actual: (u32, u16),
}

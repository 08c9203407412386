//! Two-channel sample buffer rendered notes accumulate into.

/// Equal-length left/right f32 channels at a fixed sample rate.
#[derive(Debug, Clone, PartialEq)]
pub struct StereoBuffer {
    left: Vec<f32>,
    right: Vec<f32>,
    sample_rate: f64,
}

impl StereoBuffer {
    /// A silent buffer of `len` samples per channel.
    pub fn new(len: usize, sample_rate: f64) -> Self {
        StereoBuffer {
            left: vec![0.0; len],
            right: vec![0.0; len],
            sample_rate,
        }
    }

    /// A silent buffer holding `⌊duration · sample_rate⌋` samples.
    pub fn with_duration(duration: f64, sample_rate: f64) -> Self {
        Self::new(seconds_to_samples(duration, sample_rate), sample_rate)
    }

    /// Build from existing channels. The shorter channel is zero-padded.
    pub fn from_channels(mut left: Vec<f32>, mut right: Vec<f32>, sample_rate: f64) -> Self {
        let len = left.len().max(right.len());
        left.resize(len, 0.0);
        right.resize(len, 0.0);
        StereoBuffer {
            left,
            right,
            sample_rate,
        }
    }

    /// Samples per channel.
    pub fn len(&self) -> usize {
        self.left.len()
    }

    pub fn is_empty(&self) -> bool {
        self.left.is_empty()
    }

    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    /// Length in seconds.
    pub fn duration(&self) -> f64 {
        self.len() as f64 / self.sample_rate
    }

    pub fn left(&self) -> &[f32] {
        &self.left
    }

    pub fn right(&self) -> &[f32] {
        &self.right
    }

    /// Add a stereo sample pair at `index`. Out-of-range writes are dropped.
    #[inline]
    pub fn add(&mut self, index: usize, left: f64, right: f64) {
        if index < self.left.len() {
            self.left[index] += left as f32;
            self.right[index] += right as f32;
        }
    }

    /// Largest absolute sample over both channels.
    pub fn peak(&self) -> f32 {
        self.left
            .iter()
            .chain(&self.right)
            .fold(0.0_f32, |m, s| m.max(s.abs()))
    }

    /// Interleaved `[l0, r0, l1, r1, ..]` samples.
    pub fn interleaved(&self) -> Vec<f32> {
        self.left
            .iter()
            .zip(&self.right)
            .flat_map(|(&l, &r)| [l, r])
            .collect()
    }

    pub fn into_channels(self) -> (Vec<f32>, Vec<f32>) {
        (self.left, self.right)
    }
}

/// `⌊seconds · sample_rate⌋`, saturating at 0 for negative or NaN input.
#[inline]
pub fn seconds_to_samples(seconds: f64, sample_rate: f64) -> usize {
    (seconds * sample_rate).floor().max(0.0) as usize
}

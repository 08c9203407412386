//! Mixer: sums stereo buffers with a master gain.

use super::buffer::StereoBuffer;

/// Sums any number of stereo sources and applies `master_gain`.
#[derive(Debug, Clone)]
pub struct Mixer {
    pub master_gain: f64,
}

impl Mixer {
    pub fn new(master_gain: f64) -> Self {
        Mixer { master_gain }
    }

    /// Mix `sources` into a new buffer as long as the longest source.
    ///
    /// No clipping or normalization is applied. The sample rate is taken
    /// from the first source.
    pub fn mix(&self, sources: &[&StereoBuffer]) -> StereoBuffer {
        let len = sources.iter().map(|s| s.len()).max().unwrap_or(0);
        let sample_rate = sources.first().map_or(44100.0, |s| s.sample_rate());
        let mut out = StereoBuffer::new(len, sample_rate);
        for source in sources {
            for (i, (&l, &r)) in source.left().iter().zip(source.right()).enumerate() {
                out.add(
                    i,
                    f64::from(l) * self.master_gain,
                    f64::from(r) * self.master_gain,
                );
            }
        }
        out
    }
}

impl Default for Mixer {
    fn default() -> Self {
        Mixer::new(0.8)
    }
}

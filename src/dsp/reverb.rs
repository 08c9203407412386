//! Convolution reverb send.
//!
//! The impulse response is exponentially fading noise, one independent
//! channel per side. Convolution runs over the whole rendered buffer at once
//! in the frequency domain.

use rand::Rng;
use rustfft::FftPlanner;
use rustfft::num_complex::Complex;

use super::buffer::{StereoBuffer, seconds_to_samples};
use crate::config::ReverbConfig;

/// A stereo impulse response.
#[derive(Debug, Clone, PartialEq)]
pub struct ImpulseResponse {
    left: Vec<f32>,
    right: Vec<f32>,
}

impl ImpulseResponse {
    /// Noise shaped by `gain · (1 - i/len)^decay`, `len = ⌊duration · sr⌋`.
    pub fn generate<R: Rng>(config: &ReverbConfig, sample_rate: f64, rng: &mut R) -> Self {
        let len = seconds_to_samples(config.duration, sample_rate);
        let channel = |rng: &mut R| -> Vec<f32> {
            (0..len)
                .map(|i| {
                    let fade = (1.0 - i as f64 / len as f64).powf(config.decay);
                    (config.gain * rng.gen_range(-1.0..1.0) * fade) as f32
                })
                .collect()
        };
        let left = channel(rng);
        let right = channel(rng);
        ImpulseResponse { left, right }
    }

    pub fn from_channels(left: Vec<f32>, right: Vec<f32>) -> Self {
        ImpulseResponse { left, right }
    }

    /// Samples per channel (the longer of the two).
    pub fn len(&self) -> usize {
        self.left.len().max(self.right.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn left(&self) -> &[f32] {
        &self.left
    }

    pub fn right(&self) -> &[f32] {
        &self.right
    }
}

/// Convolves buffers with a fixed impulse response.
pub struct ConvolutionReverb {
    impulse: ImpulseResponse,
    planner: FftPlanner<f64>,
}

impl ConvolutionReverb {
    pub fn new(impulse: ImpulseResponse) -> Self {
        ConvolutionReverb {
            impulse,
            planner: FftPlanner::new(),
        }
    }

    pub fn impulse(&self) -> &ImpulseResponse {
        &self.impulse
    }

    /// The wet signal only: each channel convolved with the matching
    /// impulse channel. The result is `input + impulse - 1` samples long.
    pub fn process(&mut self, input: &StereoBuffer) -> StereoBuffer {
        let left = convolve(&mut self.planner, input.left(), self.impulse.left());
        let right = convolve(&mut self.planner, input.right(), self.impulse.right());
        StereoBuffer::from_channels(left, right, input.sample_rate())
    }
}

impl std::fmt::Debug for ConvolutionReverb {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConvolutionReverb")
            .field("impulse_len", &self.impulse.len())
            .finish()
    }
}

/// Linear convolution via zero-padded FFT.
fn convolve(
    planner: &mut FftPlanner<f64>,
    signal: &[f32],
    kernel: &[f32],
) -> Vec<f32> {
    if signal.is_empty() || kernel.is_empty() {
        return Vec::new();
    }
    let out_len = signal.len() + kernel.len() - 1;
    let n = out_len.next_power_of_two();

    let pad = |data: &[f32]| -> Vec<Complex<f64>> {
        let mut buf: Vec<Complex<f64>> =
            data.iter().map(|&x| Complex::new(f64::from(x), 0.0)).collect();
        buf.resize(n, Complex::new(0.0, 0.0));
        buf
    };
    let mut a = pad(signal);
    let mut b = pad(kernel);

    let forward = planner.plan_fft_forward(n);
    forward.process(&mut a);
    forward.process(&mut b);
    for (x, y) in a.iter_mut().zip(&b) {
        *x *= *y;
    }
    planner.plan_fft_inverse(n).process(&mut a);

    let scale = 1.0 / n as f64;
    a[..out_len].iter().map(|c| (c.re * scale) as f32).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn direct(signal: &[f32], kernel: &[f32]) -> Vec<f32> {
        let mut out = vec![0.0_f32; signal.len() + kernel.len() - 1];
        for (i, &s) in signal.iter().enumerate() {
            for (j, &k) in kernel.iter().enumerate() {
                out[i + j] += s * k;
            }
        }
        out
    }

    #[test]
    fn matches_direct_convolution() {
        let mut planner = FftPlanner::new();
        let signal: [f32; 7] = [0.5, -1.0, 0.25, 0.0, 0.75, 0.1, -0.3];
        let kernel: [f32; 3] = [1.0, 0.5, -0.25];
        let fast = convolve(&mut planner, &signal, &kernel);
        let slow = direct(&signal, &kernel);
        assert_eq!(fast.len(), slow.len());
        for (f, s) in fast.iter().zip(&slow) {
            assert!((f - s).abs() < 1e-6, "{f} vs {s}");
        }
    }

    #[test]
    fn unit_impulse_is_identity() {
        let input =
            StereoBuffer::from_channels(vec![0.1, 0.2, 0.3], vec![-0.1, -0.2, -0.3], 8000.0);
        let unit = ImpulseResponse::from_channels(vec![1.0], vec![1.0]);
        let mut reverb = ConvolutionReverb::new(unit);
        let wet = reverb.process(&input);
        assert_eq!(wet.len(), 3);
        for i in 0..3 {
            assert!((wet.left()[i] - input.left()[i]).abs() < 1e-6);
            assert!((wet.right()[i] - input.right()[i]).abs() < 1e-6);
        }
    }

    #[test]
    fn impulse_shape() {
        let config = ReverbConfig::default();
        let ir = ImpulseResponse::generate(&config, 8000.0, &mut StdRng::seed_from_u64(5));
        assert_eq!(ir.len(), 16000, "2 seconds at 8kHz");
        assert!(ir.left().iter().chain(ir.right()).all(|s| s.abs() <= 0.25));
        assert_ne!(ir.left(), ir.right(), "channels are independent noise");

        let energy = |s: &[f32]| s.iter().map(|x| x * x).sum::<f32>();
        let head = energy(&ir.left()[..1000]);
        let tail = energy(&ir.left()[15000..]);
        assert!(
            tail < head * 1e-6,
            "impulse should fade out: head {head}, tail {tail}"
        );
    }

    #[test]
    fn empty_input_gives_empty_wet() {
        let impulse = ImpulseResponse::from_channels(vec![1.0, 0.5], vec![1.0]);
        let mut reverb = ConvolutionReverb::new(impulse);
        assert!(reverb.process(&StereoBuffer::new(0, 8000.0)).is_empty());
    }

    #[test]
    fn wet_length_includes_tail() {
        let config = ReverbConfig {
            duration: 0.5,
            ..ReverbConfig::default()
        };
        let ir = ImpulseResponse::generate(&config, 1000.0, &mut StdRng::seed_from_u64(1));
        let mut reverb = ConvolutionReverb::new(ir);
        let mut input = StereoBuffer::new(100, 1000.0);
        input.add(0, 1.0, 1.0);
        let wet = reverb.process(&input);
        assert_eq!(wet.len(), 100 + 500 - 1);
        assert!((wet.left()[10] - reverb.impulse().left()[10]).abs() < 1e-6);
    }
}

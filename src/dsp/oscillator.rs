//! Waveform generators.
//!
//! Every generator maps a phase measured in cycles to an amplitude in
//! [-1, 1]. Phase is unbounded: voices accumulate it forever and never wrap
//! it, so each shape folds the phase into [0, 1) itself.

use std::f64::consts::PI;
use std::fmt;
use std::sync::Arc;

use rand::Rng;
use serde::{Deserialize, Serialize};

/// Supported waveform shapes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Waveform {
    Sine,
    Square,
    #[serde(alias = "saw")]
    Sawtooth,
    Triangle,
    #[serde(alias = "whiteNoise")]
    Noise,
}

impl Waveform {
    /// Evaluate this shape at `phase`.
    pub fn sample(self, phase: f64) -> f64 {
        match self {
            Waveform::Sine => sine(phase),
            Waveform::Square => square(phase),
            Waveform::Sawtooth => sawtooth(phase),
            Waveform::Triangle => triangle(phase),
            Waveform::Noise => white_noise(),
        }
    }
}

/// `sin(2π·phase)`.
pub fn sine(phase: f64) -> f64 {
    (2.0 * PI * phase).sin()
}

/// `+1` for the first half of each cycle, `-1` for the second.
pub fn square(phase: f64) -> f64 {
    if phase.rem_euclid(1.0) < 0.5 {
        1.0
    } else {
        -1.0
    }
}

/// Rises from -1 to +1 across each cycle.
pub fn sawtooth(phase: f64) -> f64 {
    2.0 * phase.rem_euclid(1.0) - 1.0
}

/// Starts at +1, falls to -1 at half cycle, and climbs back.
pub fn triangle(phase: f64) -> f64 {
    (4.0 * phase.rem_euclid(1.0) - 2.0).abs() - 1.0
}

/// Uniform noise in [-1, 1]. A fresh draw on every call.
pub fn white_noise() -> f64 {
    rand::thread_rng().gen_range(-1.0..=1.0)
}

/// Returns the input unchanged. Placeholder for instrument functions.
pub fn identity(x: f64) -> f64 {
    x
}

/// Clamp `x` to `[min, max]`.
pub fn clamp(x: f64, min: f64, max: f64) -> f64 {
    min.max(max.min(x))
}

fn unit_gain() -> f64 {
    1.0
}

/// An instrument's phase-to-amplitude function.
#[derive(Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Oscillator {
    /// A standard waveform scaled by `gain`.
    Wave {
        shape: Waveform,
        #[serde(default = "unit_gain")]
        gain: f64,
    },
    /// Outputs the raw phase.
    Identity,
    /// Caller-supplied function. Not serializable.
    #[serde(skip)]
    Custom(Arc<dyn Fn(f64) -> f64 + Send + Sync>),
}

impl Oscillator {
    /// A unit-gain waveform oscillator.
    pub fn wave(shape: Waveform) -> Self {
        Oscillator::Wave { shape, gain: 1.0 }
    }

    pub fn custom(f: impl Fn(f64) -> f64 + Send + Sync + 'static) -> Self {
        Oscillator::Custom(Arc::new(f))
    }

    #[inline]
    pub fn sample(&self, phase: f64) -> f64 {
        match self {
            Oscillator::Wave { shape, gain } => gain * shape.sample(phase),
            Oscillator::Identity => identity(phase),
            Oscillator::Custom(f) => f(phase),
        }
    }

    /// Gain of a standard waveform, used by validation.
    pub(crate) fn gain(&self) -> Option<f64> {
        match self {
            Oscillator::Wave { gain, .. } => Some(*gain),
            _ => None,
        }
    }
}

impl Default for Oscillator {
    fn default() -> Self {
        Oscillator::wave(Waveform::Sine)
    }
}

impl fmt::Debug for Oscillator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Oscillator::Wave { shape, gain } => f
                .debug_struct("Wave")
                .field("shape", shape)
                .field("gain", gain)
                .finish(),
            Oscillator::Identity => f.write_str("Identity"),
            Oscillator::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

//! Resonant state-variable filter.
//!
//! A cheap two-pole SVF (Chamberlin topology) producing low, high, band and
//! notch outputs from the same two state variables. Cutoff and resonance
//! may change every sample. There is no stability clamping: extreme
//! resonance/cutoff pairs can blow up, and that is left to the caller.

use std::f64::consts::PI;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Which SVF output an instrument uses.
///
/// Deserializes from a name (`"lopass"`, `"lowpass"`, ..) or from the
/// numeric code accepted by [`FilterKind::try_from`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "FilterRepr")]
pub enum FilterKind {
    /// Oscillator output is passed through untouched.
    #[default]
    None,
    Hipass,
    Lopass,
    Bandpass,
    Notch,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum FilterRepr {
    Code(u8),
    Name(String),
}

impl TryFrom<FilterRepr> for FilterKind {
    type Error = ValidationError;

    fn try_from(repr: FilterRepr) -> Result<Self, Self::Error> {
        match repr {
            FilterRepr::Code(code) => FilterKind::try_from(code),
            FilterRepr::Name(name) => match name.as_str() {
                "none" => Ok(FilterKind::None),
                "hipass" | "highpass" => Ok(FilterKind::Hipass),
                "lopass" | "lowpass" => Ok(FilterKind::Lopass),
                "bandpass" => Ok(FilterKind::Bandpass),
                "notch" => Ok(FilterKind::Notch),
                _ => Err(ValidationError::UnknownFilterName(name)),
            },
        }
    }
}

impl TryFrom<u8> for FilterKind {
    type Error = ValidationError;

    /// Numeric filter codes used by the editor (0 = none .. 4 = notch).
    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(FilterKind::None),
            1 => Ok(FilterKind::Hipass),
            2 => Ok(FilterKind::Lopass),
            3 => Ok(FilterKind::Bandpass),
            4 => Ok(FilterKind::Notch),
            _ => Err(ValidationError::UnknownFilter(code)),
        }
    }
}

/// Per-note filter state.
#[derive(Debug, Clone)]
pub struct StateVariableFilter {
    pub kind: FilterKind,
    low: f64,
    band: f64,
    sample_rate: f64,
}

impl StateVariableFilter {
    pub fn new(kind: FilterKind, sample_rate: f64) -> Self {
        StateVariableFilter {
            kind,
            low: 0.0,
            band: 0.0,
            sample_rate,
        }
    }

    /// Run one sample through the filter with the given cutoff (Hz) and
    /// resonance, returning the output selected by `kind`.
    ///
    /// The state advances even for [`FilterKind::None`].
    #[inline]
    pub fn process(&mut self, input: f64, freq: f64, res: f64) -> f64 {
        let f = 1.5 * (PI * freq / self.sample_rate).sin();
        self.low += f * self.band;
        let high = res * (input - self.band) - self.low;
        self.band += f * high;

        match self.kind {
            FilterKind::None => input,
            FilterKind::Hipass => high,
            FilterKind::Lopass => self.low,
            FilterKind::Bandpass => self.band,
            FilterKind::Notch => self.low + high,
        }
    }
}

/// Filter a whole mono buffer in place with a fixed cutoff and resonance.
pub fn apply_filter(
    data: &mut [f32],
    kind: FilterKind,
    freq: f64,
    res: f64,
    sample_rate: f64,
) {
    let mut svf = StateVariableFilter::new(kind, sample_rate);
    for sample in data.iter_mut() {
        *sample = svf.process(f64::from(*sample), freq, res) as f32;
    }
}

//! Engine configuration.
//!
//! The sample rate and the other host-supplied settings live here and are
//! handed to [`AudioEngine`](crate::dsp::engine::AudioEngine) and
//! [`Player`](crate::playback::Player) at construction time.

use serde::{Deserialize, Serialize};

use crate::error::MinitoneError;

/// Settings for the convolution reverb send.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReverbConfig {
    /// Impulse response length in seconds.
    pub duration: f64,
    /// Exponent of the `(1 - i/len)^decay` fade.
    pub decay: f64,
    /// Peak amplitude of the impulse noise.
    pub gain: f64,
}

impl Default for ReverbConfig {
    fn default() -> Self {
        Self {
            duration: 2.0,
            decay: 5.0,
            gain: 0.25,
        }
    }
}

/// Rendering and playback settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EngineConfig {
    /// Host sample rate in Hz.
    pub sample_rate: f64,
    /// Output gain applied by the player.
    pub master_gain: f64,
    /// Start every voice at a random phase.
    pub randomize_phase: bool,
    /// Seed for voice pans, start phases, and the reverb impulse.
    /// `None` seeds from system entropy.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
    pub reverb: ReverbConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            sample_rate: 44100.0,
            master_gain: 0.8,
            randomize_phase: true,
            seed: None,
            reverb: ReverbConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Default settings at the given sample rate.
    pub fn with_sample_rate(sample_rate: f64) -> Self {
        Self {
            sample_rate,
            ..Self::default()
        }
    }

    /// Parse and validate a JSON config. Missing keys take their defaults.
    pub fn from_json_str(source: &str) -> Result<Self, MinitoneError> {
        let config: EngineConfig = serde_json::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), MinitoneError> {
        check_sample_rate(self.sample_rate)?;
        if !self.master_gain.is_finite() {
            return Err(MinitoneError::Config("master gain must be finite".into()));
        }
        let reverb = &self.reverb;
        if !reverb.duration.is_finite() || reverb.duration < 0.0 {
            return Err(MinitoneError::Config(format!(
                "reverb duration must not be negative, got {}",
                reverb.duration
            )));
        }
        if !reverb.decay.is_finite() || !reverb.gain.is_finite() {
            let message = "reverb decay and gain must be finite";
            return Err(MinitoneError::Config(message.into()));
        }
        Ok(())
    }
}

/// Reject non-finite and non-positive sample rates.
pub(crate) fn check_sample_rate(sample_rate: f64) -> Result<(), MinitoneError> {
    if !sample_rate.is_finite() || sample_rate <= 0.0 {
        return Err(MinitoneError::Config(format!(
            "sample rate must be positive, got {sample_rate}"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.sample_rate, 44100.0);
        assert_eq!(config.master_gain, 0.8);
        let expected = ReverbConfig {
            duration: 2.0,
            decay: 5.0,
            gain: 0.25,
        };
        assert_eq!(config.reverb, expected);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let json = r#"{ "sampleRate": 48000, "seed": 42, "reverb": { "decay": 3 } }"#;
        let config = EngineConfig::from_json_str(json).unwrap();
        assert_eq!(config.sample_rate, 48000.0);
        assert_eq!(config.seed, Some(42));
        assert_eq!(config.reverb.decay, 3.0);
        assert_eq!(config.reverb.duration, 2.0);
        assert!(config.randomize_phase);
    }

    #[test]
    fn rejects_bad_sample_rate() {
        let err = EngineConfig::from_json_str(r#"{ "sampleRate": 0 }"#).unwrap_err();
        assert!(matches!(err, MinitoneError::Config(_)), "got {err}");
        assert!(EngineConfig::with_sample_rate(f64::NAN).validate().is_err());
    }

    #[test]
    fn rejects_malformed_json() {
        let err = EngineConfig::from_json_str("{ sampleRate: ").unwrap_err();
        assert!(matches!(err, MinitoneError::Json(_)));
    }
}

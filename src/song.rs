//! Song description: instruments, notes, and sequences.
//!
//! A [`Song`] is plain data. It is built in code or deserialized from JSON
//! (camelCase keys), validated once, and then rendered by
//! [`AudioEngine`](crate::dsp::engine::AudioEngine) without being mutated.

use std::f64::consts::PI;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::dsp::envelope::Adsr;
use crate::dsp::filter::FilterKind;
use crate::dsp::oscillator::Oscillator;
use crate::error::{MinitoneError, ValidationError};

/// Largest accepted [`Instrument::unison`] value.
pub const MAX_UNISON: u32 = 64;

/// A time-varying instrument parameter, evaluated as
/// `f(base_frequency, t)` where `t` is seconds since the note started.
#[derive(Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Curve {
    /// The note's base frequency.
    Base,
    /// A fixed value, ignoring the note.
    Constant { value: f64 },
    /// Base frequency times `ratio`.
    Ratio { ratio: f64 },
    /// Base frequency with sinusoidal modulation of relative `depth`.
    Vibrato { rate: f64, depth: f64 },
    /// Moves linearly from `from` to `to` over `time` seconds, then holds.
    Slide { from: f64, to: f64, time: f64 },
    /// Caller-supplied function. Not serializable.
    #[serde(skip)]
    Custom(Arc<dyn Fn(f64, f64) -> f64 + Send + Sync>),
}

impl Curve {
    pub fn constant(value: f64) -> Self {
        Curve::Constant { value }
    }

    pub fn custom(f: impl Fn(f64, f64) -> f64 + Send + Sync + 'static) -> Self {
        Curve::Custom(Arc::new(f))
    }

    #[inline]
    pub fn eval(&self, base: f64, t: f64) -> f64 {
        match self {
            Curve::Base => base,
            Curve::Constant { value } => *value,
            Curve::Ratio { ratio } => base * ratio,
            Curve::Vibrato { rate, depth } => base * (1.0 + depth * (2.0 * PI * rate * t).sin()),
            Curve::Slide { from, to, time } => {
                if t >= *time {
                    *to
                } else {
                    from + (to - from) * (t / time)
                }
            }
            Curve::Custom(f) => f(base, t),
        }
    }

    fn params(&self) -> Vec<f64> {
        match self {
            Curve::Base | Curve::Custom(_) => Vec::new(),
            Curve::Constant { value } => vec![*value],
            Curve::Ratio { ratio } => vec![*ratio],
            Curve::Vibrato { rate, depth } => vec![*rate, *depth],
            Curve::Slide { from, to, time } => vec![*from, *to, *time],
        }
    }
}

impl fmt::Debug for Curve {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Curve::Base => f.write_str("Base"),
            Curve::Constant { value } => write!(f, "Constant({value})"),
            Curve::Ratio { ratio } => write!(f, "Ratio({ratio})"),
            Curve::Vibrato { rate, depth } => {
                write!(f, "Vibrato {{ rate: {rate}, depth: {depth} }}")
            }
            Curve::Slide { from, to, time } => {
                write!(f, "Slide {{ from: {from}, to: {to}, time: {time} }}")
            }
            Curve::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

/// Immutable description of how notes sound.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Instrument {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Pitch in Hz over time.
    pub frequency: Curve,
    pub oscillator: Oscillator,
    /// Attack time in seconds.
    pub attack: f64,
    /// Decay time in seconds.
    pub decay: f64,
    /// Sustain level [0, 1].
    pub sustain: f64,
    /// Release time in seconds.
    pub release: f64,
    pub filter: FilterKind,
    /// Filter cutoff in Hz over time.
    pub filter_freq: Curve,
    /// Filter resonance over time, nominally [0, 1].
    pub filter_res: Curve,
    /// Number of unison voices. 0 is treated as 1.
    pub unison: u32,
    /// Frequency spread between unison voice pairs.
    pub detune: f64,
}

impl Default for Instrument {
    fn default() -> Self {
        Instrument {
            name: None,
            frequency: Curve::Base,
            oscillator: Oscillator::default(),
            attack: 0.01,
            decay: 0.1,
            sustain: 0.7,
            release: 0.3,
            filter: FilterKind::None,
            filter_freq: Curve::constant(1000.0),
            filter_res: Curve::constant(0.5),
            unison: 1,
            detune: 0.001,
        }
    }
}

impl Instrument {
    pub fn adsr(&self) -> Adsr {
        Adsr::new(self.attack, self.decay, self.sustain, self.release)
    }

    /// Unison count with 0 read as 1.
    pub fn effective_unison(&self) -> u32 {
        self.unison.max(1)
    }

    pub fn validate(&self, location: &str) -> Result<(), ValidationError> {
        for (field, value) in [
            ("attack", self.attack),
            ("decay", self.decay),
            ("release", self.release),
            ("detune", self.detune),
        ] {
            non_negative(location, field, value)?;
        }
        if self.unison > MAX_UNISON {
            return Err(ValidationError::TooLarge {
                location: location.to_string(),
                field: "unison",
                value: f64::from(self.unison),
                max: f64::from(MAX_UNISON),
            });
        }
        finite(location, "sustain", self.sustain)?;
        if !(0.0..=1.0).contains(&self.sustain) {
            return Err(ValidationError::SustainOutOfRange {
                location: location.to_string(),
                value: self.sustain,
            });
        }
        if let Some(gain) = self.oscillator.gain() {
            finite(location, "oscillator.gain", gain)?;
        }
        for (field, curve) in [
            ("frequency", &self.frequency),
            ("filterFreq", &self.filter_freq),
            ("filterRes", &self.filter_res),
        ] {
            for value in curve.params() {
                finite(location, field, value)?;
            }
        }
        Ok(())
    }
}

/// One note of a sequence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    /// Base frequency in Hz.
    pub base_frequency: f64,
    /// Start time in seconds.
    pub start: f64,
    /// Time until release, in seconds.
    pub duration: f64,
    /// Replaces the sequence's unit volume for this note.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volume: Option<f64>,
    /// Portamento time in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub glide: Option<f64>,
}

impl Note {
    /// Build a validated note.
    pub fn new(base_frequency: f64, start: f64, duration: f64) -> Result<Self, ValidationError> {
        let note = Note {
            base_frequency,
            start,
            duration,
            volume: None,
            glide: None,
        };
        note.validate("note")?;
        Ok(note)
    }

    pub fn with_volume(mut self, volume: f64) -> Result<Self, ValidationError> {
        self.volume = Some(volume);
        self.validate("note")?;
        Ok(self)
    }

    pub fn with_glide(mut self, glide: f64) -> Result<Self, ValidationError> {
        self.glide = Some(glide);
        self.validate("note")?;
        Ok(self)
    }

    /// Glide time, 0 when absent.
    pub fn glide_time(&self) -> f64 {
        self.glide.unwrap_or(0.0)
    }

    /// Seconds at which this note falls silent for the given release time.
    pub fn end_time(&self, release: f64) -> f64 {
        self.start + self.duration + release
    }

    pub fn validate(&self, location: &str) -> Result<(), ValidationError> {
        non_negative(location, "baseFrequency", self.base_frequency)?;
        non_negative(location, "start", self.start)?;
        finite(location, "duration", self.duration)?;
        if self.duration <= 0.0 {
            return Err(ValidationError::NonPositiveDuration {
                location: location.to_string(),
                value: self.duration,
            });
        }
        if let Some(volume) = self.volume {
            non_negative(location, "volume", volume)?;
        }
        if let Some(glide) = self.glide {
            non_negative(location, "glide", glide)?;
        }
        Ok(())
    }
}

/// An instrument and the notes it plays. Note order does not matter.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Sequence {
    pub instrument: Instrument,
    #[serde(default)]
    pub notes: Vec<Note>,
}

impl Sequence {
    pub fn new(instrument: Instrument, notes: Vec<Note>) -> Self {
        Sequence { instrument, notes }
    }

    /// Latest tail end among this sequence's notes, or 0 with no notes.
    pub fn end_time(&self) -> f64 {
        self.notes
            .iter()
            .map(|n| n.end_time(self.instrument.release))
            .fold(0.0, f64::max)
    }
}

/// A set of sequences rendered into one buffer.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Song {
    #[serde(default)]
    pub sequences: Vec<Sequence>,
}

impl Song {
    pub fn new(sequences: Vec<Sequence>) -> Self {
        Song { sequences }
    }

    /// Parse and validate a JSON song description.
    pub fn from_json(source: &str) -> Result<Self, MinitoneError> {
        let song: Song = serde_json::from_str(source)?;
        song.validate()?;
        Ok(song)
    }

    /// Seconds until the last note's release ends.
    pub fn end_time(&self) -> f64 {
        self.sequences.iter().map(Sequence::end_time).fold(0.0, f64::max)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        for (si, sequence) in self.sequences.iter().enumerate() {
            sequence
                .instrument
                .validate(&format!("sequence {si} instrument"))?;
            for (ni, note) in sequence.notes.iter().enumerate() {
                note.validate(&format!("sequence {si} note {ni}"))?;
            }
        }
        Ok(())
    }
}

fn finite(location: &str, field: &'static str, value: f64) -> Result<(), ValidationError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(ValidationError::NotFinite {
            location: location.to_string(),
            field,
        })
    }
}

fn non_negative(location: &str, field: &'static str, value: f64) -> Result<(), ValidationError> {
    finite(location, field, value)?;
    if value < 0.0 {
        return Err(ValidationError::Negative {
            location: location.to_string(),
            field,
            value,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dsp::oscillator::Waveform;

    #[test]
    fn curves_evaluate() {
        assert_eq!(Curve::Base.eval(440.0, 3.0), 440.0);
        assert_eq!(Curve::constant(1000.0).eval(440.0, 3.0), 1000.0);
        assert_eq!(Curve::Ratio { ratio: 2.0 }.eval(440.0, 0.0), 880.0);
        let vibrato = Curve::Vibrato {
            rate: 5.0,
            depth: 0.1,
        };
        assert_eq!(vibrato.eval(440.0, 0.0), 440.0);
        let slide = Curve::Slide {
            from: 100.0,
            to: 200.0,
            time: 2.0,
        };
        assert_eq!(slide.eval(0.0, 1.0), 150.0);
        assert_eq!(slide.eval(0.0, 5.0), 200.0);
        let instant = Curve::Slide {
            from: 100.0,
            to: 200.0,
            time: 0.0,
        };
        assert_eq!(
            instant.eval(0.0, 0.0),
            200.0,
            "Zero-time slide jumps to target"
        );
        assert_eq!(Curve::custom(|x, t| x + t).eval(1.0, 2.0), 3.0);
    }

    #[test]
    fn parse_song_json() {
        let song = Song::from_json(
            r#"{
                "sequences": [{
                    "instrument": {
                        "name": "lead",
                        "oscillator": { "type": "wave", "shape": "sawtooth", "gain": 0.1 },
                        "attack": 0.5, "decay": 0.1, "sustain": 1, "release": 0.5,
                        "filter": "lopass",
                        "filterFreq": { "type": "constant", "value": 1000 },
                        "unison": 4, "detune": 0.001
                    },
                    "notes": [{ "baseFrequency": 440, "start": 0, "duration": 1, "glide": 0.1 }]
                }]
            }"#,
        )
        .expect("song should parse");

        let seq = &song.sequences[0];
        assert_eq!(seq.instrument.name.as_deref(), Some("lead"));
        assert_eq!(seq.instrument.filter, FilterKind::Lopass);
        assert_eq!(seq.instrument.unison, 4);
        assert!(
            matches!(seq.instrument.frequency, Curve::Base),
            "frequency defaults to base"
        );
        assert!(matches!(
            seq.instrument.oscillator,
            Oscillator::Wave { shape: Waveform::Sawtooth, .. }
        ));
        assert_eq!(seq.notes[0].glide, Some(0.1));
        assert_eq!(seq.notes[0].volume, None);
        assert!((song.end_time() - 1.5).abs() < 1e-12);
    }

    #[test]
    fn rejects_negative_duration() {
        let err = Note::new(440.0, 0.0, -1.0).unwrap_err();
        assert!(matches!(err, ValidationError::NonPositiveDuration { .. }));
        assert!(Note::new(440.0, 0.0, 0.0).is_err());
    }

    #[test]
    fn rejects_nan_and_negative_start() {
        assert!(matches!(
            Note::new(f64::NAN, 0.0, 1.0),
            Err(ValidationError::NotFinite { field: "baseFrequency", .. })
        ));
        assert!(matches!(
            Note::new(440.0, -0.5, 1.0),
            Err(ValidationError::Negative { field: "start", .. })
        ));
        let note = Note::new(440.0, 0.0, 1.0).unwrap();
        assert!(note.clone().with_glide(-1.0).is_err());
        assert!(note.with_volume(f64::INFINITY).is_err());
    }

    #[test]
    fn rejects_bad_instrument() {
        let song = Song::new(vec![Sequence::new(
            Instrument {
                sustain: 1.5,
                ..Instrument::default()
            },
            vec![Note::new(440.0, 0.0, 1.0).unwrap()],
        )]);
        let err = song.validate().unwrap_err();
        assert_eq!(
            err.to_string(),
            "sequence 0 instrument: sustain must be within [0, 1], got 1.5"
        );

        let song = Song::new(vec![Sequence::new(
            Instrument {
                release: -0.1,
                ..Instrument::default()
            },
            vec![],
        )]);
        assert!(song.validate().is_err());
    }

    #[test]
    fn error_names_note_index() {
        let mut notes = vec![Note::new(440.0, 0.0, 1.0).unwrap(); 3];
        notes[2].duration = -2.0;
        let song = Song::new(vec![Sequence::new(Instrument::default(), notes)]);
        let message = song.validate().unwrap_err().to_string();
        assert!(message.starts_with("sequence 0 note 2"), "got {message}");
    }

    #[test]
    fn empty_song_ends_at_zero() {
        assert_eq!(Song::default().end_time(), 0.0);
        let song = Song::new(vec![Sequence::new(Instrument::default(), vec![])]);
        assert_eq!(song.end_time(), 0.0);
    }

    #[test]
    fn zero_unison_reads_as_one() {
        let instrument = Instrument {
            unison: 0,
            ..Instrument::default()
        };
        assert_eq!(instrument.effective_unison(), 1);
    }

    #[test]
    fn rejects_oversized_unison() {
        let song = Song::new(vec![Sequence::new(
            Instrument {
                unison: u32::MAX,
                ..Instrument::default()
            },
            vec![Note::new(440.0, 0.0, 1.0).unwrap()],
        )]);
        let err = song.validate().unwrap_err();
        assert!(
            matches!(err, ValidationError::TooLarge { field: "unison", .. }),
            "got {err}"
        );

        let at_limit = Instrument {
            unison: MAX_UNISON,
            ..Instrument::default()
        };
        assert!(at_limit.validate("instrument").is_ok());
    }

    #[test]
    fn filter_accepts_numeric_code() {
        let song = Song::from_json(
            r#"{ "sequences": [{ "instrument": { "filter": 2 }, "notes": [] }] }"#,
        )
        .unwrap();
        assert_eq!(song.sequences[0].instrument.filter, FilterKind::Lopass);

        let err = Song::from_json(r#"{ "sequences": [{ "instrument": { "filter": 5 } }] }"#)
            .unwrap_err();
        assert!(matches!(err, MinitoneError::Json(_)), "got {err}");
    }
}

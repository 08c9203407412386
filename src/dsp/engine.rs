//! Audio Engine: renders a Song into a stereo buffer.
//!
//! Every sequence builds its own unison voice set and plays all of its notes
//! through it. All sequences sum into one buffer sized by the latest note
//! tail in the song. Rendering is eager and single-threaded: a call returns
//! only once the whole buffer is computed.

use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::debug;

use super::buffer::{StereoBuffer, seconds_to_samples};
use super::note::render_note;
use super::voice::build_voices;
use crate::config::{EngineConfig, check_sample_rate};
use crate::error::{MinitoneError, ValidationError};
use crate::song::{Instrument, Note, Sequence, Song};

/// Gain of the primary voice relative to the detuned voices.
pub const PRIMARY_VOICE_BOOST: f64 = 4.0;

/// Longest render, in samples per channel (about 50 minutes at 44.1 kHz).
pub const MAX_RENDER_SAMPLES: usize = 1 << 27;

/// The song renderer.
#[derive(Debug, Clone)]
pub struct AudioEngine {
    pub sample_rate: f64,
    /// Start voices at random phases.
    pub randomize_phase: bool,
    /// Seed for voice pans and phases. `None` draws from system entropy.
    pub seed: Option<u64>,
}

impl AudioEngine {
    pub fn new(sample_rate: f64) -> Self {
        AudioEngine {
            sample_rate,
            randomize_phase: true,
            seed: None,
        }
    }

    /// Engine using the sample rate and randomness settings of `config`.
    pub fn with_config(config: &EngineConfig) -> Result<Self, MinitoneError> {
        config.validate()?;
        Ok(AudioEngine {
            sample_rate: config.sample_rate,
            randomize_phase: config.randomize_phase,
            seed: config.seed,
        })
    }

    /// Samples per channel a render of `song` produces.
    pub fn song_length(&self, song: &Song) -> usize {
        seconds_to_samples(song.end_time(), self.sample_rate)
    }

    /// Validate and render an entire song.
    ///
    /// An empty song yields an empty buffer. Songs longer than
    /// [`MAX_RENDER_SAMPLES`] are rejected before anything is allocated.
    pub fn render(&self, song: &Song) -> Result<StereoBuffer, MinitoneError> {
        check_sample_rate(self.sample_rate)?;
        song.validate()?;

        let end_time = song.end_time();
        let samples = (end_time * self.sample_rate).floor();
        if samples > MAX_RENDER_SAMPLES as f64 {
            return Err(ValidationError::TooLarge {
                location: "song".to_string(),
                field: "length in samples",
                value: samples,
                max: MAX_RENDER_SAMPLES as f64,
            }
            .into());
        }
        let mut buffer = StereoBuffer::with_duration(end_time, self.sample_rate);
        debug!(
            end_time,
            samples = buffer.len(),
            sequences = song.sequences.len(),
            "render song"
        );

        let mut rng = self.rng();
        for sequence in &song.sequences {
            render_sequence(&mut buffer, sequence, &mut rng, self.randomize_phase);
        }
        Ok(buffer)
    }

    /// Render a single note of `instrument` starting at time 0.
    pub fn render_single_note(
        &self,
        instrument: &Instrument,
        base_frequency: f64,
        duration: f64,
    ) -> Result<StereoBuffer, MinitoneError> {
        let note = Note::new(base_frequency, 0.0, duration)?;
        let song = Song::new(vec![Sequence::new(instrument.clone(), vec![note])]);
        self.render(&song)
    }

    fn rng(&self) -> StdRng {
        match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        }
    }
}

/// Add every note of `sequence` into `buffer`.
///
/// The sequence is expected to be validated already.
///
/// Per-voice volume is `volume / unison` where `volume` is the note's
/// override or 1. The primary voice plays at [`PRIMARY_VOICE_BOOST`] times
/// that. Voices keep their phase and frequency from one note to the next.
pub fn render_sequence<R: rand::Rng>(
    buffer: &mut StereoBuffer,
    sequence: &Sequence,
    rng: &mut R,
    randomize_phase: bool,
) {
    let instrument = &sequence.instrument;
    let unison = instrument.effective_unison();
    if instrument.unison == 0 {
        tracing::warn!("unison 0 treated as 1");
    }

    let mut voices = build_voices(instrument, rng, randomize_phase);
    debug!(
        name = instrument.name.as_deref().unwrap_or(""),
        voices = voices.len(),
        notes = sequence.notes.len(),
        "render sequence"
    );

    for note in &sequence.notes {
        let volume = note.volume.unwrap_or(1.0) / f64::from(unison);
        for (i, voice) in voices.iter_mut().enumerate() {
            let gain = if i == 0 {
                volume * PRIMARY_VOICE_BOOST
            } else {
                volume
            };
            render_note(buffer, instrument, voice, note, gain);
        }
    }
}

//! Voice: one unison oscillator slot of a sequence.
//!
//! A voice lives for one sequence render and is shared by every note of that
//! sequence. Its frequency and phase carry over from note to note, which is
//! what gives glide and phase continuity between consecutive notes.

use rand::Rng;

use crate::song::Instrument;

/// Per-voice pitch, phase, and pan state.
#[derive(Debug, Clone, PartialEq)]
pub struct Voice {
    /// Frequency multiplier relative to the primary voice.
    pub ratio: f64,
    /// Smoothed frequency in Hz. 0 until the voice renders its first sample.
    pub frequency: f64,
    /// Phase in cycles. Never wrapped.
    pub phase: f64,
    /// Stereo position [0, 1].
    pub pan: f64,
}

impl Voice {
    pub fn new(ratio: f64, pan: f64, phase: f64) -> Self {
        Voice {
            ratio,
            frequency: 0.0,
            phase,
            pan,
        }
    }

    /// The centered primary voice.
    pub fn primary(phase: f64) -> Self {
        Voice::new(1.0, 0.5, phase)
    }

    /// Glide toward `target` Hz and advance the phase by one sample.
    /// Returns the new phase.
    ///
    /// A voice that has never sounded jumps straight to `target`.
    #[inline]
    pub fn advance(&mut self, target: f64, glide_rate: f64, sample_rate: f64) -> f64 {
        if self.frequency == 0.0 {
            self.frequency = target;
        }
        self.frequency = glide_rate * target + (1.0 - glide_rate) * self.frequency;
        self.phase += self.frequency / sample_rate;
        self.phase
    }

    /// Left and right gains for this voice's pan position.
    #[inline]
    pub fn pan_gains(&self) -> (f64, f64) {
        pan_gains(self.pan)
    }
}

/// Equal-power pan law: `(sin(pan·π/2), cos(pan·π/2))` as `(left, right)`.
#[inline]
pub fn pan_gains(pan: f64) -> (f64, f64) {
    let angle = pan * std::f64::consts::FRAC_PI_2;
    (angle.sin(), angle.cos())
}

/// One-pole glide coefficient for a glide time in seconds. 1 means no glide.
pub fn glide_rate(glide: f64, sample_rate: f64) -> f64 {
    1.0 / ((glide / 20.0) * sample_rate + 1.0)
}

/// Number of voices an instrument's unison setting produces.
///
/// Detuned voices come in pairs, one pair per `i` in `1..unison / 2` with
/// integer division, so unison 1, 2 and 3 all give a single voice.
pub fn voice_count(unison: u32) -> usize {
    1 + 2 * (unison.max(1) / 2).saturating_sub(1) as usize
}

/// Build the unison voice set for `instrument`.
///
/// The first voice is the centered primary. Each detuned pair gets ratios
/// `1 + i·detune` and `1 / (1 + i·detune)` and independent random pans.
/// With `randomize_phase` every voice starts at a random phase in [0, 1),
/// otherwise at 0.
pub fn build_voices<R: Rng>(
    instrument: &Instrument,
    rng: &mut R,
    randomize_phase: bool,
) -> Vec<Voice> {
    let start_phase = |rng: &mut R| {
        if randomize_phase {
            rng.gen_range(0.0..1.0)
        } else {
            0.0
        }
    };

    let unison = instrument.effective_unison();
    let mut voices = Vec::with_capacity(voice_count(unison));
    voices.push(Voice::primary(start_phase(rng)));
    for i in 1..unison / 2 {
        let spread = 1.0 + f64::from(i) * instrument.detune;
        for ratio in [spread, 1.0 / spread] {
            let pan = rng.gen_range(0.0..=1.0);
            let phase = start_phase(rng);
            voices.push(Voice::new(ratio, pan, phase));
        }
    }
    voices
}

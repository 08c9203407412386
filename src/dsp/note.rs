//! Note renderer: drives one voice through one note.

use tracing::{trace, warn};

use super::buffer::{StereoBuffer, seconds_to_samples};
use super::filter::StateVariableFilter;
use super::voice::{Voice, glide_rate};
use crate::song::{Instrument, Note};

/// Render `note` on `voice` and add the result into `buffer`.
///
/// Covers samples `[⌊start·sr⌋, ⌊(start + duration + release)·sr⌋)`. Per
/// sample the voice glides toward the instrument's pitch, the oscillator
/// output runs through a fresh state-variable filter, and the envelope,
/// `volume` and the voice's pan gains scale it before it is summed in.
pub fn render_note(
    buffer: &mut StereoBuffer,
    instrument: &Instrument,
    voice: &mut Voice,
    note: &Note,
    volume: f64,
) {
    let sample_rate = buffer.sample_rate();
    let first = seconds_to_samples(note.start, sample_rate);
    let mut end = seconds_to_samples(note.end_time(instrument.release), sample_rate);
    if end > buffer.len() {
        warn!(
            end,
            len = buffer.len(),
            "note tail runs past the buffer, truncating"
        );
        end = buffer.len();
    }
    trace!(
        first,
        end,
        freq = note.base_frequency,
        ratio = voice.ratio,
        "render note"
    );

    let base = note.base_frequency;
    let adsr = instrument.adsr();
    let glide = glide_rate(note.glide_time(), sample_rate);
    let (left_gain, right_gain) = voice.pan_gains();
    let mut filter = StateVariableFilter::new(instrument.filter, sample_rate);

    for i in first..end {
        let t = (i as f64 / sample_rate - note.start).max(0.0);
        let target = instrument.frequency.eval(base, t) * voice.ratio;
        let phase = voice.advance(target, glide, sample_rate);

        let raw = instrument.oscillator.sample(phase);
        let cutoff = instrument.filter_freq.eval(base, t);
        let res = instrument.filter_res.eval(base, t);
        let sample = filter.process(raw, cutoff, res) * adsr.level(note.duration, t) * volume;

        buffer.add(i, left_gain * sample, right_gain * sample);
    }
}

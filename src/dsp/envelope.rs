//! ADSR envelope.
//!
//! Notes have a known duration, so the envelope is a pure function of the
//! time since the note started instead of a gate-driven state machine.
//!
//! ```text
//!          Attack    Decay Sustain    Release
//!          [--------][----][---------][-----]
//!     max |-----------\
//!         |            \
//!         |             \-----------\
//!         |                          \
//!       0 +--------------------------------> t
//! ```
//!
//! Stage boundaries are tested in order, so the decay ramp always runs to
//! `attack + decay`. A note shorter than that keeps decaying past its
//! duration, and its release (still measured from the duration) only takes
//! over once the decay ramp has finished.

use serde::{Deserialize, Serialize};

/// Envelope amplitude at time `t` (seconds since note start).
///
/// - `a`: attack time in seconds.
/// - `d`: decay time in seconds.
/// - `s`: sustain level in [0, 1].
/// - `r`: release time in seconds.
/// - `du`: note duration in seconds (release starts here).
///
/// Zero-length stages are skipped, never divided by.
pub fn envelope(a: f64, d: f64, s: f64, r: f64, du: f64, t: f64) -> f64 {
    if t < a {
        // a > 0 here since t >= 0
        t / a
    } else if t < a + d {
        1.0 - ((t - a) / d) * (1.0 - s)
    } else if t < du {
        s
    } else if t < du + r {
        (1.0 - (t - du) / r) * s
    } else {
        0.0
    }
}

/// Attack/decay/sustain/release settings of an instrument.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Adsr {
    /// Attack time in seconds.
    pub attack: f64,
    /// Decay time in seconds.
    pub decay: f64,
    /// Sustain level [0, 1].
    pub sustain: f64,
    /// Release time in seconds.
    pub release: f64,
}

impl Adsr {
    pub fn new(attack: f64, decay: f64, sustain: f64, release: f64) -> Self {
        Adsr {
            attack,
            decay,
            sustain,
            release,
        }
    }

    /// Amplitude for a note of `duration` seconds, `t` seconds in.
    #[inline]
    pub fn level(&self, duration: f64, t: f64) -> f64 {
        envelope(
            self.attack,
            self.decay,
            self.sustain,
            self.release,
            duration,
            t,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn attack_starts_at_zero() {
        assert_eq!(envelope(0.5, 0.1, 0.7, 0.3, 2.0, 0.0), 0.0);
        let level = envelope(0.5, 0.1, 0.7, 0.3, 2.0, 0.25);
        assert!((level - 0.5).abs() < 1e-12);
    }

    #[test]
    fn attack_approaches_peak() {
        let just_before = envelope(0.5, 0.1, 0.7, 0.3, 2.0, 0.5 - 1e-9);
        assert!((just_before - 1.0).abs() < 1e-6, "got {just_before}");
        assert_eq!(envelope(0.5, 0.1, 0.7, 0.3, 2.0, 0.5), 1.0);
    }

    #[test]
    fn decay_reaches_sustain() {
        let mid = envelope(0.0, 1.0, 0.5, 0.3, 4.0, 0.5);
        assert!(
            (mid - 0.75).abs() < 1e-12,
            "Mid-decay should be 0.75, got {mid}"
        );
    }

    #[test]
    fn release_ramps_down() {
        let mid = envelope(0.0, 0.0, 0.8, 1.0, 2.0, 2.5);
        assert!(
            (mid - 0.4).abs() < 1e-12,
            "Mid-release should be 0.4, got {mid}"
        );
    }

    #[test]
    fn zero_attack_is_at_peak() {
        assert_eq!(envelope(0.0, 0.5, 0.2, 0.3, 2.0, 0.0), 1.0);
    }

    #[test]
    fn zero_lengths_never_produce_nan() {
        for t in [0.0, 0.5, 1.0, 1.0000001, 3.0] {
            let v = envelope(0.0, 0.0, 0.6, 0.0, 1.0, t);
            assert!(v.is_finite(), "NaN/inf at t={t}");
        }
        assert_eq!(envelope(0.0, 0.0, 0.6, 0.0, 1.0, 0.0), 0.6);
        assert_eq!(envelope(0.0, 0.0, 0.6, 0.0, 1.0, 1.0), 0.0);
    }

    #[test]
    fn short_note_keeps_decaying() {
        // a + d = 1.5 > du = 1.0: decay runs until t = 1.5 even though the
        // note is already released at t = 1.0.
        let during_decay = envelope(0.5, 1.0, 0.0, 2.0, 1.0, 1.2);
        assert!((during_decay - 0.3).abs() < 1e-12, "got {during_decay}");
        let after_decay = envelope(0.5, 1.0, 0.0, 2.0, 1.0, 1.6);
        assert_eq!(
            after_decay,
            0.0,
            "release from a zero sustain stays at zero"
        );
    }

    #[test]
    fn adsr_level_matches_free_fn() {
        let adsr = Adsr::new(0.1, 0.2, 0.5, 0.4);
        for i in 0..40 {
            let t = i as f64 * 0.05;
            assert_eq!(adsr.level(1.0, t), envelope(0.1, 0.2, 0.5, 0.4, 1.0, t));
        }
    }

    proptest! {
        #[test]
        fn attack_is_linear_and_increasing(a in 0.01f64..5.0, x in 0.0f64..1.0, y in 0.0f64..1.0) {
            let (lo, hi) = if x < y { (x, y) } else { (y, x) };
            let v_lo = envelope(a, 0.2, 0.5, 0.3, 10.0, lo * a);
            let v_hi = envelope(a, 0.2, 0.5, 0.3, 10.0, hi * a);
            prop_assert!(v_lo <= v_hi);
            prop_assert!((v_lo - lo).abs() < 1e-9);
        }

        #[test]
        fn sustain_is_flat(
            a in 0.0f64..1.0,
            d in 0.0f64..1.0,
            s in 0.0f64..=1.0,
            frac in 0.0f64..1.0
        ) {
            let du = a + d + 2.0;
            let t = a + d + frac * (du - a - d);
            prop_assume!(t < du);
            prop_assert_eq!(envelope(a, d, s, 0.5, du, t), s);
        }

        #[test]
        fn silent_after_release(a in 0.0f64..1.0, d in 0.0f64..1.0, s in 0.0f64..=1.0,
                                r in 0.0f64..2.0, du in 0.01f64..3.0, extra in 0.0f64..10.0) {
            prop_assume!(a + d <= du);
            prop_assert_eq!(envelope(a, d, s, r, du, du + r + extra), 0.0);
        }
    }
}

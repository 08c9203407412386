//! Playback: hands finished buffers to the host audio device.
//!
//! A [`Player`] owns the output chain that sits between the renderer and an
//! [`AudioSink`]: an optional convolution reverb send running in parallel with
//! the dry signal, then the master gain. The impulse response is generated
//! once when the player is built and reused for every call.

use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::EngineConfig;
use crate::dsp::buffer::StereoBuffer;
use crate::dsp::engine::AudioEngine;
use crate::dsp::mixer::Mixer;
use crate::dsp::renderer::buffer_to_wav;
use crate::dsp::reverb::{ConvolutionReverb, ImpulseResponse};
use crate::error::MinitoneError;
use crate::song::Song;

/// Destination for finished buffers.
pub trait AudioSink {
    /// Play `buffer` once. The sink takes ownership.
    fn play(&mut self, buffer: StereoBuffer) -> Result<(), MinitoneError>;
}

impl<F> AudioSink for F
where
    F: FnMut(StereoBuffer) -> Result<(), MinitoneError>,
{
    fn play(&mut self, buffer: StereoBuffer) -> Result<(), MinitoneError> {
        self(buffer)
    }
}

/// Per-call playback flags.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PlayOptions {
    /// Accepted for host compatibility. Playback never loops.
    pub loop_start: Option<f64>,
    /// Route a copy of the signal through the reverb send.
    pub reverb: bool,
}

impl PlayOptions {
    pub fn with_reverb() -> Self {
        PlayOptions {
            reverb: true,
            ..Self::default()
        }
    }
}

/// Renderer output chain in front of an [`AudioSink`].
#[derive(Debug)]
pub struct Player<S> {
    sink: S,
    engine: AudioEngine,
    reverb: ConvolutionReverb,
    mixer: Mixer,
}

impl<S: AudioSink> Player<S> {
    /// Build a player, generating the reverb impulse from `config`.
    pub fn new(sink: S, config: &EngineConfig) -> Result<Self, MinitoneError> {
        config.validate()?;
        let mut rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let impulse = ImpulseResponse::generate(&config.reverb, config.sample_rate, &mut rng);
        Self::with_impulse(sink, config, impulse)
    }

    /// Build a player around an existing impulse response.
    pub fn with_impulse(
        sink: S,
        config: &EngineConfig,
        impulse: ImpulseResponse,
    ) -> Result<Self, MinitoneError> {
        let engine = AudioEngine::with_config(config)?;
        debug!(
            impulse_len = impulse.len(),
            master_gain = config.master_gain,
            "player ready"
        );
        Ok(Player {
            sink,
            engine,
            reverb: ConvolutionReverb::new(impulse),
            mixer: Mixer::new(config.master_gain),
        })
    }

    /// Send `buffer` through the output chain and deliver it exactly once.
    ///
    /// With reverb enabled the delivered buffer is longer than the input by
    /// the impulse tail.
    pub fn play(
        &mut self,
        buffer: StereoBuffer,
        options: &PlayOptions,
    ) -> Result<(), MinitoneError> {
        if let Some(loop_start) = options.loop_start {
            debug!(loop_start, "loop start ignored, playing once");
        }
        debug!(
            samples = buffer.len(),
            reverb = options.reverb,
            "play buffer"
        );

        let out = if options.reverb {
            let wet = self.reverb.process(&buffer);
            self.mixer.mix(&[&buffer, &wet])
        } else {
            self.mixer.mix(&[&buffer])
        };
        self.sink.play(out)
    }

    /// Render `song` with this player's engine and play the result.
    pub fn play_song(&mut self, song: &Song, options: &PlayOptions) -> Result<(), MinitoneError> {
        let buffer = self.engine.render(song)?;
        self.play(buffer, options)
    }

    pub fn engine(&self) -> &AudioEngine {
        &self.engine
    }

    pub fn impulse(&self) -> &ImpulseResponse {
        self.reverb.impulse()
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn into_sink(self) -> S {
        self.sink
    }
}

/// Keeps every delivered buffer in memory.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    pub played: Vec<StereoBuffer>,
}

impl AudioSink for MemorySink {
    fn play(&mut self, buffer: StereoBuffer) -> Result<(), MinitoneError> {
        self.played.push(buffer);
        Ok(())
    }
}

/// Encodes each delivered buffer as a 16-bit stereo WAV file image.
#[derive(Debug, Clone, Default)]
pub struct WavSink {
    pub files: Vec<Vec<u8>>,
}

impl AudioSink for WavSink {
    fn play(&mut self, buffer: StereoBuffer) -> Result<(), MinitoneError> {
        let sample_rate = buffer.sample_rate();
        if !sample_rate.is_finite() || sample_rate > f64::from(u32::MAX) {
            return Err(MinitoneError::Sink(format!(
                "sample rate {sample_rate} cannot be stored in a WAV header"
            )));
        }
        // 4 bytes per frame, and the RIFF size field also counts 36 header bytes.
        if buffer.len() > (u32::MAX as usize - 36) / 4 {
            return Err(MinitoneError::Sink(format!(
                "{} frames do not fit in a WAV file",
                buffer.len()
            )));
        }
        self.files.push(buffer_to_wav(&buffer));
        Ok(())
    }
}

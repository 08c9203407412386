pub mod config;
pub mod dsp;
pub mod error;
pub mod playback;
pub mod song;

pub use config::EngineConfig;
pub use dsp::buffer::StereoBuffer;
pub use dsp::engine::AudioEngine;
pub use error::{MinitoneError, ValidationError};
pub use playback::{AudioSink, PlayOptions, Player};
pub use song::{Curve, Instrument, Note, Sequence, Song};

use wasm_bindgen::prelude::*;

/// The crate version, read from Cargo.toml at compile time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// WASM-exposed: return the minitone-core version string.
#[wasm_bindgen]
pub fn core_version() -> String {
    VERSION.to_string()
}

/// WASM-exposed: render a song object to interleaved stereo f32 samples.
/// Returns the raw audio buffer for AudioWorklet playback.
#[wasm_bindgen]
pub fn render_song_samples(song: JsValue, sample_rate: u32) -> Result<Vec<f32>, JsValue> {
    let song: Song =
        serde_wasm_bindgen::from_value(song).map_err(|e| JsValue::from_str(&format!("{e}")))?;
    let buffer = render_at(&song, sample_rate).map_err(|e| JsValue::from_str(&format!("{e}")))?;
    Ok(buffer.interleaved())
}

/// WASM-exposed: render a JSON song description to a WAV byte array.
#[wasm_bindgen]
pub fn render_song_wav(song_json: &str, sample_rate: u32) -> Result<Vec<u8>, JsValue> {
    render_json_wav(song_json, sample_rate).map_err(|e| JsValue::from_str(&format!("{e}")))
}

/// Render `song` at a host sample rate with the default engine settings.
pub fn render_at(song: &Song, sample_rate: u32) -> Result<StereoBuffer, MinitoneError> {
    let config = EngineConfig::with_sample_rate(f64::from(sample_rate));
    AudioEngine::with_config(&config)?.render(song)
}

/// Parse a JSON song and render it to WAV bytes.
pub fn render_json_wav(song_json: &str, sample_rate: u32) -> Result<Vec<u8>, MinitoneError> {
    let song = Song::from_json(song_json)?;
    let config = EngineConfig::with_sample_rate(f64::from(sample_rate));
    dsp::renderer::render_wav(&AudioEngine::with_config(&config)?, &song)
}

/// Parse a JSON song and render it natively.
pub fn render_json(
    song_json: &str,
    config: &EngineConfig,
) -> Result<StereoBuffer, MinitoneError> {
    let song = Song::from_json(song_json)?;
    AudioEngine::with_config(config)?.render(&song)
}

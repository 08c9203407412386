//! WAV export of rendered buffers.
//!
//! Output is always 16-bit stereo PCM with the canonical 44-byte header.

use super::buffer::StereoBuffer;
use super::engine::AudioEngine;
use super::oscillator::clamp;
use crate::error::MinitoneError;
use crate::song::Song;

const CHANNELS: u16 = 2;
const BYTES_PER_SAMPLE: u16 = 2;
/// Size of the RIFF, `fmt ` and `data` chunk headers.
pub const WAV_HEADER_LEN: usize = 44;

/// Render `song` and encode it as WAV bytes.
pub fn render_wav(engine: &AudioEngine, song: &Song) -> Result<Vec<u8>, MinitoneError> {
    let buffer = engine.render(song)?;
    Ok(buffer_to_wav(&buffer))
}

/// Encode a stereo buffer as WAV bytes.
pub fn buffer_to_wav(buffer: &StereoBuffer) -> Vec<u8> {
    let pcm = to_pcm_i16(buffer);
    let data_len = pcm.len() * usize::from(BYTES_PER_SAMPLE);
    let mut wav = Vec::with_capacity(WAV_HEADER_LEN + data_len);
    write_header(
        &mut wav,
        buffer.sample_rate().round() as u32,
        data_len as u32,
    );
    wav.extend(pcm.iter().flat_map(|s| s.to_le_bytes()));
    wav
}

/// Interleaved i16 samples, clamped to full scale.
pub fn to_pcm_i16(buffer: &StereoBuffer) -> Vec<i16> {
    buffer
        .interleaved()
        .iter()
        .map(|&s| sample_to_i16(s))
        .collect()
}

fn sample_to_i16(sample: f32) -> i16 {
    let scaled = (f64::from(sample) * 32767.0).round();
    clamp(scaled, -32768.0, 32767.0) as i16
}

fn write_header(wav: &mut Vec<u8>, sample_rate: u32, data_len: u32) {
    let frame_len = CHANNELS * BYTES_PER_SAMPLE;
    let byte_rate = sample_rate.saturating_mul(u32::from(frame_len));
    let fields: [&[u8]; 13] = [
        b"RIFF",
        &(36 + data_len).to_le_bytes(),
        b"WAVE",
        b"fmt ",
        &16u32.to_le_bytes(),
        &1u16.to_le_bytes(), // integer PCM
        &CHANNELS.to_le_bytes(),
        &sample_rate.to_le_bytes(),
        &byte_rate.to_le_bytes(),
        &frame_len.to_le_bytes(),
        &(BYTES_PER_SAMPLE * 8).to_le_bytes(),
        b"data",
        &data_len.to_le_bytes(),
    ];
    for field in fields {
        wav.extend_from_slice(field);
    }
}

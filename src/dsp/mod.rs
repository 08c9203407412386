//! DSP: the synthesis primitives and the song renderer.
//!
//! Everything here is plain Rust with no host dependencies. The same code
//! backs the WASM exports and native callers that render offline.

pub mod buffer;
pub mod engine;
pub mod envelope;
pub mod filter;
pub mod mixer;
pub mod note;
pub mod oscillator;
pub mod renderer;
pub mod reverb;
pub mod voice;

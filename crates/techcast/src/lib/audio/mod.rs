//! Binary audio helpers for the payloads returned by the speech provider.
//!
//! Providers either hand back containerised audio (mp3, wav, ...) which can
//! be written as is, or headerless linear PCM described only by its MIME
//! type (`audio/L16;rate=24000`). The latter needs a RIFF/WAVE header before
//! any standard tool will read it.

pub mod mime;
pub mod wav;

pub use mime::{container_extension, AudioFormat};
pub use wav::{wav_header, WavDescriptor, WAV_HEADER_LEN};

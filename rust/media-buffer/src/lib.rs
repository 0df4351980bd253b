//! Media buffers for decoding pipelines.
//!
//! A [`MediaBuffer`] carries one chunk of encoded or decoded media (typically one
//! compressed frame) from a demuxer to a decoder, together with its timing, key frame
//! flag, gapless trimming and decryption parameters. Payloads are allocated with
//! zeroed tail padding and a fixed alignment so that SIMD code may read slightly past
//! the end of the data.

pub mod decrypt_config;
pub mod media_buffer;
pub mod time;

#[cfg(test)]
mod tests;

pub use decrypt_config::{DecryptConfig, EncryptionPattern, EncryptionScheme, SubsampleEntry};
pub use media_buffer::MediaBuffer;
pub use time::{DiscardPadding, TimeDelta};

pub mod opus_encoder;

pub use opus_encoder::{OpusEncoderFactory, OpusFrameEncoder};

use crate::{audio::constants::BYTES_PER_SAMPLE, common::AudioError};

/// A stateful PCM → packet encoder fed one fixed-size frame at a time.
pub trait FrameEncoder: Send {
    /// Interleaved i16 samples consumed per `encode` call.
    fn required_input_len(&self) -> usize;

    fn required_input_bytes(&self) -> usize {
        self.required_input_len() * BYTES_PER_SAMPLE
    }

    /// Encodes exactly `required_input_len()` samples, replacing `out`.
    fn encode(&mut self, pcm: &[i16], out: &mut Vec<u8>) -> Result<(), AudioError>;
}

/// Builds a fresh encoder for each mix session.
pub trait EncoderFactory: Send + Sync {
    fn create(&self) -> Result<Box<dyn FrameEncoder>, AudioError>;
}

pub mod codec;
pub mod constants;
pub mod decode;
pub mod mix;

pub use codec::{EncoderFactory, FrameEncoder, OpusEncoderFactory, OpusFrameEncoder};
pub use decode::{ClipDecoder, SymphoniaDecoder};
pub use mix::{AudioClip, FrameMixer};

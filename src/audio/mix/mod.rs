pub mod clip;
pub mod mixer;

pub use clip::AudioClip;
pub use mixer::FrameMixer;

use bytes::Bytes;

/// What a voice transport pulls audio from, one 20 ms frame per call.
pub trait FrameSource: Send + Sync {
    /// The next frame. Empty output means the source has drained.
    fn next_frame(&self) -> Bytes;

    /// Whether frames are already codec packets rather than raw PCM.
    fn is_encoded(&self) -> bool;

    /// Frees codec and sample memory. Safe to call more than once.
    fn release(&self);
}
